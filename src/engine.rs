//! Packed 4x4 2048 board: the game-rule collaborator of the learner.
//!
//! The board is 16 4-bit cells in a `u64`. Position 0 is the top-left cell
//! and positions run row-major, so position `p` lives at bits
//! `60 - 4p .. 64 - 4p`. A cell holds the tile exponent (0 = empty,
//! 1 = 2, 2 = 4, ...), which is exactly the nibble the n-tuple tables index on.
//!
//! Row shifts go through precomputed 65,536-entry line tables; column shifts
//! transpose first and reuse the row tables.

use rand::Rng;
use std::fmt;
use std::sync::OnceLock;

use crate::ntuple::Cells;

/// Immediate reward of one slide: the sum of the tiles created by merges.
pub type Reward = u32;

type BoardRaw = u64;

const LINE_TABLE_SIZE: usize = 0x1_0000; // 65,536 possible 16-bit lines

/// A direction to move/merge tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    /// All slides in their stable enumeration order (opcodes 0..=3).
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    /// Opcode of this slide: 0=Up, 1=Down, 2=Left, 3=Right.
    #[inline]
    pub fn opcode(self) -> u8 {
        match self {
            Move::Up => 0,
            Move::Down => 1,
            Move::Left => 2,
            Move::Right => 3,
        }
    }

    /// Inverse of [`Move::opcode`].
    #[inline]
    pub fn from_opcode(op: u8) -> Option<Move> {
        Move::ALL.get(op as usize).copied()
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("cell {position} holds exponent {value}, which does not fit in 4 bits")]
    CellOutOfRange { position: usize, value: u8 },
}

/// Per-direction row table: slid line and the reward that slide earns.
struct LineTable {
    slid: Box<[u16]>,
    reward: Box<[Reward]>,
}

struct Tables {
    left: LineTable,
    right: LineTable,
    score: Box<[u32]>,
}

static TABLES: OnceLock<Tables> = OnceLock::new();

/// Initialize the line tables. Safe to call multiple times; every board
/// operation also initializes them lazily.
pub fn new() {
    let _ = tables();
}

#[inline(always)]
fn tables() -> &'static Tables {
    TABLES.get_or_init(create_tables)
}

fn create_tables() -> Tables {
    let mut left_slid = vec![0u16; LINE_TABLE_SIZE];
    let mut left_reward = vec![0 as Reward; LINE_TABLE_SIZE];
    let mut right_slid = vec![0u16; LINE_TABLE_SIZE];
    let mut right_reward = vec![0 as Reward; LINE_TABLE_SIZE];
    let mut score = vec![0u32; LINE_TABLE_SIZE];

    for line in 0..LINE_TABLE_SIZE {
        let tiles = unpack_line(line as u16);
        let (merged, reward) = slide_tiles_left(tiles);
        left_slid[line] = pack_line(merged);
        left_reward[line] = reward;

        let mut reversed = tiles;
        reversed.reverse();
        let (mut merged, reward) = slide_tiles_left(reversed);
        merged.reverse();
        right_slid[line] = pack_line(merged);
        right_reward[line] = reward;

        score[line] = line_score(tiles);
    }

    Tables {
        left: LineTable { slid: left_slid.into_boxed_slice(), reward: left_reward.into_boxed_slice() },
        right: LineTable { slid: right_slid.into_boxed_slice(), reward: right_reward.into_boxed_slice() },
        score: score.into_boxed_slice(),
    }
}

/// Leftmost cell in the high nibble.
#[inline]
fn unpack_line(line: u16) -> [u8; 4] {
    [
        (line >> 12) as u8 & 0xf,
        (line >> 8) as u8 & 0xf,
        (line >> 4) as u8 & 0xf,
        line as u8 & 0xf,
    ]
}

#[inline]
fn pack_line(tiles: [u8; 4]) -> u16 {
    (tiles[0] as u16) << 12 | (tiles[1] as u16) << 8 | (tiles[2] as u16) << 4 | tiles[3] as u16
}

/// Slide one line toward index 0, merging equal neighbours once per move.
///
/// Merges saturate at exponent 15 (32768): two 32768 tiles stay apart since
/// the result would not fit in a nibble.
fn slide_tiles_left(tiles: [u8; 4]) -> ([u8; 4], Reward) {
    let mut out = [0u8; 4];
    let mut reward: Reward = 0;
    let mut len = 0usize;
    let mut mergeable = false;
    for &t in tiles.iter().filter(|&&t| t != 0) {
        if mergeable && out[len - 1] == t && t < 15 {
            out[len - 1] += 1;
            reward += 1 << out[len - 1];
            mergeable = false;
        } else {
            out[len] = t;
            len += 1;
            mergeable = true;
        }
    }
    (out, reward)
}

// Credit to Nneonneo: a tile of exponent k is worth (k - 1) * 2^k points,
// the sum of every merge that built it.
fn line_score(tiles: [u8; 4]) -> u32 {
    tiles
        .iter()
        .filter(|&&t| t >= 2)
        .map(|&t| (t as u32 - 1) * (1 << t))
        .sum()
}

// Credit to Nneonneo
fn transpose(x: BoardRaw) -> BoardRaw {
    let a1 = x & 0xF0F00F0FF0F00F0F;
    let a2 = x & 0x0000F0F00000F0F0;
    let a3 = x & 0x0F0F00000F0F0000;
    let a = a1 | (a2 << 12) | (a3 >> 12);
    let b1 = a & 0xFF00FF0000FF00FF;
    let b2 = a & 0x00FF00FF00000000;
    let b3 = a & 0x00000000FF00FF00;
    b1 | (b2 >> 24) | (b3 << 24)
}

#[inline(always)]
fn row(raw: BoardRaw, r: u32) -> u16 {
    (raw >> (48 - 16 * r)) as u16
}

/// Apply a row table to all four rows, accumulating merge rewards.
fn slide_rows(raw: BoardRaw, table: &LineTable) -> (BoardRaw, Reward) {
    (0..4).fold((0, 0), |(out, reward), r| {
        let line = row(raw, r) as usize;
        let slid = table.slid[line] as BoardRaw;
        (out | slid << (48 - 16 * r), reward + table.reward[line])
    })
}

/// Packed 4x4 2048 board as 16 4-bit nibbles in a `u64`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Board(BoardRaw);

impl Board {
    /// A constant empty board (all zeros).
    pub const EMPTY: Board = Board(0);

    /// Construct a `Board` from its raw packed representation.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Board(raw)
    }

    /// The raw packed `u64` for this `Board`.
    #[inline]
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Build a board from 16 row-major tile exponents.
    ///
    /// This is the validation point for the 4-bit cell invariant: anything
    /// above 15 would alias other cells once packed into an n-tuple index.
    ///
    /// ```
    /// use ntuple_td::engine::Board;
    /// let b = Board::from_cells(&[1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2]).unwrap();
    /// assert_eq!(b.cell(0), 1);
    /// assert_eq!(b.cell(15), 2);
    /// assert!(Board::from_cells(&[16; 16]).is_err());
    /// ```
    pub fn from_cells(cells: &[u8; 16]) -> Result<Self, BoardError> {
        cells.iter().enumerate().try_fold(Board::EMPTY, |b, (position, &value)| {
            if value > 0xf {
                return Err(BoardError::CellOutOfRange { position, value });
            }
            Ok(Board(b.0 | (value as BoardRaw) << (60 - 4 * position)))
        })
    }

    /// Tile exponent at `position` (0..16, row-major).
    #[inline]
    pub fn cell(&self, position: usize) -> u8 {
        debug_assert!(position < 16);
        ((self.0 >> (60 - 4 * position)) & 0xf) as u8
    }

    /// All 16 tile exponents, row-major.
    pub fn cells(&self) -> [u8; 16] {
        std::array::from_fn(|p| self.cell(p))
    }

    /// The board after sliding in `dir` together with the merge reward.
    /// No tile is inserted.
    #[inline]
    pub fn shifted(self, dir: Move) -> (Board, Reward) {
        let t = tables();
        match dir {
            Move::Left => {
                let (raw, r) = slide_rows(self.0, &t.left);
                (Board(raw), r)
            }
            Move::Right => {
                let (raw, r) = slide_rows(self.0, &t.right);
                (Board(raw), r)
            }
            Move::Up => {
                let (raw, r) = slide_rows(transpose(self.0), &t.left);
                (Board(transpose(raw)), r)
            }
            Move::Down => {
                let (raw, r) = slide_rows(transpose(self.0), &t.right);
                (Board(transpose(raw)), r)
            }
        }
    }

    /// Slide in place. Returns `None` (and leaves the board untouched) when
    /// the slide changes nothing, which makes it illegal.
    ///
    /// ```
    /// use ntuple_td::engine::{Board, Move};
    /// let mut b = Board::from_cells(&[1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap();
    /// assert_eq!(b.slide(Move::Left), Some(4));
    /// assert_eq!(b.cell(0), 2);
    /// assert_eq!(b.slide(Move::Left), None);
    /// ```
    #[inline]
    pub fn slide(&mut self, dir: Move) -> Option<Reward> {
        let (next, reward) = self.shifted(dir);
        if next == *self {
            return None;
        }
        *self = next;
        Some(reward)
    }

    /// Put tile exponent `tile` on an empty cell. Returns `None` if the cell is
    /// occupied, out of range, or the tile does not fit in a nibble.
    pub fn place(&mut self, position: usize, tile: u8) -> Option<Reward> {
        if position >= 16 || tile == 0 || tile > 0xf || self.cell(position) != 0 {
            return None;
        }
        self.0 |= (tile as BoardRaw) << (60 - 4 * position);
        Some(0)
    }

    /// Insert a random 2 (90%) or 4 (10%) tile into a random empty cell.
    /// A full board is returned unchanged.
    ///
    /// ```
    /// use ntuple_td::engine::Board;
    /// use rand::{SeedableRng, rngs::StdRng};
    /// let mut rng = StdRng::seed_from_u64(123);
    /// let b = Board::EMPTY.with_random_tile(&mut rng).with_random_tile(&mut rng);
    /// assert_eq!(b.count_empty(), 14);
    /// ```
    pub fn with_random_tile<R: Rng + ?Sized>(self, rng: &mut R) -> Self {
        let empty = self.empty_positions();
        if empty.is_empty() {
            return self;
        }
        let position = empty[rng.gen_range(0..empty.len())];
        let mut next = self;
        next.place(position, random_tile(rng));
        next
    }

    /// Positions of empty cells in ascending order.
    pub fn empty_positions(&self) -> Vec<usize> {
        (0..16).filter(|&p| self.cell(p) == 0).collect()
    }

    /// Count the number of empty cells on the board.
    #[inline]
    pub fn count_empty(&self) -> u32 {
        let mut x = self.0;
        x |= x >> 1;
        x |= x >> 2;
        16 - (x & 0x1111_1111_1111_1111).count_ones()
    }

    /// Total score implied by the tiles on the board.
    pub fn score(&self) -> u32 {
        let score = &tables().score;
        (0..4).map(|r| score[row(self.0, r) as usize]).sum()
    }

    /// The highest tile value (e.g., 2048) present on the board; 0 when empty.
    pub fn highest_tile(&self) -> u32 {
        match self.cells().into_iter().max() {
            Some(0) | None => 0,
            Some(e) => 1 << e,
        }
    }

    /// True if no slide in any direction changes the board.
    pub fn is_game_over(&self) -> bool {
        Move::ALL.iter().all(|&dir| self.shifted(dir).0 == *self)
    }
}

impl Cells for Board {
    #[inline]
    fn cell(&self, position: usize) -> u8 {
        Board::cell(self, position)
    }
}

fn random_tile<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    if rng.gen_range(0..10) < 9 {
        1
    } else {
        2
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Board({:#018x})", self.0)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..4 {
            if r > 0 {
                writeln!(f, "{}", "-".repeat(31))?;
            }
            let line: Vec<String> = (0..4)
                .map(|c| match self.cell(4 * r + c) {
                    0 => " ".repeat(7),
                    e => format!("{:^7}", 1u32 << e),
                })
                .collect();
            writeln!(f, "{}", line.join("|"))?;
        }
        Ok(())
    }
}

impl From<u64> for Board {
    fn from(v: u64) -> Self {
        Board::from_raw(v)
    }
}

impl From<Board> for u64 {
    fn from(b: Board) -> Self {
        b.raw()
    }
}
