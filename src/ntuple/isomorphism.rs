//! The 8 symmetries of the 4x4 board.
//!
//! Symmetry order: identity, rotate 90° clockwise, rotate 180°, rotate 270°,
//! mirror left-right, anti-transpose, mirror top-bottom, transpose.

use super::BOARD_CELLS;

/// Number of board symmetries (the dihedral group of the square).
pub const SYMMETRIES: usize = 8;

const fn map(symmetry: usize, position: usize) -> usize {
    let (r, c) = (position / 4, position % 4);
    let (r, c) = match symmetry {
        0 => (r, c),
        1 => (c, 3 - r),
        2 => (3 - r, 3 - c),
        3 => (3 - c, r),
        4 => (r, 3 - c),
        5 => (3 - c, 3 - r),
        6 => (3 - r, c),
        _ => (c, r),
    };
    4 * r + c
}

const fn build_images() -> [[u8; SYMMETRIES]; BOARD_CELLS] {
    let mut table = [[0u8; SYMMETRIES]; BOARD_CELLS];
    let mut p = 0;
    while p < BOARD_CELLS {
        let mut s = 0;
        while s < SYMMETRIES {
            table[p][s] = map(s, p) as u8;
            s += 1;
        }
        p += 1;
    }
    table
}

static IMAGES: [[u8; SYMMETRIES]; BOARD_CELLS] = build_images();

/// The 8 images of `position` under the board symmetries; `images(p)[0] == p`.
///
/// ```
/// use ntuple_td::ntuple::images;
/// assert_eq!(images(0), [0, 3, 15, 12, 3, 15, 12, 0]);
/// assert_eq!(images(5)[0], 5);
/// ```
#[inline]
pub fn images(position: u8) -> [u8; SYMMETRIES] {
    IMAGES[position as usize]
}

/// Symmetry `index` as a permutation of all 16 positions.
pub fn symmetry(index: usize) -> [u8; BOARD_CELLS] {
    std::array::from_fn(|p| IMAGES[p][index])
}
