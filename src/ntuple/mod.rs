//! n-tuple network value function.
//!
//! A network is a sum of lookup tables. Each table is indexed by the cell
//! values found at a small fixed set of board positions (a [`Pattern`]), and
//! every table is read through the 8 rotations/reflections of its pattern so
//! one physical table learns all symmetric instances of the same feature.
//!
//! ```
//! use ntuple_td::engine::Board;
//! use ntuple_td::ntuple::{Network, Pattern, ValueFunction};
//!
//! let mut net = Network::new(vec![Pattern::new(vec![0, 1, 2, 3]).unwrap()]).unwrap();
//! let b = Board::from_cells(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 1]).unwrap();
//! assert_eq!(net.estimate_board(&b), 0.0);
//! let v = net.weight_update(&b, 1.0);
//! assert_eq!(v, 8.0);
//! assert_eq!(v, net.estimate_board(&b));
//! ```

pub mod isomorphism;
mod network;
mod weight;

pub use isomorphism::images;
pub use network::{default_patterns, Network, NetworkError};
pub use weight::WeightTable;

use crate::engine::Board;

/// Number of cells on the board.
pub const BOARD_CELLS: usize = 16;

/// Longest accepted pattern. A 7-tuple table is 16^7 f32 = 1 GiB.
pub const MAX_TUPLE_LEN: usize = 7;

/// Read access to a board's cells, the only board capability the weight
/// tables need. Implementors guarantee `cell(p) <= 15` for `p < 16`.
pub trait Cells {
    fn cell(&self, position: usize) -> u8;
}

/// A trainable afterstate value function.
///
/// The trainer and the decision policy only see this seam.
pub trait ValueFunction {
    /// Estimated value of `board`. No side effects.
    fn estimate_board(&self, board: &Board) -> f32;

    /// Move the estimate of `board` by `delta` and return the bootstrap value
    /// the trainer uses as its next target.
    fn weight_update(&mut self, board: &Board, delta: f32) -> f32;
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,
    #[error("pattern has {0} positions, at most {MAX_TUPLE_LEN} are supported")]
    TooLong(usize),
    #[error("position {0} is off the 4x4 board")]
    OutOfRange(u8),
    #[error("position {0} appears more than once")]
    Duplicate(u8),
}

/// Ordered sequence of distinct board positions defining one n-tuple.
///
/// The first position feeds the least-significant nibble of the table index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pattern(Vec<u8>);

impl Pattern {
    pub fn new(positions: Vec<u8>) -> Result<Self, PatternError> {
        if positions.is_empty() {
            return Err(PatternError::Empty);
        }
        if positions.len() > MAX_TUPLE_LEN {
            return Err(PatternError::TooLong(positions.len()));
        }
        let mut seen = 0u16;
        for &p in &positions {
            if p as usize >= BOARD_CELLS {
                return Err(PatternError::OutOfRange(p));
            }
            if seen & (1 << p) != 0 {
                return Err(PatternError::Duplicate(p));
            }
            seen |= 1 << p;
        }
        Ok(Pattern(positions))
    }

    #[inline]
    pub fn positions(&self) -> &[u8] {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in a table for this pattern: 16^len.
    #[inline]
    pub fn table_len(&self) -> usize {
        1usize << (4 * self.0.len())
    }
}
