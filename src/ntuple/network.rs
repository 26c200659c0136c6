use std::path::Path;

use log::info;

use super::{Cells, Pattern, PatternError, ValueFunction, WeightTable};
use crate::engine::Board;
use crate::serialization::{self, WeightFileError};

#[derive(thiserror::Error, Debug)]
pub enum NetworkError {
    #[error("a network needs at least one weight table")]
    NoTables,
    #[error("invalid pattern: {0}")]
    Pattern(#[from] PatternError),
    #[error("pattern {0:?} is listed twice")]
    DuplicatePattern(Vec<u8>),
    #[error("cannot allocate a weight table of {entries} entries")]
    Allocation { entries: usize },
    #[error("weight file has {found} tables, network has {expected}")]
    TableCount { expected: usize, found: usize },
    #[error("weight file table {table} has {found} entries, expected {expected}")]
    TableSize { table: usize, expected: usize, found: usize },
    #[error(transparent)]
    WeightFile(#[from] WeightFileError),
}

/// The four six-tuples of the reference agent: two straight lines of six
/// and two 2x3 rectangles.
pub fn default_patterns() -> Vec<Pattern> {
    [[0, 1, 2, 3, 4, 5], [4, 5, 6, 7, 8, 9], [0, 1, 2, 4, 5, 6], [4, 5, 6, 8, 9, 10]]
        .into_iter()
        .map(|p| Pattern(p.to_vec()))
        .collect()
}

/// Ordered, non-empty collection of weight tables summed into one value.
#[derive(Debug, Clone)]
pub struct Network {
    tables: Vec<WeightTable>,
}

impl Network {
    /// Build one zeroed table per pattern, in order.
    pub fn new(patterns: impl IntoIterator<Item = Pattern>) -> Result<Self, NetworkError> {
        let patterns: Vec<Pattern> = patterns.into_iter().collect();
        if patterns.is_empty() {
            return Err(NetworkError::NoTables);
        }
        for (i, p) in patterns.iter().enumerate() {
            if patterns[..i].contains(p) {
                return Err(NetworkError::DuplicatePattern(p.positions().to_vec()));
            }
        }
        let tables = patterns.into_iter().map(WeightTable::new).collect::<Result<Vec<_>, _>>()?;
        let entries: usize = tables.iter().map(WeightTable::len).sum();
        info!("n-tuple network: {} tables, {} weights ({} MiB)", tables.len(), entries, (entries * 4) >> 20);
        Ok(Self { tables })
    }

    /// Network over [`default_patterns`].
    pub fn with_default_patterns() -> Result<Self, NetworkError> {
        Self::new(default_patterns())
    }

    /// Build from raw position lists, validating each one.
    pub fn from_positions(patterns: &[Vec<u8>]) -> Result<Self, NetworkError> {
        let patterns = patterns.iter().cloned().map(Pattern::new).collect::<Result<Vec<_>, _>>()?;
        Self::new(patterns)
    }

    #[inline]
    pub fn tables(&self) -> &[WeightTable] {
        &self.tables
    }

    /// Sum of every table's estimate.
    pub fn estimate<B: Cells + ?Sized>(&self, board: &B) -> f32 {
        self.tables.iter().map(|t| t.estimate(board)).sum()
    }

    /// Split `total_delta` evenly over the tables and update each one.
    /// Returns the sum of the per-table [`WeightTable::update`] results.
    ///
    /// Each table then adds its share once per symmetric view, so a board
    /// with 8 distinct views moves by 8 × `total_delta` overall.
    pub fn update<B: Cells + ?Sized>(&mut self, board: &B, total_delta: f32) -> f32 {
        let delta = total_delta / self.tables.len() as f32;
        self.tables.iter_mut().map(|t| t.update(board, delta)).sum()
    }

    /// Write all tables to `path` in the versioned weight format.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), NetworkError> {
        let path = path.as_ref();
        let tables: Vec<&[f32]> = self.tables.iter().map(WeightTable::values).collect();
        serialization::write_weights_to_path(path, &tables)?;
        info!("saved {} weight tables to {}", tables.len(), path.display());
        Ok(())
    }

    /// Replace all weights with the contents of a versioned weight file.
    ///
    /// The file must hold exactly one table per pattern with matching sizes;
    /// on any mismatch the network is left untouched.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), NetworkError> {
        let path = path.as_ref();
        let decoded = serialization::read_weights_from_path(path)?;
        self.restore(decoded)?;
        info!("loaded {} weight tables from {}", self.tables.len(), path.display());
        Ok(())
    }

    /// Like [`Network::load`] for legacy pre-versioned files
    /// (`u32` table count, no checksum).
    pub fn load_legacy<P: AsRef<Path>>(&mut self, path: P) -> Result<(), NetworkError> {
        let path = path.as_ref();
        let decoded = serialization::read_legacy_weights_from_path(path)?;
        self.restore(decoded)?;
        info!("loaded {} legacy weight tables from {}", self.tables.len(), path.display());
        Ok(())
    }

    /// Install decoded tables after checking their shape against this network.
    pub fn restore(&mut self, decoded: Vec<Vec<f32>>) -> Result<(), NetworkError> {
        if decoded.len() != self.tables.len() {
            return Err(NetworkError::TableCount { expected: self.tables.len(), found: decoded.len() });
        }
        for (table, (ours, theirs)) in self.tables.iter().zip(&decoded).enumerate() {
            if ours.len() != theirs.len() {
                return Err(NetworkError::TableSize { table, expected: ours.len(), found: theirs.len() });
            }
        }
        for (ours, theirs) in self.tables.iter_mut().zip(decoded) {
            ours.values_mut().copy_from_slice(&theirs);
        }
        Ok(())
    }
}

impl ValueFunction for Network {
    #[inline]
    fn estimate_board(&self, board: &Board) -> f32 {
        self.estimate(board)
    }

    #[inline]
    fn weight_update(&mut self, board: &Board, delta: f32) -> f32 {
        self.update(board, delta)
    }
}
