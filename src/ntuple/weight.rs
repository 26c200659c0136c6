use super::isomorphism::{images, SYMMETRIES};
use super::{Cells, NetworkError, Pattern};

/// Lookup table for one n-tuple, read through the 8 board symmetries.
///
/// There is one value array per table; the 8 isomorphic views differ only in
/// which board positions feed the index.
#[derive(Debug, Clone)]
pub struct WeightTable {
    pattern: Pattern,
    isomorphisms: [Vec<u8>; SYMMETRIES],
    values: Box<[f32]>,
}

impl WeightTable {
    /// Allocate a zeroed table of 16^L entries for `pattern`.
    ///
    /// Allocation is fallible so an oversized configuration surfaces as an
    /// error instead of aborting the process.
    pub fn new(pattern: Pattern) -> Result<Self, NetworkError> {
        let len = pattern.table_len();
        let mut values: Vec<f32> = Vec::new();
        values
            .try_reserve_exact(len)
            .map_err(|_| NetworkError::Allocation { entries: len })?;
        values.resize(len, 0.0);

        let isomorphisms = std::array::from_fn(|iso| {
            pattern.positions().iter().map(|&p| images(p)[iso]).collect()
        });

        Ok(Self { pattern, isomorphisms, values: values.into_boxed_slice() })
    }

    #[inline]
    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    /// The 8 position sequences; index 0 is the pattern itself.
    #[inline]
    pub fn isomorphisms(&self) -> &[Vec<u8>; SYMMETRIES] {
        &self.isomorphisms
    }

    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Composite index of `board` as seen through isomorphic view `iso`.
    ///
    /// Element k of the view contributes the nibble at bits `4k..4k+4`.
    #[inline]
    pub fn index<B: Cells + ?Sized>(&self, iso: usize, board: &B) -> usize {
        self.isomorphisms[iso].iter().enumerate().fold(0usize, |index, (k, &p)| {
            let cell = board.cell(p as usize);
            debug_assert!(cell <= 0xf, "cell {p} = {cell} does not fit in a nibble");
            index | (cell as usize) << (4 * k)
        })
    }

    #[inline]
    fn indices<B: Cells + ?Sized>(&self, board: &B) -> [usize; SYMMETRIES] {
        std::array::from_fn(|iso| self.index(iso, board))
    }

    /// Sum of the 8 view values for `board`.
    pub fn estimate<B: Cells + ?Sized>(&self, board: &B) -> f32 {
        self.indices(board).iter().map(|&i| self.values[i]).sum()
    }

    /// Add the full `delta` once per view and return the running sum of
    /// each slot read right after its own addition.
    ///
    /// A slot shared by several views (symmetric boards) receives `delta`
    /// once for each of them, and is summed at its partial value each time.
    /// On a board with 8 distinct view indices this equals the new estimate.
    pub fn update<B: Cells + ?Sized>(&mut self, board: &B, delta: f32) -> f32 {
        let indices = self.indices(board);
        let mut sum = 0.0;
        for &i in &indices {
            self.values[i] += delta;
            sum += self.values[i];
        }
        sum
    }
}
