//! Greedy afterstate policy.

use super::Transition;
use crate::engine::{Board, Move};
use crate::ntuple::ValueFunction;

/// Pick the slide maximising `reward + V(afterstate)`.
///
/// Slides are tried in [`Move::ALL`] order on a copy of `before`; illegal
/// slides are skipped; on a tie the earlier slide wins. Returns `None` when
/// no slide is legal.
///
/// ```
/// use ntuple_td::engine::{Board, Move};
/// use ntuple_td::ntuple::Network;
/// use ntuple_td::td::best_slide;
///
/// let net = Network::from_positions(&[vec![0, 1, 2, 3]]).unwrap();
/// let b = Board::from_cells(&[1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap();
/// let t = best_slide(&net, b).unwrap();
/// assert_eq!(t.op, Move::Left);
/// assert_eq!(t.reward, 4.0);
/// ```
pub fn best_slide<V: ValueFunction + ?Sized>(value: &V, before: Board) -> Option<Transition> {
    let mut best: Option<Transition> = None;
    for op in Move::ALL {
        let mut after = before;
        let Some(reward) = after.slide(op) else { continue };
        let reward = reward as f32;
        let total = reward + value.estimate_board(&after);
        if best.map_or(true, |b| total > b.value) {
            best = Some(Transition { before, after, op, reward, value: total });
        }
    }
    best
}
