//! TD(0) learning over afterstates.
//!
//! The afterstate is the board right after the agent's slide and before the
//! environment drops a random tile. Values are learned for afterstates so the
//! random placement never has to be modelled: the policy ranks a move by
//! `reward + V(afterstate)`, and the trainer replays the recorded episode
//! backward, bootstrapping each afterstate on the updated value of the next.

pub mod policy;
mod trainer;

pub use policy::best_slide;
pub use trainer::{Phase, Trainer, DEFAULT_TRAJECTORY_CAPACITY};

use crate::engine::{Board, Move};

/// One accepted decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    /// Board before the slide.
    pub before: Board,
    /// Afterstate: board after the slide, before the random tile.
    pub after: Board,
    pub op: Move,
    /// Immediate merge reward of the slide.
    pub reward: f32,
    /// `reward + V(after)` at selection time.
    pub value: f32,
}
