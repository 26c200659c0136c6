//! Players and environments.
//!
//! Every participant implements [`Agent`]. Sliders choose a slide for the
//! current board; placers play the environment and drop new tiles. The
//! episode runner in [`crate::play`] only talks to the trait.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::engine::{Board, Move, Reward};
use crate::ntuple::Network;
use crate::td::{best_slide, Trainer};

/// What an agent wants to do to the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// The agent has nothing legal to do.
    None,
    Slide(Move),
    /// Put tile exponent `tile` on empty cell `position`.
    Place { position: u8, tile: u8 },
}

impl Action {
    /// Apply to `board`. `None` means the action was illegal (or empty) and
    /// the board is unchanged.
    pub fn apply(self, board: &mut Board) -> Option<Reward> {
        match self {
            Action::None => None,
            Action::Slide(op) => board.slide(op),
            Action::Place { position, tile } => board.place(position as usize, tile),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Slider,
    Placer,
}

pub trait Agent {
    fn name(&self) -> &str;
    fn role(&self) -> Role;
    fn open_episode(&mut self) {}
    fn close_episode(&mut self) {}
    fn take_action(&mut self, board: &Board) -> Action;
}

/// Learning slider: greedy on `reward + V(afterstate)` with a TD(0)
/// replay of every episode when it closes.
pub struct TdSlider {
    network: Network,
    trainer: Trainer,
}

impl TdSlider {
    pub fn new(network: Network, trainer: Trainer) -> Self {
        Self { network, trainer }
    }

    #[inline]
    pub fn network(&self) -> &Network {
        &self.network
    }

    #[inline]
    pub fn trainer(&self) -> &Trainer {
        &self.trainer
    }
}

impl Agent for TdSlider {
    fn name(&self) -> &str {
        "TD"
    }

    fn role(&self) -> Role {
        Role::Slider
    }

    fn open_episode(&mut self) {
        self.trainer.open_episode();
    }

    fn close_episode(&mut self) {
        self.trainer.close_episode(&mut self.network);
    }

    fn take_action(&mut self, board: &Board) -> Action {
        match best_slide(&self.network, *board) {
            Some(t) => {
                self.trainer.record(t);
                Action::Slide(t.op)
            }
            None => Action::None,
        }
    }
}

/// Picks a uniformly random legal slide.
pub struct RandomSlider<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomSlider<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Agent for RandomSlider<R> {
    fn name(&self) -> &str {
        "slide"
    }

    fn role(&self) -> Role {
        Role::Slider
    }

    fn take_action(&mut self, board: &Board) -> Action {
        let mut ops = Move::ALL;
        ops.shuffle(&mut self.rng);
        ops.into_iter()
            .find(|&op| board.shifted(op).0 != *board)
            .map_or(Action::None, Action::Slide)
    }
}

/// Picks the legal slide with the largest immediate reward, first on ties.
#[derive(Debug, Default)]
pub struct GreedySlider;

impl Agent for GreedySlider {
    fn name(&self) -> &str {
        "greedy"
    }

    fn role(&self) -> Role {
        Role::Slider
    }

    fn take_action(&mut self, board: &Board) -> Action {
        let mut best: Option<(Move, Reward)> = None;
        for op in Move::ALL {
            let mut after = *board;
            if let Some(r) = after.slide(op) {
                if best.map_or(true, |(_, b)| r > b) {
                    best = Some((op, r));
                }
            }
        }
        best.map_or(Action::None, |(op, _)| Action::Slide(op))
    }
}

/// Environment: a 2 (90%) or 4 (10%) on a uniformly random empty cell.
pub struct RandomPlacer<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomPlacer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Agent for RandomPlacer<R> {
    fn name(&self) -> &str {
        "place"
    }

    fn role(&self) -> Role {
        Role::Placer
    }

    fn take_action(&mut self, board: &Board) -> Action {
        let empty = board.empty_positions();
        let Some(&position) = empty.choose(&mut self.rng) else {
            return Action::None;
        };
        let tile = if self.rng.gen_range(0..10) < 9 { 1 } else { 2 };
        Action::Place { position: position as u8, tile }
    }
}
