//! Episode loop and block statistics.

use std::fmt;

use crate::agent::{Agent, Role};
use crate::engine::Board;

/// Tile value counted as a win.
pub const WIN_TILE: u32 = 2048;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpisodeSummary {
    /// Slides played.
    pub steps: u32,
    /// Sum of slide rewards.
    pub score: u64,
    pub highest_tile: u32,
    pub final_board: Board,
}

/// Play one episode: the placer drops two opening tiles, then slider and
/// placer alternate until the slider has no legal action.
///
/// Both agents get `open_episode` before the first move and `close_episode`
/// after the last, which is where a learning slider replays its trajectory.
pub fn run_episode(slider: &mut dyn Agent, placer: &mut dyn Agent) -> EpisodeSummary {
    debug_assert_eq!(slider.role(), Role::Slider);
    debug_assert_eq!(placer.role(), Role::Placer);

    slider.open_episode();
    placer.open_episode();

    let mut board = Board::EMPTY;
    for _ in 0..2 {
        let action = placer.take_action(&board);
        action.apply(&mut board);
    }

    let mut steps = 0u32;
    let mut score = 0u64;
    loop {
        let Some(reward) = slider.take_action(&board).apply(&mut board) else {
            break;
        };
        steps += 1;
        score += reward as u64;
        if placer.take_action(&board).apply(&mut board).is_none() {
            break;
        }
    }

    slider.close_episode();
    placer.close_episode();

    EpisodeSummary { steps, score, highest_tile: board.highest_tile(), final_board: board }
}

/// Aggregate over one block of episodes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockReport {
    /// Episodes played so far, including this block.
    pub episodes: u64,
    pub block: u64,
    pub mean_score: f64,
    pub max_score: u64,
    pub max_tile: u32,
    /// Fraction of the block that reached [`WIN_TILE`].
    pub win_rate: f64,
}

impl fmt::Display for BlockReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>8} episodes | mean {:>10.1} | max {:>7} | max tile {:>6} | {}-rate {:>5.1}%",
            self.episodes,
            self.mean_score,
            self.max_score,
            self.max_tile,
            WIN_TILE,
            self.win_rate * 100.0
        )
    }
}

/// Rolling statistics, emitted once per `block` episodes.
#[derive(Debug, Clone)]
pub struct Stats {
    block: u64,
    episodes: u64,
    in_block: u64,
    score_sum: u64,
    max_score: u64,
    max_tile: u32,
    wins: u64,
}

impl Stats {
    pub fn new(block: u64) -> Self {
        Self { block: block.max(1), episodes: 0, in_block: 0, score_sum: 0, max_score: 0, max_tile: 0, wins: 0 }
    }

    #[inline]
    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    /// Account for one episode; returns a report when the block completes.
    pub fn push(&mut self, summary: &EpisodeSummary) -> Option<BlockReport> {
        self.episodes += 1;
        self.in_block += 1;
        self.score_sum += summary.score;
        self.max_score = self.max_score.max(summary.score);
        self.max_tile = self.max_tile.max(summary.highest_tile);
        if summary.highest_tile >= WIN_TILE {
            self.wins += 1;
        }
        if self.in_block < self.block {
            return None;
        }
        let report = self.report();
        self.reset_block();
        Some(report)
    }

    /// Report the partially filled block, if any, and start a fresh one.
    pub fn flush(&mut self) -> Option<BlockReport> {
        if self.in_block == 0 {
            return None;
        }
        let report = self.report();
        self.reset_block();
        Some(report)
    }

    fn report(&self) -> BlockReport {
        let n = self.in_block as f64;
        BlockReport {
            episodes: self.episodes,
            block: self.in_block,
            mean_score: self.score_sum as f64 / n,
            max_score: self.max_score,
            max_tile: self.max_tile,
            win_rate: self.wins as f64 / n,
        }
    }

    fn reset_block(&mut self) {
        self.in_block = 0;
        self.score_sum = 0;
        self.max_score = 0;
        self.max_tile = 0;
        self.wins = 0;
    }
}
