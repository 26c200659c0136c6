use log::debug;

use super::Transition;
use crate::ntuple::ValueFunction;

/// Trajectory storage reserved up front; long 2048 games run to tens of
/// thousands of moves.
pub const DEFAULT_TRAJECTORY_CAPACITY: usize = 1 << 16;

/// Episode lifecycle: `Recording → Terminal → Replay → Idle`.
///
/// `Terminal` and `Replay` only exist inside [`Trainer::close_episode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Recording,
    Terminal,
    Replay,
}

/// Records an episode's transitions and replays them backward at the end.
#[derive(Debug, Clone)]
pub struct Trainer {
    alpha: f32,
    trajectory: Vec<Transition>,
    phase: Phase,
}

impl Trainer {
    pub fn new(alpha: f32) -> Self {
        Self::with_capacity(alpha, DEFAULT_TRAJECTORY_CAPACITY)
    }

    pub fn with_capacity(alpha: f32, capacity: usize) -> Self {
        Self { alpha, trajectory: Vec::with_capacity(capacity), phase: Phase::Idle }
    }

    #[inline]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Transitions recorded so far in the current episode, oldest first.
    #[inline]
    pub fn trajectory(&self) -> &[Transition] {
        &self.trajectory
    }

    /// Start a fresh episode, discarding anything left unreplayed.
    pub fn open_episode(&mut self) {
        self.trajectory.clear();
        self.phase = Phase::Recording;
    }

    /// Append an accepted decision. An idle trainer starts recording.
    pub fn record(&mut self, transition: Transition) {
        self.phase = Phase::Recording;
        self.trajectory.push(transition);
    }

    /// Replay the episode backward with TD(0) and return the number of
    /// updates applied to `value`.
    ///
    /// With `G = 0` before the last transition, each transition t, latest
    /// first, applies
    ///
    /// ```text
    /// δ = G − (V_t − r_t)
    /// G = r_t + weight_update(after_t, α·δ)
    /// ```
    ///
    /// so every afterstate is pulled toward the updated value of its
    /// successor. An empty trajectory is a no-op.
    pub fn close_episode<V: ValueFunction + ?Sized>(&mut self, value: &mut V) -> usize {
        self.phase = Phase::Terminal;
        let steps = self.trajectory.len();
        if steps == 0 {
            self.phase = Phase::Idle;
            return 0;
        }

        self.phase = Phase::Replay;
        let mut target = 0.0f32;
        let mut updates = 0usize;
        while let Some(t) = self.trajectory.pop() {
            // V_t − r_t is the afterstate estimate used when the move was chosen
            let error = target - (t.value - t.reward);
            target = t.reward + value.weight_update(&t.after, self.alpha * error);
            updates += 1;
        }
        debug!("replayed {} transitions, first afterstate target {:.3}", updates, target);

        self.phase = Phase::Idle;
        updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{Board, Move};
    use crate::ntuple::{Network, Pattern};

    /// Records every update and answers with scripted post-update values.
    struct Scripted {
        replies: Vec<f32>,
        calls: Vec<(Board, f32)>,
    }

    impl ValueFunction for Scripted {
        fn estimate_board(&self, _board: &Board) -> f32 {
            0.0
        }

        fn weight_update(&mut self, board: &Board, delta: f32) -> f32 {
            self.calls.push((*board, delta));
            self.replies[self.calls.len() - 1]
        }
    }

    fn transition(after: u64, reward: f32, value: f32) -> Transition {
        Transition {
            before: Board::EMPTY,
            after: Board::from_raw(after),
            op: Move::Left,
            reward,
            value,
        }
    }

    #[test]
    fn empty_trajectory_is_a_no_op() {
        let mut trainer = Trainer::new(0.1);
        let mut v = Scripted { replies: vec![], calls: vec![] };
        assert_eq!(trainer.close_episode(&mut v), 0);
        assert!(v.calls.is_empty());
        assert_eq!(trainer.phase(), Phase::Idle);
    }

    #[test]
    fn replays_latest_first_with_bootstrapped_target() {
        let mut trainer = Trainer::new(0.5);
        trainer.open_episode();
        trainer.record(transition(0x1, 2.0, 5.0));
        trainer.record(transition(0x2, 3.0, 4.0));
        assert_eq!(trainer.phase(), Phase::Recording);

        let mut v = Scripted { replies: vec![10.0, 7.0], calls: vec![] };
        assert_eq!(trainer.close_episode(&mut v), 2);

        // δ1 = 0 − (4 − 3) = −1
        assert_eq!(v.calls[0], (Board::from_raw(0x2), 0.5 * -1.0));
        // G = 3 + 10 = 13, δ0 = 13 − (5 − 2) = 10
        assert_eq!(v.calls[1], (Board::from_raw(0x1), 0.5 * 10.0));
        assert!(trainer.trajectory().is_empty());
        assert_eq!(trainer.phase(), Phase::Idle);
    }

    #[test]
    fn one_update_per_transition() {
        let mut trainer = Trainer::with_capacity(0.01, 8);
        for i in 0..37u64 {
            trainer.record(transition(i, i as f32, i as f32 * 2.0));
        }
        let mut v = Scripted { replies: vec![0.0; 37], calls: vec![] };
        assert_eq!(trainer.close_episode(&mut v), 37);
        assert_eq!(v.calls.len(), 37);
        let order: Vec<u64> = v.calls.iter().map(|(b, _)| b.raw()).collect();
        assert_eq!(order, (0..37u64).rev().collect::<Vec<_>>());
        assert!(trainer.trajectory().is_empty());
    }

    #[test]
    fn replay_against_a_real_network() {
        let mut net = Network::new(vec![Pattern::new(vec![0, 1]).unwrap()]).unwrap();
        let after_0 = Board::from_raw(0x1000_0000_0000_0000);
        let after_1 = Board::from_raw(0x2000_0000_0000_0000);
        let mut trainer = Trainer::new(0.25);
        trainer.record(Transition { before: Board::EMPTY, after: after_0, op: Move::Up, reward: 2.0, value: 2.0 });
        trainer.record(Transition { before: after_0, after: after_1, op: Move::Up, reward: 3.0, value: 3.0 });

        let mut expected = net.clone();
        let g = 3.0 + expected.update(&after_1, 0.25 * (0.0 - 0.0));
        expected.update(&after_0, 0.25 * (g - 0.0));

        trainer.close_episode(&mut net);
        assert_eq!(net.tables()[0].values(), expected.tables()[0].values());
        assert!(net.estimate(&after_0) > 0.0);
    }

    #[test]
    fn open_episode_discards_leftovers() {
        let mut trainer = Trainer::new(0.1);
        trainer.record(transition(1, 0.0, 0.0));
        trainer.open_episode();
        assert!(trainer.trajectory().is_empty());
        assert_eq!(trainer.phase(), Phase::Recording);
    }
}
