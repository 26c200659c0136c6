//! ntuple-td: an n-tuple network TD(0) afterstate learner for 2048
//!
//! This crate provides:
//! - A compact `Board` type (`engine`) with table-driven slides, rewards and tile placement
//! - n-tuple weight tables with 8-way symmetry sharing (`ntuple`)
//! - Backward TD(0) replay of recorded episodes and the greedy afterstate policy (`td`)
//! - Agents, the episode loop and block statistics (`agent`, `play`)
//! - A checksummed binary weight format plus a legacy import (`serialization`)
//!
//! Quick start:
//! ```
//! use ntuple_td::agent::{RandomPlacer, TdSlider};
//! use ntuple_td::ntuple::Network;
//! use ntuple_td::play::run_episode;
//! use ntuple_td::td::Trainer;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let net = Network::from_positions(&[vec![0, 1, 2, 3], vec![4, 5, 6, 7]]).unwrap();
//! let mut slider = TdSlider::new(net, Trainer::new(0.1));
//! let mut placer = RandomPlacer::new(StdRng::seed_from_u64(42));
//! let summary = run_episode(&mut slider, &mut placer);
//! assert!(summary.steps > 0);
//! ```
pub mod agent;
pub mod config;
pub mod engine;
pub mod ntuple;
pub mod play;
pub mod serialization;
pub mod td;
