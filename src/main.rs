use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use ntuple_td::agent::{Agent, RandomPlacer, TdSlider};
use ntuple_td::config::TrainConfig;
use ntuple_td::engine as GameEngine;
use ntuple_td::ntuple::Network;
use ntuple_td::play::{run_episode, Stats};
use ntuple_td::td::Trainer;

#[derive(Parser, Debug)]
#[command(name = "ntuple-td", version, about = "Train an n-tuple network for 2048 by TD(0) self-play")]
struct Args {
    /// TOML training config
    #[arg(long, value_name = "FILE", conflicts_with = "agent_args")]
    config: Option<PathBuf>,

    /// Agent arguments in key=value form, e.g. "alpha=0.1 load=w.bin save=w.bin"
    #[arg(long, value_name = "ARGS")]
    agent_args: Option<String>,

    /// Learning rate
    #[arg(long)]
    alpha: Option<f32>,

    /// Episodes to play
    #[arg(long, short = 'n')]
    episodes: Option<u64>,

    /// Weights to start from
    #[arg(long, value_name = "FILE")]
    load: Option<PathBuf>,

    /// Read `--load` in the legacy unversioned layout
    #[arg(long)]
    legacy: bool,

    /// Where to write the trained weights
    #[arg(long, value_name = "FILE")]
    save: Option<PathBuf>,

    /// Placer RNG seed
    #[arg(long)]
    seed: Option<u64>,

    /// Episodes per statistics block
    #[arg(long, value_name = "N")]
    report_every: Option<u64>,

    /// Disable the progress spinner
    #[arg(long, default_value_t = false)]
    quiet: bool,
}

impl Args {
    fn resolve(&self) -> Result<TrainConfig> {
        let mut cfg = match (&self.config, &self.agent_args) {
            (Some(path), _) => TrainConfig::from_toml(path).with_context(|| format!("reading {}", path.display()))?,
            (None, Some(args)) => TrainConfig::from_agent_args(args)?,
            (None, None) => TrainConfig::default(),
        };
        if let Some(alpha) = self.alpha {
            cfg.alpha = alpha;
        }
        if let Some(episodes) = self.episodes {
            cfg.episodes = episodes;
        }
        if let Some(load) = &self.load {
            cfg.load = Some(load.clone());
        }
        if let Some(save) = &self.save {
            cfg.save = Some(save.clone());
        }
        if self.seed.is_some() {
            cfg.seed = self.seed;
        }
        if let Some(n) = self.report_every {
            cfg.report_every = n;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cfg = args.resolve()?;
    GameEngine::new();

    let mut network = Network::new(cfg.patterns()?)?;
    if let Some(path) = &cfg.load {
        if args.legacy {
            network.load_legacy(path)?;
        } else {
            network.load(path)?;
        }
    }

    let trainer = Trainer::with_capacity(cfg.alpha, cfg.trajectory_capacity);
    let mut slider = TdSlider::new(network, trainer);
    let rng = cfg.seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let mut placer = RandomPlacer::new(rng);
    info!(
        "training {} vs {} for {} episodes, alpha {}",
        slider.name(),
        placer.name(),
        cfg.episodes,
        cfg.alpha
    );

    let pb = if args.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::with_template("{spinner} {elapsed_precise} | Episodes: {msg}")?
                .tick_chars("⠁⠃⠇⠧⠷⠿⠻⠟⠯⠷⠧⠇⠃"),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb
    };

    let start = Instant::now();
    let mut stats = Stats::new(cfg.report_every);
    let mut moves = 0u64;
    for episode in 1..=cfg.episodes {
        let summary = run_episode(&mut slider, &mut placer);
        moves += summary.steps as u64;
        if let Some(report) = stats.push(&summary) {
            pb.suspend(|| info!("{report}"));
        }
        if episode % 10 == 0 {
            let rate = moves as f64 / start.elapsed().as_secs_f64().max(1e-6);
            pb.set_message(format!("{} | moves/sec: {:.0} | last score: {}", episode, rate, summary.score));
        }
    }
    pb.finish_and_clear();
    if let Some(report) = stats.flush() {
        info!("{report}");
    }
    info!("{} moves in {:.1}s", moves, start.elapsed().as_secs_f64());

    if let Some(path) = &cfg.save {
        slider.network().save(path)?;
    }
    Ok(())
}
