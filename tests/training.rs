use ntuple_td::agent::{RandomPlacer, TdSlider};
use ntuple_td::config::TrainConfig;
use ntuple_td::ntuple::Network;
use ntuple_td::play::{run_episode, Stats};
use ntuple_td::serialization::{read_weights_from_path, write_legacy_weights_to_path};
use ntuple_td::td::{Phase, Trainer};
use rand::{rngs::StdRng, SeedableRng};

fn small_network() -> Network {
    Network::from_positions(&[vec![0, 1, 2, 3], vec![4, 5, 6, 7], vec![0, 1, 4, 5]]).unwrap()
}

fn train(episodes: u64, seed: u64) -> (TdSlider, Stats) {
    let mut slider = TdSlider::new(small_network(), Trainer::new(0.1));
    let mut placer = RandomPlacer::new(StdRng::seed_from_u64(seed));
    let mut stats = Stats::new(episodes);
    for _ in 0..episodes {
        let summary = run_episode(&mut slider, &mut placer);
        assert!(summary.final_board.is_game_over());
        stats.push(&summary);
    }
    (slider, stats)
}

#[test]
fn self_play_moves_the_weights() {
    let (slider, stats) = train(20, 5);
    assert_eq!(stats.episodes(), 20);
    assert_eq!(slider.trainer().phase(), Phase::Idle);
    assert!(slider.trainer().trajectory().is_empty());
    let touched: usize = slider.network().tables().iter().map(|t| t.values().iter().filter(|&&v| v != 0.0).count()).sum();
    assert!(touched > 0);
}

#[test]
fn training_is_deterministic_for_a_seed() {
    let (a, _) = train(5, 77);
    let (b, _) = train(5, 77);
    for (ta, tb) in a.network().tables().iter().zip(b.network().tables()) {
        assert_eq!(ta.values(), tb.values());
    }
}

#[test]
fn trained_weights_survive_save_and_load() {
    let (slider, _) = train(5, 11);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("weights.bin");
    slider.network().save(&path).unwrap();

    let mut restored = small_network();
    restored.load(&path).unwrap();
    for (a, b) in slider.network().tables().iter().zip(restored.tables()) {
        let a: Vec<u32> = a.values().iter().map(|v| v.to_bits()).collect();
        let b: Vec<u32> = b.values().iter().map(|v| v.to_bits()).collect();
        assert_eq!(a, b);
    }

    // A network with a different shape refuses the file.
    let mut other = Network::from_positions(&[vec![0, 1, 2]]).unwrap();
    assert!(other.load(&path).is_err());
}

#[test]
fn legacy_file_imports_and_continues_training() {
    let (slider, _) = train(3, 21);
    let views: Vec<&[f32]> = slider.network().tables().iter().map(|t| t.values()).collect();
    let dir = tempfile::tempdir().unwrap();
    let legacy = dir.path().join("legacy.bin");
    write_legacy_weights_to_path(&legacy, &views).unwrap();

    let mut net = small_network();
    net.load_legacy(&legacy).unwrap();
    assert_eq!(net.tables()[0].values(), slider.network().tables()[0].values());

    let mut resumed = TdSlider::new(net, Trainer::new(0.05));
    let mut placer = RandomPlacer::new(StdRng::seed_from_u64(1));
    run_episode(&mut resumed, &mut placer);

    let out = dir.path().join("resumed.bin");
    resumed.network().save(&out).unwrap();
    assert_eq!(read_weights_from_path(&out).unwrap().len(), 3);
}

#[test]
fn config_drives_a_network() {
    let cfg = TrainConfig { patterns: vec![vec![0, 1, 2, 3], vec![12, 13, 14, 15]], ..TrainConfig::from_agent_args("alpha=0.2 episodes=2").unwrap() };
    cfg.validate().unwrap();
    let net = Network::new(cfg.patterns().unwrap()).unwrap();
    assert_eq!(net.tables().len(), 2);
    assert_eq!(net.tables()[0].len(), 1 << 16);
    let mut slider = TdSlider::new(net, Trainer::with_capacity(cfg.alpha, cfg.trajectory_capacity));
    let mut placer = RandomPlacer::new(StdRng::seed_from_u64(cfg.seed.unwrap_or(0)));
    for _ in 0..cfg.episodes {
        run_episode(&mut slider, &mut placer);
    }
    assert_eq!(slider.trainer().alpha(), 0.2);
}
