//! Training configuration.
//!
//! A [`TrainConfig`] comes from a TOML file, from a `key=value` agent
//! argument string, or from defaults; the training binary applies CLI
//! overrides on top and calls [`TrainConfig::validate`] before use.

use std::path::{Path, PathBuf};

use log::warn;
use serde::Deserialize;
use thiserror::Error;

use crate::ntuple::{default_patterns, Pattern, PatternError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("config syntax: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("malformed agent argument `{0}`: expected key=value")]
    MalformedArgument(String),
    #[error("unknown agent argument key `{0}`")]
    UnknownKey(String),
    #[error("invalid value for `{key}`: {reason}")]
    InvalidValue { key: &'static str, reason: String },
    #[error("pattern {index}: {source}")]
    Pattern { index: usize, source: PatternError },
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainConfig {
    /// Learning rate.
    #[serde(default = "defaults::alpha")]
    pub alpha: f32,
    #[serde(default = "defaults::episodes")]
    pub episodes: u64,
    /// RNG seed for the placer; entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Weights to start from.
    #[serde(default)]
    pub load: Option<PathBuf>,
    /// Where to write the trained weights.
    #[serde(default)]
    pub save: Option<PathBuf>,
    #[serde(default = "defaults::patterns")]
    pub patterns: Vec<Vec<u8>>,
    #[serde(default = "defaults::trajectory_capacity")]
    pub trajectory_capacity: usize,
    /// Episodes per statistics block.
    #[serde(default = "defaults::report_every")]
    pub report_every: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            alpha: defaults::alpha(),
            episodes: defaults::episodes(),
            seed: None,
            load: None,
            save: None,
            patterns: defaults::patterns(),
            trajectory_capacity: defaults::trajectory_capacity(),
            report_every: defaults::report_every(),
        }
    }
}

impl TrainConfig {
    pub fn from_toml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Parse whitespace-separated `key=value` pairs on top of the defaults.
    ///
    /// Recognised keys are `alpha`, `episodes`, `seed`, `load` and `save`.
    /// `name`, `role` and `init` are identity or bootstrap hints for the
    /// agent itself and are accepted without effect.
    ///
    /// ```
    /// use ntuple_td::config::TrainConfig;
    /// let cfg = TrainConfig::from_agent_args("name=td alpha=0.025 save=w.bin").unwrap();
    /// assert_eq!(cfg.alpha, 0.025);
    /// assert_eq!(cfg.save.as_deref(), Some(std::path::Path::new("w.bin")));
    /// ```
    pub fn from_agent_args(args: &str) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        for pair in args.split_whitespace() {
            let Some((key, value)) = pair.split_once('=') else {
                return Err(ConfigError::MalformedArgument(pair.to_string()));
            };
            match key {
                "alpha" => cfg.alpha = parse_value("alpha", value)?,
                "episodes" => cfg.episodes = parse_value("episodes", value)?,
                "seed" => cfg.seed = Some(parse_value("seed", value)?),
                "load" => cfg.load = Some(PathBuf::from(value)),
                "save" => cfg.save = Some(PathBuf::from(value)),
                "name" | "role" | "init" => {}
                _ => return Err(ConfigError::UnknownKey(key.to_string())),
            }
        }
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.alpha.is_finite() || self.alpha < 0.0 {
            return Err(ConfigError::InvalidValue {
                key: "alpha",
                reason: format!("{} is not a finite non-negative number", self.alpha),
            });
        }
        if self.alpha == 0.0 {
            warn!("alpha is 0; weights will not change");
        }
        if self.episodes == 0 {
            return Err(ConfigError::InvalidValue { key: "episodes", reason: "must be at least 1".into() });
        }
        if self.report_every == 0 {
            return Err(ConfigError::InvalidValue { key: "report_every", reason: "must be at least 1".into() });
        }
        if self.patterns.is_empty() {
            return Err(ConfigError::InvalidValue { key: "patterns", reason: "at least one pattern is required".into() });
        }
        self.patterns()?;
        if self.load.is_some() && self.load == self.save {
            warn!("load and save point at the same file; it will be overwritten");
        }
        Ok(())
    }

    /// The configured patterns, validated.
    pub fn patterns(&self) -> Result<Vec<Pattern>, ConfigError> {
        self.patterns
            .iter()
            .enumerate()
            .map(|(index, p)| Pattern::new(p.clone()).map_err(|source| ConfigError::Pattern { index, source }))
            .collect()
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue { key, reason: format!("`{value}`: {e}") })
}

mod defaults {
    use super::default_patterns;

    pub fn alpha() -> f32 { 0.1 }
    pub fn episodes() -> u64 { 1000 }
    pub fn trajectory_capacity() -> usize { crate::td::DEFAULT_TRAJECTORY_CAPACITY }
    pub fn report_every() -> u64 { 1000 }

    pub fn patterns() -> Vec<Vec<u8>> {
        default_patterns().into_iter().map(|p| p.positions().to_vec()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let cfg = TrainConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.alpha, 0.1);
        assert_eq!(cfg.patterns.len(), 4);
        assert_eq!(cfg.patterns[0], vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(cfg.trajectory_capacity, 65_536);
    }

    #[test]
    fn toml_fills_missing_fields_with_defaults() {
        let cfg = TrainConfig::from_toml_str(
            r#"
            alpha = 0.0025
            episodes = 50
            save = "out.bin"
            patterns = [[0, 1, 2, 3], [4, 5, 6, 7]]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.alpha, 0.0025);
        assert_eq!(cfg.episodes, 50);
        assert_eq!(cfg.save, Some(PathBuf::from("out.bin")));
        assert_eq!(cfg.load, None);
        assert_eq!(cfg.patterns.len(), 2);
        assert_eq!(cfg.report_every, 1000);
        cfg.validate().unwrap();
    }

    #[test]
    fn toml_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "episodes = 7\nseed = 42").unwrap();
        let cfg = TrainConfig::from_toml(file.path()).unwrap();
        assert_eq!(cfg.episodes, 7);
        assert_eq!(cfg.seed, Some(42));
    }

    #[test]
    fn toml_rejects_unknown_fields() {
        assert!(matches!(TrainConfig::from_toml_str("gamma = 0.9"), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn agent_args() {
        let cfg = TrainConfig::from_agent_args("name=learner role=player alpha=0.5 load=a.bin save=b.bin seed=3").unwrap();
        assert_eq!(cfg.alpha, 0.5);
        assert_eq!(cfg.load, Some(PathBuf::from("a.bin")));
        assert_eq!(cfg.save, Some(PathBuf::from("b.bin")));
        assert_eq!(cfg.seed, Some(3));
        assert_eq!(TrainConfig::from_agent_args("").unwrap(), TrainConfig::default());
    }

    #[test]
    fn agent_args_errors() {
        assert!(matches!(TrainConfig::from_agent_args("alpha"), Err(ConfigError::MalformedArgument(_))));
        assert!(matches!(TrainConfig::from_agent_args("lambda=0.5"), Err(ConfigError::UnknownKey(k)) if k == "lambda"));
        assert!(matches!(
            TrainConfig::from_agent_args("alpha=fast"),
            Err(ConfigError::InvalidValue { key: "alpha", .. })
        ));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let bad_alpha = TrainConfig { alpha: f32::NAN, ..TrainConfig::default() };
        assert!(matches!(bad_alpha.validate(), Err(ConfigError::InvalidValue { key: "alpha", .. })));
        let negative = TrainConfig { alpha: -0.1, ..TrainConfig::default() };
        assert!(negative.validate().is_err());
        let no_episodes = TrainConfig { episodes: 0, ..TrainConfig::default() };
        assert!(matches!(no_episodes.validate(), Err(ConfigError::InvalidValue { key: "episodes", .. })));
        let bad_pattern = TrainConfig { patterns: vec![vec![0, 1], vec![3, 3]], ..TrainConfig::default() };
        assert!(matches!(bad_pattern.validate(), Err(ConfigError::Pattern { index: 1, .. })));
        let empty = TrainConfig { patterns: vec![], ..TrainConfig::default() };
        assert!(empty.validate().is_err());
    }
}
