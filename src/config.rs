use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::playback::{MatchPolicy, DEFAULT_TAIL_GRACE_SEC};
use crate::tempo::DEFAULT_MICROS_PER_BEAT;

pub const CONFIG_PATH: &str = "trainer.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainerConfig {
    /// Notes starting within this many seconds of a chord's first note belong
    /// to that chord.
    pub hit_window_sec: f64,
    /// Require exactly the chord's pitches instead of at least them.
    pub strict: bool,
    pub default_micros_per_beat: u32,
    pub tail_grace_sec: f64,
    /// Tried when the requested file can't be loaded.
    pub fallback_midi_path: PathBuf,
    pub fps: u32,
    pub max_frame_dt_sec: f64,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            hit_window_sec: 0.08,
            strict: false,
            default_micros_per_beat: DEFAULT_MICROS_PER_BEAT,
            tail_grace_sec: DEFAULT_TAIL_GRACE_SEC,
            fallback_midi_path: PathBuf::from("song.mid"),
            fps: 60,
            max_frame_dt_sec: 0.25,
        }
    }
}

impl TrainerConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::parse(&s).with_context(|| format!("parse config {}", path.display()))
    }

    /// Loads `path` if given, else `trainer.toml` when it exists, else the
    /// built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_PATH).exists() => Self::load(CONFIG_PATH),
            None => Ok(Self::default()),
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would stall or corrupt the frame loop.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.hit_window_sec >= 0.0, "hit_window_sec must not be negative");
        ensure!(self.tail_grace_sec >= 0.0, "tail_grace_sec must not be negative");
        ensure!(self.default_micros_per_beat > 0, "default_micros_per_beat must be positive");
        ensure!(self.fps > 0, "fps must be positive");
        ensure!(self.max_frame_dt_sec > 0.0, "max_frame_dt_sec must be positive");
        Ok(())
    }

    pub fn match_policy(&self) -> MatchPolicy {
        MatchPolicy::from_strict(self.strict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(TrainerConfig::parse("").unwrap(), TrainerConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = TrainerConfig::parse("strict = true\nhit_window_sec = 0.05\n").unwrap();
        assert!(config.strict);
        assert_eq!(config.hit_window_sec, 0.05);
        assert_eq!(config.match_policy(), MatchPolicy::Strict);
        assert_eq!(config.tail_grace_sec, 2.0);
        assert_eq!(config.fallback_midi_path, PathBuf::from("song.mid"));
    }

    #[test]
    fn test_bad_type_is_rejected() {
        assert!(TrainerConfig::parse("strict = \"yes\"").is_err());
    }

    #[test]
    fn test_values_that_stall_playback_are_rejected() {
        for bad in [
            "max_frame_dt_sec = 0.0",
            "max_frame_dt_sec = -0.5",
            "hit_window_sec = -0.01",
            "tail_grace_sec = -1.0",
            "default_micros_per_beat = 0",
            "fps = 0",
        ] {
            assert!(TrainerConfig::parse(bad).is_err(), "accepted {}", bad);
        }
        assert!(TrainerConfig::parse("hit_window_sec = 0.0\ntail_grace_sec = 0.0").is_ok());
    }

    #[test]
    fn test_default_is_valid() {
        assert!(TrainerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_round_trips_through_toml() {
        let config = TrainerConfig {
            fps: 120,
            ..TrainerConfig::default()
        };
        let s = toml::to_string(&config).unwrap();
        assert_eq!(TrainerConfig::parse(&s).unwrap(), config);
    }
}
