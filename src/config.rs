//! Arena configuration loaded from JSON.
//!
//! Every field has a default, so an empty object is a valid configuration.
//! Values are checked by [`ArenaConfig::validate`] after parsing.
use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::numeric::all_finite;
use crate::player::PlayerTuning;
use crate::rival::RivalPalette;
use crate::world::{Bounds, Rgb};

/// Failure to obtain a usable configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid JSON for [`ArenaConfig`].
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// File that failed, or `<inline>` for strings.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },
    /// A value is out of range.
    #[error("invalid config field `{field}`: {reason}")]
    Invalid {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Rival colour pairs handed out in turn.
fn default_palettes() -> Vec<RivalPalette> {
    [
        ((0xFF, 0x44, 0x44), (0xCC, 0x22, 0x22)),
        ((0xAA, 0x44, 0xFF), (0x77, 0x22, 0xCC)),
        ((0xFF, 0x88, 0x00), (0xCC, 0x66, 0x00)),
        ((0x44, 0xDD, 0xFF), (0x22, 0x99, 0xBB)),
        ((0xFF, 0xDD, 0x00), (0xBB, 0x99, 0x00)),
        ((0xFF, 0x44, 0xAA), (0xCC, 0x22, 0x88)),
    ]
    .into_iter()
    .map(|((hr, hg, hb), (br, bg, bb))| RivalPalette {
        head: Rgb::new(hr, hg, hb),
        body: Rgb::new(br, bg, bb),
    })
    .collect()
}

/// Everything the arena driver needs to set up and run a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// World width.
    pub width: f32,
    /// World height.
    pub height: f32,
    /// Default boundary margin.
    pub margin: f32,
    /// Rivals kept alive (dead ones respawn).
    pub rivals: usize,
    /// Prey spawned at start.
    pub initial_prey: usize,
    /// Prey population the arena tops up to.
    pub max_prey: usize,
    /// Boid population reached at full difficulty.
    pub boids: usize,
    /// Hard cap on boids.
    pub max_boids: usize,
    /// Static obstacles placed at start.
    pub obstacles: usize,
    /// Hard cap on static obstacles.
    pub max_obstacles: usize,
    /// Hard cap on moving obstacles.
    pub max_moving_obstacles: usize,
    /// Score per additional moving obstacle.
    pub moving_obstacle_score_step: u32,
    /// Hard cap on food pellets.
    pub max_food: usize,
    /// Hard cap on power-ups on the field.
    pub max_power_ups: usize,
    /// Ticks between power-up spawns.
    pub power_up_interval: u32,
    /// Ticks between static obstacle spawns.
    pub obstacle_spawn_interval: u32,
    /// Ticks between static obstacle removals.
    pub obstacle_despawn_interval: u32,
    /// Ticks a dead rival waits before respawning.
    pub rival_respawn_delay: u32,
    /// Difficulty floor, raised by score.
    pub initial_difficulty: f32,
    /// Seed of the arena's random number generator.
    pub seed: u64,
    /// Let the built-in AI steer the player.
    pub autoplay: bool,
    /// Player tuning.
    pub player: PlayerTuning,
    /// Rival colours, assigned round-robin.
    pub palettes: Vec<RivalPalette>,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            margin: 40.0,
            rivals: 6,
            initial_prey: 18,
            max_prey: 25,
            boids: 20,
            max_boids: 20,
            obstacles: 6,
            max_obstacles: 12,
            max_moving_obstacles: 5,
            moving_obstacle_score_step: 5,
            max_food: 150,
            max_power_ups: 3,
            power_up_interval: 900,
            obstacle_spawn_interval: 600,
            obstacle_despawn_interval: 900,
            rival_respawn_delay: 300,
            initial_difficulty: 0.15,
            seed: 0,
            autoplay: true,
            player: PlayerTuning::default(),
            palettes: default_palettes(),
        }
    }
}

impl ArenaConfig {
    /// Parses and validates a JSON document.
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for out-of-range values.
    ///
    /// # Examples
    /// ```
    /// use serpentine::config::ArenaConfig;
    /// let config = ArenaConfig::from_json_str(r#"{ "rivals": 2, "seed": 7 }"#)?;
    /// assert_eq!(config.rivals, 2);
    /// assert_eq!(config.max_prey, 25);
    /// # Ok::<(), serpentine::config::ConfigError>(())
    /// ```
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON file.
    ///
    /// # Errors
    /// Returns [`ConfigError::Io`] when the file cannot be read, otherwise
    /// as [`ArenaConfig::from_json_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        info!("loaded arena config from {}", path.display());
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, reason: &str| ConfigError::Invalid {
            field,
            reason: reason.to_owned(),
        };
        if !all_finite(&[self.width, self.height, self.margin, self.initial_difficulty]) {
            return Err(invalid("width", "world values must be finite"));
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(invalid("width", "world size must be positive"));
        }
        if self.margin < 0.0 {
            return Err(invalid("margin", "must not be negative"));
        }
        if !(0.0..=1.0).contains(&self.initial_difficulty) {
            return Err(invalid("initial_difficulty", "must lie in [0, 1]"));
        }
        let p = &self.player;
        let tuning = [
            p.max_speed,
            p.max_force,
            p.seek_weight,
            p.avoid_weight,
            p.boundaries_weight,
            p.ai_perception,
            p.seg_size,
        ];
        if !all_finite(&tuning) || tuning.iter().any(|v| *v < 0.0) {
            return Err(invalid("player", "tuning values must be finite and non-negative"));
        }
        if p.seg_size <= 0.0 {
            return Err(invalid("player", "segment size must be positive"));
        }
        if self.palettes.is_empty() {
            return Err(invalid("palettes", "at least one rival colour pair is required"));
        }
        if self.moving_obstacle_score_step == 0 {
            return Err(invalid("moving_obstacle_score_step", "must be positive"));
        }
        Ok(())
    }

    /// World rectangle described by this configuration.
    #[must_use]
    pub const fn bounds(&self) -> Bounds {
        Bounds::new(self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn empty_object_yields_defaults() {
        let config = ArenaConfig::from_json_str("{}").unwrap_or_default();
        assert_eq!(config, ArenaConfig::default());
        assert_eq!(config.palettes.len(), 6);
    }

    #[test]
    fn palettes_are_hex_strings() {
        let config = ArenaConfig::from_json_str(
            r##"{ "palettes": [ { "head": "#00FF00", "body": "#008800" } ] }"##,
        );
        assert!(matches!(config, Ok(c) if c.palettes[0].head == Rgb::new(0, 255, 0)));
    }

    #[rstest]
    #[case::negative_width(r#"{ "width": -5 }"#, "width")]
    #[case::negative_margin(r#"{ "margin": -1 }"#, "margin")]
    #[case::difficulty(r#"{ "initial_difficulty": 2.0 }"#, "initial_difficulty")]
    #[case::no_palettes(r#"{ "palettes": [] }"#, "palettes")]
    #[case::zero_segments(r#"{ "player": { "seg_size": 0 } }"#, "player")]
    fn bad_values_are_rejected(#[case] json: &str, #[case] expected: &str) {
        match ArenaConfig::from_json_str(json) {
            Err(ConfigError::Invalid { field, .. }) => assert_eq!(field, expected),
            other => panic!("expected invalid {expected}, got {other:?}"),
        }
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            ArenaConfig::from_json_str("{ nope"),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = ArenaConfig::load(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
