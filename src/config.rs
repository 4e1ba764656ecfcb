//! Tunable game constants, loadable from a TOML file.
//!
//! Every table is `#[serde(default)]`, so a file only needs the keys it
//! changes. Defaults reproduce the arcade's stock tuning.

use std::{fs, path::Path};

use serde::Deserialize;

/// Error type for configuration loading.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Reading the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for `GameConfig`
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values that would make the simulation meaningless
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub max_health: u32,
    pub power_up_limit_ms: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 20,
            power_up_limit_ms: 10_000.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct AmmoConfig {
    pub starting: f32,
    pub max: f32,
    pub interval_ms: f32,
    /// Added every frame while powered up.
    pub power_up_regen: f32,
}

impl Default for AmmoConfig {
    fn default() -> Self {
        Self {
            starting: 20.0,
            max: 50.0,
            interval_ms: 350.0,
            power_up_regen: 0.1,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct SpawnerConfig {
    pub interval_ms: f32,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000.0,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct GameConfig {
    pub width: f32,
    pub height: f32,
    /// World scroll rate in pixels per frame.
    pub speed: f32,
    pub time_limit_ms: f32,
    pub winning_score: u32,
    /// Fade alpha step per frame, not scaled by delta time.
    pub fade_speed: f32,
    /// Clamp applied by the frame driver; `None` passes deltas through.
    pub max_frame_delta_ms: Option<f32>,
    pub player: PlayerConfig,
    pub ammo: AmmoConfig,
    pub spawner: SpawnerConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 500.0,
            speed: 1.0,
            time_limit_ms: 60_000.0,
            winning_score: 100,
            fade_speed: 0.03,
            max_frame_delta_ms: None,
            player: PlayerConfig::default(),
            ammo: AmmoConfig::default(),
            spawner: SpawnerConfig::default(),
        }
    }
}

impl GameConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let cfg: GameConfig = toml::from_str(text)?;
        cfg.check()?;
        Ok(cfg)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let data = fs::read_to_string(&path)?;
        Self::from_toml_str(&data)
    }

    /// Falls back to defaults, handing back the reason when loading failed.
    pub fn load_or_default(path: impl AsRef<Path>) -> (Self, Option<ConfigError>) {
        match Self::load_from_file(&path) {
            Ok(cfg) => (cfg, None),
            Err(e) => (Self::default(), Some(e)),
        }
    }

    /// Hard constraints; a config failing these is rejected outright.
    pub fn check(&self) -> Result<()> {
        if self.width <= 0.0 || self.height <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "viewport must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.fade_speed <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "fade_speed must be > 0, got {}",
                self.fade_speed
            )));
        }
        Ok(())
    }

    /// Soft problems worth logging; the game still runs with them.
    pub fn validate(&self) -> Vec<String> {
        let mut w = Vec::new();
        if self.fade_speed > 1.0 {
            w.push(format!(
                "fade_speed {} above 1; fades complete in a single frame",
                self.fade_speed
            ));
        }
        if self.spawner.interval_ms <= 0.0 {
            w.push("spawner.interval_ms <= 0; an enemy spawns every other frame".into());
        }
        if self.ammo.interval_ms <= 0.0 {
            w.push("ammo.interval_ms <= 0; ammo refills every other frame".into());
        }
        if self.ammo.starting > self.ammo.max {
            w.push(format!(
                "ammo.starting {} exceeds ammo.max {}",
                self.ammo.starting, self.ammo.max
            ));
        }
        if self.player.max_health == 0 {
            w.push("player.max_health is 0; every playthrough ends immediately".into());
        }
        if self.time_limit_ms <= 0.0 {
            w.push("time_limit_ms <= 0; every playthrough ends on the first frame".into());
        }
        if let Some(max) = self.max_frame_delta_ms {
            if max <= 0.0 {
                w.push(format!("max_frame_delta_ms {max} <= 0 freezes the simulation"));
            }
        }
        w
    }
}
