// config.rs — viewer configuration (grid resolution, sensitivity, roll policy)

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::addressing::DEFAULT_ANGLE_STEP;
use crate::selector::hemisphere_epsilon;

/// Name of the optional per-dataset configuration file.
pub const DATASET_CONFIG_FILE: &str = "thumbnail.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("angle step {0} must be a non-zero divisor of 180")]
    InvalidAngleStep(u32),
    #[error("rotation factor {0} must be finite and positive")]
    InvalidRotationFactor(f64),
}

/// When the roll correction reaches the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollPolicy {
    /// Keep the rotation pending until the new image finished loading.
    #[default]
    Deferred,
    /// Rotate right away, possibly still showing the previous image.
    Immediate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Grid resolution in degrees. Must match the dataset's sampling.
    pub angle_step: u32,
    /// Pointer sensitivity multiplier.
    pub rotation_factor: f64,
    pub roll_policy: RollPolicy,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            angle_step: DEFAULT_ANGLE_STEP,
            rotation_factor: 1.0,
            roll_policy: RollPolicy::Deferred,
        }
    }
}

/// Rotation factors must be finite and positive.
pub fn check_rotation_factor(rotation_factor: f64) -> Result<(), ConfigError> {
    if !rotation_factor.is_finite() || rotation_factor <= 0.0 {
        return Err(ConfigError::InvalidRotationFactor(rotation_factor));
    }
    Ok(())
}

impl ViewerConfig {
    pub fn with_angle_step(angle_step: u32) -> Self {
        Self {
            angle_step,
            ..Self::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: ViewerConfig = serde_json::from_str(&text)?;
        config.validate()?;
        log::debug!("loaded viewer config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Loads `thumbnail.json` from a dataset directory if there is one.
    pub fn load_for_dataset(dir: &Path) -> Result<Option<Self>, ConfigError> {
        let path = dir.join(DATASET_CONFIG_FILE);
        if !path.is_file() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }

    /// Phi values come out of a mirror about 180 degrees, so only divisors of
    /// 180 keep every selection on the grid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.angle_step == 0 || 180 % self.angle_step != 0 {
            return Err(ConfigError::InvalidAngleStep(self.angle_step));
        }
        check_rotation_factor(self.rotation_factor)
    }

    pub fn epsilon(&self) -> f64 {
        hemisphere_epsilon(self.angle_step)
    }
}
