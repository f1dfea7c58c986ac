//! Game tuning, loaded from YAML and validated before a session starts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use driftfield_abilities::{BoostConfig, ShockwaveConfig};
use driftfield_collision::CollisionRadii;
use driftfield_stream::{AsteroidFieldConfig, RescueConfig, StormConfig};

use crate::session::SessionConfig;
use crate::ship::ShipConfig;

const WEIGHT_TOLERANCE: f32 = 1e-3;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Every tunable in one document. Missing sections fall back to defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub session: SessionConfig,
    pub ship: ShipConfig,
    pub asteroids: AsteroidFieldConfig,
    pub rescue: RescueConfig,
    pub storms: StormConfig,
    pub boost: BoostConfig,
    pub shockwave: ShockwaveConfig,
    pub collision: CollisionRadii,
}

impl GameConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        tracing::debug!(path = %path.as_ref().display(), "config loaded");
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session.duration <= 0.0 {
            return Err(invalid("session.duration", "must be positive"));
        }

        let a = &self.asteroids;
        if a.spawn_radius <= 0.0 {
            return Err(invalid("asteroids.spawn_radius", "must be positive"));
        }
        if a.min_spawn_distance > a.max_spawn_distance {
            return Err(invalid(
                "asteroids.spawn_distance",
                format!("min {} exceeds max {}", a.min_spawn_distance, a.max_spawn_distance),
            ));
        }
        if a.variants.is_empty() {
            return Err(invalid("asteroids.variants", "at least one variant required"));
        }
        let total: f32 = a.variants.iter().map(|v| v.weight).sum();
        if (total - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(invalid(
                "asteroids.variants",
                format!("weights sum to {total}, expected 1"),
            ));
        }
        if let Some((i, v)) = a
            .variants
            .iter()
            .enumerate()
            .find(|(_, v)| v.weight < 0.0 || v.min_scale > v.max_scale)
        {
            return Err(invalid(
                "asteroids.variants",
                format!(
                    "variant {i} has weight {} and scale range {}..{}",
                    v.weight, v.min_scale, v.max_scale
                ),
            ));
        }

        let r = &self.rescue;
        if r.despawn_distance <= 0.0 {
            return Err(invalid("rescue.despawn_distance", "must be positive"));
        }
        if r.min_spawn_distance > r.max_spawn_distance {
            return Err(invalid(
                "rescue.spawn_distance",
                format!("min {} exceeds max {}", r.min_spawn_distance, r.max_spawn_distance),
            ));
        }
        if !(0.0..=1.0).contains(&r.spawn_chance) {
            return Err(invalid(
                "rescue.spawn_chance",
                format!("{} is not a probability", r.spawn_chance),
            ));
        }

        if self.storms.min_radius <= 0.0 {
            return Err(invalid("storms.min_radius", "must be positive"));
        }
        if self.storms.lifetime <= 0.0 {
            return Err(invalid("storms.lifetime", "must be positive"));
        }
        if self.boost.duration <= 0.0 {
            return Err(invalid("boost.duration", "must be positive"));
        }
        if self.boost.recharge_rate <= 0.0 {
            return Err(invalid("boost.recharge_rate", "must be positive"));
        }
        if self.shockwave.max_radius <= 0.0 {
            return Err(invalid("shockwave.max_radius", "must be positive"));
        }
        if self.shockwave.duration <= 0.0 {
            return Err(invalid("shockwave.duration", "must be positive"));
        }

        let c = &self.collision;
        if c.rescue <= 0.0 || c.asteroid <= 0.0 {
            return Err(invalid("collision", "radii must be positive"));
        }
        if c.rescue <= c.asteroid {
            return Err(invalid(
                "collision",
                format!(
                    "rescue radius {} must exceed asteroid radius {}",
                    c.rescue, c.asteroid
                ),
            ));
        }

        Ok(())
    }
}
