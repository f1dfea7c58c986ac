use glam::{EulerRot, Quat, Vec3};
use serde::{Deserialize, Serialize};

use driftfield_common::Transform;
use driftfield_input::ControlState;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShipConfig {
    /// Cruise speed in units per second. The ship never stops.
    pub base_speed: f32,
    /// Radians per second for pitch and yaw.
    pub turn_speed: f32,
    /// Cosmetic roll while yawing.
    pub bank_angle: f32,
    /// Per-frame blend toward the bank target.
    pub bank_rate: f32,
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self {
            base_speed: 60.0,
            turn_speed: 4.0,
            bank_angle: 0.3,
            bank_rate: 0.1,
        }
    }
}

/// The player ship: always moving forward, steered by pitch and yaw.
#[derive(Debug, Clone, PartialEq)]
pub struct Ship {
    config: ShipConfig,
    position: Vec3,
    pitch: f32,
    yaw: f32,
    roll: f32,
    velocity: Vec3,
}

impl Ship {
    pub fn new(config: ShipConfig) -> Self {
        Self {
            config,
            position: Vec3::ZERO,
            pitch: 0.0,
            yaw: 0.0,
            roll: 0.0,
            velocity: Vec3::ZERO,
        }
    }

    pub fn config(&self) -> &ShipConfig {
        &self.config
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.pitch, self.yaw, self.roll)
    }

    /// Unit heading: local +Z rotated into the world.
    pub fn forward(&self) -> Vec3 {
        (self.rotation() * Vec3::Z).normalize_or_zero()
    }

    /// Displacement over the last update.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position,
            rotation: Vec3::new(self.pitch, self.yaw, self.roll),
            scale: 1.0,
        }
    }

    /// Move along the current heading, then apply steering for next frame.
    pub fn update(&mut self, controls: &ControlState, speed_multiplier: f32, dt: f32) {
        let previous = self.position;
        let step = self.config.base_speed * speed_multiplier.max(0.0) * dt;
        self.position += self.forward() * step;

        let turn = self.config.turn_speed * dt;
        let mut bank = 0.0;
        if controls.yaw_left {
            self.yaw += turn;
            bank = self.config.bank_angle;
        }
        if controls.yaw_right {
            self.yaw -= turn;
            bank = -self.config.bank_angle;
        }
        if controls.pitch_up {
            self.pitch -= turn;
        }
        if controls.pitch_down {
            self.pitch += turn;
        }
        self.roll += (bank - self.roll) * self.config.bank_rate;

        self.velocity = self.position - previous;
    }
}

impl Default for Ship {
    fn default() -> Self {
        Self::new(ShipConfig::default())
    }
}
