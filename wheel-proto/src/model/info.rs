//! Session-immutable device catalogs
//!
//! `DeviceInfo` is fetched once per connection as part of the `init`
//! packet and never patched by delta packets. It carries the catalogs a
//! UI needs to present choices (themes, effects, sounds) and the servo
//! calibration the command layer needs to drive mount/unmount sequences.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A selectable wheel theme
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThemeInfo {
    /// Human-readable theme name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Ids of themes this one derives from
    pub based_on: Vec<String>,
    /// Sound played when the theme is activated
    pub theme_sound: String,
}

/// A sector effect available on the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectInfo {
    /// Human-readable effect name
    pub name: String,
    /// Free-form description
    pub description: String,
    /// Ids of effects this one derives from
    pub based_on: Vec<String>,
    /// Sound played when the effect triggers
    pub effect_sound: String,
}

/// Calibration data for one servo motor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServoMotorInfo {
    /// Mount angle of the logo arm, degrees
    pub mount_angle: f64,
    /// Travel-range position at which the logo can be (un)mounted
    pub mount_pos: f64,
    /// Duty cycle applied at the mount position
    pub mount_duty: f64,
}

/// A sound file present on the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundInfo {
    /// Playback gain the sound was normalized to
    pub volume: f64,
    /// Length of the sound in seconds
    pub duration_secs: f64,
}

/// Read-only reference data for one device session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInfo {
    /// Available themes keyed by theme id
    pub themes: HashMap<String, ThemeInfo>,
    /// Available sector effects keyed by effect id
    pub effects: HashMap<String, EffectInfo>,
    /// Servo calibration keyed by motor name
    pub servos: HashMap<String, ServoMotorInfo>,
    /// Sounds present on the device keyed by sound name
    pub sounds: HashMap<String, SoundInfo>,
    /// LED subsystem firmware version
    pub leds_version: String,
    /// Sound subsystem firmware version
    pub sound_version: String,
}

impl DeviceInfo {
    /// Look up a sector effect, for fallback rendering decisions
    pub fn effect(&self, effect_id: &str) -> Option<&EffectInfo> {
        self.effects.get(effect_id)
    }

    /// Look up servo calibration for a motor
    pub fn servo(&self, motor: &str) -> Option<&ServoMotorInfo> {
        self.servos.get(motor)
    }
}
