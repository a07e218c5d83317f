//! Servo subsystem state
//!
//! The servos swing the side logos in and out of the wheel's display area.
//! Positions are fractions of the calibrated travel range; writes may
//! overshoot slightly (down to -0.3, up to 1.3) to reach the mechanical
//! release position used when a logo is unmounted.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::clamp::clamp_servo_pos;

/// State of a single servo motor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServoState {
    /// Position as a fraction of the calibrated travel range
    pub pos: f64,
    /// PWM duty cycle currently applied
    pub duty: f64,
    /// Whether the servo is detached (not holding position)
    pub detached: bool,
}

/// State of the servo subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServosState {
    /// Motors keyed by motor name (e.g. `"left"`, `"right"`)
    pub motors: HashMap<String, ServoState>,
}

/// Partial client-side write for a single servo
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServoIn {
    /// Target position, if the servo should move
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pos: Option<f64>,
    /// Whether to detach the servo after this command
    #[serde(default)]
    pub detached: bool,
}

impl ServoIn {
    /// Move to a position (clamped to the mechanical range) and stay attached
    pub fn goto(pos: f64) -> Self {
        Self {
            pos: Some(clamp_servo_pos(pos)),
            detached: false,
        }
    }

    /// Release the servo without commanding a move
    pub fn detach() -> Self {
        Self {
            pos: None,
            detached: true,
        }
    }
}

/// Partial client-side write for the servo subsystem
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServosIn {
    /// Motor writes keyed by motor name; absent motors are untouched
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub motors: HashMap<String, ServoIn>,
}

impl ServosIn {
    /// A write touching a single motor
    pub fn motor(name: impl Into<String>, servo: ServoIn) -> Self {
        let mut motors = HashMap::new();
        motors.insert(name.into(), servo);
        Self { motors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goto_respects_mechanical_range() {
        assert_eq!(ServoIn::goto(-0.3).pos, Some(-0.3));
        assert_eq!(ServoIn::goto(-1.0).pos, Some(-0.3));
        assert_eq!(ServoIn::goto(2.0).pos, Some(1.3));
    }

    #[test]
    fn test_detach_has_no_position() {
        let servo = ServoIn::detach();
        assert!(servo.pos.is_none());
        assert!(servo.detached);

        let json = serde_json::to_string(&servo).unwrap();
        assert!(!json.contains("pos"));
    }
}
