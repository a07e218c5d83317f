//! LED subsystem state

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::clamp::clamp_unit;

/// State of a single addressable LED segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedSegmentState {
    /// Whether the segment is lit at all
    pub enabled: bool,
    /// Segment brightness fraction in `[0, 1]`
    pub brightness: f64,
    /// Active color palette name
    pub palette: String,
    /// Primary color as `#RRGGBB`
    pub primary_color: String,
    /// Secondary color as `#RRGGBB`
    pub secondary_color: String,
    /// Animation effect name
    pub effect: String,
    /// Effect speed fraction in `[0, 1]`
    pub effect_speed: f64,
    /// Effect intensity fraction in `[0, 1]`
    pub effect_intensity: f64,
}

/// State of the whole LED subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedsState {
    /// Master power switch
    pub power_on: bool,
    /// Master brightness fraction in `[0, 1]`
    pub brightness: f64,
    /// Segments keyed by segment name (e.g. `"ring"`, `"glow"`)
    pub segments: HashMap<String, LedSegmentState>,
}

/// Partial client-side write for the LED subsystem
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedsIn {
    /// New master brightness, if changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
}

impl LedsIn {
    /// Set the master brightness, clamped to `[0, 1]`
    pub fn brightness(value: f64) -> Self {
        Self {
            brightness: Some(clamp_unit(value)),
        }
    }
}
