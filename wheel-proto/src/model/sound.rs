//! Sound subsystem state

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::clamp::clamp_unit;

/// State of a single mixer channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundChannelState {
    /// Channel volume fraction in `[0, 1]`
    pub volume: f64,
    /// Sound currently loaded on the channel, if any
    pub sound_name: Option<String>,
}

/// State of the sound subsystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoundSystemState {
    /// Mixer channels keyed by channel name (e.g. `"main"`, `"effects"`)
    pub channels: HashMap<String, SoundChannelState>,
}

/// Partial client-side write for a single mixer channel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundChannelIn {
    /// New volume, if changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// Sound to load on the channel, if changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sound_name: Option<String>,
}

impl SoundChannelIn {
    /// Set the channel volume, clamped to `[0, 1]`
    pub fn volume(value: f64) -> Self {
        Self {
            volume: Some(clamp_unit(value)),
            sound_name: None,
        }
    }

    /// Load a sound onto the channel
    pub fn sound(name: impl Into<String>) -> Self {
        Self {
            volume: None,
            sound_name: Some(name.into()),
        }
    }
}

/// Partial client-side write for the sound subsystem
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundSystemIn {
    /// Channel writes keyed by channel name; absent channels are untouched
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub channels: HashMap<String, SoundChannelIn>,
}

impl SoundSystemIn {
    /// A write touching a single channel
    pub fn channel(name: impl Into<String>, channel: SoundChannelIn) -> Self {
        let mut channels = HashMap::new();
        channels.insert(name.into(), channel);
        Self { channels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_is_clamped() {
        assert_eq!(SoundChannelIn::volume(2.0).volume, Some(1.0));
        assert_eq!(SoundChannelIn::volume(0.25).volume, Some(0.25));
    }

    #[test]
    fn test_null_sound_name_deserializes() {
        let json = r#"{"volume": 0.5, "sound_name": null}"#;
        let state: SoundChannelState = serde_json::from_str(json).unwrap();
        assert!(state.sound_name.is_none());
    }
}
