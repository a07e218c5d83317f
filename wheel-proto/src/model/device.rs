//! Root device-state tree and its partial shapes
//!
//! Three shapes share the same section names but differ in strictness:
//!
//! - [`DeviceState`]: the full mirrored tree, replaced wholesale by an
//!   `init` packet.
//! - [`DeviceStateDelta`]: an inbound partial update; present sections are
//!   sent whole and replace their counterpart, absent sections mean
//!   "unchanged" (never "reset to default").
//! - [`DeviceStateIn`]: an outbound client write; nested objects may
//!   themselves be partial, and sectors are keyed by index instead of
//!   arriving as the full ordered sequence.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{
    EncoderState, LedsIn, LedsState, SectorIn, SectorState, ServoIn, ServosIn, ServosState,
    SoundChannelIn, SoundSystemIn, SoundSystemState,
};

/// Canonical mirrored state of the wheel device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceState {
    /// Id of the active theme, referencing `DeviceInfo::themes`
    pub theme_id: String,
    /// Seconds until standby power-down, when a countdown is running
    pub standby_timer: Option<f64>,
    /// Ordered sectors; `sectors[i].index == i`, length fixed after init
    pub sectors: Vec<SectorState>,
    /// Rotary encoder readout (device-authoritative)
    pub encoder: EncoderState,
    /// LED subsystem
    pub leds: LedsState,
    /// Servo subsystem
    pub servos: ServosState,
    /// Sound subsystem
    pub soundsystem: SoundSystemState,
}

/// Inbound partial update; only present sections changed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStateDelta {
    /// New active theme id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,
    /// New standby countdown; `Some(None)` clears a running countdown
    #[serde(default, with = "double_option", skip_serializing_if = "Option::is_none")]
    pub standby_timer: Option<Option<f64>>,
    /// Full replacement sector sequence
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sectors: Option<Vec<SectorState>>,
    /// Full replacement encoder readout
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoder: Option<EncoderState>,
    /// Full replacement LED state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leds: Option<LedsState>,
    /// Full replacement servo state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servos: Option<ServosState>,
    /// Full replacement sound state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soundsystem: Option<SoundSystemState>,
}

impl DeviceStateDelta {
    /// Whether the delta carries no sections at all
    pub fn is_empty(&self) -> bool {
        self.theme_id.is_none()
            && self.standby_timer.is_none()
            && self.sectors.is_none()
            && self.encoder.is_none()
            && self.leds.is_none()
            && self.servos.is_none()
            && self.soundsystem.is_none()
    }
}

/// Distinguishes "field absent" from "field present and null" for
/// `standby_timer`, which the device uses to clear a running countdown.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<T, S>(value: &Option<Option<T>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        T: Serialize,
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
    where
        T: Deserialize<'de>,
        D: Deserializer<'de>,
    {
        Option::<T>::deserialize(deserializer).map(Some)
    }
}

/// Outbound client-authored partial write
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceStateIn {
    /// Theme to activate
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme_id: Option<String>,
    /// Sector writes keyed by sector index
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub sectors: HashMap<usize, SectorIn>,
    /// LED write
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leds: Option<LedsIn>,
    /// Servo write
    #[serde(skip_serializing_if = "Option::is_none")]
    pub servos: Option<ServosIn>,
    /// Sound write
    #[serde(skip_serializing_if = "Option::is_none")]
    pub soundsystem: Option<SoundSystemIn>,
}

impl DeviceStateIn {
    /// Write activating a theme
    pub fn theme(theme_id: impl Into<String>) -> Self {
        Self {
            theme_id: Some(theme_id.into()),
            ..Self::default()
        }
    }

    /// Write editing a single sector
    pub fn sector(index: usize, sector: SectorIn) -> Self {
        let mut sectors = HashMap::new();
        sectors.insert(index, sector);
        Self {
            sectors,
            ..Self::default()
        }
    }

    /// Write setting the master LED brightness (clamped)
    pub fn brightness(value: f64) -> Self {
        Self {
            leds: Some(LedsIn::brightness(value)),
            ..Self::default()
        }
    }

    /// Write commanding a single servo
    pub fn servo(motor: impl Into<String>, servo: ServoIn) -> Self {
        Self {
            servos: Some(ServosIn::motor(motor, servo)),
            ..Self::default()
        }
    }

    /// Write setting one channel's volume (clamped)
    pub fn volume(channel: impl Into<String>, value: f64) -> Self {
        Self {
            soundsystem: Some(SoundSystemIn::channel(channel, SoundChannelIn::volume(value))),
            ..Self::default()
        }
    }

    /// Write loading a sound onto one channel
    pub fn channel_sound(channel: impl Into<String>, sound: impl Into<String>) -> Self {
        Self {
            soundsystem: Some(SoundSystemIn::channel(channel, SoundChannelIn::sound(sound))),
            ..Self::default()
        }
    }
}
