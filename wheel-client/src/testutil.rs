//! Shared test fixtures: canned device states and wire frames

use std::collections::HashMap;

use wheel_proto::{
    DeviceInfo, DeviceState, DeviceStateDelta, EncoderState, LedsState, SectorState,
    ServoMotorInfo, ServoState, ServosState, SoundChannelState, SoundSystemState,
};

pub(crate) fn test_state(num_sectors: usize) -> DeviceState {
    let sectors = (0..num_sectors)
        .map(|index| SectorState {
            index,
            name: format!("Sector {}", index),
            effect_id: "solid".to_string(),
        })
        .collect();

    let mut channels = HashMap::new();
    channels.insert(
        "main".to_string(),
        SoundChannelState {
            volume: 0.5,
            sound_name: None,
        },
    );

    let mut motors = HashMap::new();
    motors.insert(
        "left".to_string(),
        ServoState {
            pos: 0.0,
            duty: 0.05,
            detached: false,
        },
    );

    DeviceState {
        theme_id: "classic".to_string(),
        standby_timer: None,
        sectors,
        encoder: EncoderState {
            sector: 0,
            rpm: 0.0,
            total_revs: 0.0,
            total_sectors: 0,
            missed_sector_count: 0,
            standstill: true,
        },
        leds: LedsState {
            power_on: true,
            brightness: 0.8,
            segments: HashMap::new(),
        },
        servos: ServosState { motors },
        soundsystem: SoundSystemState { channels },
    }
}

pub(crate) fn test_info() -> DeviceInfo {
    let mut servos = HashMap::new();
    servos.insert(
        "left".to_string(),
        ServoMotorInfo {
            mount_angle: 35.0,
            mount_pos: 1.2,
            mount_duty: 0.07,
        },
    );

    DeviceInfo {
        themes: HashMap::new(),
        effects: HashMap::new(),
        servos,
        sounds: HashMap::new(),
        leds_version: "1.2.0".to_string(),
        sound_version: "0.9.1".to_string(),
    }
}

pub(crate) fn init_frame(state: &DeviceState, info: &DeviceInfo) -> String {
    serde_json::json!({
        "cmd": "init",
        "ts": 1.0,
        "state": state,
        "info": info,
    })
    .to_string()
}

pub(crate) fn update_frame(update: &DeviceStateDelta) -> String {
    serde_json::json!({
        "cmd": "update",
        "ts": 2.0,
        "update": update,
    })
    .to_string()
}
