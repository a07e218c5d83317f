//! Wire packets and the inbound frame dispatcher
//!
//! Every frame is a JSON object with a `cmd` discriminator and a `ts`
//! timestamp (seconds, floating point). Two commands arrive from the
//! device (`init`, `update`), one is authored by the client
//! (`set_state`). Frames announcing any other command are surfaced as
//! [`Inbound::Unknown`] so the caller can log and ignore them.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtoError, Result};
use crate::model::{DeviceInfo, DeviceState, DeviceStateDelta, DeviceStateIn};

/// Full snapshot sent once per successful connection open
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitPacket {
    /// Device timestamp, seconds
    pub ts: f64,
    /// Complete device state, replacing any mirror wholesale
    pub state: DeviceState,
    /// Session-immutable catalogs
    pub info: DeviceInfo,
}

/// Partial delta; only present sections changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatePacket {
    /// Device timestamp, seconds
    pub ts: f64,
    /// Changed sections
    pub update: DeviceStateDelta,
}

/// A validated inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// `cmd: "init"` — full snapshot plus catalogs
    Init(InitPacket),
    /// `cmd: "update"` — partial delta
    Update(UpdatePacket),
    /// Any other command; ignored, never fatal
    Unknown {
        /// The unrecognized `cmd` value, for logging
        cmd: String,
    },
}

impl Inbound {
    /// Parse and validate a raw inbound frame
    ///
    /// Returns an error for frames that are not JSON, lack a string `cmd`,
    /// or announce a known command with an invalid payload. Callers drop
    /// the frame on error and continue with the next one.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)?;
        let cmd = value
            .get("cmd")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or(ProtoError::MissingCommand)?;

        match cmd.as_str() {
            "init" => serde_json::from_value(value)
                .map(Inbound::Init)
                .map_err(|source| ProtoError::Payload { cmd: "init", source }),
            "update" => serde_json::from_value(value)
                .map(Inbound::Update)
                .map_err(|source| ProtoError::Payload { cmd: "update", source }),
            _ => Ok(Inbound::Unknown { cmd }),
        }
    }
}

/// Client-authored partial write
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetStatePacket {
    cmd: SetStateCmd,
    /// Client timestamp, seconds
    pub ts: f64,
    /// The partial write
    pub state: DeviceStateIn,
}

/// The literal `"set_state"` tag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
enum SetStateCmd {
    #[serde(rename = "set_state")]
    SetState,
}

impl SetStatePacket {
    /// Wrap a partial write, stamping the current time
    pub fn new(state: DeviceStateIn) -> Self {
        Self {
            cmd: SetStateCmd::SetState,
            ts: now_secs(),
            state,
        }
    }

    /// Serialize for the wire
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Seconds since the Unix epoch as a float, matching the device's `ts`
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SectorIn;

    fn update_frame(update: &str) -> String {
        format!(r#"{{"cmd": "update", "ts": 1700000000.5, "update": {}}}"#, update)
    }

    #[test]
    fn test_parse_update() {
        let raw = update_frame(r#"{"theme_id": "classic"}"#);
        match Inbound::parse(&raw).unwrap() {
            Inbound::Update(packet) => {
                assert_eq!(packet.ts, 1700000000.5);
                assert_eq!(packet.update.theme_id.as_deref(), Some("classic"));
            }
            other => panic!("expected update, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_cmd_is_not_an_error() {
        let raw = r#"{"cmd": "telemetry", "ts": 1.0, "data": {}}"#;
        match Inbound::parse(raw).unwrap() {
            Inbound::Unknown { cmd } => assert_eq!(cmd, "telemetry"),
            other => panic!("expected unknown, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_missing_cmd() {
        assert!(matches!(
            Inbound::parse(r#"{"ts": 1.0}"#),
            Err(ProtoError::MissingCommand)
        ));
    }

    #[test]
    fn test_parse_rejects_invalid_payload() {
        // update present but not an object
        let raw = r#"{"cmd": "update", "ts": 1.0, "update": 42}"#;
        assert!(matches!(
            Inbound::parse(raw),
            Err(ProtoError::Payload { cmd: "update", .. })
        ));
    }

    #[test]
    fn test_parse_rejects_non_json() {
        assert!(matches!(Inbound::parse("not json"), Err(ProtoError::Json(_))));
    }

    #[test]
    fn test_set_state_wire_shape() {
        let packet = SetStatePacket::new(DeviceStateIn::sector(2, SectorIn::with_effect("flash")));
        let value: Value = serde_json::from_str(&packet.to_json().unwrap()).unwrap();
        assert_eq!(value["cmd"], "set_state");
        assert!(value["ts"].as_f64().unwrap() > 0.0);
        assert_eq!(value["state"]["sectors"]["2"]["effect_id"], "flash");
    }
}
