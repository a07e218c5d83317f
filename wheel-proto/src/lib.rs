//! Wheel Device Wire Schema
//!
//! Typed models and packet validation for the wheel device protocol:
//! JSON frames over a persistent WebSocket, each carrying a `cmd`
//! discriminator and a float `ts` timestamp.
//!
//! # Packet kinds
//!
//! | Direction | `cmd`       | Payload                                   |
//! |-----------|-------------|-------------------------------------------|
//! | inbound   | `init`      | full [`DeviceState`] + [`DeviceInfo`]     |
//! | inbound   | `update`    | [`DeviceStateDelta`] (partial, per-section)|
//! | outbound  | `set_state` | [`DeviceStateIn`] (partial, nested-partial)|
//!
//! Unknown inbound commands are reported as [`Inbound::Unknown`] and
//! ignored by callers; a malformed frame yields a [`ProtoError`] and is
//! dropped without disturbing any mirrored state.
//!
//! # Delta semantics
//!
//! Fields absent from an `update` payload mean "unchanged", never "reset
//! to default". Present sections are sent whole and replace their
//! counterpart section wholesale; the wire never deep-patches inside a
//! section.

pub mod clamp;
pub mod error;
pub mod model;
pub mod packet;

pub use clamp::{clamp_servo_pos, clamp_unit, SERVO_POS_MAX, SERVO_POS_MIN};
pub use error::{ProtoError, Result};
pub use model::{
    DeviceInfo, DeviceState, DeviceStateDelta, DeviceStateIn, EffectInfo, EncoderState,
    LedSegmentState, LedsIn, LedsState, SectorIn, SectorState, ServoIn, ServoMotorInfo, ServoState,
    ServosIn, ServosState, SoundChannelIn, SoundChannelState, SoundInfo, SoundSystemIn,
    SoundSystemState, ThemeInfo,
};
pub use packet::{now_secs, Inbound, InitPacket, SetStatePacket, UpdatePacket};
