//! Model types for the wheel device state tree

mod device;
mod encoder;
mod info;
mod leds;
mod sector;
mod servos;
mod sound;

pub use device::{DeviceState, DeviceStateDelta, DeviceStateIn};
pub use encoder::EncoderState;
pub use info::{DeviceInfo, EffectInfo, ServoMotorInfo, SoundInfo, ThemeInfo};
pub use leds::{LedSegmentState, LedsIn, LedsState};
pub use sector::{SectorIn, SectorState};
pub use servos::{ServoIn, ServoState, ServosIn, ServosState};
pub use sound::{SoundChannelIn, SoundChannelState, SoundSystemIn, SoundSystemState};
