//! Command dispatch
//!
//! Translates local user intents into outbound `set_state` packets while
//! keeping the UI responsive ahead of the network round-trip: every
//! intent mutates the mirror optimistically first, then goes to the wire
//! — immediately for discrete actions, coalesced through a per-control
//! [`CoalescingSender`] for continuous ones. Multi-step servo procedures
//! run on a per-motor [`SequenceRunner`].
//!
//! An inbound update arriving mid-drag simply overwrites the mirror; a
//! trailing throttled send firing afterwards resends the locally-held
//! value, which the next user action or inbound update reconciles.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use wheel_proto::{
    clamp_servo_pos, clamp_unit, DeviceStateIn, SectorIn, ServoIn, SetStatePacket,
};
use wheel_state::StateStore;

use crate::connection::Connection;
use crate::error::{ClientError, Result};
use crate::sequence::{SequenceRunner, ServoCommand};
use crate::throttle::CoalescingSender;

/// Outward-facing intent API for UI collaborators
///
/// Cheap to clone; clones share throttle windows and sequence state.
pub struct Dispatcher {
    store: StateStore,
    connection: Connection,
    throttle_window: Duration,
    brightness: CoalescingSender<f64>,
    volumes: Arc<Mutex<HashMap<String, CoalescingSender<f64>>>>,
    runners: Arc<Mutex<HashMap<String, SequenceRunner>>>,
}

impl Dispatcher {
    /// Build a dispatcher over a store and connection
    pub fn new(store: StateStore, connection: Connection, throttle_window: Duration) -> Self {
        let brightness_conn = connection.clone();
        let brightness = CoalescingSender::new(throttle_window, move |value| {
            send(&brightness_conn, DeviceStateIn::brightness(value));
        });

        Self {
            store,
            connection,
            throttle_window,
            brightness,
            volumes: Arc::new(Mutex::new(HashMap::new())),
            runners: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    // ------------------------------------------------------------------
    // Discrete commands: optimistic mutation + immediate send
    // ------------------------------------------------------------------

    /// Activate a theme
    pub fn set_theme(&self, theme_id: impl Into<String>) {
        let theme_id = theme_id.into();
        let local = theme_id.clone();
        self.store.apply_local(move |state| {
            state.theme_id = local;
        });
        send(&self.connection, DeviceStateIn::theme(theme_id));
    }

    /// Edit one sector's name and/or effect
    pub fn set_sector(&self, index: usize, sector: SectorIn) {
        let applied = {
            let sector = sector.clone();
            self.store.apply_local(move |state| {
                if let Some(target) = state.sectors.get_mut(index) {
                    if let Some(name) = sector.name {
                        target.name = name;
                    }
                    if let Some(effect_id) = sector.effect_id {
                        target.effect_id = effect_id;
                    }
                }
            })
        };

        // Out-of-range edits can only come from a UI bug; don't bother
        // the device with them
        if applied && !self.sector_in_range(index) {
            tracing::warn!("Dropping edit for out-of-range sector {}", index);
            return;
        }
        send(&self.connection, DeviceStateIn::sector(index, sector));
    }

    /// Command a single servo directly
    ///
    /// Positions are clamped to the mechanical range before dispatch.
    pub fn set_servo(&self, motor: impl Into<String>, mut servo: ServoIn) {
        let motor = motor.into();
        if let Some(pos) = servo.pos {
            servo.pos = Some(clamp_servo_pos(pos));
        }

        let local_motor = motor.clone();
        let local_servo = servo.clone();
        self.store.apply_local(move |state| {
            if let Some(target) = state.servos.motors.get_mut(&local_motor) {
                if let Some(pos) = local_servo.pos {
                    target.pos = pos;
                }
                target.detached = local_servo.detached;
            }
        });
        send(&self.connection, DeviceStateIn::servo(motor, servo));
    }

    /// Load a sound onto a mixer channel
    pub fn set_channel_sound(&self, channel: impl Into<String>, sound: impl Into<String>) {
        let channel = channel.into();
        let sound = sound.into();

        let local_channel = channel.clone();
        let local_sound = sound.clone();
        self.store.apply_local(move |state| {
            if let Some(target) = state.soundsystem.channels.get_mut(&local_channel) {
                target.sound_name = Some(local_sound);
            }
        });
        send(&self.connection, DeviceStateIn::channel_sound(channel, sound));
    }

    // ------------------------------------------------------------------
    // Continuous commands: optimistic on every value, coalesced sends
    // ------------------------------------------------------------------

    /// Track a master-brightness drag
    pub fn set_brightness(&self, value: f64) {
        let value = clamp_unit(value);
        self.store.apply_local(move |state| {
            state.leds.brightness = value;
        });
        self.brightness.offer(value);
    }

    /// Finish a master-brightness drag; the final value always goes out
    pub fn set_brightness_end(&self, value: f64) {
        let value = clamp_unit(value);
        self.store.apply_local(move |state| {
            state.leds.brightness = value;
        });
        self.brightness.flush(value);
    }

    /// Track a volume drag on one mixer channel
    pub fn set_volume(&self, channel: impl Into<String>, value: f64) {
        let channel = channel.into();
        let value = clamp_unit(value);
        self.apply_volume_local(&channel, value);
        self.volume_sender(&channel).offer(value);
    }

    /// Finish a volume drag; the final value always goes out
    pub fn set_volume_end(&self, channel: impl Into<String>, value: f64) {
        let channel = channel.into();
        let value = clamp_unit(value);
        self.apply_volume_local(&channel, value);
        self.volume_sender(&channel).flush(value);
    }

    // ------------------------------------------------------------------
    // Servo procedures
    // ------------------------------------------------------------------

    /// Start a timed servo procedure on one motor
    ///
    /// Fails when no session is established, the motor has no
    /// calibration, or a procedure is already running on it.
    pub fn run_servo_command(&self, motor: impl Into<String>, command: ServoCommand) -> Result<()> {
        let motor = motor.into();
        let info = self.store.info().ok_or(ClientError::NotInitialized)?;
        let calibration = info
            .servo(&motor)
            .ok_or_else(|| ClientError::UnknownMotor(motor.clone()))?;
        let steps = command.steps(calibration);

        let runner = self
            .runners
            .lock()
            .entry(motor.clone())
            .or_default()
            .clone();

        let dispatcher = self.clone();
        let step_motor = motor.clone();
        runner.run(&motor, steps, move |servo| {
            dispatcher.set_servo(step_motor.clone(), servo);
        })
    }

    /// Whether a procedure is running on the motor
    ///
    /// UIs use this to disable the trigger until the sequence completes.
    pub fn servo_in_progress(&self, motor: &str) -> bool {
        self.runners
            .lock()
            .get(motor)
            .map(SequenceRunner::in_progress)
            .unwrap_or(false)
    }

    /// Abandon all pending throttle timers and running sequences
    ///
    /// Called at teardown; nothing is dispatched afterwards.
    pub fn dispose(&self) {
        self.brightness.dispose();
        for sender in self.volumes.lock().values() {
            sender.dispose();
        }
        for runner in self.runners.lock().values() {
            runner.abort();
        }
    }

    // ------------------------------------------------------------------

    fn apply_volume_local(&self, channel: &str, value: f64) {
        let channel = channel.to_string();
        self.store.apply_local(move |state| {
            if let Some(target) = state.soundsystem.channels.get_mut(&channel) {
                target.volume = value;
            }
        });
    }

    /// Per-channel sender, created on first use so independent drags
    /// never share a throttle window
    fn volume_sender(&self, channel: &str) -> CoalescingSender<f64> {
        self.volumes
            .lock()
            .entry(channel.to_string())
            .or_insert_with(|| {
                let connection = self.connection.clone();
                let channel = channel.to_string();
                CoalescingSender::new(self.throttle_window, move |value| {
                    send(&connection, DeviceStateIn::volume(channel.clone(), value));
                })
            })
            .clone()
    }

    fn sector_in_range(&self, index: usize) -> bool {
        self.store
            .snapshot()
            .map(|state| index < state.sectors.len())
            .unwrap_or(false)
    }
}

impl Clone for Dispatcher {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            connection: self.connection.clone(),
            throttle_window: self.throttle_window,
            brightness: self.brightness.clone(),
            volumes: Arc::clone(&self.volumes),
            runners: Arc::clone(&self.runners),
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("throttle_window", &self.throttle_window)
            .finish()
    }
}

/// Encode and put a partial write on the wire
///
/// Dropped with a warning by the connection when not open; encoding a
/// write we built ourselves does not fail in practice.
fn send(connection: &Connection, state: DeviceStateIn) {
    match SetStatePacket::new(state).to_json() {
        Ok(json) => {
            connection.send(json);
        }
        Err(e) => {
            tracing::error!("Failed to encode set_state packet: {}", e);
        }
    }
}
