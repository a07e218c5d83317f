//! The canonical device-state mirror
//!
//! One `StateStore` mirrors one device. The device is authoritative: the
//! mirror is populated by the first `init` snapshot of a connection,
//! merged with `update` deltas, nudged ahead of the network by optimistic
//! local writes, and discarded on every connection loss so stale state is
//! never served as truth.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use wheel_proto::{DeviceInfo, DeviceState, DeviceStateDelta};

use crate::error::{Result, StateError};

/// Handle returned by [`StateStore::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&DeviceState) + Send + Sync>;

#[derive(Default)]
struct Mirror {
    state: Option<DeviceState>,
    info: Option<DeviceInfo>,
}

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    callbacks: Vec<(SubscriptionId, Callback)>,
}

/// Shared mirror of remote device state with synchronous change
/// notification
///
/// The store is a cheap-to-clone handle; all clones share the same
/// mirror. Every successful [`apply_init`](StateStore::apply_init),
/// [`apply_update`](StateStore::apply_update) and
/// [`apply_local`](StateStore::apply_local) is a single atomic transition:
/// subscribers only ever observe fully-applied states.
///
/// # Example
///
/// ```rust,ignore
/// let store = StateStore::new();
/// let id = store.subscribe(|state| {
///     println!("theme is now {}", state.theme_id);
/// });
///
/// store.apply_init(snapshot, info);
/// store.apply_update(delta)?;
///
/// store.unsubscribe(id);
/// ```
pub struct StateStore {
    mirror: Arc<RwLock<Mirror>>,
    subscribers: Arc<Mutex<Subscribers>>,
}

impl StateStore {
    /// Create an empty store; populated by the first init packet
    pub fn new() -> Self {
        Self {
            mirror: Arc::new(RwLock::new(Mirror::default())),
            subscribers: Arc::new(Mutex::new(Subscribers::default())),
        }
    }

    /// Atomically replace the entire mirrored state and catalogs
    ///
    /// Called for every `init` packet, i.e. once per successful
    /// connection open. Any previously mirrored state is discarded,
    /// leftover fields included.
    pub fn apply_init(&self, state: DeviceState, info: DeviceInfo) {
        let snapshot = {
            let mut mirror = self.mirror.write();
            mirror.info = Some(info);
            mirror.state = Some(state);
            mirror.state.clone()
        };
        if let Some(snapshot) = snapshot {
            self.notify(&snapshot);
        }
    }

    /// Merge an inbound delta into the mirror
    ///
    /// Each section present in the delta replaces its counterpart whole
    /// (shallow per-section replacement, mirroring the wire contract).
    /// The delta is applied atomically or not at all: an update arriving
    /// before init, or one that would change the physical sector count,
    /// is rejected whole.
    pub fn apply_update(&self, delta: DeviceStateDelta) -> Result<()> {
        let snapshot = {
            let mut mirror = self.mirror.write();
            let state = mirror.state.as_mut().ok_or(StateError::OutOfOrder)?;

            if let Some(sectors) = &delta.sectors {
                if sectors.len() != state.sectors.len() {
                    return Err(StateError::SectorCountChanged {
                        expected: state.sectors.len(),
                        got: sectors.len(),
                    });
                }
            }

            let DeviceStateDelta {
                theme_id,
                standby_timer,
                sectors,
                encoder,
                leds,
                servos,
                soundsystem,
            } = delta;

            if let Some(theme_id) = theme_id {
                state.theme_id = theme_id;
            }
            if let Some(standby_timer) = standby_timer {
                state.standby_timer = standby_timer;
            }
            if let Some(sectors) = sectors {
                state.sectors = sectors;
            }
            if let Some(encoder) = encoder {
                state.encoder = encoder;
            }
            if let Some(leds) = leds {
                state.leds = leds;
            }
            if let Some(servos) = servos {
                state.servos = servos;
            }
            if let Some(soundsystem) = soundsystem {
                state.soundsystem = soundsystem;
            }

            state.clone()
        };

        self.notify(&snapshot);
        Ok(())
    }

    /// Apply an optimistic local mutation ahead of the network round-trip
    ///
    /// Used by the command dispatcher so the UI tracks user input with
    /// zero latency. Returns `false` (and does nothing) when no init has
    /// been applied yet; there is no state to mutate optimistically.
    pub fn apply_local<F>(&self, mutate: F) -> bool
    where
        F: FnOnce(&mut DeviceState),
    {
        let snapshot = {
            let mut mirror = self.mirror.write();
            match mirror.state.as_mut() {
                Some(state) => {
                    mutate(state);
                    state.clone()
                }
                None => return false,
            }
        };
        self.notify(&snapshot);
        true
    }

    /// Owned immutable view of the current device state
    pub fn snapshot(&self) -> Option<DeviceState> {
        self.mirror.read().state.clone()
    }

    /// Owned immutable view of the session catalogs
    pub fn info(&self) -> Option<DeviceInfo> {
        self.mirror.read().info.clone()
    }

    /// Whether an init has been applied on the current connection
    pub fn is_initialized(&self) -> bool {
        self.mirror.read().state.is_some()
    }

    /// Discard all mirrored state and catalogs
    ///
    /// Called on every connection loss. Re-arms the init gate: until the
    /// next `init` arrives, deltas are rejected as out of order.
    /// Subscribers are not notified; connectivity changes travel through
    /// the connection status channel instead.
    pub fn reset(&self) {
        let mut mirror = self.mirror.write();
        if mirror.state.is_some() {
            tracing::debug!("Resetting mirrored device state");
        }
        mirror.state = None;
        mirror.info = None;
    }

    /// Register a callback invoked synchronously after every successful
    /// init, update, or optimistic mutation
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&DeviceState) + Send + Sync + 'static,
    {
        let mut subs = self.subscribers.lock();
        subs.next_id += 1;
        let id = SubscriptionId(subs.next_id);
        subs.callbacks.push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscription; idempotent
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.subscribers.lock().callbacks.retain(|(sub_id, _)| *sub_id != id);
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().callbacks.len()
    }

    /// Invoke all subscribers with the post-transition state
    ///
    /// Callbacks run outside the mirror and subscriber locks, so a
    /// callback may freely call back into the store.
    fn notify(&self, state: &DeviceState) {
        let callbacks: Vec<Callback> = self
            .subscribers
            .lock()
            .callbacks
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        for callback in callbacks {
            callback(state);
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for StateStore {
    fn clone(&self) -> Self {
        Self {
            mirror: Arc::clone(&self.mirror),
            subscribers: Arc::clone(&self.subscribers),
        }
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore")
            .field("initialized", &self.is_initialized())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use wheel_proto::{
        EncoderState, LedsState, SectorState, ServosState, SoundChannelState, SoundSystemState,
    };

    fn test_encoder() -> EncoderState {
        EncoderState {
            sector: 0,
            rpm: 0.0,
            total_revs: 0.0,
            total_sectors: 0,
            missed_sector_count: 0,
            standstill: true,
        }
    }

    fn test_leds(brightness: f64) -> LedsState {
        LedsState {
            power_on: true,
            brightness,
            segments: HashMap::new(),
        }
    }

    fn test_state(num_sectors: usize) -> DeviceState {
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

        DeviceState {
            theme_id: "classic".to_string(),
            standby_timer: None,
            sectors,
            encoder: test_encoder(),
            leds: test_leds(0.8),
            servos: ServosState {
                motors: HashMap::new(),
            },
            soundsystem: SoundSystemState { channels },
        }
    }

    fn test_info() -> DeviceInfo {
        DeviceInfo {
            themes: HashMap::new(),
            effects: HashMap::new(),
            servos: HashMap::new(),
            sounds: HashMap::new(),
            leds_version: "1.2.0".to_string(),
            sound_version: "0.9.1".to_string(),
        }
    }

    #[test]
    fn test_init_replaces_wholesale() {
        let store = StateStore::new();
        store.apply_init(test_state(8), test_info());

        // A second init fully replaces the first, leftover fields included
        let mut second = test_state(12);
        second.theme_id = "neon".to_string();
        store.apply_init(second.clone(), test_info());

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot, second);
        assert_eq!(snapshot.sectors.len(), 12);
        assert_eq!(store.info().unwrap(), test_info());
    }

    #[test]
    fn test_update_preserves_untouched_sections() {
        let store = StateStore::new();
        store.apply_init(test_state(8), test_info());

        let delta = DeviceStateDelta {
            leds: Some(test_leds(0.2)),
            ..Default::default()
        };
        store.apply_update(delta).unwrap();

        let snapshot = store.snapshot().unwrap();
        assert_eq!(snapshot.leds.brightness, 0.2);
        // servos and soundsystem untouched
        assert_eq!(snapshot.soundsystem, test_state(8).soundsystem);
        assert_eq!(snapshot.theme_id, "classic");
    }

    #[test]
    fn test_update_before_init_is_rejected() {
        let store = StateStore::new();
        let delta = DeviceStateDelta {
            theme_id: Some("neon".to_string()),
            ..Default::default()
        };

        assert_eq!(store.apply_update(delta), Err(StateError::OutOfOrder));
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_sector_count_change_rejects_whole_delta() {
        let store = StateStore::new();
        store.apply_init(test_state(8), test_info());

        let delta = DeviceStateDelta {
            theme_id: Some("neon".to_string()),
            sectors: Some(test_state(6).sectors),
            ..Default::default()
        };

        assert_eq!(
            store.apply_update(delta),
            Err(StateError::SectorCountChanged {
                expected: 8,
                got: 6
            })
        );

        // Atomic rejection: the theme change was not applied either
        assert_eq!(store.snapshot().unwrap().theme_id, "classic");
    }

    #[test]
    fn test_standby_timer_null_clears() {
        let store = StateStore::new();
        let mut state = test_state(8);
        state.standby_timer = Some(120.0);
        store.apply_init(state, test_info());

        let delta: DeviceStateDelta =
            serde_json::from_str(r#"{"standby_timer": null}"#).unwrap();
        store.apply_update(delta).unwrap();
        assert_eq!(store.snapshot().unwrap().standby_timer, None);
    }

    #[test]
    fn test_subscribers_fire_on_every_transition() {
        let store = StateStore::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = Arc::clone(&count);
        store.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.apply_init(test_state(8), test_info());
        assert_eq!(count.load(Ordering::SeqCst), 1);

        store
            .apply_update(DeviceStateDelta {
                encoder: Some(test_encoder()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 2);

        assert!(store.apply_local(|state| state.leds.brightness = 0.1));
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let store = StateStore::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_clone = Arc::clone(&count);
        let id = store.subscribe(move |_| {
            count_clone.fetch_add(1, Ordering::SeqCst);
        });

        store.unsubscribe(id);
        store.unsubscribe(id);

        store.apply_init(test_state(8), test_info());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_reset_rearms_init_gate() {
        let store = StateStore::new();
        store.apply_init(test_state(8), test_info());
        store.reset();

        assert!(store.snapshot().is_none());
        assert!(store.info().is_none());

        // Updates are rejected again until the next init
        let delta = DeviceStateDelta {
            theme_id: Some("neon".to_string()),
            ..Default::default()
        };
        assert_eq!(store.apply_update(delta), Err(StateError::OutOfOrder));

        // A fresh init matches the new snapshot exactly
        let fresh = test_state(10);
        store.apply_init(fresh.clone(), test_info());
        assert_eq!(store.snapshot().unwrap(), fresh);
    }

    #[test]
    fn test_apply_local_before_init_is_noop() {
        let store = StateStore::new();
        assert!(!store.apply_local(|state| state.leds.brightness = 0.5));
        assert!(store.snapshot().is_none());
    }

    #[test]
    fn test_clones_share_the_mirror() {
        let store = StateStore::new();
        let cloned = store.clone();

        store.apply_init(test_state(8), test_info());
        assert!(cloned.is_initialized());
    }
}
