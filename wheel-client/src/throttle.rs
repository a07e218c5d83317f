//! Coalescing sender for continuous controls
//!
//! Rapid continuous input (slider drags) must not flood the wire: the UI
//! tracks every intermediate value locally, but outbound packets are
//! limited to one per window. The first value in a quiet period goes out
//! immediately; later values inside the window are coalesced into a
//! single trailing send carrying the latest one. Releasing the control
//! calls [`flush`](CoalescingSender::flush), which always goes out —
//! the device is guaranteed to receive the true end value.
//!
//! Each control owns its own sender, so concurrent drags on independent
//! sliders never share a throttle window.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Default throttle window for continuous controls
pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_millis(200);

struct Inner<T> {
    /// End of the current throttle window, if one is running
    window_ends: Option<Instant>,
    /// Latest value offered inside the window, awaiting the trailing send
    pending: Option<T>,
    timer_armed: bool,
    disposed: bool,
}

/// Rate-limits a stream of values to one send per window, always
/// delivering the most recent value
///
/// Cheap to clone; clones share the same window state.
pub struct CoalescingSender<T> {
    window: Duration,
    send: Arc<dyn Fn(T) + Send + Sync>,
    inner: Arc<Mutex<Inner<T>>>,
}

impl<T: Send + 'static> CoalescingSender<T> {
    /// Build a sender with the given window and send hook
    ///
    /// Must be created within a tokio runtime; trailing sends run on
    /// spawned timer tasks.
    pub fn new<F>(window: Duration, send: F) -> Self
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        Self {
            window,
            send: Arc::new(send),
            inner: Arc::new(Mutex::new(Inner {
                window_ends: None,
                pending: None,
                timer_armed: false,
                disposed: false,
            })),
        }
    }

    /// Offer a value from a continuous stream
    ///
    /// Sends immediately when no window is running (leading edge);
    /// otherwise replaces the pending value and arms one trailing timer
    /// for the end of the window.
    pub fn offer(&self, value: T) {
        let now = Instant::now();
        let fire = {
            let mut inner = self.inner.lock();
            if inner.disposed {
                return;
            }
            match inner.window_ends {
                Some(ends) if now < ends => {
                    inner.pending = Some(value);
                    if !inner.timer_armed {
                        inner.timer_armed = true;
                        let this = self.clone();
                        tokio::spawn(async move {
                            this.trailing(ends).await;
                        });
                    }
                    None
                }
                _ => {
                    inner.window_ends = Some(now + self.window);
                    Some(value)
                }
            }
        };
        if let Some(value) = fire {
            (self.send)(value);
        }
    }

    /// Send a final value unconditionally
    ///
    /// Used on drag release. Never throttled; cancels any pending
    /// trailing send so the flushed value is the last one delivered.
    pub fn flush(&self, value: T) {
        let proceed = {
            let mut inner = self.inner.lock();
            if inner.disposed {
                false
            } else {
                inner.pending = None;
                inner.window_ends = Some(Instant::now() + self.window);
                true
            }
        };
        if proceed {
            (self.send)(value);
        }
    }

    /// Abandon the sender; pending timers will fire but send nothing
    pub fn dispose(&self) {
        let mut inner = self.inner.lock();
        inner.disposed = true;
        inner.pending = None;
    }

    async fn trailing(self, deadline: Instant) {
        tokio::time::sleep_until(deadline).await;
        let fire = {
            let mut inner = self.inner.lock();
            inner.timer_armed = false;
            if inner.disposed {
                None
            } else {
                let value = inner.pending.take();
                if value.is_some() {
                    inner.window_ends = Some(Instant::now() + self.window);
                }
                value
            }
        };
        if let Some(value) = fire {
            (self.send)(value);
        }
    }
}

impl<T> Clone for CoalescingSender<T> {
    fn clone(&self) -> Self {
        Self {
            window: self.window,
            send: Arc::clone(&self.send),
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for CoalescingSender<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoalescingSender")
            .field("window", &self.window)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collector() -> (Arc<Mutex<Vec<i32>>>, impl Fn(i32) + Send + Sync + 'static) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&sent);
        (sent, move |v| sink.lock().push(v))
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_to_latest_value() {
        let (sent, sink) = collector();
        let sender = CoalescingSender::new(Duration::from_millis(200), sink);

        // 10 values within 100 ms
        for v in 0..10 {
            sender.offer(v);
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        // Leading edge only so far
        assert_eq!(*sent.lock(), vec![0]);

        // After the window the trailing send carries the latest value,
        // not the first queued one
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*sent.lock(), vec![0, 9]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_is_never_throttled() {
        let (sent, sink) = collector();
        let sender = CoalescingSender::new(Duration::from_millis(200), sink);

        sender.offer(1);
        sender.offer(2); // pending inside the window
        sender.flush(3); // release mid-window

        assert_eq!(*sent.lock(), vec![1, 3]);

        // The armed timer finds nothing pending and stays silent
        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(*sent.lock(), vec![1, 3]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_without_prior_offers() {
        let (sent, sink) = collector();
        let sender = CoalescingSender::new(Duration::from_millis(200), sink);

        sender.flush(7);
        assert_eq!(*sent.lock(), vec![7]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_senders_do_not_interfere() {
        let (sent_a, sink_a) = collector();
        let (sent_b, sink_b) = collector();
        let a = CoalescingSender::new(Duration::from_millis(200), sink_a);
        let b = CoalescingSender::new(Duration::from_millis(200), sink_b);

        a.offer(1);
        // `a` is mid-window; `b` still leading-edge sends immediately
        b.offer(100);

        assert_eq!(*sent_a.lock(), vec![1]);
        assert_eq!(*sent_b.lock(), vec![100]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_silences_pending_timer() {
        let (sent, sink) = collector();
        let sender = CoalescingSender::new(Duration::from_millis(200), sink);

        sender.offer(1);
        sender.offer(2);
        sender.dispose();

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(*sent.lock(), vec![1]);

        // Offers after dispose are ignored entirely
        sender.offer(3);
        assert_eq!(*sent.lock(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_window_after_quiet_period() {
        let (sent, sink) = collector();
        let sender = CoalescingSender::new(Duration::from_millis(200), sink);

        sender.offer(1);
        tokio::time::sleep(Duration::from_millis(250)).await;
        sender.offer(2);

        // Both were leading-edge sends in their own windows
        assert_eq!(*sent.lock(), vec![1, 2]);
    }
}
