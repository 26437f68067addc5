//! Advisory "adding to cart is slow" signal.
//!
//! One shared timer backs the signal rather than one per request, so a
//! burst of adds produces a single slow transition. The timer is armed by
//! the first add while none is armed; when it fires with requests still
//! pending the signal goes slow. Draining the pending set disarms the timer
//! and clears the signal.
//!
//! The timer never cancels a request; it only drives UI state.

use std::sync::Arc;
use std::time::Duration;

use commerce_telemetry::Metrics;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::event::{CartEvent, CartEvents};
use crate::pending::PendingRequestSet;

#[derive(Debug)]
struct ArmedTimer {
    generation: u64,
    handle: JoinHandle<()>,
}

#[derive(Debug, Default)]
struct SlowState {
    is_slow: bool,
    armed: Option<ArmedTimer>,
    next_generation: u64,
}

/// Coalescing slow-signal timer over a `PendingRequestSet`.
///
/// # Thread Safety
///
/// Slow state and the armed timer live under one `parking_lot::Mutex`.
/// Both transitions re-read the pending count while holding it, so a
/// drain racing with a new add cannot clear the new add's timer.
#[derive(Debug)]
pub struct SlowSignalTimer {
    delay: Duration,
    pending: Arc<PendingRequestSet>,
    events: CartEvents,
    state: Mutex<SlowState>,
    slow_tx: watch::Sender<bool>,
}

impl SlowSignalTimer {
    #[must_use]
    pub fn new(delay: Duration, pending: Arc<PendingRequestSet>, events: CartEvents) -> Self {
        let (slow_tx, _rx) = watch::channel(false);
        Self {
            delay,
            pending,
            events,
            state: Mutex::new(SlowState::default()),
            slow_tx,
        }
    }

    /// Arm the timer unless one is already armed.
    ///
    /// Must be called from within a tokio runtime; outside one the signal
    /// is not armed and a warning is logged.
    ///
    /// # Returns
    /// - `true` if a new timer was scheduled
    /// - `false` if one was already armed (coalesced) or no runtime is available
    pub fn arm_if_needed(self: &Arc<Self>) -> bool {
        let mut state = self.state.lock();

        if let Some(armed) = &state.armed {
            trace!(generation = armed.generation, "Slow signal timer already armed");
            return false;
        }

        let Ok(runtime) = Handle::try_current() else {
            warn!("No tokio runtime available, slow signal timer not armed");
            return false;
        };

        let generation = state.next_generation;
        state.next_generation += 1;

        let timer = Arc::downgrade(self);
        let delay = self.delay;
        let handle = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(timer) = timer.upgrade() {
                timer.fire(generation);
            }
        });

        state.armed = Some(ArmedTimer { generation, handle });
        debug!(
            generation,
            delay_ms = self.delay.as_millis() as u64,
            "Slow signal timer armed"
        );
        true
    }

    fn fire(&self, generation: u64) {
        let mut state = self.state.lock();

        match &state.armed {
            Some(armed) if armed.generation == generation => {}
            // Disarmed (and possibly re-armed) since this timer was scheduled.
            _ => return,
        }
        state.armed = None;

        let pending = self.pending.count();
        if pending > 0 && !state.is_slow {
            state.is_slow = true;
            info!(
                pending,
                threshold_ms = self.delay.as_millis() as u64,
                "Adding to cart is slow"
            );
            self.publish(true);
        } else {
            trace!(pending, is_slow = state.is_slow, "Slow signal timer fired without transition");
        }
    }

    /// Disarm the timer and clear the slow signal once the pending set has drained.
    ///
    /// No-op while requests are still pending. That includes a new add that
    /// lands between the drain and this call: observers then see
    /// `CountChanged { count: 0 }` without a `SlowStateChanged(false)`, and
    /// the signal stays slow until the new request settles and the set
    /// drains again. The episode is extended, never split or missed.
    ///
    /// # Returns
    /// `true` if the signal transitioned from slow to normal.
    pub fn disarm(&self) -> bool {
        let mut state = self.state.lock();

        if !self.pending.is_empty() {
            return false;
        }

        if let Some(armed) = state.armed.take() {
            armed.handle.abort();
            trace!(generation = armed.generation, "Slow signal timer disarmed");
        }

        if !state.is_slow {
            return false;
        }

        state.is_slow = false;
        info!("Add-to-cart requests drained, slow signal cleared");
        self.publish(false);
        true
    }

    /// Current slow signal state.
    #[must_use]
    pub fn is_slow(&self) -> bool {
        self.state.lock().is_slow
    }

    /// Whether a timer is currently scheduled.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.state.lock().armed.is_some()
    }

    /// Watch the slow signal state.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<bool> {
        self.slow_tx.subscribe()
    }

    fn publish(&self, is_slow: bool) {
        Metrics::slow_state(is_slow);
        self.slow_tx.send_replace(is_slow);
        self.events.publish(CartEvent::SlowStateChanged { is_slow });
    }
}

impl Drop for SlowSignalTimer {
    fn drop(&mut self) {
        if let Some(armed) = self.state.get_mut().armed.take() {
            armed.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicatePolicy;
    use chrono::Utc;
    use commerce_core::AddCartLine;
    use rust_decimal_macros::dec;
    use tokio::sync::broadcast;
    use uuid::Uuid;

    const DELAY: Duration = Duration::from_millis(500);

    fn setup() -> (
        Arc<PendingRequestSet>,
        Arc<SlowSignalTimer>,
        broadcast::Receiver<CartEvent>,
    ) {
        let events = CartEvents::new(64);
        let pending = Arc::new(PendingRequestSet::new(
            DuplicatePolicy::Allow,
            events.clone(),
        ));
        let timer = Arc::new(SlowSignalTimer::new(DELAY, Arc::clone(&pending), events.clone()));
        (pending, timer, events.subscribe())
    }

    fn line() -> AddCartLine {
        AddCartLine::new(Uuid::nil(), dec!(1))
    }

    fn slow_events(rx: &mut broadcast::Receiver<CartEvent>) -> Vec<bool> {
        std::iter::from_fn(|| rx.try_recv().ok())
            .filter_map(|e| match e {
                CartEvent::SlowStateChanged { is_slow } => Some(is_slow),
                CartEvent::CountChanged { .. } => None,
            })
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_slow_when_still_pending() {
        let (pending, timer, mut rx) = setup();
        let id = pending.add(line(), Utc::now()).unwrap();
        assert!(timer.arm_if_needed());

        tokio::time::sleep(DELAY + Duration::from_millis(1)).await;

        assert!(timer.is_slow());
        assert!(!timer.is_armed());
        assert_eq!(slow_events(&mut rx), vec![true]);

        pending.remove(id);
        assert!(timer.disarm());
        assert!(!timer.is_slow());
        assert_eq!(slow_events(&mut rx), vec![false]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_slow_when_drained_before_threshold() {
        let (pending, timer, mut rx) = setup();
        let id = pending.add(line(), Utc::now()).unwrap();
        timer.arm_if_needed();

        tokio::time::sleep(DELAY / 2).await;
        pending.remove(id);
        assert!(!timer.disarm());
        assert!(!timer.is_armed());

        tokio::time::sleep(DELAY * 2).await;
        assert!(!timer.is_slow());
        assert!(slow_events(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_arms_single_timer() {
        let (pending, timer, mut rx) = setup();
        let mut armed = 0;
        for _ in 0..5 {
            pending.add(line(), Utc::now()).unwrap();
            if timer.arm_if_needed() {
                armed += 1;
            }
        }
        assert_eq!(armed, 1);

        tokio::time::sleep(DELAY * 3).await;
        assert_eq!(slow_events(&mut rx), vec![true]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_while_slow_does_not_duplicate_event() {
        let (pending, timer, mut rx) = setup();
        pending.add(line(), Utc::now()).unwrap();
        timer.arm_if_needed();
        tokio::time::sleep(DELAY * 2).await;

        pending.add(line(), Utc::now()).unwrap();
        assert!(timer.arm_if_needed());
        tokio::time::sleep(DELAY * 2).await;

        assert!(timer.is_slow());
        assert_eq!(slow_events(&mut rx), vec![true]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_is_noop_while_pending() {
        let (pending, timer, _rx) = setup();
        pending.add(line(), Utc::now()).unwrap();
        timer.arm_if_needed();

        assert!(!timer.disarm());
        assert!(timer.is_armed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_add_between_drain_and_disarm_extends_episode() {
        let (pending, timer, mut rx) = setup();
        let first = pending.add(line(), Utc::now()).unwrap();
        timer.arm_if_needed();
        tokio::time::sleep(DELAY * 2).await;
        assert!(timer.is_slow());

        pending.remove(first);
        let second = pending.add(line(), Utc::now()).unwrap();
        assert!(!timer.disarm());
        assert!(timer.is_slow());

        use CartEvent::*;
        let events: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(
            events,
            vec![
                CountChanged { count: 1 },
                SlowStateChanged { is_slow: true },
                CountChanged { count: 0 },
                CountChanged { count: 1 },
            ]
        );

        pending.remove(second);
        assert!(timer.disarm());
        assert_eq!(slow_events(&mut rx), vec![false]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_follows_transitions() {
        let (pending, timer, _rx) = setup();
        let mut watch = timer.watch();
        assert!(!*watch.borrow());

        let id = pending.add(line(), Utc::now()).unwrap();
        timer.arm_if_needed();
        watch.changed().await.unwrap();
        assert!(*watch.borrow_and_update());

        pending.remove(id);
        timer.disarm();
        watch.changed().await.unwrap();
        assert!(!*watch.borrow());
    }

    #[test]
    fn test_arm_outside_runtime_is_refused() {
        let (pending, timer, _rx) = setup();
        pending.add(line(), Utc::now()).unwrap();
        assert!(!timer.arm_if_needed());
        assert!(!timer.is_armed());
    }
}
