//! # Timer scheduling
//!
//! Device controllers never sleep. A controller that has to bound a wait asks its [`Scheduler`]
//! for a timer and keeps the returned [`TimerHandle`]. When the delay expires, the scheduler
//! delivers [`Event::TimerFired`] carrying the timer id; the controller ignores it unless the id
//! matches the handle it still holds. Dropping the handle cancels the timer.
//!
//! [`ManualScheduler`] is a virtual clock advanced explicitly, suitable for deterministic tests and
//! for embedding into foreign event loops. A Tokio-based implementation lives in
//! [`asnc`](crate::asnc) (requires `async` feature).

use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use crate::core::event::Event;
use crate::core::utils::{Closable, Closer, UniqueId};

use crate::prelude::*;

/// Handle of a scheduled timer.
///
/// The timer is cancelled once the handle is dropped.
#[derive(Debug)]
#[must_use]
pub struct TimerHandle {
    id: UniqueId,
    closer: Closer,
}

impl TimerHandle {
    /// Creates a handle for a newly scheduled timer.
    pub fn new() -> Self {
        Self {
            id: UniqueId::new(),
            closer: Closer::new(),
        }
    }

    /// Timer identifier.
    #[inline(always)]
    pub fn id(&self) -> UniqueId {
        self.id
    }

    /// Read-only view of the cancellation state for the scheduler.
    pub fn watch(&self) -> Closable {
        self.closer.to_closable()
    }
}

impl Default for TimerHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Source of timers for device controllers.
pub trait Scheduler: Debug + Send + Sync {
    /// Schedules [`Event::TimerFired`] for `device` after `delay`.
    fn schedule(&self, device: &DeviceId, delay: Duration) -> TimerHandle;
}

#[derive(Debug)]
struct PendingTimer {
    device: DeviceId,
    id: UniqueId,
    due: Duration,
    state: Closable,
}

#[derive(Debug, Default)]
struct ManualClock {
    now: Duration,
    pending: Vec<PendingTimer>,
}

/// Virtual clock [`Scheduler`].
///
/// ```rust
/// use std::time::Duration;
/// use groundlink::core::device::DeviceId;
/// use groundlink::core::scheduler::{ManualScheduler, Scheduler};
///
/// let scheduler = ManualScheduler::new();
/// let device = DeviceId::new("123");
///
/// let timer = scheduler.schedule(&device, Duration::from_secs(5));
/// assert!(scheduler.advance(Duration::from_secs(4)).is_empty());
/// assert_eq!(scheduler.advance(Duration::from_secs(1)).len(), 1);
///
/// let cancelled = scheduler.schedule(&device, Duration::from_secs(5));
/// drop(cancelled);
/// assert!(scheduler.advance(Duration::from_secs(10)).is_empty());
/// # drop(timer);
/// ```
#[derive(Debug, Default)]
pub struct ManualScheduler {
    clock: Mutex<ManualClock>,
}

impl ManualScheduler {
    /// Creates a scheduler with its clock set at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of timers that are neither fired nor cancelled.
    pub fn pending(&self) -> usize {
        let mut clock = self.lock();
        clock.pending.retain(|timer| !timer.state.is_closed());
        clock.pending.len()
    }

    /// Moves the clock forward and returns events of expired timers in expiration order.
    pub fn advance(&self, by: Duration) -> Vec<Event> {
        let mut clock = self.lock();
        clock.now += by;
        let now = clock.now;

        let (mut expired, pending): (Vec<_>, Vec<_>) = clock
            .pending
            .drain(..)
            .filter(|timer| !timer.state.is_closed())
            .partition(|timer| timer.due <= now);
        clock.pending = pending;

        expired.sort_by_key(|timer| (timer.due, timer.id));
        expired
            .into_iter()
            .map(|timer| Event::TimerFired {
                device: timer.device,
                timer: timer.id,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, ManualClock> {
        self.clock.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, device: &DeviceId, delay: Duration) -> TimerHandle {
        let handle = TimerHandle::new();
        let mut clock = self.lock();
        let due = clock.now + delay;

        log::trace!("[{device}] timer {} scheduled in {delay:?}", handle.id());
        clock.pending.push(PendingTimer {
            device: device.clone(),
            id: handle.id(),
            due,
            state: handle.watch(),
        });
        handle
    }
}
