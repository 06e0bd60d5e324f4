use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::asnc::EventSender;
use crate::core::event::Event;
use crate::core::scheduler::{Scheduler, TimerHandle};

use crate::prelude::*;

/// [`Scheduler`] backed by Tokio timers.
///
/// Every timer is a task sending [`Event::TimerFired`] through an [`EventSender`] once its
/// delay expired, unless its handle was dropped. All pending timers are discarded on
/// [`shutdown`](Self::shutdown).
///
/// Timers must be scheduled from within a Tokio runtime.
#[derive(Debug)]
pub struct TokioScheduler {
    sender: EventSender,
    token: CancellationToken,
}

impl TokioScheduler {
    /// Creates scheduler delivering timer events through `sender`.
    pub fn new(sender: EventSender) -> Self {
        Self {
            sender,
            token: CancellationToken::new(),
        }
    }

    /// Discards pending timers and disables new ones.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether the scheduler was shut down.
    pub fn is_shut_down(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, device: &DeviceId, delay: Duration) -> TimerHandle {
        let handle = TimerHandle::new();
        let timer = handle.id();
        let state = handle.watch();
        let token = self.token.clone();
        let sender = self.sender.clone();
        let device = device.clone();

        log::trace!("[{device}] timer {timer} scheduled in {delay:?}");
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    if state.is_closed() {
                        return;
                    }
                    if let Err(err) = sender.send(Event::TimerFired { device: device.clone(), timer }) {
                        log::debug!("[{device}] timer {timer} dropped: {err}");
                    }
                }
                _ = token.cancelled() => {
                    log::trace!("[{device}] timer {timer} discarded");
                }
            }
        });
        handle
    }
}
