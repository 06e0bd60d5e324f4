use tokio::sync::mpsc;

use crate::core::event::Event;
use crate::errors::ExecutorError;

use crate::prelude::*;

/// Sending half of the inbound event channel of an [`Executor`](super::Executor).
#[derive(Clone, Debug)]
pub struct EventSender(mpsc::UnboundedSender<Event>);

impl EventSender {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<Event>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self(sender), receiver)
    }

    /// Queues an event for the engine.
    ///
    /// Fails once the executor stopped.
    pub fn send(&self, event: Event) -> Result<()> {
        self.0
            .send(event)
            .map_err(|_| ExecutorError::Closed.into())
    }

    /// Whether the executor stopped.
    pub fn is_closed(&self) -> bool {
        self.0.is_closed()
    }
}
