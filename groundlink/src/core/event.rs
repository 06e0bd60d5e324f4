//! # Events
//!
//! [`Event`]s flow into the [`Engine`](crate::engine::Engine): link notifications from
//! transports, commands received from devices, timer expirations. They are processed one at a
//! time, in arrival order.
//!
//! [`DeviceEvent`]s flow out of the engine into an [`EventSink`]: observable state changes of
//! devices.

use std::collections::VecDeque;
use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::io::{ConnectionProvider, ProtocolBackend, ProxyEndpoint};
use crate::core::utils::UniqueId;

use crate::prelude::*;

/// Inbound event.
#[derive(Clone, Debug)]
pub enum Event {
    /// A device became reachable through `provider`.
    DeviceAppeared {
        /// Device identifier.
        device: DeviceId,
        /// Device model.
        model: DeviceModel,
        /// Name advertised by the device.
        name: String,
        /// Reachability path.
        provider: Arc<dyn ConnectionProvider>,
    },
    /// A device is no longer reachable through the provider with given connector.
    DeviceVanished {
        /// Device identifier.
        device: DeviceId,
        /// Connector identifier.
        connector: String,
    },
    /// The provider with given connector started connecting the device.
    LinkConnecting {
        /// Device identifier.
        device: DeviceId,
        /// Connector identifier.
        connector: String,
    },
    /// The provider with given connector established the link.
    LinkConnected {
        /// Device identifier.
        device: DeviceId,
        /// Connector identifier.
        connector: String,
        /// Protocol link.
        backend: Arc<dyn ProtocolBackend>,
    },
    /// The link is down.
    LinkDisconnected {
        /// Device identifier.
        device: DeviceId,
        /// Whether the provider is going away.
        removing: bool,
    },
    /// The connection attempt failed.
    LinkCanceled {
        /// Device identifier.
        device: DeviceId,
        /// Failure reason.
        cause: ConnectionCause,
        /// Whether the provider is going away.
        removing: bool,
    },
    /// The transport detected that the link is no longer alive.
    LinkLost {
        /// Device identifier.
        device: DeviceId,
    },
    /// A command was received from the device.
    CommandReceived {
        /// Device identifier.
        device: DeviceId,
        /// Decoded command.
        command: Command,
    },
    /// The auxiliary proxy channel is open, or failed to open when `endpoint` is `None`.
    ProxyChannelOpened {
        /// Device identifier.
        device: DeviceId,
        /// Local endpoint of the channel.
        endpoint: Option<ProxyEndpoint>,
    },
    /// A timer expired.
    TimerFired {
        /// Device identifier.
        device: DeviceId,
        /// Timer identifier.
        timer: UniqueId,
    },
    /// The preset dictionary of the device was committed.
    PresetChanged {
        /// Device identifier.
        device: DeviceId,
    },
}

impl Event {
    /// Device this event is addressed to.
    pub fn device(&self) -> &DeviceId {
        match self {
            Event::DeviceAppeared { device, .. }
            | Event::DeviceVanished { device, .. }
            | Event::LinkConnecting { device, .. }
            | Event::LinkConnected { device, .. }
            | Event::LinkDisconnected { device, .. }
            | Event::LinkCanceled { device, .. }
            | Event::LinkLost { device }
            | Event::CommandReceived { device, .. }
            | Event::ProxyChannelOpened { device, .. }
            | Event::TimerFired { device, .. }
            | Event::PresetChanged { device } => device,
        }
    }
}

/// Shared queue of inbound events.
///
/// Collects events raised from callbacks, such as dictionary observers, until the engine
/// processes them.
#[derive(Clone, Debug, Default)]
pub struct EventQueue(Arc<Mutex<VecDeque<Event>>>);

impl EventQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an event.
    pub fn push(&self, event: Event) {
        self.lock().push_back(event);
    }

    /// Removes the oldest event.
    pub fn pop(&self) -> Option<Event> {
        self.lock().pop_front()
    }

    /// Returns `true` if no event is waiting.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Event>> {
        self.0.lock().unwrap_or_else(|err| err.into_inner())
    }
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Outbound event.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeviceEvent {
    /// A controller was created for the device.
    Added {
        /// Device identifier.
        device: DeviceId,
        /// Device model.
        model: DeviceModel,
    },
    /// The controller of the device stopped and was discarded.
    Removed {
        /// Device identifier.
        device: DeviceId,
    },
    /// Controller lifecycle changed.
    LifecycleChanged {
        /// Device identifier.
        device: DeviceId,
        /// New lifecycle.
        lifecycle: ControllerLifecycle,
    },
    /// Connection state changed.
    StateChanged {
        /// Device identifier.
        device: DeviceId,
        /// New state.
        state: ConnectionState,
        /// Reason of the change.
        cause: ConnectionCause,
    },
    /// Data synchronization allowance changed.
    DataSyncChanged {
        /// Device identifier.
        device: DeviceId,
        /// Whether data synchronization is allowed.
        allowed: bool,
    },
}

/// Receiver of outbound events.
pub trait EventSink: Debug + Send + Sync {
    /// Handles an outbound event.
    fn notify(&self, event: DeviceEvent);
}

/// [`EventSink`] that discards everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoSink;

impl EventSink for NoSink {
    fn notify(&self, _: DeviceEvent) {}
}

/// [`EventSink`] that keeps every event in memory.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<DeviceEvent>>,
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns all logged events.
    pub fn drain(&self) -> Vec<DeviceEvent> {
        let mut events = self.events.lock().unwrap_or_else(|err| err.into_inner());
        std::mem::take(&mut *events)
    }

    /// Connection states logged for `device`, with their causes.
    pub fn states_of(&self, device: &DeviceId) -> Vec<(ConnectionState, ConnectionCause)> {
        let events = self.events.lock().unwrap_or_else(|err| err.into_inner());
        events
            .iter()
            .filter_map(|event| match event {
                DeviceEvent::StateChanged {
                    device: id,
                    state,
                    cause,
                } if id == device => Some((*state, *cause)),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for EventLog {
    fn notify(&self, event: DeviceEvent) {
        log::trace!("device event: {event:?}");
        let mut events = self.events.lock().unwrap_or_else(|err| err.into_inner());
        events.push(event);
    }
}
