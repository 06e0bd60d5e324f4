use std::fmt::{Display, Formatter};

use crate::core::utils::{Closable, Closer, UniqueId};

/// Cancellable handle of a long-running request started through a
/// [`ProtocolBackend`](super::ProtocolBackend).
///
/// The request is cancelled when the handle is cancelled explicitly or dropped. The backend
/// performing the request keeps a [`Closable`] obtained from [`RequestHandle::watch`] and stops
/// once it reports closed.
#[derive(Debug)]
#[must_use]
pub struct RequestHandle {
    id: UniqueId,
    closer: Closer,
}

impl RequestHandle {
    /// Creates a handle for a newly started request.
    pub fn new() -> Self {
        Self {
            id: UniqueId::new(),
            closer: Closer::new(),
        }
    }

    /// Request identifier.
    #[inline(always)]
    pub fn id(&self) -> UniqueId {
        self.id
    }

    /// Read-only view of the cancellation state for the party performing the request.
    pub fn watch(&self) -> Closable {
        self.closer.to_closable()
    }

    /// Cancels the request.
    pub fn cancel(mut self) {
        self.closer.close();
    }

    /// Returns `true` if the request was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.closer.is_closed()
    }
}

impl Default for RequestHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Local endpoint of an auxiliary proxy channel.
///
/// Reported once the channel requested by
/// [`ProtocolBackend::open_proxy_channel`](super::ProtocolBackend::open_proxy_channel) is
/// established. HTTP clients reach the device through it.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyEndpoint {
    /// Local address.
    pub address: String,
    /// Local port.
    pub port: u16,
}

impl Display for ProxyEndpoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.address, self.port)
    }
}
