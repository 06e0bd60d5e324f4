use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::core::io::Connector;

use crate::prelude::*;

/// <sup>[`serde`](https://serde.rs)</sup>
/// Credentials used to connect to a secured device.
///
/// The secret is never printed by [`Debug`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials(String);

impl Credentials {
    /// Wraps a password.
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// Exposes the password.
    pub fn secret(&self) -> &str {
        self.0.as_str()
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credentials(***)")
    }
}

/// A reachability path to devices.
///
/// Providers are owned by the transport layer and only referenced by device controllers. Calls
/// are synchronous requests: the outcome of a connection or disconnection is reported later
/// through link [`Event`](crate::core::event::Event)s.
pub trait ConnectionProvider: Debug + Send + Sync {
    /// Connector identifying this path.
    fn connector(&self) -> &Connector;

    /// Provider this path relies upon, if any.
    ///
    /// A drone reached through a remote control has the remote control's active provider as a
    /// parent, which allows to find out the technology of the local hop.
    fn parent(&self) -> Option<Arc<dyn ConnectionProvider>> {
        None
    }

    /// Requests transport-level connection of the device.
    ///
    /// Returns `false` if the request was refused.
    fn connect(&self, device: &DeviceId, credentials: Option<&Credentials>) -> bool;

    /// Requests transport-level disconnection of the device.
    ///
    /// Returns `false` if the request was refused.
    fn disconnect(&self, device: &DeviceId) -> bool;

    /// Requests the provider to forget everything it knows about the device.
    fn forget(&self, device: &DeviceId);

    /// Called when the data synchronization allowance of the device changed.
    fn on_data_sync_condition_changed(&self, device: &DeviceId, allowed: bool) {
        let _ = (device, allowed);
    }
}
