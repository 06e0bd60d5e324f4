use std::sync::Arc;

use crate::core::io::{ConnectionProvider, Connector, Credentials};
use crate::protocol::DroneManagerMessage;
use crate::proxy::ProxyLink;

use crate::prelude::*;

/// Reachability path to drones relayed by a remote control.
///
/// Connect and forget requests are sent to the remote control as drone manager messages.
/// Disconnection is up to the remote control and can't be requested.
#[derive(Clone, Debug)]
pub struct ProxyProvider {
    link: Arc<ProxyLink>,
}

impl ProxyProvider {
    /// Creates provider relaying through `link`.
    pub fn new(link: Arc<ProxyLink>) -> Self {
        Self { link }
    }
}

impl ConnectionProvider for ProxyProvider {
    fn connector(&self) -> &Connector {
        self.link.connector()
    }

    fn parent(&self) -> Option<Arc<dyn ConnectionProvider>> {
        self.link.parent()
    }

    fn connect(&self, device: &DeviceId, credentials: Option<&Credentials>) -> bool {
        log::debug!("[{}] requesting connection of {device}", self.link.remote());
        self.link
            .send(Command::DroneManager(DroneManagerMessage::Connect {
                device: device.clone(),
                credentials: credentials.cloned(),
            }))
    }

    fn disconnect(&self, _: &DeviceId) -> bool {
        false
    }

    fn forget(&self, device: &DeviceId) {
        log::debug!("[{}] requesting to forget {device}", self.link.remote());
        self.link
            .send(Command::DroneManager(DroneManagerMessage::Forget {
                device: device.clone(),
            }));
        self.link.remove_auth_failed(device);
    }

    fn on_data_sync_condition_changed(&self, device: &DeviceId, allowed: bool) {
        self.link.set_active_syncing(device, allowed);
    }
}
