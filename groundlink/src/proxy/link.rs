use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::core::io::{ConnectionProvider, Connector, ProtocolBackend};

use crate::prelude::*;

#[derive(Debug, Default)]
struct LinkState {
    backend: Option<Arc<dyn ProtocolBackend>>,
    parent: Option<Arc<dyn ConnectionProvider>>,
    active: Option<DeviceId>,
    active_syncing: bool,
    auth_failed: BTreeSet<DeviceId>,
}

/// State shared by a remote control controller and the provider of the drones it relays.
#[derive(Debug)]
pub struct ProxyLink {
    remote: DeviceId,
    connector: Connector,
    state: Mutex<LinkState>,
}

impl ProxyLink {
    /// Creates link of the remote control `remote`.
    pub fn new(remote: DeviceId) -> Self {
        let connector = Connector::remote_control(remote.as_str());
        Self {
            remote,
            connector,
            state: Mutex::new(LinkState::default()),
        }
    }

    /// Identifier of the remote control.
    #[inline(always)]
    pub fn remote(&self) -> &DeviceId {
        &self.remote
    }

    /// Connector of drones relayed by the remote control.
    #[inline(always)]
    pub fn connector(&self) -> &Connector {
        &self.connector
    }

    /// Sends a command to the remote control.
    ///
    /// Returns `false` if the remote control is not link-connected.
    pub fn send(&self, command: Command) -> bool {
        match self.backend() {
            Some(backend) => backend.send(command),
            None => {
                log::debug!("[{}] dropping {command:?}, link is down", self.remote);
                false
            }
        }
    }

    /// Protocol link of the remote control.
    pub fn backend(&self) -> Option<Arc<dyn ProtocolBackend>> {
        self.lock().backend.clone()
    }

    pub(crate) fn set_backend(&self, backend: Option<Arc<dyn ProtocolBackend>>) {
        self.lock().backend = backend;
    }

    /// Provider through which the remote control itself is connected.
    pub fn parent(&self) -> Option<Arc<dyn ConnectionProvider>> {
        self.lock().parent.clone()
    }

    pub(crate) fn set_parent(&self, parent: Option<Arc<dyn ConnectionProvider>>) {
        self.lock().parent = parent;
    }

    /// Drone currently relayed, or being connected, by the remote control.
    pub fn active_device(&self) -> Option<DeviceId> {
        self.lock().active.clone()
    }

    pub(crate) fn set_active_device(&self, device: Option<DeviceId>) {
        let mut state = self.lock();
        state.active = device;
        state.active_syncing = false;
    }

    /// Whether the active drone is synchronizing data.
    pub fn is_active_syncing(&self) -> bool {
        self.lock().active_syncing
    }

    /// Records data synchronization allowance of `device`. Ignored unless it is active.
    pub(crate) fn set_active_syncing(&self, device: &DeviceId, allowed: bool) {
        let mut state = self.lock();
        if state.active.as_ref() == Some(device) {
            state.active_syncing = allowed;
        }
    }

    /// Whether the remote control rejected credentials of `device`.
    pub fn is_auth_failed(&self, device: &DeviceId) -> bool {
        self.lock().auth_failed.contains(device)
    }

    /// Drones whose credentials were rejected.
    pub fn auth_failed(&self) -> Vec<DeviceId> {
        self.lock().auth_failed.iter().cloned().collect()
    }

    pub(crate) fn add_auth_failed(&self, device: DeviceId) {
        self.lock().auth_failed.insert(device);
    }

    pub(crate) fn remove_auth_failed(&self, device: &DeviceId) -> bool {
        self.lock().auth_failed.remove(device)
    }

    pub(crate) fn clear_auth_failed(&self) {
        self.lock().auth_failed.clear();
    }

    fn lock(&self) -> MutexGuard<'_, LinkState> {
        self.state.lock().unwrap_or_else(|err| err.into_inner())
    }
}
