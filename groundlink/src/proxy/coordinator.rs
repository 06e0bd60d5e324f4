use std::collections::BTreeSet;
use std::sync::Arc;

use crate::controller::{ControllerEnv, DeviceController, DroneFamily, RemoteControlFamily};
use crate::core::io::{ConnectionProvider, Credentials};
use crate::protocol::DroneManagerMessage;
use crate::proxy::{DeviceManagerTranslator, ProxyAction, ProxyLink, ProxyProvider};

use crate::prelude::*;

/// Drone controllers a [`ProxyLinkCoordinator`] may relay to.
pub trait ProxiedDevices {
    /// Controller of the drone, created and started if missing.
    fn get_or_create(
        &mut self,
        device: &DeviceId,
        model: DeviceModel,
        name: &str,
    ) -> &mut DeviceController<DroneFamily>;

    /// Controller of the drone, if any.
    fn get_mut(&mut self, device: &DeviceId) -> Option<&mut DeviceController<DroneFamily>>;
}

/// Remote control relaying connections to drones.
///
/// Wraps the remote control controller and drives the drone controllers it relays to: they are
/// given a [`ProxyProvider`] while they are known by the remote control, active, or awaiting
/// other credentials.
#[derive(Debug)]
pub struct ProxyLinkCoordinator {
    controller: DeviceController<RemoteControlFamily>,
    link: Arc<ProxyLink>,
    provider: Arc<dyn ConnectionProvider>,
    translator: DeviceManagerTranslator,
    attached: BTreeSet<DeviceId>,
}

impl ProxyLinkCoordinator {
    /// Creates a stopped remote control controller.
    pub fn new(id: DeviceId, model: DeviceModel, name: impl Into<String>, env: ControllerEnv) -> Self {
        let link = Arc::new(ProxyLink::new(id.clone()));
        let provider: Arc<dyn ConnectionProvider> = Arc::new(ProxyProvider::new(link.clone()));
        let translator = DeviceManagerTranslator::new(id.clone());
        let controller = DeviceController::remote_control(id, model, name, env, link.clone());

        Self {
            controller,
            link,
            provider,
            translator,
            attached: BTreeSet::new(),
        }
    }

    /// Remote control identifier.
    #[inline(always)]
    pub fn id(&self) -> &DeviceId {
        self.controller.id()
    }

    /// Remote control controller.
    #[inline(always)]
    pub fn controller(&self) -> &DeviceController<RemoteControlFamily> {
        &self.controller
    }

    /// Mutable remote control controller.
    ///
    /// Call [`sync`](Self::sync) once done with it.
    #[inline(always)]
    pub fn controller_mut(&mut self) -> &mut DeviceController<RemoteControlFamily> {
        &mut self.controller
    }

    /// Link shared with relayed drones.
    #[inline(always)]
    pub fn link(&self) -> &Arc<ProxyLink> {
        &self.link
    }

    /// Provider of relayed drones.
    #[inline(always)]
    pub fn provider(&self) -> &Arc<dyn ConnectionProvider> {
        &self.provider
    }

    /// Drones reported by the remote control.
    #[inline(always)]
    pub fn translator(&self) -> &DeviceManagerTranslator {
        &self.translator
    }

    /// Whether the drone controller holds the provider of this remote control.
    pub fn is_attached(&self, device: &DeviceId) -> bool {
        self.attached.contains(device)
    }

    /// Connects a drone the remote control already knows.
    ///
    /// Returns `false` if the drone is not relayed by this remote control or the request was
    /// refused.
    pub fn connect_known(
        &mut self,
        drones: &mut impl ProxiedDevices,
        device: &DeviceId,
        credentials: Option<&Credentials>,
    ) -> bool {
        if !self.attached.contains(device) {
            log::debug!("[{}] {device} is not relayed", self.id());
            return false;
        }
        let provider = self.provider.clone();
        match drones.get_mut(device) {
            Some(drone) => drone.connect(provider, credentials, ConnectionCause::UserRequested),
            None => false,
        }
    }

    /// Connects a drone the remote control discovered but does not know yet.
    ///
    /// The drone controller is created first, so that connecting proceeds exactly as for a
    /// known drone.
    pub fn connect_discovered(
        &mut self,
        drones: &mut impl ProxiedDevices,
        device: &DeviceId,
        model: DeviceModel,
        name: &str,
        credentials: Option<&Credentials>,
    ) -> bool {
        let provider = self.provider.clone();
        let drone = drones.get_or_create(device, model, name);
        if self.attached.insert(device.clone()) {
            drone.register_provider(provider.clone());
        }
        let connected = drone.connect(provider, credentials, ConnectionCause::UserRequested);
        self.sync(drones);
        connected
    }

    /// Asks the remote control to forget a drone.
    ///
    /// Only the remote control is asked. The drone controller, its persisted data and its other
    /// providers are left untouched; the remote control confirms by updating its known list.
    pub fn forget(&mut self, drones: &mut impl ProxiedDevices, device: &DeviceId) {
        self.provider.forget(device);
        self.sync(drones);
    }

    /// Handles a command received from the remote control.
    pub fn on_command_received(&mut self, drones: &mut impl ProxiedDevices, command: &Command) {
        self.controller.on_command_received(command);
        self.sync(drones);

        if let Command::DroneManager(message) = command {
            self.on_drone_manager_message(drones, message);
        }
    }

    /// Brings the link and relayed drones up to date with the remote control controller.
    ///
    /// Must be called after any change of the remote control or relayed drone controllers.
    pub fn sync(&mut self, drones: &mut impl ProxiedDevices) {
        let link_down = self.controller.backend().is_none() && self.link.backend().is_some();
        if self.controller.family_mut().take_disconnecting() || link_down {
            self.on_proxy_disconnecting(drones);
        }

        self.link.set_backend(self.controller.backend().cloned());
        self.link
            .set_parent(self.controller.active_provider().cloned());

        self.attached.retain(|device| drones.get_mut(device).is_some());
        self.refresh_providers(drones);
        if let Some(active) = self.link.active_device() {
            let syncing = drones
                .get_mut(&active)
                .is_some_and(|drone| drone.is_data_sync_allowed());
            self.link.set_active_syncing(&active, syncing);
        }
        self.controller.notify_data_sync_condition_changed();
    }

    fn on_drone_manager_message(
        &mut self,
        drones: &mut impl ProxiedDevices,
        message: &DroneManagerMessage,
    ) {
        for action in self.translator.translate(message) {
            log::trace!("[{}] {action:?}", self.id());
            self.apply(drones, action);
        }
        self.sync(drones);
    }

    fn apply(&mut self, drones: &mut impl ProxiedDevices, action: ProxyAction) {
        match action {
            ProxyAction::NoActiveDevice => self.change_active(drones, None),
            ProxyAction::Connecting {
                device,
                model,
                name,
            } => {
                drones.get_or_create(&device, model, &name);
                self.change_active(drones, Some(device.clone()));
                if let Some(drone) = drones.get_mut(&device) {
                    drone.on_link_connecting(self.provider.clone());
                }
            }
            ProxyAction::Connected {
                device,
                model,
                name,
            } => {
                drones.get_or_create(&device, model, &name);
                self.change_active(drones, Some(device.clone()));
                let Some(backend) = self.controller.backend() else {
                    log::warn!("[{}] {device} relayed while link is down", self.id());
                    return;
                };
                let backend = backend.proxy_for(&device);
                if let Some(drone) = drones.get_mut(&device) {
                    drone.on_link_connected(self.provider.clone(), backend);
                }
            }
            ProxyAction::Disconnecting { device } => {
                if self.link.active_device().as_ref() == Some(&device) {
                    self.change_active(drones, None);
                }
            }
            ProxyAction::AuthenticationFailed {
                device,
                model,
                name,
            } => {
                if self.link.active_device().as_ref() != Some(&device) {
                    log::debug!("[{}] ignoring authentication failure of {device}", self.id());
                    return;
                }
                drones
                    .get_or_create(&device, model, &name)
                    .on_link_canceled(ConnectionCause::BadPassword, false);
                self.link.add_auth_failed(device);
            }
            ProxyAction::ClearKnown | ProxyAction::AddKnown { .. } | ProxyAction::RemoveKnown { .. } => {
                self.refresh_providers(drones)
            }
        }
    }

    fn change_active(&mut self, drones: &mut impl ProxiedDevices, device: Option<DeviceId>) {
        let previous = self.link.active_device();
        if previous == device {
            return;
        }
        log::debug!("[{}] active device: {previous:?} -> {device:?}", self.id());

        if let Some(drone) = previous.and_then(|previous| drones.get_mut(&previous)) {
            drone.on_link_disconnected(false);
        }
        self.link.set_active_device(device);
        self.refresh_providers(drones);
    }

    fn on_proxy_disconnecting(&mut self, drones: &mut impl ProxiedDevices) {
        log::debug!("[{}] proxy link going down", self.id());
        self.change_active(drones, None);

        let uid = self.provider.connector().uid().to_string();
        for device in self.attached.iter() {
            let Some(drone) = drones.get_mut(device) else {
                continue;
            };
            if drone
                .active_provider()
                .is_some_and(|provider| provider.connector().uid() == uid)
            {
                drone.on_link_disconnected(false);
            }
        }

        self.translator.reset();
        self.link.clear_auth_failed();
        self.refresh_providers(drones);
    }

    /// Attaches the provider to drones that need it, detaches it from the others.
    ///
    /// A drone connecting through the provider keeps it until the remote control reports it.
    fn refresh_providers(&mut self, drones: &mut impl ProxiedDevices) {
        let active = self.link.active_device();
        let auth_failed = self.link.auth_failed();
        let needed: BTreeSet<DeviceId> = self
            .translator
            .known()
            .cloned()
            .chain(active)
            .chain(auth_failed)
            .collect();

        let uid = self.provider.connector().uid().to_string();
        for device in self.attached.difference(&needed).cloned().collect::<Vec<_>>() {
            let Some(drone) = drones.get_mut(&device) else {
                self.attached.remove(&device);
                continue;
            };
            let connecting = drone
                .active_provider()
                .is_some_and(|provider| provider.connector().uid() == uid);
            if !connecting {
                self.attached.remove(&device);
                drone.unregister_provider(&uid);
            }
        }

        for device in needed.difference(&self.attached).cloned().collect::<Vec<_>>() {
            let drone = match self.translator.entry(&device) {
                Some(entry) => Some(drones.get_or_create(&device, entry.model(), entry.name())),
                None => drones.get_mut(&device),
            };
            if let Some(drone) = drone {
                drone.register_provider(self.provider.clone());
                self.attached.insert(device);
            }
        }
    }
}
