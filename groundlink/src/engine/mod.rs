//! # Engine
//!
//! The [`Engine`] owns every device controller and processes inbound
//! [`Event`]s one at a time. Controllers are created when a device is first observed or
//! restored from storage at start, and discarded once stopped.
//!
//! Drone controllers are kept in a flat [`DroneRegistry`], whichever way their drone is
//! reached. Remote controls are wrapped into [`ProxyLinkCoordinator`]s, which attach their
//! provider to the drones they relay.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use groundlink::core::device::DeviceId;
//! use groundlink::core::scheduler::ManualScheduler;
//! use groundlink::engine::EngineConf;
//!
//! let mut engine = EngineConf::builder()
//!     .scheduler(Arc::new(ManualScheduler::new()))
//!     .build();
//! engine.start();
//!
//! assert!(engine.disconnect(&DeviceId::new("nobody")).is_err());
//! ```

mod conf;
mod registry;

pub use conf::{EngineBuilder, EngineConf};
pub use registry::{DeviceRegistry, DroneRegistry};

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::consts::{KEY_DEVICE_MODEL, KEY_DEVICE_NAME};
use crate::controller::{ControllerEnv, DeviceController, DeviceFamily, DroneFamily};
use crate::core::event::Event;
use crate::core::io::{ConnectionProvider, Credentials};
use crate::core::storage::Dictionary;
use crate::piloting::{ActivationState, InterfaceKind, PilotingActivationArbiter, PilotingCommand};
use crate::proxy::{ProxiedDevices, ProxyLinkCoordinator};

use crate::prelude::*;

macro_rules! on_controller {
    ($engine:ident, $device:expr, |$controller:ident| $body:expr) => {{
        let registry = &mut $engine.registry;
        if let Some($controller) = registry.drones.get_mut($device) {
            Ok($body)
        } else if let Some(coordinator) = registry.remotes.get_mut($device) {
            let $controller = coordinator.controller_mut();
            Ok($body)
        } else {
            Err(Error::from(DeviceError::Unknown($device.clone())))
        }
    }};
}

/// Connection lifecycle engine.
#[derive(Debug)]
pub struct Engine {
    env: ControllerEnv,
    registry: DeviceRegistry,
    started: bool,
}

impl Engine {
    /// Creates a stopped engine. Use [`EngineConf::builder`] instead.
    pub fn new(conf: EngineConf) -> Self {
        let env = conf.env;
        Self {
            registry: DeviceRegistry::new(env.clone()),
            env,
            started: false,
        }
    }

    /// Whether the engine was started.
    #[inline(always)]
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Every device controller.
    #[inline(always)]
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Drone controllers ordered by identifier.
    pub fn drones(&self) -> impl Iterator<Item = &DeviceController<DroneFamily>> {
        self.registry.drones.iter()
    }

    /// Remote control coordinators ordered by identifier.
    pub fn remotes(&self) -> impl Iterator<Item = &ProxyLinkCoordinator> {
        self.registry.remotes()
    }

    /// Drone controller.
    pub fn drone(&self, device: &DeviceId) -> Option<&DeviceController<DroneFamily>> {
        self.registry.drones.get(device)
    }

    /// Remote control coordinator.
    pub fn remote(&self, device: &DeviceId) -> Option<&ProxyLinkCoordinator> {
        self.registry.remote(device)
    }

    /// Connection state of a device.
    pub fn state(&self, device: &DeviceId) -> Option<ConnectionState> {
        match self.drone(device) {
            Some(drone) => Some(drone.state()),
            None => self
                .remote(device)
                .map(|remote| remote.controller().state()),
        }
    }

    /// Starts the engine, restoring every device persisted in storage.
    pub fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        for id in self.env.store.devices() {
            let dictionary = self.env.store.device(&id);
            match Self::persisted_model(dictionary.as_ref()) {
                Ok(model) => {
                    let name = dictionary
                        .get(KEY_DEVICE_NAME)
                        .unwrap_or_else(|| model.default_name().to_string());
                    log::debug!("[{id}] restoring persisted {model:?}");
                    self.registry.ensure(&id, model, &name);
                }
                Err(err) => log::warn!("[{id}] can't restore device: {err}"),
            }
        }
        log::info!("engine started with {} devices", self.registry.len());
    }

    /// Stops the engine. Every controller is stopped and discarded.
    pub fn stop(&mut self) {
        if !self.started {
            return;
        }
        self.started = false;

        for drone in self.registry.drones.iter_mut() {
            drone.force_stop();
        }
        for remote in self.registry.remotes.values_mut() {
            remote.controller_mut().force_stop();
        }
        self.registry.settle();
        log::info!("engine stopped");
    }

    /// Processes an inbound event, then every event it raised.
    ///
    /// Returns an error if the event addresses an unknown device or connector.
    pub fn handle(&mut self, event: Event) -> Result<()> {
        let result = self.dispatch(event);
        while let Some(event) = self.env.queue.pop() {
            if let Err(err) = self.dispatch(event) {
                log::warn!("queued event failed: {err}");
            }
        }
        self.registry.settle();
        result
    }

    /// Connects a device through the provider with given connector, or through its first
    /// provider.
    pub fn connect(
        &mut self,
        device: &DeviceId,
        connector: Option<&str>,
        credentials: Option<&Credentials>,
    ) -> Result<bool> {
        let connected = on_controller!(self, device, |controller| {
            let provider = Self::select_provider(controller, connector)?;
            controller.connect(provider, credentials, ConnectionCause::UserRequested)
        });
        self.registry.settle();
        connected
    }

    /// Disconnects a device on user request.
    pub fn disconnect(&mut self, device: &DeviceId) -> Result<bool> {
        let disconnected = on_controller!(self, device, |controller| controller.user_disconnect());
        self.registry.settle();
        disconnected
    }

    /// Forgets a device.
    pub fn forget(&mut self, device: &DeviceId) -> Result<bool> {
        if !self.registry.contains(device) {
            return Err(DeviceError::Unknown(device.clone()).into());
        }

        // a relayed drone holds the relay provider, which forwards the request
        if let Some(drone) = self.registry.drones.get_mut(device) {
            drone.forget();
        } else if let Some(coordinator) = self.registry.remotes.get_mut(device) {
            coordinator.controller_mut().forget();
        }

        self.registry.settle();
        Ok(true)
    }

    /// Piloting interface arbiter of a drone.
    pub fn piloting(&self, device: &DeviceId) -> Result<&PilotingActivationArbiter> {
        self.drone(device)
            .map(|drone| drone.piloting())
            .ok_or_else(|| DeviceError::Unknown(device.clone()).into())
    }

    /// Requests activation of a piloting interface of a drone.
    pub fn activate_piloting(&mut self, device: &DeviceId, kind: InterfaceKind) -> Result<bool> {
        let activated = self.drone_with(device, kind)?.activate_piloting(kind);
        self.registry.settle();
        Ok(activated)
    }

    /// Requests deactivation of a piloting interface of a drone.
    pub fn deactivate_piloting(&mut self, device: &DeviceId, kind: InterfaceKind) -> Result<bool> {
        let deactivated = self.drone_with(device, kind)?.deactivate_piloting(kind);
        self.registry.settle();
        Ok(deactivated)
    }

    /// Records a new activation state reported by a piloting interface of a drone.
    pub fn report_piloting_state(
        &mut self,
        device: &DeviceId,
        kind: InterfaceKind,
        state: ActivationState,
    ) -> Result<()> {
        self.drone_with(device, kind)?.report_piloting(kind, state);
        self.registry.settle();
        Ok(())
    }

    /// Sets piloting command values on behalf of a piloting interface of a drone.
    ///
    /// Returns `Ok(false)` unless `kind` is the active interface.
    pub fn set_piloting_command(
        &mut self,
        device: &DeviceId,
        kind: InterfaceKind,
        command: PilotingCommand,
    ) -> Result<bool> {
        Ok(self.drone_with(device, kind)?.set_piloting_command(kind, command))
    }

    /// Connects a drone known by a remote control.
    pub fn connect_remote_drone(
        &mut self,
        remote: &DeviceId,
        drone: &DeviceId,
        credentials: Option<&Credentials>,
    ) -> Result<bool> {
        let registry = &mut self.registry;
        let coordinator = Self::coordinator(&mut registry.remotes, &registry.drones, remote)?;
        let connected = coordinator.connect_known(&mut registry.drones, drone, credentials);
        self.registry.settle();
        Ok(connected)
    }

    /// Connects a drone a remote control discovered.
    pub fn connect_discovered_drone(
        &mut self,
        remote: &DeviceId,
        drone: &DeviceId,
        model: DeviceModel,
        name: &str,
        credentials: Option<&Credentials>,
    ) -> Result<bool> {
        let registry = &mut self.registry;
        let coordinator = Self::coordinator(&mut registry.remotes, &registry.drones, remote)?;
        let connected =
            coordinator.connect_discovered(&mut registry.drones, drone, model, name, credentials);
        self.registry.settle();
        Ok(connected)
    }

    /// Asks a remote control to forget a drone.
    pub fn forget_remote_drone(&mut self, remote: &DeviceId, drone: &DeviceId) -> Result<()> {
        let registry = &mut self.registry;
        let coordinator = Self::coordinator(&mut registry.remotes, &registry.drones, remote)?;
        coordinator.forget(&mut registry.drones, drone);
        self.registry.settle();
        Ok(())
    }

    fn dispatch(&mut self, event: Event) -> Result<()> {
        log::trace!("[{}] {event:?}", event.device());

        match event {
            Event::DeviceAppeared {
                device,
                model,
                name,
                provider,
            } => {
                self.registry.ensure(&device, model, &name);
                on_controller!(self, &device, |controller| controller
                    .register_provider(provider.clone()))
            }
            Event::DeviceVanished { device, connector } => {
                let removed =
                    on_controller!(self, &device, |controller| controller
                        .unregister_provider(&connector))?;
                if removed {
                    Ok(())
                } else {
                    Err(DeviceError::UnknownConnector { device, connector }.into())
                }
            }
            Event::LinkConnecting { device, connector } => {
                on_controller!(self, &device, |controller| {
                    let provider = Self::select_provider(controller, Some(&connector))?;
                    controller.on_link_connecting(provider);
                })
            }
            Event::LinkConnected {
                device,
                connector,
                backend,
            } => on_controller!(self, &device, |controller| {
                let provider = Self::select_provider(controller, Some(&connector))?;
                controller.on_link_connected(provider, backend.clone());
            }),
            Event::LinkDisconnected { device, removing } => {
                on_controller!(self, &device, |controller| controller
                    .on_link_disconnected(removing))
            }
            Event::LinkCanceled {
                device,
                cause,
                removing,
            } => on_controller!(self, &device, |controller| controller
                .on_link_canceled(cause, removing)),
            Event::LinkLost { device } => {
                on_controller!(self, &device, |controller| controller.on_link_lost())
            }
            Event::CommandReceived { device, command } => {
                let registry = &mut self.registry;
                if let Some(remote) = registry.remotes.get_mut(&device) {
                    remote.on_command_received(&mut registry.drones, &command);
                    return Ok(());
                }
                on_controller!(self, &device, |controller| controller
                    .on_command_received(&command))
            }
            Event::ProxyChannelOpened { device, endpoint } => {
                on_controller!(self, &device, |controller| controller
                    .on_proxy_channel_opened(endpoint.clone()))
            }
            Event::TimerFired { device, timer } => {
                on_controller!(self, &device, |controller| controller.on_timer(timer))
            }
            Event::PresetChanged { device } => {
                on_controller!(self, &device, |controller| controller.on_preset_change())
            }
        }
    }

    fn persisted_model(dictionary: &dyn Dictionary) -> Result<DeviceModel> {
        let value = dictionary.get(KEY_DEVICE_MODEL).unwrap_or_default();
        let id = value.parse::<u16>().map_err(|_| StorageError::InvalidValue {
            key: KEY_DEVICE_MODEL.to_string(),
            value,
        })?;
        DeviceModel::from_id(id)
    }

    fn select_provider<F: DeviceFamily>(
        controller: &DeviceController<F>,
        connector: Option<&str>,
    ) -> Result<Arc<dyn ConnectionProvider>> {
        let provider = match connector {
            Some(connector) => controller.provider(connector),
            None => controller.providers().next(),
        };
        provider.cloned().ok_or_else(|| {
            DeviceError::UnknownConnector {
                device: controller.id().clone(),
                connector: connector.unwrap_or_default().to_string(),
            }
            .into()
        })
    }

    fn drone_with(
        &mut self,
        device: &DeviceId,
        kind: InterfaceKind,
    ) -> Result<&mut DeviceController<DroneFamily>> {
        let drone = self
            .registry
            .drones
            .get_mut(device)
            .ok_or_else(|| Error::from(DeviceError::Unknown(device.clone())))?;
        if drone.piloting().state(kind).is_none() {
            return Err(DeviceError::UnknownInterface {
                device: device.clone(),
                kind,
            }
            .into());
        }
        Ok(drone)
    }

    fn coordinator<'a>(
        remotes: &'a mut BTreeMap<DeviceId, ProxyLinkCoordinator>,
        drones: &DroneRegistry,
        remote: &DeviceId,
    ) -> Result<&'a mut ProxyLinkCoordinator> {
        if drones.contains(remote) {
            return Err(DeviceError::NotProxying(remote.clone()).into());
        }
        remotes
            .get_mut(remote)
            .ok_or_else(|| DeviceError::Unknown(remote.clone()).into())
    }
}
