use std::collections::BTreeMap;

use crate::controller::{ControllerEnv, DeviceController, DroneFamily};
use crate::core::event::DeviceEvent;
use crate::proxy::{ProxiedDevices, ProxyLinkCoordinator};

use crate::prelude::*;

/// Drone controllers of an engine.
///
/// Controllers are created and started on first access. A stopped controller is replaced when
/// accessed again through [`ProxiedDevices::get_or_create`].
#[derive(Debug)]
pub struct DroneRegistry {
    env: ControllerEnv,
    controllers: BTreeMap<DeviceId, DeviceController<DroneFamily>>,
}

impl DroneRegistry {
    pub(crate) fn new(env: ControllerEnv) -> Self {
        Self {
            env,
            controllers: BTreeMap::new(),
        }
    }

    /// Drone controller.
    pub fn get(&self, device: &DeviceId) -> Option<&DeviceController<DroneFamily>> {
        self.controllers.get(device)
    }

    /// Drone controllers ordered by identifier.
    pub fn iter(&self) -> impl Iterator<Item = &DeviceController<DroneFamily>> {
        self.controllers.values()
    }

    /// Whether the registry has a controller for the drone.
    pub fn contains(&self, device: &DeviceId) -> bool {
        self.controllers.contains_key(device)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut DeviceController<DroneFamily>> {
        self.controllers.values_mut()
    }

    /// Removes stopped controllers and returns their identifiers.
    pub(crate) fn reap(&mut self) -> Vec<DeviceId> {
        let stopped: Vec<DeviceId> = self
            .controllers
            .iter()
            .filter(|(_, controller)| controller.lifecycle() == ControllerLifecycle::Stopped)
            .map(|(id, _)| id.clone())
            .collect();
        for id in stopped.iter() {
            self.controllers.remove(id);
        }
        stopped
    }
}

impl ProxiedDevices for DroneRegistry {
    fn get_or_create(
        &mut self,
        device: &DeviceId,
        model: DeviceModel,
        name: &str,
    ) -> &mut DeviceController<DroneFamily> {
        let stale = self
            .controllers
            .get(device)
            .is_some_and(|controller| controller.lifecycle() == ControllerLifecycle::Stopped);
        if stale {
            self.controllers.remove(device);
            self.env.sink.notify(DeviceEvent::Removed {
                device: device.clone(),
            });
        }

        let env = &self.env;
        self.controllers.entry(device.clone()).or_insert_with(|| {
            log::info!("[{device}] new {model:?} drone");
            let mut controller = DeviceController::drone(device.clone(), model, name, env.clone());
            env.sink.notify(DeviceEvent::Added {
                device: device.clone(),
                model,
            });
            controller.start();
            controller
        })
    }

    fn get_mut(&mut self, device: &DeviceId) -> Option<&mut DeviceController<DroneFamily>> {
        self.controllers.get_mut(device)
    }
}

/// Every device controller of an engine, keyed by device identifier.
#[derive(Debug)]
pub struct DeviceRegistry {
    pub(crate) env: ControllerEnv,
    pub(crate) drones: DroneRegistry,
    pub(crate) remotes: BTreeMap<DeviceId, ProxyLinkCoordinator>,
}

impl DeviceRegistry {
    pub(crate) fn new(env: ControllerEnv) -> Self {
        Self {
            drones: DroneRegistry::new(env.clone()),
            remotes: BTreeMap::new(),
            env,
        }
    }

    /// Drone controllers.
    #[inline(always)]
    pub fn drones(&self) -> &DroneRegistry {
        &self.drones
    }

    /// Remote control coordinators ordered by identifier.
    pub fn remotes(&self) -> impl Iterator<Item = &ProxyLinkCoordinator> {
        self.remotes.values()
    }

    /// Remote control coordinator.
    pub fn remote(&self, device: &DeviceId) -> Option<&ProxyLinkCoordinator> {
        self.remotes.get(device)
    }

    /// Whether the registry has a controller for the device.
    pub fn contains(&self, device: &DeviceId) -> bool {
        self.drones.contains(device) || self.remotes.contains_key(device)
    }

    /// Number of device controllers.
    pub fn len(&self) -> usize {
        self.drones.controllers.len() + self.remotes.len()
    }

    /// Whether there is no device controller.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Creates and starts the controller of a device unless it exists.
    pub(crate) fn ensure(&mut self, device: &DeviceId, model: DeviceModel, name: &str) {
        if model.is_drone() {
            self.drones.get_or_create(device, model, name);
            return;
        }

        if !self.remotes.contains_key(device) {
            log::info!("[{device}] new {model:?} remote control");
            let mut coordinator =
                ProxyLinkCoordinator::new(device.clone(), model, name, self.env.clone());
            self.env.sink.notify(DeviceEvent::Added {
                device: device.clone(),
                model,
            });
            coordinator.controller_mut().start();
            self.remotes.insert(device.clone(), coordinator);
        }
    }

    /// Brings every coordinator up to date, then removes stopped controllers.
    pub(crate) fn settle(&mut self) {
        for coordinator in self.remotes.values_mut() {
            coordinator.sync(&mut self.drones);
        }

        let stopped_remotes: Vec<DeviceId> = self
            .remotes
            .iter()
            .filter(|(_, coordinator)| {
                coordinator.controller().lifecycle() == ControllerLifecycle::Stopped
            })
            .map(|(id, _)| id.clone())
            .collect();
        for id in stopped_remotes {
            if let Some(mut coordinator) = self.remotes.remove(&id) {
                coordinator.sync(&mut self.drones);
            }
            log::debug!("[{id}] remote control removed");
            self.env.sink.notify(DeviceEvent::Removed { device: id });
        }

        for id in self.drones.reap() {
            log::debug!("[{id}] drone removed");
            self.env.sink.notify(DeviceEvent::Removed { device: id });
        }
    }
}
