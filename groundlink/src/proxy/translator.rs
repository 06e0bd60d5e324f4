use std::collections::BTreeMap;

use crate::protocol::{DroneManagerMessage, ListFlags, ProxiedLinkState};
use crate::proxy::{ProxiedState, ProxyEntry};

use crate::prelude::*;

/// Outcome of a drone manager message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProxyAction {
    /// No drone is relayed anymore.
    NoActiveDevice,
    /// The remote control is connecting a drone.
    Connecting {
        /// Drone identifier.
        device: DeviceId,
        /// Drone model.
        model: DeviceModel,
        /// Drone name.
        name: String,
    },
    /// The remote control relays a drone.
    Connected {
        /// Drone identifier.
        device: DeviceId,
        /// Drone model.
        model: DeviceModel,
        /// Drone name.
        name: String,
    },
    /// The remote control is disconnecting a drone.
    Disconnecting {
        /// Drone identifier.
        device: DeviceId,
    },
    /// The drone rejected credentials.
    AuthenticationFailed {
        /// Drone identifier.
        device: DeviceId,
        /// Drone model.
        model: DeviceModel,
        /// Drone name.
        name: String,
    },
    /// The list of known drones was emptied.
    ClearKnown,
    /// A drone was added to, or updated in, the list of known drones.
    AddKnown {
        /// Drone identifier.
        device: DeviceId,
        /// Drone model.
        model: DeviceModel,
        /// Drone name.
        name: String,
    },
    /// A drone was removed from the list of known drones.
    RemoveKnown {
        /// Drone identifier.
        device: DeviceId,
    },
}

/// Decoder of drone manager messages sent by a remote control.
///
/// Keeps track of every drone reported by the remote control. Entries are only created and
/// removed here.
///
/// ```rust
/// use groundlink::core::device::{DeviceId, DeviceModel};
/// use groundlink::protocol::{DroneManagerMessage, ListFlags};
/// use groundlink::proxy::{DeviceManagerTranslator, ProxyAction};
///
/// let mut translator = DeviceManagerTranslator::new(DeviceId::new("rc"));
/// let actions = translator.translate(&DroneManagerMessage::KnownDroneItem {
///     device: DeviceId::new("drone"),
///     model: DeviceModel::Anafi4k.id(),
///     name: "Anafi".to_string(),
///     flags: ListFlags::FIRST,
/// });
///
/// assert_eq!(actions.len(), 2);
/// assert_eq!(actions[0], ProxyAction::ClearKnown);
/// assert!(translator.is_known(&DeviceId::new("drone")));
/// ```
#[derive(Debug)]
pub struct DeviceManagerTranslator {
    remote: DeviceId,
    entries: BTreeMap<DeviceId, ProxyEntry>,
}

impl DeviceManagerTranslator {
    /// Creates translator of messages sent by the remote control `remote`.
    pub fn new(remote: DeviceId) -> Self {
        Self {
            remote,
            entries: BTreeMap::new(),
        }
    }

    /// Drones reported by the remote control.
    pub fn entries(&self) -> impl Iterator<Item = (&DeviceId, &ProxyEntry)> {
        self.entries.iter()
    }

    /// Entry of a drone.
    pub fn entry(&self, device: &DeviceId) -> Option<&ProxyEntry> {
        self.entries.get(device)
    }

    /// Drones in the list of known drones.
    pub fn known(&self) -> impl Iterator<Item = &DeviceId> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.known)
            .map(|(device, _)| device)
    }

    /// Whether the drone is in the list of known drones.
    pub fn is_known(&self, device: &DeviceId) -> bool {
        self.entries.get(device).is_some_and(|entry| entry.known)
    }

    /// Forgets every entry.
    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Decodes a message into the actions it implies, updating entries.
    pub fn translate(&mut self, message: &DroneManagerMessage) -> Vec<ProxyAction> {
        match message {
            DroneManagerMessage::ConnectionState {
                state,
                device,
                model,
                name,
            } => self.on_connection_state(*state, device, *model, name),
            DroneManagerMessage::AuthenticationFailed {
                device,
                model,
                name,
            } => match self.upsert(device, *model, name) {
                Some(model) => {
                    log::info!("[{}] {device} rejected credentials", self.remote);
                    vec![ProxyAction::AuthenticationFailed {
                        device: device.clone(),
                        model,
                        name: name.clone(),
                    }]
                }
                None => Vec::new(),
            },
            DroneManagerMessage::ConnectionRefused { device, .. } => {
                log::debug!("[{}] {device} refused connection", self.remote);
                Vec::new()
            }
            DroneManagerMessage::KnownDroneItem {
                device,
                model,
                name,
                flags,
            } => self.on_known_item(device, *model, name, *flags),
            DroneManagerMessage::Connect { .. } | DroneManagerMessage::Forget { .. } => {
                Vec::new()
            }
        }
    }

    fn on_connection_state(
        &mut self,
        state: ProxiedLinkState,
        device: &DeviceId,
        model: u16,
        name: &str,
    ) -> Vec<ProxyAction> {
        match state {
            ProxiedLinkState::Idle | ProxiedLinkState::Searching => {
                self.set_state_all(ProxiedState::Idle);
                vec![ProxyAction::NoActiveDevice]
            }
            ProxiedLinkState::Connecting => {
                let Some(model) = self.upsert(device, model, name) else {
                    return Vec::new();
                };
                self.set_state(device, ProxiedState::Connecting);
                vec![ProxyAction::Connecting {
                    device: device.clone(),
                    model,
                    name: name.to_string(),
                }]
            }
            ProxiedLinkState::Connected => {
                let Some(model) = self.upsert(device, model, name) else {
                    return Vec::new();
                };
                self.set_state(device, ProxiedState::Connected);
                vec![ProxyAction::Connected {
                    device: device.clone(),
                    model,
                    name: name.to_string(),
                }]
            }
            ProxiedLinkState::Disconnecting => {
                self.set_state(device, ProxiedState::Disconnecting);
                vec![ProxyAction::Disconnecting {
                    device: device.clone(),
                }]
            }
        }
    }

    fn on_known_item(
        &mut self,
        device: &DeviceId,
        model: u16,
        name: &str,
        flags: ListFlags,
    ) -> Vec<ProxyAction> {
        if flags.contains(ListFlags::EMPTY) {
            self.clear_known();
            return vec![ProxyAction::ClearKnown];
        }

        if flags.contains(ListFlags::REMOVE) {
            let Some(entry) = self.entries.get_mut(device) else {
                return Vec::new();
            };
            if !entry.known {
                return Vec::new();
            }
            entry.known = false;
            if entry.state == ProxiedState::Idle {
                self.entries.remove(device);
            }
            return vec![ProxyAction::RemoveKnown {
                device: device.clone(),
            }];
        }

        let mut actions = Vec::with_capacity(2);
        if flags.contains(ListFlags::FIRST) {
            self.clear_known();
            actions.push(ProxyAction::ClearKnown);
        }
        if let Some(model) = self.upsert(device, model, name) {
            if let Some(entry) = self.entries.get_mut(device) {
                entry.known = true;
            }
            actions.push(ProxyAction::AddKnown {
                device: device.clone(),
                model,
                name: name.to_string(),
            });
        }
        actions
    }

    fn upsert(&mut self, device: &DeviceId, model: u16, name: &str) -> Option<DeviceModel> {
        let model = match DeviceModel::from_id(model) {
            Ok(model) => model,
            Err(err) => {
                log::warn!("[{}] ignoring {device}: {err}", self.remote);
                return None;
            }
        };

        let entry = self
            .entries
            .entry(device.clone())
            .or_insert_with(|| ProxyEntry::new(model, name.to_string()));
        entry.model = model;
        entry.name = name.to_string();
        Some(model)
    }

    fn set_state(&mut self, device: &DeviceId, state: ProxiedState) {
        if let Some(entry) = self.entries.get_mut(device) {
            entry.state = state;
        }
    }

    fn set_state_all(&mut self, state: ProxiedState) {
        self.entries.values_mut().for_each(|entry| entry.state = state);
        self.entries.retain(|_, entry| entry.known);
    }

    fn clear_known(&mut self) {
        self.entries.values_mut().for_each(|entry| entry.known = false);
        self.entries
            .retain(|_, entry| entry.state != ProxiedState::Idle);
    }
}
