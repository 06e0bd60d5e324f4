use crate::prelude::*;

/// <sup>[`serde`](https://serde.rs)</sup>
/// Connection state of a drone as reported by the remote control relaying it.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProxiedState {
    /// Not relayed.
    #[default]
    Idle,
    /// Connection underway.
    Connecting,
    /// Relayed.
    Connected,
    /// Disconnection underway.
    Disconnecting,
}


/// <sup>[`serde`](https://serde.rs)</sup>
/// What a remote control reported about a drone.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyEntry {
    pub(crate) model: DeviceModel,
    pub(crate) name: String,
    pub(crate) state: ProxiedState,
    pub(crate) known: bool,
}

impl ProxyEntry {
    pub(crate) fn new(model: DeviceModel, name: String) -> Self {
        Self {
            model,
            name,
            state: ProxiedState::Idle,
            known: false,
        }
    }

    /// Drone model.
    #[inline(always)]
    pub fn model(&self) -> DeviceModel {
        self.model
    }

    /// Drone name.
    #[inline(always)]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Last reported link state.
    #[inline(always)]
    pub fn state(&self) -> ProxiedState {
        self.state
    }

    /// Whether the drone is in the remote control's list of known drones.
    #[inline(always)]
    pub fn is_known(&self) -> bool {
        self.known
    }
}
