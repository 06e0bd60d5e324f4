//! # Component controllers
//!
//! Capabilities of a device (camera, gimbal, battery, media storage, ...) are implemented as
//! [`ComponentController`]s. They are passive: a device controller notifies them of every
//! lifecycle step, always after updating its own state, and in the order they were registered.
//!
//! The set of components of a device is fixed when its controller is built from a
//! [`ComponentFactory`].

use std::fmt::Debug;
use std::sync::Arc;

use crate::core::device::DeviceIdentity;
use crate::core::io::ProtocolBackend;
use crate::core::recording::RecordingSession;
use crate::core::storage::Dictionary;
use crate::piloting::{PilotingInterface, ReturnHomePiloting};

use crate::prelude::*;

/// View of a device controller handed to its components.
#[derive(Clone, Copy)]
pub struct ComponentContext<'a> {
    pub(crate) identity: &'a DeviceIdentity,
    pub(crate) phase: ConnectionPhase,
    pub(crate) backend: Option<&'a Arc<dyn ProtocolBackend>>,
    pub(crate) dictionary: &'a Arc<dyn Dictionary>,
    pub(crate) preset: &'a Arc<dyn Dictionary>,
    pub(crate) session: Option<&'a Arc<dyn RecordingSession>>,
}

impl<'a> ComponentContext<'a> {
    /// Identity of the device.
    #[inline(always)]
    pub fn identity(&self) -> &'a DeviceIdentity {
        self.identity
    }

    /// Identifier of the device.
    #[inline(always)]
    pub fn device(&self) -> &'a DeviceId {
        self.identity.id()
    }

    /// Current connection phase.
    #[inline(always)]
    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Device dictionary.
    #[inline(always)]
    pub fn dictionary(&self) -> &'a Arc<dyn Dictionary> {
        self.dictionary
    }

    /// Preset dictionary currently applied to the device.
    #[inline(always)]
    pub fn preset(&self) -> &'a Arc<dyn Dictionary> {
        self.preset
    }

    /// Protocol link, if up.
    #[inline(always)]
    pub fn backend(&self) -> Option<&'a Arc<dyn ProtocolBackend>> {
        self.backend
    }

    /// Black-box recording session of the current connection.
    #[inline(always)]
    pub fn session(&self) -> Option<&'a Arc<dyn RecordingSession>> {
        self.session
    }

    /// Sends a command to the device.
    ///
    /// Returns `false` and drops the command if the link is down.
    pub fn send_command(&self, command: Command) -> bool {
        match self.backend {
            Some(backend) => backend.send(command),
            None => false,
        }
    }
}

/// Lifecycle listener implementing one device capability.
///
/// All methods do nothing by default.
#[allow(unused_variables)]
pub trait ComponentController: Send {
    /// The protocol link is up, the handshake is starting.
    fn on_connecting(&mut self, ctx: &ComponentContext<'_>) {}

    /// The handshake completed.
    fn on_connected(&mut self, ctx: &ComponentContext<'_>) {}

    /// A connected device is about to disconnect.
    fn on_disconnecting(&mut self, ctx: &ComponentContext<'_>) {}

    /// The protocol link is down.
    fn on_disconnected(&mut self, ctx: &ComponentContext<'_>) {}

    /// The transport reported the link as lost.
    fn on_link_lost(&mut self, ctx: &ComponentContext<'_>) {}

    /// Data synchronization with the device became allowed or disallowed.
    fn on_data_sync_allowance_changed(&mut self, ctx: &ComponentContext<'_>, allowed: bool) {}

    /// A command was received from the device.
    fn on_command_received(&mut self, ctx: &ComponentContext<'_>, command: &Command) {}

    /// The preset dictionary changed.
    fn on_preset_change(&mut self, ctx: &ComponentContext<'_>) {}

    /// The device is being forgotten.
    fn on_forgetting(&mut self, ctx: &ComponentContext<'_>) {}

    /// The device controller stopped for good.
    fn on_dispose(&mut self, ctx: &ComponentContext<'_>) {}
}

/// Builds capabilities of newly created device controllers.
#[allow(unused_variables)]
pub trait ComponentFactory: Debug + Send + Sync {
    /// Component controllers of the device, in notification order.
    ///
    /// `None` entries stand for capabilities the device does not support and are skipped.
    fn components(&self, identity: &DeviceIdentity) -> Vec<Option<Box<dyn ComponentController>>> {
        Vec::new()
    }

    /// Piloting interfaces of a drone besides the default manual one.
    fn piloting_interfaces(&self, identity: &DeviceIdentity) -> Vec<Box<dyn PilotingInterface>> {
        vec![Box::new(ReturnHomePiloting::new())]
    }
}

/// [`ComponentFactory`] producing no components.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoComponents;

impl ComponentFactory for NoComponents {}
