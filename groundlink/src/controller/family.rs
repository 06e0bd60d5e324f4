use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::core::component::ComponentContext;
use crate::core::device::DeviceIdentity;
use crate::core::recording::{Recorder, RecordingSession};

use crate::prelude::*;

/// Lifecycle signal decoded from a device command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Signal {
    /// The device sent all its settings.
    AllSettingsReceived,
    /// The device sent all its states.
    AllStatesReceived,
    /// The device is powering off on user request.
    PowerOff,
    /// The device reported its name.
    Name(String),
    /// The device reported its firmware version.
    FirmwareVersion(String),
    /// The device reported its board identifier.
    BoardId(String),
    /// A family specific data synchronization condition changed.
    DataSyncConditionChanged,
}

/// Behavior specific to a kind of device.
///
/// Hooks are called by the [`DeviceController`](super::DeviceController) with a view of its
/// current state. Unless stated otherwise they run before component controllers are notified.
#[allow(unused_variables)]
pub trait DeviceFamily: Debug + Send + 'static {
    /// Request for all settings, first step of the handshake.
    fn all_settings_request(&self) -> Command;

    /// Request for all states, second step of the handshake.
    fn all_states_request(&self) -> Command;

    /// Period of the unacknowledged command loop, zero to disable it.
    fn unacked_loop_period(&self) -> Duration {
        Duration::ZERO
    }

    /// Opens a recording session for a connection through the connector `provider`.
    fn open_session(
        &self,
        recorder: &dyn Recorder,
        identity: &DeviceIdentity,
        provider: Option<&str>,
    ) -> Option<Arc<dyn RecordingSession>> {
        recorder.open_session(identity.id(), identity.model(), provider)
    }

    /// Decodes a received command.
    fn on_command_received(
        &mut self,
        ctx: &ComponentContext<'_>,
        command: &Command,
    ) -> Option<Signal>;

    /// The protocol link is up. Runs after component controllers are notified.
    fn on_protocol_connecting(&mut self, ctx: &ComponentContext<'_>) {}

    /// The handshake completed.
    fn on_protocol_connected(&mut self, ctx: &ComponentContext<'_>) {}

    /// The device is about to disconnect.
    fn on_protocol_disconnecting(&mut self, ctx: &ComponentContext<'_>) {}

    /// The protocol link is down.
    fn on_protocol_disconnected(&mut self, ctx: &ComponentContext<'_>) {}

    /// Extra condition for data synchronization, on top of being connected.
    fn may_synchronize(&self) -> bool {
        true
    }
}
