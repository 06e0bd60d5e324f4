//! # Black-box recording
//!
//! When a [`Recorder`] is configured, every device controller opens a [`RecordingSession`] as
//! soon as the protocol starts connecting, and closes it on disconnection. The session sees every
//! command received from the device and every change of the piloting command sent to it.

use std::fmt::Debug;
use std::sync::Arc;

use crate::piloting::PilotingCommand;

use crate::prelude::*;

/// Recording session of a single connection.
pub trait RecordingSession: Debug + Send + Sync {
    /// A command was received from the device.
    fn on_command_received(&self, command: &Command);

    /// An event was pushed through a backend subscription.
    fn on_remote_event(&self, command: &Command) {
        let _ = command;
    }

    /// The piloting command sent to the device changed.
    fn on_piloting_command(&self, command: &PilotingCommand) {
        let _ = command;
    }

    /// The connection is over.
    fn close(&self);
}

/// Factory of recording sessions.
pub trait Recorder: Debug + Send + Sync {
    /// Opens a session for the device reached through the connector `provider`.
    ///
    /// Returns `None` if the device should not be recorded.
    fn open_session(
        &self,
        device: &DeviceId,
        model: DeviceModel,
        provider: Option<&str>,
    ) -> Option<Arc<dyn RecordingSession>>;
}
