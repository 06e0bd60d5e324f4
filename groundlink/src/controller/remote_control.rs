use std::sync::Arc;

use crate::controller::{ControllerEnv, DeviceController, DeviceFamily, Signal};
use crate::core::component::ComponentContext;
use crate::core::device::DeviceIdentity;
use crate::core::io::RequestHandle;
use crate::core::recording::{Recorder, RecordingSession};
use crate::protocol::{ShutdownReason, SkyControllerMessage};
use crate::proxy::ProxyLink;

use crate::prelude::*;

/// Remote control behavior.
///
/// Data synchronization with the remote control is disallowed while the drone it relays is
/// synchronizing.
#[derive(Debug)]
pub struct RemoteControlFamily {
    link: Arc<ProxyLink>,
    recording: Option<RequestHandle>,
    disconnecting: bool,
}

impl RemoteControlFamily {
    /// Creates remote control family sharing `link` with its proxy coordinator.
    pub fn new(link: Arc<ProxyLink>) -> Self {
        Self {
            link,
            recording: None,
            disconnecting: false,
        }
    }

    /// Link to relayed drones.
    #[inline(always)]
    pub fn link(&self) -> &Arc<ProxyLink> {
        &self.link
    }

    /// Whether the remote control streams its black box to the recording session.
    #[inline(always)]
    pub fn is_recording(&self) -> bool {
        self.recording.is_some()
    }

    pub(crate) fn take_disconnecting(&mut self) -> bool {
        std::mem::take(&mut self.disconnecting)
    }
}

impl DeviceFamily for RemoteControlFamily {
    fn all_settings_request(&self) -> Command {
        Command::SkyController(SkyControllerMessage::AllSettings)
    }

    fn all_states_request(&self) -> Command {
        Command::SkyController(SkyControllerMessage::AllStates)
    }

    fn open_session(
        &self,
        recorder: &dyn Recorder,
        identity: &DeviceIdentity,
        _: Option<&str>,
    ) -> Option<Arc<dyn RecordingSession>> {
        recorder.open_session(identity.id(), identity.model(), None)
    }

    fn on_command_received(
        &mut self,
        _: &ComponentContext<'_>,
        command: &Command,
    ) -> Option<Signal> {
        match command {
            Command::SkyController(message) => match message {
                SkyControllerMessage::AllSettingsChanged => Some(Signal::AllSettingsReceived),
                SkyControllerMessage::AllStatesChanged => Some(Signal::AllStatesReceived),
                SkyControllerMessage::ProductVersion { software, .. } => {
                    Some(Signal::FirmwareVersion(software.clone()))
                }
                SkyControllerMessage::Shutdown(ShutdownReason::PowerOffButton) => {
                    Some(Signal::PowerOff)
                }
                _ => None,
            },
            _ => None,
        }
    }

    fn on_protocol_connecting(&mut self, ctx: &ComponentContext<'_>) {
        if let (Some(session), Some(backend)) = (ctx.session(), ctx.backend()) {
            self.recording = Some(backend.subscribe_recording(session.clone()));
        }
    }

    fn on_protocol_disconnecting(&mut self, _: &ComponentContext<'_>) {
        self.disconnecting = true;
    }

    fn on_protocol_disconnected(&mut self, _: &ComponentContext<'_>) {
        if let Some(recording) = self.recording.take() {
            recording.cancel();
        }
    }

    fn may_synchronize(&self) -> bool {
        !self.link.is_active_syncing()
    }
}

impl DeviceController<RemoteControlFamily> {
    /// Creates a remote control controller relaying drones through `link`.
    pub fn remote_control(
        id: DeviceId,
        model: DeviceModel,
        name: impl Into<String>,
        env: ControllerEnv,
        link: Arc<ProxyLink>,
    ) -> Self {
        Self::new(id, model, name, env, |_, _| RemoteControlFamily::new(link))
    }
}
