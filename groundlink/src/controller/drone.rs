use std::time::Duration;

use crate::consts::PILOTING_LOOP_PERIOD;
use crate::controller::{ControllerEnv, DeviceController, DeviceFamily, Signal};
use crate::core::component::ComponentContext;
use crate::piloting::{ActivationState, InterfaceKind, PilotingActivationArbiter, PilotingCommand};
use crate::protocol::{CommonMessage, DisconnectionCause, PilotingMessage};

use crate::prelude::*;

/// Drone behavior: piloting interfaces and landed state.
///
/// Data synchronization is allowed only while the drone is landed.
#[derive(Debug)]
pub struct DroneFamily {
    arbiter: PilotingActivationArbiter,
    landed: bool,
}

impl DroneFamily {
    /// Creates drone family around its piloting arbiter.
    pub fn new(arbiter: PilotingActivationArbiter) -> Self {
        Self {
            arbiter,
            landed: true,
        }
    }

    /// Piloting interface arbiter.
    #[inline(always)]
    pub fn arbiter(&self) -> &PilotingActivationArbiter {
        &self.arbiter
    }

    /// Whether the drone is on the ground.
    #[inline(always)]
    pub fn is_landed(&self) -> bool {
        self.landed
    }
}

impl DeviceFamily for DroneFamily {
    fn all_settings_request(&self) -> Command {
        Command::Common(CommonMessage::AllSettings)
    }

    fn all_states_request(&self) -> Command {
        Command::Common(CommonMessage::AllStates)
    }

    fn unacked_loop_period(&self) -> Duration {
        PILOTING_LOOP_PERIOD
    }

    fn on_command_received(
        &mut self,
        _: &ComponentContext<'_>,
        command: &Command,
    ) -> Option<Signal> {
        self.arbiter.on_command_received(command);

        match command {
            Command::Common(message) => match message {
                CommonMessage::AllSettingsChanged => Some(Signal::AllSettingsReceived),
                CommonMessage::AllStatesChanged => Some(Signal::AllStatesReceived),
                CommonMessage::ProductName(name) => Some(Signal::Name(name.clone())),
                CommonMessage::ProductVersion { software, .. } => {
                    Some(Signal::FirmwareVersion(software.clone()))
                }
                CommonMessage::BoardId(board_id) => Some(Signal::BoardId(board_id.clone())),
                CommonMessage::Disconnection(DisconnectionCause::OffButton) => Some(Signal::PowerOff),
                _ => None,
            },
            Command::Piloting(PilotingMessage::FlyingStateChanged(state)) => {
                let landed = state.is_landed();
                if landed == self.landed {
                    return None;
                }
                self.landed = landed;
                Some(Signal::DataSyncConditionChanged)
            }
            _ => None,
        }
    }

    fn on_protocol_connecting(&mut self, ctx: &ComponentContext<'_>) {
        if let Some(backend) = ctx.backend() {
            self.arbiter.attach_backend(backend.clone());
        }
        self.arbiter.on_connecting();
    }

    fn on_protocol_connected(&mut self, _: &ComponentContext<'_>) {
        self.arbiter.on_connected();
    }

    fn on_protocol_disconnected(&mut self, _: &ComponentContext<'_>) {
        self.landed = true;
        self.arbiter.on_disconnected();
        self.arbiter.detach_backend();
    }

    fn may_synchronize(&self) -> bool {
        self.landed
    }
}

impl DeviceController<DroneFamily> {
    /// Creates a drone controller.
    ///
    /// Piloting interfaces besides manual piloting come from the component factory of `env`.
    pub fn drone(
        id: DeviceId,
        model: DeviceModel,
        name: impl Into<String>,
        env: ControllerEnv,
    ) -> Self {
        Self::new(id, model, name, env, |identity, env| {
            let interfaces = env.components.piloting_interfaces(identity);
            DroneFamily::new(PilotingActivationArbiter::new(identity.id().clone(), interfaces))
        })
    }

    /// Piloting interface arbiter.
    #[inline(always)]
    pub fn piloting(&self) -> &PilotingActivationArbiter {
        self.family().arbiter()
    }

    /// Requests activation of a piloting interface.
    pub fn activate_piloting(&mut self, kind: InterfaceKind) -> bool {
        self.family_mut().arbiter.activate(kind)
    }

    /// Requests deactivation of a piloting interface.
    pub fn deactivate_piloting(&mut self, kind: InterfaceKind) -> bool {
        self.family_mut().arbiter.deactivate(kind)
    }

    /// Records a new activation state reported by a piloting interface.
    pub fn report_piloting(&mut self, kind: InterfaceKind, state: ActivationState) {
        self.family_mut().arbiter.report(kind, state);
    }

    /// Sets piloting command values on behalf of the interface `kind`.
    ///
    /// Ignored unless `kind` is the active interface. Returns `true` if the command changed, in
    /// which case the recording session is notified.
    pub fn set_piloting_command(&mut self, kind: InterfaceKind, command: PilotingCommand) -> bool {
        if !self.family_mut().arbiter.set_command(kind, command) {
            return false;
        }
        if let Some(session) = self.session() {
            session.on_piloting_command(&self.piloting().command());
        }
        true
    }
}
