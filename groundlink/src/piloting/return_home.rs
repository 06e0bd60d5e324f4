use std::sync::Arc;

use crate::core::io::ProtocolBackend;
use crate::piloting::{ActivationState, InterfaceKind, PilotingInterface};
use crate::protocol::{PilotingMessage, ReturnHomeState};

use crate::prelude::*;

/// Return home piloting interface.
///
/// Activation and deactivation are requested from the drone and complete once the drone reports
/// the new return home state.
#[derive(Debug, Default)]
pub struct ReturnHomePiloting {
    state: ActivationState,
}

impl ReturnHomePiloting {
    /// Creates an unavailable return home interface.
    pub fn new() -> Self {
        Self::default()
    }

    fn send(backend: Option<&Arc<dyn ProtocolBackend>>, start: bool) -> bool {
        match backend {
            Some(backend) => backend.send(Command::Piloting(PilotingMessage::NavigateHome { start })),
            None => false,
        }
    }
}

impl PilotingInterface for ReturnHomePiloting {
    fn kind(&self) -> InterfaceKind {
        InterfaceKind::ReturnHome
    }

    fn state(&self) -> ActivationState {
        self.state
    }

    fn set_state(&mut self, state: ActivationState) {
        self.state = state;
    }

    fn needs_command_loop(&self) -> bool {
        false
    }

    fn request_activation(
        &mut self,
        backend: Option<&Arc<dyn ProtocolBackend>>,
    ) -> Option<ActivationState> {
        if !Self::send(backend, true) {
            log::warn!("return home activation could not be sent");
        }
        None
    }

    fn request_deactivation(
        &mut self,
        backend: Option<&Arc<dyn ProtocolBackend>>,
    ) -> Option<ActivationState> {
        if !Self::send(backend, false) {
            log::warn!("return home deactivation could not be sent");
        }
        None
    }

    fn on_command_received(&mut self, command: &Command) -> Option<ActivationState> {
        match command {
            Command::Piloting(PilotingMessage::ReturnHomeStateChanged(state)) => Some(match state {
                ReturnHomeState::Unavailable => ActivationState::Unavailable,
                ReturnHomeState::Available => ActivationState::Idle,
                ReturnHomeState::InProgress => ActivationState::Active,
            }),
            _ => None,
        }
    }
}
