use std::sync::Arc;

use crate::core::io::ProtocolBackend;
use crate::piloting::{ActivationState, InterfaceKind, PilotingInterface};

/// Manual piloting interface.
///
/// Always available while connected and switched immediately, as it involves no drone-side
/// mode. Default interface of every drone.
#[derive(Debug, Default)]
pub struct ManualPiloting {
    state: ActivationState,
}

impl ManualPiloting {
    /// Creates an unavailable manual piloting interface.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PilotingInterface for ManualPiloting {
    fn kind(&self) -> InterfaceKind {
        InterfaceKind::Manual
    }

    fn state(&self) -> ActivationState {
        self.state
    }

    fn set_state(&mut self, state: ActivationState) {
        self.state = state;
    }

    fn needs_command_loop(&self) -> bool {
        true
    }

    fn request_activation(&mut self, _: Option<&Arc<dyn ProtocolBackend>>) -> Option<ActivationState> {
        log::debug!("manual piloting activation");
        Some(ActivationState::Active)
    }

    fn request_deactivation(
        &mut self,
        _: Option<&Arc<dyn ProtocolBackend>>,
    ) -> Option<ActivationState> {
        log::debug!("manual piloting deactivation");
        Some(ActivationState::Idle)
    }

    fn on_connecting(&mut self) -> Option<ActivationState> {
        Some(ActivationState::Idle)
    }
}
