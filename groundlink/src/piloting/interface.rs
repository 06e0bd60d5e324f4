use std::fmt::Debug;
use std::sync::Arc;

use crate::core::io::ProtocolBackend;

use crate::prelude::*;

/// <sup>[`serde`](https://serde.rs)</sup>
/// Piloting interface identifier.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InterfaceKind {
    /// Manual piloting with roll, pitch, yaw and gaz.
    Manual,
    /// Automatic return to home.
    ReturnHome,
    /// Flight plan execution.
    FlightPlan,
    /// Guided moves.
    Guided,
    /// Circling around a point of interest.
    PointOfInterest,
    /// Following a target.
    FollowMe,
    /// Keeping a target in sight.
    LookAt,
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Activation state of a piloting interface.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ActivationState {
    /// Can't be activated.
    #[default]
    Unavailable,
    /// Can be activated.
    Idle,
    /// Drives the drone.
    Active,
}

/// Piloting interface driven by a [`PilotingActivationArbiter`](super::PilotingActivationArbiter).
///
/// Interfaces never change their own state. Methods return the state the interface reached,
/// or `None` when the outcome is pending on the drone, in which case it is reported later through
/// [`on_command_received`](Self::on_command_received) or
/// [`PilotingActivationArbiter::report`](super::PilotingActivationArbiter::report).
pub trait PilotingInterface: Debug + Send {
    /// Interface identifier.
    fn kind(&self) -> InterfaceKind;

    /// Current activation state.
    fn state(&self) -> ActivationState;

    /// Records a new activation state.
    fn set_state(&mut self, state: ActivationState);

    /// Whether the piloting command loop has to run while this interface is active.
    fn needs_command_loop(&self) -> bool;

    /// Whether the interface may be activated.
    fn can_activate(&self) -> bool {
        self.state() == ActivationState::Idle
    }

    /// Whether the interface may be deactivated.
    fn can_deactivate(&self) -> bool {
        self.state() == ActivationState::Active
    }

    /// Asks the drone to activate this interface.
    fn request_activation(
        &mut self,
        backend: Option<&Arc<dyn ProtocolBackend>>,
    ) -> Option<ActivationState>;

    /// Asks the drone to deactivate this interface.
    fn request_deactivation(
        &mut self,
        backend: Option<&Arc<dyn ProtocolBackend>>,
    ) -> Option<ActivationState>;

    /// The protocol link is up.
    fn on_connecting(&mut self) -> Option<ActivationState> {
        None
    }

    /// The protocol link is down.
    fn on_disconnected(&mut self) -> Option<ActivationState> {
        Some(ActivationState::Unavailable)
    }

    /// A command was received from the drone.
    fn on_command_received(&mut self, command: &Command) -> Option<ActivationState> {
        let _ = command;
        None
    }
}
