use std::sync::Arc;

use crate::core::io::{NoAckEncoder, ProtocolBackend};
use crate::piloting::{
    ActivationState, InterfaceKind, ManualPiloting, PilotingCommand, PilotingCommandEncoder,
    PilotingInterface,
};

use crate::prelude::*;

/// Decides which piloting interface of a drone is active.
///
/// At most one interface is active at a time. Switching from one interface to another first
/// deactivates the current one, remembers the requested one as next, and activates it once
/// the current one reports itself inactive. A request made while another activation is still in
/// flight is remembered the same way and served once that activation settles. Whenever the
/// drone is connected and nothing is active, the default [`ManualPiloting`] interface is
/// activated.
///
/// The arbiter also owns the piloting command encoder and registers it in the backend's
/// unacknowledged command loop while the active interface needs it.
#[derive(Debug)]
pub struct PilotingActivationArbiter {
    device: DeviceId,
    interfaces: Vec<Box<dyn PilotingInterface>>,
    current: Option<InterfaceKind>,
    requested: Option<InterfaceKind>,
    next: Option<InterfaceKind>,
    connected: bool,
    encoder: Arc<PilotingCommandEncoder>,
    encoder_handle: Arc<dyn NoAckEncoder>,
    loop_running: bool,
    backend: Option<Arc<dyn ProtocolBackend>>,
}

impl PilotingActivationArbiter {
    /// Creates arbiter with the default manual interface followed by `interfaces`.
    ///
    /// Duplicated kinds are discarded.
    pub fn new(device: DeviceId, interfaces: Vec<Box<dyn PilotingInterface>>) -> Self {
        let mut all: Vec<Box<dyn PilotingInterface>> = vec![Box::new(ManualPiloting::new())];
        for interface in interfaces {
            if all.iter().any(|known| known.kind() == interface.kind()) {
                log::warn!("[{device}] duplicated {:?} piloting interface", interface.kind());
                continue;
            }
            all.push(interface);
        }

        let encoder = Arc::new(PilotingCommandEncoder::new());
        let encoder_handle: Arc<dyn NoAckEncoder> = encoder.clone();

        Self {
            device,
            interfaces: all,
            current: None,
            requested: None,
            next: None,
            connected: false,
            encoder,
            encoder_handle,
            loop_running: false,
            backend: None,
        }
    }

    /// Drone identifier.
    #[inline(always)]
    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    /// Kind of the default interface.
    #[inline(always)]
    pub fn default_kind(&self) -> InterfaceKind {
        InterfaceKind::Manual
    }

    /// Currently active interface.
    #[inline(always)]
    pub fn current(&self) -> Option<InterfaceKind> {
        self.current
    }

    /// Interface waiting for the current one to deactivate.
    #[inline(always)]
    pub fn next(&self) -> Option<InterfaceKind> {
        self.next
    }

    /// Interface whose activation was requested and is not settled yet.
    #[inline(always)]
    pub fn requested(&self) -> Option<InterfaceKind> {
        self.requested
    }

    /// Whether the drone completed its connection.
    #[inline(always)]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Whether the piloting command encoder is registered in the command loop.
    #[inline(always)]
    pub fn is_command_loop_running(&self) -> bool {
        self.loop_running
    }

    /// Kinds of all interfaces, default first.
    pub fn kinds(&self) -> impl Iterator<Item = InterfaceKind> + '_ {
        self.interfaces.iter().map(|interface| interface.kind())
    }

    /// Activation state of the interface of given kind.
    pub fn state(&self, kind: InterfaceKind) -> Option<ActivationState> {
        self.index(kind).map(|idx| self.interfaces[idx].state())
    }

    /// Current piloting command values.
    pub fn command(&self) -> PilotingCommand {
        self.encoder.command()
    }

    /// Requests activation of the interface of given kind.
    ///
    /// Returns `true` if the activation could be initiated.
    pub fn activate(&mut self, kind: InterfaceKind) -> bool {
        log::debug!("[{}] activation request for {kind:?}", self.device);

        if self.current == Some(kind) || self.requested == Some(kind) || !self.can_activate(kind) {
            return false;
        }

        match self.current {
            None => match self.requested {
                None => {
                    self.request_activation(kind);
                    true
                }
                // the default interface is activated as a fallback anyway
                Some(_) if kind == self.default_kind() => false,
                Some(requested) => {
                    log::debug!("[{}] {kind:?} waits for {requested:?}", self.device);
                    self.next = Some(kind);
                    true
                }
            },
            Some(current) => {
                let Some(current_idx) = self.index(current) else {
                    return false;
                };
                if !self.interfaces[current_idx].can_deactivate() {
                    return false;
                }
                // the default interface is activated as a fallback anyway
                if kind != self.default_kind() {
                    self.next = Some(kind);
                }
                let outcome =
                    self.interfaces[current_idx].request_deactivation(self.backend.as_ref());
                self.apply(current, outcome);
                true
            }
        }
    }

    /// Requests deactivation of the interface of given kind.
    ///
    /// Only the current, non-default interface may be deactivated.
    pub fn deactivate(&mut self, kind: InterfaceKind) -> bool {
        log::debug!("[{}] deactivation request for {kind:?}", self.device);

        if self.current != Some(kind) || kind == self.default_kind() {
            return false;
        }
        let Some(idx) = self.index(kind) else {
            return false;
        };
        if !self.interfaces[idx].can_deactivate() {
            return false;
        }

        let outcome = self.interfaces[idx].request_deactivation(self.backend.as_ref());
        self.apply(kind, outcome);
        true
    }

    /// Records that an interface reached a new activation state.
    ///
    /// Used by interfaces whose requests complete outside of command reception.
    pub fn report(&mut self, kind: InterfaceKind, state: ActivationState) {
        self.apply(kind, Some(state));
    }

    /// Installs `kind` as the active interface.
    pub fn on_interface_active(&mut self, kind: InterfaceKind, needs_command_loop: bool) {
        if self.current == Some(kind) {
            return;
        }

        if let Some(previous) = self.current.and_then(|previous| self.index(previous)) {
            self.interfaces[previous].set_state(ActivationState::Idle);
        }
        if self.requested == Some(kind) {
            self.requested = None;
        }
        log::debug!("[{}] {kind:?} piloting interface is active", self.device);
        self.current = Some(kind);

        if needs_command_loop {
            self.encoder.reset();
            self.start_command_loop();
        } else {
            self.stop_command_loop();
        }

        if self.next.is_some() {
            if let Some(idx) = self
                .index(kind)
                .filter(|idx| self.interfaces[*idx].can_deactivate())
            {
                let outcome = self.interfaces[idx].request_deactivation(self.backend.as_ref());
                self.apply(kind, outcome);
            }
        }
    }

    /// Handles an interface becoming idle or unavailable.
    pub fn on_interface_inactive(&mut self, kind: InterfaceKind) {
        if self.current == Some(kind) {
            self.current = None;
        }
        if self.requested == Some(kind) {
            self.requested = None;
        }
        if !self.connected || self.current.is_some() || self.requested.is_some() {
            return;
        }

        let next = self.next.take().filter(|next| self.can_activate(*next));
        self.request_activation(next.unwrap_or(self.default_kind()));
    }

    /// The protocol link is up: interfaces may become idle.
    pub fn on_connecting(&mut self) {
        for idx in 0..self.interfaces.len() {
            let outcome = self.interfaces[idx].on_connecting();
            let kind = self.interfaces[idx].kind();
            self.apply(kind, outcome);
        }
    }

    /// The handshake completed.
    pub fn on_connected(&mut self) {
        self.connected = true;
        self.encoder.reset();
        if self.current.is_none() {
            log::debug!("[{}] activating default piloting interface", self.device);
            self.request_activation(self.default_kind());
        }
    }

    /// The protocol link is down.
    pub fn on_disconnected(&mut self) {
        self.connected = false;
        self.current = None;
        self.requested = None;
        self.next = None;
        for idx in 0..self.interfaces.len() {
            let outcome = self.interfaces[idx].on_disconnected();
            let kind = self.interfaces[idx].kind();
            self.apply(kind, outcome);
        }
    }

    /// Forwards a received command to every interface.
    pub fn on_command_received(&mut self, command: &Command) {
        for idx in 0..self.interfaces.len() {
            let outcome = self.interfaces[idx].on_command_received(command);
            let kind = self.interfaces[idx].kind();
            self.apply(kind, outcome);
        }
    }

    /// Sets the backend used to reach the drone.
    pub fn attach_backend(&mut self, backend: Arc<dyn ProtocolBackend>) {
        self.backend = Some(backend);
    }

    /// Forgets the backend.
    pub fn detach_backend(&mut self) {
        self.backend = None;
        self.loop_running = false;
    }

    /// Sets roll on behalf of `kind`. Returns `true` if the command changed.
    pub fn set_roll(&mut self, kind: InterfaceKind, roll: i8) -> bool {
        self.current == Some(kind) && self.encoder.set_roll(roll)
    }

    /// Sets pitch on behalf of `kind`. Returns `true` if the command changed.
    pub fn set_pitch(&mut self, kind: InterfaceKind, pitch: i8) -> bool {
        self.current == Some(kind) && self.encoder.set_pitch(pitch)
    }

    /// Sets yaw on behalf of `kind`. Returns `true` if the command changed.
    pub fn set_yaw(&mut self, kind: InterfaceKind, yaw: i8) -> bool {
        self.current == Some(kind) && self.encoder.set_yaw(yaw)
    }

    /// Sets gaz on behalf of `kind`. Returns `true` if the command changed.
    pub fn set_gaz(&mut self, kind: InterfaceKind, gaz: i8) -> bool {
        self.current == Some(kind) && self.encoder.set_gaz(gaz)
    }

    /// Sets all command values on behalf of `kind`. Returns `true` if the command changed.
    pub fn set_command(&mut self, kind: InterfaceKind, command: PilotingCommand) -> bool {
        let roll = self.set_roll(kind, command.roll());
        let pitch = self.set_pitch(kind, command.pitch());
        let yaw = self.set_yaw(kind, command.yaw());
        let gaz = self.set_gaz(kind, command.gaz());
        roll || pitch || yaw || gaz
    }

    fn can_activate(&self, kind: InterfaceKind) -> bool {
        self.index(kind)
            .is_some_and(|idx| self.interfaces[idx].can_activate())
    }

    fn request_activation(&mut self, kind: InterfaceKind) {
        if let Some(idx) = self.index(kind) {
            self.requested = Some(kind);
            let outcome = self.interfaces[idx].request_activation(self.backend.as_ref());
            self.apply(kind, outcome);
        }
    }

    fn apply(&mut self, kind: InterfaceKind, outcome: Option<ActivationState>) {
        let (Some(state), Some(idx)) = (outcome, self.index(kind)) else {
            return;
        };

        self.interfaces[idx].set_state(state);
        match state {
            ActivationState::Active => {
                let needs_command_loop = self.interfaces[idx].needs_command_loop();
                self.on_interface_active(kind, needs_command_loop);
            }
            ActivationState::Idle | ActivationState::Unavailable => {
                self.on_interface_inactive(kind);
            }
        }
    }

    fn start_command_loop(&mut self) {
        if let Some(backend) = &self.backend {
            backend.register_unacked_encoder(self.encoder_handle.clone());
            self.loop_running = true;
        }
    }

    fn stop_command_loop(&mut self) {
        if let Some(backend) = &self.backend {
            if self.loop_running {
                backend.unregister_unacked_encoder(&self.encoder_handle);
            }
        }
        self.loop_running = false;
        self.encoder.reset();
    }

    fn index(&self, kind: InterfaceKind) -> Option<usize> {
        self.interfaces
            .iter()
            .position(|interface| interface.kind() == kind)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{MockBackend, ScriptedPiloting};

    use super::*;

    fn connected_arbiter() -> (PilotingActivationArbiter, Arc<MockBackend>) {
        let backend = Arc::new(MockBackend::new());
        let mut arbiter = PilotingActivationArbiter::new(
            DeviceId::new("drone"),
            vec![
                Box::new(ScriptedPiloting::new(InterfaceKind::FollowMe)),
                Box::new(ScriptedPiloting::new(InterfaceKind::LookAt)),
            ],
        );
        arbiter.attach_backend(backend.clone());
        arbiter.on_connecting();
        arbiter.on_connected();
        (arbiter, backend)
    }

    #[test]
    fn default_interface_activated_on_connection() {
        let (arbiter, backend) = connected_arbiter();

        assert_eq!(arbiter.current(), Some(InterfaceKind::Manual));
        assert_eq!(arbiter.state(InterfaceKind::Manual), Some(ActivationState::Active));
        assert_eq!(arbiter.state(InterfaceKind::FollowMe), Some(ActivationState::Idle));
        assert!(arbiter.is_command_loop_running());
        assert_eq!(backend.encoders(), 1);
    }

    #[test]
    fn switches_through_pending_interface() {
        let (mut arbiter, backend) = connected_arbiter();

        assert!(arbiter.activate(InterfaceKind::FollowMe));
        // manual deactivates at once, follow me waits for the drone
        assert_eq!(arbiter.current(), None);
        assert_eq!(arbiter.next(), None);
        assert_eq!(arbiter.state(InterfaceKind::Manual), Some(ActivationState::Idle));

        arbiter.report(InterfaceKind::FollowMe, ActivationState::Active);
        assert_eq!(arbiter.current(), Some(InterfaceKind::FollowMe));
        assert!(!arbiter.is_command_loop_running());
        assert_eq!(backend.encoders(), 0);

        assert!(arbiter.activate(InterfaceKind::LookAt));
        assert_eq!(arbiter.next(), Some(InterfaceKind::LookAt));
        assert_eq!(arbiter.current(), Some(InterfaceKind::FollowMe));

        arbiter.report(InterfaceKind::FollowMe, ActivationState::Idle);
        assert_eq!(arbiter.next(), None);
        assert_eq!(arbiter.current(), None);

        arbiter.report(InterfaceKind::LookAt, ActivationState::Active);
        assert_eq!(arbiter.current(), Some(InterfaceKind::LookAt));
        assert_eq!(arbiter.state(InterfaceKind::FollowMe), Some(ActivationState::Idle));
    }

    #[test]
    fn switches_while_activation_in_flight() {
        let (mut arbiter, _) = connected_arbiter();

        assert!(arbiter.activate(InterfaceKind::FollowMe));
        assert_eq!(arbiter.requested(), Some(InterfaceKind::FollowMe));

        assert!(arbiter.activate(InterfaceKind::LookAt));
        assert_eq!(arbiter.requested(), Some(InterfaceKind::FollowMe));
        assert_eq!(arbiter.next(), Some(InterfaceKind::LookAt));
        assert!(!arbiter.activate(InterfaceKind::FollowMe));
        assert!(!arbiter.activate(InterfaceKind::Manual));

        arbiter.report(InterfaceKind::FollowMe, ActivationState::Active);
        assert_eq!(arbiter.current(), Some(InterfaceKind::FollowMe));
        assert_eq!(arbiter.next(), Some(InterfaceKind::LookAt));

        arbiter.report(InterfaceKind::FollowMe, ActivationState::Idle);
        assert_eq!(arbiter.current(), None);
        assert_eq!(arbiter.next(), None);
        assert_eq!(arbiter.requested(), Some(InterfaceKind::LookAt));

        arbiter.report(InterfaceKind::LookAt, ActivationState::Active);
        assert_eq!(arbiter.current(), Some(InterfaceKind::LookAt));
        assert_eq!(arbiter.state(InterfaceKind::FollowMe), Some(ActivationState::Idle));
        assert_eq!(arbiter.state(InterfaceKind::Manual), Some(ActivationState::Idle));
    }

    #[test]
    fn refused_activation_serves_next_interface() {
        let (mut arbiter, _) = connected_arbiter();

        arbiter.activate(InterfaceKind::FollowMe);
        arbiter.activate(InterfaceKind::LookAt);

        arbiter.report(InterfaceKind::FollowMe, ActivationState::Idle);
        assert_eq!(arbiter.current(), None);
        assert_eq!(arbiter.requested(), Some(InterfaceKind::LookAt));
    }

    #[test]
    fn unavailable_next_interface_falls_back_to_default() {
        let (mut arbiter, _) = connected_arbiter();

        arbiter.activate(InterfaceKind::FollowMe);
        arbiter.report(InterfaceKind::FollowMe, ActivationState::Active);
        assert!(arbiter.activate(InterfaceKind::LookAt));

        arbiter.report(InterfaceKind::LookAt, ActivationState::Unavailable);
        assert_eq!(arbiter.current(), Some(InterfaceKind::FollowMe));

        arbiter.report(InterfaceKind::FollowMe, ActivationState::Idle);
        assert_eq!(arbiter.current(), Some(InterfaceKind::Manual));
        assert_eq!(arbiter.next(), None);
        assert_eq!(arbiter.requested(), None);
    }

    #[test]
    fn activation_refusals() {
        let (mut arbiter, _) = connected_arbiter();

        assert!(!arbiter.activate(InterfaceKind::Manual));
        assert!(!arbiter.deactivate(InterfaceKind::Manual));
        assert!(!arbiter.activate(InterfaceKind::Guided));
        assert!(!arbiter.deactivate(InterfaceKind::FollowMe));

        arbiter.report(InterfaceKind::LookAt, ActivationState::Unavailable);
        assert!(!arbiter.activate(InterfaceKind::LookAt));
        assert_eq!(arbiter.current(), Some(InterfaceKind::Manual));
    }

    #[test]
    fn falls_back_to_default_interface() {
        let (mut arbiter, _) = connected_arbiter();

        arbiter.activate(InterfaceKind::FollowMe);
        arbiter.report(InterfaceKind::FollowMe, ActivationState::Active);

        assert!(arbiter.deactivate(InterfaceKind::FollowMe));
        assert_eq!(arbiter.current(), Some(InterfaceKind::FollowMe));

        arbiter.report(InterfaceKind::FollowMe, ActivationState::Idle);
        assert_eq!(arbiter.current(), Some(InterfaceKind::Manual));
        assert!(arbiter.is_command_loop_running());
    }

    #[test]
    fn default_interface_is_never_pending() {
        let (mut arbiter, _) = connected_arbiter();

        arbiter.activate(InterfaceKind::FollowMe);
        arbiter.report(InterfaceKind::FollowMe, ActivationState::Active);

        assert!(arbiter.activate(InterfaceKind::Manual));
        assert_eq!(arbiter.next(), None);

        arbiter.report(InterfaceKind::FollowMe, ActivationState::Idle);
        assert_eq!(arbiter.current(), Some(InterfaceKind::Manual));
    }

    #[test]
    fn reconnection_reactivates_default_interface() {
        let (mut arbiter, _) = connected_arbiter();

        arbiter.activate(InterfaceKind::FollowMe);
        arbiter.report(InterfaceKind::FollowMe, ActivationState::Active);
        assert_eq!(arbiter.state(InterfaceKind::Manual), Some(ActivationState::Idle));

        arbiter.on_disconnected();
        arbiter.detach_backend();
        assert_eq!(arbiter.current(), None);
        assert_eq!(arbiter.state(InterfaceKind::Manual), Some(ActivationState::Unavailable));

        let backend = Arc::new(MockBackend::new());
        arbiter.attach_backend(backend.clone());
        arbiter.on_connecting();
        assert_eq!(arbiter.current(), None);

        arbiter.on_connected();
        assert_eq!(arbiter.current(), Some(InterfaceKind::Manual));
        assert_eq!(backend.encoders(), 1);
    }

    #[test]
    fn only_current_interface_pilots() {
        let (mut arbiter, _) = connected_arbiter();

        assert!(!arbiter.set_roll(InterfaceKind::FollowMe, 10));
        assert!(arbiter.set_roll(InterfaceKind::Manual, 10));
        assert!(!arbiter.set_roll(InterfaceKind::Manual, 10));
        assert!(arbiter.set_command(InterfaceKind::Manual, PilotingCommand::new(10, 5, 0, 0)));
        assert_eq!(arbiter.command(), PilotingCommand::new(10, 5, 0, 0));
    }
}
