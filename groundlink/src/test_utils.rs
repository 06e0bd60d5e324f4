//! # Testing utils
//!
//! ⚠ Requires `test_utils` feature.
//!
//! In-memory collaborators that let connection scenarios run without a transport: a backend
//! and a provider recording every request, component probes, scripted piloting interfaces and
//! a recorder keeping its sessions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::core::component::{ComponentContext, ComponentController, ComponentFactory};
use crate::core::device::DeviceIdentity;
use crate::core::io::{
    ConnectionProvider, Connector, Credentials, DownloadKind, NoAckEncoder, ProtocolBackend,
    RequestHandle, Technology, TransferListener,
};
use crate::core::recording::{Recorder, RecordingSession};
use crate::core::utils::Closable;
use crate::piloting::{
    ActivationState, InterfaceKind, PilotingCommand, PilotingInterface, ReturnHomePiloting,
};

use crate::prelude::*;

pub use crate::core::event::EventLog;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|err| err.into_inner())
}

#[derive(Debug, Default)]
struct BackendLog {
    sent: Vec<Command>,
    loop_period: Option<Duration>,
    encoders: Vec<Arc<dyn NoAckEncoder>>,
    proxy_channels: Vec<(u16, Closable)>,
    recordings: Vec<Closable>,
    downloads: Vec<(DownloadKind, PathBuf, Closable)>,
    uploads: Vec<(PathBuf, Closable)>,
    proxied: BTreeMap<DeviceId, Arc<MockBackend>>,
}

/// [`ProtocolBackend`] recording every request.
#[derive(Debug, Default)]
pub struct MockBackend {
    log: Mutex<BackendLog>,
    refuse_sending: AtomicBool,
}

impl MockBackend {
    /// Creates a backend accepting every command.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes [`ProtocolBackend::send`] fail.
    pub fn refuse_sending(&self, refuse: bool) {
        self.refuse_sending.store(refuse, Ordering::SeqCst);
    }

    /// Commands sent so far.
    pub fn sent(&self) -> Vec<Command> {
        lock(&self.log).sent.clone()
    }

    /// Removes and returns commands sent so far.
    pub fn take_sent(&self) -> Vec<Command> {
        std::mem::take(&mut lock(&self.log).sent)
    }

    /// Whether a command equal to `command` was sent.
    pub fn has_sent(&self, command: &Command) -> bool {
        lock(&self.log).sent.iter().any(|sent| sent == command)
    }

    /// Period of the unacknowledged command loop, if set.
    pub fn loop_period(&self) -> Option<Duration> {
        lock(&self.log).loop_period
    }

    /// Number of encoders in the unacknowledged command loop.
    pub fn encoders(&self) -> usize {
        lock(&self.log).encoders.len()
    }

    /// Runs one iteration of the unacknowledged command loop.
    pub fn tick(&self) -> Vec<Command> {
        let encoders = lock(&self.log).encoders.clone();
        encoders.iter().filter_map(|encoder| encoder.encode()).collect()
    }

    /// Ports of the proxy channels requested so far.
    pub fn proxy_channels(&self) -> Vec<u16> {
        lock(&self.log)
            .proxy_channels
            .iter()
            .map(|(port, _)| *port)
            .collect()
    }

    /// Number of proxy channels requested and not cancelled.
    pub fn open_proxy_channels(&self) -> usize {
        lock(&self.log)
            .proxy_channels
            .iter()
            .filter(|(_, state)| !state.is_closed())
            .count()
    }

    /// Number of recording subscriptions not cancelled.
    pub fn active_recordings(&self) -> usize {
        lock(&self.log)
            .recordings
            .iter()
            .filter(|state| !state.is_closed())
            .count()
    }

    /// Downloads started so far.
    pub fn downloads(&self) -> Vec<(DownloadKind, PathBuf)> {
        lock(&self.log)
            .downloads
            .iter()
            .map(|(kind, dest, _)| (*kind, dest.clone()))
            .collect()
    }

    /// Uploads started so far.
    pub fn uploads(&self) -> Vec<PathBuf> {
        lock(&self.log)
            .uploads
            .iter()
            .map(|(src, _)| src.clone())
            .collect()
    }

    /// Number of transfers not cancelled.
    pub fn active_transfers(&self) -> usize {
        let log = lock(&self.log);
        log.downloads
            .iter()
            .filter(|(_, _, state)| !state.is_closed())
            .count()
            + log
                .uploads
                .iter()
                .filter(|(_, state)| !state.is_closed())
                .count()
    }

    /// Backend handed out for a relayed device.
    pub fn proxied(&self, device: &DeviceId) -> Option<Arc<MockBackend>> {
        lock(&self.log).proxied.get(device).cloned()
    }
}

impl ProtocolBackend for MockBackend {
    fn send(&self, command: Command) -> bool {
        if self.refuse_sending.load(Ordering::SeqCst) {
            return false;
        }
        lock(&self.log).sent.push(command);
        true
    }

    fn set_unacked_loop_period(&self, period: Duration) {
        lock(&self.log).loop_period = Some(period);
    }

    fn register_unacked_encoder(&self, encoder: Arc<dyn NoAckEncoder>) {
        lock(&self.log).encoders.push(encoder);
    }

    fn unregister_unacked_encoder(&self, encoder: &Arc<dyn NoAckEncoder>) {
        let target = Arc::as_ptr(encoder) as *const ();
        lock(&self.log)
            .encoders
            .retain(|registered| Arc::as_ptr(registered) as *const () != target);
    }

    fn open_proxy_channel(&self, port: u16) -> RequestHandle {
        let handle = RequestHandle::new();
        lock(&self.log).proxy_channels.push((port, handle.watch()));
        handle
    }

    fn start_download(
        &self,
        kind: DownloadKind,
        dest: &Path,
        _: Arc<dyn TransferListener>,
    ) -> RequestHandle {
        let handle = RequestHandle::new();
        lock(&self.log)
            .downloads
            .push((kind, dest.to_path_buf(), handle.watch()));
        handle
    }

    fn start_upload(&self, src: &Path, _: Arc<dyn TransferListener>) -> RequestHandle {
        let handle = RequestHandle::new();
        lock(&self.log)
            .uploads
            .push((src.to_path_buf(), handle.watch()));
        handle
    }

    fn subscribe_recording(&self, _: Arc<dyn RecordingSession>) -> RequestHandle {
        let handle = RequestHandle::new();
        lock(&self.log).recordings.push(handle.watch());
        handle
    }

    fn proxy_for(&self, device: &DeviceId) -> Arc<dyn ProtocolBackend> {
        lock(&self.log)
            .proxied
            .entry(device.clone())
            .or_insert_with(|| Arc::new(MockBackend::new()))
            .clone()
    }
}

#[derive(Debug, Default)]
struct ProviderLog {
    connects: Vec<(DeviceId, Option<Credentials>)>,
    disconnects: Vec<DeviceId>,
    forgotten: Vec<DeviceId>,
    sync_changes: Vec<(DeviceId, bool)>,
}

/// [`ConnectionProvider`] recording every request.
///
/// Accepts connections and disconnections unless told otherwise.
#[derive(Debug)]
pub struct MockProvider {
    connector: Connector,
    parent: Option<Arc<dyn ConnectionProvider>>,
    accept_connect: AtomicBool,
    accept_disconnect: AtomicBool,
    log: Mutex<ProviderLog>,
}

impl MockProvider {
    /// Creates provider with given connector.
    pub fn new(connector: Connector) -> Self {
        Self {
            connector,
            parent: None,
            accept_connect: AtomicBool::new(true),
            accept_disconnect: AtomicBool::new(true),
            log: Mutex::new(ProviderLog::default()),
        }
    }

    /// Creates local Wi-Fi provider.
    pub fn local(uid: &str) -> Self {
        Self::new(Connector::local(uid, Technology::Wifi))
    }

    /// Sets parent provider.
    pub fn with_parent(mut self, parent: Arc<dyn ConnectionProvider>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Whether connection requests are accepted.
    pub fn set_accept_connect(&self, accept: bool) {
        self.accept_connect.store(accept, Ordering::SeqCst);
    }

    /// Whether disconnection requests are accepted.
    pub fn set_accept_disconnect(&self, accept: bool) {
        self.accept_disconnect.store(accept, Ordering::SeqCst);
    }

    /// Devices whose connection was requested.
    pub fn connects(&self) -> Vec<DeviceId> {
        lock(&self.log)
            .connects
            .iter()
            .map(|(device, _)| device.clone())
            .collect()
    }

    /// Credentials of the last connection request.
    pub fn last_credentials(&self) -> Option<Credentials> {
        lock(&self.log)
            .connects
            .last()
            .and_then(|(_, credentials)| credentials.clone())
    }

    /// Devices whose disconnection was requested.
    pub fn disconnects(&self) -> Vec<DeviceId> {
        lock(&self.log).disconnects.clone()
    }

    /// Devices the provider was asked to forget.
    pub fn forgotten(&self) -> Vec<DeviceId> {
        lock(&self.log).forgotten.clone()
    }

    /// Data synchronization allowance changes notified so far.
    pub fn sync_changes(&self) -> Vec<(DeviceId, bool)> {
        lock(&self.log).sync_changes.clone()
    }
}

impl ConnectionProvider for MockProvider {
    fn connector(&self) -> &Connector {
        &self.connector
    }

    fn parent(&self) -> Option<Arc<dyn ConnectionProvider>> {
        self.parent.clone()
    }

    fn connect(&self, device: &DeviceId, credentials: Option<&Credentials>) -> bool {
        lock(&self.log)
            .connects
            .push((device.clone(), credentials.cloned()));
        self.accept_connect.load(Ordering::SeqCst)
    }

    fn disconnect(&self, device: &DeviceId) -> bool {
        lock(&self.log).disconnects.push(device.clone());
        self.accept_disconnect.load(Ordering::SeqCst)
    }

    fn forget(&self, device: &DeviceId) {
        lock(&self.log).forgotten.push(device.clone());
    }

    fn on_data_sync_condition_changed(&self, device: &DeviceId, allowed: bool) {
        lock(&self.log).sync_changes.push((device.clone(), allowed));
    }
}

/// Lifecycle notification received by a [`ComponentProbe`].
#[derive(Clone, Debug, PartialEq)]
pub enum ProbeCall {
    /// [`ComponentController::on_connecting`].
    Connecting,
    /// [`ComponentController::on_connected`].
    Connected,
    /// [`ComponentController::on_disconnecting`].
    Disconnecting,
    /// [`ComponentController::on_disconnected`].
    Disconnected,
    /// [`ComponentController::on_link_lost`].
    LinkLost,
    /// [`ComponentController::on_data_sync_allowance_changed`].
    DataSync(bool),
    /// [`ComponentController::on_command_received`].
    Command(Command),
    /// [`ComponentController::on_preset_change`].
    PresetChange,
    /// [`ComponentController::on_forgetting`].
    Forgetting,
    /// [`ComponentController::on_dispose`].
    Dispose,
}

type ProbeLog = Arc<Mutex<Vec<(DeviceId, ProbeCall, ConnectionPhase)>>>;

/// [`ComponentController`] recording notifications along with the phase it observed.
#[derive(Debug)]
pub struct ComponentProbe {
    log: ProbeLog,
}

impl ComponentProbe {
    fn record(&self, ctx: &ComponentContext<'_>, call: ProbeCall) {
        lock(&self.log).push((ctx.device().clone(), call, ctx.phase()));
    }
}

impl ComponentController for ComponentProbe {
    fn on_connecting(&mut self, ctx: &ComponentContext<'_>) {
        self.record(ctx, ProbeCall::Connecting);
    }

    fn on_connected(&mut self, ctx: &ComponentContext<'_>) {
        self.record(ctx, ProbeCall::Connected);
    }

    fn on_disconnecting(&mut self, ctx: &ComponentContext<'_>) {
        self.record(ctx, ProbeCall::Disconnecting);
    }

    fn on_disconnected(&mut self, ctx: &ComponentContext<'_>) {
        self.record(ctx, ProbeCall::Disconnected);
    }

    fn on_link_lost(&mut self, ctx: &ComponentContext<'_>) {
        self.record(ctx, ProbeCall::LinkLost);
    }

    fn on_data_sync_allowance_changed(&mut self, ctx: &ComponentContext<'_>, allowed: bool) {
        self.record(ctx, ProbeCall::DataSync(allowed));
    }

    fn on_command_received(&mut self, ctx: &ComponentContext<'_>, command: &Command) {
        self.record(ctx, ProbeCall::Command(command.clone()));
    }

    fn on_preset_change(&mut self, ctx: &ComponentContext<'_>) {
        self.record(ctx, ProbeCall::PresetChange);
    }

    fn on_forgetting(&mut self, ctx: &ComponentContext<'_>) {
        self.record(ctx, ProbeCall::Forgetting);
    }

    fn on_dispose(&mut self, ctx: &ComponentContext<'_>) {
        self.record(ctx, ProbeCall::Dispose);
    }
}

/// [`ComponentFactory`] giving every device one [`ComponentProbe`].
///
/// Drones get return home and scripted piloting interfaces of the configured kinds.
#[derive(Debug, Default)]
pub struct ProbeFactory {
    log: ProbeLog,
    interfaces: Vec<InterfaceKind>,
}

impl ProbeFactory {
    /// Creates factory without extra piloting interfaces.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds scripted piloting interfaces of given kinds to drones.
    pub fn with_interfaces(mut self, kinds: impl IntoIterator<Item = InterfaceKind>) -> Self {
        self.interfaces.extend(kinds);
        self
    }

    /// Notifications received by probes of `device`.
    pub fn calls(&self, device: &DeviceId) -> Vec<ProbeCall> {
        lock(&self.log)
            .iter()
            .filter(|(id, _, _)| id == device)
            .map(|(_, call, _)| call.clone())
            .collect()
    }

    /// Notifications received by probes of `device`, with the phase they observed.
    pub fn calls_with_phase(&self, device: &DeviceId) -> Vec<(ProbeCall, ConnectionPhase)> {
        lock(&self.log)
            .iter()
            .filter(|(id, _, _)| id == device)
            .map(|(_, call, phase)| (call.clone(), *phase))
            .collect()
    }

    /// Number of times probes of `device` received `call`.
    pub fn count(&self, device: &DeviceId, call: &ProbeCall) -> usize {
        lock(&self.log)
            .iter()
            .filter(|(id, received, _)| id == device && received == call)
            .count()
    }

    /// Forgets recorded notifications.
    pub fn clear(&self) {
        lock(&self.log).clear();
    }
}

impl ComponentFactory for ProbeFactory {
    fn components(&self, _: &DeviceIdentity) -> Vec<Option<Box<dyn ComponentController>>> {
        vec![
            Some(Box::new(ComponentProbe {
                log: self.log.clone(),
            })),
            None,
        ]
    }

    fn piloting_interfaces(&self, _: &DeviceIdentity) -> Vec<Box<dyn PilotingInterface>> {
        let mut interfaces: Vec<Box<dyn PilotingInterface>> = vec![Box::new(ReturnHomePiloting::new())];
        for kind in self.interfaces.iter() {
            interfaces.push(Box::new(ScriptedPiloting::new(*kind)));
        }
        interfaces
    }
}

/// Piloting interface whose activation completes only when its state is reported.
///
/// Available as soon as the drone connects, never needs the command loop.
#[derive(Debug)]
pub struct ScriptedPiloting {
    kind: InterfaceKind,
    state: ActivationState,
    immediate: bool,
}

impl ScriptedPiloting {
    /// Creates an interface whose requests stay pending.
    pub fn new(kind: InterfaceKind) -> Self {
        Self {
            kind,
            state: ActivationState::Unavailable,
            immediate: false,
        }
    }

    /// Creates an interface whose requests complete at once.
    pub fn immediate(kind: InterfaceKind) -> Self {
        Self {
            immediate: true,
            ..Self::new(kind)
        }
    }
}

impl PilotingInterface for ScriptedPiloting {
    fn kind(&self) -> InterfaceKind {
        self.kind
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

    fn request_activation(&mut self, _: Option<&Arc<dyn ProtocolBackend>>) -> Option<ActivationState> {
        self.immediate.then_some(ActivationState::Active)
    }

    fn request_deactivation(
        &mut self,
        _: Option<&Arc<dyn ProtocolBackend>>,
    ) -> Option<ActivationState> {
        self.immediate.then_some(ActivationState::Idle)
    }

    fn on_connecting(&mut self) -> Option<ActivationState> {
        Some(ActivationState::Idle)
    }
}

/// [`RecordingSession`] keeping everything it receives.
#[derive(Debug)]
pub struct MockSession {
    device: DeviceId,
    provider: Option<String>,
    commands: Mutex<Vec<Command>>,
    piloting: Mutex<Vec<PilotingCommand>>,
    closed: AtomicBool,
}

impl MockSession {
    /// Recorded device.
    #[inline(always)]
    pub fn device(&self) -> &DeviceId {
        &self.device
    }

    /// Connector of the recorded connection.
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Commands received so far.
    pub fn commands(&self) -> Vec<Command> {
        lock(&self.commands).clone()
    }

    /// Piloting commands sent so far.
    pub fn piloting(&self) -> Vec<PilotingCommand> {
        lock(&self.piloting).clone()
    }

    /// Whether the session was closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl RecordingSession for MockSession {
    fn on_command_received(&self, command: &Command) {
        lock(&self.commands).push(command.clone());
    }

    fn on_piloting_command(&self, command: &PilotingCommand) {
        lock(&self.piloting).push(*command);
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

/// [`Recorder`] opening a [`MockSession`] for every connection.
#[derive(Debug, Default)]
pub struct MockRecorder {
    sessions: Mutex<Vec<Arc<MockSession>>>,
}

impl MockRecorder {
    /// Creates recorder without sessions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions opened so far, in opening order.
    pub fn sessions(&self) -> Vec<Arc<MockSession>> {
        lock(&self.sessions).clone()
    }

    /// Last session opened for `device`.
    pub fn last_session(&self, device: &DeviceId) -> Option<Arc<MockSession>> {
        lock(&self.sessions)
            .iter()
            .rev()
            .find(|session| &session.device == device)
            .cloned()
    }
}

impl Recorder for MockRecorder {
    fn open_session(
        &self,
        device: &DeviceId,
        _: DeviceModel,
        provider: Option<&str>,
    ) -> Option<Arc<dyn RecordingSession>> {
        let session = Arc::new(MockSession {
            device: device.clone(),
            provider: provider.map(str::to_string),
            commands: Mutex::new(Vec::new()),
            piloting: Mutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        });
        lock(&self.sessions).push(session.clone());
        Some(session)
    }
}
