use std::fmt::{Debug, Formatter};
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::consts::{
    KEY_DEVICE_BOARD_ID, KEY_DEVICE_FIRMWARE_VERSION, KEY_DEVICE_MODEL, KEY_DEVICE_NAME,
    KEY_DEVICE_PRESET_KEY,
};
use crate::controller::{ControllerEnv, DeviceFamily, Signal};
use crate::core::component::{ComponentContext, ComponentController};
use crate::core::device::{DeviceIdentity, FirmwareVersion};
use crate::core::event::{DeviceEvent, Event};
use crate::core::io::{
    ConnectionProvider, ConnectorKind, Credentials, DownloadKind, ProtocolBackend, ProxyEndpoint,
    RequestHandle, Technology, TransferListener,
};
use crate::core::recording::RecordingSession;
use crate::core::scheduler::TimerHandle;
use crate::core::storage::{Dictionary, Subscription};
use crate::core::utils::UniqueId;
use crate::protocol::CommonMessage;

use crate::prelude::*;

macro_rules! context {
    ($controller:ident) => {
        ComponentContext {
            identity: &$controller.identity,
            phase: $controller.phase,
            backend: $controller.backend.as_ref(),
            dictionary: &$controller.dictionary,
            preset: &$controller.preset,
            session: $controller.session.as_ref(),
        }
    };
}

/// Connection state machine of a single device.
///
/// The phase only moves forward through
/// `Disconnected → LinkConnecting → HandshakeProxySetup → HandshakeSettings → HandshakeStates →
/// Connected`, and back to `Disconnected` through teardown, possibly via `Disconnecting`. Lifecycle is
/// [`ControllerLifecycle::Active`] exactly when the phase is not `Disconnected`.
///
/// At most one registered provider is active at a time: the one driving the current connection.
pub struct DeviceController<F: DeviceFamily> {
    identity: DeviceIdentity,
    family: F,
    env: ControllerEnv,
    phase: ConnectionPhase,
    lifecycle: ControllerLifecycle,
    state: ConnectionState,
    cause: ConnectionCause,
    providers: Vec<Arc<dyn ConnectionProvider>>,
    active: Option<Arc<dyn ConnectionProvider>>,
    auto_reconnect: bool,
    backend: Option<Arc<dyn ProtocolBackend>>,
    proxy_channel: Option<RequestHandle>,
    endpoint: Option<ProxyEndpoint>,
    timer: Option<TimerHandle>,
    pending_cause: Option<ConnectionCause>,
    session: Option<Arc<dyn RecordingSession>>,
    components: Vec<Box<dyn ComponentController>>,
    dictionary: Arc<dyn Dictionary>,
    preset: Arc<dyn Dictionary>,
    preset_subscription: Option<Subscription>,
    data_sync_allowed: bool,
}

impl<F: DeviceFamily> Debug for DeviceController<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceController")
            .field("identity", &self.identity)
            .field("family", &self.family)
            .field("phase", &self.phase)
            .field("lifecycle", &self.lifecycle)
            .field("active", &self.active.as_ref().map(|provider| provider.connector()))
            .field("auto_reconnect", &self.auto_reconnect)
            .field("components", &self.components.len())
            .finish_non_exhaustive()
    }
}

impl<F: DeviceFamily> DeviceController<F> {
    /// Creates a stopped controller.
    ///
    /// Identity fields persisted in the device dictionary are restored. Component controllers are
    /// built from the [`ComponentFactory`](crate::core::component::ComponentFactory) of `env`, and
    /// the family from the restored identity.
    pub fn new(
        id: DeviceId,
        model: DeviceModel,
        name: impl Into<String>,
        env: ControllerEnv,
        family: impl FnOnce(&DeviceIdentity, &ControllerEnv) -> F,
    ) -> Self {
        let dictionary = env.store.device(&id);
        let mut identity = DeviceIdentity::new(id, model, name);
        identity.persisted = !dictionary.is_new();

        if let Some(version) = dictionary.get(KEY_DEVICE_FIRMWARE_VERSION) {
            match version.parse::<FirmwareVersion>() {
                Ok(version) => identity.firmware_version = Some(version),
                Err(err) => log::warn!("[{}] ignoring persisted firmware version: {err}", identity.id),
            }
        }
        identity.board_id = dictionary.get(KEY_DEVICE_BOARD_ID);

        let preset_key = dictionary
            .get(KEY_DEVICE_PRESET_KEY)
            .unwrap_or_else(|| model.default_preset_key());
        let preset = env.store.preset(&preset_key);

        let components = env
            .components
            .components(&identity)
            .into_iter()
            .flatten()
            .collect();
        let family = family(&identity, &env);

        Self {
            identity,
            family,
            env,
            phase: ConnectionPhase::Disconnected,
            lifecycle: ControllerLifecycle::Stopped,
            state: ConnectionState::Disconnected,
            cause: ConnectionCause::None,
            providers: Vec::new(),
            active: None,
            auto_reconnect: false,
            backend: None,
            proxy_channel: None,
            endpoint: None,
            timer: None,
            pending_cause: None,
            session: None,
            components,
            dictionary,
            preset,
            preset_subscription: None,
            data_sync_allowed: false,
        }
    }

    /// Device identifier.
    #[inline(always)]
    pub fn id(&self) -> &DeviceId {
        &self.identity.id
    }

    /// Device identity.
    #[inline(always)]
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Device family.
    #[inline(always)]
    pub fn family(&self) -> &F {
        &self.family
    }

    #[inline(always)]
    pub(crate) fn family_mut(&mut self) -> &mut F {
        &mut self.family
    }

    /// Current connection phase.
    #[inline(always)]
    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Controller lifecycle.
    #[inline(always)]
    pub fn lifecycle(&self) -> ControllerLifecycle {
        self.lifecycle
    }

    /// Observable connection state.
    #[inline(always)]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Cause of the last connection state change.
    #[inline(always)]
    pub fn cause(&self) -> ConnectionCause {
        self.cause
    }

    /// Registered providers, in registration order.
    pub fn providers(&self) -> impl Iterator<Item = &Arc<dyn ConnectionProvider>> {
        self.providers.iter()
    }

    /// Registered provider with given connector identifier.
    pub fn provider(&self, connector: &str) -> Option<&Arc<dyn ConnectionProvider>> {
        self.providers
            .iter()
            .find(|provider| provider.connector().uid() == connector)
    }

    /// Provider driving the current connection.
    #[inline(always)]
    pub fn active_provider(&self) -> Option<&Arc<dyn ConnectionProvider>> {
        self.active.as_ref()
    }

    /// Protocol link, available once the link is connected.
    #[inline(always)]
    pub fn backend(&self) -> Option<&Arc<dyn ProtocolBackend>> {
        self.backend.as_ref()
    }

    /// Local endpoint of the auxiliary proxy channel.
    #[inline(always)]
    pub fn endpoint(&self) -> Option<&ProxyEndpoint> {
        self.endpoint.as_ref()
    }

    /// Recording session of the current connection.
    #[inline(always)]
    pub fn session(&self) -> Option<&Arc<dyn RecordingSession>> {
        self.session.as_ref()
    }

    /// Device dictionary.
    #[inline(always)]
    pub fn dictionary(&self) -> &Arc<dyn Dictionary> {
        &self.dictionary
    }

    /// Preset dictionary of the device.
    #[inline(always)]
    pub fn preset(&self) -> &Arc<dyn Dictionary> {
        &self.preset
    }

    /// Whether the device will be connected again once its link is lost.
    #[inline(always)]
    pub fn is_auto_reconnect_armed(&self) -> bool {
        self.auto_reconnect
    }

    /// Whether data synchronization with the device is allowed.
    #[inline(always)]
    pub fn is_data_sync_allowed(&self) -> bool {
        self.data_sync_allowed
    }

    /// Whether a handshake timeout is pending.
    #[inline(always)]
    pub fn has_pending_timeout(&self) -> bool {
        self.timer.is_some()
    }

    /// Technology of the local connector through which the device is reached.
    ///
    /// Follows parents of the active provider, so a drone connected through a remote control
    /// reports the technology linking the remote control.
    pub fn local_technology(&self) -> Option<Technology> {
        let mut provider = self.active.clone()?;
        while let Some(parent) = provider.parent() {
            provider = parent;
        }
        let connector = provider.connector();
        (connector.kind() == ConnectorKind::Local).then(|| connector.technology())
    }

    /// Starts the controller.
    pub fn start(&mut self) {
        if self.preset_subscription.is_some() {
            return;
        }

        let queue = self.env.queue.clone();
        let device = self.identity.id.clone();
        self.preset_subscription = Some(self.preset.subscribe(Arc::new(move || {
            queue.push(Event::PresetChanged {
                device: device.clone(),
            })
        })));

        log::debug!("[{}] controller started", self.identity.id);
        self.set_lifecycle(ControllerLifecycle::Idle);
    }

    /// Stops the controller for good, even if a connection is underway.
    pub fn force_stop(&mut self) {
        if self.lifecycle == ControllerLifecycle::Active {
            log::warn!("[{}] forced stop while still active", self.identity.id);
        }
        self.stop_self();
    }

    /// Adds a reachability path, replacing any provider with the same connector.
    ///
    /// If auto-reconnect is armed and no provider is active, connects through it at once.
    pub fn register_provider(&mut self, provider: Arc<dyn ConnectionProvider>) {
        let connector = provider.connector().uid().to_string();
        self.providers
            .retain(|known| known.connector().uid() != connector);
        log::debug!("[{}] provider {} registered", self.identity.id, provider.connector());
        self.providers.push(provider.clone());

        if self.auto_reconnect && self.active.is_none() {
            self.connect(provider, None, ConnectionCause::ConnectionLost);
        }
    }

    /// Removes the reachability path with given connector.
    ///
    /// Returns `false` if no such provider is registered.
    pub fn unregister_provider(&mut self, connector: &str) -> bool {
        let Some(pos) = self
            .providers
            .iter()
            .position(|provider| provider.connector().uid() == connector)
        else {
            return false;
        };

        let removed = self.providers.remove(pos);
        log::debug!("[{}] provider {} unregistered", self.identity.id, removed.connector());

        if self.is_active(&removed) {
            self.active = None;
            self.auto_reconnect = true;
            self.handle_disconnection(ConnectionCause::ConnectionLost);
        }

        if self.providers.is_empty() && self.dictionary.is_new() {
            self.stop_self();
        }
        true
    }

    /// Connects the device through `provider`.
    ///
    /// Succeeds only while disconnected, and if the provider accepts to connect. The provider
    /// then becomes active.
    pub fn connect(
        &mut self,
        provider: Arc<dyn ConnectionProvider>,
        credentials: Option<&Credentials>,
        cause: ConnectionCause,
    ) -> bool {
        if self.phase != ConnectionPhase::Disconnected {
            log::debug!("[{}] connection refused in {:?} phase", self.identity.id, self.phase);
            return false;
        }
        if !provider.connect(&self.identity.id, credentials) {
            log::warn!("[{}] provider {} failed to connect", self.identity.id, provider.connector());
            return false;
        }

        self.phase = ConnectionPhase::LinkConnecting;
        self.active = Some(provider);
        self.pending_cause = None;
        self.set_lifecycle(ControllerLifecycle::Active);
        self.set_state(ConnectionState::Connecting, cause);
        true
    }

    /// Asks the active provider to disconnect the device.
    pub fn disconnect(&mut self, cause: ConnectionCause) -> bool {
        let Some(active) = self.active.clone() else {
            return false;
        };
        if !active.disconnect(&self.identity.id) {
            log::debug!("[{}] provider {} refused to disconnect", self.identity.id, active.connector());
            return false;
        }

        self.phase = ConnectionPhase::Disconnecting;
        self.set_state(ConnectionState::Disconnecting, cause);
        self.on_protocol_disconnecting();
        true
    }

    /// Disconnects on user request. Disarms auto-reconnect.
    pub fn user_disconnect(&mut self) -> bool {
        self.auto_reconnect = false;
        self.disconnect(ConnectionCause::UserRequested)
    }

    /// Handles a device-initiated power off.
    pub fn power_off(&mut self) -> bool {
        log::info!("[{}] device is powering off", self.identity.id);
        self.auto_reconnect = false;
        self.disconnect(ConnectionCause::UserRequested)
    }

    /// Forgets the device: disconnects it, clears persisted data and asks every provider to
    /// forget it.
    ///
    /// The controller stops if no provider remains.
    pub fn forget(&mut self) {
        if self.phase != ConnectionPhase::Disconnected {
            self.user_disconnect();
        }

        log::info!("[{}] forgetting device", self.identity.id);
        self.identity.persisted = false;
        self.fan_out(|component, ctx| component.on_forgetting(ctx));

        for provider in self.providers.iter() {
            provider.forget(&self.identity.id);
        }

        self.dictionary.clear();
        if let Err(err) = self.dictionary.commit() {
            log::warn!("[{}] can't clear device dictionary: {err}", self.identity.id);
        }

        if self.providers.is_empty() {
            self.stop_self();
        }
    }

    /// The provider started connecting the device.
    ///
    /// Ignored if another provider is active.
    pub fn on_link_connecting(&mut self, provider: Arc<dyn ConnectionProvider>) {
        if self.active.is_some() && !self.is_active(&provider) {
            log::debug!(
                "[{}] ignoring connection through inactive provider {}",
                self.identity.id,
                provider.connector()
            );
            return;
        }

        self.active = Some(provider);
        self.auto_reconnect = false;
        self.phase = ConnectionPhase::LinkConnecting;
        self.set_lifecycle(ControllerLifecycle::Active);

        let cause = match self.state {
            ConnectionState::Connecting => self.cause,
            _ => ConnectionCause::None,
        };
        self.set_state(ConnectionState::Connecting, cause);
    }

    /// The provider established the link. Starts the handshake.
    pub fn on_link_connected(
        &mut self,
        provider: Arc<dyn ConnectionProvider>,
        backend: Arc<dyn ProtocolBackend>,
    ) {
        if self.phase != ConnectionPhase::LinkConnecting {
            self.on_link_connecting(provider);
        }

        log::info!("[{}] link connected, starting handshake", self.identity.id);
        self.phase = ConnectionPhase::HandshakeProxySetup;
        self.backend = Some(backend.clone());
        backend.set_unacked_loop_period(self.family.unacked_loop_period());

        self.on_protocol_connecting();
        self.send_date();

        self.proxy_channel = Some(backend.open_proxy_channel(self.env.proxy_port));
        self.post_timeout();
    }

    /// The link is down.
    pub fn on_link_disconnected(&mut self, removing: bool) {
        self.auto_reconnect |= removing;
        self.handle_disconnection(if removing {
            ConnectionCause::ConnectionLost
        } else {
            ConnectionCause::None
        });
    }

    /// The connection attempt failed.
    pub fn on_link_canceled(&mut self, cause: ConnectionCause, removing: bool) {
        self.auto_reconnect |= removing;
        self.handle_disconnection(if removing {
            ConnectionCause::ConnectionLost
        } else {
            cause
        });
    }

    /// The transport detected that the link is no longer alive.
    pub fn on_link_lost(&mut self) {
        log::warn!("[{}] link lost", self.identity.id);
        self.fan_out(|component, ctx| component.on_link_lost(ctx));
        self.auto_reconnect = true;
        self.disconnect(ConnectionCause::ConnectionLost);
    }

    /// The auxiliary proxy channel was opened, or failed to open if `endpoint` is `None`.
    pub fn on_proxy_channel_opened(&mut self, endpoint: Option<ProxyEndpoint>) {
        if self.phase != ConnectionPhase::HandshakeProxySetup {
            log::debug!("[{}] ignoring stale proxy channel", self.identity.id);
            return;
        }

        self.endpoint = endpoint.filter(|endpoint| endpoint.port != 0);
        match &self.endpoint {
            Some(endpoint) => log::info!("[{}] proxy channel open at {endpoint}", self.identity.id),
            None => log::warn!("[{}] proxy channel unavailable", self.identity.id),
        }

        self.phase = ConnectionPhase::HandshakeSettings;
        self.send_command(self.family.all_settings_request());
        self.post_timeout();
    }

    /// A timer expired.
    ///
    /// Ignored unless `timer` is the pending handshake timeout.
    pub fn on_timer(&mut self, timer: UniqueId) {
        if self.timer.as_ref().map(TimerHandle::id) != Some(timer) {
            log::trace!("[{}] ignoring stale timer {timer}", self.identity.id);
            return;
        }
        self.timer = None;

        if let Some(active) = self.active.clone() {
            log::warn!("[{}] connection timed out in {:?} phase", self.identity.id, self.phase);
            self.pending_cause = Some(ConnectionCause::Timeout);
            if !active.disconnect(&self.identity.id) {
                log::warn!("[{}] provider {} refused to disconnect", self.identity.id, active.connector());
                self.pending_cause = None;
            }
        }
    }

    /// A command was received from the device.
    ///
    /// The family decodes it first, then every component controller and the recording session
    /// receive it.
    pub fn on_command_received(&mut self, command: &Command) {
        let signal = {
            let ctx = context!(self);
            self.family.on_command_received(&ctx, command)
        };
        if let Some(signal) = signal {
            self.handle_signal(signal);
        }

        self.fan_out(|component, ctx| component.on_command_received(ctx, command));
        if let Some(session) = &self.session {
            session.on_command_received(command);
        }
    }

    /// The preset dictionary was committed.
    pub fn on_preset_change(&mut self) {
        self.fan_out(|component, ctx| component.on_preset_change(ctx));
    }

    /// Sends a command to the device.
    ///
    /// Returns `false` and drops the command if the link is down.
    pub fn send_command(&self, command: Command) -> bool {
        match &self.backend {
            Some(backend) => backend.send(command),
            None => {
                log::debug!("[{}] dropping {command:?}, link is down", self.identity.id);
                false
            }
        }
    }

    /// Recomputes data synchronization allowance.
    pub fn notify_data_sync_condition_changed(&mut self) {
        let allowed = self.phase == ConnectionPhase::Connected && self.family.may_synchronize();
        if allowed == self.data_sync_allowed {
            return;
        }

        log::debug!("[{}] data sync allowed: {allowed}", self.identity.id);
        self.data_sync_allowed = allowed;
        if let Some(active) = &self.active {
            active.on_data_sync_condition_changed(&self.identity.id, allowed);
        }
        self.fan_out(|component, ctx| component.on_data_sync_allowance_changed(ctx, allowed));
        self.env.sink.notify(DeviceEvent::DataSyncChanged {
            device: self.identity.id.clone(),
            allowed,
        });
    }

    /// Uploads a firmware to the device.
    ///
    /// Returns `None` if the link is down.
    pub fn update_firmware(
        &self,
        firmware: &Path,
        listener: Arc<dyn TransferListener>,
    ) -> Option<RequestHandle> {
        self.backend
            .as_ref()
            .map(|backend| backend.start_upload(firmware, listener))
    }

    /// Downloads crash reports from the device into `dest`.
    ///
    /// Returns `None` if the link is down.
    pub fn download_crash_reports(
        &self,
        dest: &Path,
        listener: Arc<dyn TransferListener>,
    ) -> Option<RequestHandle> {
        self.backend
            .as_ref()
            .map(|backend| backend.start_download(DownloadKind::CrashReports, dest, listener))
    }

    /// Downloads flight logs from the device into `dest`.
    ///
    /// Returns `None` if the link is down.
    pub fn download_flight_logs(
        &self,
        dest: &Path,
        listener: Arc<dyn TransferListener>,
    ) -> Option<RequestHandle> {
        self.backend
            .as_ref()
            .map(|backend| backend.start_download(DownloadKind::FlightLogs, dest, listener))
    }

    fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::AllSettingsReceived => {
                if self.phase == ConnectionPhase::HandshakeSettings {
                    self.phase = ConnectionPhase::HandshakeStates;
                    self.send_command(self.family.all_states_request());
                    self.post_timeout();
                }
            }
            Signal::AllStatesReceived => {
                if self.phase == ConnectionPhase::HandshakeStates {
                    self.complete_handshake();
                }
            }
            Signal::PowerOff => {
                self.power_off();
            }
            Signal::Name(name) => {
                self.identity.name = name.clone();
                self.persist(KEY_DEVICE_NAME, name);
            }
            Signal::FirmwareVersion(version) => match version.parse::<FirmwareVersion>() {
                Ok(parsed) => {
                    self.identity.firmware_version = Some(parsed);
                    self.persist(KEY_DEVICE_FIRMWARE_VERSION, parsed.to_string());
                }
                Err(err) => log::warn!("[{}] {err}", self.identity.id),
            },
            Signal::BoardId(board_id) => {
                self.identity.board_id = Some(board_id.clone());
                self.persist(KEY_DEVICE_BOARD_ID, board_id);
            }
            Signal::DataSyncConditionChanged => self.notify_data_sync_condition_changed(),
        }
    }

    fn complete_handshake(&mut self) {
        log::info!("[{}] handshake complete", self.identity.id);
        self.phase = ConnectionPhase::Connected;
        self.timer = None;
        self.on_protocol_connected();

        self.identity.persisted = true;
        self.set_state(ConnectionState::Connected, ConnectionCause::None);
        if self.identity.board_id.is_none() {
            self.identity.board_id = Some(String::new());
        }

        self.dictionary
            .put(KEY_DEVICE_NAME, self.identity.name.clone());
        self.dictionary
            .put(KEY_DEVICE_PRESET_KEY, self.preset.key().to_string());
        self.dictionary
            .put(KEY_DEVICE_MODEL, self.identity.model.id().to_string());
        if let Err(err) = self.dictionary.commit() {
            log::warn!("[{}] can't persist device: {err}", self.identity.id);
        }
    }

    fn handle_disconnection(&mut self, cause: ConnectionCause) {
        let cause = match self.pending_cause.take() {
            Some(pending) if cause == ConnectionCause::None => pending,
            _ => cause,
        };

        if self.phase == ConnectionPhase::Connected {
            self.on_protocol_disconnecting();
        }
        if self.phase == ConnectionPhase::Disconnected {
            return;
        }

        self.phase = ConnectionPhase::Disconnected;
        self.backend = None;
        self.endpoint = None;
        if let Some(channel) = self.proxy_channel.take() {
            channel.cancel();
        }
        self.timer = None;
        self.on_protocol_disconnected();

        let reconnected = self.auto_reconnect
            && match self.active.clone() {
                Some(active) => self.connect(active, None, ConnectionCause::ConnectionLost),
                None => false,
            };

        if !reconnected {
            self.active = None;
            self.set_state(ConnectionState::Disconnected, cause);
            self.set_lifecycle(ControllerLifecycle::Idle);
        }
    }

    fn on_protocol_connecting(&mut self) {
        if let Some(recorder) = &self.env.recorder {
            let provider = self
                .active
                .as_ref()
                .map(|provider| provider.connector().uid().to_string());
            self.session = self
                .family
                .open_session(recorder.as_ref(), &self.identity, provider.as_deref());
        }

        self.fan_out(|component, ctx| component.on_connecting(ctx));
        let ctx = context!(self);
        self.family.on_protocol_connecting(&ctx);
    }

    fn on_protocol_connected(&mut self) {
        {
            let ctx = context!(self);
            self.family.on_protocol_connected(&ctx);
        }
        self.fan_out(|component, ctx| component.on_connected(ctx));
        self.notify_data_sync_condition_changed();
    }

    fn on_protocol_disconnecting(&mut self) {
        {
            let ctx = context!(self);
            self.family.on_protocol_disconnecting(&ctx);
        }
        self.fan_out(|component, ctx| component.on_disconnecting(ctx));
    }

    fn on_protocol_disconnected(&mut self) {
        {
            let ctx = context!(self);
            self.family.on_protocol_disconnected(&ctx);
        }
        self.fan_out(|component, ctx| component.on_disconnected(ctx));
        if let Some(session) = self.session.take() {
            session.close();
        }
        self.notify_data_sync_condition_changed();
    }

    fn stop_self(&mut self) {
        log::debug!("[{}] controller stopped", self.identity.id);
        self.set_lifecycle(ControllerLifecycle::Stopped);
        self.preset_subscription = None;
        self.fan_out(|component, ctx| component.on_dispose(ctx));
    }

    fn fan_out(&mut self, mut notify: impl FnMut(&mut dyn ComponentController, &ComponentContext<'_>)) {
        let ctx = context!(self);
        for component in self.components.iter_mut() {
            notify(component.as_mut(), &ctx);
        }
    }

    fn is_active(&self, provider: &Arc<dyn ConnectionProvider>) -> bool {
        self.active
            .as_ref()
            .is_some_and(|active| active.connector().uid() == provider.connector().uid())
    }

    fn post_timeout(&mut self) {
        self.timer = Some(
            self.env
                .scheduler
                .schedule(&self.identity.id, self.env.handshake_timeout),
        );
    }

    fn send_date(&self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|since_epoch| since_epoch.as_secs())
            .unwrap_or_default();
        self.send_command(Command::Common(CommonMessage::CurrentDateTime(now)));
    }

    fn persist(&self, key: &str, value: String) {
        self.dictionary.put(key, value);
        if let Err(err) = self.dictionary.commit() {
            log::warn!("[{}] can't persist '{key}': {err}", self.identity.id);
        }
    }

    fn set_lifecycle(&mut self, lifecycle: ControllerLifecycle) {
        if self.lifecycle == lifecycle {
            return;
        }
        self.lifecycle = lifecycle;
        self.env.sink.notify(DeviceEvent::LifecycleChanged {
            device: self.identity.id.clone(),
            lifecycle,
        });
    }

    fn set_state(&mut self, state: ConnectionState, cause: ConnectionCause) {
        if (self.state, self.cause) == (state, cause) {
            return;
        }
        log::info!("[{}] {state:?} ({cause:?})", self.identity.id);
        self.state = state;
        self.cause = cause;
        self.env.sink.notify(DeviceEvent::StateChanged {
            device: self.identity.id.clone(),
            state,
            cause,
        });
    }
}
