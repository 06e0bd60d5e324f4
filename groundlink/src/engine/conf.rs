use std::sync::Arc;
use std::time::Duration;

use crate::consts::{DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_PROXY_PORT};
use crate::controller::ControllerEnv;
use crate::core::component::{ComponentFactory, NoComponents};
use crate::core::event::{EventQueue, EventSink, NoSink};
use crate::core::marker::{HasScheduler, MaybeScheduler, Unset};
use crate::core::recording::Recorder;
use crate::core::scheduler::Scheduler;
use crate::core::storage::{MemoryStore, Store};
use crate::engine::Engine;

/// Engine configuration.
///
/// Use [`EngineConf::builder`] to create one.
#[derive(Clone, Debug)]
pub struct EngineConf {
    pub(crate) env: ControllerEnv,
}

impl EngineConf {
    /// Creates an empty [`EngineBuilder`].
    pub fn builder() -> EngineBuilder<Unset> {
        EngineBuilder::new()
    }

    /// Maximum duration of each handshake step.
    #[inline(always)]
    pub fn handshake_timeout(&self) -> Duration {
        self.env.handshake_timeout
    }

    /// Device port of the auxiliary proxy channel.
    #[inline(always)]
    pub fn proxy_port(&self) -> u16 {
        self.env.proxy_port
    }

    /// Creates an [`Engine`] from this configuration.
    pub fn build(self) -> Engine {
        Engine::new(self)
    }
}

/// Builder for [`EngineConf`] and [`Engine`].
///
/// A [`Scheduler`] is required before building.
#[derive(Clone, Debug)]
pub struct EngineBuilder<S: MaybeScheduler> {
    scheduler: S,
    handshake_timeout: Duration,
    proxy_port: u16,
    store: Arc<dyn Store>,
    sink: Arc<dyn EventSink>,
    recorder: Option<Arc<dyn Recorder>>,
    components: Arc<dyn ComponentFactory>,
}

impl EngineBuilder<Unset> {
    /// Instantiates an empty builder.
    pub fn new() -> Self {
        Self {
            scheduler: Unset,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            proxy_port: DEFAULT_PROXY_PORT,
            store: Arc::new(MemoryStore::new()),
            sink: Arc::new(NoSink),
            recorder: None,
            components: Arc::new(NoComponents),
        }
    }

    /// Sets timer scheduler.
    pub fn scheduler(self, scheduler: Arc<dyn Scheduler>) -> EngineBuilder<HasScheduler> {
        EngineBuilder {
            scheduler: HasScheduler(scheduler),
            handshake_timeout: self.handshake_timeout,
            proxy_port: self.proxy_port,
            store: self.store,
            sink: self.sink,
            recorder: self.recorder,
            components: self.components,
        }
    }
}

impl Default for EngineBuilder<Unset> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: MaybeScheduler> EngineBuilder<S> {
    /// Sets the maximum duration of each handshake step.
    ///
    /// Default is [`DEFAULT_HANDSHAKE_TIMEOUT`].
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Sets the device port of the auxiliary proxy channel.
    ///
    /// Default is [`DEFAULT_PROXY_PORT`].
    pub fn proxy_port(mut self, port: u16) -> Self {
        self.proxy_port = port;
        self
    }

    /// Sets persistent storage. Default is [`MemoryStore`].
    pub fn store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = store;
        self
    }

    /// Sets the receiver of outbound events.
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets black-box recorder.
    pub fn recorder(mut self, recorder: Arc<dyn Recorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Sets the factory of device capabilities and piloting interfaces.
    pub fn components(mut self, components: Arc<dyn ComponentFactory>) -> Self {
        self.components = components;
        self
    }
}

impl EngineBuilder<HasScheduler> {
    /// Builds [`EngineConf`].
    pub fn conf(self) -> EngineConf {
        let mut env = ControllerEnv::new(self.scheduler.0)
            .with_store(self.store)
            .with_sink(self.sink)
            .with_components(self.components)
            .with_queue(EventQueue::new())
            .with_handshake_timeout(self.handshake_timeout)
            .with_proxy_port(self.proxy_port);
        if let Some(recorder) = self.recorder {
            env = env.with_recorder(recorder);
        }
        EngineConf { env }
    }

    /// Builds [`Engine`].
    pub fn build(self) -> Engine {
        self.conf().build()
    }
}
