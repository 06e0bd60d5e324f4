use std::sync::Arc;
use std::time::Duration;

use crate::consts::{DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_PROXY_PORT};
use crate::core::component::{ComponentFactory, NoComponents};
use crate::core::event::{EventQueue, EventSink, NoSink};
use crate::core::recording::Recorder;
use crate::core::scheduler::Scheduler;
use crate::core::storage::{MemoryStore, Store};

/// Collaborators and settings shared by all device controllers of an engine.
#[derive(Clone, Debug)]
pub struct ControllerEnv {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) scheduler: Arc<dyn Scheduler>,
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) recorder: Option<Arc<dyn Recorder>>,
    pub(crate) components: Arc<dyn ComponentFactory>,
    pub(crate) queue: EventQueue,
    pub(crate) handshake_timeout: Duration,
    pub(crate) proxy_port: u16,
}

impl ControllerEnv {
    /// Creates environment with in-memory storage and default settings.
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            scheduler,
            sink: Arc::new(NoSink),
            recorder: None,
            components: Arc::new(NoComponents),
            queue: EventQueue::new(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            proxy_port: DEFAULT_PROXY_PORT,
        }
    }

    /// Sets persistent storage.
    pub fn with_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = store;
        self
    }

    /// Sets the receiver of outbound events.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Sets black-box recorder.
    pub fn with_recorder(mut self, recorder: Arc<dyn Recorder>) -> Self {
        self.recorder = Some(recorder);
        self
    }

    /// Sets the factory of device capabilities.
    pub fn with_components(mut self, components: Arc<dyn ComponentFactory>) -> Self {
        self.components = components;
        self
    }

    /// Sets the queue receiving events raised from callbacks.
    pub fn with_queue(mut self, queue: EventQueue) -> Self {
        self.queue = queue;
        self
    }

    /// Sets the maximum duration of each handshake step.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Sets the device port of the auxiliary proxy channel.
    pub fn with_proxy_port(mut self, port: u16) -> Self {
        self.proxy_port = port;
        self
    }

    /// Persistent storage.
    #[inline(always)]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Queue receiving events raised from callbacks.
    #[inline(always)]
    pub fn queue(&self) -> &EventQueue {
        &self.queue
    }

    /// Maximum duration of each handshake step.
    #[inline(always)]
    pub fn handshake_timeout(&self) -> Duration {
        self.handshake_timeout
    }

    /// Device port of the auxiliary proxy channel.
    #[inline(always)]
    pub fn proxy_port(&self) -> u16 {
        self.proxy_port
    }
}
