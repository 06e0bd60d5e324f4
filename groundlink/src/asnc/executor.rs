use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::asnc::{EventSender, TokioScheduler};
use crate::core::event::Event;
use crate::core::marker::Unset;
use crate::engine::{Engine, EngineBuilder};

/// Drives an [`Engine`] from a Tokio task.
///
/// ```rust,no_run
/// # #[tokio::main] async fn main() {
/// use groundlink::asnc::Executor;
/// use groundlink::engine::EngineConf;
///
/// let executor = Executor::new(EngineConf::builder());
/// let sender = executor.sender();
/// let stop = executor.stop_token();
///
/// let task = tokio::spawn(executor.run());
/// // transports push events through `sender`
/// # drop(sender);
/// stop.cancel();
/// let engine = task.await.unwrap();
/// assert!(!engine.is_started());
/// # }
/// ```
#[derive(Debug)]
pub struct Executor {
    engine: Engine,
    receiver: mpsc::UnboundedReceiver<Event>,
    sender: EventSender,
    scheduler: Arc<TokioScheduler>,
    stop: CancellationToken,
}

impl Executor {
    /// Creates executor and its engine, using a [`TokioScheduler`].
    pub fn new(builder: EngineBuilder<Unset>) -> Self {
        let (sender, receiver) = EventSender::channel();
        let scheduler = Arc::new(TokioScheduler::new(sender.clone()));
        let engine = builder.scheduler(scheduler.clone()).build();

        Self {
            engine,
            receiver,
            sender,
            scheduler,
            stop: CancellationToken::new(),
        }
    }

    /// Sender of inbound events.
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Token stopping [`run`](Self::run) once cancelled.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Engine driven by this executor.
    #[inline(always)]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Mutable engine driven by this executor.
    #[inline(always)]
    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Processes events already queued, without waiting. Returns their count.
    pub fn process_pending(&mut self) -> usize {
        let mut processed = 0;
        while let Ok(event) = self.receiver.try_recv() {
            self.process(event);
            processed += 1;
        }
        processed
    }

    /// Starts the engine and processes events until stopped.
    ///
    /// The engine is stopped and returned once the stop token is cancelled.
    pub async fn run(mut self) -> Engine {
        self.engine.start();
        log::debug!("executor started");

        loop {
            tokio::select! {
                biased;
                _ = self.stop.cancelled() => break,
                event = self.receiver.recv() => match event {
                    Some(event) => self.process(event),
                    None => break,
                },
            }
        }

        self.scheduler.shutdown();
        self.receiver.close();
        self.engine.stop();
        log::debug!("executor stopped");
        self.engine
    }

    fn process(&mut self, event: Event) {
        if let Err(err) = self.engine.handle(event) {
            log::warn!("event rejected: {err}");
        }
    }
}
