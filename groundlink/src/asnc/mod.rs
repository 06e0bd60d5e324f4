//! # Asynchronous executor
//!
//! ⚠ Requires `async` feature.
//!
//! Runs an [`Engine`](crate::engine::Engine) on top of Tokio. Transports push inbound events
//! through an [`EventSender`], timers are handled by the [`TokioScheduler`], and the
//! [`Executor`] feeds everything to the engine in arrival order from a single task.

mod executor;
mod scheduler;
mod sender;

pub use executor::Executor;
pub use scheduler::TokioScheduler;
pub use sender::EventSender;
