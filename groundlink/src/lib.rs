//! # Groundlink
//!
//! Connection lifecycle engine for remotely piloted devices: drones, and the remote controls that
//! relay access to them. Groundlink decides *when* a device is reachable, *which* piloting
//! interface may drive it, and *how* link failures, handshake timeouts, and proxied connections
//! through a remote control are handled.
//!
//! The library is transport-agnostic. Transports plug in through
//! [`ProtocolBackend`](core::io::ProtocolBackend) and
//! [`ConnectionProvider`](core::io::ConnectionProvider), persistence plugs in through
//! [`Store`](core::storage::Store), and capability implementations (camera, gimbal, telemetry, ...)
//! observe the lifecycle as [`ComponentController`](core::component::ComponentController)s.
//!
//! # Usage
//!
//! Everything is driven by the [`Engine`](engine::Engine), which processes [`Event`]s serially:
//!
//! ```rust
//! use std::sync::Arc;
//! use groundlink::core::scheduler::ManualScheduler;
//! use groundlink::engine::EngineConf;
//!
//! let scheduler = Arc::new(ManualScheduler::new());
//! let mut engine = EngineConf::builder()
//!     .scheduler(scheduler.clone())
//!     .build();
//! engine.start();
//!
//! assert!(engine.drones().next().is_none());
//! ```
//!
//! Timer-driven events have to be fed back into the engine. With the `async` feature enabled,
//! `asnc::Executor` does that on top of Tokio.
//!
//! # Features
#![doc = document_features::document_features!()]
//!
//! [`Event`]: core::event::Event

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod consts;
pub mod controller;
pub mod core;
pub mod engine;
pub mod errors;
pub mod piloting;
pub mod prelude;
pub mod protocol;
pub mod proxy;

#[cfg(feature = "async")]
pub mod asnc;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
