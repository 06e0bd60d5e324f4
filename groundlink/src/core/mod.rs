//! # Core entities
//!
//! Device identity, collaborator contracts (transport, storage, scheduling, recording,
//! components) and the events exchanged with the [`Engine`](crate::engine::Engine).

pub mod component;
pub mod device;
pub mod event;
pub mod io;
pub mod marker;
pub mod recording;
pub mod scheduler;
pub mod state;
pub mod storage;
pub mod utils;
