//! # Protocol commands
//!
//! Commands exchanged with devices, already decoded. Wire encoding belongs to the transport;
//! groundlink only inspects the messages that drive connection lifecycle, proxying and piloting,
//! and passes everything else through as [`RawCommand`].

mod command;
mod drone_manager;
mod piloting;

pub use command::{
    Command, CommonMessage, DisconnectionCause, RawCommand, ShutdownReason, SkyControllerMessage,
};
pub use drone_manager::{DroneManagerMessage, ListFlags, ProxiedLinkState};
pub use piloting::{FlyingState, PilotingMessage, ReturnHomeState};
