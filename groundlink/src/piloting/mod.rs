//! # Piloting interfaces
//!
//! A drone can be driven by several mutually exclusive piloting interfaces: manual piloting,
//! return home, flight plans, and so on. The [`PilotingActivationArbiter`] of each drone decides
//! which one is active, runs the transition protocol between them, and starts or stops the
//! periodic piloting command loop.

mod arbiter;
mod command;
mod interface;
mod manual;
mod return_home;

pub use arbiter::PilotingActivationArbiter;
pub use command::{PilotingCommand, PilotingCommandEncoder};
pub use interface::{ActivationState, InterfaceKind, PilotingInterface};
pub use manual::ManualPiloting;
pub use return_home::ReturnHomePiloting;
