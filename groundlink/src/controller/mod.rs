//! # Device controllers
//!
//! A [`DeviceController`] drives the connection lifecycle of one device: link establishment
//! through one of its [`ConnectionProvider`](crate::core::io::ConnectionProvider)s, protocol
//! handshake, steady state, and teardown. It owns the reconnection policy and gates data
//! synchronization.
//!
//! Behavior specific to a kind of device, such as handshake commands or extra data
//! synchronization conditions, is provided by a [`DeviceFamily`]:
//!
//! * [`DroneFamily`] for drones, which also owns the piloting interface arbiter.
//! * [`RemoteControlFamily`] for remote controls, which may relay connections to drones through
//!   a [`ProxyLinkCoordinator`](crate::proxy::ProxyLinkCoordinator).

mod device;
mod drone;
mod env;
mod family;
mod remote_control;

pub use device::DeviceController;
pub use drone::DroneFamily;
pub use env::ControllerEnv;
pub use family::{DeviceFamily, Signal};
pub use remote_control::RemoteControlFamily;
