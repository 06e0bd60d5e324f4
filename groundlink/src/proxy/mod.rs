//! # Proxied connections
//!
//! A remote control may relay connections to drones. It reports the state of the relayed link
//! and the list of drones it knows through drone manager messages, and accepts connect and
//! forget requests the same way.
//!
//! * [`DeviceManagerTranslator`] decodes drone manager messages into [`ProxyAction`]s and keeps
//!   the [`ProxyEntry`] of every drone the remote control reported.
//! * [`ProxyLinkCoordinator`] wraps the remote control's
//!   [`DeviceController`](crate::controller::DeviceController) and applies these actions to the
//!   drone controllers, which reach their drone through a [`ProxyProvider`].
//! * [`ProxyLink`] is the state shared between the remote control and its provider: protocol
//!   link, parent provider, active drone.

mod coordinator;
mod entry;
mod link;
mod provider;
mod translator;

pub use coordinator::{ProxiedDevices, ProxyLinkCoordinator};
pub use entry::{ProxiedState, ProxyEntry};
pub use link::ProxyLink;
pub use provider::ProxyProvider;
pub use translator::{DeviceManagerTranslator, ProxyAction};
