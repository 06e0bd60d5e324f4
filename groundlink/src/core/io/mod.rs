//! # Transport collaborators
//!
//! Groundlink never talks to a transport directly. A transport exposes itself through two
//! contracts:
//!
//! * [`ConnectionProvider`] is a reachability path to a device, identified by its [`Connector`].
//!   A device may be reachable through several providers, at most one of them is active.
//! * [`ProtocolBackend`] is the live link handed to a device controller once the provider has
//!   established it. It sends commands, runs the unacknowledged command loop and starts
//!   cancellable long-running requests.

mod backend;
mod connector;
mod provider;
mod request;

pub use backend::{DownloadKind, NoAckEncoder, ProtocolBackend, TransferListener, TransferStatus};
pub use connector::{Connector, ConnectorKind, Technology};
pub use provider::{ConnectionProvider, Credentials};
pub use request::{ProxyEndpoint, RequestHandle};
