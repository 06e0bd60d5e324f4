//! # Basic imports

pub use crate::errors::{Error, Result};
pub use crate::errors::{DeviceError, StorageError};

pub use crate::core::device::{DeviceId, DeviceModel};
pub use crate::core::state::{ConnectionCause, ConnectionPhase, ConnectionState, ControllerLifecycle};
pub use crate::protocol::Command;
