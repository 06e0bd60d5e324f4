//! # Groundlink errors

use std::sync::PoisonError;

use crate::core::device::DeviceId;
use crate::piloting::InterfaceKind;

/// Groundlink result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Groundlink errors.
#[derive(Clone, Debug, thiserror::Error)]
pub enum Error {
    /// Device-related errors.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
    /// Persistent storage errors.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    /// Executor errors.
    #[error("executor error: {0}")]
    Executor(#[from] ExecutorError),
    /// Firmware version string can't be parsed.
    #[error("invalid firmware version: {0}")]
    InvalidFirmwareVersion(String),
}

/// Errors related to device addressing and lifecycle.
#[derive(Clone, Debug, thiserror::Error)]
pub enum DeviceError {
    /// No controller is registered for this device.
    #[error("unknown device: {0}")]
    Unknown(DeviceId),
    /// Device has no provider with such connector.
    #[error("device {device} has no connector {connector}")]
    UnknownConnector {
        /// Device identifier.
        device: DeviceId,
        /// Connector identifier.
        connector: String,
    },
    /// Model identifier is not supported.
    #[error("unknown device model: {0:#06x}")]
    UnknownModel(u16),
    /// Device does not relay connections to other devices.
    #[error("device {0} is not a proxying device")]
    NotProxying(DeviceId),
    /// Drone has no piloting interface of this kind.
    #[error("device {device} has no {kind:?} piloting interface")]
    UnknownInterface {
        /// Device identifier.
        device: DeviceId,
        /// Requested interface.
        kind: InterfaceKind,
    },
}

/// Errors related to persistent storage.
#[derive(Clone, Debug, thiserror::Error)]
pub enum StorageError {
    /// Storage lock was poisoned by a panicking thread.
    #[error("storage lock poisoned")]
    Poisoned,
    /// Stored value can't be interpreted.
    #[error("invalid value for '{key}': {value}")]
    InvalidValue {
        /// Dictionary key.
        key: String,
        /// Raw stored value.
        value: String,
    },
}

/// Errors related to the event executor.
#[derive(Clone, Debug, thiserror::Error)]
pub enum ExecutorError {
    /// Executor is no longer accepting events.
    #[error("executor closed")]
    Closed,
}

impl<T> From<PoisonError<T>> for StorageError {
    fn from(_: PoisonError<T>) -> Self {
        StorageError::Poisoned
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(value: PoisonError<T>) -> Self {
        Error::Storage(value.into())
    }
}
