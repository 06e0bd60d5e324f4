use crate::protocol::{DroneManagerMessage, PilotingMessage};

/// <sup>[`serde`](https://serde.rs)</sup>
/// Decoded protocol command.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Common feature, used by drones.
    Common(CommonMessage),
    /// Remote control feature.
    SkyController(SkyControllerMessage),
    /// Drone manager feature of remote controls.
    DroneManager(DroneManagerMessage),
    /// Piloting feature of drones.
    Piloting(PilotingMessage),
    /// Any other command, passed through untouched.
    Raw(RawCommand),
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Command not interpreted by groundlink.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawCommand {
    /// Feature identifier.
    pub feature: u8,
    /// Class identifier.
    pub class: u8,
    /// Command identifier.
    pub id: u16,
    /// Encoded arguments.
    pub payload: Vec<u8>,
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Messages of the common feature.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommonMessage {
    /// Request: send all settings.
    AllSettings,
    /// Request: send all states.
    AllStates,
    /// All settings were sent.
    AllSettingsChanged,
    /// All states were sent.
    AllStatesChanged,
    /// Request: set current date and time, in seconds since Unix epoch.
    CurrentDateTime(u64),
    /// Product name.
    ProductName(String),
    /// Product versions.
    ProductVersion {
        /// Software version.
        software: String,
        /// Hardware version.
        hardware: String,
    },
    /// Board identifier.
    BoardId(String),
    /// The device is about to disconnect.
    Disconnection(DisconnectionCause),
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Reason of a device-initiated disconnection.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisconnectionCause {
    /// The power button was pressed.
    OffButton,
    /// Other reason.
    Unknown,
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Messages of the remote control feature.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkyControllerMessage {
    /// Request: send all settings.
    AllSettings,
    /// Request: send all states.
    AllStates,
    /// All settings were sent.
    AllSettingsChanged,
    /// All states were sent.
    AllStatesChanged,
    /// Product versions.
    ProductVersion {
        /// Software version.
        software: String,
        /// Hardware version.
        hardware: String,
    },
    /// The remote control is shutting down.
    Shutdown(ShutdownReason),
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Reason of a remote control shutdown.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShutdownReason {
    /// The power button was pressed.
    PowerOffButton,
    /// Other reason.
    Other,
}
