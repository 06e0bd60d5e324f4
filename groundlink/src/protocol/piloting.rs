/// <sup>[`serde`](https://serde.rs)</sup>
/// Flying state of a drone.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FlyingState {
    /// On the ground, motors stopped.
    Landed,
    /// Taking off.
    TakingOff,
    /// Hovering.
    Hovering,
    /// Flying.
    Flying,
    /// Landing.
    Landing,
    /// Motors cut off.
    Emergency,
    /// Waiting for a user take off.
    UserTakeOff,
    /// Motors ramping.
    MotorRamping,
    /// Emergency landing.
    EmergencyLanding,
}

impl FlyingState {
    /// Whether the drone is considered on the ground.
    pub fn is_landed(&self) -> bool {
        matches!(self, FlyingState::Landed | FlyingState::Emergency)
    }
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Availability of the return home function.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReturnHomeState {
    /// Return home can't be started.
    Unavailable,
    /// Return home can be started.
    Available,
    /// Return home is in progress.
    InProgress,
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Messages of the piloting feature.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PilotingMessage {
    /// Piloting command, sent periodically without acknowledgement.
    Pcmd {
        /// `1` if roll and pitch should be applied.
        flag: u8,
        /// Roll, in percent of the max angle.
        roll: i8,
        /// Pitch, in percent of the max angle.
        pitch: i8,
        /// Yaw, in percent of the max rotation speed.
        yaw: i8,
        /// Gaz, in percent of the max vertical speed.
        gaz: i8,
        /// Sequence number.
        seq: u8,
    },
    /// Flying state changed.
    FlyingStateChanged(FlyingState),
    /// Request: start or stop returning home.
    NavigateHome {
        /// `true` to start.
        start: bool,
    },
    /// Return home availability changed.
    ReturnHomeStateChanged(ReturnHomeState),
}
