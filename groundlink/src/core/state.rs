//! Connection phases and observable device states.

/// <sup>[`serde`](https://serde.rs)</sup>
/// Internal connection phase of a device controller.
///
/// Phases advance in order `Disconnected → LinkConnecting → HandshakeProxySetup →
/// HandshakeSettings → HandshakeStates → Connected → Disconnecting → Disconnected`. Teardown may
/// start from any phase.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionPhase {
    /// No link.
    #[default]
    Disconnected,
    /// Transport-level connection in progress.
    LinkConnecting,
    /// Link is up, auxiliary proxy channel is being opened.
    HandshakeProxySetup,
    /// Waiting for all settings to be received.
    HandshakeSettings,
    /// Waiting for all states to be received.
    HandshakeStates,
    /// Device is fully usable.
    Connected,
    /// Transport-level disconnection in progress.
    Disconnecting,
}

impl ConnectionPhase {
    /// Whether the phase is one of the handshake steps.
    pub fn is_handshake(&self) -> bool {
        matches!(
            self,
            ConnectionPhase::HandshakeProxySetup
                | ConnectionPhase::HandshakeSettings
                | ConnectionPhase::HandshakeStates
        )
    }
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Lifecycle of a device controller.
///
/// `Active` if and only if the connection phase is not [`ConnectionPhase::Disconnected`].
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ControllerLifecycle {
    /// Controller is disposed and can't be used anymore.
    #[default]
    Stopped,
    /// Controller is running, device is disconnected.
    Idle,
    /// Controller is running, device is connecting, connected or disconnecting.
    Active,
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Connection state of a device as exposed to observers.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Device is not connected.
    #[default]
    Disconnected,
    /// Device is connecting.
    Connecting,
    /// Device is connected.
    Connected,
    /// Device is disconnecting.
    Disconnecting,
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Reason of the latest connection state change.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ConnectionCause {
    /// No particular reason.
    #[default]
    None,
    /// Requested by the application.
    UserRequested,
    /// The link was lost or the provider disappeared.
    ConnectionLost,
    /// The handshake did not complete in time.
    Timeout,
    /// The device rejected the provided credentials.
    BadPassword,
}

impl From<ConnectionPhase> for ConnectionState {
    fn from(value: ConnectionPhase) -> Self {
        match value {
            ConnectionPhase::Disconnected => ConnectionState::Disconnected,
            ConnectionPhase::Connected => ConnectionState::Connected,
            ConnectionPhase::Disconnecting => ConnectionState::Disconnecting,
            _ => ConnectionState::Connecting,
        }
    }
}
