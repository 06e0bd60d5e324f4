use std::fmt::{Display, Formatter};

/// <sup>[`serde`](https://serde.rs)</sup>
/// Kind of a connector.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ConnectorKind {
    /// The device is reached directly from this host.
    Local,
    /// The device is reached through a remote control relaying the connection.
    RemoteControl,
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Technology used by a connector.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Technology {
    /// Wi-Fi.
    Wifi,
    /// USB.
    Usb,
    /// Bluetooth Low Energy.
    Ble,
    /// Relayed by another device.
    Proxy,
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Identity of a reachability path.
///
/// Two providers with the same connector `uid` are considered the same path.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Connector {
    uid: String,
    kind: ConnectorKind,
    technology: Technology,
}

impl Connector {
    /// Local connector with given `uid` and technology.
    pub fn local(uid: impl Into<String>, technology: Technology) -> Self {
        Self {
            uid: uid.into(),
            kind: ConnectorKind::Local,
            technology,
        }
    }

    /// Connector relaying through the remote control with given `uid`.
    pub fn remote_control(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            kind: ConnectorKind::RemoteControl,
            technology: Technology::Proxy,
        }
    }

    /// Connector identifier.
    #[inline(always)]
    pub fn uid(&self) -> &str {
        self.uid.as_str()
    }

    /// Connector kind.
    #[inline(always)]
    pub fn kind(&self) -> ConnectorKind {
        self.kind
    }

    /// Connector technology.
    #[inline(always)]
    pub fn technology(&self) -> Technology {
        self.technology
    }
}

impl Display for Connector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({:?}/{:?})", self.uid, self.kind, self.technology)
    }
}
