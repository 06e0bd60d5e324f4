use std::ops::BitOr;

use crate::core::io::Credentials;

use crate::prelude::*;

/// <sup>[`serde`](https://serde.rs)</sup>
/// Flags of a list item notification.
///
/// ```rust
/// use groundlink::protocol::ListFlags;
///
/// let flags = ListFlags::FIRST | ListFlags::LAST;
/// assert!(flags.contains(ListFlags::FIRST));
/// assert!(!flags.contains(ListFlags::REMOVE));
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ListFlags(u8);

impl ListFlags {
    /// No flag: add or update the item.
    pub const NONE: ListFlags = ListFlags(0);
    /// First item of a new list.
    pub const FIRST: ListFlags = ListFlags(1);
    /// Last item of the list.
    pub const LAST: ListFlags = ListFlags(2);
    /// The list is empty, the item is meaningless.
    pub const EMPTY: ListFlags = ListFlags(4);
    /// Remove the item from the list.
    pub const REMOVE: ListFlags = ListFlags(8);

    /// Creates flags from their bit field.
    pub fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Bit field.
    #[inline(always)]
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// Returns `true` if all flags of `other` are set.
    pub fn contains(&self, other: ListFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ListFlags {
    type Output = ListFlags;

    fn bitor(self, rhs: Self) -> Self::Output {
        ListFlags(self.0 | rhs.0)
    }
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Connection state of the drone a remote control relays.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProxiedLinkState {
    /// No drone is connected.
    Idle,
    /// Looking for a drone.
    Searching,
    /// Connecting a drone.
    Connecting,
    /// A drone is connected.
    Connected,
    /// Disconnecting a drone.
    Disconnecting,
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Messages of the drone manager feature.
///
/// Model identifiers are kept raw since a remote control may report drones this library does
/// not support.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DroneManagerMessage {
    /// Request: connect the drone.
    Connect {
        /// Drone identifier.
        device: DeviceId,
        /// Drone credentials.
        credentials: Option<Credentials>,
    },
    /// Request: forget the drone.
    Forget {
        /// Drone identifier.
        device: DeviceId,
    },
    /// Connection state of the relayed drone.
    ConnectionState {
        /// Link state.
        state: ProxiedLinkState,
        /// Drone identifier.
        device: DeviceId,
        /// Drone model identifier.
        model: u16,
        /// Drone name.
        name: String,
    },
    /// The drone rejected the credentials.
    AuthenticationFailed {
        /// Drone identifier.
        device: DeviceId,
        /// Drone model identifier.
        model: u16,
        /// Drone name.
        name: String,
    },
    /// The drone refused the connection.
    ConnectionRefused {
        /// Drone identifier.
        device: DeviceId,
        /// Drone model identifier.
        model: u16,
        /// Drone name.
        name: String,
    },
    /// Item of the list of drones known by the remote control.
    KnownDroneItem {
        /// Drone identifier.
        device: DeviceId,
        /// Drone model identifier.
        model: u16,
        /// Drone name.
        name: String,
        /// List flags.
        flags: ListFlags,
    },
}
