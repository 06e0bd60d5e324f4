//! Common constants.

use std::time::Duration;

/// Maximum time a device may spend in any handshake step before the link is torn down.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(20);

/// Device-side port of the auxiliary proxy channel opened once the link is up.
pub const DEFAULT_PROXY_PORT: u16 = 80;

/// Period of the unacknowledged piloting command loop for drones.
pub const PILOTING_LOOP_PERIOD: Duration = Duration::from_millis(50);

/// Device dictionary key: display name.
pub const KEY_DEVICE_NAME: &str = "name";
/// Device dictionary key: numeric model identifier.
pub const KEY_DEVICE_MODEL: &str = "model";
/// Device dictionary key: firmware version string.
pub const KEY_DEVICE_FIRMWARE_VERSION: &str = "firmwareVersion";
/// Device dictionary key: board identifier.
pub const KEY_DEVICE_BOARD_ID: &str = "boardId";
/// Device dictionary key: preset dictionary in use.
pub const KEY_DEVICE_PRESET_KEY: &str = "preset";

/// Prefix of the preset dictionary a model falls back to.
pub const DEFAULT_PRESET_PREFIX: &str = "default";
