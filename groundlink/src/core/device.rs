//! Device identity.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::consts::DEFAULT_PRESET_PREFIX;
use crate::errors::DeviceError;

use crate::prelude::*;

/// <sup>[`serde`](https://serde.rs)</sup>
/// Unique device identifier.
///
/// Usually the device serial number as reported by discovery.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct DeviceId(String);

impl DeviceId {
    /// Creates device identifier from its string representation.
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// String representation of this identifier.
    #[inline(always)]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for DeviceId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Supported device models.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub enum DeviceModel {
    /// Anafi 4K drone.
    Anafi4k,
    /// Anafi Thermal drone.
    AnafiThermal,
    /// Anafi UA drone.
    AnafiUa,
    /// Anafi USA drone.
    AnafiUsa,
    /// SkyController 3 remote control.
    SkyController3,
    /// SkyController UA remote control.
    SkyControllerUa,
}

impl DeviceModel {
    /// Numeric model identifier used on the wire and in persistent storage.
    pub fn id(&self) -> u16 {
        match self {
            DeviceModel::Anafi4k => 0x0914,
            DeviceModel::AnafiThermal => 0x0919,
            DeviceModel::AnafiUa => 0x091b,
            DeviceModel::AnafiUsa => 0x091e,
            DeviceModel::SkyController3 => 0x0918,
            DeviceModel::SkyControllerUa => 0x091c,
        }
    }

    /// Resolves model from its numeric identifier.
    pub fn from_id(id: u16) -> Result<Self> {
        Ok(match id {
            0x0914 => DeviceModel::Anafi4k,
            0x0919 => DeviceModel::AnafiThermal,
            0x091b => DeviceModel::AnafiUa,
            0x091e => DeviceModel::AnafiUsa,
            0x0918 => DeviceModel::SkyController3,
            0x091c => DeviceModel::SkyControllerUa,
            unknown => return Err(DeviceError::UnknownModel(unknown).into()),
        })
    }

    /// Returns `true` for drone models, `false` for remote controls.
    pub fn is_drone(&self) -> bool {
        !matches!(
            self,
            DeviceModel::SkyController3 | DeviceModel::SkyControllerUa
        )
    }

    /// Key of the preset dictionary used when the device does not define one.
    pub fn default_preset_key(&self) -> String {
        format!("{DEFAULT_PRESET_PREFIX}-{:04x}", self.id())
    }

    /// Name displayed until the device reports its own.
    pub fn default_name(&self) -> &'static str {
        match self {
            DeviceModel::Anafi4k => "ANAFI 4K",
            DeviceModel::AnafiThermal => "ANAFI Thermal",
            DeviceModel::AnafiUa => "ANAFI UA",
            DeviceModel::AnafiUsa => "ANAFI USA",
            DeviceModel::SkyController3 => "Skycontroller 3",
            DeviceModel::SkyControllerUa => "Skycontroller UA",
        }
    }
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Firmware build type, ordered from least to most stable.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildType {
    /// Development build (`0.0.0`).
    Dev,
    /// Alpha build.
    Alpha(u32),
    /// Beta build.
    Beta(u32),
    /// Release candidate.
    Rc(u32),
    /// Release build.
    Release,
}

/// <sup>[`serde`](https://serde.rs)</sup>
/// Device firmware version.
///
/// Parsed from strings like `1.6.0`, `1.6.1-beta2` or `7.2.0-rc3`.
///
/// ```rust
/// use groundlink::core::device::FirmwareVersion;
///
/// let release: FirmwareVersion = "1.6.0".parse().unwrap();
/// let beta: FirmwareVersion = "1.6.0-beta2".parse().unwrap();
/// assert!(beta < release);
/// assert_eq!(release.to_string(), "1.6.0");
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Copy, Clone, Debug, Hash, PartialEq, Eq)]
pub struct FirmwareVersion {
    major: u32,
    minor: u32,
    patch: u32,
    build: BuildType,
}

impl FirmwareVersion {
    /// Creates firmware version from its components.
    pub fn new(major: u32, minor: u32, patch: u32, build: BuildType) -> Self {
        Self {
            major,
            minor,
            patch,
            build,
        }
    }

    /// Major version.
    #[inline(always)]
    pub fn major(&self) -> u32 {
        self.major
    }

    /// Minor version.
    #[inline(always)]
    pub fn minor(&self) -> u32 {
        self.minor
    }

    /// Patch version.
    #[inline(always)]
    pub fn patch(&self) -> u32 {
        self.patch
    }

    /// Build type.
    #[inline(always)]
    pub fn build(&self) -> BuildType {
        self.build
    }
}

impl PartialOrd for FirmwareVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FirmwareVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch, self.build).cmp(&(
            other.major,
            other.minor,
            other.patch,
            other.build,
        ))
    }
}

impl FromStr for FirmwareVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidFirmwareVersion(s.to_string());

        let (numbers, suffix) = match s.trim().split_once('-') {
            Some((numbers, suffix)) => (numbers, Some(suffix)),
            None => (s.trim(), None),
        };

        let mut parts = numbers.split('.').map(|part| part.parse::<u32>());
        let (major, minor, patch) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(Ok(major)), Some(Ok(minor)), Some(Ok(patch)), None) => (major, minor, patch),
            _ => return Err(invalid()),
        };

        let build = match suffix {
            None if (major, minor, patch) == (0, 0, 0) => BuildType::Dev,
            None => BuildType::Release,
            Some(suffix) => {
                let split_at = suffix
                    .find(|c: char| c.is_ascii_digit())
                    .ok_or_else(invalid)?;
                let number = suffix[split_at..].parse::<u32>().map_err(|_| invalid())?;
                match &suffix[..split_at] {
                    "alpha" => BuildType::Alpha(number),
                    "beta" => BuildType::Beta(number),
                    "rc" => BuildType::Rc(number),
                    _ => return Err(invalid()),
                }
            }
        };

        Ok(Self::new(major, minor, patch, build))
    }
}

impl Display for FirmwareVersion {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        match self.build {
            BuildType::Dev | BuildType::Release => Ok(()),
            BuildType::Alpha(n) => write!(f, "-alpha{n}"),
            BuildType::Beta(n) => write!(f, "-beta{n}"),
            BuildType::Rc(n) => write!(f, "-rc{n}"),
        }
    }
}

/// Identity of a device as known by its controller.
///
/// The identifier and model never change. Everything else is learned from the device and
/// persisted in its dictionary.
#[derive(Clone, Debug)]
pub struct DeviceIdentity {
    pub(crate) id: DeviceId,
    pub(crate) model: DeviceModel,
    pub(crate) name: String,
    pub(crate) firmware_version: Option<FirmwareVersion>,
    pub(crate) board_id: Option<String>,
    pub(crate) persisted: bool,
}

impl DeviceIdentity {
    /// Creates identity of a device which was never persisted.
    pub fn new(id: DeviceId, model: DeviceModel, name: impl Into<String>) -> Self {
        Self {
            id,
            model,
            name: name.into(),
            firmware_version: None,
            board_id: None,
            persisted: false,
        }
    }

    /// Device identifier.
    #[inline(always)]
    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    /// Device model.
    #[inline(always)]
    pub fn model(&self) -> DeviceModel {
        self.model
    }

    /// Display name.
    #[inline(always)]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Firmware version, if known.
    #[inline(always)]
    pub fn firmware_version(&self) -> Option<FirmwareVersion> {
        self.firmware_version
    }

    /// Board identifier.
    ///
    /// Becomes an empty string once the device completed a handshake without reporting one.
    pub fn board_id(&self) -> Option<&str> {
        self.board_id.as_deref()
    }

    /// Whether the device is persisted in storage.
    #[inline(always)]
    pub fn is_persisted(&self) -> bool {
        self.persisted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_ids_round_trip() {
        for model in [
            DeviceModel::Anafi4k,
            DeviceModel::AnafiThermal,
            DeviceModel::AnafiUa,
            DeviceModel::AnafiUsa,
            DeviceModel::SkyController3,
            DeviceModel::SkyControllerUa,
        ] {
            assert_eq!(DeviceModel::from_id(model.id()).unwrap(), model);
        }

        assert!(matches!(
            DeviceModel::from_id(0x0001),
            Err(Error::Device(DeviceError::UnknownModel(0x0001)))
        ));
        assert!(DeviceModel::Anafi4k.is_drone());
        assert!(!DeviceModel::SkyController3.is_drone());
    }

    #[test]
    fn firmware_versions() {
        let dev: FirmwareVersion = "0.0.0".parse().unwrap();
        let alpha: FirmwareVersion = "1.2.0-alpha1".parse().unwrap();
        let rc: FirmwareVersion = "1.2.0-rc2".parse().unwrap();
        let release: FirmwareVersion = "1.2.0".parse().unwrap();
        let next: FirmwareVersion = "1.2.1".parse().unwrap();

        assert_eq!(dev.build(), BuildType::Dev);
        assert_eq!(rc.build(), BuildType::Rc(2));
        assert!(dev < alpha && alpha < rc && rc < release && release < next);
        assert_eq!(rc.to_string(), "1.2.0-rc2");

        for invalid in ["", "1.2", "1.2.3.4", "1.2.x", "1.2.3-gamma1", "1.2.3-rc"] {
            assert!(invalid.parse::<FirmwareVersion>().is_err(), "{invalid}");
        }
    }
}
