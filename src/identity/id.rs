//! The 128-bit device identifier.

use super::IdentityError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier length in bytes.
pub const ID_LEN: usize = 16;

/// Opaque 128-bit device identifier.
///
/// No internal structure is imposed; the bytes are persisted verbatim.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct DeviceIdentifier([u8; ID_LEN]);

impl DeviceIdentifier {
    pub const fn new(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }

    /// All-zero placeholder used while no identifier is loaded.
    pub const fn zeroed() -> Self {
        Self([0u8; ID_LEN])
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; ID_LEN] {
        &self.0
    }

    #[inline]
    pub fn to_bytes(self) -> [u8; ID_LEN] {
        self.0
    }
}

impl From<[u8; ID_LEN]> for DeviceIdentifier {
    fn from(bytes: [u8; ID_LEN]) -> Self {
        Self(bytes)
    }
}

/// Accepts exactly [`ID_LEN`] bytes; any other length is a corrupt record.
impl TryFrom<&[u8]> for DeviceIdentifier {
    type Error = IdentityError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        <[u8; ID_LEN]>::try_from(bytes)
            .map(Self)
            .map_err(|_| IdentityError::CorruptOrShortRead { len: bytes.len() })
    }
}

impl AsRef<[u8]> for DeviceIdentifier {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::LowerHex for DeviceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{b:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Display for DeviceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(self, f)
    }
}

impl fmt::Debug for DeviceIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceIdentifier({self:x})")
    }
}
