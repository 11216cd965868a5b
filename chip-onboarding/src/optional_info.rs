//! Optional QR code data
//!
//! Entries carried in the TLV section of a QR code, keyed by a context tag
//! number. Tags below [`VENDOR_TAG_START`] are common (extension) data,
//! tags from it upwards are vendor specific.

use crate::constants::VENDOR_TAG_START;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of an optional data value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionalInfoType {
    String,
    Int32,
    Int64,
    UInt32,
    UInt64,
}

/// Optional data value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OptionalValue {
    String(String),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
}

impl OptionalValue {
    pub fn info_type(&self) -> OptionalInfoType {
        match self {
            OptionalValue::String(_) => OptionalInfoType::String,
            OptionalValue::Int32(_) => OptionalInfoType::Int32,
            OptionalValue::Int64(_) => OptionalInfoType::Int64,
            OptionalValue::UInt32(_) => OptionalInfoType::UInt32,
            OptionalValue::UInt64(_) => OptionalInfoType::UInt64,
        }
    }

    /// Whether this kind of value may be stored under a vendor tag
    pub fn is_vendor_compatible(&self) -> bool {
        matches!(self, OptionalValue::String(_) | OptionalValue::Int32(_))
    }

    /// Same value in the narrowest integer variant that holds it
    ///
    /// QR parsing always yields this form, so 64-bit variants only carry
    /// values outside the 32-bit range.
    pub fn normalized(self) -> Self {
        match self {
            OptionalValue::Int64(v) => match i32::try_from(v) {
                Ok(v) => OptionalValue::Int32(v),
                Err(_) => OptionalValue::Int64(v),
            },
            OptionalValue::UInt64(v) => match u32::try_from(v) {
                Ok(v) => OptionalValue::UInt32(v),
                Err(_) => OptionalValue::UInt64(v),
            },
            other => other,
        }
    }

    pub fn is_normalized(&self) -> bool {
        match self {
            OptionalValue::Int64(v) => i32::try_from(*v).is_err(),
            OptionalValue::UInt64(v) => u32::try_from(*v).is_err(),
            _ => true,
        }
    }
}

impl fmt::Display for OptionalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionalValue::String(s) => write!(f, "{:?}", s),
            OptionalValue::Int32(v) => write!(f, "{}", v),
            OptionalValue::Int64(v) => write!(f, "{}", v),
            OptionalValue::UInt32(v) => write!(f, "{}u", v),
            OptionalValue::UInt64(v) => write!(f, "{}u", v),
        }
    }
}

/// One optional data entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionalQrCodeInfo {
    pub tag: u8,
    pub value: OptionalValue,
}

impl OptionalQrCodeInfo {
    pub fn new(tag: u8, value: OptionalValue) -> Self {
        Self { tag, value }
    }

    pub fn info_type(&self) -> OptionalInfoType {
        self.value.info_type()
    }
}

/// Whether `tag` falls in the common (extension) range
pub fn is_common_tag(tag: u8) -> bool {
    tag < VENDOR_TAG_START
}

/// Whether `tag` falls in the vendor-specific range
pub fn is_vendor_tag(tag: u8) -> bool {
    !is_common_tag(tag)
}
