//! TLV tag forms
//!
//! The tag control field (top 3 bits of the control byte) selects both the
//! tag form and the number of tag bytes that follow the control byte:
//!
//! | control | form                       | tag bytes |
//! |---------|----------------------------|-----------|
//! | 000     | anonymous                  | 0         |
//! | 001     | context-specific           | 1         |
//! | 010     | common profile             | 2         |
//! | 011     | common profile             | 4         |
//! | 100     | implicit profile           | 2         |
//! | 101     | implicit profile           | 4         |
//! | 110     | fully qualified            | 6         |
//! | 111     | fully qualified            | 8         |

use crate::types::TAG_CONTROL_MASK;
use bytes::BufMut;
use chip_core::{ChipError, ChipResult};
use serde::{Deserialize, Serialize};
use std::fmt;

const ANONYMOUS: u8 = 0x00;
const CONTEXT_SPECIFIC: u8 = 0x20;
const COMMON_PROFILE_2: u8 = 0x40;
const COMMON_PROFILE_4: u8 = 0x60;
const IMPLICIT_PROFILE_2: u8 = 0x80;
const IMPLICIT_PROFILE_4: u8 = 0xA0;
const FULLY_QUALIFIED_6: u8 = 0xC0;
const FULLY_QUALIFIED_8: u8 = 0xE0;

/// Tag of a TLV element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    /// No tag
    Anonymous,
    /// Tag meaningful only inside the enclosing structure or list
    ContextSpecific { number: u32 },
    /// Tag in the common profile (size 2 or 4)
    CommonProfile { size: u8, number: u32 },
    /// Tag in the profile implied by the context (size 2 or 4)
    ImplicitProfile { size: u8, number: u32 },
    /// Tag qualified with vendor and profile (size 6 or 8)
    FullyQualified {
        size: u8,
        vendor_id: u16,
        profile_number: u16,
        number: u32,
    },
}

impl Tag {
    /// Create a context-specific tag
    pub fn context(number: u8) -> Self {
        Tag::ContextSpecific {
            number: u32::from(number),
        }
    }

    /// Create a common profile tag
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is not 2 or 4, or if `number` does not fit in `size` bytes.
    pub fn common_profile(size: u8, number: u32) -> ChipResult<Self> {
        check_profile_size(size, number, "common profile")?;
        Ok(Tag::CommonProfile { size, number })
    }

    /// Create an implicit profile tag
    pub fn implicit_profile(size: u8, number: u32) -> ChipResult<Self> {
        check_profile_size(size, number, "implicit profile")?;
        Ok(Tag::ImplicitProfile { size, number })
    }

    /// Create a fully qualified tag
    ///
    /// # Errors
    ///
    /// Returns an error if `size` is not 6 or 8, or if a 6-byte tag has a
    /// `number` above `u16::MAX`.
    pub fn fully_qualified(
        size: u8,
        vendor_id: u16,
        profile_number: u16,
        number: u32,
    ) -> ChipResult<Self> {
        match size {
            6 if number > u32::from(u16::MAX) => Err(ChipError::InvalidArgument(format!(
                "Tag number {} does not fit a 6-byte fully qualified tag",
                number
            ))),
            6 | 8 => Ok(Tag::FullyQualified {
                size,
                vendor_id,
                profile_number,
                number,
            }),
            _ => Err(ChipError::InvalidArgument(format!(
                "Invalid fully qualified tag size: {}",
                size
            ))),
        }
    }

    /// Number of tag bytes following the control byte
    pub fn size(&self) -> usize {
        match self {
            Tag::Anonymous => 0,
            Tag::ContextSpecific { .. } => 1,
            Tag::CommonProfile { size, .. }
            | Tag::ImplicitProfile { size, .. }
            | Tag::FullyQualified { size, .. } => usize::from(*size),
        }
    }

    /// Tag control bits, already shifted into the top 3 bits of the control byte
    pub fn control_bits(&self) -> ChipResult<u8> {
        let bits = match self {
            Tag::Anonymous => ANONYMOUS,
            Tag::ContextSpecific { .. } => CONTEXT_SPECIFIC,
            Tag::CommonProfile { size: 2, .. } => COMMON_PROFILE_2,
            Tag::CommonProfile { size: 4, .. } => COMMON_PROFILE_4,
            Tag::ImplicitProfile { size: 2, .. } => IMPLICIT_PROFILE_2,
            Tag::ImplicitProfile { size: 4, .. } => IMPLICIT_PROFILE_4,
            Tag::FullyQualified { size: 6, .. } => FULLY_QUALIFIED_6,
            Tag::FullyQualified { size: 8, .. } => FULLY_QUALIFIED_8,
            other => {
                return Err(ChipError::TlvEncoding(format!(
                    "Invalid tag size in {}",
                    other
                )));
            }
        };
        Ok(bits)
    }

    /// Number of tag bytes announced by a control byte
    pub fn size_from_control(control: u8) -> usize {
        match control & TAG_CONTROL_MASK {
            ANONYMOUS => 0,
            CONTEXT_SPECIFIC => 1,
            COMMON_PROFILE_2 | IMPLICIT_PROFILE_2 => 2,
            COMMON_PROFILE_4 | IMPLICIT_PROFILE_4 => 4,
            FULLY_QUALIFIED_6 => 6,
            _ => 8,
        }
    }

    /// Write the tag bytes (without the control byte)
    ///
    /// # Errors
    ///
    /// Returns `ChipError::TlvEncoding` if a field does not fit the tag size.
    pub fn encode<B: BufMut>(&self, buf: &mut B) -> ChipResult<()> {
        match *self {
            Tag::Anonymous => {}
            Tag::ContextSpecific { number } => {
                let number = u8::try_from(number).map_err(|_| {
                    ChipError::TlvEncoding(format!(
                        "Context-specific tag number {} exceeds 255",
                        number
                    ))
                })?;
                buf.put_u8(number);
            }
            Tag::CommonProfile { size, number } | Tag::ImplicitProfile { size, number } => {
                put_number(buf, size, number)?;
            }
            Tag::FullyQualified {
                size,
                vendor_id,
                profile_number,
                number,
            } => {
                buf.put_u16_le(vendor_id);
                buf.put_u16_le(profile_number);
                put_number(buf, size.saturating_sub(4), number)?;
            }
        }
        Ok(())
    }

    /// Decode the tag announced by `control` from `bytes`
    ///
    /// `bytes` must hold at least `size_from_control(control)` bytes.
    pub fn decode(control: u8, bytes: &[u8]) -> ChipResult<Self> {
        let size = Self::size_from_control(control);
        if bytes.len() < size {
            return Err(ChipError::TlvParsing(format!(
                "Not enough bytes for tag: need {}, have {}",
                size,
                bytes.len()
            )));
        }

        let tag = match control & TAG_CONTROL_MASK {
            ANONYMOUS => Tag::Anonymous,
            CONTEXT_SPECIFIC => Tag::ContextSpecific {
                number: u32::from(bytes[0]),
            },
            COMMON_PROFILE_2 | COMMON_PROFILE_4 => Tag::CommonProfile {
                size: size as u8,
                number: read_number(&bytes[..size]),
            },
            IMPLICIT_PROFILE_2 | IMPLICIT_PROFILE_4 => Tag::ImplicitProfile {
                size: size as u8,
                number: read_number(&bytes[..size]),
            },
            _ => Tag::FullyQualified {
                size: size as u8,
                vendor_id: u16::from_le_bytes([bytes[0], bytes[1]]),
                profile_number: u16::from_le_bytes([bytes[2], bytes[3]]),
                number: read_number(&bytes[4..size]),
            },
        };
        Ok(tag)
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Tag::Anonymous)
    }

    pub fn is_context_specific(&self) -> bool {
        matches!(self, Tag::ContextSpecific { .. })
    }
}

fn check_profile_size(size: u8, number: u32, form: &str) -> ChipResult<()> {
    match size {
        2 if number > u32::from(u16::MAX) => Err(ChipError::InvalidArgument(format!(
            "Tag number {} does not fit a 2-byte {} tag",
            number, form
        ))),
        2 | 4 => Ok(()),
        _ => Err(ChipError::InvalidArgument(format!(
            "Invalid {} tag size: {}",
            form, size
        ))),
    }
}

fn put_number<B: BufMut>(buf: &mut B, width: u8, number: u32) -> ChipResult<()> {
    match width {
        2 => {
            let number = u16::try_from(number).map_err(|_| {
                ChipError::TlvEncoding(format!("Tag number {} does not fit 2 bytes", number))
            })?;
            buf.put_u16_le(number);
        }
        4 => buf.put_u32_le(number),
        _ => {
            return Err(ChipError::TlvEncoding(format!(
                "Invalid tag number width: {}",
                width
            )));
        }
    }
    Ok(())
}

fn read_number(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .enumerate()
        .fold(0u32, |acc, (i, &b)| acc | (u32::from(b) << (8 * i)))
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Anonymous => write!(f, "Anonymous"),
            Tag::ContextSpecific { number } => write!(f, "Context({})", number),
            Tag::CommonProfile { size, number } => {
                write!(f, "CommonProfile{}({})", size, number)
            }
            Tag::ImplicitProfile { size, number } => {
                write!(f, "ImplicitProfile{}({})", size, number)
            }
            Tag::FullyQualified {
                size,
                vendor_id,
                profile_number,
                number,
            } => write!(
                f,
                "FullyQualified{}(0x{:04X}:0x{:04X}:{})",
                size, vendor_id, profile_number, number
            ),
        }
    }
}
