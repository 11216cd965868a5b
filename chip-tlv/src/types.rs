//! TLV element types for CHIP

use chip_core::{ChipError, ChipResult};

/// Mask of the tag control bits in the control byte
pub const TAG_CONTROL_MASK: u8 = 0xE0;

/// Mask of the element type bits in the control byte
pub const ELEMENT_TYPE_MASK: u8 = 0x1F;

/// TLV element type values (low 5 bits of the control byte)
///
/// For variable-width types the two least-significant bits select the
/// encoded width: `00` = 1 byte, `01` = 2, `10` = 4, `11` = 8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Int8 = 0x00,
    Int16 = 0x01,
    Int32 = 0x02,
    Int64 = 0x03,
    UInt8 = 0x04,
    UInt16 = 0x05,
    UInt32 = 0x06,
    UInt64 = 0x07,
    False = 0x08,
    True = 0x09,
    Float = 0x0A,
    Double = 0x0B,
    Utf8String1 = 0x0C,
    Utf8String2 = 0x0D,
    Utf8String4 = 0x0E,
    Utf8String8 = 0x0F,
    ByteString1 = 0x10,
    ByteString2 = 0x11,
    ByteString4 = 0x12,
    ByteString8 = 0x13,
    Null = 0x14,
    Structure = 0x15,
    Array = 0x16,
    List = 0x17,
    EndOfContainer = 0x18,
}

impl ElementType {
    /// Get element type from the low 5 bits of a control byte
    pub fn from_u8(value: u8) -> ChipResult<Self> {
        use ElementType::*;

        match value & ELEMENT_TYPE_MASK {
            0x00 => Ok(Int8),
            0x01 => Ok(Int16),
            0x02 => Ok(Int32),
            0x03 => Ok(Int64),
            0x04 => Ok(UInt8),
            0x05 => Ok(UInt16),
            0x06 => Ok(UInt32),
            0x07 => Ok(UInt64),
            0x08 => Ok(False),
            0x09 => Ok(True),
            0x0A => Ok(Float),
            0x0B => Ok(Double),
            0x0C => Ok(Utf8String1),
            0x0D => Ok(Utf8String2),
            0x0E => Ok(Utf8String4),
            0x0F => Ok(Utf8String8),
            0x10 => Ok(ByteString1),
            0x11 => Ok(ByteString2),
            0x12 => Ok(ByteString4),
            0x13 => Ok(ByteString8),
            0x14 => Ok(Null),
            0x15 => Ok(Structure),
            0x16 => Ok(Array),
            0x17 => Ok(List),
            0x18 => Ok(EndOfContainer),
            other => Err(ChipError::TlvParsing(format!(
                "Reserved TLV element type: 0x{:02X}",
                other
            ))),
        }
    }

    /// Convert element type to u8 value
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    /// Size of the value field for fixed-size types, `None` otherwise
    pub fn value_size(self) -> Option<usize> {
        use ElementType::*;

        match self {
            Int8 | UInt8 => Some(1),
            Int16 | UInt16 => Some(2),
            Int32 | UInt32 | Float => Some(4),
            Int64 | UInt64 | Double => Some(8),
            False | True | Null | Structure | Array | List | EndOfContainer => Some(0),
            _ => None,
        }
    }

    /// Size of the length prefix for string types, `None` otherwise
    pub fn length_field_size(self) -> Option<usize> {
        if self.is_utf8_string() || self.is_byte_string() {
            Some(width_of_class(self.to_u8()))
        } else {
            None
        }
    }

    pub fn is_signed_int(self) -> bool {
        self.to_u8() <= ElementType::Int64.to_u8()
    }

    pub fn is_unsigned_int(self) -> bool {
        (ElementType::UInt8.to_u8()..=ElementType::UInt64.to_u8()).contains(&self.to_u8())
    }

    pub fn is_utf8_string(self) -> bool {
        (ElementType::Utf8String1.to_u8()..=ElementType::Utf8String8.to_u8())
            .contains(&self.to_u8())
    }

    pub fn is_byte_string(self) -> bool {
        (ElementType::ByteString1.to_u8()..=ElementType::ByteString8.to_u8())
            .contains(&self.to_u8())
    }

    /// Smallest signed integer type able to hold `value`
    pub fn for_signed(value: i64) -> Self {
        if i8::try_from(value).is_ok() {
            ElementType::Int8
        } else if i16::try_from(value).is_ok() {
            ElementType::Int16
        } else if i32::try_from(value).is_ok() {
            ElementType::Int32
        } else {
            ElementType::Int64
        }
    }

    /// Smallest unsigned integer type able to hold `value`
    pub fn for_unsigned(value: u64) -> Self {
        Self::with_class(ElementType::UInt8, unsigned_class(value))
    }

    /// UTF-8 string type with the smallest length prefix for `len` bytes
    pub fn for_utf8_string(len: usize) -> Self {
        Self::with_class(ElementType::Utf8String1, unsigned_class(len as u64))
    }

    /// Byte string type with the smallest length prefix for `len` bytes
    pub fn for_byte_string(len: usize) -> Self {
        Self::with_class(ElementType::ByteString1, unsigned_class(len as u64))
    }

    fn with_class(base: ElementType, class: u8) -> Self {
        // base is one of the *1 variants and class is 0..=3, so the sum is a
        // valid code in the same family.
        match Self::from_u8(base.to_u8() + class) {
            Ok(element_type) => element_type,
            Err(_) => base,
        }
    }
}

/// Width in bytes selected by the two low bits of a type code
fn width_of_class(code: u8) -> usize {
    1 << (code & 0x03)
}

/// Length class (0..=3) of the smallest unsigned field holding `value`
fn unsigned_class(value: u64) -> u8 {
    if value <= u64::from(u8::MAX) {
        0
    } else if value <= u64::from(u16::MAX) {
        1
    } else if value <= u64::from(u32::MAX) {
        2
    } else {
        3
    }
}

/// Kind of an open container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerType {
    Structure,
    Array,
    List,
}
