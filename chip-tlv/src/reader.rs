//! TLV reader for CHIP
//!
//! # Usage Example
//!
//! ```rust
//! use chip_tlv::{Tag, TlvReader};
//!
//! // { 1 = 42u }
//! let bytes = [0x15, 0x24, 0x01, 0x2A, 0x18];
//! let mut reader = TlvReader::new(&bytes);
//! reader.enter_structure(Tag::Anonymous)?;
//! assert_eq!(reader.get_uint(Tag::context(1))?, 42);
//! reader.exit_container()?;
//! assert!(reader.is_end_of_tlv());
//! # Ok::<(), chip_tlv::ChipError>(())
//! ```

use crate::tag::Tag;
use crate::types::ElementType;
use crate::value::{Element, Value};
use chip_core::{ChipError, ChipResult};

/// TLV reader over a byte buffer
///
/// The reader is a cursor: every successful `next_element` (and every typed
/// getter built on it) advances the position past one element. Errors leave
/// the position unchanged, but no recovery is attempted; callers should
/// `reset` or abandon the reader.
pub struct TlvReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> TlvReader<'a> {
    /// Create a new reader
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Decode the next element and advance past it
    pub fn next_element(&mut self) -> ChipResult<Element> {
        let (element, next) = self.decode_element_at(self.position)?;
        log::trace!("TLV element at {}: {}", self.position, element);
        self.position = next;
        Ok(element)
    }

    /// Decode the next element without advancing
    pub fn peek_element(&self) -> ChipResult<Element> {
        self.decode_element_at(self.position).map(|(element, _)| element)
    }

    /// Skip the next element, including all members if it opens a container
    pub fn skip_element(&mut self) -> ChipResult<()> {
        let element = self.next_element()?;
        if element.value.is_container_start() {
            self.exit_container()?;
        }
        Ok(())
    }

    /// Enter a structure with the given tag
    pub fn enter_structure(&mut self, tag: Tag) -> ChipResult<()> {
        self.enter_container(tag, ElementType::Structure)
    }

    /// Enter an array with the given tag
    pub fn enter_array(&mut self, tag: Tag) -> ChipResult<()> {
        self.enter_container(tag, ElementType::Array)
    }

    /// Enter a list with the given tag
    pub fn enter_list(&mut self, tag: Tag) -> ChipResult<()> {
        self.enter_container(tag, ElementType::List)
    }

    fn enter_container(&mut self, tag: Tag, expected: ElementType) -> ChipResult<()> {
        let (element, next) = self.decode_element_at(self.position)?;
        if element.tag != tag || element.value.element_type() != expected {
            return Err(ChipError::TlvParsing(format!(
                "Expected {:?} with tag {} at index {}, found {}",
                expected, tag, self.position, element
            )));
        }
        self.position = next;
        Ok(())
    }

    /// Leave the innermost container
    ///
    /// Scans forward past any unread members (nested containers included)
    /// until the end-of-container marker matching the current depth.
    pub fn exit_container(&mut self) -> ChipResult<()> {
        let mut depth = 1usize;
        while depth > 0 {
            let element = self.next_element()?;
            if element.value.is_end_of_container() {
                depth -= 1;
            } else if element.value.is_container_start() {
                depth += 1;
            }
        }
        Ok(())
    }

    /// Check whether the next element closes the current container
    pub fn is_end_of_container(&self) -> ChipResult<bool> {
        Ok(self.peek_element()?.value.is_end_of_container())
    }

    /// Check whether the whole buffer has been read
    pub fn is_end_of_tlv(&self) -> bool {
        self.position >= self.buffer.len()
    }

    /// Number of bytes read so far
    pub fn length_read(&self) -> usize {
        self.position
    }

    /// Number of bytes left to read
    pub fn remaining_length(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    /// Rewind to the start of the buffer
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Read a signed integer with the given tag
    pub fn get_int(&mut self, tag: Tag) -> ChipResult<i64> {
        match self.next_tagged(tag)? {
            Value::Int(v) => Ok(v),
            other => Err(self.unexpected(&other, "Int")),
        }
    }

    /// Read an unsigned integer with the given tag
    pub fn get_uint(&mut self, tag: Tag) -> ChipResult<u64> {
        match self.next_tagged(tag)? {
            Value::UInt(v) => Ok(v),
            other => Err(self.unexpected(&other, "UInt")),
        }
    }

    pub fn get_i8(&mut self, tag: Tag) -> ChipResult<i8> {
        let value = self.get_int(tag)?;
        narrow(value, "i8")
    }

    pub fn get_i16(&mut self, tag: Tag) -> ChipResult<i16> {
        let value = self.get_int(tag)?;
        narrow(value, "i16")
    }

    pub fn get_i32(&mut self, tag: Tag) -> ChipResult<i32> {
        let value = self.get_int(tag)?;
        narrow(value, "i32")
    }

    pub fn get_u8(&mut self, tag: Tag) -> ChipResult<u8> {
        let value = self.get_uint(tag)?;
        narrow(value, "u8")
    }

    pub fn get_u16(&mut self, tag: Tag) -> ChipResult<u16> {
        let value = self.get_uint(tag)?;
        narrow(value, "u16")
    }

    pub fn get_u32(&mut self, tag: Tag) -> ChipResult<u32> {
        let value = self.get_uint(tag)?;
        narrow(value, "u32")
    }

    /// Read a boolean with the given tag
    pub fn get_bool(&mut self, tag: Tag) -> ChipResult<bool> {
        match self.next_tagged(tag)? {
            Value::Bool(v) => Ok(v),
            other => Err(self.unexpected(&other, "Bool")),
        }
    }

    /// Read a single precision float with the given tag
    pub fn get_float(&mut self, tag: Tag) -> ChipResult<f32> {
        match self.next_tagged(tag)? {
            Value::Float(v) => Ok(v),
            other => Err(self.unexpected(&other, "Float")),
        }
    }

    /// Read a double precision float with the given tag
    pub fn get_double(&mut self, tag: Tag) -> ChipResult<f64> {
        match self.next_tagged(tag)? {
            Value::Double(v) => Ok(v),
            other => Err(self.unexpected(&other, "Double")),
        }
    }

    /// Read a UTF-8 string with the given tag
    pub fn get_utf8_string(&mut self, tag: Tag) -> ChipResult<String> {
        match self.next_tagged(tag)? {
            Value::Utf8String(v) => Ok(v),
            other => Err(self.unexpected(&other, "Utf8String")),
        }
    }

    /// Read an octet string with the given tag
    pub fn get_byte_string(&mut self, tag: Tag) -> ChipResult<Vec<u8>> {
        match self.next_tagged(tag)? {
            Value::ByteString(v) => Ok(v),
            other => Err(self.unexpected(&other, "ByteString")),
        }
    }

    /// Read a null with the given tag
    pub fn get_null(&mut self, tag: Tag) -> ChipResult<()> {
        match self.next_tagged(tag)? {
            Value::Null => Ok(()),
            other => Err(self.unexpected(&other, "Null")),
        }
    }

    /// Decode the next element and check its tag, then advance
    ///
    /// The position only moves when both the tag and (at the call site) the
    /// value kind match, so a failed getter can be retried with another type.
    fn next_tagged(&mut self, tag: Tag) -> ChipResult<Value> {
        let (element, next) = self.decode_element_at(self.position)?;
        if element.tag != tag {
            return Err(ChipError::TlvParsing(format!(
                "Unexpected tag {} at index {} (expected {})",
                element.tag, self.position, tag
            )));
        }
        self.position = next;
        Ok(element.value)
    }

    fn unexpected(&self, value: &Value, expected: &str) -> ChipError {
        ChipError::TlvParsing(format!(
            "Unexpected value {} before index {} (expected {})",
            value.kind_name(),
            self.position,
            expected
        ))
    }

    /// Decode one element starting at `start`
    ///
    /// Returns the element and the position right after it.
    fn decode_element_at(&self, start: usize) -> ChipResult<(Element, usize)> {
        let mut position = start;

        let control = *self.buffer.get(position).ok_or_else(|| {
            ChipError::TlvParsing(format!("Not enough bytes for control byte at index {}", position))
        })?;
        let element_type = ElementType::from_u8(control).map_err(|e| {
            ChipError::TlvParsing(format!(
                "Malformed control byte 0x{:02X} at index {}: {}",
                control,
                position,
                e.message()
            ))
        })?;
        position += 1;

        let tag_size = Tag::size_from_control(control);
        let tag = Tag::decode(control, self.slice_at(position, tag_size, "tag")?)?;
        position += tag_size;

        let value_len = match element_type.length_field_size() {
            Some(length_size) => {
                let raw = self.slice_at(position, length_size, "length")?;
                position += length_size;
                usize::try_from(read_unsigned(raw)).map_err(|_| {
                    ChipError::TlvParsing(format!("Length at index {} is too large", position))
                })?
            }
            None => element_type.value_size().unwrap_or(0),
        };

        let raw = self.slice_at(position, value_len, "value")?;
        position += value_len;

        let value = decode_value(element_type, raw)?;
        Ok((Element { tag, value }, position))
    }

    fn slice_at(&self, position: usize, len: usize, what: &str) -> ChipResult<&'a [u8]> {
        position
            .checked_add(len)
            .and_then(|end| self.buffer.get(position..end))
            .ok_or_else(|| {
                ChipError::TlvParsing(format!(
                    "Not enough bytes for {} at index {}: need {}, have {}",
                    what,
                    position,
                    len,
                    self.buffer.len().saturating_sub(position)
                ))
            })
    }
}

fn decode_value(element_type: ElementType, raw: &[u8]) -> ChipResult<Value> {
    let value = match element_type {
        t if t.is_signed_int() => Value::Int(read_signed(raw)),
        t if t.is_unsigned_int() => Value::UInt(read_unsigned(raw)),
        ElementType::False => Value::Bool(false),
        ElementType::True => Value::Bool(true),
        ElementType::Float => Value::Float(f32::from_bits(read_unsigned(raw) as u32)),
        ElementType::Double => Value::Double(f64::from_bits(read_unsigned(raw))),
        t if t.is_utf8_string() => {
            let s = std::str::from_utf8(raw).map_err(|e| {
                ChipError::TlvParsing(format!("Invalid UTF-8 string: {}", e))
            })?;
            Value::Utf8String(s.to_string())
        }
        t if t.is_byte_string() => Value::ByteString(raw.to_vec()),
        ElementType::Null => Value::Null,
        ElementType::Structure => Value::Structure,
        ElementType::Array => Value::Array,
        ElementType::List => Value::List,
        _ => Value::EndOfContainer,
    };
    Ok(value)
}

/// Little-endian unsigned value of up to 8 bytes
fn read_unsigned(raw: &[u8]) -> u64 {
    raw.iter()
        .rev()
        .fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

/// Little-endian two's complement value of 1, 2, 4 or 8 bytes
fn read_signed(raw: &[u8]) -> i64 {
    let unused = 64 - 8 * raw.len() as u32;
    if unused == 0 {
        read_unsigned(raw) as i64
    } else {
        ((read_unsigned(raw) << unused) as i64) >> unused
    }
}

fn narrow<S, T>(value: S, target: &str) -> ChipResult<T>
where
    S: Copy + std::fmt::Display,
    T: TryFrom<S>,
{
    T::try_from(value).map_err(|_| {
        ChipError::TlvParsing(format!("Value {} is out of range for {}", value, target))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_scalar_elements() {
        // anonymous true, context 1 = -2 (Int8), context 2 = 300u (UInt16)
        let bytes = [0x09, 0x20, 0x01, 0xFE, 0x25, 0x02, 0x2C, 0x01];
        let mut reader = TlvReader::new(&bytes);
        assert!(reader.get_bool(Tag::Anonymous).unwrap());
        assert_eq!(reader.get_int(Tag::context(1)).unwrap(), -2);
        assert_eq!(reader.get_u16(Tag::context(2)).unwrap(), 300);
        assert!(reader.is_end_of_tlv());
        assert_eq!(reader.length_read(), bytes.len());
    }

    #[test]
    fn test_accepts_non_minimal_width() {
        // 1 encoded as an 8-byte signed integer
        let bytes = [0x03, 0x01, 0, 0, 0, 0, 0, 0, 0];
        let mut reader = TlvReader::new(&bytes);
        assert_eq!(reader.get_i8(Tag::Anonymous).unwrap(), 1);
    }

    #[test]
    fn test_negative_widths() {
        let bytes = [0x01, 0x00, 0x80, 0x02, 0xFF, 0xFF, 0xFF, 0xFF];
        let mut reader = TlvReader::new(&bytes);
        assert_eq!(reader.get_int(Tag::Anonymous).unwrap(), -32768);
        assert_eq!(reader.get_int(Tag::Anonymous).unwrap(), -1);
    }

    #[test]
    fn test_read_strings_and_floats() {
        let mut bytes = vec![0x0C, 0x02, b'h', b'i', 0x10, 0x01, 0xAB];
        bytes.push(0x0A);
        bytes.extend_from_slice(&1.5f32.to_le_bytes());
        bytes.push(0x0B);
        bytes.extend_from_slice(&(-2.25f64).to_le_bytes());
        bytes.push(0x14);

        let mut reader = TlvReader::new(&bytes);
        assert_eq!(reader.get_utf8_string(Tag::Anonymous).unwrap(), "hi");
        assert_eq!(reader.get_byte_string(Tag::Anonymous).unwrap(), vec![0xAB]);
        assert_eq!(reader.get_float(Tag::Anonymous).unwrap(), 1.5);
        assert_eq!(reader.get_double(Tag::Anonymous).unwrap(), -2.25);
        reader.get_null(Tag::Anonymous).unwrap();
        assert!(reader.is_end_of_tlv());
    }

    #[test]
    fn test_peek_does_not_advance() {
        let bytes = [0x04, 0x07];
        let mut reader = TlvReader::new(&bytes);
        let peeked = reader.peek_element().unwrap();
        assert_eq!(reader.length_read(), 0);
        assert_eq!(reader.next_element().unwrap(), peeked);
        assert_eq!(reader.remaining_length(), 0);
    }

    #[test]
    fn test_tag_mismatch() {
        let bytes = [0x24, 0x01, 0x07];
        let mut reader = TlvReader::new(&bytes);
        assert!(reader.get_uint(Tag::context(2)).is_err());
        assert_eq!(reader.length_read(), 0);
        assert_eq!(reader.get_uint(Tag::context(1)).unwrap(), 7);
    }

    #[test]
    fn test_type_mismatch() {
        let bytes = [0x04, 0x07];
        let mut reader = TlvReader::new(&bytes);
        let err = reader.get_int(Tag::Anonymous).unwrap_err();
        assert_eq!(err.kind(), chip_core::ChipErrorKind::TlvParsing);
    }

    #[test]
    fn test_narrowing_out_of_range() {
        let bytes = [0x05, 0x00, 0x01];
        let mut reader = TlvReader::new(&bytes);
        assert!(reader.get_u8(Tag::Anonymous).is_err());
    }

    #[test]
    fn test_truncated_input() {
        assert!(TlvReader::new(&[]).next_element().is_err());
        assert!(TlvReader::new(&[0x05, 0x01]).next_element().is_err());
        assert!(TlvReader::new(&[0x0C, 0x05, b'a']).next_element().is_err());
        assert!(TlvReader::new(&[0xE4, 0x00, 0x00]).next_element().is_err());
    }

    #[test]
    fn test_reserved_type_is_error() {
        assert!(TlvReader::new(&[0x19]).next_element().is_err());
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(TlvReader::new(&[0x0C, 0x01, 0xFF]).next_element().is_err());
    }

    #[test]
    fn test_exit_container_skips_unread_members() {
        // { 1 = [ 1, 2 ], 2 = { 3 = null } } true
        let bytes = [
            0x15, 0x36, 0x01, 0x04, 0x01, 0x04, 0x02, 0x18, 0x35, 0x02, 0x34, 0x03, 0x18, 0x18,
            0x09,
        ];
        let mut reader = TlvReader::new(&bytes);
        reader.enter_structure(Tag::Anonymous).unwrap();
        reader.enter_array(Tag::context(1)).unwrap();
        assert_eq!(reader.get_uint(Tag::Anonymous).unwrap(), 1);
        reader.exit_container().unwrap();
        reader.exit_container().unwrap();
        assert!(reader.get_bool(Tag::Anonymous).unwrap());
    }

    #[test]
    fn test_enter_wrong_container() {
        let bytes = [0x17, 0x18];
        let mut reader = TlvReader::new(&bytes);
        assert!(reader.enter_structure(Tag::Anonymous).is_err());
        reader.enter_list(Tag::Anonymous).unwrap();
        assert!(reader.is_end_of_container().unwrap());
    }

    #[test]
    fn test_skip_element_and_reset() {
        let bytes = [0x16, 0x04, 0x01, 0x18, 0x08];
        let mut reader = TlvReader::new(&bytes);
        reader.skip_element().unwrap();
        assert!(!reader.get_bool(Tag::Anonymous).unwrap());
        reader.reset();
        assert_eq!(reader.next_element().unwrap().value, Value::Array);
    }
}
