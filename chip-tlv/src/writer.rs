//! TLV writer for CHIP
//!
//! The writer keeps a stack of open containers and checks every tag against
//! the innermost one before anything is written:
//!
//! - context-specific tags only inside a structure or a list
//! - array members are anonymous
//! - structure members are not anonymous (the end-of-container marker excepted)
//! - context-specific tag numbers fit in one byte

use crate::reader::TlvReader;
use crate::tag::Tag;
use crate::types::ContainerType;
use crate::value::Value;
use bytes::{BufMut, Bytes, BytesMut};
use chip_core::{ChipError, ChipResult};

/// TLV writer for encoding a sequence of elements
pub struct TlvWriter {
    buffer: BytesMut,
    containers: Vec<ContainerType>,
}

impl TlvWriter {
    /// Create a new writer
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
            containers: Vec::new(),
        }
    }

    /// Create a new writer with initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            containers: Vec::new(),
        }
    }

    /// Encode one element
    ///
    /// Container start values push a container; [`Value::EndOfContainer`]
    /// pops the innermost one. Prefer the `start_*`/`end_*` helpers, which
    /// also check the container kind on close.
    ///
    /// # Errors
    ///
    /// Returns `ChipError::TlvEncoding` if the tag is not allowed in the
    /// current container, or if an end-of-container marker is written with
    /// no open container. Nothing is written on error.
    pub fn put(&mut self, tag: Tag, value: Value) -> ChipResult<()> {
        self.validate_tag(&tag, &value)?;

        let control = tag.control_bits()? | value.element_type().to_u8();
        let mut encoded = BytesMut::with_capacity(1 + tag.size() + 9);
        encoded.put_u8(control);
        tag.encode(&mut encoded)?;
        encode_value(&mut encoded, &value);

        if let Some(container) = value.container_type() {
            self.containers.push(container);
        } else if value.is_end_of_container() {
            self.containers.pop();
        }
        self.buffer.extend_from_slice(&encoded);
        Ok(())
    }

    fn validate_tag(&self, tag: &Tag, value: &Value) -> ChipResult<()> {
        if let Tag::ContextSpecific { number } = tag {
            if *number > u32::from(u8::MAX) {
                return Err(ChipError::TlvEncoding(format!(
                    "Invalid context-specific tag number {} at index {}: must fit in one byte",
                    number,
                    self.buffer.len()
                )));
            }
        }

        if value.is_end_of_container() {
            if self.containers.is_empty() {
                return Err(ChipError::TlvEncoding(format!(
                    "End of container at index {} with no open container",
                    self.buffer.len()
                )));
            }
            if !tag.is_anonymous() {
                return Err(ChipError::TlvEncoding(format!(
                    "End of container at index {} must be anonymous, found {}",
                    self.buffer.len(),
                    tag
                )));
            }
            return Ok(());
        }

        match self.containers.last() {
            None if tag.is_context_specific() => Err(ChipError::TlvEncoding(format!(
                "Invalid use of context tag {} at index {}: can only be used within a structure or a list",
                tag,
                self.buffer.len()
            ))),
            Some(ContainerType::Array) if !tag.is_anonymous() => {
                Err(ChipError::TlvEncoding(format!(
                    "Invalid element tag {} at index {}: elements of an array must be anonymous",
                    tag,
                    self.buffer.len()
                )))
            }
            Some(ContainerType::Structure) if tag.is_anonymous() => {
                Err(ChipError::TlvEncoding(format!(
                    "Invalid element tag at index {}: elements of a structure cannot be anonymous",
                    self.buffer.len()
                )))
            }
            _ => Ok(()),
        }
    }

    pub fn put_int(&mut self, tag: Tag, value: i64) -> ChipResult<()> {
        self.put(tag, Value::Int(value))
    }

    pub fn put_uint(&mut self, tag: Tag, value: u64) -> ChipResult<()> {
        self.put(tag, Value::UInt(value))
    }

    pub fn put_bool(&mut self, tag: Tag, value: bool) -> ChipResult<()> {
        self.put(tag, Value::Bool(value))
    }

    pub fn put_float(&mut self, tag: Tag, value: f32) -> ChipResult<()> {
        self.put(tag, Value::Float(value))
    }

    pub fn put_double(&mut self, tag: Tag, value: f64) -> ChipResult<()> {
        self.put(tag, Value::Double(value))
    }

    pub fn put_string(&mut self, tag: Tag, value: &str) -> ChipResult<()> {
        self.put(tag, Value::Utf8String(value.to_string()))
    }

    pub fn put_bytes(&mut self, tag: Tag, value: &[u8]) -> ChipResult<()> {
        self.put(tag, Value::ByteString(value.to_vec()))
    }

    pub fn put_null(&mut self, tag: Tag) -> ChipResult<()> {
        self.put(tag, Value::Null)
    }

    /// Open a structure
    pub fn start_structure(&mut self, tag: Tag) -> ChipResult<()> {
        self.put(tag, Value::Structure)
    }

    /// Open an array
    pub fn start_array(&mut self, tag: Tag) -> ChipResult<()> {
        self.put(tag, Value::Array)
    }

    /// Open a list
    pub fn start_list(&mut self, tag: Tag) -> ChipResult<()> {
        self.put(tag, Value::List)
    }

    /// Close the innermost container, which must be a structure
    pub fn end_structure(&mut self) -> ChipResult<()> {
        self.end_container(ContainerType::Structure)
    }

    /// Close the innermost container, which must be an array
    pub fn end_array(&mut self) -> ChipResult<()> {
        self.end_container(ContainerType::Array)
    }

    /// Close the innermost container, which must be a list
    pub fn end_list(&mut self) -> ChipResult<()> {
        self.end_container(ContainerType::List)
    }

    fn end_container(&mut self, expected: ContainerType) -> ChipResult<()> {
        match self.containers.last().copied() {
            Some(open) if open == expected => self.put(Tag::Anonymous, Value::EndOfContainer),
            Some(open) => Err(ChipError::TlvEncoding(format!(
                "Cannot close {:?} at index {}: innermost open container is {:?}",
                expected,
                self.buffer.len(),
                open
            ))),
            None => Err(ChipError::TlvEncoding(format!(
                "Cannot close {:?} at index {}: no open container",
                expected,
                self.buffer.len()
            ))),
        }
    }

    /// Copy the next element of `reader`, with all members if it is a container
    pub fn copy_element(&mut self, reader: &mut TlvReader<'_>) -> ChipResult<()> {
        self.copy_element_impl(None, reader)
    }

    /// Copy the next element of `reader` under a new tag
    ///
    /// Only the outermost element is re-tagged; members keep their tags.
    pub fn copy_element_with_tag(&mut self, tag: Tag, reader: &mut TlvReader<'_>) -> ChipResult<()> {
        self.copy_element_impl(Some(tag), reader)
    }

    fn copy_element_impl(&mut self, tag: Option<Tag>, reader: &mut TlvReader<'_>) -> ChipResult<()> {
        let first = reader.next_element()?;
        if first.value.is_end_of_container() {
            return Err(ChipError::TlvEncoding(format!(
                "Cannot copy an end-of-container marker (reader index {})",
                reader.length_read()
            )));
        }

        let is_container = first.value.is_container_start();
        self.put(tag.unwrap_or(first.tag), first.value)?;

        if is_container {
            let mut depth = 1usize;
            while depth > 0 {
                let element = reader.next_element()?;
                if element.value.is_end_of_container() {
                    depth -= 1;
                } else if element.value.is_container_start() {
                    depth += 1;
                }
                self.put(element.tag, element.value)?;
            }
        }
        Ok(())
    }

    /// Check that every container has been closed
    pub fn validate_tlv(&self) -> ChipResult<()> {
        if self.containers.is_empty() {
            Ok(())
        } else {
            Err(ChipError::TlvEncoding(format!(
                "{} container(s) left open: {:?}",
                self.containers.len(),
                self.containers
            )))
        }
    }

    /// Current container nesting depth
    pub fn depth(&self) -> usize {
        self.containers.len()
    }

    /// Number of bytes written so far
    pub fn length_written(&self) -> usize {
        self.buffer.len()
    }

    /// Get a reference to the encoded bytes
    pub fn encoded(&self) -> &[u8] {
        &self.buffer
    }

    /// Get the encoded bytes
    pub fn into_bytes(self) -> Bytes {
        self.buffer.freeze()
    }

    /// Clear the buffer and the container stack
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.containers.clear();
    }
}

impl Default for TlvWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Write the length (if any) and value bytes of `value`
fn encode_value(buf: &mut BytesMut, value: &Value) {
    match value {
        Value::Int(v) => {
            let width = value.element_type().value_size().unwrap_or(8);
            buf.put_slice(&v.to_le_bytes()[..width]);
        }
        Value::UInt(v) => {
            let width = value.element_type().value_size().unwrap_or(8);
            buf.put_slice(&v.to_le_bytes()[..width]);
        }
        Value::Utf8String(s) => {
            put_length(buf, value, s.len());
            buf.put_slice(s.as_bytes());
        }
        Value::ByteString(b) => {
            put_length(buf, value, b.len());
            buf.put_slice(b);
        }
        Value::Float(v) => buf.put_f32_le(*v),
        Value::Double(v) => buf.put_f64_le(*v),
        Value::Bool(_)
        | Value::Null
        | Value::Structure
        | Value::Array
        | Value::List
        | Value::EndOfContainer => {}
    }
}

fn put_length(buf: &mut BytesMut, value: &Value, len: usize) {
    let width = value.element_type().length_field_size().unwrap_or(8);
    buf.put_slice(&(len as u64).to_le_bytes()[..width]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Element;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_minimal_width_integers() {
        let mut writer = TlvWriter::new();
        writer.put_int(Tag::Anonymous, 42).unwrap();
        writer.put_int(Tag::Anonymous, -129).unwrap();
        writer.put_uint(Tag::Anonymous, 0x1_0000).unwrap();
        assert_eq!(
            writer.encoded(),
            &[0x00, 0x2A, 0x01, 0x7F, 0xFF, 0x06, 0x00, 0x00, 0x01, 0x00]
        );
    }

    #[test]
    fn test_encode_structure() {
        let mut writer = TlvWriter::new();
        writer.start_structure(Tag::Anonymous).unwrap();
        writer.put_uint(Tag::context(1), 42).unwrap();
        writer.put_string(Tag::context(2), "ab").unwrap();
        writer.put_bool(Tag::context(3), false).unwrap();
        writer.end_structure().unwrap();
        writer.validate_tlv().unwrap();
        assert_eq!(
            writer.encoded(),
            &[0x15, 0x24, 0x01, 0x2A, 0x2C, 0x02, 0x02, b'a', b'b', 0x28, 0x03, 0x18]
        );
    }

    #[test]
    fn test_profile_tags() {
        let mut writer = TlvWriter::new();
        let tag = Tag::common_profile(2, 0x1234).unwrap();
        writer.put_null(tag).unwrap();
        let tag = Tag::fully_qualified(8, 0xFFF1, 0x0001, 0xAABBCCDD).unwrap();
        writer.put_uint(tag, 5).unwrap();
        assert_eq!(
            writer.encoded(),
            &[
                0x54, 0x34, 0x12, 0xE4, 0xF1, 0xFF, 0x01, 0x00, 0xDD, 0xCC, 0xBB, 0xAA, 0x05
            ]
        );
    }

    #[test]
    fn test_context_tag_at_top_level() {
        let mut writer = TlvWriter::new();
        assert!(writer.put_uint(Tag::context(1), 1).is_err());
        assert_eq!(writer.length_written(), 0);
    }

    #[test]
    fn test_context_tag_in_array() {
        let mut writer = TlvWriter::new();
        writer.start_array(Tag::Anonymous).unwrap();
        assert!(writer.put_uint(Tag::context(1), 1).is_err());
        writer.put_uint(Tag::Anonymous, 1).unwrap();
        writer.end_array().unwrap();
    }

    #[test]
    fn test_anonymous_tag_in_structure() {
        let mut writer = TlvWriter::new();
        writer.start_structure(Tag::Anonymous).unwrap();
        assert!(writer.put_uint(Tag::Anonymous, 1).is_err());
        writer.end_structure().unwrap();
    }

    #[test]
    fn test_list_accepts_any_tag() {
        let mut writer = TlvWriter::new();
        writer.start_list(Tag::Anonymous).unwrap();
        writer.put_uint(Tag::Anonymous, 1).unwrap();
        writer.put_uint(Tag::context(1), 1).unwrap();
        writer.end_list().unwrap();
        writer.validate_tlv().unwrap();
    }

    #[test]
    fn test_context_number_out_of_range() {
        let mut writer = TlvWriter::new();
        writer.start_structure(Tag::Anonymous).unwrap();
        let tag = Tag::ContextSpecific { number: 256 };
        assert!(writer.put_uint(tag, 1).is_err());
    }

    #[test]
    fn test_mismatched_close() {
        let mut writer = TlvWriter::new();
        writer.start_structure(Tag::Anonymous).unwrap();
        writer.start_array(Tag::context(1)).unwrap();
        assert!(writer.end_structure().is_err());
        writer.end_array().unwrap();
        assert!(writer.end_list().is_err());
        writer.end_structure().unwrap();
        assert!(writer.end_structure().is_err());
    }

    #[test]
    fn test_validate_unclosed() {
        let mut writer = TlvWriter::new();
        writer.start_list(Tag::Anonymous).unwrap();
        assert!(writer.validate_tlv().is_err());
        assert_eq!(writer.depth(), 1);
        writer.reset();
        writer.validate_tlv().unwrap();
        assert_eq!(writer.length_written(), 0);
    }

    #[test]
    fn test_copy_element_with_new_tag() {
        let mut source = TlvWriter::new();
        source.start_structure(Tag::Anonymous).unwrap();
        source.start_array(Tag::context(1)).unwrap();
        source.put_int(Tag::Anonymous, -5).unwrap();
        source.end_array().unwrap();
        source.put_string(Tag::context(2), "x").unwrap();
        source.end_structure().unwrap();
        let source = source.into_bytes();

        let mut reader = TlvReader::new(&source);
        reader.enter_structure(Tag::Anonymous).unwrap();

        let mut writer = TlvWriter::new();
        writer.start_structure(Tag::Anonymous).unwrap();
        writer.copy_element_with_tag(Tag::context(7), &mut reader).unwrap();
        writer.copy_element(&mut reader).unwrap();
        writer.end_structure().unwrap();
        writer.validate_tlv().unwrap();

        let encoded = writer.into_bytes();
        let mut check = TlvReader::new(&encoded);
        check.enter_structure(Tag::Anonymous).unwrap();
        check.enter_array(Tag::context(7)).unwrap();
        assert_eq!(check.get_int(Tag::Anonymous).unwrap(), -5);
        check.exit_container().unwrap();
        assert_eq!(check.get_utf8_string(Tag::context(2)).unwrap(), "x");
        check.exit_container().unwrap();
        assert!(check.is_end_of_tlv());
    }

    fn random_scalar(rng: &mut StdRng) -> Value {
        match rng.gen_range(0..8) {
            0 => Value::Int(rng.r#gen::<i64>() >> rng.gen_range(0..63)),
            1 => Value::UInt(rng.r#gen::<u64>() >> rng.gen_range(0..63)),
            2 => Value::Bool(rng.r#gen()),
            3 => Value::Float(rng.r#gen()),
            4 => Value::Double(rng.r#gen()),
            5 => Value::Null,
            6 => Value::Utf8String("x".repeat(rng.gen_range(0..300))),
            _ => Value::ByteString((0..rng.gen_range(0..300)).map(|_| rng.r#gen()).collect()),
        }
    }

    #[test]
    fn test_random_round_trip() {
        let mut rng = StdRng::seed_from_u64(0x7E57);
        for _ in 0..50 {
            let mut expected = Vec::new();
            let mut writer = TlvWriter::new();

            writer.start_structure(Tag::Anonymous).unwrap();
            expected.push(Element::new(Tag::Anonymous, Value::Structure));
            for i in 0..rng.gen_range(0..10u8) {
                let value = random_scalar(&mut rng);
                writer.put(Tag::context(i), value.clone()).unwrap();
                expected.push(Element::new(Tag::context(i), value));
            }
            writer.start_array(Tag::context(200)).unwrap();
            expected.push(Element::new(Tag::context(200), Value::Array));
            for _ in 0..rng.gen_range(0..5) {
                let value = random_scalar(&mut rng);
                writer.put(Tag::Anonymous, value.clone()).unwrap();
                expected.push(Element::new(Tag::Anonymous, value));
            }
            writer.end_array().unwrap();
            writer.end_structure().unwrap();
            expected.push(Element::new(Tag::Anonymous, Value::EndOfContainer));
            expected.push(Element::new(Tag::Anonymous, Value::EndOfContainer));

            let bytes = writer.into_bytes();
            let mut reader = TlvReader::new(&bytes);
            let mut decoded = Vec::new();
            while !reader.is_end_of_tlv() {
                decoded.push(reader.next_element().unwrap());
            }
            assert_eq!(decoded, expected);
        }
    }
}
