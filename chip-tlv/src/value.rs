//! TLV values and elements

use crate::tag::Tag;
use crate::types::{ContainerType, ElementType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value carried by a TLV element
///
/// Container values only mark the start of a container; the members follow
/// as separate elements up to the matching [`Value::EndOfContainer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Signed integer, encoded in 1, 2, 4 or 8 bytes
    Int(i64),
    /// Unsigned integer, encoded in 1, 2, 4 or 8 bytes
    UInt(u64),
    /// UTF-8 string
    Utf8String(String),
    /// Octet string
    ByteString(#[serde(with = "serde_bytes")] Vec<u8>),
    /// Boolean
    Bool(bool),
    /// IEEE 754 single precision
    Float(f32),
    /// IEEE 754 double precision
    Double(f64),
    /// Null
    Null,
    /// Start of a structure
    Structure,
    /// Start of an array
    Array,
    /// Start of a list
    List,
    /// End of the innermost open container
    EndOfContainer,
}

impl Value {
    /// Element type used to encode this value (minimal width)
    pub fn element_type(&self) -> ElementType {
        match self {
            Value::Int(v) => ElementType::for_signed(*v),
            Value::UInt(v) => ElementType::for_unsigned(*v),
            Value::Utf8String(s) => ElementType::for_utf8_string(s.len()),
            Value::ByteString(b) => ElementType::for_byte_string(b.len()),
            Value::Bool(false) => ElementType::False,
            Value::Bool(true) => ElementType::True,
            Value::Float(_) => ElementType::Float,
            Value::Double(_) => ElementType::Double,
            Value::Null => ElementType::Null,
            Value::Structure => ElementType::Structure,
            Value::Array => ElementType::Array,
            Value::List => ElementType::List,
            Value::EndOfContainer => ElementType::EndOfContainer,
        }
    }

    /// Container opened by this value, if any
    pub fn container_type(&self) -> Option<ContainerType> {
        match self {
            Value::Structure => Some(ContainerType::Structure),
            Value::Array => Some(ContainerType::Array),
            Value::List => Some(ContainerType::List),
            _ => None,
        }
    }

    pub fn is_container_start(&self) -> bool {
        self.container_type().is_some()
    }

    pub fn is_end_of_container(&self) -> bool {
        matches!(self, Value::EndOfContainer)
    }

    /// Short name of the value kind, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "Int",
            Value::UInt(_) => "UInt",
            Value::Utf8String(_) => "Utf8String",
            Value::ByteString(_) => "ByteString",
            Value::Bool(_) => "Bool",
            Value::Float(_) => "Float",
            Value::Double(_) => "Double",
            Value::Null => "Null",
            Value::Structure => "Structure",
            Value::Array => "Array",
            Value::List => "List",
            Value::EndOfContainer => "EndOfContainer",
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::UInt(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::UInt(u64::from(value))
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Utf8String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Utf8String(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::ByteString(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::UInt(v) => write!(f, "{}u", v),
            Value::Utf8String(s) => write!(f, "{:?}", s),
            Value::ByteString(b) => {
                write!(f, "hex:")?;
                for byte in b {
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
            Value::Bool(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}f", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Null => write!(f, "null"),
            Value::Structure => write!(f, "{{"),
            Value::Array => write!(f, "["),
            Value::List => write!(f, "[["),
            Value::EndOfContainer => write!(f, "end"),
        }
    }
}

/// A single TLV element: a tag and its value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub tag: Tag,
    pub value: Value,
}

impl Element {
    pub fn new(tag: Tag, value: impl Into<Value>) -> Self {
        Self {
            tag,
            value: value.into(),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.tag, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_type_selection() {
        assert_eq!(Value::Int(-1).element_type(), ElementType::Int8);
        assert_eq!(Value::UInt(1000).element_type(), ElementType::UInt16);
        assert_eq!(Value::Bool(true).element_type(), ElementType::True);
        assert_eq!(Value::from("abc").element_type(), ElementType::Utf8String1);
        assert_eq!(Value::ByteString(vec![0; 256]).element_type(), ElementType::ByteString2);
    }

    #[test]
    fn test_container_values() {
        assert_eq!(Value::List.container_type(), Some(ContainerType::List));
        assert!(Value::Structure.is_container_start());
        assert!(!Value::EndOfContainer.is_container_start());
        assert!(Value::EndOfContainer.is_end_of_container());
    }

    #[test]
    fn test_serde() {
        let element = Element::new(Tag::context(3), vec![1u8, 2, 3]);
        let json = serde_json::to_string(&element).unwrap();
        let back: Element = serde_json::from_str(&json).unwrap();
        assert_eq!(back, element);
    }

    #[test]
    fn test_display() {
        let element = Element::new(Tag::context(1), Value::UInt(42));
        assert_eq!(format!("{}", element), "Context(1) = 42u");
    }
}
