//! TLV processing module for CHIP
//!
//! This crate implements the self-describing binary TLV format used inside
//! onboarding payloads and elsewhere in the protocol.
//!
//! # Element Layout
//!
//! ```text
//! [Control byte] [Tag: 0..8 bytes] [Length: 0..8 bytes] [Value]
//! ```
//!
//! The control byte carries the tag form in its top 3 bits and the element
//! type in its low 5 bits. All multi-byte fields are little-endian.
//!
//! - [`TlvWriter`] encodes a sequence of [`Element`]s and enforces container rules
//! - [`TlvReader`] is a cursor that decodes elements back

pub mod tag;
pub mod types;
pub mod value;
pub mod reader;
pub mod writer;

pub use chip_core::{ChipError, ChipResult};
pub use reader::TlvReader;
pub use tag::Tag;
pub use types::{ContainerType, ElementType};
pub use value::{Element, Value};
pub use writer::TlvWriter;
