//! Core types and utilities for CHIP device onboarding
//!
//! This crate provides the shared error type and the two leaf text codecs
//! used by the onboarding payload formats:
//!
//! - [`base38`]: byte <-> text encoding used by QR code payloads
//! - [`verhoeff`]: decimal check digit used by manual pairing codes

pub mod error;
pub mod base38;
pub mod verhoeff;

pub use error::{ChipError, ChipErrorKind, ChipResult};
