//! Onboarding payload codecs for CHIP
//!
//! An [`OnboardingPayload`] holds the parameters a commissioner needs to find
//! and authenticate a new device. It can be rendered two ways:
//!
//! - a QR code string, `"MT:"` followed by the Base38 encoding of a packed
//!   bit field and optional TLV data ([`QrCodeGenerator`], [`QrCodeParser`])
//! - a manual pairing code of 11 or 21 decimal digits ending in a Verhoeff
//!   check digit ([`ManualCodeGenerator`], [`ManualCodeParser`])
//!
//! # Usage
//!
//! ```rust
//! use chip_onboarding::{ManualCodeParser, QrCodeParser};
//!
//! let payload = QrCodeParser::new("MT:W0GU2OTB00KA0648G00").parse()?;
//! assert_eq!(payload.vendor_id, 0x235A);
//!
//! let payload = ManualCodeParser::new("34970112332").parse()?;
//! assert_eq!(payload.setup_pin_code, 20202021);
//! # Ok::<(), chip_core::ChipError>(())
//! ```

pub mod constants;
pub mod optional_info;
pub mod payload;
pub mod qr_code;
pub mod manual_code;

pub use chip_core::{ChipError, ChipErrorKind, ChipResult};
pub use manual_code::{ManualCodeGenerator, ManualCodeParser};
pub use optional_info::{OptionalInfoType, OptionalQrCodeInfo, OptionalValue};
pub use payload::{CommissioningFlow, DiscoveryCapability, OnboardingPayload};
pub use qr_code::{QrCodeGenerator, QrCodeParser};
