//! chip - Rust implementation of CHIP device onboarding codecs
//!
//! This library turns device onboarding parameters into the strings printed
//! on a device (QR code, manual pairing code) and back.
//!
//! # Architecture
//!
//! This library is organized as a workspace with multiple crates:
//!
//! - `chip-core`: Error type, Base38 and Verhoeff codecs
//! - `chip-tlv`: TLV reader and writer
//! - `chip-onboarding`: Onboarding payload, QR code and manual code codecs
//!
//! # Implementation Status
//!
//! ## ✅ 已完成
//! - Base38 编码/解码
//! - Verhoeff 校验位
//! - TLV 读写（结构体、数组、列表、元素复制）
//! - 二维码生成/解析（含可选 TLV 数据）
//! - 手动配对码生成/解析（短码、长码）
//!
//! # Usage
//!
//! ```rust
//! use chip::onboarding::{ManualCodeGenerator, QrCodeParser};
//!
//! let payload = QrCodeParser::new("MT:W0GU2OTB00KA0648G00").parse()?;
//! let manual = ManualCodeGenerator::new(&payload).generate()?;
//! assert_eq!(manual, "34970112332");
//! # Ok::<(), chip::ChipError>(())
//! ```

// Re-export core types
pub use chip_core::{ChipError, ChipErrorKind, ChipResult};
pub use chip_core::{base38, verhoeff};

// Re-export TLV codec
pub mod tlv {
    pub use chip_tlv::*;
}

// Re-export onboarding codecs
pub mod onboarding {
    pub use chip_onboarding::*;
}
