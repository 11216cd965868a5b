//! Manual pairing code parsing

use crate::constants::*;
use crate::payload::{CommissioningFlow, OnboardingPayload};
use chip_core::{ChipError, ChipResult, verhoeff};
use std::collections::{BTreeMap, BTreeSet};

/// Parses an 11 or 21 digit manual pairing code into an [`OnboardingPayload`]
///
/// Dashes are ignored. The result carries a short discriminator, version 0
/// and no discovery capabilities; long codes yield the custom commissioning
/// flow.
pub struct ManualCodeParser<'a> {
    text: &'a str,
}

impl<'a> ManualCodeParser<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    pub fn parse(&self) -> ChipResult<OnboardingPayload> {
        let code: String = self
            .text
            .chars()
            .filter(|c| *c != MANUAL_CODE_SEPARATOR)
            .collect();

        if code.len() != MANUAL_SETUP_SHORT_CODE_CHAR_LENGTH
            && code.len() != MANUAL_SETUP_LONG_CODE_CHAR_LENGTH
        {
            return Err(ChipError::InvalidManualCode(format!(
                "Invalid length {}, expected {} or {}",
                code.len(),
                MANUAL_SETUP_SHORT_CODE_CHAR_LENGTH,
                MANUAL_SETUP_LONG_CODE_CHAR_LENGTH
            )));
        }
        if !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ChipError::InvalidManualCode(
                "Manual code must contain only digits".to_string(),
            ));
        }

        let (digits, check) = code.split_at(code.len() - 1);
        let check_char = check.chars().next().unwrap_or_default();
        if !verhoeff::validate_check_char(check_char, digits) {
            return Err(ChipError::InvalidManualCode(
                "Check digit mismatch".to_string(),
            ));
        }

        let mut cursor = 0;
        let chunk1 = read_digits(digits, &mut cursor, MANUAL_SETUP_CODE_CHUNK1_CHAR_LENGTH)?;
        // 8 and 9 would set bit 3, which is reserved
        if chunk1 > 7 {
            return Err(ChipError::InvalidManualCode(format!(
                "Reserved leading digit {}",
                chunk1
            )));
        }

        let is_long = (chunk1 >> MANUAL_SETUP_CHUNK1_VID_PID_PRESENT_BIT_POS) & 1 == 1;
        let expected = if is_long {
            MANUAL_SETUP_LONG_CODE_DIGITS
        } else {
            MANUAL_SETUP_SHORT_CODE_DIGITS
        };
        if digits.len() != expected {
            return Err(ChipError::InvalidManualCode(format!(
                "{} code must have {} digits before the check digit, found {}",
                if is_long { "Long" } else { "Short" },
                expected,
                digits.len()
            )));
        }

        let chunk2 = read_digits(digits, &mut cursor, MANUAL_SETUP_CODE_CHUNK2_CHAR_LENGTH)?;
        let chunk3 = read_digits(digits, &mut cursor, MANUAL_SETUP_CODE_CHUNK3_CHAR_LENGTH)?;

        let discriminator_msbits_mask = (1 << MANUAL_SETUP_CHUNK1_DISCRIMINATOR_MSBITS_LENGTH) - 1;
        let discriminator_lsbits_mask = (1 << MANUAL_SETUP_CHUNK2_DISCRIMINATOR_LSBITS_LENGTH) - 1;
        let pin_lsbits_mask = (1 << MANUAL_SETUP_CHUNK2_PIN_CODE_LSBITS_LENGTH) - 1;
        let pin_msbits_mask = (1 << MANUAL_SETUP_CHUNK3_PIN_CODE_MSBITS_LENGTH) - 1;

        let discriminator = (((chunk1 >> MANUAL_SETUP_CHUNK1_DISCRIMINATOR_MSBITS_POS)
            & discriminator_msbits_mask)
            << MANUAL_SETUP_CHUNK2_DISCRIMINATOR_LSBITS_LENGTH)
            | ((chunk2 >> MANUAL_SETUP_CHUNK2_DISCRIMINATOR_LSBITS_POS)
                & discriminator_lsbits_mask);
        let setup_pin_code = ((chunk2 >> MANUAL_SETUP_CHUNK2_PIN_CODE_LSBITS_POS) & pin_lsbits_mask)
            | (((chunk3 >> MANUAL_SETUP_CHUNK3_PIN_CODE_MSBITS_POS) & pin_msbits_mask)
                << MANUAL_SETUP_CHUNK2_PIN_CODE_LSBITS_LENGTH);

        if setup_pin_code == SETUP_PIN_CODE_UNDEFINED_VALUE {
            return Err(ChipError::InvalidManualCode(
                "Setup PIN code is zero".to_string(),
            ));
        }

        let (vendor_id, product_id) = if is_long {
            let vendor_id = read_id(digits, &mut cursor, MANUAL_SETUP_VENDOR_ID_CHAR_LENGTH, "Vendor")?;
            let product_id =
                read_id(digits, &mut cursor, MANUAL_SETUP_PRODUCT_ID_CHAR_LENGTH, "Product")?;
            (vendor_id, product_id)
        } else {
            (0, 0)
        };

        let payload = OnboardingPayload {
            version: 0,
            vendor_id,
            product_id,
            commissioning_flow: if is_long {
                CommissioningFlow::Custom
            } else {
                CommissioningFlow::Standard
            },
            discovery_capabilities: BTreeSet::new(),
            // at most four bits by construction
            discriminator: discriminator as u16,
            has_short_discriminator: true,
            setup_pin_code,
            optional_vendor_data: BTreeMap::new(),
            optional_extension_data: BTreeMap::new(),
        };

        log::debug!(
            "Parsed {} manual code: vid={} pid={} discriminator={}",
            if is_long { "long" } else { "short" },
            payload.vendor_id,
            payload.product_id,
            payload.discriminator
        );
        payload.validate_manual_code()?;
        Ok(payload)
    }
}

/// Reads `len` decimal digits at `cursor` and advances past them
fn read_digits(digits: &str, cursor: &mut usize, len: usize) -> ChipResult<u32> {
    let chunk = digits.get(*cursor..*cursor + len).ok_or_else(|| {
        ChipError::InvalidManualCode(format!("Manual code truncated at digit {}", cursor))
    })?;
    let value = chunk
        .parse::<u32>()
        .map_err(|e| ChipError::InvalidManualCode(format!("Invalid digits {:?}: {}", chunk, e)))?;
    *cursor += len;
    Ok(value)
}

fn read_id(digits: &str, cursor: &mut usize, len: usize, name: &str) -> ChipResult<u16> {
    let value = read_digits(digits, cursor, len)?;
    u16::try_from(value).map_err(|_| {
        ChipError::InvalidManualCode(format!("{} ID out of range: {}", name, value))
    })
}
