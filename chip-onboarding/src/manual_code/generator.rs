//! Manual pairing code generation

use crate::constants::*;
use crate::payload::{CommissioningFlow, OnboardingPayload};
use chip_core::{ChipResult, verhoeff};

/// Renders an [`OnboardingPayload`] as an 11 or 21 digit manual pairing code
///
/// Only the short discriminator is carried; a long discriminator is reduced
/// to its upper four bits.
pub struct ManualCodeGenerator<'a> {
    payload: &'a OnboardingPayload,
}

impl<'a> ManualCodeGenerator<'a> {
    pub fn new(payload: &'a OnboardingPayload) -> Self {
        Self { payload }
    }

    pub fn generate(&self) -> ChipResult<String> {
        let payload = self.payload;
        payload.validate_manual_code()?;

        let use_long = payload.commissioning_flow != CommissioningFlow::Standard;
        let discriminator = u32::from(payload.short_discriminator());
        let pin = payload.setup_pin_code;

        let discriminator_msbits_mask = (1 << MANUAL_SETUP_CHUNK1_DISCRIMINATOR_MSBITS_LENGTH) - 1;
        let discriminator_lsbits_mask = (1 << MANUAL_SETUP_CHUNK2_DISCRIMINATOR_LSBITS_LENGTH) - 1;
        let pin_lsbits_mask = (1 << MANUAL_SETUP_CHUNK2_PIN_CODE_LSBITS_LENGTH) - 1;
        let pin_msbits_mask = (1 << MANUAL_SETUP_CHUNK3_PIN_CODE_MSBITS_LENGTH) - 1;

        let chunk1 = (((discriminator >> MANUAL_SETUP_CHUNK2_DISCRIMINATOR_LSBITS_LENGTH)
            & discriminator_msbits_mask)
            << MANUAL_SETUP_CHUNK1_DISCRIMINATOR_MSBITS_POS)
            | (u32::from(use_long) << MANUAL_SETUP_CHUNK1_VID_PID_PRESENT_BIT_POS);
        let chunk2 = ((pin & pin_lsbits_mask) << MANUAL_SETUP_CHUNK2_PIN_CODE_LSBITS_POS)
            | ((discriminator & discriminator_lsbits_mask)
                << MANUAL_SETUP_CHUNK2_DISCRIMINATOR_LSBITS_POS);
        let chunk3 = ((pin >> MANUAL_SETUP_CHUNK2_PIN_CODE_LSBITS_LENGTH) & pin_msbits_mask)
            << MANUAL_SETUP_CHUNK3_PIN_CODE_MSBITS_POS;

        let mut code = format!(
            "{:0w1$}{:0w2$}{:0w3$}",
            chunk1,
            chunk2,
            chunk3,
            w1 = MANUAL_SETUP_CODE_CHUNK1_CHAR_LENGTH,
            w2 = MANUAL_SETUP_CODE_CHUNK2_CHAR_LENGTH,
            w3 = MANUAL_SETUP_CODE_CHUNK3_CHAR_LENGTH,
        );
        if use_long {
            code.push_str(&format!(
                "{:0wv$}{:0wp$}",
                payload.vendor_id,
                payload.product_id,
                wv = MANUAL_SETUP_VENDOR_ID_CHAR_LENGTH,
                wp = MANUAL_SETUP_PRODUCT_ID_CHAR_LENGTH,
            ));
        }
        code.push(verhoeff::compute_check_char(&code)?);

        log::debug!(
            "Generated {} manual code for discriminator {}",
            if use_long { "long" } else { "short" },
            discriminator
        );
        Ok(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::DiscoveryCapability;
    use chip_core::ChipErrorKind;
    use std::collections::BTreeSet;

    fn payload(flow: CommissioningFlow) -> OnboardingPayload {
        OnboardingPayload::new(
            9050,
            17729,
            flow,
            BTreeSet::from([DiscoveryCapability::Ble]),
            0xF00,
            20202021,
        )
    }

    #[test]
    fn test_short_code() {
        let code = ManualCodeGenerator::new(&payload(CommissioningFlow::Standard))
            .generate()
            .unwrap();
        assert_eq!(code, "34970112332");
    }

    #[test]
    fn test_long_code() {
        let code = ManualCodeGenerator::new(&payload(CommissioningFlow::Custom))
            .generate()
            .unwrap();
        assert_eq!(code, "749701123309050177298");

        let code = ManualCodeGenerator::new(&payload(CommissioningFlow::UserActionRequired))
            .generate()
            .unwrap();
        assert_eq!(code.len(), MANUAL_SETUP_LONG_CODE_CHAR_LENGTH);
    }

    #[test]
    fn test_short_discriminator_input() {
        let mut p = payload(CommissioningFlow::Standard);
        p.set_short_discriminator(0xF).unwrap();
        assert_eq!(ManualCodeGenerator::new(&p).generate().unwrap(), "34970112332");
    }

    #[test]
    fn test_boundaries() {
        let mut p = payload(CommissioningFlow::Standard);
        p.set_long_discriminator(0).unwrap();
        p.setup_pin_code = 1;
        assert_eq!(ManualCodeGenerator::new(&p).generate().unwrap(), "00000100007");

        p.set_long_discriminator(0xFFF).unwrap();
        p.setup_pin_code = 99_999_998;
        assert_eq!(ManualCodeGenerator::new(&p).generate().unwrap(), "35759861036");

        p.commissioning_flow = CommissioningFlow::Custom;
        p.vendor_id = 0xFFFF;
        p.product_id = 0xFFFF;
        assert_eq!(
            ManualCodeGenerator::new(&p).generate().unwrap(),
            "757598610365535655351"
        );
    }

    #[test]
    fn test_rejects_invalid_payload() {
        let mut p = payload(CommissioningFlow::Standard);
        p.setup_pin_code = 11111111;
        let err = ManualCodeGenerator::new(&p).generate().unwrap_err();
        assert_eq!(err.kind(), ChipErrorKind::InvalidPayload);
    }
}
