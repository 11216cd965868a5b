//! QR code generation

use super::bits::BitWriter;
use crate::constants::*;
use crate::optional_info::{OptionalQrCodeInfo, OptionalValue};
use crate::payload::{DiscoveryCapability, OnboardingPayload};
use chip_core::{ChipResult, base38};
use chip_tlv::{Tag, TlvWriter};

/// Renders an [`OnboardingPayload`] as a `"MT:"` QR code string
///
/// # Example
///
/// ```rust
/// use chip_onboarding::{CommissioningFlow, DiscoveryCapability, OnboardingPayload, QrCodeGenerator};
/// use std::collections::BTreeSet;
///
/// let payload = OnboardingPayload::new(
///     0x235A,
///     0x4E4B,
///     CommissioningFlow::Standard,
///     BTreeSet::from([DiscoveryCapability::Ble]),
///     0xF00,
///     20202021,
/// );
/// let code = QrCodeGenerator::new(&payload).generate()?;
/// assert_eq!(code, "MT:W0GU2OTB00KA0648G00");
/// # Ok::<(), chip_core::ChipError>(())
/// ```
pub struct QrCodeGenerator<'a> {
    payload: &'a OnboardingPayload,
}

impl<'a> QrCodeGenerator<'a> {
    pub fn new(payload: &'a OnboardingPayload) -> Self {
        Self { payload }
    }

    pub fn generate(&self) -> ChipResult<String> {
        self.payload.validate_qr_code_payload()?;

        let tlv = self.encode_optional_data()?;
        let mut bytes = self.pack_fixed_fields()?;
        bytes.extend_from_slice(&tlv);

        log::debug!(
            "Generated QR code: vid=0x{:04X} pid=0x{:04X} optional_tlv={} bytes",
            self.payload.vendor_id,
            self.payload.product_id,
            tlv.len()
        );
        Ok(format!("{}{}", QR_CODE_PREFIX, base38::encode(&bytes)))
    }

    fn pack_fixed_fields(&self) -> ChipResult<Vec<u8>> {
        let payload = self.payload;
        let mut bits = BitWriter::new(TOTAL_PAYLOAD_DATA_SIZE_IN_BYTES);
        bits.put(u64::from(payload.version), VERSION_FIELD_LENGTH_IN_BITS)?;
        bits.put(u64::from(payload.vendor_id), VENDOR_ID_FIELD_LENGTH_IN_BITS)?;
        bits.put(u64::from(payload.product_id), PRODUCT_ID_FIELD_LENGTH_IN_BITS)?;
        bits.put(
            u64::from(payload.commissioning_flow.to_u8()),
            COMMISSIONING_FLOW_FIELD_LENGTH_IN_BITS,
        )?;
        bits.put(
            u64::from(DiscoveryCapability::to_bits(&payload.discovery_capabilities)),
            RENDEZVOUS_INFO_FIELD_LENGTH_IN_BITS,
        )?;
        bits.put(
            u64::from(payload.discriminator),
            PAYLOAD_DISCRIMINATOR_FIELD_LENGTH_IN_BITS,
        )?;
        bits.put(
            u64::from(payload.setup_pin_code),
            SETUP_PIN_CODE_FIELD_LENGTH_IN_BITS,
        )?;
        bits.put(0, PADDING_FIELD_LENGTH_IN_BITS)?;
        Ok(bits.into_bytes())
    }

    /// Anonymous structure of vendor data then extension data, each in tag order
    fn encode_optional_data(&self) -> ChipResult<Vec<u8>> {
        let payload = self.payload;
        if payload.optional_vendor_data.is_empty() && payload.optional_extension_data.is_empty() {
            return Ok(Vec::new());
        }

        let mut writer = TlvWriter::new();
        writer.start_structure(Tag::Anonymous)?;
        for info in payload
            .all_optional_vendor_data()
            .chain(payload.all_optional_extension_data())
        {
            write_optional_info(&mut writer, info)?;
        }
        writer.end_structure()?;
        writer.validate_tlv()?;
        Ok(writer.into_bytes().to_vec())
    }
}

fn write_optional_info(writer: &mut TlvWriter, info: &OptionalQrCodeInfo) -> ChipResult<()> {
    let tag = Tag::context(info.tag);
    match &info.value {
        OptionalValue::String(s) => writer.put_string(tag, s),
        OptionalValue::Int32(v) => writer.put_int(tag, i64::from(*v)),
        OptionalValue::Int64(v) => writer.put_int(tag, *v),
        OptionalValue::UInt32(v) => writer.put_uint(tag, u64::from(*v)),
        OptionalValue::UInt64(v) => writer.put_uint(tag, *v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::CommissioningFlow;
    use chip_core::ChipErrorKind;
    use std::collections::BTreeSet;

    fn sample() -> OnboardingPayload {
        OnboardingPayload::new(
            0x235A,
            0x4E4B,
            CommissioningFlow::Standard,
            BTreeSet::from([DiscoveryCapability::Ble]),
            0xF00,
            20202021,
        )
    }

    #[test]
    fn test_generate_known_code() {
        let code = QrCodeGenerator::new(&sample()).generate().unwrap();
        assert_eq!(code, "MT:W0GU2OTB00KA0648G00");
    }

    #[test]
    fn test_fixed_fields_layout() {
        let payload = sample();
        let bytes = QrCodeGenerator::new(&payload).pack_fixed_fields().unwrap();
        assert_eq!(
            bytes,
            vec![0xD0, 0x1A, 0x59, 0x72, 0x42, 0x00, 0xE0, 0x4B, 0x84, 0x68, 0x02]
        );
    }

    #[test]
    fn test_no_optional_data_is_22_chars() {
        let code = QrCodeGenerator::new(&sample()).generate().unwrap();
        assert_eq!(code.len(), QR_CODE_PREFIX.len() + base38::encoded_len(11));
    }

    #[test]
    fn test_optional_data_order() {
        let mut payload = sample();
        payload.add_serial_number("1");
        payload
            .add_optional_vendor_data(0x82, OptionalValue::Int32(-1))
            .unwrap();
        payload
            .add_optional_vendor_data(0x81, OptionalValue::String("a".to_string()))
            .unwrap();

        let tlv = QrCodeGenerator::new(&payload).encode_optional_data().unwrap();
        assert_eq!(
            tlv,
            vec![
                0x15, // anonymous structure
                0x2C, 0x81, 0x01, b'a', // vendor 0x81 "a"
                0x20, 0x82, 0xFF, // vendor 0x82 -1
                0x2C, 0x00, 0x01, b'1', // serial number "1"
                0x18,
            ]
        );
    }

    #[test]
    fn test_rejects_invalid_payload() {
        let mut payload = sample();
        payload.setup_pin_code = 12345678;
        let err = QrCodeGenerator::new(&payload).generate().unwrap_err();
        assert_eq!(err.kind(), ChipErrorKind::InvalidPayload);

        let mut payload = sample();
        payload.set_short_discriminator(0xF).unwrap();
        assert!(QrCodeGenerator::new(&payload).generate().is_err());
    }
}
