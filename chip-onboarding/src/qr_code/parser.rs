//! QR code parsing

use super::bits::BitReader;
use crate::constants::*;
use crate::optional_info::{OptionalQrCodeInfo, OptionalValue, is_common_tag};
use crate::payload::{CommissioningFlow, DiscoveryCapability, OnboardingPayload};
use chip_core::{ChipError, ChipResult, base38};
use chip_tlv::{Element, Tag, TlvReader, Value};
use std::collections::BTreeMap;

/// Parses a `"MT:"` QR code string into an [`OnboardingPayload`]
///
/// The text may hold several `%`-separated payloads; the first one starting
/// with `"MT:"` is used. The parsed payload is validated before it is
/// returned.
pub struct QrCodeParser<'a> {
    text: &'a str,
}

impl<'a> QrCodeParser<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text }
    }

    pub fn parse(&self) -> ChipResult<OnboardingPayload> {
        let encoded = extract_payload(self.text).ok_or_else(|| {
            ChipError::UnrecognizedQrCode("No MT: payload found".to_string())
        })?;
        let bytes = base38::decode(encoded)
            .map_err(|e| ChipError::UnrecognizedQrCode(format!("Base38: {}", e.message())))?;
        if bytes.len() < TOTAL_PAYLOAD_DATA_SIZE_IN_BYTES {
            return Err(ChipError::UnrecognizedQrCode(format!(
                "Decoded payload is {} bytes, expected at least {}",
                bytes.len(),
                TOTAL_PAYLOAD_DATA_SIZE_IN_BYTES
            )));
        }

        let (fixed, tlv) = bytes.split_at(TOTAL_PAYLOAD_DATA_SIZE_IN_BYTES);
        let mut payload = parse_fixed_fields(fixed)?;
        if !tlv.is_empty() {
            parse_optional_data(tlv, &mut payload)?;
        }

        log::debug!(
            "Parsed QR code: vid=0x{:04X} pid=0x{:04X} flow={:?} optional_tlv={} bytes",
            payload.vendor_id,
            payload.product_id,
            payload.commissioning_flow,
            tlv.len()
        );
        payload.validate_qr_code_payload()?;
        Ok(payload)
    }
}

/// Finds the first `%`-separated segment that starts with `"MT:"` and has content
fn extract_payload(text: &str) -> Option<&str> {
    text.split(PAYLOAD_DELIMITER).find_map(|segment| {
        segment
            .strip_prefix(QR_CODE_PREFIX)
            .filter(|encoded| !encoded.is_empty())
    })
}

// Field widths are at most 27 bits, so the narrowing casts below are lossless.
fn parse_fixed_fields(bytes: &[u8]) -> ChipResult<OnboardingPayload> {
    let mut bits = BitReader::new(bytes);
    let version = bits.read(VERSION_FIELD_LENGTH_IN_BITS)? as u8;
    let vendor_id = bits.read(VENDOR_ID_FIELD_LENGTH_IN_BITS)? as u16;
    let product_id = bits.read(PRODUCT_ID_FIELD_LENGTH_IN_BITS)? as u16;
    let flow = bits.read(COMMISSIONING_FLOW_FIELD_LENGTH_IN_BITS)? as u8;
    let rendezvous = bits.read(RENDEZVOUS_INFO_FIELD_LENGTH_IN_BITS)? as u8;
    let discriminator = bits.read(PAYLOAD_DISCRIMINATOR_FIELD_LENGTH_IN_BITS)? as u16;
    let setup_pin_code = bits.read(SETUP_PIN_CODE_FIELD_LENGTH_IN_BITS)? as u32;
    let padding = bits.read(PADDING_FIELD_LENGTH_IN_BITS)?;

    if padding != 0 {
        return Err(ChipError::UnrecognizedQrCode(format!(
            "Padding bits must be zero, found {:#x}",
            padding
        )));
    }
    if rendezvous & !0x07 != 0 {
        log::debug!("Ignoring undefined rendezvous bits {:#04x}", rendezvous & !0x07);
    }

    Ok(OnboardingPayload {
        version,
        vendor_id,
        product_id,
        commissioning_flow: CommissioningFlow::from_u8(flow)?,
        discovery_capabilities: DiscoveryCapability::from_bits(rendezvous),
        discriminator,
        has_short_discriminator: false,
        setup_pin_code,
        optional_vendor_data: BTreeMap::new(),
        optional_extension_data: BTreeMap::new(),
    })
}

/// Reads the members of the outer TLV container into the payload's maps
///
/// The container must be closed and nothing may follow it.
fn parse_optional_data(tlv: &[u8], payload: &mut OnboardingPayload) -> ChipResult<()> {
    let mut reader = TlvReader::new(tlv);
    // Outer container; its tag is not checked
    let outer = reader.next_element()?;
    if !outer.value.is_container_start() {
        return Err(ChipError::TlvParsing(format!(
            "Optional data must open a container, found {}",
            outer
        )));
    }

    // Running out of bytes before the end marker fails in next_element
    loop {
        let element = reader.next_element()?;
        if element.value.is_end_of_container() {
            break;
        }
        if element.value.is_container_start() {
            log::warn!("Skipping nested container in optional data: {}", element.tag);
            reader.exit_container()?;
            continue;
        }
        if let Some(info) = to_optional_info(element)? {
            let map = if is_common_tag(info.tag) {
                &mut payload.optional_extension_data
            } else {
                &mut payload.optional_vendor_data
            };
            map.insert(info.tag, info);
        }
    }

    if !reader.is_end_of_tlv() {
        return Err(ChipError::TlvParsing(format!(
            "{} trailing bytes after optional data at index {}",
            reader.remaining_length(),
            reader.length_read()
        )));
    }
    Ok(())
}

/// Converts one member; `None` for value kinds that are not carried
fn to_optional_info(element: Element) -> ChipResult<Option<OptionalQrCodeInfo>> {
    let tag = match element.tag {
        Tag::ContextSpecific { number } => u8::try_from(number).map_err(|_| {
            ChipError::UnrecognizedQrCode(format!("Optional data tag {} out of range", number))
        })?,
        other => {
            return Err(ChipError::UnrecognizedQrCode(format!(
                "Optional data must use context tags, found {}",
                other
            )));
        }
    };

    let value = match (is_common_tag(tag), element.value) {
        (_, Value::Utf8String(s)) => OptionalValue::String(s),
        (true, Value::Int(v)) => match i32::try_from(v) {
            Ok(v) => OptionalValue::Int32(v),
            Err(_) => OptionalValue::Int64(v),
        },
        (true, Value::UInt(v)) => match u32::try_from(v) {
            Ok(v) => OptionalValue::UInt32(v),
            Err(_) => OptionalValue::UInt64(v),
        },
        (false, Value::Int(v)) => OptionalValue::Int32(i32::try_from(v).map_err(|_| {
            ChipError::UnrecognizedQrCode(format!(
                "Vendor data 0x{:02X} does not fit in Int32: {}",
                tag, v
            ))
        })?),
        (false, Value::UInt(_)) => {
            return Err(ChipError::UnrecognizedQrCode(format!(
                "Vendor data 0x{:02X} must be a string or signed integer",
                tag
            )));
        }
        (_, other) => {
            log::warn!(
                "Skipping optional data 0x{:02X} of unsupported kind {}",
                tag,
                other.kind_name()
            );
            return Ok(None);
        }
    };
    Ok(Some(OptionalQrCodeInfo::new(tag, value)))
}
