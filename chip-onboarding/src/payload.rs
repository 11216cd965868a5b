//! Onboarding payload data model and validation

use crate::constants::*;
use crate::optional_info::{OptionalQrCodeInfo, OptionalValue, is_common_tag, is_vendor_tag};
use chip_core::{ChipError, ChipResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// How a device enters commissioning mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum CommissioningFlow {
    /// Commissionable on power-up
    #[default]
    Standard = 0,
    /// The user must act on the device first
    UserActionRequired = 1,
    /// Vendor-defined procedure
    Custom = 2,
}

impl CommissioningFlow {
    pub fn from_u8(value: u8) -> ChipResult<Self> {
        match value {
            0 => Ok(CommissioningFlow::Standard),
            1 => Ok(CommissioningFlow::UserActionRequired),
            2 => Ok(CommissioningFlow::Custom),
            _ => Err(ChipError::InvalidPayload(format!(
                "Invalid commissioning flow: {}",
                value
            ))),
        }
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }
}

/// Transport on which a device can be discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DiscoveryCapability {
    SoftAp,
    Ble,
    OnNetwork,
}

impl DiscoveryCapability {
    pub const ALL: [DiscoveryCapability; 3] = [
        DiscoveryCapability::SoftAp,
        DiscoveryCapability::Ble,
        DiscoveryCapability::OnNetwork,
    ];

    /// Bit of this capability in the rendezvous information field
    pub fn bit(self) -> u8 {
        match self {
            DiscoveryCapability::SoftAp => 1 << 0,
            DiscoveryCapability::Ble => 1 << 1,
            DiscoveryCapability::OnNetwork => 1 << 2,
        }
    }

    /// Packs a capability set into the rendezvous information field
    pub fn to_bits(capabilities: &BTreeSet<DiscoveryCapability>) -> u8 {
        capabilities.iter().fold(0, |bits, capability| bits | capability.bit())
    }

    /// Unpacks the rendezvous information field, ignoring undefined bits
    pub fn from_bits(bits: u8) -> BTreeSet<DiscoveryCapability> {
        Self::ALL
            .into_iter()
            .filter(|capability| bits & capability.bit() != 0)
            .collect()
    }
}

/// Parameters needed to commission a device
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OnboardingPayload {
    pub version: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub commissioning_flow: CommissioningFlow,
    pub discovery_capabilities: BTreeSet<DiscoveryCapability>,
    /// 12-bit long or 4-bit short discriminator, see `has_short_discriminator`
    pub discriminator: u16,
    pub has_short_discriminator: bool,
    pub setup_pin_code: u32,
    /// Vendor data, keyed by tag (tags >= 0x80)
    pub optional_vendor_data: BTreeMap<u8, OptionalQrCodeInfo>,
    /// Extension data, keyed by tag (tags < 0x80)
    pub optional_extension_data: BTreeMap<u8, OptionalQrCodeInfo>,
}

impl OnboardingPayload {
    /// Creates a payload with a long discriminator and no optional data
    pub fn new(
        vendor_id: u16,
        product_id: u16,
        commissioning_flow: CommissioningFlow,
        discovery_capabilities: BTreeSet<DiscoveryCapability>,
        discriminator: u16,
        setup_pin_code: u32,
    ) -> Self {
        Self {
            version: 0,
            vendor_id,
            product_id,
            commissioning_flow,
            discovery_capabilities,
            discriminator,
            has_short_discriminator: false,
            setup_pin_code,
            optional_vendor_data: BTreeMap::new(),
            optional_extension_data: BTreeMap::new(),
        }
    }

    // ---- Discriminator ----

    /// Upper four bits of the long discriminator, or the short one as stored
    pub fn short_discriminator(&self) -> u16 {
        if self.has_short_discriminator {
            self.discriminator
        } else {
            (self.discriminator >> (LONG_DISCRIMINATOR_LENGTH_IN_BITS - SHORT_DISCRIMINATOR_LENGTH_IN_BITS))
                & MAX_SHORT_DISCRIMINATOR
        }
    }

    /// Long discriminator, if this payload carries one
    pub fn long_discriminator(&self) -> Option<u16> {
        (!self.has_short_discriminator).then_some(self.discriminator)
    }

    pub fn set_short_discriminator(&mut self, discriminator: u16) -> ChipResult<()> {
        if discriminator > MAX_SHORT_DISCRIMINATOR {
            return Err(ChipError::InvalidArgument(format!(
                "Short discriminator out of range: {}",
                discriminator
            )));
        }
        self.discriminator = discriminator;
        self.has_short_discriminator = true;
        Ok(())
    }

    pub fn set_long_discriminator(&mut self, discriminator: u16) -> ChipResult<()> {
        if discriminator > MAX_LONG_DISCRIMINATOR {
            return Err(ChipError::InvalidArgument(format!(
                "Long discriminator out of range: {}",
                discriminator
            )));
        }
        self.discriminator = discriminator;
        self.has_short_discriminator = false;
        Ok(())
    }

    // ---- Validation ----

    /// Checks that this payload can be represented as a QR code
    pub fn validate_qr_code_payload(&self) -> ChipResult<()> {
        if self.version >= 1 << VERSION_FIELD_LENGTH_IN_BITS {
            return Err(ChipError::InvalidPayload(format!(
                "Version does not fit in {} bits: {}",
                VERSION_FIELD_LENGTH_IN_BITS, self.version
            )));
        }
        if self.has_short_discriminator {
            return Err(ChipError::InvalidPayload(
                "QR code requires a long discriminator".to_string(),
            ));
        }
        self.check_discriminator()?;
        self.check_optional_data()?;
        self.check_common_constraints()
    }

    /// Checks that this payload can be represented as a manual pairing code
    pub fn validate_manual_code(&self) -> ChipResult<()> {
        self.check_discriminator()?;
        self.check_common_constraints()
    }

    pub fn is_valid_qr_code_payload(&self) -> bool {
        self.validate_qr_code_payload().is_ok()
    }

    pub fn is_valid_manual_code(&self) -> bool {
        self.validate_manual_code().is_ok()
    }

    fn check_discriminator(&self) -> ChipResult<()> {
        let max = if self.has_short_discriminator {
            MAX_SHORT_DISCRIMINATOR
        } else {
            MAX_LONG_DISCRIMINATOR
        };
        if self.discriminator > max {
            return Err(ChipError::InvalidPayload(format!(
                "Discriminator out of range: {}",
                self.discriminator
            )));
        }
        Ok(())
    }

    /// Optional data must come back unchanged from a QR code round trip
    fn check_optional_data(&self) -> ChipResult<()> {
        for (key, info) in &self.optional_vendor_data {
            check_entry_key(*key, info)?;
            if !is_vendor_tag(info.tag) {
                return Err(ChipError::InvalidPayload(format!(
                    "Vendor data under non-vendor tag 0x{:02X}",
                    info.tag
                )));
            }
            if !info.value.is_vendor_compatible() {
                return Err(ChipError::InvalidPayload(format!(
                    "Vendor data 0x{:02X} must be a string or Int32, got {:?}",
                    info.tag,
                    info.info_type()
                )));
            }
        }
        for (key, info) in &self.optional_extension_data {
            check_entry_key(*key, info)?;
            if !is_common_tag(info.tag) {
                return Err(ChipError::InvalidPayload(format!(
                    "Extension data under vendor tag 0x{:02X}",
                    info.tag
                )));
            }
            if !info.value.is_normalized() {
                return Err(ChipError::InvalidPayload(format!(
                    "Extension data 0x{:02X} holds {} in a 64-bit variant",
                    info.tag, info.value
                )));
            }
        }
        Ok(())
    }

    fn check_common_constraints(&self) -> ChipResult<()> {
        if u64::from(self.setup_pin_code) >= 1u64 << SETUP_PIN_CODE_FIELD_LENGTH_IN_BITS {
            return Err(ChipError::InvalidPayload(
                "Setup PIN code does not fit in its field".to_string(),
            ));
        }
        if !is_valid_setup_pin(self.setup_pin_code) {
            return Err(ChipError::InvalidPayload(
                "Setup PIN code is not allowed".to_string(),
            ));
        }
        if self.product_id == 0 && self.vendor_id != 0 {
            return Err(ChipError::InvalidPayload(
                "Product ID must be set when vendor ID is set".to_string(),
            ));
        }
        Ok(())
    }

    // ---- Vendor data ----

    /// Adds or replaces vendor data; only strings and 32-bit signed integers are allowed
    pub fn add_optional_vendor_data(&mut self, tag: u8, value: OptionalValue) -> ChipResult<()> {
        if !is_vendor_tag(tag) {
            return Err(ChipError::InvalidArgument(format!(
                "Tag 0x{:02X} is not a vendor tag",
                tag
            )));
        }
        if !value.is_vendor_compatible() {
            return Err(ChipError::InvalidArgument(format!(
                "Vendor data must be a string or Int32, got {:?}",
                value.info_type()
            )));
        }
        self.optional_vendor_data
            .insert(tag, OptionalQrCodeInfo::new(tag, value));
        Ok(())
    }

    pub fn remove_optional_vendor_data(&mut self, tag: u8) -> ChipResult<OptionalQrCodeInfo> {
        self.optional_vendor_data.remove(&tag).ok_or_else(|| {
            ChipError::InvalidArgument(format!("No vendor data with tag 0x{:02X}", tag))
        })
    }

    pub fn optional_vendor_data(&self, tag: u8) -> Option<&OptionalQrCodeInfo> {
        self.optional_vendor_data.get(&tag)
    }

    /// All vendor data in ascending tag order
    pub fn all_optional_vendor_data(&self) -> impl Iterator<Item = &OptionalQrCodeInfo> {
        self.optional_vendor_data.values()
    }

    // ---- Extension data ----

    /// Adds or replaces extension data under a common tag
    ///
    /// 64-bit integers that fit in 32 bits are stored as 32-bit variants.
    pub fn add_optional_extension_data(&mut self, info: OptionalQrCodeInfo) -> ChipResult<()> {
        if !is_common_tag(info.tag) {
            return Err(ChipError::InvalidArgument(format!(
                "Tag 0x{:02X} is not a common tag",
                info.tag
            )));
        }
        let info = OptionalQrCodeInfo::new(info.tag, info.value.normalized());
        self.optional_extension_data.insert(info.tag, info);
        Ok(())
    }

    pub fn optional_extension_data(&self, tag: u8) -> Option<&OptionalQrCodeInfo> {
        self.optional_extension_data.get(&tag)
    }

    /// All extension data in ascending tag order
    pub fn all_optional_extension_data(&self) -> impl Iterator<Item = &OptionalQrCodeInfo> {
        self.optional_extension_data.values()
    }

    // ---- Serial number ----

    pub fn add_serial_number(&mut self, serial_number: &str) {
        self.optional_extension_data.insert(
            SERIAL_NUMBER_TAG,
            OptionalQrCodeInfo::new(
                SERIAL_NUMBER_TAG,
                OptionalValue::String(serial_number.to_string()),
            ),
        );
    }

    pub fn add_serial_number_u32(&mut self, serial_number: u32) {
        self.optional_extension_data.insert(
            SERIAL_NUMBER_TAG,
            OptionalQrCodeInfo::new(SERIAL_NUMBER_TAG, OptionalValue::UInt32(serial_number)),
        );
    }

    /// Serial number as a string, whichever form it was stored in
    pub fn serial_number(&self) -> ChipResult<String> {
        let info = self
            .optional_extension_data
            .get(&SERIAL_NUMBER_TAG)
            .ok_or_else(|| ChipError::InvalidArgument("No serial number".to_string()))?;
        match &info.value {
            OptionalValue::String(s) => Ok(s.clone()),
            OptionalValue::UInt32(v) => Ok(v.to_string()),
            other => Err(ChipError::InvalidPayload(format!(
                "Serial number has unexpected type {:?}",
                other.info_type()
            ))),
        }
    }

    pub fn remove_serial_number(&mut self) -> ChipResult<()> {
        self.optional_extension_data
            .remove(&SERIAL_NUMBER_TAG)
            .map(|_| ())
            .ok_or_else(|| ChipError::InvalidArgument("No serial number".to_string()))
    }
}

impl fmt::Display for OnboardingPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "OnboardingPayload(version={}, vid=0x{:04X}, pid=0x{:04X}, flow={:?}, capabilities={:?}, discriminator={}{})",
            self.version,
            self.vendor_id,
            self.product_id,
            self.commissioning_flow,
            self.discovery_capabilities,
            self.discriminator,
            if self.has_short_discriminator { " (short)" } else { "" }
        )
    }
}

fn check_entry_key(key: u8, info: &OptionalQrCodeInfo) -> ChipResult<()> {
    if key != info.tag {
        return Err(ChipError::InvalidPayload(format!(
            "Optional data keyed 0x{:02X} carries tag 0x{:02X}",
            key, info.tag
        )));
    }
    Ok(())
}

/// Whether `pin` may be used as a setup PIN code
pub fn is_valid_setup_pin(pin: u32) -> bool {
    pin != SETUP_PIN_CODE_UNDEFINED_VALUE
        && pin <= SETUP_PIN_CODE_MAXIMUM_VALUE
        && !SETUP_PIN_CODE_BLACKLIST.contains(&pin)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> OnboardingPayload {
        OnboardingPayload::new(
            12,
            1,
            CommissioningFlow::Standard,
            BTreeSet::from([DiscoveryCapability::SoftAp]),
            128,
            2048,
        )
    }

    #[test]
    fn test_setup_pin_rules() {
        assert!(!is_valid_setup_pin(0));
        assert!(!is_valid_setup_pin(11111111));
        assert!(!is_valid_setup_pin(12345678));
        assert!(!is_valid_setup_pin(87654321));
        assert!(!is_valid_setup_pin(99999999));
        assert!(!is_valid_setup_pin(100_000_000));
        assert!(is_valid_setup_pin(1));
        assert!(is_valid_setup_pin(20202021));
        assert!(is_valid_setup_pin(99999998));
    }

    #[test]
    fn test_valid_payload() {
        let payload = sample();
        assert!(payload.is_valid_qr_code_payload());
        assert!(payload.is_valid_manual_code());
    }

    #[test]
    fn test_rejects_blacklisted_pins() {
        for pin in [0, 11111111, 12345678] {
            let mut payload = sample();
            payload.setup_pin_code = pin;
            let err = payload.validate_qr_code_payload().unwrap_err();
            assert_eq!(err.kind(), chip_core::ChipErrorKind::InvalidPayload);
            assert!(!payload.is_valid_manual_code());
        }
    }

    #[test]
    fn test_rejects_version_out_of_range() {
        let mut payload = sample();
        payload.version = 7;
        assert!(payload.is_valid_qr_code_payload());
        payload.version = 8;
        assert!(!payload.is_valid_qr_code_payload());
    }

    #[test]
    fn test_product_id_requires_vendor() {
        let mut payload = sample();
        payload.product_id = 0;
        assert!(!payload.is_valid_qr_code_payload());
        payload.vendor_id = 0;
        assert!(payload.is_valid_qr_code_payload());
    }

    #[test]
    fn test_short_discriminator_not_for_qr() {
        let mut payload = sample();
        payload.set_short_discriminator(0xA).unwrap();
        assert!(!payload.is_valid_qr_code_payload());
        assert!(payload.is_valid_manual_code());
    }

    #[test]
    fn test_discriminator_accessors() {
        let mut payload = sample();
        payload.set_long_discriminator(0xF00).unwrap();
        assert_eq!(payload.long_discriminator(), Some(0xF00));
        assert_eq!(payload.short_discriminator(), 0xF);

        payload.set_short_discriminator(0x3).unwrap();
        assert_eq!(payload.long_discriminator(), None);
        assert_eq!(payload.short_discriminator(), 0x3);

        assert!(payload.set_short_discriminator(0x10).is_err());
        assert!(payload.set_long_discriminator(0x1000).is_err());
    }

    #[test]
    fn test_discriminator_range_validation() {
        let mut payload = sample();
        payload.discriminator = 0x1000;
        assert!(!payload.is_valid_qr_code_payload());
        payload.has_short_discriminator = true;
        payload.discriminator = 0x10;
        assert!(!payload.is_valid_manual_code());
    }

    #[test]
    fn test_vendor_data() {
        let mut payload = sample();
        payload
            .add_optional_vendor_data(0x81, OptionalValue::Int32(12))
            .unwrap();
        payload
            .add_optional_vendor_data(0x80, OptionalValue::String("hello".to_string()))
            .unwrap();

        assert!(payload.add_optional_vendor_data(0x01, OptionalValue::Int32(1)).is_err());
        assert!(payload.add_optional_vendor_data(0x82, OptionalValue::UInt32(1)).is_err());

        let tags: Vec<u8> = payload.all_optional_vendor_data().map(|i| i.tag).collect();
        assert_eq!(tags, vec![0x80, 0x81]);
        assert_eq!(
            payload.optional_vendor_data(0x81).map(|i| &i.value),
            Some(&OptionalValue::Int32(12))
        );

        let removed = payload.remove_optional_vendor_data(0x80).unwrap();
        assert_eq!(removed.value, OptionalValue::String("hello".to_string()));
        assert!(payload.remove_optional_vendor_data(0x80).is_err());
    }

    #[test]
    fn test_extension_data() {
        let mut payload = sample();
        payload
            .add_optional_extension_data(OptionalQrCodeInfo::new(0x02, OptionalValue::UInt64(1 << 40)))
            .unwrap();
        assert!(payload
            .add_optional_extension_data(OptionalQrCodeInfo::new(0x90, OptionalValue::Int32(1)))
            .is_err());
        assert_eq!(payload.all_optional_extension_data().count(), 1);
        assert!(payload.optional_extension_data(0x02).is_some());
    }

    #[test]
    fn test_extension_data_normalized_on_add() {
        let mut payload = sample();
        payload
            .add_optional_extension_data(OptionalQrCodeInfo::new(0x05, OptionalValue::UInt64(7)))
            .unwrap();
        payload
            .add_optional_extension_data(OptionalQrCodeInfo::new(0x06, OptionalValue::Int64(-7)))
            .unwrap();
        assert_eq!(
            payload.optional_extension_data(0x05).map(|i| &i.value),
            Some(&OptionalValue::UInt32(7))
        );
        assert_eq!(
            payload.optional_extension_data(0x06).map(|i| &i.value),
            Some(&OptionalValue::Int32(-7))
        );
        assert!(payload.is_valid_qr_code_payload());
    }

    #[test]
    fn test_rejects_vendor_entry_of_wrong_kind() {
        let mut payload = sample();
        payload
            .optional_vendor_data
            .insert(0x90, OptionalQrCodeInfo::new(0x90, OptionalValue::UInt32(1)));
        let err = payload.validate_qr_code_payload().unwrap_err();
        assert_eq!(err.kind(), chip_core::ChipErrorKind::InvalidPayload);
    }

    #[test]
    fn test_rejects_entries_in_wrong_map() {
        let mut payload = sample();
        payload
            .optional_vendor_data
            .insert(0x01, OptionalQrCodeInfo::new(0x01, OptionalValue::Int32(1)));
        assert!(!payload.is_valid_qr_code_payload());

        let mut payload = sample();
        payload
            .optional_extension_data
            .insert(0x81, OptionalQrCodeInfo::new(0x81, OptionalValue::Int32(1)));
        assert!(!payload.is_valid_qr_code_payload());
    }

    #[test]
    fn test_rejects_mismatched_entry_key() {
        let mut payload = sample();
        payload
            .optional_vendor_data
            .insert(0x81, OptionalQrCodeInfo::new(0x82, OptionalValue::Int32(1)));
        assert!(!payload.is_valid_qr_code_payload());

        let mut payload = sample();
        payload
            .optional_extension_data
            .insert(0x01, OptionalQrCodeInfo::new(0x02, OptionalValue::Int32(1)));
        assert!(!payload.is_valid_qr_code_payload());
    }

    #[test]
    fn test_rejects_wide_variant_holding_narrow_value() {
        let mut payload = sample();
        payload
            .optional_extension_data
            .insert(0x05, OptionalQrCodeInfo::new(0x05, OptionalValue::UInt64(7)));
        assert!(!payload.is_valid_qr_code_payload());

        payload
            .optional_extension_data
            .insert(0x05, OptionalQrCodeInfo::new(0x05, OptionalValue::UInt64(1 << 40)));
        assert!(payload.is_valid_qr_code_payload());
    }

    #[test]
    fn test_serial_number() {
        let mut payload = sample();
        assert!(payload.serial_number().is_err());

        payload.add_serial_number("SN-1234");
        assert_eq!(payload.serial_number().unwrap(), "SN-1234");

        payload.add_serial_number_u32(42);
        assert_eq!(payload.serial_number().unwrap(), "42");

        payload.remove_serial_number().unwrap();
        assert!(payload.remove_serial_number().is_err());
    }

    #[test]
    fn test_capability_bits() {
        let caps = BTreeSet::from([DiscoveryCapability::Ble, DiscoveryCapability::OnNetwork]);
        assert_eq!(DiscoveryCapability::to_bits(&caps), 0b110);
        assert_eq!(DiscoveryCapability::from_bits(0b110), caps);
        assert_eq!(
            DiscoveryCapability::from_bits(0xF9),
            BTreeSet::from([DiscoveryCapability::SoftAp])
        );
    }

    #[test]
    fn test_commissioning_flow() {
        assert_eq!(CommissioningFlow::from_u8(2).unwrap(), CommissioningFlow::Custom);
        assert!(CommissioningFlow::from_u8(3).is_err());
        assert_eq!(CommissioningFlow::UserActionRequired.to_u8(), 1);
    }

    #[test]
    fn test_serde() {
        let mut payload = sample();
        payload.add_serial_number("abc");
        let json = serde_json::to_string(&payload).unwrap();
        let back: OnboardingPayload = serde_json::from_str(&json).unwrap();
        assert_eq!(back, payload);
    }
}
