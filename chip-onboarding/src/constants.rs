//! Onboarding payload constants
//!
//! Field widths, chunk layouts and reserved values shared by the QR code and
//! manual pairing code formats.

/// Prefix of every QR code payload
pub const QR_CODE_PREFIX: &str = "MT:";

/// Separator of payloads embedded in a larger string
pub const PAYLOAD_DELIMITER: char = '%';

// QR code bit field, in packing order

pub const VERSION_FIELD_LENGTH_IN_BITS: usize = 3;
pub const VENDOR_ID_FIELD_LENGTH_IN_BITS: usize = 16;
pub const PRODUCT_ID_FIELD_LENGTH_IN_BITS: usize = 16;
pub const COMMISSIONING_FLOW_FIELD_LENGTH_IN_BITS: usize = 2;
pub const RENDEZVOUS_INFO_FIELD_LENGTH_IN_BITS: usize = 8;
pub const PAYLOAD_DISCRIMINATOR_FIELD_LENGTH_IN_BITS: usize = 12;
pub const SETUP_PIN_CODE_FIELD_LENGTH_IN_BITS: usize = 27;
pub const PADDING_FIELD_LENGTH_IN_BITS: usize = 4;

/// Size of the fixed QR code section in bits
pub const TOTAL_PAYLOAD_DATA_SIZE_IN_BITS: usize = VERSION_FIELD_LENGTH_IN_BITS
    + VENDOR_ID_FIELD_LENGTH_IN_BITS
    + PRODUCT_ID_FIELD_LENGTH_IN_BITS
    + COMMISSIONING_FLOW_FIELD_LENGTH_IN_BITS
    + RENDEZVOUS_INFO_FIELD_LENGTH_IN_BITS
    + PAYLOAD_DISCRIMINATOR_FIELD_LENGTH_IN_BITS
    + SETUP_PIN_CODE_FIELD_LENGTH_IN_BITS
    + PADDING_FIELD_LENGTH_IN_BITS;

/// Size of the fixed QR code section in bytes
pub const TOTAL_PAYLOAD_DATA_SIZE_IN_BYTES: usize = TOTAL_PAYLOAD_DATA_SIZE_IN_BITS / 8;

// Discriminator

pub const LONG_DISCRIMINATOR_LENGTH_IN_BITS: usize = 12;
pub const SHORT_DISCRIMINATOR_LENGTH_IN_BITS: usize = 4;
pub const MAX_LONG_DISCRIMINATOR: u16 = (1 << LONG_DISCRIMINATOR_LENGTH_IN_BITS) - 1;
pub const MAX_SHORT_DISCRIMINATOR: u16 = (1 << SHORT_DISCRIMINATOR_LENGTH_IN_BITS) - 1;

// Setup PIN code

/// Largest setup PIN code that may be assigned
pub const SETUP_PIN_CODE_MAXIMUM_VALUE: u32 = 99_999_998;

/// Setup PIN code meaning "not set"
pub const SETUP_PIN_CODE_UNDEFINED_VALUE: u32 = 0;

/// Setup PIN codes that are too easy to guess
pub const SETUP_PIN_CODE_BLACKLIST: [u32; 12] = [
    0, 11111111, 22222222, 33333333, 44444444, 55555555, 66666666, 77777777, 88888888,
    99999999, 12345678, 87654321,
];

// Manual pairing code layout

/// Chunk 1 (1 digit): discriminator bits 3..2 at 1..0, VID/PID flag at bit 2
pub const MANUAL_SETUP_CHUNK1_DISCRIMINATOR_MSBITS_POS: u32 = 0;
pub const MANUAL_SETUP_CHUNK1_DISCRIMINATOR_MSBITS_LENGTH: u32 = 2;
pub const MANUAL_SETUP_CHUNK1_VID_PID_PRESENT_BIT_POS: u32 =
    MANUAL_SETUP_CHUNK1_DISCRIMINATOR_MSBITS_POS + MANUAL_SETUP_CHUNK1_DISCRIMINATOR_MSBITS_LENGTH;

/// Chunk 2 (5 digits): PIN bits 13..0 at 13..0, discriminator bits 1..0 at 15..14
pub const MANUAL_SETUP_CHUNK2_PIN_CODE_LSBITS_POS: u32 = 0;
pub const MANUAL_SETUP_CHUNK2_PIN_CODE_LSBITS_LENGTH: u32 = 14;
pub const MANUAL_SETUP_CHUNK2_DISCRIMINATOR_LSBITS_POS: u32 =
    MANUAL_SETUP_CHUNK2_PIN_CODE_LSBITS_POS + MANUAL_SETUP_CHUNK2_PIN_CODE_LSBITS_LENGTH;
pub const MANUAL_SETUP_CHUNK2_DISCRIMINATOR_LSBITS_LENGTH: u32 = 2;

/// Chunk 3 (4 digits): PIN bits 26..14 at 12..0
pub const MANUAL_SETUP_CHUNK3_PIN_CODE_MSBITS_POS: u32 = 0;
pub const MANUAL_SETUP_CHUNK3_PIN_CODE_MSBITS_LENGTH: u32 = 13;

pub const MANUAL_SETUP_CODE_CHUNK1_CHAR_LENGTH: usize = 1;
pub const MANUAL_SETUP_CODE_CHUNK2_CHAR_LENGTH: usize = 5;
pub const MANUAL_SETUP_CODE_CHUNK3_CHAR_LENGTH: usize = 4;
pub const MANUAL_SETUP_VENDOR_ID_CHAR_LENGTH: usize = 5;
pub const MANUAL_SETUP_PRODUCT_ID_CHAR_LENGTH: usize = 5;

/// Digits of a short manual code, check digit excluded
pub const MANUAL_SETUP_SHORT_CODE_DIGITS: usize = MANUAL_SETUP_CODE_CHUNK1_CHAR_LENGTH
    + MANUAL_SETUP_CODE_CHUNK2_CHAR_LENGTH
    + MANUAL_SETUP_CODE_CHUNK3_CHAR_LENGTH;

/// Digits of a long manual code, check digit excluded
pub const MANUAL_SETUP_LONG_CODE_DIGITS: usize = MANUAL_SETUP_SHORT_CODE_DIGITS
    + MANUAL_SETUP_VENDOR_ID_CHAR_LENGTH
    + MANUAL_SETUP_PRODUCT_ID_CHAR_LENGTH;

/// Length of a short manual code including the check digit
pub const MANUAL_SETUP_SHORT_CODE_CHAR_LENGTH: usize = MANUAL_SETUP_SHORT_CODE_DIGITS + 1;

/// Length of a long manual code including the check digit
pub const MANUAL_SETUP_LONG_CODE_CHAR_LENGTH: usize = MANUAL_SETUP_LONG_CODE_DIGITS + 1;

/// Grouping separator accepted (and ignored) in manual codes
pub const MANUAL_CODE_SEPARATOR: char = '-';

// Optional data tags

/// First tag number of vendor-specific optional data
pub const VENDOR_TAG_START: u8 = 0x80;

pub const SERIAL_NUMBER_TAG: u8 = 0x00;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(TOTAL_PAYLOAD_DATA_SIZE_IN_BITS, 88);
        assert_eq!(TOTAL_PAYLOAD_DATA_SIZE_IN_BYTES, 11);
        assert_eq!(MANUAL_SETUP_SHORT_CODE_CHAR_LENGTH, 11);
        assert_eq!(MANUAL_SETUP_LONG_CODE_CHAR_LENGTH, 21);
        assert_eq!(MANUAL_SETUP_CHUNK1_VID_PID_PRESENT_BIT_POS, 2);
        assert_eq!(MANUAL_SETUP_CHUNK2_DISCRIMINATOR_LSBITS_POS, 14);
    }
}
