//! Little-endian bit packing

use chip_core::{ChipError, ChipResult};

/// Packs fields into a byte buffer, least significant bit first
pub(crate) struct BitWriter {
    buffer: Vec<u8>,
    offset: usize,
}

impl BitWriter {
    pub(crate) fn new(size_in_bytes: usize) -> Self {
        Self {
            buffer: vec![0; size_in_bytes],
            offset: 0,
        }
    }

    pub(crate) fn put(&mut self, value: u64, bits: usize) -> ChipResult<()> {
        if bits < 64 && value >> bits != 0 {
            return Err(ChipError::InvalidPayload(format!(
                "Value {} does not fit in {} bits",
                value, bits
            )));
        }
        if self.offset + bits > self.buffer.len() * 8 {
            return Err(ChipError::InvalidPayload(
                "Bit field overflows payload buffer".to_string(),
            ));
        }
        for i in 0..bits {
            if value & (1 << i) != 0 {
                let position = self.offset + i;
                self.buffer[position / 8] |= 1 << (position % 8);
            }
        }
        self.offset += bits;
        Ok(())
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

/// Reads fields packed by [`BitWriter`]
pub(crate) struct BitReader<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> BitReader<'a> {
    pub(crate) fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    pub(crate) fn read(&mut self, bits: usize) -> ChipResult<u64> {
        if self.offset + bits > self.buffer.len() * 8 {
            return Err(ChipError::UnrecognizedQrCode(
                "Payload too short for bit field".to_string(),
            ));
        }
        let mut value = 0u64;
        for i in 0..bits {
            let position = self.offset + i;
            if self.buffer[position / 8] & (1 << (position % 8)) != 0 {
                value |= 1 << i;
            }
        }
        self.offset += bits;
        Ok(value)
    }
}
