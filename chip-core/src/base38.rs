//! Base38 encoding for QR code payloads
//!
//! The input is split into chunks of at most 3 bytes. Each chunk is read as a
//! little-endian integer and written out least-significant digit first, using
//! a fixed number of characters that depends only on the chunk length:
//!
//! | bytes in chunk | characters |
//! |----------------|------------|
//! | 1              | 2          |
//! | 2              | 4          |
//! | 3              | 5          |

use crate::error::{ChipError, ChipResult};

/// Base38 alphabet, value = index
pub const BASE38_ALPHABET: &[u8; 38] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-.";

const RADIX: u32 = 38;
const MAX_BYTES_IN_CHUNK: usize = 3;
const MAX_CHARS_IN_CHUNK: usize = 5;

/// Characters needed to encode a chunk of `index + 1` bytes
const CHARS_NEEDED_IN_CHUNK: [usize; MAX_BYTES_IN_CHUNK] = [2, 4, 5];

/// Number of characters produced when encoding `len` bytes
pub fn encoded_len(len: usize) -> usize {
    let full = (len / MAX_BYTES_IN_CHUNK) * MAX_CHARS_IN_CHUNK;
    match len % MAX_BYTES_IN_CHUNK {
        0 => full,
        rem => full + CHARS_NEEDED_IN_CHUNK[rem - 1],
    }
}

/// Encode bytes to a Base38 string
pub fn encode(bytes: &[u8]) -> String {
    let mut result = String::with_capacity(encoded_len(bytes.len()));

    for chunk in bytes.chunks(MAX_BYTES_IN_CHUNK) {
        let mut value = chunk
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, &b)| acc | (u32::from(b) << (8 * i)));

        for _ in 0..CHARS_NEEDED_IN_CHUNK[chunk.len() - 1] {
            result.push(char::from(BASE38_ALPHABET[(value % RADIX) as usize]));
            value /= RADIX;
        }
    }

    result
}

/// Decode a Base38 string to bytes
///
/// # Errors
///
/// Returns `ChipError::InvalidBase38` if:
/// - a character is outside the alphabet
/// - the trailing chunk has 1 or 3 characters
/// - a chunk decodes to a value that does not fit in its byte count
pub fn decode(text: &str) -> ChipResult<Vec<u8>> {
    let chars = text.as_bytes();
    let mut result = Vec::with_capacity(chars.len() * MAX_BYTES_IN_CHUNK / MAX_CHARS_IN_CHUNK + 1);
    let mut offset = 0;

    while offset < chars.len() {
        let remaining = chars.len() - offset;
        let (chars_in_chunk, bytes_in_chunk) = match remaining {
            r if r >= MAX_CHARS_IN_CHUNK => (MAX_CHARS_IN_CHUNK, 3),
            4 => (4, 2),
            2 => (2, 1),
            r => {
                return Err(ChipError::InvalidBase38(format!(
                    "Invalid trailing chunk of {} characters at offset {}",
                    r, offset
                )));
            }
        };

        let mut value = 0u32;
        for i in (0..chars_in_chunk).rev() {
            value = value * RADIX + u32::from(decode_char(chars[offset + i])?);
        }

        for _ in 0..bytes_in_chunk {
            result.push((value & 0xFF) as u8);
            value >>= 8;
        }

        if value > 0 {
            return Err(ChipError::InvalidBase38(format!(
                "Chunk at offset {} is out of range for {} bytes",
                offset, bytes_in_chunk
            )));
        }

        offset += chars_in_chunk;
    }

    Ok(result)
}

fn decode_char(c: u8) -> ChipResult<u8> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'A'..=b'Z' => Ok(c - b'A' + 10),
        b'-' => Ok(36),
        b'.' => Ok(37),
        _ => Err(ChipError::InvalidBase38(format!(
            "Invalid character 0x{:02X}",
            c
        ))),
    }
}
