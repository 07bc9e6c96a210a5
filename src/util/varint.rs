//! Variable-length integer encoding utilities.
//!
//! Values are written in 7-bit groups, least significant group first, with the
//! high bit of each byte set when more bytes follow. Term lists use this for
//! the document length, the entry count and every unpacked wdf.

use crate::error::{IrisError, Result};

/// Encode a u64 value using variable-length encoding.
pub fn encode_u64(value: u64) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(10);
    write_u64(&mut bytes, value);
    bytes
}

/// Append the variable-length encoding of `value` to `out`.
pub fn write_u64(out: &mut Vec<u8>, value: u64) {
    let mut val = value;

    loop {
        let mut byte = (val & 0x7F) as u8;
        val >>= 7;

        if val != 0 {
            byte |= 0x80; // Set continuation bit
        }

        out.push(byte);

        if val == 0 {
            break;
        }
    }
}

/// Decode a u64 value from variable-length encoding.
///
/// Returns the value and the number of bytes consumed.
pub fn decode_u64(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut result = 0u64;
    let mut shift = 0u32;
    let mut bytes_read = 0;

    for &byte in bytes {
        bytes_read += 1;

        let group = (byte & 0x7F) as u64;
        if shift >= 64 || (shift > 0 && group >> (64 - shift) != 0) {
            return Err(IrisError::corrupt_data("VarInt overflow"));
        }

        result |= group << shift;

        if (byte & 0x80) == 0 {
            return Ok((result, bytes_read));
        }

        shift += 7;
    }

    Err(IrisError::corrupt_data("Incomplete VarInt"))
}

/// Decode a u32 value, rejecting encodings that do not fit.
pub fn decode_u32(bytes: &[u8]) -> Result<(u32, usize)> {
    let (value, read) = decode_u64(bytes)?;
    let value = u32::try_from(value)
        .map_err(|_| IrisError::corrupt_data(format!("VarInt {value} overflows u32")))?;
    Ok((value, read))
}
