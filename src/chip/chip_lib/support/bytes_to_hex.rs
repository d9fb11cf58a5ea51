use crate::chip_error_buffer_too_small;
use crate::chip_error_invalid_argument;
use crate::verify_or_return_error;
use crate::ChipError;
use crate::ChipErrorResult;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

pub const K_UINT64_HEX_LENGTH: usize = 16;
pub const K_UINT32_HEX_LENGTH: usize = 8;

// Matter DN attribute values cross into DER as fixed-width uppercase hex.

pub fn uint64_to_hex(value: u64, out: &mut [u8]) -> ChipErrorResult {
    verify_or_return_error!(
        out.len() >= K_UINT64_HEX_LENGTH,
        Err(chip_error_buffer_too_small!())
    );
    for (i, b) in out.iter_mut().take(K_UINT64_HEX_LENGTH).enumerate() {
        let nibble = ((value >> ((15 - i) * 4)) & 0xF) as usize;
        *b = HEX_DIGITS[nibble];
    }
    Ok(())
}

pub fn uint32_to_hex(value: u32, out: &mut [u8]) -> ChipErrorResult {
    verify_or_return_error!(
        out.len() >= K_UINT32_HEX_LENGTH,
        Err(chip_error_buffer_too_small!())
    );
    for (i, b) in out.iter_mut().take(K_UINT32_HEX_LENGTH).enumerate() {
        let nibble = ((value >> ((7 - i) * 4)) & 0xF) as usize;
        *b = HEX_DIGITS[nibble];
    }
    Ok(())
}

fn hex_digit_value(digit: u8) -> Result<u64, ChipError> {
    match digit {
        b'0'..=b'9' => Ok((digit - b'0') as u64),
        b'A'..=b'F' => Ok((digit - b'A' + 10) as u64),
        _ => Err(chip_error_invalid_argument!()),
    }
}

pub fn hex_to_uint64(hex: &[u8]) -> Result<u64, ChipError> {
    verify_or_return_error!(
        hex.len() == K_UINT64_HEX_LENGTH,
        Err(chip_error_invalid_argument!())
    );
    let mut value: u64 = 0;
    for digit in hex {
        value = (value << 4) | hex_digit_value(*digit)?;
    }
    Ok(value)
}

pub fn hex_to_uint32(hex: &[u8]) -> Result<u32, ChipError> {
    verify_or_return_error!(
        hex.len() == K_UINT32_HEX_LENGTH,
        Err(chip_error_invalid_argument!())
    );
    let mut value: u32 = 0;
    for digit in hex {
        value = (value << 4) | hex_digit_value(*digit)? as u32;
    }
    Ok(value)
}
