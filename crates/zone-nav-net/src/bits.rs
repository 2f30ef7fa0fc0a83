//! MSB-first bit streams.
//!
//! Writers pad the final byte with zero bits; readers therefore see up to seven extra bits at
//! the end of a payload.

use crate::WireError;

/// Bits needed to store any value in `0..=range`.
pub fn bits_for_range(range: u32) -> u8 {
    (u32::BITS - range.leading_zeros()) as u8
}

pub trait BitWrite {
    /// Append the low `bits` bits of `value`, most significant first. `bits` is at most 32.
    fn write_bits(&mut self, value: u32, bits: u8);

    fn write_bool(&mut self, value: bool) {
        self.write_bits(u32::from(value), 1);
    }

    fn write_u16(&mut self, value: u16) {
        self.write_bits(u32::from(value), 16);
    }

    fn write_f32(&mut self, value: f32) {
        self.write_bits(value.to_bits(), 32);
    }

    /// Write `value` relative to `min` using just enough bits for `min..=max`.
    fn write_ranged(&mut self, value: u32, min: u32, max: u32) -> Result<(), WireError> {
        if value < min || value > max {
            return Err(WireError::OutOfRange {
                value: i64::from(value),
                min: i64::from(min),
                max: i64::from(max),
            });
        }
        self.write_bits(value - min, bits_for_range(max - min));
        Ok(())
    }

    /// Two's complement in `bits` bits.
    fn write_signed(&mut self, value: i32, bits: u8) -> Result<(), WireError> {
        let (min, max) = signed_bounds(bits);
        let wide = i64::from(value);
        if wide < min || wide > max {
            return Err(WireError::OutOfRange {
                value: wide,
                min,
                max,
            });
        }
        let mask = if bits >= 32 { u32::MAX } else { (1u32 << bits) - 1 };
        self.write_bits(value as u32 & mask, bits);
        Ok(())
    }
}

pub trait BitRead {
    fn read_bits(&mut self, bits: u8) -> Result<u32, WireError>;

    /// Bits not yet consumed, padding included.
    fn remaining_bits(&self) -> usize;

    fn read_bool(&mut self) -> Result<bool, WireError> {
        Ok(self.read_bits(1)? == 1)
    }

    fn read_u16(&mut self) -> Result<u16, WireError> {
        Ok(self.read_bits(16)? as u16)
    }

    fn read_f32(&mut self) -> Result<f32, WireError> {
        Ok(f32::from_bits(self.read_bits(32)?))
    }

    fn read_ranged(&mut self, min: u32, max: u32) -> Result<u32, WireError> {
        let offset = self.read_bits(bits_for_range(max.saturating_sub(min)))?;
        let value = min.saturating_add(offset);
        if value > max {
            return Err(WireError::OutOfRange {
                value: i64::from(value),
                min: i64::from(min),
                max: i64::from(max),
            });
        }
        Ok(value)
    }

    fn read_signed(&mut self, bits: u8) -> Result<i32, WireError> {
        let raw = self.read_bits(bits)?;
        if bits == 0 || bits >= 32 {
            return Ok(raw as i32);
        }
        // Sign-extend from `bits`.
        let shift = 32 - u32::from(bits);
        Ok(((raw << shift) as i32) >> shift)
    }
}

fn signed_bounds(bits: u8) -> (i64, i64) {
    match bits {
        0 => (0, 0),
        b => {
            let b = u32::from(b.min(32));
            (-(1i64 << (b - 1)), (1i64 << (b - 1)) - 1)
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    bytes: Vec<u8>,
    bit_len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl BitWrite for BitWriter {
    fn write_bits(&mut self, value: u32, bits: u8) {
        debug_assert!(bits <= 32);
        for i in (0..bits.min(32)).rev() {
            if self.bit_len % 8 == 0 {
                self.bytes.push(0);
            }
            if (value >> i) & 1 == 1 {
                let last = self.bytes.len() - 1;
                self.bytes[last] |= 0x80 >> (self.bit_len % 8);
            }
            self.bit_len += 1;
        }
    }
}

#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Whole bytes left after the current position (a partially read byte does not count).
    pub fn unread_bytes(&self) -> usize {
        self.remaining_bits() / 8
    }
}

impl BitRead for BitReader<'_> {
    fn read_bits(&mut self, bits: u8) -> Result<u32, WireError> {
        let needed = usize::from(bits.min(32));
        let remaining = self.remaining_bits();
        if needed > remaining {
            return Err(WireError::UnexpectedEnd { needed, remaining });
        }
        let mut value = 0u32;
        for _ in 0..needed {
            let byte = self.bytes[self.pos / 8];
            let bit = (byte >> (7 - self.pos % 8)) & 1;
            value = (value << 1) | u32::from(bit);
            self.pos += 1;
        }
        Ok(value)
    }

    fn remaining_bits(&self) -> usize {
        self.bytes.len() * 8 - self.pos
    }
}
