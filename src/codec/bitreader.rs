//! RBSP bit reader shared by the SPS, SEI and slice-header parsers
//!
//! ## Exp-Golomb Codes
//!
//! Parameter sets and slice headers encode most fields as Exp-Golomb codes.
//!
//! - ue(v): `[M zeros][1][M bits]`, value = `2^M - 1 + bits`
//! - se(v): ue(v) mapped 0, 1, -1, 2, -2, ...
//!
//! Emulation prevention bytes must be stripped (see [`unescape_rbsp`])
//! before the payload is handed to [`RbspReader`].

use crate::error::{Error, Result};

/// MSB-first reader over unescaped RBSP bytes
pub struct RbspReader<'a> {
    data: &'a [u8],
    /// Bit cursor from the start of `data`
    cursor: usize,
}

impl<'a> RbspReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        RbspReader { data, cursor: 0 }
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn bits_left(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.cursor)
    }

    fn ensure(&self, n: usize) -> Result<()> {
        if n > self.bits_left() {
            return Err(Error::bitstream(format!(
                "RBSP exhausted: need {} bits at bit {}, {} left",
                n,
                self.cursor,
                self.bits_left()
            )));
        }
        Ok(())
    }

    pub fn read_bit(&mut self) -> Result<u8> {
        self.ensure(1)?;
        let byte = self.data[self.cursor / 8];
        let bit = (byte >> (7 - self.cursor % 8)) & 1;
        self.cursor += 1;
        Ok(bit)
    }

    /// Up to 32 bits as an unsigned value
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        if n > 32 {
            return Err(Error::bitstream(format!("Cannot read {} bits at once", n)));
        }
        self.ensure(n as usize)?;

        let mut value = 0u64;
        let mut remaining = n as usize;
        while remaining > 0 {
            let offset = self.cursor % 8;
            let take = (8 - offset).min(remaining);
            let byte = self.data[self.cursor / 8] as u64;
            let bits = (byte >> (8 - offset - take)) & ((1 << take) - 1);
            value = (value << take) | bits;
            self.cursor += take;
            remaining -= take;
        }
        Ok(value as u32)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_bit()? == 1)
    }

    /// ue(v)
    pub fn read_ue(&mut self) -> Result<u32> {
        let mut zeros = 0u32;
        while self.read_bit()? == 0 {
            zeros += 1;
            if zeros > 31 {
                return Err(Error::bitstream("Exp-Golomb prefix longer than 31 bits"));
            }
        }
        let suffix = self.read_bits(zeros)? as u64;
        Ok(((1u64 << zeros) - 1 + suffix) as u32)
    }

    /// se(v)
    pub fn read_se(&mut self) -> Result<i32> {
        let k = self.read_ue()? as i64;
        let magnitude = (k + 1) / 2;
        Ok(if k & 1 == 1 { magnitude } else { -magnitude } as i32)
    }

    pub fn skip_bits(&mut self, n: usize) -> Result<()> {
        self.ensure(n)?;
        self.cursor += n;
        Ok(())
    }
}

/// Drop the 0x03 emulation prevention byte that follows every `00 00`
/// inside a NAL unit payload
pub fn unescape_rbsp(data: &[u8]) -> Vec<u8> {
    let mut rbsp = Vec::with_capacity(data.len());
    let mut zeros = 0usize;

    for &byte in data {
        if zeros >= 2 && byte == 0x03 {
            zeros = 0;
            continue;
        }
        zeros = if byte == 0 { zeros + 1 } else { 0 };
        rbsp.push(byte);
    }

    rbsp
}
