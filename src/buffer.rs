// SPDX-License-Identifier: MIT
//! Byte cursor primitives
//!
//! [`ByteWriter`] owns a single allocation sized up front and refuses to grow
//! past it; [`ByteReader`] walks a borrowed slice and reports every underrun
//! as [`CacheError::CorruptFormat`]. All values are little-endian.

use crate::error::{CacheError, Result};

/// Fixed-capacity little-endian writer
#[derive(Debug)]
pub struct ByteWriter {
    buf: Vec<u8>,
    limit: usize,
}

impl ByteWriter {
    /// Allocate exactly `len` bytes up front
    pub fn with_exact_capacity(len: usize) -> Result<Self> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| CacheError::AllocationFailure { requested: len })?;
        Ok(Self { buf, limit: len })
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit - self.buf.len()
    }

    #[inline]
    fn reserve(&self, n: usize) -> Result<()> {
        if n > self.remaining() {
            return Err(CacheError::Layout {
                expected: self.limit,
                actual: self.buf.len().saturating_add(n),
            });
        }
        Ok(())
    }

    #[inline]
    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.reserve(bytes.len())?;
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    #[inline]
    pub fn put_u8(&mut self, v: u8) -> Result<()> {
        self.put_bytes(&[v])
    }

    #[inline]
    pub fn put_u32(&mut self, v: u32) -> Result<()> {
        self.put_bytes(&v.to_le_bytes())
    }

    #[inline]
    pub fn put_u64(&mut self, v: u64) -> Result<()> {
        self.put_bytes(&v.to_le_bytes())
    }

    pub fn put_u32_slice(&mut self, values: &[u32]) -> Result<()> {
        self.reserve(values.len() * 4)?;
        for v in values {
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
        Ok(())
    }

    pub fn put_f32_slice(&mut self, values: &[f32]) -> Result<()> {
        self.reserve(values.len() * 4)?;
        for v in values {
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
        Ok(())
    }

    pub fn put_f64_slice(&mut self, values: &[f64]) -> Result<()> {
        self.reserve(values.len() * 8)?;
        for v in values {
            self.buf.extend_from_slice(&v.to_le_bytes());
        }
        Ok(())
    }

    /// Length-prefixed (u32) count for a column or list
    pub fn put_len(&mut self, len: usize) -> Result<()> {
        let len = u32::try_from(len)
            .map_err(|_| CacheError::Unencodable(format!("count {len} exceeds u32 range")))?;
        self.put_u32(len)
    }

    /// Return the buffer, failing if fewer bytes were written than reserved
    pub fn finish(self) -> Result<Vec<u8>> {
        if self.buf.len() != self.limit {
            return Err(CacheError::Layout {
                expected: self.limit,
                actual: self.buf.len(),
            });
        }
        Ok(self.buf)
    }
}

/// Bounds-checked little-endian reader over a borrowed slice
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.pos == self.data.len()
    }

    /// Fail unless every byte has been consumed
    pub fn expect_exhausted(&self, what: &str) -> Result<()> {
        if !self.is_exhausted() {
            return Err(CacheError::corrupt(format!(
                "{what}: {} trailing bytes",
                self.remaining()
            )));
        }
        Ok(())
    }

    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.remaining() {
            return Err(CacheError::corrupt(format!(
                "unexpected end of data at byte {}: need {}, have {}",
                self.pos,
                n,
                self.remaining()
            )));
        }
        let out = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    #[inline]
    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    #[inline]
    pub fn read_u64(&mut self) -> Result<u64> {
        self.read_array().map(u64::from_le_bytes)
    }

    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read_array().map(f32::from_le_bytes)
    }

    #[inline]
    pub fn read_f64(&mut self) -> Result<f64> {
        self.read_array().map(f64::from_le_bytes)
    }

    /// Read a u32 count and check that `count * elem_size` bytes remain
    ///
    /// Guards allocations sized from untrusted counts.
    pub fn read_count(&mut self, elem_size: usize) -> Result<usize> {
        let count = self.read_u32()? as usize;
        self.ensure_elements(count, elem_size)?;
        Ok(count)
    }

    fn ensure_elements(&self, count: usize, elem_size: usize) -> Result<()> {
        let needed = count
            .checked_mul(elem_size)
            .ok_or_else(|| CacheError::corrupt(format!("element count {count} overflows")))?;
        if needed > self.remaining() {
            return Err(CacheError::corrupt(format!(
                "{count} elements of {elem_size} bytes exceed remaining {} bytes",
                self.remaining()
            )));
        }
        Ok(())
    }

    pub fn read_u8_vec(&mut self, count: usize) -> Result<Vec<u8>> {
        Ok(self.read_bytes(count)?.to_vec())
    }

    pub fn read_u32_vec(&mut self, count: usize) -> Result<Vec<u32>> {
        self.ensure_elements(count, 4)?;
        let bytes = self.read_bytes(count * 4)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    pub fn read_u64_vec(&mut self, count: usize) -> Result<Vec<u64>> {
        self.ensure_elements(count, 8)?;
        let bytes = self.read_bytes(count * 8)?;
        Ok(bytes
            .chunks_exact(8)
            .map(|c| u64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]))
            .collect())
    }

    pub fn read_f32_vec(&mut self, count: usize) -> Result<Vec<f32>> {
        self.ensure_elements(count, 4)?;
        let bytes = self.read_bytes(count * 4)?;
        Ok(bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }

    pub fn read_f64_vec(&mut self, count: usize) -> Result<Vec<f64>> {
        self.read_u64_vec(count)
            .map(|bits| bits.into_iter().map(f64::from_bits).collect())
    }
}
