//! Growable output buffer for encoding messages.

use super::layout::{Reference, REFERENCE_SIZE};
use super::scalar::Scalar;
use crate::error::{Error, Result};

/// Append-only byte buffer.
///
/// `alloc` hands out monotonically increasing, non-overlapping regions; the
/// `*_at` stores write into regions the writer already handed out. An optional
/// limit turns growth past it into `Error::OutOfMemory`.
pub struct Writer {
    buffer: Vec<u8>,
    limit: usize,
}

impl Writer {
    /// Writer with `capacity` bytes preallocated and no limit beyond the
    /// 32-bit offset space.
    pub fn new(capacity: usize) -> Self {
        Self::with_limit(capacity, u32::MAX as usize)
    }

    /// Writer that refuses to grow past `limit` bytes.
    pub fn with_limit(capacity: usize, limit: usize) -> Self {
        let limit = limit.min(u32::MAX as usize);
        Self {
            buffer: Vec::with_capacity(capacity.min(limit)),
            limit,
        }
    }

    /// Reserve `size` zeroed bytes at the end and return their offset.
    pub fn alloc(&mut self, size: u32) -> Result<u32> {
        let offset = self.buffer.len();
        let end = offset as u64 + size as u64;
        if end > self.limit as u64 {
            return Err(Error::OutOfMemory {
                requested: size as u64,
                limit: self.limit as u64,
            });
        }
        self.buffer.resize(end as usize, 0);
        Ok(offset as u32)
    }

    /// Store raw bytes at `offset`.
    ///
    /// # Panics
    /// If the range was never allocated; that is an encoder bug.
    #[inline]
    pub fn write_at(&mut self, offset: u32, bytes: &[u8]) {
        let start = offset as usize;
        self.buffer[start..start + bytes.len()].copy_from_slice(bytes);
    }

    #[inline]
    pub fn write_scalar_at<T: Scalar>(&mut self, offset: u32, value: T) {
        let start = offset as usize;
        value.write_le(&mut self.buffer[start..start + T::WIDTH as usize]);
    }

    #[inline]
    pub fn write4_at(&mut self, offset: u32, value: u32) {
        self.write_scalar_at(offset, value);
    }

    pub fn write_reference_at(&mut self, offset: u32, target: Reference) {
        debug_assert!(
            target.element_stride == 0 || target.byte_size % target.element_stride == 0,
            "payload size {} is not a multiple of stride {}",
            target.byte_size,
            target.element_stride
        );
        let start = offset as usize;
        self.buffer[start..start + REFERENCE_SIZE as usize].copy_from_slice(&target.to_bytes());
    }

    /// Allocate a payload for `items`, copy them in and point the header slot
    /// at `slot` to it.
    pub fn write_sequence<T: Scalar>(&mut self, slot: u32, items: &[T]) -> Result<Reference> {
        let byte_size = payload_size(items.len(), T::WIDTH)?;
        let offset = self.alloc(byte_size)?;
        let mut cursor = offset as usize;
        for item in items {
            let end = cursor + T::WIDTH as usize;
            item.write_le(&mut self.buffer[cursor..end]);
            cursor = end;
        }
        let reference = Reference::new(offset, byte_size, T::WIDTH);
        self.write_reference_at(slot, reference);
        Ok(reference)
    }

    /// Byte sequences and text: stride 1, copied verbatim.
    pub fn write_bytes(&mut self, slot: u32, bytes: &[u8]) -> Result<Reference> {
        let byte_size = payload_size(bytes.len(), 1)?;
        let offset = self.alloc(byte_size)?;
        self.write_at(offset, bytes);
        let reference = Reference::new(offset, byte_size, 1);
        self.write_reference_at(slot, reference);
        Ok(reference)
    }

    /// Everything written so far
    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Forget all content but keep the allocation for reuse.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}

fn payload_size(count: usize, width: u32) -> Result<u32> {
    let size = count as u64 * width as u64;
    u32::try_from(size).map_err(|_| Error::TooLarge(size as usize))
}
