//! Bounds-checked, read-through access to an encoded buffer.
//!
//! Nothing here copies: every accessor reinterprets the borrowed bytes in
//! place, and the borrow keeps the backing buffer alive and unmodified for as
//! long as any view exists. Any offset or size that falls outside the buffer
//! produces the zero value for what was asked (empty sequence, empty text,
//! zero number) instead of failing.

use super::layout::{Reference, REFERENCE_SIZE};
use super::scalar::Scalar;
use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;

/// Largest header of any message type, and the size of the null buffer that
/// stands in for a header that failed validation.
pub const MAX_HEADER_SIZE: usize = 64;

static NULL: [u8; MAX_HEADER_SIZE] = [0u8; MAX_HEADER_SIZE];

/// Immutable view over an encoded buffer of known length.
#[derive(Clone, Copy)]
pub struct Reader<'a> {
    bytes: &'a [u8],
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }

    /// A reader over all-zero bytes; every read from it yields a zero value.
    pub fn null() -> Reader<'static> {
        Reader { bytes: &NULL }
    }

    /// True iff `[offset, offset + size)` lies within the buffer.
    #[inline(always)]
    pub fn is_valid_offset(&self, offset: u32, size: u32) -> bool {
        (offset as u64) + (size as u64) <= self.bytes.len() as u64
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// `size` bytes at `offset`, or `None` when out of range.
    #[inline]
    pub fn region(&self, offset: u32, size: u32) -> Option<&'a [u8]> {
        if !self.is_valid_offset(offset, size) {
            return None;
        }
        let start = offset as usize;
        Some(&self.bytes[start..start + size as usize])
    }

    #[inline]
    pub fn scalar<T: Scalar>(&self, offset: u32) -> T {
        self.region(offset, T::WIDTH)
            .map(T::read_le)
            .unwrap_or_default()
    }

    /// The reference triple stored at `offset`; zeroed when out of range.
    pub fn reference(&self, offset: u32) -> Reference {
        match self.region(offset, REFERENCE_SIZE) {
            Some(raw) => {
                let mut bytes = [0u8; REFERENCE_SIZE as usize];
                bytes.copy_from_slice(raw);
                Reference::from_bytes(bytes)
            }
            None => Reference::default(),
        }
    }

    /// Payload bytes a reference points at; empty when it points outside.
    pub fn bytes_at(&self, reference: Reference) -> &'a [u8] {
        self.region(reference.offset, reference.byte_size)
            .unwrap_or_default()
    }

    /// Payload as UTF-8 text; empty when out of range or not valid UTF-8.
    pub fn text_at(&self, reference: Reference) -> &'a str {
        std::str::from_utf8(self.bytes_at(reference)).unwrap_or_default()
    }

    /// Payload as a sequence of `T`. Trailing bytes that do not make a whole
    /// element are ignored.
    pub fn elements_at<T: Scalar>(&self, reference: Reference) -> Elements<'a, T> {
        Elements::new(self.bytes_at(reference))
    }
}

impl fmt::Debug for Reader<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reader")
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// A typed sequence read in place from a payload.
///
/// Elements are decoded on access, so the payload needs no particular
/// alignment. Copy out with `to_vec` before the backing buffer is released.
#[derive(Clone, Copy)]
pub struct Elements<'a, T: Scalar> {
    bytes: &'a [u8],
    _marker: PhantomData<T>,
}

impl<'a, T: Scalar> Elements<'a, T> {
    pub fn new(bytes: &'a [u8]) -> Self {
        let whole = bytes.len() - bytes.len() % T::WIDTH as usize;
        Self {
            bytes: &bytes[..whole],
            _marker: PhantomData,
        }
    }

    pub fn empty() -> Self {
        Self::new(&[])
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / T::WIDTH as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        let width = T::WIDTH as usize;
        let start = index.checked_mul(width)?;
        self.bytes.get(start..start.checked_add(width)?).map(T::read_le)
    }

    pub fn iter(&self) -> ElementsIter<'a, T> {
        ElementsIter {
            chunks: self.bytes.chunks_exact(T::WIDTH as usize),
            _marker: PhantomData,
        }
    }

    /// The raw little-endian payload
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Copy into owned storage.
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().collect()
    }
}

impl<'a, T: Scalar> IntoIterator for Elements<'a, T> {
    type Item = T;
    type IntoIter = ElementsIter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Scalar> PartialEq<[T]> for Elements<'_, T> {
    fn eq(&self, other: &[T]) -> bool {
        self.len() == other.len() && self.iter().zip(other).all(|(a, b)| a == *b)
    }
}

impl<T: Scalar, const N: usize> PartialEq<[T; N]> for Elements<'_, T> {
    fn eq(&self, other: &[T; N]) -> bool {
        *self == other[..]
    }
}

impl<T: Scalar> fmt::Debug for Elements<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

pub struct ElementsIter<'a, T: Scalar> {
    chunks: std::slice::ChunksExact<'a, u8>,
    _marker: PhantomData<T>,
}

impl<T: Scalar> Iterator for ElementsIter<'_, T> {
    type Item = T;

    #[inline]
    fn next(&mut self) -> Option<T> {
        self.chunks.next().map(T::read_le)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl<T: Scalar> DoubleEndedIterator for ElementsIter<'_, T> {
    fn next_back(&mut self) -> Option<T> {
        self.chunks.next_back().map(T::read_le)
    }
}

impl<T: Scalar> ExactSizeIterator for ElementsIter<'_, T> {}
impl<T: Scalar> FusedIterator for ElementsIter<'_, T> {}
