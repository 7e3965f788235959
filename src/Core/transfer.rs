// Pointer/length packing for values returned across the boundary.

use std::fmt;

/// An address and a byte length packed into one 64-bit word:
/// `(address << 32) | length`.
///
/// This is the only form in which a reference to a buffer crosses the
/// boundary. The all-zero word means "no buffer" because no allocator hands
/// out address `0`.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TransferWord(u64);

impl TransferWord {
    /// Returned by a processing call that failed before producing a response.
    pub const NONE: TransferWord = TransferWord(0);

    #[inline(always)]
    pub const fn pack(address: u32, length: u32) -> Self {
        Self(((address as u64) << 32) | length as u64)
    }

    /// Pack values held in native-width integers.
    ///
    /// # Panics
    /// If either value does not fit in 32 bits. That can only come from a
    /// caller bug, never from input data.
    pub fn pack_usize(address: usize, length: usize) -> Self {
        assert!(
            address <= u32::MAX as usize,
            "address {:#x} does not fit in a transfer word",
            address
        );
        assert!(
            length <= u32::MAX as usize,
            "length {} does not fit in a transfer word",
            length
        );
        Self::pack(address as u32, length as u32)
    }

    #[inline(always)]
    pub const fn unpack(self) -> (u32, u32) {
        ((self.0 >> 32) as u32, (self.0 & 0xFFFF_FFFF) as u32)
    }

    #[inline(always)]
    pub const fn address(self) -> u32 {
        (self.0 >> 32) as u32
    }

    #[inline(always)]
    pub const fn length(self) -> u32 {
        self.0 as u32
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub const fn from_raw(word: u64) -> Self {
        Self(word)
    }

    #[inline(always)]
    pub const fn into_raw(self) -> u64 {
        self.0
    }
}

impl From<u64> for TransferWord {
    fn from(word: u64) -> Self {
        Self(word)
    }
}

impl From<TransferWord> for u64 {
    fn from(word: TransferWord) -> Self {
        word.0
    }
}

impl fmt::Debug for TransferWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferWord")
            .field("address", &format_args!("{:#x}", self.address()))
            .field("length", &self.length())
            .finish()
    }
}
