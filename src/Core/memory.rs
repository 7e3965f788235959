// Linear memory of one isolated memory space.
// Addresses are plain u32 offsets from the start of the region.

use crate::error::{Error, Result};

/// Size of one memory page in bytes.
pub const PAGE_SIZE: usize = 64 * 1024;

/// Hard ceiling on pages, the whole 32-bit address space.
pub const MAX_PAGES: u32 = 65536;

/// A contiguous, page-granular byte region that only ever grows.
///
/// New pages are zero-initialised. Growing may move the backing storage, so
/// slices obtained before a `grow` must not be held across it; the borrow
/// checker enforces this for every accessor below.
pub struct LinearMemory {
    data: Vec<u8>,
    max_pages: u32,
}

impl LinearMemory {
    /// Create a memory of `initial_pages` that may grow up to `max_pages`.
    pub fn new(initial_pages: u32, max_pages: u32) -> Result<Self> {
        if max_pages > MAX_PAGES {
            return Err(Error::InvalidConfig(format!(
                "max_pages {} exceeds the 32-bit address space ({} pages)",
                max_pages, MAX_PAGES
            )));
        }
        if initial_pages > max_pages {
            return Err(Error::InvalidConfig(format!(
                "initial_pages {} larger than max_pages {}",
                initial_pages, max_pages
            )));
        }

        Ok(Self {
            data: vec![0u8; initial_pages as usize * PAGE_SIZE],
            max_pages,
        })
    }

    /// Grow by `delta` pages. Returns the previous page count, or `None` when
    /// the maximum would be exceeded (the memory is left untouched).
    pub fn grow(&mut self, delta: u32) -> Option<u32> {
        let previous = self.pages();
        let wanted = previous.checked_add(delta)?;
        if wanted > self.max_pages {
            return None;
        }
        self.data.resize(wanted as usize * PAGE_SIZE, 0);
        Some(previous)
    }

    /// Current size in pages
    pub fn pages(&self) -> u32 {
        (self.data.len() / PAGE_SIZE) as u32
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Current size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// True iff `[address, address + length)` lies inside the memory.
    pub fn contains(&self, address: u32, length: u32) -> bool {
        (address as u64) + (length as u64) <= self.data.len() as u64
    }

    /// Borrow `length` bytes at `address`, or `None` if out of range.
    pub fn read(&self, address: u32, length: u32) -> Option<&[u8]> {
        if !self.contains(address, length) {
            return None;
        }
        let start = address as usize;
        Some(&self.data[start..start + length as usize])
    }

    /// Mutably borrow `length` bytes at `address`, or `None` if out of range.
    pub fn read_mut(&mut self, address: u32, length: u32) -> Option<&mut [u8]> {
        if !self.contains(address, length) {
            return None;
        }
        let start = address as usize;
        Some(&mut self.data[start..start + length as usize])
    }

    /// Copy `bytes` into memory at `address`.
    pub fn write(&mut self, address: u32, bytes: &[u8]) -> Result<()> {
        let memory_size = self.data.len();
        let length = u32::try_from(bytes.len()).map_err(|_| Error::TooLarge(bytes.len()))?;
        let dst = self.read_mut(address, length).ok_or(Error::OutOfBounds {
            address,
            length,
            memory_size,
        })?;
        dst.copy_from_slice(bytes);
        Ok(())
    }

    /// The whole memory, as the other side of the boundary sees it.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Zero every byte without changing the size.
    pub fn clear(&mut self) {
        self.data.fill(0);
    }
}
