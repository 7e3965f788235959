use crate::error::{Error, Result};
use crate::Core::memory::{LinearMemory, PAGE_SIZE};
use std::collections::BTreeMap;
mod debug;
mod getters;

/// Lowest address ever handed out. Everything below it stays unused so that
/// address `0` can signal a failed allocation across the boundary.
pub const HEAP_BASE: u32 = 16;

/// Every block starts on this boundary.
pub const BLOCK_ALIGN: u32 = 8;

/// A live buffer in the ownership table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationEntry {
    /// Address of the first byte, also the table key.
    pub address: u32,
    /// Size requested by the caller; the only bytes the buffer exposes.
    pub size: u32,
    /// Bytes actually reserved (size rounded up to `BLOCK_ALIGN`).
    pub capacity: u32,
    /// Allocation sequence number; tells a recycled address from the original.
    pub generation: u64,
}

/// Ownership table for one memory space.
///
/// Maps each live address to the region backing it inside the space's
/// `LinearMemory`. Released regions are coalesced and reused first-fit; when
/// none fits, the heap top is bumped and memory grows page-wise up to its
/// maximum. Two live entries never overlap, and a live address is never handed
/// out again until it is released.
pub struct Allocator {
    memory: LinearMemory,
    live: BTreeMap<u32, AllocationEntry>,
    /// Free regions below `top`, keyed by address, valued by length.
    free: BTreeMap<u32, u32>,
    top: u32,
    next_generation: u64,
}

impl Allocator {
    /// Create an empty table over a fresh memory.
    pub fn new(initial_pages: u32, max_pages: u32) -> Result<Self> {
        Ok(Self::with_memory(LinearMemory::new(initial_pages, max_pages)?))
    }

    /// Take ownership of an existing memory. Its contents are left as-is but
    /// nothing in it is considered allocated.
    pub fn with_memory(memory: LinearMemory) -> Self {
        Self {
            memory,
            live: BTreeMap::new(),
            free: BTreeMap::new(),
            top: HEAP_BASE,
            next_generation: 1,
        }
    }

    /// Reserve a zero-initialised buffer of `size` bytes and return its address.
    ///
    /// Zero-sized requests still reserve one block so the address stays unique.
    pub fn allocate(&mut self, size: u32) -> Result<u32> {
        let capacity = align_up(size.max(1) as u64, BLOCK_ALIGN as u64);
        if capacity > u32::MAX as u64 {
            return Err(self.exhausted(size));
        }
        let capacity = capacity as u32;

        let address = match self.take_free(capacity) {
            Some(address) => address,
            None => self.bump(capacity).ok_or_else(|| self.exhausted(size))?,
        };

        if let Some(region) = self.memory.read_mut(address, capacity) {
            region.fill(0);
        }

        let generation = self.next_generation;
        self.next_generation += 1;
        self.live.insert(
            address,
            AllocationEntry {
                address,
                size,
                capacity,
                generation,
            },
        );

        tracing::debug!(address, size, generation, "allocated");
        Ok(address)
    }

    /// Unregister the buffer at `address`. Unknown addresses are ignored.
    pub fn free(&mut self, address: u32) {
        let Some(entry) = self.live.remove(&address) else {
            tracing::warn!(address, "free of unknown address ignored");
            return;
        };
        tracing::debug!(address, size = entry.size, "freed");
        self.insert_free(entry.address, entry.capacity);
    }

    /// The bytes of a live buffer, exactly `size` long.
    pub fn buffer(&self, address: u32) -> Option<&[u8]> {
        let entry = self.live.get(&address)?;
        self.memory.read(entry.address, entry.size)
    }

    pub fn buffer_mut(&mut self, address: u32) -> Option<&mut [u8]> {
        let entry = *self.live.get(&address)?;
        self.memory.read_mut(entry.address, entry.size)
    }

    /// Drop every entry and zero the memory. The memory keeps its size.
    pub fn reset(&mut self) {
        self.live.clear();
        self.free.clear();
        self.top = HEAP_BASE;
        self.memory.clear();
    }

    pub fn memory(&self) -> &LinearMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut LinearMemory {
        &mut self.memory
    }

    fn exhausted(&self, requested: u32) -> Error {
        tracing::error!(
            requested,
            pages = self.memory.pages(),
            max_pages = self.memory.max_pages(),
            "allocator exhausted"
        );
        Error::OutOfMemory {
            requested: requested as u64,
            limit: self.memory.max_pages() as u64 * PAGE_SIZE as u64,
        }
    }

    // First-fit over the free list; the tail of a larger region stays free.
    fn take_free(&mut self, capacity: u32) -> Option<u32> {
        let (&address, &length) = self.free.iter().find(|(_, len)| **len >= capacity)?;
        self.free.remove(&address);
        if length > capacity {
            self.free.insert(address + capacity, length - capacity);
        }
        Some(address)
    }

    fn bump(&mut self, capacity: u32) -> Option<u32> {
        let address = self.top;
        let end = address as u64 + capacity as u64;
        if end > self.memory.size() as u64 {
            let missing = end - self.memory.size() as u64;
            let pages = missing.div_ceil(PAGE_SIZE as u64);
            self.memory.grow(u32::try_from(pages).ok()?)?;
        }
        // memory never exceeds 2^32 bytes, so end fits unless it equals 2^32
        self.top = u32::try_from(end).ok()?;
        Some(address)
    }

    fn insert_free(&mut self, mut address: u32, mut length: u32) {
        // merge with the following region
        if let Some(next_len) = self.free.remove(&(address + length)) {
            length += next_len;
        }
        // merge with the preceding region
        if let Some((&prev, &prev_len)) = self.free.range(..address).next_back() {
            if prev + prev_len == address {
                self.free.remove(&prev);
                address = prev;
                length += prev_len;
            }
        }
        // a region touching the top is returned to the bump area
        if address + length == self.top {
            self.top = address;
        } else {
            self.free.insert(address, length);
        }
    }
}

fn align_up(value: u64, align: u64) -> u64 {
    (value + align - 1) & !(align - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_allocation_skips_null() {
        let mut alloc = Allocator::new(1, 1).unwrap();
        let a = alloc.allocate(4).unwrap();
        assert_eq!(a, HEAP_BASE);
        assert_ne!(a, 0);
    }

    #[test]
    fn test_coalesced_region_returns_to_top() {
        let mut alloc = Allocator::new(1, 1).unwrap();
        let a = alloc.allocate(8).unwrap();
        let b = alloc.allocate(8).unwrap();
        let c = alloc.allocate(8).unwrap();
        alloc.free(b);
        alloc.free(a);
        alloc.free(c);
        assert_eq!(alloc.top, HEAP_BASE);
        assert!(alloc.free.is_empty());
    }

    #[test]
    fn test_split_free_region() {
        let mut alloc = Allocator::new(1, 1).unwrap();
        let a = alloc.allocate(64).unwrap();
        let _guard = alloc.allocate(8).unwrap();
        alloc.free(a);
        let b = alloc.allocate(16).unwrap();
        assert_eq!(b, a);
        assert_eq!(alloc.free.get(&(a + 16)), Some(&48));
    }
}
