use super::*;

/// Read-only views of the ownership table, mostly for tests and monitoring.
impl Allocator {
    /// Look up the live entry for `address`
    pub fn entry(&self, address: u32) -> Option<&AllocationEntry> {
        self.live.get(&address)
    }

    /// Whether `address` names a live buffer
    pub fn is_live(&self, address: u32) -> bool {
        self.live.contains_key(&address)
    }

    /// Generation of the live entry at `address`.
    ///
    /// Comparing this with a remembered value detects an address that was
    /// released and handed out again in between.
    pub fn generation(&self, address: u32) -> Option<u64> {
        self.live.get(&address).map(|entry| entry.generation)
    }

    /// Number of live buffers
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Sum of requested sizes over all live buffers
    pub fn bytes_in_use(&self) -> u64 {
        self.live.values().map(|entry| entry.size as u64).sum()
    }

    /// Iterate live entries in address order
    pub fn entries(&self) -> impl Iterator<Item = &AllocationEntry> {
        self.live.values()
    }

    /// Current heap top; everything at or above it is unreserved.
    pub fn heap_top(&self) -> u32 {
        self.top
    }

    /// Number of separate free regions below the heap top
    pub fn free_regions(&self) -> usize {
        self.free.len()
    }
}
