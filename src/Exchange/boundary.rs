/// The three entry points a module exports, plus access to its memory.
///
/// Only integers and copied byte ranges cross this interface. Addresses are
/// offsets into the implementor's own memory; the caller never holds a pointer
/// into it beyond the duration of one method call.
pub trait Boundary {
    /// Reserve `size` bytes in the module's memory. Returns `0` on exhaustion.
    fn allocate(&mut self, size: u32) -> u32;

    /// Give a buffer back to the module's allocator. Unknown addresses are ignored.
    fn release(&mut self, address: u32);

    /// Process the request at `address`/`length` and return the packed
    /// location of a newly allocated response, or the all-zero word.
    fn process(&mut self, address: u32, length: u32) -> u64;

    /// The module's whole memory.
    fn memory(&self) -> &[u8];

    fn memory_mut(&mut self) -> &mut [u8];

    /// Generation of the live buffer at `address`, when the module tracks one.
    /// A different value for the same address means it was released and
    /// handed out again.
    fn generation(&self, _address: u32) -> Option<u64> {
        None
    }
}

impl<B: Boundary + ?Sized> Boundary for &mut B {
    fn allocate(&mut self, size: u32) -> u32 {
        (**self).allocate(size)
    }

    fn release(&mut self, address: u32) {
        (**self).release(address)
    }

    fn process(&mut self, address: u32, length: u32) -> u64 {
        (**self).process(address, length)
    }

    fn memory(&self) -> &[u8] {
        (**self).memory()
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        (**self).memory_mut()
    }

    fn generation(&self, address: u32) -> Option<u64> {
        (**self).generation(address)
    }
}
