pub mod alloc;
pub mod memory;
pub mod transfer;

pub use alloc::{AllocationEntry, Allocator, HEAP_BASE};
pub use memory::{LinearMemory, PAGE_SIZE};
pub use transfer::TransferWord;
