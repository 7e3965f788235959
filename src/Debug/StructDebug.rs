use crate::Core::alloc::Allocator;
use crate::Exchange::guest::{Guest, Handler};
use std::fmt;

/// Debug function for Allocator
///
/// Summarises the table instead of dumping memory:
/// - Memory size in pages and the page limit
/// - Heap top and number of free regions
/// - Live entry count and bytes in use
pub fn debug_allocator(allocator: &Allocator, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Allocator")
        .field("pages", &allocator.memory().pages())
        .field("max_pages", &allocator.memory().max_pages())
        .field("heap_top", &format_args!("{:#x}", allocator.heap_top()))
        .field("free_regions", &allocator.free_regions())
        .field("live", &allocator.live_count())
        .field("bytes_in_use", &allocator.bytes_in_use())
        .finish()
}

/// Debug function for Guest
pub fn debug_guest<H: Handler>(guest: &Guest<H>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Guest")
        .field("allocator", guest.allocator())
        .field("config", guest.config())
        .field("processed", &guest.processed())
        .finish_non_exhaustive()
}
