// tests/allocator_test.rs

use membridge::Core::alloc::{Allocator, BLOCK_ALIGN, HEAP_BASE};
use membridge::Core::memory::PAGE_SIZE;
use membridge::Error;
use std::collections::HashSet;

#[test]
fn test_allocations_are_distinct_and_disjoint() {
    let mut allocator = Allocator::new(1, 16).unwrap();
    let mut seen = HashSet::new();
    let mut ranges = Vec::new();

    for size in [1u32, 7, 8, 24, 100, 4096, 0, 3] {
        let address = allocator.allocate(size).unwrap();
        assert_ne!(address, 0);
        assert_eq!(address % BLOCK_ALIGN, 0);
        assert!(seen.insert(address), "address {} handed out twice", address);
        ranges.push((address, size.max(1)));
    }

    ranges.sort();
    for pair in ranges.windows(2) {
        let (a, a_len) = pair[0];
        let (b, _) = pair[1];
        assert!(a + a_len <= b, "buffers at {} and {} overlap", a, b);
    }
    assert_eq!(allocator.live_count(), 8);
}

#[test]
fn test_fresh_buffers_are_zeroed() {
    let mut allocator = Allocator::new(1, 4).unwrap();
    let address = allocator.allocate(64).unwrap();
    allocator.buffer_mut(address).unwrap().fill(0xAB);
    allocator.free(address);

    let again = allocator.allocate(64).unwrap();
    assert_eq!(again, address);
    assert!(allocator.buffer(again).unwrap().iter().all(|&b| b == 0));
}

#[test]
fn test_release_is_idempotent_and_ignores_unknown() {
    let mut allocator = Allocator::new(1, 4).unwrap();
    let a = allocator.allocate(32).unwrap();
    let b = allocator.allocate(32).unwrap();

    allocator.free(a);
    allocator.free(a);
    allocator.free(0);
    allocator.free(123_456);

    assert!(!allocator.is_live(a));
    assert!(allocator.is_live(b));
    assert_eq!(allocator.live_count(), 1);
    assert_eq!(allocator.buffer(b).map(|bytes| bytes.len()), Some(32));
}

#[test]
fn test_memory_grows_on_demand() {
    let mut allocator = Allocator::new(1, 8).unwrap();
    assert_eq!(allocator.memory().pages(), 1);

    let big = allocator.allocate(3 * PAGE_SIZE as u32).unwrap();
    assert!(allocator.memory().pages() >= 4);
    assert!(allocator.memory().contains(big, 3 * PAGE_SIZE as u32));
}

#[test]
fn test_exhaustion_reports_out_of_memory() {
    let mut allocator = Allocator::new(1, 2).unwrap();
    let err = allocator.allocate(4 * PAGE_SIZE as u32).unwrap_err();
    assert!(matches!(
        err,
        Error::OutOfMemory { limit, .. } if limit == 2 * PAGE_SIZE as u64
    ));
    // a failed attempt leaves the table usable
    assert_eq!(allocator.live_count(), 0);
    assert_eq!(allocator.allocate(16).unwrap(), HEAP_BASE);
}

#[test]
fn test_generation_changes_when_address_is_recycled() {
    let mut allocator = Allocator::new(1, 4).unwrap();
    let address = allocator.allocate(40).unwrap();
    let first = allocator.generation(address).unwrap();
    allocator.free(address);
    assert_eq!(allocator.generation(address), None);

    let recycled = allocator.allocate(40).unwrap();
    assert_eq!(recycled, address);
    assert_ne!(allocator.generation(recycled).unwrap(), first);
}

#[test]
fn test_random_churn_keeps_table_consistent() {
    let mut allocator = Allocator::new(1, 64).unwrap();
    let mut live: Vec<(u32, u8)> = Vec::new();

    for round in 0..5_000u32 {
        if live.is_empty() || fastrand::u8(..) < 150 {
            let size = fastrand::u32(1..2048);
            let address = allocator.allocate(size).unwrap();
            let tag = (round % 251) as u8;
            allocator.buffer_mut(address).unwrap().fill(tag);
            live.push((address, tag));
        } else {
            let (address, tag) = live.swap_remove(fastrand::usize(..live.len()));
            // nobody else wrote into this buffer while it was live
            assert!(allocator.buffer(address).unwrap().iter().all(|&b| b == tag));
            allocator.free(address);
        }
    }

    assert_eq!(allocator.live_count(), live.len());
    for (address, _) in live.drain(..) {
        allocator.free(address);
    }
    assert_eq!(allocator.live_count(), 0);
    assert_eq!(allocator.bytes_in_use(), 0);
    assert_eq!(allocator.heap_top(), HEAP_BASE);
    assert_eq!(allocator.free_regions(), 0);
}

#[test]
fn test_reset_clears_table() {
    let mut allocator = Allocator::new(1, 4).unwrap();
    for _ in 0..10 {
        allocator.allocate(100).unwrap();
    }
    allocator.reset();
    assert_eq!(allocator.live_count(), 0);
    assert_eq!(allocator.allocate(8).unwrap(), HEAP_BASE);
}
