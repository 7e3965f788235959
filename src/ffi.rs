use crate::App::FilterGreaterThan;
use crate::Exchange::{Boundary, Guest, GuestBuilder};
use lazy_static::lazy_static;
use parking_lot::Mutex;
use std::ptr;

// Error codes
pub const MB_SUCCESS: i32 = 0;
pub const MB_ERROR_NULL_POINTER: i32 = -1;
pub const MB_ERROR_INVALID_ARG: i32 = -2;
pub const MB_ERROR_OUT_OF_BOUNDS: i32 = -3;
pub const MB_ERROR_NOT_INITIALIZED: i32 = -4;

/// The guest behind the exported entry points.
pub type ExportedGuest = Guest<FilterGreaterThan>;

lazy_static! {
    // Process-wide memory space served by the exports. Empty until the first
    // call or `guest_init`; emptied again by `guest_teardown`.
    static ref GUEST: Mutex<Option<ExportedGuest>> = Mutex::new(None);
}

// Run `f` on the exported guest, building a default one on first use.
fn with_guest<R>(f: impl FnOnce(&mut ExportedGuest) -> R) -> Option<R> {
    let mut slot = GUEST.lock();
    if slot.is_none() {
        match GuestBuilder::new().build(FilterGreaterThan) {
            Ok(guest) => *slot = Some(guest),
            Err(e) => {
                tracing::error!(%e, "failed to build default guest");
                return None;
            }
        }
    }
    slot.as_mut().map(f)
}

// -----------------------------------------------------------------------------
// Lifecycle
// -----------------------------------------------------------------------------

/// (Re)create the exported guest with the given memory limits.
///
/// Any previous guest and all of its buffers are dropped.
///
/// # Returns
/// * 0 on success, `MB_ERROR_INVALID_ARG` if the limits are inconsistent.
#[no_mangle]
pub extern "C" fn guest_init(initial_pages: u32, max_pages: u32) -> i32 {
    match GuestBuilder::new()
        .with_initial_pages(initial_pages)
        .with_max_pages(max_pages)
        .build(FilterGreaterThan)
    {
        Ok(guest) => {
            *GUEST.lock() = Some(guest);
            MB_SUCCESS
        }
        Err(e) => {
            tracing::error!(%e, "guest_init rejected");
            MB_ERROR_INVALID_ARG
        }
    }
}

/// Drop the exported guest and every buffer it owns.
#[no_mangle]
pub extern "C" fn guest_teardown() {
    if let Some(mut guest) = GUEST.lock().take() {
        guest.teardown();
    }
}

// -----------------------------------------------------------------------------
// Boundary entry points
// -----------------------------------------------------------------------------

/// Reserve `size` zeroed bytes in guest memory.
///
/// # Returns
/// * The buffer address, or 0 when memory is exhausted.
#[no_mangle]
pub extern "C" fn allocate(size: u32) -> u32 {
    with_guest(|guest| guest.allocate(size)).unwrap_or(0)
}

/// Return a buffer to the guest allocator. Unknown addresses are ignored.
#[no_mangle]
pub extern "C" fn release(address: u32) {
    let _ = with_guest(|guest| guest.release(address));
}

/// Run the filter on the request at `address`.
///
/// # Returns
/// * `(response_address << 32) | response_length`, or 0 if no response was
///   produced. The caller must `release` the response address.
#[no_mangle]
pub extern "C" fn process(address: u32, length: u32) -> u64 {
    with_guest(|guest| guest.process(address, length).into_raw()).unwrap_or(0)
}

// -----------------------------------------------------------------------------
// Copy helpers for native hosts
// -----------------------------------------------------------------------------

/// Copy `len` bytes from `src` into guest memory at `address`.
///
/// # Safety
/// `src` must be valid for reads of `len` bytes.
///
/// # Returns
/// * 0 on success, negative error code otherwise.
#[no_mangle]
pub unsafe extern "C" fn guest_write(address: u32, src: *const u8, len: u32) -> i32 {
    if src.is_null() {
        return MB_ERROR_NULL_POINTER;
    }
    let mut slot = GUEST.lock();
    let Some(guest) = slot.as_mut() else {
        return MB_ERROR_NOT_INITIALIZED;
    };
    let Some(dst) = guest
        .memory_mut()
        .get_mut(address as usize..(address as usize).saturating_add(len as usize))
    else {
        return MB_ERROR_OUT_OF_BOUNDS;
    };
    unsafe {
        ptr::copy_nonoverlapping(src, dst.as_mut_ptr(), len as usize);
    }
    MB_SUCCESS
}

/// Copy `len` bytes of guest memory at `address` into `dst`.
///
/// # Safety
/// `dst` must be valid for writes of `len` bytes.
///
/// # Returns
/// * 0 on success, negative error code otherwise.
#[no_mangle]
pub unsafe extern "C" fn guest_read(address: u32, dst: *mut u8, len: u32) -> i32 {
    if dst.is_null() {
        return MB_ERROR_NULL_POINTER;
    }
    let slot = GUEST.lock();
    let Some(guest) = slot.as_ref() else {
        return MB_ERROR_NOT_INITIALIZED;
    };
    let Some(src) = guest
        .memory()
        .get(address as usize..(address as usize).saturating_add(len as usize))
    else {
        return MB_ERROR_OUT_OF_BOUNDS;
    };
    unsafe {
        ptr::copy_nonoverlapping(src.as_ptr(), dst, len as usize);
    }
    MB_SUCCESS
}

/// Current size of guest memory in bytes, 0 if there is no guest.
#[no_mangle]
pub extern "C" fn guest_memory_size() -> u64 {
    GUEST
        .lock()
        .as_ref()
        .map(|guest| guest.allocator().memory().size() as u64)
        .unwrap_or(0)
}
