//! Message exchange between two isolated memory spaces over a
//! pointer/length boundary.
//!
//! - `Core`: linear memory, the per-space ownership table, transfer words
//! - `Wire`: fixed-header binary layout, writer, bounds-checked viewers
//! - `Exchange`: the callee (`Guest`) and the caller's call protocol
//! - `App`: example transforms served by a guest
//! - `ffi`: the exported `allocate` / `release` / `process` entry points

// Module naming follows project convention (capitalised subsystem modules)
#[allow(non_snake_case)]
pub mod Core;
#[allow(non_snake_case)]
pub mod Wire;
#[allow(non_snake_case)]
pub mod Exchange;
#[allow(non_snake_case)]
pub mod App;
#[allow(non_snake_case)]
pub mod Debug {
    pub mod StructDebug;
}
pub mod error;
pub mod ffi;

pub use error::{Error, Result};
