//! Error types shared by the codec, the allocator and the exchange.

use thiserror::Error;

/// Failures that abort a call. Bounds violations during decode and frees of
/// unknown addresses are not represented here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The writer or the allocator could not provide `requested` more bytes.
    #[error("out of memory: requested {requested} bytes, limit {limit} bytes")]
    OutOfMemory { requested: u64, limit: u64 },

    /// A region handed across the boundary does not lie inside the memory it names.
    #[error("region {address:#x}+{length} lies outside memory of {memory_size} bytes")]
    OutOfBounds {
        address: u32,
        length: u32,
        memory_size: usize,
    },

    /// The callee returned the empty transfer word instead of a response.
    #[error("callee produced no response")]
    NoResponse,

    /// An encoded message does not fit in a 32-bit length.
    #[error("encoded message of {0} bytes exceeds the 32-bit boundary")]
    TooLarge(usize),

    /// Guest configuration was rejected by the builder.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for fallible operations in this crate
pub type Result<T> = std::result::Result<T, Error>;
