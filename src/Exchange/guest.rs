//! The callee side of the boundary.
//!
//! A `Guest` owns one memory space: its linear memory and the allocator table
//! over it. It serves the three entry points. `process` decodes the request in
//! place, hands the view to a `Handler`, encodes the result and returns the
//! packed location of a buffer the guest allocated for it. The caller owns
//! the obligation to `release` both the request and the response buffers.

use super::boundary::Boundary;
use super::builder::GuestConfig;
use crate::error::Result;
use crate::Core::alloc::Allocator;
use crate::Core::memory::PAGE_SIZE;
use crate::Core::transfer::TransferWord;
use crate::Wire::message::Message;
use crate::Wire::writer::Writer;
use std::fmt;

/// Application logic run by a guest on each request.
///
/// The request arrives as a read-through view into guest memory, valid only
/// for the duration of the call.
pub trait Handler {
    type Request: Message;
    type Response: Message;

    fn handle(&mut self, request: <Self::Request as Message>::Viewer<'_>) -> Self::Response;
}

pub struct Guest<H: Handler> {
    allocator: Allocator,
    writer: Writer,
    handler: H,
    config: GuestConfig,
    processed: u64,
}

impl<H: Handler> Guest<H> {
    pub(crate) fn new(config: GuestConfig, handler: H) -> Result<Self> {
        let allocator = Allocator::new(config.initial_pages, config.max_pages)?;
        let limit = config.max_pages as usize * PAGE_SIZE;
        Ok(Self {
            allocator,
            writer: Writer::with_limit(config.writer_capacity, limit),
            handler,
            config,
            processed: 0,
        })
    }

    /// Reserve a zeroed buffer; `0` when memory is exhausted.
    pub fn allocate(&mut self, size: u32) -> u32 {
        self.allocator.allocate(size).unwrap_or(0)
    }

    pub fn release(&mut self, address: u32) {
        self.allocator.free(address);
    }

    /// Handle the request stored at `address`.
    ///
    /// Returns `TransferWord::NONE` when the address is not a live buffer or
    /// when the response cannot be encoded or allocated; in every such case no
    /// response buffer exists afterwards.
    pub fn process(&mut self, address: u32, length: u32) -> TransferWord {
        let Some(entry) = self.allocator.entry(address).copied() else {
            tracing::warn!(address, length, "process called on unknown address");
            return TransferWord::NONE;
        };
        let length = if length > entry.size {
            tracing::warn!(
                address,
                length,
                size = entry.size,
                "request length exceeds its buffer, clamping"
            );
            entry.size
        } else {
            length
        };

        let response = {
            let bytes = self
                .allocator
                .memory()
                .read(address, length)
                .unwrap_or_default();
            let request = <H::Request as Message>::view(bytes);
            self.handler.handle(request)
        };

        self.writer.reset();
        if let Err(err) = response.write_as_root(&mut self.writer) {
            tracing::error!(%err, "failed to encode response");
            return TransferWord::NONE;
        }
        let encoded = self.writer.bytes();
        // the writer never grows past u32::MAX bytes
        let response_length = encoded.len() as u32;

        let response_address = match self.allocator.allocate(response_length) {
            Ok(response_address) => response_address,
            Err(err) => {
                tracing::error!(%err, "no memory for response");
                return TransferWord::NONE;
            }
        };
        if let Some(dst) = self.allocator.buffer_mut(response_address) {
            dst.copy_from_slice(encoded);
        }

        self.processed += 1;
        tracing::debug!(
            request = address,
            response = response_address,
            response_length,
            "processed"
        );
        TransferWord::pack(response_address, response_length)
    }

    /// Drop every buffer, leaving an empty table over zeroed memory.
    pub fn teardown(&mut self) {
        tracing::debug!(live = self.allocator.live_count(), "guest teardown");
        self.allocator.reset();
        self.writer.reset();
    }

    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn config(&self) -> &GuestConfig {
        &self.config
    }

    /// Number of requests that produced a response
    pub fn processed(&self) -> u64 {
        self.processed
    }
}

impl<H: Handler> fmt::Debug for Guest<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::Debug::StructDebug::debug_guest(self, f)
    }
}

impl<H: Handler> Boundary for Guest<H> {
    fn allocate(&mut self, size: u32) -> u32 {
        Guest::allocate(self, size)
    }

    fn release(&mut self, address: u32) {
        Guest::release(self, address)
    }

    fn process(&mut self, address: u32, length: u32) -> u64 {
        Guest::process(self, address, length).into_raw()
    }

    fn memory(&self) -> &[u8] {
        self.allocator.memory().data()
    }

    fn memory_mut(&mut self) -> &mut [u8] {
        self.allocator.memory_mut().data_mut()
    }

    fn generation(&self, address: u32) -> Option<u64> {
        self.allocator.generation(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Exchange::builder::GuestBuilder;
    use crate::Wire::message::{DataResponse, Record, RecordViewer};

    struct Echo;

    impl Handler for Echo {
        type Request = Record;
        type Response = Record;

        fn handle(&mut self, request: RecordViewer<'_>) -> Record {
            Record::read(&request)
        }
    }

    #[test]
    fn test_process_unknown_address_is_none() {
        let mut guest = GuestBuilder::new().build(Echo).unwrap();
        assert!(guest.process(4096, 32).is_none());
        assert_eq!(guest.allocator().live_count(), 0);
    }

    #[test]
    fn test_process_clamps_length_to_buffer() {
        let mut guest = GuestBuilder::new().build(Echo).unwrap();
        let bytes = Record {
            text: "hi".into(),
            values: vec![1],
            number: 9,
        }
        .encode()
        .unwrap();
        let request = guest.allocate(bytes.len() as u32);
        guest
            .allocator
            .buffer_mut(request)
            .unwrap()
            .copy_from_slice(&bytes);

        let word = guest.process(request, u32::MAX);
        assert!(!word.is_none());
        let (address, length) = word.unpack();
        let response = Record::read_as_root(guest.allocator().buffer(address).unwrap());
        assert_eq!(length as usize, bytes.len());
        assert_eq!(response.number, 9);
        assert_eq!(guest.processed(), 1);
    }

    #[test]
    fn test_response_allocation_failure_returns_none() {
        struct Huge;
        impl Handler for Huge {
            type Request = Record;
            type Response = DataResponse;
            fn handle(&mut self, _: RecordViewer<'_>) -> DataResponse {
                DataResponse {
                    numbers_greater_k: vec![0; PAGE_SIZE],
                }
            }
        }

        let mut guest = GuestBuilder::new()
            .with_max_pages(1)
            .build(Huge)
            .unwrap();
        let request = guest.allocate(32);
        assert!(guest.process(request, 32).is_none());
        assert_eq!(guest.allocator().live_count(), 1);
    }

    #[test]
    fn test_teardown_drops_everything() {
        let mut guest = GuestBuilder::new().build(Echo).unwrap();
        guest.allocate(10);
        guest.allocate(20);
        guest.teardown();
        assert_eq!(guest.allocator().live_count(), 0);
    }
}
