//! The caller side of the boundary.
//!
//! One call runs six steps, always in this order and always to completion:
//!
//! 1. encode the request with the caller's own writer;
//! 2. ask the module to `allocate` exactly the encoded length;
//! 3. copy the encoded bytes into module memory at that address;
//! 4. `process` the address and length, receiving a packed transfer word;
//! 5. `release` the request buffer, whatever `process` returned;
//! 6. read the response in place, then `release` it.
//!
//! Step 6 is the `Lease`: it borrows the module, so nothing else can touch
//! module memory while the response is being read, and it releases the
//! response buffer when dropped.

use super::boundary::Boundary;
use crate::error::{Error, Result};
use crate::Core::transfer::TransferWord;
use crate::Wire::message::Message;
use crate::Wire::writer::Writer;
use std::marker::PhantomData;

/// Drives calls into one module.
pub struct Exchange<B: Boundary> {
    module: B,
    writer: Writer,
    calls: u64,
}

impl<B: Boundary> Exchange<B> {
    pub fn new(module: B) -> Self {
        Self::with_writer_capacity(module, 20 * 1024)
    }

    pub fn with_writer_capacity(module: B, capacity: usize) -> Self {
        Self {
            module,
            writer: Writer::new(capacity),
            calls: 0,
        }
    }

    /// Send `request` and hold the response buffer until the lease drops.
    pub fn call<Req: Message, Resp: Message>(
        &mut self,
        request: &Req,
    ) -> Result<Lease<'_, B, Resp>> {
        self.writer.reset();
        request.write_as_root(&mut self.writer)?;

        // The only length used below is the one of the bytes actually encoded.
        let encoded = self.writer.bytes();
        let length = u32::try_from(encoded.len()).map_err(|_| Error::TooLarge(encoded.len()))?;

        let address = self.module.allocate(length);
        if address == 0 {
            return Err(Error::OutOfMemory {
                requested: length as u64,
                limit: self.module.memory().len() as u64,
            });
        }

        let memory_size = self.module.memory().len();
        match region_mut(self.module.memory_mut(), address, length) {
            Some(dst) => dst.copy_from_slice(encoded),
            None => {
                self.module.release(address);
                return Err(Error::OutOfBounds {
                    address,
                    length,
                    memory_size,
                });
            }
        }

        let word = TransferWord::from_raw(self.module.process(address, length));
        self.module.release(address);
        self.calls += 1;

        if word.is_none() {
            tracing::warn!(request = address, "module returned no response");
            return Err(Error::NoResponse);
        }

        let (response_address, response_length) = word.unpack();
        let memory_size = self.module.memory().len();
        if region(self.module.memory(), response_address, response_length).is_none() {
            tracing::warn!(
                response_address,
                response_length,
                memory_size,
                "response lies outside module memory"
            );
            self.module.release(response_address);
            return Err(Error::OutOfBounds {
                address: response_address,
                length: response_length,
                memory_size,
            });
        }

        tracing::debug!(
            request = address,
            length,
            response = response_address,
            response_length,
            "call completed"
        );
        let generation = self.module.generation(response_address);
        Ok(Lease {
            module: &mut self.module,
            address: response_address,
            length: response_length,
            generation,
            _message: PhantomData,
        })
    }

    /// Send `request`, run `consume` on the in-place response view, release it.
    pub fn call_with<Req, Resp, R, F>(&mut self, request: &Req, consume: F) -> Result<R>
    where
        Req: Message,
        Resp: Message,
        F: FnOnce(Resp::Viewer<'_>) -> R,
    {
        let lease = self.call::<Req, Resp>(request)?;
        Ok(consume(lease.view()))
    }

    /// Send `request` and copy the response into owned storage.
    pub fn call_owned<Req: Message, Resp: Message>(&mut self, request: &Req) -> Result<Resp> {
        let lease = self.call::<Req, Resp>(request)?;
        Ok(lease.to_owned())
    }

    pub fn module(&self) -> &B {
        &self.module
    }

    pub fn module_mut(&mut self) -> &mut B {
        &mut self.module
    }

    pub fn into_inner(self) -> B {
        self.module
    }

    /// Calls that reached `process`
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

/// A response buffer in module memory, released on drop.
pub struct Lease<'m, B: Boundary, Resp: Message> {
    module: &'m mut B,
    address: u32,
    length: u32,
    generation: Option<u64>,
    _message: PhantomData<Resp>,
}

impl<'m, B: Boundary, Resp: Message> Lease<'m, B, Resp> {
    /// Read the response in place. The view cannot outlive the lease.
    pub fn view(&self) -> Resp::Viewer<'_> {
        Resp::view(self.bytes())
    }

    /// Raw response bytes, exactly `length` long.
    pub fn bytes(&self) -> &[u8] {
        // checked against memory size when the lease was created
        region(self.module.memory(), self.address, self.length).unwrap_or_default()
    }

    /// Copy the response out before the buffer goes away.
    pub fn to_owned(&self) -> Resp {
        Resp::read(&self.view())
    }

    pub fn address(&self) -> u32 {
        self.address
    }

    pub fn len(&self) -> u32 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Release now rather than at end of scope.
    pub fn finish(self) {}
}

impl<B: Boundary, Resp: Message> Drop for Lease<'_, B, Resp> {
    fn drop(&mut self) {
        let current = self.module.generation(self.address);
        if self.generation.is_some() && current != self.generation {
            // the buffer now belongs to someone else
            tracing::warn!(
                address = self.address,
                expected = ?self.generation,
                found = ?current,
                "response address was recycled, not releasing"
            );
            return;
        }
        self.module.release(self.address);
    }
}

fn region(memory: &[u8], address: u32, length: u32) -> Option<&[u8]> {
    let start = address as usize;
    memory.get(start..start.checked_add(length as usize)?)
}

fn region_mut(memory: &mut [u8], address: u32, length: u32) -> Option<&mut [u8]> {
    let start = address as usize;
    memory.get_mut(start..start.checked_add(length as usize)?)
}
