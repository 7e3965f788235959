//! Message types and their zero-copy viewers.
//!
//! Each message pairs an owned struct (what a producer fills in) with a
//! viewer (what a consumer reads through). Writing follows one order: the
//! header is allocated first so it sits at the root offset, then each
//! variable field gets its payload and header reference, then inline fields
//! are stored into their header slots.

use super::layout::{Field, Schema};
use super::reader::{Elements, Reader, MAX_HEADER_SIZE};
use super::writer::Writer;
use crate::error::Result;

/// Stable 64-bit identifier of a message type
pub type PacketIdentifier = u64;

/// A read-through view of one encoded message.
pub trait View<'a>: Sized {
    /// View the message whose header starts at `offset`. A header that does
    /// not fit inside the reader yields the all-zero view.
    fn new(reader: Reader<'a>, offset: u32) -> Self;
}

/// A message type with a fixed schema.
pub trait Message: Sized + Default {
    const SCHEMA: Schema;
    const PACKET_IDENTIFIER: PacketIdentifier;

    type Viewer<'a>: View<'a>;

    /// Encode into `writer` with the header at `start`. `start == 0` means the
    /// header has not been allocated yet and is allocated here.
    fn write(&self, writer: &mut Writer, start: u32) -> Result<u32>;

    /// Copy everything a viewer exposes into owned storage.
    fn read(viewer: &Self::Viewer<'_>) -> Self;

    fn write_as_root(&self, writer: &mut Writer) -> Result<u32> {
        self.write(writer, 0)
    }

    /// View the root message of an encoded buffer.
    fn view(bytes: &[u8]) -> Self::Viewer<'_> {
        View::new(Reader::new(bytes), 0)
    }

    fn read_as_root(bytes: &[u8]) -> Self {
        Self::read(&Self::view(bytes))
    }

    fn header_size() -> u32 {
        Self::SCHEMA.header_size()
    }

    /// Encode as root into a fresh buffer.
    fn encode(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Self::header_size() as usize);
        self.write_as_root(&mut writer)?;
        Ok(writer.into_bytes())
    }

    /// Restore every field to its zero value.
    fn reset(&mut self) {
        *self = Self::default();
    }
}

// Validated header or the null one; shared by every viewer.
fn header<'a>(reader: Reader<'a>, offset: u32, size: u32) -> (Reader<'a>, u32) {
    debug_assert!(size as usize <= MAX_HEADER_SIZE);
    if reader.is_valid_offset(offset, size) {
        (reader, offset)
    } else {
        (Reader::null(), 0)
    }
}

fn root_offset(writer: &mut Writer, start: u32, header_size: u32) -> Result<u32> {
    if start == 0 {
        writer.alloc(header_size)
    } else {
        Ok(start)
    }
}

// ---------------------------------------------------------------------------
// DataRequest
// ---------------------------------------------------------------------------

/// Numbers to filter and the threshold to filter them by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataRequest {
    pub numbers: Vec<i32>,
    pub k: i32,
}

pub const DATA_REQUEST: Schema = Schema::new(
    "DataRequest",
    &[Field::variable("numbers", 4), Field::inline("k", 4)],
);

impl DataRequest {
    const NUMBERS: u32 = DATA_REQUEST.offset_of(0);
    const K: u32 = DATA_REQUEST.offset_of(1);
}

impl Message for DataRequest {
    const SCHEMA: Schema = DATA_REQUEST;
    const PACKET_IDENTIFIER: PacketIdentifier = 15680009911858927649;

    type Viewer<'a> = DataRequestViewer<'a>;

    fn write(&self, writer: &mut Writer, start: u32) -> Result<u32> {
        let offset = root_offset(writer, start, Self::header_size())?;
        writer.write_sequence(offset + Self::NUMBERS, &self.numbers)?;
        writer.write_scalar_at(offset + Self::K, self.k);
        Ok(offset)
    }

    fn read(viewer: &DataRequestViewer<'_>) -> Self {
        Self {
            numbers: viewer.numbers().to_vec(),
            k: viewer.k(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DataRequestViewer<'a> {
    reader: Reader<'a>,
    offset: u32,
}

impl<'a> View<'a> for DataRequestViewer<'a> {
    fn new(reader: Reader<'a>, offset: u32) -> Self {
        let (reader, offset) = header(reader, offset, DATA_REQUEST.header_size());
        Self { reader, offset }
    }
}

impl<'a> DataRequestViewer<'a> {
    pub fn numbers(&self) -> Elements<'a, i32> {
        let reference = self.reader.reference(self.offset + DataRequest::NUMBERS);
        self.reader.elements_at(reference)
    }

    pub fn k(&self) -> i32 {
        self.reader.scalar(self.offset + DataRequest::K)
    }
}

// ---------------------------------------------------------------------------
// DataResponse
// ---------------------------------------------------------------------------

/// The numbers that passed the filter, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataResponse {
    pub numbers_greater_k: Vec<i32>,
}

pub const DATA_RESPONSE: Schema = Schema::new(
    "DataResponse",
    &[Field::variable("numbers_greater_k", 4)],
);

impl DataResponse {
    const NUMBERS_GREATER_K: u32 = DATA_RESPONSE.offset_of(0);
}

impl Message for DataResponse {
    const SCHEMA: Schema = DATA_RESPONSE;
    const PACKET_IDENTIFIER: PacketIdentifier = 3179384322344759246;

    type Viewer<'a> = DataResponseViewer<'a>;

    fn write(&self, writer: &mut Writer, start: u32) -> Result<u32> {
        let offset = root_offset(writer, start, Self::header_size())?;
        writer.write_sequence(offset + Self::NUMBERS_GREATER_K, &self.numbers_greater_k)?;
        Ok(offset)
    }

    fn read(viewer: &DataResponseViewer<'_>) -> Self {
        Self {
            numbers_greater_k: viewer.numbers_greater_k().to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DataResponseViewer<'a> {
    reader: Reader<'a>,
    offset: u32,
}

impl<'a> View<'a> for DataResponseViewer<'a> {
    fn new(reader: Reader<'a>, offset: u32) -> Self {
        let (reader, offset) = header(reader, offset, DATA_RESPONSE.header_size());
        Self { reader, offset }
    }
}

impl<'a> DataResponseViewer<'a> {
    pub fn numbers_greater_k(&self) -> Elements<'a, i32> {
        let reference = self
            .reader
            .reference(self.offset + DataResponse::NUMBERS_GREATER_K);
        self.reader.elements_at(reference)
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Text, a list of values and a counter; used in both directions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub text: String,
    pub values: Vec<i32>,
    pub number: i32,
}

pub const RECORD: Schema = Schema::new(
    "Record",
    &[
        Field::variable("text", 1),
        Field::variable("values", 4),
        Field::inline("number", 4),
    ],
);

impl Record {
    const TEXT: u32 = RECORD.offset_of(0);
    const VALUES: u32 = RECORD.offset_of(1);
    const NUMBER: u32 = RECORD.offset_of(2);
}

impl Message for Record {
    const SCHEMA: Schema = RECORD;
    const PACKET_IDENTIFIER: PacketIdentifier = 0x8C4F_31A2_5D07_E96B;

    type Viewer<'a> = RecordViewer<'a>;

    fn write(&self, writer: &mut Writer, start: u32) -> Result<u32> {
        let offset = root_offset(writer, start, Self::header_size())?;
        writer.write_bytes(offset + Self::TEXT, self.text.as_bytes())?;
        writer.write_sequence(offset + Self::VALUES, &self.values)?;
        writer.write_scalar_at(offset + Self::NUMBER, self.number);
        Ok(offset)
    }

    fn read(viewer: &RecordViewer<'_>) -> Self {
        Self {
            text: viewer.text().to_owned(),
            values: viewer.values().to_vec(),
            number: viewer.number(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RecordViewer<'a> {
    reader: Reader<'a>,
    offset: u32,
}

impl<'a> View<'a> for RecordViewer<'a> {
    fn new(reader: Reader<'a>, offset: u32) -> Self {
        let (reader, offset) = header(reader, offset, RECORD.header_size());
        Self { reader, offset }
    }
}

impl<'a> RecordViewer<'a> {
    pub fn text(&self) -> &'a str {
        let reference = self.reader.reference(self.offset + Record::TEXT);
        self.reader.text_at(reference)
    }

    pub fn values(&self) -> Elements<'a, i32> {
        let reference = self.reader.reference(self.offset + Record::VALUES);
        self.reader.elements_at(reference)
    }

    pub fn number(&self) -> i32 {
        self.reader.scalar(self.offset + Record::NUMBER)
    }
}
