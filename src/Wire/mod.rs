pub mod layout;
pub mod message;
pub mod reader;
pub mod scalar;
pub mod writer;

pub use layout::{Field, FieldKind, Reference, Schema, REFERENCE_SIZE};
pub use message::{
    DataRequest, DataRequestViewer, DataResponse, DataResponseViewer, Message, Record,
    RecordViewer, View,
};
pub use reader::{Elements, Reader};
pub use scalar::Scalar;
pub use writer::Writer;
