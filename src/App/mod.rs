pub mod handlers;

pub use handlers::{FilterGreaterThan, RecordTransform};
