pub mod boundary;
pub mod builder;
pub mod guest;
pub mod host;

pub use boundary::Boundary;
pub use builder::{GuestBuilder, GuestConfig};
pub use guest::{Guest, Handler};
pub use host::{Exchange, Lease};
