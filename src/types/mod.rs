//! Shared primitive types.
mod contracts;
pub use contracts::*;

mod envelope;
pub use envelope::*;

mod hub;
pub use hub::*;

mod request;
pub use request::*;
