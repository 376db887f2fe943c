//! Checkr Core - Types, event payloads, and error handling

pub mod error;
pub mod lifecycle;
pub mod payload;
pub mod types;

pub use error::{Error, Result};
pub use payload::*;
pub use types::*;
