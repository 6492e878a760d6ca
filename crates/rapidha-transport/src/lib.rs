//! Byte transport abstraction for RapidHA modules.
//!
//! Provides a unified interface over the byte streams a module can be reached on:
//! - Serial ports, opened 8N1 through the `serialport` crate
//! - An in-memory transport for tests and replay
//!
//! This is the lowest layer of rapidha. Everything else builds on top of
//! the [`Transport`] trait provided here.

pub mod error;
pub mod memory;
pub mod traits;

pub mod serial;

pub use error::{Result, TransportError};
pub use memory::MemoryTransport;
pub use traits::Transport;

pub use serial::{SerialConfig, SerialPort};
