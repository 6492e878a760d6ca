//! Host driver for RapidHA ZigBee coprocessors.
//!
//! A RapidHA module sits on a serial line and speaks a checksummed frame
//! protocol. This crate bundles the layers that drive it.
//!
//! # Crate Structure
//!
//! - [`transport`]: byte transports (serial port, in-memory)
//! - [`frame`]: frame assembly, checksum and framed writes
//! - [`schema`]: command/response catalog, registry and attribute decoding
//! - [`device`]: reader loop, dispatch bus, bring-up and blocking calls

/// Re-export transport types.
pub mod transport {
    pub use rapidha_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use rapidha_frame::*;
}

/// Re-export schema types.
pub mod schema {
    pub use rapidha_schema::*;
}

/// Re-export device types.
pub mod device {
    pub use rapidha_device::*;
}
