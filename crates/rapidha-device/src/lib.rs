//! Host-side controller of a RapidHA ZigBee module.
//!
//! A [`RapidHaDevice`] owns one transport. Its reader thread decodes inbound
//! frames and hands each packet to the [`Dispatcher`], whose named
//! registrations drive the bring-up handshake, join windows and any
//! caller-supplied handlers. [`Synchronous`] turns a command plus a response
//! predicate into a blocking call.

pub mod config;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod reader;
pub mod startup;
pub mod sync;
pub mod timer;

pub use config::DeviceConfig;
pub use device::{RapidHaDevice, JOIN_HANDLER, LEAVE_HANDLER, STARTUP_HANDLER};
pub use dispatch::Dispatcher;
pub use error::{DeviceError, Result};
pub use reader::{ReaderHandle, ReaderLoop};
pub use startup::{next_step, DeviceState, Step, StartupCommand};
pub use sync::{call_sync, Synchronous};
pub use timer::Timer;
