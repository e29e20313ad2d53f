//! weerelay client library entry.
//!
//! This crate wires the wire layer into a running client: the event
//! interpreter, the session store, the transport seam and its TCP
//! implementation, configuration, and metrics. It is intended to be consumed
//! by the binary (`main.rs`), by a presentation layer, and by integration
//! tests.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod obs;
pub mod session;
pub mod transport;

pub use client::{ClientHandle, RelayClient};
pub use weerelay_proto::{ErrorKind, RelayError, Result};
