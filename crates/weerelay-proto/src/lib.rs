//! weerelay core: wire-level contracts and error types for the relay protocol.
//!
//! This crate defines the binary wire format shared by the client runtime and
//! tooling: length-delimited frames (optionally zlib-compressed), the typed
//! object encoding carried inside each frame, and the unified error surface.
//! It intentionally carries no transport or runtime dependencies so it can be
//! reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `RelayError`/`Result` so a client
//! process does not crash on malformed or hostile relay traffic.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod wire;

/// Shared result type.
pub use error::{ErrorKind, RelayError, Result};
