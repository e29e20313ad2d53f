//! Top-level facade crate for weerelay.
//!
//! Re-exports the wire layer and the client runtime so users can depend on a
//! single crate.

pub mod proto {
    pub use weerelay_proto::*;
}

pub mod client {
    pub use weerelay_client::*;
}
