//! Top-level facade crate for tripmeter.
//!
//! Re-exports the metrics core and the server library so users can depend on a single crate.

pub mod core {
    pub use tripmeter_core::*;
}

pub mod server {
    pub use tripmeter_server::*;
}
