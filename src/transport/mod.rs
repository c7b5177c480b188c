//! Helpers around the RPC transport.

pub mod error;
