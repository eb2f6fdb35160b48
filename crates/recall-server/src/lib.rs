//! Recall server library
//!
//! The HTTP API lives here so integration tests can build the router
//! without spawning the binary.

pub mod api;
