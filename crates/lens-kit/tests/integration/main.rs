//! Integration tests for lens-kit.
//!
//! The Lens API is stood in for by a local `wiremock` server, so these run
//! offline.
//!
//! Run with: `cargo test --test integration`

mod profile_fetch;
mod typed_data_flow;
