//! # Vault Test Suite
//!
//! Cross-component flows exercised through the public `vault-engine` API,
//! with in-memory chain storage and metadata service.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Criterion benchmarks (codec, aggregation, decoding)
//! └── src/
//!     ├── support.rs    # SCALE call encoders, record builders, service harness
//!     └── integration/  # Refresh, config change, call data, connection flows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p vault-tests
//!
//! # By area
//! cargo test -p vault-tests integration::refresh_flows
//! cargo test -p vault-tests integration::call_data_flows
//!
//! # Benchmarks
//! cargo bench -p vault-tests
//! ```

#![allow(dead_code)]

pub mod integration;
pub mod support;
