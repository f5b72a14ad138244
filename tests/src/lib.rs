//! # Network-Monitor Test Suite
//!
//! Unified test crate for scenarios that span crates:
//!
//! ```text
//! tests/src/integration/
//! ├── container_wiring.rs   # registry + loader + container end-to-end
//! ├── event_rpc.rs          # EventRPC against live service responders
//! └── bootstrap_e2e.rs      # bootstrap over the shipped wiring files
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p netmon-tests
//! cargo test -p netmon-tests integration::event_rpc
//! ```

#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
