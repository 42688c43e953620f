// Common test utilities
#![allow(dead_code)]

pub mod fake_provider;
pub mod harness;

// Not every test binary uses both halves.
#[allow(unused_imports)]
pub use fake_provider::*;
#[allow(unused_imports)]
pub use harness::*;
