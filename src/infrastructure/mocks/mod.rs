//! Mock implementations for testing.
//!
//! Controllable test doubles for the clock and the collaborator ports,
//! enabling deterministic time in window tests and failure injection in
//! collaborator-fallback tests.

pub mod clock;
pub mod stores;

pub use clock::MockClock;
pub use stores::{InMemoryLoginHistory, InMemoryVendorLedger, MockWriteProtection};
