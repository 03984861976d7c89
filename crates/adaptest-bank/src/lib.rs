//! adaptest-bank — Item bank backends.
//!
//! Implements the `ItemBank` trait from `adaptest-core`: an in-memory bank
//! with atomic exposure counters, a TOML loader for bank files, and a
//! failure-injecting decorator for resilience testing.

pub mod flaky;
pub mod loader;
pub mod memory;

pub use flaky::FlakyBank;
pub use loader::{load_bank, load_bank_dir};
pub use memory::MemoryBank;
