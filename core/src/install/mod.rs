// provision/src/install/mod.rs

//! Executes a computed plan and reports its progress.

pub mod events;
pub mod execution;

pub use events::{RunEvent, RunObserver};
pub use execution::Install;
