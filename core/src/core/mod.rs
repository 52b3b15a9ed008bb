pub mod action;
pub mod control;
pub mod state;
pub mod step;

// Re-export key types for easier access from other modules (and lib.rs)
pub use action::{Action, Completion};
pub use control::RunReport;
pub use state::RunState;
pub use step::{Step, StepDraft};
