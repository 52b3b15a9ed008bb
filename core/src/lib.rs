// provision/src/lib.rs

//! Provision: dependency-ordered installation steps for a local development
//! environment orchestrator.
//!
//! Independently written provisioning actions ("steps") declare how they must
//! be ordered relative to each other. Provision:
//!  - validates steps as they are registered (synchronously or asynchronously),
//!  - picks the action that applies to the target platform and Linux flavor,
//!  - expands "run me before X" subscriptions into dependency edges,
//!  - orders the steps (first/last pins, cycle detection) and re-validates the order,
//!  - runs them one at a time against a shared, caller-owned state,
//!    reporting progress to injected observers.

pub mod core;
pub mod error;
pub mod install;
pub mod platform;
pub mod registry;
pub mod schedule;

// --- Re-exports for the Public API ---

pub use crate::core::action::{Action, Completion};
pub use crate::core::control::RunReport;
pub use crate::core::state::RunState;
pub use crate::core::step::{Step, StepDraft};

pub use crate::platform::{Flavor, Implementation, LinuxImplementation, Platform};

pub use crate::schedule::{Plan, PlannedStep};

pub use crate::install::{Install, RunEvent, RunObserver};

pub use crate::error::{ProvisionError, ProvisionResult};

pub use crate::registry::{Registry, RegistryOptions, StepPlugin, DEFAULT_REGISTRATION_TIMEOUT};

/*
    Typical use:
    1. Define a state struct `MyState` shared by all steps of a run.
    2. Create a `Registry<MyState>` (or let plugins fill one via `load_plugin`).
    3. Register steps with `register_step(|step| { step.name(..).description(..).dep(..).run(Action::sync(..)); })`.
    4. `registry.steps_for(platform)` to print the plan, or
       `registry.installer_for(platform)` to get an `Install<MyState>`.
    5. Attach observers with `install.on_event(..)`, then
       `install.run(RunState::new(MyState::default())).await`.
*/
