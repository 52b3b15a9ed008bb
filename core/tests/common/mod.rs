// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use provision::{Action, Registry};
use std::sync::{atomic::AtomicUsize, Arc};
use tracing::Level;

// --- Common State Structs ---
#[derive(Clone, Debug, Default)]
pub struct TestState {
  pub foo: String,
  pub steps_executed: Vec<String>,
  pub downloads: Vec<String>,
  pub fail_at: Option<String>,
}

// --- Common Error Type for Tests ---
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Test step failed: {0}")]
  Step(String),

  #[error("Test registration failed: {0}")]
  Registration(String),
}

// --- Common Action Creators ---

/// Appends `name` to `state.foo` and records it.
pub fn append_name(name: &'static str) -> Action<TestState> {
  Action::sync(move |state: &mut TestState| {
    state.foo.push_str(name);
    state.steps_executed.push(name.to_string());
    tracing::debug!(target: "test_actions", step = name, "executed, foo: '{}'", state.foo);
    if state.fail_at.as_deref() == Some(name) {
      return Err(TestError::Step(format!("{name} was told to fail")));
    }
    Ok(())
  })
}

pub fn failing(name: &'static str, message: &'static str) -> Action<TestState> {
  Action::sync(move |state: &mut TestState| {
    state.steps_executed.push(name.to_string());
    tracing::warn!(target: "test_actions", step = name, "failing with: '{}'", message);
    Err(TestError::Step(message.to_string()))
  })
}

/// Registers an all-platform step that appends its name to `state.foo`.
pub fn register_simple(registry: &Registry<TestState>, name: &'static str, deps: &[&'static str]) {
  registry
    .register_step(|step| {
      step
        .name(name)
        .description(format!("appends {name}"))
        .deps(deps.iter().copied())
        .run(append_name(name));
    })
    .expect("valid step");
}

/// The b/a/d/c/e/f registry: e is win32-only, f is linux-only.
pub fn scenario_registry() -> Registry<TestState> {
  let registry = Registry::new();
  register_simple(&registry, "b", &[]);
  register_simple(&registry, "a", &["b"]);
  register_simple(&registry, "d", &["a"]);
  register_simple(&registry, "c", &["a", "d"]);
  registry
    .register_step(|step| {
      step.name("e").description("windows only").win32(append_name("e"));
    })
    .expect("valid step");
  registry
    .register_step(|step| {
      step.name("f").description("linux only").dep("a").linux(append_name("f"));
    })
    .expect("valid step");
  registry
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Atomic counters for checking execution counts ---
pub static PLUGIN_LOAD_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));
