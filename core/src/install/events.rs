// provision/src/install/events.rs

//! Lifecycle notifications emitted while an `Install` runs.

use crate::core::state::RunState;
use crate::error::ProvisionError;
use crate::schedule::PlannedStep;

/// A lifecycle notification. `PreStep`/`PostStep` bracket every step that
/// succeeds; a failing step gets `PreStep` then `Error`. `End` is emitted only
/// when every step completed.
pub enum RunEvent<'a, T: Send + Sync + 'static> {
  PreStep {
    step: &'a PlannedStep<T>,
    state: &'a RunState<T>,
  },
  PostStep {
    step: &'a PlannedStep<T>,
    state: &'a RunState<T>,
  },
  Error {
    error: &'a ProvisionError,
  },
  End {
    state: &'a RunState<T>,
  },
}

impl<T: Send + Sync + 'static> RunEvent<'_, T> {
  pub fn kind(&self) -> &'static str {
    match self {
      RunEvent::PreStep { .. } => "pre-step",
      RunEvent::PostStep { .. } => "post-step",
      RunEvent::Error { .. } => "error",
      RunEvent::End { .. } => "end",
    }
  }

  pub fn step_name(&self) -> Option<&str> {
    match self {
      RunEvent::PreStep { step, .. } | RunEvent::PostStep { step, .. } => Some(step.name()),
      RunEvent::Error { error } => error.step_name(),
      RunEvent::End { .. } => None,
    }
  }
}

/// Receives run events. Called synchronously on the run's task, with no state
/// lock held; observers may read or write the state.
pub trait RunObserver<T: Send + Sync + 'static>: Send + Sync {
  fn notify(&self, event: &RunEvent<'_, T>);
}

impl<T, F> RunObserver<T> for F
where
  T: Send + Sync + 'static,
  F: Fn(&RunEvent<'_, T>) + Send + Sync,
{
  fn notify(&self, event: &RunEvent<'_, T>) {
    self(event)
  }
}
