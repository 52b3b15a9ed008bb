// provision/src/core/control.rs

//! Defines the outcome of a successful orchestration run.

use crate::platform::Platform;

/// Summary of a run in which every scheduled step completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
  pub platform: Platform,
  /// Names of the executed steps, in execution order.
  pub completed: Vec<String>,
}

impl RunReport {
  pub fn steps_run(&self) -> usize {
    self.completed.len()
  }
}
