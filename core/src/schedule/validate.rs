// provision/src/schedule/validate.rs

//! Re-checks a computed run order: every dep already scheduled, no name twice.

use super::PlannedStep;
use crate::error::{ProvisionError, ProvisionResult};
use std::collections::HashSet;
use tracing::{event, Level};

pub fn validate_order<T: Send + Sync + 'static>(ordered: &[PlannedStep<T>]) -> ProvisionResult<()> {
  let mut seen: HashSet<&str> = HashSet::with_capacity(ordered.len());
  for planned_step in ordered {
    let name = planned_step.name();
    if let Some(dependency) = planned_step.deps().iter().find(|dep| !seen.contains(dep.as_str())) {
      event!(Level::ERROR, step_name = %name, %dependency, "Dependency is not scheduled before its dependent.");
      return Err(ProvisionError::DependencyNotScheduled {
        step_name: name.to_string(),
        dependency: dependency.clone(),
      });
    }
    if !seen.insert(name) {
      event!(Level::ERROR, step_name = %name, "Step scheduled twice.");
      return Err(ProvisionError::DuplicateStep {
        step_name: name.to_string(),
      });
    }
  }
  Ok(())
}
