// provision/src/schedule/mod.rs

//! Turns a registry snapshot into a run order for one platform:
//! platform filter, subscribe expansion, ordering, validation.

pub mod order;
pub mod subscribe;
pub mod validate;

use crate::core::action::Action;
use crate::core::step::Step;
use crate::error::ProvisionResult;
use crate::platform::Platform;
use indexmap::IndexSet;
use std::fmt;
use std::sync::Arc;
use tracing::{event, Level};

/// A step scheduled for a specific platform: the registered step, its action
/// there, and its deps after subscribe expansion.
pub struct PlannedStep<T: Send + Sync + 'static> {
  step: Arc<Step<T>>,
  action: Action<T>,
  pub(crate) deps: IndexSet<String>,
}

impl<T: Send + Sync + 'static> PlannedStep<T> {
  pub(crate) fn new(step: Arc<Step<T>>, action: Action<T>) -> Self {
    let deps = step.deps.clone();
    Self { step, action, deps }
  }

  pub fn name(&self) -> &str {
    &self.step.name
  }

  pub fn description(&self) -> &str {
    &self.step.description
  }

  /// Deps including those added by other steps' subscriptions.
  pub fn deps(&self) -> &IndexSet<String> {
    &self.deps
  }

  pub fn step(&self) -> &Arc<Step<T>> {
    &self.step
  }

  pub fn action(&self) -> &Action<T> {
    &self.action
  }
}

impl<T: Send + Sync + 'static> Clone for PlannedStep<T> {
  fn clone(&self) -> Self {
    Self {
      step: Arc::clone(&self.step),
      action: self.action.clone(),
      deps: self.deps.clone(),
    }
  }
}

impl<T: Send + Sync + 'static> fmt::Debug for PlannedStep<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PlannedStep")
      .field("name", &self.name())
      .field("deps", &self.deps)
      .field("action", &self.action)
      .finish()
  }
}

/// The validated run order for one platform.
pub struct Plan<T: Send + Sync + 'static> {
  platform: Platform,
  steps: Vec<PlannedStep<T>>,
}

impl<T: Send + Sync + 'static> Plan<T> {
  /// Computes the run order of `registered` (in registration order) for `platform`.
  pub fn build(registered: &[Arc<Step<T>>], platform: Platform) -> ProvisionResult<Self> {
    let mut planned = filter_steps(registered, platform);
    subscribe::expand_subscriptions(registered, &mut planned)?;
    let ordered = order::order_steps(planned)?;
    validate::validate_order(&ordered)?;
    event!(Level::DEBUG, %platform, num_steps = ordered.len(), "Run order computed.");
    Ok(Self {
      platform,
      steps: ordered,
    })
  }

  pub fn platform(&self) -> Platform {
    self.platform
  }

  pub fn steps(&self) -> &[PlannedStep<T>] {
    &self.steps
  }

  pub fn iter(&self) -> std::slice::Iter<'_, PlannedStep<T>> {
    self.steps.iter()
  }

  pub fn names(&self) -> Vec<&str> {
    self.steps.iter().map(PlannedStep::name).collect()
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }
}

impl<'a, T: Send + Sync + 'static> IntoIterator for &'a Plan<T> {
  type Item = &'a PlannedStep<T>;
  type IntoIter = std::slice::Iter<'a, PlannedStep<T>>;

  fn into_iter(self) -> Self::IntoIter {
    self.iter()
  }
}

impl<T: Send + Sync + 'static> fmt::Display for Plan<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (idx, step) in self.steps.iter().enumerate() {
      writeln!(f, "{}. {}: {}", idx + 1, step.name(), step.description())?;
    }
    Ok(())
  }
}

impl<T: Send + Sync + 'static> fmt::Debug for Plan<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Plan")
      .field("platform", &self.platform)
      .field("steps", &self.names())
      .finish()
  }
}

/// Keeps the steps that have an action on `platform`, in registration order.
pub fn filter_steps<T: Send + Sync + 'static>(registered: &[Arc<Step<T>>], platform: Platform) -> Vec<PlannedStep<T>> {
  registered
    .iter()
    .filter_map(|step| match step.resolve(platform) {
      Some(action) => Some(PlannedStep::new(Arc::clone(step), action.clone())),
      None => {
        event!(Level::DEBUG, step_name = %step.name, %platform, "Step has no action on this platform, excluded.");
        None
      }
    })
    .collect()
}
