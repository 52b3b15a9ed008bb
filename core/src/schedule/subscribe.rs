// provision/src/schedule/subscribe.rs

//! Expands `subscribes` declarations into dependency edges.
//!
//! `A.subscribes = [S]` adds `A` to `S.deps` and to the deps of every step
//! that depends on `S` at the moment `A` is processed. Propagation is a single
//! hop over the current graph and is not iterated to a fixed point.

use super::PlannedStep;
use crate::core::step::Step;
use crate::error::{ProvisionError, ProvisionResult};
use std::sync::Arc;
use tracing::{event, Level};

pub fn expand_subscriptions<T: Send + Sync + 'static>(
  registered: &[Arc<Step<T>>],
  planned: &mut [PlannedStep<T>],
) -> ProvisionResult<()> {
  let subscribers: Vec<(String, Vec<String>)> = planned
    .iter()
    .filter(|p| !p.step().subscribes.is_empty())
    .map(|p| (p.name().to_string(), p.step().subscribes.iter().cloned().collect()))
    .collect();

  for (subscriber, targets) in subscribers {
    for target in targets {
      if !registered.iter().any(|s| s.name == target) {
        event!(Level::ERROR, step_name = %subscriber, %target, "Subscription target is not registered.");
        return Err(ProvisionError::UnknownSubscription {
          step_name: subscriber,
          target,
        });
      }
      if !planned.iter().any(|p| p.name() == target) {
        event!(Level::DEBUG, step_name = %subscriber, %target, "Subscription target not scheduled on this platform, ignored.");
        continue;
      }

      for planned_step in planned.iter_mut() {
        if planned_step.name() == subscriber {
          continue;
        }
        let is_target = planned_step.name() == target;
        if (is_target || planned_step.deps.contains(&target)) && planned_step.deps.insert(subscriber.clone()) {
          event!(Level::TRACE, step_name = %planned_step.name(), dependency = %subscriber, via = %target, "Dependency added by subscription.");
        }
      }
    }
  }
  Ok(())
}
