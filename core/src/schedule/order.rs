// provision/src/schedule/order.rs

//! Orders planned steps: the `first` step, then the remaining steps sorted so
//! that dependencies come before dependents, then the `last` step.

use super::PlannedStep;
use crate::error::{ProvisionError, ProvisionResult};
use std::collections::HashMap;
use tracing::{event, Level};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
  Unvisited,
  InProgress,
  Done,
}

pub fn order_steps<T: Send + Sync + 'static>(planned: Vec<PlannedStep<T>>) -> ProvisionResult<Vec<PlannedStep<T>>> {
  let mut first = Vec::new();
  let mut last = Vec::new();
  let mut normal = Vec::with_capacity(planned.len());
  for planned_step in planned {
    if planned_step.step().first {
      first.push(planned_step);
    } else if planned_step.step().last {
      last.push(planned_step);
    } else {
      normal.push(planned_step);
    }
  }

  if first.len() > 1 {
    let steps: Vec<String> = first.iter().map(|p| p.name().to_string()).collect();
    event!(Level::ERROR, ?steps, "More than one step marked first.");
    return Err(ProvisionError::MultipleFirst { steps });
  }
  if last.len() > 1 {
    let steps: Vec<String> = last.iter().map(|p| p.name().to_string()).collect();
    event!(Level::ERROR, ?steps, "More than one step marked last.");
    return Err(ProvisionError::MultipleLast { steps });
  }

  let sorted = sort_by_dependencies(normal)?;

  let mut ordered = Vec::with_capacity(first.len() + sorted.len() + last.len());
  ordered.extend(first);
  ordered.extend(sorted);
  ordered.extend(last);
  Ok(ordered)
}

/// Depth-first topological sort. Roots are visited in input order and deps in
/// declaration order, so the result is deterministic. Deps naming steps outside
/// `steps` are ignored here and reported by the validator.
fn sort_by_dependencies<T: Send + Sync + 'static>(steps: Vec<PlannedStep<T>>) -> ProvisionResult<Vec<PlannedStep<T>>> {
  let mut sorted_idx = Vec::with_capacity(steps.len());
  {
    let index: HashMap<&str, usize> = steps.iter().enumerate().map(|(i, p)| (p.name(), i)).collect();
    let mut marks = vec![Mark::Unvisited; steps.len()];
    let mut path = Vec::new();
    for root in 0..steps.len() {
      visit(root, &steps, &index, &mut marks, &mut path, &mut sorted_idx)?;
    }
  }

  let mut slots: Vec<Option<PlannedStep<T>>> = steps.into_iter().map(Some).collect();
  sorted_idx
    .into_iter()
    .map(|idx| {
      slots[idx]
        .take()
        .ok_or_else(|| ProvisionError::Internal(format!("step at index {idx} was sorted twice")))
    })
    .collect()
}

fn visit<T: Send + Sync + 'static>(
  idx: usize,
  steps: &[PlannedStep<T>],
  index: &HashMap<&str, usize>,
  marks: &mut [Mark],
  path: &mut Vec<usize>,
  sorted_idx: &mut Vec<usize>,
) -> ProvisionResult<()> {
  match marks[idx] {
    Mark::Done => return Ok(()),
    Mark::InProgress => {
      let start = path.iter().position(|&p| p == idx).unwrap_or(0);
      let mut cycle: Vec<String> = path[start..].iter().map(|&p| steps[p].name().to_string()).collect();
      cycle.push(steps[idx].name().to_string());
      event!(Level::ERROR, ?cycle, "Dependency cycle detected.");
      return Err(ProvisionError::DependencyCycle { cycle });
    }
    Mark::Unvisited => {}
  }

  marks[idx] = Mark::InProgress;
  path.push(idx);
  for dep in steps[idx].deps() {
    if let Some(&dep_idx) = index.get(dep.as_str()) {
      visit(dep_idx, steps, index, marks, path, sorted_idx)?;
    }
  }
  path.pop();
  marks[idx] = Mark::Done;
  sorted_idx.push(idx);
  Ok(())
}
