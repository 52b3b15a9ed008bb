// provision/src/install/execution.rs

//! Contains `Install<T>`, the executable form of a plan. `Install::run` executes
//! the planned steps strictly one after another against a shared `RunState<T>`.

use crate::core::action::{Action, Completion};
use crate::core::control::RunReport;
use crate::core::state::RunState;
use crate::error::{ProvisionError, ProvisionResult};
use crate::install::events::{RunEvent, RunObserver};
use crate::schedule::{Plan, PlannedStep};
use anyhow::anyhow;
use std::sync::Arc;
use tracing::{event, info_span, instrument, Instrument, Level};

pub struct Install<T: Send + Sync + 'static> {
  plan: Arc<Plan<T>>,
  observers: Vec<Arc<dyn RunObserver<T>>>,
}

impl<T: Send + Sync + 'static> Install<T> {
  pub fn new(plan: Plan<T>) -> Self {
    Self {
      plan: Arc::new(plan),
      observers: Vec::new(),
    }
  }

  pub fn plan(&self) -> &Plan<T> {
    &self.plan
  }

  /// Adds an observer for this install's run events.
  pub fn subscribe(&mut self, observer: Arc<dyn RunObserver<T>>) -> &mut Self {
    self.observers.push(observer);
    self
  }

  /// Adds a closure observer.
  pub fn on_event<F>(&mut self, f: F) -> &mut Self
  where
    F: Fn(&RunEvent<'_, T>) + Send + Sync + 'static,
  {
    self.subscribe(Arc::new(f))
  }

  fn emit(&self, event: &RunEvent<'_, T>) {
    event!(Level::TRACE, kind = event.kind(), step_name = ?event.step_name(), "Emitting run event.");
    for observer in &self.observers {
      observer.notify(event);
    }
  }

  /// Executes every planned step in order against `state`.
  ///
  /// Stops at the first failing step. The failure is emitted as
  /// `RunEvent::Error` and returned as `ProvisionError::StepFailed`; no later
  /// step runs. `RunEvent::End` is emitted only when every step completed.
  #[instrument(
    name = "Install::run",
    skip_all,
    fields(
      platform = %self.plan.platform(),
      num_steps = self.plan.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, state: RunState<T>) -> ProvisionResult<RunReport> {
    event!(Level::DEBUG, "Install run starting.");
    let mut completed = Vec::with_capacity(self.plan.len());

    for (step_idx, planned_step) in self.plan.iter().enumerate() {
      let step_span = info_span!(
        "install_step",
        step_name = planned_step.name(),
        step_index = step_idx,
        action = planned_step.action().kind()
      );

      self.emit(&RunEvent::PreStep {
        step: planned_step,
        state: &state,
      });

      let outcome = run_action(planned_step, &state).instrument(step_span.clone()).await;

      if let Err(source) = outcome {
        let _guard = step_span.enter();
        event!(Level::ERROR, error = %source, "Step failed, halting run.");
        let error = ProvisionError::StepFailed {
          step_name: planned_step.name().to_string(),
          description: planned_step.description().to_string(),
          source,
        };
        self.emit(&RunEvent::Error { error: &error });
        return Err(error);
      }

      self.emit(&RunEvent::PostStep {
        step: planned_step,
        state: &state,
      });
      completed.push(planned_step.name().to_string());
    }

    self.emit(&RunEvent::End { state: &state });
    event!(Level::DEBUG, "Install run completed.");
    Ok(RunReport {
      platform: self.plan.platform(),
      completed,
    })
  }
}

impl<T: Send + Sync + 'static> Clone for Install<T> {
  fn clone(&self) -> Self {
    Self {
      plan: Arc::clone(&self.plan),
      observers: self.observers.clone(),
    }
  }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for Install<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Install")
      .field("plan", &self.plan)
      .field("observers", &self.observers.len())
      .finish()
  }
}

async fn run_action<T: Send + Sync + 'static>(planned_step: &PlannedStep<T>, state: &RunState<T>) -> anyhow::Result<()> {
  match planned_step.action() {
    Action::Sync(f) => {
      event!(Level::DEBUG, "Running synchronous action.");
      f(&mut *state.write())
    }
    Action::Deferred(f) => {
      event!(Level::DEBUG, "Awaiting deferred action.");
      f(state.clone()).await
    }
    Action::Callback(f) => {
      event!(Level::DEBUG, "Waiting for callback completion.");
      let (completion, signal) = Completion::channel();
      f(state.clone(), completion);
      match signal.await {
        Ok(result) => result,
        Err(_) => Err(anyhow!("completion signal was dropped without being fired")),
      }
    }
  }
}
