// provision/src/registry.rs

//! Defines `Registry<T>`, the caller-owned collection of registered steps, and
//! `StepPlugin<T>`, the seam through which provisioning plugins contribute steps.
//! A registry hands out plans (`steps_for`) and executable installs (`installer_for`)
//! per platform.

use crate::core::step::{Step, StepDraft};
use crate::error::{ProvisionError, ProvisionResult};
use crate::install::execution::Install;
use crate::platform::Platform;
use crate::schedule::Plan;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{event, instrument, Level};

/// Upper bound for an async registration handler to hand its step back.
pub const DEFAULT_REGISTRATION_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone)]
pub struct RegistryOptions {
  pub registration_timeout: Duration,
}

impl Default for RegistryOptions {
  fn default() -> Self {
    Self {
      registration_timeout: DEFAULT_REGISTRATION_TIMEOUT,
    }
  }
}

/// A source of steps, e.g. one provisioning concern (DNS, VM, file sync).
#[async_trait]
pub trait StepPlugin<T>: Send + Sync
where
  T: Send + Sync + 'static,
{
  fn name(&self) -> &str;

  /// Registers this plugin's steps.
  async fn register(&self, registry: &Registry<T>) -> ProvisionResult<()>;
}

/// The step registry. Registration order is significant: it is the tiebreak
/// used when ordering steps that do not depend on each other.
pub struct Registry<T: Send + Sync + 'static> {
  steps: RwLock<Vec<Arc<Step<T>>>>,
  options: RegistryOptions,
}

impl<T: Send + Sync + 'static> Registry<T> {
  pub fn new() -> Self {
    Self::with_options(RegistryOptions::default())
  }

  pub fn with_options(options: RegistryOptions) -> Self {
    Self {
      steps: RwLock::new(Vec::new()),
      options,
    }
  }

  pub fn options(&self) -> &RegistryOptions {
    &self.options
  }

  /// Registers a step described synchronously by `handler`.
  ///
  /// A step with the same name registered earlier is replaced.
  #[instrument(name = "Registry::register_step", skip_all, err(Display))]
  pub fn register_step<F>(&self, handler: F) -> ProvisionResult<()>
  where
    F: FnOnce(&mut StepDraft<T>),
  {
    let mut draft = StepDraft::new();
    handler(&mut draft);
    self.accept(draft)
  }

  /// Registers a step whose definition has to be gathered asynchronously.
  ///
  /// The handler receives the blank draft and resolves to the filled-in draft.
  /// It must resolve within `RegistryOptions::registration_timeout`.
  #[instrument(name = "Registry::register_step_async", skip_all, err(Display))]
  pub async fn register_step_async<F, Fut, E>(&self, handler: F) -> ProvisionResult<()>
  where
    F: FnOnce(StepDraft<T>) -> Fut,
    Fut: Future<Output = Result<StepDraft<T>, E>>,
    E: Into<anyhow::Error>,
  {
    let timeout = self.options.registration_timeout;
    let draft = match tokio::time::timeout(timeout, handler(StepDraft::new())).await {
      Ok(Ok(draft)) => draft,
      Ok(Err(err)) => {
        let source: anyhow::Error = err.into();
        event!(Level::ERROR, error = %source, "Registration handler failed.");
        return Err(ProvisionError::RegistrationFailed { source });
      }
      Err(_) => {
        event!(Level::ERROR, ?timeout, "Registration handler did not complete in time.");
        return Err(ProvisionError::RegistrationTimeout { timeout });
      }
    };
    self.accept(draft)
  }

  /// Lets `plugin` register its steps.
  #[instrument(name = "Registry::load_plugin", skip_all, fields(plugin = plugin.name()), err(Display))]
  pub async fn load_plugin(&self, plugin: &dyn StepPlugin<T>) -> ProvisionResult<()> {
    let before = self.len();
    plugin.register(self).await?;
    event!(Level::DEBUG, registered = self.len().saturating_sub(before), "Plugin loaded.");
    Ok(())
  }

  fn accept(&self, draft: StepDraft<T>) -> ProvisionResult<()> {
    let step = draft.finish()?;
    let mut steps = self.steps.write();
    if let Some(idx) = steps.iter().position(|s| s.name == step.name) {
      event!(Level::INFO, step_name = %step.name, "Replacing previously registered step.");
      steps.remove(idx);
    }
    event!(Level::DEBUG, step_name = %step.name, deps = step.deps.len(), subscribes = step.subscribes.len(), "Step registered.");
    steps.push(Arc::new(step));
    Ok(())
  }

  /// Removes every registered step.
  pub fn clear_steps(&self) {
    self.steps.write().clear();
    event!(Level::DEBUG, "Registry cleared.");
  }

  pub fn len(&self) -> usize {
    self.steps.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.read().is_empty()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.steps.read().iter().any(|s| s.name == name)
  }

  /// Registered step names, in registration order.
  pub fn step_names(&self) -> Vec<String> {
    self.steps.read().iter().map(|s| s.name.clone()).collect()
  }

  fn snapshot(&self) -> Vec<Arc<Step<T>>> {
    self.steps.read().clone()
  }

  /// Computes the run order for `platform` without executing anything.
  #[instrument(name = "Registry::steps_for", skip(self), err(Display))]
  pub fn steps_for(&self, platform: Platform) -> ProvisionResult<Plan<T>> {
    Plan::build(&self.snapshot(), platform)
  }

  /// Computes the run order for `platform` and wraps it in an executable `Install`.
  #[instrument(name = "Registry::installer_for", skip(self), err(Display))]
  pub fn installer_for(&self, platform: Platform) -> ProvisionResult<Install<T>> {
    Ok(Install::new(self.steps_for(platform)?))
  }
}

impl<T: Send + Sync + 'static> Default for Registry<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for Registry<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Registry")
      .field("steps", &self.step_names())
      .field("options", &self.options)
      .finish()
  }
}
