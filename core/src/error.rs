// provision/src/error.rs
use anyhow::Error as AnyhowError;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProvisionError {
  // --- Registration errors ---
  #[error("Invalid step '{step_name}': {message}")]
  InvalidStep { step_name: String, message: String },

  #[error("Step registration did not complete within {timeout:?}")]
  RegistrationTimeout { timeout: Duration },

  #[error("Step registration handler failed. Source: {source}")]
  RegistrationFailed {
    #[source]
    source: AnyhowError,
  },

  // --- Graph errors ---
  #[error("More than one step is marked first: {}", .steps.join(", "))]
  MultipleFirst { steps: Vec<String> },

  #[error("More than one step is marked last: {}", .steps.join(", "))]
  MultipleLast { steps: Vec<String> },

  #[error("Step '{step_name}' subscribes to unknown step '{target}'")]
  UnknownSubscription { step_name: String, target: String },

  #[error("Dependency cycle between steps: {}", .cycle.join(" -> "))]
  DependencyCycle { cycle: Vec<String> },

  #[error("Step '{step_name}' depends on '{dependency}', which is not scheduled before it")]
  DependencyNotScheduled { step_name: String, dependency: String },

  #[error("Step '{step_name}' appears more than once in the run order")]
  DuplicateStep { step_name: String },

  // --- Execution errors ---
  #[error("Step '{step_name}' ({description}) failed. Source: {source}")]
  StepFailed {
    step_name: String,
    description: String,
    #[source]
    source: AnyhowError,
  },

  #[error("Unknown platform '{0}'")]
  UnknownPlatform(String),

  #[error("Error in user-provided handler or external operation. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Internal provision error: {0}")]
  Internal(String),
}

impl ProvisionError {
  /// Name of the step the error is about, when there is one.
  pub fn step_name(&self) -> Option<&str> {
    match self {
      ProvisionError::InvalidStep { step_name, .. }
      | ProvisionError::UnknownSubscription { step_name, .. }
      | ProvisionError::DependencyNotScheduled { step_name, .. }
      | ProvisionError::DuplicateStep { step_name }
      | ProvisionError::StepFailed { step_name, .. } => Some(step_name),
      _ => None,
    }
  }
}

impl From<AnyhowError> for ProvisionError {
  fn from(err: AnyhowError) -> Self {
    // Unwrap a ProvisionError that was carried through anyhow instead of nesting it.
    match err.downcast::<ProvisionError>() {
      Ok(provision_err) => provision_err,
      Err(err) => ProvisionError::HandlerError { source: err },
    }
  }
}

pub type ProvisionResult<T, E = ProvisionError> = std::result::Result<T, E>;
