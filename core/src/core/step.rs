// provision/src/core/step.rs

//! Defines `Step<T>`, a named provisioning action with ordering constraints,
//! and `StepDraft<T>`, the blank step a registration handler fills in.

use crate::core::action::Action;
use crate::error::{ProvisionError, ProvisionResult};
use crate::platform::{Flavor, Implementation, LinuxImplementation, Platform};
use indexmap::IndexSet;

/// A validated step. Immutable once accepted by the registry.
pub struct Step<T: Send + Sync + 'static> {
  pub name: String,
  pub description: String,
  /// Steps that must run before this one.
  pub deps: IndexSet<String>,
  /// Steps this one must run before.
  pub subscribes: IndexSet<String>,
  pub first: bool,
  pub last: bool,
  pub implementation: Implementation<T>,
}

impl<T: Send + Sync + 'static> Step<T> {
  pub fn resolve(&self, platform: Platform) -> Option<&Action<T>> {
    self.implementation.resolve(platform)
  }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for Step<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Step")
      .field("name", &self.name)
      .field("description", &self.description)
      .field("deps", &self.deps)
      .field("subscribes", &self.subscribes)
      .field("first", &self.first)
      .field("last", &self.last)
      .field("implementation", &self.implementation)
      .finish()
  }
}

/// A step under construction. Handed to registration handlers, then validated
/// into a `Step<T>`.
pub struct StepDraft<T: Send + Sync + 'static> {
  name: String,
  description: String,
  deps: Vec<String>,
  subscribes: Vec<String>,
  first: bool,
  last: bool,
  everywhere: Option<Action<T>>,
  darwin: Option<Action<T>>,
  win32: Option<Action<T>>,
  linux: Option<Action<T>>,
  debian: Option<Action<T>>,
  fedora: Option<Action<T>>,
  other: Option<Action<T>>,
}

impl<T: Send + Sync + 'static> Default for StepDraft<T> {
  fn default() -> Self {
    Self {
      name: String::new(),
      description: String::new(),
      deps: Vec::new(),
      subscribes: Vec::new(),
      first: false,
      last: false,
      everywhere: None,
      darwin: None,
      win32: None,
      linux: None,
      debian: None,
      fedora: None,
      other: None,
    }
  }
}

impl<T: Send + Sync + 'static> StepDraft<T> {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
    self.name = name.into();
    self
  }

  pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
    self.description = description.into();
    self
  }

  pub fn dep(&mut self, name: impl Into<String>) -> &mut Self {
    self.deps.push(name.into());
    self
  }

  pub fn deps<I, S>(&mut self, names: I) -> &mut Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.deps.extend(names.into_iter().map(Into::into));
    self
  }

  /// Orders this step before `name` (and before whatever already depends on it).
  pub fn subscribe(&mut self, name: impl Into<String>) -> &mut Self {
    self.subscribes.push(name.into());
    self
  }

  pub fn first(&mut self) -> &mut Self {
    self.first = true;
    self
  }

  pub fn last(&mut self) -> &mut Self {
    self.last = true;
    self
  }

  /// The action to run on every platform.
  pub fn run(&mut self, action: Action<T>) -> &mut Self {
    self.everywhere = Some(action);
    self
  }

  pub fn darwin(&mut self, action: Action<T>) -> &mut Self {
    self.darwin = Some(action);
    self
  }

  pub fn win32(&mut self, action: Action<T>) -> &mut Self {
    self.win32 = Some(action);
    self
  }

  /// The action to run on every Linux distribution.
  pub fn linux(&mut self, action: Action<T>) -> &mut Self {
    self.linux = Some(action);
    self
  }

  pub fn linux_flavor(&mut self, flavor: Flavor, action: Action<T>) -> &mut Self {
    match flavor {
      Flavor::Debian => self.debian = Some(action),
      Flavor::Fedora => self.fedora = Some(action),
      Flavor::Other => self.other = Some(action),
    }
    self
  }

  /// Validates the draft and turns it into a `Step<T>`.
  pub fn finish(self) -> ProvisionResult<Step<T>> {
    let label = if self.name.trim().is_empty() {
      "<unnamed>".to_string()
    } else {
      self.name.clone()
    };
    let invalid = |message: &str| ProvisionError::InvalidStep {
      step_name: label.clone(),
      message: message.to_string(),
    };

    if self.name.trim().is_empty() {
      return Err(invalid("name must be a non-empty string"));
    }
    if self.description.trim().is_empty() {
      return Err(invalid("description must be a non-empty string"));
    }
    if self.first && self.last {
      return Err(invalid("a step cannot be both first and last"));
    }

    let deps = collect_names(&self.name, "deps", self.deps).map_err(|m| invalid(&m))?;
    let subscribes = collect_names(&self.name, "subscribes", self.subscribes).map_err(|m| invalid(&m))?;

    let has_per_os = self.darwin.is_some()
      || self.win32.is_some()
      || self.linux.is_some()
      || self.debian.is_some()
      || self.fedora.is_some()
      || self.other.is_some();
    let has_per_flavor = self.debian.is_some() || self.fedora.is_some() || self.other.is_some();

    let implementation = match self.everywhere {
      Some(_) if has_per_os => {
        return Err(invalid("an all-platform action cannot be combined with per-OS actions"));
      }
      Some(action) => Implementation::Everywhere(action),
      None => {
        let linux = match self.linux {
          Some(_) if has_per_flavor => {
            return Err(invalid("a Linux-wide action cannot be combined with per-flavor actions"));
          }
          Some(action) => Some(LinuxImplementation::All(action)),
          None if has_per_flavor => Some(LinuxImplementation::PerFlavor {
            debian: self.debian,
            fedora: self.fedora,
            other: self.other,
          }),
          None => None,
        };
        Implementation::PerOs {
          darwin: self.darwin,
          win32: self.win32,
          linux,
        }
      }
    };
    if implementation.action_count() == 0 {
      return Err(invalid("no implementation: at least one action must be provided"));
    }

    Ok(Step {
      name: self.name,
      description: self.description,
      deps,
      subscribes,
      first: self.first,
      last: self.last,
      implementation,
    })
  }
}

fn collect_names(owner: &str, field: &str, names: Vec<String>) -> Result<IndexSet<String>, String> {
  let mut set = IndexSet::with_capacity(names.len());
  for name in names {
    if name.trim().is_empty() {
      return Err(format!("{field} must contain only non-empty step names"));
    }
    if name == owner {
      return Err(format!("{field} must not reference the step itself"));
    }
    set.insert(name);
  }
  Ok(set)
}
