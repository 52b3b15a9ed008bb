// provision/src/platform/implementation.rs

//! Typed mapping from a platform to the action a step runs there.

use super::{Flavor, Platform};
use crate::core::action::Action;

/// Where a step's action(s) apply.
pub enum Implementation<T: Send + Sync + 'static> {
  /// One action for every platform.
  Everywhere(Action<T>),
  /// Per-OS actions. A `None` slot means the step is skipped on that OS.
  PerOs {
    darwin: Option<Action<T>>,
    win32: Option<Action<T>>,
    linux: Option<LinuxImplementation<T>>,
  },
}

pub enum LinuxImplementation<T: Send + Sync + 'static> {
  /// One action for every distribution.
  All(Action<T>),
  PerFlavor {
    debian: Option<Action<T>>,
    fedora: Option<Action<T>>,
    other: Option<Action<T>>,
  },
}

impl<T: Send + Sync + 'static> LinuxImplementation<T> {
  pub fn resolve(&self, flavor: Flavor) -> Option<&Action<T>> {
    match self {
      LinuxImplementation::All(action) => Some(action),
      LinuxImplementation::PerFlavor { debian, fedora, other } => match flavor {
        Flavor::Debian => debian.as_ref(),
        Flavor::Fedora => fedora.as_ref(),
        Flavor::Other => other.as_ref(),
      },
    }
  }

  fn action_count(&self) -> usize {
    match self {
      LinuxImplementation::All(_) => 1,
      LinuxImplementation::PerFlavor { debian, fedora, other } => {
        [debian, fedora, other].iter().filter(|a| a.is_some()).count()
      }
    }
  }
}

impl<T: Send + Sync + 'static> Implementation<T> {
  /// Picks the action that applies on `platform`, or `None` if the step does
  /// not run there.
  pub fn resolve(&self, platform: Platform) -> Option<&Action<T>> {
    match self {
      Implementation::Everywhere(action) => Some(action),
      Implementation::PerOs { darwin, win32, linux } => match platform {
        Platform::Darwin => darwin.as_ref(),
        Platform::Win32 => win32.as_ref(),
        Platform::Linux(flavor) => linux.as_ref().and_then(|l| l.resolve(flavor)),
      },
    }
  }

  /// Number of concrete actions reachable in this mapping.
  pub fn action_count(&self) -> usize {
    match self {
      Implementation::Everywhere(_) => 1,
      Implementation::PerOs { darwin, win32, linux } => {
        usize::from(darwin.is_some())
          + usize::from(win32.is_some())
          + linux.as_ref().map_or(0, LinuxImplementation::action_count)
      }
    }
  }
}

impl<T: Send + Sync + 'static> std::fmt::Debug for Implementation<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Implementation::Everywhere(action) => f.debug_tuple("Everywhere").field(action).finish(),
      Implementation::PerOs { darwin, win32, linux } => f
        .debug_struct("PerOs")
        .field("darwin", darwin)
        .field("win32", win32)
        .field("linux_actions", &linux.as_ref().map_or(0, LinuxImplementation::action_count))
        .finish(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn noop() -> Action<String> {
    Action::sync(|_: &mut String| Ok::<(), anyhow::Error>(()))
  }

  #[test]
  fn everywhere_applies_to_all_platforms() {
    let implementation = Implementation::Everywhere(noop());
    assert!(implementation.resolve(Platform::Darwin).is_some());
    assert!(implementation.resolve(Platform::Win32).is_some());
    assert!(implementation.resolve(Platform::Linux(Flavor::Other)).is_some());
  }

  #[test]
  fn per_flavor_does_not_fall_back_to_other() {
    let implementation = Implementation::PerOs {
      darwin: None,
      win32: None,
      linux: Some(LinuxImplementation::PerFlavor {
        debian: None,
        fedora: Some(noop()),
        other: Some(noop()),
      }),
    };
    assert!(implementation.resolve(Platform::Linux(Flavor::Fedora)).is_some());
    assert!(implementation.resolve(Platform::Linux(Flavor::Other)).is_some());
    assert!(implementation.resolve(Platform::Linux(Flavor::Debian)).is_none());
    assert!(implementation.resolve(Platform::Darwin).is_none());
    assert_eq!(implementation.action_count(), 2);
  }

  #[test]
  fn empty_mapping_has_no_actions() {
    let implementation: Implementation<String> = Implementation::PerOs {
      darwin: None,
      win32: None,
      linux: Some(LinuxImplementation::PerFlavor {
        debian: None,
        fedora: None,
        other: None,
      }),
    };
    assert_eq!(implementation.action_count(), 0);
  }
}
