// provision/src/platform/mod.rs

//! Target platform selection: operating system plus, on Linux, the detected
//! distribution flavor.

pub mod implementation;

pub use implementation::{Implementation, LinuxImplementation};

use crate::error::{ProvisionError, ProvisionResult};
use std::fmt;
use std::path::Path;
use tracing::{event, Level};

/// OS release descriptors, in lookup order.
pub const OS_RELEASE_PATHS: [&str; 2] = ["/etc/os-release", "/usr/lib/os-release"];

/// Linux distribution family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
  Debian,
  Fedora,
  /// Any distribution not recognized as one of the known families.
  Other,
}

impl Flavor {
  pub fn as_str(&self) -> &'static str {
    match self {
      Flavor::Debian => "debian",
      Flavor::Fedora => "fedora",
      Flavor::Other => "other",
    }
  }

  fn from_family(token: &str) -> Option<Self> {
    match token {
      "debian" => Some(Flavor::Debian),
      "fedora" => Some(Flavor::Fedora),
      _ => None,
    }
  }

  /// Classifies the contents of an os-release file.
  ///
  /// `ID` wins over `ID_LIKE`; `ID_LIKE` tokens are tried in the order listed.
  pub fn from_os_release(contents: &str) -> Self {
    let mut id = None;
    let mut id_like = None;
    for line in contents.lines() {
      let line = line.trim();
      if line.is_empty() || line.starts_with('#') {
        continue;
      }
      let Some((key, value)) = line.split_once('=') else {
        continue;
      };
      let value = value.trim().trim_matches(|c| c == '"' || c == '\'').to_ascii_lowercase();
      match key.trim() {
        "ID" => id = Some(value),
        "ID_LIKE" => id_like = Some(value),
        _ => {}
      }
    }

    id.as_deref()
      .and_then(Flavor::from_family)
      .or_else(|| id_like.as_deref().and_then(|like| like.split_whitespace().find_map(Flavor::from_family)))
      .unwrap_or(Flavor::Other)
  }

  /// Reads and classifies the os-release file at `path`.
  pub fn detect_from(path: impl AsRef<Path>) -> std::io::Result<Self> {
    let contents = std::fs::read_to_string(path)?;
    Ok(Self::from_os_release(&contents))
  }

  /// Detects the host's flavor. Unreadable descriptors yield `Flavor::Other`.
  pub fn detect() -> Self {
    for path in OS_RELEASE_PATHS {
      match Self::detect_from(path) {
        Ok(flavor) => {
          event!(Level::DEBUG, %path, flavor = flavor.as_str(), "Detected Linux flavor.");
          return flavor;
        }
        Err(err) => {
          event!(Level::TRACE, %path, error = %err, "os-release descriptor not readable.");
        }
      }
    }
    event!(Level::WARN, "No readable os-release descriptor; assuming flavor 'other'.");
    Flavor::Other
  }
}

impl fmt::Display for Flavor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The platform a plan is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
  Darwin,
  Win32,
  Linux(Flavor),
}

impl Platform {
  /// The platform this process is running on.
  pub fn current() -> ProvisionResult<Self> {
    if cfg!(target_os = "macos") {
      Ok(Platform::Darwin)
    } else if cfg!(target_os = "windows") {
      Ok(Platform::Win32)
    } else if cfg!(target_os = "linux") {
      Ok(Platform::Linux(Flavor::detect()))
    } else {
      Err(ProvisionError::UnknownPlatform(std::env::consts::OS.to_string()))
    }
  }

  /// Parses a platform name as accepted on the command line.
  ///
  /// Plain `linux` detects the flavor from the host; `linux:<flavor>` pins it.
  pub fn from_name(name: &str) -> ProvisionResult<Self> {
    match name.trim().to_ascii_lowercase().as_str() {
      "darwin" | "macos" => Ok(Platform::Darwin),
      "win32" | "windows" => Ok(Platform::Win32),
      "linux" => Ok(Platform::Linux(Flavor::detect())),
      "linux:debian" => Ok(Platform::Linux(Flavor::Debian)),
      "linux:fedora" => Ok(Platform::Linux(Flavor::Fedora)),
      "linux:other" => Ok(Platform::Linux(Flavor::Other)),
      _ => Err(ProvisionError::UnknownPlatform(name.to_string())),
    }
  }

  pub fn os_name(&self) -> &'static str {
    match self {
      Platform::Darwin => "darwin",
      Platform::Win32 => "win32",
      Platform::Linux(_) => "linux",
    }
  }
}

impl fmt::Display for Platform {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Platform::Linux(flavor) => write!(f, "linux:{flavor}"),
      other => f.write_str(other.os_name()),
    }
  }
}
