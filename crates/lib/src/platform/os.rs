use std::fmt;

use crate::consts::TARGET_OS_ENV;

/// Operating system a binary is built for, named the way the Go toolchain
/// names them (`GOOS`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Os {
  Linux,
  Darwin,
  Windows,
  Solaris,
  FreeBsd,
  Other(String),
}

impl Os {
  /// Detect the host operating system
  pub fn host() -> Self {
    match std::env::consts::OS {
      "macos" => Self::Darwin,
      other => Self::parse(other),
    }
  }

  /// The OS the toolchain will target: `GOOS` when set, else the host.
  pub fn target() -> Self {
    match std::env::var(TARGET_OS_ENV) {
      Ok(goos) if !goos.trim().is_empty() => Self::parse(goos.trim()),
      _ => Self::host(),
    }
  }

  pub fn parse(name: &str) -> Self {
    match name {
      "linux" => Self::Linux,
      "darwin" => Self::Darwin,
      "windows" => Self::Windows,
      "solaris" => Self::Solaris,
      "freebsd" => Self::FreeBsd,
      other => Self::Other(other.to_string()),
    }
  }

  /// Returns the lowercase `GOOS` identifier for this OS
  pub fn as_str(&self) -> &str {
    match self {
      Self::Linux => "linux",
      Self::Darwin => "darwin",
      Self::Windows => "windows",
      Self::Solaris => "solaris",
      Self::FreeBsd => "freebsd",
      Self::Other(name) => name,
    }
  }

  /// Whether the platform linker refuses fully static binaries.
  pub fn disallows_static_linking(&self) -> bool {
    matches!(self, Self::Darwin | Self::Solaris)
  }

  /// Suffix appended to executables built for this OS.
  pub fn exe_suffix(&self) -> &'static str {
    match self {
      Self::Windows => ".exe",
      _ => "",
    }
  }
}

impl fmt::Display for Os {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}
