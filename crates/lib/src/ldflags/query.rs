//! Environment queries available to link flag templates.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Command;

use chrono::{DateTime, Local};
use tracing::debug;

/// Facts about the build host that link flag templates can embed.
///
/// Every query is best effort: `None` means the fact is unavailable and the
/// template sees an empty string.
pub trait EnvQuery: Send + Sync {
  /// Output of the toolchain's version subcommand.
  fn compiler_version(&self) -> Option<String>;

  /// Name of the user running the build.
  fn author(&self) -> Option<String>;

  fn hostname(&self) -> Option<String>;

  fn now(&self) -> DateTime<Local>;
}

/// Queries the real host, shelling out where needed.
#[derive(Debug, Clone)]
pub struct SystemEnvQuery {
  toolchain: PathBuf,
}

impl SystemEnvQuery {
  pub fn new(toolchain: impl Into<PathBuf>) -> Self {
    Self {
      toolchain: toolchain.into(),
    }
  }
}

impl EnvQuery for SystemEnvQuery {
  fn compiler_version(&self) -> Option<String> {
    command_output(&self.toolchain, ["version"])
  }

  // `whoami` rather than OS user APIs, which are not available everywhere
  // the build runs (static binaries, containers without passwd entries).
  fn author(&self) -> Option<String> {
    command_output("whoami", std::iter::empty::<&str>())
  }

  fn hostname(&self) -> Option<String> {
    whoami::fallible::hostname().ok()
  }

  fn now(&self) -> DateTime<Local> {
    Local::now()
  }
}

/// Run `program` and return its trimmed stdout, or `None` if it could not be
/// run, failed, or printed nothing.
pub fn command_output<I, S>(program: impl AsRef<OsStr>, args: I) -> Option<String>
where
  I: IntoIterator<Item = S>,
  S: AsRef<OsStr>,
{
  let program = program.as_ref();
  let output = match Command::new(program).args(args).output() {
    Ok(output) => output,
    Err(err) => {
      debug!(program = ?program, error = %err, "query command could not be run");
      return None;
    }
  };

  if !output.status.success() {
    debug!(program = ?program, code = ?output.status.code(), "query command failed");
    return None;
  }

  let stdout = String::from_utf8_lossy(&output.stdout);
  let trimmed = stdout.trim_matches([' ', '\n', '\r']);
  (!trimmed.is_empty()).then(|| trimmed.to_string())
}
