//! Toolchain invocation.
//!
//! Assembles the `go build` command line for a project and runs it. The
//! `CGO_ENABLED` toggle is set on the child process only, so it is scoped to
//! exactly one invocation and the parent environment is never touched.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use thiserror::Error;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::consts::{CGO_ENV, TOOLCHAIN_ENV};
use crate::platform::Os;
use crate::project::ProjectDescriptor;

const DEFAULT_TOOLCHAIN: &str = "go";

#[derive(Debug, Error)]
pub enum ToolchainError {
  #[error("toolchain not found: {}", program.display())]
  NotFound { program: PathBuf },

  #[error("failed to run toolchain {}: {source}", program.display())]
  Spawn { program: PathBuf, source: std::io::Error },

  #[error("failed waiting for toolchain: {0}")]
  Wait(#[source] std::io::Error),

  #[error("toolchain exited with code {code:?}")]
  Failed { code: Option<i32> },

  #[error("toolchain run cancelled")]
  Cancelled,
}

/// The toolchain binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
  program: PathBuf,
}

impl Default for Toolchain {
  fn default() -> Self {
    Self::new(DEFAULT_TOOLCHAIN)
  }
}

impl Toolchain {
  pub fn new(program: impl Into<PathBuf>) -> Self {
    Self {
      program: program.into(),
    }
  }

  /// `TRELLIS_GO` when set, else `go` from `PATH`.
  pub fn from_env() -> Self {
    match std::env::var_os(TOOLCHAIN_ENV) {
      Some(program) if !program.is_empty() => Self::new(program),
      _ => Self::default(),
    }
  }

  pub fn program(&self) -> &Path {
    &self.program
  }

  /// Run the toolchain with `args` until it exits or `cancel` is tripped.
  ///
  /// On cancellation the child is killed and reaped before returning, so the
  /// caller may safely remove the files it was reading.
  pub async fn run(
    &self,
    args: &[String],
    cgo_enabled: bool,
    cancel: &CancellationToken,
  ) -> Result<(), ToolchainError> {
    let mut command = Command::new(&self.program);
    command
      .args(args)
      .env(CGO_ENV, cgo_value(cgo_enabled))
      .kill_on_drop(true);

    debug!(program = %self.program.display(), ?args, cgo = cgo_enabled, "spawning toolchain");

    let mut child = command.spawn().map_err(|source| match source.kind() {
      std::io::ErrorKind::NotFound => ToolchainError::NotFound {
        program: self.program.clone(),
      },
      _ => ToolchainError::Spawn {
        program: self.program.clone(),
        source,
      },
    })?;

    let status = tokio::select! {
      status = child.wait() => Some(status),
      _ = cancel.cancelled() => None,
    };

    match status {
      Some(status) => check_status(status.map_err(ToolchainError::Wait)?),
      None => {
        warn!(program = %self.program.display(), "cancelling toolchain");
        // kill() also reaps the child.
        if let Err(err) = child.kill().await {
          warn!(error = %err, "failed to kill toolchain");
        }
        Err(ToolchainError::Cancelled)
      }
    }
  }

  /// Build `entry_file` for `project` with the composed `ldflags`.
  pub async fn build(
    &self,
    project: &ProjectDescriptor,
    entry_file: &Path,
    ldflags: &str,
    target: &Os,
    verbose: bool,
    cancel: &CancellationToken,
  ) -> Result<PathBuf, ToolchainError> {
    let output = output_name(project, target);
    let args = build_args(project, entry_file, ldflags, target);

    if verbose {
      println!("{} {}", self.program.display(), args.join(" "));
    }

    info!(output = %output, entry = %entry_file.display(), "building");
    self.run(&args, project.toolchain.cgo, cancel).await?;
    info!(output = %output, "build complete");

    Ok(PathBuf::from(output))
  }
}

fn check_status(status: ExitStatus) -> Result<(), ToolchainError> {
  if status.success() {
    Ok(())
  } else {
    Err(ToolchainError::Failed { code: status.code() })
  }
}

pub fn cgo_value(enabled: bool) -> &'static str {
  if enabled { "1" } else { "0" }
}

/// Binary name for `project`, with `.exe` on Windows targets.
pub fn output_name(project: &ProjectDescriptor, target: &Os) -> String {
  format!("{}{}", project.name, target.exe_suffix())
}

/// Arguments for the toolchain: `build -o <output> [flags...] [-ldflags <ldflags>] <entry>`.
pub fn build_args(project: &ProjectDescriptor, entry_file: &Path, ldflags: &str, target: &Os) -> Vec<String> {
  let mut args = vec!["build".to_string(), "-o".to_string(), output_name(project, target)];

  args.extend(project.build.extra_flags.split_whitespace().map(str::to_string));

  if !ldflags.is_empty() {
    args.push("-ldflags".to_string());
    args.push(ldflags.to_string());
  }

  args.push(entry_file.to_string_lossy().into_owned());
  args
}
