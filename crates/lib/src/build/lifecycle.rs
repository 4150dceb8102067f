//! Build lifecycle: run the pipeline, race it against termination signals,
//! clean up afterwards.
//!
//! ```text
//! Idle -> Running -> { Completed | Signaled } -> CleanedUp (optional) -> Terminal
//! ```
//!
//! A signal trips the pipeline's cancellation token. The toolchain child is
//! killed and the controller waits (bounded by a grace period) for the task to
//! confirm it stopped, so cleanup never removes the entry file from under a
//! running compiler.

use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{BuildError, BuildRunState, Pipeline};

/// How long a cancelled build may take to stop before it is abandoned.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// How a build run ended.
#[derive(Debug)]
pub enum BuildOutcome {
  /// The toolchain produced the binary at this path.
  Completed(PathBuf),
  Failed(BuildError),
  /// A termination signal arrived first.
  Cancelled,
}

impl BuildOutcome {
  pub fn is_success(&self) -> bool {
    !matches!(self, BuildOutcome::Failed(_))
  }

  /// Process exit status for this outcome.
  pub fn exit_code(&self) -> i32 {
    if self.is_success() { 0 } else { 1 }
  }
}

pub struct LifecycleController {
  state: Arc<BuildRunState>,
  delete_artifacts: bool,
  grace_period: Duration,
}

impl LifecycleController {
  pub fn new(state: Arc<BuildRunState>, delete_artifacts: bool) -> Self {
    Self {
      state,
      delete_artifacts,
      grace_period: DEFAULT_GRACE_PERIOD,
    }
  }

  pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
    self.grace_period = grace_period;
    self
  }

  /// Run `pipeline` until it finishes or `shutdown` resolves, then clean up.
  ///
  /// `shutdown` must already be listening when passed in (see
  /// [`ShutdownSignals::register`]) so no signal is missed while the build
  /// starts.
  pub async fn run<F>(&self, pipeline: Pipeline, shutdown: F) -> BuildOutcome
  where
    F: Future<Output = ()>,
  {
    let cancel = CancellationToken::new();
    let task_cancel = cancel.clone();
    let mut task = tokio::spawn(async move { pipeline.run(&task_cancel).await });
    debug!("build task started");

    let outcome = tokio::select! {
      joined = &mut task => outcome_from(joined),
      _ = shutdown => {
        info!("termination signal received, stopping build");
        cancel.cancel();
        match tokio::time::timeout(self.grace_period, &mut task).await {
          Ok(_) => debug!("build task stopped"),
          Err(_) => {
            warn!(grace = ?self.grace_period, "build task did not stop in time, abandoning it");
            task.abort();
          }
        }
        BuildOutcome::Cancelled
      }
    };

    if self.delete_artifacts {
      match cleanup(&self.state) {
        Ok(Some(dir)) => info!(dir = %dir.display(), "removed build directory"),
        Ok(None) => debug!("no build directory to remove"),
        Err(err) => warn!(error = %err, "failed to remove build directory"),
      }
    }

    outcome
  }
}

fn outcome_from(joined: Result<Result<PathBuf, BuildError>, JoinError>) -> BuildOutcome {
  match joined {
    Ok(Ok(output)) => BuildOutcome::Completed(output),
    Ok(Err(BuildError::Cancelled)) => BuildOutcome::Cancelled,
    Ok(Err(err)) => BuildOutcome::Failed(err),
    Err(err) => BuildOutcome::Failed(BuildError::Aborted(err.to_string())),
  }
}

/// Remove the build directory allocated for this run, if any.
///
/// Directories not allocated by the run (origin mode) are left alone. Returns
/// the removed directory.
pub fn cleanup(state: &BuildRunState) -> io::Result<Option<PathBuf>> {
  let Some(artifact) = state.artifact().filter(|a| a.allocated) else {
    return Ok(None);
  };

  match std::fs::remove_dir_all(&artifact.dir) {
    Ok(()) => Ok(Some(artifact.dir.clone())),
    Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(err) => Err(err),
  }
}

/// Process termination signals, registered up front.
pub struct ShutdownSignals {
  #[cfg(unix)]
  interrupt: tokio::signal::unix::Signal,
  #[cfg(unix)]
  terminate: tokio::signal::unix::Signal,
}

impl ShutdownSignals {
  /// Start listening for SIGINT and SIGTERM (Ctrl-C on Windows).
  ///
  /// Must be called from within a tokio runtime.
  #[cfg(unix)]
  pub fn register() -> io::Result<Self> {
    use tokio::signal::unix::{SignalKind, signal};

    Ok(Self {
      interrupt: signal(SignalKind::interrupt())?,
      terminate: signal(SignalKind::terminate())?,
    })
  }

  #[cfg(not(unix))]
  pub fn register() -> io::Result<Self> {
    Ok(Self {})
  }

  /// Wait for the next termination signal.
  #[cfg(unix)]
  pub async fn recv(mut self) {
    let name = tokio::select! {
      _ = self.interrupt.recv() => "SIGINT",
      _ = self.terminate.recv() => "SIGTERM",
    };
    debug!(signal = name, "received signal");
  }

  #[cfg(not(unix))]
  pub async fn recv(self) {
    if let Err(err) = tokio::signal::ctrl_c().await {
      warn!(error = %err, "failed to listen for ctrl-c");
      std::future::pending::<()>().await;
    }
  }
}
