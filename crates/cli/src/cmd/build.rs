//! Implementation of the `trellis build` command.
//!
//! Loads the project descriptor and runs one full build under the lifecycle
//! controller, which handles termination signals and removes the generated
//! build directory when the project asks for it.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, anyhow};
use clap::Args;
use tracing::info;

use trellis_lib::build::{BuildOutcome, BuildRunState, LifecycleController, Pipeline, ShutdownSignals};
use trellis_lib::consts::DEFAULT_CONFIG_FILE;
use trellis_lib::project;
use trellis_lib::toolchain::Toolchain;

use crate::output::{format_duration, print_success, print_warning};

#[derive(Debug, Args)]
pub struct BuildArgs {
  /// Config file describing the project
  #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
  pub config: PathBuf,
}

/// Execute the build command.
///
/// Any failure (descriptor, generation, flags, toolchain) is returned as an
/// error after cleanup has run.
pub fn cmd_build(args: &BuildArgs, verbose: bool) -> Result<()> {
  let project = project::load(&args.config)
    .with_context(|| format!("Failed to load config: {}", args.config.display()))?;
  info!(project = %project.name, version = %project.version, "loaded project");

  let delete_artifacts = project.build.delete_artifacts_after_build;
  let state = Arc::new(BuildRunState::new(verbose));
  let pipeline = Pipeline::new(Arc::new(project), Arc::clone(&state), Toolchain::from_env());
  let controller = LifecycleController::new(state, delete_artifacts);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let started = Instant::now();
  let outcome = rt.block_on(async {
    let signals = ShutdownSignals::register().context("Failed to listen for termination signals")?;
    Ok::<_, anyhow::Error>(controller.run(pipeline, signals.recv()).await)
  })?;

  match outcome {
    BuildOutcome::Completed(output) => {
      print_success(&format!(
        "Built {} in {}",
        output.display(),
        format_duration(started.elapsed())
      ));
      Ok(())
    }
    BuildOutcome::Cancelled => {
      print_warning("Build interrupted");
      Ok(())
    }
    BuildOutcome::Failed(err) => Err(anyhow!(err).context("Build failed")),
  }
}
