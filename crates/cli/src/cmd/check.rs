//! Implementation of the `trellis check` commands.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;

use trellis_lib::check::{LicenseCheck, check_changelog_file};

use crate::output::{print_error, print_success};

#[derive(Debug, Args)]
pub struct LicensesArgs {
  /// Comma separated list of valid source code extensions
  #[arg(long, value_delimiter = ',', default_value = ".go")]
  pub extensions: Vec<String>,

  /// The number of lines to read from the head of the file
  #[arg(long, default_value_t = 10)]
  pub length: usize,

  /// Directory path to check licenses
  #[arg(long, default_value = ".")]
  pub location: PathBuf,
}

#[derive(Debug, Args)]
pub struct ChangelogArgs {
  /// Path to CHANGELOG.md
  #[arg(long, default_value = "CHANGELOG.md")]
  pub location: PathBuf,

  /// Version to check (defaults to the current version)
  #[arg(long)]
  pub version: Option<String>,
}

pub fn cmd_check_licenses(args: &LicensesArgs) -> Result<()> {
  let check = LicenseCheck {
    extensions: args.extensions.clone(),
    length: args.length,
    location: args.location.clone(),
  };

  let missing = check
    .missing_headers()
    .with_context(|| format!("Failed to check licenses in {}", args.location.display()))?;

  if missing.is_empty() {
    print_success("All files have license headers");
    return Ok(());
  }

  for path in &missing {
    print_error(&format!("Missing license header: {}", path.display()));
  }
  bail!("{} file(s) missing license headers", missing.len());
}

pub fn cmd_check_changelog(args: &ChangelogArgs) -> Result<()> {
  let version = args.version.as_deref().unwrap_or(env!("CARGO_PKG_VERSION"));

  let release = check_changelog_file(&args.location, version)
    .with_context(|| format!("Changelog check failed: {}", args.location.display()))?;

  print_success(&format!("Changelog is up to date ({})", release.version));
  Ok(())
}
