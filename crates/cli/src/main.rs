mod cmd;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{BuildArgs, ChangelogArgs, LicensesArgs};
use output::print_error;

const DEFAULT_LOG_FILTER: &str = "info";

/// trellis - build trellis projects from a config file
#[derive(Parser)]
#[command(name = "trellis")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Print debug information
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build the project described by a config file
  Build(BuildArgs),

  /// Check project information, such as license headers
  #[command(subcommand)]
  Check(CheckCommands),
}

#[derive(Subcommand)]
enum CheckCommands {
  /// Check that source files carry a license header
  Licenses(LicensesArgs),

  /// Check that the changelog is ordered and up to date
  Changelog(ChangelogArgs),
}

fn main() {
  let cli = Cli::parse();

  init_logging(cli.verbose);

  let result = match cli.command {
    Commands::Build(args) => cmd::cmd_build(&args, cli.verbose),
    Commands::Check(CheckCommands::Licenses(args)) => cmd::cmd_check_licenses(&args),
    Commands::Check(CheckCommands::Changelog(args)) => cmd::cmd_check_changelog(&args),
  };

  if let Err(err) = result {
    if cli.verbose {
      print_error(&format!("{:?}", err));
    } else {
      print_error(&format!("{:#}", err));
    }
    std::process::exit(1);
  }
}

fn init_logging(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();
}
