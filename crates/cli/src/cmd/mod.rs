mod build;
mod check;

pub use build::{BuildArgs, cmd_build};
pub use check::{ChangelogArgs, LicensesArgs, cmd_check_changelog, cmd_check_licenses};
