//! Repository hygiene checks: license headers and changelog ordering.

pub mod changelog;
pub mod licenses;

pub use changelog::{ChangelogError, Release, check_changelog, check_changelog_file};
pub use licenses::{LicenseCheck, LicenseError};
