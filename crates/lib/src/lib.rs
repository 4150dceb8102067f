//! trellis-lib: build orchestration for trellis projects
//!
//! This crate provides everything behind `trellis build`:
//! - `project`: the project descriptor and its loader
//! - `entry`: generation of the program entry point
//! - `ldflags`: templated link flag composition
//! - `toolchain`: invocation of the Go toolchain
//! - `build`: the pipeline tying these together, run under a lifecycle
//!   controller that handles signals and cleanup
//!
//! `check` holds the standalone license header and changelog checks.

pub mod build;
pub mod check;
pub mod consts;
pub mod entry;
pub mod ldflags;
pub mod platform;
pub mod project;
pub mod toolchain;
pub mod util;
