//! Project builds.
//!
//! A build runs once per invocation: the entry point is generated (or taken
//! from the source tree in origin mode), link flags are composed, and the
//! toolchain compiles the result. The lifecycle controller runs all of this
//! as a background task and owns cleanup of the generated files.
//!
//! # Submodules
//!
//! - [`pipeline`] - the sequential build stages
//! - [`lifecycle`] - signal race, cancellation and cleanup
//! - [`state`] - state shared between the two

pub mod lifecycle;
pub mod pipeline;
pub mod state;

pub use lifecycle::{BuildOutcome, LifecycleController, ShutdownSignals, cleanup};
pub use pipeline::{BuildError, Pipeline};
pub use state::{Artifact, ArtifactAlreadySet, BuildRunState};
