//! The incremental probe-rewiring build.
//!
//! A build starts from one of two cached checkpoints: the user's design
//! without a debug core, or the instrumented design produced by an earlier
//! run. [`resolve`] picks the latest one that is still valid for the
//! requested parameters, and [`run_build`] drives the remaining stages:
//! instrumentation through the external [`Toolchain`], probe rewiring, one
//! global routing pass, and finalization.

#![warn(missing_docs)]

pub mod codes;
pub mod error;
pub mod layout;
pub mod metadata;
pub mod pipeline;
pub mod resolver;
pub mod toolchain;

pub use error::{BuildError, ToolchainError};
pub use layout::{ArtifactLayout, ArtifactState};
pub use metadata::{read_metadata, write_metadata, BuildMetadata, METADATA_FILE_NAME};
pub use pipeline::{run_build, BuildOptions, BuildReport};
pub use resolver::{check_capacity, reconcile, resolve, BuildParams, ParamOverrides, ResumePoint};
pub use toolchain::{CommandToolchain, FinalizeRequest, InstrumentRequest, Toolchain};
