//! # taproot-types
//!
//! Shared data model for the taproot orchestration core:
//!
//! - [`Stack`] - one synthesized configuration document plus its
//!   working directory, with typed access to the sections taproot
//!   interprets (backend declaration, output declarations)
//! - [`PlanArtifact`] - the reviewed change set that gates every
//!   mutation, local plan file or remote run handle
//! - [`OutputMap`] - collected outputs, plus construct re-keying
//! - [`resolve_stack`] - the stack resolver every request goes through
//! - [`ErrorKind`] - the usage / internal / external-tool taxonomy the
//!   whole workspace classifies failures with

#![deny(unsafe_code)]

pub mod error;
pub mod output;
pub mod plan;
pub mod resolve;
pub mod stack;

// Re-exports
pub use error::{ErrorKind, StackError, StackResult};
pub use output::{outputs_by_construct_id, OutputDeclaration, OutputMap};
pub use plan::{LifecycleAction, PlanArtifact};
pub use resolve::resolve_stack;
pub use stack::{BackendBlock, RemoteBackend, Stack, StackDocument};
