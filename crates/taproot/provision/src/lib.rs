//! Provisioning clients for taproot.
//!
//! One trait, [`Provisioner`], covers the engine lifecycle (init, plan,
//! apply, destroy, output). Two implementations back it: a local engine
//! subprocess and a remote workspace service. [`BackendStrategy`] picks
//! between them per stack, probing the declared workspace and falling
//! back to the local engine when it cannot be confirmed.
//!
//! Clients are cheap and single-phase. Callers resolve a fresh one from
//! the factory for every lifecycle phase rather than holding one across
//! phases.

#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod local;
pub mod remote;
pub mod select;

// Re-exports
pub use client::{
    normalize_outputs, ChunkSink, Provisioner, ProvisionerFactory, SimulatedProvisionerFactory,
};
pub use error::{ProvisionError, ProvisionResult};
pub use local::{LocalProvisioner, DEFAULT_ENGINE};
pub use remote::{RemoteProvisioner, PROBE_TIMEOUT, TOKEN_ENV};
pub use select::BackendStrategy;
