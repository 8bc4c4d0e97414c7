//! # taproot-project
//!
//! The programmatic surface of taproot. Construct a [`Project`] with a
//! synth command and an app directory, then drive it:
//!
//! ```no_run
//! use taproot_project::{Project, ProjectOptions};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let project = Project::new(
//!     ProjectOptions::new("npx app synth", "./infra")
//!         .auto_approve(true)
//!         .on_update(|update| println!("{}", update.kind())),
//! );
//! project.deploy("web").await?;
//! # Ok(())
//! # }
//! ```
//!
//! Each request runs the full lifecycle state machine underneath and
//! reports progress through the closed [`ProjectUpdate`] vocabulary.

#![deny(unsafe_code)]

pub mod error;
pub mod project;
pub mod status;
pub mod update;

// Re-exports
pub use error::{ProjectResult, RunError};
pub use project::{Project, ProjectOptions, UpdateCallback};
pub use status::Status;
pub use update::ProjectUpdate;
