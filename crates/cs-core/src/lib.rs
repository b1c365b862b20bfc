//! Update machinery for `cs`.
//!
//! This crate holds the logic that talks to the outside world on behalf of the
//! `update` command and is independent of the terminal front-end:
//! - npm registry queries with timeout/retry policy.
//! - The package-manager seam used for install and verification.
//! - The install → verify → rollback state machine and its session object.

mod package;
mod registry;
mod update;
mod version;

/// Package-manager trait and the npm implementation.
pub use package::{NpmPackageManager, PACKAGE_NAME, PackageError, PackageManager};
/// npm registry client, document model and error type.
pub use registry::{PackageDocument, RegistryClient, RegistryError, VersionInfo};
/// Update session, progress events, outcomes and the orchestrator.
pub use update::{
    SessionHandle, UpdateOutcome, UpdateProgress, UpdateSession, UpdateState, Updater,
};
/// Semver helpers used to classify and compare versions.
pub use version::{UpdateDirection, is_stable, is_valid_version, update_direction};
