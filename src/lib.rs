#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod catalog;
/// Contracts for the CMS member/content stores and the notification sink.
pub mod directory;
mod errors;
mod permissions;
mod projection;
/// Database schema definitions.
pub mod schema;
mod storage;
/// Read models handed to the presentation layer.
pub mod views;
mod workflow;

/// Inputs to the job catalog.
pub use self::catalog::{JobUpdate, NewJob};
/// The CMS collaborator traits, re-exported for convenience.
pub use self::directory::{ContentDirectory, MemberDirectory, Notifier};
/// Error taxonomy of the catalog and workflow operations.
pub use self::errors::{Resource, WorkflowError};
/// Role configuration and resolved role flags.
pub use self::permissions::{RoleConfig, RoleSet, MEMBER_REF_PREFIX};
/// The main service coordinating store, permissions, and notifications.
pub use self::workflow::{JobBoard, ReviewOutcome, ReviewRequest};

use sqlx::SqlitePool;

/// Apply the bundled migrations, creating the `crew_jobs` and
/// `job_applications` tables and their indexes.
///
/// Safe to call on every startup; already-applied migrations are skipped.
pub async fn setup_database(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
