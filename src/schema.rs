//! Database row types for the job application store.
//!
//! This module contains the types backing the two tables this crate owns,
//! `crew_jobs` and `job_applications`. The crew and member identities they
//! carry reference entities in the CMS; those references are plain values
//! with no cross-store constraint behind them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Maximum length of a job title.
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum length of a job description.
pub const MAX_DESCRIPTION_LEN: usize = 2000;
/// Maximum length of an applicant's free-text message.
pub const MAX_MESSAGE_LEN: usize = 1000;
/// Maximum length of reviewer notes on an application.
pub const MAX_ADMIN_NOTES_LEN: usize = 1000;
/// Maximum length of the ticket link sent to accepted applicants.
pub const MAX_TICKET_LINK_LEN: usize = 500;

/// Status of a job application.
///
/// Pending applications may be withdrawn by the applicant or decided by a
/// reviewer. Accepted and Rejected may be re-reviewed in either direction;
/// Withdrawn is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[repr(i32)]
pub enum ApplicationStatus {
    /// Submitted, awaiting review.
    Pending = 0,
    /// Accepted by an admin or scheduler; holds a filled position.
    Accepted = 1,
    /// Rejected by an admin or scheduler.
    Rejected = 2,
    /// Withdrawn by the applicant while still pending.
    Withdrawn = 3,
}

/// Represents a job posting record in the database
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CrewJob {
    /// Unique identifier for the job
    pub id: i64,
    /// Content id of the crew page this job belongs to (primary join key)
    pub crew_content_id: i64,
    /// Content key of the crew page, carried for display and linking
    pub crew_key: Uuid,
    /// Job title / position name
    pub title: String,
    /// Detailed job description
    pub description: Option<String>,
    /// Total number of positions available for this job
    pub total_positions: i64,
    /// Number of positions already filled
    pub filled_positions: i64,
    /// Whether this job is currently accepting applications
    pub is_active: bool,
    /// Timestamp when the job was created
    pub created_date: DateTime<Utc>,
    /// Timestamp of the last update, if any
    pub updated_date: Option<DateTime<Utc>>,
}

impl CrewJob {
    /// Positions still open on this job, floored at zero.
    ///
    /// The floor keeps the value sane even if bookkeeping has raced and
    /// `filled_positions` exceeds `total_positions`.
    pub fn available_positions(&self) -> i64 {
        (self.total_positions - self.filled_positions).max(0)
    }
}

/// Represents one member's application for one job in the database
///
/// `member_email` and `member_name` are snapshots captured at submission
/// time; a later profile change in the CMS does not update them.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct JobApplication {
    /// Unique identifier for the application
    pub id: i64,
    /// The job this application was submitted against
    pub crew_job_id: i64,
    /// CMS member id of the applicant
    pub member_id: i64,
    /// CMS member key of the applicant
    pub member_key: Uuid,
    /// Applicant email at submission time
    pub member_email: String,
    /// Applicant display name at submission time
    pub member_name: String,
    /// Current workflow status
    pub status: ApplicationStatus,
    /// Optional message from the applicant
    pub application_message: Option<String>,
    /// Timestamp when the application was submitted
    pub submitted_date: DateTime<Utc>,
    /// Timestamp of the last review decision, if any
    pub reviewed_date: Option<DateTime<Utc>>,
    /// CMS member id of the reviewer, if reviewed
    pub reviewed_by_member_id: Option<i64>,
    /// Ticket link sent to the applicant on acceptance
    pub ticket_link: Option<String>,
    /// Reviewer notes about this application
    pub admin_notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(total: i64, filled: i64) -> CrewJob {
        CrewJob {
            id: 1,
            crew_content_id: 1000,
            crew_key: Uuid::nil(),
            title: "Bar crew".into(),
            description: None,
            total_positions: total,
            filled_positions: filled,
            is_active: true,
            created_date: Utc::now(),
            updated_date: None,
        }
    }

    #[test]
    fn available_positions_floors_at_zero() {
        assert_eq!(job(4, 1).available_positions(), 3);
        assert_eq!(job(4, 4).available_positions(), 0);
        // filled > total can only come from a bookkeeping race, but must
        // still never be reported negative
        assert_eq!(job(4, 7).available_positions(), 0);
    }
}
