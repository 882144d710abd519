//! Read models handed to the presentation layer.
//!
//! These compose store rows with display data resolved from the CMS (crew
//! names/URLs, member contact details). They are produced by read paths
//! only and never written back.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::schema::ApplicationStatus;

/// One job posting, enriched for listing.
#[derive(Debug, Clone, Serialize)]
pub struct JobListItem {
    /// Job id.
    pub job_id: i64,
    /// Content id of the owning crew.
    pub crew_content_id: i64,
    /// Content key of the owning crew.
    pub crew_key: Uuid,
    /// Crew display name, `"Unknown Crew"` when the CMS no longer has it.
    pub crew_name: String,
    /// Crew page URL, `"#"` when unresolvable.
    pub crew_url: String,
    /// Job title.
    pub title: String,
    /// Job description.
    pub description: Option<String>,
    /// Total positions on the job.
    pub total_positions: i64,
    /// Positions already filled.
    pub filled_positions: i64,
    /// Open positions, never negative.
    pub available_positions: i64,
    /// Whether the job accepts applications.
    pub is_active: bool,
    /// Whether the requesting member has applied to this job.
    pub has_applied: bool,
    /// Id of the requesting member's application, if any.
    pub application_id: Option<i64>,
    /// Status of the requesting member's application, if any.
    pub application_status: Option<ApplicationStatus>,
}

/// The available-jobs page: active unfilled jobs plus totals.
#[derive(Debug, Clone, Serialize)]
pub struct AvailableJobs {
    /// Active jobs with open positions, oldest first.
    pub jobs: Vec<JobListItem>,
    /// Whether the request carried a member identity.
    pub is_authenticated: bool,
    /// Number of listed jobs.
    pub total_jobs: usize,
    /// Open positions summed over the listed jobs.
    pub total_available_positions: i64,
}

/// One application, enriched for review and applicant views.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetail {
    /// Application id.
    pub application_id: i64,
    /// Id of the job applied for.
    pub job_id: i64,
    /// Title of the job applied for.
    pub job_title: String,
    /// Content id of the job's crew.
    pub crew_content_id: i64,
    /// Content key of the job's crew.
    pub crew_key: Uuid,
    /// Crew display name, `"Unknown Crew"` when the CMS no longer has it.
    pub crew_name: String,
    /// Crew page URL, `"#"` when unresolvable.
    pub crew_url: String,
    /// CMS member id of the applicant.
    pub member_id: i64,
    /// CMS member key of the applicant.
    pub member_key: Uuid,
    /// Applicant email as captured at submission.
    pub member_email: String,
    /// Applicant name as captured at submission.
    pub member_name: String,
    /// Applicant phone from the live member record, if available.
    pub member_phone: Option<String>,
    /// Applicant birthdate from the live member record, if available.
    pub member_birthdate: Option<NaiveDate>,
    /// Whole years from birthdate to today.
    pub member_age: Option<i32>,
    /// Current workflow status.
    pub status: ApplicationStatus,
    /// Applicant's message.
    pub application_message: Option<String>,
    /// Submission timestamp.
    pub submitted_date: DateTime<Utc>,
    /// Review timestamp, if reviewed.
    pub reviewed_date: Option<DateTime<Utc>>,
    /// CMS member id of the reviewer, if reviewed.
    pub reviewed_by_member_id: Option<i64>,
    /// Display name of the reviewer, when still resolvable.
    pub reviewed_by_name: Option<String>,
    /// Ticket link set on acceptance.
    pub ticket_link: Option<String>,
    /// Reviewer notes.
    pub admin_notes: Option<String>,
}

/// Applications grouped for the review screen.
///
/// For a scheduler without the admin role the buckets only contain
/// applications for crews in `managed_crew_ids`; for an admin they contain
/// everything. An actor with neither role gets empty buckets and both
/// flags false.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReviewQueue {
    /// Applications awaiting a decision, newest first.
    pub pending: Vec<ApplicationDetail>,
    /// Accepted applications, newest first.
    pub accepted: Vec<ApplicationDetail>,
    /// Rejected applications, newest first.
    pub rejected: Vec<ApplicationDetail>,
    /// Whether the actor holds the admin role.
    pub is_admin: bool,
    /// Whether the actor holds the scheduler role.
    pub is_scheduler: bool,
    /// Crews the actor supervises; empty for admins (no scoping applies).
    pub managed_crew_ids: Vec<i64>,
}
