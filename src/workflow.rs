//! The application workflow: submission, withdrawal, and review.
//!
//! All capacity bookkeeping lives here. A position is claimed exactly once
//! per transition into `Accepted` and released exactly once per transition
//! out of it; re-saving `Accepted` is a counter no-op. The job counter and
//! the application status always commit in one transaction, so no reader
//! observes one without the other.

use std::sync::Arc;

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, instrument, warn};

use crate::directory::{AcceptanceNotice, ContentDirectory, MemberDirectory, Notifier};
use crate::errors::{is_unique_violation, Resource, WorkflowError};
use crate::permissions::{self, RoleConfig, RoleSet};
use crate::projection;
use crate::schema::{ApplicationStatus, MAX_ADMIN_NOTES_LEN, MAX_MESSAGE_LEN, MAX_TICKET_LINK_LEN};
use crate::storage;
use crate::views::{ApplicationDetail, ReviewQueue};

/// A review decision for one application.
#[derive(Debug, Clone)]
pub struct ReviewRequest {
    /// The application being decided.
    pub application_id: i64,
    /// The status to move it to.
    pub new_status: ApplicationStatus,
    /// Reviewer notes; replaces the stored notes.
    pub admin_notes: Option<String>,
    /// Ticket link for the applicant; empty or absent leaves the stored
    /// link untouched.
    pub ticket_link: Option<String>,
}

/// Result of a successful review.
#[derive(Debug, Clone, Copy)]
pub struct ReviewOutcome {
    /// Whether the acceptance notification was delivered. Always false
    /// for non-accepting decisions; an undelivered notification does not
    /// make the review itself fail.
    pub email_sent: bool,
}

/// The job catalog and application workflow service.
///
/// Owns the relational job/application store and consults the CMS member
/// and content directories for identity, permissions, and display data.
pub struct JobBoard {
    pool: SqlitePool,
    members: Arc<dyn MemberDirectory>,
    content: Arc<dyn ContentDirectory>,
    notifier: Arc<dyn Notifier>,
    roles: RoleConfig,
}

impl JobBoard {
    /// Create a board over the given store and CMS collaborators.
    pub fn new(
        pool: SqlitePool,
        members: Arc<dyn MemberDirectory>,
        content: Arc<dyn ContentDirectory>,
        notifier: Arc<dyn Notifier>,
        roles: RoleConfig,
    ) -> Self {
        Self {
            pool,
            members,
            content,
            notifier,
            roles,
        }
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn content(&self) -> &dyn ContentDirectory {
        self.content.as_ref()
    }

    /// Roles of an actor, failing closed for unknown emails.
    pub fn resolve_role(&self, actor_email: &str) -> RoleSet {
        permissions::resolve_role(self.members.as_ref(), &self.roles, actor_email)
    }

    /// Submit an application for a job on behalf of the given member.
    ///
    /// The job must be active and have an open position, and the member
    /// must not already have an application for it (withdrawn ones
    /// included). The member's email and display name are captured as a
    /// point-in-time snapshot. All checks and the insert run in one
    /// transaction.
    #[instrument(name = "crewboard.submit", skip(self, message), fields(job.id = job_id))]
    pub async fn submit_application(
        &self,
        actor_email: &str,
        job_id: i64,
        message: Option<&str>,
    ) -> Result<i64, WorkflowError> {
        let member = self
            .members
            .find_by_email(actor_email)
            .ok_or(WorkflowError::NotFound(Resource::Member))?;

        if let Some(message) = message {
            if message.len() > MAX_MESSAGE_LEN {
                return Err(WorkflowError::Validation(format!(
                    "Application message must be at most {MAX_MESSAGE_LEN} characters"
                )));
            }
        }

        let mut tx = self.pool.begin().await?;

        let job = storage::job_by_id_tx(&mut tx, job_id)
            .await?
            .ok_or(WorkflowError::NotFound(Resource::Job))?;

        if !job.is_active {
            return Err(WorkflowError::Closed);
        }
        if job.filled_positions >= job.total_positions {
            return Err(WorkflowError::NoCapacity);
        }
        if storage::application_exists(&mut tx, job_id, member.key).await? {
            return Err(WorkflowError::DuplicateApplication);
        }

        let member_name = projection::display_name(&member);
        let application_id = storage::insert_application(
            &mut tx,
            job_id,
            member.id,
            member.key,
            &member.email,
            &member_name,
            message,
            Utc::now(),
        )
        .await
        .map_err(|error| {
            // The unique index on (job, member key) backstops the
            // existence check under concurrent submissions.
            if is_unique_violation(&error) {
                WorkflowError::DuplicateApplication
            } else {
                error.into()
            }
        })?;

        tx.commit().await?;

        debug!(application.id = application_id, "Application submitted");
        Ok(application_id)
    }

    /// Withdraw the member's own pending application.
    ///
    /// Returns false when no application matches the id and email, or when
    /// it has already been decided. Withdrawal never touches the filled
    /// counter; a pending application holds no position.
    #[instrument(name = "crewboard.withdraw", skip(self), fields(application.id = application_id))]
    pub async fn withdraw_application(
        &self,
        application_id: i64,
        actor_email: &str,
    ) -> Result<bool, WorkflowError> {
        let withdrawn =
            storage::withdraw_application(&self.pool, application_id, actor_email).await?;
        if withdrawn {
            debug!("Application withdrawn");
        }
        Ok(withdrawn)
    }

    /// Decide an application as the given reviewer.
    ///
    /// Requires the admin or scheduler role; a scheduler without the admin
    /// role may only decide applications for crews they supervise.
    /// Accepting claims a position through a conditional update and fails
    /// with [`WorkflowError::NoCapacity`] when the job is already full;
    /// un-accepting releases the position. The status change and the
    /// counter commit together. An acceptance notification is dispatched
    /// after commit; its failure only shows up as `email_sent: false`.
    #[instrument(
        name = "crewboard.review",
        skip(self, request),
        fields(application.id = request.application_id, status = ?request.new_status)
    )]
    pub async fn review_application(
        &self,
        reviewer_email: &str,
        request: ReviewRequest,
    ) -> Result<ReviewOutcome, WorkflowError> {
        if let Some(notes) = request.admin_notes.as_deref() {
            if notes.len() > MAX_ADMIN_NOTES_LEN {
                return Err(WorkflowError::Validation(format!(
                    "Admin notes must be at most {MAX_ADMIN_NOTES_LEN} characters"
                )));
            }
        }
        if let Some(link) = request.ticket_link.as_deref() {
            if link.len() > MAX_TICKET_LINK_LEN {
                return Err(WorkflowError::Validation(format!(
                    "Ticket link must be at most {MAX_TICKET_LINK_LEN} characters"
                )));
            }
        }

        let row = storage::application_with_job(&self.pool, request.application_id)
            .await?
            .ok_or(WorkflowError::NotFound(Resource::Application))?;

        let reviewer = self
            .members
            .find_by_email(reviewer_email)
            .ok_or(WorkflowError::NotFound(Resource::Reviewer))?;

        let roles = permissions::member_roles(self.members.as_ref(), &self.roles, &reviewer);
        if !roles.can_review() {
            warn!(reviewer = reviewer_email, "Review attempt without permission");
            return Err(WorkflowError::Forbidden);
        }
        if roles.is_crew_scoped() {
            let managed = permissions::supervised_crew_ids(self.content.as_ref(), reviewer.key);
            if !managed.contains(&row.crew_content_id) {
                warn!(
                    reviewer = reviewer_email,
                    crew.id = row.crew_content_id,
                    "Review attempt outside supervised crews"
                );
                return Err(WorkflowError::Forbidden);
            }
        }

        let previous_status = row.application.status;
        let new_status = request.new_status;

        // Empty ticket links leave the stored one in place.
        let ticket_link = request
            .ticket_link
            .as_deref()
            .filter(|link| !link.is_empty());

        let mut tx = self.pool.begin().await?;

        storage::apply_review(
            &mut tx,
            request.application_id,
            new_status,
            reviewer.id,
            Utc::now(),
            request.admin_notes.as_deref(),
            ticket_link,
        )
        .await?;

        if new_status == ApplicationStatus::Accepted && previous_status != ApplicationStatus::Accepted
        {
            if !storage::try_fill_position(&mut tx, row.application.crew_job_id).await? {
                return Err(WorkflowError::NoCapacity);
            }
            debug!(job.id = row.application.crew_job_id, "Position filled");
        } else if previous_status == ApplicationStatus::Accepted
            && new_status != ApplicationStatus::Accepted
        {
            storage::release_position(&mut tx, row.application.crew_job_id).await?;
            debug!(job.id = row.application.crew_job_id, "Position released");
        }

        tx.commit().await?;

        let mut email_sent = false;
        if new_status == ApplicationStatus::Accepted {
            let notice = AcceptanceNotice {
                to_email: row.application.member_email.clone(),
                applicant_name: row.application.member_name.clone(),
                job_title: row.job_title.clone(),
                crew_name: projection::crew_name(self.content.as_ref(), row.crew_content_id),
                ticket_link: ticket_link
                    .map(str::to_owned)
                    .or(row.application.ticket_link.clone())
                    .unwrap_or_default(),
            };
            email_sent = self.notifier.send_acceptance_notice(&notice).await;
            if !email_sent {
                warn!(
                    application.id = request.application_id,
                    "Acceptance notification was not delivered"
                );
            }
        }

        Ok(ReviewOutcome { email_sent })
    }

    /// Applications grouped for the review screen of the given actor.
    ///
    /// Schedulers without the admin role only see applications for crews
    /// they supervise; an actor without either role (or an unknown email)
    /// gets empty buckets with both flags false rather than an error.
    pub async fn applications_for_review(
        &self,
        actor_email: &str,
    ) -> Result<ReviewQueue, WorkflowError> {
        let Some(actor) = self.members.find_by_email(actor_email) else {
            warn!(actor = actor_email, "Review listing for unknown member");
            return Ok(ReviewQueue::default());
        };

        let roles = permissions::member_roles(self.members.as_ref(), &self.roles, &actor);
        if !roles.can_review() {
            warn!(actor = actor_email, "Review listing without permission");
            return Ok(ReviewQueue::default());
        }

        let managed_crew_ids = if roles.is_crew_scoped() {
            permissions::supervised_crew_ids(self.content.as_ref(), actor.key)
        } else {
            Vec::new()
        };

        let mut queue = ReviewQueue {
            is_admin: roles.is_admin,
            is_scheduler: roles.is_scheduler,
            managed_crew_ids,
            ..ReviewQueue::default()
        };

        for row in storage::all_applications(&self.pool).await? {
            if roles.is_crew_scoped() && !queue.managed_crew_ids.contains(&row.crew_content_id) {
                continue;
            }

            let status = row.application.status;
            let detail =
                projection::application_detail(self.members.as_ref(), self.content.as_ref(), row);
            match status {
                ApplicationStatus::Pending => queue.pending.push(detail),
                ApplicationStatus::Accepted => queue.accepted.push(detail),
                ApplicationStatus::Rejected => queue.rejected.push(detail),
                ApplicationStatus::Withdrawn => {}
            }
        }

        Ok(queue)
    }

    /// Count of pending applications, crew-scoped the same way as
    /// [`Self::applications_for_review`] when an actor is given.
    pub async fn pending_application_count(
        &self,
        actor_email: Option<&str>,
    ) -> Result<i64, WorkflowError> {
        let crew_filter = actor_email
            .and_then(|email| self.members.find_by_email(email))
            .and_then(|actor| {
                let roles = permissions::member_roles(self.members.as_ref(), &self.roles, &actor);
                roles
                    .is_crew_scoped()
                    .then(|| permissions::supervised_crew_ids(self.content.as_ref(), actor.key))
            });

        let count =
            storage::pending_application_count(&self.pool, crew_filter.as_deref()).await?;
        Ok(count)
    }

    /// The member's own applications, newest first.
    pub async fn member_applications(
        &self,
        member_email: &str,
    ) -> Result<Vec<ApplicationDetail>, WorkflowError> {
        let rows = storage::applications_for_member(&self.pool, member_email).await?;
        Ok(self.project_applications(rows))
    }

    /// One application, enriched, if it exists.
    pub async fn application_detail(
        &self,
        application_id: i64,
    ) -> Result<Option<ApplicationDetail>, WorkflowError> {
        let row = storage::application_with_job(&self.pool, application_id).await?;
        Ok(row.map(|row| {
            projection::application_detail(self.members.as_ref(), self.content.as_ref(), row)
        }))
    }

    /// All applications for one job, newest first.
    pub async fn applications_for_job(
        &self,
        job_id: i64,
    ) -> Result<Vec<ApplicationDetail>, WorkflowError> {
        let rows = storage::applications_for_job(&self.pool, job_id).await?;
        Ok(self.project_applications(rows))
    }

    /// All applications across one crew's jobs, newest first.
    pub async fn applications_for_crew(
        &self,
        crew_content_id: i64,
    ) -> Result<Vec<ApplicationDetail>, WorkflowError> {
        let rows = storage::applications_for_crew(&self.pool, crew_content_id).await?;
        Ok(self.project_applications(rows))
    }

    fn project_applications(&self, rows: Vec<storage::ApplicationRow>) -> Vec<ApplicationDetail> {
        rows.into_iter()
            .map(|row| {
                projection::application_detail(self.members.as_ref(), self.content.as_ref(), row)
            })
            .collect()
    }
}
