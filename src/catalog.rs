//! The job catalog: CRUD and listings over job postings.
//!
//! Pure data access plus input validation; authorization happens at the
//! surface that calls this, not here.

use chrono::Utc;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::errors::{Resource, WorkflowError};
use crate::projection;
use crate::schema::{MAX_DESCRIPTION_LEN, MAX_TITLE_LEN};
use crate::storage;
use crate::views::{AvailableJobs, JobListItem};
use crate::workflow::JobBoard;

/// A new job posting.
#[derive(Debug, Clone)]
pub struct NewJob {
    /// Content id of the crew the job belongs to.
    pub crew_content_id: i64,
    /// Content key of that crew.
    pub crew_key: Uuid,
    /// Job title.
    pub title: String,
    /// Job description.
    pub description: Option<String>,
    /// Total number of positions.
    pub total_positions: i64,
}

/// A partial update to a job posting.
///
/// Only supplied fields are applied; `None` means "leave unchanged", so an
/// explicit `Some(false)` / `Some(0)` is distinguishable from "not
/// provided".
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New total position count.
    pub total_positions: Option<i64>,
    /// New active flag.
    pub is_active: Option<bool>,
}

fn validate_title(title: &str) -> Result<(), WorkflowError> {
    if title.trim().is_empty() {
        return Err(WorkflowError::Validation("Job title is required".into()));
    }
    if title.len() > MAX_TITLE_LEN {
        return Err(WorkflowError::Validation(format!(
            "Job title must be at most {MAX_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_description(description: Option<&str>) -> Result<(), WorkflowError> {
    if description.is_some_and(|text| text.len() > MAX_DESCRIPTION_LEN) {
        return Err(WorkflowError::Validation(format!(
            "Job description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_total_positions(total: i64) -> Result<(), WorkflowError> {
    if total < 0 {
        return Err(WorkflowError::Validation(
            "Total positions cannot be negative".into(),
        ));
    }
    Ok(())
}

impl JobBoard {
    /// Create a job posting; starts active with zero filled positions.
    #[instrument(name = "crewboard.create_job", skip(self, job), fields(crew.id = job.crew_content_id))]
    pub async fn create_job(&self, job: NewJob) -> Result<i64, WorkflowError> {
        validate_title(&job.title)?;
        validate_description(job.description.as_deref())?;
        validate_total_positions(job.total_positions)?;

        let job_id = storage::insert_job(
            self.pool(),
            job.crew_content_id,
            job.crew_key,
            &job.title,
            job.description.as_deref(),
            job.total_positions,
            Utc::now(),
        )
        .await?;

        debug!(job.id = job_id, "Job created");
        Ok(job_id)
    }

    /// Apply a partial update to a job posting and stamp its update time.
    #[instrument(name = "crewboard.update_job", skip(self, update))]
    pub async fn update_job(&self, job_id: i64, update: JobUpdate) -> Result<(), WorkflowError> {
        let mut job = storage::job_by_id(self.pool(), job_id)
            .await?
            .ok_or(WorkflowError::NotFound(Resource::Job))?;

        if let Some(title) = update.title {
            validate_title(&title)?;
            job.title = title;
        }
        if let Some(description) = update.description {
            validate_description(Some(&description))?;
            job.description = Some(description);
        }
        if let Some(total_positions) = update.total_positions {
            validate_total_positions(total_positions)?;
            job.total_positions = total_positions;
        }
        if let Some(is_active) = update.is_active {
            job.is_active = is_active;
        }
        job.updated_date = Some(Utc::now());

        storage::save_job(self.pool(), &job).await?;
        Ok(())
    }

    /// Delete a job posting; its applications cascade away with it.
    #[instrument(name = "crewboard.delete_job", skip(self))]
    pub async fn delete_job(&self, job_id: i64) -> Result<(), WorkflowError> {
        if !storage::delete_job(self.pool(), job_id).await? {
            return Err(WorkflowError::NotFound(Resource::Job));
        }
        debug!("Job deleted");
        Ok(())
    }

    /// One job, enriched, annotated with the actor's own application.
    pub async fn job_by_id(
        &self,
        job_id: i64,
        actor_email: Option<&str>,
    ) -> Result<Option<JobListItem>, WorkflowError> {
        let row = storage::job_row_by_id(self.pool(), job_id, actor_email).await?;
        Ok(row.map(|row| projection::job_list_item(self.content(), row)))
    }

    /// Active jobs with open positions, oldest postings first.
    pub async fn list_active_jobs(
        &self,
        actor_email: Option<&str>,
    ) -> Result<Vec<JobListItem>, WorkflowError> {
        let rows = storage::active_jobs(self.pool(), actor_email).await?;
        Ok(rows
            .into_iter()
            .map(|row| projection::job_list_item(self.content(), row))
            .collect())
    }

    /// All jobs for one crew, active or not, newest first.
    pub async fn jobs_for_crew(
        &self,
        crew_content_id: i64,
        actor_email: Option<&str>,
    ) -> Result<Vec<JobListItem>, WorkflowError> {
        let rows = storage::jobs_for_crew(self.pool(), crew_content_id, actor_email).await?;
        Ok(rows
            .into_iter()
            .map(|row| projection::job_list_item(self.content(), row))
            .collect())
    }

    /// The available-jobs page: active listing plus totals.
    pub async fn available_jobs(
        &self,
        actor_email: Option<&str>,
    ) -> Result<AvailableJobs, WorkflowError> {
        let jobs = self.list_active_jobs(actor_email).await?;
        Ok(AvailableJobs {
            is_authenticated: actor_email.is_some_and(|email| !email.is_empty()),
            total_jobs: jobs.len(),
            total_available_positions: jobs.iter().map(|job| job.available_positions).sum(),
            jobs,
        })
    }

    /// Open positions summed over all active, unfilled jobs.
    pub async fn total_available_positions(&self) -> Result<i64, WorkflowError> {
        let total = storage::total_available_positions(self.pool()).await?;
        Ok(total)
    }
}
