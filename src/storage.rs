//! Queries against the job application store.
//!
//! Thin data-access layer over the two tables this crate owns. Capacity
//! mutations are single conditional statements with affected-row checks so
//! the filled-positions invariant holds without read-then-write races;
//! anything that must be observed atomically takes a [`Transaction`].

use chrono::{DateTime, Utc};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use uuid::Uuid;

use crate::schema::{ApplicationStatus, CrewJob, JobApplication};

/// A job row annotated with the requesting member's own application.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct JobRow {
    #[sqlx(flatten)]
    pub(crate) job: CrewJob,
    pub(crate) user_application_id: Option<i64>,
    pub(crate) user_application_status: Option<ApplicationStatus>,
}

/// An application row joined with the columns of its job that the
/// review/projection side needs.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct ApplicationRow {
    #[sqlx(flatten)]
    pub(crate) application: JobApplication,
    pub(crate) crew_content_id: i64,
    pub(crate) crew_key: Uuid,
    pub(crate) job_title: String,
}

const JOB_COLUMNS: &str = "j.id, j.crew_content_id, j.crew_key, j.title, j.description, \
     j.total_positions, j.filled_positions, j.is_active, j.created_date, j.updated_date";

const APPLICATION_COLUMNS: &str = "a.id, a.crew_job_id, a.member_id, a.member_key, \
     a.member_email, a.member_name, a.status, a.application_message, a.submitted_date, \
     a.reviewed_date, a.reviewed_by_member_id, a.ticket_link, a.admin_notes";

pub(crate) async fn insert_job(
    pool: &SqlitePool,
    crew_content_id: i64,
    crew_key: Uuid,
    title: &str,
    description: Option<&str>,
    total_positions: i64,
    created_date: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r"
        INSERT INTO crew_jobs
            (crew_content_id, crew_key, title, description, total_positions,
             filled_positions, is_active, created_date)
        VALUES (?, ?, ?, ?, ?, 0, 1, ?)
        RETURNING id
        ",
    )
    .bind(crew_content_id)
    .bind(crew_key)
    .bind(title)
    .bind(description)
    .bind(total_positions)
    .bind(created_date)
    .fetch_one(pool)
    .await
}

pub(crate) async fn job_by_id(pool: &SqlitePool, job_id: i64) -> Result<Option<CrewJob>, sqlx::Error> {
    sqlx::query_as::<_, CrewJob>("SELECT * FROM crew_jobs WHERE id = ?")
        .bind(job_id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn job_by_id_tx(
    tx: &mut Transaction<'_, Sqlite>,
    job_id: i64,
) -> Result<Option<CrewJob>, sqlx::Error> {
    sqlx::query_as::<_, CrewJob>("SELECT * FROM crew_jobs WHERE id = ?")
        .bind(job_id)
        .fetch_optional(&mut **tx)
        .await
}

pub(crate) async fn save_job(pool: &SqlitePool, job: &CrewJob) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        UPDATE crew_jobs
        SET title = ?, description = ?, total_positions = ?, is_active = ?, updated_date = ?
        WHERE id = ?
        ",
    )
    .bind(&job.title)
    .bind(job.description.as_deref())
    .bind(job.total_positions)
    .bind(job.is_active)
    .bind(job.updated_date)
    .bind(job.id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Hard-deletes a job; applications go with it via the cascade.
pub(crate) async fn delete_job(pool: &SqlitePool, job_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM crew_jobs WHERE id = ?")
        .bind(job_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Active jobs with open positions, oldest postings first, each annotated
/// with the given member's own application when an email is supplied.
pub(crate) async fn active_jobs(
    pool: &SqlitePool,
    actor_email: Option<&str>,
) -> Result<Vec<JobRow>, sqlx::Error> {
    let query = format!(
        r"
        SELECT {JOB_COLUMNS}, a.id AS user_application_id, a.status AS user_application_status
        FROM crew_jobs j
        LEFT JOIN job_applications a ON a.crew_job_id = j.id AND a.member_email = ?
        WHERE j.is_active = 1 AND j.filled_positions < j.total_positions
        ORDER BY j.created_date ASC, j.id ASC
        ",
    );
    sqlx::query_as::<_, JobRow>(&query)
        .bind(actor_email)
        .fetch_all(pool)
        .await
}

/// All jobs for one crew, active or not, newest first.
pub(crate) async fn jobs_for_crew(
    pool: &SqlitePool,
    crew_content_id: i64,
    actor_email: Option<&str>,
) -> Result<Vec<JobRow>, sqlx::Error> {
    let query = format!(
        r"
        SELECT {JOB_COLUMNS}, a.id AS user_application_id, a.status AS user_application_status
        FROM crew_jobs j
        LEFT JOIN job_applications a ON a.crew_job_id = j.id AND a.member_email = ?
        WHERE j.crew_content_id = ?
        ORDER BY j.created_date DESC, j.id DESC
        ",
    );
    sqlx::query_as::<_, JobRow>(&query)
        .bind(actor_email)
        .bind(crew_content_id)
        .fetch_all(pool)
        .await
}

pub(crate) async fn job_row_by_id(
    pool: &SqlitePool,
    job_id: i64,
    actor_email: Option<&str>,
) -> Result<Option<JobRow>, sqlx::Error> {
    let query = format!(
        r"
        SELECT {JOB_COLUMNS}, a.id AS user_application_id, a.status AS user_application_status
        FROM crew_jobs j
        LEFT JOIN job_applications a ON a.crew_job_id = j.id AND a.member_email = ?
        WHERE j.id = ?
        ",
    );
    sqlx::query_as::<_, JobRow>(&query)
        .bind(actor_email)
        .bind(job_id)
        .fetch_optional(pool)
        .await
}

/// Open positions summed over all active, unfilled jobs.
pub(crate) async fn total_available_positions(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r"
        SELECT COALESCE(SUM(total_positions - filled_positions), 0)
        FROM crew_jobs
        WHERE is_active = 1 AND filled_positions < total_positions
        ",
    )
    .fetch_one(pool)
    .await
}

/// Claims one open position on the job.
///
/// Returns whether a position was actually claimed; the `filled < total`
/// predicate makes over-subscription impossible under concurrent reviews.
pub(crate) async fn try_fill_position(
    tx: &mut Transaction<'_, Sqlite>,
    job_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r"
        UPDATE crew_jobs
        SET filled_positions = filled_positions + 1
        WHERE id = ? AND filled_positions < total_positions
        ",
    )
    .bind(job_id)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Releases one filled position on the job, floored at zero.
pub(crate) async fn release_position(
    tx: &mut Transaction<'_, Sqlite>,
    job_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE crew_jobs SET filled_positions = MAX(0, filled_positions - 1) WHERE id = ?",
    )
    .bind(job_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub(crate) async fn application_exists(
    tx: &mut Transaction<'_, Sqlite>,
    job_id: i64,
    member_key: Uuid,
) -> Result<bool, sqlx::Error> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM job_applications WHERE crew_job_id = ? AND member_key = ?",
    )
    .bind(job_id)
    .bind(member_key)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(id.is_some())
}

#[allow(clippy::too_many_arguments)]
pub(crate) async fn insert_application(
    tx: &mut Transaction<'_, Sqlite>,
    job_id: i64,
    member_id: i64,
    member_key: Uuid,
    member_email: &str,
    member_name: &str,
    message: Option<&str>,
    submitted_date: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r"
        INSERT INTO job_applications
            (crew_job_id, member_id, member_key, member_email, member_name,
             status, application_message, submitted_date)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        ",
    )
    .bind(job_id)
    .bind(member_id)
    .bind(member_key)
    .bind(member_email)
    .bind(member_name)
    .bind(ApplicationStatus::Pending)
    .bind(message)
    .bind(submitted_date)
    .fetch_one(&mut **tx)
    .await
}

/// Withdraws the member's own pending application.
///
/// Ownership is checked against the denormalized submission email, not the
/// live member record. Returns false when no row matches or the
/// application is no longer pending.
pub(crate) async fn withdraw_application(
    pool: &SqlitePool,
    application_id: i64,
    member_email: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE job_applications SET status = ? WHERE id = ? AND member_email = ? AND status = ?",
    )
    .bind(ApplicationStatus::Withdrawn)
    .bind(application_id)
    .bind(member_email)
    .bind(ApplicationStatus::Pending)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Applies a review decision to the application.
///
/// A `None` ticket link leaves the stored value untouched.
#[allow(clippy::too_many_arguments)]
pub(crate) async fn apply_review(
    tx: &mut Transaction<'_, Sqlite>,
    application_id: i64,
    status: ApplicationStatus,
    reviewed_by_member_id: i64,
    reviewed_date: DateTime<Utc>,
    admin_notes: Option<&str>,
    ticket_link: Option<&str>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        UPDATE job_applications
        SET status = ?, reviewed_date = ?, reviewed_by_member_id = ?, admin_notes = ?,
            ticket_link = COALESCE(?, ticket_link)
        WHERE id = ?
        ",
    )
    .bind(status)
    .bind(reviewed_date)
    .bind(reviewed_by_member_id)
    .bind(admin_notes)
    .bind(ticket_link)
    .bind(application_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub(crate) async fn application_with_job(
    pool: &SqlitePool,
    application_id: i64,
) -> Result<Option<ApplicationRow>, sqlx::Error> {
    let query = format!(
        r"
        SELECT {APPLICATION_COLUMNS}, j.crew_content_id, j.crew_key, j.title AS job_title
        FROM job_applications a
        JOIN crew_jobs j ON j.id = a.crew_job_id
        WHERE a.id = ?
        ",
    );
    sqlx::query_as::<_, ApplicationRow>(&query)
        .bind(application_id)
        .fetch_optional(pool)
        .await
}

/// All applications with their jobs, newest submissions first.
pub(crate) async fn all_applications(pool: &SqlitePool) -> Result<Vec<ApplicationRow>, sqlx::Error> {
    let query = format!(
        r"
        SELECT {APPLICATION_COLUMNS}, j.crew_content_id, j.crew_key, j.title AS job_title
        FROM job_applications a
        JOIN crew_jobs j ON j.id = a.crew_job_id
        ORDER BY a.submitted_date DESC, a.id DESC
        ",
    );
    sqlx::query_as::<_, ApplicationRow>(&query).fetch_all(pool).await
}

/// The member's own applications, newest submissions first.
pub(crate) async fn applications_for_member(
    pool: &SqlitePool,
    member_email: &str,
) -> Result<Vec<ApplicationRow>, sqlx::Error> {
    let query = format!(
        r"
        SELECT {APPLICATION_COLUMNS}, j.crew_content_id, j.crew_key, j.title AS job_title
        FROM job_applications a
        JOIN crew_jobs j ON j.id = a.crew_job_id
        WHERE a.member_email = ?
        ORDER BY a.submitted_date DESC, a.id DESC
        ",
    );
    sqlx::query_as::<_, ApplicationRow>(&query)
        .bind(member_email)
        .fetch_all(pool)
        .await
}

pub(crate) async fn applications_for_job(
    pool: &SqlitePool,
    job_id: i64,
) -> Result<Vec<ApplicationRow>, sqlx::Error> {
    let query = format!(
        r"
        SELECT {APPLICATION_COLUMNS}, j.crew_content_id, j.crew_key, j.title AS job_title
        FROM job_applications a
        JOIN crew_jobs j ON j.id = a.crew_job_id
        WHERE a.crew_job_id = ?
        ORDER BY a.submitted_date DESC, a.id DESC
        ",
    );
    sqlx::query_as::<_, ApplicationRow>(&query)
        .bind(job_id)
        .fetch_all(pool)
        .await
}

pub(crate) async fn applications_for_crew(
    pool: &SqlitePool,
    crew_content_id: i64,
) -> Result<Vec<ApplicationRow>, sqlx::Error> {
    let query = format!(
        r"
        SELECT {APPLICATION_COLUMNS}, j.crew_content_id, j.crew_key, j.title AS job_title
        FROM job_applications a
        JOIN crew_jobs j ON j.id = a.crew_job_id
        WHERE j.crew_content_id = ?
        ORDER BY a.submitted_date DESC, a.id DESC
        ",
    );
    sqlx::query_as::<_, ApplicationRow>(&query)
        .bind(crew_content_id)
        .fetch_all(pool)
        .await
}

/// Count of pending applications, optionally narrowed to a set of crews.
///
/// An empty crew set counts nothing (a scheduler who supervises no crews
/// has nothing to review).
pub(crate) async fn pending_application_count(
    pool: &SqlitePool,
    crew_ids: Option<&[i64]>,
) -> Result<i64, sqlx::Error> {
    match crew_ids {
        None => {
            sqlx::query_scalar::<_, i64>(
                "SELECT COUNT(*) FROM job_applications WHERE status = ?",
            )
            .bind(ApplicationStatus::Pending)
            .fetch_one(pool)
            .await
        }
        Some([]) => Ok(0),
        Some(ids) => {
            let placeholders = vec!["?"; ids.len()].join(", ");
            let query = format!(
                r"
                SELECT COUNT(*)
                FROM job_applications a
                JOIN crew_jobs j ON j.id = a.crew_job_id
                WHERE a.status = ? AND j.crew_content_id IN ({placeholders})
                ",
            );

            let mut builder = sqlx::query_scalar::<_, i64>(&query).bind(ApplicationStatus::Pending);
            for id in ids {
                builder = builder.bind(*id);
            }
            builder.fetch_one(pool).await
        }
    }
}
