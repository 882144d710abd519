use std::fmt;

/// The resource a [`WorkflowError::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// The acting member was not found in the member directory.
    Member,
    /// The reviewing member was not found in the member directory.
    Reviewer,
    /// The job posting does not exist.
    Job,
    /// The application does not exist.
    Application,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Member => "member",
            Resource::Reviewer => "reviewer",
            Resource::Job => "job",
            Resource::Application => "application",
        };
        f.write_str(name)
    }
}

/// Failures of the job catalog and application workflow.
///
/// Every variant except [`WorkflowError::Database`] is an expected business
/// outcome returned as a value to the surface layer, which translates it
/// into an HTTP status. Store connectivity failures propagate through the
/// `Database` variant.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// A referenced member, job, or application does not exist.
    #[error("{0} not found")]
    NotFound(Resource),

    /// The actor lacks the admin or scheduler role required here.
    #[error("permission denied")]
    Forbidden,

    /// The job is inactive and no longer accepts applications.
    #[error("job is not accepting applications")]
    Closed,

    /// Every position on the job is already filled.
    #[error("job has no available positions")]
    NoCapacity,

    /// The member has already applied for this job.
    #[error("member has already applied for this job")]
    DuplicateApplication,

    /// Malformed input, e.g. a missing title or an over-long message.
    #[error("{0}")]
    Validation(String),

    /// The relational store failed.
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl WorkflowError {
    /// Short human-readable reason suitable for direct display.
    ///
    /// Permission failures map to a generic message that does not leak
    /// which resource existed.
    pub fn user_message(&self) -> String {
        match self {
            WorkflowError::NotFound(Resource::Member) => "Member not found".into(),
            WorkflowError::NotFound(Resource::Reviewer) => "Reviewer not found".into(),
            WorkflowError::NotFound(Resource::Job) => "Job not found".into(),
            WorkflowError::NotFound(Resource::Application) => "Application not found".into(),
            WorkflowError::Forbidden => {
                "You do not have permission to perform this action".into()
            }
            WorkflowError::Closed => "This job is no longer accepting applications".into(),
            WorkflowError::NoCapacity => "This job has no available positions".into(),
            WorkflowError::DuplicateApplication => {
                "You have already applied for this job".into()
            }
            WorkflowError::Validation(reason) => reason.clone(),
            WorkflowError::Database(_) => "Something went wrong, please try again".into(),
        }
    }
}

/// Whether a store error is the unique-index violation on
/// `(crew_job_id, member_key)`.
pub(crate) fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}
