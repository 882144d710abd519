//! Contracts for the CMS collaborators this crate reads from.
//!
//! The CMS owns members, crew pages, and roles; this crate only consumes
//! them. Entities expose their extra fields through a [`PropertyBag`] of
//! named values (the CMS stores arbitrary named properties rather than
//! typed columns) with a fixed set of recognized names in [`props`].
//!
//! All directory reads are treated as eventually-stale snapshots: a crew
//! renamed or deleted in the CMS after a job referenced it is expected and
//! handled with display fallbacks, never as an error.

use std::collections::HashMap;

use chrono::NaiveDate;
use futures_util::future::BoxFuture;
use tracing::warn;
use uuid::Uuid;

/// Recognized property names on CMS entities.
pub mod props {
    /// Member given name.
    pub const FIRST_NAME: &str = "firstName";
    /// Member family name.
    pub const LAST_NAME: &str = "lastName";
    /// Member phone number.
    pub const PHONE: &str = "phone";
    /// Member birthdate, formatted `YYYY-MM-DD`.
    pub const BIRTHDATE: &str = "birthdate";
    /// Crew page: comma-separated member references of the supervisors.
    pub const SUPERVISORS: &str = "supervisors";
    /// Crew page: member reference of the schedule supervisor.
    pub const SCHEDULE_SUPERVISOR: &str = "scheduleSupervisor";
}

/// Named property values of a CMS entity.
#[derive(Debug, Clone, Default)]
pub struct PropertyBag {
    values: HashMap<String, String>,
}

impl PropertyBag {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a property value, replacing any previous one.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Text value of a property, if present.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Date value of a property, parsed from `YYYY-MM-DD`.
    ///
    /// An unparseable value is logged and treated as absent.
    pub fn date(&self, name: &str) -> Option<NaiveDate> {
        let raw = self.text(name)?;
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(error) => {
                warn!(property = name, value = raw, %error, "Skipping unparseable date property");
                None
            }
        }
    }
}

impl<S: Into<String>, V: Into<String>> FromIterator<(S, V)> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}

/// A member as seen through the CMS member store.
#[derive(Debug, Clone)]
pub struct Member {
    /// CMS member id.
    pub id: i64,
    /// CMS member key.
    pub key: Uuid,
    /// Login / contact email.
    pub email: String,
    /// The CMS's own display name for the entity, if it has one.
    pub name: Option<String>,
    /// Named properties (see [`props`]).
    pub properties: PropertyBag,
}

/// A crew page as seen through the CMS content store.
#[derive(Debug, Clone)]
pub struct CrewContent {
    /// CMS content id (primary join key used by job records).
    pub id: i64,
    /// CMS content key.
    pub key: Uuid,
    /// Display name of the crew page, if published.
    pub name: Option<String>,
    /// Named properties (see [`props`]).
    pub properties: PropertyBag,
}

/// Read access to the CMS member store.
pub trait MemberDirectory: Send + Sync {
    /// Look up a member by email.
    fn find_by_email(&self, email: &str) -> Option<Member>;

    /// Look up a member by CMS key.
    fn find_by_key(&self, key: Uuid) -> Option<Member>;

    /// Look up a member by CMS id.
    fn find_by_id(&self, id: i64) -> Option<Member>;

    /// Names of all role groups the member belongs to.
    fn roles_of(&self, member_id: i64) -> Vec<String>;

    /// Resolve a role group key to the group's name.
    fn group_name(&self, key: Uuid) -> Option<String>;
}

/// Read access to the CMS content store.
pub trait ContentDirectory: Send + Sync {
    /// All crew-type content entities.
    fn crews(&self) -> Vec<CrewContent>;

    /// Look up a content entity by id.
    fn find_by_id(&self, content_id: i64) -> Option<CrewContent>;

    /// Public URL of a content entity, if it is published.
    fn public_url(&self, content_id: i64) -> Option<String>;
}

/// Payload of the notification sent to an accepted applicant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptanceNotice {
    /// Recipient address (the applicant's snapshot email).
    pub to_email: String,
    /// Applicant display name as captured at submission.
    pub applicant_name: String,
    /// Title of the job the applicant was accepted for.
    pub job_title: String,
    /// Display name of the crew the job belongs to.
    pub crew_name: String,
    /// Ticket link stored on the application, empty when none was set.
    pub ticket_link: String,
}

/// Outbound notification sink.
pub trait Notifier: Send + Sync {
    /// Deliver an acceptance notice.
    ///
    /// Returns delivery success. Implementations must not panic or error
    /// out of this call; a failed delivery is reported as `false` and
    /// never affects the review that triggered it.
    fn send_acceptance_notice<'a>(&'a self, notice: &'a AcceptanceNotice) -> BoxFuture<'a, bool>;
}
