//! Role resolution and scheduler crew scoping.
//!
//! Roles come from the CMS: a member is an admin or scheduler when it
//! belongs to one of two well-known role groups, supplied as configuration
//! rather than hardcoded keys. Schedulers are further scoped to the crews
//! that name them as supervisor, discovered by scanning the crew pages'
//! supervisor reference lists.

use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::directory::{props, ContentDirectory, Member, MemberDirectory};

/// Scheme prefix of a typed member reference inside a crew page's
/// supervisor list, e.g. `member://3f41…`.
pub const MEMBER_REF_PREFIX: &str = "member://";

/// Keys of the two role groups the workflow recognizes.
///
/// Resolved once at startup by the embedding application (they are fixed
/// per CMS installation) and passed to [`crate::JobBoard::new`].
#[derive(Debug, Clone, Deserialize)]
pub struct RoleConfig {
    /// Key of the admin role group.
    pub admin_group_key: Uuid,
    /// Key of the scheduler role group.
    pub scheduler_group_key: Uuid,
}

/// Resolved roles of an actor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleSet {
    /// Member of the admin role group.
    pub is_admin: bool,
    /// Member of the scheduler role group.
    pub is_scheduler: bool,
}

impl RoleSet {
    /// Whether the actor may review applications at all.
    pub fn can_review(&self) -> bool {
        self.is_admin || self.is_scheduler
    }

    /// Whether listings must be narrowed to the actor's supervised crews.
    pub(crate) fn is_crew_scoped(&self) -> bool {
        self.is_scheduler && !self.is_admin
    }
}

/// Roles of a member already resolved from the directory.
///
/// A role group key that no longer resolves to a group grants nothing.
pub(crate) fn member_roles(
    members: &dyn MemberDirectory,
    config: &RoleConfig,
    member: &Member,
) -> RoleSet {
    let roles = members.roles_of(member.id);
    let in_group = |key: Uuid| {
        members
            .group_name(key)
            .is_some_and(|name| roles.iter().any(|role| role == &name))
    };

    RoleSet {
        is_admin: in_group(config.admin_group_key),
        is_scheduler: in_group(config.scheduler_group_key),
    }
}

/// Roles of an actor identified by email. Fails closed: an unknown email
/// resolves to no roles.
pub(crate) fn resolve_role(
    members: &dyn MemberDirectory,
    config: &RoleConfig,
    actor_email: &str,
) -> RoleSet {
    match members.find_by_email(actor_email) {
        Some(member) => member_roles(members, config, &member),
        None => RoleSet::default(),
    }
}

/// Content ids of every crew that names the member as supervisor or
/// schedule supervisor.
///
/// Linear scan over all crew pages, O(crews) per call; the crew catalog is
/// expected to stay in the tens to low hundreds.
pub(crate) fn supervised_crew_ids(content: &dyn ContentDirectory, member_key: Uuid) -> Vec<i64> {
    let mut crew_ids = Vec::new();

    for crew in content.crews() {
        let supervisors = crew.properties.text(props::SUPERVISORS);
        let schedule_supervisor = crew.properties.text(props::SCHEDULE_SUPERVISOR);

        if reference_list_contains(supervisors, member_key)
            || reference_list_contains(schedule_supervisor, member_key)
        {
            crew_ids.push(crew.id);
        }
    }

    crew_ids
}

/// Whether a comma-separated member reference list contains the given key.
///
/// Tokens with a malformed key are logged and skipped; tokens of other
/// reference types are ignored.
fn reference_list_contains(list: Option<&str>, member_key: Uuid) -> bool {
    let Some(list) = list else {
        return false;
    };

    list.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .any(|token| match parse_member_reference(token) {
            Some(key) => key == member_key,
            None => false,
        })
}

/// Parse a `member://<uuid>` token, tolerating prefix case differences.
fn parse_member_reference(token: &str) -> Option<Uuid> {
    let prefix = token.get(..MEMBER_REF_PREFIX.len())?;
    if !prefix.eq_ignore_ascii_case(MEMBER_REF_PREFIX) {
        return None;
    }

    let raw = &token[MEMBER_REF_PREFIX.len()..];
    match Uuid::parse_str(raw) {
        Ok(key) => Some(key),
        Err(error) => {
            warn!(token, %error, "Skipping malformed member reference");
            None
        }
    }
}
