//! Read-only enrichment of store rows with CMS display data.
//!
//! Everything here degrades instead of failing: a crew page or member that
//! the CMS no longer has yields display fallbacks, never an error. The
//! live member record is consulted only for contact/demographic extras;
//! name and email on an application stay the submission-time snapshots.

use chrono::{Datelike, NaiveDate, Utc};

use crate::directory::{props, ContentDirectory, Member, MemberDirectory};
use crate::storage::{ApplicationRow, JobRow};
use crate::views::{ApplicationDetail, JobListItem};

/// Display fallback for a crew the CMS no longer resolves.
const UNKNOWN_CREW: &str = "Unknown Crew";
/// URL fallback for an unresolvable crew page.
const UNKNOWN_URL: &str = "#";

pub(crate) fn crew_name(content: &dyn ContentDirectory, crew_content_id: i64) -> String {
    content
        .find_by_id(crew_content_id)
        .and_then(|crew| crew.name)
        .unwrap_or_else(|| UNKNOWN_CREW.to_owned())
}

pub(crate) fn crew_url(content: &dyn ContentDirectory, crew_content_id: i64) -> String {
    content
        .public_url(crew_content_id)
        .unwrap_or_else(|| UNKNOWN_URL.to_owned())
}

/// Display name of a member: first and last name, trimmed, falling back to
/// the entity's own name and finally its email.
pub(crate) fn display_name(member: &Member) -> String {
    let first = member.properties.text(props::FIRST_NAME).unwrap_or("");
    let last = member.properties.text(props::LAST_NAME).unwrap_or("");
    let full = format!("{first} {last}").trim().to_owned();

    if !full.is_empty() {
        return full;
    }
    match &member.name {
        Some(name) if !name.trim().is_empty() => name.clone(),
        _ => member.email.clone(),
    }
}

/// Whole years from `birthdate` to `today`, decrementing when the
/// birthday has not yet occurred this year.
pub(crate) fn age_on(birthdate: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birthdate.year();
    if (today.month(), today.day()) < (birthdate.month(), birthdate.day()) {
        age -= 1;
    }
    age
}

pub(crate) fn job_list_item(content: &dyn ContentDirectory, row: JobRow) -> JobListItem {
    let JobRow {
        job,
        user_application_id,
        user_application_status,
    } = row;

    JobListItem {
        job_id: job.id,
        crew_content_id: job.crew_content_id,
        crew_key: job.crew_key,
        crew_name: crew_name(content, job.crew_content_id),
        crew_url: crew_url(content, job.crew_content_id),
        available_positions: job.available_positions(),
        title: job.title,
        description: job.description,
        total_positions: job.total_positions,
        filled_positions: job.filled_positions,
        is_active: job.is_active,
        has_applied: user_application_id.is_some(),
        application_id: user_application_id,
        application_status: user_application_status,
    }
}

pub(crate) fn application_detail(
    members: &dyn MemberDirectory,
    content: &dyn ContentDirectory,
    row: ApplicationRow,
) -> ApplicationDetail {
    let ApplicationRow {
        application,
        crew_content_id,
        crew_key,
        job_title,
    } = row;

    let reviewed_by_name = application
        .reviewed_by_member_id
        .and_then(|id| members.find_by_id(id))
        .map(|reviewer| display_name(&reviewer));

    // Contact details come from the live member record; the snapshot on
    // the application is authoritative for name and email.
    let live_member = members.find_by_email(&application.member_email);
    let member_phone = live_member
        .as_ref()
        .and_then(|member| member.properties.text(props::PHONE))
        .map(str::to_owned);
    let member_birthdate = live_member
        .as_ref()
        .and_then(|member| member.properties.date(props::BIRTHDATE));
    let member_age =
        member_birthdate.map(|birthdate| age_on(birthdate, Utc::now().date_naive()));

    ApplicationDetail {
        application_id: application.id,
        job_id: application.crew_job_id,
        job_title,
        crew_content_id,
        crew_key,
        crew_name: crew_name(content, crew_content_id),
        crew_url: crew_url(content, crew_content_id),
        member_id: application.member_id,
        member_key: application.member_key,
        member_email: application.member_email,
        member_name: application.member_name,
        member_phone,
        member_birthdate,
        member_age,
        status: application.status,
        application_message: application.application_message,
        submitted_date: application.submitted_date,
        reviewed_date: application.reviewed_date,
        reviewed_by_member_id: application.reviewed_by_member_id,
        reviewed_by_name,
        ticket_link: application.ticket_link,
        admin_notes: application.admin_notes,
    }
}
