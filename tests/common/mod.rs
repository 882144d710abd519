#![allow(dead_code)]

//! Shared fixtures: an in-memory store plus fake CMS directories.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crewboard::directory::{
    props, AcceptanceNotice, ContentDirectory, CrewContent, Member, MemberDirectory, Notifier,
    PropertyBag,
};
use crewboard::{JobBoard, NewJob, RoleConfig, MEMBER_REF_PREFIX};
use futures_util::future::BoxFuture;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use uuid::Uuid;

pub const ADMIN_GROUP: Uuid = Uuid::from_u128(0x99e1_edbb_8181_421d_a74b_e66a_2f1e_1148);
pub const SCHEDULER_GROUP: Uuid = Uuid::from_u128(0xe6ee_f645_b13b_4edb_880b_7b3c_df5b_6816);

/// Fake CMS member store.
#[derive(Default)]
pub struct FakeMembers {
    members: Mutex<Vec<Member>>,
    roles: Mutex<HashMap<i64, Vec<String>>>,
    groups: Mutex<HashMap<Uuid, String>>,
}

impl FakeMembers {
    pub fn add(&self, member: Member) {
        self.members.lock().unwrap().push(member);
    }

    pub fn define_group(&self, key: Uuid, name: &str) {
        self.groups.lock().unwrap().insert(key, name.to_owned());
    }

    pub fn assign_role(&self, member_id: i64, role: &str) {
        self.roles
            .lock()
            .unwrap()
            .entry(member_id)
            .or_default()
            .push(role.to_owned());
    }

    /// Overwrite a property on the live member record, e.g. to simulate a
    /// profile change after an application was submitted.
    pub fn set_property(&self, email: &str, name: &str, value: &str) {
        let mut members = self.members.lock().unwrap();
        let member = members
            .iter_mut()
            .find(|member| member.email == email)
            .expect("member should exist");
        member.properties.set(name, value);
    }
}

impl MemberDirectory for FakeMembers {
    fn find_by_email(&self, email: &str) -> Option<Member> {
        self.members
            .lock()
            .unwrap()
            .iter()
            .find(|member| member.email == email)
            .cloned()
    }

    fn find_by_key(&self, key: Uuid) -> Option<Member> {
        self.members
            .lock()
            .unwrap()
            .iter()
            .find(|member| member.key == key)
            .cloned()
    }

    fn find_by_id(&self, id: i64) -> Option<Member> {
        self.members
            .lock()
            .unwrap()
            .iter()
            .find(|member| member.id == id)
            .cloned()
    }

    fn roles_of(&self, member_id: i64) -> Vec<String> {
        self.roles
            .lock()
            .unwrap()
            .get(&member_id)
            .cloned()
            .unwrap_or_default()
    }

    fn group_name(&self, key: Uuid) -> Option<String> {
        self.groups.lock().unwrap().get(&key).cloned()
    }
}

/// Fake CMS content store.
#[derive(Default)]
pub struct FakeContent {
    crews: Mutex<Vec<CrewContent>>,
    urls: Mutex<HashMap<i64, String>>,
}

impl FakeContent {
    pub fn add_crew(&self, crew: CrewContent) {
        self.crews.lock().unwrap().push(crew);
    }

    pub fn set_url(&self, content_id: i64, url: &str) {
        self.urls.lock().unwrap().insert(content_id, url.to_owned());
    }
}

impl ContentDirectory for FakeContent {
    fn crews(&self) -> Vec<CrewContent> {
        self.crews.lock().unwrap().clone()
    }

    fn find_by_id(&self, content_id: i64) -> Option<CrewContent> {
        self.crews
            .lock()
            .unwrap()
            .iter()
            .find(|crew| crew.id == content_id)
            .cloned()
    }

    fn public_url(&self, content_id: i64) -> Option<String> {
        self.urls.lock().unwrap().get(&content_id).cloned()
    }
}

/// Records every notice; delivery outcome is switchable per test.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<AcceptanceNotice>>,
    fail_delivery: AtomicBool,
}

impl RecordingNotifier {
    pub fn fail_delivery(&self) {
        self.fail_delivery.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<AcceptanceNotice> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn send_acceptance_notice<'a>(&'a self, notice: &'a AcceptanceNotice) -> BoxFuture<'a, bool> {
        let delivered = !self.fail_delivery.load(Ordering::SeqCst);
        self.sent.lock().unwrap().push(notice.clone());
        Box::pin(async move { delivered })
    }
}

/// A board wired to in-memory fakes and an in-memory SQLite store.
pub struct TestApp {
    pub board: JobBoard,
    pub pool: SqlitePool,
    pub members: Arc<FakeMembers>,
    pub content: Arc<FakeContent>,
    pub notifier: Arc<RecordingNotifier>,
}

pub async fn test_app() -> anyhow::Result<TestApp> {
    // A single connection keeps every query on the same in-memory database
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    crewboard::setup_database(&pool).await?;

    let members = Arc::new(FakeMembers::default());
    members.define_group(ADMIN_GROUP, "Admins");
    members.define_group(SCHEDULER_GROUP, "Schedulers");

    let content = Arc::new(FakeContent::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let board = JobBoard::new(
        pool.clone(),
        members.clone(),
        content.clone(),
        notifier.clone(),
        RoleConfig {
            admin_group_key: ADMIN_GROUP,
            scheduler_group_key: SCHEDULER_GROUP,
        },
    );

    Ok(TestApp {
        board,
        pool,
        members,
        content,
        notifier,
    })
}

impl TestApp {
    /// Register a member with first/last name properties; the key is
    /// derived from the id so tests stay deterministic.
    pub fn add_member(&self, id: i64, email: &str, first: &str, last: &str) -> Member {
        let mut properties = PropertyBag::new();
        properties.set(props::FIRST_NAME, first);
        properties.set(props::LAST_NAME, last);

        let member = Member {
            id,
            key: Uuid::from_u128(id as u128),
            email: email.to_owned(),
            name: None,
            properties,
        };
        self.members.add(member.clone());
        member
    }

    pub fn make_admin(&self, member: &Member) {
        self.members.assign_role(member.id, "Admins");
    }

    pub fn make_scheduler(&self, member: &Member) {
        self.members.assign_role(member.id, "Schedulers");
    }

    /// Register a crew page naming the given members as supervisors.
    pub fn add_crew(&self, content_id: i64, name: &str, supervisor_keys: &[Uuid]) -> CrewContent {
        let mut properties = PropertyBag::new();
        if !supervisor_keys.is_empty() {
            let list = supervisor_keys
                .iter()
                .map(|key| format!("{MEMBER_REF_PREFIX}{key}"))
                .collect::<Vec<_>>()
                .join(", ");
            properties.set(props::SUPERVISORS, list);
        }

        let crew = CrewContent {
            id: content_id,
            key: Uuid::from_u128(content_id as u128),
            name: Some(name.to_owned()),
            properties,
        };
        self.content.add_crew(crew.clone());
        crew
    }

    /// Create an active job for a crew, returning its id.
    pub async fn create_job(
        &self,
        crew: &CrewContent,
        title: &str,
        total_positions: i64,
    ) -> anyhow::Result<i64> {
        let job_id = self
            .board
            .create_job(NewJob {
                crew_content_id: crew.id,
                crew_key: crew.key,
                title: title.to_owned(),
                description: None,
                total_positions,
            })
            .await?;
        Ok(job_id)
    }
}
