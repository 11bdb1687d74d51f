//! Shared fixtures for service tests
//!
//! Everything runs against [`InMemoryStore`] with a hand-driven clock and a
//! scripted extractor, so no database or network is needed.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, Offset, TimeZone, Utc};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use teamtask_shared::ai::{ExtractorError, GeneratedTask, TaskExtractor};
use teamtask_shared::clock::Clock;
use teamtask_shared::invite::{InviteCodeError, InviteCodeGenerator, RandomInviteCodeGenerator};
use teamtask_shared::models::{Organization, User};
use teamtask_shared::services::{AuthService, MembershipResolver, OrganizationService, TaskService};
use teamtask_shared::store::InMemoryStore;
use uuid::Uuid;

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    offset: FixedOffset,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_offset(now, Utc.fix())
    }

    pub fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now: Mutex::new(now),
            offset,
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }

    fn local_now(&self) -> DateTime<FixedOffset> {
        self.now().with_timezone(&self.offset)
    }
}

/// One scripted extractor reply
pub enum Reply {
    Tasks(Vec<GeneratedTask>),
    Fail(String),
    /// Never answers; exercises the service timeout
    Hang,
}

/// Extractor that replays queued replies and records its inputs
#[derive(Default)]
pub struct ScriptedExtractor {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<(String, DateTime<Utc>)>>,
}

impl ScriptedExtractor {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, DateTime<Utc>)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TaskExtractor for ScriptedExtractor {
    async fn extract(&self, text: &str, reference_time: DateTime<Utc>) -> Result<Vec<GeneratedTask>, ExtractorError> {
        self.calls.lock().unwrap().push((text.to_string(), reference_time));
        let reply = self.replies.lock().unwrap().pop_front();

        match reply {
            Some(Reply::Tasks(tasks)) => Ok(tasks),
            Some(Reply::Fail(message)) => Err(ExtractorError::Api { status: 500, message }),
            Some(Reply::Hang) => {
                std::future::pending::<()>().await;
                Err(ExtractorError::EmptyResponse)
            }
            None => Err(ExtractorError::EmptyResponse),
        }
    }
}

/// Hands out the same invite code every time
pub struct FixedCodeGenerator(pub String);

impl InviteCodeGenerator for FixedCodeGenerator {
    fn generate(&self) -> Result<String, InviteCodeError> {
        Ok(self.0.clone())
    }
}

pub fn candidate(title: &str, description: &str, due_date: Option<DateTime<Utc>>) -> GeneratedTask {
    GeneratedTask {
        title: title.to_string(),
        description: description.to_string(),
        due_date,
    }
}

/// 2025-03-10 10:00 UTC
pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 0).unwrap()
}

/// Fully wired services over one in-memory store
pub struct TestContext {
    pub store: InMemoryStore,
    pub clock: Arc<ManualClock>,
    pub tasks: TaskService,
    pub organizations: OrganizationService,
    pub auth: AuthService,
    pub membership: MembershipResolver,
}

impl TestContext {
    pub fn new() -> Self {
        Self::build(Arc::new(ManualClock::new(base_time())), None)
    }

    pub fn with_clock(clock: ManualClock) -> Self {
        Self::build(Arc::new(clock), None)
    }

    pub fn with_extractor(extractor: Arc<ScriptedExtractor>) -> Self {
        Self::build(Arc::new(ManualClock::new(base_time())), Some(extractor))
    }

    fn build(clock: Arc<ManualClock>, extractor: Option<Arc<ScriptedExtractor>>) -> Self {
        let store = InMemoryStore::new();
        let shared = Arc::new(store.clone());
        let invite_codes = Arc::new(RandomInviteCodeGenerator);

        let membership = MembershipResolver::new(shared.clone());
        let mut tasks = TaskService::new(shared.clone(), membership.clone(), clock.clone());
        if let Some(extractor) = extractor {
            tasks = tasks.with_extractor(extractor);
        }
        let organizations = OrganizationService::new(shared.clone(), invite_codes.clone(), clock.clone());
        let auth = AuthService::new(shared, invite_codes, clock.clone());

        Self {
            store,
            clock,
            tasks,
            organizations,
            auth,
            membership,
        }
    }

    /// Inserts a user directly, skipping password hashing
    pub fn user(&self, username: &str) -> Uuid {
        let user = User::new(username, "not-a-real-hash", self.clock.now());
        let id = user.id;
        self.store.insert_user(user).unwrap();
        id
    }

    pub async fn organization(&self, name: &str, owner_id: Uuid) -> Organization {
        self.organizations.create_organization(name, owner_id).await.unwrap()
    }

    /// Joins `user_id` through the organization's current invite code
    pub async fn join(&self, organization: &Organization, user_id: Uuid) {
        let current = self
            .organizations
            .get_organization_with_members(organization.id)
            .await
            .unwrap()
            .organization;
        self.organizations
            .join_by_invite_code(user_id, &current.invite_code)
            .await
            .unwrap();
    }
}
