//! In-memory browser sessions: the signed-in account, its API token and the
//! page state that outlives a single request.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, RwLock},
    time::{Duration, Instant},
};

use dashmap::DashMap;
use quire_api_types::{Permission, Post, Role, StoredBlock, User};
use tracing::debug;
use uuid::Uuid;

use crate::{
    application::{repos::Credentials, resource::ResourceCollection},
    domain::{editor::PostEditor, session::SessionUser},
};

/// Open drafts kept per session; opening another evicts the oldest.
pub const MAX_DRAFTS_PER_SESSION: usize = 8;

/// Collections held per session, one per managed list.
#[derive(Default)]
pub struct SessionCollections {
    pub roles: Arc<ResourceCollection<Role>>,
    pub permissions: Arc<ResourceCollection<Permission>>,
    pub users: Arc<ResourceCollection<User>>,
    pub posts: Arc<ResourceCollection<Post>>,
}

/// One post being composed or edited.
#[derive(Debug, Clone, Default)]
pub struct PostDraft {
    /// `None` until the post exists upstream.
    pub post_id: Option<String>,
    pub title: String,
    pub title_error: Option<String>,
    pub editor: PostEditor,
    /// Content as last loaded from the API; drives orphan deletion on save.
    pub original: Vec<StoredBlock>,
    pub published: bool,
    pub saving: bool,
}

impl PostDraft {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct Session {
    id: String,
    user: RwLock<SessionUser>,
    credentials: Credentials,
    collections: SessionCollections,
    drafts: DashMap<String, PostDraft>,
    /// Draft keys, oldest first.
    draft_order: Mutex<VecDeque<String>>,
    last_seen: Mutex<Instant>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Session {
    fn new(user: SessionUser, credentials: Credentials) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            user: RwLock::new(user),
            credentials,
            collections: SessionCollections::default(),
            drafts: DashMap::new(),
            draft_order: Mutex::new(VecDeque::new()),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn user(&self) -> SessionUser {
        match self.user.read() {
            Ok(user) => user.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_user(&self, next: SessionUser) {
        match self.user.write() {
            Ok(mut user) => *user = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn collections(&self) -> &SessionCollections {
        &self.collections
    }

    /// Start a new draft and return its key.
    pub fn open_draft(&self, draft: PostDraft) -> String {
        let key = Uuid::new_v4().simple().to_string();
        self.drafts.insert(key.clone(), draft);
        let evicted = self.with_draft_order(|order| {
            order.push_back(key.clone());
            let excess = order.len().saturating_sub(MAX_DRAFTS_PER_SESSION);
            order.drain(..excess).collect::<Vec<_>>()
        });
        for stale in &evicted {
            self.drafts.remove(stale);
        }
        if !evicted.is_empty() {
            debug!(
                target = "quire::application::session",
                evicted = evicted.len(),
                "evicted oldest drafts"
            );
        }
        key
    }

    pub fn draft(&self, key: &str) -> Option<PostDraft> {
        self.drafts.get(key).map(|draft| draft.clone())
    }

    /// Mutate a draft in place; `None` when the key is unknown.
    pub fn update_draft<T>(&self, key: &str, f: impl FnOnce(&mut PostDraft) -> T) -> Option<T> {
        self.drafts.get_mut(key).map(|mut draft| f(&mut draft))
    }

    /// Drop a draft, releasing any pending image bytes it still holds.
    pub fn discard_draft(&self, key: &str) -> Option<PostDraft> {
        self.with_draft_order(|order| order.retain(|open| open != key));
        self.drafts.remove(key).map(|(_, draft)| draft)
    }

    pub fn draft_count(&self) -> usize {
        self.drafts.len()
    }

    fn with_draft_order<T>(&self, f: impl FnOnce(&mut VecDeque<String>) -> T) -> T {
        match self.draft_order.lock() {
            Ok(mut order) => f(&mut order),
            Err(poisoned) => f(&mut poisoned.into_inner()),
        }
    }

    fn touch(&self) {
        match self.last_seen.lock() {
            Ok(mut seen) => *seen = Instant::now(),
            Err(poisoned) => *poisoned.into_inner() = Instant::now(),
        }
    }

    fn idle_for(&self) -> Duration {
        let seen = match self.last_seen.lock() {
            Ok(seen) => *seen,
            Err(poisoned) => *poisoned.into_inner(),
        };
        seen.elapsed()
    }
}

/// Sessions keyed by the id stored in the session cookie.
pub struct SessionStore {
    sessions: DashMap<String, Arc<Session>>,
    idle_ttl: Duration,
}

impl SessionStore {
    pub fn new(idle_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            idle_ttl,
        }
    }

    pub fn create(&self, user: SessionUser, credentials: Credentials) -> Arc<Session> {
        let session = Arc::new(Session::new(user, credentials));
        self.sessions
            .insert(session.id().to_string(), session.clone());
        debug!(
            target = "quire::application::session",
            active = self.sessions.len(),
            "session created"
        );
        session
    }

    /// Look up a live session and refresh its idle timer. Expired sessions are removed.
    pub fn get(&self, id: &str) -> Option<Arc<Session>> {
        let session = self.sessions.get(id).map(|entry| entry.value().clone())?;
        if session.idle_for() > self.idle_ttl {
            self.sessions.remove(id);
            debug!(target = "quire::application::session", "session expired");
            return None;
        }
        session.touch();
        Some(session)
    }

    pub fn remove(&self, id: &str) -> Option<Arc<Session>> {
        self.sessions.remove(id).map(|(_, session)| session)
    }

    /// Drop every session idle for longer than the TTL. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.idle_for() <= self.idle_ttl);
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
