//! Server-side sessions.
//!
//! The browser only holds an opaque session id in the `rs_session` cookie.
//! The signed-in user and the backend credentials live here, and handlers
//! receive the resolved [`Session`] explicitly.

use std::time::Duration;

use axum::http::{HeaderMap, header};
use moka::future::Cache as MokaCache;
use uuid::Uuid;

use crate::backend::Credentials;
use crate::domain::{User, UserId};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "rs_session";

/// Sessions idle for longer than this are dropped.
const DEFAULT_IDLE: Duration = Duration::from_secs(24 * 60 * 60);

/// Upper bound on live sessions.
const MAX_SESSIONS: u64 = 10_000;

/// The identity shown in the header and used for permission checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
    pub is_admin: bool,
}

impl SessionUser {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            is_admin: user.is_admin,
        }
    }
}

/// One browser's session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user: Option<SessionUser>,
    /// Backend cookie replayed on authenticated calls.
    pub credentials: Option<Credentials>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(user: SessionUser, credentials: Option<Credentials>) -> Self {
        Self {
            user: Some(user),
            credentials,
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        self.user.as_ref().map(|u| &u.id)
    }

    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(|u| u.is_admin)
    }
}

/// Table of live sessions keyed by session id.
#[derive(Clone)]
pub struct SessionStore {
    sessions: MokaCache<String, Session>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE)
    }
}

impl SessionStore {
    pub fn new(idle: Duration) -> Self {
        let sessions = MokaCache::builder()
            .time_to_idle(idle)
            .max_capacity(MAX_SESSIONS)
            .build();
        Self { sessions }
    }

    /// Store a new session and return its id.
    pub async fn create(&self, session: Session) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions.insert(id.clone(), session).await;
        id
    }

    pub async fn get(&self, id: &str) -> Option<Session> {
        self.sessions.get(id).await
    }

    /// Replace the session stored under `id`.
    pub async fn update(&self, id: &str, session: Session) {
        self.sessions.insert(id.to_string(), session).await;
    }

    pub async fn remove(&self, id: &str) {
        self.sessions.invalidate(id).await;
    }

    /// Resolve the request's session, anonymous when there is none.
    pub async fn resolve(&self, headers: &HeaderMap) -> (Option<String>, Session) {
        let Some(id) = session_id(headers) else {
            return (None, Session::anonymous());
        };
        match self.get(&id).await {
            Some(session) => (Some(id), session),
            None => (None, Session::anonymous()),
        }
    }
}

/// The session id from the request's `Cookie` header, if any.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value that stores the session id.
pub fn session_cookie(id: &str) -> String {
    format!("{SESSION_COOKIE}={id}; HttpOnly; SameSite=Lax; Path=/")
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}
