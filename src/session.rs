use crate::categories::{CategoryForm, InlineNotice};
use crate::errors::FetchError;
use crate::models::CreateCategoryResponse;
use crate::query::SessionFallback;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{DateTime, Duration, Utc};
use std::{collections::HashMap, sync::Arc};
use tokio::{runtime::Handle, sync::Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "gallery_session";
pub const SESSION_IDLE_MINUTES: i64 = 30;

/// Per-browser state kept between page loads.
#[derive(Debug, Clone, Default)]
pub struct SessionData {
    pub username: Option<String>,
    pub category_form: CategoryForm,
    pub notice: Option<InlineNotice>,
}

impl SessionData {
    /// Nothing worth keeping; such sessions are not stored.
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && !self.category_form.is_pending() && self.notice.is_none()
    }
}

impl SessionFallback for SessionData {
    fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    fn remember_username(&mut self, username: &str) {
        debug!("remembering username {username} for this session");
        self.username = Some(username.to_string());
    }

    fn forget_username(&mut self) {
        self.username = None;
    }
}

#[derive(Debug)]
struct Entry {
    data: SessionData,
    last_seen: DateTime<Utc>,
}

#[derive(Clone)]
pub struct Sessions {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
    idle: Duration,
}

impl Default for Sessions {
    fn default() -> Self {
        Self::new(Duration::minutes(SESSION_IDLE_MINUTES))
    }
}

impl Sessions {
    pub fn new(idle: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            idle,
        }
    }

    /// Runs `f` against the session. The lock is released before this
    /// returns, so callers never hold it across I/O.
    pub async fn with<R>(&self, id: &str, f: impl FnOnce(&mut SessionData) -> R) -> R {
        self.with_at(id, Utc::now(), f).await
    }

    /// Like [`Sessions::with`] at a given time. Sessions idle for longer than
    /// the configured window are dropped first, and a session is only stored
    /// once it holds something.
    pub async fn with_at<R>(
        &self,
        id: &str,
        now: DateTime<Utc>,
        f: impl FnOnce(&mut SessionData) -> R,
    ) -> R {
        let mut sessions = self.inner.lock().await;
        let idle = self.idle;
        sessions.retain(|_, entry| now - entry.last_seen < idle);

        let mut data = sessions
            .remove(id)
            .map(|entry| entry.data)
            .unwrap_or_default();
        let result = f(&mut data);
        if !data.is_empty() {
            sessions.insert(id.to_string(), Entry { data, last_seen: now });
        }
        result
    }

    pub async fn end(&self, id: &str) {
        self.inner.lock().await.remove(id);
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }
}

/// Marks one category creation as in flight. Dropping it before
/// [`PendingCategory::complete`] releases the form, so an abandoned request
/// does not debounce the session forever.
pub struct PendingCategory {
    sessions: Sessions,
    id: String,
    armed: bool,
}

impl PendingCategory {
    pub fn new(sessions: &Sessions, id: &str) -> Self {
        Self {
            sessions: sessions.clone(),
            id: id.to_string(),
            armed: true,
        }
    }

    /// Records the service's answer as the session notice and releases the form.
    pub async fn complete(mut self, result: Result<CreateCategoryResponse, FetchError>) {
        self.sessions
            .with(&self.id, |session| {
                session.notice = Some(session.category_form.finish(result, Utc::now()));
            })
            .await;
        self.armed = false;
    }
}

impl Drop for PendingCategory {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let sessions = self.sessions.clone();
        let id = std::mem::take(&mut self.id);
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    sessions
                        .with(&id, |session| session.category_form.release())
                        .await;
                });
            }
            Err(_) => warn!("category form left pending: no runtime to release it"),
        }
    }
}

/// Returns the browser's session id, issuing a new cookie when it has none.
pub fn ensure_session(jar: CookieJar) -> (CookieJar, String) {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        let id = cookie.value().to_string();
        return (jar, id);
    }

    let id = Uuid::new_v4().to_string();
    let cookie = Cookie::build((SESSION_COOKIE, id.clone()))
        .path("/")
        .http_only(true);
    (jar.add(cookie), id)
}
