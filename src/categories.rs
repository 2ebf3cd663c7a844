use crate::api::ImageApi;
use crate::errors::{FetchError, ValidationError};
use crate::models::{Category, CreateCategoryRequest, CreateCategoryResponse};
use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, warn};

pub const NOTICE_TTL_MS: i64 = 3_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::Error => "error",
        }
    }
}

/// Message shown next to the category form until it expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineNotice {
    pub kind: NoticeKind,
    pub text: String,
    pub expires_at: DateTime<Utc>,
}

impl InlineNotice {
    pub fn new(kind: NoticeKind, text: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            kind,
            text: text.into(),
            expires_at: now + Duration::milliseconds(NOTICE_TTL_MS),
        }
    }

    pub fn is_visible_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }

    pub fn remaining_ms(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_milliseconds().max(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// A creation is already in flight.
    Ignored,
    Rejected(InlineNotice),
    Ready(CreateCategoryRequest),
}

/// Category creation form. Only one creation may be in flight at a time.
#[derive(Debug, Clone, Default)]
pub struct CategoryForm {
    pending: bool,
}

impl CategoryForm {
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn begin(&mut self, username: Option<&str>, name: &str, now: DateTime<Utc>) -> Submission {
        if self.pending {
            return Submission::Ignored;
        }

        let username = username.map(str::trim).filter(|username| !username.is_empty());
        let name = name.trim();
        let missing = match (username, name.is_empty()) {
            (None, _) => Some(ValidationError::MissingUsername),
            (Some(_), true) => Some(ValidationError::MissingCategoryName),
            (Some(_), false) => None,
        };
        if let Some(err) = missing {
            return Submission::Rejected(InlineNotice::new(NoticeKind::Error, err.to_string(), now));
        }

        self.pending = true;
        Submission::Ready(CreateCategoryRequest {
            username: username.unwrap_or_default().to_string(),
            category_name: name.to_string(),
        })
    }

    /// Lets the next submission through without recording an outcome.
    pub fn release(&mut self) {
        self.pending = false;
    }

    pub fn finish(
        &mut self,
        result: Result<CreateCategoryResponse, FetchError>,
        now: DateTime<Utc>,
    ) -> InlineNotice {
        self.release();
        match result {
            Ok(CreateCategoryResponse { success: true, message }) => InlineNotice::new(
                NoticeKind::Success,
                message.unwrap_or_else(|| "Category created".to_string()),
                now,
            ),
            Ok(CreateCategoryResponse { success: false, message }) => {
                warn!("category rejected: {message:?}");
                InlineNotice::new(
                    NoticeKind::Error,
                    message.unwrap_or_else(|| "Failed to create category".to_string()),
                    now,
                )
            }
            Err(err) => {
                error!("failed to create category: {err}");
                InlineNotice::new(NoticeKind::Error, "Error creating category", now)
            }
        }
    }

    /// Runs a whole creation when the form is owned by a single caller.
    /// Returns `None` when the submission was debounced.
    pub async fn submit<A: ImageApi>(
        &mut self,
        api: &A,
        username: Option<&str>,
        name: &str,
    ) -> Option<InlineNotice> {
        match self.begin(username, name, Utc::now()) {
            Submission::Ignored => None,
            Submission::Rejected(notice) => Some(notice),
            Submission::Ready(request) => {
                let result = api.create_category(&request).await;
                if result.is_ok() {
                    info!("category {} submitted for {}", request.category_name, request.username);
                }
                Some(self.finish(result, Utc::now()))
            }
        }
    }
}

/// Categories for the selector; failures leave it empty.
pub async fn load_categories<A: ImageApi>(api: &A, username: Option<&str>) -> Vec<Category> {
    let Some(username) = username else {
        return Vec::new();
    };
    api.list_categories(username).await.unwrap_or_else(|err| {
        error!("failed to load categories: {err}");
        Vec::new()
    })
}
