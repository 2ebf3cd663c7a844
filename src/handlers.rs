use crate::api::ImageApi;
use crate::categories::{load_categories, Submission};
use crate::errors::{AppError, ValidationError};
use crate::links::strip_password;
use crate::login::{self, LoginOutcome, LoginStage};
use crate::models::SelectedFile;
use crate::page::{authorization_links, load_listing, ListingPage};
use crate::query::{QueryPairs, QueryState, SessionFallback};
use crate::session::{ensure_session, PendingCategory, SESSION_COOKIE};
use crate::state::AppState;
use crate::ui::{
    render_acknowledgement, render_authorization, render_listing, render_login, AuthorizationPage,
};
use crate::upload::{acknowledgement, UploadControl};
use axum::{
    extract::{Multipart, RawQuery, State},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

pub async fn index() -> Html<String> {
    Html(render_login(LoginStage::Collapsed, "", None))
}

#[derive(Debug, Deserialize)]
pub struct LoginFields {
    #[serde(default)]
    pub stage: Option<String>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login(Form(fields): Form<LoginFields>) -> Response {
    let stage = LoginStage::parse(fields.stage.as_deref());
    match login::press(stage, &fields.username, &fields.password) {
        (next, LoginOutcome::Reveal) => {
            Html(render_login(next, fields.username.trim(), None)).into_response()
        }
        (next, LoginOutcome::Rejected(err)) => {
            Html(render_login(next, fields.username.trim(), Some(&err.to_string()))).into_response()
        }
        (_, LoginOutcome::Navigate(target)) => Redirect::to(&target).into_response(),
    }
}

pub async fn authorization(
    State(state): State<AppState>,
    jar: CookieJar,
    RawQuery(raw): RawQuery,
) -> Result<(CookieJar, Html<String>), AppError> {
    let (jar, session_id) = ensure_session(jar);
    let mut query = QueryPairs::parse(raw.as_deref());

    let username = query
        .get("username")
        .map(str::trim)
        .filter(|username| !username.is_empty())
        .map(str::to_string)
        .ok_or(ValidationError::MissingUsername)?;
    let has_password = query
        .get("password")
        .is_some_and(|password| !password.trim().is_empty());

    let known = state
        .sessions
        .with(&session_id, |session| session.username() == Some(username.as_str()))
        .await;
    // The canonical URL has no password, so reloading it is allowed once the
    // session knows the user.
    if !has_password && !known {
        return Err(ValidationError::MissingPassword.into());
    }

    strip_password(&mut query);
    let resolved = state
        .sessions
        .with(&session_id, |session| {
            QueryState::resolve(&query, state.source.limit_policy(), session)
        })
        .await;
    info!("authorized page for {username}");

    let categories = load_categories(&state.api, resolved.username.as_deref()).await;
    let canonical_url = format!("/auth?{}", query.encode());
    let links = authorization_links(&resolved);
    let upload = UploadControl::default();

    let html = render_authorization(&AuthorizationPage {
        username: &username,
        canonical_url: &canonical_url,
        upload_label: upload.label(),
        categories: &categories,
        links: &links,
    });
    Ok((jar, Html(html)))
}

pub async fn gallery(
    State(state): State<AppState>,
    jar: CookieJar,
    RawQuery(raw): RawQuery,
) -> (CookieJar, Html<String>) {
    listing(state, jar, raw, ListingPage::Grid).await
}

pub async fn image_links(
    State(state): State<AppState>,
    jar: CookieJar,
    RawQuery(raw): RawQuery,
) -> (CookieJar, Html<String>) {
    listing(state, jar, raw, ListingPage::Links).await
}

async fn listing(
    state: AppState,
    jar: CookieJar,
    raw: Option<String>,
    page: ListingPage,
) -> (CookieJar, Html<String>) {
    let (jar, session_id) = ensure_session(jar);
    let query = QueryPairs::parse(raw.as_deref());
    let policy = state.source.limit_policy();

    let (resolved, notice) = state
        .sessions
        .with(&session_id, |session| {
            (QueryState::resolve(&query, policy, session), session.notice.take())
        })
        .await;

    let categories = load_categories(&state.api, resolved.username.as_deref()).await;
    let view = load_listing(&state.api, state.source, page, &query, resolved).await;

    let html = render_listing(&view, &categories, notice.as_ref(), Utc::now());
    (jar, Html(html))
}

pub async fn upload(
    State(state): State<AppState>,
    jar: CookieJar,
    mut multipart: Multipart,
) -> Result<(CookieJar, Html<String>), AppError> {
    let (jar, session_id) = ensure_session(jar);
    let mut fields = QueryPairs::default();
    let mut control = UploadControl::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await?;
                if !file_name.is_empty() || !bytes.is_empty() {
                    control.select(SelectedFile {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            "username" | "category" => {
                let value = field.text().await?;
                if !value.trim().is_empty() {
                    fields.set(&name, &value);
                }
            }
            other => warn!("ignoring unexpected upload field {other:?}"),
        }
    }

    let resolved = state
        .sessions
        .with(&session_id, |session| {
            QueryState::resolve(&fields, state.source.limit_policy(), session)
        })
        .await;

    let result = control
        .submit(
            &state.api,
            resolved.username.as_deref(),
            resolved.category.as_deref(),
        )
        .await;

    let mut next = QueryPairs::default();
    if let Some(username) = &resolved.username {
        next.set("username", username);
    }
    if let Some(category) = &resolved.category {
        next.set("category", category);
    }
    let continue_href = if next.is_empty() {
        "/".to_string()
    } else {
        format!("/gallery?{}", next.encode())
    };

    let html = render_acknowledgement(&acknowledgement(&result), result.is_ok(), &continue_href);
    Ok((jar, Html(html)))
}

#[derive(Debug, Deserialize)]
pub struct CategoryFields {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub return_to: Option<String>,
}

pub async fn create_category(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(fields): Form<CategoryFields>,
) -> (CookieJar, Redirect) {
    let (jar, session_id) = ensure_session(jar);
    let now = Utc::now();

    let (submission, username) = state
        .sessions
        .with(&session_id, |session| {
            let username = fields
                .username
                .clone()
                .filter(|username| !username.trim().is_empty())
                .or_else(|| session.username().map(str::to_string));
            let submission = session
                .category_form
                .begin(username.as_deref(), &fields.category_name, now);
            (submission, username)
        })
        .await;

    match submission {
        Submission::Ignored => info!("ignoring category submission while another is pending"),
        Submission::Rejected(notice) => {
            state
                .sessions
                .with(&session_id, |session| session.notice = Some(notice))
                .await;
        }
        Submission::Ready(request) => {
            let pending = PendingCategory::new(&state.sessions, &session_id);
            let result = state.api.create_category(&request).await;
            pending.complete(result).await;
        }
    }

    let path = match fields.return_to.as_deref() {
        Some("/images") => "/images",
        _ => "/gallery",
    };
    let target = match username {
        Some(username) => {
            let mut query = QueryPairs::default();
            query.set("username", &username);
            format!("{path}?{}", query.encode())
        }
        None => path.to_string(),
    };
    (jar, Redirect::to(&target))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Redirect {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.end(cookie.value()).await;
        info!("session logged out");
    }
    Redirect::to("/")
}
