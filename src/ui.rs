use crate::categories::InlineNotice;
use crate::links::NavLink;
use crate::login::LoginStage;
use crate::models::Category;
use crate::page::{ListingPage, ListingView};
use crate::query::QueryPairs;
use crate::render::escape_html;
use chrono::{DateTime, Utc};

pub fn render_login(stage: LoginStage, username: &str, error: Option<&str>) -> String {
    let password_field = match stage {
        LoginStage::Collapsed => String::new(),
        LoginStage::Revealed => r#"<label for="password-input">Password</label>
        <input id="password-input" name="password" type="password" autocomplete="current-password" autofocus />"#
            .to_string(),
    };
    let button = match stage {
        LoginStage::Collapsed => "Continue",
        LoginStage::Revealed => "Log in",
    };

    page(
        "Login",
        &LOGIN_HTML
            .replace("{{ERROR}}", &blocking_error(error))
            .replace("{{STAGE}}", stage.as_str())
            .replace("{{USERNAME}}", &escape_html(username))
            .replace("{{PASSWORD_FIELD}}", &password_field)
            .replace("{{BUTTON}}", button),
    )
}

pub struct AuthorizationPage<'a> {
    pub username: &'a str,
    pub canonical_url: &'a str,
    pub upload_label: &'a str,
    pub categories: &'a [Category],
    pub links: &'a [NavLink],
}

pub fn render_authorization(view: &AuthorizationPage<'_>) -> String {
    let options: String = view
        .categories
        .iter()
        .map(|category| {
            let name = escape_html(&category.name);
            format!(r#"<option value="{name}">{name}</option>"#)
        })
        .collect();

    page(
        "Your Images",
        &AUTH_HTML
            .replace("{{CANONICAL}}", &escape_html(view.canonical_url))
            .replace("{{CANONICAL_JS}}", &js_string(view.canonical_url))
            .replace("{{USERNAME}}", &escape_html(view.username))
            .replace("{{CATEGORY_OPTIONS}}", &options)
            .replace("{{UPLOAD_LABEL}}", &escape_html(view.upload_label))
            .replace("{{NAV}}", &nav(view.links)),
    )
}

pub fn render_listing(
    view: &ListingView,
    categories: &[Category],
    notice: Option<&InlineNotice>,
    now: DateTime<Utc>,
) -> String {
    let (title, list_open, list_close) = match view.page {
        ListingPage::Grid => ("Gallery", r#"<section class="grid" id="image-grid">"#, "</section>"),
        ListingPage::Links => ("Image Links", r#"<ul class="link-list" id="image-links">"#, "</ul>"),
    };
    let empty = if view.container.children().is_empty() {
        r#"<p class="hint" id="empty-state">No images to show.</p>"#
    } else {
        ""
    };

    page(
        title,
        &LISTING_HTML
            .replace("{{TITLE}}", title)
            .replace("{{WHO}}", &escape_html(view.state.username.as_deref().unwrap_or("guest")))
            .replace("{{NAV}}", &nav(&view.links))
            .replace("{{CATEGORIES}}", &category_filters(view, categories))
            .replace("{{NOTICE}}", &inline_notice(notice, now))
            .replace("{{CATEGORY_FORM}}", &category_form(view))
            .replace("{{LIST_OPEN}}", list_open)
            .replace("{{ITEMS}}", &view.container.inner_html())
            .replace("{{LIST_CLOSE}}", list_close)
            .replace("{{EMPTY}}", empty),
    )
}

pub fn render_acknowledgement(message: &str, success: bool, continue_href: &str) -> String {
    page(
        "Upload",
        &ACK_HTML
            .replace("{{TYPE}}", if success { "ok" } else { "error" })
            .replace("{{MESSAGE}}", &escape_html(message))
            .replace("{{CONTINUE}}", &escape_html(continue_href)),
    )
}

fn category_filters(view: &ListingView, categories: &[Category]) -> String {
    let Some(username) = view.state.username.as_deref() else {
        return String::new();
    };

    let mut all = QueryPairs::default();
    all.set("username", username);
    let mut items = vec![format!(
        r#"<a class="chip" href="?{}">All</a>"#,
        escape_html(&all.encode())
    )];
    for category in categories {
        let mut query = all.clone();
        query.set("category", &category.name);
        let active = view.state.category.as_deref() == Some(category.name.as_str());
        items.push(format!(
            r#"<a class="chip{}" href="?{}">{}</a>"#,
            if active { " active" } else { "" },
            escape_html(&query.encode()),
            escape_html(&category.name)
        ));
    }
    format!(r#"<nav class="chips" id="category-filter">{}</nav>"#, items.concat())
}

fn category_form(view: &ListingView) -> String {
    let Some(username) = view.state.username.as_deref() else {
        return String::new();
    };
    format!(
        r#"<form class="inline" id="category-form" method="post" action="/categories">
      <input type="hidden" name="username" value="{}" />
      <input type="hidden" name="return_to" value="{}" />
      <input id="category-name" name="category_name" placeholder="New category" />
      <button type="submit" id="category-btn">Create</button>
    </form>"#,
        escape_html(username),
        escape_html(match view.page {
            ListingPage::Grid => "/gallery",
            ListingPage::Links => "/images",
        })
    )
}

fn inline_notice(notice: Option<&InlineNotice>, now: DateTime<Utc>) -> String {
    match notice.filter(|notice| notice.is_visible_at(now)) {
        Some(notice) => format!(
            r#"<div class="status" id="category-notice" data-type="{}" data-dismiss-ms="{}">{}</div>"#,
            notice.kind.as_str(),
            notice.remaining_ms(now),
            escape_html(&notice.text)
        ),
        None => String::new(),
    }
}

fn blocking_error(error: Option<&str>) -> String {
    match error {
        Some(message) => format!(
            r#"<div class="status" role="alertdialog" data-type="error" id="login-error">{}</div>"#,
            escape_html(message)
        ),
        None => String::new(),
    }
}

fn nav(links: &[NavLink]) -> String {
    links
        .iter()
        .map(|link| {
            format!(
                r#"<a class="btn" id="{}" href="{}">{}</a>"#,
                link.id,
                escape_html(&link.href()),
                escape_html(link.label)
            )
        })
        .collect()
}

fn js_string(value: &str) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "\"/\"".to_string())
        .replace("</", "<\\/")
        .replace('{', "\\u007b")
        .replace('}', "\\u007d")
}

fn page(title: &str, body: &str) -> String {
    SHELL_HTML
        .replace("{{PAGE_TITLE}}", title)
        .replace("{{BODY}}", body)
}

const SHELL_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>{{PAGE_TITLE}}</title>
  <style>
    :root {
      --bg: #f4f1ea;
      --ink: #24262b;
      --accent: #3a6ea5;
      --card: #ffffff;
      --shadow: 0 18px 40px rgba(36, 38, 43, 0.12);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 32px 18px 48px;
    }

    .app {
      width: min(960px, 100%);
      margin: 0 auto;
      background: var(--card);
      border-radius: 24px;
      box-shadow: var(--shadow);
      padding: 32px;
      display: grid;
      gap: 24px;
    }

    .actions, .chips {
      display: flex;
      flex-wrap: wrap;
      gap: 12px;
    }

    .btn, button {
      border: none;
      border-radius: 999px;
      padding: 12px 18px;
      background: var(--accent);
      color: white;
      font-weight: 600;
      text-decoration: none;
      cursor: pointer;
    }

    .chip {
      padding: 6px 12px;
      border-radius: 999px;
      border: 1px solid var(--accent);
      color: var(--accent);
      text-decoration: none;
    }

    .chip.active {
      background: var(--accent);
      color: white;
    }

    .grid {
      display: grid;
      grid-template-columns: repeat(auto-fill, minmax(200px, 1fr));
      gap: 16px;
    }

    .card {
      margin: 0;
    }

    .card img {
      width: 100%;
      border-radius: 12px;
      display: block;
    }

    .status {
      padding: 12px 16px;
      border-radius: 12px;
    }

    .status[data-type="error"] {
      background: #fde2e1;
      color: #8a1c1c;
    }

    .status[data-type="ok"] {
      background: #e1f5e6;
      color: #1d5b2c;
    }

    .hint {
      color: #6b6d73;
    }
  </style>
</head>
<body>
  <main class="app">
{{BODY}}
  </main>
  <script>
    document.querySelectorAll('[data-dismiss-ms]').forEach((el) => {
      setTimeout(() => el.remove(), Number(el.dataset.dismissMs));
    });
  </script>
</body>
</html>
"#;

const LOGIN_HTML: &str = r#"    <header>
      <h1>Image Gallery</h1>
      <p class="hint">Sign in to upload and browse your images.</p>
    </header>
    {{ERROR}}
    <form id="login-form" method="post" action="/login">
      <input type="hidden" name="stage" value="{{STAGE}}" />
      <label for="username-input">Username</label>
      <input id="username-input" name="username" value="{{USERNAME}}" autocomplete="username" />
      {{PASSWORD_FIELD}}
      <button id="login-btn" type="submit">{{BUTTON}}</button>
    </form>"#;

const AUTH_HTML: &str = r#"    <header data-canonical-url="{{CANONICAL}}">
      <h1>Welcome, <span id="username-display">{{USERNAME}}</span></h1>
      <a class="hint" id="logout-btn" href="/logout">Log out</a>
    </header>
    <script>history.replaceState(null, '', {{CANONICAL_JS}});</script>
    <form class="actions" id="upload-form" method="post" action="/upload" enctype="multipart/form-data">
      <input type="hidden" name="username" value="{{USERNAME}}" />
      <select name="category" id="category-select">
        <option value="">No category</option>
        {{CATEGORY_OPTIONS}}
      </select>
      <input id="file-input" name="file" type="file" accept="image/*" />
      <button id="upload-btn" type="submit">{{UPLOAD_LABEL}}</button>
    </form>
    <nav class="actions">{{NAV}}</nav>"#;

const LISTING_HTML: &str = r#"    <header>
      <h1>{{TITLE}}</h1>
      <p class="hint">Signed in as <span id="username-display">{{WHO}}</span></p>
      <nav class="actions">{{NAV}}<a class="btn" id="logout-btn" href="/logout">Log out</a></nav>
    </header>
    {{CATEGORIES}}
    {{NOTICE}}
    {{CATEGORY_FORM}}
    {{LIST_OPEN}}{{ITEMS}}{{LIST_CLOSE}}
    {{EMPTY}}"#;

const ACK_HTML: &str = r#"    <div class="status" role="alertdialog" id="upload-result" data-type="{{TYPE}}">{{MESSAGE}}</div>
    <a class="btn" id="continue-btn" href="{{CONTINUE}}">OK</a>"#;
