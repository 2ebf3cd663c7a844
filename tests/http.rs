use axum::{
    extract::{Multipart, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use once_cell::sync::Lazy;
use reqwest::{redirect::Policy, Client};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

async fn stub_images(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    if let Some(category) = params.get("category") {
        return (StatusCode::OK, Json(json!([format!("https://img.test/{category}.png")])));
    }
    match params.get("username").map(String::as_str) {
        Some("ann") => (
            StatusCode::OK,
            Json(json!({ "images": [
                "https://img.test/1.png",
                "https://img.test/2.png",
                "https://img.test/3.png"
            ] })),
        ),
        Some("bare") => (StatusCode::OK, Json(json!(["https://img.test/bare.png"]))),
        Some("broken") => (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": "boom" }))),
        _ => (StatusCode::OK, Json(json!([]))),
    }
}

async fn stub_list_categories() -> Json<Value> {
    Json(json!([{ "name": "pets" }, { "name": "road trips" }]))
}

async fn stub_create_category(Json(body): Json<Value>) -> impl IntoResponse {
    if body["category_name"] == "dup" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "message": "Category already exists" })),
        );
    }
    (StatusCode::OK, Json(json!({ "success": true })))
}

async fn stub_upload(mut multipart: Multipart) -> StatusCode {
    let mut username = None;
    let mut has_file = false;
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => has_file = !field.bytes().await.unwrap_or_default().is_empty(),
            Some("username") => username = field.text().await.ok(),
            _ => {}
        }
    }
    match (username.as_deref(), has_file) {
        (Some("flaky"), _) => StatusCode::INTERNAL_SERVER_ERROR,
        (Some(_), true) => StatusCode::OK,
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Runs a stand-in for the image service on its own runtime so it outlives
/// each test's runtime.
fn spawn_image_service() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind image service");
    listener.set_nonblocking(true).unwrap();
    let addr = listener.local_addr().unwrap();

    std::thread::spawn(move || {
        let runtime = tokio::runtime::Runtime::new().expect("image service runtime");
        runtime.block_on(async move {
            let app = Router::new()
                .route("/api/images", get(stub_images))
                .route(
                    "/api/categories",
                    get(stub_list_categories).post(stub_create_category),
                )
                .route("/api/upload", axum::routing::post(stub_upload));
            let listener = tokio::net::TcpListener::from_std(listener).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });

    format!("http://{addr}")
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let api_base = spawn_image_service();
    let child = Command::new(env!("CARGO_BIN_EXE_image_gallery"))
        .env("PORT", port.to_string())
        .env("GALLERY_API_BASE", api_base)
        .env("GALLERY_SOURCE", "api")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

fn browser() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(Policy::none())
        .build()
        .unwrap()
}

async fn body(client: &Client, url: String) -> (StatusCode, String) {
    let response = client.get(url).send().await.unwrap();
    let status = response.status();
    (status, response.text().await.unwrap())
}

#[tokio::test]
async fn http_gallery_truncates_in_order_and_propagates_query() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let (status, html) = body(
        &browser(),
        format!("{}/gallery?username=ann&limit=2", server.base_url),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let first = html.find("https://img.test/1.png").expect("first image");
    let second = html.find("https://img.test/2.png").expect("second image");
    assert!(first < second);
    assert!(!html.contains("https://img.test/3.png"));
    assert!(html.contains(r#"href="/images?username=ann&amp;limit=2""#));
}

#[tokio::test]
async fn http_links_page_passes_category_to_the_service() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let (status, html) = body(
        &browser(),
        format!("{}/images?username=ann&category=pets&limit=5", server.base_url),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(">https://img.test/pets.png</a>"));
    assert!(html.contains(r#"href="/gallery?username=ann&amp;category=pets&amp;limit=5""#));
}

#[tokio::test]
async fn http_listing_failure_renders_empty_page() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;

    let (status, html) = body(
        &browser(),
        format!("{}/images?username=broken", server.base_url),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(r#"<ul class="link-list" id="image-links"></ul>"#));
    assert!(html.contains("No images to show."));
}

#[tokio::test]
async fn http_auth_validates_required_parameters() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = browser();

    let (status, text) = body(&client, format!("{}/auth", server.base_url)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.contains("Username parameter is required"));

    let (status, text) = body(
        &client,
        format!("{}/auth?username=%20%20&password=pw", server.base_url),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.contains("Username parameter is required"));

    let (status, text) = body(&client, format!("{}/auth?username=newbie", server.base_url)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.contains("Password parameter is required"));
}

#[tokio::test]
async fn http_auth_drops_password_from_the_page() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = browser();

    let (status, html) = body(
        &client,
        format!("{}/auth?username=ann&password=hunter2", server.base_url),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(r#"<span id="username-display">ann</span>"#));
    assert!(html.contains(r#"data-canonical-url="/auth?username=ann""#));
    assert!(html.contains(r#"href="/gallery?username=ann""#));
    assert!(html.contains(r#"<option value="road trips">road trips</option>"#));
    assert!(!html.contains("hunter2"));

    let (status, _) = body(&client, format!("{}/auth?username=ann", server.base_url)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn http_session_remembers_username_until_logout() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = browser();

    body(&client, format!("{}/gallery?username=bare", server.base_url)).await;

    let (_, html) = body(&client, format!("{}/gallery?limit=3", server.base_url)).await;
    assert!(html.contains("https://img.test/bare.png"));
    assert!(html.contains(r#"href="/images?limit=3&amp;username=bare""#));

    let response = client
        .get(format!("{}/logout", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["location"], "/");

    let (_, html) = body(&client, format!("{}/gallery", server.base_url)).await;
    assert!(!html.contains("https://img.test/bare.png"));
    assert!(html.contains("No images to show."));
}

#[tokio::test]
async fn http_login_reveals_then_navigates() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = browser();
    let login = format!("{}/login", server.base_url);

    let html = client
        .post(&login)
        .form(&[("stage", "collapsed"), ("username", "ann")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("password-input"));
    assert!(html.contains(r#"name="stage" value="revealed""#));

    let html = client
        .post(&login)
        .form(&[("stage", "revealed"), ("username", ""), ("password", "pw")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Username parameter is required"));

    let response = client
        .post(&login)
        .form(&[("stage", "revealed"), ("username", "ann"), ("password", "pw")])
        .send()
        .await
        .unwrap();
    assert!(response.status().is_redirection());
    assert_eq!(response.headers()["location"], "/auth?username=ann&password=pw");
}

#[tokio::test]
async fn http_upload_acknowledges_success_and_failure() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = browser();

    let form = |username: &str| {
        reqwest::multipart::Form::new()
            .text("username", username.to_string())
            .text("category", "pets")
            .part(
                "file",
                reqwest::multipart::Part::bytes(vec![0x89, 0x50, 0x4e, 0x47]).file_name("cat.png"),
            )
    };

    let html = client
        .post(format!("{}/upload", server.base_url))
        .multipart(form("ann"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Image uploaded successfully!"));
    assert!(html.contains(r#"href="/gallery?username=ann&amp;category=pets""#));

    let html = client
        .post(format!("{}/upload", server.base_url))
        .multipart(form("flaky"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Upload failed. Please try again."));
}

#[tokio::test]
async fn http_category_rejection_shows_inline_notice() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = browser();

    let response = client
        .post(format!("{}/categories", server.base_url))
        .form(&[("username", "ann"), ("category_name", "dup")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.headers()["location"], "/gallery?username=ann");

    let (_, html) = body(&client, format!("{}/gallery?username=ann", server.base_url)).await;
    assert!(html.contains("Category already exists"));
    assert!(html.contains("data-dismiss-ms"));

    let (_, html) = body(&client, format!("{}/gallery?username=ann", server.base_url)).await;
    assert!(!html.contains("Category already exists"));
}
