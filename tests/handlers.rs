use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Request, StatusCode, header},
    routing::get,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use snippetbox::{
    config::Config,
    routes::{router, with_standard_middleware},
    services::users::create_user,
    state::AppState,
};

const FORM: &str = "application/x-www-form-urlencoded";

/// Drives the router in-process, carrying the session cookie between
/// requests the way a browser would.
struct TestApp {
    state: AppState,
    router: Router,
    cookie: Option<String>,
}

struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl TestResponse {
    fn location(&self) -> &str {
        self.headers
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    fn csrf_token(&self) -> String {
        let marker = "name=\"csrf_token\" value=\"";
        let start = self.body.find(marker).expect("page has no csrf field") + marker.len();
        let end = self.body[start..].find('"').unwrap() + start;
        self.body[start..end].to_string()
    }
}

impl TestApp {
    fn new() -> Self {
        let state = AppState::in_memory(Config::default());
        Self {
            router: router(state.clone()),
            state,
            cookie: None,
        }
    }

    async fn send(&mut self, mut request: Request<Body>) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            request
                .headers_mut()
                .insert(header::COOKIE, cookie.parse().unwrap());
        }

        let response = self.router.clone().oneshot(request).await.unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            let value = value.to_str().unwrap();
            if let Some(pair) = value.split(';').next() {
                if pair.starts_with("session=") {
                    self.cookie = Some(pair.to_string());
                }
            }
        }

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    async fn get(&mut self, path: &str) -> TestResponse {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    async fn post_form(&mut self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, FORM)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Fetches `page` for a CSRF token, then posts `fields` to `path` with it.
    async fn submit(&mut self, page: &str, path: &str, fields: &str) -> TestResponse {
        let token = self.get(page).await.csrf_token();
        self.post_form(path, &format!("{}&csrf_token={}", fields, token))
            .await
    }

    async fn add_user(&self, email: &str, password: &str) {
        create_user(self.state.users.as_ref(), "Alice", email, password)
            .await
            .unwrap();
    }

    async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.submit(
            "/user/login",
            "/user/login",
            &format!("email={}&password={}", email, password),
        )
        .await
    }
}

fn assert_secure_headers(headers: &HeaderMap) {
    assert_eq!(
        headers["content-security-policy"],
        "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com"
    );
    assert_eq!(headers["referrer-policy"], "origin-when-cross-origin");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "deny");
    assert_eq!(headers["x-xss-protection"], "0");
}

#[tokio::test]
async fn ping_answers_ok() {
    let mut app = TestApp::new();
    let response = app.get("/ping").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body, "OK");
    assert_secure_headers(&response.headers);
}

#[tokio::test]
async fn home_page_renders_with_security_headers() {
    let mut app = TestApp::new();
    let response = app.get("/").await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("There's nothing to see here... yet!"));
    assert_secure_headers(&response.headers);
}

#[tokio::test]
async fn anonymous_browsing_creates_no_session() {
    let mut app = TestApp::new();

    for path in ["/", "/about", "/snippet/view/1"] {
        let response = app.get(path).await;
        assert!(
            !response.headers.contains_key(header::SET_COOKIE),
            "{} set a cookie",
            path
        );
    }
    assert!(app.cookie.is_none());

    let response = app.get("/user/login").await;
    assert!(response.headers.contains_key(header::SET_COOKIE));
    assert!(!response.csrf_token().is_empty());
}

#[tokio::test]
async fn bad_snippet_ids_are_not_found() {
    let mut app = TestApp::new();

    for path in ["/snippet/view/0", "/snippet/view/-1", "/snippet/view/abc", "/snippet/view/99"] {
        let response = app.get(path).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "{}", path);
    }
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let mut app = TestApp::new();
    let response = app.get("/no/such/page").await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert!(response.body.contains("404 Not Found"));
    assert_secure_headers(&response.headers);
}

#[tokio::test]
async fn signup_then_duplicate_email() {
    let mut app = TestApp::new();
    let fields = "name=Bob&email=bob%40example.com&password=validPa%24%24word";

    let response = app.submit("/user/signup", "/user/signup", fields).await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/user/login");

    let response = app.get("/user/login").await;
    assert!(response.body.contains("Your signup was successful. Please log in."));

    let response = app.submit("/user/signup", "/user/signup", fields).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Email address is already in use"));
}

#[tokio::test]
async fn invalid_signup_is_redisplayed() {
    let mut app = TestApp::new();
    let response = app
        .submit("/user/signup", "/user/signup", "name=&email=not-an-email&password=short")
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("This field cannot be blank"));
    assert!(response.body.contains("This field must be a valid email address"));
    assert!(response.body.contains("This field must be at least 8 characters long"));
    assert!(response.body.contains("value=\"not-an-email\""));
}

#[tokio::test]
async fn post_without_csrf_token_is_rejected() {
    let mut app = TestApp::new();
    app.get("/user/signup").await;

    let response = app
        .post_form("/user/signup", "name=Bob&email=bob%40example.com&password=validPa%24%24word")
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    let response = app
        .post_form(
            "/user/signup",
            "name=Bob&email=bob%40example.com&password=validPa%24%24word&csrf_token=forged",
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn csrf_token_may_come_from_a_header() {
    let mut app = TestApp::new();
    let token = app.get("/user/signup").await.csrf_token();

    let request = Request::builder()
        .method("POST")
        .uri("/user/signup")
        .header(header::CONTENT_TYPE, FORM)
        .header("x-csrf-token", token)
        .body(Body::from("name=Bob&email=bob%40example.com&password=validPa%24%24word"))
        .unwrap();
    let response = app.send(request).await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn wrong_password_is_a_non_field_error() {
    let mut app = TestApp::new();
    app.add_user("alice@example.com", "pa$$word1").await;

    let response = app.login("alice%40example.com", "wrong-password").await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Email or password is incorrect"));
}

#[tokio::test]
async fn protected_page_redirects_to_login_and_back() {
    let mut app = TestApp::new();
    app.add_user("alice@example.com", "pa$$word1").await;

    let response = app.get("/account/view").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/user/login");

    let before = app.cookie.clone();
    let response = app.login("alice%40example.com", "pa%24%24word1").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/account/view");
    assert_ne!(app.cookie, before, "login must rotate the session token");

    let response = app.get("/account/view").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.headers["cache-control"], "no-store");
    assert!(response.body.contains("alice@example.com"));
}

#[tokio::test]
async fn login_defaults_to_create_page() {
    let mut app = TestApp::new();
    app.add_user("alice@example.com", "pa$$word1").await;

    let response = app.login("alice%40example.com", "pa%24%24word1").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/snippet/create");
}

#[tokio::test]
async fn create_snippet_and_flash_once() {
    let mut app = TestApp::new();
    app.add_user("alice@example.com", "pa$$word1").await;
    app.login("alice%40example.com", "pa%24%24word1").await;

    let response = app
        .submit(
            "/snippet/create",
            "/snippet/create",
            "title=O+snail&content=Climb+Mount+Fuji&expires=7",
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/snippet/view/1");

    let response = app.get("/snippet/view/1").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains("O snail"));
    assert!(response.body.contains("Climb Mount Fuji"));
    assert!(response.body.contains("Snippet successfully created!"));

    let response = app.get("/snippet/view/1").await;
    assert!(!response.body.contains("Snippet successfully created!"));

    let response = app.get("/").await;
    assert!(response.body.contains("href=\"/snippet/view/1\""));
}

#[tokio::test]
async fn invalid_snippet_is_unprocessable() {
    let mut app = TestApp::new();
    app.add_user("alice@example.com", "pa$$word1").await;
    app.login("alice%40example.com", "pa%24%24word1").await;

    let response = app
        .submit("/snippet/create", "/snippet/create", "title=&content=x&expires=3")
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("This field cannot be blank"));
    assert!(response.body.contains("This field must equal 1, 7 or 365"));
}

#[tokio::test]
async fn malformed_form_is_a_bad_request() {
    let mut app = TestApp::new();
    app.add_user("alice@example.com", "pa$$word1").await;
    app.login("alice%40example.com", "pa%24%24word1").await;

    let response = app
        .submit("/snippet/create", "/snippet/create", "title=a&content=b&expires=soon")
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn logout_ends_the_session() {
    let mut app = TestApp::new();
    app.add_user("alice@example.com", "pa$$word1").await;
    app.login("alice%40example.com", "pa%24%24word1").await;

    let response = app.submit("/account/view", "/user/logout", "").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/");

    let response = app.get("/").await;
    assert!(response.body.contains("You've been logged out successfully"));

    let response = app.get("/account/view").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/user/login");
}

#[tokio::test]
async fn password_can_be_changed() {
    let mut app = TestApp::new();
    app.add_user("alice@example.com", "pa$$word1").await;
    app.login("alice%40example.com", "pa%24%24word1").await;

    let response = app
        .submit(
            "/account/password/update",
            "/account/password/update",
            "current_password=nope&new_password=new-pa%24%24word&confirm_new_password=new-pa%24%24word",
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Current password is incorrect"));

    let response = app
        .submit(
            "/account/password/update",
            "/account/password/update",
            "current_password=pa%24%24word1&new_password=new-pa%24%24word&confirm_new_password=new-pa%24%24word",
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), "/account/view");

    let response = app.get("/account/view").await;
    assert!(response.body.contains("Password successfully updated"));
}

#[tokio::test]
async fn panics_become_500_and_close_the_connection() {
    let app = with_standard_middleware(Router::new().route(
        "/panic",
        get(|| async {
            if true {
                panic!("boom");
            }
            "unreachable"
        }),
    ));

    let request = Request::builder().uri("/panic").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.headers()[header::CONNECTION], "close");
    assert_secure_headers(response.headers());
}
