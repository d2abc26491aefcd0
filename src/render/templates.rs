use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{Datelike, Utc};
use maud::Markup;

use super::helpers::TemplateFuncs;
use super::pages;
use crate::{
    error::{AppError, Result},
    middleware_layer::{auth::AuthStatus, session::Session},
    models::{snippet::Snippet, user::User},
    validation::forms::{PasswordChangeForm, SnippetCreateForm, UserLoginForm, UserSignupForm},
};

/// The form a page re-displays, along with its validation errors.
#[derive(Debug, Clone)]
pub enum PageForm {
    SnippetCreate(SnippetCreateForm),
    Signup(UserSignupForm),
    Login(UserLoginForm),
    PasswordChange(PasswordChangeForm),
}

/// Everything a page may show. Built fresh for every request.
#[derive(Debug, Clone, Default)]
pub struct TemplateData {
    pub current_year: i32,
    pub snippet: Option<Snippet>,
    pub snippets: Vec<Snippet>,
    pub user: Option<User>,
    pub form: Option<PageForm>,
    pub flash: Option<String>,
    pub is_authenticated: bool,
    pub csrf_token: String,
}

impl TemplateData {
    /// Creates the per-request defaults.
    ///
    /// Pops the session's flash message, so it is shown exactly once. A CSRF
    /// token is issued here only for logged-in users, whose nav carries the
    /// logout form; anonymous visitors to form-less pages get no session.
    ///
    /// # Arguments
    ///
    /// * `session` - The request's session.
    /// * `auth` - The request's authentication status.
    pub async fn new(session: &Session, auth: AuthStatus) -> Self {
        let csrf_token = if auth.is_authenticated() {
            session.csrf_token().await
        } else {
            session.existing_csrf_token().await.unwrap_or_default()
        };

        Self {
            current_year: Utc::now().year(),
            flash: session.pop_flash().await,
            is_authenticated: auth.is_authenticated(),
            csrf_token,
            ..Default::default()
        }
    }

    /// Like [`TemplateData::new`], for a page that renders `form`.
    ///
    /// Always makes sure the session has a CSRF token for the form to echo.
    pub async fn for_form(session: &Session, auth: AuthStatus, form: PageForm) -> Self {
        let mut data = Self::new(session, auth).await;
        data.csrf_token = session.csrf_token().await;
        data.form = Some(form);
        data
    }
}

/// A page renderer.
pub type PageFn = fn(&TemplateData, &TemplateFuncs) -> Markup;

/// Named pages, registered once at startup and shared read-only.
pub struct TemplateCache {
    pages: HashMap<&'static str, PageFn>,
    funcs: TemplateFuncs,
}

impl TemplateCache {
    pub fn new() -> Self {
        let mut cache: HashMap<&'static str, PageFn> = HashMap::new();
        cache.insert("home", pages::home);
        cache.insert("view", pages::view);
        cache.insert("create", pages::create);
        cache.insert("signup", pages::signup);
        cache.insert("login", pages::login);
        cache.insert("account", pages::account);
        cache.insert("password", pages::password);
        cache.insert("about", pages::about);

        tracing::info!("✅ Template cache built with {} pages", cache.len());

        Self {
            pages: cache,
            funcs: TemplateFuncs::new(),
        }
    }

    /// Renders the page called `name` with `status`.
    ///
    /// The whole page is rendered to a string before the response exists.
    ///
    /// # Returns
    ///
    /// The response, or `AppError::Internal` if no page has that name.
    pub fn render(&self, status: StatusCode, name: &str, data: &TemplateData) -> Result<Response> {
        let page = self
            .pages
            .get(name)
            .ok_or_else(|| AppError::Internal(format!("the template {} does not exist", name)))?;

        let body = page(data, &self.funcs).into_string();
        Ok((status, Html(body)).into_response())
    }
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use http_body_util::BodyExt;

    async fn body_of(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn snippet(id: i64, title: &str) -> Snippet {
        let created = Utc::now();
        Snippet {
            id,
            title: title.to_string(),
            content: "An old silent pond...".to_string(),
            created,
            expires: created + Duration::days(7),
        }
    }

    #[tokio::test]
    async fn anonymous_form_less_pages_leave_the_session_alone() {
        let session = Session::new(chrono::Duration::hours(12));

        let data = TemplateData::new(&session, AuthStatus::default()).await;
        assert!(data.csrf_token.is_empty());
        assert!(session.existing_csrf_token().await.is_none());

        let data = TemplateData::for_form(
            &session,
            AuthStatus::default(),
            PageForm::Login(UserLoginForm::default()),
        )
        .await;
        assert!(!data.csrf_token.is_empty());
        assert_eq!(session.existing_csrf_token().await, Some(data.csrf_token));
    }

    #[tokio::test]
    async fn logged_in_pages_always_get_a_token() {
        let session = Session::new(chrono::Duration::hours(12));
        let data = TemplateData::new(&session, AuthStatus { user_id: Some(1) }).await;
        assert!(!data.csrf_token.is_empty());
    }

    #[tokio::test]
    async fn unknown_page_is_an_error() {
        let cache = TemplateCache::new();
        let Err(err) = cache.render(StatusCode::OK, "missing", &TemplateData::default()) else {
            panic!("rendering an unknown page must fail");
        };
        assert_eq!(err.to_string(), "Internal server error: the template missing does not exist");
    }

    #[tokio::test]
    async fn home_lists_snippets_or_says_nothing_yet() {
        let cache = TemplateCache::new();

        let empty = cache.render(StatusCode::OK, "home", &TemplateData::default()).unwrap();
        assert!(body_of(empty).await.contains("There's nothing to see here... yet!"));

        let data = TemplateData {
            snippets: vec![snippet(2, "Over the wintry forest"), snippet(1, "An old silent pond")],
            ..Default::default()
        };
        let body = body_of(cache.render(StatusCode::OK, "home", &data).unwrap()).await;
        assert!(body.contains("Over the wintry forest"));
        assert!(body.contains("href=\"/snippet/view/2\""));
        assert!(!body.contains("nothing to see here"));
    }

    #[tokio::test]
    async fn snippet_content_is_escaped() {
        let cache = TemplateCache::new();
        let data = TemplateData {
            snippet: Some(snippet(5, "<script>alert(1)</script>")),
            ..Default::default()
        };
        let body = body_of(cache.render(StatusCode::OK, "view", &data).unwrap()).await;
        assert!(body.contains("&lt;script&gt;"));
        assert!(!body.contains("<script>alert"));
    }

    #[tokio::test]
    async fn nav_follows_authentication() {
        let cache = TemplateCache::new();

        let anonymous = TemplateData::default();
        let body = body_of(cache.render(StatusCode::OK, "about", &anonymous).unwrap()).await;
        assert!(body.contains("href=\"/user/login\""));
        assert!(!body.contains("action=\"/user/logout\""));

        let signed_in = TemplateData {
            is_authenticated: true,
            csrf_token: "tok".to_string(),
            flash: Some("Welcome".to_string()),
            ..Default::default()
        };
        let body = body_of(cache.render(StatusCode::OK, "about", &signed_in).unwrap()).await;
        assert!(body.contains("action=\"/user/logout\""));
        assert!(body.contains("name=\"csrf_token\" value=\"tok\""));
        assert!(body.contains("Welcome"));
    }

    #[tokio::test]
    async fn form_errors_are_shown() {
        let cache = TemplateCache::new();
        let mut form = SnippetCreateForm::default();
        form.validate();

        let data = TemplateData {
            form: Some(PageForm::SnippetCreate(form)),
            ..Default::default()
        };
        let response = cache
            .render(StatusCode::UNPROCESSABLE_ENTITY, "create", &data)
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_of(response).await;
        assert!(body.contains("This field cannot be blank"));
        assert!(body.contains("This field must equal 1, 7 or 365"));
    }
}
