use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tower_cookies::cookie::SameSite;
use tower_cookies::cookie::time::Duration;
use tower_cookies::{Cookie, Cookies};

use crate::{
    crypto::token::generate_token,
    error::Result,
    models::session::SessionData,
    state::AppState,
};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Unmodified,
    Modified,
}

#[derive(Debug)]
struct SessionInner {
    token: Option<String>,
    /// A persisted token replaced by `renew`, to be deleted on commit.
    stale_token: Option<String>,
    data: SessionData,
    expiry: DateTime<Utc>,
    lifetime: chrono::Duration,
    status: Status,
}

/// What the load/save middleware must persist once the handler has run.
#[derive(Debug)]
struct PendingCommit {
    token: String,
    stale_token: Option<String>,
    data: SessionData,
    expiry: DateTime<Utc>,
}

/// The request's session, shared between the middleware and the handler.
///
/// Inserted into request extensions by [`load_and_save`]; handlers take it
/// with `Extension<Session>`.
#[derive(Clone, Debug)]
pub struct Session {
    inner: Arc<Mutex<SessionInner>>,
}

impl Session {
    /// A session with no token yet. Nothing is stored unless it is modified.
    pub fn new(lifetime: chrono::Duration) -> Self {
        Self::build(None, SessionData::default(), Utc::now() + lifetime, lifetime)
    }

    /// A session read back from the store.
    pub fn load(
        token: String,
        data: SessionData,
        expiry: DateTime<Utc>,
        lifetime: chrono::Duration,
    ) -> Self {
        Self::build(Some(token), data, expiry, lifetime)
    }

    fn build(
        token: Option<String>,
        data: SessionData,
        expiry: DateTime<Utc>,
        lifetime: chrono::Duration,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionInner {
                token,
                stale_token: None,
                data,
                expiry,
                lifetime,
                status: Status::Unmodified,
            })),
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.inner.lock().await.token.clone()
    }

    pub async fn user_id(&self) -> Option<i64> {
        self.inner.lock().await.data.authenticated_user_id
    }

    pub async fn set_user_id(&self, id: i64) {
        let mut inner = self.inner.lock().await;
        inner.data.authenticated_user_id = Some(id);
        inner.status = Status::Modified;
    }

    pub async fn remove_user_id(&self) {
        let mut inner = self.inner.lock().await;
        if inner.data.authenticated_user_id.take().is_some() {
            inner.status = Status::Modified;
        }
    }

    pub async fn put_flash(&self, message: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        inner.data.flash = Some(message.into());
        inner.status = Status::Modified;
    }

    /// Returns the flash message and clears it, so it is shown only once.
    pub async fn pop_flash(&self) -> Option<String> {
        let mut inner = self.inner.lock().await;
        let flash = inner.data.flash.take();
        if flash.is_some() {
            inner.status = Status::Modified;
        }
        flash
    }

    pub async fn put_post_login_redirect(&self, url: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        inner.data.post_login_redirect_url = Some(url.into());
        inner.status = Status::Modified;
    }

    pub async fn pop_post_login_redirect(&self) -> Option<String> {
        let mut inner = self.inner.lock().await;
        let url = inner.data.post_login_redirect_url.take();
        if url.is_some() {
            inner.status = Status::Modified;
        }
        url
    }

    /// The session's CSRF token, created on first use.
    pub async fn csrf_token(&self) -> String {
        let mut inner = self.inner.lock().await;
        if let Some(token) = &inner.data.csrf_token {
            return token.clone();
        }
        let token = generate_token();
        inner.data.csrf_token = Some(token.clone());
        inner.status = Status::Modified;
        token
    }

    /// The CSRF token if one has been issued, without creating one.
    pub async fn existing_csrf_token(&self) -> Option<String> {
        self.inner.lock().await.data.csrf_token.clone()
    }

    /// Rotates the session token and the CSRF token, keeping the data.
    ///
    /// Called on every privilege change (login, logout).
    pub async fn renew(&self) {
        let mut inner = self.inner.lock().await;
        if let Some(old) = inner.token.take() {
            if inner.stale_token.is_none() {
                inner.stale_token = Some(old);
            }
        }
        inner.data.csrf_token = None;
        inner.expiry = Utc::now() + inner.lifetime;
        inner.status = Status::Modified;
    }

    async fn pending_commit(&self) -> Option<PendingCommit> {
        let mut inner = self.inner.lock().await;
        if inner.status != Status::Modified {
            return None;
        }

        let token = match &inner.token {
            Some(token) => token.clone(),
            None => {
                let token = generate_token();
                inner.token = Some(token.clone());
                token
            }
        };
        inner.status = Status::Unmodified;

        Some(PendingCommit {
            token,
            stale_token: inner.stale_token.take(),
            data: inner.data.clone(),
            expiry: inner.expiry,
        })
    }
}

/// Creates the session cookie for `token`.
fn session_cookie(token: String, expiry: DateTime<Utc>, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, token);

    cookie.set_http_only(true);
    cookie.set_secure(secure);
    cookie.set_same_site(SameSite::Lax);
    let duration_secs = (expiry - Utc::now()).num_seconds().max(0);
    cookie.set_max_age(Duration::seconds(duration_secs));
    cookie.set_path("/");

    cookie
}

async fn load_session(state: &AppState, cookies: &Cookies) -> Result<Session> {
    let lifetime = state.config.session_lifetime();

    let Some(token) = cookies.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
        return Ok(Session::new(lifetime));
    };

    let Some(stored) = state.sessions.find(&token).await? else {
        tracing::debug!("Session cookie refers to no live session");
        return Ok(Session::new(lifetime));
    };

    match SessionData::decode(&stored.data) {
        Ok(data) => Ok(Session::load(token, data, stored.expiry, lifetime)),
        Err(e) => {
            tracing::warn!("❌ Discarding undecodable session: {}", e);
            Ok(Session::new(lifetime))
        }
    }
}

async fn commit_session(state: &AppState, cookies: &Cookies, session: &Session) -> Result<()> {
    let Some(pending) = session.pending_commit().await else {
        return Ok(());
    };

    if let Some(stale) = &pending.stale_token {
        state.sessions.delete(stale).await?;
    }

    let bytes = pending.data.encode()?;
    state
        .sessions
        .commit(&pending.token, &bytes, pending.expiry)
        .await?;

    cookies.add(session_cookie(
        pending.token,
        pending.expiry,
        state.config.secure_cookies,
    ));
    Ok(())
}

/// Loads the session before the inner chain runs and persists it afterwards.
///
/// The commit happens exactly once per request, whichever handler ran.
pub async fn load_and_save(
    State(state): State<AppState>,
    cookies: Cookies,
    mut request: Request,
    next: Next,
) -> Response {
    let session = match load_session(&state, &cookies).await {
        Ok(session) => session,
        Err(e) => return e.into_response(),
    };

    request.extensions_mut().insert(session.clone());
    let response = next.run(request).await;

    match commit_session(&state, &cookies, &session).await {
        Ok(()) => response,
        Err(e) => {
            tracing::error!("❌ Failed to save session: {}", e);
            e.into_response()
        }
    }
}
