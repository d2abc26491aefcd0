use axum::{
    extract::{Request, State},
    http::{HeaderValue, Method, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Extension,
};

use crate::{error::AppError, middleware_layer::session::Session, state::AppState};

/// Who, if anyone, is logged in for the current request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AuthStatus {
    pub user_id: Option<i64>,
}

impl AuthStatus {
    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

/// A middleware that tags the request with an [`AuthStatus`].
///
/// A session pointing at a user that no longer exists counts as logged out.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `session` - The request's session.
/// * `request` - The incoming request.
/// * `next` - The next middleware in the chain.
pub async fn authenticate(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let mut user_id = session.user_id().await;

    if let Some(id) = user_id {
        if !state.users.exists(id).await? {
            tracing::warn!("❌ Session refers to missing user: {}", id);
            user_id = None;
        }
    }

    request.extensions_mut().insert(AuthStatus { user_id });

    Ok(next.run(request).await)
}

/// A middleware that sends anonymous users to the login page.
///
/// For GET requests the requested path is remembered so that login can
/// return the user to it. Authenticated responses are marked `no-store`.
pub async fn require_auth(
    Extension(auth): Extension<AuthStatus>,
    Extension(session): Extension<Session>,
    request: Request,
    next: Next,
) -> Response {
    if !auth.is_authenticated() {
        tracing::debug!("🔐 Anonymous request to {}", request.uri().path());

        if request.method() == Method::GET {
            let target = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| request.uri().path().to_string());
            session.put_post_login_redirect(target).await;
        }

        return Redirect::to("/user/login").into_response();
    }

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
