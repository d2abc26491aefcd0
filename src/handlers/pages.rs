use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    Extension,
};

use crate::{
    error::{AppError, Result},
    middleware_layer::{auth::AuthStatus, session::Session},
    render::templates::TemplateData,
    state::AppState,
};

/// Shows the latest snippets.
pub async fn home(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
) -> Result<Response> {
    let snippets = state.snippets.latest().await?;

    let mut data = TemplateData::new(&session, auth).await;
    data.snippets = snippets;

    state.templates.render(StatusCode::OK, "home", &data)
}

pub async fn about(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
) -> Result<Response> {
    let data = TemplateData::new(&session, auth).await;
    state.templates.render(StatusCode::OK, "about", &data)
}

/// Liveness check.
pub async fn ping() -> &'static str {
    "OK"
}

pub async fn not_found() -> AppError {
    AppError::NotFound
}
