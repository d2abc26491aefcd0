use axum::{
    extract::{Path, State, rejection::FormRejection},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};

use crate::{
    error::{AppError, Result},
    middleware_layer::{auth::AuthStatus, session::Session},
    render::templates::{PageForm, TemplateData},
    state::AppState,
    validation::forms::SnippetCreateForm,
};

/// Parses a snippet ID from the path. Only positive integers name a snippet.
fn parse_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok().filter(|id| *id >= 1)
}

/// Shows a single snippet.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `session` - The request's session.
/// * `auth` - The request's authentication status.
/// * `raw_id` - The `{id}` path segment.
///
/// # Returns
///
/// The rendered page, or `AppError::NotFound` for a bad or unknown ID.
pub async fn snippet_view(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
    Path(raw_id): Path<String>,
) -> Result<Response> {
    let id = parse_id(&raw_id).ok_or(AppError::NotFound)?;

    let snippet = match state.snippets.get(id).await {
        Ok(snippet) => snippet,
        Err(AppError::NoRecord) => return Err(AppError::NotFound),
        Err(e) => return Err(e),
    };

    let mut data = TemplateData::new(&session, auth).await;
    data.snippet = Some(snippet);

    state.templates.render(StatusCode::OK, "view", &data)
}

pub async fn snippet_create(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
) -> Result<Response> {
    let data = TemplateData::for_form(
        &session,
        auth,
        PageForm::SnippetCreate(SnippetCreateForm::blank()),
    )
    .await;

    state.templates.render(StatusCode::OK, "create", &data)
}

/// Creates a snippet from the submitted form.
pub async fn snippet_create_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
    form: std::result::Result<Form<SnippetCreateForm>, FormRejection>,
) -> Result<Response> {
    let Form(mut form) = form.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if !form.validate() {
        let data = TemplateData::for_form(&session, auth, PageForm::SnippetCreate(form)).await;
        return state
            .templates
            .render(StatusCode::UNPROCESSABLE_ENTITY, "create", &data);
    }

    let id = state
        .snippets
        .insert(&form.title, &form.content, form.expires)
        .await?;
    tracing::info!("✅ Snippet created: {}", id);

    session.put_flash("Snippet successfully created!").await;

    Ok(Redirect::to(&format!("/snippet/view/{}", id)).into_response())
}
