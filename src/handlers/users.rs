use axum::{
    extract::{State, rejection::FormRejection},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};

use crate::{
    error::{AppError, Result},
    middleware_layer::{auth::AuthStatus, session::Session},
    render::templates::{PageForm, TemplateData},
    services::users as user_service,
    state::AppState,
    validation::forms::{PasswordChangeForm, UserLoginForm, UserSignupForm},
};

/// Where a fresh login lands when no other page was requested.
const DEFAULT_LOGIN_REDIRECT: &str = "/snippet/create";

/// Whether `url` is a path on this site rather than a link elsewhere.
fn is_local_path(url: &str) -> bool {
    url.starts_with('/') && !url.starts_with("//") && !url.starts_with("/\\")
}

fn form_error(e: FormRejection) -> AppError {
    AppError::BadRequest(e.body_text())
}

pub async fn signup(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
) -> Result<Response> {
    let data = TemplateData::for_form(
        &session,
        auth,
        PageForm::Signup(UserSignupForm::default()),
    )
    .await;
    state.templates.render(StatusCode::OK, "signup", &data)
}

/// Registers a new user.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `session` - The request's session.
/// * `auth` - The request's authentication status.
/// * `form` - The submitted signup form.
///
/// # Returns
///
/// A redirect to the login page, or the signup page again with errors.
pub async fn signup_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
    form: std::result::Result<Form<UserSignupForm>, FormRejection>,
) -> Result<Response> {
    let Form(mut form) = form.map_err(form_error)?;
    tracing::info!("📝 Signup attempt: {}", form.email);

    if form.validate() {
        match user_service::create_user(
            state.users.as_ref(),
            &form.name,
            &form.email,
            &form.password,
        )
        .await
        {
            Ok(()) => {
                session
                    .put_flash("Your signup was successful. Please log in.")
                    .await;
                return Ok(Redirect::to("/user/login").into_response());
            }
            Err(AppError::DuplicateEmail) => {
                form.validator
                    .add_field_error("email", "Email address is already in use");
            }
            Err(e) => return Err(e),
        }
    }

    let data = TemplateData::for_form(&session, auth, PageForm::Signup(form)).await;
    state
        .templates
        .render(StatusCode::UNPROCESSABLE_ENTITY, "signup", &data)
}

pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
) -> Result<Response> {
    let data = TemplateData::for_form(
        &session,
        auth,
        PageForm::Login(UserLoginForm::default()),
    )
    .await;
    state.templates.render(StatusCode::OK, "login", &data)
}

/// Logs a user in.
///
/// The session token is renewed before the user ID is stored in it. The user
/// is sent back to the page that asked them to log in, if any.
pub async fn login_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
    form: std::result::Result<Form<UserLoginForm>, FormRejection>,
) -> Result<Response> {
    let Form(mut form) = form.map_err(form_error)?;
    tracing::info!("🔐 Login attempt: {}", form.email);

    if form.validate() {
        match user_service::authenticate(state.users.as_ref(), &form.email, &form.password).await {
            Ok(id) => {
                session.renew().await;
                session.set_user_id(id).await;
                tracing::info!("✅ Login successful for user: {}", id);

                let target = session
                    .pop_post_login_redirect()
                    .await
                    .filter(|url| is_local_path(url))
                    .unwrap_or_else(|| DEFAULT_LOGIN_REDIRECT.to_string());
                return Ok(Redirect::to(&target).into_response());
            }
            Err(AppError::InvalidCredentials) => {
                tracing::warn!("❌ Login failed for: {}", form.email);
                form.validator
                    .add_non_field_error("Email or password is incorrect");
            }
            Err(e) => return Err(e),
        }
    }

    let data = TemplateData::for_form(&session, auth, PageForm::Login(form)).await;
    state
        .templates
        .render(StatusCode::UNPROCESSABLE_ENTITY, "login", &data)
}

pub async fn logout_post(Extension(session): Extension<Session>) -> Response {
    session.renew().await;
    session.remove_user_id().await;
    session.put_flash("You've been logged out successfully").await;

    Redirect::to("/").into_response()
}

/// Shows the logged-in user's details.
pub async fn account_view(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
) -> Result<Response> {
    let Some(id) = auth.user_id else {
        return Ok(Redirect::to("/user/login").into_response());
    };

    let user = match user_service::get_user(state.users.as_ref(), id).await {
        Ok(user) => user,
        Err(AppError::NoRecord) => return Ok(Redirect::to("/user/login").into_response()),
        Err(e) => return Err(e),
    };

    let mut data = TemplateData::new(&session, auth).await;
    data.user = Some(user);

    state.templates.render(StatusCode::OK, "account", &data)
}

pub async fn password_update(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
) -> Result<Response> {
    let data = TemplateData::for_form(
        &session,
        auth,
        PageForm::PasswordChange(PasswordChangeForm::default()),
    )
    .await;
    state.templates.render(StatusCode::OK, "password", &data)
}

/// Changes the logged-in user's password.
pub async fn password_update_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(auth): Extension<AuthStatus>,
    form: std::result::Result<Form<PasswordChangeForm>, FormRejection>,
) -> Result<Response> {
    let Form(mut form) = form.map_err(form_error)?;
    let Some(id) = auth.user_id else {
        return Ok(Redirect::to("/user/login").into_response());
    };

    if form.validate() {
        match user_service::change_password(
            state.users.as_ref(),
            id,
            &form.current_password,
            &form.new_password,
        )
        .await
        {
            Ok(()) => {
                session.put_flash("Password successfully updated").await;
                return Ok(Redirect::to("/account/view").into_response());
            }
            Err(AppError::InvalidCredentials) => {
                form.validator
                    .add_field_error("current_password", "Current password is incorrect");
            }
            Err(e) => return Err(e),
        }
    }

    let data = TemplateData::for_form(&session, auth, PageForm::PasswordChange(form)).await;
    state
        .templates
        .render(StatusCode::UNPROCESSABLE_ENTITY, "password", &data)
}
