use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Request},
    http::{HeaderMap, Method, header},
    middleware::Next,
    response::{IntoResponse, Response},
    Extension, Form,
};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use crate::{error::AppError, middleware_layer::session::Session};

/// Header accepted as an alternative to the form field.
pub const CSRF_HEADER: &str = "x-csrf-token";

/// Largest request body buffered while looking for the token.
const MAX_FORM_BYTES: usize = 1024 * 1024;

#[derive(Deserialize)]
struct CsrfField {
    #[serde(default)]
    csrf_token: String,
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

fn header_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CSRF_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

async fn form_token(headers: &HeaderMap, body: &Bytes) -> Option<String> {
    let mut probe = Request::new(Body::from(body.clone()));
    *probe.method_mut() = Method::POST;
    if let Some(content_type) = headers.get(header::CONTENT_TYPE) {
        probe
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type.clone());
    }

    let Form(field) = Form::<CsrfField>::from_request(probe, &()).await.ok()?;
    (!field.csrf_token.is_empty()).then_some(field.csrf_token)
}

fn tokens_match(expected: &str, submitted: &str) -> bool {
    expected.as_bytes().ct_eq(submitted.as_bytes()).into()
}

/// A middleware that verifies the CSRF token on state-changing requests.
///
/// The token comes from the `x-csrf-token` header or the `csrf_token` form
/// field and must equal the one stored in the session. Anything else ends
/// the request with 400.
pub async fn verify_csrf(
    Extension(session): Extension<Session>,
    request: Request,
    next: Next,
) -> Response {
    if is_safe(request.method()) {
        return next.run(request).await;
    }

    let (parts, body) = request.into_parts();
    let body_bytes = match axum::body::to_bytes(body, MAX_FORM_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return AppError::BadRequest(format!("unreadable body: {}", e)).into_response();
        }
    };

    let submitted = match header_token(&parts.headers) {
        Some(token) => Some(token),
        None => form_token(&parts.headers, &body_bytes).await,
    };

    let valid = match (session.existing_csrf_token().await, submitted) {
        (Some(expected), Some(submitted)) => tokens_match(&expected, &submitted),
        _ => false,
    };

    if !valid {
        tracing::warn!("❌ CSRF: token missing or mismatched on {} {}", parts.method, parts.uri);
        return AppError::BadRequest("CSRF token missing or invalid".to_string()).into_response();
    }

    next.run(Request::from_parts(parts, Body::from(body_bytes))).await
}
