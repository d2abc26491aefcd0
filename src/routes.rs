use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use tower_cookies::CookieManagerLayer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    handlers::{pages, snippets, users},
    middleware_layer::{
        auth::{authenticate, require_auth},
        csrf::verify_csrf,
        headers::secure_headers,
        logging::log_request,
        recover::handle_panic,
        session::load_and_save,
    },
    state::AppState,
};

/// Builds the application's router.
///
/// Pages get the session, CSRF and authentication layers; account pages also
/// require a logged-in user. `/ping` and `/static` only get the standard
/// layers.
pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/snippet/create",
            get(snippets::snippet_create).post(snippets::snippet_create_post),
        )
        .route("/user/logout", post(users::logout_post))
        .route("/account/view", get(users::account_view))
        .route(
            "/account/password/update",
            get(users::password_update).post(users::password_update_post),
        )
        .route_layer(from_fn(require_auth));

    let dynamic_routes = Router::new()
        .route("/", get(pages::home))
        .route("/about", get(pages::about))
        .route("/snippet/view/{id}", get(snippets::snippet_view))
        .route("/user/signup", get(users::signup).post(users::signup_post))
        .route("/user/login", get(users::login).post(users::login_post))
        .merge(protected_routes)
        .route_layer(from_fn_with_state(state.clone(), authenticate))
        .route_layer(from_fn(verify_csrf))
        .route_layer(from_fn_with_state(state.clone(), load_and_save))
        .with_state(state.clone());

    let app = Router::new()
        .route("/ping", get(pages::ping))
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .merge(dynamic_routes)
        .fallback(pages::not_found);

    with_standard_middleware(app)
}

/// Wraps `router` in the layers every response passes through.
///
/// Outermost first: panic recovery, tracing, request logging, security
/// headers, cookies.
pub fn with_standard_middleware(router: Router) -> Router {
    router
        .layer(CookieManagerLayer::new())
        .layer(from_fn(secure_headers))
        .layer(from_fn(log_request))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false))
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
        .layer(CatchPanicLayer::custom(handle_panic))
}
