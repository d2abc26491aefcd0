use std::any::Any;
use std::backtrace::Backtrace;

use axum::{
    http::{HeaderValue, StatusCode, header},
    response::Response,
};

use crate::error::error_page;
use crate::middleware_layer::headers::apply_security_headers;

fn panic_message(err: &(dyn Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Turns a panic caught by `CatchPanicLayer` into a 500 that closes the
/// connection and still carries the security headers.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    tracing::error!(panic = %panic_message(err.as_ref()), "❌ Recovered from panic in request handler");

    let mut response = error_page(StatusCode::INTERNAL_SERVER_ERROR);
    let headers = response.headers_mut();
    apply_security_headers(headers);
    headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
    response
}

/// Logs every panic with its location and a backtrace taken at the panic site.
///
/// `handle_panic` runs after unwinding, when the backtrace is already gone.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let backtrace = Backtrace::force_capture();
        tracing::error!("panic: {}\n{}", info, backtrace);
    }));
}
