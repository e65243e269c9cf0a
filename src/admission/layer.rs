//! Admission hosted as an axum middleware, evaluated before any page handler.
//! Only the `Cookie` header is consulted; the script-readable slot does not
//! exist at this layer.

use crate::admission::{admit, Admission, RouteTables};
use crate::session::cookie::token_from_cookie_header;
use axum::{
    extract::{Request, State},
    http::header::COOKIE,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::debug;
use url::form_urlencoded;

pub async fn admission_middleware(
    State(tables): State<Arc<RouteTables>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let return_url = request.uri().query().and_then(|query| {
        form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == "returnUrl")
            .map(|(_, value)| value.into_owned())
    });
    let has_edge_token = request
        .headers()
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(token_from_cookie_header)
        .is_some();

    match admit(&tables, &path, return_url.as_deref(), has_edge_token) {
        Admission::Allow => next.run(request).await,
        Admission::Redirect(target) => {
            debug!("redirecting {path} to {target}");
            Redirect::temporary(&target).into_response()
        }
    }
}
