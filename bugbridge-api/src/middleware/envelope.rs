/// Path stamping for response envelopes
///
/// Envelopes are rendered where the handler or error returns, before the
/// request path is known to them. This middleware runs around every route,
/// looks for the [`PendingEnvelope`] extension and rewrites the body with
/// `path` set to the request path.

use crate::error::ApiError;
use crate::response::PendingEnvelope;
use axum::{
    body::Body,
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

pub async fn stamp_request_path(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();
    let response = next.run(request).await;

    // The router answers a known path with the wrong method by itself
    if response.status() == StatusCode::METHOD_NOT_ALLOWED
        && response.extensions().get::<PendingEnvelope>().is_none()
    {
        let allow = response.headers().get(header::ALLOW).cloned();
        let mut enveloped = ApiError::MethodNotAllowed("Method not allowed".to_string()).into_response();
        if let Some(allow) = allow {
            enveloped.headers_mut().insert(header::ALLOW, allow);
        }
        return with_path(enveloped, path);
    }

    with_path(response, path)
}

fn with_path(mut response: Response, path: String) -> Response {
    let Some(PendingEnvelope(mut envelope)) = response.extensions_mut().remove::<PendingEnvelope>()
    else {
        return response;
    };

    envelope["path"] = serde_json::Value::String(path);

    match serde_json::to_vec(&envelope) {
        Ok(bytes) => {
            let (mut parts, _) = response.into_parts();
            parts.headers.remove(header::CONTENT_LENGTH);
            Response::from_parts(parts, Body::from(bytes))
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to re-serialize response envelope");
            response
        }
    }
}
