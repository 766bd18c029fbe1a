//! Response composition.
//!
//! Every response the server produces, success or failure, passes through
//! [`compose`] so that status, body encoding, and the `Content-Type` header
//! are always derived the same way from the negotiated format parameters.

use axum::Json;
use axum::response::{IntoResponse, Response};
use http::header::CONTENT_TYPE;
use http::{HeaderValue, StatusCode};

use super::format::{FormatParameters, WireFormat};
use super::xml::render_xml;
use crate::resources::AnyResource;

/// Compose an HTTP response from an optional resource body.
///
/// With no resource the body is empty and only the status and content type
/// are set, which is how interactions that answer with headers alone (e.g. a
/// create returning just `Location`) respond. With a resource, the body is
/// minified JSON, pretty JSON, or XML per the format parameters. The status
/// defaults to `200 OK` when none is supplied. A body that fails to render
/// degrades to an empty `500`.
pub fn compose(
    resource: Option<&AnyResource>,
    status: Option<StatusCode>,
    format: &FormatParameters,
) -> Response {
    let mut response = match resource {
        None => status.unwrap_or(StatusCode::OK).into_response(),
        Some(resource) => match (format.format, format.pretty) {
            (WireFormat::Json, true) => match serde_json::to_string_pretty(resource) {
                Ok(body) => (status.unwrap_or(StatusCode::OK), body).into_response(),
                Err(err) => {
                    tracing::error!(error = %err, "failed to render response body");
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            },
            (WireFormat::Json, false) => match status {
                Some(status) => (status, Json(resource)).into_response(),
                None => Json(resource).into_response(),
            },
            (WireFormat::Xml, pretty) => match render_xml(resource, pretty) {
                Ok(body) => (status.unwrap_or(StatusCode::OK), body).into_response(),
                Err(err) => {
                    tracing::error!(error = %err, "failed to render response body");
                    return StatusCode::INTERNAL_SERVER_ERROR.into_response();
                }
            },
        },
    };
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(format.format.mime()));
    response
}
