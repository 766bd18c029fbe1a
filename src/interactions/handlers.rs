//! Request handlers bridging the HTTP transport to interaction callbacks.
//!
//! Every mounted route runs the same pipeline: guards, then strict format
//! negotiation, then kind-specific parsing, then the callback. Any failure
//! along the way funnels through one error boundary that renders an
//! `OperationOutcome` at the error's status, negotiated leniently so that a
//! bad `_format` value cannot make the error itself unrenderable.

use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use http::header::LOCATION;
use http::{HeaderMap, HeaderValue, Method, StatusCode, Uri};
use tracing::{error, instrument, warn};

use super::callback::{InteractionCallback, InteractionContext, SearchArguments, Stored};
use super::error::FhirError;
use super::registry::InteractionDescriptor;
use crate::resources::{AnyResource, IssueSeverity};
use crate::wire::{FormatParameters, NegotiationMode, compose};

#[instrument(skip_all, fields(resource_type = %descriptor.resource_type()))]
pub(crate) async fn create(
    descriptor: Arc<InteractionDescriptor>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let context = InteractionContext { method, uri, headers };
    let query = match query_pairs(context.uri.query()) {
        Ok(query) => query,
        Err(err) => return error_response(&context, &[], &err),
    };
    match create_inner(&descriptor, &context, &query, &body).await {
        Ok(response) => response,
        Err(err) => error_response(&context, &query, &err),
    }
}

async fn create_inner(
    descriptor: &InteractionDescriptor,
    context: &InteractionContext,
    query: &[(String, String)],
    body: &Bytes,
) -> Result<Response, FhirError> {
    let format = preflight(descriptor, context, query).await?;
    let resource = parse_body(body)?;
    let InteractionCallback::Create(callback) = descriptor.callback() else {
        return Err(mismatched_callback());
    };
    let stored = callback(context.clone(), resource).await?;

    let mut response = compose(stored.resource(), Some(StatusCode::CREATED), &format);
    set_location(&mut response, descriptor.resource_type(), &stored);
    Ok(response)
}

#[instrument(skip_all, fields(resource_type = %descriptor.resource_type(), id = %id))]
pub(crate) async fn read(
    descriptor: Arc<InteractionDescriptor>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    id: String,
) -> Response {
    let context = InteractionContext { method, uri, headers };
    let query = match query_pairs(context.uri.query()) {
        Ok(query) => query,
        Err(err) => return error_response(&context, &[], &err),
    };
    match read_inner(&descriptor, &context, &query, id).await {
        Ok(response) => response,
        Err(err) => error_response(&context, &query, &err),
    }
}

async fn read_inner(
    descriptor: &InteractionDescriptor,
    context: &InteractionContext,
    query: &[(String, String)],
    id: String,
) -> Result<Response, FhirError> {
    let format = preflight(descriptor, context, query).await?;
    let InteractionCallback::Read(callback) = descriptor.callback() else {
        return Err(mismatched_callback());
    };
    let resource = callback(context.clone(), id).await?;
    Ok(compose(Some(&resource), None, &format))
}

/// Handles both search routes; filters come from the query string on `GET`
/// and from the form-encoded body on `POST /{type}/_search`.
#[instrument(skip_all, fields(resource_type = %descriptor.resource_type()))]
pub(crate) async fn search(
    descriptor: Arc<InteractionDescriptor>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let context = InteractionContext { method, uri, headers };
    let query = match query_pairs(context.uri.query()) {
        Ok(query) => query,
        Err(err) => return error_response(&context, &[], &err),
    };
    match search_inner(&descriptor, &context, &query, &body).await {
        Ok(response) => response,
        Err(err) => error_response(&context, &query, &err),
    }
}

async fn search_inner(
    descriptor: &InteractionDescriptor,
    context: &InteractionContext,
    query: &[(String, String)],
    body: &Bytes,
) -> Result<Response, FhirError> {
    let format = preflight(descriptor, context, query).await?;
    let filters = if context.method == Method::POST {
        form_pairs(body)?
    } else {
        query.to_vec()
    };
    let arguments = SearchArguments::new(declared_filters(descriptor.search_parameters(), filters));
    let InteractionCallback::SearchType(callback) = descriptor.callback() else {
        return Err(mismatched_callback());
    };
    let bundle = callback(context.clone(), arguments).await?;
    let body = AnyResource::from_typed(&bundle)?;
    Ok(compose(Some(&body), None, &format))
}

#[instrument(skip_all, fields(resource_type = %descriptor.resource_type(), id = %id))]
pub(crate) async fn update(
    descriptor: Arc<InteractionDescriptor>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    id: String,
    body: Bytes,
) -> Response {
    let context = InteractionContext { method, uri, headers };
    let query = match query_pairs(context.uri.query()) {
        Ok(query) => query,
        Err(err) => return error_response(&context, &[], &err),
    };
    match update_inner(&descriptor, &context, &query, id, &body).await {
        Ok(response) => response,
        Err(err) => error_response(&context, &query, &err),
    }
}

async fn update_inner(
    descriptor: &InteractionDescriptor,
    context: &InteractionContext,
    query: &[(String, String)],
    id: String,
    body: &Bytes,
) -> Result<Response, FhirError> {
    let format = preflight(descriptor, context, query).await?;
    let resource = parse_body(body)?;
    let InteractionCallback::Update(callback) = descriptor.callback() else {
        return Err(mismatched_callback());
    };
    let stored = callback(context.clone(), id, resource).await?;
    Ok(compose(stored.resource(), None, &format))
}

/// Render a handled failure in the leniently negotiated format.
pub(crate) fn error_response(
    context: &InteractionContext,
    query: &[(String, String)],
    err: &FhirError,
) -> Response {
    warn!(status = err.status().as_u16(), error = %err, "interaction rejected");
    let format = FormatParameters::resolve(
        &context.method,
        &context.headers,
        query,
        NegotiationMode::Lenient,
    )
    .unwrap_or_default();
    let outcome = err.to_outcome();
    match AnyResource::from_typed(&outcome) {
        Ok(body) => compose(Some(&body), Some(err.status()), &format),
        Err(render_err) => {
            error!(error = %render_err, "failed to build error payload");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub(crate) fn query_pairs(query: Option<&str>) -> Result<Vec<(String, String)>, FhirError> {
    match query {
        None => Ok(Vec::new()),
        Some(raw) => serde_urlencoded::from_str(raw)
            .map_err(|err| FhirError::malformed(format!("invalid query string: {err}"))),
    }
}

/// Guards, then strict format negotiation. Runs before any request parsing.
async fn preflight(
    descriptor: &InteractionDescriptor,
    context: &InteractionContext,
    query: &[(String, String)],
) -> Result<FormatParameters, FhirError> {
    for guard in descriptor.guards() {
        guard.check(context).await?;
    }
    let format = FormatParameters::resolve(
        &context.method,
        &context.headers,
        query,
        NegotiationMode::Strict,
    )?;
    Ok(format)
}

fn parse_body(body: &Bytes) -> Result<AnyResource, FhirError> {
    let value = serde_json::from_slice(body)
        .map_err(|err| FhirError::malformed(format!("invalid request body: {err}")))?;
    AnyResource::from_value(value).map_err(FhirError::from)
}

fn form_pairs(body: &Bytes) -> Result<Vec<(String, String)>, FhirError> {
    if body.is_empty() {
        return Ok(Vec::new());
    }
    serde_urlencoded::from_bytes(body)
        .map_err(|err| FhirError::malformed(format!("invalid form body: {err}")))
}

/// Drop the reserved output parameters and anything the registration did
/// not declare, preserving request order for what remains.
fn declared_filters(declared: &[String], pairs: Vec<(String, String)>) -> Vec<(String, String)> {
    pairs
        .into_iter()
        .filter(|(name, _)| {
            name != "_format"
                && name != "_pretty"
                && declared.iter().any(|declared_name| declared_name == name)
        })
        .collect()
}

fn set_location(response: &mut Response, resource_type: &str, stored: &Stored<AnyResource>) {
    let Some(id) = stored.id() else {
        return;
    };
    if let Ok(location) = HeaderValue::from_str(&format!("/{resource_type}/{id}")) {
        response.headers_mut().insert(LOCATION, location);
    }
}

fn mismatched_callback() -> FhirError {
    FhirError::general(
        StatusCode::INTERNAL_SERVER_ERROR,
        IssueSeverity::Fatal,
        "exception",
        "interaction callback does not match its registration",
    )
}
