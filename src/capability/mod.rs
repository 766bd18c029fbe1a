//! Capability statement generation.
//!
//! A server advertises what it supports through a `CapabilityStatement`
//! resource served at `GET /metadata`. The statement is assembled once at
//! server construction from the interaction registry and the configuration,
//! then flows through the same negotiation and rendering path as any other
//! resource.

mod params;

use std::sync::Arc;

use axum::http::{HeaderMap, Method, Uri};
use axum::response::Response;
use serde_json::{Map, Value, json};

use crate::core::{Config, Error, Result};
use crate::interactions::handlers;
use crate::interactions::{InteractionContext, InteractionKind, InteractionRegistry};
use crate::resources::AnyResource;
use crate::wire::{FormatParameters, NegotiationMode, compose};

/// FHIR release the server advertises.
pub const FHIR_VERSION: &str = "4.3.0";

/// Build the capability statement document.
///
/// `id` and `date` identify one server instance: the id is minted once at
/// construction and the date is the construction instant. Resource entries
/// are ordered by type name, interactions in canonical kind order, and
/// `searchParam` lists declared, advertised parameters in declaration order.
pub fn capability_statement(
    registry: &InteractionRegistry,
    config: &Config,
    id: &str,
    date: &str,
) -> Value {
    let mut statement = Map::new();
    statement.insert(
        "resourceType".to_string(),
        Value::String("CapabilityStatement".to_string()),
    );
    statement.insert("id".to_string(), Value::String(id.to_string()));
    statement.insert("status".to_string(), Value::String("active".to_string()));
    statement.insert("date".to_string(), Value::String(date.to_string()));
    statement.insert("kind".to_string(), Value::String("instance".to_string()));
    if let Some(publisher) = &config.capability_statement.publisher {
        statement.insert("publisher".to_string(), Value::String(publisher.clone()));
    }
    statement.insert(
        "fhirVersion".to_string(),
        Value::String(FHIR_VERSION.to_string()),
    );
    statement.insert("format".to_string(), json!(["json"]));

    let resources: Vec<Value> = registry
        .iter()
        .map(|(resource_type, descriptors)| {
            let mut entry = Map::new();
            entry.insert("type".to_string(), Value::String(resource_type.to_string()));
            entry.insert(
                "interaction".to_string(),
                descriptors
                    .iter()
                    .map(|descriptor| json!({"code": descriptor.kind().label()}))
                    .collect(),
            );

            let advertised: Vec<Value> = descriptors
                .iter()
                .filter(|descriptor| descriptor.kind() == InteractionKind::SearchType)
                .flat_map(|descriptor| descriptor.search_parameters().iter())
                .filter_map(|name| params::resolve(resource_type, name, config))
                .filter(|parameter| parameter.advertise)
                .map(|parameter| {
                    json!({
                        "name": parameter.name,
                        "definition": parameter.definition,
                        "type": parameter.value_type,
                        "documentation": parameter.documentation,
                    })
                })
                .collect();
            if !advertised.is_empty() {
                entry.insert("searchParam".to_string(), Value::Array(advertised));
            }

            Value::Object(entry)
        })
        .collect();

    statement.insert(
        "rest".to_string(),
        json!([{"mode": "server", "resource": resources}]),
    );

    Value::Object(statement)
}

/// Check that every declared search parameter resolves.
///
/// Runs at server construction so a typo in a declared name fails startup
/// instead of silently dropping the filter on every request.
pub(crate) fn validate_search_parameters(
    registry: &InteractionRegistry,
    config: &Config,
) -> Result<()> {
    for (resource_type, descriptors) in registry.iter() {
        for descriptor in descriptors {
            for name in descriptor.search_parameters() {
                if params::resolve(resource_type, name, config).is_none() {
                    return Err(Error::config(format!(
                        "search parameter '{name}' for {resource_type} is not a known \
                         parameter and is not defined in the configuration"
                    )));
                }
            }
        }
    }
    Ok(())
}

/// Serve the prebuilt capability statement.
pub(crate) async fn metadata(
    statement: Arc<AnyResource>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let context = InteractionContext {
        method,
        uri,
        headers,
    };
    let query = match handlers::query_pairs(context.uri.query()) {
        Ok(query) => query,
        Err(err) => return handlers::error_response(&context, &[], &err),
    };
    let format = match FormatParameters::resolve(
        &context.method,
        &context.headers,
        &query,
        NegotiationMode::Strict,
    ) {
        Ok(format) => format,
        Err(err) => return handlers::error_response(&context, &query, &err.into()),
    };
    compose(Some(&statement), None, &format)
}
