//! Response format negotiation.
//!
//! A request selects its response encoding either through the `Accept`
//! header (`POST` interactions only, where the body consumes the
//! `Content-Type`) or through the `_format` query parameter. Both paths
//! resolve through the same alias table; tokens are matched exactly and
//! case-sensitively. `_pretty=true` additionally requests indented output.

use std::collections::HashMap;
use std::sync::LazyLock;

use http::header::ACCEPT;
use http::{HeaderMap, Method};
use thiserror::Error;

/// The two encodings a response can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WireFormat {
    #[default]
    Json,
    Xml,
}

impl WireFormat {
    /// Canonical media type stamped on responses in this format.
    pub fn mime(&self) -> &'static str {
        match self {
            WireFormat::Json => "application/fhir+json",
            WireFormat::Xml => "application/fhir+xml",
        }
    }
}

/// Accepted format tokens. Aliases map onto the canonical encodings; any
/// token outside this table is unsupported.
static FORMAT_ALIASES: LazyLock<HashMap<&'static str, WireFormat>> = LazyLock::new(|| {
    HashMap::from([
        ("json", WireFormat::Json),
        ("application/json", WireFormat::Json),
        ("application/fhir+json", WireFormat::Json),
        ("xml", WireFormat::Xml),
        ("text/xml", WireFormat::Xml),
        ("application/xml", WireFormat::Xml),
        ("application/fhir+xml", WireFormat::Xml),
    ])
});

/// The request named a format token outside the alias table.
#[derive(Debug, Clone, Error)]
#[error("Invalid response format specified for '_format' parameter")]
pub struct UnsupportedFormat {
    /// The rejected token, kept for logging.
    pub token: String,
}

/// How an unrecognized token is treated.
///
/// Request handling is strict and rejects the request; the error path is
/// lenient and falls back to JSON so that a failure can always be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationMode {
    Strict,
    Lenient,
}

/// Resolved rendering parameters for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatParameters {
    pub format: WireFormat,
    pub pretty: bool,
}

impl FormatParameters {
    /// Resolve the format for a request.
    ///
    /// For `POST` requests each `Accept` header value is checked in order
    /// against the alias table and the first match wins. Otherwise (and for
    /// `POST` requests whose `Accept` values all miss) the `_format` query
    /// parameter decides, defaulting to `json` when absent. `query` is the
    /// decoded query string as ordered key/value pairs; the first occurrence
    /// of a key is authoritative.
    pub fn resolve(
        method: &Method,
        headers: &HeaderMap,
        query: &[(String, String)],
        mode: NegotiationMode,
    ) -> Result<FormatParameters, UnsupportedFormat> {
        let pretty = first_value(query, "_pretty").is_some_and(|v| v == "true");

        if *method == Method::POST {
            for value in headers.get_all(ACCEPT) {
                if let Some(format) = value
                    .to_str()
                    .ok()
                    .and_then(|token| FORMAT_ALIASES.get(token))
                {
                    return Ok(FormatParameters { format: *format, pretty });
                }
            }
        }

        let token = first_value(query, "_format").unwrap_or("json");
        match FORMAT_ALIASES.get(token) {
            Some(format) => Ok(FormatParameters { format: *format, pretty }),
            None => match mode {
                NegotiationMode::Strict => Err(UnsupportedFormat { token: token.to_owned() }),
                NegotiationMode::Lenient => Ok(FormatParameters { format: WireFormat::Json, pretty }),
            },
        }
    }
}

fn first_value<'q>(query: &'q [(String, String)], key: &str) -> Option<&'q str> {
    query
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}
