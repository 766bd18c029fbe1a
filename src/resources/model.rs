//! Typed and type-erased resource representations.
//!
//! User code works with concrete types implementing [`FhirResource`]; the
//! framework internally carries an [`AnyResource`], an order-preserving JSON
//! object that is guaranteed to hold a string `resourceType` tag. The
//! conversion functions between the two are the only place where structural
//! validation of request bodies happens.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors produced when converting between wire bodies and typed resources.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The body was valid JSON but not a JSON object.
    #[error("resource body must be a JSON object")]
    NotAnObject,

    /// The body carried no `resourceType` tag.
    #[error("resource body is missing the 'resourceType' field")]
    MissingType,

    /// The body's `resourceType` did not match the expected type.
    #[error("expected a {expected} resource, found '{found}'")]
    TypeMismatch { expected: &'static str, found: String },

    /// Structural (de)serialization failure, reported with serde's text.
    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

/// A typed FHIR resource schema.
///
/// Implementations are plain serde data types; the framework never inspects
/// fields beyond `id`. The associated `RESOURCE_TYPE` is the wire-level type
/// name and doubles as the route path segment.
pub trait FhirResource: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Resource type name as it appears on the wire, e.g. `"Patient"`.
    const RESOURCE_TYPE: &'static str;

    /// Logical id of this resource instance, when one has been assigned.
    fn id(&self) -> Option<&str>;
}

/// A type-erased resource body.
///
/// Invariants: the underlying map always contains a string `resourceType`
/// entry, and it is always the first key, so serialized output leads with
/// the type tag. Key order is otherwise preserved end to end (serde_json's
/// `preserve_order` feature), which makes pretty-printing idempotent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AnyResource {
    fields: Map<String, Value>,
}

impl AnyResource {
    /// Erase a typed resource into a wire body.
    ///
    /// The `resourceType` tag is injected first; any tag the type serialized
    /// itself is overwritten in place.
    pub fn from_typed<R: FhirResource>(resource: &R) -> Result<Self, ResourceError> {
        let value = serde_json::to_value(resource)?;
        let Value::Object(typed_fields) = value else {
            return Err(ResourceError::NotAnObject);
        };

        let mut fields = Map::new();
        fields.insert(
            "resourceType".to_string(),
            Value::String(R::RESOURCE_TYPE.to_string()),
        );
        fields.extend(typed_fields);
        Ok(Self { fields })
    }

    /// Validate a decoded JSON value as a resource body.
    pub fn from_value(value: Value) -> Result<Self, ResourceError> {
        let Value::Object(fields) = value else {
            return Err(ResourceError::NotAnObject);
        };
        match fields.get("resourceType") {
            Some(Value::String(_)) => Ok(Self { fields }),
            Some(_) | None => Err(ResourceError::MissingType),
        }
    }

    /// Recover the typed resource, checking the `resourceType` tag first.
    pub fn into_typed<R: FhirResource>(mut self) -> Result<R, ResourceError> {
        let found = self.resource_type().to_string();
        if found != R::RESOURCE_TYPE {
            return Err(ResourceError::TypeMismatch {
                expected: R::RESOURCE_TYPE,
                found,
            });
        }
        self.fields.remove("resourceType");
        Ok(serde_json::from_value(Value::Object(self.fields))?)
    }

    /// The wire-level resource type name.
    pub fn resource_type(&self) -> &str {
        match self.fields.get("resourceType") {
            Some(Value::String(name)) => name,
            // Unreachable per the constructor invariant.
            _ => "",
        }
    }

    /// Logical id carried by the body, if any.
    pub fn id(&self) -> Option<&str> {
        self.fields.get("id").and_then(Value::as_str)
    }

    /// Iterate the body's fields in wire order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// View the body as a JSON value without consuming it.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }

    /// Consume the body into a JSON value.
    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl<'de> Deserialize<'de> for AnyResource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(value).map_err(serde::de::Error::custom)
    }
}
