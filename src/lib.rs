//! FHIR REST Framework
//!
//! This crate provides the HTTP surface of a FHIR R4B server: callers supply
//! the interaction logic per resource type, and the framework derives the
//! routes, negotiates the response format, renders errors as
//! `OperationOutcome` payloads, and serves the capability statement.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - **core**: Core infrastructure including configuration, error handling, and the main server
//! - **interactions**: Interaction registration, routing metadata, and request handling
//! - **resources**: Typed and type-erased resource bodies, bundles, and operation outcomes
//! - **wire**: Response format negotiation and JSON/XML rendering
//! - **capability**: Capability statement generation
//!
//! # Example
//!
//! ```rust,no_run
//! use fhirforge::{Config, FhirProvider, FhirResource, FhirServer};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Serialize, Deserialize)]
//! struct Patient {
//!     #[serde(skip_serializing_if = "Option::is_none")]
//!     id: Option<String>,
//! }
//!
//! impl FhirResource for Patient {
//!     const RESOURCE_TYPE: &'static str = "Patient";
//!
//!     fn id(&self) -> Option<&str> {
//!         self.id.as_deref()
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut provider = FhirProvider::new();
//!     provider.read::<Patient, _, _>(|_context, id| async move {
//!         Ok(Patient { id: Some(id) })
//!     });
//!
//!     let mut server = FhirServer::new(Config::from_env()?);
//!     server.add_provider(provider);
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod capability;
pub mod core;
pub mod interactions;
pub mod resources;
pub mod wire;

// Re-export commonly used types for convenience
pub use core::{Config, Error, FhirServer, Result};
pub use interactions::{
    FhirError, FhirProvider, InteractionContext, InteractionGuard, InteractionOptions,
    SearchArguments, Stored,
};
pub use resources::{Bundle, FhirResource, IssueSeverity, OperationOutcome};
