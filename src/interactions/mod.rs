//! Interaction registration, dispatch, and route metadata.
//!
//! Providers collect typed callbacks for the four interaction kinds; the
//! registry freezes them into an immutable table the server mounts routes
//! from. `handlers` carries the per-request pipeline and `routes` the
//! deterministic path/verb/status table.

pub(crate) mod handlers;

mod callback;
mod error;
mod kind;
mod provider;
mod registry;
mod routes;

pub use callback::{InteractionContext, InteractionGuard, SearchArguments, Stored};
pub use error::FhirError;
pub use kind::InteractionKind;
pub use provider::{FhirProvider, InteractionOptions, RouteOptions};
pub use registry::{InteractionDescriptor, InteractionRegistry};
pub use routes::{ResponseDoc, ResponseShape, RouteSpec, route_specs};
