//! Server assembly and lifecycle.
//!
//! `FhirServer` collects providers, freezes their registrations into an
//! interaction registry, derives the axum router from the registry's route
//! table, and runs the HTTP listener. Router construction is separate from
//! serving so tests can drive the router in process.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Router;
use axum::body::Bytes;
use axum::extract::Path;
use axum::http::{HeaderMap, Method, Uri};
use axum::routing::{MethodFilter, MethodRouter, get};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::config::Config;
use super::error::{Error, Result};
use crate::capability;
use crate::interactions::handlers;
use crate::interactions::{
    FhirProvider, InteractionDescriptor, InteractionKind, InteractionRegistry, route_specs,
};
use crate::resources::AnyResource;

/// The FHIR REST server.
pub struct FhirServer {
    config: Config,
    providers: Vec<FhirProvider>,
}

impl FhirServer {
    /// Create a new server with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            providers: Vec::new(),
        }
    }

    /// Register a provider's interactions.
    pub fn add_provider(&mut self, provider: FhirProvider) {
        self.providers.push(provider);
    }

    /// Freeze the registered interactions and build the router.
    ///
    /// Fails on duplicate registrations and on declared search parameters
    /// that resolve neither to the built-in catalog nor to the
    /// configuration. The capability statement is assembled here, once,
    /// with a fresh id and the current instant as its date.
    pub fn into_router(self) -> Result<Router> {
        let registry = InteractionRegistry::from_providers(self.providers)?;
        capability::validate_search_parameters(&registry, &self.config)?;

        let id = uuid::Uuid::new_v4().to_string();
        let date = chrono::Utc::now().to_rfc3339();
        let statement = capability::capability_statement(&registry, &self.config, &id, &date);
        let statement = Arc::new(
            AnyResource::from_value(statement)
                .map_err(|err| Error::internal(format!("capability statement: {err}")))?,
        );

        // Routes sharing a path (read/update on "/{type}/{id}", create and
        // search on "/{type}") must land in one MethodRouter; mounting the
        // same path twice panics inside axum.
        let mut routes: BTreeMap<String, MethodRouter> = BTreeMap::new();
        let mut mounted = 0usize;
        for (_, descriptors) in registry.iter() {
            for descriptor in descriptors {
                for spec in route_specs(descriptor) {
                    let filter = method_filter(&spec.method)?;
                    let method_router = routes.remove(&spec.path).unwrap_or_default();
                    routes.insert(spec.path, attach(method_router, filter, descriptor.clone()));
                    mounted += 1;
                }
            }
        }

        let mut router = Router::new();
        for (path, method_router) in routes {
            router = router.route(&path, method_router);
        }

        router = router.route(
            "/metadata",
            get(move |method: Method, uri: Uri, headers: HeaderMap| {
                let statement = statement.clone();
                async move { capability::metadata(statement, method, uri, headers).await }
            }),
        );

        router = router.layer(TraceLayer::new_for_http());

        if self.config.http.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router = router.layer(cors);
        }

        info!(
            routes = mounted,
            resource_types = registry.resource_types().count(),
            "router built"
        );

        Ok(router)
    }

    /// Build the router, bind the configured listener, and serve.
    pub async fn run(self) -> Result<()> {
        let address = format!("{}:{}", self.config.http.host, self.config.http.port);
        let enable_cors = self.config.http.enable_cors;
        let router = self.into_router()?;

        let listener = tokio::net::TcpListener::bind(&address).await?;

        let cors_status = if enable_cors { "enabled" } else { "disabled" };
        info!("Ready - listening on {} (FHIR REST, CORS {})", address, cors_status);
        info!("  → Capability: GET /metadata");

        axum::serve(listener, router).await?;

        Ok(())
    }
}

/// Mount one interaction on a path's method router.
fn attach(
    router: MethodRouter,
    filter: MethodFilter,
    descriptor: Arc<InteractionDescriptor>,
) -> MethodRouter {
    match descriptor.kind() {
        InteractionKind::Create => router.on(
            filter,
            move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
                let descriptor = descriptor.clone();
                async move { handlers::create(descriptor, method, uri, headers, body).await }
            },
        ),
        InteractionKind::Read => router.on(
            filter,
            move |method: Method, uri: Uri, headers: HeaderMap, Path(id): Path<String>| {
                let descriptor = descriptor.clone();
                async move { handlers::read(descriptor, method, uri, headers, id).await }
            },
        ),
        InteractionKind::SearchType => router.on(
            filter,
            move |method: Method, uri: Uri, headers: HeaderMap, body: Bytes| {
                let descriptor = descriptor.clone();
                async move { handlers::search(descriptor, method, uri, headers, body).await }
            },
        ),
        InteractionKind::Update => router.on(
            filter,
            move |method: Method,
                  uri: Uri,
                  headers: HeaderMap,
                  Path(id): Path<String>,
                  body: Bytes| {
                let descriptor = descriptor.clone();
                async move { handlers::update(descriptor, method, uri, headers, id, body).await }
            },
        ),
    }
}

fn method_filter(method: &Method) -> Result<MethodFilter> {
    MethodFilter::try_from(method.clone())
        .map_err(|err| Error::internal(format!("unroutable method: {err}")))
}
