//! Registration surface for interaction callbacks.

use std::future::Future;
use std::sync::Arc;

use super::callback::{
    InteractionCallback, InteractionContext, InteractionGuard, SearchArguments, Stored,
};
use super::error::FhirError;
use super::registry::InteractionDescriptor;
use crate::resources::{Bundle, FhirResource};

/// Optional overrides for the generated route documentation.
#[derive(Debug, Clone, Default)]
pub struct RouteOptions {
    pub summary: Option<String>,
    pub description: Option<String>,
}

/// Per-interaction registration options.
#[derive(Default)]
pub struct InteractionOptions {
    pub route: RouteOptions,
    /// Extra guards for this interaction, run after the provider's own.
    pub guards: Vec<Arc<dyn InteractionGuard>>,
}

/// A group of interaction registrations contributed to one server.
///
/// Providers accumulate descriptors during single-threaded startup; the
/// server freezes all contributed descriptors into a registry before
/// serving begins. Registration has no effect after that point.
#[derive(Default)]
pub struct FhirProvider {
    guards: Vec<Arc<dyn InteractionGuard>>,
    descriptors: Vec<InteractionDescriptor>,
}

impl FhirProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a guard that runs before every interaction registered on this
    /// provider.
    pub fn with_guard(mut self, guard: Arc<dyn InteractionGuard>) -> Self {
        self.guards.push(guard);
        self
    }

    /// Register a create callback for `R`.
    pub fn create<R, F, Fut>(&mut self, handler: F)
    where
        R: FhirResource,
        F: Fn(InteractionContext, R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Stored<R>, FhirError>> + Send + 'static,
    {
        self.create_with(handler, InteractionOptions::default());
    }

    pub fn create_with<R, F, Fut>(&mut self, handler: F, options: InteractionOptions)
    where
        R: FhirResource,
        F: Fn(InteractionContext, R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Stored<R>, FhirError>> + Send + 'static,
    {
        self.push::<R>(InteractionCallback::erase_create(handler), options, Vec::new());
    }

    /// Register a read callback for `R`.
    pub fn read<R, F, Fut>(&mut self, handler: F)
    where
        R: FhirResource,
        F: Fn(InteractionContext, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, FhirError>> + Send + 'static,
    {
        self.read_with(handler, InteractionOptions::default());
    }

    pub fn read_with<R, F, Fut>(&mut self, handler: F, options: InteractionOptions)
    where
        R: FhirResource,
        F: Fn(InteractionContext, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, FhirError>> + Send + 'static,
    {
        self.push::<R>(InteractionCallback::erase_read(handler), options, Vec::new());
    }

    /// Register a search-type callback for `R`.
    ///
    /// `parameters` declares the filter names the callback understands;
    /// request parameters outside this list (and the reserved output
    /// parameters) are dropped before the callback runs. The resource type
    /// cannot be inferred from the callback, so searches are registered as
    /// `provider.search_type::<Patient, _, _>(...)`.
    pub fn search_type<R, F, Fut>(&mut self, parameters: &[&str], handler: F)
    where
        R: FhirResource,
        F: Fn(InteractionContext, SearchArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Bundle, FhirError>> + Send + 'static,
    {
        self.search_type_with::<R, F, Fut>(parameters, handler, InteractionOptions::default());
    }

    pub fn search_type_with<R, F, Fut>(
        &mut self,
        parameters: &[&str],
        handler: F,
        options: InteractionOptions,
    ) where
        R: FhirResource,
        F: Fn(InteractionContext, SearchArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Bundle, FhirError>> + Send + 'static,
    {
        let parameters = parameters.iter().map(|name| name.to_string()).collect();
        self.push::<R>(InteractionCallback::erase_search(handler), options, parameters);
    }

    /// Register an update callback for `R`.
    pub fn update<R, F, Fut>(&mut self, handler: F)
    where
        R: FhirResource,
        F: Fn(InteractionContext, String, R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Stored<R>, FhirError>> + Send + 'static,
    {
        self.update_with(handler, InteractionOptions::default());
    }

    pub fn update_with<R, F, Fut>(&mut self, handler: F, options: InteractionOptions)
    where
        R: FhirResource,
        F: Fn(InteractionContext, String, R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Stored<R>, FhirError>> + Send + 'static,
    {
        self.push::<R>(InteractionCallback::erase_update(handler), options, Vec::new());
    }

    fn push<R: FhirResource>(
        &mut self,
        callback: InteractionCallback,
        options: InteractionOptions,
        search_parameters: Vec<String>,
    ) {
        let mut guards = self.guards.clone();
        guards.extend(options.guards);
        self.descriptors.push(InteractionDescriptor {
            resource_type: R::RESOURCE_TYPE,
            kind: callback.kind(),
            callback,
            route: options.route,
            guards,
            search_parameters,
        });
    }

    pub(crate) fn into_descriptors(self) -> Vec<InteractionDescriptor> {
        self.descriptors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactions::InteractionKind;
    use async_trait::async_trait;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Pet {
        id: Option<String>,
        name: String,
    }

    impl FhirResource for Pet {
        const RESOURCE_TYPE: &'static str = "Pet";

        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }
    }

    struct AllowAll;

    #[async_trait]
    impl InteractionGuard for AllowAll {
        async fn check(&self, _context: &InteractionContext) -> Result<(), FhirError> {
            Ok(())
        }
    }

    #[test]
    fn test_registration_records_kind_and_type() {
        let mut provider = FhirProvider::new();
        provider.read(|_context, id: String| async move {
            Ok(Pet {
                id: Some(id),
                name: "Rex".to_string(),
            })
        });
        provider.search_type::<Pet, _, _>(&["name"], |_context, _arguments| async move {
            Ok(Bundle::searchset())
        });

        let descriptors = provider.into_descriptors();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].resource_type(), "Pet");
        assert_eq!(descriptors[0].kind(), InteractionKind::Read);
        assert!(descriptors[0].search_parameters().is_empty());
        assert_eq!(descriptors[1].kind(), InteractionKind::SearchType);
        assert_eq!(descriptors[1].search_parameters(), ["name"]);
    }

    #[test]
    fn test_provider_guard_applies_to_every_interaction() {
        let mut provider = FhirProvider::new().with_guard(Arc::new(AllowAll));
        provider.create(|_context, pet: Pet| async move { Ok(Stored::Resource(pet)) });
        provider.update_with(
            |_context, _id: String, pet: Pet| async move { Ok(Stored::Resource(pet)) },
            InteractionOptions {
                guards: vec![Arc::new(AllowAll)],
                ..InteractionOptions::default()
            },
        );

        let descriptors = provider.into_descriptors();
        assert_eq!(descriptors[0].guards().len(), 1);
        assert_eq!(descriptors[1].guards().len(), 2);
    }

    #[test]
    fn test_route_options_are_kept() {
        let mut provider = FhirProvider::new();
        provider.read_with(
            |_context, id: String| async move {
                Ok(Pet {
                    id: Some(id),
                    name: "Rex".to_string(),
                })
            },
            InteractionOptions {
                route: RouteOptions {
                    summary: Some("Fetch one pet".to_string()),
                    description: None,
                },
                ..InteractionOptions::default()
            },
        );

        let descriptors = provider.into_descriptors();
        assert_eq!(descriptors[0].route().summary.as_deref(), Some("Fetch one pet"));
    }
}
