//! Callback contracts for the four interaction kinds.
//!
//! Users register async closures with strongly typed signatures; before a
//! descriptor is stored those closures are wrapped into the type-erased
//! [`InteractionCallback`] union so the registry and handlers can hold them
//! uniformly. The kind tag decides which variant is invoked; there is no
//! runtime capability probing.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use http::{HeaderMap, Method, Uri};

use super::error::FhirError;
use super::kind::InteractionKind;
use crate::resources::{AnyResource, Bundle, FhirResource};

/// Request-scoped information handed to guards and callbacks.
#[derive(Debug, Clone)]
pub struct InteractionContext {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
}

/// What a create or update callback hands back: either the identifier the
/// server assigned, or the full stored resource to echo in the response.
#[derive(Debug)]
pub enum Stored<R> {
    Id(String),
    Resource(R),
}

impl<R: FhirResource> Stored<R> {
    fn erase(self) -> Result<Stored<AnyResource>, FhirError> {
        match self {
            Stored::Id(id) => Ok(Stored::Id(id)),
            Stored::Resource(resource) => {
                Ok(Stored::Resource(AnyResource::from_typed(&resource)?))
            }
        }
    }
}

impl Stored<AnyResource> {
    /// Identifier of the stored resource, however it was reported.
    pub(crate) fn id(&self) -> Option<&str> {
        match self {
            Stored::Id(id) => Some(id),
            Stored::Resource(resource) => resource.id(),
        }
    }

    pub(crate) fn resource(&self) -> Option<&AnyResource> {
        match self {
            Stored::Id(_) => None,
            Stored::Resource(resource) => Some(resource),
        }
    }
}

/// Search filters for one search-type request.
///
/// Holds the declared filter parameters present on the request as ordered
/// name/value pairs. A parameter may repeat; values keep request order.
/// Reserved output parameters (`_format`, `_pretty`) and undeclared names
/// never appear here.
#[derive(Debug, Clone, Default)]
pub struct SearchArguments {
    values: Vec<(String, String)>,
}

impl SearchArguments {
    pub(crate) fn new(values: Vec<(String, String)>) -> Self {
        Self { values }
    }

    /// First value supplied for `name`, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All values supplied for `name`, in request order.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.values
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Pre-callback check, e.g. an authentication scheme.
///
/// Guards run before format negotiation and before the callback; a failing
/// guard short-circuits the request into the error path.
#[async_trait]
pub trait InteractionGuard: Send + Sync {
    async fn check(&self, context: &InteractionContext) -> Result<(), FhirError>;
}

type CreateFn = Arc<
    dyn Fn(
            InteractionContext,
            AnyResource,
        ) -> BoxFuture<'static, Result<Stored<AnyResource>, FhirError>>
        + Send
        + Sync,
>;
type ReadFn = Arc<
    dyn Fn(InteractionContext, String) -> BoxFuture<'static, Result<AnyResource, FhirError>>
        + Send
        + Sync,
>;
type SearchFn = Arc<
    dyn Fn(InteractionContext, SearchArguments) -> BoxFuture<'static, Result<Bundle, FhirError>>
        + Send
        + Sync,
>;
type UpdateFn = Arc<
    dyn Fn(
            InteractionContext,
            String,
            AnyResource,
        ) -> BoxFuture<'static, Result<Stored<AnyResource>, FhirError>>
        + Send
        + Sync,
>;

/// Type-erased interaction callback, one variant per kind.
#[derive(Clone)]
pub(crate) enum InteractionCallback {
    Create(CreateFn),
    Read(ReadFn),
    SearchType(SearchFn),
    Update(UpdateFn),
}

impl InteractionCallback {
    pub(crate) fn kind(&self) -> InteractionKind {
        match self {
            InteractionCallback::Create(_) => InteractionKind::Create,
            InteractionCallback::Read(_) => InteractionKind::Read,
            InteractionCallback::SearchType(_) => InteractionKind::SearchType,
            InteractionCallback::Update(_) => InteractionKind::Update,
        }
    }

    pub(crate) fn erase_create<R, F, Fut>(handler: F) -> Self
    where
        R: FhirResource,
        F: Fn(InteractionContext, R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Stored<R>, FhirError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        Self::Create(Arc::new(move |context, resource| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let typed = resource.into_typed::<R>()?;
                handler(context, typed).await?.erase()
            })
        }))
    }

    pub(crate) fn erase_read<R, F, Fut>(handler: F) -> Self
    where
        R: FhirResource,
        F: Fn(InteractionContext, String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, FhirError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        Self::Read(Arc::new(move |context, id| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let resource = handler(context, id).await?;
                AnyResource::from_typed(&resource).map_err(FhirError::from)
            })
        }))
    }

    pub(crate) fn erase_search<F, Fut>(handler: F) -> Self
    where
        F: Fn(InteractionContext, SearchArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Bundle, FhirError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        Self::SearchType(Arc::new(move |context, arguments| {
            let handler = Arc::clone(&handler);
            Box::pin(async move { handler(context, arguments).await })
        }))
    }

    pub(crate) fn erase_update<R, F, Fut>(handler: F) -> Self
    where
        R: FhirResource,
        F: Fn(InteractionContext, String, R) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Stored<R>, FhirError>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        Self::Update(Arc::new(move |context, id, resource| {
            let handler = Arc::clone(&handler);
            Box::pin(async move {
                let typed = resource.into_typed::<R>()?;
                handler(context, id, typed).await?.erase()
            })
        }))
    }
}
