//! The frozen interaction table.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::callback::{InteractionCallback, InteractionGuard};
use super::kind::InteractionKind;
use super::provider::{FhirProvider, RouteOptions};
use crate::core::{Error, Result};

/// Immutable record of one registered (resource type, interaction kind)
/// pair together with its callback, guards, and route options.
pub struct InteractionDescriptor {
    pub(crate) resource_type: &'static str,
    pub(crate) kind: InteractionKind,
    pub(crate) callback: InteractionCallback,
    pub(crate) route: RouteOptions,
    pub(crate) guards: Vec<Arc<dyn InteractionGuard>>,
    pub(crate) search_parameters: Vec<String>,
}

impl InteractionDescriptor {
    pub fn resource_type(&self) -> &'static str {
        self.resource_type
    }

    pub fn kind(&self) -> InteractionKind {
        self.kind
    }

    pub fn route(&self) -> &RouteOptions {
        &self.route
    }

    /// Declared filter names, non-empty only for search registrations.
    pub fn search_parameters(&self) -> &[String] {
        &self.search_parameters
    }

    pub(crate) fn callback(&self) -> &InteractionCallback {
        &self.callback
    }

    pub(crate) fn guards(&self) -> &[Arc<dyn InteractionGuard>] {
        &self.guards
    }
}

/// Interaction descriptors grouped by resource type.
///
/// Built once from the contributed providers during startup and read-only
/// afterwards, so request handlers share it without locking. Resource types
/// iterate in name order; descriptors within a type in canonical kind order
/// regardless of registration order. Descriptors are shared behind `Arc`
/// because every mounted route closure holds onto its own.
pub struct InteractionRegistry {
    interactions: BTreeMap<&'static str, Vec<Arc<InteractionDescriptor>>>,
}

impl InteractionRegistry {
    pub(crate) fn from_providers(providers: Vec<FhirProvider>) -> Result<Self> {
        let mut interactions: BTreeMap<&'static str, Vec<Arc<InteractionDescriptor>>> =
            BTreeMap::new();
        for provider in providers {
            for descriptor in provider.into_descriptors() {
                let slot = interactions.entry(descriptor.resource_type).or_default();
                if slot.iter().any(|existing| existing.kind == descriptor.kind) {
                    return Err(Error::config(format!(
                        "{} {} interaction registered twice",
                        descriptor.resource_type, descriptor.kind
                    )));
                }
                slot.push(Arc::new(descriptor));
            }
        }
        for descriptors in interactions.values_mut() {
            descriptors.sort_by_key(|descriptor| descriptor.kind());
        }
        Ok(Self { interactions })
    }

    /// Resource types with at least one registered interaction, in name
    /// order.
    pub fn resource_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.interactions.keys().copied()
    }

    pub fn descriptors(&self, resource_type: &str) -> &[Arc<InteractionDescriptor>] {
        self.interactions
            .get(resource_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &[Arc<InteractionDescriptor>])> {
        self.interactions
            .iter()
            .map(|(resource_type, descriptors)| (*resource_type, descriptors.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }
}

impl fmt::Debug for InteractionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (resource_type, descriptors) in &self.interactions {
            let kinds: Vec<_> = descriptors.iter().map(|descriptor| descriptor.kind()).collect();
            map.entry(resource_type, &kinds);
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactions::Stored;
    use crate::resources::{Bundle, FhirResource};
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

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Owner {
        id: Option<String>,
    }

    impl FhirResource for Owner {
        const RESOURCE_TYPE: &'static str = "Owner";

        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }
    }

    fn pet_read(mut provider: FhirProvider) -> FhirProvider {
        provider.read(|_context, id: String| async move {
            Ok(Pet {
                id: Some(id),
                name: "Rex".to_string(),
            })
        });
        provider
    }

    #[test]
    fn test_kinds_sort_canonically_regardless_of_registration_order() {
        let mut provider = FhirProvider::new();
        provider.update(|_context, _id: String, pet: Pet| async move {
            Ok(Stored::Resource(pet))
        });
        provider.search_type::<Pet, _, _>(&[], |_context, _arguments| async move {
            Ok(Bundle::searchset())
        });
        provider.create(|_context, pet: Pet| async move { Ok(Stored::Resource(pet)) });

        let registry = InteractionRegistry::from_providers(vec![provider]).unwrap();
        let kinds: Vec<_> = registry
            .descriptors("Pet")
            .iter()
            .map(|descriptor| descriptor.kind())
            .collect();
        assert_eq!(
            kinds,
            [
                InteractionKind::Create,
                InteractionKind::SearchType,
                InteractionKind::Update,
            ]
        );
    }

    #[test]
    fn test_resource_types_sort_by_name() {
        let mut pets = FhirProvider::new();
        pets.create(|_context, pet: Pet| async move { Ok(Stored::Resource(pet)) });
        let mut owners = FhirProvider::new();
        owners.read(|_context, id: String| async move { Ok(Owner { id: Some(id) }) });

        let registry = InteractionRegistry::from_providers(vec![pets, owners]).unwrap();
        let types: Vec<_> = registry.resource_types().collect();
        assert_eq!(types, ["Owner", "Pet"]);
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let provider = pet_read(pet_read(FhirProvider::new()));
        let err = InteractionRegistry::from_providers(vec![provider]).unwrap_err();
        assert!(err.to_string().contains("Pet read interaction registered twice"));
    }

    #[test]
    fn test_duplicate_across_providers_is_rejected() {
        let first = pet_read(FhirProvider::new());
        let second = pet_read(FhirProvider::new());
        let err = InteractionRegistry::from_providers(vec![first, second]).unwrap_err();
        assert!(err.to_string().contains("registered twice"));
    }

    #[test]
    fn test_debug_lists_kinds_per_type() {
        let registry =
            InteractionRegistry::from_providers(vec![pet_read(FhirProvider::new())]).unwrap();
        assert_eq!(format!("{registry:?}"), r#"{"Pet": [Read]}"#);
    }

    #[test]
    fn test_unknown_type_has_no_descriptors() {
        let registry = InteractionRegistry::from_providers(Vec::new()).unwrap();
        assert!(registry.is_empty());
        assert!(registry.descriptors("Pet").is_empty());
    }
}
