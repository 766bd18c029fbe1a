//! Route metadata derivation.
//!
//! Path, verb, success status, and documented responses are a pure function
//! of (resource type, interaction kind); nothing here varies per request.
//! The server mounts handlers at these paths, and the same records feed the
//! generated route documentation.

use http::{Method, StatusCode};

use super::kind::InteractionKind;
use super::registry::InteractionDescriptor;

/// Body shape tag for a documented response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// The domain resource itself.
    Resource,
    /// The search result-set envelope.
    SearchSet,
    /// The standardized error payload.
    Outcome,
}

/// One documented response of a route.
#[derive(Debug, Clone)]
pub struct ResponseDoc {
    pub status: StatusCode,
    pub shape: ResponseShape,
    pub description: String,
}

/// Metadata for one mounted route.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    pub path: String,
    pub method: Method,
    pub success_status: StatusCode,
    pub summary: String,
    pub description: String,
    pub responses: Vec<ResponseDoc>,
}

/// Derive the route metadata for a descriptor.
///
/// Every kind maps to exactly one route except search-type, which mounts
/// both `GET /{type}` and `POST /{type}/_search` with identical metadata.
pub fn route_specs(descriptor: &InteractionDescriptor) -> Vec<RouteSpec> {
    let resource_type = descriptor.resource_type();
    let kind = descriptor.kind();
    let label = kind.label();

    let summary = descriptor
        .route()
        .summary
        .clone()
        .unwrap_or_else(|| format!("{resource_type} {label}"));
    let description = descriptor
        .route()
        .description
        .clone()
        .unwrap_or_else(|| default_description(resource_type, kind));

    match kind {
        InteractionKind::Create => vec![RouteSpec {
            path: format!("/{resource_type}"),
            method: Method::POST,
            success_status: StatusCode::CREATED,
            summary,
            description,
            responses: vec![
                created_doc(resource_type),
                bad_request_doc(resource_type, label),
                unauthorized_doc(resource_type, label),
                unprocessable_doc(resource_type),
            ],
        }],
        InteractionKind::Read => vec![RouteSpec {
            path: format!("/{resource_type}/{{id}}"),
            method: Method::GET,
            success_status: StatusCode::OK,
            summary,
            description,
            responses: vec![
                ok_doc(resource_type, kind),
                unauthorized_doc(resource_type, label),
                not_found_doc(resource_type),
            ],
        }],
        InteractionKind::SearchType => {
            let responses = vec![
                ok_doc(resource_type, kind),
                bad_request_doc(resource_type, label),
                unauthorized_doc(resource_type, label),
            ];
            vec![
                RouteSpec {
                    path: format!("/{resource_type}"),
                    method: Method::GET,
                    success_status: StatusCode::OK,
                    summary: summary.clone(),
                    description: description.clone(),
                    responses: responses.clone(),
                },
                RouteSpec {
                    path: format!("/{resource_type}/_search"),
                    method: Method::POST,
                    success_status: StatusCode::OK,
                    summary,
                    description,
                    responses,
                },
            ]
        }
        InteractionKind::Update => vec![RouteSpec {
            path: format!("/{resource_type}/{{id}}"),
            method: Method::PUT,
            success_status: StatusCode::OK,
            summary,
            description,
            responses: vec![
                ok_doc(resource_type, kind),
                bad_request_doc(resource_type, label),
                unauthorized_doc(resource_type, label),
                unprocessable_doc(resource_type),
                not_found_doc(resource_type),
            ],
        }],
    }
}

fn default_description(resource_type: &str, kind: InteractionKind) -> String {
    match kind {
        InteractionKind::Create => format!(
            "The {resource_type} create interaction creates a new {resource_type} resource \
             in a server-assigned location."
        ),
        InteractionKind::Read => format!(
            "The {resource_type} read interaction accesses the current contents of a \
             {resource_type} resource."
        ),
        InteractionKind::SearchType => format!(
            "The {resource_type} search-type interaction searches a set of resources based \
             on some filter criteria."
        ),
        InteractionKind::Update => format!(
            "The {resource_type} update interaction creates a new current version for an \
             existing {resource_type} resource."
        ),
    }
}

fn ok_doc(resource_type: &str, kind: InteractionKind) -> ResponseDoc {
    let shape = if kind == InteractionKind::SearchType {
        ResponseShape::SearchSet
    } else {
        ResponseShape::Resource
    };
    ResponseDoc {
        status: StatusCode::OK,
        shape,
        description: format!("Successful {resource_type} {}", kind.label()),
    }
}

fn created_doc(resource_type: &str) -> ResponseDoc {
    ResponseDoc {
        status: StatusCode::CREATED,
        shape: ResponseShape::Resource,
        description: format!("Successful {resource_type} create"),
    }
}

fn bad_request_doc(resource_type: &str, label: &str) -> ResponseDoc {
    ResponseDoc {
        status: StatusCode::BAD_REQUEST,
        shape: ResponseShape::Outcome,
        description: format!(
            "{resource_type} {label} request could not be parsed or failed basic FHIR \
             validation rules."
        ),
    }
}

fn unauthorized_doc(resource_type: &str, label: &str) -> ResponseDoc {
    ResponseDoc {
        status: StatusCode::UNAUTHORIZED,
        shape: ResponseShape::Outcome,
        description: format!(
            "{resource_type} Authorization is required for the {label} interaction that \
             was attempted."
        ),
    }
}

fn not_found_doc(resource_type: &str) -> ResponseDoc {
    ResponseDoc {
        status: StatusCode::NOT_FOUND,
        shape: ResponseShape::Outcome,
        description: format!("Unknown {resource_type} resource"),
    }
}

fn unprocessable_doc(resource_type: &str) -> ResponseDoc {
    ResponseDoc {
        status: StatusCode::UNPROCESSABLE_ENTITY,
        shape: ResponseShape::Outcome,
        description: format!(
            "The proposed {resource_type} resource violated applicable FHIR profiles or \
             server business rules."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interactions::{FhirProvider, InteractionOptions, RouteOptions, Stored};
    use crate::resources::{Bundle, FhirResource};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Pet {
        id: Option<String>,
    }

    impl FhirResource for Pet {
        const RESOURCE_TYPE: &'static str = "Pet";

        fn id(&self) -> Option<&str> {
            self.id.as_deref()
        }
    }

    fn descriptor_for(kind: crate::interactions::InteractionKind) -> InteractionDescriptor {
        use crate::interactions::InteractionKind;
        let mut provider = FhirProvider::new();
        match kind {
            InteractionKind::Create => {
                provider.create(|_context, pet: Pet| async move { Ok(Stored::Resource(pet)) })
            }
            InteractionKind::Read => {
                provider.read(|_context, id: String| async move { Ok(Pet { id: Some(id) }) })
            }
            InteractionKind::SearchType => {
                provider.search_type::<Pet, _, _>(&[], |_context, _arguments| async move {
                    Ok(Bundle::searchset())
                })
            }
            InteractionKind::Update => provider
                .update(|_context, _id: String, pet: Pet| async move { Ok(Stored::Resource(pet)) }),
        }
        provider.into_descriptors().remove(0)
    }

    fn statuses(spec: &RouteSpec) -> Vec<u16> {
        spec.responses.iter().map(|doc| doc.status.as_u16()).collect()
    }

    #[test]
    fn test_create_route() {
        let specs = route_specs(&descriptor_for(crate::interactions::InteractionKind::Create));
        assert_eq!(specs.len(), 1);
        let spec = &specs[0];
        assert_eq!(spec.path, "/Pet");
        assert_eq!(spec.method, Method::POST);
        assert_eq!(spec.success_status, StatusCode::CREATED);
        assert_eq!(spec.summary, "Pet create");
        assert_eq!(statuses(spec), [201, 400, 401, 422]);
        assert_eq!(spec.responses[0].shape, ResponseShape::Resource);
        assert_eq!(spec.responses[1].shape, ResponseShape::Outcome);
    }

    #[test]
    fn test_read_route() {
        let specs = route_specs(&descriptor_for(crate::interactions::InteractionKind::Read));
        let spec = &specs[0];
        assert_eq!(spec.path, "/Pet/{id}");
        assert_eq!(spec.method, Method::GET);
        assert_eq!(spec.success_status, StatusCode::OK);
        assert_eq!(statuses(spec), [200, 401, 404]);
        assert_eq!(
            spec.description,
            "The Pet read interaction accesses the current contents of a Pet resource."
        );
    }

    #[test]
    fn test_search_mounts_two_routes() {
        let specs = route_specs(&descriptor_for(crate::interactions::InteractionKind::SearchType));
        assert_eq!(specs.len(), 2);
        assert_eq!(specs[0].path, "/Pet");
        assert_eq!(specs[0].method, Method::GET);
        assert_eq!(specs[1].path, "/Pet/_search");
        assert_eq!(specs[1].method, Method::POST);
        for spec in &specs {
            assert_eq!(spec.success_status, StatusCode::OK);
            assert_eq!(statuses(spec), [200, 400, 401]);
            assert_eq!(spec.responses[0].shape, ResponseShape::SearchSet);
        }
    }

    #[test]
    fn test_update_route() {
        let specs = route_specs(&descriptor_for(crate::interactions::InteractionKind::Update));
        let spec = &specs[0];
        assert_eq!(spec.path, "/Pet/{id}");
        assert_eq!(spec.method, Method::PUT);
        assert_eq!(spec.success_status, StatusCode::OK);
        assert_eq!(statuses(spec), [200, 400, 401, 422, 404]);
    }

    #[test]
    fn test_route_options_override_documentation() {
        let mut provider = FhirProvider::new();
        provider.read_with(
            |_context, id: String| async move { Ok(Pet { id: Some(id) }) },
            InteractionOptions {
                route: RouteOptions {
                    summary: Some("Fetch one pet".to_string()),
                    description: Some("Fetches a pet by identifier.".to_string()),
                },
                ..InteractionOptions::default()
            },
        );
        let descriptor = provider.into_descriptors().remove(0);
        let spec = &route_specs(&descriptor)[0];
        assert_eq!(spec.summary, "Fetch one pet");
        assert_eq!(spec.description, "Fetches a pet by identifier.");
    }
}
