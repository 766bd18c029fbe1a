//! Search parameter catalog and resolution.
//!
//! Declared search parameter names are resolved here, first against the
//! configuration's extension parameters and then against a built-in catalog
//! of standard FHIR R4B definitions.

use crate::core::Config;

/// One built-in catalog entry. A `resource_type` of `None` marks a parameter
/// defined for every resource type (`_id`, `_lastUpdated`).
struct CatalogEntry {
    resource_type: Option<&'static str>,
    name: &'static str,
    definition: &'static str,
    value_type: &'static str,
    documentation: &'static str,
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        resource_type: None,
        name: "_id",
        definition: "http://hl7.org/fhir/SearchParameter/Resource-id",
        value_type: "token",
        documentation: "Logical id of this artifact",
    },
    CatalogEntry {
        resource_type: None,
        name: "_lastUpdated",
        definition: "http://hl7.org/fhir/SearchParameter/Resource-lastUpdated",
        value_type: "date",
        documentation: "When the resource version last changed",
    },
    CatalogEntry {
        resource_type: Some("Patient"),
        name: "family",
        definition: "http://hl7.org/fhir/SearchParameter/individual-family",
        value_type: "string",
        documentation: "A portion of the family name of the patient",
    },
    CatalogEntry {
        resource_type: Some("Patient"),
        name: "given",
        definition: "http://hl7.org/fhir/SearchParameter/individual-given",
        value_type: "string",
        documentation: "A portion of the given name of the patient",
    },
    CatalogEntry {
        resource_type: Some("Patient"),
        name: "name",
        definition: "http://hl7.org/fhir/SearchParameter/Patient-name",
        value_type: "string",
        documentation: "A server defined search that may match any of the string fields in the HumanName, including family, give, prefix, suffix, suffix and/or text",
    },
    CatalogEntry {
        resource_type: Some("Patient"),
        name: "identifier",
        definition: "http://hl7.org/fhir/SearchParameter/Patient-identifier",
        value_type: "token",
        documentation: "A patient identifier",
    },
    CatalogEntry {
        resource_type: Some("Patient"),
        name: "birthdate",
        definition: "http://hl7.org/fhir/SearchParameter/individual-birthdate",
        value_type: "date",
        documentation: "The patient's date of birth",
    },
    CatalogEntry {
        resource_type: Some("Patient"),
        name: "general-practitioner",
        definition: "http://hl7.org/fhir/SearchParameter/Patient-general-practitioner",
        value_type: "reference",
        documentation: "Patient's nominated general practitioner, not the organization that manages the record",
    },
];

/// A declared search parameter resolved to its full definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ResolvedParameter {
    pub name: String,
    pub definition: String,
    pub value_type: String,
    pub documentation: String,
    /// Whether the parameter appears in the capability statement. An
    /// unadvertised parameter still filters searches.
    pub advertise: bool,
}

/// Resolve a declared parameter name for a resource type.
///
/// Configured extension parameters take precedence over the built-in catalog,
/// which lets a deployment redefine a standard parameter.
pub(crate) fn resolve(
    resource_type: &str,
    name: &str,
    config: &Config,
) -> Option<ResolvedParameter> {
    if let Some(extension) = config.search_parameter(resource_type, name) {
        return Some(ResolvedParameter {
            name: name.to_string(),
            definition: extension.uri.clone(),
            value_type: extension.value_type.clone(),
            documentation: extension.description.clone(),
            advertise: extension.include_in_capability_statement,
        });
    }

    CATALOG
        .iter()
        .find(|entry| {
            entry.name == name && entry.resource_type.is_none_or(|scope| scope == resource_type)
        })
        .map(|entry| ResolvedParameter {
            name: entry.name.to_string(),
            definition: entry.definition.to_string(),
            value_type: entry.value_type.to_string(),
            documentation: entry.documentation.to_string(),
            advertise: true,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SearchParameterConfig;

    fn config_with_nickname(advertise: bool) -> Config {
        let mut config = Config::default();
        config.search_parameters.entry("Patient".to_string()).or_default().insert(
            "nickname".to_string(),
            SearchParameterConfig {
                value_type: "string".to_string(),
                description: "Nickname".to_string(),
                uri: "https://hostname/nickname".to_string(),
                include_in_capability_statement: advertise,
            },
        );
        config
    }

    #[test]
    fn test_resolves_builtin_parameter() {
        let config = Config::default();
        let family = resolve("Patient", "family", &config).unwrap();
        assert_eq!(
            family.definition,
            "http://hl7.org/fhir/SearchParameter/individual-family"
        );
        assert_eq!(family.value_type, "string");
        assert_eq!(
            family.documentation,
            "A portion of the family name of the patient"
        );
        assert!(family.advertise);
    }

    #[test]
    fn test_common_parameters_resolve_for_any_type() {
        let config = Config::default();
        let last_updated = resolve("Observation", "_lastUpdated", &config).unwrap();
        assert_eq!(
            last_updated.definition,
            "http://hl7.org/fhir/SearchParameter/Resource-lastUpdated"
        );
        assert_eq!(last_updated.value_type, "date");
    }

    #[test]
    fn test_scoped_parameter_does_not_leak_to_other_types() {
        let config = Config::default();
        assert!(resolve("Observation", "family", &config).is_none());
    }

    #[test]
    fn test_unknown_parameter_resolves_to_none() {
        let config = Config::default();
        assert!(resolve("Patient", "nickname", &config).is_none());
    }

    #[test]
    fn test_configured_extension_resolves() {
        let config = config_with_nickname(true);
        let nickname = resolve("Patient", "nickname", &config).unwrap();
        assert_eq!(nickname.definition, "https://hostname/nickname");
        assert_eq!(nickname.value_type, "string");
        assert_eq!(nickname.documentation, "Nickname");
        assert!(nickname.advertise);
    }

    #[test]
    fn test_unadvertised_extension_still_resolves() {
        let config = config_with_nickname(false);
        let nickname = resolve("Patient", "nickname", &config).unwrap();
        assert!(!nickname.advertise);
    }

    #[test]
    fn test_configuration_overrides_builtin() {
        let mut config = Config::default();
        config.search_parameters.entry("Patient".to_string()).or_default().insert(
            "family".to_string(),
            SearchParameterConfig {
                value_type: "string".to_string(),
                description: "Family name, locally redefined".to_string(),
                uri: "https://hostname/family".to_string(),
                include_in_capability_statement: true,
            },
        );

        let family = resolve("Patient", "family", &config).unwrap();
        assert_eq!(family.definition, "https://hostname/family");
        assert_eq!(family.documentation, "Family name, locally redefined");
    }
}
