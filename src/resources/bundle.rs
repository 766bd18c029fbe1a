//! The search result envelope.

use serde::{Deserialize, Serialize};

use super::{AnyResource, FhirResource, ResourceError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BundleEntry {
    resource: AnyResource,
}

/// A `searchset` Bundle: total match count plus the matching resources in
/// order. The `entry` key is omitted entirely when nothing matched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    #[serde(rename = "type")]
    bundle_type: String,
    total: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    entry: Vec<BundleEntry>,
}

impl Bundle {
    /// Start an empty searchset.
    pub fn searchset() -> Self {
        Self {
            bundle_type: "searchset".to_string(),
            total: 0,
            entry: Vec::new(),
        }
    }

    /// Append a matching resource and count it.
    pub fn push<R: FhirResource>(&mut self, resource: &R) -> Result<(), ResourceError> {
        self.entry.push(BundleEntry {
            resource: AnyResource::from_typed(resource)?,
        });
        self.total += 1;
        Ok(())
    }

    /// Override the total match count, e.g. when returning one page of a
    /// larger result set.
    pub fn set_total(&mut self, total: u64) {
        self.total = total;
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.entry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_empty()
    }
}

impl FhirResource for Bundle {
    const RESOURCE_TYPE: &'static str = "Bundle";

    fn id(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Serialize, Deserialize)]
    struct Marker {
        code: String,
    }

    impl FhirResource for Marker {
        const RESOURCE_TYPE: &'static str = "Marker";

        fn id(&self) -> Option<&str> {
            None
        }
    }

    #[test]
    fn test_empty_searchset_omits_entry() {
        let bundle = Bundle::searchset();
        let body = AnyResource::from_typed(&bundle).unwrap();
        assert_eq!(
            body.to_value(),
            json!({"resourceType": "Bundle", "type": "searchset", "total": 0})
        );
    }

    #[test]
    fn test_entries_are_wrapped_and_counted() {
        let mut bundle = Bundle::searchset();
        bundle
            .push(&Marker {
                code: "a".to_string(),
            })
            .unwrap();
        let body = AnyResource::from_typed(&bundle).unwrap();
        assert_eq!(
            body.to_value(),
            json!({
                "resourceType": "Bundle",
                "type": "searchset",
                "total": 1,
                "entry": [{"resource": {"resourceType": "Marker", "code": "a"}}]
            })
        );
    }

    #[test]
    fn test_total_can_exceed_page() {
        let mut bundle = Bundle::searchset();
        bundle
            .push(&Marker {
                code: "a".to_string(),
            })
            .unwrap();
        bundle.set_total(40);
        assert_eq!(bundle.total(), 40);
        assert_eq!(bundle.len(), 1);
    }
}
