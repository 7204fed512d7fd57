//! Structured overrides applied to a model after cross-referencing.
//!
//! These are plain data: the generator's configuration file deserializes
//! them and passes them to the transformation functions by reference.
//!
//! ```toml
//! [[documentation-overrides]]
//! id = ".google.cloud.secretmanager.v1.Secret"
//! match = "[Secret][google.cloud.secretmanager.v1.Secret]"
//! replace = "Secret"
//!
//! [[pagination-overrides]]
//! id = ".google.cloud.compute.v1.Instances.AggregatedList"
//! item-field = "items"
//!
//! [discovery]
//! operation-id = ".google.cloud.compute.v1.Operation"
//! pollers = [
//!   { prefix = "compute/v1/projects/{project}/zones/{zone}", method-id = ".google.cloud.compute.v1.zoneOperations.get" },
//! ]
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

/// Replace literal text in the documentation of one element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DocumentationOverride {
    /// Element ID (message, field, enum, enum value, service, method).
    pub id: String,
    /// Text that must appear in the current documentation.
    #[serde(rename = "match")]
    pub match_: String,
    /// Replacement text.
    pub replace: String,
}

/// Select the pagination item field of one method.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PaginationOverride {
    /// Method ID.
    pub id: String,
    /// Name of the response field holding the items.
    pub item_field: String,
}

/// Include or skip lists of element IDs.
///
/// At most one list may be non-empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ModelFilter {
    /// Keep these elements and everything they depend on.
    pub included_ids: Vec<String>,
    /// Remove exactly these elements.
    pub skipped_ids: Vec<String>,
}

impl ModelFilter {
    /// Read `included-ids` and `skipped-ids` from parser options, as
    /// comma-separated lists.
    #[must_use]
    pub fn from_options(options: &BTreeMap<String, String>) -> Self {
        let list = |key: &str| -> Vec<String> {
            options
                .get(key)
                .map(|v| {
                    v.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(ToString::to_string)
                        .collect()
                })
                .unwrap_or_default()
        };
        Self {
            included_ids: list("included-ids"),
            skipped_ids: list("skipped-ids"),
        }
    }

    /// Whether neither list is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.included_ids.is_empty() && self.skipped_ids.is_empty()
    }
}

/// Long-running operation configuration for Discovery documents.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DiscoveryConfig {
    /// ID of the message returned by LRO methods.
    pub operation_id: String,
    /// Pollers, in priority order.
    pub pollers: Vec<Poller>,
}

/// A polling method for operations whose method path starts with `prefix`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Poller {
    /// Path prefix, e.g. `compute/v1/projects/{project}/zones/{zone}`.
    pub prefix: String,
    /// ID of the method that polls the operation.
    pub method_id: String,
}

impl DiscoveryConfig {
    /// The first poller, in list order, whose prefix starts `path`.
    ///
    /// Matching is segment-bounded: the prefix must be followed by `/` or
    /// the end of `path`, so `v1/projects` does not match `v1/projectsX`.
    /// A longer prefix listed later never overrides an earlier match.
    #[must_use]
    pub fn poller_for(&self, path: &str) -> Option<&Poller> {
        self.pollers.iter().find(|p| {
            path.strip_prefix(p.prefix.as_str())
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn filter_from_options() {
        let options = BTreeMap::from([
            ("included-ids".to_string(), ".a.B, .a.C,".to_string()),
            ("other".to_string(), "x".to_string()),
        ]);
        let filter = ModelFilter::from_options(&options);
        assert_eq!(filter.included_ids, vec![".a.B", ".a.C"]);
        assert!(filter.skipped_ids.is_empty());
        assert!(!filter.is_empty());
        assert!(ModelFilter::from_options(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn deserialize_kebab_case() {
        let json = serde_json::json!({
            "operation-id": ".a.Operation",
            "pollers": [{"prefix": "v1/projects/{project}", "method-id": ".a.Ops.get"}]
        });
        let config: DiscoveryConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.pollers[0].method_id, ".a.Ops.get");

        let json = serde_json::json!({"id": ".a.B", "match": "x", "replace": "y"});
        let doc: DocumentationOverride = serde_json::from_value(json).unwrap();
        assert_eq!(doc.match_, "x");
    }

    #[test]
    fn first_matching_poller_wins() {
        let poller = |prefix: &str, method_id: &str| Poller {
            prefix: prefix.to_string(),
            method_id: method_id.to_string(),
        };
        let config = DiscoveryConfig {
            operation_id: ".a.Operation".to_string(),
            pollers: vec![
                poller("v1/projects/{project}/zones/{zone}", ".a.zoneOperations.get"),
                poller("v1/projects/{project}", ".a.globalOperations.get"),
            ],
        };
        let chosen = config.poller_for("v1/projects/{project}/zones/{zone}/instances");
        assert_eq!(chosen.unwrap().method_id, ".a.zoneOperations.get");
        let chosen = config.poller_for("v1/projects/{project}/global/networks");
        assert_eq!(chosen.unwrap().method_id, ".a.globalOperations.get");
        assert!(config.poller_for("v1/projectsX").is_none());

        let broad_first = DiscoveryConfig {
            pollers: config.pollers.iter().rev().cloned().collect(),
            ..config.clone()
        };
        let chosen = broad_first.poller_for("v1/projects/{project}/zones/{zone}/instances");
        assert_eq!(chosen.unwrap().method_id, ".a.globalOperations.get");
    }
}
