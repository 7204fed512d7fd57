//! `google.api.Service` YAML files.
//!
//! Only the parts the generator consumes are modelled; unknown keys are
//! ignored.
//!
//! ```yaml
//! type: google.api.Service
//! name: secretmanager.googleapis.com
//! title: Secret Manager API
//! apis:
//! - name: google.cloud.secretmanager.v1.SecretManagerService
//! documentation:
//!   summary: Stores sensitive data such as API keys.
//!   rules:
//!   - selector: google.cloud.secretmanager.v1.Secret
//!     description: A secret.
//! publishing:
//!   method_settings:
//!   - selector: google.cloud.secretmanager.v1.SecretManagerService.CreateSecret
//!     auto_populated_fields:
//!     - request_id
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

/// The subset of `google.api.Service` used by the generator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Service name, e.g. `secretmanager.googleapis.com`.
    pub name: String,
    /// Product title.
    pub title: String,
    /// Fully qualified interface names, in order.
    pub apis: Vec<String>,
    /// `documentation.summary`.
    pub summary: String,
    /// `documentation.rules`: selector → description.
    pub documentation_rules: BTreeMap<String, String>,
    /// `publishing.method_settings`: selector → auto-populated field names.
    pub auto_populated_fields: BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawService {
    name: Option<String>,
    title: String,
    apis: Vec<RawApi>,
    documentation: RawDocumentation,
    publishing: RawPublishing,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawApi {
    name: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawDocumentation {
    summary: String,
    rules: Vec<RawRule>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawRule {
    selector: String,
    description: String,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawPublishing {
    method_settings: Vec<RawMethodSettings>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawMethodSettings {
    selector: String,
    auto_populated_fields: Vec<String>,
}

impl ServiceConfig {
    /// Load and check a service config file.
    ///
    /// # Errors
    ///
    /// [`Error::ServiceConfig`] when the file cannot be read or parsed, and
    /// [`Error::ServiceConfigMissingName`] when it has no `name`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::ServiceConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_yaml(path, &content)
    }

    /// Parse service config YAML; `path` is only used in errors.
    ///
    /// # Errors
    ///
    /// See [`ServiceConfig::load`].
    pub fn from_yaml(path: &Path, content: &str) -> Result<Self> {
        let raw: RawService = serde_yaml_ng::from_str(content).map_err(|e| Error::ServiceConfig {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let name = raw
            .name
            .filter(|n| !n.is_empty())
            .ok_or_else(|| Error::ServiceConfigMissingName {
                path: path.to_path_buf(),
            })?;
        Ok(Self {
            name,
            title: raw.title,
            apis: raw.apis.into_iter().map(|a| a.name).collect(),
            summary: raw.documentation.summary,
            documentation_rules: raw
                .documentation
                .rules
                .into_iter()
                .map(|r| (r.selector, r.description))
                .collect(),
            auto_populated_fields: raw
                .publishing
                .method_settings
                .into_iter()
                .map(|m| (m.selector, m.auto_populated_fields))
                .collect(),
        })
    }

    /// The package of the first listed API: `google.cloud.secretmanager.v1`
    /// for `google.cloud.secretmanager.v1.SecretManagerService`.
    #[must_use]
    pub fn api_package(&self) -> Option<&str> {
        self.apis.first().and_then(|a| a.rsplit_once('.')).map(|(p, _)| p)
    }

    /// The short API name: `secretmanager` for `secretmanager.googleapis.com`.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.name.split('.').next().unwrap_or(&self.name)
    }

    /// Documentation override for an element ID (leading `.` optional).
    #[must_use]
    pub fn documentation_for(&self, id: &str) -> Option<&str> {
        self.documentation_rules
            .get(id.strip_prefix('.').unwrap_or(id))
            .map(String::as_str)
    }

    /// Auto-populated field names for a method ID (leading `.` optional).
    #[must_use]
    pub fn auto_populated_for(&self, method_id: &str) -> &[String] {
        self.auto_populated_fields
            .get(method_id.strip_prefix('.').unwrap_or(method_id))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Explicit specification-source → service-config table.
///
/// Consulted before the caller's default path; built once from
/// configuration and passed by reference.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ServiceConfigOverrides(pub BTreeMap<String, PathBuf>);

impl ServiceConfigOverrides {
    /// The override for `specification_source`, or `default`.
    #[must_use]
    pub fn resolve(&self, specification_source: &str, default: Option<&Path>) -> Option<PathBuf> {
        self.0
            .get(specification_source.trim_end_matches('/'))
            .cloned()
            .or_else(|| default.map(Path::to_path_buf))
    }
}
