//! Per-library configuration loaded from `.sidekick.toml`.
//!
//! Everything a library pipeline needs lives in one file next to the
//! generated code, so several libraries can be generated side by side
//! without shared state.
//!
//! # File format
//!
//! ```toml
//! [general]
//! language = "rust"
//! specification-format = "protobuf"
//! specification-source = "google/cloud/secretmanager/v1"
//! service-config = "googleapis/google/cloud/secretmanager/v1/secretmanager_v1.yaml"
//! output = "src/generated/cloud/secretmanager/v1"
//!
//! [source]
//! roots = "googleapis"
//! googleapis-root = "../googleapis"
//! skipped-ids = ".google.cloud.secretmanager.v1.Legacy"
//!
//! [codec]
//! copyright-year = "2026"
//! "package:wkt" = "package=google-cloud-wkt,source=google.protobuf,path=src/wkt"
//!
//! [[documentation-overrides]]
//! id = ".google.cloud.secretmanager.v1.Secret"
//! match = "[Secret][google.cloud.secretmanager.v1.Secret]"
//! replace = "Secret"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use sidekick_api::{
    DiscoveryConfig, DocumentationOverride, ModelFilter, PaginationOverride, ServiceConfigOverrides,
    SpecificationFormat,
};

use crate::codec::Language;
use crate::error::{Error, Result};

/// The contents of one `.sidekick.toml`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct LibraryConfig {
    /// Language, input and output locations.
    pub general: GeneralConfig,
    /// Parser options (`roots`, `<name>-root`, `descriptor-set`,
    /// `package-name`, `included-ids`, `skipped-ids`).
    #[serde(default)]
    pub source: BTreeMap<String, String>,
    /// Codec options, see [`crate::codec`].
    #[serde(default)]
    pub codec: BTreeMap<String, String>,
    /// Literal documentation replacements.
    #[serde(default)]
    pub documentation_overrides: Vec<DocumentationOverride>,
    /// Pagination item-field overrides.
    #[serde(default)]
    pub pagination_overrides: Vec<PaginationOverride>,
    /// Discovery LRO pollers.
    #[serde(default)]
    pub discovery: Option<DiscoveryConfig>,
    /// Specification source → service config path.
    #[serde(default)]
    pub service_config_overrides: ServiceConfigOverrides,
}

/// The `[general]` table.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct GeneralConfig {
    /// Target language.
    pub language: Language,
    /// Input format.
    #[serde(default)]
    pub specification_format: SpecificationFormat,
    /// Proto directory, or OpenAPI / Discovery document path.
    pub specification_source: String,
    /// Service config YAML.
    #[serde(default)]
    pub service_config: Option<PathBuf>,
    /// Output directory.
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Template set name; the language default when unset.
    #[serde(default)]
    pub template_set: Option<String>,
    /// Load templates from this directory instead of the embedded ones.
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
}

fn default_output() -> PathBuf {
    PathBuf::from("generated")
}

impl LibraryConfig {
    /// Read and parse a configuration file.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when the file is unreadable or malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_toml(path, &content)
    }

    /// Parse configuration text; `path` is only used in errors.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] when the text is not a valid configuration.
    pub fn from_toml(path: &Path, content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Include or skip lists from the `[source]` table.
    #[must_use]
    pub fn model_filter(&self) -> ModelFilter {
        ModelFilter::from_options(&self.source)
    }

    /// The service config to load: an override for the specification
    /// source wins over `general.service-config`.
    #[must_use]
    pub fn service_config_path(&self) -> Option<PathBuf> {
        self.service_config_overrides
            .resolve(&self.general.specification_source, self.general.service_config.as_deref())
    }
}
