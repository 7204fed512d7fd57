//! Format parsers: protobuf descriptors, OpenAPI v3 and Discovery documents.
//!
//! Every parser returns an unresolved [`Api`] with the same guarantees:
//! globally unique IDs, syntactically valid `typez_id` references, and
//! packages consistent with ID prefixes. Two steps are shared by all
//! formats and run here after the format-specific work:
//!
//! - service config title, summary and documentation rules are applied;
//! - each binding's query parameters are computed from the request message.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use tracing::{debug, info};

use crate::config::DiscoveryConfig;
use crate::error::{Error, Result};
use crate::casing::to_snake_case;
use crate::model::Api;
use crate::service_config::ServiceConfig;

mod comments;
pub mod discovery;
pub mod openapi;
pub mod protobuf;
mod protoc;
mod schema;

/// Input document format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecificationFormat {
    /// `.proto` files or a pre-built descriptor set.
    #[default]
    Protobuf,
    /// An OpenAPI v3 document, JSON or YAML.
    OpenApi,
    /// A Google Discovery document.
    Discovery,
}

impl FromStr for SpecificationFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "protobuf" => Ok(Self::Protobuf),
            "openapi" => Ok(Self::OpenApi),
            "discovery" => Ok(Self::Discovery),
            other => Err(format!("unknown specification format `{other}`")),
        }
    }
}

impl fmt::Display for SpecificationFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Protobuf => "protobuf",
            Self::OpenApi => "openapi",
            Self::Discovery => "discovery",
        })
    }
}

/// Inputs of a parser run.
///
/// Built with [`ParserConfig::new`] and the `with_*` setters.
#[derive(Clone, Debug)]
pub struct ParserConfig<'a> {
    /// Input format.
    pub format: SpecificationFormat,
    /// Document path (OpenAPI, Discovery) or proto directory relative to the
    /// configured roots (protobuf).
    pub specification_source: PathBuf,
    /// Format-specific options (`roots`, `googleapis-root`, `descriptor-set`,
    /// `package-name`, ...).
    pub options: BTreeMap<String, String>,
    /// Parsed service config, if any.
    pub service_config: Option<&'a ServiceConfig>,
    /// Discovery LRO pollers.
    pub discovery: Option<&'a DiscoveryConfig>,
}

impl<'a> ParserConfig<'a> {
    /// Parse `specification_source` as `format`.
    #[must_use]
    pub fn new(format: SpecificationFormat, specification_source: impl Into<PathBuf>) -> Self {
        Self {
            format,
            specification_source: specification_source.into(),
            options: BTreeMap::new(),
            service_config: None,
            discovery: None,
        }
    }

    /// Set one option.
    #[must_use]
    pub fn with_option(mut self, key: &str, value: &str) -> Self {
        self.options.insert(key.to_string(), value.to_string());
        self
    }

    /// Replace all options.
    #[must_use]
    pub fn with_options(mut self, options: BTreeMap<String, String>) -> Self {
        self.options = options;
        self
    }

    /// Attach a service config.
    #[must_use]
    pub fn with_service_config(mut self, service_config: &'a ServiceConfig) -> Self {
        self.service_config = Some(service_config);
        self
    }

    /// Attach Discovery LRO configuration.
    #[must_use]
    pub fn with_discovery(mut self, discovery: &'a DiscoveryConfig) -> Self {
        self.discovery = Some(discovery);
        self
    }

    pub(crate) fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str).filter(|v| !v.is_empty())
    }
}

/// Parse the configured specification into an unresolved [`Api`].
///
/// # Errors
///
/// [`Error::Specification`] for a missing, directory or malformed input,
/// [`Error::Protoc`] when `protoc` fails, and
/// [`Error::InvalidPathTemplate`] for malformed HTTP paths.
pub fn parse(config: &ParserConfig<'_>) -> Result<Api> {
    info!(
        format = %config.format,
        source = %config.specification_source.display(),
        "parsing specification"
    );
    let mut api = match config.format {
        SpecificationFormat::Protobuf => protobuf::parse(config)?,
        SpecificationFormat::OpenApi => openapi::parse(config)?,
        SpecificationFormat::Discovery => discovery::parse(config)?,
    };
    if let Some(service_config) = config.service_config {
        apply_service_config(&mut api, service_config);
    }
    compute_query_parameters(&mut api);
    Ok(api)
}

/// Read a specification file.
///
/// Missing files, directories and unreadable files all map to
/// [`Error::Specification`].
pub(crate) fn read_document(path: &Path) -> Result<String> {
    if path.is_dir() {
        return Err(Error::specification(path, "expected a file, found a directory"));
    }
    std::fs::read_to_string(path).map_err(|e| Error::specification(path, e))
}

/// Read a JSON document, or YAML when the extension says so.
pub(crate) fn read_json_or_yaml(path: &Path) -> Result<serde_json::Value> {
    let content = read_document(path)?;
    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
    let value: serde_json::Value = if is_yaml {
        serde_yaml_ng::from_str(&content).map_err(|e| Error::specification(path, e))?
    } else {
        serde_json::from_str(&content).map_err(|e| Error::specification(path, e))?
    };
    if !value.is_object() {
        return Err(Error::specification(path, "document root is not an object"));
    }
    Ok(value)
}

/// Copy naming and documentation from the service config.
pub(crate) fn apply_service_config(api: &mut Api, service_config: &ServiceConfig) {
    api.name = service_config.short_name().to_string();
    if !service_config.title.is_empty() {
        api.title.clone_from(&service_config.title);
    }
    if !service_config.summary.is_empty() {
        api.description.clone_from(&service_config.summary);
    }

    let patch = |id: &str, documentation: &mut String| {
        if let Some(text) = service_config.documentation_for(id) {
            debug!(id, "documentation from service config");
            *documentation = text.to_string();
        }
    };
    let elements = &mut api.elements;
    for message in &mut elements.messages {
        patch(&message.id, &mut message.documentation);
        for field in &mut message.fields {
            patch(&field.id, &mut field.documentation);
        }
    }
    for enum_ in &mut elements.enums {
        patch(&enum_.id, &mut enum_.documentation);
        for value in &mut enum_.values {
            patch(&value.id, &mut value.documentation);
        }
    }
    for service in &mut elements.services {
        patch(&service.id, &mut service.documentation);
    }
    for method in &mut elements.methods {
        patch(&method.id, &mut method.documentation);
    }
}

/// Fill [`crate::PathBinding::query_parameters`] for every staged method.
///
/// A request field is a query parameter unless a path variable binds it (by
/// its first field path component) or it is the body field. A `*` body
/// leaves no query parameters.
pub(crate) fn compute_query_parameters(api: &mut Api) {
    let messages = &api.elements.messages;
    for method in &mut api.elements.methods {
        let Some(input) = messages.iter().find(|m| m.id == method.input_type_id) else {
            continue;
        };
        let body = method.path_info.body_field_path.as_deref();
        for binding in &mut method.path_info.bindings {
            if body == Some("*") {
                binding.query_parameters.clear();
                continue;
            }
            let bound: BTreeSet<&str> = binding
                .path_template
                .variables()
                .filter_map(|v| v.field_path.first().map(String::as_str))
                .collect();
            binding.query_parameters = input
                .fields
                .iter()
                .map(|f| f.name.as_str())
                .filter(|name| !bound.contains(name) && Some(*name) != body)
                .map(ToString::to_string)
                .collect();
        }
    }
}

/// `/v1/{projectId}/items` → `/v1/{project_id}/items`.
pub(crate) fn snake_case_variables(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..=open]);
        rest = &rest[open + 1..];
        let close = rest.find('}').unwrap_or(rest.len());
        let (name, spec) = rest[..close].split_once('=').map_or((&rest[..close], None), |(n, s)| (n, Some(s)));
        if let Some(name) = name.strip_prefix('+') {
            result.push('+');
            result.push_str(&to_snake_case(name));
        } else {
            result.push_str(&to_snake_case(name));
        }
        if let Some(spec) = spec {
            result.push('=');
            result.push_str(spec);
        }
        rest = &rest[close..];
    }
    result.push_str(rest);
    result
}
