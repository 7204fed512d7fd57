//! Rust annotations.
//!
//! Options, in addition to the shared ones:
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `module-path` | Rust path of the generated model module (default `crate::model`) |
//! | `release-level` | `preview` (default) or `stable` |
//! | `per-service-features` | One cargo feature per service (`true`/`false`) |
//! | `default-features` | Comma list; default: every service feature |
//! | `disabled-rustdoc-warnings` | Comma list of `rustdoc::` lints to allow |
//! | `disabled-clippy-warnings` | Comma list of `clippy::` lints to allow |
//! | `output-dir` | Where the crate is written, for `path=` dependencies |
//! | `package:<name>` | `package=<crate>,source=<proto package>,version=<v>,path=<dir>,feature=<f>,force-used=true` |
//!
//! Every protobuf package a local element references must be the `source`
//! of some `package:` option.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sidekick_api::casing::{to_pascal_case, to_snake_case};
use sidekick_api::path::PathSegment;
use sidekick_api::{wkt, Enum, Field, Message, Method, Model, Service, Typez};
use tracing::debug;

use super::{
    bool_option, copyright_year, disambiguate, doc_lines, list_option, package_options,
    parse_key_values, referenced_packages, relative_path, type_name, CodecOptions,
};
use crate::error::{Error, Result};

const CODEC: &str = "rust";

/// Keywords usable as raw identifiers.
const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do", "dyn", "else", "enum",
    "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in", "let", "loop", "macro", "match", "mod",
    "move", "mut", "override", "priv", "pub", "ref", "return", "static", "struct", "trait", "true", "try", "type",
    "typeof", "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

/// Keywords that cannot be raw identifiers.
const NON_RAW_KEYWORDS: &[&str] = &["crate", "self", "Self", "super"];

/// Model-wide annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAnnotation {
    /// Crate name, e.g. `google-cloud-secretmanager-v1`.
    pub package_name: String,
    /// The crate name as an identifier.
    pub package_ident: String,
    /// Crate version.
    pub version: String,
    /// `preview` or `stable`.
    pub release_level: String,
    /// License header year.
    pub copyright_year: String,
    /// Rust path of the model module.
    pub module_path: String,
    /// Crate documentation as `//!` lines.
    pub doc_lines: Vec<String>,
    /// Dependencies the generated code needs, sorted by name.
    pub dependencies: Vec<Dependency>,
    /// The model has at least one service.
    pub has_services: bool,
    /// Some method is a long-running operation.
    pub has_lro: bool,
    /// Services are gated by cargo features.
    pub per_service_features: bool,
    /// Per-service feature names, sorted.
    pub features: Vec<String>,
    /// Features enabled by default, sorted.
    pub default_features: Vec<String>,
    /// `rustdoc::` lints to allow.
    pub disabled_rustdoc_warnings: Vec<String>,
    /// `clippy::` lints to allow.
    pub disabled_clippy_warnings: Vec<String>,
}

/// A `[dependencies]` entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Key in `[dependencies]`, also the identifier used in generated code.
    pub name: String,
    /// Crate name on crates.io.
    pub package: String,
    /// Version requirement.
    pub version: Option<String>,
    /// Path relative to the generated crate.
    pub path: Option<String>,
    /// Crate features to enable.
    pub features: Vec<String>,
}

/// Message annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAnnotation {
    /// Struct name.
    pub name: String,
    /// Fully qualified Rust path.
    pub qualified_name: String,
    /// Module holding the nested messages and enums.
    pub module_name: String,
    /// Protobuf name without the leading dot.
    pub source_fqn: String,
    /// Rustdoc lines.
    pub doc_lines: Vec<String>,
    /// Has nested messages (map entries excluded) or enums.
    pub has_nested_types: bool,
}

/// Field annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAnnotation {
    /// Struct field name, escaped.
    pub field_name: String,
    /// Setter name.
    pub set_name: String,
    /// JSON name.
    pub json_name: String,
    /// Full Rust type of the struct field.
    pub field_type: String,
    /// Element type: the value type for maps and repeated fields.
    pub primitive_type: String,
    /// `#[serde_as(as = ...)]` type, when the JSON form differs.
    pub serde_as: Option<String>,
    /// `skip_serializing_if` predicate.
    pub skip_if: String,
    /// Stored behind `Box` because the field is recursive.
    pub boxed: bool,
    /// Wrapped in `Option`.
    pub optional: bool,
    /// Type name to use in documentation examples.
    pub message_name_in_examples: String,
    /// Rustdoc lines.
    pub doc_lines: Vec<String>,
}

/// Enum annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumAnnotation {
    /// Type name.
    pub name: String,
    /// Fully qualified Rust path.
    pub qualified_name: String,
    /// Variant used by `Default`: the first value.
    pub default_value: String,
    /// Rustdoc lines.
    pub doc_lines: Vec<String>,
}

/// Enum value annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValueAnnotation {
    /// Variant name, unique within the enum.
    pub variant_name: String,
    /// Rustdoc lines.
    pub doc_lines: Vec<String>,
}

/// Service annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAnnotation {
    /// Client struct name.
    pub name: String,
    /// Module name.
    pub module_name: String,
    /// Cargo feature gating the service, if any.
    pub feature: Option<String>,
    /// Default endpoint host.
    pub default_host: String,
    /// Rustdoc lines.
    pub doc_lines: Vec<String>,
}

/// Method annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodAnnotation {
    /// Function name, escaped.
    pub name: String,
    /// Request builder name.
    pub builder_name: String,
    /// Request type path.
    pub request_type: String,
    /// Response type path, `()` for `Empty`.
    pub response_type: String,
    /// Upper-case HTTP verb of the primary binding.
    pub verb: String,
    /// `format!` string of the primary path, `{}` per variable.
    pub path_format: String,
    /// One expression per `{}` in `path_format`.
    pub path_args: Vec<String>,
    /// One statement per query parameter.
    pub query_lines: Vec<String>,
    /// `api_version` of the service, unchanged.
    pub api_version: Option<String>,
    /// Not paginated, streaming or long-running.
    pub is_simple: bool,
    /// Pagination item field, escaped.
    pub pagination_items: Option<String>,
    /// Long-running in either style.
    pub is_lro: bool,
    /// Routing header keys.
    pub routing_keys: Vec<String>,
    /// Rustdoc lines.
    pub doc_lines: Vec<String>,
}

/// An escaped Rust identifier for a field, module or function name.
#[must_use]
pub fn escape_keyword(name: &str) -> String {
    if NON_RAW_KEYWORDS.contains(&name) {
        format!("{name}_")
    } else if KEYWORDS.contains(&name) {
        format!("r#{name}")
    } else {
        name.to_string()
    }
}

fn field_name(name: &str) -> String {
    escape_keyword(&to_snake_case(name))
}

/// The Rust type of a scalar, and the `serde_as` marker when its JSON form
/// is not the natural one.
fn primitive(typez: Typez, internal: &str) -> (&'static str, Option<String>) {
    let marker = |m: &str| Some(format!("{internal}::internal::{m}"));
    match typez {
        Typez::Double => ("f64", marker("F64")),
        Typez::Float => ("f32", marker("F32")),
        Typez::Int64 | Typez::Sint64 | Typez::Sfixed64 => ("i64", marker("I64")),
        Typez::Uint64 | Typez::Fixed64 => ("u64", marker("U64")),
        Typez::Int32 | Typez::Sint32 | Typez::Sfixed32 => ("i32", marker("I32")),
        Typez::Uint32 | Typez::Fixed32 => ("u32", marker("U32")),
        Typez::Bool => ("bool", None),
        Typez::String => ("std::string::String", None),
        Typez::Bytes => ("::bytes::Bytes", Some("serde_with::base64::Base64".to_string())),
        Typez::Message | Typez::Group | Typez::Enum => ("", None),
    }
}

fn needs_internal_markers(typez: Typez) -> bool {
    !matches!(
        typez,
        Typez::Bool | Typez::String | Typez::Bytes | Typez::Message | Typez::Group | Typez::Enum
    )
}

/// Whether a field is a plain value, skipped when it equals its default.
fn uses_is_default(field: &Field) -> bool {
    !field.repeated && !field.map && !field.typez.is_message() && !field.optional && !field.is_oneof
}

/// Resolves type paths across the local package and dependencies.
struct Context<'a> {
    model: &'a Model,
    module_path: String,
    /// Protobuf package → dependency name.
    crates: BTreeMap<String, String>,
}

impl Context<'_> {
    /// Rust path prefix for elements of `package`.
    fn package_root(&self, package: &str) -> Result<String> {
        if package == self.model.package_name {
            return Ok(self.module_path.clone());
        }
        self.crates
            .get(package)
            .cloned()
            .ok_or_else(|| Error::MissingDependencyConstraint {
                package: package.to_string(),
            })
    }

    /// Path of the crate holding the serialization helpers.
    fn internal_root(&self) -> Result<String> {
        if self.model.package_name == wkt::PACKAGE {
            return Ok("crate".to_string());
        }
        self.package_root(wkt::PACKAGE)
    }

    /// `{root}::{parent_module}::..::{Name}` for a message or enum.
    fn qualified_name(&self, id: &str) -> Result<String> {
        let (name, package, mut parent) = if let Some(m) = self.model.message(id) {
            (m.name.as_str(), m.package.as_str(), m.parent_id.as_deref())
        } else if let Some(e) = self.model.enum_(id) {
            (e.name.as_str(), e.package.as_str(), e.parent_id.as_deref())
        } else {
            return Err(sidekick_api::Error::UnresolvedReference {
                from: "rust codec".to_string(),
                id: id.to_string(),
            }
            .into());
        };
        let mut modules = Vec::new();
        while let Some(parent_id) = parent {
            let Some(p) = self.model.message(parent_id) else { break };
            modules.push(escape_keyword(&to_snake_case(&p.name)));
            parent = p.parent_id.as_deref();
        }
        modules.reverse();
        let mut path = self.package_root(package)?;
        for module in modules {
            path.push_str("::");
            path.push_str(&module);
        }
        Ok(format!("{path}::{}", escape_keyword(name)))
    }

    /// Element type and `serde_as` marker of a single value of `field`.
    fn element(&self, field: &Field) -> Result<(String, Option<String>)> {
        match field.typez {
            Typez::Message | Typez::Group | Typez::Enum => Ok((self.qualified_name(&field.typez_id)?, None)),
            typez => {
                let internal = if needs_internal_markers(typez) {
                    self.internal_root()?
                } else {
                    String::new()
                };
                let (name, marker) = primitive(typez, &internal);
                Ok((name.to_string(), marker))
            }
        }
    }

    fn field(&self, message: &Message, field: &Field) -> Result<FieldAnnotation> {
        let (element, marker) = self.element(field)?;
        let boxed = field.recursive && field.typez.is_message() && !field.repeated && !field.map;
        let optional = !field.repeated && !field.map && (field.typez.is_message() || field.optional || field.is_oneof);

        let (field_type, serde_as, skip_if) = if field.map {
            let entry = self.model.field_message(field);
            let key = entry.and_then(|e| e.field("key"));
            let value = entry.and_then(|e| e.field("value"));
            let (Some(key), Some(value)) = (key, value) else {
                return Err(sidekick_api::Error::UnresolvedReference {
                    from: field.id.clone(),
                    id: format!("{}.key/value", field.typez_id),
                }
                .into());
            };
            let (key_type, key_marker) = self.element(key)?;
            let key_marker = if key.typez == Typez::String {
                None
            } else {
                key_marker.or_else(|| Some("serde_with::DisplayFromStr".to_string()))
            };
            let (value_type, value_marker) = self.element(value)?;
            let serde_as = (key_marker.is_some() || value_marker.is_some()).then(|| {
                format!(
                    "std::collections::HashMap<{}, {}>",
                    key_marker.unwrap_or_else(|| "serde_with::Same".to_string()),
                    value_marker.unwrap_or_else(|| "serde_with::Same".to_string())
                )
            });
            (
                format!("std::collections::HashMap<{key_type}, {value_type}>"),
                serde_as,
                "std::collections::HashMap::is_empty".to_string(),
            )
        } else if field.repeated {
            (
                format!("std::vec::Vec<{element}>"),
                marker.map(|m| format!("std::vec::Vec<{m}>")),
                "std::vec::Vec::is_empty".to_string(),
            )
        } else if optional {
            let inner = if boxed {
                format!("std::boxed::Box<{element}>")
            } else {
                element.clone()
            };
            (
                format!("std::option::Option<{inner}>"),
                marker.map(|m| format!("std::option::Option<{m}>")),
                "std::option::Option::is_none".to_string(),
            )
        } else {
            (element.clone(), marker, format!("{}::internal::is_default", self.internal_root()?))
        };

        let referenced = type_name(self.model, field);
        let message_name_in_examples = if !referenced.is_empty() && referenced == message.name {
            to_pascal_case(&field.name)
        } else {
            referenced.to_string()
        };

        Ok(FieldAnnotation {
            field_name: field_name(&field.name),
            set_name: format!("set_{}", to_snake_case(&field.name)),
            json_name: field.json_name.clone(),
            field_type,
            primitive_type: element,
            serde_as,
            skip_if,
            boxed,
            optional,
            message_name_in_examples,
            doc_lines: doc_lines(&field.documentation, "///"),
        })
    }

    fn message(&self, message: &Message) -> Result<MessageAnnotation> {
        let has_nested_types = !message.enums.is_empty()
            || self.model.nested_messages(message).any(|m| !m.is_map);
        Ok(MessageAnnotation {
            name: escape_keyword(&message.name),
            qualified_name: self.qualified_name(&message.id)?,
            module_name: escape_keyword(&to_snake_case(&message.name)),
            source_fqn: message.id.trim_start_matches('.').to_string(),
            doc_lines: doc_lines(&message.documentation, "///"),
            has_nested_types,
        })
    }

    fn enum_(&self, enum_: &Enum) -> Result<(EnumAnnotation, Vec<EnumValueAnnotation>)> {
        let names = disambiguate(
            enum_.values.iter().map(|v| escape_keyword(&to_pascal_case(&v.name))).collect(),
            "_",
        );
        let default_value = names.first().cloned().unwrap_or_default();
        let values = enum_
            .values
            .iter()
            .zip(names)
            .map(|(value, variant_name)| EnumValueAnnotation {
                variant_name,
                doc_lines: doc_lines(&value.documentation, "///"),
            })
            .collect();
        Ok((
            EnumAnnotation {
                name: escape_keyword(&enum_.name),
                qualified_name: self.qualified_name(&enum_.id)?,
                default_value,
                doc_lines: doc_lines(&enum_.documentation, "///"),
            },
            values,
        ))
    }

    fn method(&self, method: &Method) -> Result<MethodAnnotation> {
        let request_type = self.qualified_name(&method.input_type_id)?;
        let response_type = if method.returns_empty {
            "()".to_string()
        } else {
            self.qualified_name(&method.output_type_id)?
        };
        let binding = method.primary_binding();
        let (path_format, path_args) = binding.map_or_else(
            || (String::new(), Vec::new()),
            |b| {
                let mut format = String::new();
                let mut args = Vec::new();
                for segment in &b.path_template.segments {
                    format.push('/');
                    match segment {
                        PathSegment::Literal(l) => format.push_str(l),
                        PathSegment::Variable(v) => {
                            format.push_str("{}");
                            args.push(accessor(&v.field_path));
                        }
                    }
                }
                if let Some(verb) = &b.path_template.verb {
                    format.push(':');
                    format.push_str(verb);
                }
                (format, args)
            },
        );

        let mut query_lines = Vec::new();
        if let (Some(binding), Some(input)) = (binding, self.model.input_type(method)) {
            for name in &binding.query_parameters {
                if let Some(field) = input.field(name) {
                    query_lines.push(query_line(field));
                }
            }
        }

        Ok(MethodAnnotation {
            name: field_name(&method.name),
            builder_name: to_pascal_case(&method.name),
            request_type,
            response_type,
            verb: binding.map(|b| b.verb.clone()).unwrap_or_default(),
            path_format,
            path_args,
            query_lines,
            api_version: method.api_version.clone(),
            is_simple: self.model.is_simple(method),
            pagination_items: method.pagination.as_ref().map(|p| field_name(&p.item_field)),
            is_lro: method.operation_info.is_some() || method.discovery_lro.is_some(),
            routing_keys: method.routing.iter().map(|r| r.name.clone()).collect(),
            doc_lines: doc_lines(&method.documentation, "///"),
        })
    }

    fn service(&self, service: &Service, per_service_features: bool) -> ServiceAnnotation {
        let module_name = to_snake_case(&service.name);
        ServiceAnnotation {
            name: escape_keyword(&to_pascal_case(&service.name)),
            feature: per_service_features.then(|| module_name.replace('_', "-")),
            module_name: escape_keyword(&module_name),
            default_host: service.default_host.clone(),
            doc_lines: doc_lines(&service.documentation, "///"),
        }
    }
}

/// `req.name`, or a chain through optional messages for nested paths.
fn accessor(field_path: &[String]) -> String {
    let Some((first, rest)) = field_path.split_first() else {
        return String::new();
    };
    let mut expr = format!("req.{}", field_name(first));
    let Some((last, middle)) = rest.split_last() else {
        return format!("&{expr}");
    };
    for part in middle {
        expr = format!("{expr}.as_ref().and_then(|m| m.{}.as_ref())", field_name(part));
    }
    format!("{expr}.as_ref().map(|m| m.{}.as_str()).unwrap_or_default()", field_name(last))
}

fn is_custom_encoded(typez_id: &str) -> bool {
    [wkt::DURATION, wkt::TIMESTAMP, wkt::FIELD_MASK].contains(&typez_id) || wkt::wrapped_scalar(typez_id).is_some()
}

/// One statement adding `field` to a `reqwest::RequestBuilder` named
/// `builder`.
fn query_line(field: &Field) -> String {
    let name = field_name(&field.name);
    let json = &field.json_name;
    if field.map {
        return format!(
            "let builder = req.{name}.iter().fold(builder, |builder, (k, v)| builder.query(&[(format!(\"{json}[{{k}}]\"), v)]));"
        );
    }
    if field.repeated {
        return format!("let builder = req.{name}.iter().fold(builder, |builder, p| builder.query(&[(\"{json}\", p)]));");
    }
    if field.typez.is_message() {
        if is_custom_encoded(&field.typez_id) {
            return format!(
                "let builder = req.{name}.as_ref().map(|p| serde_json::to_value(p).map_err(Error::ser)).transpose()?.into_iter().fold(builder, |builder, v| builder.query(&[(\"{json}\", v)]));"
            );
        }
        return format!(
            "let builder = req.{name}.as_ref().map(|p| serde_json::to_value(p).map_err(Error::ser)).transpose()?.into_iter().fold(builder, |builder, p| {{ use gaxi::query_parameter::QueryParameter; p.add(builder, \"{json}\") }});"
        );
    }
    if field.optional || field.is_oneof {
        return format!("let builder = req.{name}.iter().fold(builder, |builder, p| builder.query(&[(\"{json}\", p)]));");
    }
    format!("let builder = builder.query(&[(\"{json}\", &req.{name})]);")
}

/// A parsed `package:<name>` option.
#[derive(Debug, Default)]
struct PackageSpec {
    name: String,
    package: String,
    sources: Vec<String>,
    version: Option<String>,
    path: Option<String>,
    features: Vec<String>,
    force_used: bool,
}

fn parse_package_spec(name: &str, value: &str) -> Result<PackageSpec> {
    let option = format!("package:{name}");
    let mut spec = PackageSpec {
        name: name.replace('-', "_"),
        ..PackageSpec::default()
    };
    for (key, v) in parse_key_values(&option, value)? {
        match key {
            "package" => spec.package = v.to_string(),
            "source" => spec.sources.push(v.to_string()),
            "version" => spec.version = Some(v.to_string()),
            "path" => spec.path = Some(v.to_string()),
            "feature" => spec.features.push(v.to_string()),
            "force-used" => spec.force_used = v == "true",
            other => return Err(Error::invalid_option(&option, value, format!("unknown key `{other}`"))),
        }
    }
    if spec.package.is_empty() {
        return Err(Error::invalid_option(&option, value, "missing `package=`"));
    }
    Ok(spec)
}

/// Resolve the `package:` options against the packages the model uses.
///
/// Returns the protobuf package → dependency name table and the sorted
/// dependency list.
fn resolve_dependencies(
    options: &CodecOptions,
    referenced: &BTreeSet<String>,
) -> Result<(BTreeMap<String, String>, Vec<Dependency>)> {
    let specs = package_options(options)
        .map(|(name, value)| parse_package_spec(name, value))
        .collect::<Result<Vec<_>>>()?;

    let mut crates = BTreeMap::new();
    for spec in &specs {
        for source in &spec.sources {
            crates.insert(source.clone(), spec.name.clone());
        }
    }
    if let Some(missing) = referenced.iter().find(|p| !crates.contains_key(*p)) {
        return Err(Error::MissingDependencyConstraint {
            package: missing.clone(),
        });
    }

    let output_dir = options.get("output-dir");
    let mut dependencies = Vec::new();
    for spec in specs {
        let used = spec.force_used || spec.sources.iter().any(|s| referenced.contains(s));
        if !used {
            continue;
        }
        let path = match (&spec.path, output_dir) {
            (Some(path), Some(dir)) => Some(relative_path(Path::new(dir), Path::new(path))?.to_string_lossy().to_string()),
            (Some(_), None) => return Err(Error::missing_option(CODEC, "output-dir")),
            (None, _) => None,
        };
        debug!(dependency = %spec.name, package = %spec.package, "rust dependency");
        dependencies.push(Dependency {
            name: spec.name,
            package: spec.package,
            version: spec.version,
            path,
            features: spec.features,
        });
    }
    dependencies.sort_by(|a, b| a.name.cmp(&b.name));
    Ok((crates, dependencies))
}

/// Annotate `model` for Rust and return the model-wide annotation.
///
/// # Errors
///
/// See [`super::annotate_model`].
pub fn annotate_model(model: &Model, options: &CodecOptions) -> Result<ModelAnnotation> {
    let package_name = match options.get("package-name-override") {
        Some(name) => name.clone(),
        None if model.package_name.is_empty() => return Err(Error::missing_option(CODEC, "package-name-override")),
        None => model.package_name.replace('.', "-"),
    };
    let per_service_features = bool_option(options, "per-service-features", false)?;
    let release_level = options.get("release-level").cloned().unwrap_or_else(|| "preview".to_string());
    if !matches!(release_level.as_str(), "preview" | "stable") {
        return Err(Error::invalid_option("release-level", &release_level, "expected `preview` or `stable`"));
    }

    let mut referenced = referenced_packages(model);
    let uses_internal = model
        .all_messages()
        .iter()
        .flat_map(|m| &m.fields)
        .any(|f| needs_internal_markers(f.typez) || uses_is_default(f));
    if uses_internal && model.package_name != wkt::PACKAGE {
        referenced.insert(wkt::PACKAGE.to_string());
    }
    let (crates, dependencies) = resolve_dependencies(options, &referenced)?;

    let context = Context {
        model,
        module_path: options.get("module-path").cloned().unwrap_or_else(|| "crate::model".to_string()),
        crates,
    };

    for message in model.all_messages() {
        message.codec.set(&message.id, &context.message(message)?)?;
        for field in &message.fields {
            field.codec.set(&field.id, &context.field(message, field)?)?;
        }
    }
    for enum_ in model.all_enums() {
        let (annotation, values) = context.enum_(enum_)?;
        enum_.codec.set(&enum_.id, &annotation)?;
        for (value, annotation) in enum_.values.iter().zip(values) {
            value.codec.set(&value.id, &annotation)?;
        }
    }
    let mut features = BTreeSet::new();
    for service in model.services() {
        let annotation = context.service(service, per_service_features);
        features.extend(annotation.feature.clone());
        service.codec.set(&service.id, &annotation)?;
        for method in model.methods_of(service) {
            method.codec.set(&method.id, &context.method(method)?)?;
        }
    }

    let features: Vec<String> = features.into_iter().collect();
    let mut default_features = if options.contains_key("default-features") {
        list_option(options, "default-features")
    } else {
        features.clone()
    };
    default_features.sort();
    default_features.dedup();

    let annotation = ModelAnnotation {
        package_ident: package_name.replace('-', "_"),
        package_name,
        version: options.get("version").cloned().unwrap_or_else(|| "0.1.0".to_string()),
        release_level,
        copyright_year: copyright_year(options),
        module_path: context.module_path.clone(),
        doc_lines: doc_lines(&model.description, "//!"),
        dependencies,
        has_services: !model.services.is_empty(),
        has_lro: model
            .all_methods()
            .iter()
            .any(|m| m.operation_info.is_some() || m.discovery_lro.is_some()),
        per_service_features,
        features,
        default_features,
        disabled_rustdoc_warnings: list_option(options, "disabled-rustdoc-warnings"),
        disabled_clippy_warnings: list_option(options, "disabled-clippy-warnings"),
    };
    model.codec.set(&model.package_name, &annotation)?;
    Ok(annotation)
}
