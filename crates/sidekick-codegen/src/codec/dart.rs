//! Dart annotations.
//!
//! Required options: `issue-tracker-url`, `api-keys-environment-variables`.
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `proto:<package>` | Dart import for types of a protobuf package |
//! | `package:<dart package>` | Version constraint for a Dart dependency |
//! | `repository-url` | `repository:` entry of the pubspec |
//!
//! Every import named by a `proto:` option must have a `package:`
//! constraint for the Dart package it lives in.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use sidekick_api::casing::{to_lower_camel_case, to_pascal_case, to_snake_case};
use sidekick_api::path::PathSegment;
use sidekick_api::{wkt, Enum, Field, Message, Method, Model, Service, Typez};
use tracing::debug;

use super::{
    copyright_year, disambiguate, doc_lines, list_option, package_options, referenced_packages, require_options,
    CodecOptions,
};
use crate::error::{Error, Result};

const CODEC: &str = "dart";

const REQUIRED_OPTIONS: &[&str] = &["issue-tracker-url", "api-keys-environment-variables"];

/// Reserved words plus `Object` members that fields must not shadow.
const RESERVED: &[&str] = &[
    "abstract", "as", "assert", "async", "await", "base", "break", "case", "catch", "class", "const", "continue",
    "covariant", "default", "deferred", "do", "dynamic", "else", "enum", "export", "extends", "extension",
    "external", "factory", "false", "final", "finally", "for", "Function", "get", "hide", "if", "implements",
    "import", "in", "interface", "is", "late", "library", "mixin", "new", "null", "of", "on", "operator", "part",
    "required", "rethrow", "return", "sealed", "set", "show", "static", "super", "switch", "sync", "this",
    "throw", "true", "try", "type", "typedef", "var", "void", "when", "while", "with", "yield", "hashCode",
    "runtimeType", "toString", "noSuchMethod", "toJson", "fromJson",
];

/// `dart:core` types a generated class must not hide.
const CORE_TYPES: &[&str] = &[
    "BigInt", "Comparable", "DateTime", "Duration", "Enum", "Error", "Exception", "Expando", "Function", "Future",
    "Iterable", "Iterator", "List", "Map", "Null", "Object", "Pattern", "Record", "RegExp", "Set", "Sink",
    "Stream", "String", "Symbol", "Type", "Uri",
];

/// Model-wide annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAnnotation {
    /// Pub package name, e.g. `google_cloud_secretmanager_v1`.
    pub package_name: String,
    /// Library file name without extension: the snake-cased model name.
    pub main_file_name: String,
    /// Package version.
    pub version: String,
    /// License header year.
    pub copyright_year: String,
    /// `issue_tracker:` entry of the pubspec.
    pub issue_tracker_url: String,
    /// `repository:` entry of the pubspec.
    pub repository_url: Option<String>,
    /// Environment variables consulted for API keys, in order.
    pub api_keys_environment_variables: Vec<String>,
    /// Import URIs, sorted.
    pub imports: Vec<String>,
    /// Pubspec dependencies, sorted by name.
    pub dependencies: Vec<Dependency>,
    /// Library documentation as `///` lines.
    pub doc_lines: Vec<String>,
    /// The model has at least one service.
    pub has_services: bool,
}

/// A pubspec dependency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// Package name.
    pub name: String,
    /// Version constraint.
    pub constraint: String,
}

/// Message annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageAnnotation {
    /// Class name.
    pub name: String,
    /// Protobuf name without the leading dot.
    pub source_fqn: String,
    /// Dartdoc lines.
    pub doc_lines: Vec<String>,
}

/// Field annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldAnnotation {
    /// Member name, escaped.
    pub name: String,
    /// JSON key.
    pub json_name: String,
    /// Declared type, with `?` when nullable.
    pub field_type: String,
    /// Nullable member.
    pub nullable: bool,
    /// Initializer for non-nullable members.
    pub default_value: Option<String>,
    /// Expression reading the member from `json`.
    pub from_json: String,
    /// Expression writing the member to JSON.
    pub to_json: String,
    /// Dartdoc lines.
    pub doc_lines: Vec<String>,
}

/// Enum annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumAnnotation {
    /// Class name.
    pub name: String,
    /// Value used when none is set: the first value.
    pub default_value: String,
    /// Dartdoc lines.
    pub doc_lines: Vec<String>,
}

/// Enum value annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValueAnnotation {
    /// Constant name, unique within the enum.
    pub name: String,
    /// JSON string of the value.
    pub wire_name: String,
    /// Dartdoc lines.
    pub doc_lines: Vec<String>,
}

/// Service annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAnnotation {
    /// Client class name.
    pub name: String,
    /// Default endpoint host.
    pub default_host: String,
    /// Dartdoc lines.
    pub doc_lines: Vec<String>,
}

/// Method annotation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodAnnotation {
    /// Function name.
    pub name: String,
    /// Request class.
    pub request_type: String,
    /// Response class, `void` for `Empty`.
    pub response_type: String,
    /// Lower-case HTTP verb of the primary binding.
    pub verb: String,
    /// Contents of a Dart string literal with `${...}` interpolations.
    pub path: String,
    /// Statements filling `query`, a `Map<String, List<String>>`.
    pub query_lines: Vec<String>,
    /// Sends the request body.
    pub has_body: bool,
    /// `api_version` of the service, unchanged.
    pub api_version: Option<String>,
    /// Dartdoc lines.
    pub doc_lines: Vec<String>,
}

/// An escaped member or constant name.
#[must_use]
pub fn escape_reserved(name: &str) -> String {
    if RESERVED.contains(&name) {
        format!("{name}$")
    } else {
        name.to_string()
    }
}

fn member_name(name: &str) -> String {
    escape_reserved(&to_lower_camel_case(name))
}

/// The class name of a message or enum: nested names are joined with `_`
/// and names that hide a core type get a `$` suffix.
fn class_name(model: &Model, id: &str) -> String {
    let mut names = Vec::new();
    let mut next = Some(id);
    while let Some(id) = next {
        if let Some(m) = model.message(id) {
            names.push(to_pascal_case(&m.name));
            next = m.parent_id.as_deref();
        } else if let Some(e) = model.enum_(id) {
            names.push(to_pascal_case(&e.name));
            next = e.parent_id.as_deref();
        } else {
            break;
        }
    }
    names.reverse();
    let name = names.join("_");
    if CORE_TYPES.contains(&name.as_str()) {
        format!("{name}$")
    } else {
        name
    }
}

fn scalar_type(typez: Typez) -> &'static str {
    match typez {
        Typez::Double | Typez::Float => "double",
        Typez::Bool => "bool",
        Typez::String => "String",
        Typez::Bytes => "Uint8List",
        _ => "int",
    }
}

fn is_64_bit(typez: Typez) -> bool {
    matches!(
        typez,
        Typez::Int64 | Typez::Uint64 | Typez::Sint64 | Typez::Fixed64 | Typez::Sfixed64
    )
}

/// Element type plus decoder and encoder function names.
fn element(model: &Model, field: &Field) -> (String, Option<String>, Option<String>) {
    match field.typez {
        Typez::Message | Typez::Group | Typez::Enum => {
            let name = class_name(model, &field.typez_id);
            let decoder = format!("{name}.fromJson");
            (name, Some(decoder), Some("encode".to_string()))
        }
        Typez::Bytes => (
            "Uint8List".to_string(),
            Some("decodeBytes".to_string()),
            Some("encodeBytes".to_string()),
        ),
        typez if is_64_bit(typez) => (
            "int".to_string(),
            Some("decodeInt64".to_string()),
            Some("encodeInt64".to_string()),
        ),
        typez => (scalar_type(typez).to_string(), None, None),
    }
}

fn default_value(model: &Model, field: &Field) -> Option<String> {
    Some(match field.typez {
        Typez::Enum => {
            let name = class_name(model, &field.typez_id);
            let first = model
                .field_enum(field)
                .and_then(|e| e.values.first())
                .map(|v| escape_reserved(&to_lower_camel_case(&v.name)))?;
            format!("{name}.{first}")
        }
        Typez::Double | Typez::Float => "0.0".to_string(),
        Typez::Bool => "false".to_string(),
        Typez::String => "''".to_string(),
        Typez::Bytes => "Uint8List(0)".to_string(),
        Typez::Message | Typez::Group => return None,
        _ => "0".to_string(),
    })
}

fn field_annotation(model: &Model, field: &Field) -> FieldAnnotation {
    let name = member_name(&field.name);
    let json = &field.json_name;
    let (element_type, decoder, encoder) = element(model, field);
    let identity = || "identity".to_string();

    let (field_type, nullable, default, from_json, to_json) = if field.map {
        let entry = model.field_message(field);
        let key = entry
            .and_then(|e| e.field("key"))
            .map_or_else(|| "String".to_string(), |k| element(model, k).0);
        let (value_type, decoder, encoder) = entry
            .and_then(|e| e.field("value"))
            .map_or_else(|| ("String".to_string(), None, None), |v| element(model, v));
        (
            format!("Map<{key}, {value_type}>"),
            false,
            Some("const {}".to_string()),
            format!("decodeMap(json['{json}'], {})", decoder.unwrap_or_else(identity)),
            format!("encodeMap({name}, {})", encoder.unwrap_or_else(identity)),
        )
    } else if field.repeated {
        (
            format!("List<{element_type}>"),
            false,
            Some("const []".to_string()),
            format!("decodeList(json['{json}'], {})", decoder.unwrap_or_else(identity)),
            format!("encodeList({name}, {})", encoder.unwrap_or_else(identity)),
        )
    } else {
        let nullable = field.typez.is_message() || field.optional || field.is_oneof;
        let from_json = match &decoder {
            Some(d) if field.typez.is_message() || field.typez == Typez::Enum => format!("decode(json['{json}'], {d})"),
            Some(d) => format!("{d}(json['{json}'])"),
            None => format!("json['{json}']"),
        };
        let to_json = match encoder {
            Some(e) if nullable => format!("{name} == null ? null : {e}({name}!)"),
            Some(e) => format!("{e}({name})"),
            None => name.clone(),
        };
        let field_type = if nullable {
            format!("{element_type}?")
        } else {
            element_type
        };
        let default = if nullable { None } else { default_value(model, field) };
        (field_type, nullable, default, from_json, to_json)
    };

    FieldAnnotation {
        name,
        json_name: json.clone(),
        field_type,
        nullable,
        default_value: default,
        from_json,
        to_json,
        doc_lines: doc_lines(&field.documentation, "///"),
    }
}

fn message_annotation(model: &Model, message: &Message) -> MessageAnnotation {
    MessageAnnotation {
        name: class_name(model, &message.id),
        source_fqn: message.id.trim_start_matches('.').to_string(),
        doc_lines: doc_lines(&message.documentation, "///"),
    }
}

fn enum_annotations(model: &Model, enum_: &Enum) -> (EnumAnnotation, Vec<EnumValueAnnotation>) {
    let names = disambiguate(
        enum_.values.iter().map(|v| member_name(&v.name)).collect(),
        "$",
    );
    let annotation = EnumAnnotation {
        name: class_name(model, &enum_.id),
        default_value: names.first().cloned().unwrap_or_default(),
        doc_lines: doc_lines(&enum_.documentation, "///"),
    };
    let values = enum_
        .values
        .iter()
        .zip(names)
        .map(|(value, name)| EnumValueAnnotation {
            name,
            wire_name: value.name.clone(),
            doc_lines: doc_lines(&value.documentation, "///"),
        })
        .collect();
    (annotation, values)
}

/// `request.a`, or `request.a!.b` through nested messages.
fn accessor(field_path: &[String]) -> String {
    let names: Vec<String> = field_path.iter().map(|p| member_name(p)).collect();
    format!("request.{}", names.join("!."))
}

/// Well-known types whose JSON form is already a scalar string or value.
fn is_custom_encoded(typez_id: &str) -> bool {
    [wkt::DURATION, wkt::TIMESTAMP, wkt::FIELD_MASK].contains(&typez_id) || wkt::wrapped_scalar(typez_id).is_some()
}

fn query_line(field: &Field) -> String {
    let name = member_name(&field.name);
    let json = &field.json_name;
    if field.map {
        return format!("request.{name}.forEach((k, v) => query['{json}[$k]'] = ['$v']);");
    }
    if field.repeated {
        return format!("if (request.{name}.isNotEmpty) query['{json}'] = [for (final e in request.{name}) '$e'];");
    }
    if field.typez.is_message() && is_custom_encoded(&field.typez_id) {
        return format!("if (request.{name} != null) query['{json}'] = ['${{request.{name}!.toJson()}}'];");
    }
    if field.typez.is_message() {
        return format!("if (request.{name} != null) query['{json}'] = [jsonEncode(request.{name}!.toJson())];");
    }
    if field.typez == Typez::Enum && (field.optional || field.is_oneof) {
        return format!("if (request.{name} != null) query['{json}'] = [request.{name}!.toJson()];");
    }
    if field.typez == Typez::Enum {
        return format!("query['{json}'] = [request.{name}.toJson()];");
    }
    if field.optional || field.is_oneof {
        return format!("if (request.{name} != null) query['{json}'] = ['${{request.{name}}}'];");
    }
    format!("query['{json}'] = ['${{request.{name}}}'];")
}

fn method_annotation(model: &Model, method: &Method) -> MethodAnnotation {
    let binding = method.primary_binding();
    let path = binding.map_or_else(String::new, |b| {
        let mut path = String::new();
        for segment in &b.path_template.segments {
            path.push('/');
            match segment {
                PathSegment::Literal(l) => path.push_str(l),
                PathSegment::Variable(v) => {
                    path.push_str("${");
                    path.push_str(&accessor(&v.field_path));
                    path.push('}');
                }
            }
        }
        if let Some(verb) = &b.path_template.verb {
            path.push(':');
            path.push_str(verb);
        }
        path
    });
    let query_lines = match (binding, model.input_type(method)) {
        (Some(binding), Some(input)) => binding
            .query_parameters
            .iter()
            .filter_map(|name| input.field(name))
            .map(query_line)
            .collect(),
        _ => Vec::new(),
    };
    MethodAnnotation {
        name: member_name(&method.name),
        request_type: class_name(model, &method.input_type_id),
        response_type: if method.returns_empty {
            "void".to_string()
        } else {
            class_name(model, &method.output_type_id)
        },
        verb: binding.map(|b| b.verb.to_lowercase()).unwrap_or_default(),
        path,
        query_lines,
        has_body: method.path_info.body_field_path.is_some(),
        api_version: method.api_version.clone(),
        doc_lines: doc_lines(&method.documentation, "///"),
    }
}

fn service_annotation(service: &Service) -> ServiceAnnotation {
    let name = to_pascal_case(&service.name);
    ServiceAnnotation {
        name: if CORE_TYPES.contains(&name.as_str()) {
            format!("{name}$")
        } else {
            name
        },
        default_host: service.default_host.clone(),
        doc_lines: doc_lines(&service.documentation, "///"),
    }
}

/// The package part of a `package:<name>/<path>` import.
fn import_package(import: &str) -> Option<&str> {
    import.strip_prefix("package:")?.split('/').next()
}

/// Imports and pubspec dependencies for the packages the model references.
fn resolve_imports(model: &Model, options: &CodecOptions) -> Result<(Vec<String>, Vec<Dependency>)> {
    let constraints: BTreeMap<&str, &str> = package_options(options).collect();
    let mut imports = BTreeSet::new();
    let mut dependencies = BTreeMap::new();
    for package in referenced_packages(model) {
        let import = options
            .get(&format!("proto:{package}"))
            .ok_or_else(|| Error::MissingPackage {
                package: package.clone(),
            })?;
        if let Some(dart_package) = import_package(import) {
            let constraint = constraints
                .get(dart_package)
                .ok_or_else(|| Error::MissingDependencyConstraint {
                    package: dart_package.to_string(),
                })?;
            dependencies.insert(dart_package.to_string(), (*constraint).to_string());
        }
        debug!(package = %package, import = %import, "dart import");
        imports.insert(import.clone());
    }
    let uses_bytes = model
        .all_messages()
        .iter()
        .flat_map(|m| &m.fields)
        .any(|f| f.typez == Typez::Bytes);
    if uses_bytes {
        imports.insert("dart:typed_data".to_string());
    }
    let dependencies = dependencies
        .into_iter()
        .map(|(name, constraint)| Dependency { name, constraint })
        .collect();
    Ok((imports.into_iter().collect(), dependencies))
}

/// Annotate `model` for Dart and return the model-wide annotation.
///
/// # Errors
///
/// See [`super::annotate_model`].
pub fn annotate_model(model: &Model, options: &CodecOptions) -> Result<ModelAnnotation> {
    require_options(CODEC, options, REQUIRED_OPTIONS)?;
    let package_name = match options.get("package-name-override") {
        Some(name) => name.clone(),
        None if model.package_name.is_empty() => return Err(Error::missing_option(CODEC, "package-name-override")),
        None => model.package_name.replace('.', "_"),
    };
    let (imports, dependencies) = resolve_imports(model, options)?;

    for message in model.all_messages() {
        message.codec.set(&message.id, &message_annotation(model, message))?;
        for field in &message.fields {
            field.codec.set(&field.id, &field_annotation(model, field))?;
        }
    }
    for enum_ in model.all_enums() {
        let (annotation, values) = enum_annotations(model, enum_);
        enum_.codec.set(&enum_.id, &annotation)?;
        for (value, annotation) in enum_.values.iter().zip(values) {
            value.codec.set(&value.id, &annotation)?;
        }
    }
    for service in model.services() {
        service.codec.set(&service.id, &service_annotation(service))?;
        for method in model.methods_of(service) {
            method.codec.set(&method.id, &method_annotation(model, method))?;
        }
    }

    let annotation = ModelAnnotation {
        main_file_name: if model.name.is_empty() {
            package_name.clone()
        } else {
            to_snake_case(&model.name)
        },
        package_name,
        version: options.get("version").cloned().unwrap_or_else(|| "0.1.0".to_string()),
        copyright_year: copyright_year(options),
        issue_tracker_url: options.get("issue-tracker-url").cloned().unwrap_or_default(),
        repository_url: options.get("repository-url").cloned(),
        api_keys_environment_variables: list_option(options, "api-keys-environment-variables"),
        imports,
        dependencies,
        doc_lines: doc_lines(&model.description, "///"),
        has_services: !model.services.is_empty(),
    };
    model.codec.set(&model.package_name, &annotation)?;
    Ok(annotation)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use sidekick_api::{cross_reference, Api, PathTemplate};

    const PKG: &str = "test.v1";

    fn options(extra: &[(&str, &str)]) -> CodecOptions {
        [
            ("issue-tracker-url", "https://github.com/example/issues"),
            ("api-keys-environment-variables", "GOOGLE_API_KEY"),
            ("copyright-year", "2026"),
        ]
        .iter()
        .chain(extra)
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
    }

    fn protobuf_options() -> CodecOptions {
        options(&[
            ("proto:google.protobuf", "package:google_cloud_protobuf/protobuf.dart"),
            ("package:google_cloud_protobuf", "^0.1.0"),
        ])
    }

    fn model() -> Model {
        let mut api = Api::new("secretmanager", PKG);
        let kind = Enum::new(PKG, "Kind")
            .with_value("NAME", 0)
            .with_value("in", 1)
            .with_value("ENUM_VALUE", 2);
        let secret = Message::new(PKG, "Secret")
            .with_field(Field::scalar("name", Typez::String))
            .with_field(Field::scalar("size_bytes", Typez::Int64))
            .with_field(Field::scalar("payload", Typez::Bytes).optional())
            .with_field(Field::enumeration("kind", &kind.id))
            .with_field(Field::scalar("in", Typez::Bool))
            .with_field(Field::message("expire_time", wkt::TIMESTAMP))
            .with_field(Field::scalar("aliases", Typez::String).repeated());
        let duration = Message::new(PKG, "Duration").with_field(Field::scalar("value", Typez::Int32));
        let request = Message::new(PKG, "GetSecretRequest")
            .with_field(Field::scalar("name", Typez::String))
            .with_field(Field::scalar("version", Typez::Int32).optional());
        let mut service = Service::new(PKG, "SecretManager");
        service.api_version = Some("v7_20260206".to_string());
        let mut get = Method::new(&service, "GetSecret", &request.id, &secret.id).with_binding(
            "GET",
            PathTemplate::new().with_literal("v1").with_variable_named(&["name"]),
        );
        get.path_info.bindings[0].query_parameters = ["version".to_string()].into_iter().collect();
        get.api_version.clone_from(&service.api_version);
        service.methods.push(get.id.clone());
        api.enums.push(kind.id.clone());
        api.add_enum(kind);
        for message in [secret, duration, request] {
            api.messages.push(message.id.clone());
            api.add_message(message);
        }
        api.services.push(service.id.clone());
        api.add_service(service);
        api.add_method(get);
        cross_reference(api).unwrap()
    }

    fn field(model: &Model, name: &str) -> FieldAnnotation {
        model
            .message(".test.v1.Secret")
            .unwrap()
            .field(name)
            .unwrap()
            .codec
            .decode()
            .unwrap()
    }

    #[test]
    fn required_options_are_checked_first() {
        let model = model();
        let mut opts = protobuf_options();
        opts.remove("issue-tracker-url");
        let err = annotate_model(&model, &opts).unwrap_err();
        assert!(matches!(err, Error::MissingOption { key, .. } if key == "issue-tracker-url"));
        assert!(!model.message(".test.v1.Secret").unwrap().codec.is_set());
    }

    #[test]
    fn referenced_packages_need_imports_and_constraints() {
        let err = annotate_model(&model(), &options(&[])).unwrap_err();
        assert!(matches!(err, Error::MissingPackage { package } if package == "google.protobuf"));

        let opts = options(&[("proto:google.protobuf", "package:google_cloud_protobuf/protobuf.dart")]);
        let err = annotate_model(&model(), &opts).unwrap_err();
        assert!(matches!(err, Error::MissingDependencyConstraint { package } if package == "google_cloud_protobuf"));

        let annotation = annotate_model(&model(), &protobuf_options()).unwrap();
        assert_eq!(
            annotation.imports,
            vec!["dart:typed_data", "package:google_cloud_protobuf/protobuf.dart"]
        );
        assert_eq!(
            annotation.dependencies,
            vec![Dependency {
                name: "google_cloud_protobuf".to_string(),
                constraint: "^0.1.0".to_string(),
            }]
        );
        assert_eq!(annotation.package_name, "test_v1");
        assert_eq!(annotation.main_file_name, "secretmanager");
        assert_eq!(annotation.api_keys_environment_variables, vec!["GOOGLE_API_KEY"]);
    }

    #[test]
    fn enum_values() {
        let model = model();
        annotate_model(&model, &protobuf_options()).unwrap();
        let kind = model.enum_(".test.v1.Kind").unwrap();
        let annotation: EnumAnnotation = kind.codec.decode().unwrap();
        assert_eq!(annotation.default_value, "name");
        let names: Vec<String> = kind
            .values
            .iter()
            .map(|v| v.codec.decode::<EnumValueAnnotation>().unwrap().name)
            .collect();
        assert_eq!(names, vec!["name", "in$", "enumValue"]);
        assert_eq!(field(&model, "kind").default_value.as_deref(), Some("Kind.name"));
    }

    #[test]
    fn field_types() {
        let model = model();
        annotate_model(&model, &protobuf_options()).unwrap();
        let size = field(&model, "size_bytes");
        assert_eq!(size.field_type, "int");
        assert_eq!(size.from_json, "decodeInt64(json['sizeBytes'])");
        assert_eq!(size.to_json, "encodeInt64(sizeBytes)");
        let payload = field(&model, "payload");
        assert_eq!(payload.field_type, "Uint8List?");
        assert_eq!(payload.to_json, "payload == null ? null : encodeBytes(payload!)");
        assert_eq!(field(&model, "in").name, "in$");
        assert_eq!(field(&model, "expire_time").field_type, "Timestamp?");
        assert_eq!(field(&model, "aliases").from_json, "decodeList(json['aliases'], identity)");
        let duration: MessageAnnotation = model.message(".test.v1.Duration").unwrap().codec.decode().unwrap();
        assert_eq!(duration.name, "Duration$");
    }

    #[test]
    fn method_annotation_keeps_api_version() {
        let model = model();
        annotate_model(&model, &protobuf_options()).unwrap();
        let method: MethodAnnotation = model
            .method(".test.v1.SecretManager.GetSecret")
            .unwrap()
            .codec
            .decode()
            .unwrap();
        assert_eq!(method.name, "getSecret");
        assert_eq!(method.verb, "get");
        assert_eq!(method.path, "/v1/${request.name}");
        assert_eq!(method.api_version.as_deref(), Some("v7_20260206"));
        assert_eq!(
            method.query_lines,
            vec!["if (request.version != null) query['version'] = ['${request.version}'];"]
        );
    }
    #[test]
    fn well_known_query_parameters_use_their_json_form() {
        assert_eq!(
            query_line(&Field::message("ttl", wkt::DURATION)),
            "if (request.ttl != null) query['ttl'] = ['${request.ttl!.toJson()}'];"
        );
        assert_eq!(
            query_line(&Field::message("read_time", wkt::TIMESTAMP)),
            "if (request.readTime != null) query['readTime'] = ['${request.readTime!.toJson()}'];"
        );
        assert_eq!(
            query_line(&Field::message("update_mask", wkt::FIELD_MASK)),
            "if (request.updateMask != null) query['updateMask'] = ['${request.updateMask!.toJson()}'];"
        );
        assert_eq!(
            query_line(&Field::message("page_size", ".google.protobuf.Int32Value")),
            "if (request.pageSize != null) query['pageSize'] = ['${request.pageSize!.toJson()}'];"
        );
        assert_eq!(
            query_line(&Field::message("filter", ".test.v1.Filter")),
            "if (request.filter != null) query['filter'] = [jsonEncode(request.filter!.toJson())];"
        );
    }

    #[test]
    fn enum_query_parameters() {
        let kind = ".test.v1.Kind";
        assert_eq!(
            query_line(&Field::enumeration("state", kind).optional()),
            "if (request.state != null) query['state'] = [request.state!.toJson()];"
        );
        assert_eq!(
            query_line(&Field::enumeration("state", kind)),
            "query['state'] = [request.state.toJson()];"
        );
    }

    #[test]
    fn main_file_is_snake_case_model_name() {
        let model = cross_reference(Api::new("secret_manager", PKG)).unwrap();
        let opts = options(&[]);
        let annotation = annotate_model(&model, &opts).unwrap();
        assert_eq!(annotation.main_file_name, "secret_manager");
    }
}
