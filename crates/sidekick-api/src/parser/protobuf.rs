//! Protobuf descriptors → [`Api`].
//!
//! Every file of the descriptor set is staged so that imported messages can
//! be resolved, but only elements of the files to generate are listed in the
//! API. Source order of fields, values and methods is preserved.

use std::collections::BTreeSet;

use sidekick_descriptor::descriptor::{
    self, source_path, DescriptorProto, EnumDescriptorProto, FieldDescriptorProto, FileDescriptorProto,
    FileDescriptorSet, HttpRule, MethodDescriptorProto, ResourceDescriptor, ServiceDescriptorProto,
};
use tracing::{debug, warn};

use super::comments::{child, Comments};
use super::{protoc, ParserConfig};
use crate::casing::to_lower_camel_case;
use crate::error::{Error, Result};
use crate::model::{
    Api, Enum, EnumValue, Field, FieldBehavior, FieldFormat, Message, Method, OneOf, OperationInfo, PathBinding,
    PathInfo, ResourceReference, Service, Typez,
};
use crate::path::PathTemplate;
use crate::resource::Resource;
use crate::routing::{parse_routing, RoutingParameter};

/// Parse `.proto` files (through `protoc`) or a pre-built descriptor set.
pub(crate) fn parse(config: &ParserConfig<'_>) -> Result<Api> {
    let descriptors = protoc::load(config)?;
    from_descriptor_set(&descriptors.set, &descriptors.files_to_generate)
}

/// Build an [`Api`] from decoded descriptors.
///
/// `files_to_generate` names the files whose elements form the API; every
/// other file only contributes referenced types.
///
/// # Errors
///
/// [`Error::InvalidPathTemplate`] for malformed HTTP rules and
/// [`Error::Specification`] when no file to generate is present.
pub fn from_descriptor_set(set: &FileDescriptorSet, files_to_generate: &[String]) -> Result<Api> {
    let local: BTreeSet<&str> = files_to_generate.iter().map(String::as_str).collect();
    let mut api = Api::default();
    let mut found_local = false;

    for file in &set.file {
        let name = file.name.as_deref().unwrap_or_default();
        let is_local = local.contains(name);
        if is_local && !found_local {
            found_local = true;
            api.package_name = file.package.clone().unwrap_or_default();
        }
        debug!(file = name, is_local, "processing descriptor");
        process_file(&mut api, file, is_local)?;
    }
    if !found_local {
        return Err(Error::specification(
            files_to_generate.join(","),
            "files to generate are missing from the descriptor set",
        ));
    }

    api.name = default_api_name(&api.package_name);
    api.title.clone_from(&api.name);
    Ok(api)
}

/// `google.cloud.secretmanager.v1` → `secretmanager`.
fn default_api_name(package: &str) -> String {
    package
        .split('.')
        .filter(|c| !is_version(c))
        .next_back()
        .unwrap_or(package)
        .to_string()
}

fn is_version(component: &str) -> bool {
    component
        .strip_prefix('v')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}

fn process_file(api: &mut Api, file: &FileDescriptorProto, is_local: bool) -> Result<()> {
    let package = file.package.clone().unwrap_or_default();
    let prefix = format!(".{package}");
    let comments = Comments::new(file.source_code_info.as_ref());

    for (index, desc) in file.message_type.iter().enumerate() {
        let path = child(&[], source_path::FILE_MESSAGE, index);
        let id = process_message(api, desc, &package, &prefix, None, &comments, &path)?;
        if is_local {
            api.messages.push(id);
        }
    }
    for (index, desc) in file.enum_type.iter().enumerate() {
        let path = child(&[], source_path::FILE_ENUM, index);
        let id = process_enum(api, desc, &package, &prefix, None, &comments, &path);
        if is_local {
            api.enums.push(id);
        }
    }
    for (index, desc) in file.service.iter().enumerate() {
        let path = child(&[], source_path::FILE_SERVICE, index);
        let id = process_service(api, desc, &package, &comments, &path)?;
        if is_local {
            api.services.push(id);
        }
    }
    if is_local {
        let definitions = file.options.iter().flat_map(|o| o.resource_definition.iter());
        api.resource_definitions.extend(definitions.map(convert_resource));
    }
    Ok(())
}

fn convert_resource(desc: &ResourceDescriptor) -> Resource {
    let mut resource = Resource::new(desc.r#type.as_deref().unwrap_or_default());
    resource.singular = desc.singular.clone().unwrap_or_default();
    resource.plural = desc.plural.clone().unwrap_or_default();
    for pattern in &desc.pattern {
        match PathTemplate::parse(pattern) {
            Ok(template) => resource.patterns.push(template),
            Err(e) => warn!(resource = %resource.type_, pattern, error = %e, "skipping resource pattern"),
        }
    }
    resource
}

fn process_message(
    api: &mut Api,
    desc: &DescriptorProto,
    package: &str,
    prefix: &str,
    parent_id: Option<&str>,
    comments: &Comments,
    path: &[i32],
) -> Result<String> {
    let name = desc.name.clone().unwrap_or_default();
    let id = format!("{prefix}.{name}");
    let options = desc.options.as_ref();
    let mut message = Message {
        name,
        id: id.clone(),
        package: package.to_string(),
        documentation: comments.get(path),
        is_map: options.and_then(|o| o.map_entry).unwrap_or(false),
        deprecated: options.and_then(|o| o.deprecated).unwrap_or(false),
        resource: options.and_then(|o| o.resource.as_ref()).map(convert_resource),
        parent_id: parent_id.map(ToString::to_string),
        ..Message::default()
    };

    // Synthetic oneofs wrap a single proto3 `optional` field.
    let synthetic: BTreeSet<i32> = desc
        .field
        .iter()
        .filter(|f| f.proto3_optional.unwrap_or(false))
        .filter_map(|f| f.oneof_index)
        .collect();

    for (index, field_desc) in desc.field.iter().enumerate() {
        let field_path = child(path, source_path::MESSAGE_FIELD, index);
        let mut field = convert_field(field_desc, desc, &id, comments.get(&field_path));
        if let Some(oneof) = field_desc.oneof_index.filter(|i| !synthetic.contains(i)) {
            field.is_oneof = true;
            let oneof_path = child(path, source_path::MESSAGE_ONEOF, usize::try_from(oneof).unwrap_or_default());
            let oneof_name = usize::try_from(oneof)
                .ok()
                .and_then(|i| desc.oneof_decl.get(i))
                .and_then(|o| o.name.clone())
                .unwrap_or_default();
            match message.one_ofs.iter_mut().find(|o| o.name == oneof_name) {
                Some(group) => group.fields.push(field.id.clone()),
                None => message.one_ofs.push(OneOf {
                    id: format!("{id}.{oneof_name}"),
                    name: oneof_name,
                    documentation: comments.get(&oneof_path),
                    fields: vec![field.id.clone()],
                    ..OneOf::default()
                }),
            }
        }
        message.fields.push(field);
    }

    for (index, nested) in desc.nested_type.iter().enumerate() {
        let nested_path = child(path, source_path::MESSAGE_NESTED, index);
        let nested_id = process_message(api, nested, package, &id, Some(&id), comments, &nested_path)?;
        message.messages.push(nested_id);
    }
    for (index, nested) in desc.enum_type.iter().enumerate() {
        let nested_path = child(path, source_path::MESSAGE_ENUM, index);
        let nested_id = process_enum(api, nested, package, &id, Some(&id), comments, &nested_path);
        message.enums.push(nested_id);
    }

    api.add_message(message);
    Ok(id)
}

fn convert_field(desc: &FieldDescriptorProto, parent: &DescriptorProto, parent_id: &str, documentation: String) -> Field {
    let name = desc.name.clone().unwrap_or_default();
    let typez = desc
        .r#type
        .and_then(|t| prost_types::field_descriptor_proto::Type::try_from(t).ok())
        .map_or(Typez::String, Typez::from);
    let type_name = desc.type_name.clone().unwrap_or_default();
    let repeated = desc.label == Some(descriptor::label::REPEATED);
    let map = repeated && typez == Typez::Message && is_map_entry(parent, parent_id, &type_name);
    let options = desc.options.as_ref();

    Field {
        json_name: desc.json_name.clone().unwrap_or_else(|| to_lower_camel_case(&name)),
        id: format!("{parent_id}.{name}"),
        name,
        documentation,
        typez,
        typez_id: if typez.is_scalar() { String::new() } else { type_name },
        repeated: repeated && !map,
        map,
        optional: desc.proto3_optional.unwrap_or(false) || (typez.is_message() && !repeated),
        behavior: options
            .map(|o| o.field_behavior.iter().filter_map(|b| FieldBehavior::from_i32(*b)).collect())
            .unwrap_or_default(),
        format: options
            .and_then(|o| o.field_info.as_ref())
            .and_then(|i| i.format)
            .and_then(FieldFormat::from_i32),
        resource_reference: options.and_then(|o| o.resource_reference.as_ref()).map(|r| ResourceReference {
            type_: r.r#type.clone().unwrap_or_default(),
            child_type: r.child_type.clone().unwrap_or_default(),
        }),
        deprecated: options.and_then(|o| o.deprecated).unwrap_or(false),
        ..Field::default()
    }
}

fn is_map_entry(parent: &DescriptorProto, parent_id: &str, type_name: &str) -> bool {
    let Some(local) = type_name.strip_prefix(parent_id).and_then(|r| r.strip_prefix('.')) else {
        return false;
    };
    parent
        .nested_type
        .iter()
        .any(|n| n.name.as_deref() == Some(local) && n.options.as_ref().and_then(|o| o.map_entry).unwrap_or(false))
}

fn process_enum(
    api: &mut Api,
    desc: &EnumDescriptorProto,
    package: &str,
    prefix: &str,
    parent_id: Option<&str>,
    comments: &Comments,
    path: &[i32],
) -> String {
    let name = desc.name.clone().unwrap_or_default();
    let id = format!("{prefix}.{name}");
    let values = desc
        .value
        .iter()
        .enumerate()
        .map(|(index, v)| {
            let value_name = v.name.clone().unwrap_or_default();
            EnumValue {
                id: format!("{id}.{value_name}"),
                name: value_name,
                number: v.number.unwrap_or_default(),
                documentation: comments.get(&child(path, source_path::ENUM_VALUE, index)),
                deprecated: v.options.as_ref().and_then(|o| o.deprecated).unwrap_or(false),
                ..EnumValue::default()
            }
        })
        .collect();
    api.add_enum(Enum {
        name,
        id: id.clone(),
        package: package.to_string(),
        documentation: comments.get(path),
        values,
        deprecated: desc.options.as_ref().and_then(|o| o.deprecated).unwrap_or(false),
        parent_id: parent_id.map(ToString::to_string),
        ..Enum::default()
    });
    id
}

fn process_service(
    api: &mut Api,
    desc: &ServiceDescriptorProto,
    package: &str,
    comments: &Comments,
    path: &[i32],
) -> Result<String> {
    let options = desc.options.as_ref();
    let mut service = Service {
        documentation: comments.get(path),
        default_host: options.and_then(|o| o.default_host.clone()).unwrap_or_default(),
        oauth_scopes: options
            .and_then(|o| o.oauth_scopes.as_deref())
            .map(|s| s.split(',').map(str::trim).filter(|s| !s.is_empty()).map(ToString::to_string).collect())
            .unwrap_or_default(),
        api_version: options.and_then(|o| o.api_version.clone()).filter(|v| !v.is_empty()),
        deprecated: options.and_then(|o| o.deprecated).unwrap_or(false),
        ..Service::new(package, desc.name.as_deref().unwrap_or_default())
    };

    for (index, method_desc) in desc.method.iter().enumerate() {
        let method_path = child(path, source_path::SERVICE_METHOD, index);
        let method = convert_method(method_desc, &service, package, comments.get(&method_path))?;
        service.methods.push(method.id.clone());
        api.add_method(method);
    }
    let id = service.id.clone();
    api.add_service(service);
    Ok(id)
}

fn convert_method(desc: &MethodDescriptorProto, service: &Service, package: &str, documentation: String) -> Result<Method> {
    let options = desc.options.as_ref();
    let mut method = Method::new(
        service,
        desc.name.as_deref().unwrap_or_default(),
        desc.input_type.as_deref().unwrap_or_default(),
        desc.output_type.as_deref().unwrap_or_default(),
    );
    method.documentation = documentation;
    method.client_side_streaming = desc.client_streaming.unwrap_or(false);
    method.server_side_streaming = desc.server_streaming.unwrap_or(false);
    method.deprecated = options.and_then(|o| o.deprecated).unwrap_or(false);
    method.api_version.clone_from(&service.api_version);

    if let Some(rule) = descriptor::extract_http_rule(desc) {
        method.path_info = convert_http_rule(rule)?;
    }
    if let Some(routing) = options.and_then(|o| o.routing.as_ref()) {
        let parameters: Vec<RoutingParameter> = routing
            .routing_parameters
            .iter()
            .map(|p| RoutingParameter {
                field: p.field.clone(),
                path_template: p.path_template.clone(),
            })
            .collect();
        method.routing = parse_routing(&parameters)?;
    }
    if let Some(info) = options.and_then(|o| o.operation_info.as_ref()) {
        method.operation_info = Some(OperationInfo {
            response_type_id: qualify(&info.response_type, package),
            metadata_type_id: qualify(&info.metadata_type, package),
        });
    }
    Ok(method)
}

/// `operation_info` names are relative to the file package unless they
/// contain a `.`.
fn qualify(name: &str, package: &str) -> String {
    if name.starts_with('.') {
        name.to_string()
    } else if name.contains('.') {
        format!(".{name}")
    } else {
        format!(".{package}.{name}")
    }
}

fn convert_http_rule(rule: &HttpRule) -> Result<PathInfo> {
    let mut bindings = Vec::new();
    for r in std::iter::once(rule).chain(rule.additional_bindings.iter()) {
        let Some((verb, path)) = r.verb_and_path() else {
            continue;
        };
        bindings.push(PathBinding {
            verb: verb.to_ascii_uppercase(),
            path_template: PathTemplate::parse(path)?,
            query_parameters: BTreeSet::new(),
        });
    }
    Ok(PathInfo {
        bindings,
        body_field_path: Some(rule.body.clone()).filter(|b| !b.is_empty()),
    })
}
