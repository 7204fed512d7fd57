//! Google Discovery documents → [`Api`].
//!
//! Every resource (nested resources included) becomes a service whose ID
//! keeps the resource key, e.g. `.google.cloud.compute.v1.zoneOperations`.
//! Methods returning the configured operation message are marked as
//! long-running and matched against the poller prefixes.

use serde_json::{Map, Value};
use tracing::{debug, info};

use super::schema::{description, SchemaContext};
use super::{read_json_or_yaml, snake_case_variables, ParserConfig};
use crate::casing::{to_pascal_case, to_snake_case};
use crate::config::DiscoveryConfig;
use crate::error::{Error, Result};
use crate::model::{Api, DiscoveryLro, Message, Method, Service};
use crate::path::{PathTemplate, PathVariable};
use crate::state::Model;
use crate::wkt;

pub(crate) fn parse(config: &ParserConfig<'_>) -> Result<Api> {
    let document = read_json_or_yaml(&config.specification_source)?;
    from_document(config, &document)
}

/// Build an [`Api`] from a parsed Discovery document.
///
/// # Errors
///
/// [`Error::Specification`] when the document has no `name` or uses
/// unsupported schema shapes, [`Error::InvalidPathTemplate`] for malformed
/// method paths.
pub fn from_document(config: &ParserConfig<'_>, document: &Value) -> Result<Api> {
    let path = config.specification_source.as_path();
    let name = document.get("name").and_then(Value::as_str).unwrap_or_default();
    if name.is_empty() {
        return Err(Error::specification(path, "missing `name`"));
    }
    let version = document.get("version").and_then(Value::as_str).unwrap_or_default();
    let package = config
        .option("package-name")
        .map_or_else(|| format!("google.cloud.{name}.{version}"), ToString::to_string);

    let mut api = Api::new(name, &package);
    if let Some(title) = document.get("title").and_then(Value::as_str) {
        api.title = title.to_string();
    }
    api.description = description(document);
    api.discovery = config.discovery.cloned();

    let context = SchemaContext {
        package: &package,
        ref_prefix: "",
        path,
    };
    let empty = Map::new();
    let schemas = document.get("schemas").and_then(Value::as_object).unwrap_or(&empty);
    for (schema_name, schema) in schemas {
        let id = context.message_from_schema(&mut api, schema_name, schema)?;
        api.messages.push(id);
    }

    let defaults = ServiceDefaults {
        default_host: default_host(document),
        oauth_scopes: document
            .pointer("/auth/oauth2/scopes")
            .and_then(Value::as_object)
            .map(|scopes| {
                let mut scopes: Vec<String> = scopes.keys().cloned().collect();
                scopes.sort();
                scopes
            })
            .unwrap_or_default(),
        service_path: document.get("servicePath").and_then(Value::as_str).unwrap_or_default(),
        discovery: config.discovery,
    };
    let resources = document.get("resources").and_then(Value::as_object).unwrap_or(&empty);
    for (key, resource) in resources {
        process_resource(&context, &defaults, &mut api, key, resource)?;
    }
    Ok(api)
}

struct ServiceDefaults<'a> {
    default_host: String,
    oauth_scopes: Vec<String>,
    service_path: &'a str,
    discovery: Option<&'a DiscoveryConfig>,
}

/// `https://compute.googleapis.com/` → `compute.googleapis.com`.
fn default_host(document: &Value) -> String {
    let root = document.get("rootUrl").and_then(Value::as_str).unwrap_or_default();
    root.split_once("://")
        .map_or(root, |(_, rest)| rest)
        .trim_end_matches('/')
        .to_string()
}

fn process_resource(
    context: &SchemaContext<'_>,
    defaults: &ServiceDefaults<'_>,
    api: &mut Api,
    key: &str,
    resource: &Value,
) -> Result<()> {
    let empty = Map::new();
    let methods = resource.get("methods").and_then(Value::as_object).unwrap_or(&empty);
    if !methods.is_empty() {
        let mut service = Service {
            name: to_pascal_case(key),
            id: format!(".{}.{key}", context.package),
            package: context.package.to_string(),
            default_host: defaults.default_host.clone(),
            oauth_scopes: defaults.oauth_scopes.clone(),
            ..Service::default()
        };
        for (method_key, method) in methods {
            let method = convert_method(context, defaults, api, &service, method_key, method)?;
            service.methods.push(method.id.clone());
            api.add_method(method);
        }
        api.services.push(service.id.clone());
        api.add_service(service);
    }

    let children = resource.get("resources").and_then(Value::as_object).unwrap_or(&empty);
    for (child_key, child) in children {
        let nested_key = format!("{key}{}", to_pascal_case(child_key));
        process_resource(context, defaults, api, &nested_key, child)?;
    }
    Ok(())
}

fn convert_method(
    context: &SchemaContext<'_>,
    defaults: &ServiceDefaults<'_>,
    api: &mut Api,
    service: &Service,
    key: &str,
    document: &Value,
) -> Result<Method> {
    let name = to_pascal_case(key);
    let mut request = Message::new(context.package, &format!("{name}{}Request", service.name));
    request.documentation = format!("Synthetic request message for [{}.{name}].", service.name);

    let empty = Map::new();
    let parameters = document.get("parameters").and_then(Value::as_object).unwrap_or(&empty);
    let order: Vec<&str> = document
        .get("parameterOrder")
        .and_then(Value::as_array)
        .map(|o| o.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let ordered = order
        .iter()
        .copied()
        .chain(parameters.keys().map(String::as_str).filter(|k| !order.contains(k)));
    for parameter_name in ordered {
        let Some(parameter) = parameters.get(parameter_name) else {
            continue;
        };
        let required = parameter.get("required").and_then(Value::as_bool).unwrap_or(false);
        let field = context.field_from_schema(api, &mut request, parameter_name, parameter, required)?;
        request.fields.push(field);
    }

    let mut body_field_path = None;
    if let Some(reference) = document.pointer("/request/$ref").and_then(Value::as_str) {
        let field_name = format!("{}_resource", to_snake_case(reference));
        let body = serde_json::json!({ "$ref": reference });
        let field = context.field_from_schema(api, &mut request, &field_name, &body, false)?;
        body_field_path = Some(field.name.clone());
        request.fields.push(field);
    }

    let output_type_id = match document.pointer("/response/$ref").and_then(Value::as_str) {
        Some(reference) => context.ref_id(reference)?,
        None => wkt::EMPTY.to_string(),
    };
    let method_path = document
        .get("flatPath")
        .or_else(|| document.get("path"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let full_path = format!("{}{method_path}", defaults.service_path);
    let template = PathTemplate::parse(&snake_case_variables(&full_path))?;
    let verb = document.get("httpMethod").and_then(Value::as_str).unwrap_or("GET").to_ascii_uppercase();

    let mut method = Method::new(service, &name, &request.id, &output_type_id).with_binding(&verb, template);
    method.id = format!("{}.{key}", service.id);
    method.documentation = description(document);
    method.path_info.body_field_path = body_field_path;
    method.deprecated = document.get("deprecated").and_then(Value::as_bool).unwrap_or(false);

    if let Some(discovery) = defaults.discovery {
        method.discovery_lro = discovery_lro(discovery, &method, &full_path);
    }

    api.messages.push(request.id.clone());
    api.add_message(request);
    Ok(method)
}

/// LRO annotation for a method returning the operation message.
///
/// Pollers themselves are never annotated. The first poller whose prefix
/// matches the method path supplies the polling path parameters.
fn discovery_lro(discovery: &DiscoveryConfig, method: &Method, full_path: &str) -> Option<DiscoveryLro> {
    if discovery.operation_id.is_empty() || method.output_type_id != discovery.operation_id {
        return None;
    }
    if discovery.pollers.iter().any(|p| p.method_id == method.id) {
        return None;
    }
    let poller = discovery.poller_for(full_path.trim_start_matches('/'))?;
    debug!(id = %method.id, poller = %poller.method_id, prefix = %poller.prefix, "lro poller chosen");
    let polling_path_parameters = PathTemplate::parse(&snake_case_variables(&poller.prefix))
        .map(|prefix| prefix.variables().map(PathVariable::name).collect())
        .unwrap_or_default();
    Some(DiscoveryLro { polling_path_parameters })
}

/// Services that need LRO helpers: those with at least one LRO method,
/// excluding the services that host a poller.
#[must_use]
pub fn lro_services(model: &Model) -> Vec<&Service> {
    let Some(discovery) = model.discovery.as_ref() else {
        return Vec::new();
    };
    let services: Vec<&Service> = model
        .services()
        .filter(|service| {
            let methods: Vec<&Method> = model.methods_of(service).collect();
            methods.iter().any(|m| m.discovery_lro.is_some())
                && !methods.iter().any(|m| discovery.pollers.iter().any(|p| p.method_id == m.id))
        })
        .collect();
    info!(count = services.len(), "discovery lro services");
    services
}
