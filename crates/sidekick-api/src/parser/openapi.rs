//! OpenAPI v3 documents → [`Api`].
//!
//! Each `components.schemas` entry becomes a message. All operations belong
//! to one service; each gets a synthetic `{Method}Request` message holding
//! its parameters and body.

use serde_json::Value;
use tracing::{debug, warn};

use super::schema::{description, SchemaContext};
use super::{read_json_or_yaml, snake_case_variables, ParserConfig};
use crate::casing::{to_pascal_case, to_snake_case};
use crate::error::{Error, Result};
use crate::model::{Api, Message, Method, Service};
use crate::path::PathTemplate;
use crate::wkt;

const SCHEMA_PREFIX: &str = "#/components/schemas/";
const VERBS: [&str; 5] = ["get", "put", "post", "delete", "patch"];

pub(crate) fn parse(config: &ParserConfig<'_>) -> Result<Api> {
    let path = config.specification_source.as_path();
    let document = read_json_or_yaml(path)?;
    from_document(config, &document)
}

/// Build an [`Api`] from a parsed OpenAPI document.
///
/// # Errors
///
/// [`Error::Specification`] for documents that are not OpenAPI v3 or use
/// unsupported schema shapes.
pub fn from_document(config: &ParserConfig<'_>, document: &Value) -> Result<Api> {
    let path = config.specification_source.as_path();
    let version = document.get("openapi").and_then(Value::as_str).unwrap_or_default();
    if !version.starts_with('3') {
        return Err(Error::specification(path, "not an OpenAPI v3 document"));
    }

    let info = document.get("info").unwrap_or(&Value::Null);
    let title = info.get("title").and_then(Value::as_str).unwrap_or_default();
    let short_title = title.trim().trim_end_matches(" API").trim();
    let package = config
        .service_config
        .and_then(|s| s.api_package())
        .or_else(|| config.option("package-name"))
        .map_or_else(|| to_snake_case(short_title), ToString::to_string);
    if package.is_empty() {
        return Err(Error::specification(path, "cannot derive a package name"));
    }

    let mut api = Api::new(&to_snake_case(short_title), &package);
    api.title = title.to_string();
    api.description = description(info);

    let context = SchemaContext {
        package: &package,
        ref_prefix: SCHEMA_PREFIX,
        path,
    };
    if let Some(schemas) = document.pointer("/components/schemas").and_then(Value::as_object) {
        for (name, schema) in schemas {
            let id = context.message_from_schema(&mut api, name, schema)?;
            api.messages.push(id);
        }
    }

    let service_name = config
        .service_config
        .and_then(|s| s.apis.first())
        .and_then(|a| a.rsplit('.').next())
        .map_or_else(|| format!("{}Service", to_pascal_case(short_title)), ToString::to_string);
    let mut service = Service::new(&package, &service_name);
    service.documentation = api.description.clone();

    let empty = serde_json::Map::new();
    let paths = document.get("paths").and_then(Value::as_object).unwrap_or(&empty);
    for (http_path, item) in paths {
        for verb in VERBS {
            let Some(operation) = item.get(verb) else {
                continue;
            };
            let method = operation_method(&context, &mut api, document, &service, http_path, item, verb, operation)?;
            debug!(id = %method.id, verb, path = %http_path, "openapi operation");
            service.methods.push(method.id.clone());
            api.add_method(method);
        }
    }

    api.services.push(service.id.clone());
    api.add_service(service);
    Ok(api)
}

#[allow(clippy::too_many_arguments)]
fn operation_method(
    context: &SchemaContext<'_>,
    api: &mut Api,
    document: &Value,
    service: &Service,
    http_path: &str,
    item: &Value,
    verb: &str,
    operation: &Value,
) -> Result<Method> {
    let Some(operation_id) = operation.get("operationId").and_then(Value::as_str) else {
        return Err(Error::specification(
            context.path,
            format!("{} {http_path} has no operationId", verb.to_ascii_uppercase()),
        ));
    };
    let name = to_pascal_case(operation_id);
    let mut request = Message::new(context.package, &format!("{name}Request"));
    request.documentation = format!("The request message for {name}.");

    let parameters = item
        .get("parameters")
        .and_then(Value::as_array)
        .into_iter()
        .chain(operation.get("parameters").and_then(Value::as_array))
        .flatten();
    for parameter in parameters {
        let parameter = resolve(document, parameter);
        let location = parameter.get("in").and_then(Value::as_str).unwrap_or_default();
        if !matches!(location, "path" | "query") {
            continue;
        }
        let Some(parameter_name) = parameter.get("name").and_then(Value::as_str) else {
            continue;
        };
        if request.fields.iter().any(|f| f.json_name == parameter_name) {
            continue;
        }
        let required = location == "path" || parameter.get("required").and_then(Value::as_bool).unwrap_or(false);
        let schema = resolve(document, parameter.get("schema").unwrap_or(&Value::Null));
        let mut field = context.field_from_schema(api, &mut request, parameter_name, schema, required)?;
        let text = description(parameter);
        if !text.is_empty() {
            field.documentation = text;
        }
        request.fields.push(field);
    }

    let mut body_field_path = None;
    if let Some(body) = operation.get("requestBody").map(|b| resolve(document, b)) {
        let schema = body.pointer("/content/application~1json/schema").unwrap_or(&Value::Null);
        let field_name = schema
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(|r| r.strip_prefix(SCHEMA_PREFIX))
            .map_or_else(|| "body".to_string(), to_snake_case);
        let required = body.get("required").and_then(Value::as_bool).unwrap_or(false);
        let mut field = context.field_from_schema(api, &mut request, &field_name, schema, required)?;
        field.documentation = description(body);
        body_field_path = Some(field.name.clone());
        request.fields.push(field);
    }

    let output_type_id = response_type(context, api, document, &name, operation)?;
    let template = PathTemplate::parse(&snake_case_variables(http_path))?;
    let mut method = Method::new(service, &name, &request.id, &output_type_id)
        .with_binding(&verb.to_ascii_uppercase(), template);
    method.path_info.body_field_path = body_field_path;
    method.documentation = [operation.get("summary"), operation.get("description")]
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");
    method.deprecated = operation.get("deprecated").and_then(Value::as_bool).unwrap_or(false);

    api.messages.push(request.id.clone());
    api.add_message(request);
    Ok(method)
}

/// The message returned by the first 2xx JSON response, or `Empty`.
fn response_type(
    context: &SchemaContext<'_>,
    api: &mut Api,
    document: &Value,
    method_name: &str,
    operation: &Value,
) -> Result<String> {
    let Some(responses) = operation.get("responses").and_then(Value::as_object) else {
        return Ok(wkt::EMPTY.to_string());
    };
    let Some(response) = responses
        .iter()
        .find(|(code, _)| code.starts_with('2'))
        .map(|(_, r)| resolve(document, r))
    else {
        return Ok(wkt::EMPTY.to_string());
    };
    let Some(schema) = response.pointer("/content/application~1json/schema") else {
        return Ok(wkt::EMPTY.to_string());
    };
    if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
        return context.ref_id(reference);
    }
    if schema.get("properties").is_some_and(Value::is_object) {
        let id = context.message_from_schema(api, &format!("{method_name}Response"), schema)?;
        api.messages.push(id.clone());
        return Ok(id);
    }
    warn!(method = method_name, "response schema is not an object, using Empty");
    Ok(wkt::EMPTY.to_string())
}

/// Follow a local `$ref` (`#/components/parameters/...`), if any.
fn resolve<'a>(document: &'a Value, value: &'a Value) -> &'a Value {
    value
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|r| r.strip_prefix('#'))
        .filter(|pointer| !pointer.starts_with("/components/schemas/"))
        .and_then(|pointer| document.pointer(pointer))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::parser::SpecificationFormat;

    fn document() -> Value {
        json!({
            "openapi": "3.0.3",
            "info": {"title": "Secret Manager API", "description": "Stores secrets."},
            "components": {
                "schemas": {
                    "Secret": {
                        "properties": {"name": {"type": "string"}}
                    },
                    "ListSecretsResponse": {
                        "properties": {
                            "secrets": {"type": "array", "items": {"$ref": "#/components/schemas/Secret"}},
                            "nextPageToken": {"type": "string"}
                        }
                    }
                },
                "parameters": {
                    "project": {"name": "project", "in": "path", "required": true, "schema": {"type": "string"}}
                }
            },
            "paths": {
                "/v1/projects/{project}/secrets": {
                    "parameters": [{"$ref": "#/components/parameters/project"}],
                    "get": {
                        "operationId": "ListSecrets",
                        "summary": "Lists secrets.",
                        "parameters": [
                            {"name": "pageToken", "in": "query", "schema": {"type": "string"}},
                            {"name": "pageSize", "in": "query", "schema": {"type": "integer", "format": "int32"}},
                            {"name": "x-goog-request", "in": "header", "schema": {"type": "string"}}
                        ],
                        "responses": {"200": {"content": {"application/json": {
                            "schema": {"$ref": "#/components/schemas/ListSecretsResponse"}
                        }}}}
                    },
                    "post": {
                        "operationId": "CreateSecret",
                        "requestBody": {"required": true, "content": {"application/json": {
                            "schema": {"$ref": "#/components/schemas/Secret"}
                        }}},
                        "responses": {"200": {"content": {"application/json": {
                            "schema": {"$ref": "#/components/schemas/Secret"}
                        }}}}
                    }
                },
                "/v1/projects/{project}/secrets/{secretId}": {
                    "delete": {
                        "operationId": "DeleteSecret",
                        "parameters": [
                            {"name": "project", "in": "path", "schema": {"type": "string"}},
                            {"name": "secretId", "in": "path", "schema": {"type": "string"}}
                        ],
                        "responses": {"204": {"description": "No content."}}
                    }
                }
            }
        })
    }

    fn parse_document() -> Api {
        let config = ParserConfig::new(SpecificationFormat::OpenApi, "openapi.json");
        from_document(&config, &document()).unwrap()
    }

    fn staged<'a>(api: &'a Api, id: &str) -> &'a Message {
        api.elements.messages.iter().find(|m| m.id == id).unwrap()
    }

    #[test]
    fn package_and_service_from_title() {
        let api = parse_document();
        assert_eq!(api.package_name, "secret_manager");
        assert_eq!(api.title, "Secret Manager API");
        assert_eq!(api.description, "Stores secrets.");
        assert_eq!(api.services, vec![".secret_manager.SecretManagerService"]);
    }

    #[test]
    fn operations_in_path_then_verb_order() {
        let api = parse_document();
        let ids: Vec<&str> = api.elements.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(ids, vec!["ListSecrets", "CreateSecret", "DeleteSecret"]);
        let create = &api.elements.methods[1];
        assert_eq!(create.path_info.bindings[0].verb, "POST");
        assert_eq!(create.path_info.body_field_path.as_deref(), Some("secret"));
        assert_eq!(create.output_type_id, ".secret_manager.Secret");
        let delete = &api.elements.methods[2];
        assert_eq!(delete.output_type_id, wkt::EMPTY);
        assert_eq!(
            delete.path_info.bindings[0].path_template.flat_path(),
            "v1/projects/{project}/secrets/{secret_id}"
        );
    }

    #[test]
    fn request_messages_hold_parameters() {
        let api = parse_document();
        let request = staged(&api, ".secret_manager.ListSecretsRequest");
        let names: Vec<&str> = request.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["project", "page_token", "page_size"]);
        assert!(request.field("project").unwrap().is_required());
        assert!(request.field("page_token").unwrap().optional);
        assert_eq!(request.field("page_token").unwrap().json_name, "pageToken");
        assert_eq!(api.elements.methods[0].documentation, "Lists secrets.");

        let create = staged(&api, ".secret_manager.CreateSecretRequest");
        assert!(create.field("secret").unwrap().is_required());
        assert!(api.messages.contains(&".secret_manager.CreateSecretRequest".to_string()));
    }

    #[test]
    fn rejects_swagger_documents() {
        let config = ParserConfig::new(SpecificationFormat::OpenApi, "swagger.json");
        let err = from_document(&config, &json!({"swagger": "2.0"})).unwrap_err();
        assert!(matches!(err, Error::Specification { .. }));
    }

    #[test]
    fn missing_operation_id_fails() {
        let config = ParserConfig::new(SpecificationFormat::OpenApi, "openapi.json");
        let document = json!({
            "openapi": "3.1.0",
            "info": {"title": "T"},
            "paths": {"/v1/things": {"get": {}}}
        });
        assert!(from_document(&config, &document).is_err());
    }
}
