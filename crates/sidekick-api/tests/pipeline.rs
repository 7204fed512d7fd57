//! Parse → cross-reference → validate → transform, for each input format.
//!
//! Protobuf inputs are encoded in memory with `prost` and handed to the
//! parser as a descriptor set file; OpenAPI and Discovery documents are
//! written to a temporary directory.

use std::path::Path;

use indoc::indoc;
use pretty_assertions::assert_eq;
use prost::Message as _;
use serde_json::json;
use sidekick_descriptor::descriptor::{
    self, field_behavior, field_type, label, DescriptorProto, FieldDescriptorProto, FieldOptions,
    FileDescriptorProto, FileDescriptorSet, HttpPattern, HttpRule, MessageOptions, MethodDescriptorProto,
    MethodOptions, ResourceDescriptor, RoutingParameter, RoutingRule, ServiceDescriptorProto, ServiceOptions,
};

use sidekick_api::transform::{auto_populate, patch_documentation, skip_model_elements, update_method_pagination};
use sidekick_api::{
    cross_reference, label_recursive_fields, parse, routing_combos, validate, DiscoveryConfig, DocumentationOverride,
    Error, Model, ModelFilter, ParserConfig, Poller, ServiceConfig, SpecificationFormat,
};

const SECRET: &str = "test.googleapis.com/Secret";

fn field(name: &str, number: i32, r#type: i32, type_name: Option<&str>) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(label::OPTIONAL),
        r#type: Some(r#type),
        type_name: type_name.map(ToString::to_string),
        ..FieldDescriptorProto::default()
    }
}

fn repeated(mut f: FieldDescriptorProto) -> FieldDescriptorProto {
    f.label = Some(label::REPEATED);
    f
}

fn with_options(mut f: FieldDescriptorProto, options: FieldOptions) -> FieldDescriptorProto {
    f.options = Some(options);
    f
}

fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..DescriptorProto::default()
    }
}

fn name_reference(behavior: i32) -> FieldOptions {
    FieldOptions {
        field_behavior: vec![behavior],
        resource_reference: Some(descriptor::ResourceReference {
            r#type: Some(SECRET.to_string()),
            child_type: None,
        }),
        ..FieldOptions::default()
    }
}

fn method(name: &str, input: &str, output: &str, http: HttpPattern, body: &str) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(format!(".test.v1.{input}")),
        output_type: Some(output.to_string()),
        options: Some(MethodOptions {
            http: Some(HttpRule {
                pattern: Some(http),
                body: body.to_string(),
                ..HttpRule::default()
            }),
            ..MethodOptions::default()
        }),
        client_streaming: None,
        server_streaming: None,
    }
}

fn secret_file() -> FileDescriptorProto {
    let mut secret = message(
        "Secret",
        vec![
            field("name", 1, field_type::STRING, None),
            field("parent_secret", 2, field_type::MESSAGE, Some(".test.v1.Secret")),
        ],
    );
    secret.options = Some(MessageOptions {
        resource: Some(ResourceDescriptor {
            r#type: Some(SECRET.to_string()),
            pattern: vec!["projects/{project}/secrets/{secret}".to_string()],
            ..ResourceDescriptor::default()
        }),
        ..MessageOptions::default()
    });

    let mut request_id = field("request_id", 3, field_type::STRING, None);
    request_id.options = Some(FieldOptions {
        field_info: Some(descriptor::FieldInfo {
            format: Some(descriptor::field_format::UUID4),
        }),
        ..FieldOptions::default()
    });

    let mut get = method(
        "GetSecret",
        "GetSecretRequest",
        ".test.v1.Secret",
        HttpPattern::Get("/v1/{name=projects/*/secrets/*}".to_string()),
        "",
    );
    if let Some(options) = get.options.as_mut() {
        options.routing = Some(RoutingRule {
            routing_parameters: vec![
                RoutingParameter {
                    field: "name".to_string(),
                    path_template: "{project=projects/*}/**".to_string(),
                },
                RoutingParameter {
                    field: "name".to_string(),
                    path_template: "{location=projects/*/locations/*}/**".to_string(),
                },
            ],
        });
    }

    FileDescriptorProto {
        name: Some("test/v1/secret.proto".to_string()),
        package: Some("test.v1".to_string()),
        syntax: Some("proto3".to_string()),
        message_type: vec![
            secret,
            message(
                "GetSecretRequest",
                vec![with_options(
                    field("name", 1, field_type::STRING, None),
                    name_reference(field_behavior::REQUIRED),
                )],
            ),
            message(
                "DeleteSecretRequest",
                vec![with_options(
                    field("name", 1, field_type::STRING, None),
                    name_reference(field_behavior::REQUIRED),
                )],
            ),
            message(
                "CreateSecretRequest",
                vec![
                    field("parent", 1, field_type::STRING, None),
                    field("secret", 2, field_type::MESSAGE, Some(".test.v1.Secret")),
                    request_id,
                ],
            ),
            message(
                "ListSecretsRequest",
                vec![
                    field("parent", 1, field_type::STRING, None),
                    field("page_size", 2, field_type::INT32, None),
                    field("page_token", 3, field_type::STRING, None),
                ],
            ),
            message(
                "ListSecretsResponse",
                vec![
                    repeated(field("secrets", 1, field_type::MESSAGE, Some(".test.v1.Secret"))),
                    field("next_page_token", 2, field_type::STRING, None),
                ],
            ),
        ],
        service: vec![ServiceDescriptorProto {
            name: Some("SecretManager".to_string()),
            method: vec![
                get,
                method(
                    "DeleteSecret",
                    "DeleteSecretRequest",
                    ".google.protobuf.Empty",
                    HttpPattern::Delete("/v1/{name=projects/*/secrets/*}".to_string()),
                    "",
                ),
                method(
                    "CreateSecret",
                    "CreateSecretRequest",
                    ".test.v1.Secret",
                    HttpPattern::Post("/v1/{parent=projects/*}/secrets".to_string()),
                    "secret",
                ),
                method(
                    "ListSecrets",
                    "ListSecretsRequest",
                    ".test.v1.ListSecretsResponse",
                    HttpPattern::Get("/v1/{parent=projects/*}/secrets".to_string()),
                    "",
                ),
            ],
            options: Some(ServiceOptions {
                default_host: Some("test.googleapis.com".to_string()),
                api_version: Some("v7_20260206".to_string()),
                ..ServiceOptions::default()
            }),
        }],
        ..FileDescriptorProto::default()
    }
}

const SERVICE_CONFIG: &str = indoc! {"
    type: google.api.Service
    name: test.googleapis.com
    title: Test API
    apis:
    - name: test.v1.SecretManager
    documentation:
      summary: Stores secrets.
    publishing:
      method_settings:
      - selector: test.v1.SecretManager.CreateSecret
        auto_populated_fields:
        - request_id
"};

fn protobuf_model(dir: &Path, service_config: &ServiceConfig) -> Model {
    let set = FileDescriptorSet {
        file: vec![secret_file()],
    };
    let descriptor_path = dir.join("descriptors.pb");
    std::fs::write(&descriptor_path, set.encode_to_vec()).unwrap();
    let config = ParserConfig::new(SpecificationFormat::Protobuf, "test/v1")
        .with_option("descriptor-set", descriptor_path.to_str().unwrap())
        .with_service_config(service_config);
    let mut model = cross_reference(parse(&config).unwrap()).unwrap();
    label_recursive_fields(&mut model);
    validate(&model).unwrap();
    model
}

#[test]
fn protobuf_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let service_config = ServiceConfig::from_yaml(Path::new("test_v1.yaml"), SERVICE_CONFIG).unwrap();
    let mut model = protobuf_model(dir.path(), &service_config);

    assert_eq!(model.name, "test");
    assert_eq!(model.title, "Test API");
    assert_eq!(model.description, "Stores secrets.");

    update_method_pagination(&mut model, &[]).unwrap();
    auto_populate(&mut model, &service_config);

    let get = model.method(".test.v1.SecretManager.GetSecret").unwrap();
    assert_eq!(get.api_version.as_deref(), Some("v7_20260206"));
    assert_eq!(
        model.aip_standard_get_info(get).unwrap().resource_name_request_field,
        "name"
    );
    assert_eq!(get.routing.len(), 2);
    assert_eq!(routing_combos(&get.routing).len(), 1);

    let delete = model.method(".test.v1.SecretManager.DeleteSecret").unwrap();
    assert!(delete.returns_empty);
    assert!(model.aip_standard_delete_info(delete).is_some());

    let create = model.method(".test.v1.SecretManager.CreateSecret").unwrap();
    let binding = create.primary_binding().unwrap();
    let query: Vec<&str> = binding.query_parameters.iter().map(String::as_str).collect();
    assert_eq!(query, vec!["request_id"]);
    let request = model.input_type(create).unwrap();
    assert!(request.field("request_id").unwrap().auto_populated);

    let list = model.method(".test.v1.SecretManager.ListSecrets").unwrap();
    assert_eq!(list.pagination.as_ref().unwrap().item_field, "secrets");
    assert!(!model.is_simple(list));

    let secret = model.message(".test.v1.Secret").unwrap();
    assert!(secret.field("parent_secret").unwrap().recursive);
    assert!(!secret.field("name").unwrap().recursive);
}

#[test]
fn protobuf_filters_and_documentation() {
    let dir = tempfile::tempdir().unwrap();
    let service_config = ServiceConfig::from_yaml(Path::new("test_v1.yaml"), SERVICE_CONFIG).unwrap();
    let mut model = protobuf_model(dir.path(), &service_config);

    let filter = ModelFilter {
        included_ids: vec![".test.v1.SecretManager.GetSecret".to_string()],
        skipped_ids: Vec::new(),
    };
    skip_model_elements(&mut model, &filter).unwrap();
    assert_eq!(model.messages, vec![".test.v1.Secret", ".test.v1.GetSecretRequest"]);
    assert_eq!(model.all_methods().len(), 1);
    validate(&model).unwrap();

    let overrides = [DocumentationOverride {
        id: ".test.v1.SecretManager.GetSecret".to_string(),
        match_: "missing".to_string(),
        replace: "x".to_string(),
    }];
    assert!(matches!(
        patch_documentation(&mut model, &overrides),
        Err(Error::DocumentationMismatch { .. })
    ));
}

#[test]
fn openapi_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("openapi.json");
    let document = json!({
        "openapi": "3.0.3",
        "info": {"title": "Secret Manager API"},
        "components": {"schemas": {
            "Secret": {"properties": {
                "name": {"type": "string"},
                "labels": {"type": "object", "additionalProperties": {"type": "string"}},
                "children": {"type": "array", "items": {"$ref": "#/components/schemas/Secret"}}
            }},
            "ListSecretsResponse": {"properties": {
                "secrets": {"type": "array", "items": {"$ref": "#/components/schemas/Secret"}},
                "nextPageToken": {"type": "string"}
            }}
        }},
        "paths": {"/v1/projects/{project}/secrets": {"get": {
            "operationId": "ListSecrets",
            "parameters": [
                {"name": "project", "in": "path", "schema": {"type": "string"}},
                {"name": "pageToken", "in": "query", "schema": {"type": "string"}},
                {"name": "pageSize", "in": "query", "schema": {"type": "integer"}}
            ],
            "responses": {"200": {"content": {"application/json": {
                "schema": {"$ref": "#/components/schemas/ListSecretsResponse"}
            }}}}
        }}}
    });
    std::fs::write(&path, serde_json::to_string_pretty(&document).unwrap()).unwrap();

    let config = ParserConfig::new(SpecificationFormat::OpenApi, &path).with_option("package-name", "google.cloud.secretmanager.v1");
    let mut model = cross_reference(parse(&config).unwrap()).unwrap();
    label_recursive_fields(&mut model);
    validate(&model).unwrap();
    update_method_pagination(&mut model, &[]).unwrap();

    let list = model.method(".google.cloud.secretmanager.v1.SecretManagerService.ListSecrets").unwrap();
    assert_eq!(list.pagination.as_ref().unwrap().item_field, "secrets");
    let query: Vec<&str> = list.primary_binding().unwrap().query_parameters.iter().map(String::as_str).collect();
    assert_eq!(query, vec!["page_size", "page_token"]);

    let secret = model.message(".google.cloud.secretmanager.v1.Secret").unwrap();
    assert!(secret.field("children").unwrap().recursive);
    let entry = model.message(".google.cloud.secretmanager.v1.Secret.LabelsEntry").unwrap();
    assert!(entry.is_map);
}

#[test]
fn discovery_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("compute.json");
    let document = json!({
        "name": "compute",
        "version": "v1",
        "servicePath": "compute/v1/",
        "schemas": {
            "Operation": {"type": "object", "properties": {"name": {"type": "string"}}},
            "Disk": {"type": "object", "properties": {"name": {"type": "string"}}}
        },
        "resources": {
            "disks": {"methods": {"insert": {
                "path": "projects/{project}/zones/{zone}/disks",
                "httpMethod": "POST",
                "parameters": {
                    "project": {"type": "string", "location": "path", "required": true},
                    "zone": {"type": "string", "location": "path", "required": true}
                },
                "parameterOrder": ["project", "zone"],
                "request": {"$ref": "Disk"},
                "response": {"$ref": "Operation"}
            }}},
            "zoneOperations": {"methods": {"get": {
                "path": "projects/{project}/zones/{zone}/operations/{operation}",
                "httpMethod": "GET",
                "parameters": {
                    "project": {"type": "string", "location": "path", "required": true},
                    "zone": {"type": "string", "location": "path", "required": true},
                    "operation": {"type": "string", "location": "path", "required": true}
                },
                "response": {"$ref": "Operation"}
            }}}
        }
    });
    std::fs::write(&path, serde_json::to_string(&document).unwrap()).unwrap();

    let discovery = DiscoveryConfig {
        operation_id: ".google.cloud.compute.v1.Operation".to_string(),
        pollers: vec![
            Poller {
                prefix: "compute/v1/projects/{project}/zones/{zone}".to_string(),
                method_id: ".google.cloud.compute.v1.zoneOperations.get".to_string(),
            },
            Poller {
                prefix: "compute/v1/projects/{project}".to_string(),
                method_id: ".google.cloud.compute.v1.globalOperations.get".to_string(),
            },
        ],
    };
    let config = ParserConfig::new(SpecificationFormat::Discovery, &path).with_discovery(&discovery);
    let model = cross_reference(parse(&config).unwrap()).unwrap();
    validate(&model).unwrap();

    let insert = model.method(".google.cloud.compute.v1.disks.insert").unwrap();
    assert_eq!(insert.discovery_lro.as_ref().unwrap().polling_path_parameters, vec!["project", "zone"]);
    assert!(!model.is_simple(insert));
    let lro: Vec<&str> = sidekick_api::parser::discovery::lro_services(&model)
        .iter()
        .map(|s| s.id.as_str())
        .collect();
    assert_eq!(lro, vec![".google.cloud.compute.v1.disks"]);
}

#[test]
fn missing_specification_is_one_error_kind() {
    let dir = tempfile::tempdir().unwrap();
    for source in [dir.path().to_path_buf(), dir.path().join("missing.json")] {
        let config = ParserConfig::new(SpecificationFormat::OpenApi, source);
        assert!(matches!(parse(&config), Err(Error::Specification { .. })));
    }
}
