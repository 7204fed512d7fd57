//! JSON schema → message conversion shared by the OpenAPI and Discovery
//! parsers.
//!
//! Inline object schemas become nested messages, `additionalProperties`
//! becomes a nested map entry message, and `$ref` becomes a message field.

use std::path::Path;

use serde_json::{Map, Value};

use crate::casing::{to_pascal_case, to_snake_case};
use crate::error::{Error, Result};
use crate::model::{Api, Field, FieldBehavior, FieldFormat, Message, Typez};
use crate::wkt;

/// Where schemas live and how `$ref`s name them.
pub(crate) struct SchemaContext<'a> {
    pub(crate) package: &'a str,
    /// Stripped from `$ref` values (`#/components/schemas/` for OpenAPI).
    pub(crate) ref_prefix: &'a str,
    pub(crate) path: &'a Path,
}

impl SchemaContext<'_> {
    /// The message ID a `$ref` points to.
    pub(crate) fn ref_id(&self, reference: &str) -> Result<String> {
        let name = reference.strip_prefix(self.ref_prefix).unwrap_or(reference);
        if name.is_empty() || name.contains('/') {
            return Err(Error::specification(self.path, format!("unsupported $ref `{reference}`")));
        }
        Ok(format!(".{}.{name}", self.package))
    }

    /// Stage a top-level message for the named schema and return its ID.
    pub(crate) fn message_from_schema(&self, api: &mut Api, name: &str, schema: &Value) -> Result<String> {
        let mut message = Message::new(self.package, name);
        self.populate(api, &mut message, schema)?;
        let id = message.id.clone();
        api.add_message(message);
        Ok(id)
    }

    /// Add one field per property of `schema` to `message`.
    pub(crate) fn populate(&self, api: &mut Api, message: &mut Message, schema: &Value) -> Result<()> {
        message.documentation = description(schema);
        let required: Vec<&str> = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|r| r.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let empty = Map::new();
        let properties = schema.get("properties").and_then(Value::as_object).unwrap_or(&empty);
        for (name, property) in properties {
            let is_required = required.contains(&name.as_str())
                || property.get("required").and_then(Value::as_bool).unwrap_or(false);
            let field = self.field_from_schema(api, message, name, property, is_required)?;
            message.fields.push(field);
        }
        Ok(())
    }

    /// Convert one property. Inline objects are staged as children of
    /// `parent`.
    pub(crate) fn field_from_schema(
        &self,
        api: &mut Api,
        parent: &mut Message,
        json_name: &str,
        schema: &Value,
        is_required: bool,
    ) -> Result<Field> {
        let name = to_snake_case(json_name);
        let mut field = if schema.get("type").and_then(Value::as_str) == Some("array") {
            let items = schema.get("items").unwrap_or(&Value::Null);
            if items.get("type").and_then(Value::as_str) == Some("array") {
                return Err(Error::specification(
                    self.path,
                    format!("nested arrays are not supported in `{}.{json_name}`", parent.id),
                ));
            }
            self.singular_field(api, parent, &name, items)?.repeated()
        } else {
            self.singular_field(api, parent, &name, schema)?
        };

        field.id = format!("{}.{name}", parent.id);
        json_name.clone_into(&mut field.json_name);
        field.documentation = description(schema);
        field.deprecated = schema.get("deprecated").and_then(Value::as_bool).unwrap_or(false);
        if schema.get("readOnly").and_then(Value::as_bool).unwrap_or(false) {
            field.behavior.push(FieldBehavior::OutputOnly);
        }
        if is_required {
            field.behavior.push(FieldBehavior::Required);
        } else if field.typez.is_scalar() && !field.repeated && !field.map {
            field.optional = true;
        }
        Ok(field)
    }

    fn singular_field(&self, api: &mut Api, parent: &mut Message, name: &str, schema: &Value) -> Result<Field> {
        if let Some(reference) = schema.get("$ref").and_then(Value::as_str) {
            return Ok(Field::message(name, &self.ref_id(reference)?));
        }
        let kind = schema.get("type").and_then(Value::as_str).unwrap_or("object");
        let format = schema.get("format").and_then(Value::as_str).unwrap_or_default();
        let field = match (kind, format) {
            ("object", _) => return self.object_field(api, parent, name, schema),
            ("any", _) => Field::message(name, wkt::VALUE),
            ("string", "byte" | "binary") => Field::scalar(name, Typez::Bytes),
            ("string", "int64") => Field::scalar(name, Typez::Int64),
            ("string", "uint64") => Field::scalar(name, Typez::Uint64),
            ("string", "google-datetime" | "date-time") => Field::message(name, wkt::TIMESTAMP),
            ("string", "google-duration") => Field::message(name, wkt::DURATION),
            ("string", "google-fieldmask") => Field::message(name, wkt::FIELD_MASK),
            ("string", "uuid") => Field {
                format: Some(FieldFormat::Uuid4),
                ..Field::scalar(name, Typez::String)
            },
            ("string", _) => Field::scalar(name, Typez::String),
            ("integer", "int64") => Field::scalar(name, Typez::Int64),
            ("integer", "uint32") => Field::scalar(name, Typez::Uint32),
            ("integer", "uint64") => Field::scalar(name, Typez::Uint64),
            ("integer", _) => Field::scalar(name, Typez::Int32),
            ("number", "float") => Field::scalar(name, Typez::Float),
            ("number", _) => Field::scalar(name, Typez::Double),
            ("boolean", _) => Field::scalar(name, Typez::Bool),
            (other, _) => {
                return Err(Error::specification(
                    self.path,
                    format!("unsupported schema type `{other}` in `{}.{name}`", parent.id),
                ))
            }
        };
        Ok(field)
    }

    fn object_field(&self, api: &mut Api, parent: &mut Message, name: &str, schema: &Value) -> Result<Field> {
        if let Some(values) = schema.get("additionalProperties").filter(|v| v.is_object()) {
            let mut entry = Message::nested(parent, &format!("{}Entry", to_pascal_case(name)));
            entry.is_map = true;
            let key = Field {
                id: format!("{}.key", entry.id),
                ..Field::scalar("key", Typez::String)
            };
            let mut value = self.field_from_schema(api, &mut entry, "value", values, false)?;
            value.optional = value.typez.is_message();
            entry.fields = vec![key, value];
            let id = entry.id.clone();
            parent.messages.push(id.clone());
            api.add_message(entry);
            return Ok(Field::message(name, &id).into_map());
        }
        if schema.get("properties").is_some_and(Value::is_object) {
            let mut nested = Message::nested(parent, &to_pascal_case(name));
            self.populate(api, &mut nested, schema)?;
            let id = nested.id.clone();
            parent.messages.push(id.clone());
            api.add_message(nested);
            return Ok(Field::message(name, &id));
        }
        Ok(Field::message(name, wkt::STRUCT))
    }
}

/// The `description` of a schema, trimmed.
pub(crate) fn description(schema: &Value) -> String {
    schema
        .get("description")
        .and_then(Value::as_str)
        .map(|d| d.trim().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn context() -> SchemaContext<'static> {
        SchemaContext {
            package: "test.v1",
            ref_prefix: "#/components/schemas/",
            path: Path::new("openapi.json"),
        }
    }

    fn staged<'a>(api: &'a Api, id: &str) -> &'a Message {
        api.elements.messages.iter().find(|m| m.id == id).unwrap()
    }

    #[test]
    fn scalars_and_refs() {
        let schema = json!({
            "description": " A secret. ",
            "required": ["name"],
            "properties": {
                "name": {"type": "string"},
                "createTime": {"type": "string", "format": "date-time", "readOnly": true},
                "size": {"type": "string", "format": "int64"},
                "ratio": {"type": "number"},
                "labels": {"type": "array", "items": {"type": "string"}},
                "replication": {"$ref": "#/components/schemas/Replication"}
            }
        });
        let mut api = Api::default();
        let id = context().message_from_schema(&mut api, "Secret", &schema).unwrap();
        assert_eq!(id, ".test.v1.Secret");
        let secret = staged(&api, &id);
        assert_eq!(secret.documentation, "A secret.");
        let names: Vec<&str> = secret.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "create_time", "size", "ratio", "labels", "replication"]);

        let name = secret.field("name").unwrap();
        assert!(name.is_required() && !name.optional);
        let create_time = secret.field("create_time").unwrap();
        assert_eq!(create_time.typez_id, wkt::TIMESTAMP);
        assert_eq!(create_time.json_name, "createTime");
        assert_eq!(create_time.behavior, vec![FieldBehavior::OutputOnly]);
        assert_eq!(secret.field("size").unwrap().typez, Typez::Int64);
        assert!(secret.field("size").unwrap().optional);
        assert!(secret.field("labels").unwrap().repeated);
        assert_eq!(secret.field("replication").unwrap().typez_id, ".test.v1.Replication");
        assert_eq!(secret.field("replication").unwrap().id, ".test.v1.Secret.replication");
    }

    #[test]
    fn additional_properties_become_map_entries() {
        let schema = json!({
            "properties": {
                "annotations": {"type": "object", "additionalProperties": {"type": "string"}}
            }
        });
        let mut api = Api::default();
        let id = context().message_from_schema(&mut api, "Secret", &schema).unwrap();
        let secret = staged(&api, &id);
        let field = secret.field("annotations").unwrap();
        assert!(field.map);
        assert_eq!(field.typez_id, ".test.v1.Secret.AnnotationsEntry");
        assert_eq!(secret.messages, vec![".test.v1.Secret.AnnotationsEntry"]);
        let entry = staged(&api, ".test.v1.Secret.AnnotationsEntry");
        assert!(entry.is_map);
        assert_eq!(entry.parent_id.as_deref(), Some(".test.v1.Secret"));
        let names: Vec<&str> = entry.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["key", "value"]);
    }

    #[test]
    fn inline_objects_become_nested_messages() {
        let schema = json!({
            "properties": {
                "status": {"type": "object", "properties": {"code": {"type": "integer"}}},
                "metadata": {"type": "object"}
            }
        });
        let mut api = Api::default();
        let id = context().message_from_schema(&mut api, "Operation", &schema).unwrap();
        let operation = staged(&api, &id);
        assert_eq!(operation.field("status").unwrap().typez_id, ".test.v1.Operation.Status");
        assert_eq!(operation.field("metadata").unwrap().typez_id, wkt::STRUCT);
        let status = staged(&api, ".test.v1.Operation.Status");
        assert_eq!(status.field("code").unwrap().typez, Typez::Int32);
    }

    #[test]
    fn nested_arrays_fail() {
        let schema = json!({
            "properties": {"grid": {"type": "array", "items": {"type": "array", "items": {"type": "integer"}}}}
        });
        let mut api = Api::default();
        let err = context().message_from_schema(&mut api, "Grid", &schema).unwrap_err();
        assert!(matches!(err, Error::Specification { .. }));
    }

    #[test]
    fn refs_outside_schemas_fail() {
        assert!(context().ref_id("#/components/responses/Error").is_err());
        assert_eq!(context().ref_id("#/components/schemas/Secret").unwrap(), ".test.v1.Secret");
    }
}
