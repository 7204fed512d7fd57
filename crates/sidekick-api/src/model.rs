//! The language-neutral API model.
//!
//! Parsers build an [`Api`] whose nodes refer to each other only by ID
//! strings. Nodes are staged with [`Api::add_message`] and friends, and the
//! containers ([`Api::messages`], [`Message::messages`], [`Service::methods`])
//! hold ordered ID lists. [`crate::cross_reference`] consumes the `Api` and
//! produces a resolved [`crate::Model`].
//!
//! Fields, enum values and oneofs are owned inline by their parent. Every node
//! carries a [`CodecSlot`], the write-once side channel filled by a
//! target-language codec.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};

use crate::config::DiscoveryConfig;
use crate::error::{Error, Result};
use crate::path::PathTemplate;
use crate::resource::Resource;
use crate::routing::RoutingInfo;

/// Write-once, type-erased annotation attached by a codec.
///
/// The annotation is stored as a [`serde_json::Value`] so templates can read
/// it without the model knowing any target-language vocabulary.
#[derive(Clone, Debug, Default)]
pub struct CodecSlot(OnceLock<serde_json::Value>);

impl CodecSlot {
    /// Store `value` in the slot.
    ///
    /// # Errors
    ///
    /// [`Error::CodecAlreadySet`] if the slot was already written, or
    /// [`Error::Codec`] if `value` does not serialize.
    pub fn set<T: Serialize>(&self, id: &str, value: &T) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| Error::Codec {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        self.0.set(value).map_err(|_| Error::CodecAlreadySet { id: id.to_string() })
    }

    /// The stored annotation, if any.
    #[must_use]
    pub fn get(&self) -> Option<&serde_json::Value> {
        self.0.get()
    }

    /// Decode the stored annotation back into its codec type.
    #[must_use]
    pub fn decode<T: DeserializeOwned>(&self) -> Option<T> {
        self.0.get().and_then(|v| T::deserialize(v).ok())
    }

    /// Whether the slot has been written.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.0.get().is_some()
    }
}

impl Serialize for CodecSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.0.get() {
            Some(value) => value.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }
}

/// The root of an API model.
#[derive(Debug, Default, Serialize)]
pub struct Api {
    /// Short name, e.g. `secretmanager`.
    pub name: String,
    /// Human readable title.
    pub title: String,
    /// Summary of the API.
    pub description: String,
    /// The protobuf-style package shared by every local element.
    pub package_name: String,
    /// Top-level messages of this API, in source order.
    pub messages: Vec<String>,
    /// Top-level enums of this API, in source order.
    pub enums: Vec<String>,
    /// Services of this API, in source order.
    pub services: Vec<String>,
    /// File-level `google.api.resource_definition` entries.
    pub resource_definitions: Vec<Resource>,
    /// Discovery LRO configuration the model was parsed with.
    #[serde(skip)]
    pub discovery: Option<DiscoveryConfig>,
    /// Model-wide codec annotation.
    pub codec: CodecSlot,
    #[serde(skip)]
    pub(crate) elements: Elements,
}

/// Nodes staged by a parser, waiting for cross-referencing.
#[derive(Debug, Default)]
pub(crate) struct Elements {
    pub(crate) messages: Vec<Message>,
    pub(crate) enums: Vec<Enum>,
    pub(crate) services: Vec<Service>,
    pub(crate) methods: Vec<Method>,
}

impl Api {
    /// An empty API in `package_name`.
    #[must_use]
    pub fn new(name: &str, package_name: &str) -> Self {
        Self {
            name: name.to_string(),
            title: name.to_string(),
            package_name: package_name.to_string(),
            ..Self::default()
        }
    }

    /// Stage a message. Local top-level messages must also be listed in
    /// [`Api::messages`].
    pub fn add_message(&mut self, message: Message) {
        self.elements.messages.push(message);
    }

    /// Stage an enum.
    pub fn add_enum(&mut self, enum_: Enum) {
        self.elements.enums.push(enum_);
    }

    /// Stage a service.
    pub fn add_service(&mut self, service: Service) {
        self.elements.services.push(service);
    }

    /// Stage a method.
    pub fn add_method(&mut self, method: Method) {
        self.elements.methods.push(method);
    }

    /// Whether a message with `id` has been staged.
    #[must_use]
    pub fn has_message(&self, id: &str) -> bool {
        self.elements.messages.iter().any(|m| m.id == id)
    }
}

/// A message, possibly synthetic (map entries, request messages).
#[derive(Clone, Debug, Default, Serialize)]
pub struct Message {
    /// Unqualified name.
    pub name: String,
    /// Fully qualified ID, e.g. `.google.cloud.secretmanager.v1.Secret`.
    pub id: String,
    /// Package of the message.
    pub package: String,
    /// Documentation, markdown.
    pub documentation: String,
    /// Fields in declaration order.
    pub fields: Vec<Field>,
    /// IDs of nested messages.
    #[serde(skip)]
    pub messages: Vec<String>,
    /// IDs of nested enums.
    #[serde(skip)]
    pub enums: Vec<String>,
    /// Oneof groups.
    pub one_ofs: Vec<OneOf>,
    /// Set when the message is an AIP-123 resource.
    pub resource: Option<Resource>,
    /// Synthetic map entry with `key` and `value` fields.
    pub is_map: bool,
    /// Deprecated in the source.
    pub deprecated: bool,
    /// ID of the enclosing message, for nested messages.
    pub parent_id: Option<String>,
    /// Codec annotation.
    pub codec: CodecSlot,
}

impl Message {
    /// A message named `name` in `package`.
    #[must_use]
    pub fn new(package: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: format!(".{package}.{name}"),
            package: package.to_string(),
            ..Self::default()
        }
    }

    /// A message nested inside `parent`.
    #[must_use]
    pub fn nested(parent: &Message, name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: format!("{}.{name}", parent.id),
            package: parent.package.clone(),
            parent_id: Some(parent.id.clone()),
            ..Self::default()
        }
    }

    /// Append a field, deriving its ID from the message ID.
    #[must_use]
    pub fn with_field(mut self, mut field: Field) -> Self {
        field.id = format!("{}.{}", self.id, field.name);
        self.fields.push(field);
        self
    }

    /// Set the documentation.
    #[must_use]
    pub fn with_documentation(mut self, documentation: &str) -> Self {
        self.documentation = documentation.to_string();
        self
    }

    /// Mark the message as a resource.
    #[must_use]
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Find a field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// The value kind of a field, numbered like `google.protobuf.FieldDescriptorProto.Type`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum Typez {
    Double = 1,
    Float = 2,
    Int64 = 3,
    Uint64 = 4,
    Int32 = 5,
    Fixed64 = 6,
    Fixed32 = 7,
    Bool = 8,
    #[default]
    String = 9,
    Group = 10,
    Message = 11,
    Bytes = 12,
    Uint32 = 13,
    Enum = 14,
    Sfixed32 = 15,
    Sfixed64 = 16,
    Sint32 = 17,
    Sint64 = 18,
}

impl From<prost_types::field_descriptor_proto::Type> for Typez {
    fn from(value: prost_types::field_descriptor_proto::Type) -> Self {
        use prost_types::field_descriptor_proto::Type;
        match value {
            Type::Double => Self::Double,
            Type::Float => Self::Float,
            Type::Int64 => Self::Int64,
            Type::Uint64 => Self::Uint64,
            Type::Int32 => Self::Int32,
            Type::Fixed64 => Self::Fixed64,
            Type::Fixed32 => Self::Fixed32,
            Type::Bool => Self::Bool,
            Type::String => Self::String,
            Type::Group => Self::Group,
            Type::Message => Self::Message,
            Type::Bytes => Self::Bytes,
            Type::Uint32 => Self::Uint32,
            Type::Enum => Self::Enum,
            Type::Sfixed32 => Self::Sfixed32,
            Type::Sfixed64 => Self::Sfixed64,
            Type::Sint32 => Self::Sint32,
            Type::Sint64 => Self::Sint64,
        }
    }
}

impl Typez {
    /// Message and group fields reference a message by ID.
    #[must_use]
    pub fn is_message(self) -> bool {
        matches!(self, Self::Message | Self::Group)
    }

    /// Scalars have no `typez_id`.
    #[must_use]
    pub fn is_scalar(self) -> bool {
        !self.is_message() && self != Self::Enum
    }
}

/// `google.api.field_behavior` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum FieldBehavior {
    Optional,
    Required,
    OutputOnly,
    InputOnly,
    Immutable,
    UnorderedList,
    NonEmptyDefault,
    Identifier,
}

impl FieldBehavior {
    /// Map the annotation number; unknown values are ignored.
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            1 => Self::Optional,
            2 => Self::Required,
            3 => Self::OutputOnly,
            4 => Self::InputOnly,
            5 => Self::Immutable,
            6 => Self::UnorderedList,
            7 => Self::NonEmptyDefault,
            8 => Self::Identifier,
            _ => return None,
        })
    }
}

/// `google.api.field_info.format` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(missing_docs)]
pub enum FieldFormat {
    Uuid4,
    Ipv4,
    Ipv6,
    Ipv4OrIpv6,
}

impl FieldFormat {
    /// Map the annotation number; `0` and unknown values mean "no format".
    #[must_use]
    pub fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            1 => Self::Uuid4,
            2 => Self::Ipv4,
            3 => Self::Ipv6,
            4 => Self::Ipv4OrIpv6,
            _ => return None,
        })
    }
}

/// `google.api.resource_reference` on a field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResourceReference {
    /// The referenced resource type, or `*` for any.
    #[serde(rename = "type")]
    pub type_: String,
    /// Set when the field names a parent of `child_type`.
    pub child_type: String,
}

/// A message field.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Field {
    /// Name as declared, usually `snake_case`.
    pub name: String,
    /// JSON name, usually `lowerCamelCase`.
    pub json_name: String,
    /// `{message id}.{name}`.
    pub id: String,
    /// Documentation, markdown.
    pub documentation: String,
    /// Value kind.
    pub typez: Typez,
    /// Referenced message or enum ID; empty for scalars.
    pub typez_id: String,
    /// `repeated` field.
    pub repeated: bool,
    /// Explicit presence: proto3 `optional`, or a singular message.
    pub optional: bool,
    /// The field is a map; `typez_id` names the entry message.
    pub map: bool,
    /// Member of a (non-synthetic) oneof.
    pub is_oneof: bool,
    /// `google.api.field_behavior` annotations.
    pub behavior: Vec<FieldBehavior>,
    /// `google.api.field_info.format`.
    pub format: Option<FieldFormat>,
    /// `google.api.resource_reference`.
    pub resource_reference: Option<ResourceReference>,
    /// The request field carrying the page token of a paginated method.
    pub pagination: bool,
    /// Filled with a UUID4 by clients when left empty.
    pub auto_populated: bool,
    /// The field type transitively contains the message holding this field.
    pub recursive: bool,
    /// Deprecated in the source.
    pub deprecated: bool,
    /// Codec annotation.
    pub codec: CodecSlot,
}

impl Field {
    /// A singular scalar field.
    #[must_use]
    pub fn scalar(name: &str, typez: Typez) -> Self {
        Self {
            name: name.to_string(),
            json_name: crate::casing::to_lower_camel_case(name),
            typez,
            ..Self::default()
        }
    }

    /// A singular message field. Message fields always have presence.
    #[must_use]
    pub fn message(name: &str, typez_id: &str) -> Self {
        Self {
            typez_id: typez_id.to_string(),
            optional: true,
            ..Self::scalar(name, Typez::Message)
        }
    }

    /// A singular enum field.
    #[must_use]
    pub fn enumeration(name: &str, typez_id: &str) -> Self {
        Self {
            typez_id: typez_id.to_string(),
            ..Self::scalar(name, Typez::Enum)
        }
    }

    /// Mark the field `repeated`. Repeated fields have no presence.
    #[must_use]
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self.optional = false;
        self
    }

    /// Mark the field as a map whose entry message is `typez_id`.
    #[must_use]
    pub fn into_map(mut self) -> Self {
        self.map = true;
        self.repeated = false;
        self.optional = false;
        self
    }

    /// Mark the field `optional`.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Add a field behavior.
    #[must_use]
    pub fn with_behavior(mut self, behavior: FieldBehavior) -> Self {
        self.behavior.push(behavior);
        self
    }

    /// Set the resource reference.
    #[must_use]
    pub fn with_resource_reference(mut self, type_: &str) -> Self {
        self.resource_reference = Some(ResourceReference {
            type_: type_.to_string(),
            child_type: String::new(),
        });
        self
    }

    /// Whether the field is annotated `REQUIRED`.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.behavior.contains(&FieldBehavior::Required)
    }
}

/// A oneof group. Member fields stay in [`Message::fields`].
#[derive(Clone, Debug, Default, Serialize)]
pub struct OneOf {
    /// Name as declared.
    pub name: String,
    /// `{message id}.{name}`.
    pub id: String,
    /// Documentation.
    pub documentation: String,
    /// IDs of member fields, in declaration order.
    pub fields: Vec<String>,
    /// Codec annotation.
    pub codec: CodecSlot,
}

/// An enum.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Enum {
    /// Unqualified name.
    pub name: String,
    /// Fully qualified ID.
    pub id: String,
    /// Package of the enum.
    pub package: String,
    /// Documentation.
    pub documentation: String,
    /// Values in declaration order.
    pub values: Vec<EnumValue>,
    /// Deprecated in the source.
    pub deprecated: bool,
    /// ID of the enclosing message, for nested enums.
    pub parent_id: Option<String>,
    /// Codec annotation.
    pub codec: CodecSlot,
}

impl Enum {
    /// An enum named `name` in `package`.
    #[must_use]
    pub fn new(package: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: format!(".{package}.{name}"),
            package: package.to_string(),
            ..Self::default()
        }
    }

    /// An enum nested inside `parent`.
    #[must_use]
    pub fn nested(parent: &Message, name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: format!("{}.{name}", parent.id),
            package: parent.package.clone(),
            parent_id: Some(parent.id.clone()),
            ..Self::default()
        }
    }

    /// Append a value.
    #[must_use]
    pub fn with_value(mut self, name: &str, number: i32) -> Self {
        self.values.push(EnumValue {
            name: name.to_string(),
            id: format!("{}.{name}", self.id),
            number,
            ..EnumValue::default()
        });
        self
    }
}

/// A value of an [`Enum`].
#[derive(Clone, Debug, Default, Serialize)]
pub struct EnumValue {
    /// Name as declared.
    pub name: String,
    /// `{enum id}.{name}`.
    pub id: String,
    /// Numeric value.
    pub number: i32,
    /// Documentation.
    pub documentation: String,
    /// Deprecated in the source.
    pub deprecated: bool,
    /// Codec annotation.
    pub codec: CodecSlot,
}

/// A service.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Service {
    /// Unqualified name.
    pub name: String,
    /// Fully qualified ID.
    pub id: String,
    /// Package of the service.
    pub package: String,
    /// Documentation.
    pub documentation: String,
    /// `google.api.default_host`.
    pub default_host: String,
    /// `google.api.oauth_scopes`, split on commas.
    pub oauth_scopes: Vec<String>,
    /// `google.api.api_version`.
    pub api_version: Option<String>,
    /// IDs of the methods, in declaration order.
    pub methods: Vec<String>,
    /// Deprecated in the source.
    pub deprecated: bool,
    /// Codec annotation.
    pub codec: CodecSlot,
}

impl Service {
    /// A service named `name` in `package`.
    #[must_use]
    pub fn new(package: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            id: format!(".{package}.{name}"),
            package: package.to_string(),
            ..Self::default()
        }
    }
}

/// HTTP binding of a method.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PathInfo {
    /// The primary binding first, then `additional_bindings`.
    pub bindings: Vec<PathBinding>,
    /// `body` of the rule: a field name, `*`, or none.
    pub body_field_path: Option<String>,
}

/// One `verb path` pair.
#[derive(Clone, Debug, Default, Serialize)]
pub struct PathBinding {
    /// Upper-case HTTP verb.
    pub verb: String,
    /// The parsed template.
    pub path_template: PathTemplate,
    /// Request fields sent as query parameters, sorted.
    pub query_parameters: BTreeSet<String>,
}

/// AIP-4233 pagination of a list method.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Request field with the page token.
    pub page_token: String,
    /// Request field with the page size.
    pub page_size: String,
    /// Response field with the next page token.
    pub next_page_token: String,
    /// Response field holding the page items.
    pub item_field: String,
}

/// `google.longrunning.operation_info`.
#[derive(Clone, Debug, Default, Serialize)]
pub struct OperationInfo {
    /// ID of the final response type.
    pub response_type_id: String,
    /// ID of the metadata type.
    pub metadata_type_id: String,
}

/// Discovery-style long-running operation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiscoveryLro {
    /// Request fields forwarded to the poller.
    pub polling_path_parameters: Vec<String>,
}

/// A service method.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Method {
    /// Unqualified name.
    pub name: String,
    /// `{service id}.{name}`.
    pub id: String,
    /// Documentation.
    pub documentation: String,
    /// ID of the service that declares the method.
    pub source_service_id: String,
    /// Request message ID.
    pub input_type_id: String,
    /// Response message ID.
    pub output_type_id: String,
    /// HTTP bindings.
    pub path_info: PathInfo,
    /// Dynamic routing keys.
    pub routing: Vec<RoutingInfo>,
    /// Set for `google.longrunning` LROs.
    pub operation_info: Option<OperationInfo>,
    /// Set for Discovery LROs.
    pub discovery_lro: Option<DiscoveryLro>,
    /// Set for list methods.
    pub pagination: Option<Pagination>,
    /// Client streams requests.
    pub client_side_streaming: bool,
    /// Server streams responses.
    pub server_side_streaming: bool,
    /// Output is `google.protobuf.Empty`; computed by cross-referencing.
    pub returns_empty: bool,
    /// The service `api_version`, copied onto each method.
    pub api_version: Option<String>,
    /// Deprecated in the source.
    pub deprecated: bool,
    /// Codec annotation.
    pub codec: CodecSlot,
}

impl Method {
    /// A method of `service`.
    #[must_use]
    pub fn new(service: &Service, name: &str, input_type_id: &str, output_type_id: &str) -> Self {
        Self {
            name: name.to_string(),
            id: format!("{}.{name}", service.id),
            source_service_id: service.id.clone(),
            input_type_id: input_type_id.to_string(),
            output_type_id: output_type_id.to_string(),
            ..Self::default()
        }
    }

    /// Add an HTTP binding without query parameters.
    #[must_use]
    pub fn with_binding(mut self, verb: &str, path_template: PathTemplate) -> Self {
        self.path_info.bindings.push(PathBinding {
            verb: verb.to_string(),
            path_template,
            query_parameters: BTreeSet::new(),
        });
        self
    }

    /// The primary binding, if any.
    #[must_use]
    pub fn primary_binding(&self) -> Option<&PathBinding> {
        self.path_info.bindings.first()
    }
}
