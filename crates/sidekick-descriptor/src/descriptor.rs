//! Minimal protobuf descriptor types with `google.api` extension support.
//!
//! Standard [`prost_types`](https://docs.rs/prost-types) messages drop the
//! extension fields (`google.api.http` = 72295728, `google.api.routing` =
//! 72295729, `google.api.resource` = 1053, ...) during decoding because prost
//! doesn't retain unknown fields. These types declare them inline so they
//! survive a decode of `protoc --descriptor_set_out` output or a plugin
//! `CodeGeneratorRequest`.

#[allow(clippy::all, clippy::pedantic, clippy::nursery, missing_docs)]
mod types {
    use prost::Message;

    #[derive(Clone, PartialEq, Message)]
    pub struct FileDescriptorSet {
        #[prost(message, repeated, tag = "1")]
        pub file: Vec<FileDescriptorProto>,
    }

    /// `google.protobuf.compiler.CodeGeneratorRequest`, as sent to plugins.
    #[derive(Clone, PartialEq, Message)]
    pub struct CodeGeneratorRequest {
        #[prost(string, repeated, tag = "1")]
        pub file_to_generate: Vec<String>,
        #[prost(string, optional, tag = "2")]
        pub parameter: Option<String>,
        #[prost(message, repeated, tag = "15")]
        pub proto_file: Vec<FileDescriptorProto>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct FileDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub package: Option<String>,
        #[prost(string, repeated, tag = "3")]
        pub dependency: Vec<String>,
        #[prost(message, repeated, tag = "4")]
        pub message_type: Vec<DescriptorProto>,
        #[prost(message, repeated, tag = "5")]
        pub enum_type: Vec<EnumDescriptorProto>,
        #[prost(message, repeated, tag = "6")]
        pub service: Vec<ServiceDescriptorProto>,
        #[prost(message, optional, tag = "8")]
        pub options: Option<FileOptions>,
        #[prost(message, optional, tag = "9")]
        pub source_code_info: Option<SourceCodeInfo>,
        #[prost(string, optional, tag = "12")]
        pub syntax: Option<String>,
    }

    /// File options with the `google.api.resource_definition` extension (1053).
    #[derive(Clone, PartialEq, Message)]
    pub struct FileOptions {
        #[prost(message, repeated, tag = "1053")]
        pub resource_definition: Vec<ResourceDescriptor>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct DescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(message, repeated, tag = "2")]
        pub field: Vec<FieldDescriptorProto>,
        #[prost(message, repeated, tag = "3")]
        pub nested_type: Vec<DescriptorProto>,
        #[prost(message, repeated, tag = "4")]
        pub enum_type: Vec<EnumDescriptorProto>,
        #[prost(message, optional, tag = "7")]
        pub options: Option<MessageOptions>,
        #[prost(message, repeated, tag = "8")]
        pub oneof_decl: Vec<OneofDescriptorProto>,
    }

    /// Message options with the `google.api.resource` extension (1053).
    #[derive(Clone, PartialEq, Message)]
    pub struct MessageOptions {
        #[prost(bool, optional, tag = "3")]
        pub deprecated: Option<bool>,
        #[prost(bool, optional, tag = "7")]
        pub map_entry: Option<bool>,
        #[prost(message, optional, tag = "1053")]
        pub resource: Option<ResourceDescriptor>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct FieldDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(int32, optional, tag = "3")]
        pub number: Option<i32>,
        /// 1=optional, 2=required, 3=repeated.
        #[prost(int32, optional, tag = "4")]
        pub label: Option<i32>,
        /// Protobuf field type enum: 1=double, 5=int32, 9=string, 11=message, 14=enum, …
        #[prost(int32, optional, tag = "5")]
        pub r#type: Option<i32>,
        /// Fully-qualified type name for message/enum fields (e.g., `.google.type.Money`).
        #[prost(string, optional, tag = "6")]
        pub type_name: Option<String>,
        #[prost(string, optional, tag = "7")]
        pub default_value: Option<String>,
        #[prost(message, optional, tag = "8")]
        pub options: Option<FieldOptions>,
        #[prost(int32, optional, tag = "9")]
        pub oneof_index: Option<i32>,
        #[prost(string, optional, tag = "10")]
        pub json_name: Option<String>,
        #[prost(bool, optional, tag = "17")]
        pub proto3_optional: Option<bool>,
    }

    /// Field options with the `google.api` field extensions.
    #[derive(Clone, PartialEq, Message)]
    pub struct FieldOptions {
        #[prost(bool, optional, tag = "3")]
        pub deprecated: Option<bool>,
        /// `google.api.field_behavior` (1052), values from [`super::field_behavior`].
        #[prost(int32, repeated, packed = "false", tag = "1052")]
        pub field_behavior: Vec<i32>,
        /// `google.api.resource_reference` (1055).
        #[prost(message, optional, tag = "1055")]
        pub resource_reference: Option<ResourceReference>,
        /// `google.api.field_info` (291403980).
        #[prost(message, optional, tag = "291403980")]
        pub field_info: Option<FieldInfo>,
    }

    /// `google.api.FieldInfo`.
    #[derive(Clone, PartialEq, Message)]
    pub struct FieldInfo {
        /// Values from [`super::field_format`].
        #[prost(int32, optional, tag = "1")]
        pub format: Option<i32>,
    }

    /// `google.api.ResourceReference`.
    #[derive(Clone, PartialEq, Message)]
    pub struct ResourceReference {
        #[prost(string, optional, tag = "1")]
        pub r#type: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub child_type: Option<String>,
    }

    /// `google.api.ResourceDescriptor`.
    #[derive(Clone, PartialEq, Message)]
    pub struct ResourceDescriptor {
        #[prost(string, optional, tag = "1")]
        pub r#type: Option<String>,
        #[prost(string, repeated, tag = "2")]
        pub pattern: Vec<String>,
        #[prost(string, optional, tag = "3")]
        pub name_field: Option<String>,
        #[prost(string, optional, tag = "5")]
        pub plural: Option<String>,
        #[prost(string, optional, tag = "6")]
        pub singular: Option<String>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct OneofDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct EnumDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(message, repeated, tag = "2")]
        pub value: Vec<EnumValueDescriptorProto>,
        #[prost(message, optional, tag = "3")]
        pub options: Option<EnumOptions>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct EnumOptions {
        #[prost(bool, optional, tag = "3")]
        pub deprecated: Option<bool>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct EnumValueDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(int32, optional, tag = "2")]
        pub number: Option<i32>,
        #[prost(message, optional, tag = "3")]
        pub options: Option<EnumValueOptions>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct EnumValueOptions {
        #[prost(bool, optional, tag = "1")]
        pub deprecated: Option<bool>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct ServiceDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(message, repeated, tag = "2")]
        pub method: Vec<MethodDescriptorProto>,
        #[prost(message, optional, tag = "3")]
        pub options: Option<ServiceOptions>,
    }

    /// Service options with the `google.api` client extensions.
    #[derive(Clone, PartialEq, Message)]
    pub struct ServiceOptions {
        #[prost(bool, optional, tag = "33")]
        pub deprecated: Option<bool>,
        /// `google.api.default_host` (1049).
        #[prost(string, optional, tag = "1049")]
        pub default_host: Option<String>,
        /// `google.api.oauth_scopes` (1050), comma separated.
        #[prost(string, optional, tag = "1050")]
        pub oauth_scopes: Option<String>,
        /// `google.api.api_version` (525000001).
        #[prost(string, optional, tag = "525000001")]
        pub api_version: Option<String>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct MethodDescriptorProto {
        #[prost(string, optional, tag = "1")]
        pub name: Option<String>,
        #[prost(string, optional, tag = "2")]
        pub input_type: Option<String>,
        #[prost(string, optional, tag = "3")]
        pub output_type: Option<String>,
        #[prost(message, optional, tag = "4")]
        pub options: Option<MethodOptions>,
        #[prost(bool, optional, tag = "5")]
        pub client_streaming: Option<bool>,
        #[prost(bool, optional, tag = "6")]
        pub server_streaming: Option<bool>,
    }

    /// Method options with the `google.api.http` (72295728), `google.api.routing`
    /// (72295729), `google.api.method_signature` (1051) and
    /// `google.longrunning.operation_info` (1049) extensions.
    #[derive(Clone, PartialEq, Message)]
    pub struct MethodOptions {
        #[prost(bool, optional, tag = "33")]
        pub deprecated: Option<bool>,
        #[prost(message, optional, tag = "1049")]
        pub operation_info: Option<OperationInfo>,
        #[prost(string, repeated, tag = "1051")]
        pub method_signature: Vec<String>,
        #[prost(message, optional, tag = "72295728")]
        pub http: Option<HttpRule>,
        #[prost(message, optional, tag = "72295729")]
        pub routing: Option<RoutingRule>,
    }

    /// [`google.api.HttpRule`]: defines REST mapping for an RPC.
    #[derive(Clone, PartialEq, Message)]
    pub struct HttpRule {
        #[prost(string, tag = "1")]
        pub selector: String,
        #[prost(oneof = "HttpPattern", tags = "2, 3, 4, 5, 6, 8")]
        pub pattern: Option<HttpPattern>,
        #[prost(string, tag = "7")]
        pub body: String,
        #[prost(message, repeated, tag = "11")]
        pub additional_bindings: Vec<HttpRule>,
        #[prost(string, tag = "12")]
        pub response_body: String,
    }

    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum HttpPattern {
        #[prost(string, tag = "2")]
        Get(String),
        #[prost(string, tag = "3")]
        Put(String),
        #[prost(string, tag = "4")]
        Post(String),
        #[prost(string, tag = "5")]
        Delete(String),
        #[prost(string, tag = "6")]
        Patch(String),
        #[prost(message, tag = "8")]
        Custom(CustomHttpPattern),
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct CustomHttpPattern {
        #[prost(string, tag = "1")]
        pub kind: String,
        #[prost(string, tag = "2")]
        pub path: String,
    }

    /// `google.api.RoutingRule`.
    #[derive(Clone, PartialEq, Message)]
    pub struct RoutingRule {
        #[prost(message, repeated, tag = "2")]
        pub routing_parameters: Vec<RoutingParameter>,
    }

    /// `google.api.RoutingParameter`.
    #[derive(Clone, PartialEq, Message)]
    pub struct RoutingParameter {
        #[prost(string, tag = "1")]
        pub field: String,
        #[prost(string, tag = "2")]
        pub path_template: String,
    }

    /// `google.longrunning.OperationInfo`.
    #[derive(Clone, PartialEq, Message)]
    pub struct OperationInfo {
        #[prost(string, tag = "1")]
        pub response_type: String,
        #[prost(string, tag = "2")]
        pub metadata_type: String,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct SourceCodeInfo {
        #[prost(message, repeated, tag = "1")]
        pub location: Vec<Location>,
    }

    #[derive(Clone, PartialEq, Message)]
    pub struct Location {
        #[prost(int32, repeated, tag = "1")]
        pub path: Vec<i32>,
        #[prost(int32, repeated, tag = "2")]
        pub span: Vec<i32>,
        #[prost(string, optional, tag = "3")]
        pub leading_comments: Option<String>,
        #[prost(string, optional, tag = "4")]
        pub trailing_comments: Option<String>,
        #[prost(string, repeated, tag = "6")]
        pub leading_detached_comments: Vec<String>,
    }
}

pub use types::*;

/// Proto field type constants (from `google.protobuf.FieldDescriptorProto.Type`).
pub mod field_type {
    /// `TYPE_DOUBLE = 1`
    pub const DOUBLE: i32 = 1;
    /// `TYPE_FLOAT = 2`
    pub const FLOAT: i32 = 2;
    /// `TYPE_INT64 = 3`
    pub const INT64: i32 = 3;
    /// `TYPE_UINT64 = 4`
    pub const UINT64: i32 = 4;
    /// `TYPE_INT32 = 5`
    pub const INT32: i32 = 5;
    /// `TYPE_FIXED64 = 6`
    pub const FIXED64: i32 = 6;
    /// `TYPE_FIXED32 = 7`
    pub const FIXED32: i32 = 7;
    /// `TYPE_BOOL = 8`
    pub const BOOL: i32 = 8;
    /// `TYPE_STRING = 9`
    pub const STRING: i32 = 9;
    /// `TYPE_GROUP = 10`
    pub const GROUP: i32 = 10;
    /// `TYPE_MESSAGE = 11`
    pub const MESSAGE: i32 = 11;
    /// `TYPE_BYTES = 12`
    pub const BYTES: i32 = 12;
    /// `TYPE_UINT32 = 13`
    pub const UINT32: i32 = 13;
    /// `TYPE_ENUM = 14`
    pub const ENUM: i32 = 14;
    /// `TYPE_SFIXED32 = 15`
    pub const SFIXED32: i32 = 15;
    /// `TYPE_SFIXED64 = 16`
    pub const SFIXED64: i32 = 16;
    /// `TYPE_SINT32 = 17`
    pub const SINT32: i32 = 17;
    /// `TYPE_SINT64 = 18`
    pub const SINT64: i32 = 18;
}

/// Proto field label constants (from `google.protobuf.FieldDescriptorProto.Label`).
pub mod label {
    /// `LABEL_OPTIONAL = 1`
    pub const OPTIONAL: i32 = 1;
    /// `LABEL_REQUIRED = 2`
    pub const REQUIRED: i32 = 2;
    /// `LABEL_REPEATED = 3`
    pub const REPEATED: i32 = 3;
}

/// `google.api.FieldBehavior` values.
pub mod field_behavior {
    /// `OPTIONAL = 1`
    pub const OPTIONAL: i32 = 1;
    /// `REQUIRED = 2`
    pub const REQUIRED: i32 = 2;
    /// `OUTPUT_ONLY = 3`
    pub const OUTPUT_ONLY: i32 = 3;
    /// `INPUT_ONLY = 4`
    pub const INPUT_ONLY: i32 = 4;
    /// `IMMUTABLE = 5`
    pub const IMMUTABLE: i32 = 5;
    /// `UNORDERED_LIST = 6`
    pub const UNORDERED_LIST: i32 = 6;
    /// `NON_EMPTY_DEFAULT = 7`
    pub const NON_EMPTY_DEFAULT: i32 = 7;
    /// `IDENTIFIER = 8`
    pub const IDENTIFIER: i32 = 8;
}

/// `google.api.FieldInfo.Format` values.
pub mod field_format {
    /// `UUID4 = 1`
    pub const UUID4: i32 = 1;
    /// `IPV4 = 2`
    pub const IPV4: i32 = 2;
    /// `IPV6 = 3`
    pub const IPV6: i32 = 3;
    /// `IPV4_OR_IPV6 = 4`
    pub const IPV4_OR_IPV6: i32 = 4;
}

/// Field numbers used in `SourceCodeInfo.Location.path`.
pub mod source_path {
    /// `FileDescriptorProto.message_type`
    pub const FILE_MESSAGE: i32 = 4;
    /// `FileDescriptorProto.enum_type`
    pub const FILE_ENUM: i32 = 5;
    /// `FileDescriptorProto.service`
    pub const FILE_SERVICE: i32 = 6;
    /// `DescriptorProto.field`
    pub const MESSAGE_FIELD: i32 = 2;
    /// `DescriptorProto.nested_type`
    pub const MESSAGE_NESTED: i32 = 3;
    /// `DescriptorProto.enum_type`
    pub const MESSAGE_ENUM: i32 = 4;
    /// `DescriptorProto.oneof_decl`
    pub const MESSAGE_ONEOF: i32 = 8;
    /// `EnumDescriptorProto.value`
    pub const ENUM_VALUE: i32 = 2;
    /// `ServiceDescriptorProto.method`
    pub const SERVICE_METHOD: i32 = 2;
}

impl HttpRule {
    /// The `(http_method, path)` of this rule, or `None` when no pattern is set.
    ///
    /// Custom patterns report their `kind` verbatim (lowercased).
    #[must_use]
    pub fn verb_and_path(&self) -> Option<(String, &str)> {
        Some(match self.pattern.as_ref()? {
            HttpPattern::Get(p) => ("get".to_string(), p.as_str()),
            HttpPattern::Put(p) => ("put".to_string(), p.as_str()),
            HttpPattern::Post(p) => ("post".to_string(), p.as_str()),
            HttpPattern::Delete(p) => ("delete".to_string(), p.as_str()),
            HttpPattern::Patch(p) => ("patch".to_string(), p.as_str()),
            HttpPattern::Custom(c) => (c.kind.to_ascii_lowercase(), c.path.as_str()),
        })
    }
}

/// Extract the primary `google.api.http` rule of a method.
#[must_use]
pub fn extract_http_rule(method: &MethodDescriptorProto) -> Option<&HttpRule> {
    method.options.as_ref().and_then(|o| o.http.as_ref())
}

impl FileDescriptorSet {
    /// Decode either a `FileDescriptorSet` or a `CodeGeneratorRequest`.
    ///
    /// Returns the files together with the list of files to generate. For a
    /// plain descriptor set the list is empty and callers pick the files.
    ///
    /// # Errors
    ///
    /// Returns [`prost::DecodeError`] if the bytes are neither message.
    pub fn decode_any(bytes: &[u8]) -> Result<(Self, Vec<String>), prost::DecodeError> {
        use prost::Message as _;

        // Field 1 is a string in the request and a message in the set, so a
        // descriptor set usually fails to decode as a request.
        if let Ok(request) = CodeGeneratorRequest::decode(bytes) {
            if !request.proto_file.is_empty() {
                return Ok((
                    Self {
                        file: request.proto_file,
                    },
                    request.file_to_generate,
                ));
            }
        }
        Ok((Self::decode(bytes)?, Vec::new()))
    }
}
