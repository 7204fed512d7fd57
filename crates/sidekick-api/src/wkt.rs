//! Well-known `google.protobuf` types.
//!
//! Every model can reference these even when the input never declares them
//! (OpenAPI `google-datetime`, Discovery `google-duration`, ...). Cross
//! referencing registers the definitions below for any ID the input did not
//! provide itself.

use crate::model::{Enum, Field, Message, OneOf, Typez};

/// The `google.protobuf` package.
pub const PACKAGE: &str = "google.protobuf";

/// `.google.protobuf.Any`.
pub const ANY: &str = ".google.protobuf.Any";
/// `.google.protobuf.Duration`.
pub const DURATION: &str = ".google.protobuf.Duration";
/// `.google.protobuf.Empty`.
pub const EMPTY: &str = ".google.protobuf.Empty";
/// `.google.protobuf.FieldMask`.
pub const FIELD_MASK: &str = ".google.protobuf.FieldMask";
/// `.google.protobuf.ListValue`.
pub const LIST_VALUE: &str = ".google.protobuf.ListValue";
/// `.google.protobuf.NullValue`.
pub const NULL_VALUE: &str = ".google.protobuf.NullValue";
/// `.google.protobuf.Struct`.
pub const STRUCT: &str = ".google.protobuf.Struct";
/// `.google.protobuf.Timestamp`.
pub const TIMESTAMP: &str = ".google.protobuf.Timestamp";
/// `.google.protobuf.Value`.
pub const VALUE: &str = ".google.protobuf.Value";

/// The wrapper messages and the scalar each one boxes.
pub const WRAPPERS: [(&str, Typez); 9] = [
    (".google.protobuf.DoubleValue", Typez::Double),
    (".google.protobuf.FloatValue", Typez::Float),
    (".google.protobuf.Int64Value", Typez::Int64),
    (".google.protobuf.UInt64Value", Typez::Uint64),
    (".google.protobuf.Int32Value", Typez::Int32),
    (".google.protobuf.UInt32Value", Typez::Uint32),
    (".google.protobuf.BoolValue", Typez::Bool),
    (".google.protobuf.StringValue", Typez::String),
    (".google.protobuf.BytesValue", Typez::Bytes),
];

/// The scalar wrapped by a `google.protobuf.*Value` wrapper.
#[must_use]
pub fn wrapped_scalar(id: &str) -> Option<Typez> {
    WRAPPERS.iter().find(|(w, _)| *w == id).map(|(_, t)| *t)
}

/// Whether `id` is in the `google.protobuf` package.
#[must_use]
pub fn is_well_known(id: &str) -> bool {
    id.strip_prefix('.')
        .and_then(|rest| rest.strip_prefix(PACKAGE))
        .is_some_and(|rest| rest.starts_with('.'))
}

/// Definitions of all well-known messages, nested map entries included.
#[must_use]
pub fn messages() -> Vec<Message> {
    let mut result = vec![
        Message::new(PACKAGE, "Any")
            .with_field(Field::scalar("type_url", Typez::String))
            .with_field(Field::scalar("value", Typez::Bytes)),
        Message::new(PACKAGE, "Empty"),
        Message::new(PACKAGE, "FieldMask").with_field(Field::scalar("paths", Typez::String).repeated()),
        Message::new(PACKAGE, "Duration")
            .with_field(Field::scalar("seconds", Typez::Int64))
            .with_field(Field::scalar("nanos", Typez::Int32)),
        Message::new(PACKAGE, "Timestamp")
            .with_field(Field::scalar("seconds", Typez::Int64))
            .with_field(Field::scalar("nanos", Typez::Int32)),
        Message::new(PACKAGE, "ListValue").with_field(Field::message("values", VALUE).repeated()),
    ];

    let mut structure = Message::new(PACKAGE, "Struct");
    let mut entry = Message::nested(&structure, "FieldsEntry")
        .with_field(Field::scalar("key", Typez::String))
        .with_field(Field::message("value", VALUE));
    entry.is_map = true;
    structure.messages.push(entry.id.clone());
    let structure = structure.with_field(Field::message("fields", &entry.id).into_map());
    result.push(structure);
    result.push(entry);

    let mut value = Message::new(PACKAGE, "Value")
        .with_field(Field::enumeration("null_value", NULL_VALUE))
        .with_field(Field::scalar("number_value", Typez::Double))
        .with_field(Field::scalar("string_value", Typez::String))
        .with_field(Field::scalar("bool_value", Typez::Bool))
        .with_field(Field::message("struct_value", STRUCT))
        .with_field(Field::message("list_value", LIST_VALUE));
    for field in &mut value.fields {
        field.is_oneof = true;
    }
    value.one_ofs.push(OneOf {
        name: "kind".to_string(),
        id: format!("{VALUE}.kind"),
        fields: value.fields.iter().map(|f| f.id.clone()).collect(),
        ..OneOf::default()
    });
    result.push(value);

    for (id, typez) in WRAPPERS {
        let name = id.rsplit('.').next().unwrap_or(id);
        result.push(Message::new(PACKAGE, name).with_field(Field::scalar("value", typez)));
    }
    result
}

/// Definitions of all well-known enums.
#[must_use]
pub fn enums() -> Vec<Enum> {
    vec![Enum::new(PACKAGE, "NullValue").with_value("NULL_VALUE", 0)]
}
