//! The serializable template context.
//!
//! Templates see local elements only, with nested messages under their
//! parent and map entries left out. Every node carries its `codec`
//! annotation.

use serde::Serialize;
use sidekick_api::{CodecSlot, Enum, Field, Message, Method, Model, OneOf, Service};

/// Root of the template context.
#[derive(Debug, Serialize)]
pub struct ModelView<'a> {
    /// Short API name.
    pub name: &'a str,
    /// Human readable title.
    pub title: &'a str,
    /// API summary.
    pub description: &'a str,
    /// Protobuf package.
    pub package_name: &'a str,
    /// Model-wide annotation.
    pub codec: &'a CodecSlot,
    /// Top-level messages, nested ones inside.
    pub messages: Vec<MessageView<'a>>,
    /// Top-level enums.
    pub enums: Vec<&'a Enum>,
    /// Every message except map entries, parents first.
    pub all_messages: Vec<MessageView<'a>>,
    /// Every enum, top-level first.
    pub all_enums: Vec<&'a Enum>,
    /// Services with their methods.
    pub services: Vec<ServiceView<'a>>,
}

/// A message and its nested types.
#[derive(Debug, Serialize)]
pub struct MessageView<'a> {
    /// Unqualified name.
    pub name: &'a str,
    /// Fully qualified ID.
    pub id: &'a str,
    /// Fields in declaration order.
    pub fields: &'a [Field],
    /// Oneof groups.
    pub one_ofs: &'a [OneOf],
    /// Deprecated in the source.
    pub deprecated: bool,
    /// Message annotation.
    pub codec: &'a CodecSlot,
    /// Nested messages, map entries excluded.
    pub messages: Vec<MessageView<'a>>,
    /// Nested enums.
    pub enums: Vec<&'a Enum>,
}

/// A service and its methods.
#[derive(Debug, Serialize)]
pub struct ServiceView<'a> {
    /// Unqualified name.
    pub name: &'a str,
    /// Fully qualified ID.
    pub id: &'a str,
    /// Deprecated in the source.
    pub deprecated: bool,
    /// Service annotation.
    pub codec: &'a CodecSlot,
    /// Methods in declaration order.
    pub methods: Vec<&'a Method>,
}

impl<'a> ModelView<'a> {
    /// Build the context for `model`.
    #[must_use]
    pub fn new(model: &'a Model) -> Self {
        Self {
            name: &model.name,
            title: &model.title,
            description: &model.description,
            package_name: &model.package_name,
            codec: &model.codec,
            messages: model
                .messages()
                .filter(|m| !m.is_map)
                .map(|m| MessageView::new(model, m))
                .collect(),
            enums: model.enums().collect(),
            all_messages: model
                .all_messages()
                .into_iter()
                .filter(|m| !m.is_map)
                .map(|m| MessageView::flat(model, m))
                .collect(),
            all_enums: model.all_enums(),
            services: model.services().map(|s| ServiceView::new(model, s)).collect(),
        }
    }
}

impl<'a> MessageView<'a> {
    fn new(model: &'a Model, message: &'a Message) -> Self {
        Self {
            messages: model
                .nested_messages(message)
                .filter(|m| !m.is_map)
                .map(|m| Self::new(model, m))
                .collect(),
            ..Self::flat(model, message)
        }
    }

    /// The message without nested messages; enums are kept.
    fn flat(model: &'a Model, message: &'a Message) -> Self {
        Self {
            name: &message.name,
            id: &message.id,
            fields: &message.fields,
            one_ofs: &message.one_ofs,
            deprecated: message.deprecated,
            codec: &message.codec,
            messages: Vec::new(),
            enums: model.nested_enums(message).collect(),
        }
    }
}

impl<'a> ServiceView<'a> {
    fn new(model: &'a Model, service: &'a Service) -> Self {
        Self {
            name: &service.name,
            id: &service.id,
            deprecated: service.deprecated,
            codec: &service.codec,
            methods: model.methods_of(service).collect(),
        }
    }
}
