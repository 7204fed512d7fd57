//! The resolved model and its ID index.

use std::collections::HashMap;
use std::ops::Deref;

use serde::Serialize;

use crate::model::{Api, Enum, Field, Message, Method, Service, Typez};

/// Every element of a resolved model, keyed by ID.
///
/// This includes elements of dependencies (well-known types, imported
/// files) that are not part of [`Api`]'s ordered lists.
#[derive(Debug, Default)]
pub struct State {
    pub(crate) messages: HashMap<String, Message>,
    pub(crate) enums: HashMap<String, Enum>,
    pub(crate) services: HashMap<String, Service>,
    pub(crate) methods: HashMap<String, Method>,
}

impl State {
    /// Look up a message.
    #[must_use]
    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.get(id)
    }

    /// Look up an enum.
    #[must_use]
    pub fn enum_(&self, id: &str) -> Option<&Enum> {
        self.enums.get(id)
    }

    /// Look up a service.
    #[must_use]
    pub fn service(&self, id: &str) -> Option<&Service> {
        self.services.get(id)
    }

    /// Look up a method.
    #[must_use]
    pub fn method(&self, id: &str) -> Option<&Method> {
        self.methods.get(id)
    }

    /// Whether any element kind has `id`.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.messages.contains_key(id)
            || self.enums.contains_key(id)
            || self.services.contains_key(id)
            || self.methods.contains_key(id)
    }

    /// Number of indexed elements of all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len() + self.enums.len() + self.services.len() + self.methods.len()
    }

    /// Whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn retain(&mut self, keep: impl Fn(&str) -> bool) {
        self.messages.retain(|id, _| keep(id));
        self.enums.retain(|id, _| keep(id));
        self.services.retain(|id, _| keep(id));
        self.methods.retain(|id, _| keep(id));
    }
}

/// A cross-referenced API model.
///
/// Only [`crate::cross_reference`] creates a `Model`, so holding one means
/// every ID reference resolved when it was built. Dereferences to the
/// underlying [`Api`].
#[derive(Debug)]
pub struct Model {
    pub(crate) api: Api,
    pub(crate) state: State,
}

impl Deref for Model {
    type Target = Api;

    fn deref(&self) -> &Api {
        &self.api
    }
}

impl Model {
    /// The ID index.
    #[must_use]
    pub fn state(&self) -> &State {
        &self.state
    }

    /// Look up a message.
    #[must_use]
    pub fn message(&self, id: &str) -> Option<&Message> {
        self.state.message(id)
    }

    /// Look up an enum.
    #[must_use]
    pub fn enum_(&self, id: &str) -> Option<&Enum> {
        self.state.enum_(id)
    }

    /// Look up a service.
    #[must_use]
    pub fn service(&self, id: &str) -> Option<&Service> {
        self.state.service(id)
    }

    /// Look up a method.
    #[must_use]
    pub fn method(&self, id: &str) -> Option<&Method> {
        self.state.method(id)
    }

    /// Top-level messages of the API, in order.
    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.api.messages.iter().filter_map(|id| self.message(id))
    }

    /// Top-level enums of the API, in order.
    pub fn enums(&self) -> impl Iterator<Item = &Enum> {
        self.api.enums.iter().filter_map(|id| self.enum_(id))
    }

    /// Services of the API, in order.
    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.api.services.iter().filter_map(|id| self.service(id))
    }

    /// Methods of `service`, in order.
    pub fn methods_of<'a>(&'a self, service: &'a Service) -> impl Iterator<Item = &'a Method> {
        service.methods.iter().filter_map(|id| self.method(id))
    }

    /// Messages nested in `message`, in order.
    pub fn nested_messages<'a>(&'a self, message: &'a Message) -> impl Iterator<Item = &'a Message> {
        message.messages.iter().filter_map(|id| self.message(id))
    }

    /// Enums nested in `message`, in order.
    pub fn nested_enums<'a>(&'a self, message: &'a Message) -> impl Iterator<Item = &'a Enum> {
        message.enums.iter().filter_map(|id| self.enum_(id))
    }

    /// Every message of the API, parents before their nested messages.
    #[must_use]
    pub fn all_messages(&self) -> Vec<&Message> {
        let mut result = Vec::new();
        let mut stack: Vec<&Message> = self.messages().collect();
        stack.reverse();
        while let Some(message) = stack.pop() {
            result.push(message);
            let mut nested: Vec<&Message> = self.nested_messages(message).collect();
            nested.reverse();
            stack.extend(nested);
        }
        result
    }

    /// Every enum of the API: top-level enums, then enums nested in
    /// [`Model::all_messages`] order.
    #[must_use]
    pub fn all_enums(&self) -> Vec<&Enum> {
        let mut result: Vec<&Enum> = self.enums().collect();
        for message in self.all_messages() {
            result.extend(self.nested_enums(message));
        }
        result
    }

    /// Every method of the API, grouped by service.
    #[must_use]
    pub fn all_methods(&self) -> Vec<&Method> {
        self.services().flat_map(|s| self.methods_of(s)).collect()
    }

    /// The message a message or map field refers to.
    #[must_use]
    pub fn field_message(&self, field: &Field) -> Option<&Message> {
        if field.typez.is_message() {
            self.message(&field.typez_id)
        } else {
            None
        }
    }

    /// The enum an enum field refers to.
    #[must_use]
    pub fn field_enum(&self, field: &Field) -> Option<&Enum> {
        if field.typez == Typez::Enum {
            self.enum_(&field.typez_id)
        } else {
            None
        }
    }

    /// The request message of `method`.
    #[must_use]
    pub fn input_type(&self, method: &Method) -> Option<&Message> {
        self.message(&method.input_type_id)
    }

    /// The response message of `method`.
    #[must_use]
    pub fn output_type(&self, method: &Method) -> Option<&Message> {
        self.message(&method.output_type_id)
    }

    pub(crate) fn api_mut(&mut self) -> &mut Api {
        &mut self.api
    }

    pub(crate) fn message_mut(&mut self, id: &str) -> Option<&mut Message> {
        self.state.messages.get_mut(id)
    }

    pub(crate) fn method_mut(&mut self, id: &str) -> Option<&mut Method> {
        self.state.methods.get_mut(id)
    }

    pub(crate) fn state_mut(&mut self) -> &mut State {
        &mut self.state
    }
}

#[derive(Serialize)]
struct ModelSummary<'a> {
    name: &'a str,
    title: &'a str,
    description: &'a str,
    package_name: &'a str,
    messages: Vec<&'a Message>,
    enums: Vec<&'a Enum>,
    services: Vec<ServiceSummary<'a>>,
}

#[derive(Serialize)]
struct ServiceSummary<'a> {
    #[serde(flatten)]
    service: &'a Service,
    method_details: Vec<&'a Method>,
}

/// Serializes the local elements in model order, for inspection.
impl Serialize for Model {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ModelSummary {
            name: &self.name,
            title: &self.title,
            description: &self.description,
            package_name: &self.package_name,
            messages: self.all_messages(),
            enums: self.all_enums(),
            services: self
                .services()
                .map(|service| ServiceSummary {
                    service,
                    method_details: self.methods_of(service).collect(),
                })
                .collect(),
        }
        .serialize(serializer)
    }
}
