//! Cross-referencing: turn a parsed [`Api`] into a resolved [`Model`].

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Api, Typez};
use crate::state::{Model, State};
use crate::wkt;

fn insert_unique<T>(map: &mut HashMap<String, T>, kind: &'static str, id: String, value: T) -> Result<()> {
    if map.contains_key(&id) {
        return Err(Error::DuplicateId { kind, id });
    }
    map.insert(id, value);
    Ok(())
}

/// Resolve every ID reference of `api`.
///
/// Pass 1 registers every staged element in the [`State`] index (plus any
/// well-known type the input did not declare) and rejects duplicate IDs.
/// Pass 2 checks field types, parents, nested lists, method input and
/// output types, LRO types and service method lists, in staging order, and
/// derives [`crate::Method::returns_empty`].
///
/// # Errors
///
/// [`Error::DuplicateId`] or [`Error::UnresolvedReference`].
pub fn cross_reference(mut api: Api) -> Result<Model> {
    let elements = std::mem::take(&mut api.elements);
    let mut state = State::default();

    let message_ids: Vec<String> = elements.messages.iter().map(|m| m.id.clone()).collect();
    let enum_ids: Vec<String> = elements.enums.iter().map(|e| e.id.clone()).collect();
    let service_ids: Vec<String> = elements.services.iter().map(|s| s.id.clone()).collect();
    let method_ids: Vec<String> = elements.methods.iter().map(|m| m.id.clone()).collect();

    for message in elements.messages {
        insert_unique(&mut state.messages, "message", message.id.clone(), message)?;
    }
    for enum_ in elements.enums {
        insert_unique(&mut state.enums, "enum", enum_.id.clone(), enum_)?;
    }
    for service in elements.services {
        insert_unique(&mut state.services, "service", service.id.clone(), service)?;
    }
    for method in elements.methods {
        insert_unique(&mut state.methods, "method", method.id.clone(), method)?;
    }
    for message in wkt::messages() {
        state.messages.entry(message.id.clone()).or_insert(message);
    }
    for enum_ in wkt::enums() {
        state.enums.entry(enum_.id.clone()).or_insert(enum_);
    }

    for id in &message_ids {
        let Some(message) = state.messages.get(id) else { continue };
        for field in &message.fields {
            let found = match field.typez {
                Typez::Message | Typez::Group => state.messages.contains_key(&field.typez_id),
                Typez::Enum => state.enums.contains_key(&field.typez_id),
                _ => true,
            };
            if !found {
                return Err(Error::unresolved(&field.id, &field.typez_id));
            }
        }
        if let Some(parent) = &message.parent_id {
            if !state.messages.contains_key(parent) {
                return Err(Error::unresolved(id, parent));
            }
        }
        for nested in &message.messages {
            if !state.messages.contains_key(nested) {
                return Err(Error::unresolved(id, nested));
            }
        }
        for nested in &message.enums {
            if !state.enums.contains_key(nested) {
                return Err(Error::unresolved(id, nested));
            }
        }
    }
    for id in &enum_ids {
        if let Some(parent) = state.enums.get(id).and_then(|e| e.parent_id.as_ref()) {
            if !state.messages.contains_key(parent) {
                return Err(Error::unresolved(id, parent));
            }
        }
    }
    for id in &service_ids {
        let Some(service) = state.services.get(id) else { continue };
        if let Some(missing) = service.methods.iter().find(|m| !state.methods.contains_key(*m)) {
            return Err(Error::unresolved(id, missing));
        }
    }

    let messages = &state.messages;
    for id in &method_ids {
        let Some(method) = state.methods.get_mut(id) else { continue };
        let mut targets = vec![&method.input_type_id, &method.output_type_id];
        if let Some(info) = &method.operation_info {
            targets.push(&info.response_type_id);
            targets.push(&info.metadata_type_id);
        }
        if let Some(missing) = targets.into_iter().find(|t| !messages.contains_key(*t)) {
            return Err(Error::unresolved(id, missing));
        }
        if !method.source_service_id.is_empty() && !state.services.contains_key(&method.source_service_id) {
            return Err(Error::unresolved(id, &method.source_service_id));
        }
        method.returns_empty = method.output_type_id == wkt::EMPTY;
    }

    for (kind, list) in [("message", &api.messages), ("enum", &api.enums), ("service", &api.services)] {
        for id in list {
            if !state.contains(id) {
                debug!(kind, id = %id, "api element missing from index");
                return Err(Error::unresolved(&api.package_name, id));
            }
        }
    }

    debug!(
        messages = state.messages.len(),
        enums = state.enums.len(),
        services = state.services.len(),
        methods = state.methods.len(),
        "cross-referenced model"
    );
    Ok(Model { api, state })
}

/// Mark every message field whose type transitively contains the message
/// declaring the field.
///
/// Map fields count through their entry message, so `map<string, Self>` is
/// recursive too.
pub fn label_recursive_fields(model: &mut Model) {
    let mut labels: Vec<(String, usize)> = Vec::new();
    for message in model.state.messages.values() {
        for (index, field) in message.fields.iter().enumerate() {
            if field.typez.is_message() && reaches(&model.state, &field.typez_id, &message.id) {
                labels.push((message.id.clone(), index));
            }
        }
    }
    for (id, index) in labels {
        if let Some(field) = model.message_mut(&id).and_then(|m| m.fields.get_mut(index)) {
            field.recursive = true;
        }
    }
}

fn reaches(state: &State, from: &str, target: &str) -> bool {
    let mut visited: HashSet<&str> = HashSet::new();
    let mut stack = vec![from];
    while let Some(id) = stack.pop() {
        if id == target {
            return true;
        }
        if !visited.insert(id) {
            continue;
        }
        if let Some(message) = state.message(id) {
            stack.extend(
                message
                    .fields
                    .iter()
                    .filter(|f| f.typez.is_message())
                    .map(|f| f.typez_id.as_str()),
            );
        }
    }
    false
}
