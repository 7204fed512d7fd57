//! Include and skip lists.

use std::collections::BTreeSet;

use tracing::{debug, info};

use crate::config::ModelFilter;
use crate::error::{Error, Result};
use crate::state::Model;

/// Prune `model` according to `filter`.
///
/// With an include list every element outside the dependency closure of the
/// listed IDs is deleted. With a skip list exactly the listed elements are
/// deleted, together with what they own (nested messages and enums, the
/// methods of a service). Both lists at once, or an unknown ID, fail before
/// anything is touched.
///
/// # Errors
///
/// [`Error::ConflictingFilters`] or [`Error::UnknownElement`].
pub fn skip_model_elements(model: &mut Model, filter: &ModelFilter) -> Result<()> {
    if !filter.included_ids.is_empty() && !filter.skipped_ids.is_empty() {
        return Err(Error::ConflictingFilters);
    }
    let listed = if filter.included_ids.is_empty() {
        &filter.skipped_ids
    } else {
        &filter.included_ids
    };
    if let Some(unknown) = listed.iter().find(|id| !model.state().contains(id)) {
        return Err(Error::UnknownElement { id: unknown.clone() });
    }

    if !filter.included_ids.is_empty() {
        let keep = find_dependencies(model, &filter.included_ids);
        info!(included = filter.included_ids.len(), closure = keep.len(), "pruning to include list");
        retain(model, |id| keep.contains(id));
    } else if !filter.skipped_ids.is_empty() {
        let removed = owned_closure(model, &filter.skipped_ids);
        info!(skipped = filter.skipped_ids.len(), removed = removed.len(), "removing skip list");
        retain(model, |id| !removed.contains(id));
    }
    Ok(())
}

/// Every element the listed elements need to survive pruning.
///
/// A listed service brings all of its methods. A method brings its service,
/// request, response and LRO types. A message brings its parent and the
/// types of its fields. An enum brings its parent.
#[must_use]
pub fn find_dependencies(model: &Model, ids: &[String]) -> BTreeSet<String> {
    let mut closure = BTreeSet::new();
    let mut pending: Vec<String> = ids.to_vec();
    for id in ids {
        if let Some(service) = model.service(id) {
            pending.extend(service.methods.iter().cloned());
        }
    }

    while let Some(id) = pending.pop() {
        if closure.contains(&id) {
            continue;
        }
        if let Some(message) = model.message(&id) {
            pending.extend(message.parent_id.iter().cloned());
            pending.extend(
                message
                    .fields
                    .iter()
                    .filter(|f| !f.typez_id.is_empty())
                    .map(|f| f.typez_id.clone()),
            );
        } else if let Some(enum_) = model.enum_(&id) {
            pending.extend(enum_.parent_id.iter().cloned());
        } else if let Some(method) = model.method(&id) {
            pending.push(method.source_service_id.clone());
            pending.push(method.input_type_id.clone());
            pending.push(method.output_type_id.clone());
            if let Some(info) = &method.operation_info {
                pending.push(info.response_type_id.clone());
                pending.push(info.metadata_type_id.clone());
            }
        } else if !model.state().contains(&id) {
            continue;
        }
        closure.insert(id);
    }
    closure
}

/// The listed IDs plus everything they own.
fn owned_closure(model: &Model, ids: &[String]) -> BTreeSet<String> {
    let mut closure = BTreeSet::new();
    let mut pending: Vec<String> = ids.to_vec();
    while let Some(id) = pending.pop() {
        if !closure.insert(id.clone()) {
            continue;
        }
        if let Some(message) = model.message(&id) {
            pending.extend(message.messages.iter().cloned());
            pending.extend(message.enums.iter().cloned());
        } else if let Some(service) = model.service(&id) {
            pending.extend(service.methods.iter().cloned());
        }
    }
    closure
}

fn retain(model: &mut Model, keep: impl Fn(&str) -> bool) {
    let before = model.state().len();
    model.state_mut().retain(&keep);

    let api = model.api_mut();
    api.messages.retain(|id| keep(id));
    api.enums.retain(|id| keep(id));
    api.services.retain(|id| keep(id));

    let state = model.state_mut();
    for message in state.messages.values_mut() {
        message.messages.retain(|id| keep(id));
        message.enums.retain(|id| keep(id));
    }
    for service in state.services.values_mut() {
        service.methods.retain(|id| keep(id));
    }
    debug!(removed = before - model.state().len(), "pruned model");
}
