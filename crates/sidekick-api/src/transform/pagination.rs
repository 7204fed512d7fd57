//! AIP-4233 pagination.

use std::collections::BTreeMap;

use tracing::debug;

use crate::config::PaginationOverride;
use crate::error::{Error, Result};
use crate::model::{Message, Pagination, Typez};
use crate::state::Model;

const PAGE_SIZE_FIELDS: [&str; 2] = ["page_size", "max_results"];

/// Detect paginated methods and apply item-field overrides.
///
/// A unary method is paginated when its request has a string `page_token`
/// and an integer `page_size` (or `max_results`), and its response has a
/// string `next_page_token` plus a repeated or map field. The first such
/// field holds the items unless an override names another one. The
/// request's `page_token` field is marked [`crate::Field::pagination`].
///
/// # Errors
///
/// [`Error::PaginationOverride`] when an override names an unknown or
/// non-paginated method, or a response field that cannot hold items.
pub fn update_method_pagination(model: &mut Model, overrides: &[PaginationOverride]) -> Result<()> {
    let by_id: BTreeMap<&str, &str> = overrides.iter().map(|o| (o.id.as_str(), o.item_field.as_str())).collect();
    for o in overrides {
        if model.method(&o.id).is_none() {
            return Err(Error::PaginationOverride {
                id: o.id.clone(),
                reason: "no such method".to_string(),
            });
        }
    }

    let mut method_ids: Vec<String> = model.state().methods.keys().cloned().collect();
    method_ids.sort();
    for id in method_ids {
        let Some(method) = model.method(&id) else { continue };
        let detected = if method.client_side_streaming || method.server_side_streaming {
            None
        } else {
            match (model.input_type(method), model.output_type(method)) {
                (Some(request), Some(response)) => detect(request, response, by_id.get(id.as_str()).copied()),
                _ => None,
            }
        };
        let override_field = by_id.get(id.as_str());
        let pagination = match (detected, override_field) {
            (Some(Ok(pagination)), _) => pagination,
            (Some(Err(reason)), _) => return Err(Error::PaginationOverride { id, reason }),
            (None, Some(_)) => {
                return Err(Error::PaginationOverride {
                    id,
                    reason: "method is not paginated".to_string(),
                })
            }
            (None, None) => continue,
        };

        debug!(id = %id, item = %pagination.item_field, "pagination detected");
        let request_id = method.input_type_id.clone();
        if let Some(field) = model
            .message_mut(&request_id)
            .and_then(|m| m.fields.iter_mut().find(|f| f.name == pagination.page_token))
        {
            field.pagination = true;
        }
        if let Some(method) = model.method_mut(&id) {
            method.pagination = Some(pagination);
        }
    }
    Ok(())
}

/// `None` when the shape does not match; `Some(Err)` when it matches but the
/// override is unusable.
fn detect(
    request: &Message,
    response: &Message,
    item_override: Option<&str>,
) -> Option<std::result::Result<Pagination, String>> {
    let page_token = request.field("page_token").filter(|f| is_singular(f, Typez::String))?;
    let page_size = PAGE_SIZE_FIELDS
        .iter()
        .filter_map(|name| request.field(name))
        .find(|f| !f.repeated && is_integer(f.typez))?;
    let next_page_token = response.field("next_page_token").filter(|f| is_singular(f, Typez::String))?;

    let item = match item_override {
        Some(name) => match response.field(name) {
            Some(f) if f.repeated || f.map => f,
            Some(_) => return Some(Err(format!("`{name}` is not a repeated or map field"))),
            None => return Some(Err(format!("`{}` has no field `{name}`", response.id))),
        },
        None => response.fields.iter().find(|f| f.repeated || f.map)?,
    };
    Some(Ok(Pagination {
        page_token: page_token.name.clone(),
        page_size: page_size.name.clone(),
        next_page_token: next_page_token.name.clone(),
        item_field: item.name.clone(),
    }))
}

fn is_singular(field: &crate::model::Field, typez: Typez) -> bool {
    field.typez == typez && !field.repeated && !field.map
}

fn is_integer(typez: Typez) -> bool {
    matches!(
        typez,
        Typez::Int32 | Typez::Uint32 | Typez::Int64 | Typez::Uint64 | Typez::Sint32 | Typez::Sint64
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cross_reference;
    use crate::model::{Api, Field, Method, Service};

    const PKG: &str = "test.v1";

    fn model(response: Message) -> Model {
        let mut api = Api::new("test", PKG);
        let request = Message::new(PKG, "ListSecretsRequest")
            .with_field(Field::scalar("parent", Typez::String))
            .with_field(Field::scalar("page_size", Typez::Int32))
            .with_field(Field::scalar("page_token", Typez::String));
        let secret = Message::new(PKG, "Secret").with_field(Field::scalar("name", Typez::String));
        let mut service = Service::new(PKG, "SecretManager");
        let list = Method::new(&service, "ListSecrets", &request.id, &response.id);
        service.methods.push(list.id.clone());
        for message in [request, response, secret] {
            api.messages.push(message.id.clone());
            api.add_message(message);
        }
        api.services.push(service.id.clone());
        api.add_service(service);
        api.add_method(list);
        cross_reference(api).unwrap()
    }

    fn list_response() -> Message {
        Message::new(PKG, "ListSecretsResponse")
            .with_field(Field::scalar("total_size", Typez::Int32))
            .with_field(Field::message("secrets", ".test.v1.Secret").repeated())
            .with_field(Field::scalar("unreachable", Typez::String).repeated())
            .with_field(Field::scalar("next_page_token", Typez::String))
    }

    const LIST: &str = ".test.v1.SecretManager.ListSecrets";

    #[test]
    fn detects_first_repeated_field() {
        let mut model = model(list_response());
        update_method_pagination(&mut model, &[]).unwrap();
        let pagination = model.method(LIST).unwrap().pagination.clone().unwrap();
        assert_eq!(
            pagination,
            Pagination {
                page_token: "page_token".to_string(),
                page_size: "page_size".to_string(),
                next_page_token: "next_page_token".to_string(),
                item_field: "secrets".to_string(),
            }
        );
        let request = model.message(".test.v1.ListSecretsRequest").unwrap();
        assert!(request.field("page_token").unwrap().pagination);
        assert!(!request.field("page_size").unwrap().pagination);
        assert!(!model.is_simple(model.method(LIST).unwrap()));
    }

    #[test]
    fn override_selects_item_field() {
        let mut model = model(list_response());
        let overrides = [PaginationOverride {
            id: LIST.to_string(),
            item_field: "unreachable".to_string(),
        }];
        update_method_pagination(&mut model, &overrides).unwrap();
        assert_eq!(model.method(LIST).unwrap().pagination.as_ref().unwrap().item_field, "unreachable");
    }

    #[test]
    fn bad_overrides_fail() {
        let mut model = model(list_response());
        let overrides = [PaginationOverride {
            id: LIST.to_string(),
            item_field: "total_size".to_string(),
        }];
        assert!(matches!(
            update_method_pagination(&mut model, &overrides),
            Err(Error::PaginationOverride { .. })
        ));
        let overrides = [PaginationOverride {
            id: ".test.v1.SecretManager.Missing".to_string(),
            item_field: "secrets".to_string(),
        }];
        assert!(update_method_pagination(&mut model, &overrides).is_err());
    }

    #[test]
    fn responses_without_next_page_token_are_not_paginated() {
        let response = Message::new(PKG, "ListSecretsResponse").with_field(Field::message("secrets", ".test.v1.Secret").repeated());
        let mut model = model(response);
        update_method_pagination(&mut model, &[]).unwrap();
        assert!(model.method(LIST).unwrap().pagination.is_none());
        let overrides = [PaginationOverride {
            id: LIST.to_string(),
            item_field: "secrets".to_string(),
        }];
        let err = update_method_pagination(&mut model, &overrides).unwrap_err();
        assert!(matches!(err, Error::PaginationOverride { .. }));
    }
}
