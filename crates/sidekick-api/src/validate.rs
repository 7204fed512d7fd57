//! Structural validation of a resolved model.

use crate::error::{Error, Result};
use crate::model::Typez;
use crate::state::Model;

/// Check the package and reference invariants of `model`.
///
/// Every local message, enum and service must live in the API package (or
/// in the package of the first local element when the API has none), and
/// every field type, method type and LRO type must still be present.
///
/// # Errors
///
/// [`Error::PackageMismatch`] or [`Error::UnresolvedReference`].
pub fn validate(model: &Model) -> Result<()> {
    let messages = model.all_messages();
    let enums = model.all_enums();
    let services: Vec<_> = model.services().collect();

    let expected = if model.package_name.is_empty() {
        messages
            .first()
            .map(|m| m.package.as_str())
            .or_else(|| enums.first().map(|e| e.package.as_str()))
            .or_else(|| services.first().map(|s| s.package.as_str()))
            .unwrap_or_default()
    } else {
        model.package_name.as_str()
    };

    let packages = messages
        .iter()
        .map(|m| (&m.id, &m.package))
        .chain(enums.iter().map(|e| (&e.id, &e.package)))
        .chain(services.iter().map(|s| (&s.id, &s.package)));
    for (id, package) in packages {
        if package != expected {
            return Err(Error::PackageMismatch {
                id: id.clone(),
                package: package.clone(),
                expected: expected.to_string(),
            });
        }
    }

    for message in &messages {
        for field in &message.fields {
            let found = match field.typez {
                Typez::Message | Typez::Group => model.message(&field.typez_id).is_some(),
                Typez::Enum => model.enum_(&field.typez_id).is_some(),
                _ => true,
            };
            if !found {
                return Err(Error::unresolved(&field.id, &field.typez_id));
            }
        }
    }
    for service in &services {
        for id in &service.methods {
            let method = model.method(id).ok_or_else(|| Error::unresolved(&service.id, id))?;
            let mut targets = vec![&method.input_type_id, &method.output_type_id];
            if let Some(info) = &method.operation_info {
                targets.push(&info.response_type_id);
                targets.push(&info.metadata_type_id);
            }
            if let Some(missing) = targets.into_iter().find(|t| model.message(t).is_none()) {
                return Err(Error::unresolved(&method.id, missing));
            }
        }
    }
    Ok(())
}
