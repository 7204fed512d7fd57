//! Literal documentation overrides.

use tracing::debug;

use crate::config::DocumentationOverride;
use crate::error::{Error, Result};
use crate::state::Model;

/// Replace `match_` with `replace` in the documentation of each addressed
/// element.
///
/// Messages, enums, services and methods are addressed by their ID; fields,
/// oneofs and enum values by `{parent ID}.{name}`.
///
/// # Errors
///
/// [`Error::UnknownElement`] when no element has the ID and
/// [`Error::DocumentationMismatch`] when the text is not found.
pub fn patch_documentation(model: &mut Model, overrides: &[DocumentationOverride]) -> Result<()> {
    for o in overrides {
        let documentation = documentation_mut(model, &o.id).ok_or_else(|| Error::UnknownElement { id: o.id.clone() })?;
        if !documentation.contains(&o.match_) {
            return Err(Error::DocumentationMismatch {
                id: o.id.clone(),
                text: o.match_.clone(),
            });
        }
        *documentation = documentation.replace(&o.match_, &o.replace);
        debug!(id = %o.id, "patched documentation");
    }
    Ok(())
}

fn documentation_mut<'a>(model: &'a mut Model, id: &str) -> Option<&'a mut String> {
    let state = model.state_mut();
    if state.messages.contains_key(id) {
        return state.messages.get_mut(id).map(|m| &mut m.documentation);
    }
    if state.enums.contains_key(id) {
        return state.enums.get_mut(id).map(|e| &mut e.documentation);
    }
    if state.services.contains_key(id) {
        return state.services.get_mut(id).map(|s| &mut s.documentation);
    }
    if state.methods.contains_key(id) {
        return state.methods.get_mut(id).map(|m| &mut m.documentation);
    }

    let (parent, name) = id.rsplit_once('.')?;
    if let Some(message) = state.messages.get_mut(parent) {
        if let Some(index) = message.fields.iter().position(|f| f.name == name) {
            return Some(&mut message.fields[index].documentation);
        }
        return message
            .one_ofs
            .iter_mut()
            .find(|o| o.name == name)
            .map(|o| &mut o.documentation);
    }
    state
        .enums
        .get_mut(parent)?
        .values
        .iter_mut()
        .find(|v| v.name == name)
        .map(|v| &mut v.documentation)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::cross_reference;
    use crate::model::{Api, Enum, Field, Message, Typez};

    fn model() -> Model {
        let mut api = Api::new("test", "test.v1");
        let secret = Message::new("test.v1", "Secret")
            .with_documentation("A [Secret][google.cloud.test.v1.Secret] holds data.")
            .with_field(Field {
                documentation: "The name. See [Secret][].".to_string(),
                ..Field::scalar("name", Typez::String)
            });
        let mut color = Enum::new("test.v1", "Color").with_value("RED", 0);
        color.values[0].documentation = "Red means red.".to_string();
        api.messages.push(secret.id.clone());
        api.add_message(secret);
        api.enums.push(color.id.clone());
        api.add_enum(color);
        cross_reference(api).unwrap()
    }

    fn patch(id: &str, match_: &str, replace: &str) -> DocumentationOverride {
        DocumentationOverride {
            id: id.to_string(),
            match_: match_.to_string(),
            replace: replace.to_string(),
        }
    }

    #[test]
    fn patches_messages_fields_and_values() {
        let mut model = model();
        patch_documentation(
            &mut model,
            &[
                patch(".test.v1.Secret", "[Secret][google.cloud.test.v1.Secret]", "Secret"),
                patch(".test.v1.Secret.name", "[Secret][]", "`Secret`"),
                patch(".test.v1.Color.RED", "red.", "stop."),
            ],
        )
        .unwrap();
        let secret = model.message(".test.v1.Secret").unwrap();
        assert_eq!(secret.documentation, "A Secret holds data.");
        assert_eq!(secret.fields[0].documentation, "The name. See `Secret`.");
        assert_eq!(model.enum_(".test.v1.Color").unwrap().values[0].documentation, "Red means stop.");
    }

    #[test]
    fn unknown_element() {
        let mut model = model();
        let err = patch_documentation(&mut model, &[patch(".test.v1.Missing", "a", "b")]).unwrap_err();
        assert!(matches!(err, Error::UnknownElement { .. }));
    }

    #[test]
    fn missing_text() {
        let mut model = model();
        let err = patch_documentation(&mut model, &[patch(".test.v1.Secret", "absent", "b")]).unwrap_err();
        assert!(matches!(err, Error::DocumentationMismatch { .. }));
    }
}
