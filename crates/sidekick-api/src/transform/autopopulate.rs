//! AIP-4235 request ID auto-population.

use tracing::debug;

use crate::model::{FieldFormat, Typez};
use crate::service_config::ServiceConfig;
use crate::state::Model;

/// Mark request fields the client fills with a fresh UUID4.
///
/// A field qualifies when the service config lists it for the method, it is
/// a singular string with the UUID4 format, and it is not `REQUIRED`.
pub fn auto_populate(model: &mut Model, service_config: &ServiceConfig) {
    let mut targets: Vec<(String, String)> = Vec::new();
    for method in model.state().methods.values() {
        for name in service_config.auto_populated_for(&method.id) {
            targets.push((method.input_type_id.clone(), name.clone()));
        }
    }
    for (request_id, name) in targets {
        let Some(field) = model
            .message_mut(&request_id)
            .and_then(|m| m.fields.iter_mut().find(|f| f.name == name))
        else {
            continue;
        };
        if field.typez == Typez::String
            && !field.repeated
            && field.format == Some(FieldFormat::Uuid4)
            && !field.is_required()
        {
            debug!(id = %field.id, "auto-populated field");
            field.auto_populated = true;
        }
    }
}
