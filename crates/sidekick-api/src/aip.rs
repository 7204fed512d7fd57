//! AIP standard method classification.
//!
//! These are exact shape matches over a resolved model: method name prefix,
//! request message name, resource annotations, and the absence of
//! pagination, streaming and LRO markers.

use serde::Serialize;

use crate::model::Method;
use crate::state::Model;

/// An AIP-131 `Get{Resource}` method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AipStandardGetInfo {
    /// Request field holding the resource name.
    pub resource_name_request_field: String,
}

/// An AIP-135 `Delete{Resource}` method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AipStandardDeleteInfo {
    /// Request field holding the resource name.
    pub resource_name_request_field: String,
}

impl Model {
    /// A method is simple when it is not paginated, not streaming, and not
    /// a long-running operation of either style.
    #[must_use]
    pub fn is_simple(&self, method: &Method) -> bool {
        method.pagination.is_none()
            && !method.client_side_streaming
            && !method.server_side_streaming
            && method.operation_info.is_none()
            && method.discovery_lro.is_none()
    }

    /// Whether `method` is a standard Get or Delete.
    #[must_use]
    pub fn is_aip_standard(&self, method: &Method) -> bool {
        self.aip_standard_get_info(method).is_some() || self.aip_standard_delete_info(method).is_some()
    }

    /// Match `Get{X}(Get{X}Request) -> Resource` where the request has a
    /// field referencing the response's resource type.
    #[must_use]
    pub fn aip_standard_get_info(&self, method: &Method) -> Option<AipStandardGetInfo> {
        let singular = method.name.strip_prefix("Get").filter(|s| !s.is_empty())?;
        if !self.is_simple(method) {
            return None;
        }
        let input = self.input_type(method)?;
        if input.name != format!("Get{singular}Request") {
            return None;
        }
        let resource = self.output_type(method)?.resource.as_ref()?;
        let field = input.fields.iter().find(|f| {
            f.resource_reference
                .as_ref()
                .is_some_and(|r| r.type_ == resource.type_)
        })?;
        Some(AipStandardGetInfo {
            resource_name_request_field: field.name.clone(),
        })
    }

    /// Match `Delete{X}(Delete{X}Request)` whose request has a `name`
    /// field with a resource reference.
    #[must_use]
    pub fn aip_standard_delete_info(&self, method: &Method) -> Option<AipStandardDeleteInfo> {
        let singular = method.name.strip_prefix("Delete").filter(|s| !s.is_empty())?;
        if !self.is_simple(method) {
            return None;
        }
        let input = self.input_type(method)?;
        if input.name != format!("Delete{singular}Request") {
            return None;
        }
        let field = input.field("name").filter(|f| f.resource_reference.is_some())?;
        Some(AipStandardDeleteInfo {
            resource_name_request_field: field.name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{Api, DiscoveryLro, Field, Message, Pagination, Service, Typez};
    use crate::resource::Resource;
    use crate::{cross_reference, wkt};

    const PKG: &str = "test.v1";
    const SECRET: &str = "test.googleapis.com/Secret";

    fn model_with(method: impl FnOnce(&Service) -> Method) -> (Model, String) {
        let mut api = Api::new("test", PKG);
        let messages = vec![
            Message::new(PKG, "Secret").with_resource(Resource::new(SECRET)),
            Message::new(PKG, "GetSecretRequest")
                .with_field(Field::scalar("name", Typez::String).with_resource_reference(SECRET)),
            Message::new(PKG, "DeleteSecretRequest")
                .with_field(Field::scalar("name", Typez::String).with_resource_reference(SECRET)),
            Message::new(PKG, "GetOtherRequest").with_field(Field::scalar("name", Typez::String)),
        ];
        for message in messages {
            api.messages.push(message.id.clone());
            api.add_message(message);
        }
        let mut service = Service::new(PKG, "Secrets");
        let method = method(&service);
        let id = method.id.clone();
        service.methods.push(id.clone());
        api.services.push(service.id.clone());
        api.add_service(service);
        api.add_method(method);
        (cross_reference(api).unwrap(), id)
    }

    #[test]
    fn standard_get() {
        let (model, id) = model_with(|s| Method::new(s, "GetSecret", ".test.v1.GetSecretRequest", ".test.v1.Secret"));
        let method = model.method(&id).unwrap();
        assert!(model.is_simple(method));
        assert_eq!(
            model.aip_standard_get_info(method),
            Some(AipStandardGetInfo {
                resource_name_request_field: "name".to_string()
            })
        );
        assert!(model.is_aip_standard(method));
        assert!(model.aip_standard_delete_info(method).is_none());
    }

    #[test]
    fn get_requires_matching_request_name_and_reference() {
        let (model, id) = model_with(|s| Method::new(s, "GetSecret", ".test.v1.GetOtherRequest", ".test.v1.Secret"));
        assert!(model.aip_standard_get_info(model.method(&id).unwrap()).is_none());

        let (model, id) = model_with(|s| Method::new(s, "GetSecret", ".test.v1.GetSecretRequest", wkt::EMPTY));
        assert!(model.aip_standard_get_info(model.method(&id).unwrap()).is_none());
    }

    #[test]
    fn standard_delete() {
        let (model, id) = model_with(|s| Method::new(s, "DeleteSecret", ".test.v1.DeleteSecretRequest", wkt::EMPTY));
        let method = model.method(&id).unwrap();
        assert_eq!(
            model.aip_standard_delete_info(method).map(|i| i.resource_name_request_field),
            Some("name".to_string())
        );
    }

    #[test]
    fn markers_disqualify() {
        let (model, id) = model_with(|s| {
            let mut m = Method::new(s, "GetSecret", ".test.v1.GetSecretRequest", ".test.v1.Secret");
            m.server_side_streaming = true;
            m
        });
        let method = model.method(&id).unwrap();
        assert!(!model.is_simple(method));
        assert!(!model.is_aip_standard(method));

        let (model, id) = model_with(|s| {
            let mut m = Method::new(s, "DeleteSecret", ".test.v1.DeleteSecretRequest", wkt::EMPTY);
            m.discovery_lro = Some(DiscoveryLro::default());
            m
        });
        assert!(model.aip_standard_delete_info(model.method(&id).unwrap()).is_none());

        let (model, id) = model_with(|s| {
            let mut m = Method::new(s, "GetSecret", ".test.v1.GetSecretRequest", ".test.v1.Secret");
            m.pagination = Some(Pagination::default());
            m
        });
        assert!(!model.is_simple(model.method(&id).unwrap()));
    }
}
