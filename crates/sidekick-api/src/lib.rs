#![allow(clippy::doc_markdown)] // "OpenAPI" and "protoc" appear in the README as written
#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod aip;
pub mod casing;
pub mod config;
mod error;
pub mod model;
pub mod parser;
pub mod path;
pub mod resource;
pub mod routing;
pub mod service_config;
mod state;
pub mod transform;
mod validate;
pub mod wkt;
mod xref;

pub use aip::{AipStandardDeleteInfo, AipStandardGetInfo};
pub use config::{DiscoveryConfig, DocumentationOverride, ModelFilter, PaginationOverride, Poller};
pub use error::{Error, Result};
pub use model::{
    Api, CodecSlot, DiscoveryLro, Enum, EnumValue, Field, FieldBehavior, FieldFormat, Message, Method, OneOf,
    OperationInfo, Pagination, PathBinding, PathInfo, ResourceReference, Service, Typez,
};
pub use parser::{parse, ParserConfig, SpecificationFormat};
pub use path::{PathSegment, PathTemplate, PathVariable};
pub use resource::Resource;
pub use routing::{routing_combos, routing_combos_ordered, KeyOrder, RoutingCombo, RoutingInfo};
pub use service_config::{ServiceConfig, ServiceConfigOverrides};
pub use state::{Model, State};
pub use validate::validate;
pub use xref::{cross_reference, label_recursive_fields};
