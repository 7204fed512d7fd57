//! Protobuf descriptor types for the sidekick generator.
//!
//! This crate provides custom [`prost::Message`] types that preserve the
//! `google.api.*` and `google.longrunning.*` extensions which standard
//! `prost_types` drops during decoding.
//!
//! `sidekick-api` consumes these types in its protobuf parser. You should not
//! need to depend on this crate directly.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod descriptor;
