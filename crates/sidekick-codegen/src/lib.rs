#![allow(clippy::doc_markdown)] // README names "OpenAPI" and "Dart" as written
#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! ## API Reference

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod codec;
pub mod config;
mod error;
pub mod pipeline;
pub mod render;

pub use codec::{annotate_model, CodecOptions, Language};
pub use config::{GeneralConfig, LibraryConfig};
pub use error::{Error, Result};
pub use pipeline::{build_model, generate, CancellationToken};
pub use render::{
    generate_from_model, template_set, DirectoryTemplates, EmbeddedTemplates, RenderedFile, TemplateProvider,
    TemplateSet,
};
