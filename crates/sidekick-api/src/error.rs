//! Typed error enum for model construction and transformation.
//!
//! Every stage returns on the first error. Variants carry the offending
//! element ID or file path so a failure can be located without re-running.

use std::path::PathBuf;

/// Errors produced while parsing, cross-referencing or transforming a model.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The specification source is missing, a directory, or malformed.
    ///
    /// All three cases share one kind: the caller cannot proceed either way.
    #[error("specification not found or invalid: {path}: {reason}")]
    Specification {
        /// The specification path as configured.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The service config file cannot be read or parsed.
    #[error("invalid service config {path}: {reason}")]
    ServiceConfig {
        /// The service config path.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// The service config file has no top-level `name`.
    #[error("service config {path} is missing the required `name` field")]
    ServiceConfigMissingName {
        /// The service config path.
        path: PathBuf,
    },

    /// Running `protoc` failed.
    #[error("protoc failed: {reason}")]
    Protoc {
        /// Process failure or stderr output.
        reason: String,
    },

    /// Two elements of the same kind share an ID.
    #[error("duplicate {kind} id {id}")]
    DuplicateId {
        /// Element kind (`message`, `enum`, `service`, `method`).
        kind: &'static str,
        /// The duplicated ID.
        id: String,
    },

    /// A reference does not resolve to any element of the model.
    #[error("{from} references {id}, which is not part of the model")]
    UnresolvedReference {
        /// ID of the referencing element.
        from: String,
        /// The unresolved target ID.
        id: String,
    },

    /// An element of the API lives outside the API package.
    #[error("{id} belongs to package {package}, expected {expected}")]
    PackageMismatch {
        /// The offending element.
        id: String,
        /// Its package.
        package: String,
        /// The API package.
        expected: String,
    },

    /// Both an include list and a skip list were configured.
    #[error("included-ids and skipped-ids are mutually exclusive")]
    ConflictingFilters,

    /// An override addresses an element that does not exist.
    #[error("cannot find element {id}")]
    UnknownElement {
        /// The requested ID.
        id: String,
    },

    /// A documentation override's `match` text is absent from the element documentation.
    #[error("documentation of {id} does not contain {text:?}")]
    DocumentationMismatch {
        /// The element ID.
        id: String,
        /// The text that was expected.
        text: String,
    },

    /// A pagination override cannot be applied.
    #[error("invalid pagination override for {id}: {reason}")]
    PaginationOverride {
        /// The method ID.
        id: String,
        /// Why the override is invalid.
        reason: String,
    },

    /// A path template does not follow the `google.api.http` template syntax.
    #[error("invalid path template {template:?}: {reason}")]
    InvalidPathTemplate {
        /// The template text.
        template: String,
        /// What is wrong with it.
        reason: String,
    },

    /// An annotation pass wrote the same codec slot twice.
    #[error("codec annotation for {id} was already set")]
    CodecAlreadySet {
        /// The element ID.
        id: String,
    },

    /// A codec annotation could not be converted to a template value.
    #[error("cannot store codec annotation for {id}: {reason}")]
    Codec {
        /// The element ID.
        id: String,
        /// Serialization failure.
        reason: String,
    },
}

/// Convenience alias used throughout the crate's public API.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn specification(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Specification {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn unresolved(from: &str, id: &str) -> Self {
        Self::UnresolvedReference {
            from: from.to_string(),
            id: id.to_string(),
        }
    }
}
