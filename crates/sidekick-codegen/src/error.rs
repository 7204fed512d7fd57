//! Typed error enum for the `sidekick-codegen` library API.
//!
//! Model construction errors from `sidekick-api` are wrapped unchanged. The
//! CLI (`main.rs`) converts everything to `anyhow::Error` at the binary
//! boundary.

use std::path::PathBuf;

/// Errors produced while annotating, rendering or writing a library.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Parsing, cross-referencing, validation or a transform failed.
    #[error(transparent)]
    Api(#[from] sidekick_api::Error),

    /// A codec requires an option the configuration does not set.
    #[error("the {codec} codec requires the `{key}` option")]
    MissingOption {
        /// Codec name (`rust`, `dart`).
        codec: String,
        /// The missing key.
        key: String,
    },

    /// An option is set to a value the codec cannot use.
    #[error("invalid value `{value}` for option `{key}`: {reason}")]
    InvalidOption {
        /// Option key.
        key: String,
        /// Offending value.
        value: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A referenced protobuf package has no import mapping.
    ///
    /// Add a `proto:<package>` option naming the import for it.
    #[error("no import mapping for protobuf package `{package}`; add a `proto:{package}` option")]
    MissingPackage {
        /// The protobuf package.
        package: String,
    },

    /// A referenced package has no dependency or version constraint entry.
    #[error("no dependency constraint for package `{package}`; add a `package:` option for it")]
    MissingDependencyConstraint {
        /// The package lacking a constraint.
        package: String,
    },

    /// No codec exists for the requested language.
    #[error("unknown language `{language}`")]
    UnknownLanguage {
        /// The requested language.
        language: String,
    },

    /// The language has no template set with this name.
    #[error("unknown template set `{name}` for language `{language}`")]
    UnknownTemplateSet {
        /// Target language.
        language: String,
        /// The requested template set.
        name: String,
    },

    /// A relative path between two locations cannot be computed.
    #[error("cannot compute a relative path from `{}` to `{}`", from.display(), to.display())]
    RelativePath {
        /// Starting directory.
        from: PathBuf,
        /// Target path.
        to: PathBuf,
    },

    /// Rendering was requested before any codec annotated the model.
    #[error("model `{package}` has not been annotated by a codec")]
    NotAnnotated {
        /// The model package.
        package: String,
    },

    /// A template source could not be loaded from its provider.
    #[error("cannot load template `{template}`: {reason}")]
    TemplateLoad {
        /// Template name.
        template: String,
        /// Provider message.
        reason: String,
    },

    /// A template failed to parse or render.
    #[error("template `{template}` failed: {source}")]
    Template {
        /// Template name.
        template: String,
        /// Engine error.
        #[source]
        source: tera::Error,
    },

    /// A generated file could not be written.
    #[error("cannot write `{}`: {source}", path.display())]
    Write {
        /// The file being written.
        path: PathBuf,
        /// I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A library configuration file is unreadable or malformed.
    #[error("invalid configuration `{}`: {reason}", path.display())]
    Config {
        /// Configuration file.
        path: PathBuf,
        /// Reader or deserializer message.
        reason: String,
    },

    /// The pipeline was cancelled at a stage boundary.
    #[error("cancelled before {stage}")]
    Cancelled {
        /// The stage that did not start.
        stage: String,
    },
}

impl Error {
    pub(crate) fn missing_option(codec: &str, key: &str) -> Self {
        Self::MissingOption {
            codec: codec.to_string(),
            key: key.to_string(),
        }
    }

    pub(crate) fn invalid_option(key: &str, value: &str, reason: impl ToString) -> Self {
        Self::InvalidOption {
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias used throughout the library's public API.
pub type Result<T> = std::result::Result<T, Error>;
