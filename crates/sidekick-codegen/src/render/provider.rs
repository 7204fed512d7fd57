//! Template sources.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Supplies template source text by name, e.g. `rust/crate/Cargo.toml.tera`.
pub trait TemplateProvider: Send + Sync {
    /// Load one template.
    ///
    /// # Errors
    ///
    /// [`Error::TemplateLoad`] when the provider has no such template or it
    /// cannot be read.
    fn load(&self, name: &str) -> Result<String>;
}

macro_rules! embedded {
    ($($name:literal),* $(,)?) => {
        &[$(($name, include_str!(concat!("../../templates/", $name)))),*]
    };
}

/// Every template shipped with the crate.
const EMBEDDED: &[(&str, &str)] = embedded![
    "rust/_license.tera",
    "rust/_macros.tera",
    "rust/crate/Cargo.toml.tera",
    "rust/crate/README.md.tera",
    "rust/crate/lib.rs.tera",
    "rust/crate/client.rs.tera",
    "rust/model.rs.tera",
    "rust/mod/mod.rs.tera",
    "dart/_license.tera",
    "dart/package/pubspec.yaml.tera",
    "dart/package/README.md.tera",
    "dart/package/library.dart.tera",
    "dart/package/client.dart.tera",
    "dart/package/json_helpers.dart.tera",
];

/// Templates compiled into the binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedTemplates;

impl EmbeddedTemplates {
    /// Names of all embedded templates.
    pub fn names() -> impl Iterator<Item = &'static str> {
        EMBEDDED.iter().map(|(name, _)| *name)
    }
}

impl TemplateProvider for EmbeddedTemplates {
    fn load(&self, name: &str) -> Result<String> {
        EMBEDDED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, source)| (*source).to_string())
            .ok_or_else(|| Error::TemplateLoad {
                template: name.to_string(),
                reason: "no embedded template with this name".to_string(),
            })
    }
}

/// Templates read from a directory, using the same relative names as the
/// embedded set.
#[derive(Clone, Debug)]
pub struct DirectoryTemplates {
    root: PathBuf,
}

impl DirectoryTemplates {
    /// Templates under `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The template directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl TemplateProvider for DirectoryTemplates {
    fn load(&self, name: &str) -> Result<String> {
        let path = self.root.join(name);
        std::fs::read_to_string(&path).map_err(|e| Error::TemplateLoad {
            template: name.to_string(),
            reason: format!("{}: {e}", path.display()),
        })
    }
}
