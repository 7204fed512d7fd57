//! Template rendering.
//!
//! A [`TemplateSet`] is a fixed list of `(template, output path)` pairs.
//! Output paths are themselves small templates rendered against the same
//! context, so a Dart library can be named after its package. Rendering
//! happens entirely in memory; files are written only after every template
//! succeeded.

use std::path::{Path, PathBuf};

use sidekick_api::Model;
use tera::{Context, Tera};
use tracing::{debug, info};

use crate::codec::Language;
use crate::error::{Error, Result};

mod provider;
mod view;

pub use provider::{DirectoryTemplates, EmbeddedTemplates, TemplateProvider};
pub use view::{MessageView, ModelView, ServiceView};

/// One generated file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Template name as known to the provider.
    pub template: &'static str,
    /// Output path relative to the output directory; may use template syntax.
    pub output: &'static str,
}

/// A named set of templates for one language.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemplateSet {
    /// Language of the generated code.
    pub language: Language,
    /// Set name, e.g. `crate`.
    pub name: &'static str,
    /// Templates other templates include.
    pub partials: &'static [&'static str],
    /// Files to generate.
    pub files: &'static [GeneratedFile],
}

const fn file(template: &'static str, output: &'static str) -> GeneratedFile {
    GeneratedFile { template, output }
}

const RUST_PARTIALS: &[&str] = &["rust/_license.tera", "rust/_macros.tera"];
const DART_PARTIALS: &[&str] = &["dart/_license.tera"];

const TEMPLATE_SETS: &[TemplateSet] = &[
    TemplateSet {
        language: Language::Rust,
        name: "crate",
        partials: RUST_PARTIALS,
        files: &[
            file("rust/crate/Cargo.toml.tera", "Cargo.toml"),
            file("rust/crate/README.md.tera", "README.md"),
            file("rust/crate/lib.rs.tera", "src/lib.rs"),
            file("rust/model.rs.tera", "src/model.rs"),
            file("rust/crate/client.rs.tera", "src/client.rs"),
        ],
    },
    TemplateSet {
        language: Language::Rust,
        name: "nosvc",
        partials: RUST_PARTIALS,
        files: &[
            file("rust/crate/Cargo.toml.tera", "Cargo.toml"),
            file("rust/crate/README.md.tera", "README.md"),
            file("rust/crate/lib.rs.tera", "src/lib.rs"),
            file("rust/model.rs.tera", "src/model.rs"),
        ],
    },
    TemplateSet {
        language: Language::Rust,
        name: "mod",
        partials: RUST_PARTIALS,
        files: &[
            file("rust/mod/mod.rs.tera", "mod.rs"),
            file("rust/model.rs.tera", "model.rs"),
        ],
    },
    TemplateSet {
        language: Language::Dart,
        name: "package",
        partials: DART_PARTIALS,
        files: &[
            file("dart/package/pubspec.yaml.tera", "pubspec.yaml"),
            file("dart/package/README.md.tera", "README.md"),
            file("dart/package/library.dart.tera", "lib/{{ codec.main_file_name }}.dart"),
            file("dart/package/client.dart.tera", "lib/src/client.dart"),
            file("dart/package/json_helpers.dart.tera", "lib/src/json_helpers.dart"),
        ],
    },
    TemplateSet {
        language: Language::Dart,
        name: "nosvc",
        partials: DART_PARTIALS,
        files: &[
            file("dart/package/pubspec.yaml.tera", "pubspec.yaml"),
            file("dart/package/README.md.tera", "README.md"),
            file("dart/package/library.dart.tera", "lib/{{ codec.main_file_name }}.dart"),
            file("dart/package/json_helpers.dart.tera", "lib/src/json_helpers.dart"),
        ],
    },
];

/// Select the template set for a library.
///
/// An explicit `name` replaces the default entirely. Otherwise the default
/// set for `language` is used, or `nosvc` when the model has no services.
///
/// # Errors
///
/// [`Error::UnknownTemplateSet`] if `language` has no set called `name`.
pub fn template_set(language: Language, name: Option<&str>, has_services: bool) -> Result<&'static TemplateSet> {
    let name = name.unwrap_or(match (language, has_services) {
        (_, false) => "nosvc",
        (Language::Rust, true) => "crate",
        (Language::Dart, true) => "package",
    });
    TEMPLATE_SETS
        .iter()
        .find(|set| set.language == language && set.name == name)
        .ok_or_else(|| Error::UnknownTemplateSet {
            language: language.to_string(),
            name: name.to_string(),
        })
}

/// A rendered file, not yet written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedFile {
    /// Path relative to the output directory.
    pub path: PathBuf,
    /// File contents.
    pub contents: String,
}

fn template_error(template: &str) -> impl FnOnce(tera::Error) -> Error + '_ {
    move |source| Error::Template {
        template: template.to_string(),
        source,
    }
}

/// Render every file of `set` against the annotated `model`.
///
/// # Errors
///
/// [`Error::NotAnnotated`] if no codec ran on `model`,
/// [`Error::TemplateLoad`] or [`Error::Template`] for template failures.
pub fn render(model: &Model, provider: &dyn TemplateProvider, set: &TemplateSet) -> Result<Vec<RenderedFile>> {
    if !model.codec.is_set() {
        return Err(Error::NotAnnotated {
            package: model.package_name.clone(),
        });
    }
    let mut tera = Tera::default();
    tera.autoescape_on(vec![]);
    for name in set.partials.iter().copied().chain(set.files.iter().map(|f| f.template)) {
        let source = provider.load(name)?;
        tera.add_raw_template(name, &source).map_err(template_error(name))?;
    }

    let context = Context::from_serialize(ModelView::new(model)).map_err(template_error("context"))?;
    set.files
        .iter()
        .map(|generated| {
            let path = Tera::one_off(generated.output, &context, false).map_err(template_error(generated.output))?;
            let contents = tera
                .render(generated.template, &context)
                .map_err(template_error(generated.template))?;
            debug!(template = generated.template, path = %path, bytes = contents.len(), "rendered");
            Ok(RenderedFile {
                path: PathBuf::from(path),
                contents,
            })
        })
        .collect()
}

/// Write rendered files below `outdir`, creating directories as needed.
///
/// # Errors
///
/// [`Error::Write`] naming the file that failed.
pub fn write_files(outdir: &Path, files: &[RenderedFile]) -> Result<Vec<PathBuf>> {
    files
        .iter()
        .map(|file| {
            let path = outdir.join(&file.path);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| Error::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            std::fs::write(&path, &file.contents).map_err(|source| Error::Write {
                path: path.clone(),
                source,
            })?;
            Ok(path)
        })
        .collect()
}

/// Render `set` for `model` and write the result below `outdir`.
///
/// Nothing is written unless every template rendered.
///
/// # Errors
///
/// See [`render`] and [`write_files`].
pub fn generate_from_model(
    outdir: &Path,
    model: &Model,
    provider: &dyn TemplateProvider,
    set: &TemplateSet,
) -> Result<Vec<PathBuf>> {
    let files = render(model, provider, set)?;
    let written = write_files(outdir, &files)?;
    info!(
        outdir = %outdir.display(),
        template_set = set.name,
        files = written.len(),
        "generated library"
    );
    Ok(written)
}
