//! Target-language annotation.
//!
//! A codec walks every local message, field, enum, enum value, service and
//! method once and stores a language-specific annotation in the node's
//! [`sidekick_api::CodecSlot`]. It also writes a model-wide annotation
//! (package name, dependencies, features, lint lists) to the model's own
//! slot. Templates read these annotations; the model itself stays
//! language-neutral.
//!
//! Codecs are configured with a flat, sorted `key → value` map. Keys shared
//! by every codec:
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `package-name-override` | Name of the generated package |
//! | `version` | Version of the generated package (default `0.1.0`) |
//! | `copyright-year` | Year in license headers (default: current year) |
//! | `package:<name>` | A dependency; the value format is codec specific |

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use sidekick_api::{Field, Model};
use tracing::info;

use crate::error::{Error, Result};

pub mod dart;
pub mod rust;

/// Flat codec configuration.
pub type CodecOptions = BTreeMap<String, String>;

/// Target language of a generated library.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// A Rust crate or module.
    Rust,
    /// A Dart package.
    Dart,
}

impl Language {
    /// The configuration and log name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rust => "rust",
            Self::Dart => "dart",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "rust" => Ok(Self::Rust),
            "dart" => Ok(Self::Dart),
            other => Err(Error::UnknownLanguage {
                language: other.to_string(),
            }),
        }
    }
}

/// Annotate every local node of `model` for `language`.
///
/// Required options are checked before any node is touched.
///
/// # Errors
///
/// [`Error::MissingOption`], [`Error::InvalidOption`],
/// [`Error::MissingPackage`], [`Error::MissingDependencyConstraint`] or
/// [`Error::RelativePath`] for configuration problems; an API error if a
/// codec slot was already written.
pub fn annotate_model(model: &Model, language: Language, options: &CodecOptions) -> Result<()> {
    info!(language = %language, package = %model.package_name, "annotating model");
    match language {
        Language::Rust => rust::annotate_model(model, options).map(|_| ()),
        Language::Dart => dart::annotate_model(model, options).map(|_| ()),
    }
}

/// Fail with [`Error::MissingOption`] for the first absent or empty key.
pub(crate) fn require_options(codec: &str, options: &CodecOptions, keys: &[&str]) -> Result<()> {
    match keys.iter().find(|key| options.get(**key).is_none_or(|v| v.trim().is_empty())) {
        Some(key) => Err(Error::missing_option(codec, key)),
        None => Ok(()),
    }
}

/// A boolean option; absent means `default`.
pub(crate) fn bool_option(options: &CodecOptions, key: &str, default: bool) -> Result<bool> {
    match options.get(key).map(|v| v.trim()) {
        None => Ok(default),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(other) => Err(Error::invalid_option(key, other, "expected `true` or `false`")),
    }
}

/// A comma-separated list option, trimmed, empty items dropped.
pub(crate) fn list_option(options: &CodecOptions, key: &str) -> Vec<String> {
    options
        .get(key)
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// `copyright-year`, defaulting to the current year.
pub(crate) fn copyright_year(options: &CodecOptions) -> String {
    options
        .get("copyright-year")
        .cloned()
        .unwrap_or_else(|| chrono::Local::now().format("%Y").to_string())
}

/// `package:<name>` options, keyed by `<name>`.
pub(crate) fn package_options(options: &CodecOptions) -> impl Iterator<Item = (&str, &str)> {
    options
        .iter()
        .filter_map(|(k, v)| k.strip_prefix("package:").map(|name| (name, v.as_str())))
}

/// Split `key=value,key=value` into pairs, in order.
///
/// Keys may repeat.
pub(crate) fn parse_key_values<'a>(option: &str, value: &'a str) -> Result<Vec<(&'a str, &'a str)>> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.split_once('=')
                .map(|(k, v)| (k.trim(), v.trim()))
                .ok_or_else(|| Error::invalid_option(option, value, format!("`{item}` is not a `key=value` pair")))
        })
        .collect()
}

/// Protobuf packages of every type the local elements reference, except the
/// model's own package.
pub(crate) fn referenced_packages(model: &Model) -> BTreeSet<String> {
    let mut ids: Vec<&str> = Vec::new();
    for message in model.all_messages() {
        ids.extend(
            message
                .fields
                .iter()
                .filter(|f| !f.typez_id.is_empty())
                .map(|f| f.typez_id.as_str()),
        );
    }
    for method in model.all_methods() {
        ids.push(&method.input_type_id);
        ids.push(&method.output_type_id);
        if let Some(info) = &method.operation_info {
            ids.push(&info.response_type_id);
            ids.push(&info.metadata_type_id);
        }
    }
    ids.into_iter()
        .filter_map(|id| package_of(model, id))
        .filter(|package| *package != model.package_name)
        .map(ToString::to_string)
        .collect()
}

pub(crate) fn package_of<'a>(model: &'a Model, id: &str) -> Option<&'a str> {
    model
        .message(id)
        .map(|m| m.package.as_str())
        .or_else(|| model.enum_(id).map(|e| e.package.as_str()))
}

/// The element name of a resolved field: the message or enum name, or an
/// empty string for scalars.
pub(crate) fn type_name<'a>(model: &'a Model, field: &Field) -> &'a str {
    model
        .field_message(field)
        .map(|m| m.name.as_str())
        .or_else(|| model.field_enum(field).map(|e| e.name.as_str()))
        .unwrap_or_default()
}

/// Documentation as comment lines with `prefix` (`///`, `//`).
///
/// Trailing whitespace is removed and blank lines keep the bare prefix.
pub(crate) fn doc_lines(documentation: &str, prefix: &str) -> Vec<String> {
    let documentation = documentation.trim();
    if documentation.is_empty() {
        return Vec::new();
    }
    documentation
        .lines()
        .map(|line| {
            let line = line.trim_end();
            if line.is_empty() {
                prefix.to_string()
            } else {
                format!("{prefix} {line}")
            }
        })
        .collect()
}

/// Give names that collide after casing a distinct suffix.
///
/// The first occurrence keeps its name; later ones get `{sep}{index}`
/// where `index` is their position.
pub(crate) fn disambiguate(names: Vec<String>, sep: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            if seen.insert(name.clone()) {
                name
            } else {
                let unique = format!("{name}{sep}{index}");
                seen.insert(unique.clone());
                unique
            }
        })
        .collect()
}

/// `to` relative to directory `from`.
///
/// Both paths must be of the same kind (relative or absolute) and free of
/// `..` components.
pub(crate) fn relative_path(from: &Path, to: &Path) -> Result<PathBuf> {
    let error = || Error::RelativePath {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
    };
    if from.is_absolute() != to.is_absolute() {
        return Err(error());
    }
    let normal = |p: &Path| -> Option<Vec<String>> {
        p.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().to_string()),
                Component::RootDir | Component::Prefix(_) => Some(String::new()),
                _ => None,
            })
            .collect()
    };
    let (from, to) = (normal(from).ok_or_else(error)?, normal(to).ok_or_else(error)?);
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
    let mut result = PathBuf::new();
    for _ in common..from.len() {
        result.push("..");
    }
    for part in &to[common..] {
        result.push(part);
    }
    if result.as_os_str().is_empty() {
        result.push(".");
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn options(pairs: &[(&str, &str)]) -> CodecOptions {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn language_names() {
        assert_eq!("dart".parse::<Language>().unwrap(), Language::Dart);
        assert_eq!(Language::Rust.to_string(), "rust");
        assert!(matches!("go".parse::<Language>(), Err(Error::UnknownLanguage { .. })));
    }

    #[test]
    fn required_options() {
        let opts = options(&[("issue-tracker-url", "https://example.com"), ("blank", " ")]);
        require_options("dart", &opts, &["issue-tracker-url"]).unwrap();
        let err = require_options("dart", &opts, &["issue-tracker-url", "blank"]).unwrap_err();
        assert!(matches!(err, Error::MissingOption { key, .. } if key == "blank"));
    }

    #[test]
    fn option_parsing() {
        let opts = options(&[("flag", "true"), ("bad", "yes"), ("list", "a, b,,c")]);
        assert!(bool_option(&opts, "flag", false).unwrap());
        assert!(!bool_option(&opts, "missing", false).unwrap());
        assert!(bool_option(&opts, "bad", false).is_err());
        assert_eq!(list_option(&opts, "list"), vec!["a", "b", "c"]);
        assert_eq!(
            parse_key_values("package:wkt", "package=google-cloud-wkt, source=google.protobuf").unwrap(),
            vec![("package", "google-cloud-wkt"), ("source", "google.protobuf")]
        );
        assert!(parse_key_values("package:wkt", "package").is_err());
    }

    #[test]
    fn doc_lines_keep_blank_lines() {
        assert_eq!(
            doc_lines("  First line.  \n\nSecond.\n", "///"),
            vec!["/// First line.", "///", "/// Second."]
        );
        assert!(doc_lines("   ", "///").is_empty());
    }

    #[test]
    fn first_occurrence_keeps_its_name() {
        let names = vec!["Active".to_string(), "Other".to_string(), "Active".to_string()];
        assert_eq!(disambiguate(names, "_"), vec!["Active", "Other", "Active_2"]);
    }

    #[test]
    fn relative_paths() {
        assert_eq!(
            relative_path(Path::new("src/generated/cloud/v1"), Path::new("src/wkt")).unwrap(),
            PathBuf::from("../../../wkt")
        );
        assert_eq!(relative_path(Path::new("a/b"), Path::new("a/b")).unwrap(), PathBuf::from("."));
        assert!(matches!(
            relative_path(Path::new("/abs"), Path::new("rel")),
            Err(Error::RelativePath { .. })
        ));
        assert!(relative_path(Path::new("a/../b"), Path::new("c")).is_err());
    }
}
