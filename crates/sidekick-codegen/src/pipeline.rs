//! The per-library pipeline.
//!
//! Stages run strictly in order: service config, parse, cross-reference,
//! recursion labels, validation, transforms, annotation, render, write. A
//! [`CancellationToken`] is checked between stages; a stage that started
//! always runs to completion.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sidekick_api::transform::{auto_populate, patch_documentation, skip_model_elements, update_method_pagination};
use sidekick_api::{cross_reference, label_recursive_fields, parse, validate, Model, ParserConfig, ServiceConfig};
use tracing::{debug, info};

use crate::codec::{self, CodecOptions};
use crate::config::LibraryConfig;
use crate::error::{Error, Result};
use crate::render::{self, DirectoryTemplates, EmbeddedTemplates, TemplateProvider};

/// Shared flag asking pipelines to stop at the next stage boundary.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// A token that is not cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

fn stage(cancel: &CancellationToken, name: &'static str) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled {
            stage: name.to_string(),
        });
    }
    info!(stage = name, "pipeline stage");
    Ok(())
}

/// Parse, resolve, validate and transform the library's specification.
///
/// # Errors
///
/// The first error of any stage, or [`Error::Cancelled`].
pub fn build_model(config: &LibraryConfig, cancel: &CancellationToken) -> Result<Model> {
    stage(cancel, "service config")?;
    let service_config = config
        .service_config_path()
        .map(|path| ServiceConfig::load(&path))
        .transpose()?;

    stage(cancel, "parse")?;
    let general = &config.general;
    let mut parser = ParserConfig::new(general.specification_format, &general.specification_source)
        .with_options(config.source.clone());
    if let Some(service_config) = &service_config {
        parser = parser.with_service_config(service_config);
    }
    if let Some(discovery) = &config.discovery {
        parser = parser.with_discovery(discovery);
    }
    let api = parse(&parser)?;

    stage(cancel, "cross-reference")?;
    let mut model = cross_reference(api)?;
    label_recursive_fields(&mut model);

    stage(cancel, "validate")?;
    validate(&model)?;

    stage(cancel, "transform")?;
    skip_model_elements(&mut model, &config.model_filter())?;
    patch_documentation(&mut model, &config.documentation_overrides)?;
    update_method_pagination(&mut model, &config.pagination_overrides)?;
    if let Some(service_config) = &service_config {
        auto_populate(&mut model, service_config);
    }
    debug!(
        package = %model.package_name,
        messages = model.messages.len(),
        services = model.services.len(),
        "model ready"
    );
    Ok(model)
}

/// Codec options with `output-dir` defaulted to the output directory.
fn codec_options(config: &LibraryConfig, output: &Path) -> CodecOptions {
    let mut options = config.codec.clone();
    options
        .entry("output-dir".to_string())
        .or_insert_with(|| output.to_string_lossy().to_string());
    options
}

/// Run the whole pipeline for one library and return the written files.
///
/// `output` replaces `general.output` when set. Nothing is written unless
/// every earlier stage succeeded.
///
/// # Errors
///
/// The first error of any stage, or [`Error::Cancelled`].
pub fn generate(config: &LibraryConfig, output: Option<&Path>, cancel: &CancellationToken) -> Result<Vec<PathBuf>> {
    let model = build_model(config, cancel)?;
    let general = &config.general;
    let output = output.unwrap_or(&general.output);

    stage(cancel, "annotate")?;
    codec::annotate_model(&model, general.language, &codec_options(config, output))?;

    stage(cancel, "render")?;
    let set = render::template_set(general.language, general.template_set.as_deref(), !model.services.is_empty())?;
    let provider: Box<dyn TemplateProvider> = match &general.template_dir {
        Some(dir) => Box::new(DirectoryTemplates::new(dir)),
        None => Box::new(EmbeddedTemplates),
    };
    let files = render::render(&model, provider.as_ref(), set)?;

    stage(cancel, "write")?;
    let written = render::write_files(output, &files)?;
    info!(
        package = %model.package_name,
        outdir = %output.display(),
        files = written.len(),
        "library generated"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancelled_before_first_stage() {
        let config = LibraryConfig::from_toml(
            Path::new(".sidekick.toml"),
            "[general]\nlanguage = \"rust\"\nspecification-source = \"missing.json\"\n",
        )
        .unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = build_model(&config, &cancel).unwrap_err();
        assert!(matches!(err, Error::Cancelled { stage } if stage == "service config"));
    }

    #[test]
    fn clones_share_the_flag() {
        let cancel = CancellationToken::new();
        let clone = cancel.clone();
        assert!(!clone.is_cancelled());
        cancel.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn output_dir_defaults_to_the_output() {
        let config = LibraryConfig::from_toml(
            Path::new(".sidekick.toml"),
            "[general]\nlanguage = \"rust\"\nspecification-source = \"x\"\n[codec]\nversion = \"1.0.0\"\n",
        )
        .unwrap();
        let options = codec_options(&config, Path::new("out/lib"));
        assert_eq!(options.get("output-dir").map(String::as_str), Some("out/lib"));
        assert_eq!(options.get("version").map(String::as_str), Some("1.0.0"));
    }
}
