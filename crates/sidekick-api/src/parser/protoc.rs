//! Obtain a descriptor set: read a pre-built one, or run `protoc`.

use std::path::{Path, PathBuf};

use sidekick_descriptor::descriptor::FileDescriptorSet;
use tracing::{debug, info};

use super::ParserConfig;
use crate::error::{Error, Result};

/// Descriptors plus the names of the files that make up the API.
pub(crate) struct Descriptors {
    pub(crate) set: FileDescriptorSet,
    pub(crate) files_to_generate: Vec<String>,
}

/// Load descriptors for `config`.
///
/// With a `descriptor-set` option the file is decoded as either a
/// `FileDescriptorSet` or a `CodeGeneratorRequest`. Otherwise the `.proto`
/// files of the specification directory are compiled with `protoc`.
pub(crate) fn load(config: &ParserConfig<'_>) -> Result<Descriptors> {
    let source = config.specification_source.to_string_lossy().trim_end_matches('/').to_string();
    if let Some(path) = config.option("descriptor-set") {
        let path = Path::new(path);
        if path.is_dir() {
            return Err(Error::specification(path, "expected a file, found a directory"));
        }
        let bytes = std::fs::read(path).map_err(|e| Error::specification(path, e))?;
        let (set, mut files_to_generate) =
            FileDescriptorSet::decode_any(&bytes).map_err(|e| Error::specification(path, e))?;
        if files_to_generate.is_empty() {
            files_to_generate = set
                .file
                .iter()
                .filter_map(|f| f.name.clone())
                .filter(|name| is_under(name, &source))
                .collect();
        }
        if files_to_generate.is_empty() {
            return Err(Error::specification(
                path,
                format!("no files under {source} in the descriptor set"),
            ));
        }
        return Ok(Descriptors { set, files_to_generate });
    }

    let roots = search_roots(config);
    let root = find_root(&roots, &source)
        .ok_or_else(|| Error::specification(&config.specification_source, "not found under any configured root"))?;
    let files = proto_files(&root.join(&source), &source)?;
    info!(root = %root.display(), files = files.len(), "running protoc");
    let set = run_protoc(&roots, &files)?;
    Ok(Descriptors {
        set,
        files_to_generate: files,
    })
}

fn is_under(name: &str, source: &str) -> bool {
    source.is_empty()
        || name
            .strip_prefix(source)
            .is_some_and(|rest| rest.starts_with('/') && !rest[1..].contains('/'))
}

/// Include directories in priority order.
///
/// `roots` names the roots (default `googleapis`); each name `n` is looked up
/// as the `n-root` option. With no configured root the current directory is
/// used.
pub(crate) fn search_roots(config: &ParserConfig<'_>) -> Vec<PathBuf> {
    let names: Vec<&str> = config.option("roots").map_or_else(
        || vec!["googleapis"],
        |roots| roots.split(',').map(str::trim).filter(|r| !r.is_empty()).collect(),
    );
    let roots: Vec<PathBuf> = names
        .iter()
        .filter_map(|name| config.option(&format!("{name}-root")))
        .map(PathBuf::from)
        .collect();
    if roots.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        roots
    }
}

/// The first root containing `source` as a directory.
pub(crate) fn find_root<'a>(roots: &'a [PathBuf], source: &str) -> Option<&'a PathBuf> {
    roots.iter().find(|root| root.join(source).is_dir())
}

fn proto_files(dir: &Path, source: &str) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir).map_err(|e| Error::specification(dir, e))?;
    let mut files: Vec<String> = entries
        .filter_map(std::result::Result::ok)
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|e| e == "proto"))
        .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .map(|name| if source.is_empty() { name } else { format!("{source}/{name}") })
        .collect();
    files.sort();
    if files.is_empty() {
        return Err(Error::specification(dir, "no .proto files"));
    }
    Ok(files)
}

fn run_protoc(roots: &[PathBuf], files: &[String]) -> Result<FileDescriptorSet> {
    use prost::Message as _;

    let protoc = prost_build::protoc_from_env();
    let output_file = tempfile::NamedTempFile::new().map_err(|e| Error::Protoc {
        reason: format!("cannot create descriptor output file: {e}"),
    })?;

    let mut cmd = std::process::Command::new(&protoc);
    cmd.arg("--include_imports")
        .arg("--include_source_info")
        .arg(format!("--descriptor_set_out={}", output_file.path().display()));
    for root in roots {
        cmd.arg(format!("--proto_path={}", root.display()));
    }
    cmd.args(files);
    debug!(command = ?cmd, "protoc");

    let output = cmd.output().map_err(|e| Error::Protoc {
        reason: format!("failed to run protoc at {}: {e}", protoc.display()),
    })?;
    if !output.status.success() {
        return Err(Error::Protoc {
            reason: format!(
                "protoc failed with {}\nstderr: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr),
            ),
        });
    }

    let bytes = std::fs::read(output_file.path()).map_err(|e| Error::Protoc {
        reason: format!("cannot read descriptor output: {e}"),
    })?;
    FileDescriptorSet::decode(bytes.as_slice()).map_err(|e| Error::Protoc {
        reason: format!("cannot decode descriptor output: {e}"),
    })
}
