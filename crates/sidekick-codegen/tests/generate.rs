//! End-to-end generation from an OpenAPI document.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use serde_json::json;
use sidekick_codegen::{generate, CancellationToken, EmbeddedTemplates, Error, LibraryConfig, TemplateProvider};

fn write_document(dir: &Path) -> PathBuf {
    let path = dir.join("openapi.json");
    let document = json!({
        "openapi": "3.0.3",
        "info": {"title": "Secret Manager API", "description": "Stores secrets."},
        "components": {"schemas": {
            "Secret": {"description": "A secret.", "properties": {
                "name": {"type": "string"},
                "type": {"type": "string"},
                "labels": {"type": "object", "additionalProperties": {"type": "string"}},
                "parent": {"$ref": "#/components/schemas/Secret"},
                "versionCount": {"type": "string", "format": "int64"}
            }},
            "ListSecretsResponse": {"properties": {
                "secrets": {"type": "array", "items": {"$ref": "#/components/schemas/Secret"}},
                "nextPageToken": {"type": "string"}
            }}
        }},
        "paths": {"/v1/projects/{project}/secrets": {"get": {
            "operationId": "ListSecrets",
            "description": "Lists secrets.",
            "parameters": [
                {"name": "project", "in": "path", "schema": {"type": "string"}},
                {"name": "pageToken", "in": "query", "schema": {"type": "string"}},
                {"name": "pageSize", "in": "query", "schema": {"type": "integer"}}
            ],
            "responses": {"200": {"content": {"application/json": {
                "schema": {"$ref": "#/components/schemas/ListSecretsResponse"}
            }}}}
        }}}
    });
    std::fs::write(&path, serde_json::to_string_pretty(&document).unwrap()).unwrap();
    path
}

fn rust_config(document: &Path, extra: &str) -> LibraryConfig {
    let toml = format!(
        "[general]\n\
         language = \"rust\"\n\
         specification-format = \"openapi\"\n\
         specification-source = '{}'\n\
         {extra}\n\
         [source]\n\
         package-name = \"google.cloud.secretmanager.v1\"\n\
         [codec]\n\
         copyright-year = \"2026\"\n\
         \"package:wkt\" = \"package=google-cloud-wkt,source=google.protobuf,version=0.1\"\n",
        document.display()
    );
    LibraryConfig::from_toml(Path::new(".sidekick.toml"), &toml).unwrap()
}

fn dart_config(document: &Path, with_issue_tracker: bool) -> LibraryConfig {
    let issue_tracker = if with_issue_tracker {
        "issue-tracker-url = \"https://github.com/example/issues\"\n"
    } else {
        ""
    };
    let toml = format!(
        "[general]\n\
         language = \"dart\"\n\
         specification-format = \"openapi\"\n\
         specification-source = '{}'\n\
         [source]\n\
         package-name = \"google.cloud.secretmanager.v1\"\n\
         [codec]\n\
         copyright-year = \"2026\"\n\
         api-keys-environment-variables = \"GOOGLE_API_KEY,GEMINI_API_KEY\"\n\
         {issue_tracker}",
        document.display()
    );
    LibraryConfig::from_toml(Path::new(".sidekick.toml"), &toml).unwrap()
}

/// Relative path → contents of every file below `root`.
fn read_tree(root: &Path) -> BTreeMap<PathBuf, String> {
    let mut result = BTreeMap::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                pending.push(path);
            } else {
                let contents = std::fs::read_to_string(&path).unwrap();
                result.insert(path.strip_prefix(root).unwrap().to_path_buf(), contents);
            }
        }
    }
    result
}

#[test]
fn rust_crate_is_generated_and_parses() {
    let dir = tempfile::tempdir().unwrap();
    let document = write_document(dir.path());
    let out = dir.path().join("out");
    let written = generate(&rust_config(&document, ""), Some(&out), &CancellationToken::new()).unwrap();
    assert_eq!(written.len(), 5);

    let tree = read_tree(&out);
    let names: Vec<&str> = tree.keys().map(|p| p.to_str().unwrap()).collect();
    assert_eq!(
        names,
        vec!["Cargo.toml", "README.md", "src/client.rs", "src/lib.rs", "src/model.rs"]
    );
    for file in ["src/lib.rs", "src/model.rs", "src/client.rs"] {
        let source = &tree[Path::new(file)];
        syn::parse_file(source).unwrap_or_else(|e| panic!("{file}: {e}\n{source}"));
    }

    let cargo = &tree[Path::new("Cargo.toml")];
    assert!(cargo.contains("name = \"google-cloud-secretmanager-v1\""));
    assert!(cargo.contains("wkt = { package = \"google-cloud-wkt\", version = \"0.1\" }"));
    let model = &tree[Path::new("src/model.rs")];
    assert!(model.contains("pub r#type: std::option::Option<std::string::String>,"));
    assert!(model.contains("std::option::Option<std::boxed::Box<crate::model::Secret>>"));
    assert!(model.contains("#[serde_as(as = \"std::option::Option<wkt::internal::I64>\")]"));
    let client = &tree[Path::new("src/client.rs")];
    assert!(client.contains("pub async fn list_secrets("));
}

#[test]
fn generation_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    let document = write_document(dir.path());
    let first = dir.path().join("first");
    let second = dir.path().join("second");
    generate(&rust_config(&document, ""), Some(&first), &CancellationToken::new()).unwrap();
    generate(&rust_config(&document, ""), Some(&second), &CancellationToken::new()).unwrap();
    assert_eq!(read_tree(&first), read_tree(&second));
}

#[test]
fn dart_package_is_generated() {
    let dir = tempfile::tempdir().unwrap();
    let document = write_document(dir.path());
    let out = dir.path().join("dart");
    generate(&dart_config(&document, true), Some(&out), &CancellationToken::new()).unwrap();

    let tree = read_tree(&out);
    let names: Vec<&str> = tree.keys().map(|p| p.to_str().unwrap()).collect();
    assert_eq!(
        names,
        vec![
            "README.md",
            "lib/secret_manager.dart",
            "lib/src/client.dart",
            "lib/src/json_helpers.dart",
            "pubspec.yaml"
        ]
    );
    let pubspec = &tree[Path::new("pubspec.yaml")];
    assert!(pubspec.contains("name: google_cloud_secretmanager_v1"));
    assert!(pubspec.contains("issue_tracker: https://github.com/example/issues"));
    let library = &tree[Path::new("lib/secret_manager.dart")];
    assert!(library.contains("final class Secret {"));
    assert!(library.contains("final String? type$;"));
    let client = &tree[Path::new("lib/src/client.dart")];
    assert!(client.contains("const _apiKeyEnvironmentVariables = ['GOOGLE_API_KEY', 'GEMINI_API_KEY'];"));
}

#[test]
fn missing_required_option_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let document = write_document(dir.path());
    let out = dir.path().join("dart");
    let err = generate(&dart_config(&document, false), Some(&out), &CancellationToken::new()).unwrap_err();
    assert!(matches!(err, Error::MissingOption { key, .. } if key == "issue-tracker-url"));
    assert!(!out.exists());
}

#[test]
fn template_directory_and_set_override() {
    let dir = tempfile::tempdir().unwrap();
    let document = write_document(dir.path());
    let templates = dir.path().join("templates");
    for name in EmbeddedTemplates::names() {
        let path = templates.join(name);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, EmbeddedTemplates.load(name).unwrap()).unwrap();
    }
    std::fs::write(templates.join("rust/mod/mod.rs.tera"), "// custom {{ package_name }}\n").unwrap();

    let extra = format!("template-set = \"mod\"\ntemplate-dir = '{}'\n", templates.display());
    let out = dir.path().join("module");
    generate(&rust_config(&document, &extra), Some(&out), &CancellationToken::new()).unwrap();

    let tree = read_tree(&out);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[Path::new("mod.rs")], "// custom google.cloud.secretmanager.v1\n");
    assert!(tree[Path::new("model.rs")].contains("pub struct Secret {"));
}

#[test]
fn unknown_template_set() {
    let dir = tempfile::tempdir().unwrap();
    let document = write_document(dir.path());
    let config = rust_config(&document, "template-set = \"package\"\n");
    let err = generate(&config, Some(&dir.path().join("out")), &CancellationToken::new()).unwrap_err();
    assert!(matches!(err, Error::UnknownTemplateSet { .. }));
}
