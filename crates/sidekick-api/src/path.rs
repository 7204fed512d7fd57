//! Structured path templates.
//!
//! A [`PathTemplate`] is an ordered list of literal and variable segments plus
//! an optional custom verb. HTTP bindings (`google.api.http`, OpenAPI paths,
//! Discovery `flatPath`) and resource patterns (`projects/{project}/secrets/{secret}`)
//! are all parsed into this shape, so later stages never split rendered paths.

use serde::Serialize;

use crate::error::{Error, Result};

/// Matches exactly one path segment.
pub const SINGLE_SEGMENT_WILDCARD: &str = "*";

/// Matches one or more path segments.
pub const MULTI_SEGMENT_WILDCARD: &str = "**";

/// A parsed path template.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PathTemplate {
    /// Segments in path order.
    pub segments: Vec<PathSegment>,
    /// Custom verb after the last `:` (e.g. `cancel`), if any.
    pub verb: Option<String>,
}

/// One `/`-separated element of a [`PathTemplate`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PathSegment {
    /// A fixed string such as `projects`.
    Literal(String),
    /// A request field bound to part of the path.
    Variable(PathVariable),
}

/// A `{field.path=match/spec}` element of a template.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PathVariable {
    /// Dotted path of the request field, split into components.
    pub field_path: Vec<String>,
    /// The match spec: literals, `*` and `**` in path order.
    pub segments: Vec<String>,
    /// Discovery `{+var}` expansions allow reserved characters.
    pub allow_reserved: bool,
}

impl PathTemplate {
    /// An empty template.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a literal segment.
    #[must_use]
    pub fn with_literal(mut self, literal: &str) -> Self {
        self.segments.push(PathSegment::Literal(literal.to_string()));
        self
    }

    /// Append a variable segment.
    #[must_use]
    pub fn with_variable(mut self, variable: PathVariable) -> Self {
        self.segments.push(PathSegment::Variable(variable));
        self
    }

    /// Append a variable matching a single segment (`{name}`).
    #[must_use]
    pub fn with_variable_named(self, field_path: &[&str]) -> Self {
        self.with_variable(PathVariable::new(field_path).with_match())
    }

    /// Set the custom verb.
    #[must_use]
    pub fn with_verb(mut self, verb: &str) -> Self {
        self.verb = Some(verb.to_string());
        self
    }

    /// Render the template with each variable as `{field.path}`.
    ///
    /// The result has no leading `/`: `projects/{project}/zones/{zone}`.
    #[must_use]
    pub fn flat_path(&self) -> String {
        let mut path = self
            .segments
            .iter()
            .map(|s| match s {
                PathSegment::Literal(l) => l.clone(),
                PathSegment::Variable(v) => format!("{{{}}}", v.field_path.join(".")),
            })
            .collect::<Vec<_>>()
            .join("/");
        if let Some(verb) = &self.verb {
            path.push(':');
            path.push_str(verb);
        }
        path
    }

    /// All variables in path order.
    pub fn variables(&self) -> impl Iterator<Item = &PathVariable> {
        self.segments.iter().filter_map(|s| match s {
            PathSegment::Variable(v) => Some(v),
            PathSegment::Literal(_) => None,
        })
    }

    /// Parse a `google.api.http` style template.
    ///
    /// Accepts an optional leading `/`, `{field}` (single segment),
    /// `{field=match/*/spec/**}`, Discovery's `{+field}`, and a trailing
    /// `:verb`. Unnamed wildcards outside a variable are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPathTemplate`] for malformed templates.
    pub fn parse(template: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidPathTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let body = template.strip_prefix('/').unwrap_or(template);
        if body.is_empty() {
            return Err(invalid("empty template"));
        }

        let mut raw_segments = Vec::new();
        let mut verb = None;
        let mut depth = 0_usize;
        let mut start = 0;
        for (i, c) in body.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth = depth.checked_sub(1).ok_or_else(|| invalid("unbalanced `}`"))?;
                }
                '/' if depth == 0 => {
                    raw_segments.push(&body[start..i]);
                    start = i + 1;
                }
                ':' if depth == 0 => {
                    raw_segments.push(&body[start..i]);
                    verb = Some(body[i + 1..].to_string());
                    start = body.len();
                    break;
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err(invalid("unbalanced `{`"));
        }
        if start < body.len() {
            raw_segments.push(&body[start..]);
        }
        if verb.as_deref().is_some_and(|v| v.is_empty() || v.contains('/')) {
            return Err(invalid("malformed verb"));
        }

        let mut result = Self {
            segments: Vec::with_capacity(raw_segments.len()),
            verb,
        };
        for raw in raw_segments {
            result.segments.push(parse_segment(raw).map_err(|r| invalid(&r))?);
        }
        Ok(result)
    }
}

fn parse_segment(raw: &str) -> std::result::Result<PathSegment, String> {
    if raw.is_empty() {
        return Err("empty segment".to_string());
    }
    if let Some(inner) = raw.strip_prefix('{').and_then(|r| r.strip_suffix('}')) {
        let (allow_reserved, inner) = match inner.strip_prefix('+') {
            Some(rest) => (true, rest),
            None => (false, inner),
        };
        let (name, spec) = match inner.split_once('=') {
            Some((name, spec)) => (name, Some(spec)),
            None => (inner, None),
        };
        if name.is_empty() || name.split('.').any(str::is_empty) {
            return Err(format!("bad variable name in {raw}"));
        }
        let segments: Vec<String> = match spec {
            Some(spec) => spec.split('/').map(ToString::to_string).collect(),
            None => vec![SINGLE_SEGMENT_WILDCARD.to_string()],
        };
        if segments
            .iter()
            .any(|s| s.is_empty() || s.contains(['{', '}', '=']))
        {
            return Err(format!("bad match spec in {raw}"));
        }
        return Ok(PathSegment::Variable(PathVariable {
            field_path: name.split('.').map(ToString::to_string).collect(),
            segments,
            allow_reserved,
        }));
    }
    if raw.contains(['{', '}']) {
        return Err(format!("variables must span a whole segment: {raw}"));
    }
    if raw == SINGLE_SEGMENT_WILDCARD || raw == MULTI_SEGMENT_WILDCARD {
        return Err("unnamed wildcards are not supported".to_string());
    }
    Ok(PathSegment::Literal(raw.to_string()))
}

impl PathVariable {
    /// A variable bound to `field_path` with an empty match spec.
    #[must_use]
    pub fn new(field_path: &[&str]) -> Self {
        Self {
            field_path: field_path.iter().map(ToString::to_string).collect(),
            segments: Vec::new(),
            allow_reserved: false,
        }
    }

    /// Append a literal to the match spec.
    #[must_use]
    pub fn with_literal(mut self, literal: &str) -> Self {
        self.segments.push(literal.to_string());
        self
    }

    /// Append `*` to the match spec.
    #[must_use]
    pub fn with_match(mut self) -> Self {
        self.segments.push(SINGLE_SEGMENT_WILDCARD.to_string());
        self
    }

    /// Append `**` to the match spec.
    #[must_use]
    pub fn with_match_recursive(mut self) -> Self {
        self.segments.push(MULTI_SEGMENT_WILDCARD.to_string());
        self
    }

    /// The dotted field path, e.g. `secret.name`.
    #[must_use]
    pub fn name(&self) -> String {
        self.field_path.join(".")
    }

    /// The match spec as written in a template, e.g. `projects/*/secrets/*`.
    #[must_use]
    pub fn match_spec(&self) -> String {
        self.segments.join("/")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn flat_path_from_builder() {
        let template = PathTemplate::new()
            .with_literal("projects")
            .with_variable_named(&["project"])
            .with_literal("zones")
            .with_variable_named(&["zone"]);
        assert_eq!(template.flat_path(), "projects/{project}/zones/{zone}");
    }

    #[test]
    fn flat_path_with_verb_and_nested_field() {
        let template = PathTemplate::new()
            .with_literal("v1")
            .with_variable(
                PathVariable::new(&["secret", "name"])
                    .with_literal("projects")
                    .with_match()
                    .with_literal("secrets")
                    .with_match(),
            )
            .with_verb("addVersion");
        assert_eq!(template.flat_path(), "v1/{secret.name}:addVersion");
    }

    #[test]
    fn parse_http_annotation() {
        let parsed = PathTemplate::parse("/v1/{name=projects/*/secrets/*/versions/*}:access").unwrap();
        let expected = PathTemplate::new()
            .with_literal("v1")
            .with_variable(
                PathVariable::new(&["name"])
                    .with_literal("projects")
                    .with_match()
                    .with_literal("secrets")
                    .with_match()
                    .with_literal("versions")
                    .with_match(),
            )
            .with_verb("access");
        assert_eq!(parsed, expected);
    }

    #[test]
    fn parse_simple_variables() {
        let parsed = PathTemplate::parse("/compute/v1/projects/{project}/zones/{zone}").unwrap();
        assert_eq!(parsed.flat_path(), "compute/v1/projects/{project}/zones/{zone}");
        let names: Vec<String> = parsed.variables().map(PathVariable::name).collect();
        assert_eq!(names, vec!["project", "zone"]);
        assert_eq!(parsed.variables().next().unwrap().match_spec(), "*");
    }

    #[test]
    fn parse_recursive_match_and_reserved() {
        let parsed = PathTemplate::parse("/v1/{name=projects/*/objects/**}").unwrap();
        let var = parsed.variables().next().unwrap();
        assert_eq!(var.segments.last().unwrap(), MULTI_SEGMENT_WILDCARD);

        let parsed = PathTemplate::parse("storage/v1/b/{+bucket}/o").unwrap();
        let var = parsed.variables().next().unwrap();
        assert!(var.allow_reserved);
        assert_eq!(var.name(), "bucket");
    }

    #[test]
    fn parse_resource_pattern_without_slash() {
        let parsed = PathTemplate::parse("projects/{project}/secrets/{secret}").unwrap();
        assert_eq!(parsed.segments.len(), 4);
        assert!(parsed.verb.is_none());
    }

    #[test]
    fn parse_rejects_malformed_templates() {
        for bad in [
            "",
            "/",
            "/v1/{name",
            "/v1/name}",
            "/v1//x",
            "/v1/*/x",
            "/v1/{}",
            "/v1/{name=}",
            "/v1/x{name}",
            "/v1/x:",
        ] {
            assert!(PathTemplate::parse(bad).is_err(), "{bad:?} should fail");
        }
    }
}
