//! AIP-123 resources.
//!
//! Patterns are kept as parsed [`PathTemplate`]s, so every inference below
//! works on segments and never splits rendered strings.

use serde::Serialize;

use crate::casing::to_lower_camel_case;
use crate::path::{PathSegment, PathTemplate};

/// A resource descriptor, from a message annotation or a file-level definition.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Resource {
    /// `{service}/{Kind}`, e.g. `secretmanager.googleapis.com/Secret`.
    #[serde(rename = "type")]
    pub type_: String,
    /// Explicit singular name, may be empty.
    pub singular: String,
    /// Explicit plural name, may be empty.
    pub plural: String,
    /// Name patterns in declaration order.
    pub patterns: Vec<PathTemplate>,
}

impl Resource {
    /// A resource of `type_` with no patterns.
    #[must_use]
    pub fn new(type_: &str) -> Self {
        Self {
            type_: type_.to_string(),
            ..Self::default()
        }
    }

    /// Append a pattern.
    #[must_use]
    pub fn with_pattern(mut self, pattern: PathTemplate) -> Self {
        self.patterns.push(pattern);
        self
    }

    /// The `Kind` part of the type.
    #[must_use]
    pub fn kind(&self) -> &str {
        self.type_.rsplit_once('/').map_or(self.type_.as_str(), |(_, kind)| kind)
    }

    /// The singular name, inferred from the kind when not declared.
    #[must_use]
    pub fn singular_name(&self) -> String {
        if self.singular.is_empty() {
            to_lower_camel_case(self.kind())
        } else {
            self.singular.clone()
        }
    }

    /// The plural name.
    ///
    /// Falls back to the last collection ID of the first pattern, then to the
    /// singular name with an `s` appended.
    #[must_use]
    pub fn plural_name(&self) -> String {
        if !self.plural.is_empty() {
            return self.plural.clone();
        }
        self.patterns
            .first()
            .and_then(|p| collection_ids(p).pop())
            .unwrap_or_else(|| format!("{}s", self.singular_name()))
    }
}

/// The literal segments that directly precede a variable.
///
/// `projects/{project}/locations/{location}/secrets/{secret}` yields
/// `["projects", "locations", "secrets"]`.
#[must_use]
pub fn collection_ids(pattern: &PathTemplate) -> Vec<String> {
    pattern
        .segments
        .windows(2)
        .filter_map(|pair| match pair {
            [PathSegment::Literal(literal), PathSegment::Variable(_)] => Some(literal.clone()),
            _ => None,
        })
        .collect()
}

/// The variable names of a pattern, in order.
#[must_use]
pub fn pattern_variables(pattern: &PathTemplate) -> Vec<String> {
    pattern.variables().map(crate::path::PathVariable::name).collect()
}
