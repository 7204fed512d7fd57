//! Dynamic routing headers (`google.api.routing`).
//!
//! Each routing key may be extracted by several variants; the last declared
//! variant that matches wins, so variants are stored last-declared-first and
//! generated code can stop at the first match.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::path::{MULTI_SEGMENT_WILDCARD, SINGLE_SEGMENT_WILDCARD};

/// A routing key and the ways to compute it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RoutingInfo {
    /// Header key name.
    pub name: String,
    /// Candidates, highest precedence first.
    pub variants: Vec<RoutingInfoVariant>,
}

/// One way to extract a routing key from a request field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RoutingInfoVariant {
    /// Request field, split on `.`.
    pub field_path: Vec<String>,
    /// Segments that must precede the captured value.
    pub prefix: RoutingPathSpec,
    /// Segments captured as the key value.
    pub matching: RoutingPathSpec,
    /// Segments that must follow the captured value.
    pub suffix: RoutingPathSpec,
}

/// A `/`-separated run of literals, `*` and `**`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RoutingPathSpec {
    /// Segments in path order.
    pub segments: Vec<String>,
}

impl RoutingPathSpec {
    fn parse(spec: &str) -> Self {
        Self {
            segments: spec
                .split('/')
                .filter(|s| !s.is_empty())
                .map(ToString::to_string)
                .collect(),
        }
    }

    /// The spec joined with `/`.
    #[must_use]
    pub fn as_string(&self) -> String {
        self.segments.join("/")
    }
}

impl RoutingInfoVariant {
    /// The field path joined with `.`.
    #[must_use]
    pub fn field_name(&self) -> String {
        self.field_path.join(".")
    }

    /// The full template this variant matches, with the captured part in braces.
    #[must_use]
    pub fn template_as_string(&self) -> String {
        let mut parts = self.prefix.segments.clone();
        parts.push(format!("{{{}}}", self.matching.as_string()));
        parts.extend(self.suffix.segments.iter().cloned());
        parts.join("/")
    }
}

/// A `google.api.RoutingParameter` before grouping.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingParameter {
    /// Request field.
    pub field: String,
    /// Template with one named variable, or empty.
    pub path_template: String,
}

/// Group routing parameters into [`RoutingInfo`]s.
///
/// Keys appear in order of first declaration. Within a key, variants are
/// listed last-declared-first. An empty template routes the whole field value
/// under the field's own name.
///
/// # Errors
///
/// [`Error::InvalidPathTemplate`] when a template has no single named variable.
pub fn parse_routing(parameters: &[RoutingParameter]) -> Result<Vec<RoutingInfo>> {
    let mut infos: Vec<RoutingInfo> = Vec::new();
    for parameter in parameters {
        let (name, variant) = parse_parameter(parameter)?;
        match infos.iter_mut().find(|i| i.name == name) {
            Some(info) => info.variants.insert(0, variant),
            None => infos.push(RoutingInfo {
                name,
                variants: vec![variant],
            }),
        }
    }
    Ok(infos)
}

fn parse_parameter(parameter: &RoutingParameter) -> Result<(String, RoutingInfoVariant)> {
    let field_path: Vec<String> = parameter.field.split('.').map(ToString::to_string).collect();
    if parameter.path_template.is_empty() {
        return Ok((
            parameter.field.clone(),
            RoutingInfoVariant {
                field_path,
                matching: RoutingPathSpec {
                    segments: vec![MULTI_SEGMENT_WILDCARD.to_string()],
                },
                ..RoutingInfoVariant::default()
            },
        ));
    }

    let invalid = |reason: &str| Error::InvalidPathTemplate {
        template: parameter.path_template.clone(),
        reason: reason.to_string(),
    };
    let template = parameter.path_template.as_str();
    let open = template.find('{').ok_or_else(|| invalid("missing variable"))?;
    let close = template.find('}').ok_or_else(|| invalid("unbalanced `{`"))?;
    if close < open || template[close + 1..].contains(['{', '}']) {
        return Err(invalid("expected exactly one variable"));
    }
    let inner = &template[open + 1..close];
    let (name, matching) = match inner.split_once('=') {
        Some((name, matching)) => (name, matching),
        None => (inner, SINGLE_SEGMENT_WILDCARD),
    };
    if name.is_empty() || matching.is_empty() {
        return Err(invalid("empty variable"));
    }
    Ok((
        name.to_string(),
        RoutingInfoVariant {
            field_path,
            prefix: RoutingPathSpec::parse(&template[..open]),
            matching: RoutingPathSpec::parse(matching),
            suffix: RoutingPathSpec::parse(&template[close + 1..]),
        },
    ))
}

/// Which routing key advances fastest when enumerating combinations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum KeyOrder {
    /// The last key advances fastest, the first key slowest.
    #[default]
    FirstSlowest,
    /// The first key advances fastest.
    FirstFastest,
}

/// One variant chosen for one routing key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoutingComboItem {
    /// The routing key.
    pub name: String,
    /// The chosen variant.
    pub variant: RoutingInfoVariant,
}

/// A complete assignment of one variant per routing key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoutingCombo {
    /// One item per key, in key order.
    pub items: Vec<RoutingComboItem>,
}

/// All combinations, first key varying slowest.
#[must_use]
pub fn routing_combos(infos: &[RoutingInfo]) -> Vec<RoutingCombo> {
    routing_combos_ordered(infos, KeyOrder::FirstSlowest)
}

/// All combinations of one variant per key, enumerated as a mixed-radix
/// counter whose digit order is given by `order`.
///
/// Yields the product of the variant counts; no keys, or a key without
/// variants, yields nothing.
#[must_use]
pub fn routing_combos_ordered(infos: &[RoutingInfo], order: KeyOrder) -> Vec<RoutingCombo> {
    let radices: Vec<usize> = infos.iter().map(|i| i.variants.len()).collect();
    if radices.is_empty() || radices.contains(&0) {
        return Vec::new();
    }
    let positions: Vec<usize> = match order {
        KeyOrder::FirstSlowest => (0..radices.len()).rev().collect(),
        KeyOrder::FirstFastest => (0..radices.len()).collect(),
    };

    let mut digits = vec![0_usize; radices.len()];
    let mut combos = Vec::with_capacity(radices.iter().product());
    loop {
        combos.push(RoutingCombo {
            items: infos
                .iter()
                .zip(&digits)
                .map(|(info, &d)| RoutingComboItem {
                    name: info.name.clone(),
                    variant: info.variants[d].clone(),
                })
                .collect(),
        });

        let mut wrapped = true;
        for &pos in &positions {
            digits[pos] += 1;
            if digits[pos] < radices[pos] {
                wrapped = false;
                break;
            }
            digits[pos] = 0;
        }
        if wrapped {
            return combos;
        }
    }
}
