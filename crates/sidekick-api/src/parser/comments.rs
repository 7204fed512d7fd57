//! Leading comments from `SourceCodeInfo`.

use std::collections::HashMap;

use sidekick_descriptor::descriptor::SourceCodeInfo;

/// Comments of one file, keyed by descriptor path.
#[derive(Debug, Default)]
pub(crate) struct Comments(HashMap<Vec<i32>, String>);

impl Comments {
    pub(crate) fn new(info: Option<&SourceCodeInfo>) -> Self {
        let Some(info) = info else {
            return Self::default();
        };
        Self(
            info.location
                .iter()
                .filter_map(|l| {
                    l.leading_comments
                        .as_deref()
                        .map(|c| (l.path.clone(), clean(c)))
                })
                .collect(),
        )
    }

    /// The comment at `path`, or empty.
    pub(crate) fn get(&self, path: &[i32]) -> String {
        self.0.get(path).cloned().unwrap_or_default()
    }
}

/// Strip one leading space per line and the trailing newline.
pub(crate) fn clean(raw: &str) -> String {
    raw.trim_end_matches('\n')
        .lines()
        .map(|line| line.strip_prefix(' ').unwrap_or(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `parent` extended by `(kind, index)`.
pub(crate) fn child(parent: &[i32], kind: i32, index: usize) -> Vec<i32> {
    let mut path = parent.to_vec();
    path.push(kind);
    path.push(i32::try_from(index).unwrap_or(i32::MAX));
    path
}
