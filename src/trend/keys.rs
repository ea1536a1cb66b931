//! Store key naming
//!
//! Buckets live at `<prefix:>name:<cycle>`, the weighted union at
//! `<prefix:>name`. These strings are shared with existing deployments and
//! must not change.

/// Builds bucket and union keys under an optional prefix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySpace {
    prefix: Option<String>,
}

impl KeySpace {
    /// An empty prefix is the same as no prefix
    pub fn new(prefix: Option<String>) -> Self {
        Self {
            prefix: prefix.filter(|p| !p.is_empty()),
        }
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Key of the weighted union set for `name`
    pub fn union(&self, name: &str) -> String {
        self.join(&[name])
    }

    /// Key of the bucket holding `name`'s counts for one cycle
    pub fn bucket(&self, name: &str, cycle: u32) -> String {
        self.join(&[name, &cycle.to_string()])
    }

    fn join(&self, parts: &[&str]) -> String {
        self.prefix
            .as_deref()
            .into_iter()
            .chain(parts.iter().copied())
            .collect::<Vec<_>>()
            .join(":")
    }
}
