//! Anchor assignment for TOC navigation.
//!
//! Anchors are assigned once, in sorted TOC order, before any body
//! content is written. The registry guarantees uniqueness across the
//! whole document by appending a numeric suffix on collision.

use std::collections::HashSet;

/// Tracks anchors already used in the current output document.
#[derive(Debug, Default)]
pub struct AnchorRegistry {
    used: HashSet<String>,
}

impl AnchorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a unique anchor from the given label parts, joined with
    /// hyphens after slugification. Collisions get `-2`, `-3`, …
    /// suffixes in assignment order.
    pub fn assign(&mut self, parts: &[&str]) -> String {
        let base = parts
            .iter()
            .map(|p| slugify(p))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-");

        let base = if base.is_empty() {
            "page".to_string()
        } else {
            base
        };

        let mut anchor = base.clone();
        let mut n = 2;
        while !self.used.insert(anchor.clone()) {
            anchor = format!("{base}-{n}");
            n += 1;
        }
        anchor
    }
}

/// Lower-case, spaces to hyphens, everything outside `[a-z0-9_-]`
/// dropped.
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('-'),
            c if c.is_ascii_alphanumeric() || c == '-' || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Getting Started"), "getting-started");
        assert_eq!(slugify("Q&A: Setup?"), "qa-setup");
        assert_eq!(slugify("snake_case stays"), "snake_case-stays");
    }

    #[test]
    fn assign_joins_parts() {
        let mut reg = AnchorRegistry::new();
        assert_eq!(reg.assign(&["en", "Guide", "First Steps"]), "en-guide-first-steps");
    }

    #[test]
    fn collisions_get_numeric_suffixes() {
        let mut reg = AnchorRegistry::new();
        assert_eq!(reg.assign(&["Install"]), "install");
        assert_eq!(reg.assign(&["Install"]), "install-2");
        assert_eq!(reg.assign(&["Install"]), "install-3");
        assert_eq!(reg.assign(&["install 2"]), "install-2-2");
    }

    #[test]
    fn empty_parts_fall_back_to_page() {
        let mut reg = AnchorRegistry::new();
        assert_eq!(reg.assign(&["¶¶"]), "page");
        assert_eq!(reg.assign(&[""]), "page-2");
    }
}
