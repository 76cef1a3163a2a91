//! Core domain types for the scraping pipeline.

use std::collections::BTreeMap;

use url::Url;

/// Default language tag when a URL carries no locale segment.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Section label for pages at the site root.
pub const HOME_SECTION: &str = "Home";

// ---------------------------------------------------------------------------
// FetchKind
// ---------------------------------------------------------------------------

/// Which pipeline pass a fetch belongs to. Used for logging and progress
/// attribution only, never for control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// First pass: lightweight page metadata (title, structure).
    Title,
    /// Second pass: full page body.
    Content,
}

impl std::fmt::Display for FetchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Title => write!(f, "title"),
            Self::Content => write!(f, "content"),
        }
    }
}

// ---------------------------------------------------------------------------
// PageDescriptor
// ---------------------------------------------------------------------------

/// One documentation page as it moves through the pipeline.
///
/// Created during the title-pass (one per sitemap URL), filled in by the
/// content-pass, then written to the output sink and discarded.
#[derive(Debug, Clone)]
pub struct PageDescriptor {
    /// Absolute page URL. Unique key within a run; never mutated.
    pub url: Url,
    /// Resolved page title. Empty until the title-pass completes.
    pub title: String,
    /// Section label from the first path segment. Never empty (falls
    /// back to `Home`).
    pub section: String,
    /// Optional label from the remaining path segments, `/`-joined.
    pub subsection: Option<String>,
    /// Extracted text body. Empty until the content-pass completes.
    pub content: String,
    /// Unique fragment identifier within the output document.
    pub anchor: String,
    /// Locale tag, defaulting to [`DEFAULT_LANGUAGE`].
    pub language: String,
}

impl PageDescriptor {
    /// Create a descriptor with title-pass fields populated and
    /// content-pass fields left empty.
    pub fn new(
        url: Url,
        title: impl Into<String>,
        section: impl Into<String>,
        subsection: Option<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            url,
            title: title.into(),
            section: section.into(),
            subsection,
            content: String::new(),
            anchor: String::new(),
            language: language.into(),
        }
    }

    /// The first subsection path segment, used for TOC grouping.
    pub fn subsection_group(&self) -> Option<&str> {
        self.subsection
            .as_deref()
            .map(|s| s.split('/').next().unwrap_or(s))
    }
}

// ---------------------------------------------------------------------------
// SectionGroups
// ---------------------------------------------------------------------------

/// Pages grouped by section label.
///
/// Backed by a `BTreeMap` so iteration order is the sorted, deterministic
/// section order the TOC and the content-pass both rely on. Pages within
/// a section are stored in title-pass completion order.
#[derive(Debug, Default, Clone)]
pub struct SectionGroups {
    groups: BTreeMap<String, Vec<PageDescriptor>>,
}

impl SectionGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a page to its section's group, creating the group if needed.
    pub fn insert(&mut self, page: PageDescriptor) {
        self.groups.entry(page.section.clone()).or_default().push(page);
    }

    /// Iterate sections in sorted label order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<PageDescriptor>)> {
        self.groups.iter()
    }

    /// Mutable iteration in sorted label order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Vec<PageDescriptor>)> {
        self.groups.iter_mut()
    }

    /// Number of sections.
    pub fn section_count(&self) -> usize {
        self.groups.len()
    }

    /// Total number of pages across all sections.
    pub fn page_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(url: &str, section: &str) -> PageDescriptor {
        PageDescriptor::new(
            Url::parse(url).unwrap(),
            "Title",
            section,
            None,
            DEFAULT_LANGUAGE,
        )
    }

    #[test]
    fn groups_iterate_in_sorted_section_order() {
        let mut groups = SectionGroups::new();
        groups.insert(page("https://docs.example.com/guide/intro", "Guide"));
        groups.insert(page("https://docs.example.com/api/ref", "Api"));
        groups.insert(page("https://docs.example.com/guide/advanced", "Guide"));

        let sections: Vec<&str> = groups.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(sections, vec!["Api", "Guide"]);
        assert_eq!(groups.section_count(), 2);
        assert_eq!(groups.page_count(), 3);
    }

    #[test]
    fn subsection_group_takes_first_segment() {
        let mut p = page("https://docs.example.com/guide/a/b", "Guide");
        p.subsection = Some("Advanced/Streaming".into());
        assert_eq!(p.subsection_group(), Some("Advanced"));

        p.subsection = None;
        assert_eq!(p.subsection_group(), None);
    }

    #[test]
    fn new_descriptor_has_empty_content_pass_fields() {
        let p = page("https://docs.example.com/guide", "Guide");
        assert!(p.content.is_empty());
        assert!(p.anchor.is_empty());
    }
}
