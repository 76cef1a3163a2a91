//! URL classification: derive `(section, subsection, language)` from a
//! URL path.
//!
//! This is a pure, total function. Every downstream grouping decision
//! rests on it, so it never fails: unclassifiable paths land in the
//! `Home` section.

use url::Url;

use docweave_shared::{DEFAULT_LANGUAGE, HOME_SECTION};

/// Section/subsection/language labels derived from one URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Never empty; `Home` for root-level pages.
    pub section: String,
    /// Remaining path segments, `/`-joined and title-cased.
    pub subsection: Option<String>,
    /// Two-letter locale from the first path segment, or the default.
    pub language: String,
}

/// Classify a URL by its path segments.
///
/// The first segment is consumed as a language tag when it looks like a
/// two-letter locale code. The next segment becomes the section and any
/// remainder the subsection, both title-cased with hyphens and
/// underscores turned into spaces. Query strings and fragments never
/// influence the result.
pub fn classify(url: &Url) -> Classification {
    let mut segments: Vec<&str> = url
        .path()
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect();

    let language = if segments.first().is_some_and(|s| is_locale(s)) {
        segments.remove(0).to_ascii_lowercase()
    } else {
        DEFAULT_LANGUAGE.to_string()
    };

    match segments.len() {
        0 => Classification {
            section: HOME_SECTION.to_string(),
            subsection: None,
            language,
        },
        1 => Classification {
            section: title_case(segments[0]),
            subsection: None,
            language,
        },
        _ => Classification {
            section: title_case(segments[0]),
            subsection: Some(
                segments[1..]
                    .iter()
                    .map(|s| title_case(s))
                    .collect::<Vec<_>>()
                    .join("/"),
            ),
            language,
        },
    }
}

/// Two ASCII letters, e.g. `en`, `es`, `pt`. Mixed-alphanumeric segments
/// like `v2` are path content, not locales.
fn is_locale(segment: &str) -> bool {
    segment.len() == 2 && segment.chars().all(|c| c.is_ascii_alphabetic())
}

/// Title-case a path segment: hyphens and underscores become spaces and
/// each word's first letter is upper-cased.
pub fn title_case(segment: &str) -> String {
    segment
        .replace(['-', '_'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_path(path: &str) -> Classification {
        classify(&Url::parse(&format!("https://docs.example.com{path}")).unwrap())
    }

    #[test]
    fn three_segments_split_section_and_subsection() {
        let c = classify_path("/a/b/c");
        assert_eq!(c.section, "A");
        assert_eq!(c.subsection.as_deref(), Some("B/C"));
        assert_eq!(c.language, "en");
    }

    #[test]
    fn empty_path_is_home() {
        let c = classify_path("/");
        assert_eq!(c.section, "Home");
        assert_eq!(c.subsection, None);
    }

    #[test]
    fn single_segment_has_no_subsection() {
        let c = classify_path("/tutorial/");
        assert_eq!(c.section, "Tutorial");
        assert_eq!(c.subsection, None);
    }

    #[test]
    fn hyphens_and_underscores_become_spaces() {
        let c = classify_path("/getting-started/api_reference");
        assert_eq!(c.section, "Getting Started");
        assert_eq!(c.subsection.as_deref(), Some("Api Reference"));
    }

    #[test]
    fn locale_segment_is_consumed() {
        let c = classify_path("/es/tutorial/primeros-pasos");
        assert_eq!(c.language, "es");
        assert_eq!(c.section, "Tutorial");
        assert_eq!(c.subsection.as_deref(), Some("Primeros Pasos"));
    }

    #[test]
    fn locale_alone_falls_back_to_home() {
        let c = classify_path("/pt/");
        assert_eq!(c.language, "pt");
        assert_eq!(c.section, "Home");
    }

    #[test]
    fn two_char_non_alpha_segment_is_not_a_locale() {
        let c = classify_path("/v2/endpoints");
        assert_eq!(c.language, "en");
        assert_eq!(c.section, "V2");
        assert_eq!(c.subsection.as_deref(), Some("Endpoints"));
    }

    #[test]
    fn query_and_fragment_are_ignored() {
        let plain = classify_path("/guide/install");
        let noisy = classify_path("/guide/install?lang=fr&v=2#section-3");
        assert_eq!(plain, noisy);
    }
}
