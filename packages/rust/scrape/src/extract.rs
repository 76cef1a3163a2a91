//! HTML content extraction.
//!
//! [`extract_title`] serves the title-pass: it resolves a page title from
//! metadata with URL-derived fallback. [`Extractor`] serves the
//! content-pass: it locates the main content region via an ordered list
//! of selector fallbacks, skips chrome elements, and serializes the
//! remaining block elements to cleaned Markdown-flavored text.
//!
//! Extraction never fails a page: when no selector matches, or the
//! document is hostile, the result is empty content and the page still
//! appears in the table of contents.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

/// Stray glyph left by documentation generators' heading permalinks.
const PILCROW: char = '¶';

/// Elements whose subtrees never contribute to output.
const CHROME_TAGS: &[&str] = &["nav", "header", "footer", "aside", "script", "style"];

/// Result of extracting one page body.
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    /// Cleaned text blocks joined by blank lines. Empty when no content
    /// region matched.
    pub content: String,
}

// ---------------------------------------------------------------------------
// Title extraction (title-pass)
// ---------------------------------------------------------------------------

/// Resolve a page title: `og:title` meta, then `<title>`, then the first
/// `<h1>`, then a humanized final URL path segment.
///
/// `title_strip` removes a configured site-name substring (e.g.
/// "FastAPI") before trimming leftover separator punctuation.
pub fn extract_title(html: &str, url: &Url, title_strip: Option<&str>) -> String {
    static OG_TITLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse(r#"meta[property="og:title"]"#).expect("valid selector"));
    static TITLE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("title").expect("valid selector"));
    static H1: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("h1").expect("valid selector"));

    let doc = Html::parse_document(html);

    let raw = doc
        .select(&OG_TITLE)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(str::to_string)
        .or_else(|| {
            doc.select(&TITLE)
                .next()
                .map(|el| el.text().collect::<String>())
        })
        .or_else(|| {
            doc.select(&H1)
                .next()
                .map(|el| el.text().collect::<String>())
        })
        .unwrap_or_else(|| title_from_url(url));

    let mut title = raw.trim().to_string();
    if let Some(strip) = title_strip {
        title = title.replace(strip, "");
    }
    let title = title.trim_matches([' ', '|', ':', '-']).to_string();

    if title.is_empty() {
        title_from_url(url)
    } else {
        title
    }
}

/// Humanize the last URL path segment into a fallback title.
fn title_from_url(url: &Url) -> String {
    let segment = url
        .path()
        .trim_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("");

    if segment.is_empty() {
        return "Home".to_string();
    }

    segment
        .replace(['-', '_'], " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(c) => format!("{}{}", c.to_uppercase(), chars.as_str()),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Body extraction (content-pass)
// ---------------------------------------------------------------------------

/// Content-pass body extractor, configured once per target site.
pub struct Extractor {
    /// Ordered content-region selectors; first non-empty match wins.
    selectors: Vec<Selector>,
    /// Union selector for the block elements we render.
    blocks: Selector,
    /// Fence language when a code block carries no `language-*` hint.
    code_fence_default: String,
    /// Whether `<table>` elements are serialized.
    serialize_tables: bool,
}

impl Extractor {
    /// Build an extractor from a site's selector list and rendering knobs.
    /// Invalid selector strings are skipped with a warning rather than
    /// failing the run.
    pub fn new(
        content_selectors: &[String],
        code_fence_default: impl Into<String>,
        serialize_tables: bool,
    ) -> Self {
        let mut selectors: Vec<Selector> = Vec::with_capacity(content_selectors.len() + 1);
        for raw in content_selectors {
            match Selector::parse(raw) {
                Ok(sel) => selectors.push(sel),
                Err(e) => warn!(selector = %raw, error = %e, "skipping invalid content selector"),
            }
        }
        // The document body is always the last resort.
        selectors.push(Selector::parse("body").expect("valid selector"));

        let block_list = if serialize_tables {
            "h1, h2, h3, h4, h5, h6, p, li, pre, table"
        } else {
            "h1, h2, h3, h4, h5, h6, p, li, pre"
        };

        Self {
            selectors,
            blocks: Selector::parse(block_list).expect("valid selector"),
            code_fence_default: code_fence_default.into(),
            serialize_tables,
        }
    }

    /// Extract the cleaned text body from one page's HTML.
    pub fn extract(&self, html: &str) -> Extracted {
        let doc = Html::parse_document(html);

        let Some(root) = self.content_root(&doc) else {
            debug!("no content selector matched a non-empty element");
            return Extracted::default();
        };

        let mut rendered: Vec<String> = Vec::new();

        for el in root.select(&self.blocks) {
            if under_chrome(el) || nested_in_rendered_container(el) {
                continue;
            }

            let block = match el.value().name() {
                "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => self.render_heading(el),
                "li" => self.render_list_item(el),
                "pre" => self.render_code(el),
                "table" if self.serialize_tables => render_table(el),
                _ => self.render_paragraph(el),
            };

            if let Some(block) = block {
                rendered.push(block);
            }
        }

        Extracted {
            content: rendered.join("\n\n"),
        }
    }

    /// Try each content selector in order; first match with any text wins.
    fn content_root<'a>(&self, doc: &'a Html) -> Option<ElementRef<'a>> {
        for sel in &self.selectors {
            if let Some(el) = doc.select(sel).find(|el| {
                el.text().any(|t| !t.trim().is_empty())
            }) {
                return Some(el);
            }
        }
        None
    }

    fn render_heading(&self, el: ElementRef<'_>) -> Option<String> {
        let text = clean_text(&el.text().collect::<String>());
        if text.is_empty() {
            return None;
        }
        // "h3" -> level 3
        let level = el.value().name().as_bytes()[1] - b'0';
        Some(format!("{} {text}", "#".repeat(level as usize)))
    }

    fn render_paragraph(&self, el: ElementRef<'_>) -> Option<String> {
        let text = clean_text(&el.text().collect::<String>());
        (!text.is_empty()).then_some(text)
    }

    fn render_list_item(&self, el: ElementRef<'_>) -> Option<String> {
        let text = clean_text(&el.text().collect::<String>());
        (!text.is_empty()).then(|| format!("- {text}"))
    }

    /// Render a `<pre>` block as a fenced code block. Whitespace inside
    /// the fence is preserved verbatim.
    fn render_code(&self, el: ElementRef<'_>) -> Option<String> {
        let code: String = el.text().collect();
        let code = code.trim_matches('\n').trim_end();
        if code.trim().is_empty() {
            return None;
        }

        let lang = code_language(el).unwrap_or_else(|| self.code_fence_default.clone());
        Some(format!("```{lang}\n{code}\n```"))
    }
}

/// Find a `language-*` class token on the element or its descendants.
fn code_language(el: ElementRef<'_>) -> Option<String> {
    fn from_classes(el: ElementRef<'_>) -> Option<String> {
        el.value()
            .classes()
            .find_map(|c| c.strip_prefix("language-").map(str::to_string))
    }

    if let Some(lang) = from_classes(el) {
        return Some(lang);
    }

    el.descendants()
        .filter_map(ElementRef::wrap)
        .find_map(from_classes)
}

/// Serialize a `<table>` to a Markdown table.
fn render_table(table: ElementRef<'_>) -> Option<String> {
    static TR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").expect("valid"));
    static CELL: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("th, td").expect("valid"));

    let mut rows: Vec<Vec<String>> = Vec::new();
    for tr in table.select(&TR) {
        let cells: Vec<String> = tr
            .select(&CELL)
            .map(|cell| clean_text(&cell.text().collect::<String>()))
            .collect();
        if !cells.is_empty() {
            rows.push(cells);
        }
    }

    if rows.is_empty() {
        return None;
    }

    let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut rows {
        row.resize(cols, String::new());
    }

    let mut md = format!("| {} |\n", rows[0].join(" | "));
    md.push_str(&format!("| {} |", vec!["---"; cols].join(" | ")));
    for row in &rows[1..] {
        md.push_str(&format!("\n| {} |", row.join(" | ")));
    }
    Some(md)
}

/// True when the element sits under navigation/header/footer/script/style
/// chrome that must never contribute to output.
fn under_chrome(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| CHROME_TAGS.contains(&a.value().name()))
}

/// True when the element is inside a block we already render as a whole
/// (`li`, `pre`, `table`), which would duplicate its text.
fn nested_in_rendered_container(el: ElementRef<'_>) -> bool {
    el.ancestors()
        .filter_map(ElementRef::wrap)
        .any(|a| matches!(a.value().name(), "li" | "pre" | "table"))
}

/// Collapse whitespace runs to single spaces and strip heading-permalink
/// pilcrows. Applied to every block except fenced code interiors.
fn clean_text(text: &str) -> String {
    static WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    let collapsed = WS.replace_all(text, " ");
    collapsed.replace(PILCROW, "").trim().to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
