//! Streaming Markdown assembler.
//!
//! Append-only writer over the output sink. The header and table of
//! contents are written once, from title-pass data, before any body
//! content; nothing is ever rewritten. Each page is flushed as it is
//! written so a crash mid-run leaves partial, readable output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::{debug, instrument};

use docweave_shared::{DocweaveError, PageDescriptor, Result, SectionGroups};

/// Streaming writer producing the final Markdown document.
pub struct MarkdownAssembler<W: Write> {
    out: W,
    /// Output path, kept for I/O error context.
    path: PathBuf,
}

impl MarkdownAssembler<BufWriter<File>> {
    /// Create the output file (and its parent directories) and wrap it
    /// in a buffered assembler.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| DocweaveError::io(parent, e))?;
            }
        }

        let file = File::create(path).map_err(|e| DocweaveError::io(path, e))?;
        Ok(Self::new(BufWriter::new(file), path))
    }
}

impl<W: Write> MarkdownAssembler<W> {
    /// Wrap an arbitrary sink. `path` is used only for error context.
    pub fn new(out: W, path: impl Into<PathBuf>) -> Self {
        Self {
            out,
            path: path.into(),
        }
    }

    /// Write the document header: H1 title, generation timestamp, and
    /// page count.
    pub fn write_header(&mut self, doc_title: &str, total_pages: usize) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        self.write(&format!(
            "# {doc_title}\n\n*Generated on: {timestamp}*\n*Total pages: {total_pages}*\n\n"
        ))
    }

    /// Write the full table of contents, then the separator before the
    /// body. Called exactly once, between the title-pass and the
    /// content-pass; the TOC is never revisited.
    ///
    /// Each section becomes an H3 with bullet links; pages that carry a
    /// subsection are grouped under an H4 per top-level subsection label.
    #[instrument(skip_all, fields(sections = groups.section_count(), pages = groups.page_count()))]
    pub fn write_toc(&mut self, groups: &SectionGroups) -> Result<()> {
        self.write("## Table of Contents\n\n")?;

        for (section, pages) in groups.iter() {
            self.write(&format!("### {section}\n\n"))?;

            let mut current_group: Option<&str> = None;
            let mut any_ungrouped = false;

            for page in pages {
                match page.subsection_group() {
                    None => {
                        self.write(&format!("- [{}](#{})\n", page.title, page.anchor))?;
                        any_ungrouped = true;
                    }
                    Some(group) => {
                        if current_group != Some(group) {
                            if any_ungrouped || current_group.is_some() {
                                self.write("\n")?;
                            }
                            self.write(&format!("#### {group}\n\n"))?;
                            current_group = Some(group);
                        }
                        self.write(&format!("- [{}](#{})\n", page.title, page.anchor))?;
                    }
                }
            }
            self.write("\n")?;
        }

        self.write("---\n\n")?;
        self.flush()
    }

    /// Start a body section.
    pub fn begin_section(&mut self, section: &str) -> Result<()> {
        debug!(section, "writing section body");
        self.write(&format!("## {section}\n\n"))
    }

    /// Write one page's body under its own subheading and flush, so the
    /// file stays readable if the run dies here.
    pub fn write_page(&mut self, page: &PageDescriptor) -> Result<()> {
        // Explicit anchor target so TOC links resolve regardless of the
        // Markdown renderer's heading-id scheme.
        self.write(&format!(
            "<a id=\"{}\"></a>\n\n### {}\n\n{}\n\n",
            page.anchor, page.title, page.content
        ))?;
        self.flush()
    }

    /// End a body section with a separator.
    pub fn end_section(&mut self) -> Result<()> {
        self.write("---\n\n")?;
        self.flush()
    }

    /// Flush and release the sink.
    pub fn finish(mut self) -> Result<W> {
        self.flush()?;
        Ok(self.out)
    }

    fn write(&mut self, text: &str) -> Result<()> {
        self.out
            .write_all(text.as_bytes())
            .map_err(|e| DocweaveError::io(&self.path, e))
    }

    fn flush(&mut self) -> Result<()> {
        self.out
            .flush()
            .map_err(|e| DocweaveError::io(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docweave_shared::DEFAULT_LANGUAGE;
    use url::Url;

    fn assembler() -> MarkdownAssembler<Vec<u8>> {
        MarkdownAssembler::new(Vec::new(), "test.md")
    }

    fn page(title: &str, section: &str, subsection: Option<&str>, anchor: &str) -> PageDescriptor {
        let mut p = PageDescriptor::new(
            Url::parse("https://docs.example.com/x").unwrap(),
            title,
            section,
            subsection.map(str::to_string),
            DEFAULT_LANGUAGE,
        );
        p.anchor = anchor.to_string();
        p
    }

    fn rendered(asm: MarkdownAssembler<Vec<u8>>) -> String {
        String::from_utf8(asm.finish().unwrap()).unwrap()
    }

    #[test]
    fn header_has_title_timestamp_and_count() {
        let mut asm = assembler();
        asm.write_header("FastAPI Documentation", 42).unwrap();
        let out = rendered(asm);

        assert!(out.starts_with("# FastAPI Documentation\n\n"));
        assert!(out.contains("*Generated on: "));
        assert!(out.contains("*Total pages: 42*"));
    }

    #[test]
    fn toc_groups_sections_and_subsections() {
        let mut groups = SectionGroups::new();
        groups.insert(page("Reference", "Api", None, "reference"));
        groups.insert(page("Intro", "Guide", None, "intro"));
        groups.insert(page("Streaming", "Guide", Some("Advanced/Http"), "streaming"));

        let mut asm = assembler();
        asm.write_toc(&groups).unwrap();
        let out = rendered(asm);

        let api = out.find("### Api").unwrap();
        let guide = out.find("### Guide").unwrap();
        assert!(api < guide, "sections must appear in sorted order");

        assert!(out.contains("- [Reference](#reference)"));
        assert!(out.contains("- [Intro](#intro)"));
        assert!(out.contains("#### Advanced\n\n- [Streaming](#streaming)"));
        assert!(out.trim_end().ends_with("---"));
    }

    #[test]
    fn page_body_carries_anchor_target() {
        let mut asm = assembler();
        let mut p = page("Intro", "Guide", None, "guide-intro");
        p.content = "Welcome.".to_string();

        asm.begin_section("Guide").unwrap();
        asm.write_page(&p).unwrap();
        asm.end_section().unwrap();
        let out = rendered(asm);

        assert!(out.contains("## Guide\n\n"));
        assert!(out.contains("<a id=\"guide-intro\"></a>\n\n### Intro\n\nWelcome.\n\n"));
        assert!(out.trim_end().ends_with("---"));
    }

    #[test]
    fn create_writes_through_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.md");

        let mut asm = MarkdownAssembler::create(&path).unwrap();
        asm.write_header("Docs", 0).unwrap();
        asm.finish().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("# Docs\n"));
    }
}
