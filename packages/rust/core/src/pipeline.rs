//! Two-pass scrape pipeline: sitemap → title-pass → TOC → content-pass.
//!
//! Phase 1 fetches every page once to resolve titles and group pages by
//! section. Between the passes the header and table of contents are
//! written from the fully-known phase 1 output. Phase 2 then fetches
//! each page again, extracts its body, and appends it as it completes.
//!
//! Per-page failures are absorbed at the task boundary: a failed title
//! fetch drops the page entirely; a failed content fetch leaves the
//! page's TOC entry pointing at a body that was never written. Only
//! sitemap and output-file errors abort the run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::task::JoinSet;
use tracing::{error, info, instrument, warn};
use url::Url;

use docweave_scrape::{Extractor, Fetcher, extract_title};
use docweave_shared::{FetchKind, PageDescriptor, Result, SectionGroups, SiteConfig};

use crate::anchors::AnchorRegistry;
use crate::assembler::MarkdownAssembler;
use crate::classify;

/// Outcome of one completed run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// URLs listed in the sitemap.
    pub pages_discovered: usize,
    /// Pages that survived the title-pass and appear in the TOC.
    pub pages_indexed: usize,
    /// Page bodies actually written.
    pub pages_written: usize,
    /// Pages dropped by fetch failures in either pass.
    pub pages_failed: usize,
    /// Sections in the output document.
    pub sections: usize,
    /// Highest observed number of concurrently in-flight requests.
    pub peak_in_flight: usize,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Progress callback so the pipeline core stays free of output-stream
/// concerns.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called as each page's fetch+extract resolves, success or not.
    fn page_done(&self, kind: FetchKind, url: &str, current: usize, total: usize);
    /// Called once when the run completes.
    fn done(&self, summary: &RunSummary);
}

/// No-op reporter for headless and test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn page_done(&self, _kind: FetchKind, _url: &str, _current: usize, _total: usize) {}
    fn done(&self, _summary: &RunSummary) {}
}

/// Run the full pipeline for one site.
///
/// 1. Resolve the sitemap to a URL list
/// 2. Title-pass: concurrent fetch + classify, grouped by section
/// 3. Assign anchors, write header + TOC
/// 4. Content-pass: per section, concurrent fetch + extract, bodies
///    appended in completion order
#[instrument(skip_all, fields(sitemap = %config.sitemap_url))]
pub async fn run(config: &SiteConfig, progress: &dyn ProgressReporter) -> Result<RunSummary> {
    let start = Instant::now();
    config.validate()?;

    let fetcher = Arc::new(Fetcher::new(config.max_concurrent, config.request_delay_ms)?);

    // --- Sitemap ---
    progress.phase("Resolving sitemap");
    let urls = docweave_sitemap::resolve(fetcher.client(), &config.sitemap_url).await?;
    let pages_discovered = urls.len();

    if urls.is_empty() {
        warn!("sitemap listed no pages, nothing to do");
        let summary = RunSummary {
            pages_discovered: 0,
            pages_indexed: 0,
            pages_written: 0,
            pages_failed: 0,
            sections: 0,
            peak_in_flight: 0,
            elapsed: start.elapsed(),
        };
        progress.done(&summary);
        return Ok(summary);
    }

    info!(pages = pages_discovered, "sitemap resolved");

    // --- Phase 1: title-pass ---
    progress.phase("Indexing titles");
    let (groups, title_failures) =
        title_pass(config, &fetcher, urls, progress).await;

    info!(
        sections = groups.section_count(),
        indexed = groups.page_count(),
        failed = title_failures,
        "title-pass complete"
    );

    // --- Phase 1.5: anchors + TOC ---
    let mut groups = groups;
    assign_anchors(&mut groups, config.anchor_with_section);

    progress.phase("Writing table of contents");
    let mut assembler = MarkdownAssembler::create(&config.output_path)?;
    assembler.write_header(&config.doc_title, groups.page_count())?;
    assembler.write_toc(&groups)?;

    // --- Phase 2: content-pass ---
    progress.phase("Extracting content");
    let extractor = Arc::new(Extractor::new(
        &config.content_selectors,
        config.code_fence_default.clone(),
        config.serialize_tables,
    ));

    let total = groups.page_count();
    let mut pages_written = 0usize;
    let mut pages_failed = title_failures;
    let mut processed = 0usize;

    for (section, pages) in groups.iter() {
        assembler.begin_section(section)?;

        let mut tasks: JoinSet<std::result::Result<PageDescriptor, PageDescriptor>> =
            JoinSet::new();
        for page in pages {
            let fetcher = Arc::clone(&fetcher);
            let extractor = Arc::clone(&extractor);
            let mut page = page.clone();
            tasks.spawn(async move {
                match fetcher.fetch(&page.url, FetchKind::Content).await {
                    Ok(success) => {
                        page.content = extractor.extract(&success.body).content;
                        Ok(page)
                    }
                    // Fetch errors were already logged by the fetcher.
                    Err(_) => Err(page),
                }
            });
        }

        // Bodies are appended in completion order; the sorted TOC is the
        // canonical navigation aid.
        while let Some(joined) = tasks.join_next().await {
            processed += 1;
            match joined {
                Ok(Ok(page)) => {
                    if page.content.is_empty() {
                        warn!(url = %page.url, "no content extracted, body omitted");
                    } else {
                        assembler.write_page(&page)?;
                        pages_written += 1;
                    }
                    progress.page_done(FetchKind::Content, page.url.as_str(), processed, total);
                }
                Ok(Err(page)) => {
                    pages_failed += 1;
                    warn!(url = %page.url, "content-pass failed, TOC entry has no body");
                    progress.page_done(FetchKind::Content, page.url.as_str(), processed, total);
                }
                Err(e) => {
                    pages_failed += 1;
                    error!(error = %e, "content task aborted");
                }
            }
        }

        assembler.end_section()?;
    }

    assembler.finish()?;

    let summary = RunSummary {
        pages_discovered,
        pages_indexed: groups.page_count(),
        pages_written,
        pages_failed,
        sections: groups.section_count(),
        peak_in_flight: fetcher.peak_in_flight(),
        elapsed: start.elapsed(),
    };

    info!(
        indexed = summary.pages_indexed,
        written = summary.pages_written,
        failed = summary.pages_failed,
        peak_in_flight = summary.peak_in_flight,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "run complete"
    );
    progress.done(&summary);

    Ok(summary)
}

/// Fetch every URL once, resolve titles, and group pages by section.
/// Results arrive in completion order; failed pages are dropped with a
/// warning and counted.
async fn title_pass(
    config: &SiteConfig,
    fetcher: &Arc<Fetcher>,
    urls: Vec<Url>,
    progress: &dyn ProgressReporter,
) -> (SectionGroups, usize) {
    let total = urls.len();
    let mut tasks: JoinSet<std::result::Result<PageDescriptor, Url>> = JoinSet::new();

    for url in urls {
        let fetcher = Arc::clone(fetcher);
        let title_strip = config.title_strip.clone();
        tasks.spawn(async move {
            let class = classify::classify(&url);
            match fetcher.fetch(&url, FetchKind::Title).await {
                Ok(success) => {
                    let title = extract_title(&success.body, &url, title_strip.as_deref());
                    Ok(PageDescriptor::new(
                        url,
                        title,
                        class.section,
                        class.subsection,
                        class.language,
                    ))
                }
                Err(_) => Err(url),
            }
        });
    }

    let mut groups = SectionGroups::new();
    let mut failures = 0usize;
    let mut completed = 0usize;

    while let Some(joined) = tasks.join_next().await {
        completed += 1;
        match joined {
            Ok(Ok(page)) => {
                progress.page_done(FetchKind::Title, page.url.as_str(), completed, total);
                groups.insert(page);
            }
            Ok(Err(url)) => {
                failures += 1;
                warn!(%url, "title-pass failed, page dropped");
                progress.page_done(FetchKind::Title, url.as_str(), completed, total);
            }
            Err(e) => {
                failures += 1;
                error!(error = %e, "title task aborted");
            }
        }
    }

    (groups, failures)
}

/// Sort each section's pages into a deterministic TOC order and assign
/// document-unique anchors in that order.
fn assign_anchors(groups: &mut SectionGroups, anchor_with_section: bool) {
    let mut registry = AnchorRegistry::new();

    for (section, pages) in groups.iter_mut() {
        pages.sort_by(|a, b| {
            (a.subsection_group(), &a.title, a.url.as_str())
                .cmp(&(b.subsection_group(), &b.title, b.url.as_str()))
        });

        for page in pages.iter_mut() {
            page.anchor = if anchor_with_section {
                registry.assign(&[&page.language, section, &page.title])
            } else {
                registry.assign(&[&page.title])
            };
        }
    }
}
