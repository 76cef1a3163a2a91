//! docweave-core: the two-pass scrape pipeline.
//!
//! Wires the sitemap resolver, classifier, fetcher, and extractor into
//! a single orchestrated run producing one Markdown document per site.

pub mod anchors;
pub mod assembler;
pub mod classify;
pub mod pipeline;

pub use anchors::AnchorRegistry;
pub use assembler::MarkdownAssembler;
pub use classify::{Classification, classify, title_case};
pub use pipeline::{ProgressReporter, RunSummary, SilentProgress, run};
