//! Sitemap resolution: fetch a sitemap.xml and extract its page URLs.
//!
//! A sitemap failure is fatal to the run — with no URL list there is
//! nothing to crawl — so fetch and parse errors propagate to the caller
//! instead of being swallowed. An empty `<urlset>` is not an error; it
//! resolves to an empty list and the caller treats it as "nothing to do".
//!
//! Sitemap index documents (`<sitemapindex>`) are followed recursively,
//! with a bounded depth and child count, merging the child urlsets.

use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;
use tracing::{debug, instrument, warn};
use url::Url;

use docweave_shared::{DocweaveError, Result};

/// Maximum recursion depth for sitemap index files.
const MAX_INDEX_DEPTH: u8 = 2;

/// Maximum number of child sitemaps followed from one index.
const MAX_CHILD_SITEMAPS: usize = 50;

/// Resolve a sitemap URL to the ordered list of page URLs it lists.
///
/// Issues one GET per sitemap document. Non-2xx responses and transport
/// failures surface as [`DocweaveError::SitemapFetch`]; malformed XML as
/// [`DocweaveError::SitemapParse`]. `<loc>` values that are not valid
/// absolute URLs are skipped with a warning.
#[instrument(skip(client), fields(url = %sitemap_url))]
pub async fn resolve(client: &Client, sitemap_url: &str) -> Result<Vec<Url>> {
    let urls = resolve_recursive(client, sitemap_url.to_string(), 0).await?;

    if urls.is_empty() {
        warn!(url = %sitemap_url, "sitemap contained no page URLs");
    } else {
        debug!(count = urls.len(), "sitemap resolved");
    }

    Ok(urls)
}

fn resolve_recursive(
    client: &Client,
    url: String,
    depth: u8,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Vec<Url>>> + Send + '_>> {
    Box::pin(async move {
        if depth > MAX_INDEX_DEPTH {
            return Err(DocweaveError::SitemapParse(format!(
                "sitemap index nesting exceeds {MAX_INDEX_DEPTH} levels at {url}"
            )));
        }

        debug!(%url, depth, "fetching sitemap");

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| DocweaveError::SitemapFetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocweaveError::SitemapFetch(format!("{url}: HTTP {status}")));
        }

        let xml = response
            .text()
            .await
            .map_err(|e| DocweaveError::SitemapFetch(format!("{url}: body read failed: {e}")))?;

        match parse_sitemap(&xml)? {
            SitemapContent::Urlset(locs) => Ok(parse_locs(&locs)),
            SitemapContent::Index(children) => {
                let mut all = Vec::new();
                for child in children.into_iter().take(MAX_CHILD_SITEMAPS) {
                    match resolve_recursive(client, child.clone(), depth + 1).await {
                        Ok(urls) => all.extend(urls),
                        Err(e) => {
                            // One broken child shouldn't sink the whole index.
                            warn!(child = %child, error = %e, "skipping child sitemap");
                        }
                    }
                }
                Ok(all)
            }
        }
    })
}

/// Convert raw `<loc>` strings to parsed URLs, dropping invalid ones.
fn parse_locs(locs: &[String]) -> Vec<Url> {
    locs.iter()
        .filter_map(|loc| match Url::parse(loc) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(loc = %loc, error = %e, "skipping invalid sitemap URL");
                None
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// XML parsing
// ---------------------------------------------------------------------------

/// Parsed sitemap document: either page URLs or child sitemap URLs.
#[derive(Debug)]
enum SitemapContent {
    Urlset(Vec<String>),
    Index(Vec<String>),
}

/// Parse sitemap XML into its `<loc>` values.
///
/// Handles both `<urlset>` and `<sitemapindex>` roots; any other root
/// element, or malformed XML, is a [`DocweaveError::SitemapParse`].
fn parse_sitemap(xml: &str) -> Result<SitemapContent> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut locs: Vec<String> = Vec::new();
    let mut root: Option<Root> = None;
    let mut in_entry = false;
    let mut in_loc = false;
    // Open-element depth; truncated documents reach EOF with this non-zero.
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match (root, name.as_str()) {
                    (None, "urlset") => root = Some(Root::Urlset),
                    (None, "sitemapindex") => root = Some(Root::Index),
                    (None, other) => {
                        return Err(DocweaveError::SitemapParse(format!(
                            "unexpected root element <{other}>"
                        )));
                    }
                    (Some(Root::Urlset), "url") | (Some(Root::Index), "sitemap") => {
                        in_entry = true;
                    }
                    (Some(_), "loc") if in_entry => in_loc = true,
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                depth = depth.saturating_sub(1);
                match e.local_name().as_ref() {
                    b"url" | b"sitemap" => in_entry = false,
                    b"loc" => in_loc = false,
                    _ => {}
                }
            }
            Ok(Event::Text(e)) if in_loc => {
                let text = e
                    .unescape()
                    .map_err(|e| DocweaveError::SitemapParse(e.to_string()))?;
                let text = text.trim();
                if !text.is_empty() {
                    locs.push(text.to_string());
                }
            }
            Ok(Event::Eof) => {
                // quick-xml reports EOF without error even when elements
                // are still open; a truncated sitemap must not pass as a
                // partial crawl.
                if depth != 0 {
                    return Err(DocweaveError::SitemapParse(format!(
                        "unexpected end of document with {depth} unclosed element(s)"
                    )));
                }
                break;
            }
            Err(e) => {
                return Err(DocweaveError::SitemapParse(format!("XML parse error: {e}")));
            }
            _ => {}
        }
        buf.clear();
    }

    match root {
        Some(Root::Urlset) => Ok(SitemapContent::Urlset(locs)),
        Some(Root::Index) => Ok(SitemapContent::Index(locs)),
        None => Err(DocweaveError::SitemapParse("no root element found".into())),
    }
}

#[derive(Debug, Clone, Copy)]
enum Root {
    Urlset,
    Index,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const URLSET: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://docs.example.com/guide/intro</loc></url>
  <url><loc>https://docs.example.com/guide/advanced</loc></url>
  <url><loc>https://docs.example.com/api/reference</loc></url>
</urlset>"#;

    #[test]
    fn parse_urlset_preserves_order() {
        let content = parse_sitemap(URLSET).unwrap();
        match content {
            SitemapContent::Urlset(locs) => {
                assert_eq!(locs.len(), 3);
                assert_eq!(locs[0], "https://docs.example.com/guide/intro");
                assert_eq!(locs[2], "https://docs.example.com/api/reference");
            }
            SitemapContent::Index(_) => panic!("expected urlset"),
        }
    }

    #[test]
    fn parse_empty_urlset_is_not_an_error() {
        let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9"></urlset>"#;
        match parse_sitemap(xml).unwrap() {
            SitemapContent::Urlset(locs) => assert!(locs.is_empty()),
            SitemapContent::Index(_) => panic!("expected urlset"),
        }
    }

    #[test]
    fn parse_index_root() {
        let xml = r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>https://docs.example.com/sitemap-en.xml</loc></sitemap>
  <sitemap><loc>https://docs.example.com/sitemap-es.xml</loc></sitemap>
</sitemapindex>"#;
        match parse_sitemap(xml).unwrap() {
            SitemapContent::Index(locs) => {
                assert_eq!(locs.len(), 2);
                assert_eq!(locs[0], "https://docs.example.com/sitemap-en.xml");
            }
            SitemapContent::Urlset(_) => panic!("expected index"),
        }
    }

    #[test]
    fn parse_malformed_xml_is_parse_error() {
        let err = parse_sitemap("<urlset><url><loc>https://a").unwrap_err();
        assert!(matches!(err, DocweaveError::SitemapParse(_)));
    }

    #[test]
    fn parse_truncated_document_is_parse_error() {
        // Complete entries but no closing root tag: a cut-off response
        // body must fail, not yield a partial URL list.
        let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://docs.example.com/guide/intro</loc></url>
  <url><loc>https://docs.example.com/guide/advanced</loc></url>"#;
        let err = parse_sitemap(xml).unwrap_err();
        assert!(matches!(err, DocweaveError::SitemapParse(_)));
        assert!(err.to_string().contains("unclosed"));
    }

    #[test]
    fn parse_unexpected_root_is_parse_error() {
        let err = parse_sitemap("<html><body>not a sitemap</body></html>").unwrap_err();
        assert!(matches!(err, DocweaveError::SitemapParse(_)));
        assert!(err.to_string().contains("html"));
    }

    #[tokio::test]
    async fn resolve_with_mock_server() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/sitemap.xml"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(URLSET))
            .mount(&server)
            .await;

        let client = Client::new();
        let urls = resolve(&client, &format!("{}/sitemap.xml", server.uri()))
            .await
            .unwrap();

        assert_eq!(urls.len(), 3);
        assert_eq!(urls[0].path(), "/guide/intro");
    }

    #[tokio::test]
    async fn resolve_http_500_is_fetch_error() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/sitemap.xml"))
            .respond_with(wiremock::ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = Client::new();
        let err = resolve(&client, &format!("{}/sitemap.xml", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, DocweaveError::SitemapFetch(_)));
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn resolve_follows_index_and_skips_broken_children() {
        let server = wiremock::MockServer::start().await;

        let index = format!(
            r#"<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>{0}/sitemap-a.xml</loc></sitemap>
  <sitemap><loc>{0}/sitemap-missing.xml</loc></sitemap>
</sitemapindex>"#,
            server.uri()
        );

        let child = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>https://docs.example.com/guide/intro</loc></url>
</urlset>"#;

        wiremock::Mock::given(wiremock::matchers::path("/sitemap.xml"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(index))
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::path("/sitemap-a.xml"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(child))
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::path("/sitemap-missing.xml"))
            .respond_with(wiremock::ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = Client::new();
        let urls = resolve(&client, &format!("{}/sitemap.xml", server.uri()))
            .await
            .unwrap();

        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].path(), "/guide/intro");
    }
}
