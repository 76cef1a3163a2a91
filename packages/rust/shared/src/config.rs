//! Application configuration for docweave.
//!
//! User config lives at `~/.docweave/docweave.toml`. It holds global
//! `[defaults]` and one `[[sites]]` profile per target site. CLI flags
//! override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{DocweaveError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docweave.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docweave";

// ---------------------------------------------------------------------------
// Config structs (matching docweave.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults applied to sites that omit the knob.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Per-site scrape profiles.
    #[serde(default)]
    pub sites: Vec<SiteProfile>,
}

impl AppConfig {
    /// Look up a site profile by name (case-insensitive).
    pub fn site(&self, name: &str) -> Option<&SiteProfile> {
        self.sites
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Maximum concurrent in-flight page requests.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Fixed delay after every request, in milliseconds.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    /// Fence language used when a code block carries no `language-*` hint.
    #[serde(default = "default_code_fence")]
    pub code_fence_default: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            request_delay_ms: default_request_delay_ms(),
            code_fence_default: default_code_fence(),
        }
    }
}

fn default_max_concurrent() -> usize {
    4
}
fn default_request_delay_ms() -> u64 {
    1000
}
fn default_code_fence() -> String {
    "text".into()
}

/// `[[sites]]` entry — one target site's scrape profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteProfile {
    /// Profile name used on the command line (e.g. `fastapi`).
    pub name: String,

    /// Sitemap URL to resolve page URLs from.
    pub sitemap_url: String,

    /// Output Markdown file path.
    pub output_path: String,

    /// H1 title of the generated document. Defaults to the profile name.
    #[serde(default)]
    pub doc_title: Option<String>,

    /// Maximum concurrent in-flight page requests (overrides defaults).
    #[serde(default)]
    pub max_concurrent: Option<usize>,

    /// Fixed delay after every request, in milliseconds (overrides defaults).
    #[serde(default)]
    pub request_delay_ms: Option<u64>,

    /// Ordered content-selector fallback list. Tried first to last; the
    /// document body is the implicit last resort.
    #[serde(default)]
    pub content_selectors: Vec<String>,

    /// Substring stripped from page titles (typically the site name).
    #[serde(default)]
    pub title_strip: Option<String>,

    /// Fence language when a code block has no `language-*` hint.
    #[serde(default)]
    pub code_fence_default: Option<String>,

    /// Serialize `<table>` elements to text (off by default).
    #[serde(default)]
    pub serialize_tables: bool,

    /// Derive anchors from `language-section-title` rather than title alone.
    #[serde(default)]
    pub anchor_with_section: bool,
}

// ---------------------------------------------------------------------------
// Site config (runtime, merged from defaults + profile + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime configuration for one scrape run.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Sitemap URL to resolve.
    pub sitemap_url: String,
    /// Output Markdown file path.
    pub output_path: PathBuf,
    /// H1 title of the generated document.
    pub doc_title: String,
    /// Maximum concurrent in-flight page requests.
    pub max_concurrent: usize,
    /// Fixed delay after every request, in milliseconds.
    pub request_delay_ms: u64,
    /// Ordered content-selector fallback list.
    pub content_selectors: Vec<String>,
    /// Substring stripped from page titles.
    pub title_strip: Option<String>,
    /// Fence language when a code block has no hint.
    pub code_fence_default: String,
    /// Serialize `<table>` elements to text.
    pub serialize_tables: bool,
    /// Derive anchors from `language-section-title`.
    pub anchor_with_section: bool,
}

impl SiteConfig {
    /// Merge a site profile over the global defaults.
    pub fn from_profile(defaults: &DefaultsConfig, profile: &SiteProfile) -> Self {
        Self {
            sitemap_url: profile.sitemap_url.clone(),
            output_path: PathBuf::from(&profile.output_path),
            doc_title: profile
                .doc_title
                .clone()
                .unwrap_or_else(|| profile.name.clone()),
            max_concurrent: profile.max_concurrent.unwrap_or(defaults.max_concurrent),
            request_delay_ms: profile
                .request_delay_ms
                .unwrap_or(defaults.request_delay_ms),
            content_selectors: profile.content_selectors.clone(),
            title_strip: profile.title_strip.clone(),
            code_fence_default: profile
                .code_fence_default
                .clone()
                .unwrap_or_else(|| defaults.code_fence_default.clone()),
            serialize_tables: profile.serialize_tables,
            anchor_with_section: profile.anchor_with_section,
        }
    }

    /// Validate the knobs a run depends on.
    pub fn validate(&self) -> Result<()> {
        if self.sitemap_url.is_empty() {
            return Err(DocweaveError::config("sitemap_url must not be empty"));
        }
        if self.max_concurrent == 0 {
            return Err(DocweaveError::config(
                "max_concurrent must be at least 1",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docweave/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocweaveError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docweave/docweave.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file
/// does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocweaveError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        DocweaveError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a starter config file with one
/// example site profile. Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocweaveError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig {
        defaults: DefaultsConfig::default(),
        sites: vec![SiteProfile {
            name: "fastapi".into(),
            sitemap_url: "https://fastapi.tiangolo.com/sitemap.xml".into(),
            output_path: "fastapi_docs.md".into(),
            doc_title: Some("FastAPI Documentation".into()),
            max_concurrent: Some(5),
            request_delay_ms: Some(500),
            content_selectors: vec![
                "div.md-content__inner".into(),
                "div#main-content".into(),
                "main".into(),
            ],
            title_strip: Some("FastAPI".into()),
            code_fence_default: Some("python".into()),
            serialize_tables: true,
            anchor_with_section: true,
        }],
    };
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocweaveError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocweaveError::io(&path, e))?;
    tracing::info!(?path, "created starter config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("max_concurrent"));
        assert!(toml_str.contains("request_delay_ms"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.defaults.max_concurrent, 4);
        assert_eq!(parsed.defaults.request_delay_ms, 1000);
    }

    #[test]
    fn config_with_sites() {
        let toml_str = r#"
[defaults]
max_concurrent = 6

[[sites]]
name = "langchain"
sitemap_url = "https://python.langchain.com/sitemap.xml"
output_path = "langchain_docs.md"
request_delay_ms = 2000
content_selectors = ["main", "article", ".prose", ".markdown"]
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.sites.len(), 1);

        let profile = config.site("LangChain").expect("case-insensitive lookup");
        assert_eq!(profile.name, "langchain");

        let site = SiteConfig::from_profile(&config.defaults, profile);
        assert_eq!(site.max_concurrent, 6);
        assert_eq!(site.request_delay_ms, 2000);
        assert_eq!(site.content_selectors.len(), 4);
        assert_eq!(site.doc_title, "langchain");
        assert!(!site.serialize_tables);
    }

    #[test]
    fn site_config_validation() {
        let defaults = DefaultsConfig::default();
        let profile = SiteProfile {
            name: "broken".into(),
            sitemap_url: String::new(),
            output_path: "out.md".into(),
            doc_title: None,
            max_concurrent: None,
            request_delay_ms: None,
            content_selectors: vec![],
            title_strip: None,
            code_fence_default: None,
            serialize_tables: false,
            anchor_with_section: false,
        };

        let site = SiteConfig::from_profile(&defaults, &profile);
        let err = site.validate().unwrap_err();
        assert!(err.to_string().contains("sitemap_url"));
    }
}
