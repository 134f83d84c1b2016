//! Content scraper: download a linked page and pull out its main article text.
//! Any failure collapses to the `NOT_AVAILABLE` sentinel.

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use scraper::{Html, Selector};
use std::time::Duration;

pub const NOT_AVAILABLE: &str = "Not Available";

/// URL -> article text. Errors are reported, not hidden; `scrape_content`
/// is what maps them to the sentinel.
pub trait ArticleExtractor: Send + Sync {
    fn extract(&self, url: &str) -> Result<String>;
}

/// Fetches HTML over HTTP and extracts paragraph text.
pub struct HtmlArticleExtractor {
    client: Client,
}

impl HtmlArticleExtractor {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .context("building scraper HTTP client")?;
        Ok(Self { client })
    }
}

impl ArticleExtractor for HtmlArticleExtractor {
    fn extract(&self, url: &str) -> Result<String> {
        if url.trim().is_empty() {
            bail!("empty url");
        }
        let resp = self.client.get(url).send().with_context(|| format!("download {url}"))?;
        let resp = resp.error_for_status().with_context(|| format!("download {url}"))?;
        if let Some(ct) = resp.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
            if !ct.to_ascii_lowercase().contains("html") {
                bail!("unsupported content type {ct} at {url}");
            }
        }
        let body = resp.text().with_context(|| format!("read body of {url}"))?;
        extract_main_text(&body)
    }
}

/// Paragraph text of the most specific content container present
/// (`article`, then `main`, then the whole `body`), one paragraph per block,
/// whitespace collapsed, blocks separated by a blank line.
pub fn extract_main_text(html: &str) -> Result<String> {
    let doc = Html::parse_document(html);
    for css in ["article p", "main p", "body p"] {
        let sel = Selector::parse(css).map_err(|e| anyhow!("invalid selector {css}: {e:?}"))?;
        let paragraphs: Vec<String> = doc
            .select(&sel)
            .map(|p| collapse_whitespace(&p.text().collect::<String>()))
            .filter(|t| !t.is_empty())
            .collect();
        if !paragraphs.is_empty() {
            return Ok(paragraphs.join("\n\n"));
        }
    }
    Ok(String::new())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Article text for `url`, or `NOT_AVAILABLE` when extraction fails or
/// yields nothing.
pub fn scrape_content<X: ArticleExtractor + ?Sized>(extractor: &X, url: &str) -> String {
    match extractor.extract(url) {
        Ok(text) if !text.is_empty() => text,
        Ok(_) => {
            tracing::debug!("no article text at {}", url);
            NOT_AVAILABLE.to_string()
        }
        Err(e) => {
            tracing::debug!("scrape failed for {}: {:#}", url, e);
            NOT_AVAILABLE.to_string()
        }
    }
}
