//! URL dereferencing for speech.
//!
//! Reading a raw URL aloud is useless, so message text has each URL replaced
//! with a human-readable page title before normalization. Title lookups go
//! through a [`TitleResolver`] so the network client stays at the seam, and
//! results are memoized in an explicit bounded LRU cache owned by the
//! rewriter. Every fetch failure degrades to the URL's domain name.

use std::io::Read;
use std::time::Duration;

use anyhow::Result;
use regex::Regex;

/// Bytes of the response body read when hunting for a title.
const TITLE_SCAN_BYTES: u64 = 65_536;

/// Resolves a URL to a preferred page title, if one can be found.
pub trait TitleResolver {
    /// Return the page title, or `None` on any failure. Implementations must
    /// not block longer than their configured timeout.
    fn resolve(&self, url: &str) -> Option<String>;
}

/// HTTP title resolver: prefers the `og:title` metadata (what iMessage link
/// previews use), then the `<title>` element.
pub struct HttpTitleResolver {
    client: reqwest::blocking::Client,
    og_title_forward: Regex,
    og_title_reverse: Regex,
    title_tag: Regex,
}

impl HttpTitleResolver {
    /// Build a resolver with a per-request timeout in seconds.
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent("Mozilla/5.0")
            .build()?;

        let og_title_forward = Regex::new(
            r#"(?i)<meta\s[^>]*property=["']og:title["']\s[^>]*content=["']([^"']+)["']"#,
        )
        .map_err(|e| anyhow::anyhow!("Failed to compile og:title regex: {e}"))?;
        let og_title_reverse = Regex::new(
            r#"(?i)<meta\s[^>]*content=["']([^"']+)["']\s[^>]*property=["']og:title["']"#,
        )
        .map_err(|e| anyhow::anyhow!("Failed to compile og:title regex: {e}"))?;
        let title_tag = Regex::new(r"(?i)<title[^>]*>([^<]+)</title>")
            .map_err(|e| anyhow::anyhow!("Failed to compile title regex: {e}"))?;

        Ok(Self {
            client,
            og_title_forward,
            og_title_reverse,
            title_tag,
        })
    }

    fn extract_title(&self, html: &str) -> Option<String> {
        self.og_title_forward
            .captures(html)
            .or_else(|| self.og_title_reverse.captures(html))
            .or_else(|| self.title_tag.captures(html))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

impl TitleResolver for HttpTitleResolver {
    fn resolve(&self, url: &str) -> Option<String> {
        let response = self.client.get(url).send().ok()?;
        let mut html = String::new();
        // Titles live near the top of the document; a bounded prefix is enough
        let mut reader = response.take(TITLE_SCAN_BYTES);
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).ok()?;
        html.push_str(&String::from_utf8_lossy(&buf));
        self.extract_title(&html)
    }
}

/// Fixed-capacity least-recently-used cache of URL title lookups.
///
/// Failed lookups are cached too; a URL that timed out once should not stall
/// the run again.
pub struct UrlTitleCache {
    capacity: usize,
    entries: Vec<(String, Option<String>)>,
}

impl UrlTitleCache {
    /// Create a cache holding at most `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: Vec::new(),
        }
    }

    /// Look up a URL, refreshing its recency on a hit.
    pub fn get(&mut self, url: &str) -> Option<Option<String>> {
        let pos = self.entries.iter().position(|(key, _)| key == url)?;
        let entry = self.entries.remove(pos);
        let value = entry.1.clone();
        self.entries.push(entry);
        Some(value)
    }

    /// Insert a lookup result, evicting the least-recently-used entry at
    /// capacity.
    pub fn insert(&mut self, url: &str, title: Option<String>) {
        if let Some(pos) = self.entries.iter().position(|(key, _)| key == url) {
            self.entries.remove(pos);
        }
        self.entries.push((url.to_string(), title));
        while self.entries.len() > self.capacity {
            self.entries.remove(0);
        }
    }

    /// Number of cached lookups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing has been cached yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Rewrites URLs inside message text into readable link titles.
pub struct UrlRewriter<R: TitleResolver> {
    resolver: R,
    cache: UrlTitleCache,
    url_regex: Regex,
}

impl<R: TitleResolver> UrlRewriter<R> {
    /// Build a rewriter around a resolver and a cache capacity.
    pub fn new(resolver: R, cache_capacity: usize) -> Result<Self> {
        let url_regex = Regex::new(r"https?://\S+")
            .map_err(|e| anyhow::anyhow!("Failed to compile URL regex: {e}"))?;
        Ok(Self {
            resolver,
            cache: UrlTitleCache::new(cache_capacity),
            url_regex,
        })
    }

    /// Replace every URL in `text` with a readable label.
    ///
    /// A message that is nothing but URLs becomes "Check out this link: "
    /// followed by the comma-joined titles; otherwise each URL is replaced in
    /// place with "this link: {title}".
    pub fn rewrite(&mut self, text: &str) -> String {
        let urls: Vec<String> = self
            .url_regex
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect();
        if urls.is_empty() {
            return text.to_string();
        }

        let without_urls = self.url_regex.replace_all(text, "").trim().to_string();

        let titles: Vec<String> = urls
            .iter()
            .map(|url| {
                self.resolve_cached(url)
                    .unwrap_or_else(|| domain_of(url))
            })
            .collect();

        if without_urls.is_empty() {
            return format!("Check out this link: {}", titles.join(", "));
        }

        let mut result = text.to_string();
        for (url, title) in urls.iter().zip(titles.iter()) {
            result = result.replace(url, &format!("this link: {title}"));
        }
        result
    }

    fn resolve_cached(&mut self, url: &str) -> Option<String> {
        if let Some(cached) = self.cache.get(url) {
            return cached;
        }
        let title = self.resolver.resolve(url);
        self.cache.insert(url, title.clone());
        title
    }

    /// Read access to the cache, mainly for inspection in tests.
    #[must_use]
    pub fn cache(&self) -> &UrlTitleCache {
        &self.cache
    }
}

/// Domain-name fallback for a URL with no resolvable title.
fn domain_of(url: &str) -> String {
    let after_scheme = url
        .split_once("://")
        .map_or(url, |(_, rest)| rest);
    let host = after_scheme
        .split(['/', '?', '#'])
        .next()
        .unwrap_or(after_scheme);
    host.strip_prefix("www.").unwrap_or(host).to_string()
}
