//! Article-URL matching and canonicalization.
//!
//! An article URL has the path shape `/<topic-prefix>/<slug>/<numeric-id>`,
//! either relative or as a full `http(s)://(www.)<host>/...` URL. Every
//! discovery strategy goes through [`ArticlePattern`], and every candidate it
//! emits is in [`normalize`]d form, so set membership is enough to deduplicate.

use regex::Regex;
use std::collections::BTreeSet;
use url::Url;

/// Matches article URLs for one site and turns raw links into candidates.
#[derive(Debug, Clone)]
pub struct ArticlePattern {
    regex: Regex,
    site: Url,
}

impl ArticlePattern {
    /// Build the matcher for `site` and its article topic prefix.
    ///
    /// The optional authority in front of the path matches any host, so an
    /// absolute or protocol-relative link is always captured whole and its
    /// host can be checked against the site afterwards.
    ///
    /// # Errors
    ///
    /// Returns the regex error if `topic_prefix` yields an invalid pattern.
    pub fn new(site: &Url, topic_prefix: &str) -> Result<Self, regex::Error> {
        let pattern = format!(
            r#"(?i)(?:(?:https?:)?//[^/\s"'<>?#\\]+)?/{}/[^/\s"'<>?#\\]+/\d+"#,
            regex::escape(topic_prefix),
        );
        Ok(Self {
            regex: Regex::new(&pattern)?,
            site: site.clone(),
        })
    }

    pub fn site(&self) -> &Url {
        &self.site
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }

    /// Turn a link found on `base` (an anchor href, a sitemap `<loc>`, a line of
    /// the fallback file) into a canonical candidate.
    ///
    /// Off-site links are dropped. The result is rebuilt from the matched
    /// article path on the site root, so `www.` variants, query strings,
    /// fragments and trailing path segments collapse onto one entry.
    pub fn candidate(&self, base: &Url, raw: &str) -> Option<String> {
        let absolute = base.join(raw.trim()).ok()?;
        if !self.is_same_site(&absolute) {
            return None;
        }
        let found = self.regex.find(absolute.path())?;
        self.resolve(found.as_str())
    }

    /// Scan raw text (script blocks, inline JSON) for article links.
    ///
    /// Matches carrying a foreign host are dropped, the same as in
    /// [`ArticlePattern::candidate`].
    pub fn scan(&self, text: &str) -> BTreeSet<String> {
        self.regex
            .find_iter(text)
            .filter_map(|m| self.resolve(m.as_str()))
            .collect()
    }

    /// `matched` is either a bare path or carries its own authority; joining
    /// keeps a foreign host, which `is_same_site` then rejects.
    fn resolve(&self, matched: &str) -> Option<String> {
        let absolute = self.site.join(matched).ok()?;
        if !self.is_same_site(&absolute) {
            return None;
        }
        let path = self.regex.find(absolute.path())?.as_str().to_string();
        let mut canonical = self.site.clone();
        canonical.set_path(&path);
        Some(normalize(&canonical))
    }

    /// Same host (ignoring a leading `www.`) and same explicit port as the site.
    pub fn is_same_site(&self, url: &Url) -> bool {
        matches!(url.scheme(), "http" | "https")
            && bare_host(url).is_some()
            && bare_host(url) == bare_host(&self.site)
            && url.port() == self.site.port()
    }
}

fn bare_host(url: &Url) -> Option<&str> {
    url.host_str().map(|h| h.trim_start_matches("www."))
}

/// Reduce a URL to `scheme://host[:port]/path`, without query, fragment or
/// trailing slash.
pub fn normalize(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    let authority = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    format!(
        "{}://{}{}",
        url.scheme(),
        authority,
        url.path().trim_end_matches('/')
    )
}

/// File name for a saved debug page: URL path with slashes replaced by
/// underscores, e.g. `/t/training` -> `debug_t_training.html`.
pub fn debug_file_name(page_url: &str) -> String {
    let path = Url::parse(page_url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| page_url.to_string());
    let name = path.trim_matches('/').replace('/', "_");
    let name = if name.is_empty() { "root" } else { name.as_str() };
    format!("debug_{name}.html")
}
