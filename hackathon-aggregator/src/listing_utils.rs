//! Helpers shared by the source adapters and the normalizer.

/// URL utilities for listing links
pub mod url {
    use url::Url;

    /// Accept only absolute http(s) URLs
    pub fn parse_http_url(url_str: &str) -> Option<Url> {
        let url = Url::parse(url_str.trim()).ok()?;
        match url.scheme() {
            "http" | "https" if url.host_str().is_some() => Some(url),
            _ => None,
        }
    }

    /// Resolve a possibly relative href found on `base`
    pub fn resolve(base: &Url, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
            return None;
        }
        base.join(href).ok().map(|u| u.to_string())
    }
}

/// Text cleanup for scraped and fed fields
pub mod text {
    /// Collapse runs of whitespace into single spaces and trim the ends
    pub fn collapse_whitespace(input: &str) -> String {
        input.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Text content of an HTML fragment, entities decoded and tags dropped
    pub fn strip_html(html: &str) -> String {
        let fragment = scraper::Html::parse_fragment(html);
        let text = fragment.root_element().text().collect::<Vec<_>>().join(" ");
        collapse_whitespace(&text)
    }

    /// Lowercase title with punctuation dropped, for duplicate detection
    pub fn fingerprint_title(title: &str) -> String {
        let cleaned: String = title
            .chars()
            .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
            .collect::<String>()
            .to_lowercase();
        collapse_whitespace(&cleaned)
    }
}

/// Prize pool text is display-only; the amount is only read for run
/// statistics
pub mod prize {
    /// Leading whole-unit amount in a prize string such as `$75,000 in cash`
    pub fn leading_amount(prize_pool: &str) -> u64 {
        let digits: String = prize_pool
            .chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit() || *c == ',')
            .filter(char::is_ascii_digit)
            .collect();
        digits.parse().unwrap_or(0)
    }
}
