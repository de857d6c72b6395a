//! String helpers for labels, URLs and rich-text fields

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref RE_PLACEHOLDER: Regex = Regex::new(r"\{(\d+)\}").unwrap();
    static ref RE_DOMAIN: Regex = Regex::new(r"^(?:https?://)?(?:www\.)?([^/]+)").unwrap();
    static ref RE_BASE_URL: Regex = Regex::new(r"^(https?://[^/]+)(/.*)?$").unwrap();
}

/// Replace `{N}` placeholders with `args[N]`.
///
/// Placeholders without a matching argument are left as written.
pub fn format_template<S: AsRef<str>>(template: &str, args: &[S]) -> String {
    RE_PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            caps[1]
                .parse::<usize>()
                .ok()
                .and_then(|i| args.get(i))
                .map(|a| a.as_ref().to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Host part of `url`, without scheme or a leading `www.`
pub fn domain(url: &str) -> Option<&str> {
    RE_DOMAIN
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// `scheme://host` of an http(s) URL
pub fn base_url(url: &str) -> Option<&str> {
    RE_BASE_URL
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Escape single quotes for embedding in a single-quoted shell string
pub fn shell_single_quote_escape(s: &str) -> String {
    s.replace('\'', r"'\''")
}

/// Escape the five HTML-significant characters
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
