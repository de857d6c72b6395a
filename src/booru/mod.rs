//! Booru response normalizers
//!
//! Every supported image board belongs to an API family that shares one
//! response format. The mappers here turn a raw family response into the
//! common `PostRecord` / `TagRecord` shapes the sidebar renders.
//!
//! Raw JSON is read leniently: a missing, `null`, `false`, zero or empty field
//! counts as absent and falls back to a default. A response that does not have
//! the expected shape yields an empty list rather than an error.

mod posts;
mod tags;

use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::error::KitError;

pub use posts::parse_shimmie_xml;

// ============================================================================
// Record Types
// ============================================================================

/// Post identifier; most boards use integers, wallhaven uses short strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PostId {
    Num(u64),
    Text(String),
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostId::Num(n) => write!(f, "{}", n),
            PostId::Text(s) => f.write_str(s),
        }
    }
}

/// A post in the sidebar's internal shape
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostRecord {
    pub id: PostId,
    pub width: u64,
    pub height: u64,
    pub aspect_ratio: f64,
    /// Space-separated tag string
    pub tags: String,
    /// Single-letter rating: s, q or e
    pub rating: String,
    pub is_nsfw: bool,
    pub md5: String,
    pub preview_url: String,
    pub sample_url: String,
    pub file_url: String,
    /// Alternative full-size URLs to try when `file_url` 404s (zerochan)
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub file_url_fallbacks: Vec<String>,
    pub file_ext: String,
    /// Bytes, for download progress (sankaku)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    pub source: String,
}

/// A tag suggestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagRecord {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
}

/// Per-call normalizer options
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    /// Never flag posts as NSFW (e926, the SFW e621 mirror)
    pub sfw_only: bool,
}

// ============================================================================
// API Families
// ============================================================================

/// Response format shared by a group of boards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFamily {
    /// yandere, konachan, lolibooru, sakugabooru
    Moebooru,
    /// danbooru, aibooru
    Danbooru,
    /// gelbooru, safebooru, tbib
    Gelbooru,
    /// rule34, xbooru, hypnohub
    GelbooruNsfw,
    /// e621, e926
    E621,
    /// derpibooru, furbooru, ponybooru
    Philomena,
    /// paheal (XML)
    Shimmie,
    Wallhaven,
    WaifuIm,
    NekosBest,
    Zerochan,
    Sankaku,
}

impl ApiFamily {
    pub const ALL: [ApiFamily; 12] = [
        ApiFamily::Moebooru,
        ApiFamily::Danbooru,
        ApiFamily::Gelbooru,
        ApiFamily::GelbooruNsfw,
        ApiFamily::E621,
        ApiFamily::Philomena,
        ApiFamily::Shimmie,
        ApiFamily::Wallhaven,
        ApiFamily::WaifuIm,
        ApiFamily::NekosBest,
        ApiFamily::Zerochan,
        ApiFamily::Sankaku,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApiFamily::Moebooru => "moebooru",
            ApiFamily::Danbooru => "danbooru",
            ApiFamily::Gelbooru => "gelbooru",
            ApiFamily::GelbooruNsfw => "gelbooru_nsfw",
            ApiFamily::E621 => "e621",
            ApiFamily::Philomena => "philomena",
            ApiFamily::Shimmie => "shimmie",
            ApiFamily::Wallhaven => "wallhaven",
            ApiFamily::WaifuIm => "waifu_im",
            ApiFamily::NekosBest => "nekos_best",
            ApiFamily::Zerochan => "zerochan",
            ApiFamily::Sankaku => "sankaku",
        }
    }

    /// Whether responses are XML text rather than JSON
    pub fn is_xml(&self) -> bool {
        matches!(self, ApiFamily::Shimmie)
    }
}

impl fmt::Display for ApiFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiFamily {
    type Err = KitError;

    /// Accepts `gelbooru_nsfw`, `gelbooruNsfw`, `gelbooru-nsfw`, any case
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        ApiFamily::ALL
            .into_iter()
            .find(|f| f.as_str().replace('_', "") == key)
            .ok_or_else(|| KitError::UnknownFamily(s.to_string()))
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Map a raw post-search response to post records.
///
/// For the XML family the response is expected as a JSON string holding the
/// document text.
pub fn normalize_posts(family: ApiFamily, raw: &Value, opts: &NormalizeOptions) -> Vec<PostRecord> {
    let posts = match family {
        ApiFamily::Moebooru => posts::moebooru(raw),
        ApiFamily::Danbooru => posts::danbooru(raw),
        ApiFamily::Gelbooru => posts::gelbooru(raw),
        ApiFamily::GelbooruNsfw => posts::gelbooru_nsfw(raw),
        ApiFamily::E621 => posts::e621(raw, opts),
        ApiFamily::Philomena => posts::philomena(raw),
        ApiFamily::Shimmie => raw.as_str().map(parse_shimmie_xml).unwrap_or_default(),
        ApiFamily::Wallhaven => posts::wallhaven(raw),
        ApiFamily::WaifuIm => posts::waifu_im(raw),
        ApiFamily::NekosBest => posts::nekos_best(raw),
        ApiFamily::Zerochan => posts::zerochan(raw),
        ApiFamily::Sankaku => posts::sankaku(raw),
    };
    debug!("Normalized {} {} posts", posts.len(), family);
    posts
}

/// Parse response text for `family` and map it to post records
pub fn normalize_posts_text(
    family: ApiFamily,
    body: &str,
    opts: &NormalizeOptions,
) -> Result<Vec<PostRecord>, KitError> {
    if family.is_xml() {
        return Ok(parse_shimmie_xml(body));
    }
    let raw: Value = serde_json::from_str(body)?;
    Ok(normalize_posts(family, &raw, opts))
}

/// Map a raw tag-search response to tag records
pub fn normalize_tags(family: ApiFamily, raw: &Value) -> Result<Vec<TagRecord>, KitError> {
    let tags = match family {
        ApiFamily::Moebooru => tags::named_counts(raw, &["name"], &["count"]),
        ApiFamily::Danbooru | ApiFamily::E621 => {
            tags::named_counts(raw, &["name"], &["post_count"])
        }
        ApiFamily::Gelbooru => tags::gelbooru(raw),
        ApiFamily::GelbooruNsfw => tags::autocomplete(raw),
        ApiFamily::Philomena => tags::philomena(raw),
        ApiFamily::Wallhaven => Vec::new(),
        ApiFamily::WaifuIm => tags::waifu_im(raw),
        ApiFamily::Zerochan => tags::named_counts(raw, &["name", "tag"], &["count", "total"]),
        ApiFamily::Sankaku => tags::named_counts(raw, &["name"], &["count", "post_count"]),
        ApiFamily::Shimmie | ApiFamily::NekosBest => {
            return Err(KitError::NoTagEndpoint(family.as_str()))
        }
    };
    debug!("Normalized {} {} tags", tags.len(), family);
    Ok(tags)
}

/// Gelbooru-style autocomplete (`{value, label: "name (123)"}`) for any family
pub fn normalize_autocomplete(raw: &Value) -> Vec<TagRecord> {
    tags::autocomplete(raw)
}

// ============================================================================
// Shared Helpers
// ============================================================================

/// Hosts whose media will not load without a referer or login
const BLOCKED_SOURCE_HOSTS: [&str; 4] = ["twitter.com", "x.com", "pixiv.net", "pximg.net"];

/// Extension used when a URL gives nothing better
const DEFAULT_EXT: &str = "jpg";

/// `source` if it can be displayed directly, otherwise `None`
pub fn working_image_source(source: Option<&str>) -> Option<&str> {
    let source = source.filter(|s| !s.is_empty())?;
    if BLOCKED_SOURCE_HOSTS.iter().any(|h| source.contains(h)) {
        return None;
    }
    Some(source)
}

/// Lower-cased extension of `url`, ignoring any query string
pub fn file_ext_from_url(url: &str) -> String {
    if url.is_empty() {
        return DEFAULT_EXT.to_string();
    }
    // Signed URLs carry the extension before the '?'
    let path = match url.find('?') {
        Some(idx) if idx > 0 => &url[..idx],
        _ => url,
    };
    match path.rsplit('.').next() {
        Some(ext) if !ext.is_empty() => ext.to_lowercase(),
        _ => DEFAULT_EXT.to_string(),
    }
}

fn aspect_ratio(width: u64, height: u64) -> f64 {
    if width > 0 && height > 0 {
        width as f64 / height as f64
    } else {
        1.0
    }
}

/// Array at `value`, or under `key` when `value` wraps it in an object
fn wrapped_array<'a>(value: &'a Value, key: &str) -> Option<&'a Vec<Value>> {
    match value.get(key).filter(|v| truthy(v)) {
        Some(inner) => inner.as_array(),
        None => value.as_array(),
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Non-empty string field
fn str_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// First non-empty string among `keys`
fn first_str<'a>(item: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| str_field(item, k))
}

/// Non-zero unsigned field; numeric strings are accepted
fn u64_field(item: &Value, key: &str) -> Option<u64> {
    let n = match item.get(key)? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    (n != 0).then_some(n)
}

fn first_u64(item: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|k| u64_field(item, k))
}

fn flag(item: &Value, key: &str) -> bool {
    item.get(key).is_some_and(truthy)
}

/// Post id from `key`, falling back to `fallback` when absent
fn post_id(item: &Value, key: &str, fallback: u64) -> PostId {
    match item.get(key) {
        Some(Value::String(s)) if !s.is_empty() => PostId::Text(s.clone()),
        Some(v) if truthy(v) => u64_field(item, key)
            .map(PostId::Num)
            .unwrap_or(PostId::Num(fallback)),
        _ => PostId::Num(fallback),
    }
}

/// Names of `{name: ...}` objects in `item[key]`, space-joined
fn tag_object_names(item: &Value, key: &str) -> String {
    item.get(key)
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(|t| str_field(t, "name"))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default()
}
