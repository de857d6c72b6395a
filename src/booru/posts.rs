//! Post-search mappers, one per API family

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

use super::{
    aspect_ratio, file_ext_from_url, first_str, flag, post_id, str_field, tag_object_names,
    truthy, u64_field, working_image_source, wrapped_array, NormalizeOptions, PostId, PostRecord,
};

/// Host prefixed to relative paheal preview paths
const PAHEAL_BASE: &str = "https://rule34.paheal.net";

/// Extensions zerochan may serve full images as, after `.jpg`
const ZEROCHAN_FALLBACK_EXTS: [&str; 4] = [".png", ".gif", ".jpeg", ".webp"];

/// Tag categories e621 splits tags into, in output order
const E621_TAG_GROUPS: [&str; 5] = ["general", "species", "character", "artist", "copyright"];

lazy_static! {
    static ref RE_XML_TAG: Regex = Regex::new(r"<tag\s([^>]*?)/?>").unwrap();
    static ref RE_XML_ATTR: Regex =
        Regex::new(r#"([A-Za-z_][\w.-]*)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap();
    /// Leading digit run of a numeric attribute ("800px" -> 800)
    static ref RE_LEADING_DIGITS: Regex = Regex::new(r"^\s*\+?(\d+)").unwrap();
}

/// Fields common to every family's record; callers fill in the rest
fn base_record(id: PostId, width: u64, height: u64, file_url: &str) -> PostRecord {
    PostRecord {
        id,
        width,
        height,
        aspect_ratio: aspect_ratio(width, height),
        tags: String::new(),
        rating: "s".to_string(),
        is_nsfw: false,
        md5: String::new(),
        preview_url: file_url.to_string(),
        sample_url: file_url.to_string(),
        file_url: file_url.to_string(),
        file_url_fallbacks: Vec::new(),
        file_ext: file_ext_from_url(file_url),
        file_size: None,
        source: file_url.to_string(),
    }
}

fn source_or(item: &Value, key: &str, fallback: &str) -> String {
    working_image_source(str_field(item, key))
        .unwrap_or(fallback)
        .to_string()
}

fn or_file(value: Option<&str>, file_url: &str) -> String {
    value.unwrap_or(file_url).to_string()
}

// ============================================================================
// Moebooru / Danbooru / Gelbooru
// ============================================================================

pub(super) fn moebooru(raw: &Value) -> Vec<PostRecord> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let file_url = str_field(item, "file_url")?;
            let width = u64_field(item, "width").unwrap_or(0);
            let height = u64_field(item, "height").unwrap_or(0);
            let raw_rating = str_field(item, "rating");

            let mut post = base_record(post_id(item, "id", 0), width, height, file_url);
            post.tags = str_field(item, "tags").unwrap_or_default().to_string();
            post.rating = raw_rating.unwrap_or("s").to_string();
            // Unrated posts display as "s" but are not trusted as safe
            post.is_nsfw = raw_rating != Some("s");
            post.md5 = str_field(item, "md5").unwrap_or_default().to_string();
            post.preview_url = or_file(str_field(item, "preview_url"), file_url);
            post.sample_url = or_file(str_field(item, "sample_url"), file_url);
            if let Some(ext) = str_field(item, "file_ext") {
                post.file_ext = ext.to_string();
            }
            post.source = source_or(item, "source", file_url);
            Some(post)
        })
        .collect()
}

pub(super) fn danbooru(raw: &Value) -> Vec<PostRecord> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let file_url = str_field(item, "file_url")?;
            if flag(item, "is_deleted") || flag(item, "is_banned") {
                return None;
            }
            let width = u64_field(item, "image_width").unwrap_or(0);
            let height = u64_field(item, "image_height").unwrap_or(0);
            let rating = str_field(item, "rating").unwrap_or("s");

            let mut post = base_record(post_id(item, "id", 0), width, height, file_url);
            post.tags = str_field(item, "tag_string").unwrap_or_default().to_string();
            post.rating = rating.to_string();
            post.is_nsfw = rating == "q" || rating == "e";
            post.md5 = str_field(item, "md5").unwrap_or_default().to_string();
            post.preview_url = or_file(str_field(item, "preview_file_url"), file_url);
            post.sample_url = or_file(str_field(item, "large_file_url"), file_url);
            if let Some(ext) = str_field(item, "file_ext") {
                post.file_ext = ext.to_string();
            }
            post.source = source_or(item, "source", file_url);
            Some(post)
        })
        .collect()
}

/// Gelbooru ratings are words ("general", "questionable"); keep the initial
fn gelbooru_rating(item: &Value) -> String {
    str_field(item, "rating")
        .map(|r| r.replacen("general", "s", 1))
        .and_then(|r| r.chars().next())
        .unwrap_or('s')
        .to_string()
}

fn gelbooru_like(items: &[Value], forced_rating: Option<&str>) -> Vec<PostRecord> {
    items
        .iter()
        .filter_map(|item| {
            let file_url = str_field(item, "file_url")?;
            let width = u64_field(item, "width").unwrap_or(0);
            let height = u64_field(item, "height").unwrap_or(0);
            let rating = match forced_rating {
                Some(r) => r.to_string(),
                None => gelbooru_rating(item),
            };

            let mut post = base_record(post_id(item, "id", 0), width, height, file_url);
            post.tags = str_field(item, "tags").unwrap_or_default().to_string();
            post.is_nsfw = rating != "s";
            post.rating = rating;
            post.md5 = first_str(item, &["md5", "hash"]).unwrap_or_default().to_string();
            post.preview_url = or_file(str_field(item, "preview_url"), file_url);
            post.sample_url = or_file(str_field(item, "sample_url"), file_url);
            post.source = source_or(item, "source", file_url);
            Some(post)
        })
        .collect()
}

/// gelbooru.com wraps posts in `.post`; safebooru and tbib return a bare array
pub(super) fn gelbooru(raw: &Value) -> Vec<PostRecord> {
    match wrapped_array(raw, "post") {
        Some(items) => gelbooru_like(items, None),
        None => Vec::new(),
    }
}

/// rule34-style boards: everything is explicit
pub(super) fn gelbooru_nsfw(raw: &Value) -> Vec<PostRecord> {
    // Auth failures come back as a bare string
    if let Some(message) = raw.as_str() {
        warn!("Gelbooru auth error: {}", message);
        return Vec::new();
    }
    match raw.as_array() {
        Some(items) => gelbooru_like(items, Some("e")),
        None => Vec::new(),
    }
}

// ============================================================================
// e621 / Philomena
// ============================================================================

pub(super) fn e621(raw: &Value, opts: &NormalizeOptions) -> Vec<PostRecord> {
    let Some(items) = raw.get("posts").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let file = item.get("file")?;
            let file_url = str_field(file, "url")?;
            let width = u64_field(file, "width").unwrap_or(0);
            let height = u64_field(file, "height").unwrap_or(0);
            let rating = str_field(item, "rating").unwrap_or("s");

            let tags = item
                .get("tags")
                .map(|groups| {
                    E621_TAG_GROUPS
                        .iter()
                        .filter_map(|g| groups.get(*g).and_then(Value::as_array))
                        .flatten()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .unwrap_or_default();

            let first_source = item
                .get("sources")
                .and_then(Value::as_array)
                .and_then(|s| s.first())
                .and_then(Value::as_str);

            let mut post = base_record(post_id(item, "id", 0), width, height, file_url);
            post.tags = tags;
            post.rating = rating.to_string();
            post.is_nsfw = !opts.sfw_only && (rating == "q" || rating == "e");
            post.md5 = str_field(file, "md5").unwrap_or_default().to_string();
            post.preview_url = or_file(item.get("preview").and_then(|p| str_field(p, "url")), file_url);
            post.sample_url = or_file(item.get("sample").and_then(|s| str_field(s, "url")), file_url);
            post.file_ext = str_field(file, "ext").unwrap_or("jpg").to_string();
            post.source = working_image_source(first_source)
                .unwrap_or(file_url)
                .to_string();
            Some(post)
        })
        .collect()
}

pub(super) fn philomena(raw: &Value) -> Vec<PostRecord> {
    let Some(items) = raw.get("images").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let view_url = str_field(item, "view_url")?;
            let width = u64_field(item, "width").unwrap_or(0);
            let height = u64_field(item, "height").unwrap_or(0);

            let tag_list: Vec<&str> = item
                .get("tags")
                .and_then(Value::as_array)
                .map(|t| t.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();
            let rating = if tag_list.contains(&"explicit") {
                "e"
            } else if tag_list.contains(&"questionable") || tag_list.contains(&"suggestive") {
                "q"
            } else {
                "s"
            };

            let reps = item.get("representations").filter(|r| truthy(r));

            let mut post = base_record(post_id(item, "id", 0), width, height, view_url);
            post.tags = tag_list.join(" ");
            post.rating = rating.to_string();
            post.is_nsfw = rating != "s";
            post.md5 = str_field(item, "sha512_hash")
                .map(|h| h.chars().take(32).collect())
                .unwrap_or_default();
            post.preview_url = or_file(reps.and_then(|r| str_field(r, "thumb")), view_url);
            post.sample_url = or_file(reps.and_then(|r| str_field(r, "large")), view_url);
            if let Some(format) = str_field(item, "format") {
                post.file_ext = format.to_string();
            }
            post.source = or_file(str_field(item, "source_url"), view_url);
            Some(post)
        })
        .collect()
}

// ============================================================================
// Shimmie (XML)
// ============================================================================

fn unescape_xml(s: &str) -> String {
    s.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Map a paheal XML listing (`<posts><tag file_url=".." .../></posts>`)
pub fn parse_shimmie_xml(xml: &str) -> Vec<PostRecord> {
    RE_XML_TAG
        .captures_iter(xml)
        .filter_map(|caps| {
            let attrs: HashMap<&str, String> = RE_XML_ATTR
                .captures_iter(caps.get(1)?.as_str())
                .filter_map(|a| {
                    let value = a.get(2).or_else(|| a.get(3))?;
                    Some((a.get(1)?.as_str(), unescape_xml(value.as_str())))
                })
                .collect();
            let attr = |k: &str| attrs.get(k).map(String::as_str).filter(|v| !v.is_empty());
            let num = |k: &str| {
                attr(k)
                    .and_then(|v| RE_LEADING_DIGITS.captures(v))
                    .and_then(|c| c[1].parse::<u64>().ok())
                    .unwrap_or(0)
            };

            let file_url = attr("file_url")?;
            let preview_url = match attr("preview_url") {
                Some(p) if p.starts_with("http") => p.to_string(),
                p => format!("{}{}", PAHEAL_BASE, p.unwrap_or_default()),
            };

            let mut post = base_record(PostId::Num(num("id")), num("width"), num("height"), file_url);
            post.tags = attr("tags").unwrap_or_default().to_string();
            post.rating = "e".to_string();
            post.is_nsfw = true;
            post.md5 = attr("md5").unwrap_or_default().to_string();
            post.preview_url = preview_url;
            post.file_ext = file_ext_from_url(attr("file_name").unwrap_or("unknown.jpg"));
            Some(post)
        })
        .collect()
}

// ============================================================================
// Wallpaper / Single-Image APIs
// ============================================================================

pub(super) fn wallhaven(raw: &Value) -> Vec<PostRecord> {
    let Some(items) = raw.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let path = str_field(item, "path")?;
            let width = u64_field(item, "dimension_x").unwrap_or(0);
            let height = u64_field(item, "dimension_y").unwrap_or(0);
            let id = post_id(item, "id", i as u64);
            let purity = str_field(item, "purity");
            let thumbs = item.get("thumbs");

            let mut post = base_record(id.clone(), width, height, path);
            post.tags = tag_object_names(item, "tags");
            post.rating = match purity {
                Some("sfw") => "s",
                Some("sketchy") => "q",
                _ => "e",
            }
            .to_string();
            post.is_nsfw = purity == Some("nsfw");
            post.md5 = if item.get("id").is_some_and(truthy) {
                id.to_string()
            } else {
                String::new()
            };
            post.preview_url = or_file(thumbs.and_then(|t| str_field(t, "small")), path);
            post.sample_url = or_file(thumbs.and_then(|t| str_field(t, "large")), path);
            post.source = or_file(str_field(item, "source"), path);
            Some(post)
        })
        .collect()
}

pub(super) fn waifu_im(raw: &Value) -> Vec<PostRecord> {
    let Some(items) = raw.get("images").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let url = str_field(item, "url")?;
            let width = u64_field(item, "width").unwrap_or(0);
            let height = u64_field(item, "height").unwrap_or(0);
            let nsfw = flag(item, "is_nsfw");

            let mut post = base_record(post_id(item, "image_id", i as u64), width, height, url);
            post.tags = tag_object_names(item, "tags");
            post.rating = if nsfw { "e" } else { "s" }.to_string();
            post.is_nsfw = nsfw;
            post.md5 = str_field(item, "md5").unwrap_or_default().to_string();
            post.preview_url = or_file(str_field(item, "sample_url"), url);
            post.file_ext = str_field(item, "extension").unwrap_or("jpg").to_string();
            post.source = source_or(item, "source", url);
            Some(post)
        })
        .collect()
}

/// nekos.best gives no dimensions; assume square
const NEKOS_BEST_SIZE: u64 = 1000;

pub(super) fn nekos_best(raw: &Value) -> Vec<PostRecord> {
    let Some(items) = raw.get("results").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| {
            let url = str_field(item, "url")?;
            let ext = file_ext_from_url(url);
            let path = match url.find('?') {
                Some(idx) if idx > 0 => &url[..idx],
                _ => url,
            };
            let file_name = path.rsplit('/').next().unwrap_or_default();
            let stem = file_name.replacen(&format!(".{}", ext), "", 1);

            let mut post = base_record(PostId::Num(i as u64), NEKOS_BEST_SIZE, NEKOS_BEST_SIZE, url);
            post.tags = "neko anime".to_string();
            post.md5 = stem;
            post.file_ext = ext;
            post.source = or_file(str_field(item, "source_url"), url);
            Some(post)
        })
        .collect()
}

// ============================================================================
// Zerochan / Sankaku
// ============================================================================

pub(super) fn zerochan(raw: &Value) -> Vec<PostRecord> {
    let Some(items) = raw.get("items").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .enumerate()
        .filter(|(_, item)| truthy(item))
        .map(|(i, item)| {
            // URLs are derived from the main tag with spaces turned into dots
            let main_tag = str_field(item, "tag").unwrap_or("Image").replace(' ', ".");
            let id = post_id(item, "id", i as u64);
            let width = u64_field(item, "width").unwrap_or(0);
            let height = u64_field(item, "height").unwrap_or(0);

            let base_full = format!("https://static.zerochan.net/{}.full.{}", main_tag, id);
            let full_jpg = format!("{}.jpg", base_full);

            let mut tags: Vec<&str> = str_field(item, "tag").into_iter().collect();
            if let Some(extra) = item.get("tags").and_then(Value::as_array) {
                tags.extend(extra.iter().filter_map(Value::as_str));
            }

            let mut post = base_record(id.clone(), width, height, &full_jpg);
            post.tags = tags.join(" ");
            post.md5 = str_field(item, "md5").unwrap_or_default().to_string();
            post.preview_url = str_field(item, "thumbnail")
                .map(str::to_string)
                .unwrap_or_else(|| format!("https://s3.zerochan.net/240/00/00/{}.jpg", id));
            post.sample_url = format!("https://s1.zerochan.net/{}.600.{}.jpg", main_tag, id);
            post.file_url_fallbacks = ZEROCHAN_FALLBACK_EXTS
                .iter()
                .map(|ext| format!("{}{}", base_full, ext))
                .collect();
            post.file_ext = "jpg".to_string();
            post.source = str_field(item, "source")
                .map(str::to_string)
                .unwrap_or_else(|| format!("https://www.zerochan.net/{}", id));
            post
        })
        .collect()
}

pub(super) fn sankaku(raw: &Value) -> Vec<PostRecord> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let file_url = str_field(item, "file_url")?;
            // URLs are withheld for login-only posts
            if flag(item, "redirect_to_signup") {
                return None;
            }
            let width = u64_field(item, "width").unwrap_or(0);
            let height = u64_field(item, "height").unwrap_or(0);
            let raw_rating = str_field(item, "rating");
            let ext = str_field(item, "file_ext")
                .map(str::to_string)
                .unwrap_or_else(|| file_ext_from_url(file_url));
            let is_video = str_field(item, "file_type").is_some_and(|t| t.contains("video"))
                || ext == "mp4"
                || ext == "webm";

            // Video previews are AVIF and get converted downstream; images use the WebP sample
            let preview_url = if is_video {
                or_file(str_field(item, "preview_url"), file_url)
            } else {
                or_file(str_field(item, "sample_url"), file_url)
            };

            let mut post = base_record(post_id(item, "id", 0), width, height, file_url);
            post.tags = tag_object_names(item, "tags");
            post.rating = raw_rating.unwrap_or("s").to_string();
            post.is_nsfw = raw_rating != Some("s");
            post.md5 = str_field(item, "md5").unwrap_or_default().to_string();
            post.preview_url = preview_url;
            post.sample_url = or_file(str_field(item, "sample_url"), file_url);
            post.file_ext = ext;
            post.file_size = Some(u64_field(item, "file_size").unwrap_or(0));
            post.source = source_or(item, "source", file_url);
            Some(post)
        })
        .collect()
}
