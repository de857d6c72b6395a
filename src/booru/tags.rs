//! Tag-search mappers

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use super::{first_str, first_u64, str_field, wrapped_array, TagRecord};

lazy_static! {
    /// Post count inside an autocomplete label, e.g. "cat_ears (1234)"
    static ref RE_LABEL_COUNT: Regex = Regex::new(r"\((\d+)\)").unwrap();
}

fn counted(items: &[Value], name_keys: &[&str], count_keys: &[&str]) -> Vec<TagRecord> {
    items
        .iter()
        .map(|item| TagRecord {
            name: first_str(item, name_keys).unwrap_or_default().to_string(),
            count: Some(first_u64(item, count_keys).unwrap_or(0)),
        })
        .collect()
}

/// Top-level array of tag objects; name and count come from the first
/// non-empty key in each list
pub(super) fn named_counts(raw: &Value, name_keys: &[&str], count_keys: &[&str]) -> Vec<TagRecord> {
    match raw.as_array() {
        Some(items) => counted(items, name_keys, count_keys),
        None => Vec::new(),
    }
}

/// Tags under `.tag` (gelbooru.com) or as a bare array
pub(super) fn gelbooru(raw: &Value) -> Vec<TagRecord> {
    match wrapped_array(raw, "tag") {
        Some(items) => counted(items, &["name"], &["count"]),
        None => Vec::new(),
    }
}

/// `[{ "value": "cat_ears", "label": "cat_ears (1234)" }]`
pub(super) fn autocomplete(raw: &Value) -> Vec<TagRecord> {
    let Some(items) = raw.as_array() else {
        return Vec::new();
    };

    items
        .iter()
        .map(|item| {
            let count = str_field(item, "label")
                .and_then(|label| RE_LABEL_COUNT.captures(label))
                .and_then(|c| c[1].parse::<u64>().ok())
                .unwrap_or(0);
            TagRecord {
                name: str_field(item, "value").unwrap_or_default().to_string(),
                count: Some(count),
            }
        })
        .collect()
}

pub(super) fn philomena(raw: &Value) -> Vec<TagRecord> {
    match raw.get("tags").and_then(Value::as_array) {
        Some(items) => counted(items, &["name", "slug"], &["images"]),
        None => Vec::new(),
    }
}

/// waifu.im lists bare tag names under `versatile` and `nsfw`
pub(super) fn waifu_im(raw: &Value) -> Vec<TagRecord> {
    ["versatile", "nsfw"]
        .iter()
        .filter_map(|group| raw.get(*group).and_then(Value::as_array))
        .flatten()
        .filter_map(Value::as_str)
        .map(|name| TagRecord {
            name: name.to_string(),
            count: None,
        })
        .collect()
}
