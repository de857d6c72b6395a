//! End-to-end: normalize a tag search, then rank its names against a query

use booru_sidebar_kit::booru::{normalize_posts, normalize_tags, ApiFamily, NormalizeOptions};
use booru_sidebar_kit::{
    best_match, compute_score, compute_text_match_score, levenshtein_distance, partial_ratio,
    rank_candidates, Confidence, RankOptions, Scorer,
};
use serde_json::json;

#[test]
fn test_documented_properties() {
    assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    assert_eq!(levenshtein_distance("", "abc"), 3);
    assert_eq!(levenshtein_distance("abc", ""), 3);
    assert_eq!(partial_ratio("cat", "concatenate"), 1.0);
    assert_eq!(partial_ratio("", "anything"), 1.0);
    assert_eq!(compute_score("", ""), 1.0);
    assert!(compute_text_match_score("cat", "category") > compute_text_match_score("cat", "dog"));
    assert!(compute_score("abcdef", "abcxyz") > compute_score("abcdef", "xyzabc"));
}

#[test]
fn test_autocomplete_ranking_from_danbooru_tags() {
    let raw = json!([
        { "name": "cat_ears", "post_count": 250000 },
        { "name": "cat_tail", "post_count": 90000 },
        { "name": "dog_ears", "post_count": 40000 },
        { "name": "catgirl", "post_count": 3000 },
        { "name": "scathach_(fate)", "post_count": 12000 }
    ]);
    let tags = normalize_tags(ApiFamily::Danbooru, &raw).unwrap();
    let names: Vec<String> = tags.into_iter().map(|t| t.name).collect();

    let opts = RankOptions {
        scorer: Scorer::Text,
        min_score: 0.5,
        limit: 3,
        ..RankOptions::default()
    };
    let ranked = rank_candidates("cat", &names, &opts);

    assert_eq!(ranked.len(), 3);
    assert!(ranked.iter().all(|m| m.candidate.contains("cat")));
    assert!(ranked.iter().all(|m| m.confidence != Confidence::Low));
    // Shortest containing tag wins on whole-string similarity
    assert_eq!(ranked[0].candidate, "catgirl");
}

#[test]
fn test_near_duplicate_detection() {
    let titles = vec!["Blue Archive", "Blue Arhcive", "Azur Lane", "Arknights"];
    let best = best_match("Blue Archive ", &titles[1..], Scorer::General).unwrap();
    assert_eq!(best.candidate, "Blue Arhcive");
}

#[test]
fn test_posts_serialize_without_optional_fields() {
    let raw = json!([{ "id": 1, "file_url": "https://files.yande.re/a.png", "width": 10, "height": 10 }]);
    let posts = normalize_posts(ApiFamily::Moebooru, &raw, &NormalizeOptions::default());
    let value = serde_json::to_value(&posts).unwrap();
    assert!(value[0].get("file_url_fallbacks").is_none());
    assert!(value[0].get("file_size").is_none());
    assert_eq!(value[0]["id"], 1);
    assert_eq!(value[0]["file_ext"], "png");
}
