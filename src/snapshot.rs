//! Snapshot / apply for object trees held as JSON values
//!
//! A "live" node is a JSON object; a nested node that carries an `objectName`
//! key is treated as a child object and patched in place, everything else is a
//! plain property and is replaced wholesale.

use serde_json::{Map, Value};

/// Key prefixes that belong to the object system rather than user state
const RESERVED_PREFIXES: [&str; 7] = [
    "objectName",
    "children",
    "object",
    "parent",
    "metaObject",
    "destroyed",
    "reloadableId",
];

/// Key marking a nested value as a child object
const OBJECT_MARKER: &str = "objectName";

fn is_reserved(key: &str) -> bool {
    RESERVED_PREFIXES.iter().any(|p| key.starts_with(p))
}

fn is_child_object(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|o| o.contains_key(OBJECT_MARKER))
}

/// Plain, serializable copy of `node` with object-system keys removed
pub fn to_plain_object(node: &Value) -> Value {
    match node {
        Value::Array(items) => Value::Array(items.iter().map(to_plain_object).collect()),
        Value::Object(map) => {
            let plain: Map<String, Value> = map
                .iter()
                .filter(|(k, _)| !is_reserved(k))
                .map(|(k, v)| (k.clone(), to_plain_object(v)))
                .collect();
            Value::Object(plain)
        }
        scalar => scalar.clone(),
    }
}

/// Copy the values in `patch` onto the existing properties of `node`.
///
/// Keys `node` does not already have are skipped. Child objects are patched
/// recursively; a non-object patch value for a child object leaves it as is.
pub fn apply_to_object(node: &mut Value, patch: &Value) {
    let (Some(target), Some(source)) = (node.as_object_mut(), patch.as_object()) else {
        return;
    };

    for (key, incoming) in source {
        let Some(current) = target.get_mut(key) else {
            continue;
        };
        if is_child_object(current) {
            apply_to_object(current, incoming);
        } else {
            *current = incoming.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn live_tree() -> Value {
        json!({
            "objectName": "sidebar",
            "parent": { "objectName": "root" },
            "children": [],
            "reloadableIdSidebar": 4,
            "provider": "yandere",
            "limit": 20,
            "favourites": ["a", "b"],
            "appearance": {
                "objectName": "appearance",
                "columns": 2,
                "metaObjectInfo": "x"
            },
            "extra": { "k": 1 }
        })
    }

    #[test]
    fn test_to_plain_object_filters_reserved() {
        let plain = to_plain_object(&live_tree());
        assert_eq!(
            plain,
            json!({
                "provider": "yandere",
                "limit": 20,
                "favourites": ["a", "b"],
                "appearance": { "columns": 2 },
                "extra": { "k": 1 }
            })
        );
    }

    #[test]
    fn test_to_plain_object_scalars_and_arrays() {
        assert_eq!(to_plain_object(&json!(3)), json!(3));
        assert_eq!(to_plain_object(&Value::Null), Value::Null);
        assert_eq!(
            to_plain_object(&json!([{ "parent": 1, "x": 2 }])),
            json!([{ "x": 2 }])
        );
    }

    #[test]
    fn test_apply_updates_known_keys_only() {
        let mut tree = live_tree();
        apply_to_object(
            &mut tree,
            &json!({
                "provider": "danbooru",
                "unknown": true,
                "favourites": ["c"],
                "appearance": { "columns": 4, "rows": 9 },
                "extra": { "z": 2 }
            }),
        );

        assert_eq!(tree["provider"], "danbooru");
        assert!(tree.get("unknown").is_none());
        assert_eq!(tree["favourites"], json!(["c"]));
        // Child object patched in place
        assert_eq!(tree["appearance"]["objectName"], "appearance");
        assert_eq!(tree["appearance"]["columns"], 4);
        assert!(tree["appearance"].get("rows").is_none());
        // Plain object property replaced wholesale
        assert_eq!(tree["extra"], json!({ "z": 2 }));
    }

    #[test]
    fn test_apply_ignores_non_objects() {
        let mut tree = live_tree();
        let before = tree.clone();
        apply_to_object(&mut tree, &json!("nope"));
        apply_to_object(&mut tree, &Value::Null);
        assert_eq!(tree, before);

        let mut scalar = json!(5);
        apply_to_object(&mut scalar, &json!({ "a": 1 }));
        assert_eq!(scalar, json!(5));
    }

    #[test]
    fn test_round_trip_through_plain_snapshot() {
        let mut tree = live_tree();
        let mut snap = to_plain_object(&tree);
        snap["limit"] = json!(50);
        snap["appearance"]["columns"] = json!(3);
        apply_to_object(&mut tree, &snap);
        assert_eq!(tree["limit"], 50);
        assert_eq!(tree["appearance"]["columns"], 3);
        assert_eq!(tree["objectName"], "sidebar");
    }
}
