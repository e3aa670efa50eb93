//! Lenient field deserializers for partial edit bodies.
//!
//! Edit and create bodies come from generated JSON. A list or map field holding the
//! wrong JSON shape deserializes as `None` instead of failing the whole body, so the
//! caller decides the fallback (empty on create, existing value on edit).

use std::collections::BTreeMap;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrOther<T> {
    List(Vec<T>),
    Other(IgnoredAny),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MapOrOther<V> {
    Map(BTreeMap<String, V>),
    Other(IgnoredAny),
}

/// `Some(list)` when the field holds a list, `None` for any other shape.
pub fn list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(match ListOrOther::<T>::deserialize(deserializer)? {
        ListOrOther::List(items) => Some(items),
        ListOrOther::Other(_) => None,
    })
}

/// `Some(map)` when the field holds an object, `None` for any other shape.
pub fn map<'de, D, V>(deserializer: D) -> Result<Option<BTreeMap<String, V>>, D::Error>
where
    D: Deserializer<'de>,
    V: Deserialize<'de>,
{
    Ok(match MapOrOther::<V>::deserialize(deserializer)? {
        MapOrOther::Map(entries) => Some(entries),
        MapOrOther::Other(_) => None,
    })
}

/// Tells an explicit `null` apart from an absent field: `Some(None)` clears.
///
/// Pair with `#[serde(default)]` so a missing field stays `None`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Body {
        #[serde(default, deserialize_with = "list")]
        items: Option<Vec<String>>,
        #[serde(default, deserialize_with = "map")]
        tags: Option<BTreeMap<String, u32>>,
    }

    #[test]
    fn list_accepts_arrays() {
        let body: Body = serde_json::from_str(r#"{"items": ["a", "b"]}"#).unwrap();
        assert_eq!(body.items, Some(vec!["a".to_string(), "b".to_string()]));
    }

    #[test]
    fn non_list_shapes_become_none() {
        for raw in [r#"{"items": "a"}"#, r#"{"items": null}"#, r#"{"items": {"x": 1}}"#, "{}"] {
            let body: Body = serde_json::from_str(raw).unwrap();
            assert_eq!(body.items, None, "{raw}");
        }
    }

    #[test]
    fn map_rejects_arrays() {
        let body: Body = serde_json::from_str(r#"{"tags": [1, 2]}"#).unwrap();
        assert_eq!(body.tags, None);

        let body: Body = serde_json::from_str(r#"{"tags": {"a": 1}}"#).unwrap();
        assert_eq!(body.tags.unwrap().get("a"), Some(&1));
    }
}
