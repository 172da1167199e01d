//! Dot-path access and form encoding over [`serde_json::Value`] trees.
//!
//! Query arguments, request data and routing parameters are all trees of
//! [`Value`]s. Paths address nested entries with `.` separated keys (`Post.title`,
//! `items.0.name`); list entries are addressed by their index.
//!
//! [`parse_query`] and [`build_query`] convert between such trees and
//! `application/x-www-form-urlencoded` text using bracket keys (`a[b][]=1`).

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use serde_json::{Map, Value};
use tracing::debug;

/// Characters `urlencode` leaves untouched besides ASCII alphanumerics.
const FORM_ENCODE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Looks up a dot-path in a map.
pub fn get<'a>(root: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = root.get(segments.next()?)?;
    segments.try_fold(first, child)
}

/// Looks up a dot-path in a value; only objects and lists have children.
pub fn get_value<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    root.as_object().and_then(|root| get(root, path))
}

/// Writes `value` at a dot-path, creating or replacing intermediate entries.
pub fn insert(root: &mut Map<String, Value>, path: &str, value: Value) {
    let Some((first, rest)) = path.split_once('.') else {
        root.insert(path.to_owned(), value);
        return;
    };

    let mut current = root.entry(first.to_owned()).or_insert(Value::Null);
    for segment in rest.split('.') {
        current = child_mut(current, segment);
    }
    *current = value;
}

/// Like [`insert`], turning a non-object root into an object first.
pub fn insert_value(root: &mut Value, path: &str, value: Value) {
    insert(as_object_mut(root), path, value);
}

/// Deep-merges `source` into `target`.
///
/// Objects merge key by key, lists are appended, anything else in `source` replaces
/// the value in `target`.
pub fn merge(target: &mut Value, source: Value) {
    match (target, source) {
        (Value::Object(target), Value::Object(source)) => {
            for (key, value) in source {
                match target.get_mut(&key) {
                    Some(existing) if is_container(existing) && is_container(&value) => merge(existing, value),
                    _ => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(target), Value::Array(source)) => target.extend(source),
        (target, source) => *target = source,
    }
}

/// Parses URL-encoded text into a tree.
///
/// Keys are mangled the way form decoding on the server side does it: leading spaces
/// are dropped, `.` and space in the name become `_`. Bracket suffixes build nested
/// objects (`a[b]=1`) and lists (`a[]=1&a[]=2`). A later duplicate key overwrites the
/// earlier value.
pub fn parse_query(query: &str) -> Map<String, Value> {
    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query).unwrap_or_else(|e| {
        debug!(cause = %e, "could not decode url encoded data");
        Vec::new()
    });

    let mut root = Map::new();
    for (key, value) in pairs {
        let Some((name, segments)) = split_query_key(&key) else {
            continue;
        };

        let mut current = root.entry(name).or_insert(Value::Null);
        for segment in segments {
            current = if segment.is_empty() { push_slot(current) } else { child_mut(current, segment) };
        }
        *current = Value::String(value);
    }
    root
}

/// Encodes a tree as URL-encoded text with bracket keys, the inverse of
/// [`parse_query`]. Null values are skipped, booleans become `1` / `0`.
pub fn build_query(args: &Map<String, Value>) -> String {
    let mut pairs = Vec::new();
    for (key, value) in args {
        flatten(key.clone(), value, &mut pairs);
    }
    pairs.iter().map(|(key, value)| format!("{}={}", url_encode(key), url_encode(value))).collect::<Vec<_>>().join("&")
}

/// Decodes `%XX` sequences and `+`.
pub fn url_decode(text: &str) -> String {
    percent_decode_str(&text.replace('+', " ")).decode_utf8_lossy().into_owned()
}

fn url_encode(text: &str) -> String {
    utf8_percent_encode(text, FORM_ENCODE).to_string().replace("%20", "+")
}

/// The text form of a scalar: numbers as written, `true` as `1`, `false` as empty.
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(true) => Some("1".to_owned()),
        Value::Bool(false) => Some(String::new()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Loose equality between scalars: numeric text compares as a number, so `"1"`,
/// `1`, `1.0` and `true` are all equal.
pub fn loose_eq(left: &Value, right: &Value) -> bool {
    if left == right {
        return true;
    }
    match (as_number(left), as_number(right)) {
        (Some(left), Some(right)) => (left - right).abs() < f64::EPSILON,
        _ => match (scalar_string(left), scalar_string(right)) {
            (Some(left), Some(right)) => left == right,
            _ => false,
        },
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn is_container(value: &Value) -> bool {
    value.is_object() || value.is_array()
}

fn child<'a>(value: &'a Value, segment: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(segment),
        Value::Array(list) => segment.parse::<usize>().ok().and_then(|index| list.get(index)),
        _ => None,
    }
}

/// The child at `segment`, created when missing. A list only grows by one entry at a
/// time; any other key turns it into an object keyed by index.
fn child_mut<'a>(value: &'a mut Value, segment: &str) -> &'a mut Value {
    let index = segment.parse::<usize>().ok();
    if value.is_null() && index == Some(0) {
        *value = Value::Array(Vec::new());
    }

    let slot = index.filter(|index| value.as_array().is_some_and(|list| *index <= list.len()));
    match (value, slot) {
        (Value::Array(list), Some(index)) => {
            if index == list.len() {
                list.push(Value::Null);
            }
            &mut list[index]
        }
        (value, _) => as_object_mut(value).entry(segment.to_owned()).or_insert(Value::Null),
    }
}

/// A new slot at the end of a list, or under the next index of an object.
fn push_slot(value: &mut Value) -> &mut Value {
    match value {
        Value::Array(list) => {
            list.push(Value::Null);
            let last = list.len() - 1;
            &mut list[last]
        }
        Value::Object(map) => {
            let key = map.len().to_string();
            map.entry(key).or_insert(Value::Null)
        }
        other => {
            *other = Value::Array(Vec::new());
            push_slot(other)
        }
    }
}

pub(crate) fn as_object_mut(value: &mut Value) -> &mut Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => {
            let map = match other.take() {
                Value::Array(list) => list.into_iter().enumerate().map(|(index, item)| (index.to_string(), item)).collect(),
                _ => Map::new(),
            };
            *other = Value::Object(map);
            as_object_mut(other)
        }
    }
}

/// Splits `a[b][]` into the mangled name `a` and the bracket segments `["b", ""]`.
fn split_query_key(key: &str) -> Option<(String, Vec<&str>)> {
    let key = key.trim_start_matches(' ');
    let (name, mut rest) = match key.find('[') {
        Some(open) if key[open..].contains(']') => (&key[..open], &key[open..]),
        _ => (key, ""),
    };

    let name: String = name.chars().map(|c| if matches!(c, '.' | ' ' | '[') { '_' } else { c }).collect();
    if name.is_empty() {
        return None;
    }

    let mut segments = Vec::new();
    while let Some(group) = rest.strip_prefix('[') {
        let Some(close) = group.find(']') else {
            break;
        };
        segments.push(&group[..close]);
        rest = &group[close + 1..];
    }
    Some((name, segments))
}

fn flatten(prefix: String, value: &Value, pairs: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                flatten(format!("{prefix}[{key}]"), value, pairs);
            }
        }
        Value::Array(list) => {
            for (index, value) in list.iter().enumerate() {
                flatten(format!("{prefix}[{index}]"), value, pairs);
            }
        }
        Value::Null => {}
        Value::Bool(flag) => pairs.push((prefix, if *flag { "1" } else { "0" }.to_owned())),
        Value::Number(number) => pairs.push((prefix, number.to_string())),
        Value::String(text) => pairs.push((prefix, text.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn get_by_path() {
        let root = object(json!({
            "Post": { "title": "hello", "tags": ["a", "b"] },
            "plain": 1,
        }));

        assert_eq!(get(&root, "Post.title"), Some(&json!("hello")));
        assert_eq!(get(&root, "Post.tags.1"), Some(&json!("b")));
        assert_eq!(get(&root, "plain"), Some(&json!(1)));
        assert_eq!(get(&root, "Post.missing"), None);
        assert_eq!(get(&root, "plain.deeper"), None);
        assert_eq!(get(&root, ""), None);
        assert_eq!(get_value(&json!("scalar"), "a"), None);
    }

    #[test]
    fn insert_creates_and_replaces() {
        let mut root = Map::new();
        insert(&mut root, "Post.title", json!("hello"));
        insert(&mut root, "Post.body", json!("text"));
        insert(&mut root, "flag", json!(true));
        assert_eq!(Value::Object(root.clone()), json!({ "Post": { "title": "hello", "body": "text" }, "flag": true }));

        insert(&mut root, "flag.nested", json!(1));
        assert_eq!(get(&root, "flag.nested"), Some(&json!(1)));

        let mut list = json!({ "items": ["a"] });
        insert_value(&mut list, "items.1", json!("b"));
        insert_value(&mut list, "items.0", json!("z"));
        assert_eq!(list, json!({ "items": ["z", "b"] }));

        insert_value(&mut list, "items.name", json!("x"));
        assert_eq!(list, json!({ "items": { "0": "z", "1": "b", "name": "x" } }));
    }

    #[test]
    fn index_segments_build_lists() {
        let mut root = Map::new();
        insert(&mut root, "ids.0", json!("a"));
        insert(&mut root, "ids.1", json!("b"));
        insert(&mut root, "gap.3", json!("c"));
        assert_eq!(Value::Object(root), json!({ "ids": ["a", "b"], "gap": { "3": "c" } }));
    }

    #[test]
    fn merge_trees() {
        let mut target = json!({ "a": 1, "nested": { "x": 1, "y": 2 }, "list": [1] });
        merge(&mut target, json!({ "a": 2, "nested": { "y": 3, "z": 4 }, "list": [2], "new": true }));
        assert_eq!(
            target,
            json!({ "a": 2, "nested": { "x": 1, "y": 3, "z": 4 }, "list": [1, 2], "new": true })
        );
    }

    #[test]
    fn merge_keeps_key_order() {
        let mut target = json!({ "first": 1, "second": 2 });
        merge(&mut target, json!({ "first": 3 }));
        assert_eq!(object(target).keys().collect::<Vec<_>>(), ["first", "second"]);
    }

    #[test]
    fn parse_flat_query() {
        let query = parse_query("a=1&b=hello+world&c=%2Fpath&a=2&empty=&flag");
        assert_eq!(
            Value::Object(query),
            json!({ "a": "2", "b": "hello world", "c": "/path", "empty": "", "flag": "" })
        );
    }

    #[test]
    fn parse_mangles_names() {
        let query = parse_query("user.name=bob&first+name=x&%20lead=1&broken[key=2");
        assert_eq!(get(&query, "user_name"), Some(&json!("bob")));
        assert_eq!(get(&query, "first_name"), Some(&json!("x")));
        assert_eq!(get(&query, "lead"), Some(&json!("1")));
        assert_eq!(get(&query, "broken_key"), Some(&json!("2")));
    }

    #[test]
    fn parse_bracket_keys() {
        let query = parse_query("data[Post][title]=hi&data[Post][tags][]=a&data[Post][tags][]=b&ids[0]=7&ids[1]=8");
        assert_eq!(
            Value::Object(query),
            json!({
                "data": { "Post": { "title": "hi", "tags": ["a", "b"] } },
                "ids": ["7", "8"],
            })
        );
    }

    #[test]
    fn build_query_string() {
        let args = object(json!({
            "q": "a b",
            "page": 2,
            "filter": { "tags": ["x", "y&z"] },
            "skip": null,
            "on": true,
        }));
        assert_eq!(
            build_query(&args),
            "q=a+b&page=2&filter%5Btags%5D%5B0%5D=x&filter%5Btags%5D%5B1%5D=y%26z&on=1"
        );
        assert_eq!(build_query(&Map::new()), "");
    }

    #[test]
    fn loose_equality() {
        assert!(loose_eq(&json!(1), &json!("1")));
        assert!(loose_eq(&json!(true), &json!(1)));
        assert!(loose_eq(&json!("1.0"), &json!(1)));
        assert!(loose_eq(&json!("json"), &json!("json")));
        assert!(!loose_eq(&json!("json"), &json!("xml")));
        assert!(!loose_eq(&json!(null), &json!(1)));
        assert!(!loose_eq(&json!([1]), &json!(1)));
    }

    #[test]
    fn decode() {
        assert_eq!(url_decode("a+b%2Fc"), "a b/c");
        assert_eq!(scalar_string(&json!(false)), Some(String::new()));
        assert_eq!(scalar_string(&json!(12)), Some("12".to_owned()));
    }
}
