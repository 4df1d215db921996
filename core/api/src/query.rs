//! Query-string encoding.
//!
//! Encoding follows the rules the API's reference clients use: spaces
//! become `%20` (never `+`), and only `A-Z a-z 0-9 - _ . ! ~ * ' ( )` are
//! left unescaped. Arrays repeat their key; nested objects flatten to
//! `key[sub]`.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::{Map, Value};

/// Characters escaped in query keys and values.
const QUERY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a single key or value.
pub fn escape(s: &str) -> String {
    utf8_percent_encode(s, QUERY_ESCAPE).to_string()
}

/// Encode a JSON object as `k=v&k2=v2`.
///
/// Anything other than an object encodes to the empty string.
pub fn stringify(params: &Value) -> String {
    let mut pairs = Vec::new();
    if let Value::Object(map) = params {
        for (key, value) in map {
            push_pairs(key, value, &mut pairs);
        }
    }
    pairs.join("&")
}

/// Append `params` to `path`, using `&` when the path already has a query.
pub fn append_to_path(path: &str, params: &Value) -> String {
    let encoded = stringify(params);
    if encoded.is_empty() {
        return path.to_string();
    }
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("{}{}{}", path, separator, encoded)
}

/// Split `path?a=b` into the bare path and a parameter object.
///
/// A key that appears more than once collects its values into an array,
/// which [`stringify`] writes back out as repeated keys.
pub fn split_path(path: &str) -> (String, Map<String, Value>) {
    let Some((bare, query)) = path.split_once('?') else {
        return (path.to_string(), Map::new());
    };

    let mut params = Map::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let value = Value::String(value.into_owned());
        match params.get_mut(&*key) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                params.insert(key.into_owned(), value);
            }
        }
    }
    (bare.to_string(), params)
}

fn push_pairs(key: &str, value: &Value, pairs: &mut Vec<String>) {
    match value {
        Value::Null => pairs.push(format!("{}=", escape(key))),
        Value::Bool(b) => pairs.push(format!("{}={}", escape(key), b)),
        Value::Number(n) => pairs.push(format!("{}={}", escape(key), n)),
        Value::String(s) => pairs.push(format!("{}={}", escape(key), escape(s))),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if item.is_object() || item.is_array() {
                    push_pairs(&format!("{}[{}]", key, i), item, pairs);
                } else {
                    push_pairs(key, item, pairs);
                }
            }
        }
        Value::Object(map) => {
            for (sub, item) in map {
                push_pairs(&format!("{}[{}]", key, sub), item, pairs);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_spaces_are_percent_encoded() {
        let q = stringify(&json!({ "scope": "scope1 scope2" }));
        assert_eq!(q, "scope=scope1%20scope2");
    }

    #[test]
    fn test_reserved_characters() {
        let q = stringify(&json!({ "redirect_uri": "https://myapp.com/login?x=1" }));
        assert_eq!(q, "redirect_uri=https%3A%2F%2Fmyapp.com%2Flogin%3Fx%3D1");
        assert_eq!(escape("it's (fine)!*~"), "it's%20(fine)!*~");
    }

    #[test]
    fn test_scalars_arrays_and_nesting() {
        let q = stringify(&json!({
            "page": 2,
            "sort": null,
            "flag": true,
            "tag": ["a", "b"],
            "upload": { "approach": "tus" }
        }));
        assert_eq!(
            q,
            "page=2&sort=&flag=true&tag=a&tag=b&upload%5Bapproach%5D=tus"
        );
    }

    #[test]
    fn test_non_object_is_empty() {
        assert_eq!(stringify(&json!("text")), "");
        assert_eq!(stringify(&Value::Null), "");
    }

    #[test]
    fn test_append_to_path() {
        assert_eq!(append_to_path("/me", &json!({})), "/me");
        assert_eq!(append_to_path("/me", &json!({ "a": "b" })), "/me?a=b");
        assert_eq!(
            append_to_path("/me/videos?fields=uri", &json!({ "page": 1 })),
            "/me/videos?fields=uri&page=1"
        );
    }

    #[test]
    fn test_split_path() {
        let (path, params) = split_path("/me/videos?fields=uri,name&per_page=5");
        assert_eq!(path, "/me/videos");
        assert_eq!(params["fields"], "uri,name");
        assert_eq!(params["per_page"], "5");

        let (path, params) = split_path("/me");
        assert_eq!(path, "/me");
        assert!(params.is_empty());
    }

    #[test]
    fn test_split_path_keeps_repeated_keys() {
        let (path, params) = split_path("/videos?filter=a&page=2&filter=b&filter=c");
        assert_eq!(path, "/videos");
        assert_eq!(params["filter"], json!(["a", "b", "c"]));
        assert_eq!(params["page"], "2");

        let encoded = stringify(&Value::Object(params));
        assert_eq!(encoded, "filter=a&filter=b&filter=c&page=2");
    }

    proptest! {
        #[test]
        fn flat_params_decode_back(
            entries in prop::collection::btree_map("[a-z_]{1,8}", "\\PC{0,16}", 0..6)
        ) {
            let params: Map<String, Value> = entries
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect();
            let encoded = stringify(&Value::Object(params));
            prop_assert!(!encoded.contains(' '));
            prop_assert!(!encoded.contains('+'));

            let decoded: Vec<(String, String)> = url::form_urlencoded::parse(encoded.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect();
            let expected: Vec<(String, String)> = entries.into_iter().collect();
            prop_assert_eq!(decoded, expected);
        }
    }
}
