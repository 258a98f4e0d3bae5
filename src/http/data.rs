//! String key-value maps used for query parameters, headers, cookies and form fields.

use std::collections::HashMap;
use std::collections::hash_map::Iter;

/// A flat string-to-string map.
///
/// `Data` deliberately does not implement `Clone`: independent copies are made
/// with [`Data::copy`] so it is always visible where a map is duplicated.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Data(HashMap<String, String>);

impl Data {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    /// Returns an independent deep copy of this map.
    pub fn copy(&self) -> Self {
        Self(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    /// Inserts a pair, replacing and returning any previous value for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> Iter<'_, String, String> {
        self.0.iter()
    }

    /// Pairs sorted by key.
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut pairs: Vec<(&str, &str)> = self
            .0
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        pairs.sort_unstable();
        pairs
    }

    /// Joins the pairs as `key=value` with `&`, sorted by key.
    ///
    /// Keys and values are inserted verbatim. Nothing is percent-encoded.
    pub fn link(&self) -> String {
        self.sorted()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Data {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<String>, const N: usize> From<[(K, V); N]> for Data {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a Data {
    type Item = (&'a String, &'a String);
    type IntoIter = Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_is_independent() {
        let mut original = Data::from([("a", "1"), ("b", "2")]);
        let mut copy = original.copy();
        assert_eq!(copy, original);

        copy.insert("a", "changed");
        copy.insert("c", "3");
        assert_eq!(original.get("a"), Some("1"));
        assert!(!original.contains_key("c"));

        original.remove("b");
        assert_eq!(copy.get("b"), Some("2"));
    }

    #[test]
    fn test_insert_replaces_previous_value() {
        let mut data = Data::new();
        assert_eq!(data.insert("k", "v1"), None);
        assert_eq!(data.insert("k", "v2"), Some("v1".to_string()));
        assert_eq!(data.len(), 1);
        assert_eq!(data.get("k"), Some("v2"));
    }

    #[test]
    fn test_link_empty() {
        assert_eq!(Data::new().link(), "");
    }

    #[test]
    fn test_link_single_pair() {
        assert_eq!(Data::from([("job_id", "2")]).link(), "job_id=2");
    }

    #[test]
    fn test_link_multiple_pairs_each_once() {
        let data = Data::from([("b", "2"), ("a", "1"), ("c", "3")]);
        let linked = data.link();
        let mut parts: Vec<&str> = linked.split('&').collect();
        assert_eq!(parts.len(), 3);
        parts.sort_unstable();
        assert_eq!(parts, vec!["a=1", "b=2", "c=3"]);
    }

    #[test]
    fn test_link_does_not_escape() {
        let data = Data::from([("q", "a b&c")]);
        assert_eq!(data.link(), "q=a b&c");
    }
}
