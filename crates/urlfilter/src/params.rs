//! URL query parameters as a flat, multi-valued map.

use crate::error::{FilterError, Result};
use serde::Serialize;
use std::collections::BTreeMap;

/// Parameter name → ordered values.
///
/// A key mapped to an empty list is meaningful: in a binder emission it asks
/// the router to remove that parameter from the location.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct QueryParameters {
    params: BTreeMap<String, Vec<String>>,
}

impl QueryParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a query string (`a=1&a=2&b=x`), with or without a leading `?`.
    pub fn parse(query: &str) -> Result<Self> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(query)
            .map_err(|e| FilterError::decoding(query, "query string", e))?;

        let mut params = Self::new();
        for (key, value) in pairs {
            params.push(key, value);
        }
        Ok(params)
    }

    /// Render as a query string, skipping keys without values.
    pub fn to_query_string(&self) -> String {
        let pairs: Vec<(&str, &str)> = self
            .params
            .iter()
            .flat_map(|(k, values)| values.iter().map(move |v| (k.as_str(), v.as_str())))
            .collect();
        serde_urlencoded::to_string(pairs).unwrap_or_default()
    }

    pub fn with(mut self, key: impl Into<String>, values: Vec<String>) -> Self {
        self.set(key, values);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.params.insert(key.into(), values);
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.entry(key.into()).or_default().push(value.into());
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.params.get(key).map(Vec::as_slice)
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|v| v.first()).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Overlay `update` on `self`: keys in `update` replace ours, keys mapped
    /// to an empty list are removed, all other keys are kept.
    pub fn merge(&self, update: &QueryParameters) -> QueryParameters {
        let mut merged = self.clone();
        for (key, values) in &update.params {
            if values.is_empty() {
                merged.params.remove(key);
            } else {
                merged.params.insert(key.clone(), values.clone());
            }
        }
        merged
    }

    /// Overlay `update` on `self` without removing anything: keys mapped to an
    /// empty list are kept as such.
    pub fn overlay(&self, update: &QueryParameters) -> QueryParameters {
        let mut combined = self.clone();
        for (key, values) in &update.params {
            combined.params.insert(key.clone(), values.clone());
        }
        combined
    }
}

impl FromIterator<(String, Vec<String>)> for QueryParameters {
    fn from_iter<T: IntoIterator<Item = (String, Vec<String>)>>(iter: T) -> Self {
        QueryParameters {
            params: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_value_order_per_key() {
        let params = QueryParameters::parse("?c=b&c=a&x=1").unwrap();
        assert_eq!(params.get("c").unwrap(), ["b", "a"]);
        assert_eq!(params.first("x"), Some("1"));
        assert!(params.get("missing").is_none());
    }

    #[test]
    fn parse_decodes_percent_escapes() {
        let params = QueryParameters::parse("genericFilterCondition=property%3Aname%7Ceq%7CJohn")
            .unwrap();
        assert_eq!(params.first("genericFilterCondition"), Some("property:name|eq|John"));
    }

    #[test]
    fn query_string_round_trips() {
        let params = QueryParameters::new()
            .with("a", vec!["x y".into(), "z|w".into()])
            .with("b", vec!["1".into()]);
        let query = params.to_query_string();
        assert_eq!(QueryParameters::parse(&query).unwrap(), params);
    }

    #[test]
    fn empty_keys_are_not_rendered() {
        let params = QueryParameters::new().with("a", vec![]);
        assert_eq!(params.to_query_string(), "");
    }

    #[test]
    fn merge_replaces_removes_and_keeps() {
        let location = QueryParameters::new()
            .with("page", vec!["2".into()])
            .with("cfg", vec!["old".into()])
            .with("cond", vec!["c1".into()]);
        let update = QueryParameters::new()
            .with("cfg", vec![])
            .with("cond", vec!["c2".into(), "c3".into()]);

        let merged = location.merge(&update);
        assert_eq!(merged.first("page"), Some("2"));
        assert!(!merged.contains_key("cfg"));
        assert_eq!(merged.get("cond").unwrap(), ["c2", "c3"]);
    }

    #[test]
    fn overlay_keeps_empty_lists() {
        let a = QueryParameters::new().with("x", vec!["1".into()]);
        let b = QueryParameters::new().with("x", vec![]).with("y", vec!["2".into()]);
        let combined = a.overlay(&b);
        assert_eq!(combined.get("x"), Some(&[][..]));
        assert_eq!(combined.first("y"), Some("2"));
    }
}
