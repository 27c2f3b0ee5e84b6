//! OData query parameters
//!
//! Collects `$select`, `$filter`, `$search`, `$orderby`, `$top` and
//! `$expand` in insertion order. Values are stored raw; the transport
//! URL-encodes them when the request is sent.

/// Query string builder for Graph collection and entity requests
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ODataQuery {
    pairs: Vec<(String, String)>,
}

impl ODataQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(self, fields: Option<&str>) -> Self {
        self.param_opt("$select", fields)
    }

    pub fn filter(self, filter: Option<&str>) -> Self {
        self.param_opt("$filter", filter)
    }

    /// `$search` values are wrapped in double quotes
    pub fn search(self, term: Option<&str>) -> Self {
        match term.filter(|t| !t.is_empty()) {
            Some(term) => self.param("$search", format!("\"{}\"", term.trim_matches('"'))),
            None => self,
        }
    }

    pub fn orderby(self, orderby: Option<&str>) -> Self {
        self.param_opt("$orderby", orderby)
    }

    pub fn expand(self, expand: Option<&str>) -> Self {
        self.param_opt("$expand", expand)
    }

    pub fn top(self, top: Option<u32>) -> Self {
        match top {
            Some(top) => self.param("$top", top.to_string()),
            None => self,
        }
    }

    /// Non-OData parameter such as `includeDeletedItems` or `token`
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    fn param_opt(self, key: &str, value: Option<&str>) -> Self {
        match value.filter(|v| !v.is_empty()) {
            Some(value) => self.param(key, value),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        self.pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_supplied_values_are_added() {
        let query = ODataQuery::new()
            .select(Some("id,displayName"))
            .filter(None)
            .orderby(Some(""))
            .top(Some(25));

        assert_eq!(
            query.into_pairs(),
            vec![
                ("$select".to_string(), "id,displayName".to_string()),
                ("$top".to_string(), "25".to_string()),
            ]
        );
    }

    #[test]
    fn test_search_is_quoted_once() {
        assert_eq!(ODataQuery::new().search(Some("adele")).get("$search"), Some("\"adele\""));
        assert_eq!(ODataQuery::new().search(Some("\"adele\"")).get("$search"), Some("\"adele\""));
        assert!(ODataQuery::new().search(None).is_empty());
    }
}
