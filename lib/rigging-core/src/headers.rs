//! Ordered, case-insensitive header collection.

use indexmap::IndexMap;

/// HTTP headers keyed by name.
///
/// Lookups ignore ASCII case, and inserting a name that already exists under
/// another casing replaces it, so `Content-Type` and `content-type` never
/// coexist. Iteration follows insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(IndexMap<String, String>);

impl Headers {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.0.keys().position(|key| key.eq_ignore_ascii_case(name))
    }

    /// Set a header, replacing any value stored under the same name.
    ///
    /// Returns the replaced value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let previous = self
            .position(&name)
            .and_then(|index| self.0.shift_remove_index(index))
            .map(|(_, value)| value);
        self.0.insert(name, value.into());
        previous
    }

    /// Get a header value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name)
            .and_then(|index| self.0.get_index(index))
            .map(|(_, value)| value.as_str())
    }

    /// Remove a header, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.position(name)
            .and_then(|index| self.0.shift_remove_index(index))
            .map(|(_, value)| value)
    }

    /// Returns `true` if the header is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// The `Content-Type` header value, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.get("content-type")
    }

    /// Number of headers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` when there is no header.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }
}

impl<K, V> Extend<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (name, value) in iter {
            self.insert(name, value);
        }
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        headers.extend(iter);
        headers
    }
}

impl IntoIterator for Headers {
    type Item = (String, String);
    type IntoIter = indexmap::map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_ignoring_case() {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "application/json");
        let previous = headers.insert("content-type", "multipart/form-data");

        assert_eq!(previous.as_deref(), Some("application/json"));
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.content_type(), Some("multipart/form-data"));
    }

    #[test]
    fn get_ignores_case() {
        let headers: Headers = [("X-Trace-Id", "abc")].into_iter().collect();
        assert_eq!(headers.get("x-trace-id"), Some("abc"));
        assert!(headers.contains("X-TRACE-ID"));
        assert_eq!(headers.get("x-other"), None);
    }

    #[test]
    fn remove_header() {
        let mut headers: Headers = [("Accept", "text/html"), ("X-A", "1")].into_iter().collect();
        assert_eq!(headers.remove("accept").as_deref(), Some("text/html"));
        assert_eq!(headers.iter().collect::<Vec<_>>(), vec![("X-A", "1")]);
    }
}
