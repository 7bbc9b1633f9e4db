//! Ordered attribute bags for structural events.
//!
//! [`Attributes`] wraps an [`IndexMap`] so that attributes come out in the
//! order the envelope declares them. Consumers that write markup or compare
//! event streams get the same output on every run.
//!
//! ## Examples
//!
//! ```rust
//! use edi_stream::Attributes;
//!
//! let mut attributes = Attributes::new();
//! attributes.insert("Control", "000038449");
//! attributes.insert("Version", "00401");
//!
//! let keys: Vec<_> = attributes.keys().collect();
//! assert_eq!(keys, vec!["Control", "Version"]);
//! assert_eq!(attributes.get("Control"), Some("000038449"));
//! ```

use indexmap::IndexMap;
use serde::Serialize;

/// An insertion-ordered map of attribute names to string values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Attributes(IndexMap<String, String>);

impl Attributes {
    /// Creates an empty bag.
    #[must_use]
    pub fn new() -> Self {
        Attributes(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Attributes(IndexMap::with_capacity(capacity))
    }

    /// Inserts an attribute, returning the previous value for that name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(name.into(), value.into())
    }

    /// Inserts an attribute only when the value is non-empty.
    ///
    /// Envelope fields are often optional; absent ones leave no attribute.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use edi_stream::Attributes;
    ///
    /// let mut attributes = Attributes::new();
    /// attributes.insert_nonempty("Security", "");
    /// attributes.insert_nonempty("Date", "991231");
    /// assert_eq!(attributes.len(), 1);
    /// ```
    pub fn insert_nonempty(&mut self, name: &str, value: &str) {
        if !value.is_empty() {
            self.0.insert(name.to_string(), value.to_string());
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Attribute names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Name/value pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Attributes(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Extend<(String, String)> for Attributes {
    fn extend<T: IntoIterator<Item = (String, String)>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Attributes {
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
    fn test_reinsert_keeps_position() {
        let mut attributes: Attributes = [("Id", "N1"), ("Qual", "ZZ")].into_iter().collect();
        assert_eq!(attributes.insert("Id", "N2"), Some("N1".to_string()));
        let pairs: Vec<_> = attributes.iter().collect();
        assert_eq!(pairs, vec![("Id", "N2"), ("Qual", "ZZ")]);
    }

    #[test]
    fn test_serializes_as_map() {
        let attributes: Attributes = [("Standard", "EDIFACT")].into_iter().collect();
        let json = serde_json::to_string(&attributes).unwrap();
        assert_eq!(json, r#"{"Standard":"EDIFACT"}"#);
    }
}
