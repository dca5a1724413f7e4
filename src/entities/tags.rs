//! Ordered tag list edited in place on stored records

use serde_json::Value;

/// Ordered, duplicate-free list of trimmed tags
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagList {
    tags: Vec<String>,
}

impl TagList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read tags from a stored record value
    ///
    /// Accepts a JSON array of strings or a `;`-separated string. Anything
    /// else yields an empty list.
    pub fn from_value(value: Option<&Value>) -> Self {
        let mut list = Self::new();
        match value {
            Some(Value::Array(items)) => {
                for item in items.iter().filter_map(Value::as_str) {
                    list.add(item);
                }
            }
            Some(Value::String(s)) => {
                for part in s.split(';') {
                    list.add(part);
                }
            }
            _ => {}
        }
        list
    }

    /// Append a tag; returns false when it is blank or already present
    pub fn add(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Remove a tag (case-insensitive); returns false when absent
    pub fn remove(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        let before = self.tags.len();
        self.tags.retain(|t| !t.eq_ignore_ascii_case(tag));
        self.tags.len() != before
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag.trim()))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.tags.iter().cloned().map(Value::String).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_add_keeps_order_and_skips_duplicates() {
        let mut tags = TagList::new();
        assert!(tags.add("guide"));
        assert!(tags.add(" tips "));
        assert!(!tags.add("Guide"));
        assert!(!tags.add("  "));
        assert_eq!(tags.as_slice(), ["guide", "tips"]);
    }

    #[test]
    fn test_remove() {
        let mut tags = TagList::from_value(Some(&json!(["a", "b", "c"])));
        assert!(tags.remove("B"));
        assert!(!tags.remove("zzz"));
        assert_eq!(tags.to_value(), json!(["a", "c"]));
    }

    #[test]
    fn test_from_value_variants() {
        assert_eq!(TagList::from_value(Some(&json!("x; y;;x"))).len(), 2);
        assert!(TagList::from_value(Some(&json!(5))).is_empty());
        assert!(TagList::from_value(None).is_empty());
        assert_eq!(TagList::from_value(Some(&json!(["a", 1, "b"]))).len(), 2);
    }
}
