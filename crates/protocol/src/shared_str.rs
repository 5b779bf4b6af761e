use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// An immutable, reference-counted string.
///
/// Record uuids and card summaries are cloned into cache keys, hit targets
/// and render commands on every pass; with `Arc<str>` each clone is a
/// refcount bump.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SharedStr(Arc<str>);

impl SharedStr {
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether two handles point at the same allocation.
    pub fn same_allocation(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq<str> for SharedStr {
    fn eq(&self, other: &str) -> bool {
        &*self.0 == other
    }
}

impl PartialEq<&str> for SharedStr {
    fn eq(&self, other: &&str) -> bool {
        &*self.0 == *other
    }
}

impl std::ops::Deref for SharedStr {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for SharedStr {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for SharedStr {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SharedStr {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for SharedStr {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl std::fmt::Display for SharedStr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// Hand-written so the crate does not need serde's `rc` feature.
impl Serialize for SharedStr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SharedStr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Owned so escaped JSON strings deserialize too.
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn clones_share_the_allocation() {
        let uuid = SharedStr::from("8f14e45f-ceea-467a-9575-8a1b7c1d9e10");
        let copy = uuid.clone();
        assert!(uuid.same_allocation(&copy));
        assert_eq!(uuid, copy);
    }

    #[test]
    fn uuid_keyed_map_accepts_str_lookups() {
        let mut rows: HashMap<SharedStr, usize> = HashMap::new();
        rows.insert(SharedStr::from("rec-217"), 217);
        assert_eq!(rows.get("rec-217"), Some(&217));
        assert_eq!(rows.get("rec-218"), None);
    }

    #[test]
    fn escaped_json_strings_deserialize() {
        let s: SharedStr =
            serde_json::from_str(r#""say \"hi\"""#).unwrap_or_else(|_| SharedStr::from(""));
        assert_eq!(s, "say \"hi\"");
        let json = serde_json::to_string(&s).unwrap_or_default();
        assert_eq!(json, r#""say \"hi\"""#);
    }

    #[test]
    fn default_is_empty() {
        assert!(SharedStr::default().is_empty());
    }
}
