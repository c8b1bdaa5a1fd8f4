//! Mapping from resource locators to stored assets.
//!
//! Markup may refer to the same resource with or without its query string
//! (`?wx_fmt=png`) or fragment, so every asset is registered under both its
//! raw locator and the normalized form, and lookups try both.

use deck_core::AssetRef;
use std::collections::HashMap;

/// Strip the fragment and then the query string from a locator.
pub fn normalize_locator(locator: &str) -> &str {
    let without_fragment = locator.split('#').next().unwrap_or(locator);
    without_fragment.split('?').next().unwrap_or(without_fragment)
}

/// Locator-to-asset lookup table for one archive.
#[derive(Debug, Clone, Default)]
pub struct AssetMap {
    entries: HashMap<String, AssetRef>,
}

impl AssetMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `asset` under both the raw and the normalized locator.
    pub fn insert(&mut self, locator: &str, asset: AssetRef) {
        let normalized = normalize_locator(locator);
        if normalized != locator {
            self.entries.insert(normalized.to_string(), asset.clone());
        }
        self.entries.insert(locator.to_string(), asset);
    }

    /// Look up a locator as written, then in normalized form.
    pub fn resolve(&self, locator: &str) -> Option<&AssetRef> {
        if locator.is_empty() {
            return None;
        }
        self.entries
            .get(locator)
            .or_else(|| self.entries.get(normalize_locator(locator)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_core::AssetKind;

    fn asset(id: &str) -> AssetRef {
        AssetRef::new(id, AssetKind::Png, format!("img_{id}.png"))
    }

    #[test]
    fn test_normalize_locator() {
        assert_eq!(normalize_locator("https://a/b.png?x=1#f"), "https://a/b.png");
        assert_eq!(normalize_locator("https://a/b.png#f?x"), "https://a/b.png");
        assert_eq!(normalize_locator("https://a/b.png"), "https://a/b.png");
        assert_eq!(normalize_locator(""), "");
    }

    #[test]
    fn test_resolve_raw_and_normalized() {
        let mut map = AssetMap::new();
        map.insert("https://img/x.png?wx_fmt=png", asset("x"));

        assert_eq!(map.entries.len(), 2);
        assert_eq!(map.resolve("https://img/x.png?wx_fmt=png").unwrap().id, "x");
        assert_eq!(map.resolve("https://img/x.png").unwrap().id, "x");
        // A different query still resolves through the normalized key
        assert_eq!(map.resolve("https://img/x.png?tp=webp#imgIndex=0").unwrap().id, "x");
        assert!(map.resolve("https://img/y.png").is_none());
        assert!(map.resolve("").is_none());
    }

    #[test]
    fn test_plain_locator_has_one_key() {
        let mut map = AssetMap::new();
        map.insert("a.png", asset("a"));
        assert_eq!(map.entries.len(), 1);
    }
}
