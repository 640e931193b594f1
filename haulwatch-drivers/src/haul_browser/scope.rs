//! URL allow-list restricting which exchanges reach the interceptor.

use anyhow::{Context, Result};
use regex::RegexSet;

/// Immutable set of URL patterns, built once at startup and shared
/// read-only. A pure allow-list: no deny rules, no ordering among patterns.
#[derive(Debug, Clone)]
pub struct ScopeSet {
    set: RegexSet,
}

impl ScopeSet {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = RegexSet::new(patterns).context("invalid scope pattern")?;
        Ok(Self { set })
    }

    /// Whether `url` is visible to the interceptor.
    pub fn matches(&self, url: &str) -> bool {
        self.set.is_match(url)
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ati_scopes() -> ScopeSet {
        ScopeSet::new([
            ".*ati.su/webapi/public/v1.0/loads/search",
            ".*ati.su/webapi/v1.0/loads/search",
        ])
        .unwrap()
    }

    #[test]
    fn loads_search_endpoints_match() {
        let scopes = ati_scopes();
        assert!(scopes.matches(
            "https://loads.ati.su/webapi/public/v1.0/loads/search?offset=0"
        ));
        assert!(scopes.matches("https://loads.ati.su/webapi/v1.0/loads/search"));
    }

    #[test]
    fn unrelated_traffic_is_invisible() {
        let scopes = ati_scopes();
        assert!(!scopes.matches("https://loads.ati.su/webapi/v1.0/firms/1"));
        assert!(!scopes.matches("https://files.ati.su/glossary/cargoTypes.json"));
        assert!(!scopes.matches("https://example.com/"));
    }

    #[test]
    fn bad_pattern_is_an_error() {
        assert!(ScopeSet::new(["("]).is_err());
    }
}
