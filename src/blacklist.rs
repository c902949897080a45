//! URL blacklist.
//!
//! Matching is by prefix: an entry bans the exact URL and everything under
//! it, so `https://x.test/admin` also covers `https://x.test/admin/users`.

use url::Url;

/// A static set of banned URL prefixes, checked before any other job handling.
#[derive(Debug, Clone, Default)]
pub struct UrlBlacklist {
    prefixes: Vec<String>,
}

impl UrlBlacklist {
    pub fn new(prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    pub fn matches(&self, url: &Url) -> bool {
        let url = url.as_str();
        self.prefixes.iter().any(|p| url.starts_with(p.as_str()))
    }
}
