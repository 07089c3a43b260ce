//! Browser origin allow-list applied during the WebSocket upgrade.
//!
//! Browsers attach an `Origin` header to every WebSocket upgrade, which is
//! the only place a cross-site page can be told apart from the game's own
//! front-end. Non-browser clients (bots, tests) usually send no `Origin`
//! at all and are let through.

/// Which `Origin` headers the transport accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginPolicy {
    /// Accept every origin.
    Any,
    /// Accept only these exact origins (scheme + host + port, no trailing slash).
    AllowList(Vec<String>),
}

impl OriginPolicy {
    /// Builds an allow-list from anything string-like.
    pub fn allow<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::AllowList(origins.into_iter().map(Into::into).collect())
    }

    /// Returns `true` if an upgrade carrying `origin` may proceed.
    ///
    /// `None` means the request had no `Origin` header.
    pub fn permits(&self, origin: Option<&str>) -> bool {
        match (self, origin) {
            (Self::Any, _) | (_, None) => true,
            (Self::AllowList(allowed), Some(origin)) => {
                let origin = origin.trim_end_matches('/');
                allowed
                    .iter()
                    .any(|a| a.trim_end_matches('/').eq_ignore_ascii_case(origin))
            }
        }
    }
}

impl Default for OriginPolicy {
    fn default() -> Self {
        Self::Any
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permits_any_accepts_everything() {
        assert!(OriginPolicy::Any.permits(Some("https://evil.example")));
        assert!(OriginPolicy::Any.permits(None));
    }

    #[test]
    fn test_permits_allow_list_matches_exact_origin() {
        let policy = OriginPolicy::allow(["http://localhost:5173"]);
        assert!(policy.permits(Some("http://localhost:5173")));
        assert!(policy.permits(Some("http://LOCALHOST:5173/")));
        assert!(!policy.permits(Some("http://localhost:3000")));
    }

    #[test]
    fn test_permits_allow_list_lets_headerless_clients_through() {
        let policy = OriginPolicy::allow(["http://localhost:5173"]);
        assert!(policy.permits(None));
    }
}
