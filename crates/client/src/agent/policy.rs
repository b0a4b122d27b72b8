//! Strategy selection by request shape.

use regex::Regex;
use serde::{Deserialize, Serialize};
use swcache_core::{AppConfig, Error};

use super::Request;

/// Caching strategy applied to an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Network, falling back to the exact cache entry.
    AlwaysNetwork,
    /// Cache, falling back to network with write-through.
    CacheFirst,
    /// Network, falling back to the exact entry then the offline document.
    NetworkFirst,
}

/// Pure URL-shape classifier. First match wins:
/// dynamic-data markers, then static assets, then everything else.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    network_only_markers: Vec<String>,
    static_asset: Regex,
    static_hosts: Vec<String>,
}

impl RoutePolicy {
    /// Build a policy from path markers, bare file extensions and hosts.
    pub fn new(
        network_only_markers: &[String], static_extensions: &[String], static_hosts: &[String],
    ) -> Result<Self, Error> {
        let alternatives = static_extensions
            .iter()
            .map(|ext| regex::escape(ext))
            .collect::<Vec<_>>()
            .join("|");
        // An empty extension list must match nothing rather than every path ending in '.'.
        let pattern =
            if alternatives.is_empty() { r"[^\s\S]".to_string() } else { format!(r"(?i)\.(?:{alternatives})$") };
        let static_asset = Regex::new(&pattern).map_err(|e| Error::InvalidInput(format!("static extensions: {e}")))?;

        Ok(Self {
            network_only_markers: network_only_markers.to_vec(),
            static_asset,
            static_hosts: static_hosts.iter().map(|h| h.to_ascii_lowercase()).collect(),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Self::new(&config.network_only_markers, &config.static_extensions, &config.static_hosts)
    }

    /// Select the strategy for a request.
    pub fn classify(&self, request: &Request) -> Strategy {
        let path = request.url.path();

        if self.network_only_markers.iter().any(|marker| path.contains(marker.as_str())) {
            return Strategy::AlwaysNetwork;
        }

        if self.static_asset.is_match(path) || self.references_static_host(request) {
            return Strategy::CacheFirst;
        }

        Strategy::NetworkFirst
    }

    /// Served from an allow-listed host, or proxied under a path naming one.
    fn references_static_host(&self, request: &Request) -> bool {
        let host = request.url.host_str().unwrap_or("");
        let path = request.url.path();
        self.static_hosts.iter().any(|allowed| {
            host == allowed
                || host.strip_suffix(allowed.as_str()).is_some_and(|sub| sub.ends_with('.'))
                || path.contains(allowed.as_str())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Destination;
    use crate::fetch::canonicalize;

    fn default_policy() -> RoutePolicy {
        RoutePolicy::from_config(&AppConfig::default()).unwrap()
    }

    fn request(url: &str) -> Request {
        Request::get(canonicalize(url).unwrap())
    }

    #[test]
    fn test_dynamic_markers_go_to_network() {
        let policy = default_policy();
        assert_eq!(policy.classify(&request("http://localhost:8080/instagram-posts.json")), Strategy::AlwaysNetwork);
        assert_eq!(policy.classify(&request("http://localhost:8080/version.json?t=1")), Strategy::AlwaysNetwork);
        assert_eq!(policy.classify(&request("http://localhost:8080/api/contact")), Strategy::AlwaysNetwork);
    }

    #[test]
    fn test_markers_win_over_extensions() {
        let policy = default_policy();
        assert_eq!(policy.classify(&request("http://localhost:8080/api/chart.png")), Strategy::AlwaysNetwork);
    }

    #[test]
    fn test_static_extensions_are_cache_first() {
        let policy = default_policy();
        for path in ["/app.js", "/site.CSS", "/fonts/inter.woff2", "/img/hero.JPEG", "/favicon.ico"] {
            let url = format!("http://localhost:8080{path}");
            assert_eq!(policy.classify(&request(&url)), Strategy::CacheFirst, "{path}");
        }
    }

    #[test]
    fn test_extension_must_end_the_path() {
        let policy = default_policy();
        assert_eq!(policy.classify(&request("http://localhost:8080/app.js.map")), Strategy::NetworkFirst);
        assert_eq!(policy.classify(&request("http://localhost:8080/app.js?v=2")), Strategy::CacheFirst);
    }

    #[test]
    fn test_static_hosts_are_cache_first() {
        let policy = default_policy();
        assert_eq!(policy.classify(&request("https://fonts.googleapis.com/css2?family=Inter")), Strategy::CacheFirst);
        assert_eq!(
            policy.classify(&request("http://localhost:8080/proxy/cdnjs.cloudflare.com/lib")),
            Strategy::CacheFirst
        );
        assert_eq!(policy.classify(&request("https://notfonts.googleapis.com.evil/x")), Strategy::NetworkFirst);
    }

    #[test]
    fn test_documents_are_network_first() {
        let policy = default_policy();
        let page = request("http://localhost:8080/about").with_destination(Destination::Document);
        assert_eq!(policy.classify(&page), Strategy::NetworkFirst);
        assert_eq!(policy.classify(&request("http://localhost:8080/")), Strategy::NetworkFirst);
    }

    #[test]
    fn test_empty_extension_list_matches_nothing() {
        let policy = RoutePolicy::new(&[], &[], &[]).unwrap();
        assert_eq!(policy.classify(&request("http://localhost:8080/app.js")), Strategy::NetworkFirst);
    }
}
