//! Strategy execution for intercepted requests.
//!
//! Network failures never escape from here: each strategy turns them into a
//! cached response, a placeholder, or no response at all. Cache-store errors
//! are logged and treated as misses so a broken store degrades to
//! network-only behavior instead of failing requests.

use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderValue};
use swcache_core::RequestKey;

use super::{CacheAgent, Destination, Request, Response, ResponseSource, Served, Strategy};
use crate::fetch::Network;

/// Body of the image placeholder served when an image cannot be loaded.
pub const PLACEHOLDER_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="200"><rect fill="#222" width="200" height="200"/></svg>"##;

/// 200×200 dark rectangle answering for a failed image request.
pub fn placeholder_image(request: &Request) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/svg+xml"));
    Response {
        url: request.url.clone(),
        status: StatusCode::OK,
        headers,
        body: Bytes::from_static(PLACEHOLDER_SVG.as_bytes()),
    }
}

impl<N: Network> CacheAgent<N> {
    /// Route an intercepted request through its strategy.
    pub(crate) async fn route(&self, request: &Request) -> Option<Served> {
        let strategy = self.policy.classify(request);
        tracing::debug!(method = %request.method, url = %request.url, ?strategy, "routing request");

        match strategy {
            Strategy::AlwaysNetwork => self.always_network(request).await,
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
        }
    }

    async fn always_network(&self, request: &Request) -> Option<Served> {
        match self.network.fetch(request).await {
            Ok(response) => Some(Served::new(response, ResponseSource::Network)),
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "network failed, trying cache");
                self.lookup(&request.key())
                    .await
                    .map(|hit| Served::new(hit, ResponseSource::Cache))
            }
        }
    }

    async fn cache_first(&self, request: &Request) -> Option<Served> {
        let key = request.key();
        if let Some(hit) = self.lookup(&key).await {
            return Some(Served::new(hit, ResponseSource::Cache));
        }

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.status.is_success() {
                    self.write_through(&key, &response).await;
                }
                Some(Served::new(response, ResponseSource::Network))
            }
            Err(e) if request.destination == Destination::Image => {
                tracing::debug!(url = %request.url, error = %e, "image unavailable, serving placeholder");
                Some(Served::new(placeholder_image(request), ResponseSource::Placeholder))
            }
            Err(e) => {
                tracing::debug!(url = %request.url, error = %e, "static asset unavailable");
                None
            }
        }
    }

    async fn network_first(&self, request: &Request) -> Option<Served> {
        let e = match self.network.fetch(request).await {
            Ok(response) => return Some(Served::new(response, ResponseSource::Network)),
            Err(e) => e,
        };
        tracing::debug!(url = %request.url, error = %e, "network failed, trying cache");

        if let Some(hit) = self.lookup(&request.key()).await {
            return Some(Served::new(hit, ResponseSource::Cache));
        }

        let fallback = RequestKey::get(self.offline_fallback.as_str());
        if let Some(hit) = self.lookup(&fallback).await {
            tracing::debug!(url = %request.url, fallback = %self.offline_fallback, "serving offline fallback");
            return Some(Served::new(hit, ResponseSource::Fallback));
        }

        None
    }

    /// Current-store entry for a key; store failures count as a miss.
    async fn lookup(&self, key: &RequestKey) -> Option<Response> {
        let stored = match self.db.store(&self.version).match_request(key).await {
            Ok(stored) => stored?,
            Err(e) => {
                tracing::warn!(%key, error = %e, "cache lookup failed");
                return None;
            }
        };

        match Response::from_stored(stored) {
            Ok(response) => Some(response),
            Err(e) => {
                tracing::warn!(%key, error = %e, "ignoring unreadable cache entry");
                None
            }
        }
    }

    /// Persist a snapshot of a network response; failures are logged only.
    async fn write_through(&self, key: &RequestKey, response: &Response) {
        let snapshot = response.snapshot();
        let result = match self.db.open_store(&self.version).await {
            Ok(store) => store.put(key, &snapshot).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            tracing::warn!(%key, error = %e, "cache write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::{MemoryNetwork, active_agent, origin_url};
    use std::sync::Arc;

    fn image(path: &str) -> Request {
        Request::get(origin_url(path)).with_destination(Destination::Image)
    }

    fn document(path: &str) -> Request {
        Request::get(origin_url(path)).with_destination(Destination::Document)
    }

    #[tokio::test]
    async fn test_posts_feed_hits_network_despite_cache() {
        let network = Arc::new(MemoryNetwork::new());
        network.serve("/instagram-posts.json", "application/json", "[\"fresh\"]");
        network.serve("/version.json", "application/json", "{\"v\":2}");
        let agent = active_agent(network.clone()).await;

        // install seeded both; change the live copies afterwards
        network.serve("/instagram-posts.json", "application/json", "[\"newer\"]");
        network.serve("/version.json", "application/json", "{\"v\":3}");
        network.reset_calls();

        let served = agent.route(&Request::get(origin_url("/instagram-posts.json"))).await.unwrap();
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.body.as_ref(), b"[\"newer\"]");

        let served = agent.route(&Request::get(origin_url("/version.json"))).await.unwrap();
        assert_eq!(served.response.body.as_ref(), b"{\"v\":3}");
        assert_eq!(
            network.calls(),
            vec![origin_url("/instagram-posts.json").to_string(), origin_url("/version.json").to_string()]
        );
    }

    #[tokio::test]
    async fn test_always_network_falls_back_to_cache() {
        let network = Arc::new(MemoryNetwork::new());
        network.serve("/version.json", "application/json", "{\"v\":1}");
        let agent = active_agent(network.clone()).await;

        network.set_online(false);
        let served = agent.route(&Request::get(origin_url("/version.json"))).await.unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body.as_ref(), b"{\"v\":1}");

        assert!(agent.route(&Request::get(origin_url("/api/contact"))).await.is_none());
    }

    #[tokio::test]
    async fn test_cache_first_round_trip() {
        let network = Arc::new(MemoryNetwork::new());
        network.serve("/assets/app.js", "text/javascript", "console.log(1)");
        let agent = active_agent(network.clone()).await;

        let request = Request::get(origin_url("/assets/app.js")).with_destination(Destination::Script);
        let first = agent.route(&request).await.unwrap();
        assert_eq!(first.source, ResponseSource::Network);
        assert_eq!(first.response.body.as_ref(), b"console.log(1)");

        network.set_online(false);
        network.reset_calls();

        let second = agent.route(&request).await.unwrap();
        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(second.response.body.as_ref(), b"console.log(1)");
        assert_eq!(second.response.content_type(), Some("text/javascript"));
        assert!(network.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cache_first_skips_network_on_hit() {
        let network = Arc::new(MemoryNetwork::new());
        network.serve("/site.css", "text/css", "old");
        let agent = active_agent(network.clone()).await;

        agent.route(&Request::get(origin_url("/site.css"))).await.unwrap();
        network.serve("/site.css", "text/css", "new");
        network.reset_calls();

        let served = agent.route(&Request::get(origin_url("/site.css"))).await.unwrap();
        assert_eq!(served.response.body.as_ref(), b"old");
        assert!(network.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cache_first_does_not_store_errors() {
        let network = Arc::new(MemoryNetwork::new());
        let agent = active_agent(network.clone()).await;

        let served = agent.route(&Request::get(origin_url("/missing.js"))).await.unwrap();
        assert_eq!(served.response.status, StatusCode::NOT_FOUND);

        let store = agent.db().store(agent.version());
        let key = Request::get(origin_url("/missing.js")).key();
        assert!(store.match_request(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_image_placeholder_when_offline() {
        let network = Arc::new(MemoryNetwork::new());
        let agent = active_agent(network.clone()).await;
        network.set_online(false);

        let served = agent.route(&image("/img/hero.png")).await.unwrap();
        assert_eq!(served.source, ResponseSource::Placeholder);
        assert_eq!(served.response.status, StatusCode::OK);
        assert_eq!(served.response.content_type(), Some("image/svg+xml"));
        let body = std::str::from_utf8(&served.response.body).unwrap();
        assert!(body.contains(r#"width="200" height="200""#));
        assert!(body.contains("<rect"));
    }

    #[tokio::test]
    async fn test_non_image_asset_offline_yields_nothing() {
        let network = Arc::new(MemoryNetwork::new());
        let agent = active_agent(network.clone()).await;
        network.set_online(false);

        let script = Request::get(origin_url("/app.js")).with_destination(Destination::Script);
        assert!(agent.route(&script).await.is_none());
    }

    #[tokio::test]
    async fn test_network_first_prefers_network() {
        let network = Arc::new(MemoryNetwork::new());
        network.serve("/about", "text/html", "live about");
        let agent = active_agent(network.clone()).await;

        let served = agent.route(&document("/about")).await.unwrap();
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.body.as_ref(), b"live about");
    }

    #[tokio::test]
    async fn test_network_first_exact_cache_entry() {
        let network = Arc::new(MemoryNetwork::new());
        network.serve("/", "text/html", "home");
        network.serve("/index.html", "text/html", "index");
        let agent = active_agent(network.clone()).await;
        network.set_online(false);

        let served = agent.route(&document("/")).await.unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body.as_ref(), b"home");
    }

    #[tokio::test]
    async fn test_network_first_falls_back_to_root_document() {
        let network = Arc::new(MemoryNetwork::new());
        network.serve("/index.html", "text/html", "index");
        let agent = active_agent(network.clone()).await;
        network.set_online(false);

        let served = agent.route(&document("/coaching/plans")).await.unwrap();
        assert_eq!(served.source, ResponseSource::Fallback);
        assert_eq!(served.response.body.as_ref(), b"index");
    }

    #[tokio::test]
    async fn test_network_first_nothing_cached() {
        let network = Arc::new(MemoryNetwork::new());
        let agent = active_agent(network.clone()).await;
        network.set_online(false);

        assert!(agent.route(&document("/coaching/plans")).await.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let network = Arc::new(MemoryNetwork::new());
        network.serve("/site.css", "text/css", "live");
        let agent = active_agent(network.clone()).await;

        let request = Request::get(origin_url("/site.css")).with_destination(Destination::Style);
        let store = agent.db().store(agent.version());
        store.put_undecodable(&request.key()).await.unwrap();

        let served = agent.route(&request).await.unwrap();
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.body.as_ref(), b"live");

        // write-through replaced the broken entry
        network.set_online(false);
        let served = agent.route(&request).await.unwrap();
        assert_eq!(served.source, ResponseSource::Cache);
        assert_eq!(served.response.body.as_ref(), b"live");
    }

    #[tokio::test]
    async fn test_broken_store_degrades_to_network() {
        let network = Arc::new(MemoryNetwork::new());
        network.serve("/version.json", "application/json", "{\"v\":1}");
        network.serve("/app.js", "text/javascript", "live");
        network.serve("/about", "text/html", "about");
        let agent = active_agent(network.clone()).await;
        agent.db().drop_entries_table().await.unwrap();

        let served = agent.route(&Request::get(origin_url("/version.json"))).await.unwrap();
        assert_eq!(served.source, ResponseSource::Network);

        let script = Request::get(origin_url("/app.js")).with_destination(Destination::Script);
        let served = agent.route(&script).await.unwrap();
        assert_eq!(served.source, ResponseSource::Network);
        assert_eq!(served.response.body.as_ref(), b"live");

        let served = agent.route(&document("/about")).await.unwrap();
        assert_eq!(served.source, ResponseSource::Network);

        network.set_online(false);
        assert!(agent.route(&script).await.is_none());
        assert!(agent.route(&document("/about")).await.is_none());
        assert_eq!(agent.route(&image("/img/a.png")).await.unwrap().source, ResponseSource::Placeholder);
    }

    #[test]
    fn test_placeholder_response() {
        let response = placeholder_image(&image("/a.webp"));
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.content_type(), Some("image/svg+xml"));
        assert_eq!(response.body.as_ref(), PLACEHOLDER_SVG.as_bytes());
    }
}
