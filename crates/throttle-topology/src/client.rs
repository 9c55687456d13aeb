//! vtctld HTTP client.
//!
//! One GET per call, bounded by a fixed timeout. The response status is not
//! inspected: whatever body comes back must parse as a tablet list.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use tracing::debug;

use crate::error::{TopologyError, TopologyResult};
use crate::tablet::{filter_replicas, parse_tablets, Tablet};

/// Upper bound on a single tablet list request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Build `<api>/keyspace/<keyspace>/tablets/<shard>`, appending the `/api`
/// segment to `api` unless it is already there.
pub fn api_url(api: &str, keyspace: &str, shard: &str) -> String {
    let api = api.trim_end_matches('/');
    let base = if api.ends_with("/api") {
        api.to_string()
    } else {
        format!("{api}/api")
    };
    format!("{base}/keyspace/{keyspace}/tablets/{shard}")
}

/// Client for the vtctld tablet listing endpoint.
#[derive(Clone)]
pub struct TopologyClient {
    http: Client<HttpConnector, Empty<Bytes>>,
    timeout: Duration,
}

impl Default for TopologyClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyClient {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            http: Client::builder(TokioExecutor::new()).build_http(),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetch every tablet of `keyspace`/`shard`. An empty shard asks vtctld
    /// for all shards.
    pub async fn resolve_tablets(
        &self,
        api: &str,
        keyspace: &str,
        shard: &str,
    ) -> TopologyResult<Vec<Tablet>> {
        let url = api_url(api, keyspace, shard);
        let uri: http::Uri = url
            .parse()
            .map_err(|e: http::uri::InvalidUri| TopologyError::InvalidUrl(format!("{url}: {e}")))?;

        let body = tokio::time::timeout(self.timeout, self.get(uri))
            .await
            .map_err(|_| {
                debug!(%url, timeout = ?self.timeout, "tablet list request timed out");
                TopologyError::Timeout(self.timeout)
            })??;

        let tablets = parse_tablets(&body)?;
        debug!(%url, tablets = tablets.len(), "tablet list resolved");
        Ok(tablets)
    }

    /// Fetch the tablets of `keyspace`/`shard` and keep only replicas.
    pub async fn resolve_replicas(
        &self,
        api: &str,
        keyspace: &str,
        shard: &str,
    ) -> TopologyResult<Vec<Tablet>> {
        let tablets = self.resolve_tablets(api, keyspace, shard).await?;
        Ok(filter_replicas(tablets))
    }

    async fn get(&self, uri: http::Uri) -> TopologyResult<Bytes> {
        let req = http::Request::builder()
            .method(http::Method::GET)
            .uri(uri.clone())
            .header("user-agent", "throttle-topology/0.1")
            .header("accept", "application/json")
            .body(Empty::<Bytes>::new())
            .map_err(|e| TopologyError::InvalidUrl(e.to_string()))?;

        let resp = self.http.request(req).await.map_err(|e| {
            debug!(error = %e, %uri, "tablet list request failed");
            TopologyError::Transport(e.to_string())
        })?;

        if !resp.status().is_success() {
            debug!(status = %resp.status(), %uri, "tablet list non-2xx");
        }

        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| TopologyError::Transport(e.to_string()))?
            .to_bytes();
        Ok(body)
    }
}

/// [`TopologyClient::resolve_tablets`] with the default one-second timeout.
pub async fn resolve_tablets(api: &str, keyspace: &str, shard: &str) -> TopologyResult<Vec<Tablet>> {
    TopologyClient::new().resolve_tablets(api, keyspace, shard).await
}

/// [`TopologyClient::resolve_replicas`] with the default one-second timeout.
pub async fn resolve_replicas(api: &str, keyspace: &str, shard: &str) -> TopologyResult<Vec<Tablet>> {
    TopologyClient::new().resolve_replicas(api, keyspace, shard).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tablet::TabletRole;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    /// Serve one canned response and report the request line received.
    async fn serve_once(body: &'static str) -> (String, oneshot::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let request = String::from_utf8_lossy(&buf);
            let request_line = request.lines().next().unwrap_or_default().to_string();
            let _ = tx.send(request_line);

            let resp = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(resp.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        });

        (format!("http://{addr}"), rx)
    }

    #[test]
    fn api_url_appends_api_segment() {
        assert_eq!(
            api_url("http://host:80", "ks1", "0"),
            "http://host:80/api/keyspace/ks1/tablets/0"
        );
    }

    #[test]
    fn api_url_keeps_existing_api_segment() {
        assert_eq!(
            api_url("http://host:80/api/", "ks1", "0"),
            "http://host:80/api/keyspace/ks1/tablets/0"
        );
        assert_eq!(
            api_url("http://host:80/api", "ks1", "0"),
            "http://host:80/api/keyspace/ks1/tablets/0"
        );
    }

    #[test]
    fn api_url_strips_repeated_slashes() {
        assert_eq!(
            api_url("http://host:80//", "ks1", "-80"),
            "http://host:80/api/keyspace/ks1/tablets/-80"
        );
    }

    #[test]
    fn api_url_empty_shard_passes_through() {
        assert_eq!(
            api_url("http://host:80", "ks1", ""),
            "http://host:80/api/keyspace/ks1/tablets/"
        );
    }

    #[test]
    fn api_url_does_not_match_partial_segment() {
        assert_eq!(
            api_url("http://host:80/vtapi", "ks1", "0"),
            "http://host:80/vtapi/api/keyspace/ks1/tablets/0"
        );
    }

    #[tokio::test]
    async fn resolve_requests_tablet_path() {
        let (base, request) = serve_once("[]").await;
        let tablets = TopologyClient::new()
            .resolve_tablets(&base, "ks1", "0")
            .await
            .unwrap();

        assert!(tablets.is_empty());
        assert_eq!(
            request.await.unwrap(),
            "GET /api/keyspace/ks1/tablets/0 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn resolve_replicas_filters() {
        let (base, _) = serve_once(
            r#"[
                {"mysql_hostname": "db-1", "mysql_port": 3306, "type": 2},
                {"mysql_hostname": "db-2", "mysql_port": 3306, "type": 1},
                {"mysql_hostname": "db-3", "mysql_port": 3306, "type": "REPLICA"}
            ]"#,
        )
        .await;

        let replicas = resolve_replicas(&format!("{base}/api/"), "commerce", "")
            .await
            .unwrap();
        let hosts: Vec<&str> = replicas.iter().map(|t| t.host.as_str()).collect();
        assert_eq!(hosts, vec!["db-1", "db-3"]);
        assert!(replicas.iter().all(|t| t.role == TabletRole::Replica));
    }

    #[tokio::test]
    async fn malformed_body_is_parse_error() {
        let (base, _) = serve_once(r#"[{"mysql_hostname": "db-1""#).await;
        let err = resolve_tablets(&base, "ks1", "0").await.unwrap_err();
        assert!(matches!(err, TopologyError::Parse(_)));
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        let err = TopologyClient::with_timeout(Duration::from_millis(500))
            .resolve_tablets("http://127.0.0.1:1", "ks1", "0")
            .await
            .unwrap_err();
        assert!(err.is_transport(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn unresponsive_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        let timeout = Duration::from_millis(100);
        let err = TopologyClient::with_timeout(timeout)
            .resolve_tablets(&format!("http://{addr}"), "ks1", "0")
            .await
            .unwrap_err();
        assert!(matches!(err, TopologyError::Timeout(t) if t == timeout));
        hold.abort();
    }

    #[tokio::test]
    async fn invalid_base_is_rejected() {
        let err = resolve_tablets("not a url", "ks1", "0").await.unwrap_err();
        assert!(matches!(err, TopologyError::InvalidUrl(_)));
    }

    #[test]
    fn default_timeout_is_one_second() {
        assert_eq!(TopologyClient::default().timeout(), Duration::from_secs(1));
    }
}
