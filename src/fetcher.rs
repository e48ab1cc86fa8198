use crate::types::Node;
use hyper::client::HttpConnector;
use hyper::{Body, Client, StatusCode, Uri};
use std::time::Duration;
use thiserror::Error;
use tokio::time;
use tracing::warn;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("transport error: {0}")]
    Transport(#[from] hyper::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
    #[error("malformed node list: {0}")]
    Body(#[from] serde_json::Error),
}

/// Client side of the node endpoint.
///
/// `fetch` swallows every failure and returns an empty list, so an empty
/// result is ambiguous between "no nodes" and "fetch failed". Callers must
/// never clear previously displayed state on an empty result.
pub struct NodeFetcher {
    client: Client<HttpConnector, Body>,
    endpoint: Uri,
}

impl NodeFetcher {
    pub fn new(endpoint: Uri) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    pub async fn fetch(&self) -> Vec<Node> {
        match self.try_fetch().await {
            Ok(nodes) => nodes,
            Err(e) => {
                warn!("Error fetching nodes from API: {}", e);
                Vec::new()
            }
        }
    }

    /// The timeout covers the whole exchange, body included; headers arriving
    /// on time must not let a stalled body hold the caller past the bound.
    async fn try_fetch(&self) -> Result<Vec<Node>, FetchError> {
        time::timeout(FETCH_TIMEOUT, self.request_nodes())
            .await
            .map_err(|_| FetchError::Timeout)?
    }

    async fn request_nodes(&self) -> Result<Vec<Node>, FetchError> {
        let response = self.client.get(self.endpoint.clone()).await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body = hyper::body::to_bytes(response.into_body()).await?;
        // One malformed record fails the whole fetch.
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers;
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::Notify;

    async fn mock_api() -> (std::net::SocketAddr, Arc<Notify>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        tokio::spawn(handlers::serve(listener, shutdown.clone()));
        (addr, shutdown)
    }

    fn fetcher_for(addr: std::net::SocketAddr, path: &str) -> NodeFetcher {
        NodeFetcher::new(format!("http://{}{}", addr, path).parse().unwrap())
    }

    /// Serves exactly one connection with a canned HTTP response.
    async fn one_shot_server(body: &'static str) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-length: {}\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
            }
        });
        addr
    }

    #[tokio::test]
    async fn fetches_the_full_node_list() {
        let (addr, shutdown) = mock_api().await;
        let nodes = fetcher_for(addr, "/api/v1/nodes").fetch().await;
        assert_eq!(nodes.len(), 4);
        shutdown.notify_waiters();
    }

    #[tokio::test]
    async fn connection_refused_yields_empty() {
        // Bind and drop to find a port nothing is listening on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let nodes = fetcher_for(addr, "/api/v1/nodes").fetch().await;
        assert!(nodes.is_empty());
    }

    #[tokio::test]
    async fn bad_status_yields_empty() {
        let (addr, shutdown) = mock_api().await;
        let nodes = fetcher_for(addr, "/api/v2/nodes").fetch().await;
        assert!(nodes.is_empty());
        shutdown.notify_waiters();
    }

    #[tokio::test]
    async fn record_missing_fields_fails_the_whole_fetch() {
        let addr = one_shot_server(r#"[{"id": "us-1"}]"#).await;
        let nodes = fetcher_for(addr, "/api/v1/nodes").fetch().await;
        assert!(nodes.is_empty());
    }

    #[tokio::test]
    async fn non_json_body_yields_empty() {
        let addr = one_shot_server("not json at all").await;
        let nodes = fetcher_for(addr, "/api/v1/nodes").fetch().await;
        assert!(nodes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn unresponsive_server_times_out_to_empty() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and then say nothing.
            if let Ok((stream, _)) = listener.accept().await {
                time::sleep(Duration::from_secs(3600)).await;
                drop(stream);
            }
        });

        let nodes = fetcher_for(addr, "/api/v1/nodes").fetch().await;
        assert!(nodes.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_body_times_out_to_empty() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Headers promise a body that never arrives.
            if let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let _ = stream
                    .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\n")
                    .await;
                time::sleep(Duration::from_secs(3600)).await;
                drop(stream);
            }
        });

        let nodes = fetcher_for(addr, "/api/v1/nodes").fetch().await;
        assert!(nodes.is_empty());
    }
}
