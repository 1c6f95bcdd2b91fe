//! HTTP transport shared by the metadata client and the download engine.
//!
//! Both components take a [`Transport`] by value. [`ReqwestTransport`] is a
//! thin wrapper around one [`reqwest::Client`]; cloning it shares the
//! underlying connection pool, so a single instance can serve any number of
//! concurrent callers.

use crate::config::Config;
use crate::error::{Error, Result};
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use reqwest::header::{ACCEPT, HeaderMap};
use reqwest::{Client, ClientBuilder, StatusCode};
use std::pin::Pin;

/// Upper bound on the buffer reserved up front from an announced length.
const MAX_PREALLOCATION: u64 = 1 << 20;

pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes>> + Send>>;

/// Status, headers and a not-yet-consumed body.
pub struct TransportResponse {
    pub url: String,
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// Expected body length, if the server announced one
    pub content_length: Option<u64>,
    pub body: BodyStream,
}

impl TransportResponse {
    /// Turns a non-success status into [`Error::Status`].
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(Error::Status {
                url: self.url,
                status: self.status,
            })
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Drains the body into memory.
    pub async fn bytes(mut self) -> Result<Vec<u8>> {
        let hint = self.content_length.unwrap_or(0).min(MAX_PREALLOCATION);
        let mut buffer = Vec::with_capacity(hint as usize);
        while let Some(chunk) = self.body.next().await {
            buffer.extend_from_slice(&chunk?);
        }
        Ok(buffer)
    }
}

pub trait Transport: Send + Sync {
    /// Issues a GET request. Non-success statuses are returned, not raised.
    fn get(
        &self,
        url: &str,
        accept: &str,
    ) -> impl Future<Output = Result<TransportResponse>> + Send;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Self::client_builder(config).build()?;
        Ok(Self { client })
    }

    fn client_builder(config: &Config) -> ClientBuilder {
        Client::builder().user_agent(config.user_agent.as_str())
    }

    /// Wraps an existing client. The client must already send a User-Agent.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, accept: &str) -> Result<TransportResponse> {
        tracing::debug!("GET {}", url);
        let response = self.client.get(url).header(ACCEPT, accept).send().await?;

        let status = response.status();
        let headers = response.headers().clone();
        let content_length = response.content_length();
        let stream_url = url.to_string();
        let body = response.bytes_stream().map(move |chunk| {
            chunk.map_err(|e| Error::Interrupted {
                url: stream_url.clone(),
                reason: e.to_string(),
            })
        });

        Ok(TransportResponse {
            url: url.to_string(),
            status,
            headers,
            content_length,
            body: Box::pin(body),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_USER_AGENT;
    use crate::test_helpers::mock_transport::{MockRoute, MockTransport};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_error_for_status() -> anyhow::Result<()> {
        let transport = MockTransport::new()
            .with_body("https://example.com/ok", b"hello".to_vec())
            .with_status("https://example.com/gone", StatusCode::GONE);

        let ok = transport.get("https://example.com/ok", "*/*").await?;
        assert_eq!(ok.content_length, Some(5));
        assert_eq!(ok.error_for_status()?.bytes().await?, b"hello");

        let gone = transport.get("https://example.com/gone", "*/*").await?;
        match gone.error_for_status() {
            Err(Error::Status { url, status }) => {
                assert_eq!(url, "https://example.com/gone");
                assert_eq!(status, StatusCode::GONE);
            }
            _ => panic!("expected a status error"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_huge_announced_length_is_not_preallocated() -> anyhow::Result<()> {
        let route = MockRoute::ok(b"[]".to_vec()).content_length(Some(1 << 62));
        let transport = MockTransport::new().with_route("https://example.com/big", route);

        let response = transport.get("https://example.com/big", "*/*").await?;
        assert_eq!(response.bytes().await?, b"[]");
        Ok(())
    }

    /// Accepts one connection, answers it with `response`, and returns the raw request head.
    async fn serve_once(
        response: &'static [u8],
    ) -> anyhow::Result<(String, tokio::task::JoinHandle<anyhow::Result<String>>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("http://{}/asset.zip", listener.local_addr()?);
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await?;
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(response).await?;
            socket.shutdown().await?;
            Ok(String::from_utf8_lossy(&request).to_lowercase())
        });
        Ok((url, server))
    }

    fn local_transport(config: &Config) -> anyhow::Result<ReqwestTransport> {
        let client = ReqwestTransport::client_builder(config).no_proxy().build()?;
        Ok(ReqwestTransport::from_client(client))
    }

    #[tokio::test]
    async fn test_reqwest_transport_request_and_response() -> anyhow::Result<()> {
        let (url, server) = serve_once(
            b"HTTP/1.1 201 Created\r\nContent-Length: 5\r\nLink: <next>; rel=\"next\"\r\nConnection: close\r\n\r\nhello",
        )
        .await?;
        let transport = local_transport(&Config::default())?;

        let response = transport.get(&url, "application/octet-stream").await?;
        assert_eq!(response.status, StatusCode::CREATED);
        assert_eq!(response.content_length, Some(5));
        assert_eq!(response.header("link"), Some("<next>; rel=\"next\""));
        assert_eq!(response.bytes().await?, b"hello");

        let request = server.await??;
        assert!(request.starts_with("get /asset.zip http/1.1\r\n"), "{request}");
        assert!(
            request.contains(&format!("user-agent: {}\r\n", DEFAULT_USER_AGENT)),
            "{request}"
        );
        assert!(request.contains("accept: application/octet-stream\r\n"), "{request}");
        Ok(())
    }

    #[tokio::test]
    async fn test_reqwest_transport_truncated_body_is_interrupted() -> anyhow::Result<()> {
        let (url, server) = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 10\r\nConnection: close\r\n\r\nabc",
        )
        .await?;
        let transport = local_transport(&Config::default())?;

        let response = transport.get(&url, "*/*").await?;
        assert_eq!(response.content_length, Some(10));
        match response.bytes().await {
            Err(Error::Interrupted { url: failed, .. }) => assert_eq!(failed, url),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(body) => panic!("expected an interrupted body, got {} bytes", body.len()),
        }
        server.await??;
        Ok(())
    }
}
