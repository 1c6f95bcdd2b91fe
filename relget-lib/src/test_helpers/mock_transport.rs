use crate::error::{Error, Result};
use crate::transport::{Transport, TransportResponse};
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A canned response served by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct MockRoute {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    chunk_size: usize,
    content_length: Option<u64>,
    fail_after_chunks: Option<usize>,
}

impl MockRoute {
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            content_length: Some(body.len() as u64),
            body,
            chunk_size: 64,
            fail_after_chunks: None,
        }
    }

    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            ..Self::ok(Vec::new())
        }
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Announce a different length than the body actually has.
    pub fn content_length(mut self, content_length: Option<u64>) -> Self {
        self.content_length = content_length;
        self
    }

    /// Serve `chunks` body chunks, then break the stream.
    pub fn fail_after(mut self, chunks: usize) -> Self {
        self.fail_after_chunks = Some(chunks);
        self
    }

    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        self.headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_str(value).expect("valid header value"),
        );
        self
    }
}

/// In-memory [`Transport`] that records every requested URL.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    routes: HashMap<String, MockRoute>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(mut self, url: &str, route: MockRoute) -> Self {
        self.routes.insert(url.to_string(), route);
        self
    }

    pub fn with_body(self, url: &str, body: Vec<u8>) -> Self {
        self.with_route(url, MockRoute::ok(body))
    }

    pub fn with_json(self, url: &str, json: &str) -> Self {
        self.with_route(url, MockRoute::ok(json.as_bytes().to_vec()))
    }

    pub fn with_status(self, url: &str, status: StatusCode) -> Self {
        self.with_route(url, MockRoute::status(status))
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl Transport for MockTransport {
    async fn get(&self, url: &str, _accept: &str) -> Result<TransportResponse> {
        self.requests.lock().unwrap().push(url.to_string());

        let Some(route) = self.routes.get(url) else {
            return Err(Error::Interrupted {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            });
        };

        let mut chunks: Vec<Result<Bytes>> = route
            .body
            .chunks(route.chunk_size)
            .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
            .collect();
        if let Some(limit) = route.fail_after_chunks {
            chunks.truncate(limit);
            chunks.push(Err(Error::Interrupted {
                url: url.to_string(),
                reason: "connection reset".to_string(),
            }));
        }

        Ok(TransportResponse {
            url: url.to_string(),
            status: route.status,
            headers: route.headers.clone(),
            content_length: route.content_length,
            body: Box::pin(futures_util::stream::iter(chunks)),
        })
    }
}

/// `count` bytes of a repeating pattern.
pub fn payload(count: usize) -> Vec<u8> {
    (0..count).map(|i| (i % 251) as u8).collect()
}
