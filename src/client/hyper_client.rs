//! Hyper-based client profile.
//!
//! One pooled `hyper_util` client per profile. Plain `http` and `https`
//! (rustls, bundled web PKI roots) targets are both supported; the proxy
//! does not impose any TLS policy of its own.

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::client::{ClientError, CompletionMode, HttpClient};
use crate::config::schema::ClientProfileConfig;

/// Pooled HTTP/1.1 client built from a [`ClientProfileConfig`].
#[derive(Clone, Debug)]
pub struct HyperClient {
    inner: Client<HttpsConnector<HttpConnector>, Body>,
    timeout: Option<Duration>,
}

impl HyperClient {
    pub fn from_profile(profile: &ClientProfileConfig) -> Self {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_nodelay(true);
        http.set_connect_timeout(Some(Duration::from_secs(profile.connect_timeout_secs)));

        let https = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        let inner = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(Duration::from_secs(profile.pool_idle_timeout_secs))
            .pool_max_idle_per_host(profile.pool_max_idle_per_host)
            .build(https);

        // 0 disables the overall deadline.
        let timeout = (profile.timeout_secs > 0).then(|| Duration::from_secs(profile.timeout_secs));

        Self { inner, timeout }
    }

    async fn exchange(
        &self,
        request: Request<Body>,
        mode: CompletionMode,
    ) -> Result<Response<Body>, ClientError> {
        let response = self.inner.request(request).await.map_err(classify)?;
        let (parts, body) = response.into_parts();
        let body = match mode {
            CompletionMode::ResponseHeadersRead => Body::new(body),
            CompletionMode::ResponseContentRead => {
                let bytes = axum::body::to_bytes(Body::new(body), usize::MAX)
                    .await
                    .map_err(|e| ClientError::Request(Box::new(e)))?;
                Body::from(bytes)
            }
        };
        Ok(Response::from_parts(parts, body))
    }
}

#[async_trait]
impl HttpClient for HyperClient {
    async fn send(
        &self,
        request: Request<Body>,
        mode: CompletionMode,
    ) -> Result<Response<Body>, ClientError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.exchange(request, mode))
                .await
                .map_err(|_| ClientError::Timeout(limit))?,
            None => self.exchange(request, mode).await,
        }
    }
}

fn classify(err: hyper_util::client::legacy::Error) -> ClientError {
    if err.is_connect() {
        ClientError::Connect(Box::new(err))
    } else {
        ClientError::Request(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connection_refused_is_connect_error() {
        // Bind then drop to get a port nobody listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HyperClient::from_profile(&ClientProfileConfig::default());
        let request = Request::get(format!("http://{addr}/"))
            .body(Body::empty())
            .unwrap();
        let err = client
            .send(request, CompletionMode::ResponseHeadersRead)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Connect(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_silent_upstream_hits_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            // Accept and never answer.
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let profile = ClientProfileConfig {
            timeout_secs: 1,
            ..ClientProfileConfig::default()
        };
        let client = HyperClient::from_profile(&profile);
        let request = Request::get(format!("http://{addr}/"))
            .body(Body::empty())
            .unwrap();
        let err = client
            .send(request, CompletionMode::ResponseHeadersRead)
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_content_read_buffers_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            let _ = socket
                .write_all(b"HTTP/1.1 201 Created\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok")
                .await;
        });

        let client = HyperClient::from_profile(&ClientProfileConfig::default());
        let request = Request::get(format!("http://{addr}/"))
            .body(Body::empty())
            .unwrap();
        let response = client
            .send(request, CompletionMode::ResponseContentRead)
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"ok");
    }
}
