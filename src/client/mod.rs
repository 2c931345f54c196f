//! Outbound HTTP client abstraction.
//!
//! # Data Flow
//! ```text
//! ProxyOptions.client_name
//!     → ClientRegistry (name → Arc<dyn HttpClient>)
//!     → HttpClient::send(request, ResponseHeadersRead)
//!     → Response<Body> (head ready, body streaming)
//! ```
//!
//! # Design Decisions
//! - The registry is a plain value injected into the `Forwarder`; no globals
//! - Connection pooling is entirely the client's concern
//! - Dropping the `send` future aborts the in-flight call

pub mod hyper_client;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, Response};
use thiserror::Error;

use crate::config::schema::ClientProfileConfig;

pub use hyper_client::HyperClient;

/// Profile name used when the caller does not pick one.
pub const HTTP_PROXY_CLIENT_NAME: &str = "http-proxy-client";

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// How much of the response must be read before `send` returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionMode {
    /// Return as soon as the head is parsed; the body streams afterwards.
    ResponseHeadersRead,
    /// Buffer the whole body before returning.
    ResponseContentRead,
}

/// Client-side dispatch failures.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connect failed: {0}")]
    Connect(#[source] BoxError),

    #[error("request failed: {0}")]
    Request(#[source] BoxError),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// Sends one request and yields the upstream response.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(
        &self,
        request: Request<Body>,
        mode: CompletionMode,
    ) -> Result<Response<Body>, ClientError>;
}

/// Named client profiles.
#[derive(Clone, Default)]
pub struct ClientRegistry {
    clients: HashMap<String, Arc<dyn HttpClient>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a hyper client per configured profile. The default profile is
    /// always present, with default settings unless configured.
    pub fn from_profiles<'a>(
        profiles: impl IntoIterator<Item = (&'a String, &'a ClientProfileConfig)>,
    ) -> Self {
        let mut registry = Self::new();
        for (name, profile) in profiles {
            registry.register(name.clone(), Arc::new(HyperClient::from_profile(profile)));
        }
        if registry.get(HTTP_PROXY_CLIENT_NAME).is_none() {
            registry.register(
                HTTP_PROXY_CLIENT_NAME,
                Arc::new(HyperClient::from_profile(&ClientProfileConfig::default())),
            );
        }
        registry
    }

    pub fn register(&mut self, name: impl Into<String>, client: Arc<dyn HttpClient>) {
        self.clients.insert(name.into(), client);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn HttpClient>> {
        self.clients.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }
}

impl fmt::Debug for ClientRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientRegistry")
            .field("clients", &self.clients.keys().collect::<Vec<_>>())
            .finish()
    }
}
