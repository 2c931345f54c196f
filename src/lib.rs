//! Single-hop HTTP forwarding library.
//!
//! `proxy` holds the forwarding core: outbound request construction, header
//! placement, forwarded headers, dispatch and response relay. `client`
//! supplies named outbound clients, and `http` is an axum host that feeds
//! every inbound request through the core.

pub mod client;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;

pub use client::{ClientRegistry, HttpClient, HTTP_PROXY_CLIENT_NAME};
pub use config::schema::RelayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use proxy::{Forwarder, InboundContext, ProxyError, ProxyOptions};
