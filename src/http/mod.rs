//! HTTP hosting subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → request.rs (peer addresses, upstream URL)
//!     → proxy::Forwarder (spawned task) → sink.rs (ChannelSink)
//!     → response.rs (error → status) or streamed upstream response
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod sink;

pub use request::{PeerInfo, X_REQUEST_ID};
pub use server::HttpServer;
pub use sink::{ChannelSink, PendingResponse};
