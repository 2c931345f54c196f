//! Request forwarding core.
//!
//! # Data Flow
//! ```text
//! InboundContext
//!     → [intercept hook] (short-circuit, caller writes its own response)
//!     → request.rs (OutboundRequest: method, target, headers, body)
//!         → forwarded.rs (X-Forwarded-*, Forwarded)
//!     → [before_send hook]
//!     → client registry → HttpClient::send (headers only, body streams later)
//!     → [after_receive hook]
//!     → response.rs (status + headers + streamed body into the ResponseSink)
//! ```
//!
//! # Design Decisions
//! - One request, one target, one attempt; no retries or buffering
//! - Header values are forwarded byte-for-byte, never re-parsed
//! - Header placement is an explicit classification, not a fallible insert
//! - Cancellation of the inbound request aborts dispatch and body copy

pub mod context;
pub mod error;
pub mod forwarded;
pub mod forwarder;
pub mod headers;
pub mod options;
pub mod request;
pub mod response;
pub mod sink;

pub use context::{ConnectionInfo, InboundContext};
pub use error::{ExchangePhase, ProxyError};
pub use forwarded::ForwardedHeaders;
pub use forwarder::Forwarder;
pub use headers::HeaderKind;
pub use options::ProxyOptions;
pub use request::{build_outbound_request, OutboundContent, OutboundRequest};
pub use response::{relay_response, UpstreamResponse};
pub use sink::{CapturedResponse, MemorySink, ResponseCapture, ResponseSink};
