//! Per-invocation forwarding options.

use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::client::HTTP_PROXY_CLIENT_NAME;
use crate::proxy::context::InboundContext;
use crate::proxy::request::OutboundRequest;
use crate::proxy::response::UpstreamResponse;

/// Returns `true` when the hook has handled the request itself.
pub type InterceptHook =
    Arc<dyn for<'a> Fn(&'a mut InboundContext) -> BoxFuture<'a, bool> + Send + Sync>;

/// Runs after the outbound request is built, before dispatch.
pub type BeforeSendHook = Arc<
    dyn for<'a> Fn(&'a mut InboundContext, &'a mut OutboundRequest) -> BoxFuture<'a, ()>
        + Send
        + Sync,
>;

/// Runs after the upstream head arrives, before the relay.
pub type AfterReceiveHook = Arc<
    dyn for<'a> Fn(&'a mut InboundContext, &'a mut UpstreamResponse) -> BoxFuture<'a, ()>
        + Send
        + Sync,
>;

/// Extension points and switches for one forwarding call.
#[derive(Clone)]
pub struct ProxyOptions {
    pub intercept: Option<InterceptHook>,
    pub before_send: Option<BeforeSendHook>,
    pub after_receive: Option<AfterReceiveHook>,
    /// Add `X-Forwarded-*` and `Forwarded` (default: true).
    pub add_forwarded_headers: bool,
    /// Client profile used for dispatch.
    pub client_name: String,
}

impl ProxyOptions {
    pub fn new() -> Self {
        Self {
            intercept: None,
            before_send: None,
            after_receive: None,
            add_forwarded_headers: true,
            client_name: HTTP_PROXY_CLIENT_NAME.to_string(),
        }
    }

    pub fn with_intercept<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a mut InboundContext) -> BoxFuture<'a, bool> + Send + Sync + 'static,
    {
        self.intercept = Some(Arc::new(hook));
        self
    }

    pub fn with_before_send<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a mut InboundContext, &'a mut OutboundRequest) -> BoxFuture<'a, ()>
            + Send
            + Sync
            + 'static,
    {
        self.before_send = Some(Arc::new(hook));
        self
    }

    pub fn with_after_receive<F>(mut self, hook: F) -> Self
    where
        F: for<'a> Fn(&'a mut InboundContext, &'a mut UpstreamResponse) -> BoxFuture<'a, ()>
            + Send
            + Sync
            + 'static,
    {
        self.after_receive = Some(Arc::new(hook));
        self
    }

    pub fn with_forwarded_headers(mut self, enabled: bool) -> Self {
        self.add_forwarded_headers = enabled;
        self
    }

    pub fn with_client_name(mut self, name: impl Into<String>) -> Self {
        self.client_name = name.into();
        self
    }
}

impl Default for ProxyOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProxyOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyOptions")
            .field("intercept", &self.intercept.is_some())
            .field("before_send", &self.before_send.is_some())
            .field("after_receive", &self.after_receive.is_some())
            .field("add_forwarded_headers", &self.add_forwarded_headers)
            .field("client_name", &self.client_name)
            .finish()
    }
}
