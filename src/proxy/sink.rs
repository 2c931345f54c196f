//! Response sink abstraction.
//!
//! The sink is the hosting server's outbound response: a status, a header map,
//! and a writable body. Status and headers may change until the first body
//! write (or completion) commits them.

use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use bytes::{Bytes, BytesMut};

/// Where the relayed response is written.
#[async_trait]
pub trait ResponseSink: Send {
    fn status(&self) -> StatusCode;

    fn set_status(&mut self, status: StatusCode);

    fn headers(&self) -> &HeaderMap;

    /// Headers to send. Edits made after the head is committed are not
    /// seen by the client.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Write one body chunk. The first call commits status and headers.
    async fn write(&mut self, chunk: Bytes) -> io::Result<()>;

    /// Finish the response. Commits the head if nothing was written; calling
    /// it again is a no-op.
    async fn complete(&mut self) -> io::Result<()>;
}

/// A response captured by [`MemorySink`] once it completed.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Shared view of what a [`MemorySink`] produced. Empty until the sink
/// completes.
#[derive(Debug, Clone, Default)]
pub struct ResponseCapture(Arc<Mutex<Option<CapturedResponse>>>);

impl ResponseCapture {
    pub fn get(&self) -> Option<CapturedResponse> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// In-memory sink for embedding the forwarder where the whole response is
/// wanted at once (and for tests).
#[derive(Debug)]
pub struct MemorySink {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
    capture: ResponseCapture,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
            capture: ResponseCapture::default(),
        }
    }

    /// Handle that observes the response after the sink has been moved into
    /// an `InboundContext`.
    pub fn capture(&self) -> ResponseCapture {
        self.capture.clone()
    }

    fn is_completed(&self) -> bool {
        self.capture.get().is_some()
    }
}

impl Default for MemorySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResponseSink for MemorySink {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    async fn write(&mut self, chunk: Bytes) -> io::Result<()> {
        if self.is_completed() {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "response already completed",
            ));
        }
        self.body.extend_from_slice(&chunk);
        Ok(())
    }

    async fn complete(&mut self) -> io::Result<()> {
        let mut slot = self.capture.0.lock().unwrap_or_else(|e| e.into_inner());
        if slot.is_none() {
            *slot = Some(CapturedResponse {
                status: self.status,
                headers: self.headers.clone(),
                body: self.body.split().freeze(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capture_after_complete() {
        let mut sink = MemorySink::new();
        let capture = sink.capture();

        sink.set_status(StatusCode::CREATED);
        sink.write(Bytes::from_static(b"he")).await.unwrap();
        sink.write(Bytes::from_static(b"llo")).await.unwrap();
        assert!(capture.get().is_none());

        sink.complete().await.unwrap();
        sink.complete().await.unwrap();

        let captured = capture.get().unwrap();
        assert_eq!(captured.status, StatusCode::CREATED);
        assert_eq!(&captured.body[..], b"hello");
        assert!(sink.write(Bytes::from_static(b"late")).await.is_err());
    }
}
