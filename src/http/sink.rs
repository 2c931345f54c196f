//! Channel-backed response sink.
//!
//! # Data Flow
//! ```text
//! relay_response → ChannelSink::write
//!     first write / complete → head (oneshot) → handler returns Response
//!     chunks                 → body (bounded mpsc) → axum response body
//! ```
//!
//! The bounded body channel is the backpressure point: a slow client stalls
//! `write`, which stalls the upstream read.

use std::io;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{response, HeaderMap, Response, StatusCode};
use bytes::Bytes;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::DropGuard;

use crate::proxy::ResponseSink;

type Chunk = io::Result<Bytes>;

/// [`ResponseSink`] that hands its head and body to the serving handler.
#[derive(Debug)]
pub struct ChannelSink {
    status: StatusCode,
    headers: HeaderMap,
    // Handed out by `headers_mut` once the head is committed.
    detached: HeaderMap,
    head_tx: Option<oneshot::Sender<response::Parts>>,
    body_tx: Option<mpsc::Sender<Chunk>>,
}

/// Receiving half of a [`ChannelSink`].
#[derive(Debug)]
pub struct PendingResponse {
    pub head: oneshot::Receiver<response::Parts>,
    body: mpsc::Receiver<Chunk>,
}

/// Create a sink and its receiving half. `capacity` bounds buffered chunks.
pub fn channel(capacity: usize) -> (ChannelSink, PendingResponse) {
    let (head_tx, head_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel(capacity.max(1));
    let sink = ChannelSink {
        status: StatusCode::OK,
        headers: HeaderMap::new(),
        detached: HeaderMap::new(),
        head_tx: Some(head_tx),
        body_tx: Some(body_tx),
    };
    let pending = PendingResponse {
        head: head_rx,
        body: body_rx,
    };
    (sink, pending)
}

impl ChannelSink {
    fn is_committed(&self) -> bool {
        self.head_tx.is_none()
    }

    fn commit(&mut self) -> io::Result<()> {
        let Some(tx) = self.head_tx.take() else {
            return Ok(());
        };
        let (mut parts, ()) = Response::new(()).into_parts();
        parts.status = self.status;
        parts.headers = self.headers.clone();
        tx.send(parts).map_err(|_| closed())
    }
}

#[async_trait]
impl ResponseSink for ChannelSink {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn set_status(&mut self, status: StatusCode) {
        if !self.is_committed() {
            self.status = status;
        }
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        if self.is_committed() {
            self.detached.clear();
            return &mut self.detached;
        }
        &mut self.headers
    }

    async fn write(&mut self, chunk: Bytes) -> io::Result<()> {
        self.commit()?;
        let Some(tx) = &self.body_tx else {
            return Err(closed());
        };
        tx.send(Ok(chunk)).await.map_err(|_| closed())
    }

    async fn complete(&mut self) -> io::Result<()> {
        self.commit()?;
        self.body_tx.take();
        Ok(())
    }
}

impl Drop for ChannelSink {
    fn drop(&mut self) {
        // Committed but never completed: fail the body so the client sees a
        // truncated response rather than a clean end.
        if self.is_committed() {
            if let Some(tx) = self.body_tx.take() {
                let _ = tx.try_send(Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "upstream response ended early",
                )));
            }
        }
    }
}

impl PendingResponse {
    /// Build the client response from a committed head. `guard` lives as long
    /// as the body, so dropping the body cancels the forwarding task.
    pub fn into_response(self, head: response::Parts, guard: DropGuard) -> Response<Body> {
        let stream = futures_util::stream::unfold((self.body, guard), |(mut rx, guard)| async move {
            rx.recv().await.map(|chunk| (chunk, (rx, guard)))
        });
        Response::from_parts(head, Body::from_stream(stream))
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "client response closed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderValue};
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_first_write_commits_head() {
        let (mut sink, mut pending) = channel(4);
        sink.set_status(StatusCode::ACCEPTED);
        sink.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        assert!(pending.head.try_recv().is_err());

        sink.write(Bytes::from_static(b"abc")).await.unwrap();
        let head = pending.head.try_recv().unwrap();
        assert_eq!(head.status, StatusCode::ACCEPTED);
        assert_eq!(head.headers[header::CONTENT_TYPE], "text/plain");

        // Status is frozen once committed.
        sink.set_status(StatusCode::IM_A_TEAPOT);
        assert_eq!(sink.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_header_edits_after_commit_are_not_visible() {
        let (mut sink, _pending) = channel(4);
        sink.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        sink.write(Bytes::from_static(b"abc")).await.unwrap();

        sink.headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        sink.headers_mut()
            .insert("x-late", HeaderValue::from_static("1"));

        assert_eq!(sink.headers()[header::CONTENT_TYPE], "text/plain");
        assert!(!sink.headers().contains_key("x-late"));
    }

    #[tokio::test]
    async fn test_streams_body_to_response() {
        let (mut sink, mut pending) = channel(4);
        let token = CancellationToken::new();

        let writer = tokio::spawn(async move {
            sink.write(Bytes::from_static(b"hel")).await.unwrap();
            sink.write(Bytes::from_static(b"lo")).await.unwrap();
            sink.complete().await.unwrap();
        });

        let head = (&mut pending.head).await.unwrap();
        let response = pending.into_response(head, token.clone().drop_guard());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        writer.await.unwrap();

        assert_eq!(&body[..], b"hello");
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_complete_without_body() {
        let (mut sink, mut pending) = channel(1);
        sink.set_status(StatusCode::NO_CONTENT);
        sink.complete().await.unwrap();
        sink.complete().await.unwrap();

        let head = (&mut pending.head).await.unwrap();
        assert_eq!(head.status, StatusCode::NO_CONTENT);
        let response = pending.into_response(head, CancellationToken::new().drop_guard());
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_dropped_body_fails_writes() {
        let (mut sink, pending) = channel(1);
        drop(pending);
        assert!(sink.write(Bytes::from_static(b"x")).await.is_err());
    }

    #[tokio::test]
    async fn test_drop_before_complete_errors_body() {
        let (mut sink, mut pending) = channel(4);
        sink.write(Bytes::from_static(b"partial")).await.unwrap();
        drop(sink);

        let head = (&mut pending.head).await.unwrap();
        let response = pending.into_response(head, CancellationToken::new().drop_guard());
        assert!(axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .is_err());
    }
}
