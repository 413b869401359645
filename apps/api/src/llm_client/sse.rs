//! Server-Sent Events framing over a reqwest byte stream.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_util::{Stream, StreamExt};
use memchr::memmem;

use super::LlmError;

/// Upper bound on buffered bytes without a complete event.
const MAX_BUFFER_BYTES: usize = 1_000_000;

/// The `data` payload of one SSE event. Vertex sends no other fields we use.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    pub data: String,
}

impl SseEvent {
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }
}

/// Splits a byte stream into SSE events, holding partial events (and split
/// UTF-8 sequences) across chunk boundaries.
pub struct SseStream<S> {
    inner: S,
    buffer: Vec<u8>,
    events: VecDeque<SseEvent>,
    finished: bool,
}

impl<S> SseStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
            events: VecDeque::new(),
            finished: false,
        }
    }

    fn parse_buffer(&mut self) -> Result<(), LlmError> {
        let finder = memmem::Finder::new(b"\n\n");
        let mut start = 0;

        while let Some(pos) = finder.find(&self.buffer[start..]) {
            let end = start + pos;
            let text = std::str::from_utf8(&self.buffer[start..end])
                .map_err(|e| LlmError::Stream(format!("Invalid UTF-8 in SSE event: {e}")))?;

            if let Some(event) = parse_event(text) {
                self.events.push_back(event);
            }
            start = end + 2;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }
        Ok(())
    }
}

fn parse_event(text: &str) -> Option<SseEvent> {
    let mut data_lines = Vec::new();

    for line in text.lines() {
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        if let Some((field, value)) = line.split_once(':') {
            let value = value.strip_prefix(' ').unwrap_or(value);
            if field == "data" {
                data_lines.push(value);
            }
        }
    }

    if data_lines.is_empty() {
        return None;
    }

    Some(SseEvent {
        data: data_lines.join("\n"),
    })
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    type Item = Result<SseEvent, LlmError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(event) = self.events.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if self.finished {
                return Poll::Ready(None);
            }

            let chunk = match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    return Poll::Ready(Some(Err(LlmError::Stream(format!(
                        "Stream error: {e}"
                    )))));
                }
                None => {
                    // Gemini may end the body without a trailing blank line.
                    self.finished = true;
                    let rest = std::mem::take(&mut self.buffer);
                    return Poll::Ready(match std::str::from_utf8(&rest) {
                        Ok(text) => parse_event(text.trim()).map(Ok),
                        Err(e) => Some(Err(LlmError::Stream(format!(
                            "Invalid UTF-8 in SSE event: {e}"
                        )))),
                    });
                }
            };

            // CRLF framing is folded to LF; JSON payloads never carry a raw '\r'.
            self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));
            if self.buffer.len() > MAX_BUFFER_BYTES {
                self.buffer.clear();
                return Poll::Ready(Some(Err(LlmError::Stream(
                    "SSE buffer exceeded maximum size".to_string(),
                ))));
            }

            if let Err(e) = self.parse_buffer() {
                return Poll::Ready(Some(Err(e)));
            }
        }
    }
}
