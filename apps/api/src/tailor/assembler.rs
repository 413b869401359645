//! Stream Assembler — turns model response chunks into display updates.
//!
//! Each non-empty text fragment becomes one `Append`, in arrival order, so a
//! front end only ever extends what it already shows. The first upstream
//! error ends the feed with a single `Replace` carrying a generic retry
//! message; the error itself goes to the log only.

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_util::{Stream, StreamExt};
use serde::Serialize;
use tracing::{debug, error, Span};

use crate::llm_client::types::GenerationChunk;
use crate::llm_client::LlmError;

pub const GENERATION_FAILED_MESSAGE: &str =
    "We ran into an issue while tailoring the resume. Please try again in a moment.";

/// One instruction for the output box.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum DisplayUpdate {
    /// Overwrite the whole output with this text.
    Replace(String),
    /// Extend the output with this fragment.
    Append(String),
}

impl DisplayUpdate {
    pub fn replace(text: impl Into<String>) -> Self {
        DisplayUpdate::Replace(text.into())
    }

    pub fn append(text: impl Into<String>) -> Self {
        DisplayUpdate::Append(text.into())
    }
}

/// Lazily maps a chunk stream to display updates.
///
/// The upstream stream is dropped as soon as it ends or fails, and dropping the
/// assembler drops it too, so an abandoned request never drains the body.
pub struct UpdateStream<S> {
    inner: Option<S>,
    pending: VecDeque<DisplayUpdate>,
    span: Span,
    fragments: usize,
}

impl<S> UpdateStream<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner: Some(inner),
            pending: VecDeque::new(),
            span: Span::none(),
            fragments: 0,
        }
    }

    /// Records log lines from this stream under `span`.
    pub fn in_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl<S> Stream for UpdateStream<S>
where
    S: Stream<Item = Result<GenerationChunk, LlmError>> + Unpin,
{
    type Item = DisplayUpdate;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        let _entered = this.span.enter();

        loop {
            if let Some(update) = this.pending.pop_front() {
                return Poll::Ready(Some(update));
            }

            let Some(inner) = this.inner.as_mut() else {
                return Poll::Ready(None);
            };

            match ready!(inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => {
                    for text in chunk.first_candidate_texts() {
                        if text.is_empty() {
                            continue;
                        }
                        this.fragments += 1;
                        this.pending.push_back(DisplayUpdate::append(text));
                    }
                }
                Some(Err(e)) => {
                    this.inner = None;
                    error!(
                        fragments = this.fragments,
                        "Failed to generate tailored resume: {e}"
                    );
                    return Poll::Ready(Some(DisplayUpdate::replace(GENERATION_FAILED_MESSAGE)));
                }
                None => {
                    this.inner = None;
                    debug!(fragments = this.fragments, "Generation stream finished");
                }
            }
        }
    }
}
