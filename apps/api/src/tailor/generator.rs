//! Tailoring pipeline — one request from access check to display updates.
//!
//! Flow: validator → check_inputs → build_prompt → TextGenerator stream →
//!       UpdateStream.
//!
//! Every outcome is a stream of `DisplayUpdate`s: rejections and missing-input
//! notices are a single `Replace`, and model failures end the feed with one.

use std::sync::Arc;

use axum::http::HeaderMap;
use futures_util::stream::{self, BoxStream};
use futures_util::{future, StreamExt};
use serde::Deserialize;
use tracing::{info, info_span};
use uuid::Uuid;

use crate::llm_client::{ChunkStream, TextGenerator};
use crate::state::AppState;
use crate::tailor::assembler::{DisplayUpdate, UpdateStream};
use crate::tailor::prompts::{build_prompt, PromptPayload};
use crate::tailor::validation::check_inputs;

/// Request body for resume tailoring.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub resume_template: String,
}

pub type UpdateFeed = BoxStream<'static, DisplayUpdate>;

/// Builds the update feed for one tailoring request.
///
/// Nothing touches the network until the feed is first polled.
pub fn tailor_updates(
    state: &AppState,
    headers: &HeaderMap,
    request: GenerationRequest,
) -> UpdateFeed {
    let request_id = Uuid::new_v4();
    let span = info_span!("tailor", %request_id);

    if let Some(message) = state.validator.validate(headers) {
        info!(parent: &span, "Request rejected by access check");
        return single(DisplayUpdate::Replace(message));
    }

    if let Some(message) =
        check_inputs(&request.job_description, &request.resume_template).message()
    {
        info!(parent: &span, "Request missing input");
        return single(DisplayUpdate::replace(message));
    }

    let payload = build_prompt(&request.job_description, &request.resume_template);
    info!(
        parent: &span,
        jd_chars = request.job_description.len(),
        resume_chars = request.resume_template.len(),
        "Starting resume tailoring"
    );

    let chunks: ChunkStream =
        Box::pin(stream::once(open_stream(state.generator.clone(), payload)).flatten());

    UpdateStream::new(chunks).in_span(span).boxed()
}

/// Failing to open the stream is folded into the stream as its only item,
/// so the assembler handles it like any mid-stream failure.
async fn open_stream(generator: Arc<dyn TextGenerator>, payload: PromptPayload) -> ChunkStream {
    match generator
        .stream_generate(&payload.user_message, &payload.system_instruction)
        .await
    {
        Ok(chunks) => chunks,
        Err(e) => Box::pin(stream::once(future::ready(Err(e)))),
    }
}

fn single(update: DisplayUpdate) -> UpdateFeed {
    stream::once(future::ready(update)).boxed()
}


#[cfg(test)]
mod tests {
    use super::fake::{FakeGenerator, Step};
    use super::*;
    use crate::auth::{AccessKeyValidator, ACCESS_KEY_HEADER, INVALID_KEY_MESSAGE};
    use crate::config::Config;
    use crate::tailor::assembler::GENERATION_FAILED_MESSAGE;
    use crate::tailor::prompts::TAILOR_SYSTEM;
    use crate::tailor::validation::{
        MISSING_BOTH_MESSAGE, MISSING_JOB_DESCRIPTION_MESSAGE, MISSING_RESUME_MESSAGE,
    };
    use axum::http::HeaderValue;

    fn state_with(generator: Arc<FakeGenerator>, access_key: Option<&str>) -> AppState {
        AppState {
            config: Config::for_tests(),
            generator,
            validator: Arc::new(AccessKeyValidator::new(access_key.map(str::to_string))),
        }
    }

    fn request(jd: &str, resume: &str) -> GenerationRequest {
        GenerationRequest {
            job_description: jd.to_string(),
            resume_template: resume.to_string(),
        }
    }

    async fn run(state: &AppState, headers: &HeaderMap, req: GenerationRequest) -> Vec<DisplayUpdate> {
        tailor_updates(state, headers, req).collect().await
    }

    #[tokio::test]
    async fn test_missing_inputs_never_call_the_model() {
        let fake = Arc::new(FakeGenerator::fragments(&["unused"]));
        let state = state_with(fake.clone(), None);
        let headers = HeaderMap::new();

        let cases = [
            (" ", "\n", MISSING_BOTH_MESSAGE),
            ("", "Jane Doe", MISSING_JOB_DESCRIPTION_MESSAGE),
            ("Rust engineer", "  ", MISSING_RESUME_MESSAGE),
        ];
        for (jd, resume, expected) in cases {
            assert_eq!(
                run(&state, &headers, request(jd, resume)).await,
                vec![DisplayUpdate::replace(expected)]
            );
        }
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn test_rejected_key_short_circuits() {
        let fake = Arc::new(FakeGenerator::fragments(&["unused"]));
        let state = state_with(fake.clone(), Some("s3cret"));
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_KEY_HEADER, HeaderValue::from_static("wrong"));

        let updates = run(&state, &headers, request("Rust engineer", "Jane Doe")).await;
        assert_eq!(updates, vec![DisplayUpdate::replace(INVALID_KEY_MESSAGE)]);
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn test_access_check_runs_before_input_check() {
        let fake = Arc::new(FakeGenerator::fragments(&[]));
        let state = state_with(fake, Some("s3cret"));
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_KEY_HEADER, HeaderValue::from_static("wrong"));

        let updates = run(&state, &headers, request("", "")).await;
        assert_eq!(updates, vec![DisplayUpdate::replace(INVALID_KEY_MESSAGE)]);
    }

    #[tokio::test]
    async fn test_streams_appends_and_sends_built_prompt() {
        let fake = Arc::new(FakeGenerator::fragments(&["Hello, ", "World", "!"]));
        let state = state_with(fake.clone(), None);

        let updates = run(&state, &HeaderMap::new(), request("Rust engineer", "Jane Doe")).await;
        assert_eq!(
            updates,
            vec![
                DisplayUpdate::append("Hello, "),
                DisplayUpdate::append("World"),
                DisplayUpdate::append("!"),
            ]
        );

        assert_eq!(fake.calls(), 1);
        let (prompt, system) = fake.last_prompt().unwrap();
        assert_eq!(
            prompt,
            "JOB DESCRIPTION:\nRust engineer\n\nCURRENT RESUME TEMPLATE:\nJane Doe\n"
        );
        assert_eq!(system, TAILOR_SYSTEM);
    }

    #[tokio::test]
    async fn test_mid_stream_failure_keeps_partial_output() {
        let fake = Arc::new(FakeGenerator::scripted(vec![
            Step::Texts(vec!["Jane Doe"]),
            Step::Fail,
            Step::Texts(vec!["lost"]),
        ]));
        let state = state_with(fake, None);

        let updates = run(&state, &HeaderMap::new(), request("Rust engineer", "Jane Doe")).await;
        assert_eq!(
            updates,
            vec![
                DisplayUpdate::append("Jane Doe"),
                DisplayUpdate::replace(GENERATION_FAILED_MESSAGE),
            ]
        );
    }

    #[tokio::test]
    async fn test_failure_to_open_yields_single_generic_update() {
        let fake = Arc::new(FakeGenerator::unreachable());
        let state = state_with(fake.clone(), None);

        let updates = run(&state, &HeaderMap::new(), request("Rust engineer", "Jane Doe")).await;
        assert_eq!(updates, vec![DisplayUpdate::replace(GENERATION_FAILED_MESSAGE)]);
        assert_eq!(fake.calls(), 1);
    }

    #[tokio::test]
    async fn test_feed_is_lazy() {
        let fake = Arc::new(FakeGenerator::fragments(&["x"]));
        let state = state_with(fake.clone(), None);

        let feed = tailor_updates(&state, &HeaderMap::new(), request("Rust engineer", "Jane Doe"));
        assert_eq!(fake.calls(), 0);
        drop(feed);
        assert_eq!(fake.calls(), 0);
    }
}
