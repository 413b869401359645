//! Wire types for the Vertex AI `streamGenerateContent` endpoint (Gemini models).

use serde::{Deserialize, Serialize};

pub const HARM_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_HARASSMENT",
];

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub system_instruction: Content,
    pub generation_config: GenerationConfig,
    pub safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: &str) -> Self {
        Content {
            role: Some("user".to_string()),
            parts: vec![Part::text(text)],
        }
    }

    /// System instructions carry no role on the wire.
    pub fn instruction(text: &str) -> Self {
        Content {
            role: None,
            parts: vec![Part::text(text)],
        }
    }
}

/// A single content part. Non-text parts deserialize with `text: None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Part {
    pub fn text(text: &str) -> Self {
        Part {
            text: Some(text.to_string()),
        }
    }
}

/// Sampling configuration sent with every tailoring request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    pub top_p: f32,
    pub seed: i32,
    pub max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            temperature: 0.7,
            top_p: 0.95,
            seed: 0,
            max_output_tokens: 65535,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetySetting {
    pub category: String,
    pub threshold: String,
}

/// All four harm categories with filtering switched off.
pub fn permissive_safety_settings() -> Vec<SafetySetting> {
    HARM_CATEGORIES
        .iter()
        .map(|category| SafetySetting {
            category: category.to_string(),
            threshold: "OFF".to_string(),
        })
        .collect()
}

/// One streamed response chunk. Every field is optional on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationChunk {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    pub usage_metadata: Option<UsageMetadata>,
    pub prompt_feedback: Option<PromptFeedback>,
    /// Set when Vertex aborts the stream with an in-band error event.
    pub error: Option<StreamError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<Content>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    pub prompt_token_count: Option<u32>,
    pub candidates_token_count: Option<u32>,
    pub total_token_count: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerationChunk {
    /// Text parts of the first candidate, in order. Later candidates are ignored.
    pub fn first_candidate_texts(&self) -> Vec<&str> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl GenerationChunk {
    /// A single-candidate chunk whose parts are the given texts.
    pub fn from_texts(texts: &[&str]) -> Self {
        GenerationChunk {
            candidates: vec![Candidate {
                content: Some(Content {
                    role: Some("model".to_string()),
                    parts: texts.iter().map(|t| Part::text(t)).collect(),
                }),
                finish_reason: None,
            }],
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_serializes_camel_case_fields() {
        let request = GenerateContentRequest {
            contents: vec![Content::user_text("hi")],
            system_instruction: Content::instruction("be brief"),
            generation_config: GenerationConfig::default(),
            safety_settings: permissive_safety_settings(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "hi");
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["generationConfig"]["topP"].as_f64().unwrap() as f32, 0.95);
        assert_eq!(value["generationConfig"]["seed"], 0);
        assert_eq!(value["generationConfig"]["maxOutputTokens"], 65535);
        assert_eq!(value["safetySettings"].as_array().unwrap().len(), 4);
        assert!(value["safetySettings"]
            .as_array()
            .unwrap()
            .iter()
            .all(|s| s["threshold"] == "OFF"));
    }

    #[test]
    fn test_chunk_without_candidates_has_no_texts() {
        let chunk: GenerationChunk =
            serde_json::from_value(json!({"usageMetadata": {"promptTokenCount": 3}})).unwrap();
        assert!(chunk.first_candidate_texts().is_empty());
    }

    #[test]
    fn test_candidate_without_content_has_no_texts() {
        let chunk: GenerationChunk =
            serde_json::from_value(json!({"candidates": [{"finishReason": "SAFETY"}]})).unwrap();
        assert!(chunk.first_candidate_texts().is_empty());
    }

    #[test]
    fn test_only_first_candidate_is_read() {
        let chunk: GenerationChunk = serde_json::from_value(json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "one"}, {"text": "two"}]}},
                {"content": {"role": "model", "parts": [{"text": "ignored"}]}}
            ]
        }))
        .unwrap();
        assert_eq!(chunk.first_candidate_texts(), vec!["one", "two"]);
    }

    #[test]
    fn test_error_event_is_captured() {
        let chunk: GenerationChunk = serde_json::from_value(json!({
            "error": {"code": 500, "message": "Internal error", "status": "INTERNAL"}
        }))
        .unwrap();
        let error = chunk.error.expect("error body should parse");
        assert_eq!(error.code, 500);
        assert_eq!(error.message, "Internal error");
    }

    #[test]
    fn test_non_text_parts_are_skipped() {
        let chunk: GenerationChunk = serde_json::from_value(json!({
            "candidates": [{"content": {"parts": [{"inlineData": {}}, {"text": "kept"}]}}]
        }))
        .unwrap();
        assert_eq!(chunk.first_candidate_texts(), vec!["kept"]);
    }
}
