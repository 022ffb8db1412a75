//! Client for the remote pattern-digitizing model.
//!
//! One request per call: fixed instruction, structured-output schema, the
//! inline image and a low sampling temperature. No retries; every failure
//! is returned to the caller as a [`DigitizeError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::error::DigitizeError;
use crate::models::{GeminiConfig, PatternData, ValidationError};
use crate::services::encoder::EncodedImage;
use crate::services::prompt;

/// Turns an encoded photo into a digitized pattern
#[async_trait]
pub trait PatternDigitizer: Send + Sync {
    async fn digitize(&self, image: &EncodedImage) -> Result<PatternData, DigitizeError>;
}

/// `generateContent` client for Gemini models
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, DigitizeError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Request body for one digitize call
    pub fn build_request(&self, image: &EncodedImage) -> GenerateContentRequest {
        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::text(prompt::SYSTEM_INSTRUCTION)],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::text(prompt::USER_PROMPT),
                    Part::InlineData {
                        inline_data: Blob {
                            mime_type: image.mime_type.clone(),
                            data: image.data.clone(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: prompt::response_schema(),
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl PatternDigitizer for GeminiClient {
    async fn digitize(&self, image: &EncodedImage) -> Result<PatternData, DigitizeError> {
        let body = self.build_request(image);

        tracing::info!(
            model = %self.model,
            mime_type = %image.mime_type,
            payload_bytes = image.data.len(),
            "Sending digitize request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Digitize request failed");
                DigitizeError::Transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), "Model endpoint returned an error");
            return Err(DigitizeError::Status {
                status: status.as_u16(),
                body: truncate(&body, 500),
            });
        }

        let raw = response.text().await?;
        let envelope: GenerateContentResponse = serde_json::from_str(&raw).map_err(|e| {
            tracing::error!(error = %e, "Model endpoint returned a non-JSON body");
            DigitizeError::MalformedResponse(e.to_string())
        })?;
        let text = envelope.text()?;
        let pattern = parse_pattern_response(&text)?;

        tracing::info!(
            pattern = %pattern.analysis_summary.pattern_name,
            files = pattern.files.len(),
            colors = pattern.color_palette.len(),
            "Digitize request succeeded"
        );

        Ok(pattern)
    }
}

/// Parse and validate the model's JSON text.
///
/// Syntax errors are [`DigitizeError::MalformedResponse`]; well-formed JSON
/// with the wrong shape or out-of-range values is
/// [`DigitizeError::Validation`]; no files is [`DigitizeError::EmptyResult`].
pub fn parse_pattern_response(text: &str) -> Result<PatternData, DigitizeError> {
    let value: Value = serde_json::from_str(text.trim())
        .map_err(|e| DigitizeError::MalformedResponse(e.to_string()))?;

    // The file list is checked before the full shape so a response that
    // merely omits files gets the dedicated error.
    let has_files = value
        .get("files")
        .and_then(Value::as_array)
        .is_some_and(|files| !files.is_empty());
    if !has_files {
        return Err(DigitizeError::EmptyResult);
    }

    let mut pattern: PatternData = serde_json::from_value(value)
        .map_err(|e| DigitizeError::Validation(ValidationError::single(e.to_string())))?;
    pattern.validate().map_err(DigitizeError::Validation)?;
    pattern.normalize_payloads();

    Ok(pattern)
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect::<String>() + "..."
    }
}

// Wire types for generateContent

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub system_instruction: Content,
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
    Other(Value),
}

impl Part {
    fn text(s: &str) -> Self {
        Part::Text {
            text: s.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Value,
    pub temperature: f32,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    #[serde(default)]
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate
    pub fn text(&self) -> Result<String, DigitizeError> {
        if let Some(reason) = self
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(DigitizeError::Blocked(format!("prompt blocked: {reason}")));
        }

        let candidate = self
            .candidates
            .first()
            .ok_or_else(|| DigitizeError::Blocked("no candidates".to_string()))?;

        let text: String = candidate
            .content
            .iter()
            .flat_map(|c| c.parts.iter())
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if text.trim().is_empty() {
            let reason = candidate.finish_reason.as_deref().unwrap_or("empty response");
            return Err(DigitizeError::Blocked(reason.to_string()));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_response() -> Value {
        json!({
            "analysis_summary": {
                "pattern_name": "Navy Stripe",
                "description": "...",
                "repeat_type": "straight",
                "fidelity_notes": "..."
            },
            "tile_properties": {
                "dpi": 300, "width_px": 1200, "height_px": 1200,
                "width_cm": 10.2, "height_cm": 10.2
            },
            "color_palette": [
                { "name": "Navy", "hex": "#1B2A4A", "cmyk_approx": "C91 M79 Y0 K0" }
            ],
            "files": [
                { "filename": "tile.png", "mime_type": "image/png", "data": "iVBORw0KGgo=" }
            ]
        })
    }

    fn client() -> GeminiClient {
        GeminiClient::new(&GeminiConfig {
            api_key: "test-key".to_string(),
            base_url: "http://localhost:1/v1beta/".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_parse_valid_response() {
        let text = format!("  {}\n", valid_response());
        let pattern = parse_pattern_response(&text).unwrap();
        assert_eq!(pattern.analysis_summary.pattern_name, "Navy Stripe");
        assert_eq!(pattern.tile_properties.width_px, 1200.0);
        assert_eq!(pattern.files.len(), 1);
    }

    #[test]
    fn test_parse_normalizes_unpadded_and_wrapped_payloads() {
        for data in ["iVBORw0KGgo", "iVBORw0K\nGgo="] {
            let mut value = valid_response();
            value["files"][0]["data"] = json!(data);
            let pattern = parse_pattern_response(&value.to_string()).unwrap();
            assert_eq!(pattern.files[0].data, "iVBORw0KGgo=");
        }
    }

    #[test]
    fn test_parse_empty_files() {
        let mut value = valid_response();
        value["files"] = json!([]);
        let err = parse_pattern_response(&value.to_string()).unwrap_err();
        assert!(matches!(err, DigitizeError::EmptyResult));
    }

    #[test]
    fn test_parse_missing_files() {
        let mut value = valid_response();
        value.as_object_mut().unwrap().remove("files");
        let err = parse_pattern_response(&value.to_string()).unwrap_err();
        assert!(matches!(err, DigitizeError::EmptyResult));
    }

    #[test]
    fn test_parse_malformed_json() {
        let err = parse_pattern_response("```json\n{}\n```").unwrap_err();
        assert!(matches!(err, DigitizeError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_wrong_shape_is_validation_error() {
        let mut value = valid_response();
        value["analysis_summary"]["repeat_type"] = json!("diagonal");
        let err = parse_pattern_response(&value.to_string()).unwrap_err();
        assert!(matches!(err, DigitizeError::Validation(_)));

        let mut value = valid_response();
        value["files"][0]["mime_type"] = json!("image/gif");
        let err = parse_pattern_response(&value.to_string()).unwrap_err();
        assert!(matches!(err, DigitizeError::Validation(_)));
    }

    #[test]
    fn test_parse_out_of_range_is_validation_error() {
        let mut value = valid_response();
        value["tile_properties"]["width_px"] = json!(-5);
        let err = parse_pattern_response(&value.to_string()).unwrap_err();
        match err {
            DigitizeError::Validation(v) => assert!(v.to_string().contains("width_px")),
            other => panic!("Expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn test_build_request_shape() {
        let image = EncodedImage {
            data: "AAAA".to_string(),
            mime_type: "image/jpeg".to_string(),
        };
        let body = serde_json::to_value(client().build_request(&image)).unwrap();

        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.1).abs() < 1e-6);
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], prompt::USER_PROMPT);
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(body["contents"][0]["parts"][1]["inlineData"]["data"], "AAAA");
        assert!(body["systemInstruction"]["role"].is_null());
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], prompt::SYSTEM_INSTRUCTION);
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        assert_eq!(
            client().endpoint(),
            "http://localhost:1/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_envelope_text_joins_parts() {
        let envelope: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] },
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(envelope.text().unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_envelope_blocked_prompt() {
        let envelope: GenerateContentResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();
        let err = envelope.text().unwrap_err();
        assert!(matches!(err, DigitizeError::Blocked(r) if r.contains("SAFETY")));
    }

    #[test]
    fn test_envelope_no_text() {
        let envelope: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{ "finishReason": "MAX_TOKENS" }]
        }))
        .unwrap();
        let err = envelope.text().unwrap_err();
        assert!(matches!(err, DigitizeError::Blocked(r) if r == "MAX_TOKENS"));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("abc", 5), "abc");
        assert_eq!(truncate("abcdef", 3), "abc...");
    }
}
