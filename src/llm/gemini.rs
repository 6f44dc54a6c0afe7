use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::CONFIG;
use crate::llm::{EditFailed, GenerationFailed, ImageModel};
use crate::media::EncodedImage;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_model_timing;

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        #[allow(dead_code)]
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

fn redact_api_key(text: &str) -> String {
    let key = CONFIG.gemini_api_key.trim();
    if key.is_empty() {
        return text.to_string();
    }
    text.replace(key, "[redacted]")
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn summarize_error_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        if let Some(message) = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .or_else(|| value.get("message").and_then(|v| v.as_str()))
        {
            return message.to_string();
        }
        return truncate_for_log(&value.to_string(), 2000);
    }

    truncate_for_log(trimmed, 2000)
}

fn build_safety_settings() -> Vec<Value> {
    let threshold = match CONFIG.gemini_safety_settings.as_str() {
        "standard" => "BLOCK_MEDIUM_AND_ABOVE",
        _ => "OFF",
    };

    vec![
        json!({ "category": "HARM_CATEGORY_HARASSMENT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_CIVIC_INTEGRITY", "threshold": threshold }),
    ]
}

fn inline_data_part(image: &EncodedImage) -> Value {
    json!({
        "inlineData": {
            "mimeType": image.mime_type,
            "data": image.base64_data()
        }
    })
}

fn extract_image_from_response(response: GeminiResponse) -> Option<EncodedImage> {
    for candidate in response.candidates.unwrap_or_default() {
        let Some(content) = candidate.content else {
            continue;
        };
        for part in content.parts.unwrap_or_default() {
            if let GeminiPart::InlineData { inline_data } = part {
                if !inline_data.mime_type.starts_with("image/") {
                    continue;
                }
                if let Ok(bytes) = general_purpose::STANDARD.decode(inline_data.data) {
                    return Some(EncodedImage::new(inline_data.mime_type, bytes));
                }
            }
        }
    }
    None
}

/// Gemini-backed implementation of the provider boundary. One request per
/// call: no retry, no backoff; the only timeout is the transport's.
#[derive(Debug, Clone)]
pub struct GeminiImageClient {
    model: String,
}

impl GeminiImageClient {
    pub fn new() -> Self {
        Self {
            model: CONFIG.gemini_image_model.clone(),
        }
    }

    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    async fn call_image_model(
        &self,
        system_instruction: &str,
        parts: Vec<Value>,
        operation: &'static str,
    ) -> Result<EncodedImage, String> {
        let payload = json!({
            "systemInstruction": { "parts": [{ "text": system_instruction }] },
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": { "responseModalities": ["IMAGE"] },
            "safetySettings": build_safety_settings(),
        });

        let client = get_http_client();
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, CONFIG.gemini_api_key
        );

        log_model_timing("gemini", &self.model, operation, || async {
            let response = client
                .post(&url)
                .timeout(Duration::from_secs(CONFIG.generate_timeout_seconds))
                .json(&payload)
                .send()
                .await
                .map_err(|err| {
                    let detail = redact_api_key(&err.to_string());
                    warn!(
                        "Gemini {operation} request failed to send: {detail} (timeout={}, connect={})",
                        err.is_timeout(),
                        err.is_connect()
                    );
                    detail
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let detail = summarize_error_body(&body);
                warn!("Gemini {operation} returned status {status}: {detail}");
                return Err(format!("provider returned status {status}: {detail}"));
            }

            let parsed = response
                .json::<GeminiResponse>()
                .await
                .map_err(|err| redact_api_key(&err.to_string()))?;
            if tracing::enabled!(tracing::Level::DEBUG) {
                let candidates = parsed.candidates.as_ref().map(Vec::len).unwrap_or(0);
                debug!(target: "llm.gemini", model = %self.model, operation, candidates);
            }

            extract_image_from_response(parsed)
                .ok_or_else(|| "no image payload in the model response".to_string())
        })
        .await
    }
}

impl Default for GeminiImageClient {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageModel for GeminiImageClient {
    async fn generate(
        &self,
        brief: &str,
        source: &EncodedImage,
    ) -> Result<EncodedImage, GenerationFailed> {
        let parts = vec![json!({ "text": brief }), inline_data_part(source)];
        self.call_image_model(
            "Transform the supplied photo per the brief. CRITICAL: the response must be an image, NOT TEXT.",
            parts,
            "generate",
        )
        .await
        .map_err(GenerationFailed)
    }

    async fn edit(
        &self,
        image: &EncodedImage,
        instruction: &str,
    ) -> Result<EncodedImage, EditFailed> {
        let parts = vec![inline_data_part(image), json!({ "text": instruction })];
        self.call_image_model(
            "Edit the supplied image per the instruction. CRITICAL: the response must be an image, NOT TEXT.",
            parts,
            "edit",
        )
        .await
        .map_err(EditFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_the_first_image_part() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is your cover." },
                        { "inlineData": { "mimeType": "image/png", "data": general_purpose::STANDARD.encode([1u8, 2, 3]) } },
                        { "inlineData": { "mimeType": "image/png", "data": general_purpose::STANDARD.encode([9u8]) } }
                    ]
                }
            }]
        });
        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        let image = extract_image_from_response(response).expect("image part");
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, vec![1, 2, 3]);
    }

    #[test]
    fn a_text_only_response_yields_no_image() {
        let raw = json!({
            "candidates": [{
                "content": { "parts": [{ "text": "I cannot do that." }] }
            }]
        });
        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        assert!(extract_image_from_response(response).is_none());
    }

    #[test]
    fn non_image_inline_data_is_skipped() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "inlineData": { "mimeType": "application/pdf", "data": general_purpose::STANDARD.encode([1u8]) } }
                    ]
                }
            }]
        });
        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        assert!(extract_image_from_response(response).is_none());
    }

    #[test]
    fn error_bodies_summarize_to_the_provider_message() {
        let body = r#"{"error": {"code": 400, "message": "Invalid image payload"}}"#;
        assert_eq!(summarize_error_body(body), "Invalid image payload");
        assert_eq!(summarize_error_body("   "), "empty response body");
        assert_eq!(summarize_error_body("plain text"), "plain text");
    }
}
