use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::ProviderError;
use crate::llm::prompts::{
    build_synthesis_prompt, DESCRIBE_BACKGROUND_PROMPT, DESCRIBE_POSE_PROMPT,
    ISOLATE_GARMENT_PROMPT, SUGGEST_BACKGROUND_PROMPT, SUGGEST_POSE_PROMPT,
};
use crate::llm::provider::{BackgroundInput, SynthesisRequest, TryOnProvider};
use crate::studio::image::ImageData;
use crate::utils::http::get_http_client;
use crate::utils::timing::log_provider_timing;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    parts: Option<Vec<GeminiPart>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: GeminiInlineData,
    },
    Other(Value),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiInlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PoseSuggestion {
    pose_description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BackgroundSuggestion {
    background_description: String,
}

fn truncate_for_log(value: &str, limit: usize) -> String {
    if value.chars().count() <= limit {
        return value.to_string();
    }
    let truncated: String = value.chars().take(limit).collect();
    format!("{truncated}... (truncated)")
}

fn build_safety_settings(profile: &str) -> Vec<Value> {
    let threshold = match profile {
        "standard" => "BLOCK_MEDIUM_AND_ABOVE",
        "permissive" => "BLOCK_ONLY_HIGH",
        _ => {
            warn!(
                "Unknown GEMINI_SAFETY_SETTINGS value '{}', using standard defaults.",
                profile
            );
            "BLOCK_MEDIUM_AND_ABOVE"
        }
    };

    vec![
        json!({ "category": "HARM_CATEGORY_HARASSMENT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_HATE_SPEECH", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_SEXUALLY_EXPLICIT", "threshold": threshold }),
        json!({ "category": "HARM_CATEGORY_DANGEROUS_CONTENT", "threshold": threshold }),
    ]
}

fn inline_part(image: &ImageData) -> Value {
    json!({
        "inlineData": {
            "mimeType": image.mime_type,
            "data": image.base64
        }
    })
}

fn summarize_gemini_parts(parts: &[Value]) -> Vec<Value> {
    parts
        .iter()
        .map(|part| {
            if let Some(text) = part.get("text").and_then(|value| value.as_str()) {
                json!({ "text": truncate_for_log(text, 200) })
            } else if let Some(inline_data) = part.get("inlineData") {
                let mime_type = inline_data
                    .get("mimeType")
                    .and_then(|value| value.as_str())
                    .unwrap_or("unknown");
                let data_len = inline_data
                    .get("data")
                    .and_then(|value| value.as_str())
                    .map(|value| value.len())
                    .unwrap_or(0);
                json!({ "inlineData": { "mimeType": mime_type, "dataLen": data_len } })
            } else {
                json!({ "unknownPart": true })
            }
        })
        .collect()
}

fn summarize_gemini_payload(payload: &Value) -> Value {
    let mut summary = Map::new();

    if let Some(contents) = payload.get("contents").and_then(|value| value.as_array()) {
        let mut summarized_contents = Vec::new();
        for content in contents {
            let role = content
                .get("role")
                .and_then(|value| value.as_str())
                .unwrap_or("user");
            let parts = content
                .get("parts")
                .and_then(|value| value.as_array())
                .map(|parts| summarize_gemini_parts(parts))
                .unwrap_or_default();
            summarized_contents.push(json!({ "role": role, "parts": parts }));
        }
        summary.insert("contents".to_string(), Value::Array(summarized_contents));
    }

    if let Some(config) = payload.get("generationConfig") {
        summary.insert("generationConfig".to_string(), config.clone());
    }

    if let Some(safety) = payload
        .get("safetySettings")
        .and_then(|value| value.as_array())
    {
        summary.insert("safetySettingsCount".to_string(), json!(safety.len()));
    }

    Value::Object(summary)
}

fn summarize_gemini_response(response: &GeminiResponse) -> Value {
    let mut text_parts = 0usize;
    let mut image_parts = 0usize;
    let mut text_preview = None;

    for candidate in response.candidates.as_deref().unwrap_or(&[]) {
        let parts = candidate
            .content
            .as_ref()
            .and_then(|content| content.parts.as_deref())
            .unwrap_or(&[]);
        for part in parts {
            match part {
                GeminiPart::Text { text } => {
                    text_parts += 1;
                    if text_preview.is_none() && !text.trim().is_empty() {
                        text_preview = Some(truncate_for_log(text, 200));
                    }
                }
                GeminiPart::InlineData { inline_data } => {
                    if inline_data.mime_type.starts_with("image/") {
                        image_parts += 1;
                    }
                }
                GeminiPart::Other(_) => {}
            }
        }
    }

    json!({
        "candidates": response.candidates.as_ref().map(|candidates| candidates.len()).unwrap_or(0),
        "textParts": text_parts,
        "imageParts": image_parts,
        "textPreview": text_preview
    })
}

fn summarize_error_body(body: &str) -> (Option<String>, String) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return (None, "empty response body".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        let message = value
            .pointer("/error/message")
            .and_then(|v| v.as_str())
            .map(|v| v.to_string())
            .or_else(|| {
                value
                    .get("message")
                    .and_then(|v| v.as_str())
                    .map(|v| v.to_string())
            });
        return (message, truncate_for_log(&value.to_string(), 2000));
    }

    (None, truncate_for_log(trimmed, 2000))
}

fn blocked_reason(response: &GeminiResponse) -> Option<String> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.clone())
    {
        return Some(reason);
    }
    response
        .candidates
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .filter_map(|candidate| candidate.finish_reason.as_deref())
        .find(|reason| matches!(*reason, "SAFETY" | "PROHIBITED_CONTENT" | "IMAGE_SAFETY"))
        .map(str::to_string)
}

fn extract_text_from_response(response: GeminiResponse) -> String {
    let mut text_parts = Vec::new();
    for candidate in response.candidates.unwrap_or_default() {
        let Some(parts) = candidate.content.and_then(|content| content.parts) else {
            continue;
        };
        for part in parts {
            if let GeminiPart::Text { text } = part {
                if !text.trim().is_empty() {
                    text_parts.push(text);
                }
            }
        }
    }
    text_parts.join("\n")
}

fn extract_first_image(response: GeminiResponse) -> Option<String> {
    for candidate in response.candidates.unwrap_or_default() {
        let Some(parts) = candidate.content.and_then(|content| content.parts) else {
            continue;
        };
        for part in parts {
            if let GeminiPart::InlineData { inline_data } = part {
                if inline_data.mime_type.starts_with("image/") && !inline_data.data.is_empty() {
                    return Some(inline_data.data);
                }
            }
        }
    }
    None
}

fn suggestion_schema(field: &str, description: &str) -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            (field): { "type": "STRING", "description": description }
        },
        "required": [field]
    })
}

pub fn build_synthesis_parts(request: &SynthesisRequest) -> Vec<Value> {
    let mut parts = vec![inline_part(&request.face), inline_part(&request.garment)];
    if let Some(BackgroundInput::Image(background)) = &request.background {
        parts.push(inline_part(background));
    }
    parts.push(json!({ "text": build_synthesis_prompt(request) }));
    parts
}

#[derive(Debug, Clone)]
pub struct GeminiProvider {
    api_key: String,
    api_base: String,
    text_model: String,
    image_model: String,
    safety_profile: String,
}

impl GeminiProvider {
    pub fn from_config(config: &Config) -> Self {
        GeminiProvider {
            api_key: config.gemini_api_key.trim().to_string(),
            api_base: config.gemini_api_base.clone(),
            text_model: config.gemini_text_model.clone(),
            image_model: config.gemini_image_model.clone(),
            safety_profile: config.gemini_safety_settings.clone(),
        }
    }

    fn redact_api_key(&self, text: &str) -> String {
        if self.api_key.is_empty() {
            return text.to_string();
        }
        text.replace(&self.api_key, "[redacted]")
    }

    fn image_payload(&self, parts: Vec<Value>) -> Value {
        json!({
            "contents": [{ "role": "user", "parts": parts }],
            "generationConfig": { "responseModalities": ["IMAGE"] },
            "safetySettings": build_safety_settings(&self.safety_profile),
        })
    }

    fn text_payload(&self, parts: Vec<Value>, generation_config: Option<Value>) -> Value {
        let mut payload = json!({
            "contents": [{ "role": "user", "parts": parts }],
            "safetySettings": build_safety_settings(&self.safety_profile),
        });
        if let (Some(config), Some(object)) = (generation_config, payload.as_object_mut()) {
            object.insert("generationConfig".to_string(), config);
        }
        payload
    }

    async fn call_gemini_api(
        &self,
        model: &str,
        payload: Value,
    ) -> Result<GeminiResponse, ProviderError> {
        let client = get_http_client();
        let url = format!("{}/models/{}:generateContent", self.api_base, model);

        if tracing::enabled!(tracing::Level::DEBUG) {
            let payload_summary = summarize_gemini_payload(&payload);
            debug!(target: "llm.gemini", model = model, payload = %payload_summary);
        }

        let response = client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| {
                let err_text = self.redact_api_key(&err.to_string());
                warn!(
                    "Gemini request failed to send: {} (timeout={}, connect={})",
                    err_text,
                    err.is_timeout(),
                    err.is_connect()
                );
                ProviderError::new(format!("Gemini request failed: {err_text}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let (message, body_summary) = summarize_error_body(&body);
            warn!("Gemini API error: status={}, body={}", status, body_summary);
            let detail = self.redact_api_key(&message.unwrap_or(body_summary));
            return Err(ProviderError::new(format!(
                "Gemini request failed with status {}: {}",
                status, detail
            )));
        }

        let value = response.json::<GeminiResponse>().await?;
        if tracing::enabled!(tracing::Level::DEBUG) {
            let response_summary = summarize_gemini_response(&value);
            debug!(target: "llm.gemini", model = model, response = %response_summary);
        }
        if let Some(reason) = blocked_reason(&value) {
            return Err(ProviderError::new(format!(
                "Gemini blocked the request: {reason} (safety)"
            )));
        }
        Ok(value)
    }

    async fn generate_image(
        &self,
        operation: &str,
        parts: Vec<Value>,
        metadata: Option<Value>,
    ) -> Result<String, ProviderError> {
        let model = self.image_model.as_str();
        let payload = self.image_payload(parts);
        log_provider_timing("gemini", model, operation, metadata, || async {
            let response = self.call_gemini_api(model, payload).await?;
            extract_first_image(response).ok_or_else(|| {
                ProviderError::new(format!(
                    "No image data found in the API response (model: {model})"
                ))
            })
        })
        .await
    }

    async fn generate_text(
        &self,
        operation: &str,
        parts: Vec<Value>,
        generation_config: Option<Value>,
    ) -> Result<String, ProviderError> {
        let model = self.text_model.as_str();
        let payload = self.text_payload(parts, generation_config);
        log_provider_timing("gemini", model, operation, None, || async {
            let response = self.call_gemini_api(model, payload).await?;
            Ok(extract_text_from_response(response).trim().to_string())
        })
        .await
    }

    async fn generate_json<T: serde::de::DeserializeOwned>(
        &self,
        operation: &str,
        prompt: &str,
        image: &ImageData,
        schema: Value,
    ) -> Result<T, ProviderError> {
        let parts = vec![json!({ "text": prompt }), inline_part(image)];
        let config = json!({
            "responseMimeType": "application/json",
            "responseSchema": schema,
        });
        let text = self.generate_text(operation, parts, Some(config)).await?;
        parse_json_reply(&text)
    }
}

fn parse_json_reply<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, ProviderError> {
    serde_json::from_str(text.trim())
        .map_err(|err| ProviderError::new(format!("Invalid JSON structure in API response: {err}")))
}

impl TryOnProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn synthesize(&self, request: &SynthesisRequest) -> Result<String, ProviderError> {
        let metadata = json!({
            "category": request.category.as_str(),
            "variation": request.variation.index,
            "total": request.variation.total,
        });
        self.generate_image("synthesize", build_synthesis_parts(request), Some(metadata))
            .await
    }

    async fn isolate_garment(&self, garment: &ImageData) -> Result<String, ProviderError> {
        let parts = vec![inline_part(garment), json!({ "text": ISOLATE_GARMENT_PROMPT })];
        self.generate_image("isolate_garment", parts, None).await
    }

    async fn describe_pose(&self, image: &ImageData) -> Result<String, ProviderError> {
        let parts = vec![json!({ "text": DESCRIBE_POSE_PROMPT }), inline_part(image)];
        self.generate_text("describe_pose", parts, None).await
    }

    async fn describe_background(&self, image: &ImageData) -> Result<String, ProviderError> {
        let parts = vec![json!({ "text": DESCRIBE_BACKGROUND_PROMPT }), inline_part(image)];
        self.generate_text("describe_background", parts, None).await
    }

    async fn suggest_pose(&self, garment: &ImageData) -> Result<String, ProviderError> {
        let schema = suggestion_schema(
            "poseDescription",
            "A detailed description of the model's pose.",
        );
        let reply: PoseSuggestion = self
            .generate_json("suggest_pose", SUGGEST_POSE_PROMPT, garment, schema)
            .await?;
        Ok(reply.pose_description)
    }

    async fn suggest_background(&self, garment: &ImageData) -> Result<String, ProviderError> {
        let schema = suggestion_schema(
            "backgroundDescription",
            "A detailed description of the scene's background.",
        );
        let reply: BackgroundSuggestion = self
            .generate_json("suggest_background", SUGGEST_BACKGROUND_PROMPT, garment, schema)
            .await?;
        Ok(reply.background_description)
    }

    async fn ping(&self) -> Result<(), ProviderError> {
        let parts = vec![json!({ "text": "ping" })];
        self.generate_text("ping", parts, None).await.map(|_| ())
    }
}
