//! Gemini REST client
//!
//! Talks to the Generative Language API (`POST {base}/models/{model}:generateContent`).
//! Copy and templates are requested as schema-constrained JSON; images come
//! back as base64 inline data parts.

use crate::error::{GenAiError, GenAiResult};
use crate::generator::Generator;
use crate::prompt;
use crate::types::{
    CopyPrompt, GeneratedImage, GeneratedTemplate, ImagePrompt, MasterAsset, TemplatePrompt,
    TextVariant,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

/// Public endpoint of the Generative Language API
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Environment variables checked for an API key, in order
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"];

const MAX_ERROR_BODY: usize = 512;

/// Gemini client settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key; normally supplied through the environment
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub copy_model: String,
    pub image_model: String,
    pub template_model: String,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            copy_model: "gemini-2.5-flash".to_string(),
            image_model: "gemini-2.0-flash-preview-image-generation".to_string(),
            template_model: "gemini-2.5-flash".to_string(),
            timeout_secs: 120,
        }
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("copy_model", &self.copy_model)
            .field("image_model", &self.image_model)
            .field("template_model", &self.template_model)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl GeminiConfig {
    /// With API key
    #[inline]
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// With base URL
    #[inline]
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Fill a missing key from the environment
    #[must_use]
    pub fn with_env_key(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = api_key_from_env();
        }
        self
    }
}

/// First non-empty key among [`API_KEY_VARS`]
#[must_use]
pub fn api_key_from_env() -> Option<String> {
    API_KEY_VARS.iter().find_map(|var| {
        std::env::var(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

// Wire format

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    #[serde(default)]
    mime_type: String,
    #[serde(default)]
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<&'static str>>,
}

impl GenerationConfig {
    fn json(schema: Value) -> Self {
        Self {
            response_mime_type: Some("application/json"),
            response_schema: Some(schema),
            response_modalities: None,
        }
    }

    fn image() -> Self {
        Self {
            response_modalities: Some(vec!["TEXT", "IMAGE"]),
            ..Self::default()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<Blob>,
}

impl GenerateResponse {
    fn parts(&self) -> &[ResponsePart] {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|c| c.parts.as_slice())
            .unwrap_or_default()
    }

    /// Concatenated text of the first candidate
    fn text(&self) -> Option<String> {
        let text: String = self
            .parts()
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect();
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    fn first_image(&self) -> Option<&Blob> {
        self.parts()
            .iter()
            .filter_map(|p| p.inline_data.as_ref())
            .find(|blob| !blob.data.is_empty())
    }
}

/// Drop a Markdown code fence around a JSON answer
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.strip_suffix("```").unwrap_or(body).trim()
}

#[derive(Deserialize)]
struct CopyEnvelope {
    variants: Vec<TextVariant>,
}

fn parse_copy(response: &GenerateResponse) -> GenAiResult<Vec<TextVariant>> {
    let text = response.text().ok_or(GenAiError::EmptyResponse)?;
    let envelope: CopyEnvelope = serde_json::from_str(strip_fences(&text))?;
    Ok(envelope.variants)
}

fn parse_image(response: &GenerateResponse) -> GenAiResult<Option<GeneratedImage>> {
    let Some(blob) = response.first_image() else {
        return Ok(None);
    };
    let data = STANDARD
        .decode(blob.data.trim())
        .map_err(|e| GenAiError::Malformed(format!("image data is not base64: {e}")))?;
    let mime_type = if blob.mime_type.is_empty() {
        "image/png".to_string()
    } else {
        blob.mime_type.clone()
    };
    Ok(Some(GeneratedImage { mime_type, data }))
}

fn parse_template(response: &GenerateResponse) -> GenAiResult<GeneratedTemplate> {
    let text = response.text().ok_or(GenAiError::EmptyResponse)?;
    let template: GeneratedTemplate = serde_json::from_str(strip_fences(&text))?;
    if !avs_core::render::is_svg(&template.template_svg) {
        return Err(GenAiError::InvalidTemplate);
    }
    Ok(template)
}

fn user_content(parts: Vec<RequestPart>) -> Vec<Content> {
    vec![Content {
        role: "user",
        parts,
    }]
}

/// [`Generator`] backed by the Gemini API
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a client; a missing key only fails at call time
    pub fn new(config: GeminiConfig) -> GenAiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    /// Whether an API key is available
    #[inline]
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    /// Active settings
    #[inline]
    #[must_use]
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    async fn generate(
        &self,
        model: &str,
        request: &GenerateRequest,
    ) -> GenAiResult<GenerateResponse> {
        let key = self
            .config
            .api_key
            .as_deref()
            .ok_or(GenAiError::MissingApiKey)?;
        let url = format!(
            "{}/models/{model}:generateContent",
            self.config.base_url.trim_end_matches('/')
        );

        let response = self
            .http
            .post(url)
            .header("x-goog-api-key", key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GenAiError::Api {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY).collect(),
            });
        }
        debug!(model, bytes = body.len(), "Model responded");
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Generator for GeminiClient {
    #[instrument(skip_all, fields(count = prompt.count, asset = %prompt.context.asset_name))]
    async fn generate_copy(&self, prompt: CopyPrompt) -> GenAiResult<Vec<TextVariant>> {
        let request = GenerateRequest {
            contents: user_content(vec![RequestPart::Text {
                text: prompt::copy_prompt(&prompt),
            }]),
            generation_config: Some(GenerationConfig::json(prompt::copy_schema())),
        };
        let response = self.generate(&self.config.copy_model, &request).await?;
        parse_copy(&response)
    }

    #[instrument(skip_all, fields(asset = %prompt.context.asset_name))]
    async fn generate_image(&self, prompt: ImagePrompt) -> GenAiResult<Option<GeneratedImage>> {
        let request = GenerateRequest {
            contents: user_content(vec![RequestPart::Text {
                text: prompt::image_prompt(&prompt),
            }]),
            generation_config: Some(GenerationConfig::image()),
        };
        let response = self.generate(&self.config.image_model, &request).await?;
        parse_image(&response)
    }

    #[instrument(skip_all, fields(asset = %prompt.asset_name, master = %prompt.master_url))]
    async fn generate_template(&self, prompt: TemplatePrompt) -> GenAiResult<GeneratedTemplate> {
        let mut parts = vec![RequestPart::Text {
            text: prompt::template_prompt(&prompt),
        }];
        match &prompt.master {
            MasterAsset::Inline { mime_type, data } if mime_type == "image/svg+xml" => {
                parts.push(RequestPart::Text {
                    text: format!("Master asset SVG:\n{}", String::from_utf8_lossy(data)),
                });
            }
            MasterAsset::Inline { mime_type, data } => parts.push(RequestPart::Inline {
                inline_data: Blob {
                    mime_type: mime_type.clone(),
                    data: STANDARD.encode(data),
                },
            }),
            MasterAsset::Remote(_) => {}
        }

        let request = GenerateRequest {
            contents: user_content(parts),
            generation_config: Some(GenerationConfig::json(prompt::template_schema())),
        };
        let response = self.generate(&self.config.template_model, &request).await?;
        parse_template(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AssetContext;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use warp::Filter;

    fn response(value: Value) -> GenerateResponse {
        serde_json::from_value(value).unwrap()
    }

    fn text_response(text: &str) -> GenerateResponse {
        response(json!({
            "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
        }))
    }

    #[test]
    fn parses_copy_across_parts_and_fences() {
        let resp = response(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "```json\n{\"variants\": [{\"headline\": \"A\"," },
                { "text": "\"subheadline\": \"B\", \"cta\": \"C\"}]}\n```" }
            ] } }]
        }));
        let variants = parse_copy(&resp).unwrap();
        assert_eq!(
            variants,
            vec![TextVariant {
                headline: "A".into(),
                subheadline: "B".into(),
                cta: "C".into(),
            }]
        );
    }

    #[test]
    fn empty_and_malformed_copy() {
        assert!(matches!(
            parse_copy(&GenerateResponse::default()),
            Err(GenAiError::EmptyResponse)
        ));
        assert!(matches!(
            parse_copy(&text_response("{\"items\": []}")),
            Err(GenAiError::Malformed(_))
        ));
    }

    #[test]
    fn picks_first_inline_image() {
        let resp = response(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "Here is your image" },
                { "inlineData": { "mimeType": "image/jpeg", "data": STANDARD.encode(b"jpeg!") } },
                { "inlineData": { "mimeType": "image/png", "data": STANDARD.encode(b"png!") } }
            ] } }]
        }));
        let image = parse_image(&resp).unwrap().unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, b"jpeg!");
        assert_eq!(image.extension(), "jpg");
    }

    #[test]
    fn no_image_part_is_none() {
        assert_eq!(parse_image(&text_response("sorry")).unwrap(), None);
        let bad = response(json!({
            "candidates": [{ "content": { "parts": [
                { "inlineData": { "mimeType": "image/png", "data": "***" } }
            ] } }]
        }));
        assert!(matches!(parse_image(&bad), Err(GenAiError::Malformed(_))));
    }

    #[test]
    fn template_must_be_svg() {
        let ok = text_response(
            &json!({
                "templateSvg": "<svg width=\"10\" height=\"10\">{{headline}}</svg>",
                "templateFonts": [{ "family": "Arial" }],
                "defaultBindings": { "headline": "Hi" },
                "styleHints": { "palette": ["#000000"] }
            })
            .to_string(),
        );
        let template = parse_template(&ok).unwrap();
        assert_eq!(template.template_fonts[0].family, "Arial");
        assert_eq!(template.default_bindings.headline, "Hi");

        let bad = text_response(&json!({ "templateSvg": "<div/>" }).to_string());
        assert!(matches!(parse_template(&bad), Err(GenAiError::InvalidTemplate)));
    }

    #[test]
    fn request_serializes_in_api_shape() {
        let request = GenerateRequest {
            contents: user_content(vec![
                RequestPart::Text { text: "hi".into() },
                RequestPart::Inline {
                    inline_data: Blob {
                        mime_type: "image/png".into(),
                        data: "AAAA".into(),
                    },
                },
            ]),
            generation_config: Some(GenerationConfig::image()),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "contents": [{ "role": "user", "parts": [
                    { "text": "hi" },
                    { "inlineData": { "mimeType": "image/png", "data": "AAAA" } }
                ] }],
                "generationConfig": { "responseModalities": ["TEXT", "IMAGE"] }
            })
        );
    }

    #[test]
    fn debug_redacts_key() {
        let config = GeminiConfig::default().with_api_key("secret-key");
        assert!(!format!("{config:?}").contains("secret-key"));
    }

    #[tokio::test]
    async fn missing_key_fails_before_any_request() {
        let client = GeminiClient::new(GeminiConfig::default()).unwrap();
        assert!(!client.is_configured());
        let err = client
            .generate_copy(CopyPrompt {
                count: 1,
                constraints: None,
                context: AssetContext::default(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, GenAiError::MissingApiKey));
    }

    #[tokio::test]
    async fn calls_generate_content_endpoint() {
        let route = warp::post()
            .and(warp::path!("v1beta" / "models" / "gemini-2.5-flash:generateContent"))
            .and(warp::header::exact("x-goog-api-key", "test-key"))
            .and(warp::body::json())
            .map(|body: Value| {
                let schema_sent = body["generationConfig"]["responseSchema"].is_object();
                let headline = if schema_sent { "Schema" } else { "Missing" };
                warp::reply::json(&json!({
                    "candidates": [{ "content": { "parts": [{
                        "text": json!({ "variants": [
                            { "headline": headline, "subheadline": "s", "cta": "c" }
                        ] }).to_string()
                    }] } }]
                }))
            });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let config = GeminiConfig::default()
            .with_api_key("test-key")
            .with_base_url(format!("http://{addr}/v1beta/"));
        let client = GeminiClient::new(config).unwrap();
        let variants = client
            .generate_copy(CopyPrompt {
                count: 1,
                constraints: None,
                context: AssetContext::default(),
            })
            .await
            .unwrap();
        assert_eq!(variants[0].headline, "Schema");
    }

    #[tokio::test]
    async fn http_errors_carry_status() {
        let route = warp::any().map(|| {
            warp::reply::with_status("quota exceeded", warp::http::StatusCode::TOO_MANY_REQUESTS)
        });
        let (addr, server) = warp::serve(route).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);

        let config = GeminiConfig::default()
            .with_api_key("k")
            .with_base_url(format!("http://{addr}"));
        let client = GeminiClient::new(config).unwrap();
        let err = client
            .generate_image(ImagePrompt {
                context: AssetContext::default(),
                seed_image_url: None,
            })
            .await
            .unwrap_err();
        match err {
            GenAiError::Api { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body, "quota exceeded");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
