//! LLM provider adapter: text fallback answers, image description, and
//! media generation.
//!
//! Provider selection happens once at startup: the Gemini-style provider
//! when `GEMINI_API_KEY` is present, otherwise one OpenAI-compatible
//! alternate via `OPENAI_API_KEY`, otherwise disabled. Exactly one
//! provider serves a request; there are no speculative parallel calls.
//!
//! The ask path never returns an error. Network failures, non-2xx
//! statuses, and unrecognized response shapes all become textual answers
//! with `ok: false`, so the pipeline can tell a genuine model answer from
//! a degraded one. Media generation does propagate provider errors, since
//! those endpoints surface the provider body in their 500 responses.
//!
//! Response text extraction runs an ordered list of extractor functions
//! over the response JSON. The provider's schema has shifted across
//! versions, so new shapes get a new entry in [`TEXT_EXTRACTORS`] rather
//! than ad hoc probing at call sites.

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::config::{Config, LlmConfig};

/// Fixed answer when no provider credential is configured.
pub const NOT_CONFIGURED_MESSAGE: &str =
    "AI answers are not configured on this server yet, so I can only answer from campus records.";

const DEFAULT_GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// The provider this process talks to, decided once at startup.
#[derive(Debug, Clone)]
pub enum Provider {
    Gemini { key: String },
    OpenAiCompatible { key: String },
    Disabled,
}

impl Provider {
    /// Pick from the environment: primary key first, then the alternate.
    pub fn from_env() -> Self {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.trim().is_empty() {
                return Provider::Gemini { key };
            }
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                return Provider::OpenAiCompatible { key };
            }
        }
        Provider::Disabled
    }
}

/// An answer from the adapter. `ok` distinguishes a genuine extracted
/// answer from a placeholder or diagnostic text.
#[derive(Debug, Clone)]
pub struct LlmReply {
    pub text: String,
    pub ok: bool,
}

impl LlmReply {
    fn degraded(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ok: false,
        }
    }

    /// Usable as a real answer: genuinely extracted and non-empty.
    pub fn is_meaningful(&self) -> bool {
        self.ok && !self.text.trim().is_empty()
    }
}

/// Client for the configured provider.
pub struct LlmClient {
    provider: Provider,
    llm: LlmConfig,
    persona: String,
    client: reqwest::Client,
}

impl LlmClient {
    /// Build from config, selecting the provider from the environment.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::with_provider(Provider::from_env(), config)
    }

    /// Build with an explicit provider.
    pub fn with_provider(provider: Provider, config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.llm.timeout_secs))
            .build()
            .context("Failed to build HTTP client for the LLM provider")?;
        Ok(Self {
            provider,
            llm: config.llm.clone(),
            persona: persona_preamble(&config.ask.institution),
            client,
        })
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self.provider, Provider::Disabled)
    }

    /// Provider name for `desk check` and debug payloads.
    pub fn provider_name(&self) -> &'static str {
        match self.provider {
            Provider::Gemini { .. } => "gemini",
            Provider::OpenAiCompatible { .. } => "openai-compatible",
            Provider::Disabled => "disabled",
        }
    }

    /// Answer a question. Never errors; at most two sequential provider
    /// calls (a retry with a stricter instruction when the first response
    /// extracts to nothing).
    pub async fn answer(&self, question: &str) -> LlmReply {
        match &self.provider {
            Provider::Disabled => LlmReply::degraded(NOT_CONFIGURED_MESSAGE),
            Provider::Gemini { key } => {
                let first = self
                    .call_gemini(key, &self.llm.model, ask_body(&self.persona, question, false))
                    .await;
                match first {
                    Ok(value) => {
                        if let Some(text) = extract_text(&value) {
                            return LlmReply { text, ok: true };
                        }
                        tracing::debug!("empty extraction from provider, retrying once");
                        match self
                            .call_gemini(key, &self.llm.model, ask_body(&self.persona, question, true))
                            .await
                        {
                            Ok(retry) => match extract_text(&retry) {
                                Some(text) => LlmReply { text, ok: true },
                                None => LlmReply::degraded(unrecognized_reply(&retry)),
                            },
                            Err(e) => LlmReply::degraded(transport_reply(&e)),
                        }
                    }
                    Err(e) => LlmReply::degraded(transport_reply(&e)),
                }
            }
            Provider::OpenAiCompatible { key } => {
                let body = json!({
                    "model": self.alternate_model(),
                    "messages": [
                        {"role": "system", "content": self.persona},
                        {"role": "user", "content": question}
                    ],
                    "temperature": 0.4
                });
                match self.call_openai(key, body).await {
                    Ok(value) => match extract_text(&value) {
                        Some(text) => LlmReply { text, ok: true },
                        None => LlmReply::degraded(unrecognized_reply(&value)),
                    },
                    Err(e) => LlmReply::degraded(transport_reply(&e)),
                }
            }
        }
    }

    /// Describe an uploaded image. Never errors; degraded outcomes become
    /// textual replies like the ask path.
    pub async fn describe_image(&self, bytes: &[u8], mime: &str) -> LlmReply {
        let key = match &self.provider {
            Provider::Disabled => return LlmReply::degraded(NOT_CONFIGURED_MESSAGE),
            Provider::OpenAiCompatible { .. } => {
                return LlmReply::degraded(
                    "Image understanding needs the primary AI provider, which is not configured.",
                );
            }
            Provider::Gemini { key } => key,
        };
        use base64::engine::general_purpose::STANDARD;
        use base64::Engine as _;
        let body = json!({
            "contents": [{"parts": [
                {"text": "Describe this image briefly for a campus visitor."},
                {"inline_data": {"mime_type": mime, "data": STANDARD.encode(bytes)}}
            ]}],
            "systemInstruction": {"parts": [{"text": self.persona}]}
        });
        match self.call_gemini(key, &self.llm.model, body).await {
            Ok(value) => match extract_text(&value) {
                Some(text) => LlmReply { text, ok: true },
                None => LlmReply::degraded(unrecognized_reply(&value)),
            },
            Err(e) => LlmReply::degraded(transport_reply(&e)),
        }
    }

    /// Generate an image for a prompt, returning base64 data. Provider
    /// errors propagate so the endpoint can surface them.
    pub async fn generate_image(&self, prompt: &str) -> Result<String> {
        let key = self.gemini_key_for_media("image generation")?;
        let body = json!({
            "contents": [{"parts": [{"text": prompt}]}],
            "generationConfig": {"responseModalities": ["TEXT", "IMAGE"]}
        });
        let value = self
            .call_gemini_with_timeout(
                key,
                &self.llm.image_model,
                body,
                Duration::from_secs(self.llm.media_timeout_secs),
            )
            .await?;
        let (_, data) =
            extract_inline_data(&value).context("no image data in provider response")?;
        Ok(data)
    }

    /// Synthesize speech for a text, returning base64 audio data.
    pub async fn synthesize_audio(&self, text: &str) -> Result<String> {
        let key = self.gemini_key_for_media("audio synthesis")?;
        let body = json!({
            "contents": [{"parts": [{"text": text}]}],
            "generationConfig": {
                "responseModalities": ["AUDIO"],
                "speechConfig": {
                    "voiceConfig": {"prebuiltVoiceConfig": {"voiceName": "Kore"}}
                }
            }
        });
        let value = self
            .call_gemini_with_timeout(
                key,
                &self.llm.tts_model,
                body,
                Duration::from_secs(self.llm.media_timeout_secs),
            )
            .await?;
        let (_, data) =
            extract_inline_data(&value).context("no audio data in provider response")?;
        Ok(data)
    }

    fn gemini_key_for_media(&self, what: &str) -> Result<&str> {
        match &self.provider {
            Provider::Gemini { key } => Ok(key),
            Provider::Disabled => anyhow::bail!("LLM provider is not configured"),
            Provider::OpenAiCompatible { .. } => {
                anyhow::bail!("{} requires the primary provider", what)
            }
        }
    }

    fn alternate_model(&self) -> &str {
        if self.llm.model.starts_with("gemini") {
            DEFAULT_OPENAI_MODEL
        } else {
            &self.llm.model
        }
    }

    fn gemini_base(&self) -> &str {
        self.llm
            .endpoint
            .as_deref()
            .map(|e| e.trim_end_matches('/'))
            .unwrap_or(DEFAULT_GEMINI_ENDPOINT)
    }

    async fn call_gemini(&self, key: &str, model: &str, body: Value) -> Result<Value> {
        self.call_gemini_with_timeout(
            key,
            model,
            body,
            Duration::from_secs(self.llm.timeout_secs),
        )
        .await
    }

    async fn call_gemini_with_timeout(
        &self,
        key: &str,
        model: &str,
        body: Value,
        timeout: Duration,
    ) -> Result<Value> {
        let url = format!("{}/v1beta/models/{}:generateContent", self.gemini_base(), model);
        let response = self
            .client
            .post(&url)
            .timeout(timeout)
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await
            .map_err(classify_send_error)?;
        read_json_response(response).await
    }

    async fn call_openai(&self, key: &str, body: Value) -> Result<Value> {
        let base = self
            .llm
            .endpoint
            .as_deref()
            .map(|e| e.trim_end_matches('/'))
            .unwrap_or(DEFAULT_OPENAI_ENDPOINT);
        let url = format!("{}/v1/chat/completions", base);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", key))
            .json(&body)
            .send()
            .await
            .map_err(classify_send_error)?;
        read_json_response(response).await
    }
}

/// Persona/scope preamble sent with every provider call.
fn persona_preamble(institution: &str) -> String {
    format!(
        "You are the helpful virtual assistant of {}. Answer questions about the campus, \
         its departments, faculty, courses, admissions, and placements. Keep answers short \
         and factual.",
        institution
    )
}

/// Ask request body; `strict` adds the retry instruction.
fn ask_body(persona: &str, question: &str, strict: bool) -> Value {
    let question = if strict {
        format!(
            "{}\n\nAnswer plainly in one or two short sentences. If you do not know, say so.",
            question
        )
    } else {
        question.to_string()
    };
    json!({
        "contents": [{"parts": [{"text": question}]}],
        "systemInstruction": {"parts": [{"text": persona}]},
        "generationConfig": {"temperature": 0.4, "maxOutputTokens": 512}
    })
}

fn classify_send_error(e: reqwest::Error) -> anyhow::Error {
    if e.is_timeout() {
        anyhow::anyhow!("the AI service timed out")
    } else if e.is_connect() {
        anyhow::anyhow!("could not connect to the AI service")
    } else {
        anyhow::anyhow!("AI service request failed: {}", e)
    }
}

/// Read a provider response: non-2xx carries the body for diagnostics, a
/// body starting with `<` is an HTML error page, otherwise parsed JSON.
async fn read_json_response(response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let text = response
        .text()
        .await
        .context("failed to read provider response body")?;
    if !status.is_success() {
        anyhow::bail!(
            "provider returned {}: {}",
            status,
            text.chars().take(300).collect::<String>()
        );
    }
    if text.trim_start().starts_with('<') {
        anyhow::bail!("provider returned an HTML error page instead of JSON");
    }
    serde_json::from_str(&text).context("provider returned malformed JSON")
}

// ============ Response text extraction ============

type Extractor = fn(&Value) -> Option<String>;

/// Known response shapes, tried in order. Add new shapes here.
const TEXT_EXTRACTORS: &[Extractor] = &[
    extract_gemini_parts,
    extract_gemini_content_text,
    extract_gemini_output,
    extract_openai_chat,
    extract_openai_text,
];

/// First extractor that yields non-empty text wins.
pub fn extract_text(value: &Value) -> Option<String> {
    for extractor in TEXT_EXTRACTORS {
        if let Some(text) = extractor(value) {
            let text = text.trim().to_string();
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}

/// `candidates[0].content.parts[*].text`, joined.
fn extract_gemini_parts(value: &Value) -> Option<String> {
    let parts = value
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    let texts: Vec<&str> = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(Value::as_str))
        .collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    }
}

/// `candidates[0].content.text` (older shape).
fn extract_gemini_content_text(value: &Value) -> Option<String> {
    value
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("text")?
        .as_str()
        .map(str::to_string)
}

/// `candidates[0].output` (oldest shape).
fn extract_gemini_output(value: &Value) -> Option<String> {
    value
        .get("candidates")?
        .get(0)?
        .get("output")?
        .as_str()
        .map(str::to_string)
}

/// `choices[0].message.content` (chat completions).
fn extract_openai_chat(value: &Value) -> Option<String> {
    value
        .get("choices")?
        .get(0)?
        .get("message")?
        .get("content")?
        .as_str()
        .map(str::to_string)
}

/// `choices[0].text` (legacy completions).
fn extract_openai_text(value: &Value) -> Option<String> {
    value
        .get("choices")?
        .get(0)?
        .get("text")?
        .as_str()
        .map(str::to_string)
}

/// Inline binary payload from a media response, as `(mime, base64)`.
/// Accepts both `inline_data`/`mime_type` and `inlineData`/`mimeType`.
pub fn extract_inline_data(value: &Value) -> Option<(String, String)> {
    let parts = value
        .get("candidates")?
        .get(0)?
        .get("content")?
        .get("parts")?
        .as_array()?;
    for part in parts {
        let Some(inline) = part.get("inline_data").or_else(|| part.get("inlineData")) else {
            continue;
        };
        let Some(data) = inline.get("data").and_then(Value::as_str) else {
            continue;
        };
        let mime = inline
            .get("mime_type")
            .or_else(|| inline.get("mimeType"))
            .and_then(Value::as_str)
            .unwrap_or("application/octet-stream");
        return Some((mime.to_string(), data.to_string()));
    }
    None
}

fn unrecognized_reply(value: &Value) -> String {
    let raw = value.to_string();
    let excerpt: String = raw.chars().take(300).collect();
    format!("The AI service sent a response I could not read: {}", excerpt)
}

fn transport_reply(e: &anyhow::Error) -> String {
    format!("Sorry, I could not get an AI answer right now ({}).", e)
}
