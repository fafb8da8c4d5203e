//! Ollama-backed [`InferenceEngine`] (self-hosted, no external API).
//!
//! Sends the core's ChatML prompt verbatim via `POST /api/generate` with
//! `raw: true, stream: true` and relays each NDJSON `response` field as one
//! fragment. Encoding problems are caught before the request is made;
//! server reachability is checked in `acquire` so device-unavailable is a
//! distinct, pre-stream failure.

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;

use mamboro_core::{
    ChatConfig, ChatError, EncodedPrompt, FragmentSink, GenerationParams, InferenceEngine, Result,
};

/// One line of Ollama's streaming NDJSON response.
#[derive(Debug, Deserialize)]
struct GenerateLine {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

pub struct OllamaEngine {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaEngine {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &ChatConfig) -> Self {
        Self::new(&config.engine_url, &config.model)
    }

    fn request_body(&self, input: &EncodedPrompt, params: &GenerationParams) -> serde_json::Value {
        // Greedy decoding in Ollama is temperature 0.
        let temperature = if params.do_sample {
            params.temperature
        } else {
            0.0
        };
        serde_json::json!({
            "model": self.model,
            "prompt": input.text(),
            "raw": true,
            "stream": true,
            "options": {
                "num_predict": params.max_new_tokens,
                "temperature": temperature,
                "repeat_penalty": params.repetition_penalty,
            },
        })
    }
}

#[async_trait]
impl InferenceEngine for OllamaEngine {
    fn engine_id(&self) -> &str {
        "ollama"
    }

    async fn encode(&self, prompt: &str) -> Result<EncodedPrompt> {
        // Ollama tokenizes server-side; the checks that can fail locally
        // are an unconfigured model and an empty prompt.
        if self.model.is_empty() {
            return Err(ChatError::Encoding("model identifier is empty".to_string()));
        }
        if prompt.is_empty() {
            return Err(ChatError::Encoding("prompt is empty".to_string()));
        }
        Ok(EncodedPrompt::new(prompt))
    }

    async fn acquire(&self) -> Result<()> {
        let url = format!("{}/api/version", self.base_url);
        let response = self.client.get(&url).send().await.map_err(|e| {
            ChatError::ResourceAcquisition(format!("ollama unreachable at {}: {e}", self.base_url))
        })?;
        if !response.status().is_success() {
            return Err(ChatError::ResourceAcquisition(format!(
                "ollama at {} answered {}",
                self.base_url,
                response.status()
            )));
        }
        Ok(())
    }

    async fn generate(
        &self,
        input: EncodedPrompt,
        params: &GenerationParams,
        sink: FragmentSink,
    ) -> Result<()> {
        let url = format!("{}/api/generate", self.base_url);
        let body = self.request_body(&input, params);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ChatError::Generation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ChatError::Generation(format!(
                "ollama error {status}: {text}"
            )));
        }

        let mut body_stream = response.bytes_stream();
        let mut buf: Vec<u8> = Vec::new();
        while let Some(chunk) = body_stream.next().await {
            let chunk =
                chunk.map_err(|e| ChatError::Generation(format!("stream read failed: {e}")))?;
            buf.extend_from_slice(&chunk);

            while let Some(newline) = buf.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buf.drain(..=newline).collect();
                if relay_line(&String::from_utf8_lossy(&line), &sink)? {
                    tracing::debug!(model = %self.model, "ollama stream complete");
                    return Ok(());
                }
            }
        }
        // The body can end on a line with no trailing newline; that last
        // line still carries text and the done marker.
        if relay_line(&String::from_utf8_lossy(&buf), &sink)? {
            tracing::debug!(model = %self.model, "ollama stream complete");
            return Ok(());
        }
        // Body ended without a done marker; treat as complete since the
        // connection closed cleanly.
        tracing::debug!(model = %self.model, "ollama stream closed without done marker");
        Ok(())
    }
}

/// Decode one NDJSON line and forward its text. Returns whether this line
/// carried the done marker. Blank lines are a no-op.
fn relay_line(line: &str, sink: &FragmentSink) -> Result<bool> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(false);
    }
    let parsed: GenerateLine = serde_json::from_str(line)
        .map_err(|e| ChatError::Generation(format!("bad response line: {e}")))?;
    if let Some(error) = parsed.error {
        return Err(ChatError::Generation(error));
    }
    if !parsed.response.is_empty() {
        sink.push(parsed.response)?;
    }
    Ok(parsed.done)
}
