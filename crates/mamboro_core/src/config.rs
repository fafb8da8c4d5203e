//! Startup configuration: model identifier, system instruction, sampling
//! parameters, engine endpoint. Loaded once; no runtime reconfiguration.

use serde::{Deserialize, Serialize};

use crate::params::GenerationParams;

pub const DEFAULT_MODEL: &str = "dolphin-llama3:8b";
pub const DEFAULT_ENGINE_URL: &str = "http://localhost:11434";

/// The fixed system instruction: the assistant must answer in clear
/// Indonesian.
pub const DEFAULT_SYSTEM_PROMPT: &str = "Kamu adalah asisten AI yang cerdas dan membantu. \
Kamu WAJIB menjawab setiap pertanyaan pengguna menggunakan Bahasa Indonesia yang baik dan jelas.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    pub model: String,
    pub system_prompt: String,
    pub engine_url: String,
    pub params: GenerationParams,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            engine_url: DEFAULT_ENGINE_URL.to_string(),
            params: GenerationParams::default(),
        }
    }
}

impl ChatConfig {
    /// Build from `MAMBORO_*` environment variables, falling back to
    /// defaults. Malformed numeric overrides are ignored rather than
    /// fatal; startup proceeds with the default value.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(model) = lookup("MAMBORO_MODEL") {
            config.model = model;
        }
        if let Some(system_prompt) = lookup("MAMBORO_SYSTEM_PROMPT") {
            config.system_prompt = system_prompt;
        }
        if let Some(engine_url) = lookup("MAMBORO_ENGINE_URL") {
            config.engine_url = engine_url;
        }
        if let Some(v) = lookup("MAMBORO_MAX_NEW_TOKENS").and_then(|v| v.parse().ok()) {
            config.params.max_new_tokens = v;
        }
        if let Some(v) = lookup("MAMBORO_TEMPERATURE").and_then(|v| v.parse().ok()) {
            config.params.temperature = v;
        }
        if let Some(v) = lookup("MAMBORO_REPETITION_PENALTY").and_then(|v| v.parse().ok()) {
            config.params.repetition_penalty = v;
        }
        if let Some(v) = lookup("MAMBORO_DO_SAMPLE").and_then(|v| v.parse().ok()) {
            config.params.do_sample = v;
        }
        config
    }
}
