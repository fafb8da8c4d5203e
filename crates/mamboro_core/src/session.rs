//! Session façade: the inbound call a UI layer consumes.

use std::sync::Arc;

use crate::accumulate::{SnapshotStream, accumulate};
use crate::config::ChatConfig;
use crate::engine::InferenceEngine;
use crate::error::Result;
use crate::params::GenerationParams;
use crate::prompt::build_prompt;
use crate::stream::stream_generation;
use crate::turn::ConversationTurn;

/// Wires prompt builder → generation runner → accumulator for one engine
/// and one fixed system instruction. The conversation history stays owned
/// by the caller; the session only reads it.
pub struct ChatSession {
    engine: Arc<dyn InferenceEngine>,
    system_prompt: String,
    params: GenerationParams,
}

impl ChatSession {
    pub fn new(engine: Arc<dyn InferenceEngine>, system_prompt: impl Into<String>) -> Self {
        Self {
            engine,
            system_prompt: system_prompt.into(),
            params: GenerationParams::default(),
        }
    }

    pub fn from_config(engine: Arc<dyn InferenceEngine>, config: &ChatConfig) -> Self {
        Self::new(engine, &config.system_prompt).with_params(config.params.clone())
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    /// Stream the assistant reply to `user_message` as cumulative
    /// snapshots. Encoding and resource errors return `Err` here, before
    /// any snapshot exists; later failures arrive inside the stream as an
    /// annotated final snapshot.
    pub async fn generate_streaming_response(
        &self,
        user_message: &str,
        history: &[ConversationTurn],
    ) -> Result<SnapshotStream> {
        let prompt = build_prompt(&self.system_prompt, history, user_message);
        tracing::debug!(
            engine = self.engine.engine_id(),
            turns = history.len(),
            prompt_bytes = prompt.len(),
            "starting streaming response"
        );
        let fragments = stream_generation(self.engine.clone(), prompt, self.params.clone()).await?;
        Ok(accumulate(fragments))
    }
}
