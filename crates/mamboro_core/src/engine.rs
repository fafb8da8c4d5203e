//! Inference engine seam.
//!
//! Model loading and tensor execution live behind [`InferenceEngine`]; the
//! core injects it per session (`Arc<dyn InferenceEngine>`) so production
//! engines and test doubles are interchangeable.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::{ChatError, Result};
use crate::params::GenerationParams;
use crate::stream::Fragment;

/// Model input produced by [`InferenceEngine::encode`]. Ephemeral, one per
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPrompt {
    text: String,
}

impl EncodedPrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Sending half of the per-request fragment channel, handed to the engine
/// for the duration of one `generate` call.
pub struct FragmentSink {
    tx: mpsc::UnboundedSender<Result<Fragment>>,
}

impl FragmentSink {
    /// Wrap the sending half of a fragment channel. Public so engine
    /// implementations can be unit-tested without the runner.
    pub fn new(tx: mpsc::UnboundedSender<Result<Fragment>>) -> Self {
        Self { tx }
    }

    /// Deliver one fragment of newly generated text, in production order.
    /// Fails with [`ChatError::Delivery`] once the consumer has gone away,
    /// which an engine should treat as a stop signal.
    pub fn push(&self, fragment: impl Into<Fragment>) -> Result<()> {
        self.tx
            .send(Ok(fragment.into()))
            .map_err(|_| ChatError::Delivery("fragment receiver dropped".to_string()))
    }
}

/// An external model execution backend.
#[async_trait]
pub trait InferenceEngine: Send + Sync {
    fn engine_id(&self) -> &str;

    /// Convert the prompt into model input. Runs to completion before any
    /// background work starts; failures here abort the request with
    /// [`ChatError::Encoding`] and zero fragments.
    async fn encode(&self, prompt: &str) -> Result<EncodedPrompt>;

    /// Confirm the execution resource is available. Also pre-background;
    /// failures surface as [`ChatError::ResourceAcquisition`]. Engines with
    /// nothing to acquire keep the default.
    async fn acquire(&self) -> Result<()> {
        Ok(())
    }

    /// Run generation, pushing each fragment into `sink` as it is
    /// produced. Called from the per-request background task; a returned
    /// error terminates the stream and reaches the consumer as an
    /// annotated partial snapshot, never as a crash.
    async fn generate(
        &self,
        input: EncodedPrompt,
        params: &GenerationParams,
        sink: FragmentSink,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_prompt_accessor() {
        let encoded = EncodedPrompt::new("<|im_start|>system\nhi<|im_end|>\n");
        assert!(encoded.text().starts_with("<|im_start|>"));
    }

    #[test]
    fn test_sink_push_after_receiver_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let sink = FragmentSink::new(tx);
        let err = sink.push("orphan").unwrap_err();
        assert!(matches!(err, ChatError::Delivery(_)));
    }

    #[test]
    fn test_sink_push_delivers_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sink = FragmentSink::new(tx);
        sink.push("a").unwrap();
        sink.push("b").unwrap();
        drop(sink);
        assert_eq!(rx.blocking_recv().unwrap().unwrap(), "a");
        assert_eq!(rx.blocking_recv().unwrap().unwrap(), "b");
        assert!(rx.blocking_recv().is_none());
    }
}
