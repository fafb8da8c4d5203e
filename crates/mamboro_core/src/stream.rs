//! Generation runner: one background producer task per request, fragments
//! relayed over an unbounded channel.

use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::engine::{FragmentSink, InferenceEngine};
use crate::error::{ChatError, Result};
use crate::params::GenerationParams;

/// One incremental chunk of generated text.
pub type Fragment = String;

/// Lazy fragment sequence for one request. Items arrive in production
/// order; the stream always terminates, on success or failure, because the
/// sending half lives inside the producer task and closes the channel on
/// every exit path, panic-unwind included.
pub struct FragmentStream {
    inner: Pin<Box<dyn Stream<Item = Result<Fragment>> + Send>>,
}

impl FragmentStream {
    pub fn new(inner: Pin<Box<dyn Stream<Item = Result<Fragment>> + Send>>) -> Self {
        Self { inner }
    }

    /// A stream that terminates immediately with no fragments.
    pub fn empty() -> Self {
        Self::new(Box::pin(futures::stream::empty()))
    }
}

impl Stream for FragmentStream {
    type Item = Result<Fragment>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for FragmentStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentStream").finish_non_exhaustive()
    }
}

/// Encode the prompt, then run generation in a single background task and
/// return the fragment stream right away, so the caller observes output
/// before generation completes.
///
/// Encoding and resource-acquisition failures are reported here,
/// synchronously, before anything is spawned. A failure inside the task is
/// forwarded as one terminal `Err` item and the channel then closes.
pub async fn stream_generation(
    engine: Arc<dyn InferenceEngine>,
    prompt: String,
    params: GenerationParams,
) -> Result<FragmentStream> {
    let encoded = engine.encode(&prompt).await?;
    engine.acquire().await?;

    // A zero token budget is a valid request for no output.
    if params.max_new_tokens == 0 {
        return Ok(FragmentStream::empty());
    }

    let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
    tokio::spawn(async move {
        let sink = FragmentSink::new(tx.clone());
        tracing::debug!(engine = engine.engine_id(), "generation task started");
        match engine.generate(encoded, &params, sink).await {
            Ok(()) => tracing::debug!(engine = engine.engine_id(), "generation task finished"),
            // Delivery failure means the consumer is gone; nobody is left
            // to notify.
            Err(ChatError::Delivery(reason)) => {
                tracing::debug!(engine = engine.engine_id(), %reason, "consumer went away");
            }
            Err(e) => {
                tracing::warn!(engine = engine.engine_id(), error = %e, "generation failed");
                let _ = tx.send(Err(e));
            }
        }
        // tx drops here, closing the stream.
    });

    Ok(FragmentStream::new(Box::pin(UnboundedReceiverStream::new(
        rx,
    ))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EncodedPrompt;
    use async_trait::async_trait;
    use futures::StreamExt;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Engine test double that replays a script, optionally failing at a
    /// chosen point.
    struct ScriptedEngine {
        fragments: Vec<&'static str>,
        fail_encode: bool,
        fail_acquire: bool,
        fail_generate: bool,
        generate_called: AtomicBool,
        /// Signalled after the first fragment is pushed; lets tests observe
        /// output while the task is still running.
        first_fragment: tokio::sync::Notify,
        hold_after_first: bool,
        release: tokio::sync::Notify,
    }

    impl ScriptedEngine {
        fn replaying(fragments: Vec<&'static str>) -> Self {
            Self {
                fragments,
                fail_encode: false,
                fail_acquire: false,
                fail_generate: false,
                generate_called: AtomicBool::new(false),
                first_fragment: tokio::sync::Notify::new(),
                hold_after_first: false,
                release: tokio::sync::Notify::new(),
            }
        }
    }

    #[async_trait]
    impl InferenceEngine for ScriptedEngine {
        fn engine_id(&self) -> &str {
            "scripted"
        }

        async fn encode(&self, prompt: &str) -> Result<EncodedPrompt> {
            if self.fail_encode {
                return Err(ChatError::Encoding("unencodable prompt".to_string()));
            }
            Ok(EncodedPrompt::new(prompt))
        }

        async fn acquire(&self) -> Result<()> {
            if self.fail_acquire {
                return Err(ChatError::ResourceAcquisition("no device".to_string()));
            }
            Ok(())
        }

        async fn generate(
            &self,
            _input: EncodedPrompt,
            params: &GenerationParams,
            sink: FragmentSink,
        ) -> Result<()> {
            self.generate_called.store(true, Ordering::SeqCst);
            for (i, fragment) in self
                .fragments
                .iter()
                .take(params.max_new_tokens as usize)
                .enumerate()
            {
                sink.push(*fragment)?;
                if i == 0 {
                    self.first_fragment.notify_one();
                    if self.hold_after_first {
                        self.release.notified().await;
                    }
                }
            }
            if self.fail_generate {
                return Err(ChatError::Generation("backend fell over".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_fragments_delivered_in_order() {
        let engine = Arc::new(ScriptedEngine::replaying(vec!["Halo", ", ", "dunia"]));
        let stream = stream_generation(engine, "p".to_string(), GenerationParams::default())
            .await
            .unwrap();
        let items: Vec<_> = stream.collect().await;
        let texts: Vec<_> = items.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(texts, vec!["Halo", ", ", "dunia"]);
    }

    #[tokio::test]
    async fn test_first_fragment_observable_before_completion() {
        let mut engine = ScriptedEngine::replaying(vec!["early", "late"]);
        engine.hold_after_first = true;
        let engine = Arc::new(engine);

        let mut stream = stream_generation(
            engine.clone(),
            "p".to_string(),
            GenerationParams::default(),
        )
        .await
        .unwrap();

        engine.first_fragment.notified().await;
        // Generation is parked after the first push; consume it now.
        assert_eq!(stream.next().await.unwrap().unwrap(), "early");
        engine.release.notify_one();
        assert_eq!(stream.next().await.unwrap().unwrap(), "late");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_encode_failure_is_synchronous_and_spawns_nothing() {
        let mut engine = ScriptedEngine::replaying(vec!["never"]);
        engine.fail_encode = true;
        let engine = Arc::new(engine);

        let err = stream_generation(
            engine.clone(),
            "p".to_string(),
            GenerationParams::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ChatError::Encoding(_)));
        assert!(!engine.generate_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_acquire_failure_is_distinct() {
        let mut engine = ScriptedEngine::replaying(vec!["never"]);
        engine.fail_acquire = true;
        let engine = Arc::new(engine);

        let err = stream_generation(
            engine.clone(),
            "p".to_string(),
            GenerationParams::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ChatError::ResourceAcquisition(_)));
        assert!(!engine.generate_called.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_generate_failure_terminates_stream_with_err_item() {
        let mut engine = ScriptedEngine::replaying(vec!["Hal", "o dun"]);
        engine.fail_generate = true;
        let engine = Arc::new(engine);

        let stream = stream_generation(engine, "p".to_string(), GenerationParams::default())
            .await
            .unwrap();
        let items: Vec<_> = stream.collect().await;
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].as_ref().unwrap(), "Hal");
        assert_eq!(items[1].as_ref().unwrap(), "o dun");
        assert!(matches!(items[2], Err(ChatError::Generation(_))));
    }

    #[test]
    fn test_stream_debug_does_not_expose_inner() {
        let rendered = format!("{:?}", FragmentStream::empty());
        assert!(rendered.starts_with("FragmentStream"));
    }

    #[tokio::test]
    async fn test_zero_token_budget_yields_empty_stream() {
        let engine = Arc::new(ScriptedEngine::replaying(vec!["unreachable"]));
        let stream = stream_generation(
            engine.clone(),
            "p".to_string(),
            GenerationParams::default().with_max_new_tokens(0),
        )
        .await
        .unwrap();
        let items: Vec<_> = stream.collect().await;
        assert!(items.is_empty());
        assert!(!engine.generate_called.load(Ordering::SeqCst));
    }
}
