//! Response accumulator: folds the fragment stream into cumulative
//! snapshots, one per fragment.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::{Stream, StreamExt};
use serde::Serialize;

use crate::stream::FragmentStream;

/// The response-so-far, republished after each fragment. `error` is set
/// only on the final snapshot of a request that failed mid-stream; the
/// text generated before the failure is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub text: String,
    pub error: Option<String>,
}

impl Snapshot {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: None,
        }
    }

    pub fn partial(text: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            error: Some(error.into()),
        }
    }

    pub fn is_partial(&self) -> bool {
        self.error.is_some()
    }
}

/// Renders the plain-string form a chat UI shows: the text, with the error
/// note appended on a failed request.
impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Some(error) => write!(f, "{}\n\n[error: {}]", self.text, error),
            None => write!(f, "{}", self.text),
        }
    }
}

/// Lazy snapshot sequence for one request. Snapshot text length is
/// non-decreasing; the final item carries the full concatenation of all
/// fragments in emission order.
pub struct SnapshotStream {
    inner: Pin<Box<dyn Stream<Item = Snapshot> + Send>>,
}

impl SnapshotStream {
    pub fn new(inner: Pin<Box<dyn Stream<Item = Snapshot> + Send>>) -> Self {
        Self { inner }
    }
}

impl Stream for SnapshotStream {
    type Item = Snapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for SnapshotStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotStream").finish_non_exhaustive()
    }
}

/// Re-emit the running response after every fragment. A mid-stream error
/// becomes one final annotated snapshot carrying everything received so
/// far, then the stream ends; fragments are never coalesced or reordered.
pub fn accumulate(mut fragments: FragmentStream) -> SnapshotStream {
    let stream = async_stream::stream! {
        let mut response = String::new();
        while let Some(item) = fragments.next().await {
            match item {
                Ok(fragment) => {
                    response.push_str(&fragment);
                    yield Snapshot::ok(response.clone());
                }
                Err(e) => {
                    yield Snapshot::partial(response.clone(), e.to_string());
                    break;
                }
            }
        }
    };
    SnapshotStream::new(Box::pin(stream))
}
