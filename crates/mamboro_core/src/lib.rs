//! mamboro_core — streaming prompt-orchestration core for an interactive
//! chat front-end over a causal language model.
//!
//! ## Architecture
//!
//! ```text
//! user message + history
//!         │
//!         ▼
//!   build_prompt ──► ChatML prompt string
//!         │
//!         ▼
//!   stream_generation ──► encode (sync) ──► spawn one producer task
//!         │                                        │
//!         │                              fragments via channel
//!         ▼                                        │
//!   FragmentStream ◄───────────────────────────────┘
//!         │
//!         ▼
//!   accumulate ──► SnapshotStream (cumulative response after each fragment)
//! ```
//!
//! The model itself is an injected [`InferenceEngine`]; this crate owns only
//! the orchestration: deterministic prompt serialization, the producer task
//! lifecycle, and cumulative snapshot re-emission. Pre-generation failures
//! (encoding, device acquisition) surface synchronously; failures after
//! streaming has started are folded into a terminal, error-annotated
//! snapshot so the consumer always sees a well-formed final result.

pub mod accumulate;
pub mod config;
pub mod engine;
pub mod error;
pub mod params;
pub mod prompt;
pub mod session;
pub mod stream;
pub mod turn;

pub use accumulate::{Snapshot, SnapshotStream, accumulate};
pub use config::ChatConfig;
pub use engine::{EncodedPrompt, FragmentSink, InferenceEngine};
pub use error::{ChatError, Result};
pub use params::GenerationParams;
pub use prompt::build_prompt;
pub use session::ChatSession;
pub use stream::{Fragment, FragmentStream, stream_generation};
pub use turn::{ConversationHistory, ConversationTurn};
