use serde::{Deserialize, Serialize};

/// Fixed sampling configuration for one generation request.
///
/// Defaults mirror the tuning this model family needs: a lowered
/// temperature and a repetition penalty, since it is prone to repetition
/// loops on long replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Upper bound on generated token count; generation stops here
    /// regardless of content.
    pub max_new_tokens: u32,
    /// Sampling randomness; lower is more deterministic.
    pub temperature: f64,
    /// Down-weights previously emitted tokens to discourage loops.
    pub repetition_penalty: f64,
    /// Sampling vs. greedy decoding.
    pub do_sample: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_new_tokens: 2048,
            temperature: 0.6,
            repetition_penalty: 1.15,
            do_sample: true,
        }
    }
}

impl GenerationParams {
    pub fn with_max_new_tokens(mut self, max_new_tokens: u32) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_repetition_penalty(mut self, repetition_penalty: f64) -> Self {
        self.repetition_penalty = repetition_penalty;
        self
    }

    pub fn greedy(mut self) -> Self {
        self.do_sample = false;
        self
    }
}
