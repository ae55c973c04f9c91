//! crates/jokesmith_core/src/sampling.rs
//!
//! Maps the user-facing "creativity" knob onto chat-completion sampling parameters.

/// Upper bound for `top_p`, reached at creativity ~1.0.
pub const TOP_P_CEILING: f32 = 0.85;
/// `top_p` at creativity 0.0.
pub const TOP_P_FLOOR: f32 = 0.25;

pub const DEFAULT_CREATIVITY: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
}

impl SamplingParams {
    /// `temperature = creativity`, `top_p = min(0.85, creativity * 0.6 + 0.25)`.
    ///
    /// Creativity is clamped to `[0, 1]`; non-finite input is treated as the default.
    pub fn from_creativity(creativity: f32) -> Self {
        let creativity = if creativity.is_finite() {
            creativity.clamp(0.0, 1.0)
        } else {
            DEFAULT_CREATIVITY
        };
        Self {
            temperature: creativity,
            top_p: (creativity * 0.6 + TOP_P_FLOOR).min(TOP_P_CEILING),
        }
    }
}
