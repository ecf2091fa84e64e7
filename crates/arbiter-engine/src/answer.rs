//! Bounded answer generation
//!
//! Both pipeline stages produce their answer the same way: one
//! generation call inside a time slice, degrading to an extractive
//! answer when the call fails or the slice runs out.

use std::time::Duration;

use arbiter_core::{Query, RetrievedPassage};
use arbiter_providers::{GenerationProvider, GenerationRequest};

use crate::fallback;
use crate::prompt;

/// Answer generation runs cold so repeated queries stay stable
pub(crate) const GENERATION_TEMPERATURE: f64 = 0.3;

/// Minimum slice left for generation after earlier stages spend the budget
pub(crate) const GENERATION_FLOOR: Duration = Duration::from_millis(250);

/// Generate an answer within `slice`, falling back to extraction
pub(crate) async fn generate_or_fallback(
    generation: Option<&dyn GenerationProvider>,
    query: &Query,
    passages: &[RetrievedPassage],
    max_tokens: u32,
    slice: Duration,
) -> String {
    let Some(generation) = generation else {
        return extractive(passages);
    };

    let request = GenerationRequest {
        system_prompt: prompt::ANSWER_SYSTEM_PROMPT.to_owned(),
        user_prompt: prompt::build_user_prompt(query, passages),
        max_tokens,
        temperature: GENERATION_TEMPERATURE,
    };

    match tokio::time::timeout(slice, generation.generate(&request)).await {
        Ok(Ok(response)) => response.text,
        Ok(Err(error)) => {
            tracing::warn!(%error, "generation failed, falling back to extractive answer");
            extractive(passages)
        }
        Err(_) => {
            tracing::warn!(
                slice_ms = slice.as_millis() as u64,
                "generation timed out, falling back to extractive answer"
            );
            extractive(passages)
        }
    }
}

fn extractive(passages: &[RetrievedPassage]) -> String {
    fallback::extractive_answer(passages).unwrap_or_else(|| fallback::UNABLE_TO_ANSWER.to_owned())
}
