//! Answer prompt assembly

use arbiter_core::{Query, RetrievedPassage, TurnRole};

pub const ANSWER_SYSTEM_PROMPT: &str = "You answer questions using only the numbered \
passages provided. Cite passage numbers like [1] where relevant. If the passages do \
not contain the answer, say so briefly instead of guessing.";

/// Render the user prompt: context turns, numbered passages, then the question
pub fn build_user_prompt(query: &Query, passages: &[RetrievedPassage]) -> String {
    let mut prompt = String::new();

    if !query.context.is_empty() {
        prompt.push_str("Conversation so far:\n");
        for turn in &query.context {
            let role = match turn.role {
                TurnRole::User => "user",
                TurnRole::Assistant => "assistant",
            };
            prompt.push_str(&format!("{role}: {}\n", turn.text));
        }
        prompt.push('\n');
    }

    if passages.is_empty() {
        prompt.push_str("No passages were retrieved for this question.\n\n");
    } else {
        prompt.push_str("Passages:\n");
        for (index, passage) in passages.iter().enumerate() {
            prompt.push_str(&format!("[{}] {}\n", index + 1, passage.text));
        }
        prompt.push('\n');
    }

    prompt.push_str(&format!("Question: {}", query.text));
    prompt
}
