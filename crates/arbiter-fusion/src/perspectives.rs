//! Query perspective generation
//!
//! The deep path searches with several phrasings of the same question so
//! fusion can reward passages that keep showing up. Paraphrases come
//! from the generation backend at high temperature; the original query
//! is always the first perspective and survives any paraphrase failure.

use arbiter_config::FusionConfig;
use arbiter_providers::{GenerationProvider, GenerationRequest};

const PARAPHRASE_SYSTEM_PROMPT: &str = "You rewrite search queries. Produce alternative \
    phrasings of the user's query that would surface different relevant documents. \
    Return one rewrite per line with no numbering and no commentary.";

/// Number of perspectives a query of the given complexity deserves
///
/// Grows from 2 at minimal complexity to 7 at maximal complexity, capped
/// by the configured maximum (itself clamped to [2, 7]).
pub fn perspective_count(complexity: f64, max_perspectives: usize) -> usize {
    let ceiling = max_perspectives.clamp(2, 7);
    let adapted = 2 + (complexity.clamp(0.0, 1.0) * 5.0).round() as usize;
    adapted.min(ceiling)
}

/// Produce up to `count` perspectives, the original query first
///
/// Total paraphrase failure degrades to a single perspective with a warn
/// log rather than failing the search.
pub async fn generate_perspectives(
    generation: &dyn GenerationProvider,
    original: &str,
    count: usize,
    config: &FusionConfig,
) -> Vec<String> {
    if count <= 1 {
        return vec![original.to_owned()];
    }

    let wanted = count - 1;
    let request = GenerationRequest {
        system_prompt: PARAPHRASE_SYSTEM_PROMPT.to_owned(),
        user_prompt: format!("Write {wanted} rewrites of this search query:\n\n{original}"),
        max_tokens: config.paraphrase_max_tokens,
        temperature: config.paraphrase_temperature,
    };

    match generation.generate(&request).await {
        Ok(response) => {
            let mut perspectives = vec![original.to_owned()];
            perspectives.extend(parse_paraphrases(&response.text, original, wanted));
            if perspectives.len() == 1 {
                tracing::warn!("paraphrase response contained no usable rewrites");
            }
            perspectives
        }
        Err(error) => {
            tracing::warn!(%error, "paraphrase generation failed, using single perspective");
            vec![original.to_owned()]
        }
    }
}

/// Extract up to `limit` distinct paraphrases from a completion
///
/// One rewrite per line; list markers the model sneaks in are stripped,
/// and lines that collapse to the original query are dropped.
fn parse_paraphrases(raw: &str, original: &str, limit: usize) -> Vec<String> {
    let mut seen = vec![normalize(original)];
    let mut paraphrases = Vec::new();

    for line in raw.lines() {
        if paraphrases.len() >= limit {
            break;
        }

        let candidate = strip_list_marker(line);
        if candidate.is_empty() {
            continue;
        }

        let key = normalize(candidate);
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        paraphrases.push(candidate.to_owned());
    }

    paraphrases
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Strip a leading "1." / "2)" / "-" / "*" list marker, if present
fn strip_list_marker(line: &str) -> &str {
    let trimmed = line.trim();
    if let Some(rest) = trimmed.strip_prefix(['-', '*']) {
        return rest.trim_start();
    }

    let digits = trimmed.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        if let Some(rest) = trimmed[digits..].strip_prefix(['.', ')']) {
            return rest.trim_start();
        }
    }
    trimmed
}
