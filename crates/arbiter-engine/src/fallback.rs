//! Extractive fallback answers
//!
//! When generation times out or fails, the pipeline still serves an
//! answer assembled from the top retrieved passages instead of an error.

use arbiter_core::RetrievedPassage;

/// Passages quoted in a fallback answer
const MAX_SNIPPETS: usize = 3;

/// Longest snippet taken from a single passage, in characters
const SNIPPET_MAX_CHARS: usize = 240;

/// Served when there are no passages and no generation to fall back on
pub const UNABLE_TO_ANSWER: &str =
    "I could not retrieve enough supporting material to answer this query right now.";

/// Assemble an answer from the top passage snippets
///
/// Returns None when there are no passages to quote.
pub fn extractive_answer(passages: &[RetrievedPassage]) -> Option<String> {
    let snippets: Vec<String> = passages
        .iter()
        .take(MAX_SNIPPETS)
        .map(|passage| snippet(&passage.text))
        .filter(|text| !text.is_empty())
        .collect();

    if snippets.is_empty() {
        return None;
    }

    Some(format!(
        "Based on the most relevant passages:\n\n{}",
        snippets.join("\n\n")
    ))
}

fn snippet(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() <= SNIPPET_MAX_CHARS {
        return trimmed.to_owned();
    }

    let cut: String = trimmed.chars().take(SNIPPET_MAX_CHARS).collect();
    // Cut at the last word boundary so a truncated snippet stays readable.
    let boundary = cut.rfind(char::is_whitespace).unwrap_or(cut.len());
    format!("{}…", cut[..boundary].trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(id: &str, text: &str) -> RetrievedPassage {
        RetrievedPassage {
            id: id.to_owned(),
            text: text.to_owned(),
            score: 0.8,
            source_document_id: "doc".to_owned(),
            embedding: None,
        }
    }

    #[test]
    fn no_passages_yields_none() {
        assert!(extractive_answer(&[]).is_none());
        assert!(extractive_answer(&[passage("p-1", "   ")]).is_none());
    }

    #[test]
    fn quotes_top_passages_in_order() {
        let passages = vec![
            passage("p-1", "First fact."),
            passage("p-2", "Second fact."),
        ];

        let answer = extractive_answer(&passages).unwrap();
        let first = answer.find("First fact.").unwrap();
        let second = answer.find("Second fact.").unwrap();
        assert!(first < second);
    }

    #[test]
    fn caps_the_number_of_snippets() {
        let passages: Vec<_> = (0..10)
            .map(|i| passage(&format!("p-{i}"), &format!("Fact number {i}.")))
            .collect();

        let answer = extractive_answer(&passages).unwrap();
        assert!(answer.contains("Fact number 2."));
        assert!(!answer.contains("Fact number 3."));
    }

    #[test]
    fn long_passages_are_truncated_at_a_word_boundary() {
        let long = "word ".repeat(200);
        let answer = extractive_answer(&[passage("p-1", &long)]).unwrap();

        assert!(answer.chars().count() < long.chars().count());
        assert!(answer.ends_with('…'));
        assert!(!answer.contains("wor…"), "snippet cut mid-word");
    }

    #[test]
    fn multibyte_text_is_cut_on_char_boundaries() {
        let long = "héllo wörld ".repeat(100);
        let answer = extractive_answer(&[passage("p-1", &long)]).unwrap();
        assert!(answer.ends_with('…'));
    }
}
