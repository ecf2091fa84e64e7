use std::sync::LazyLock;

use regex::Regex;

// Matches `{{ env.VAR }}` and `{{ env.VAR | default("fallback") }}`.
static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\{\{\s*env\.([A-Za-z0-9_]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#)
        .expect("must be valid regex")
});

/// Expand `{{ env.VAR }}` placeholders in a raw TOML string
///
/// Operates on the raw text before deserialization so config structs can
/// use plain `String`/`SecretString`. A `default("...")` fallback is used
/// when the variable is unset; without one, an unset variable is an
/// error. TOML comment lines are passed through untouched.
pub fn expand_env(input: &str) -> Result<String, String> {
    let mut output = String::with_capacity(input.len());

    for (i, line) in input.lines().enumerate() {
        if i > 0 {
            output.push('\n');
        }

        if line.trim_start().starts_with('#') {
            output.push_str(line);
            continue;
        }

        let mut last_end = 0;
        for captures in PLACEHOLDER_RE.captures_iter(line) {
            let overall = captures.get(0).expect("capture 0 always present");
            let var_name = captures.get(1).expect("var group is mandatory").as_str();

            output.push_str(&line[last_end..overall.start()]);

            match std::env::var(var_name) {
                Ok(value) => output.push_str(&value),
                Err(_) => match captures.get(2) {
                    Some(default) => output.push_str(default.as_str()),
                    None => return Err(format!("environment variable not found: `{var_name}`")),
                },
            }

            last_end = overall.end();
        }
        output.push_str(&line[last_end..]);
    }

    if input.ends_with('\n') {
        output.push('\n');
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passes_through_plain_toml() {
        let input = "top_k = 8";
        assert_eq!(expand_env(input).unwrap(), input);
    }

    #[test]
    fn expands_set_variable() {
        temp_env::with_var("ARBITER_TEST_KEY", Some("sk-123"), || {
            let result = expand_env("api_key = \"{{ env.ARBITER_TEST_KEY }}\"").unwrap();
            assert_eq!(result, "api_key = \"sk-123\"");
        });
    }

    #[test]
    fn missing_variable_without_default_errors() {
        temp_env::with_var_unset("ARBITER_MISSING", || {
            let err = expand_env("key = \"{{ env.ARBITER_MISSING }}\"").unwrap_err();
            assert!(err.contains("ARBITER_MISSING"));
        });
    }

    #[test]
    fn missing_variable_uses_default() {
        temp_env::with_var_unset("ARBITER_MISSING", || {
            let result =
                expand_env("url = \"{{ env.ARBITER_MISSING | default(\"redis://localhost\") }}\"")
                    .unwrap();
            assert_eq!(result, "url = \"redis://localhost\"");
        });
    }

    #[test]
    fn set_variable_wins_over_default() {
        temp_env::with_var("ARBITER_URL", Some("redis://prod"), || {
            let result =
                expand_env("url = \"{{ env.ARBITER_URL | default(\"redis://localhost\") }}\"")
                    .unwrap();
            assert_eq!(result, "url = \"redis://prod\"");
        });
    }

    #[test]
    fn comment_lines_are_not_expanded() {
        temp_env::with_var_unset("ARBITER_MISSING", || {
            let input = "  # key = \"{{ env.ARBITER_MISSING }}\"";
            assert_eq!(expand_env(input).unwrap(), input);
        });
    }

    #[test]
    fn trailing_newline_preserved() {
        let input = "top_k = 8\n";
        assert_eq!(expand_env(input).unwrap(), input);
    }
}
