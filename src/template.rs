//! Placeholder substitution over script text.
//!
//! Only `{{ key }}` is template syntax; a key with no value renders as the
//! empty string. Everything else, including `{%`, `{#` and the directive
//! block comment, is reproduced unchanged. Migration flags are plain
//! string values (`"true"`), consumed by the script text itself.

use std::collections::BTreeMap;

use minijinja::syntax::SyntaxConfig;

/// Variables visible to one render.
pub type Context = BTreeMap<String, String>;

// Block and comment tags are moved onto NUL-delimited markers, which
// never occur in SQL text.
const BLOCK_START: &str = "\0{%";
const BLOCK_END: &str = "%}\0";
const COMMENT_START: &str = "\0{#";
const COMMENT_END: &str = "#}\0";

/// Render `script` with `context`.
///
/// # Errors
///
/// Returns the `minijinja` error when a `{{ .. }}` placeholder is
/// malformed.
pub fn render(script: &str, context: &Context) -> Result<String, minijinja::Error> {
    let syntax = SyntaxConfig::builder()
        .block_delimiters(BLOCK_START, BLOCK_END)
        .variable_delimiters("{{", "}}")
        .comment_delimiters(COMMENT_START, COMMENT_END)
        .build()?;

    let mut env = minijinja::Environment::new();
    env.set_syntax(syntax);
    env.set_keep_trailing_newline(true);
    env.render_str(script, context)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, &str)]) -> Context {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn substitutes_keys() {
        let out = render("select * from {{ t }};\n", &ctx(&[("t", "A.B")])).unwrap();
        assert_eq!(out, "select * from A.B;\n");
    }

    #[test]
    fn missing_key_is_empty() {
        assert_eq!(render("x{{ nope }}y", &Context::new()).unwrap(), "xy");
    }

    #[test]
    fn flags_render_as_plain_strings() {
        let script = "select '{{ a_b_c_3 }}' = 'true'";
        assert_eq!(
            render(script, &ctx(&[("a_b_c_3", "true")])).unwrap(),
            "select 'true' = 'true'"
        );
        assert_eq!(render(script, &Context::new()).unwrap(), "select '' = 'true'");
    }

    #[test]
    fn plain_text_passes_through() {
        let script = "/* just a comment */\nselect 1;\n\n";
        assert_eq!(render(script, &Context::new()).unwrap(), script);
    }

    #[test]
    fn block_and_comment_markers_are_text() {
        let script = "select '{#' as x, format('{%s}', n) from t; -- {# {% if %}\n";
        assert_eq!(render(script, &Context::new()).unwrap(), script);
    }

    #[test]
    fn malformed_placeholder_errors() {
        assert!(render("{{ unclosed", &Context::new()).is_err());
    }
}
