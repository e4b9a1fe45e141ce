//! Pretty-printer that serializes a directive tree back into block text.
//!
//! Empty environment blocks are omitted; keywords come out in key order
//! followed by nested references in declaration order.

use crate::ast::{Directives, EnvBlock, Environment, RefSource};

/// Format a directive tree as a `/* [sqlmbegin] ... [sqlmend] */` block.
///
/// The output parses back to an equal tree (the builder-only `name`
/// field aside).
#[must_use]
pub fn format(directives: &Directives) -> String {
    let mut out = String::from("/*\n[sqlmbegin]\n[script]\n");
    out.push_str("\t- description: ");
    push_quoted(&mut out, &directives.description);
    out.push('\n');

    for env in Environment::ALL {
        let block = directives.env(env);
        if !block.is_empty() {
            format_env(&mut out, env, block);
        }
    }

    out.push_str("[sqlmend]\n*/\n");
    out
}

fn format_env(out: &mut String, env: Environment, block: &EnvBlock) {
    out.push('[');
    out.push_str(env.as_str());
    out.push_str("]\n");

    for (key, value) in &block.keywords {
        push_entry_start(out, key);
        push_quoted(out, value);
        out.push('\n');
    }

    for nested in &block.nested {
        push_entry_start(out, &nested.key);
        let (call, arg) = match &nested.source {
            RefSource::Name(name) => ("sqlmref", name),
            RefSource::File(path) => ("sqlmfile", path),
        };
        out.push_str(call);
        out.push('(');
        push_quoted(out, arg);
        out.push_str(")\n");
    }
}

fn push_entry_start(out: &mut String, key: &str) {
    out.push_str("\t- ");
    out.push_str(key);
    out.push_str(": ");
}

fn push_quoted(out: &mut String, value: &str) {
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::EnvBlock;

    #[test]
    fn formats_canonical_block() {
        let d = Directives::new().description("updates d").env_block(
            Environment::Dev,
            EnvBlock::new()
                .keyword("out", "A.B")
                .sqlm_file("child", "child.sql"),
        );
        assert_eq!(
            format(&d),
            "/*\n[sqlmbegin]\n[script]\n\t- description: \"updates d\"\n\
             [dev]\n\t- out: \"A.B\"\n\t- child: sqlmfile(\"child.sql\")\n\
             [sqlmend]\n*/\n"
        );
    }

    #[test]
    fn escapes_quotes() {
        let d = Directives::new().description("say \"hi\"\\");
        assert!(format(&d).contains(r#"- description: "say \"hi\"\\""#));
    }
}
