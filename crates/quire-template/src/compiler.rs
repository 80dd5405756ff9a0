//! Code generation from scanned spans to template script.
//!
//! Each span becomes one statement:
//! - text → `text "...";`
//! - `{{ e }}` → `escape e;`
//! - `{{! e }}` → `echo e;`
//! - `{% s %}` → `s` verbatim, plus `;` unless it already ends in `;`, `{` or `}`
//!
//! Statements are padded with newlines so each one starts on the script line
//! matching its span's template line; syntax errors report template lines.

use crate::TemplateError;
use crate::scanner::{self, Span};

/// Compile template source to script text.
pub(crate) fn generate(source: &str) -> Result<String, TemplateError> {
    let mut writer = ScriptWriter::default();

    for located in scanner::scan(source)? {
        match located.span {
            Span::Text(text) => {
                writer.begin(located.line);
                writer.push("text ");
                writer.push(&quote(text));
                writer.push(";");
            }
            Span::Escape(expr) | Span::Raw(expr) => {
                let keyword = if matches!(located.span, Span::Escape(_)) {
                    "escape "
                } else {
                    "echo "
                };
                writer.begin(located.line);
                writer.push(keyword);
                writer.push(expr.trim());
                writer.push(";");
            }
            Span::Code(code) => {
                let trimmed = code.trim();
                if trimmed.is_empty() {
                    continue;
                }
                writer.begin(located.line);
                writer.push(trimmed);
                if !trimmed.ends_with([';', '{', '}']) {
                    writer.push(";");
                }
            }
        }
    }

    Ok(writer.out)
}

#[derive(Default)]
struct ScriptWriter {
    out: String,
    line: usize,
}

impl ScriptWriter {
    /// Start a statement that belongs on template line `line`.
    fn begin(&mut self, line: usize) {
        if self.line == 0 {
            self.line = 1;
        } else if self.line >= line {
            self.out.push(' ');
        }
        while self.line < line {
            self.out.push('\n');
            self.line += 1;
        }
    }

    fn push(&mut self, s: &str) {
        self.line += s.bytes().filter(|&b| b == b'\n').count();
        self.out.push_str(s);
    }
}

/// Quote literal text as a script string.
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                for unit in c.encode_utf16(&mut [0; 2]) {
                    out.push_str(&format!("\\u{unit:04x}"));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_text_only() {
        assert_eq!(generate("Hello \"world\"").unwrap(), r#"text "Hello \"world\"";"#);
    }

    #[test]
    fn test_output_spans() {
        assert_eq!(
            generate("<h1>{{ title }}</h1>{{! body }}").unwrap(),
            r#"text "<h1>"; escape title; text "</h1>"; echo body;"#
        );
    }

    #[test]
    fn test_adjacent_code_spans() {
        assert_eq!(
            generate("{% let a = 1 %}{% let b = 2; %}{% if a { %}{% } %}").unwrap(),
            "let a = 1; let b = 2; if a { }"
        );
    }

    #[test]
    fn test_code_followed_by_output() {
        assert_eq!(
            generate("{% let x = 1 %}{{ x }}").unwrap(),
            "let x = 1; escape x;"
        );
    }

    #[test]
    fn test_trailing_code_span_is_terminated() {
        assert_eq!(generate("a{% let x = 1 %}").unwrap(), r#"text "a"; let x = 1;"#);
    }

    #[test]
    fn test_empty_code_span_emits_nothing() {
        assert_eq!(generate("{%  %}{{ x }}").unwrap(), "escape x;");
    }

    #[test]
    fn test_statements_keep_template_lines() {
        let script = generate("line one\n{% if a { %}\n{{ b }}\n{% } %}\n").unwrap();
        assert_eq!(
            script,
            "text \"line one\\n\";\nif a {\nescape b; text \"\\n\";\n}"
        );
    }

    #[test]
    fn test_control_characters_quoted() {
        assert_eq!(generate("a\u{1}b").unwrap(), "text \"a\\u0001b\";");
    }
}
