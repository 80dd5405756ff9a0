//! Template source scanner.
//!
//! Splits template source into literal text and the three span kinds:
//! - `{{ expr }}` escaped output
//! - `{{! expr }}` raw output
//! - `{% code %}` statements, a newline right after `%}` is swallowed
//!
//! String literals inside a span are skipped over, so `{{ "}}" }}` closes at
//! the second marker.

use crate::TemplateError;

/// One piece of template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Span<'a> {
    Text(&'a str),
    Escape(&'a str),
    Raw(&'a str),
    Code(&'a str),
}

/// A span together with the 1-based line its body starts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Located<'a> {
    pub span: Span<'a>,
    pub line: usize,
}

#[derive(Clone, Copy)]
enum Open {
    Output,
    Raw,
    Code,
}

impl Open {
    fn marker(self) -> &'static str {
        match self {
            Self::Output => "{{",
            Self::Raw => "{{!",
            Self::Code => "{%",
        }
    }

    fn close(self) -> &'static str {
        match self {
            Self::Output | Self::Raw => "}}",
            Self::Code => "%}",
        }
    }
}

/// Scan `source` into spans. Empty text runs are dropped.
pub(crate) fn scan(source: &str) -> Result<Vec<Located<'_>>, TemplateError> {
    let mut spans = Vec::new();
    let mut pos = 0;
    let mut line = 1;

    while pos < source.len() {
        let rest = &source[pos..];
        let Some((start, open)) = find_open(rest) else {
            spans.push(Located {
                span: Span::Text(rest),
                line,
            });
            break;
        };

        if start > 0 {
            spans.push(Located {
                span: Span::Text(&rest[..start]),
                line,
            });
            line += count_lines(&rest[..start]);
        }

        let body_start = pos + start + open.marker().len();
        let Some(body_len) = find_close(&source[body_start..], open.close()) else {
            return Err(TemplateError::Unterminated {
                span: open.marker(),
                line,
            });
        };
        let body = &source[body_start..body_start + body_len];
        spans.push(Located {
            span: match open {
                Open::Output => Span::Escape(body),
                Open::Raw => Span::Raw(body),
                Open::Code => Span::Code(body),
            },
            line,
        });
        line += count_lines(body);

        pos = body_start + body_len + open.close().len();
        if matches!(open, Open::Code) {
            if source[pos..].starts_with("\r\n") {
                pos += 2;
                line += 1;
            } else if source[pos..].starts_with('\n') {
                pos += 1;
                line += 1;
            }
        }
    }

    Ok(spans)
}

/// Find the next span opener in `s`.
fn find_open(s: &str) -> Option<(usize, Open)> {
    let bytes = s.as_bytes();
    let mut i = s.find('{')?;
    loop {
        match bytes.get(i + 1) {
            Some(b'{') if bytes.get(i + 2) == Some(&b'!') => return Some((i, Open::Raw)),
            Some(b'{') => return Some((i, Open::Output)),
            Some(b'%') => return Some((i, Open::Code)),
            _ => i += 1 + s[i + 1..].find('{')?,
        }
    }
}

/// Length of the span body before `close`, skipping quoted strings.
fn find_close(s: &str, close: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                i += 1;
            }
            _ if bytes[i..].starts_with(close.as_bytes()) => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn count_lines(s: &str) -> usize {
    s.bytes().filter(|&b| b == b'\n').count()
}
