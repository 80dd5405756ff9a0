//! Tokenizer for template scripts.

use serde_json::Number;

use crate::TemplateError;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Str(String),
    Num(Number),
    // Keywords
    Let,
    If,
    Else,
    For,
    In,
    Text,
    Escape,
    Echo,
    True,
    False,
    Null,
    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Dot,
    Semi,
    Assign,
    Bang,
    Minus,
    Plus,
    Star,
    Slash,
    Percent,
    Tilde,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    AndAnd,
    OrOr,
}

/// A token and the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Lexeme {
    pub token: Token,
    pub line: usize,
}

pub(crate) fn tokenize(src: &str) -> Result<Vec<Lexeme>, TemplateError> {
    Lexer {
        chars: src.chars().peekable(),
        line: 1,
    }
    .run()
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
}

impl Lexer<'_> {
    fn run(mut self) -> Result<Vec<Lexeme>, TemplateError> {
        let mut out = Vec::new();
        while let Some(c) = self.chars.next() {
            let line = self.line;
            let token = match c {
                '\n' => {
                    self.line += 1;
                    continue;
                }
                c if c.is_whitespace() => continue,
                '"' | '\'' => Token::Str(self.string(c)?),
                c if c.is_ascii_digit() => Token::Num(self.number(c)?),
                c if c.is_alphabetic() || c == '_' => keyword_or_ident(self.ident(c)),
                '(' => Token::LParen,
                ')' => Token::RParen,
                '[' => Token::LBracket,
                ']' => Token::RBracket,
                '{' => Token::LBrace,
                '}' => Token::RBrace,
                ',' => Token::Comma,
                '.' => Token::Dot,
                ';' => Token::Semi,
                '-' => Token::Minus,
                '+' => Token::Plus,
                '*' => Token::Star,
                '/' => Token::Slash,
                '%' => Token::Percent,
                '~' => Token::Tilde,
                '=' if self.eat('=') => Token::EqEq,
                '=' => Token::Assign,
                '!' if self.eat('=') => Token::NotEq,
                '!' => Token::Bang,
                '<' if self.eat('=') => Token::Le,
                '<' => Token::Lt,
                '>' if self.eat('=') => Token::Ge,
                '>' => Token::Gt,
                '&' if self.eat('&') => Token::AndAnd,
                '|' if self.eat('|') => Token::OrOr,
                other => {
                    return Err(TemplateError::syntax(
                        line,
                        format!("unexpected character {other:?}"),
                    ));
                }
            };
            out.push(Lexeme { token, line });
        }
        Ok(out)
    }

    fn eat(&mut self, expected: char) -> bool {
        self.chars.next_if_eq(&expected).is_some()
    }

    fn ident(&mut self, first: char) -> String {
        let mut s = String::from(first);
        while let Some(c) = self.chars.next_if(|c| c.is_alphanumeric() || *c == '_') {
            s.push(c);
        }
        s
    }

    fn number(&mut self, first: char) -> Result<Number, TemplateError> {
        let mut s = String::from(first);
        while let Some(c) = self.chars.next_if(char::is_ascii_digit) {
            s.push(c);
        }
        // A dot only belongs to the number when a digit follows; `1.x` is not valid anyway.
        if self.chars.peek() == Some(&'.') {
            let mut lookahead = self.chars.clone();
            lookahead.next();
            if lookahead.peek().is_some_and(char::is_ascii_digit) {
                self.chars.next();
                s.push('.');
                while let Some(c) = self.chars.next_if(char::is_ascii_digit) {
                    s.push(c);
                }
                return s
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .ok_or_else(|| TemplateError::syntax(self.line, format!("bad number {s}")));
            }
        }
        s.parse::<i64>()
            .map(Number::from)
            .map_err(|_| TemplateError::syntax(self.line, format!("number {s} out of range")))
    }

    fn string(&mut self, quote: char) -> Result<String, TemplateError> {
        let start = self.line;
        let mut s = String::new();
        loop {
            let Some(c) = self.chars.next() else {
                return Err(TemplateError::syntax(start, "unterminated string"));
            };
            match c {
                c if c == quote => return Ok(s),
                '\\' => s.push(self.escape()?),
                '\n' => {
                    self.line += 1;
                    s.push('\n');
                }
                c => s.push(c),
            }
        }
    }

    fn escape(&mut self) -> Result<char, TemplateError> {
        let c = self
            .chars
            .next()
            .ok_or_else(|| TemplateError::syntax(self.line, "unterminated string"))?;
        Ok(match c {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{8}',
            'f' => '\u{c}',
            '0' => '\0',
            'u' => return self.unicode_escape(),
            '"' | '\'' | '\\' | '/' => c,
            other => {
                return Err(TemplateError::syntax(
                    self.line,
                    format!("unknown escape \\{other}"),
                ));
            }
        })
    }

    /// `\uXXXX`, with surrogate pairs written as two escapes.
    fn unicode_escape(&mut self) -> Result<char, TemplateError> {
        let high = self.hex4()?;
        let code = if (0xD800..0xDC00).contains(&high) {
            if !(self.eat('\\') && self.eat('u')) {
                return Err(TemplateError::syntax(self.line, "unpaired surrogate"));
            }
            let low = self.hex4()?;
            if !(0xDC00..0xE000).contains(&low) {
                return Err(TemplateError::syntax(self.line, "unpaired surrogate"));
            }
            0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
        } else {
            high
        };
        char::from_u32(code)
            .ok_or_else(|| TemplateError::syntax(self.line, format!("invalid code point {code:#x}")))
    }

    fn hex4(&mut self) -> Result<u32, TemplateError> {
        let mut code = 0;
        for _ in 0..4 {
            let digit = self
                .chars
                .next()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| TemplateError::syntax(self.line, "bad \\u escape"))?;
            code = code * 16 + digit;
        }
        Ok(code)
    }
}

fn keyword_or_ident(word: String) -> Token {
    match word.as_str() {
        "let" => Token::Let,
        "if" => Token::If,
        "else" => Token::Else,
        "for" => Token::For,
        "in" => Token::In,
        "text" => Token::Text,
        "escape" => Token::Escape,
        "echo" => Token::Echo,
        "true" => Token::True,
        "false" => Token::False,
        "null" => Token::Null,
        _ => Token::Ident(word),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        tokenize(src).unwrap().into_iter().map(|l| l.token).collect()
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            tokens("a<=b != !c && d || e==f ~ g"),
            vec![
                Token::Ident("a".to_owned()),
                Token::Le,
                Token::Ident("b".to_owned()),
                Token::NotEq,
                Token::Bang,
                Token::Ident("c".to_owned()),
                Token::AndAnd,
                Token::Ident("d".to_owned()),
                Token::OrOr,
                Token::Ident("e".to_owned()),
                Token::EqEq,
                Token::Ident("f".to_owned()),
                Token::Tilde,
                Token::Ident("g".to_owned()),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("12 3.5 x.0"),
            vec![
                Token::Num(12.into()),
                Token::Num(Number::from_f64(3.5).unwrap()),
                Token::Ident("x".to_owned()),
                Token::Dot,
                Token::Num(0.into()),
            ]
        );
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(
            tokens(r#""a\"b\né😀" 'it\'s'"#),
            vec![
                Token::Str("a\"b\né😀".to_owned()),
                Token::Str("it's".to_owned()),
            ]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            tokens("let if else for in text escape echo true false null lettuce"),
            vec![
                Token::Let,
                Token::If,
                Token::Else,
                Token::For,
                Token::In,
                Token::Text,
                Token::Escape,
                Token::Echo,
                Token::True,
                Token::False,
                Token::Null,
                Token::Ident("lettuce".to_owned()),
            ]
        );
    }

    #[test]
    fn test_line_tracking() {
        let lexemes = tokenize("a\n\nb \"x\ny\" c").unwrap();
        let lines: Vec<usize> = lexemes.iter().map(|l| l.line).collect();
        assert_eq!(lines, vec![1, 3, 3, 4]);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize("\"abc").unwrap_err();
        assert!(matches!(err, TemplateError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize("a\n@").unwrap_err();
        assert!(matches!(err, TemplateError::Syntax { line: 2, .. }));
    }
}
