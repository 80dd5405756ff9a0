//! Recursive-descent parser for template scripts.
//!
//! Operator precedence, loosest first: `||`, `&&`, comparisons, `~`,
//! `+ -`, `* / %`, unary `! -`, postfix `.field` `[index]` `.method()`.

use serde_json::Value;

use super::ast::{BinaryOp, Expr, Stmt, UnaryOp};
use super::lexer::{Lexeme, Token};
use crate::TemplateError;

pub(crate) fn parse(tokens: Vec<Lexeme>) -> Result<Vec<Stmt>, TemplateError> {
    let mut parser = Parser { tokens, pos: 0 };
    let program = parser.block_body()?;
    if let Some(lexeme) = parser.tokens.get(parser.pos) {
        return Err(TemplateError::syntax(
            lexeme.line,
            format!("unexpected {}", describe(&lexeme.token)),
        ));
    }
    Ok(program)
}

struct Parser {
    tokens: Vec<Lexeme>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|l| &l.token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |l| l.line)
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &Token) -> Result<(), TemplateError> {
        if self.eat(token) {
            return Ok(());
        }
        Err(self.unexpected(&format!("expected {}", describe(token))))
    }

    fn unexpected(&self, context: &str) -> TemplateError {
        let found = self.peek().map_or("end of template", describe);
        TemplateError::syntax(self.line(), format!("{context}, found {found}"))
    }

    fn name(&mut self, context: &str) -> Result<String, TemplateError> {
        match self.peek().and_then(soft_name) {
            Some(name) => {
                let name = name.to_owned();
                self.pos += 1;
                Ok(name)
            }
            None => Err(self.unexpected(context)),
        }
    }

    /// Statements up to a closing brace or the end of input.
    fn block_body(&mut self) -> Result<Vec<Stmt>, TemplateError> {
        let mut stmts = Vec::new();
        while !matches!(self.peek(), None | Some(Token::RBrace)) {
            if let Some(stmt) = self.statement()? {
                stmts.push(stmt);
            }
        }
        Ok(stmts)
    }

    fn block(&mut self) -> Result<Vec<Stmt>, TemplateError> {
        self.expect(&Token::LBrace)?;
        let body = self.block_body()?;
        self.expect(&Token::RBrace)?;
        Ok(body)
    }

    fn statement(&mut self) -> Result<Option<Stmt>, TemplateError> {
        let stmt = match self.peek() {
            Some(Token::Semi) => {
                self.pos += 1;
                return Ok(None);
            }
            Some(Token::Text) => {
                self.pos += 1;
                let Some(Token::Str(text)) = self.peek() else {
                    return Err(self.unexpected("expected string after `text`"));
                };
                let text = text.clone();
                self.pos += 1;
                Stmt::Text(text)
            }
            Some(Token::Escape) => {
                self.pos += 1;
                Stmt::Escape(self.expr()?)
            }
            Some(Token::Echo) => {
                self.pos += 1;
                Stmt::Echo(self.expr()?)
            }
            Some(Token::Let) => {
                self.pos += 1;
                let name = self.name("expected variable name after `let`")?;
                self.expect(&Token::Assign)?;
                Stmt::Let(name, self.expr()?)
            }
            Some(Token::If) => return self.if_statement().map(Some),
            Some(Token::For) => return self.for_statement().map(Some),
            _ => return Err(self.unexpected("expected statement")),
        };
        self.expect(&Token::Semi)?;
        Ok(Some(stmt))
    }

    fn if_statement(&mut self) -> Result<Stmt, TemplateError> {
        self.expect(&Token::If)?;
        let mut branches = vec![(self.expr()?, self.block()?)];
        let mut otherwise = Vec::new();
        while self.eat(&Token::Else) {
            if self.eat(&Token::If) {
                branches.push((self.expr()?, self.block()?));
            } else {
                otherwise = self.block()?;
                break;
            }
        }
        Ok(Stmt::If {
            branches,
            otherwise,
        })
    }

    fn for_statement(&mut self) -> Result<Stmt, TemplateError> {
        self.expect(&Token::For)?;
        let first = self.name("expected loop variable after `for`")?;
        let (key, value) = if self.eat(&Token::Comma) {
            (Some(first), self.name("expected loop variable after `,`")?)
        } else {
            (None, first)
        };
        self.expect(&Token::In)?;
        let iter = self.expr()?;
        let body = self.block()?;
        Ok(Stmt::For {
            key,
            value,
            iter,
            body,
        })
    }

    fn expr(&mut self) -> Result<Expr, TemplateError> {
        self.or()
    }

    fn or(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.and()?;
        while self.eat(&Token::OrOr) {
            lhs = binary(BinaryOp::Or, lhs, self.and()?);
        }
        Ok(lhs)
    }

    fn and(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.comparison()?;
        while self.eat(&Token::AndAnd) {
            lhs = binary(BinaryOp::And, lhs, self.comparison()?);
        }
        Ok(lhs)
    }

    fn comparison(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.concat()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::Ne,
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            lhs = binary(op, lhs, self.concat()?);
        }
    }

    fn concat(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.additive()?;
        while self.eat(&Token::Tilde) {
            lhs = binary(BinaryOp::Concat, lhs, self.additive()?);
        }
        Ok(lhs)
    }

    fn additive(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            lhs = binary(op, lhs, self.multiplicative()?);
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            lhs = binary(op, lhs, self.unary()?);
        }
    }

    fn unary(&mut self) -> Result<Expr, TemplateError> {
        if self.eat(&Token::Bang) {
            return Ok(Expr::Unary(UnaryOp::Not, Box::new(self.unary()?)));
        }
        if self.eat(&Token::Minus) {
            return Ok(Expr::Unary(UnaryOp::Neg, Box::new(self.unary()?)));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr, TemplateError> {
        let mut expr = self.primary()?;
        loop {
            if self.eat(&Token::Dot) {
                let name = self.name("expected field name after `.`")?;
                if self.eat(&Token::LParen) {
                    let mut args = vec![expr];
                    args.extend(self.arguments()?);
                    expr = Expr::Call(name, args);
                } else {
                    expr = Expr::Field(Box::new(expr), name);
                }
            } else if self.eat(&Token::LBracket) {
                let index = self.expr()?;
                self.expect(&Token::RBracket)?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                return Ok(expr);
            }
        }
    }

    /// Comma-separated expressions after an opening parenthesis.
    fn arguments(&mut self) -> Result<Vec<Expr>, TemplateError> {
        self.list(&Token::RParen)
    }

    fn list(&mut self, close: &Token) -> Result<Vec<Expr>, TemplateError> {
        let mut items = Vec::new();
        while !self.eat(close) {
            items.push(self.expr()?);
            if !self.eat(&Token::Comma) {
                self.expect(close)?;
                break;
            }
        }
        Ok(items)
    }

    fn primary(&mut self) -> Result<Expr, TemplateError> {
        if let Some(name) = self.peek().and_then(soft_name) {
            let name = name.to_owned();
            self.pos += 1;
            if self.eat(&Token::LParen) {
                return Ok(Expr::Call(name, self.arguments()?));
            }
            return Ok(Expr::Var(name));
        }

        let expr = match self.peek() {
            Some(Token::Str(s)) => Expr::Literal(Value::String(s.clone())),
            Some(Token::Num(n)) => Expr::Literal(Value::Number(n.clone())),
            Some(Token::True) => Expr::Literal(Value::Bool(true)),
            Some(Token::False) => Expr::Literal(Value::Bool(false)),
            Some(Token::Null) => Expr::Literal(Value::Null),
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.expr()?;
                self.expect(&Token::RParen)?;
                return Ok(inner);
            }
            Some(Token::LBracket) => {
                self.pos += 1;
                return Ok(Expr::Array(self.list(&Token::RBracket)?));
            }
            _ => return Err(self.unexpected("expected expression")),
        };
        self.pos += 1;
        Ok(expr)
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary(op, Box::new(lhs), Box::new(rhs))
}

/// Identifiers, plus statement keywords usable as names inside expressions.
fn soft_name(token: &Token) -> Option<&str> {
    match token {
        Token::Ident(name) => Some(name),
        Token::Text => Some("text"),
        Token::Escape => Some("escape"),
        Token::Echo => Some("echo"),
        _ => None,
    }
}

fn describe(token: &Token) -> &'static str {
    match token {
        Token::Ident(_) => "identifier",
        Token::Str(_) => "string",
        Token::Num(_) => "number",
        Token::Let => "`let`",
        Token::If => "`if`",
        Token::Else => "`else`",
        Token::For => "`for`",
        Token::In => "`in`",
        Token::Text => "`text`",
        Token::Escape => "`escape`",
        Token::Echo => "`echo`",
        Token::True => "`true`",
        Token::False => "`false`",
        Token::Null => "`null`",
        Token::LParen => "`(`",
        Token::RParen => "`)`",
        Token::LBracket => "`[`",
        Token::RBracket => "`]`",
        Token::LBrace => "`{`",
        Token::RBrace => "`}`",
        Token::Comma => "`,`",
        Token::Dot => "`.`",
        Token::Semi => "`;`",
        Token::Assign => "`=`",
        Token::Bang => "`!`",
        Token::Minus => "`-`",
        Token::Plus => "`+`",
        Token::Star => "`*`",
        Token::Slash => "`/`",
        Token::Percent => "`%`",
        Token::Tilde => "`~`",
        Token::EqEq => "`==`",
        Token::NotEq => "`!=`",
        Token::Lt => "`<`",
        Token::Le => "`<=`",
        Token::Gt => "`>`",
        Token::Ge => "`>=`",
        Token::AndAnd => "`&&`",
        Token::OrOr => "`||`",
    }
}
