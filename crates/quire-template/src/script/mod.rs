//! The script language templates compile to.

pub(crate) mod ast;
mod lexer;
mod parser;

use crate::TemplateError;

/// Parse script source into statements.
pub(crate) fn parse(source: &str) -> Result<Vec<ast::Stmt>, TemplateError> {
    parser::parse(lexer::tokenize(source)?)
}
