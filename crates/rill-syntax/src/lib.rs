pub mod ast;
pub mod lexer;
pub mod parser;

use crate::ast::Program;
use crate::parser::Parser;

use rill_common::error::ErrorS;

/// Parses a program, accumulating as many errors as possible in one pass
/// instead of stopping at the first one.
pub fn parse(source: &str) -> (Program, Vec<ErrorS>) {
    Parser::parse(source)
}
