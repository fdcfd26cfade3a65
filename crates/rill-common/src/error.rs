use crate::types::{Span, Spanned};

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use termcolor::WriteColor;
use thiserror::Error;

pub type ErrorS = Spanned<Error>;
pub type Result<T, E = ErrorS> = std::result::Result<T, E>;

#[derive(Debug, Error, Eq, PartialEq)]
pub enum Error {
    #[error("IOError: {0}")]
    IoError(#[from] IoError),
    #[error("NameError: {0}")]
    NameError(#[from] NameError),
    #[error("OverflowError: {0}")]
    OverflowError(#[from] OverflowError),
    #[error("SyntaxError: {0}")]
    SyntaxError(#[from] SyntaxError),
    #[error("TypeError: {0}")]
    TypeError(#[from] TypeError),
    #[error("ZeroDivisionError: {0}")]
    ZeroDivisionError(#[from] ZeroDivisionError),
}

impl AsDiagnostic for Error {
    fn as_diagnostic(&self, span: &Span) -> Diagnostic<()> {
        match self {
            Error::IoError(e) => e.as_diagnostic(span),
            Error::NameError(e) => e.as_diagnostic(span),
            Error::OverflowError(e) => e.as_diagnostic(span),
            Error::SyntaxError(e) => e.as_diagnostic(span),
            Error::TypeError(e) => e.as_diagnostic(span),
            Error::ZeroDivisionError(e) => e.as_diagnostic(span),
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum IoError {
    #[error("unable to write to file: {file:?}")]
    WriteError { file: String },
}

impl AsDiagnostic for IoError {
    fn as_diagnostic(&self, span: &Span) -> Diagnostic<()> {
        Diagnostic::error()
            .with_code("IOError")
            .with_message(self.to_string())
            .with_labels(vec![Label::primary((), span.clone())])
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum NameError {
    #[error("name {name:?} is already defined")]
    AlreadyDefined { name: String },
    #[error("name {name:?} is not defined")]
    NotDefined { name: String },
}

impl AsDiagnostic for NameError {
    fn as_diagnostic(&self, span: &Span) -> Diagnostic<()> {
        Diagnostic::error()
            .with_code("NameError")
            .with_message(self.to_string())
            .with_labels(vec![Label::primary((), span.clone())])
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum OverflowError {
    #[error("arithmetic overflow in {op:?} operation")]
    ArithmeticOverflow { op: String },
}

impl AsDiagnostic for OverflowError {
    fn as_diagnostic(&self, span: &Span) -> Diagnostic<()> {
        Diagnostic::error()
            .with_code("OverflowError")
            .with_message(self.to_string())
            .with_labels(vec![Label::primary((), span.clone())])
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum SyntaxError {
    #[error("unexpected input")]
    UnexpectedInput { token: String },
    #[error("unexpected end of file")]
    UnrecognizedEOF { expected: Vec<String> },
    #[error("unexpected {token:?}")]
    UnrecognizedToken { token: String, expected: Vec<String> },
    #[error("unterminated string")]
    UnterminatedString,
}

impl AsDiagnostic for SyntaxError {
    fn as_diagnostic(&self, span: &Span) -> Diagnostic<()> {
        let diagnostic = Diagnostic::error()
            .with_code("SyntaxError")
            .with_message(self.to_string())
            .with_labels(vec![Label::primary((), span.clone())]);
        match self {
            SyntaxError::UnrecognizedEOF { expected }
            | SyntaxError::UnrecognizedToken { expected, .. } => {
                diagnostic.with_notes(vec![format!("expected: {}", one_of(expected))])
            }
            _ => diagnostic,
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum TypeError {
    #[error(r#"condition should be of type "bool", not {type_:?}"#)]
    ConditionInvalidType { type_: String },
    #[error("unsupported operand type(s) for {op}: {lt_type:?} and {rt_type:?}")]
    UnsupportedOperandInfix { op: String, lt_type: String, rt_type: String },
    #[error("unsupported operand type for {op}: {rt_type:?}")]
    UnsupportedOperandPrefix { op: String, rt_type: String },
}

impl AsDiagnostic for TypeError {
    fn as_diagnostic(&self, span: &Span) -> Diagnostic<()> {
        Diagnostic::error()
            .with_code("TypeError")
            .with_message(self.to_string())
            .with_labels(vec![Label::primary((), span.clone())])
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum ZeroDivisionError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("modulo by zero")]
    ModuloByZero,
}

impl AsDiagnostic for ZeroDivisionError {
    fn as_diagnostic(&self, span: &Span) -> Diagnostic<()> {
        Diagnostic::error()
            .with_code("ZeroDivisionError")
            .with_message(self.to_string())
            .with_labels(vec![Label::primary((), span.clone())])
    }
}

trait AsDiagnostic {
    fn as_diagnostic(&self, span: &Span) -> Diagnostic<()>;
}

fn one_of(tokens: &[String]) -> String {
    let (token_last, tokens) = match tokens.split_last() {
        Some((token_last, &[])) => return token_last.to_string(),
        Some((token_last, tokens)) => (token_last, tokens),
        None => return "nothing".to_string(),
    };

    let mut output = String::new();
    for token in tokens {
        output.push_str(token);
        output.push_str(", ");
    }
    output.push_str("or ");
    output.push_str(token_last);
    output
}

pub fn report_err(writer: &mut dyn WriteColor, source: &str, err: &ErrorS) {
    let (err, span) = err;
    let file = SimpleFile::new("<script>", source);
    let config = term::Config::default();
    let diagnostic = err.as_diagnostic(span);
    term::emit(writer, &config, &file, &diagnostic).unwrap();
}
