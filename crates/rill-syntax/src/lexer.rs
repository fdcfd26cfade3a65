use logos::Logos;
use rill_common::error::{Error, ErrorS, SyntaxError};

use std::fmt::{self, Display, Formatter};
use std::num::ParseIntError;

pub struct Lexer<'a> {
    inner: logos::Lexer<'a, Token>,
    pending: Option<(usize, Token, usize)>,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { inner: Token::lexer(source), pending: None }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<(usize, Token, usize), ErrorS>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.pending.take() {
            return Some(Ok(token));
        }

        match self.inner.next()? {
            Token::Error => {
                let mut span = self.inner.span();

                // Check for unterminated string.
                if self.inner.slice().starts_with('"') {
                    return Some(Err((
                        Error::SyntaxError(SyntaxError::UnterminatedString),
                        span,
                    )));
                }

                // Recover error.
                while let Some(token) = self.inner.next() {
                    let span_new = self.inner.span();
                    if span.end == span_new.start {
                        span.end = span_new.end;
                    } else {
                        self.pending = Some((span_new.start, token, span_new.end));
                        break;
                    }
                }

                Some(Err((
                    Error::SyntaxError(SyntaxError::UnexpectedInput {
                        token: self.inner.source()[span.start..span.end].to_string(),
                    }),
                    span,
                )))
            }
            token => {
                let span = self.inner.span();
                Some(Ok((span.start, token, span.end)))
            }
        }
    }
}

#[derive(Clone, Debug, Logos, PartialEq)]
pub enum Token {
    // Single-character tokens.
    #[token("(")]
    LtParen,
    #[token(")")]
    RtParen,
    #[token("{")]
    LtBrace,
    #[token("}")]
    RtBrace,
    #[token(";")]
    Semicolon,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token("/")]
    Slash,
    #[token("*")]
    Asterisk,
    #[token("%")]
    Percent,

    // One or two character tokens.
    #[token("!")]
    Bang,
    #[token("!=")]
    BangEqual,
    #[token("=")]
    Equal,
    #[token("==")]
    EqualEqual,
    #[token(">")]
    Greater,
    #[token(">=")]
    GreaterEqual,
    #[token("<")]
    Less,
    #[token("<=")]
    LessEqual,
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,

    // Literals.
    #[regex("[a-zA-Z_][a-zA-Z0-9_]*", lex_identifier)]
    Identifier(String),
    #[regex(r#""[^"]*""#, lex_string)]
    String(String),
    #[regex("[0-9]+", lex_int)]
    Int(i64),

    // Keywords.
    #[token("else")]
    Else,
    #[token("false")]
    False,
    #[token("if")]
    If,
    #[token("let")]
    Let,
    #[token("true")]
    True,

    #[regex(r"//.*", logos::skip)]
    #[regex(r"[ \r\n\t\f]+", logos::skip)]
    #[error]
    Error,
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Token::LtParen => write!(f, "("),
            Token::RtParen => write!(f, ")"),
            Token::LtBrace => write!(f, "{{"),
            Token::RtBrace => write!(f, "}}"),
            Token::Semicolon => write!(f, ";"),
            Token::Minus => write!(f, "-"),
            Token::Plus => write!(f, "+"),
            Token::Slash => write!(f, "/"),
            Token::Asterisk => write!(f, "*"),
            Token::Percent => write!(f, "%"),
            Token::Bang => write!(f, "!"),
            Token::BangEqual => write!(f, "!="),
            Token::Equal => write!(f, "="),
            Token::EqualEqual => write!(f, "=="),
            Token::Greater => write!(f, ">"),
            Token::GreaterEqual => write!(f, ">="),
            Token::Less => write!(f, "<"),
            Token::LessEqual => write!(f, "<="),
            Token::AmpAmp => write!(f, "&&"),
            Token::PipePipe => write!(f, "||"),
            Token::Identifier(name) => write!(f, "{}", name),
            Token::String(string) => write!(f, "{:?}", string),
            Token::Int(int) => write!(f, "{}", int),
            Token::Else => write!(f, "else"),
            Token::False => write!(f, "false"),
            Token::If => write!(f, "if"),
            Token::Let => write!(f, "let"),
            Token::True => write!(f, "true"),
            Token::Error => write!(f, "<error>"),
        }
    }
}

fn lex_int(lexer: &mut logos::Lexer<Token>) -> Result<i64, ParseIntError> {
    let slice = lexer.slice();
    slice.parse::<i64>()
}

fn lex_string(lexer: &mut logos::Lexer<Token>) -> String {
    let slice = lexer.slice();
    slice[1..slice.len() - 1].to_string()
}

fn lex_identifier(lexer: &mut logos::Lexer<Token>) -> String {
    let slice = lexer.slice();
    slice.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn lex_let_statement() {
        let exp = vec![
            Ok((0, Token::Let, 3)),
            Ok((4, Token::Identifier("x".to_string()), 5)),
            Ok((6, Token::Equal, 7)),
            Ok((8, Token::Int(42), 10)),
            Ok((10, Token::Semicolon, 11)),
        ];
        let got = Lexer::new("let x = 42;").collect::<Vec<_>>();
        assert_eq!(exp, got);
    }

    #[test]
    fn lex_skips_line_comments() {
        let exp = vec![Ok((8, Token::True, 12))];
        let got = Lexer::new("// note\ntrue").collect::<Vec<_>>();
        assert_eq!(exp, got);
    }

    #[test]
    fn lex_invalid_token() {
        let exp = vec![
            Err((
                Error::SyntaxError(SyntaxError::UnexpectedInput { token: "@foo".to_string() }),
                0..4,
            )),
            Ok((5, Token::Identifier("bar".to_string()), 8)),
        ];
        let got = Lexer::new("@foo bar").collect::<Vec<_>>();
        assert_eq!(exp, got);
    }

    #[test]
    fn lex_unterminated_string() {
        let exp = vec![Err((Error::SyntaxError(SyntaxError::UnterminatedString), 0..5))];
        let got = Lexer::new("\"\nfoo").collect::<Vec<_>>();
        assert_eq!(exp, got);
    }
}
