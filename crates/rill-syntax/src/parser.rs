use crate::ast::{
    Expr, ExprBlock, ExprIf, ExprInfix, ExprLiteral, ExprPrefix, ExprS, ExprVariable, OpInfix,
    OpPrefix, Program, Stmt, StmtExpr, StmtLet, StmtS,
};
use crate::lexer::{Lexer, Token};

use rill_common::error::{Error, ErrorS, SyntaxError};
use rill_common::types::Span;

type Result<T, E = ErrorS> = std::result::Result<T, E>;

pub struct Parser {
    tokens: Vec<(Token, Span)>,
    cursor: usize,
    eof: usize,
}

impl Parser {
    pub fn parse(source: &str) -> (Program, Vec<ErrorS>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        for item in Lexer::new(source) {
            match item {
                Ok((start, token, end)) => tokens.push((token, start..end)),
                Err(e) => errors.push(e),
            }
        }

        let parser = Parser { tokens, cursor: 0, eof: source.len() };
        let (program, parse_errors) = parser.parse_program();
        errors.extend(parse_errors);
        (program, errors)
    }

    fn parse_program(mut self) -> (Program, Vec<ErrorS>) {
        let mut stmts = Vec::new();
        let mut errors = Vec::new();
        while !self.is_at_end() {
            match self.parse_stmt() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    errors.push(e);
                    self.synchronize();
                }
            }
        }
        (Program { stmts }, errors)
    }

    fn parse_stmt(&mut self) -> Result<StmtS> {
        match self.peek() {
            Some(Token::Let) => self.parse_stmt_let(),
            _ => self.parse_stmt_expr(),
        }
    }

    fn parse_stmt_let(&mut self) -> Result<StmtS> {
        let start = self.expect(&Token::Let)?.start;
        let (name, _) = self.expect_identifier()?;
        self.expect(&Token::Equal)?;
        let value = self.parse_expr()?;
        let end = match self.eat_semicolon()? {
            Some(span) => span.end,
            None => value.1.end,
        };
        Ok((Stmt::Let(StmtLet { name, value }), start..end))
    }

    fn parse_stmt_expr(&mut self) -> Result<StmtS> {
        let value = self.parse_expr()?;
        let span = match self.eat_semicolon()? {
            Some(span) => value.1.start..span.end,
            None => value.1.clone(),
        };
        Ok((Stmt::Expr(StmtExpr { value }), span))
    }

    /// A `;` terminates every statement, but may be omitted before EOF.
    fn eat_semicolon(&mut self) -> Result<Option<Span>> {
        if self.is_at_end() {
            return Ok(None);
        }
        self.expect(&Token::Semicolon).map(Some)
    }

    fn parse_expr(&mut self) -> Result<ExprS> {
        self.parse_logic_or()
    }

    fn parse_logic_or(&mut self) -> Result<ExprS> {
        self.parse_infix(&[(Token::PipePipe, OpInfix::LogicOr)], Self::parse_logic_and)
    }

    fn parse_logic_and(&mut self) -> Result<ExprS> {
        self.parse_infix(&[(Token::AmpAmp, OpInfix::LogicAnd)], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Result<ExprS> {
        self.parse_infix(
            &[(Token::EqualEqual, OpInfix::Equal), (Token::BangEqual, OpInfix::NotEqual)],
            Self::parse_comparison,
        )
    }

    fn parse_comparison(&mut self) -> Result<ExprS> {
        self.parse_infix(
            &[
                (Token::Greater, OpInfix::Greater),
                (Token::GreaterEqual, OpInfix::GreaterEqual),
                (Token::Less, OpInfix::Less),
                (Token::LessEqual, OpInfix::LessEqual),
            ],
            Self::parse_term,
        )
    }

    fn parse_term(&mut self) -> Result<ExprS> {
        self.parse_infix(
            &[(Token::Plus, OpInfix::Add), (Token::Minus, OpInfix::Subtract)],
            Self::parse_factor,
        )
    }

    fn parse_factor(&mut self) -> Result<ExprS> {
        self.parse_infix(
            &[
                (Token::Asterisk, OpInfix::Multiply),
                (Token::Slash, OpInfix::Divide),
                (Token::Percent, OpInfix::Modulo),
            ],
            Self::parse_unary,
        )
    }

    fn parse_infix(
        &mut self,
        ops: &[(Token, OpInfix)],
        next: fn(&mut Self) -> Result<ExprS>,
    ) -> Result<ExprS> {
        let mut lt = next(self)?;
        'outer: loop {
            for (token, op) in ops {
                if self.eat(token) {
                    let rt = next(self)?;
                    let span = lt.1.start..rt.1.end;
                    lt = (Expr::Infix(Box::new(ExprInfix { lt, op: *op, rt })), span);
                    continue 'outer;
                }
            }
            return Ok(lt);
        }
    }

    fn parse_unary(&mut self) -> Result<ExprS> {
        let op = match self.peek() {
            Some(Token::Bang) => OpPrefix::Not,
            Some(Token::Minus) => OpPrefix::Negate,
            _ => return self.parse_primary(),
        };
        let start = self.tokens[self.cursor].1.start;
        self.cursor += 1;
        let rt = self.parse_unary()?;
        let span = start..rt.1.end;
        Ok((Expr::Prefix(Box::new(ExprPrefix { op, rt })), span))
    }

    fn parse_primary(&mut self) -> Result<ExprS> {
        let (token, span) = self.advance("an expression")?;
        match token {
            Token::False => Ok((Expr::Literal(ExprLiteral::Bool(false)), span)),
            Token::True => Ok((Expr::Literal(ExprLiteral::Bool(true)), span)),
            Token::Int(int) => Ok((Expr::Literal(ExprLiteral::Int(int)), span)),
            Token::String(string) => Ok((Expr::Literal(ExprLiteral::String(string)), span)),
            Token::Identifier(name) => Ok((Expr::Variable(ExprVariable { name }), span)),
            Token::LtParen => {
                let (expr, _) = self.parse_expr()?;
                let end = self.expect(&Token::RtParen)?.end;
                Ok((expr, span.start..end))
            }
            Token::If => self.parse_expr_if(span.start),
            Token::LtBrace => self.parse_expr_block(span.start),
            token => Err((
                Error::SyntaxError(SyntaxError::UnrecognizedToken {
                    token: token.to_string(),
                    expected: vec!["an expression".to_string()],
                }),
                span,
            )),
        }
    }

    /// `if (cond) then else else_` — the `else` branch is mandatory, since an
    /// `if` is an expression and must always yield a value.
    fn parse_expr_if(&mut self, start: usize) -> Result<ExprS> {
        self.expect(&Token::LtParen)?;
        let cond = self.parse_expr()?;
        self.expect(&Token::RtParen)?;
        let then = self.parse_expr()?;
        self.expect(&Token::Else)?;
        let else_ = self.parse_expr()?;
        let span = start..else_.1.end;
        Ok((Expr::If(Box::new(ExprIf { cond, then, else_ })), span))
    }

    /// `{ stmt* expr }` — the trailing expression carries no `;` and becomes
    /// the block's value.
    fn parse_expr_block(&mut self, start: usize) -> Result<ExprS> {
        let mut stmts = Vec::new();
        loop {
            if let Some(Token::Let) = self.peek() {
                stmts.push(self.parse_stmt_let()?);
                continue;
            }
            let value = self.parse_expr()?;
            if let Some(Token::Semicolon) = self.peek() {
                let end = self.expect(&Token::Semicolon)?.end;
                let span = value.1.start..end;
                stmts.push((Stmt::Expr(StmtExpr { value }), span));
                continue;
            }
            let end = self.expect(&Token::RtBrace)?.end;
            return Ok((Expr::Block(Box::new(ExprBlock { stmts, value })), start..end));
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.cursor).map(|(token, _)| token)
    }

    fn eat(&mut self, token: &Token) -> bool {
        match self.tokens.get(self.cursor) {
            Some((next, _)) if next == token => {
                self.cursor += 1;
                true
            }
            _ => false,
        }
    }

    fn advance(&mut self, expected: &str) -> Result<(Token, Span)> {
        match self.tokens.get(self.cursor) {
            Some((token, span)) => {
                self.cursor += 1;
                Ok((token.clone(), span.clone()))
            }
            None => Err((
                Error::SyntaxError(SyntaxError::UnrecognizedEOF {
                    expected: vec![expected.to_string()],
                }),
                self.eof..self.eof,
            )),
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<Span> {
        match self.tokens.get(self.cursor) {
            Some((token, span)) if token == expected => {
                self.cursor += 1;
                Ok(span.clone())
            }
            Some((token, span)) => Err((
                Error::SyntaxError(SyntaxError::UnrecognizedToken {
                    token: token.to_string(),
                    expected: vec![format!("\"{expected}\"")],
                }),
                span.clone(),
            )),
            None => Err((
                Error::SyntaxError(SyntaxError::UnrecognizedEOF {
                    expected: vec![format!("\"{expected}\"")],
                }),
                self.eof..self.eof,
            )),
        }
    }

    fn expect_identifier(&mut self) -> Result<(String, Span)> {
        match self.tokens.get(self.cursor) {
            Some((Token::Identifier(name), span)) => {
                let result = (name.clone(), span.clone());
                self.cursor += 1;
                Ok(result)
            }
            Some((token, span)) => Err((
                Error::SyntaxError(SyntaxError::UnrecognizedToken {
                    token: token.to_string(),
                    expected: vec!["an identifier".to_string()],
                }),
                span.clone(),
            )),
            None => Err((
                Error::SyntaxError(SyntaxError::UnrecognizedEOF {
                    expected: vec!["an identifier".to_string()],
                }),
                self.eof..self.eof,
            )),
        }
    }

    fn is_at_end(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    /// Skips to the next statement boundary so one bad statement yields one
    /// error instead of a cascade.
    fn synchronize(&mut self) {
        while let Some((token, _)) = self.tokens.get(self.cursor) {
            match token {
                Token::Semicolon => {
                    self.cursor += 1;
                    return;
                }
                Token::Let => return,
                _ => self.cursor += 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> (Program, Vec<ErrorS>) {
        Parser::parse(source)
    }

    #[test]
    fn parse_let_with_comparison() {
        let exp = Program {
            stmts: vec![(
                Stmt::Let(StmtLet {
                    name: "x".to_string(),
                    value: (
                        Expr::Infix(Box::new(ExprInfix {
                            lt: (Expr::Literal(ExprLiteral::Int(1)), 8..9),
                            op: OpInfix::Greater,
                            rt: (Expr::Literal(ExprLiteral::Int(2)), 12..13),
                        })),
                        8..13,
                    ),
                }),
                0..14,
            )],
        };
        let (got, errors) = parse("let x = 1 > 2;");
        assert_eq!(exp, got);
        assert_eq!(errors, vec![]);
    }

    #[test]
    fn parse_if_expression() {
        let exp = Program {
            stmts: vec![(
                Stmt::Expr(StmtExpr {
                    value: (
                        Expr::If(Box::new(ExprIf {
                            cond: (Expr::Literal(ExprLiteral::Bool(true)), 4..8),
                            then: (Expr::Literal(ExprLiteral::Int(1)), 10..11),
                            else_: (Expr::Literal(ExprLiteral::Int(2)), 17..18),
                        })),
                        0..18,
                    ),
                }),
                0..19,
            )],
        };
        let (got, errors) = parse("if (true) 1 else 2;");
        assert_eq!(exp, got);
        assert_eq!(errors, vec![]);
    }

    #[test]
    fn parse_if_with_block_branches() {
        let (program, errors) = parse(
            "let z = if (10 > 5) { let temp = 100; temp + 50 } else { let temp = 200; temp + 100 };",
        );
        assert_eq!(errors, vec![]);
        assert_eq!(program.stmts.len(), 1);
    }

    #[test]
    fn if_expression_requires_else() {
        let (_, errors) = parse("if (true) 1");
        let exp = vec![(
            Error::SyntaxError(SyntaxError::UnrecognizedEOF {
                expected: vec!["\"else\"".to_string()],
            }),
            11..11,
        )];
        assert_eq!(exp, errors);
    }

    #[test]
    fn block_requires_a_trailing_expression() {
        let (_, errors) = parse("{ let x = 1; }");
        let exp = vec![(
            Error::SyntaxError(SyntaxError::UnrecognizedToken {
                token: "}".to_string(),
                expected: vec!["an expression".to_string()],
            }),
            13..14,
        )];
        assert_eq!(exp, errors);
    }

    #[test]
    fn recovers_after_a_bad_statement() {
        let (program, errors) = parse("let = 1;\nlet y = 2;");
        assert_eq!(errors.len(), 1);
        assert_eq!(program.stmts.len(), 1);
    }

    #[test]
    fn reports_every_bad_statement_in_one_pass() {
        let (program, errors) = parse("let = 1; if true) 2 else 3; let y = 2;");
        let exp = vec![
            (
                Error::SyntaxError(SyntaxError::UnrecognizedToken {
                    token: "=".to_string(),
                    expected: vec!["an identifier".to_string()],
                }),
                4..5,
            ),
            (
                Error::SyntaxError(SyntaxError::UnrecognizedToken {
                    token: "true".to_string(),
                    expected: vec!["\"(\"".to_string()],
                }),
                12..16,
            ),
        ];
        assert_eq!(exp, errors);
        assert_eq!(program.stmts.len(), 1);
    }
}
