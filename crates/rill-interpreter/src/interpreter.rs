use crate::env::Env;
use crate::value::Value;

use rill_common::error::{
    Error, ErrorS, IoError, NameError, OverflowError, Result, TypeError, ZeroDivisionError,
};
use rill_common::types::Span;
use rill_syntax::ast::{Expr, ExprLiteral, ExprS, OpInfix, OpPrefix, Stmt, StmtS};

use std::io::Write;
use std::mem;

#[derive(Debug)]
pub struct Interpreter<Stdout> {
    globals: Env<'static>,
    stdout: Stdout,
}

impl<Stdout: Write> Interpreter<Stdout> {
    pub fn new(stdout: Stdout) -> Self {
        Self { globals: Env::default(), stdout }
    }

    /// Runs a program against the persistent global scope. Each top-level
    /// statement fails independently: its error is collected and evaluation
    /// continues with the next statement.
    pub fn run(&mut self, source: &str) -> Result<(), Vec<ErrorS>> {
        let (program, errors) = rill_syntax::parse(source);
        if !errors.is_empty() {
            return Err(errors);
        }

        let mut globals = mem::take(&mut self.globals);
        let mut errors = Vec::new();
        for stmt_s in &program.stmts {
            if let Err(e) = self.run_top(&mut globals, stmt_s) {
                errors.push(e);
            }
        }
        self.globals = globals;

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// A bare expression at the top level writes its value to the output
    /// sink, one line per value, in program order.
    fn run_top(&mut self, env: &mut Env, stmt_s: &StmtS) -> Result<()> {
        let (stmt, span) = stmt_s;
        match stmt {
            Stmt::Expr(expr) => {
                let value = self.run_expr(env, &expr.value)?;
                writeln!(self.stdout, "{}", value).map_err(|_| {
                    (
                        Error::IoError(IoError::WriteError { file: "stdout".to_string() }),
                        span.clone(),
                    )
                })
            }
            _ => self.run_stmt(env, stmt_s),
        }
    }

    fn run_stmt(&mut self, env: &mut Env, stmt_s: &StmtS) -> Result<()> {
        let (stmt, span) = stmt_s;
        match stmt {
            Stmt::Expr(expr) => {
                self.run_expr(env, &expr.value)?;
                Ok(())
            }
            Stmt::Let(let_) => {
                let value = self.run_expr(env, &let_.value)?;
                env.bind(&let_.name, value, span)
            }
        }
    }

    fn run_expr(&mut self, env: &Env, expr_s: &ExprS) -> Result<Value> {
        let (expr, span) = expr_s;
        match expr {
            Expr::Block(block) => {
                let env = &mut Env::with_parent(env);
                for stmt in &block.stmts {
                    self.run_stmt(env, stmt)?;
                }
                self.run_expr(env, &block.value)
            }
            Expr::If(if_) => match self.run_expr(env, &if_.cond)? {
                Value::Bool(true) => self.run_expr(env, &if_.then),
                Value::Bool(false) => self.run_expr(env, &if_.else_),
                value => Err((
                    Error::TypeError(TypeError::ConditionInvalidType {
                        type_: value.type_().to_string(),
                    }),
                    if_.cond.1.clone(),
                )),
            },
            Expr::Infix(infix) => {
                let lt = self.run_expr(env, &infix.lt)?;
                let rt = self.run_expr(env, &infix.rt)?;
                let op = infix.op;
                match (op, lt, rt) {
                    (OpInfix::Add, Value::Int(a), Value::Int(b)) => {
                        let int = a.checked_add(b).ok_or_else(|| overflow(op, span))?;
                        Ok(Value::Int(int))
                    }
                    (OpInfix::Add, Value::String(a), rt) => Ok(Value::String(format!("{a}{rt}"))),
                    (OpInfix::Add, lt, Value::String(b)) => Ok(Value::String(format!("{lt}{b}"))),
                    (OpInfix::Subtract, Value::Int(a), Value::Int(b)) => {
                        let int = a.checked_sub(b).ok_or_else(|| overflow(op, span))?;
                        Ok(Value::Int(int))
                    }
                    (OpInfix::Multiply, Value::Int(a), Value::Int(b)) => {
                        let int = a.checked_mul(b).ok_or_else(|| overflow(op, span))?;
                        Ok(Value::Int(int))
                    }
                    (OpInfix::Divide, Value::Int(_), Value::Int(0)) => Err((
                        Error::ZeroDivisionError(ZeroDivisionError::DivisionByZero),
                        span.clone(),
                    )),
                    (OpInfix::Divide, Value::Int(a), Value::Int(b)) => {
                        let int = a.checked_div(b).ok_or_else(|| overflow(op, span))?;
                        Ok(Value::Int(int))
                    }
                    (OpInfix::Modulo, Value::Int(_), Value::Int(0)) => Err((
                        Error::ZeroDivisionError(ZeroDivisionError::ModuloByZero),
                        span.clone(),
                    )),
                    (OpInfix::Modulo, Value::Int(a), Value::Int(b)) => {
                        let int = a.checked_rem(b).ok_or_else(|| overflow(op, span))?;
                        Ok(Value::Int(int))
                    }
                    (OpInfix::Greater, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a > b)),
                    (OpInfix::GreaterEqual, Value::Int(a), Value::Int(b)) => {
                        Ok(Value::Bool(a >= b))
                    }
                    (OpInfix::Less, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a < b)),
                    (OpInfix::LessEqual, Value::Int(a), Value::Int(b)) => Ok(Value::Bool(a <= b)),
                    // Equality is tag-checked: comparing across types is an
                    // error, not `false`.
                    (OpInfix::Equal, a, b) if a.type_() == b.type_() => Ok(Value::Bool(a == b)),
                    (OpInfix::NotEqual, a, b) if a.type_() == b.type_() => Ok(Value::Bool(a != b)),
                    // Logical operators always evaluate both operands; only
                    // `if` short-circuits.
                    (OpInfix::LogicAnd, Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a && b)),
                    (OpInfix::LogicOr, Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a || b)),
                    (op, lt, rt) => Err((
                        Error::TypeError(TypeError::UnsupportedOperandInfix {
                            op: op.to_string(),
                            lt_type: lt.type_().to_string(),
                            rt_type: rt.type_().to_string(),
                        }),
                        span.clone(),
                    )),
                }
            }
            Expr::Literal(literal) => Ok(match literal {
                ExprLiteral::Bool(bool) => Value::Bool(*bool),
                ExprLiteral::Int(int) => Value::Int(*int),
                ExprLiteral::String(string) => Value::String(string.clone()),
            }),
            Expr::Prefix(prefix) => {
                let rt = self.run_expr(env, &prefix.rt)?;
                match (prefix.op, rt) {
                    (OpPrefix::Negate, Value::Int(int)) => {
                        let int = int.checked_neg().ok_or_else(|| overflow(prefix.op, span))?;
                        Ok(Value::Int(int))
                    }
                    (OpPrefix::Not, Value::Bool(bool)) => Ok(Value::Bool(!bool)),
                    (op, rt) => Err((
                        Error::TypeError(TypeError::UnsupportedOperandPrefix {
                            op: op.to_string(),
                            rt_type: rt.type_().to_string(),
                        }),
                        span.clone(),
                    )),
                }
            }
            Expr::Variable(var) => match env.lookup(&var.name) {
                Some(value) => Ok(value.clone()),
                None => Err((
                    Error::NameError(NameError::NotDefined { name: var.name.to_string() }),
                    span.clone(),
                )),
            },
        }
    }
}

fn overflow(op: impl ToString, span: &Span) -> ErrorS {
    (
        Error::OverflowError(OverflowError::ArithmeticOverflow { op: op.to_string() }),
        span.clone(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    fn run(source: &str) -> (String, Vec<ErrorS>) {
        let mut output = Vec::new();
        let errors = Interpreter::new(&mut output).run(source).err().unwrap_or_default();
        (String::from_utf8(output).unwrap(), errors)
    }

    #[test]
    fn if_yields_the_then_branch() {
        let (output, errors) = run("if (true) 10 else 20;");
        assert_eq!(output, "10\n");
        assert_eq!(errors, vec![]);
    }

    #[test]
    fn if_yields_the_else_branch() {
        let (output, errors) = run("if (false) 10 else 20;");
        assert_eq!(output, "20\n");
        assert_eq!(errors, vec![]);
    }

    #[test]
    fn if_condition_may_be_a_comparison() {
        let (output, errors) = run(r#"if (5 > 3) "yes" else "no";"#);
        assert_eq!(output, "yes\n");
        assert_eq!(errors, vec![]);
    }

    #[test]
    fn block_branches_bind_locals() {
        let source =
            "if (10 > 5) { let temp = 100; temp + 50 } else { let temp = 200; temp + 100 };";
        let (output, errors) = run(source);
        assert_eq!(output, "150\n");
        assert_eq!(errors, vec![]);
    }

    #[test]
    fn nested_if_propagates_the_inner_value() {
        let (output, errors) = run("if (true) { if (false) 1 else 2 } else { 3 };");
        assert_eq!(output, "2\n");
        assert_eq!(errors, vec![]);
    }

    #[test]
    fn the_untaken_branch_is_never_evaluated() {
        let (output, errors) = run("if (true) 1 else 1 / 0;");
        assert_eq!(output, "1\n");
        assert_eq!(errors, vec![]);

        let (output, errors) = run("if (false) missing else 2;");
        assert_eq!(output, "2\n");
        assert_eq!(errors, vec![]);
    }

    #[test]
    fn the_condition_must_be_a_bool() {
        let (output, errors) = run("if (1) 1 else 2;");
        assert_eq!(output, "");
        let exp = vec![(
            Error::TypeError(TypeError::ConditionInvalidType { type_: "int".to_string() }),
            4..5,
        )];
        assert_eq!(exp, errors);
    }

    #[test]
    fn block_bindings_do_not_leak() {
        let (output, errors) = run("{ let x = 1; x };\nx;");
        assert_eq!(output, "1\n");
        let exp = vec![(
            Error::NameError(NameError::NotDefined { name: "x".to_string() }),
            18..19,
        )];
        assert_eq!(exp, errors);
    }

    #[test]
    fn shadowing_is_visible_only_inside_the_block() {
        let (output, errors) = run("let x = 1;\nlet y = { let x = 2; x };\nx;\ny;");
        assert_eq!(output, "1\n2\n");
        assert_eq!(errors, vec![]);
    }

    #[test]
    fn rebinding_in_the_same_frame_fails() {
        let (output, errors) = run("let x = 1; let x = 2;");
        assert_eq!(output, "");
        let exp = vec![(
            Error::NameError(NameError::AlreadyDefined { name: "x".to_string() }),
            11..21,
        )];
        assert_eq!(exp, errors);
    }

    #[test]
    fn equality_requires_matching_types() {
        let (output, errors) = run(r#"1 == "x";"#);
        assert_eq!(output, "");
        let exp = vec![(
            Error::TypeError(TypeError::UnsupportedOperandInfix {
                op: "==".to_string(),
                lt_type: "int".to_string(),
                rt_type: "string".to_string(),
            }),
            0..8,
        )];
        assert_eq!(exp, errors);
    }

    #[test]
    fn comparing_an_int_to_a_string_fails() {
        let (output, errors) = run(r#"if (1 > "x") 1 else 2;"#);
        assert_eq!(output, "");
        let exp = vec![(
            Error::TypeError(TypeError::UnsupportedOperandInfix {
                op: ">".to_string(),
                lt_type: "int".to_string(),
                rt_type: "string".to_string(),
            }),
            4..11,
        )];
        assert_eq!(exp, errors);
    }

    #[test]
    fn a_failed_statement_does_not_stop_the_run() {
        let (output, errors) = run("1 / 0;\n2;");
        assert_eq!(output, "2\n");
        let exp = vec![(
            Error::ZeroDivisionError(ZeroDivisionError::DivisionByZero),
            0..5,
        )];
        assert_eq!(exp, errors);
    }

    #[test]
    fn string_concatenation_stringifies_the_other_operand() {
        let (output, errors) = run(r#""a" + 1; 2 + "b"; "x" + "y";"#);
        assert_eq!(output, "a1\n2b\nxy\n");
        assert_eq!(errors, vec![]);
    }

    #[test]
    fn arithmetic_overflow_is_an_error() {
        let (output, errors) = run("9223372036854775807 + 1;");
        assert_eq!(output, "");
        let exp = vec![(
            Error::OverflowError(OverflowError::ArithmeticOverflow { op: "+".to_string() }),
            0..23,
        )];
        assert_eq!(exp, errors);
    }

    #[test]
    fn logical_operators_require_bools_and_evaluate_both_sides() {
        let (output, errors) = run("true && false; true || false;");
        assert_eq!(output, "false\ntrue\n");
        assert_eq!(errors, vec![]);

        let (_, errors) = run("false && 1 / 0 == 0;");
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn globals_persist_across_runs() {
        let mut output = Vec::new();
        let mut interpreter = Interpreter::new(&mut output);
        interpreter.run("let x = 7;").unwrap();
        interpreter.run("x + 1;").unwrap();
        drop(interpreter);
        assert_eq!(String::from_utf8(output).unwrap(), "8\n");
    }
}
