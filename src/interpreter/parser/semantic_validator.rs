//! Semantic validation for parsed scripts
//!
//! Rules the grammar cannot enforce on its own:
//! - `await` only inside `async` functions
//! - `return` only inside functions
//! - `break` / `continue` only inside loops (not across a function boundary)

use std::fmt;

use crate::interpreter::types::{
    AssignTarget, ClassDef, Expr, FunctionDef, Span, Stmt, TemplatePart,
};

/* ===================== Error Types ===================== */

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    AwaitOutsideAsync { line: usize },
    ReturnOutsideFunction { line: usize },
    BreakOutsideLoop { line: usize },
    ContinueOutsideLoop { line: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::AwaitOutsideAsync { line } => write!(
                f,
                "await is only valid in async functions (line {})",
                line
            ),
            ValidationError::ReturnOutsideFunction { line } => {
                write!(f, "Illegal return statement outside a function (line {})", line)
            }
            ValidationError::BreakOutsideLoop { line } => {
                write!(f, "Illegal break statement outside a loop (line {})", line)
            }
            ValidationError::ContinueOutsideLoop { line } => {
                write!(f, "Illegal continue statement outside a loop (line {})", line)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

pub type ValidationResult<T> = Result<T, ValidationError>;

/* ===================== Public API ===================== */

/// Validate the top-level statements of a script
pub fn validate_program(body: &[Stmt]) -> ValidationResult<()> {
    let ctx = Context::default();
    body.iter().try_for_each(|stmt| validate_stmt(stmt, ctx))
}

/* ===================== Walkers ===================== */

#[derive(Debug, Clone, Copy, Default)]
struct Context {
    in_function: bool,
    in_async: bool,
    in_loop: bool,
}

impl Context {
    fn function(def: &FunctionDef) -> Self {
        Context {
            in_function: true,
            in_async: def.is_async,
            in_loop: false,
        }
    }

    fn looping(self) -> Self {
        Context {
            in_loop: true,
            ..self
        }
    }
}

fn validate_function(def: &FunctionDef) -> ValidationResult<()> {
    let ctx = Context::function(def);
    def.body.iter().try_for_each(|stmt| validate_stmt(stmt, ctx))
}

fn validate_class(def: &ClassDef) -> ValidationResult<()> {
    if let Some(ctor) = &def.constructor {
        validate_function(ctor)?;
    }
    def.methods
        .iter()
        .try_for_each(|(_, method)| validate_function(method))
}

/// Statement right-hand sides may be a top-level await
fn validate_rhs(expr: &Expr, ctx: Context) -> ValidationResult<()> {
    match expr {
        Expr::Await { inner, span } => {
            if !ctx.in_async {
                return Err(ValidationError::AwaitOutsideAsync { line: span.line });
            }
            validate_expr(inner, ctx)
        }
        other => validate_expr(other, ctx),
    }
}

fn validate_stmt(stmt: &Stmt, ctx: Context) -> ValidationResult<()> {
    match stmt {
        Stmt::Block { body, .. } => body.iter().try_for_each(|s| validate_stmt(s, ctx)),
        Stmt::Declare { init, .. } => init.iter().try_for_each(|e| validate_rhs(e, ctx)),
        Stmt::Assign { target, value, .. } => {
            match target {
                AssignTarget::Ident { .. } => {}
                AssignTarget::Member { object, .. } => validate_expr(object, ctx)?,
                AssignTarget::Index { object, index } => {
                    validate_expr(object, ctx)?;
                    validate_expr(index, ctx)?;
                }
            }
            validate_rhs(value, ctx)
        }
        Stmt::Expr { expr, .. } => validate_rhs(expr, ctx),
        Stmt::If {
            test,
            then_s,
            else_s,
            ..
        } => {
            validate_expr(test, ctx)?;
            validate_stmt(then_s, ctx)?;
            else_s.iter().try_for_each(|s| validate_stmt(s, ctx))
        }
        Stmt::While { test, body, .. } => {
            validate_expr(test, ctx)?;
            validate_stmt(body, ctx.looping())
        }
        Stmt::For {
            init,
            test,
            update,
            body,
            ..
        } => {
            init.iter().try_for_each(|s| validate_stmt(s, ctx))?;
            test.iter().try_for_each(|e| validate_expr(e, ctx))?;
            update.iter().try_for_each(|s| validate_stmt(s, ctx))?;
            validate_stmt(body, ctx.looping())
        }
        Stmt::ForEach { iterable, body, .. } => {
            validate_expr(iterable, ctx)?;
            validate_stmt(body, ctx.looping())
        }
        Stmt::Return { value, span } => {
            if !ctx.in_function {
                return Err(ValidationError::ReturnOutsideFunction { line: span.line });
            }
            value.iter().try_for_each(|e| validate_rhs(e, ctx))
        }
        Stmt::Throw { value, .. } => validate_expr(value, ctx),
        Stmt::Try {
            body,
            catch_body,
            finally_body,
            ..
        } => {
            validate_stmt(body, ctx)?;
            catch_body.iter().try_for_each(|s| validate_stmt(s, ctx))?;
            finally_body.iter().try_for_each(|s| validate_stmt(s, ctx))
        }
        Stmt::Break { span } => loop_only(ctx, *span, |line| ValidationError::BreakOutsideLoop { line }),
        Stmt::Continue { span } => {
            loop_only(ctx, *span, |line| ValidationError::ContinueOutsideLoop { line })
        }
        Stmt::Function { def, .. } => validate_function(def),
        Stmt::Class { def, .. } => validate_class(def),
        Stmt::Empty { .. } => Ok(()),
    }
}

fn loop_only(
    ctx: Context,
    span: Span,
    err: impl FnOnce(usize) -> ValidationError,
) -> ValidationResult<()> {
    if ctx.in_loop {
        Ok(())
    } else {
        Err(err(span.line))
    }
}

/// Nested expressions never contain await; only function bodies need a new context
fn validate_expr(expr: &Expr, ctx: Context) -> ValidationResult<()> {
    match expr {
        Expr::LitNum { .. }
        | Expr::LitStr { .. }
        | Expr::LitBool { .. }
        | Expr::LitNull { .. }
        | Expr::LitUndefined { .. }
        | Expr::Ident { .. }
        | Expr::This { .. } => Ok(()),
        Expr::Template { parts, .. } => parts.iter().try_for_each(|part| match part {
            TemplatePart::Str(_) => Ok(()),
            TemplatePart::Expr(e) => validate_expr(e, ctx),
        }),
        Expr::Array { items, .. } => items.iter().try_for_each(|e| validate_expr(e, ctx)),
        Expr::Object { props, .. } => props.iter().try_for_each(|(_, e)| validate_expr(e, ctx)),
        Expr::Member { object, .. } => validate_expr(object, ctx),
        Expr::Index { object, index, .. } => {
            validate_expr(object, ctx)?;
            validate_expr(index, ctx)
        }
        Expr::Call { callee, args, .. } | Expr::New { callee, args, .. } => {
            validate_expr(callee, ctx)?;
            args.iter().try_for_each(|e| validate_expr(e, ctx))
        }
        Expr::Function { def, .. } => validate_function(def),
        Expr::Unary { operand, .. } => validate_expr(operand, ctx),
        Expr::Binary { left, right, .. } => {
            validate_expr(left, ctx)?;
            validate_expr(right, ctx)
        }
        Expr::Conditional {
            test,
            then_e,
            else_e,
            ..
        } => {
            validate_expr(test, ctx)?;
            validate_expr(then_e, ctx)?;
            validate_expr(else_e, ctx)
        }
        Expr::Await { inner, span } => {
            if !ctx.in_async {
                return Err(ValidationError::AwaitOutsideAsync { line: span.line });
            }
            validate_expr(inner, ctx)
        }
    }
}
