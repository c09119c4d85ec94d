//! PEST-based parser for the script language
//!
//! Produces the AST in [`crate::interpreter::types::ast`]. [`parse`] also runs the
//! semantic validator; [`parse_program`] only builds the tree.

use std::fmt;
use std::sync::Arc;

use pest::Parser;
use pest_derive::Parser;

use super::types::{
    AssignOp, AssignTarget, BinaryOp, ClassDef, DeclareTarget, Expr, ForLoopKind, FunctionDef,
    Span, Stmt, TemplatePart, UnaryOp, VarKind,
};

pub mod semantic_validator;

#[cfg(test)]
mod tests;

use semantic_validator::ValidationError;

/* ===================== PEST Parser ===================== */

#[derive(Parser)]
#[grammar = "interpreter/parser/grammar.pest"]
struct ScriptParser;

type Pair<'i> = pest::iterators::Pair<'i, Rule>;
type Pairs<'i> = pest::iterators::Pairs<'i, Rule>;

/* ===================== Error Types ===================== */

#[derive(Debug, Clone, PartialEq)]
pub enum ParseError {
    PestError(String),
    BuildError { message: String, span: Option<Span> },
    Invalid(ValidationError),
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::PestError(msg) => write!(f, "{}", msg),
            ParseError::BuildError {
                message,
                span: Some(span),
            } => write!(f, "{} (line {}, col {})", message, span.line, span.col),
            ParseError::BuildError { message, span: None } => write!(f, "{}", message),
            ParseError::Invalid(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ParseError {}

impl From<pest::error::Error<Rule>> for ParseError {
    fn from(err: pest::error::Error<Rule>) -> Self {
        ParseError::PestError(err.to_string())
    }
}

impl From<ValidationError> for ParseError {
    fn from(err: ValidationError) -> Self {
        ParseError::Invalid(err)
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

/* ===================== Public API ===================== */

/// Parse and validate a script
pub fn parse(source: &str) -> ParseResult<Vec<Stmt>> {
    let body = parse_program(source)?;
    semantic_validator::validate_program(&body)?;
    Ok(body)
}

/// Parse a script into top-level statements without semantic validation
pub fn parse_program(source: &str) -> ParseResult<Vec<Stmt>> {
    let mut pairs = ScriptParser::parse(Rule::program, source)?;
    let program = next_pair(&mut pairs, "program", None)?;

    let mut body = Vec::new();
    for pair in program.into_inner() {
        match pair.as_rule() {
            Rule::statement => body.push(build_statement(pair)?),
            Rule::EOI => {}
            other => return Err(unexpected("program item", other, &pair)),
        }
    }
    Ok(body)
}

/* ===================== Helpers ===================== */

fn pair_to_span(pair: &Pair) -> Span {
    let span = pair.as_span();
    let (line, col) = span.start_pos().line_col();
    Span {
        start: span.start(),
        end: span.end(),
        line,
        col,
    }
}

fn join_spans(left: Span, right: Span) -> Span {
    Span {
        start: left.start,
        end: right.end,
        line: left.line,
        col: left.col,
    }
}

fn build_error(message: impl Into<String>, span: Span) -> ParseError {
    ParseError::BuildError {
        message: message.into(),
        span: Some(span),
    }
}

fn unexpected(what: &str, rule: Rule, pair: &Pair) -> ParseError {
    build_error(format!("Unexpected {} rule: {:?}", what, rule), pair_to_span(pair))
}

fn next_pair<'i>(pairs: &mut Pairs<'i>, what: &str, span: Option<Span>) -> ParseResult<Pair<'i>> {
    pairs.next().ok_or_else(|| ParseError::BuildError {
        message: format!("Missing {}", what),
        span,
    })
}

fn first_inner<'i>(pair: Pair<'i>, what: &str) -> ParseResult<Pair<'i>> {
    let span = pair_to_span(&pair);
    next_pair(&mut pair.into_inner(), what, Some(span))
}

/* ===================== Statements ===================== */

fn build_statements(pairs: Pairs) -> ParseResult<Vec<Stmt>> {
    pairs.map(build_statement).collect()
}

fn build_statement(pair: Pair) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair);

    match pair.as_rule() {
        Rule::statement => build_statement(first_inner(pair, "statement")?),

        Rule::block => Ok(Stmt::Block {
            body: build_statements(pair.into_inner())?,
            span,
        }),

        Rule::empty_stmt => Ok(Stmt::Empty { span }),

        Rule::function_decl => Ok(Stmt::Function {
            def: build_function(pair)?,
            span,
        }),

        Rule::class_decl => build_class(pair),

        Rule::if_stmt => {
            // if_stmt = { kw_if ~ "(" ~ expression ~ ")" ~ statement ~ (kw_else ~ statement)? }
            let mut inner = pair.into_inner();
            let test = build_expression(next_pair(&mut inner, "if condition", Some(span))?)?;
            let then_s = build_statement(next_pair(&mut inner, "if body", Some(span))?)?;
            let else_s = inner.next().map(build_statement).transpose()?;
            Ok(Stmt::If {
                test,
                then_s: Box::new(then_s),
                else_s: else_s.map(Box::new),
                span,
            })
        }

        Rule::while_stmt => {
            let mut inner = pair.into_inner();
            let test = build_expression(next_pair(&mut inner, "while condition", Some(span))?)?;
            let body = build_statement(next_pair(&mut inner, "while body", Some(span))?)?;
            Ok(Stmt::While {
                test,
                body: Box::new(body),
                span,
            })
        }

        Rule::for_each_stmt => {
            // for_each_stmt = { kw_for ~ "(" ~ decl_kind ~ identifier ~ for_kind ~ expression ~ ")" ~ statement }
            let mut inner = pair.into_inner();
            let decl = build_var_kind(&next_pair(&mut inner, "declaration kind", Some(span))?)?;
            let binding = next_pair(&mut inner, "loop binding", Some(span))?
                .as_str()
                .to_string();
            let loop_kind = match next_pair(&mut inner, "for kind", Some(span))?.as_str() {
                "in" => ForLoopKind::In,
                _ => ForLoopKind::Of,
            };
            let iterable = build_expression(next_pair(&mut inner, "iterable", Some(span))?)?;
            let body = build_statement(next_pair(&mut inner, "loop body", Some(span))?)?;
            Ok(Stmt::ForEach {
                loop_kind,
                decl,
                binding,
                iterable,
                body: Box::new(body),
                span,
            })
        }

        Rule::for_stmt => build_for(pair),

        Rule::try_stmt => build_try(pair),

        Rule::return_stmt => {
            let value = pair.into_inner().next().map(build_rhs).transpose()?;
            Ok(Stmt::Return { value, span })
        }

        Rule::throw_stmt => Ok(Stmt::Throw {
            value: build_expression(first_inner(pair, "thrown value")?)?,
            span,
        }),

        Rule::break_stmt => Ok(Stmt::Break { span }),

        Rule::continue_stmt => Ok(Stmt::Continue { span }),

        Rule::declare_stmt | Rule::declare_clause => build_declare(pair),

        Rule::update_stmt | Rule::update_clause => build_update(pair),

        Rule::assign_stmt | Rule::assign_clause => build_assign(pair),

        Rule::expr_stmt => Ok(Stmt::Expr {
            expr: build_rhs(first_inner(pair, "expression")?)?,
            span,
        }),

        Rule::expression => Ok(Stmt::Expr {
            expr: build_expression(pair)?,
            span,
        }),

        other => Err(unexpected("statement", other, &pair)),
    }
}

fn build_var_kind(pair: &Pair) -> ParseResult<VarKind> {
    match pair.as_str() {
        "let" => Ok(VarKind::Let),
        "const" => Ok(VarKind::Const),
        "var" => Ok(VarKind::Var),
        other => Err(build_error(
            format!("Unknown declaration kind '{}'", other),
            pair_to_span(pair),
        )),
    }
}

fn build_declare(pair: Pair) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair);
    let clause = if pair.as_rule() == Rule::declare_stmt {
        first_inner(pair, "declaration")?
    } else {
        pair
    };

    // declare_clause = { decl_kind ~ declare_target ~ ("=" ~ rhs)? }
    let mut inner = clause.into_inner();
    let kind = build_var_kind(&next_pair(&mut inner, "declaration kind", Some(span))?)?;
    let target_pair = first_inner(next_pair(&mut inner, "declaration target", Some(span))?, "declaration target")?;
    let target = match target_pair.as_rule() {
        Rule::identifier => DeclareTarget::Simple {
            name: target_pair.as_str().to_string(),
        },
        Rule::object_pattern => {
            let names = target_pair
                .into_inner()
                .map(|prop| {
                    let mut parts = prop.into_inner().map(|p| p.as_str().to_string());
                    let property = parts.next().unwrap_or_default();
                    let binding = parts.next().unwrap_or_else(|| property.clone());
                    (property, binding)
                })
                .collect();
            DeclareTarget::Destructure { names }
        }
        other => return Err(unexpected("declaration target", other, &target_pair)),
    };
    let init = inner.next().map(build_rhs).transpose()?;

    if kind == VarKind::Const && init.is_none() {
        return Err(build_error("Missing initializer in const declaration", span));
    }
    if matches!(target, DeclareTarget::Destructure { .. }) && init.is_none() {
        return Err(build_error("Missing initializer in destructuring declaration", span));
    }

    Ok(Stmt::Declare {
        kind,
        target,
        init,
        span,
    })
}

fn build_assign_target(expr: Expr) -> ParseResult<AssignTarget> {
    match expr {
        Expr::Ident { name, .. } => Ok(AssignTarget::Ident { name }),
        Expr::Member {
            object,
            property,
            optional: false,
            ..
        } => Ok(AssignTarget::Member {
            object: *object,
            property,
        }),
        Expr::Index {
            object,
            index,
            optional: false,
            ..
        } => Ok(AssignTarget::Index {
            object: *object,
            index: *index,
        }),
        other => Err(build_error("Invalid assignment target", other.span())),
    }
}

fn build_assign(pair: Pair) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair);
    let clause = if pair.as_rule() == Rule::assign_stmt {
        first_inner(pair, "assignment")?
    } else {
        pair
    };

    // assign_clause = { call_expr ~ assign_op ~ rhs }
    let mut inner = clause.into_inner();
    let target = build_assign_target(build_expression(next_pair(
        &mut inner,
        "assignment target",
        Some(span),
    )?)?)?;
    let op = match next_pair(&mut inner, "assignment operator", Some(span))?.as_str() {
        "+=" => AssignOp::Add,
        "-=" => AssignOp::Sub,
        "*=" => AssignOp::Mul,
        "/=" => AssignOp::Div,
        _ => AssignOp::Set,
    };
    let value = build_rhs(next_pair(&mut inner, "assigned value", Some(span))?)?;

    Ok(Stmt::Assign {
        target,
        op,
        value,
        span,
    })
}

/// `x++` / `x--` become `x += 1` / `x -= 1`
fn build_update(pair: Pair) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair);
    let clause = if pair.as_rule() == Rule::update_stmt {
        first_inner(pair, "update")?
    } else {
        pair
    };

    let mut inner = clause.into_inner();
    let target = build_assign_target(build_expression(next_pair(
        &mut inner,
        "update target",
        Some(span),
    )?)?)?;
    let op = match next_pair(&mut inner, "update operator", Some(span))?.as_str() {
        "--" => AssignOp::Sub,
        _ => AssignOp::Add,
    };

    Ok(Stmt::Assign {
        target,
        op,
        value: Expr::LitNum { v: 1.0, span },
        span,
    })
}

fn build_for(pair: Pair) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair);
    let mut init = None;
    let mut test = None;
    let mut update = None;
    let mut body = None;

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::for_init | Rule::for_update => {
                let is_init = item.as_rule() == Rule::for_init;
                let stmt = build_statement(first_inner(item, "for clause")?)?;
                if is_init {
                    init = Some(Box::new(stmt));
                } else {
                    update = Some(Box::new(stmt));
                }
            }
            Rule::for_test => test = Some(build_expression(first_inner(item, "for condition")?)?),
            Rule::statement => body = Some(Box::new(build_statement(item)?)),
            other => return Err(unexpected("for clause", other, &item)),
        }
    }

    let body = body.ok_or_else(|| build_error("Missing for body", span))?;
    Ok(Stmt::For {
        init,
        test,
        update,
        body,
        span,
    })
}

fn build_try(pair: Pair) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair);
    let mut body = None;
    let mut catch_var = None;
    let mut catch_body = None;
    let mut finally_body = None;

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::block => body = Some(Box::new(build_statement(item)?)),
            Rule::catch_clause => {
                for part in item.into_inner() {
                    match part.as_rule() {
                        Rule::identifier => catch_var = Some(part.as_str().to_string()),
                        _ => catch_body = Some(Box::new(build_statement(part)?)),
                    }
                }
            }
            Rule::finally_clause => {
                finally_body = Some(Box::new(build_statement(first_inner(item, "finally block")?)?))
            }
            other => return Err(unexpected("try clause", other, &item)),
        }
    }

    if catch_body.is_none() && finally_body.is_none() {
        return Err(build_error("Missing catch or finally after try", span));
    }

    Ok(Stmt::Try {
        body: body.ok_or_else(|| build_error("Missing try block", span))?,
        catch_var,
        catch_body,
        finally_body,
        span,
    })
}

/* ===================== Functions & Classes ===================== */

/// Build any function-like rule: declarations, expressions, methods
fn build_function(pair: Pair) -> ParseResult<Arc<FunctionDef>> {
    let span = pair_to_span(&pair);
    let mut def = FunctionDef {
        name: None,
        params: Vec::new(),
        body: Vec::new(),
        is_async: false,
        is_arrow: false,
        span,
    };

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::async_kw => def.is_async = true,
            Rule::identifier | Rule::property_name => def.name = Some(item.as_str().to_string()),
            Rule::prop_key => def.name = Some(build_prop_key(item)?),
            Rule::param_list => def.params = build_param_list(item),
            Rule::block => def.body = build_statements(item.into_inner())?,
            other => return Err(unexpected("function part", other, &item)),
        }
    }

    Ok(Arc::new(def))
}

fn build_param_list(pair: Pair) -> Vec<String> {
    // param_list = { identifier ~ ("," ~ identifier)* }
    pair.into_inner().map(|p| p.as_str().to_string()).collect()
}

fn build_arrow(pair: Pair) -> ParseResult<Expr> {
    let span = pair_to_span(&pair);
    let mut def = FunctionDef {
        name: None,
        params: Vec::new(),
        body: Vec::new(),
        is_async: false,
        is_arrow: true,
        span,
    };

    for item in pair.into_inner() {
        match item.as_rule() {
            Rule::async_kw => def.is_async = true,
            Rule::arrow_params => {
                for param in item.into_inner() {
                    match param.as_rule() {
                        Rule::identifier => def.params.push(param.as_str().to_string()),
                        Rule::param_list => def.params = build_param_list(param),
                        other => return Err(unexpected("arrow parameter", other, &param)),
                    }
                }
            }
            Rule::arrow_body => {
                let body = first_inner(item, "arrow body")?;
                def.body = match body.as_rule() {
                    Rule::block => build_statements(body.into_inner())?,
                    _ => {
                        let body_span = pair_to_span(&body);
                        vec![Stmt::Return {
                            value: Some(build_rhs(body)?),
                            span: body_span,
                        }]
                    }
                };
            }
            other => return Err(unexpected("arrow part", other, &item)),
        }
    }

    Ok(Expr::Function {
        def: Arc::new(def),
        span,
    })
}

fn build_class(pair: Pair) -> ParseResult<Stmt> {
    let span = pair_to_span(&pair);
    let mut inner = pair.into_inner();
    let name = next_pair(&mut inner, "class name", Some(span))?
        .as_str()
        .to_string();

    let mut constructor = None;
    let mut methods = Vec::new();
    for member in inner {
        let def = build_function(member)?;
        let method_name = def.name.clone().unwrap_or_default();
        if method_name == "constructor" {
            if def.is_async {
                return Err(build_error("Class constructor may not be async", def.span));
            }
            constructor = Some(def);
        } else {
            methods.push((method_name, def));
        }
    }

    Ok(Stmt::Class {
        def: Arc::new(ClassDef {
            name,
            constructor,
            methods,
            span,
        }),
        span,
    })
}

/* ===================== Expressions ===================== */

/// Right-hand side of a statement: an expression or `await expression`
fn build_rhs(pair: Pair) -> ParseResult<Expr> {
    match pair.as_rule() {
        Rule::await_expr => {
            let span = pair_to_span(&pair);
            let inner = build_expression(first_inner(pair, "awaited expression")?)?;
            Ok(Expr::Await {
                inner: Box::new(inner),
                span,
            })
        }
        _ => build_expression(pair),
    }
}

fn build_expression(pair: Pair) -> ParseResult<Expr> {
    let span = pair_to_span(&pair);

    match pair.as_rule() {
        Rule::expression => build_expression(first_inner(pair, "expression")?),

        Rule::arrow_function => build_arrow(pair),

        Rule::conditional => {
            // conditional = { nullish ~ ("?" ~ expression ~ ":" ~ expression)? }
            let mut inner = pair.into_inner();
            let test = build_expression(next_pair(&mut inner, "condition", Some(span))?)?;
            match inner.next() {
                None => Ok(test),
                Some(then_pair) => {
                    let then_e = build_expression(then_pair)?;
                    let else_e = build_expression(next_pair(&mut inner, "else branch", Some(span))?)?;
                    Ok(Expr::Conditional {
                        test: Box::new(test),
                        then_e: Box::new(then_e),
                        else_e: Box::new(else_e),
                        span,
                    })
                }
            }
        }

        Rule::nullish
        | Rule::or_expr
        | Rule::and_expr
        | Rule::equality
        | Rule::comparison
        | Rule::additive
        | Rule::multiplicative => build_binary_expr(pair),

        Rule::unary => {
            // unary = { unary_op* ~ call_expr }
            let mut ops = Vec::new();
            let mut operand = None;
            for item in pair.into_inner() {
                match item.as_rule() {
                    Rule::unary_op => ops.push((item.as_str().to_string(), pair_to_span(&item))),
                    _ => operand = Some(build_expression(item)?),
                }
            }
            let mut expr = operand.ok_or_else(|| build_error("Missing operand", span))?;
            for (op, op_span) in ops.into_iter().rev() {
                let op = match op.as_str() {
                    "!" => UnaryOp::Not,
                    "-" => UnaryOp::Neg,
                    "+" => UnaryOp::Plus,
                    _ => UnaryOp::Typeof,
                };
                let span = join_spans(op_span, expr.span());
                expr = Expr::Unary {
                    op,
                    operand: Box::new(expr),
                    span,
                };
            }
            Ok(expr)
        }

        Rule::call_expr => build_call_expr(pair),

        Rule::new_expr => {
            // new_expr = { kw_new ~ new_callee ~ arguments? }
            let mut inner = pair.into_inner();
            let callee_pair = next_pair(&mut inner, "constructor", Some(span))?;
            let mut parts = callee_pair.into_inner();
            let mut callee = build_expression(next_pair(&mut parts, "constructor", Some(span))?)?;
            for property in parts {
                let prop_span = join_spans(callee.span(), pair_to_span(&property));
                callee = Expr::Member {
                    object: Box::new(callee),
                    property: property.as_str().to_string(),
                    optional: false,
                    span: prop_span,
                };
            }
            let args = inner.next().map(build_arguments).transpose()?.unwrap_or_default();
            Ok(Expr::New {
                callee: Box::new(callee),
                args,
                span,
            })
        }

        Rule::identifier => Ok(Expr::Ident {
            name: pair.as_str().to_string(),
            span,
        }),

        Rule::this_lit => Ok(Expr::This { span }),

        Rule::number => {
            let num_str = pair.as_str();
            let value = num_str.parse::<f64>().map_err(|e| {
                build_error(format!("Failed to parse number '{}': {}", num_str, e), span)
            })?;
            Ok(Expr::LitNum { v: value, span })
        }

        Rule::boolean => Ok(Expr::LitBool {
            v: pair.as_str() == "true",
            span,
        }),

        Rule::null_lit => Ok(Expr::LitNull { span }),

        Rule::undefined_lit => Ok(Expr::LitUndefined { span }),

        Rule::string => Ok(Expr::LitStr {
            v: build_string(pair)?,
            span,
        }),

        Rule::template => {
            let mut parts = Vec::new();
            for item in pair.into_inner() {
                match item.as_rule() {
                    Rule::template_chunk => parts.push(TemplatePart::Str(unescape(item.as_str()))),
                    Rule::template_sub => parts.push(TemplatePart::Expr(build_expression(
                        first_inner(item, "template substitution")?,
                    )?)),
                    other => return Err(unexpected("template part", other, &item)),
                }
            }
            Ok(Expr::Template { parts, span })
        }

        Rule::function_expr => Ok(Expr::Function {
            def: build_function(pair)?,
            span,
        }),

        Rule::array_lit => {
            let items = pair
                .into_inner()
                .map(build_expression)
                .collect::<ParseResult<Vec<_>>>()?;
            Ok(Expr::Array { items, span })
        }

        Rule::object_lit => {
            let props = pair
                .into_inner()
                .map(build_object_prop)
                .collect::<ParseResult<Vec<_>>>()?;
            Ok(Expr::Object { props, span })
        }

        other => Err(unexpected("expression", other, &pair)),
    }
}

/// Left-associative chain of binary operators at one precedence level
fn build_binary_expr(pair: Pair) -> ParseResult<Expr> {
    let span = pair_to_span(&pair);
    let mut inner = pair.into_inner();
    let mut left = build_expression(next_pair(&mut inner, "operand", Some(span))?)?;

    while let Some(op_pair) = inner.next() {
        let op = match op_pair.as_str() {
            "??" => BinaryOp::Nullish,
            "||" => BinaryOp::Or,
            "&&" => BinaryOp::And,
            "===" => BinaryOp::StrictEq,
            "!==" => BinaryOp::StrictNe,
            "==" => BinaryOp::Eq,
            "!=" => BinaryOp::Ne,
            "<" => BinaryOp::Lt,
            "<=" => BinaryOp::Le,
            ">" => BinaryOp::Gt,
            ">=" => BinaryOp::Ge,
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Sub,
            "*" => BinaryOp::Mul,
            "/" => BinaryOp::Div,
            "%" => BinaryOp::Rem,
            other => {
                return Err(build_error(
                    format!("Unknown operator '{}'", other),
                    pair_to_span(&op_pair),
                ))
            }
        };
        let right = build_expression(next_pair(&mut inner, "right operand", Some(span))?)?;
        let span = join_spans(left.span(), right.span());
        left = Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        };
    }

    Ok(left)
}

fn build_call_expr(pair: Pair) -> ParseResult<Expr> {
    // call_expr = { (new_expr | primary) ~ postfix_op* }
    let span = pair_to_span(&pair);
    let mut inner = pair.into_inner();
    let mut expr = build_expression(next_pair(&mut inner, "callee", Some(span))?)?;

    for op in inner {
        let span = join_spans(expr.span(), pair_to_span(&op));
        expr = match op.as_rule() {
            Rule::arguments => Expr::Call {
                callee: Box::new(expr),
                args: build_arguments(op)?,
                optional: false,
                span,
            },
            Rule::optional_call => Expr::Call {
                callee: Box::new(expr),
                args: build_arguments(first_inner(op, "arguments")?)?,
                optional: true,
                span,
            },
            Rule::member_op | Rule::optional_member => {
                let optional = op.as_rule() == Rule::optional_member;
                Expr::Member {
                    object: Box::new(expr),
                    property: first_inner(op, "property name")?.as_str().to_string(),
                    optional,
                    span,
                }
            }
            Rule::index_op | Rule::optional_index => {
                let optional = op.as_rule() == Rule::optional_index;
                Expr::Index {
                    object: Box::new(expr),
                    index: Box::new(build_expression(first_inner(op, "index")?)?),
                    optional,
                    span,
                }
            }
            other => return Err(unexpected("postfix operator", other, &op)),
        };
    }

    Ok(expr)
}

fn build_arguments(pair: Pair) -> ParseResult<Vec<Expr>> {
    pair.into_inner().map(build_expression).collect()
}

fn build_object_prop(pair: Pair) -> ParseResult<(String, Expr)> {
    let prop = first_inner(pair, "object property")?;
    let span = pair_to_span(&prop);

    match prop.as_rule() {
        Rule::object_method => {
            let def = build_function(prop)?;
            let name = def.name.clone().unwrap_or_default();
            Ok((name, Expr::Function { def, span }))
        }
        Rule::object_pair => {
            let mut inner = prop.into_inner();
            let key = build_prop_key(next_pair(&mut inner, "property key", Some(span))?)?;
            let value = build_expression(next_pair(&mut inner, "property value", Some(span))?)?;
            Ok((key, value))
        }
        Rule::object_shorthand => {
            let name = prop.as_str().trim().to_string();
            Ok((name.clone(), Expr::Ident { name, span }))
        }
        other => Err(unexpected("object property", other, &prop)),
    }
}

fn build_prop_key(pair: Pair) -> ParseResult<String> {
    let key = first_inner(pair, "property key")?;
    match key.as_rule() {
        Rule::string => build_string(key),
        Rule::number => {
            let span = pair_to_span(&key);
            let n = key
                .as_str()
                .parse::<f64>()
                .map_err(|e| build_error(format!("Invalid numeric key: {}", e), span))?;
            Ok(super::convert::number_to_string(n))
        }
        _ => Ok(key.as_str().to_string()),
    }
}

fn build_string(pair: Pair) -> ParseResult<String> {
    // string = ${ "\"" ~ dq_inner ~ "\"" | "'" ~ sq_inner ~ "'" }
    let content = first_inner(pair, "string content")?;
    Ok(unescape(content.as_str()))
}

/// Process backslash escapes in string and template text
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}
