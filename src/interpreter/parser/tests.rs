//! Parser tests - verify parsing and AST structure
//!
//! These tests do NOT execute code; execution is covered by the interpreter tests.

use super::semantic_validator::ValidationError;
use super::{parse, parse_program, ParseError};
use crate::interpreter::types::{
    AssignOp, AssignTarget, BinaryOp, DeclareTarget, Expr, ForLoopKind, Stmt, TemplatePart,
    UnaryOp, VarKind,
};

fn single(source: &str) -> Stmt {
    let mut body = parse(source).expect("Should parse");
    assert_eq!(body.len(), 1, "expected one statement, got {:?}", body);
    body.remove(0)
}

fn single_expr(source: &str) -> Expr {
    match single(source) {
        Stmt::Expr { expr, .. } => expr,
        other => panic!("Expected expression statement, got {:?}", other),
    }
}

/* ===================== Literals ===================== */

#[test]
fn test_parse_number_literal() {
    match single_expr("42.5") {
        Expr::LitNum { v, .. } => assert_eq!(v, 42.5),
        other => panic!("Expected LitNum, got {:?}", other),
    }
}

#[test]
fn test_negative_number_is_unary() {
    match single_expr("-3") {
        Expr::Unary {
            op: UnaryOp::Neg,
            operand,
            ..
        } => assert!(matches!(*operand, Expr::LitNum { v, .. } if v == 3.0)),
        other => panic!("Expected Unary Neg, got {:?}", other),
    }
}

#[test]
fn test_string_escapes() {
    match single_expr(r#""a\n\"b\" A""#) {
        Expr::LitStr { v, .. } => assert_eq!(v, "a\n\"b\" A"),
        other => panic!("Expected LitStr, got {:?}", other),
    }
    match single_expr("'it\\'s'") {
        Expr::LitStr { v, .. } => assert_eq!(v, "it's"),
        other => panic!("Expected LitStr, got {:?}", other),
    }
}

#[test]
fn test_template_parts() {
    match single_expr("`Hello ${name}!`") {
        Expr::Template { parts, .. } => {
            assert_eq!(parts.len(), 3);
            assert!(matches!(&parts[0], TemplatePart::Str(s) if s == "Hello "));
            assert!(matches!(&parts[1], TemplatePart::Expr(Expr::Ident { name, .. }) if name == "name"));
            assert!(matches!(&parts[2], TemplatePart::Str(s) if s == "!"));
        }
        other => panic!("Expected Template, got {:?}", other),
    }
}

#[test]
fn test_keyword_literals() {
    assert!(matches!(single_expr("true"), Expr::LitBool { v: true, .. }));
    assert!(matches!(single_expr("null"), Expr::LitNull { .. }));
    assert!(matches!(single_expr("undefined"), Expr::LitUndefined { .. }));
    assert!(matches!(single_expr("this"), Expr::This { .. }));
}

#[test]
fn test_identifier_may_start_with_keyword() {
    // `newValue` and `classy` must not be split at the keyword
    match single("let newValue = classy;") {
        Stmt::Declare {
            target: DeclareTarget::Simple { name },
            init: Some(Expr::Ident { name: init, .. }),
            ..
        } => {
            assert_eq!(name, "newValue");
            assert_eq!(init, "classy");
        }
        other => panic!("Expected Declare, got {:?}", other),
    }
}

/* ===================== Objects & Arrays ===================== */

#[test]
fn test_object_literal_forms() {
    match single_expr("({ a: 1, 'b c': 2, d, m() { return 1; } })") {
        Expr::Object { props, .. } => {
            let keys: Vec<&str> = props.iter().map(|(k, _)| k.as_str()).collect();
            assert_eq!(keys, vec!["a", "b c", "d", "m"]);
            assert!(matches!(&props[2].1, Expr::Ident { name, .. } if name == "d"));
            assert!(matches!(&props[3].1, Expr::Function { .. }));
        }
        other => panic!("Expected Object, got {:?}", other),
    }
}

#[test]
fn test_array_literal_trailing_comma() {
    match single_expr("[1, 2, 3,]") {
        Expr::Array { items, .. } => assert_eq!(items.len(), 3),
        other => panic!("Expected Array, got {:?}", other),
    }
}

/* ===================== Operators ===================== */

#[test]
fn test_precedence_mul_over_add() {
    match single_expr("1 + 2 * 3") {
        Expr::Binary {
            op: BinaryOp::Add,
            right,
            ..
        } => assert!(matches!(*right, Expr::Binary { op: BinaryOp::Mul, .. })),
        other => panic!("Expected Add at the root, got {:?}", other),
    }
}

#[test]
fn test_binary_is_left_associative() {
    match single_expr("10 - 4 - 3") {
        Expr::Binary {
            op: BinaryOp::Sub,
            left,
            ..
        } => assert!(matches!(*left, Expr::Binary { op: BinaryOp::Sub, .. })),
        other => panic!("Expected Sub at the root, got {:?}", other),
    }
}

#[test]
fn test_strict_and_loose_equality() {
    assert!(matches!(
        single_expr("a === b"),
        Expr::Binary { op: BinaryOp::StrictEq, .. }
    ));
    assert!(matches!(
        single_expr("a != b"),
        Expr::Binary { op: BinaryOp::Ne, .. }
    ));
}

#[test]
fn test_nullish_and_conditional() {
    match single_expr("a ?? b ? 1 : 2") {
        Expr::Conditional { test, .. } => {
            assert!(matches!(*test, Expr::Binary { op: BinaryOp::Nullish, .. }))
        }
        other => panic!("Expected Conditional, got {:?}", other),
    }
}

#[test]
fn test_typeof_operator() {
    assert!(matches!(
        single_expr("typeof x"),
        Expr::Unary { op: UnaryOp::Typeof, .. }
    ));
}

/* ===================== Calls & Members ===================== */

#[test]
fn test_method_call_chain() {
    match single_expr("a.b(1).c") {
        Expr::Member { object, property, optional: false, .. } => {
            assert_eq!(property, "c");
            match *object {
                Expr::Call { callee, args, .. } => {
                    assert_eq!(args.len(), 1);
                    assert!(matches!(*callee, Expr::Member { ref property, .. } if property == "b"));
                }
                other => panic!("Expected Call, got {:?}", other),
            }
        }
        other => panic!("Expected Member, got {:?}", other),
    }
}

#[test]
fn test_optional_chaining() {
    assert!(matches!(
        single_expr("a?.b"),
        Expr::Member { optional: true, .. }
    ));
    assert!(matches!(
        single_expr("a?.[0]"),
        Expr::Index { optional: true, .. }
    ));
    assert!(matches!(
        single_expr("f?.()"),
        Expr::Call { optional: true, .. }
    ));
}

#[test]
fn test_keyword_property_names() {
    match single_expr("p.then(f).catch(g)") {
        Expr::Call { callee, .. } => {
            assert!(matches!(*callee, Expr::Member { ref property, .. } if property == "catch"))
        }
        other => panic!("Expected Call, got {:?}", other),
    }
}

#[test]
fn test_new_with_member_callee() {
    match single_expr("new ns.Thing(1, 2)") {
        Expr::New { callee, args, .. } => {
            assert_eq!(args.len(), 2);
            assert!(matches!(*callee, Expr::Member { ref property, .. } if property == "Thing"));
        }
        other => panic!("Expected New, got {:?}", other),
    }
}

#[test]
fn test_immediately_invoked_function() {
    match single_expr("(function () { return 1; })()") {
        Expr::Call { callee, args, .. } => {
            assert!(args.is_empty());
            assert!(matches!(*callee, Expr::Function { .. }));
        }
        other => panic!("Expected Call, got {:?}", other),
    }
}

/* ===================== Functions & Classes ===================== */

#[test]
fn test_arrow_expression_body_becomes_return() {
    match single_expr("(a, b) => a + b") {
        Expr::Function { def, .. } => {
            assert!(def.is_arrow);
            assert_eq!(def.params, vec!["a", "b"]);
            assert!(matches!(def.body.as_slice(), [Stmt::Return { value: Some(_), .. }]));
        }
        other => panic!("Expected Function, got {:?}", other),
    }
}

#[test]
fn test_async_arrow_may_await_in_body() {
    match single_expr("async () => await sleep(1)") {
        Expr::Function { def, .. } => {
            assert!(def.is_async);
            assert!(matches!(
                def.body.as_slice(),
                [Stmt::Return { value: Some(Expr::Await { .. }), .. }]
            ));
        }
        other => panic!("Expected Function, got {:?}", other),
    }
}

#[test]
fn test_function_declaration() {
    match single("async function load(url) { const r = await fetch(url); return r; }") {
        Stmt::Function { def, .. } => {
            assert_eq!(def.name.as_deref(), Some("load"));
            assert!(def.is_async);
            assert!(!def.is_arrow);
            assert_eq!(def.body.len(), 2);
        }
        other => panic!("Expected Function, got {:?}", other),
    }
}

#[test]
fn test_class_with_constructor_and_async_method() {
    let source = r#"
        class Controller {
            constructor(name) { this.name = name; }
            test() { log("hi"); }
            async testAsync() { await sleep(10); }
        }
    "#;
    match single(source) {
        Stmt::Class { def, .. } => {
            assert_eq!(def.name, "Controller");
            assert!(def.constructor.is_some());
            let names: Vec<&str> = def.methods.iter().map(|(n, _)| n.as_str()).collect();
            assert_eq!(names, vec!["test", "testAsync"]);
            assert!(def.methods[1].1.is_async);
        }
        other => panic!("Expected Class, got {:?}", other),
    }
}

#[test]
fn test_async_constructor_is_rejected() {
    let err = parse("class A { async constructor() {} }").unwrap_err();
    assert!(matches!(err, ParseError::BuildError { .. }), "got {:?}", err);
}

/* ===================== Statements ===================== */

#[test]
fn test_update_statement_desugars_to_assign() {
    match single("i++;") {
        Stmt::Assign {
            target: AssignTarget::Ident { name },
            op: AssignOp::Add,
            value: Expr::LitNum { v, .. },
            ..
        } => {
            assert_eq!(name, "i");
            assert_eq!(v, 1.0);
        }
        other => panic!("Expected Assign, got {:?}", other),
    }
}

#[test]
fn test_compound_member_assignment() {
    match single("this.count -= 2;") {
        Stmt::Assign {
            target: AssignTarget::Member { property, .. },
            op: AssignOp::Sub,
            ..
        } => assert_eq!(property, "count"),
        other => panic!("Expected Assign, got {:?}", other),
    }
}

#[test]
fn test_destructuring_declaration() {
    match single("const { a, b: c } = obj;") {
        Stmt::Declare {
            kind: VarKind::Const,
            target: DeclareTarget::Destructure { names },
            ..
        } => assert_eq!(
            names,
            vec![
                ("a".to_string(), "a".to_string()),
                ("b".to_string(), "c".to_string())
            ]
        ),
        other => panic!("Expected Declare, got {:?}", other),
    }
}

#[test]
fn test_for_of_and_for_in() {
    assert!(matches!(
        single("for (const x of xs) { log(x); }"),
        Stmt::ForEach { loop_kind: ForLoopKind::Of, decl: VarKind::Const, .. }
    ));
    assert!(matches!(
        single("for (let k in obj) {}"),
        Stmt::ForEach { loop_kind: ForLoopKind::In, decl: VarKind::Let, .. }
    ));
}

#[test]
fn test_classic_for_loop() {
    match single("for (let i = 0; i < 3; i++) {}") {
        Stmt::For {
            init: Some(init),
            test: Some(_),
            update: Some(update),
            ..
        } => {
            assert!(matches!(*init, Stmt::Declare { .. }));
            assert!(matches!(*update, Stmt::Assign { .. }));
        }
        other => panic!("Expected For, got {:?}", other),
    }
}

#[test]
fn test_try_catch_finally() {
    match single("try { f(); } catch (e) { g(e); } finally { h(); }") {
        Stmt::Try {
            catch_var,
            catch_body,
            finally_body,
            ..
        } => {
            assert_eq!(catch_var.as_deref(), Some("e"));
            assert!(catch_body.is_some());
            assert!(finally_body.is_some());
        }
        other => panic!("Expected Try, got {:?}", other),
    }
}

#[test]
fn test_if_else_without_braces() {
    match single("if (a) x = 1; else x = 2;") {
        Stmt::If { else_s, .. } => assert!(else_s.is_some()),
        other => panic!("Expected If, got {:?}", other),
    }
}

#[test]
fn test_comments_are_skipped() {
    let body = parse("// line\n/* block\n comment */ let a = 1; // trailing").expect("Should parse");
    assert_eq!(body.len(), 1);
}

#[test]
fn test_spans_carry_line_numbers() {
    let body = parse("let a = 1;\n\nlet b = 2;").expect("Should parse");
    assert_eq!(body[0].span().line, 1);
    assert_eq!(body[1].span().line, 3);
}

/* ===================== Errors ===================== */

#[test]
fn test_syntax_error_is_pest_error() {
    let err = parse("let = ;").unwrap_err();
    assert!(matches!(err, ParseError::PestError(_)), "got {:?}", err);
}

#[test]
fn test_await_inside_expression_is_rejected() {
    // await may only be the whole right-hand side of a statement
    assert!(parse("async function f() { return 1 + await g(); }").is_err());
}

#[test]
fn test_await_outside_async_fails_validation() {
    let err = parse("function f() { await g(); }").unwrap_err();
    assert_eq!(
        err,
        ParseError::Invalid(ValidationError::AwaitOutsideAsync { line: 1 })
    );
}

#[test]
fn test_top_level_await_fails_validation() {
    let err = parse("await g();").unwrap_err();
    assert!(matches!(
        err,
        ParseError::Invalid(ValidationError::AwaitOutsideAsync { .. })
    ));
}

#[test]
fn test_return_outside_function() {
    let err = parse("return 1;").unwrap_err();
    assert!(matches!(
        err,
        ParseError::Invalid(ValidationError::ReturnOutsideFunction { .. })
    ));
    // parse_program skips validation
    assert!(parse_program("return 1;").is_ok());
}

#[test]
fn test_break_cannot_cross_function_boundary() {
    let err = parse("while (true) { const f = () => { break; }; }").unwrap_err();
    assert!(matches!(
        err,
        ParseError::Invalid(ValidationError::BreakOutsideLoop { .. })
    ));
}
