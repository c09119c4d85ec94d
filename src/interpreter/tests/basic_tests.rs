//! Expressions, bindings and conversions

use super::helpers::{eval, eval_display, eval_err, thrown_message};
use crate::error::EngineError;
use crate::interpreter::{Interpreter, Val};

#[test]
fn test_arithmetic_and_precedence() {
    assert_eq!(eval("1 + 2 * 3 - 4 / 2"), Val::Num(5.0));
    assert_eq!(eval("(1 + 2) * 3"), Val::Num(9.0));
    assert_eq!(eval("7 % 3"), Val::Num(1.0));
}

#[test]
fn test_string_concatenation_coerces() {
    assert_eq!(eval_display("'a' + 1 + 2"), "a12");
    assert_eq!(eval_display("1 + 2 + 'a'"), "3a");
    assert_eq!(eval_display("'n=' + null"), "n=null");
}

#[test]
fn test_number_formatting() {
    assert_eq!(eval_display("10 / 4"), "2.5");
    assert_eq!(eval_display("6 / 2"), "3");
    assert_eq!(eval_display("1 / 0"), "Infinity");
    assert_eq!(eval_display("0 / 0"), "NaN");
}

#[test]
fn test_template_literal() {
    assert_eq!(
        eval_display("const who = 'world'; const n = 2; `hello ${who} x${n + 1}`"),
        "hello world x3"
    );
}

#[test]
fn test_equality_semantics() {
    assert_eq!(eval("1 == '1'"), Val::Bool(true));
    assert_eq!(eval("1 === '1'"), Val::Bool(false));
    assert_eq!(eval("null == undefined"), Val::Bool(true));
    assert_eq!(eval("null === undefined"), Val::Bool(false));
    assert_eq!(eval("const a = {}; const b = a; a === b"), Val::Bool(true));
    assert_eq!(eval("({}) === ({})"), Val::Bool(false));
    assert_eq!(eval("NaN === NaN"), Val::Bool(false));
}

#[test]
fn test_logical_operators_short_circuit() {
    assert_eq!(eval_display("0 || 'fallback'"), "fallback");
    assert_eq!(eval_display("'' && boom()"), "");
    assert_eq!(eval_display("0 ?? 'unused'"), "0");
    assert_eq!(eval_display("undefined ?? 'used'"), "used");
}

#[test]
fn test_typeof() {
    assert_eq!(
        eval_display("[typeof 1, typeof 'a', typeof null, typeof undefined, typeof {}, typeof (() => 1)].join(' ')"),
        "number string object undefined object function"
    );
}

#[test]
fn test_undeclared_identifier_is_reference_error() {
    assert_eq!(
        thrown_message("missingName + 1"),
        "ReferenceError: missingName is not defined"
    );
}

#[test]
fn test_const_reassignment_throws() {
    assert_eq!(
        thrown_message("const a = 1; a = 2;"),
        "TypeError: Assignment to constant variable."
    );
}

#[test]
fn test_let_redeclaration_throws() {
    assert_eq!(
        thrown_message("let a = 1; let a = 2;"),
        "SyntaxError: Identifier 'a' has already been declared"
    );
}

#[test]
fn test_block_scoping() {
    assert_eq!(eval("let a = 1; { let a = 2; } a"), Val::Num(1.0));
    assert_eq!(eval("var b = 1; { b = 5; } b"), Val::Num(5.0));
}

#[test]
fn test_compound_assignment() {
    assert_eq!(eval("let a = 10; a += 5; a -= 3; a *= 2; a /= 4; a"), Val::Num(6.0));
    assert_eq!(eval_display("let s = 'a'; s += 'b'; s"), "ab");
}

#[test]
fn test_object_members_and_index() {
    assert_eq!(eval("const o = { a: 1 }; o.b = 2; o['c'] = o.a + o.b; o.c"), Val::Num(3.0));
    assert_eq!(eval("const o = {}; o.missing"), Val::Undefined);
}

#[test]
fn test_destructuring() {
    assert_eq!(
        eval_display("const { a, b: renamed } = { a: 1, b: 'two' }; `${a}-${renamed}`"),
        "1-two"
    );
}

#[test]
fn test_optional_chaining() {
    assert_eq!(eval("const o = null; o?.deep"), Val::Undefined);
    assert_eq!(eval("const o = { f: null }; o.f?.()"), Val::Undefined);
    assert_eq!(eval("const a = [5]; a?.[0]"), Val::Num(5.0));
}

#[test]
fn test_reading_property_of_null_throws() {
    assert_eq!(
        thrown_message("const o = null; o.x"),
        "TypeError: Cannot read properties of null (reading 'x')"
    );
}

#[test]
fn test_calling_non_function_throws() {
    let message = thrown_message("const o = { x: 1 }; o.x()");
    assert!(message.starts_with("TypeError:"), "got {}", message);
    assert!(message.contains("is not a function"), "got {}", message);
}

#[test]
fn test_array_length_and_index_writes() {
    assert_eq!(eval("const a = [1, 2]; a[4] = 5; a.length"), Val::Num(5.0));
    assert_eq!(eval_display("const a = [1, 2, 3]; a.length = 1; a"), "1");
    assert_eq!(eval("'hello'.length"), Val::Num(5.0));
    assert_eq!(eval_display("'hello'[1]"), "e");
}

#[test]
fn test_invalid_array_lengths_throw_range_error() {
    assert_eq!(
        thrown_message("const a = []; a.length = 4294967296;"),
        "RangeError: Invalid array length"
    );
    assert_eq!(
        thrown_message("const a = []; a.length = -1;"),
        "RangeError: Invalid array length"
    );
    assert_eq!(
        thrown_message("const a = []; a.length = 1.5;"),
        "RangeError: Invalid array length"
    );
}

#[test]
fn test_huge_array_length_is_refused() {
    assert_eq!(
        thrown_message("const a = []; a.length = 1e15;"),
        "RangeError: Array length 1000000000000000 exceeds the interpreter limit"
    );
    // the array is unchanged and still usable
    let source = r#"
        const a = [1];
        try { a.length = 4294967295; } catch (e) {}
        a.push(2);
        a.length
    "#;
    assert_eq!(eval(source), Val::Num(2.0));
}

#[test]
fn test_far_index_write_is_stored_sparsely() {
    let source = "const a = [1]; a[1e9] = 'far'; a.length + ':' + a[1000000000]";
    assert_eq!(eval_display(source), "1:far");
    assert_eq!(
        eval_display("const a = []; a[1e9] = true; Object.keys(a).join()"),
        "1000000000"
    );
}

#[test]
fn test_array_display_joins_with_commas() {
    assert_eq!(eval_display("[1, 'a', null, [2, 3]]"), "1,a,,2,3");
}

#[test]
fn test_completion_is_last_expression_statement() {
    assert_eq!(eval("1; 2; let x = 3;"), Val::Num(2.0));
    assert_eq!(eval("let x = 3;"), Val::Undefined);
}

#[test]
fn test_top_level_bindings_persist_between_runs() {
    let mut interp = Interpreter::new();
    interp.run_script("let counter = 1; function bump() { counter += 1; return counter; }").unwrap();
    assert_eq!(interp.run_script("bump()").unwrap(), Val::Num(2.0));
    assert_eq!(interp.run_script("counter").unwrap(), Val::Num(2.0));
}

#[test]
fn test_syntax_error_is_reported() {
    assert!(matches!(eval_err("let = 1"), EngineError::Syntax(_)));
}
