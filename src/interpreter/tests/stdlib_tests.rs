//! Built-in objects and prototype methods

use super::helpers::{eval, eval_display, thrown_message};
use crate::interpreter::Val;

#[test]
fn test_math() {
    assert_eq!(eval("Math.floor(2.7) + Math.ceil(2.1) + Math.abs(-1)"), Val::Num(6.0));
    assert_eq!(eval("Math.max(1, 9, 3) - Math.min(4, 2)"), Val::Num(7.0));
    assert_eq!(eval("Math.pow(2, 10)"), Val::Num(1024.0));
    assert_eq!(eval("Math.sqrt(81)"), Val::Num(9.0));
    assert_eq!(eval("Math.round(2.5)"), Val::Num(3.0));
    assert_eq!(eval("Math.PI > 3.14 && Math.PI < 3.15"), Val::Bool(true));
}

#[test]
fn test_pad_start_rejects_oversized_width() {
    assert_eq!(
        thrown_message("'x'.padStart(1e12, '-')"),
        "RangeError: Invalid string length"
    );
    assert_eq!(eval_display("'x'.padStart(-3, '-')"), "x");
}

#[test]
fn test_json_stringify_sorts_keys_and_skips_functions() {
    assert_eq!(
        eval_display("JSON.stringify({ b: 1, a: [true, null], f() {}, u: undefined })"),
        r#"{"a":[true,null],"b":1}"#
    );
    assert_eq!(eval_display("JSON.stringify('x')"), r#""x""#);
    assert_eq!(eval("JSON.stringify(undefined)"), Val::Undefined);
}

#[test]
fn test_json_pretty_print() {
    assert_eq!(
        eval_display("JSON.stringify({ a: 1 }, null, 2)"),
        "{\n  \"a\": 1\n}"
    );
}

#[test]
fn test_json_parse() {
    assert_eq!(eval("JSON.parse('{\"a\": {\"b\": [1, 2]}}').a.b[1]"), Val::Num(2.0));
    let message = thrown_message("JSON.parse('{oops')");
    assert!(message.starts_with("SyntaxError: JSON.parse"), "got {}", message);
}

#[test]
fn test_string_methods() {
    assert_eq!(
        eval_display("['  Hi ', 'abc'].map(s => s.trim().toUpperCase()).join('|')"),
        "HI|ABC"
    );
    assert_eq!(eval_display("'a,b,,c'.split(',').length"), "4");
    assert_eq!(eval_display("'abc'.split('').join('-')"), "a-b-c");
    assert_eq!(eval_display("'hello'.slice(1, -1)"), "ell");
    assert_eq!(eval_display("'7'.padStart(3, '0')"), "007");
    assert_eq!(
        eval_display("[ 'abc'.includes('b'), 'abc'.startsWith('ab'), 'abc'.endsWith('x') ].join()"),
        "true,true,false"
    );
}

#[test]
fn test_array_methods() {
    assert_eq!(
        eval_display("[1, 2, 3, 4].filter(x => x % 2 === 0).map((x, i) => x + i).join()"),
        "2,5"
    );
    assert_eq!(eval("const a = [1]; a.push(2, 3); a.length"), Val::Num(3.0));
    assert_eq!(eval("const a = [1, 2]; a.pop()"), Val::Num(2.0));
    assert_eq!(eval("[1, 2, 3].indexOf(3)"), Val::Num(2.0));
    assert_eq!(eval("[1, 2, 3].indexOf(9)"), Val::Num(-1.0));
    assert_eq!(eval("[NaN].includes(NaN)"), Val::Bool(true));
    assert_eq!(eval_display("[1, 2, 3, 4].slice(-2)"), "3,4");
    assert_eq!(
        eval_display("let t = 0; [1, 2, 3].forEach(x => { t += x; }); t"),
        "6"
    );
}

#[test]
fn test_array_callback_must_be_callable() {
    let message = thrown_message("[1].map(5)");
    assert_eq!(message, "TypeError: 5 is not a function");
}

#[test]
fn test_object_keys_and_array_is_array() {
    assert_eq!(eval_display("Object.keys({ z: 1, y: 2 }).join()"), "y,z");
    assert_eq!(eval_display("Object.keys([7, 8]).join()"), "0,1");
    assert_eq!(eval("Array.isArray([]) && !Array.isArray({})"), Val::Bool(true));
}

#[test]
fn test_number_and_string_conversions() {
    assert_eq!(eval("Number('12.5') + 1"), Val::Num(13.5));
    assert_eq!(eval_display("Number('abc')"), "NaN");
    assert_eq!(eval_display("String(12) + String(null)"), "12null");
    assert_eq!(eval_display("(3.14159).toFixed(2)"), "3.14");
    assert_eq!(eval_display("(255).toString()"), "255");
}

#[test]
fn test_date() {
    assert_eq!(
        eval_display("new Date(0).toISOString()"),
        "1970-01-01T00:00:00.000Z"
    );
    assert_eq!(
        eval("new Date('2024-03-01T12:00:00.000Z').getTime()"),
        Val::Num(1_709_294_400_000.0)
    );
    assert_eq!(eval("Date.now() > 1700000000000"), Val::Bool(true));
    assert_eq!(
        eval_display("JSON.stringify({ at: new Date(1000) })"),
        r#"{"at":"1970-01-01T00:00:01.000Z"}"#
    );
}

#[test]
fn test_error_constructors() {
    assert_eq!(eval_display("new TypeError('bad type')"), "TypeError: bad type");
    assert_eq!(eval_display("Error('no new')"), "Error: no new");
    assert_eq!(eval_display("new Error().name"), "Error");
}
