//! Classes, constructors and `this`

use super::helpers::{eval, eval_display, thrown_message};
use crate::interpreter::Val;

#[test]
fn test_class_constructor_and_methods() {
    let source = r#"
        class Counter {
            constructor(start) { this.value = start; }
            increment(by) { this.value += by; return this; }
            read() { return this.value; }
        }
        const c = new Counter(10);
        c.increment(2).increment(3).read()
    "#;
    assert_eq!(eval(source), Val::Num(15.0));
}

#[test]
fn test_class_without_constructor() {
    assert_eq!(
        eval_display("class Greeter { hello() { return 'hi'; } } new Greeter().hello()"),
        "hi"
    );
}

#[test]
fn test_methods_are_shared_through_prototype() {
    let source = r#"
        class A { m() { return 1; } }
        const a = new A();
        const b = new A();
        [a.m === b.m, a.constructor === A, A.name].join(',')
    "#;
    assert_eq!(eval_display(source), "true,true,A");
}

#[test]
fn test_class_call_without_new_throws() {
    assert_eq!(
        thrown_message("class A {} A()"),
        "TypeError: Class constructor A cannot be invoked without 'new'"
    );
}

#[test]
fn test_new_on_non_constructor_throws() {
    let message = thrown_message("const f = () => 1; new f()");
    assert!(message.contains("is not a constructor"), "got {}", message);
}

#[test]
fn test_constructor_function() {
    let source = r#"
        function Point(x, y) { this.x = x; this.y = y; }
        const p = new Point(3, 4);
        p.x * p.x + p.y * p.y
    "#;
    assert_eq!(eval(source), Val::Num(25.0));
}

#[test]
fn test_arrow_captures_this_from_method() {
    let source = r#"
        class Box {
            constructor() { this.items = [1, 2, 3]; this.factor = 10; }
            scaled() { return this.items.map(x => x * this.factor); }
        }
        new Box().scaled().join(',')
    "#;
    assert_eq!(eval_display(source), "10,20,30");
}

#[test]
fn test_object_literal_methods_bind_receiver() {
    assert_eq!(
        eval_display("const o = { name: 'o', who() { return this.name; } }; o.who()"),
        "o"
    );
}

#[test]
fn test_controller_returned_from_iife() {
    let source = r#"
        (function () {
            class Controller {
                test() { return 'sync'; }
                async testAsync() { return 'async'; }
            }
            return new Controller();
        })()
    "#;
    assert_eq!(eval_display(source), "[object Object]");
}

#[test]
fn test_instance_fields_are_own_properties() {
    assert_eq!(
        eval_display("class P { constructor() { this.b = 1; this.a = 2; } m() {} } Object.keys(new P()).join(',')"),
        "a,b"
    );
}
