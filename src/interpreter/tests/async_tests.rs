//! Promises, async functions and the job queue

use super::helpers::eval_display;
use crate::adapter::{PlaceholderStatus, ScriptEngine};
use crate::interpreter::{Interpreter, Val};

#[test]
fn test_async_function_returns_promise() {
    assert_eq!(
        eval_display("async function f() { return 1; } f()"),
        "[object Promise]"
    );
}

#[test]
fn test_continuations_run_after_synchronous_code() {
    let mut interp = Interpreter::new();
    let first = interp
        .run_script(
            r#"
            const order = [];
            async function f() { order.push('a'); await null; order.push('c'); }
            f();
            order.push('b');
            order.join('')
            "#,
        )
        .unwrap();
    // the completion value is taken before the queue drains
    assert_eq!(first, Val::str("ab"));
    assert_eq!(interp.run_script("order.join('')").unwrap(), Val::str("abc"));
}

#[test]
fn test_then_chain() {
    let mut interp = Interpreter::new();
    interp
        .run_script("let out = 0; Promise.resolve(1).then(v => v + 1).then(v => { out = v * 10; });")
        .unwrap();
    assert_eq!(interp.run_script("out").unwrap(), Val::Num(20.0));
}

#[test]
fn test_catch_handles_rejection() {
    let mut interp = Interpreter::new();
    interp
        .run_script("let seen = ''; Promise.reject(new Error('bad')).catch(e => { seen = e.message; });")
        .unwrap();
    assert_eq!(interp.run_script("seen").unwrap(), Val::str("bad"));
}

#[test]
fn test_await_rejected_promise_is_catchable() {
    let mut interp = Interpreter::new();
    interp
        .run_script(
            r#"
            let result = '';
            async function g() {
                try {
                    await Promise.reject(new Error('x'));
                } catch (e) {
                    result = 'caught ' + e.message;
                }
            }
            g();
            "#,
        )
        .unwrap();
    assert_eq!(interp.run_script("result").unwrap(), Val::str("caught x"));
}

#[test]
fn test_await_in_loop() {
    let mut interp = Interpreter::new();
    interp
        .run_script(
            r#"
            let total = 0;
            async function sum(values) {
                for (const v of values) {
                    const resolved = await Promise.resolve(v);
                    total += resolved;
                }
                return total;
            }
            const p = sum([1, 2, 3, 4]);
            "#,
        )
        .unwrap();
    let p = interp.run_script("p").unwrap();
    assert_eq!(interp.placeholder_status(&p).unwrap(), PlaceholderStatus::Fulfilled);
    assert_eq!(interp.placeholder_value(&p).unwrap(), Val::Num(10.0));
}

#[test]
fn test_pending_promise_settles_on_later_drain() {
    let mut interp = Interpreter::new();
    interp
        .run_script(
            r#"
            let release;
            const gate = new Promise(r => { release = r; });
            async function waiter() {
                const v = await gate;
                return v * 2;
            }
            const w = waiter();
            "#,
        )
        .unwrap();

    let w = interp.run_script("w").unwrap();
    assert_eq!(interp.placeholder_status(&w).unwrap(), PlaceholderStatus::Pending);
    assert_eq!(interp.suspended_count(), 1);

    interp.run_script("release(21)").unwrap();
    assert_eq!(interp.placeholder_status(&w).unwrap(), PlaceholderStatus::Fulfilled);
    assert_eq!(interp.placeholder_value(&w).unwrap(), Val::Num(42.0));
    assert_eq!(interp.suspended_count(), 0);
}

#[test]
fn test_invoke_does_not_drain_the_queue() {
    let mut interp = Interpreter::new();
    let f = interp
        .run_script("async function f() { await null; return 'done'; } f")
        .unwrap();
    let this = interp.undefined();
    let p = interp.invoke(&f, &this, Vec::new()).unwrap();

    assert_eq!(interp.placeholder_status(&p).unwrap(), PlaceholderStatus::Pending);
    interp.execute("").unwrap();
    assert_eq!(interp.placeholder_value(&p).unwrap(), Val::str("done"));
}

#[test]
fn test_async_throw_rejects_with_error_payload() {
    let mut interp = Interpreter::new();
    let p = interp
        .run_script("async function bad() { throw new TypeError('nope'); } bad()")
        .unwrap();
    assert_eq!(interp.placeholder_status(&p).unwrap(), PlaceholderStatus::Rejected);
    let reason = interp.placeholder_value(&p).unwrap();
    assert_eq!(
        interp.to_json(&reason),
        serde_json::json!({ "name": "TypeError", "message": "nope" })
    );
}

#[test]
fn test_promise_executor_throw_rejects() {
    let mut interp = Interpreter::new();
    let p = interp
        .run_script("new Promise(() => { throw new Error('in executor'); })")
        .unwrap();
    assert_eq!(interp.placeholder_status(&p).unwrap(), PlaceholderStatus::Rejected);
}

#[test]
fn test_resolving_with_a_promise_adopts_its_state() {
    let mut interp = Interpreter::new();
    let p = interp
        .run_script("new Promise(r => r(Promise.resolve('inner')))")
        .unwrap();
    assert_eq!(interp.placeholder_value(&p).unwrap(), Val::str("inner"));
}

#[test]
fn test_second_resolution_is_ignored() {
    let mut interp = Interpreter::new();
    let p = interp
        .run_script("new Promise((res, rej) => { res(1); rej(new Error('late')); res(2); })")
        .unwrap();
    assert_eq!(interp.placeholder_status(&p).unwrap(), PlaceholderStatus::Fulfilled);
    assert_eq!(interp.placeholder_value(&p).unwrap(), Val::Num(1.0));
}
