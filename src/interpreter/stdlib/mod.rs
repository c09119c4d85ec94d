//! Standard library function implementations
//!
//! This module contains all stdlib function implementations organized by category.
//! Builtins are heap objects of kind `Native(Builtin(..))`; the dispatcher below
//! routes a call to the right implementation.

pub mod collections;
pub mod date;
pub mod errors;
pub mod json;
pub mod math;
pub mod promise;
pub mod text;

use super::heap::{Heap, NativeKind, Object, ObjectKind};
use super::types::{ObjId, Val};
use super::Interpreter;

/* ===================== Standard Library Function Types ===================== */

/// Standard library function identifiers
///
/// Each variant names one built-in function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StdlibFunc {
    // Math
    MathFloor,
    MathCeil,
    MathAbs,
    MathRound,
    MathMax,
    MathMin,
    MathPow,
    MathSqrt,

    // Promise
    PromiseCtor,
    PromiseResolve,
    PromiseReject,
    PromiseThen,
    PromiseCatch,

    // Date
    DateCtor,
    DateNow,
    DateGetTime,
    DateToIsoString,

    // Errors
    ErrorCtor,
    TypeErrorCtor,
    RangeErrorCtor,

    // JSON
    JsonStringify,
    JsonParse,

    // Object / Array
    ObjectKeys,
    ObjectToString,
    ArrayIsArray,
    ArrayPush,
    ArrayPop,
    ArrayJoin,
    ArrayIncludes,
    ArrayIndexOf,
    ArrayMap,
    ArrayFilter,
    ArrayForEach,
    ArraySlice,

    // String / Number
    StringCtor,
    StringToUpperCase,
    StringToLowerCase,
    StringIncludes,
    StringStartsWith,
    StringEndsWith,
    StringTrim,
    StringSplit,
    StringSlice,
    StringPadStart,
    NumberCtor,
    NumberToFixed,
    NumberToString,
}

impl StdlibFunc {
    /// Whether `new` may be applied to this builtin
    pub fn is_constructor(self) -> bool {
        matches!(
            self,
            StdlibFunc::PromiseCtor
                | StdlibFunc::DateCtor
                | StdlibFunc::ErrorCtor
                | StdlibFunc::TypeErrorCtor
                | StdlibFunc::RangeErrorCtor
        )
    }
}

/* ===================== Stdlib Dispatcher ===================== */

/// Call a standard library function with arguments
///
/// This dispatcher routes to the appropriate function implementation
/// based on the StdlibFunc variant.
pub fn call_stdlib_func(
    interp: &mut Interpreter,
    func: &StdlibFunc,
    this: Val,
    args: Vec<Val>,
) -> Result<Val, Val> {
    match func {
        StdlibFunc::MathFloor => math::floor(interp, &args),
        StdlibFunc::MathCeil => math::ceil(interp, &args),
        StdlibFunc::MathAbs => math::abs(interp, &args),
        StdlibFunc::MathRound => math::round(interp, &args),
        StdlibFunc::MathMax => math::max(interp, &args),
        StdlibFunc::MathMin => math::min(interp, &args),
        StdlibFunc::MathPow => math::pow(interp, &args),
        StdlibFunc::MathSqrt => math::sqrt(interp, &args),

        StdlibFunc::PromiseCtor => promise::construct(interp, args),
        StdlibFunc::PromiseResolve => promise::resolve(interp, args),
        StdlibFunc::PromiseReject => promise::reject(interp, args),
        StdlibFunc::PromiseThen => promise::then(interp, this, args),
        StdlibFunc::PromiseCatch => promise::catch(interp, this, args),

        StdlibFunc::DateCtor => date::construct(interp, &args),
        StdlibFunc::DateNow => Ok(Val::Num(date::now_ms())),
        StdlibFunc::DateGetTime => date::get_time(interp, &this),
        StdlibFunc::DateToIsoString => date::to_iso_string(interp, &this),

        StdlibFunc::ErrorCtor => errors::construct(interp, "Error", &args),
        StdlibFunc::TypeErrorCtor => errors::construct(interp, "TypeError", &args),
        StdlibFunc::RangeErrorCtor => errors::construct(interp, "RangeError", &args),

        StdlibFunc::JsonStringify => json::stringify(interp, &args),
        StdlibFunc::JsonParse => json::parse(interp, &args),

        StdlibFunc::ObjectKeys => Ok(collections::keys(interp, &args)),
        StdlibFunc::ObjectToString => Ok(Val::Str(interp.display_val(&this))),
        StdlibFunc::ArrayIsArray => Ok(Val::Bool(interp.array_items(&arg(&args, 0)).is_some())),
        StdlibFunc::ArrayPush => collections::push(interp, &this, args),
        StdlibFunc::ArrayPop => collections::pop(interp, &this),
        StdlibFunc::ArrayJoin => collections::join(interp, &this, &args),
        StdlibFunc::ArrayIncludes => collections::includes(interp, &this, &args),
        StdlibFunc::ArrayIndexOf => collections::index_of(interp, &this, &args),
        StdlibFunc::ArrayMap => collections::map(interp, &this, &args),
        StdlibFunc::ArrayFilter => collections::filter(interp, &this, &args),
        StdlibFunc::ArrayForEach => collections::for_each(interp, &this, &args),
        StdlibFunc::ArraySlice => collections::slice(interp, &this, &args),

        StdlibFunc::StringCtor => Ok(Val::Str(match args.first() {
            Some(v) => interp.display_val(v),
            None => String::new(),
        })),
        StdlibFunc::StringToUpperCase => text::to_upper_case(interp, &this),
        StdlibFunc::StringToLowerCase => text::to_lower_case(interp, &this),
        StdlibFunc::StringIncludes => text::includes(interp, &this, &args),
        StdlibFunc::StringStartsWith => text::starts_with(interp, &this, &args),
        StdlibFunc::StringEndsWith => text::ends_with(interp, &this, &args),
        StdlibFunc::StringTrim => text::trim(interp, &this),
        StdlibFunc::StringSplit => text::split(interp, &this, &args),
        StdlibFunc::StringSlice => text::slice(interp, &this, &args),
        StdlibFunc::StringPadStart => text::pad_start(interp, &this, &args),
        StdlibFunc::NumberCtor => Ok(Val::Num(match args.first() {
            Some(v) => interp.to_number(v),
            None => 0.0,
        })),
        StdlibFunc::NumberToFixed => text::to_fixed(interp, &this, &args),
        StdlibFunc::NumberToString => Ok(Val::Str(interp.display_val(&this))),
    }
}

/// Argument `idx`, or `undefined` when missing
pub(crate) fn arg(args: &[Val], idx: usize) -> Val {
    args.get(idx).cloned().unwrap_or(Val::Undefined)
}

/// Integer argument with a default; `NaN` counts as zero
pub(crate) fn int_arg(interp: &Interpreter, args: &[Val], idx: usize, default: i64) -> i64 {
    match args.get(idx) {
        None | Some(Val::Undefined) => default,
        Some(v) => {
            let n = interp.to_number(v);
            if n.is_nan() {
                0
            } else {
                n.trunc() as i64
            }
        }
    }
}

/// Resolve a possibly-negative `slice` bound against a length
pub(crate) fn relative_index(idx: i64, len: usize) -> usize {
    let len = len as i64;
    let resolved = if idx < 0 { (len + idx).max(0) } else { idx.min(len) };
    resolved as usize
}

/* ===================== Prototypes ===================== */

/// Shared prototype objects for builtin value kinds
#[derive(Debug, Clone, Copy)]
pub struct Protos {
    pub object: ObjId,
    pub function: ObjId,
    pub array: ObjId,
    pub string: ObjId,
    pub number: ObjId,
    pub promise: ObjId,
    pub date: ObjId,
    pub error: ObjId,
}

impl Protos {
    /// Allocate empty prototypes; `install` fills in their methods
    pub fn alloc(heap: &mut Heap) -> Self {
        let object = heap.alloc(Object::new(ObjectKind::Ordinary, None));
        let mut child = || heap.alloc(Object::new(ObjectKind::Ordinary, Some(object)));
        Self {
            function: child(),
            array: child(),
            string: child(),
            number: child(),
            promise: child(),
            date: child(),
            error: child(),
            object,
        }
    }
}

/* ===================== Environment Injection ===================== */

/// Install builtin methods on the prototypes and bind the builtin globals
///
/// Called once by `Interpreter::with_config`. Globals are immutable.
pub fn install(interp: &mut Interpreter) {
    let protos = interp.protos;

    set_methods(interp, protos.object, &[("toString", StdlibFunc::ObjectToString)]);
    set_methods(
        interp,
        protos.array,
        &[
            ("push", StdlibFunc::ArrayPush),
            ("pop", StdlibFunc::ArrayPop),
            ("join", StdlibFunc::ArrayJoin),
            ("includes", StdlibFunc::ArrayIncludes),
            ("indexOf", StdlibFunc::ArrayIndexOf),
            ("map", StdlibFunc::ArrayMap),
            ("filter", StdlibFunc::ArrayFilter),
            ("forEach", StdlibFunc::ArrayForEach),
            ("slice", StdlibFunc::ArraySlice),
        ],
    );
    set_methods(
        interp,
        protos.string,
        &[
            ("toUpperCase", StdlibFunc::StringToUpperCase),
            ("toLowerCase", StdlibFunc::StringToLowerCase),
            ("includes", StdlibFunc::StringIncludes),
            ("startsWith", StdlibFunc::StringStartsWith),
            ("endsWith", StdlibFunc::StringEndsWith),
            ("trim", StdlibFunc::StringTrim),
            ("split", StdlibFunc::StringSplit),
            ("slice", StdlibFunc::StringSlice),
            ("padStart", StdlibFunc::StringPadStart),
        ],
    );
    set_methods(
        interp,
        protos.number,
        &[
            ("toFixed", StdlibFunc::NumberToFixed),
            ("toString", StdlibFunc::NumberToString),
        ],
    );
    set_methods(
        interp,
        protos.promise,
        &[
            ("then", StdlibFunc::PromiseThen),
            ("catch", StdlibFunc::PromiseCatch),
        ],
    );
    set_methods(
        interp,
        protos.date,
        &[
            ("getTime", StdlibFunc::DateGetTime),
            ("valueOf", StdlibFunc::DateGetTime),
            ("toISOString", StdlibFunc::DateToIsoString),
            ("toJSON", StdlibFunc::DateToIsoString),
        ],
    );
    interp
        .heap
        .get_mut(protos.error)
        .props
        .insert("name".to_string(), Val::str("Error"));

    let math = namespace(
        interp,
        &[
            ("floor", StdlibFunc::MathFloor),
            ("ceil", StdlibFunc::MathCeil),
            ("abs", StdlibFunc::MathAbs),
            ("round", StdlibFunc::MathRound),
            ("max", StdlibFunc::MathMax),
            ("min", StdlibFunc::MathMin),
            ("pow", StdlibFunc::MathPow),
            ("sqrt", StdlibFunc::MathSqrt),
        ],
    );
    interp
        .heap
        .get_mut(math)
        .props
        .insert("PI".to_string(), Val::Num(std::f64::consts::PI));
    let json = namespace(
        interp,
        &[
            ("stringify", StdlibFunc::JsonStringify),
            ("parse", StdlibFunc::JsonParse),
        ],
    );
    let object = namespace(interp, &[("keys", StdlibFunc::ObjectKeys)]);
    let array = namespace(interp, &[("isArray", StdlibFunc::ArrayIsArray)]);
    let promise = constructor(interp, StdlibFunc::PromiseCtor, protos.promise);
    set_methods(
        interp,
        promise,
        &[
            ("resolve", StdlibFunc::PromiseResolve),
            ("reject", StdlibFunc::PromiseReject),
        ],
    );
    let date = constructor(interp, StdlibFunc::DateCtor, protos.date);
    set_methods(interp, date, &[("now", StdlibFunc::DateNow)]);
    let error = constructor(interp, StdlibFunc::ErrorCtor, protos.error);
    let type_error = constructor(interp, StdlibFunc::TypeErrorCtor, protos.error);
    let range_error = constructor(interp, StdlibFunc::RangeErrorCtor, protos.error);
    let string = constructor(interp, StdlibFunc::StringCtor, protos.string);
    let number = constructor(interp, StdlibFunc::NumberCtor, protos.number);

    let globals = [
        ("Math", math),
        ("JSON", json),
        ("Object", object),
        ("Array", array),
        ("Promise", promise),
        ("Date", date),
        ("Error", error),
        ("TypeError", type_error),
        ("RangeError", range_error),
        ("String", string),
        ("Number", number),
    ];
    for (name, id) in globals {
        // the global scope is fresh here, so declarations cannot collide
        let _ = interp
            .heap
            .declare(interp.globals, name, Val::Obj(id), false);
    }
    let _ = interp
        .heap
        .declare(interp.globals, "NaN", Val::Num(f64::NAN), false);
    let _ = interp
        .heap
        .declare(interp.globals, "Infinity", Val::Num(f64::INFINITY), false);
}

/// Allocate a builtin function object
fn native(interp: &mut Interpreter, func: StdlibFunc) -> ObjId {
    let proto = interp.protos.function;
    interp.heap.alloc(Object::new(
        ObjectKind::Native(NativeKind::Builtin(func)),
        Some(proto),
    ))
}

fn set_methods(interp: &mut Interpreter, target: ObjId, methods: &[(&str, StdlibFunc)]) {
    for (name, func) in methods {
        let method = native(interp, *func);
        interp
            .heap
            .get_mut(target)
            .props
            .insert(name.to_string(), Val::Obj(method));
    }
}

/// Plain object holding builtin functions (`Math`, `JSON`, `Object`, `Array`)
fn namespace(interp: &mut Interpreter, methods: &[(&str, StdlibFunc)]) -> ObjId {
    let obj = interp.new_object();
    set_methods(interp, obj, methods);
    obj
}

/// Builtin function linked to its prototype object
fn constructor(interp: &mut Interpreter, func: StdlibFunc, prototype: ObjId) -> ObjId {
    let ctor = native(interp, func);
    interp
        .heap
        .get_mut(ctor)
        .props
        .insert("prototype".to_string(), Val::Obj(prototype));
    // error constructors share one prototype; the first one registered owns it
    interp
        .heap
        .get_mut(prototype)
        .props
        .entry("constructor".to_string())
        .or_insert(Val::Obj(ctor));
    ctor
}
