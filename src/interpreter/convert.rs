//! Value conversions: numbers, strings, `typeof`, and JSON

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number, Value as JsonValue};

use super::heap::{Object, ObjectKind};
use super::types::Val;
use super::Interpreter;

/// Nesting limit for JSON conversion; deeper (or cyclic) structures become `null`
const MAX_JSON_DEPTH: usize = 64;

/// Format a number the way script code prints it (`1`, not `1.0`)
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        return format!("{}", n as i64);
    }
    format!("{}", n)
}

/// Parse a string as a number; empty or blank text is `0`, junk is `NaN`
pub fn string_to_number(s: &str) -> f64 {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// ISO-8601 rendering of a millisecond timestamp
pub fn iso_string(ms: f64) -> Option<String> {
    if !ms.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(ms as i64)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Canonical index for array access (`"2"` and `2` both address element 2)
pub fn array_index(key: &str) -> Option<usize> {
    if key.is_empty() || (key.len() > 1 && key.starts_with('0')) {
        return None;
    }
    key.parse::<usize>().ok()
}

impl Interpreter {
    pub(crate) fn to_number(&self, v: &Val) -> f64 {
        match v {
            Val::Undefined => f64::NAN,
            Val::Null => 0.0,
            Val::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            Val::Num(n) => *n,
            Val::Str(s) => string_to_number(s),
            Val::Obj(id) => match &self.heap.get(*id).kind {
                ObjectKind::Date(ms) => *ms,
                _ => string_to_number(&self.display_val(v)),
            },
        }
    }

    pub(crate) fn type_of(&self, v: &Val) -> &'static str {
        match v {
            Val::Undefined => "undefined",
            Val::Null => "object",
            Val::Bool(_) => "boolean",
            Val::Num(_) => "number",
            Val::Str(_) => "string",
            Val::Obj(id) if self.heap.get(*id).is_callable() => "function",
            Val::Obj(_) => "object",
        }
    }

    /// Property key for an index expression
    pub(crate) fn property_key(&self, v: &Val) -> String {
        match v {
            Val::Num(n) => number_to_string(*n),
            other => self.display_val(other),
        }
    }

    /// String conversion as used by `+`, templates and `String(v)`
    pub(crate) fn display_val(&self, v: &Val) -> String {
        self.display_depth(v, 0)
    }

    fn display_depth(&self, v: &Val, depth: usize) -> String {
        match v {
            Val::Undefined => "undefined".to_string(),
            Val::Null => "null".to_string(),
            Val::Bool(b) => b.to_string(),
            Val::Num(n) => number_to_string(*n),
            Val::Str(s) => s.clone(),
            Val::Obj(id) => {
                let object = self.heap.get(*id);
                match &object.kind {
                    ObjectKind::Array(items) => {
                        if depth >= MAX_JSON_DEPTH {
                            return String::new();
                        }
                        items
                            .iter()
                            .map(|item| match item {
                                Val::Undefined | Val::Null => String::new(),
                                other => self.display_depth(other, depth + 1),
                            })
                            .collect::<Vec<_>>()
                            .join(",")
                    }
                    ObjectKind::Error => self.error_summary(object),
                    ObjectKind::Date(ms) => {
                        iso_string(*ms).unwrap_or_else(|| "Invalid Date".to_string())
                    }
                    ObjectKind::Promise(_) => "[object Promise]".to_string(),
                    ObjectKind::Function(closure) => {
                        let name = closure.def.name.as_deref().unwrap_or("");
                        format!("function {}() {{ [code] }}", name)
                    }
                    ObjectKind::Native(_) | ObjectKind::Resolver { .. } => {
                        "function () { [native code] }".to_string()
                    }
                    ObjectKind::Class(info) => format!("class {}", info.def.name),
                    ObjectKind::Ordinary => "[object Object]".to_string(),
                }
            }
        }
    }

    /// `"Name: message"` (or just the name when the message is empty)
    fn error_summary(&self, object: &Object) -> String {
        let text = |key: &str| match object.props.get(key) {
            Some(Val::Str(s)) => s.clone(),
            Some(other) => self.display_val(other),
            None => String::new(),
        };
        let name = text("name");
        let message = text("message");
        match (name.is_empty(), message.is_empty()) {
            (_, true) if !name.is_empty() => name,
            (true, _) => message,
            _ => format!("{}: {}", name, message),
        }
    }

    /* ===================== JSON ===================== */

    /// Convert to JSON; `None` for values JSON cannot represent (undefined, functions)
    pub(crate) fn json_of(&self, v: &Val) -> Option<JsonValue> {
        self.json_depth(v, 0)
    }

    fn json_depth(&self, v: &Val, depth: usize) -> Option<JsonValue> {
        if depth > MAX_JSON_DEPTH {
            return Some(JsonValue::Null);
        }
        match v {
            Val::Undefined => None,
            Val::Null => Some(JsonValue::Null),
            Val::Bool(b) => Some(JsonValue::Bool(*b)),
            Val::Num(n) => Some(number_json(*n)),
            Val::Str(s) => Some(JsonValue::String(s.clone())),
            Val::Obj(id) => {
                let object = self.heap.get(*id);
                match &object.kind {
                    ObjectKind::Array(items) => Some(JsonValue::Array(
                        items
                            .iter()
                            .map(|item| self.json_depth(item, depth + 1).unwrap_or(JsonValue::Null))
                            .collect(),
                    )),
                    ObjectKind::Date(ms) => {
                        Some(iso_string(*ms).map_or(JsonValue::Null, JsonValue::String))
                    }
                    ObjectKind::Function(_)
                    | ObjectKind::Native(_)
                    | ObjectKind::Resolver { .. }
                    | ObjectKind::Class(_) => None,
                    ObjectKind::Ordinary | ObjectKind::Error | ObjectKind::Promise(_) => {
                        let mut map = Map::new();
                        for (key, value) in &object.props {
                            if let Some(json) = self.json_depth(value, depth + 1) {
                                map.insert(key.clone(), json);
                            }
                        }
                        Some(JsonValue::Object(map))
                    }
                }
            }
        }
    }

    /// Build a script value from JSON (objects and arrays are freshly allocated)
    pub(crate) fn val_from_json(&mut self, json: &JsonValue) -> Val {
        match json {
            JsonValue::Null => Val::Null,
            JsonValue::Bool(b) => Val::Bool(*b),
            JsonValue::Number(n) => Val::Num(n.as_f64().unwrap_or(f64::NAN)),
            JsonValue::String(s) => Val::Str(s.clone()),
            JsonValue::Array(items) => {
                let items = items.iter().map(|item| self.val_from_json(item)).collect();
                self.alloc_array(items)
            }
            JsonValue::Object(map) => {
                let obj = self.new_object();
                for (key, value) in map {
                    let value = self.val_from_json(value);
                    self.heap.get_mut(obj).props.insert(key.clone(), value);
                }
                Val::Obj(obj)
            }
        }
    }
}

fn number_json(n: f64) -> JsonValue {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        JsonValue::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n).map_or(JsonValue::Null, JsonValue::Number)
    }
}
