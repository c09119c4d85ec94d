//! Runtime value types

/// Index of an object in the interpreter heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjId(pub(crate) usize);

/// Index of a lexical scope in the interpreter heap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub(crate) usize);

/// Identity of a coroutine (one per function activation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoId(pub(crate) u64);

/// Runtime value type
///
/// Objects live in the heap; `Obj` is a reference, so cloning a value never copies
/// an object and `===` on objects is identity.
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    Undefined,
    Null,
    Bool(bool),
    Num(f64),
    Str(String),
    Obj(ObjId),
}

impl Val {
    /// Check if value is truthy (for conditionals)
    pub fn is_truthy(&self) -> bool {
        match self {
            Val::Undefined | Val::Null => false,
            Val::Bool(b) => *b,
            Val::Num(n) => *n != 0.0 && !n.is_nan(),
            Val::Str(s) => !s.is_empty(),
            Val::Obj(_) => true,
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Val::Undefined | Val::Null)
    }

    pub fn as_obj(&self) -> Option<ObjId> {
        match self {
            Val::Obj(id) => Some(*id),
            _ => None,
        }
    }

    pub fn str(s: impl Into<String>) -> Self {
        Val::Str(s.into())
    }
}

impl From<f64> for Val {
    fn from(n: f64) -> Self {
        Val::Num(n)
    }
}

impl From<bool> for Val {
    fn from(b: bool) -> Self {
        Val::Bool(b)
    }
}

impl From<&str> for Val {
    fn from(s: &str) -> Self {
        Val::Str(s.to_string())
    }
}

impl From<String> for Val {
    fn from(s: String) -> Self {
        Val::Str(s)
    }
}
