//! Object and scope storage
//!
//! Objects and scopes are arena-allocated and addressed by index. Nothing is ever
//! freed: an interpreter lives as long as the runtime that owns it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::adapter::NativeFn;

use super::promise::PromiseSlot;
use super::stdlib::StdlibFunc;
use super::types::{ClassDef, FunctionDef, ObjId, ScopeId, Val};
use super::Interpreter;

/* ===================== Objects ===================== */

/// A user-defined function together with the scope it closes over
#[derive(Debug, Clone)]
pub struct Closure {
    pub def: Arc<FunctionDef>,
    pub scope: ScopeId,
    /// `this` captured by arrow functions
    pub this_val: Option<Val>,
}

#[derive(Debug, Clone)]
pub struct ClassInfo {
    pub def: Arc<ClassDef>,
    pub scope: ScopeId,
    pub prototype: ObjId,
}

#[derive(Clone)]
pub enum NativeKind {
    Builtin(StdlibFunc),
    Host {
        name: String,
        func: NativeFn<Interpreter>,
    },
}

impl std::fmt::Debug for NativeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NativeKind::Builtin(func) => write!(f, "Builtin({:?})", func),
            NativeKind::Host { name, .. } => write!(f, "Host({})", name),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ObjectKind {
    Ordinary,
    Array(Vec<Val>),
    Function(Closure),
    Native(NativeKind),
    /// One of the two resolving functions of a promise; `flag` is shared by the pair
    Resolver {
        promise: ObjId,
        reject: bool,
        flag: usize,
    },
    Class(ClassInfo),
    Promise(PromiseSlot),
    Date(f64),
    Error,
}

#[derive(Debug, Clone)]
pub struct Object {
    pub kind: ObjectKind,
    pub props: BTreeMap<String, Val>,
    pub proto: Option<ObjId>,
}

impl Object {
    pub fn new(kind: ObjectKind, proto: Option<ObjId>) -> Self {
        Self {
            kind,
            props: BTreeMap::new(),
            proto,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self.kind,
            ObjectKind::Function(_)
                | ObjectKind::Native(_)
                | ObjectKind::Resolver { .. }
                | ObjectKind::Class(_)
        )
    }
}

/* ===================== Scopes ===================== */

#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Val,
    pub mutable: bool,
}

#[derive(Debug, Default)]
pub struct Scope {
    pub parent: Option<ScopeId>,
    pub vars: HashMap<String, Binding>,
}

/// Why a binding operation failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    AlreadyDeclared,
    NotDefined,
    Immutable,
}

/* ===================== Heap ===================== */

#[derive(Debug, Default)]
pub struct Heap {
    objects: Vec<Object>,
    scopes: Vec<Scope>,
    flags: Vec<bool>,
}

impl Heap {
    pub fn alloc(&mut self, object: Object) -> ObjId {
        self.objects.push(object);
        ObjId(self.objects.len() - 1)
    }

    pub fn get(&self, id: ObjId) -> &Object {
        &self.objects[id.0]
    }

    pub fn get_mut(&mut self, id: ObjId) -> &mut Object {
        &mut self.objects[id.0]
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /* ---------- scopes ---------- */

    pub fn new_scope(&mut self, parent: Option<ScopeId>) -> ScopeId {
        self.scopes.push(Scope {
            parent,
            vars: HashMap::new(),
        });
        ScopeId(self.scopes.len() - 1)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0]
    }

    /// Find the scope that binds `name`, walking outwards
    pub fn resolve_scope(&self, mut scope: ScopeId, name: &str) -> Option<ScopeId> {
        loop {
            let current = &self.scopes[scope.0];
            if current.vars.contains_key(name) {
                return Some(scope);
            }
            scope = current.parent?;
        }
    }

    pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&Binding> {
        let found = self.resolve_scope(scope, name)?;
        self.scopes[found.0].vars.get(name)
    }

    pub fn declare(
        &mut self,
        scope: ScopeId,
        name: &str,
        value: Val,
        mutable: bool,
    ) -> Result<(), BindingError> {
        let vars = &mut self.scopes[scope.0].vars;
        if vars.contains_key(name) {
            return Err(BindingError::AlreadyDeclared);
        }
        vars.insert(name.to_string(), Binding { value, mutable });
        Ok(())
    }

    /// Declare or overwrite (used for `var` and hoisted functions)
    pub fn declare_or_replace(&mut self, scope: ScopeId, name: &str, value: Val) {
        self.scopes[scope.0].vars.insert(
            name.to_string(),
            Binding {
                value,
                mutable: true,
            },
        );
    }

    pub fn assign(&mut self, scope: ScopeId, name: &str, value: Val) -> Result<(), BindingError> {
        let found = self
            .resolve_scope(scope, name)
            .ok_or(BindingError::NotDefined)?;
        let binding = self.scopes[found.0]
            .vars
            .get_mut(name)
            .ok_or(BindingError::NotDefined)?;
        if !binding.mutable {
            return Err(BindingError::Immutable);
        }
        binding.value = value;
        Ok(())
    }

    /* ---------- shared flags ---------- */

    pub fn new_flag(&mut self) -> usize {
        self.flags.push(false);
        self.flags.len() - 1
    }

    pub fn flag(&self, idx: usize) -> bool {
        self.flags[idx]
    }

    pub fn set_flag(&mut self, idx: usize) {
        self.flags[idx] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_chain_lookup_and_shadowing() {
        let mut heap = Heap::default();
        let outer = heap.new_scope(None);
        let inner = heap.new_scope(Some(outer));

        heap.declare(outer, "x", Val::Num(1.0), true).unwrap();
        assert_eq!(heap.lookup(inner, "x").unwrap().value, Val::Num(1.0));

        heap.declare(inner, "x", Val::Num(2.0), true).unwrap();
        assert_eq!(heap.lookup(inner, "x").unwrap().value, Val::Num(2.0));
        assert_eq!(heap.lookup(outer, "x").unwrap().value, Val::Num(1.0));
    }

    #[test]
    fn test_duplicate_declaration_fails() {
        let mut heap = Heap::default();
        let scope = heap.new_scope(None);
        heap.declare(scope, "x", Val::Null, true).unwrap();
        assert_eq!(
            heap.declare(scope, "x", Val::Null, true),
            Err(BindingError::AlreadyDeclared)
        );
    }

    #[test]
    fn test_assign_respects_mutability() {
        let mut heap = Heap::default();
        let scope = heap.new_scope(None);
        heap.declare(scope, "frozen", Val::Num(1.0), false).unwrap();

        assert_eq!(
            heap.assign(scope, "frozen", Val::Num(2.0)),
            Err(BindingError::Immutable)
        );
        assert_eq!(
            heap.assign(scope, "missing", Val::Num(2.0)),
            Err(BindingError::NotDefined)
        );
    }
}
