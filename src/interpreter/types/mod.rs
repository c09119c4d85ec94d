//! Type definitions for the interpreter
//!
//! - AST nodes (Stmt, Expr)
//! - Runtime values (Val)
//! - Control flow (Control, Frame, FrameKind)
//! - Phase enums for multi-step statements

pub mod ast;
pub mod control;
pub mod phase;
pub mod values;

pub use ast::{
    AssignOp, AssignTarget, BinaryOp, ClassDef, DeclareTarget, Expr, ForLoopKind, FunctionDef,
    Span, Stmt, TemplatePart, UnaryOp, VarKind,
};
pub use control::{Completion, Control, Frame, FrameKind};
pub use phase::*;
pub use values::{CoId, ObjId, ScopeId, Val};
