//! Abstract Syntax Tree node types

use std::sync::Arc;

/* ===================== Source Locations ===================== */

/// Location of a node in the source text (line and col are 1-based)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub col: usize,
}

/* ===================== Declarations ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    Let,
    Const,
    Var,
}

impl VarKind {
    pub fn is_mutable(self) -> bool {
        !matches!(self, VarKind::Const)
    }
}

/// Left-hand side of a declaration
#[derive(Debug, Clone, PartialEq)]
pub enum DeclareTarget {
    Simple { name: String },
    /// `{ a, b: c }`, stored as `(property, binding)` pairs
    Destructure { names: Vec<(String, String)> },
}

/// Left-hand side of an assignment
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Ident { name: String },
    Member { object: Expr, property: String },
    Index { object: Expr, index: Expr },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForLoopKind {
    Of,
    In,
}

/// A function body with its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: Option<String>,
    pub params: Vec<String>,
    pub body: Vec<Stmt>,
    pub is_async: bool,
    /// Arrow functions capture `this` from where they are created
    pub is_arrow: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: String,
    pub constructor: Option<Arc<FunctionDef>>,
    pub methods: Vec<(String, Arc<FunctionDef>)>,
    pub span: Span,
}

/* ===================== Statements ===================== */

/// Statement AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Block {
        body: Vec<Stmt>,
        span: Span,
    },
    Declare {
        kind: VarKind,
        target: DeclareTarget,
        init: Option<Expr>,
        span: Span,
    },
    Assign {
        target: AssignTarget,
        op: AssignOp,
        value: Expr,
        span: Span,
    },
    Expr {
        expr: Expr,
        span: Span,
    },
    If {
        test: Expr,
        then_s: Box<Stmt>,
        else_s: Option<Box<Stmt>>,
        span: Span,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
        span: Span,
    },
    For {
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        update: Option<Box<Stmt>>,
        body: Box<Stmt>,
        span: Span,
    },
    ForEach {
        loop_kind: ForLoopKind,
        decl: VarKind,
        binding: String,
        iterable: Expr,
        body: Box<Stmt>,
        span: Span,
    },
    Return {
        value: Option<Expr>,
        span: Span,
    },
    Throw {
        value: Expr,
        span: Span,
    },
    Try {
        body: Box<Stmt>,
        catch_var: Option<String>,
        catch_body: Option<Box<Stmt>>,
        finally_body: Option<Box<Stmt>>,
        span: Span,
    },
    Break {
        span: Span,
    },
    Continue {
        span: Span,
    },
    Function {
        def: Arc<FunctionDef>,
        span: Span,
    },
    Class {
        def: Arc<ClassDef>,
        span: Span,
    },
    Empty {
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Block { span, .. }
            | Stmt::Declare { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::Expr { span, .. }
            | Stmt::If { span, .. }
            | Stmt::While { span, .. }
            | Stmt::For { span, .. }
            | Stmt::ForEach { span, .. }
            | Stmt::Return { span, .. }
            | Stmt::Throw { span, .. }
            | Stmt::Try { span, .. }
            | Stmt::Break { span }
            | Stmt::Continue { span }
            | Stmt::Function { span, .. }
            | Stmt::Class { span, .. }
            | Stmt::Empty { span } => *span,
        }
    }
}

/* ===================== Expressions ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Neg,
    Plus,
    Typeof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    // Comparison
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    StrictEq,
    StrictNe,
    // Short-circuit
    And,
    Or,
    Nullish,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    Str(String),
    Expr(Expr),
}

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    LitNum {
        v: f64,
        span: Span,
    },
    LitStr {
        v: String,
        span: Span,
    },
    LitBool {
        v: bool,
        span: Span,
    },
    LitNull {
        span: Span,
    },
    LitUndefined {
        span: Span,
    },
    Template {
        parts: Vec<TemplatePart>,
        span: Span,
    },
    Array {
        items: Vec<Expr>,
        span: Span,
    },
    Object {
        props: Vec<(String, Expr)>,
        span: Span,
    },
    Ident {
        name: String,
        span: Span,
    },
    This {
        span: Span,
    },
    Member {
        object: Box<Expr>,
        property: String,
        optional: bool,
        span: Span,
    },
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
        optional: bool,
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        optional: bool,
        span: Span,
    },
    New {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    Function {
        def: Arc<FunctionDef>,
        span: Span,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        span: Span,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: Span,
    },
    Conditional {
        test: Box<Expr>,
        then_e: Box<Expr>,
        else_e: Box<Expr>,
        span: Span,
    },
    /// Only valid as the whole right-hand side of a statement
    Await {
        inner: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::LitNum { span, .. }
            | Expr::LitStr { span, .. }
            | Expr::LitBool { span, .. }
            | Expr::LitNull { span }
            | Expr::LitUndefined { span }
            | Expr::Template { span, .. }
            | Expr::Array { span, .. }
            | Expr::Object { span, .. }
            | Expr::Ident { span, .. }
            | Expr::This { span }
            | Expr::Member { span, .. }
            | Expr::Index { span, .. }
            | Expr::Call { span, .. }
            | Expr::New { span, .. }
            | Expr::Function { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Conditional { span, .. }
            | Expr::Await { span, .. } => *span,
        }
    }
}
