//! Expression evaluation
//!
//! Expressions are evaluated recursively and never suspend: `await` is only legal
//! as the whole right-hand side of a statement, where the statement frame handles
//! it. Errors are returned as the thrown script value.

use super::heap::BindingError;
use super::types::{AssignOp, AssignTarget, BinaryOp, Expr, ScopeId, TemplatePart, UnaryOp, Val};
use super::Interpreter;

/// Outcome of evaluating an expression: a value or a thrown value
pub type EvalResult = Result<Val, Val>;

impl Interpreter {
    /// Evaluate an expression to a value
    pub(crate) fn eval_expr(&mut self, expr: &Expr, scope: ScopeId, this: &Val) -> EvalResult {
        match expr {
            Expr::LitNum { v, .. } => Ok(Val::Num(*v)),
            Expr::LitStr { v, .. } => Ok(Val::Str(v.clone())),
            Expr::LitBool { v, .. } => Ok(Val::Bool(*v)),
            Expr::LitNull { .. } => Ok(Val::Null),
            Expr::LitUndefined { .. } => Ok(Val::Undefined),

            Expr::Template { parts, .. } => {
                let mut out = String::new();
                for part in parts {
                    match part {
                        TemplatePart::Str(s) => out.push_str(s),
                        TemplatePart::Expr(e) => {
                            let v = self.eval_expr(e, scope, this)?;
                            out.push_str(&self.display_val(&v));
                        }
                    }
                }
                Ok(Val::Str(out))
            }

            Expr::Array { items, .. } => {
                let values = self.eval_list(items, scope, this)?;
                Ok(self.alloc_array(values))
            }

            Expr::Object { props, .. } => {
                let obj = self.new_object();
                for (key, value) in props {
                    let value = self.eval_expr(value, scope, this)?;
                    self.heap.get_mut(obj).props.insert(key.clone(), value);
                }
                Ok(Val::Obj(obj))
            }

            Expr::Ident { name, .. } => match self.heap.lookup(scope, name) {
                Some(binding) => Ok(binding.value.clone()),
                None => Err(self.make_error_val(
                    "ReferenceError",
                    &format!("{} is not defined", name),
                )),
            },

            Expr::This { .. } => Ok(this.clone()),

            Expr::Member {
                object,
                property,
                optional,
                ..
            } => {
                let target = self.eval_expr(object, scope, this)?;
                if *optional && target.is_nullish() {
                    return Ok(Val::Undefined);
                }
                self.get_prop(&target, property)
            }

            Expr::Index {
                object,
                index,
                optional,
                ..
            } => {
                let target = self.eval_expr(object, scope, this)?;
                if *optional && target.is_nullish() {
                    return Ok(Val::Undefined);
                }
                let key = self.eval_expr(index, scope, this)?;
                let key = self.property_key(&key);
                self.get_prop(&target, &key)
            }

            Expr::Call {
                callee,
                args,
                optional,
                ..
            } => self.eval_call(callee, args, *optional, scope, this),

            Expr::New { callee, args, .. } => {
                let constructor = self.eval_expr(callee, scope, this)?;
                let args = self.eval_list(args, scope, this)?;
                self.construct(&constructor, args, &describe_callee(callee))
            }

            Expr::Function { def, .. } => {
                let captured = if def.is_arrow {
                    Some(this.clone())
                } else {
                    None
                };
                Ok(self.make_closure(def.clone(), scope, captured))
            }

            Expr::Unary { op, operand, .. } => {
                // typeof tolerates undeclared identifiers
                if let (UnaryOp::Typeof, Expr::Ident { name, .. }) = (op, operand.as_ref()) {
                    if self.heap.lookup(scope, name).is_none() {
                        return Ok(Val::str("undefined"));
                    }
                }
                let v = self.eval_expr(operand, scope, this)?;
                Ok(match op {
                    UnaryOp::Not => Val::Bool(!v.is_truthy()),
                    UnaryOp::Neg => Val::Num(-self.to_number(&v)),
                    UnaryOp::Plus => Val::Num(self.to_number(&v)),
                    UnaryOp::Typeof => Val::str(self.type_of(&v)),
                })
            }

            Expr::Binary {
                op, left, right, ..
            } => {
                let lhs = self.eval_expr(left, scope, this)?;
                match op {
                    BinaryOp::And if !lhs.is_truthy() => Ok(lhs),
                    BinaryOp::Or if lhs.is_truthy() => Ok(lhs),
                    BinaryOp::Nullish if !lhs.is_nullish() => Ok(lhs),
                    BinaryOp::And | BinaryOp::Or | BinaryOp::Nullish => {
                        self.eval_expr(right, scope, this)
                    }
                    _ => {
                        let rhs = self.eval_expr(right, scope, this)?;
                        Ok(self.binary(*op, &lhs, &rhs))
                    }
                }
            }

            Expr::Conditional {
                test,
                then_e,
                else_e,
                ..
            } => {
                if self.eval_expr(test, scope, this)?.is_truthy() {
                    self.eval_expr(then_e, scope, this)
                } else {
                    self.eval_expr(else_e, scope, this)
                }
            }

            Expr::Await { .. } => Err(self.make_error_val(
                "SyntaxError",
                "await is only valid as the right-hand side of a statement",
            )),
        }
    }

    fn eval_list(&mut self, exprs: &[Expr], scope: ScopeId, this: &Val) -> Result<Vec<Val>, Val> {
        exprs
            .iter()
            .map(|e| self.eval_expr(e, scope, this))
            .collect()
    }

    /* ===================== Calls ===================== */

    fn eval_call(
        &mut self,
        callee: &Expr,
        args: &[Expr],
        optional: bool,
        scope: ScopeId,
        this: &Val,
    ) -> EvalResult {
        // method calls bind `this` to the receiver
        let (func, receiver) = match callee {
            Expr::Member {
                object,
                property,
                optional: member_optional,
                ..
            } => {
                let target = self.eval_expr(object, scope, this)?;
                if *member_optional && target.is_nullish() {
                    return Ok(Val::Undefined);
                }
                (self.get_prop(&target, property)?, target)
            }
            Expr::Index {
                object,
                index,
                optional: index_optional,
                ..
            } => {
                let target = self.eval_expr(object, scope, this)?;
                if *index_optional && target.is_nullish() {
                    return Ok(Val::Undefined);
                }
                let key = self.eval_expr(index, scope, this)?;
                let key = self.property_key(&key);
                (self.get_prop(&target, &key)?, target)
            }
            other => (self.eval_expr(other, scope, this)?, Val::Undefined),
        };

        if optional && func.is_nullish() {
            return Ok(Val::Undefined);
        }
        if !self.is_callable_val(&func) {
            return Err(self.type_error(&format!(
                "{} is not a function",
                describe_callee(callee)
            )));
        }

        let args = self.eval_list(args, scope, this)?;
        self.call_function(&func, receiver, args)
    }

    /* ===================== Assignment ===================== */

    pub(crate) fn assign_target(
        &mut self,
        target: &AssignTarget,
        op: AssignOp,
        value: Val,
        scope: ScopeId,
        this: &Val,
    ) -> Result<(), Val> {
        match target {
            AssignTarget::Ident { name } => {
                let value = match compound_op(op) {
                    Some(bin) => {
                        let current = self.eval_expr(
                            &Expr::Ident {
                                name: name.clone(),
                                span: Default::default(),
                            },
                            scope,
                            this,
                        )?;
                        self.binary(bin, &current, &value)
                    }
                    None => value,
                };
                self.heap
                    .assign(scope, name, value)
                    .map_err(|err| match err {
                        BindingError::Immutable => {
                            self.type_error("Assignment to constant variable.")
                        }
                        _ => self.make_error_val(
                            "ReferenceError",
                            &format!("{} is not defined", name),
                        ),
                    })
            }

            AssignTarget::Member { object, property } => {
                let target = self.eval_expr(object, scope, this)?;
                self.write_member(&target, property, op, value)
            }

            AssignTarget::Index { object, index } => {
                let target = self.eval_expr(object, scope, this)?;
                let key = self.eval_expr(index, scope, this)?;
                let key = self.property_key(&key);
                self.write_member(&target, &key, op, value)
            }
        }
    }

    fn write_member(&mut self, target: &Val, key: &str, op: AssignOp, value: Val) -> Result<(), Val> {
        let value = match compound_op(op) {
            Some(bin) => {
                let current = self.get_prop(target, key)?;
                self.binary(bin, &current, &value)
            }
            None => value,
        };
        self.put_prop(target, key, value)
    }

    /* ===================== Operators ===================== */

    /// Apply a non-short-circuit binary operator
    pub(crate) fn binary(&self, op: BinaryOp, lhs: &Val, rhs: &Val) -> Val {
        match op {
            BinaryOp::Add => {
                let stringy = |v: &Val| matches!(v, Val::Str(_) | Val::Obj(_));
                if stringy(lhs) || stringy(rhs) {
                    let mut s = self.display_val(lhs);
                    s.push_str(&self.display_val(rhs));
                    Val::Str(s)
                } else {
                    Val::Num(self.to_number(lhs) + self.to_number(rhs))
                }
            }
            BinaryOp::Sub => Val::Num(self.to_number(lhs) - self.to_number(rhs)),
            BinaryOp::Mul => Val::Num(self.to_number(lhs) * self.to_number(rhs)),
            BinaryOp::Div => Val::Num(self.to_number(lhs) / self.to_number(rhs)),
            BinaryOp::Rem => Val::Num(self.to_number(lhs) % self.to_number(rhs)),

            BinaryOp::Lt => Val::Bool(self.compare(lhs, rhs, |o| o.is_lt())),
            BinaryOp::Le => Val::Bool(self.compare(lhs, rhs, |o| o.is_le())),
            BinaryOp::Gt => Val::Bool(self.compare(lhs, rhs, |o| o.is_gt())),
            BinaryOp::Ge => Val::Bool(self.compare(lhs, rhs, |o| o.is_ge())),

            BinaryOp::StrictEq => Val::Bool(strict_equals(lhs, rhs)),
            BinaryOp::StrictNe => Val::Bool(!strict_equals(lhs, rhs)),
            BinaryOp::Eq => Val::Bool(self.loose_equals(lhs, rhs)),
            BinaryOp::Ne => Val::Bool(!self.loose_equals(lhs, rhs)),

            // short-circuit operators are handled by eval_expr
            BinaryOp::And | BinaryOp::Or | BinaryOp::Nullish => Val::Undefined,
        }
    }

    fn compare(&self, lhs: &Val, rhs: &Val, test: impl Fn(std::cmp::Ordering) -> bool) -> bool {
        if let (Val::Str(a), Val::Str(b)) = (lhs, rhs) {
            return test(a.cmp(b));
        }
        self.to_number(lhs)
            .partial_cmp(&self.to_number(rhs))
            .map_or(false, test)
    }

    pub(crate) fn loose_equals(&self, lhs: &Val, rhs: &Val) -> bool {
        match (lhs, rhs) {
            (a, b) if a.is_nullish() || b.is_nullish() => a.is_nullish() && b.is_nullish(),
            (Val::Obj(_), Val::Obj(_)) => strict_equals(lhs, rhs),
            (Val::Obj(_), Val::Str(s)) | (Val::Str(s), Val::Obj(_)) => {
                let obj = if matches!(lhs, Val::Obj(_)) { lhs } else { rhs };
                self.display_val(obj) == *s
            }
            (Val::Str(a), Val::Str(b)) => a == b,
            _ => self.to_number(lhs) == self.to_number(rhs),
        }
    }

    pub(crate) fn is_callable_val(&self, v: &Val) -> bool {
        match v {
            Val::Obj(id) => self.heap.get(*id).is_callable(),
            _ => false,
        }
    }
}

/// `===`: same type and value; objects compare by identity, `NaN` never equals itself
pub(crate) fn strict_equals(lhs: &Val, rhs: &Val) -> bool {
    match (lhs, rhs) {
        (Val::Num(a), Val::Num(b)) => a == b,
        _ => lhs == rhs,
    }
}

fn compound_op(op: AssignOp) -> Option<BinaryOp> {
    match op {
        AssignOp::Set => None,
        AssignOp::Add => Some(BinaryOp::Add),
        AssignOp::Sub => Some(BinaryOp::Sub),
        AssignOp::Mul => Some(BinaryOp::Mul),
        AssignOp::Div => Some(BinaryOp::Div),
    }
}

/// Source-like name of a callee for error messages
fn describe_callee(expr: &Expr) -> String {
    match expr {
        Expr::Ident { name, .. } => name.clone(),
        Expr::This { .. } => "this".to_string(),
        Expr::Member {
            object, property, ..
        } => format!("{}.{}", describe_callee(object), property),
        Expr::Index { object, .. } => format!("{}[...]", describe_callee(object)),
        Expr::Call { callee, .. } => format!("{}(...)", describe_callee(callee)),
        _ => "expression".to_string(),
    }
}
