use super::Interpreter;
use crate::language::ast::*;
use crate::runtime::{
    environment::Place,
    error::{RuntimeError, RuntimeResult},
    value::Value,
};

impl<'a> Interpreter<'a> {
    pub(super) fn eval_expr(&mut self, expr: &Expr) -> RuntimeResult<Value> {
        match expr {
            Expr::Literal(literal) => Ok(match literal {
                Literal::Int(value, _) => Value::Int(*value),
                Literal::Bool(value, _) => Value::Bool(*value),
                Literal::Char(value, _) => Value::Char(*value),
            }),
            Expr::Identifier(ident) => self.env.get(&ident.name),
            Expr::Binary {
                op: BinaryOp::And,
                left,
                right,
                ..
            } => {
                if !self.eval_expr(left)?.as_bool()? {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.eval_expr(right)?.as_bool()?))
            }
            Expr::Binary {
                op: BinaryOp::Or,
                left,
                right,
                ..
            } => {
                if self.eval_expr(left)?.as_bool()? {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.eval_expr(right)?.as_bool()?))
            }
            Expr::Binary {
                op, left, right, ..
            } => {
                let left = self.eval_expr(left)?;
                let right = self.eval_expr(right)?;
                eval_binary(*op, &left, &right)
            }
            Expr::Unary { op, expr, .. } => {
                let value = self.eval_expr(expr)?;
                eval_unary(*op, &value)
            }
            Expr::Assign {
                op, target, value, ..
            } => self.eval_assign(*op, target, value),
            Expr::Step {
                op, prefix, target, ..
            } => self.eval_step(*op, *prefix, target),
            Expr::Call { callee, args, .. } => self.eval_call(callee, args),
            Expr::Index { .. } | Expr::Field { .. } if expr.is_place() => {
                self.eval_place(expr)?.read()
            }
            Expr::Index { base, index, .. } => {
                let base = self.eval_expr(base)?;
                let index = self.eval_expr(index)?.as_int()?;
                element(base, index)
            }
            Expr::Field { base, field, .. } => {
                let base = self.eval_expr(base)?;
                field_of(base, field)
            }
        }
    }

    /// Resolves an lvalue expression to the storage it names.
    pub(super) fn eval_place(&mut self, expr: &Expr) -> RuntimeResult<Place> {
        match expr {
            Expr::Identifier(ident) => self.env.lookup(&ident.name),
            Expr::Index { base, index, .. } => {
                let place = self.eval_place(base)?;
                let index = self.eval_expr(index)?.as_int()?;
                place.index(index)
            }
            Expr::Field { base, field, .. } => self.eval_place(base)?.field(field),
            other => Err(RuntimeError::mismatch(format!(
                "{} does not name a storage location",
                describe(other)
            ))),
        }
    }

    /// The right-hand side is evaluated before the target place is resolved.
    fn eval_assign(&mut self, op: AssignOp, target: &Expr, value: &Expr) -> RuntimeResult<Value> {
        let rhs = self.eval_expr(value)?;
        let place = self.eval_place(target)?;
        let new = match op.binary() {
            Some(binary) => eval_binary(binary, &place.read()?, &rhs)?,
            None => rhs,
        };
        place.write(new)?;
        place.read()
    }

    fn eval_step(&mut self, op: StepOp, prefix: bool, target: &Expr) -> RuntimeResult<Value> {
        let place = self.eval_place(target)?;
        let old = place.read()?;
        let binary = match op {
            StepOp::Increment => BinaryOp::Add,
            StepOp::Decrement => BinaryOp::Sub,
        };
        place.write(eval_binary(binary, &old, &Value::Int(1))?)?;
        if prefix {
            place.read()
        } else {
            Ok(old)
        }
    }
}

/// Arithmetic promotes `char` and `bool` operands to `int` and wraps on
/// overflow.
pub(crate) fn eval_binary(op: BinaryOp, left: &Value, right: &Value) -> RuntimeResult<Value> {
    let (l, r) = (left.as_int()?, right.as_int()?);
    let value = match op {
        BinaryOp::Add => Value::Int(l.wrapping_add(r)),
        BinaryOp::Sub => Value::Int(l.wrapping_sub(r)),
        BinaryOp::Mul => Value::Int(l.wrapping_mul(r)),
        BinaryOp::Div | BinaryOp::Rem if r == 0 => return Err(RuntimeError::DivisionByZero),
        BinaryOp::Div => Value::Int(l.wrapping_div(r)),
        BinaryOp::Rem => Value::Int(l.wrapping_rem(r)),
        BinaryOp::Eq => Value::Bool(l == r),
        BinaryOp::NotEq => Value::Bool(l != r),
        BinaryOp::Lt => Value::Bool(l < r),
        BinaryOp::LtEq => Value::Bool(l <= r),
        BinaryOp::Gt => Value::Bool(l > r),
        BinaryOp::GtEq => Value::Bool(l >= r),
        BinaryOp::And => Value::Bool(l != 0 && r != 0),
        BinaryOp::Or => Value::Bool(l != 0 || r != 0),
    };
    Ok(value)
}

fn eval_unary(op: UnaryOp, value: &Value) -> RuntimeResult<Value> {
    match op {
        UnaryOp::Neg => Ok(Value::Int(value.as_int()?.wrapping_neg())),
        UnaryOp::Plus => Ok(Value::Int(value.as_int()?)),
        UnaryOp::Not => Ok(Value::Bool(!value.as_bool()?)),
    }
}

fn element(base: Value, index: i64) -> RuntimeResult<Value> {
    let Value::Array(mut items) = base else {
        return Err(RuntimeError::mismatch(format!(
            "cannot index into {}",
            base.type_name()
        )));
    };
    let len = items.len();
    match usize::try_from(index) {
        Ok(slot) if slot < len => Ok(items.swap_remove(slot)),
        _ => Err(RuntimeError::ArrayIndexOutOfRange { index, len }),
    }
}

fn field_of(base: Value, field: &str) -> RuntimeResult<Value> {
    let Value::Record(record) = base else {
        return Err(RuntimeError::mismatch(format!(
            "`.{field}` applied to {}",
            base.type_name()
        )));
    };
    record
        .get(field)
        .cloned()
        .ok_or_else(|| RuntimeError::UnknownField {
            record: record.ty.name.clone(),
            field: field.to_string(),
        })
}

fn describe(expr: &Expr) -> &'static str {
    match expr {
        Expr::Literal(_) => "a literal",
        Expr::Call { .. } => "a call result",
        Expr::Binary { .. } | Expr::Unary { .. } => "an operator result",
        Expr::Assign { .. } | Expr::Step { .. } => "an assignment result",
        _ => "this expression",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_operands_promote_to_int() {
        let sum = eval_binary(BinaryOp::Add, &Value::Int(3), &Value::Char(b'1')).unwrap();
        assert_eq!(sum, Value::Int(52));
        let cmp = eval_binary(BinaryOp::Lt, &Value::Char(b'a'), &Value::Char(b'b')).unwrap();
        assert_eq!(cmp, Value::Bool(true));
    }

    #[test]
    fn division_truncates_and_checks_zero() {
        assert_eq!(
            eval_binary(BinaryOp::Div, &Value::Int(-7), &Value::Int(2)).unwrap(),
            Value::Int(-3)
        );
        assert_eq!(
            eval_binary(BinaryOp::Rem, &Value::Int(-7), &Value::Int(2)).unwrap(),
            Value::Int(-1)
        );
        assert!(matches!(
            eval_binary(BinaryOp::Rem, &Value::Int(1), &Value::Bool(false)),
            Err(RuntimeError::DivisionByZero)
        ));
    }

    #[test]
    fn arithmetic_wraps() {
        let wrapped = eval_binary(BinaryOp::Add, &Value::Int(i64::MAX), &Value::Int(1)).unwrap();
        assert_eq!(wrapped, Value::Int(i64::MIN));
    }

    #[test]
    fn temporaries_are_bounds_checked() {
        let array = Value::Array(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(element(array.clone(), 1).unwrap(), Value::Int(2));
        assert!(matches!(
            element(array, 2),
            Err(RuntimeError::ArrayIndexOutOfRange { index: 2, len: 2 })
        ));
    }
}
