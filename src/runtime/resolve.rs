use crate::language::{
    ast::{BinaryOp, Expr, Literal, RecordDef, UnaryOp},
    types::TypeExpr,
};
use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    value::{RecordType, ValueType},
};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::debug;

/// Turns written types into [`ValueType`]s: record names are looked up and
/// array bounds are evaluated as constant expressions.
#[derive(Default)]
pub struct TypeResolver {
    records: HashMap<String, Rc<RecordType>>,
}

impl TypeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define_record(&mut self, def: &RecordDef) -> RuntimeResult<Rc<RecordType>> {
        if self.records.contains_key(&def.name) {
            return Err(RuntimeError::DuplicateDeclaration {
                name: def.name.clone(),
            });
        }
        let mut fields: Vec<(String, ValueType)> = Vec::with_capacity(def.fields.len());
        for field in &def.fields {
            if fields.iter().any(|(name, _)| *name == field.name) {
                return Err(RuntimeError::DuplicateDeclaration {
                    name: format!("{}::{}", def.name, field.name),
                });
            }
            fields.push((field.name.clone(), self.resolve(&field.ty)?));
        }
        let record = Rc::new(RecordType {
            name: def.name.clone(),
            fields,
        });
        debug!(record = %def.name, fields = record.fields.len(), "registered record");
        self.records.insert(def.name.clone(), record.clone());
        Ok(record)
    }

    pub fn resolve(&self, ty: &TypeExpr) -> RuntimeResult<ValueType> {
        self.resolve_sized(ty, None)
    }

    /// Like [`resolve`](Self::resolve), with `outer_len` standing in for an
    /// omitted outermost bound (`int a[] = {1, 2, 3}`).
    pub fn resolve_sized(&self, ty: &TypeExpr, outer_len: Option<usize>) -> RuntimeResult<ValueType> {
        match ty {
            TypeExpr::Int => Ok(ValueType::Int),
            TypeExpr::Bool => Ok(ValueType::Bool),
            TypeExpr::Char => Ok(ValueType::Char),
            TypeExpr::Void => Ok(ValueType::Void),
            TypeExpr::Named(name) => self
                .records
                .get(name)
                .cloned()
                .map(ValueType::Record)
                .ok_or_else(|| RuntimeError::UnknownType { name: name.clone() }),
            TypeExpr::Array { elem, len } => {
                let len = match (len, outer_len) {
                    (Some(bound), _) => array_bound(bound)?,
                    (None, Some(len)) if len > 0 => len,
                    (None, _) => {
                        return Err(RuntimeError::mismatch(
                            "array without a bound needs a non-empty initializer list",
                        ))
                    }
                };
                let elem = self.resolve_sized(elem, None)?;
                if elem == ValueType::Void {
                    return Err(RuntimeError::mismatch("arrays of void are not allowed"));
                }
                Ok(ValueType::Array {
                    elem: Box::new(elem),
                    len,
                })
            }
        }
    }
}

fn array_bound(expr: &Expr) -> RuntimeResult<usize> {
    let len = const_eval(expr)?;
    usize::try_from(len)
        .ok()
        .filter(|len| *len > 0)
        .ok_or_else(|| RuntimeError::mismatch(format!("array length must be positive, found {len}")))
}

/// Evaluates an expression built only from literals and operators.
fn const_eval(expr: &Expr) -> RuntimeResult<i64> {
    match expr {
        Expr::Literal(Literal::Int(value, _)) => Ok(*value),
        Expr::Literal(Literal::Char(value, _)) => Ok(i64::from(*value)),
        Expr::Literal(Literal::Bool(value, _)) => Ok(i64::from(*value)),
        Expr::Unary { op, expr, .. } => {
            let value = const_eval(expr)?;
            Ok(match op {
                UnaryOp::Neg => value.wrapping_neg(),
                UnaryOp::Plus => value,
                UnaryOp::Not => i64::from(value == 0),
            })
        }
        Expr::Binary { op, left, right, .. } => {
            let (l, r) = (const_eval(left)?, const_eval(right)?);
            match op {
                BinaryOp::Add => Ok(l.wrapping_add(r)),
                BinaryOp::Sub => Ok(l.wrapping_sub(r)),
                BinaryOp::Mul => Ok(l.wrapping_mul(r)),
                BinaryOp::Div | BinaryOp::Rem if r == 0 => Err(RuntimeError::DivisionByZero),
                BinaryOp::Div => Ok(l.wrapping_div(r)),
                BinaryOp::Rem => Ok(l.wrapping_rem(r)),
                _ => Err(non_constant(expr)),
            }
        }
        other => Err(non_constant(other)),
    }
}

fn non_constant(expr: &Expr) -> RuntimeError {
    let bound = match expr {
        Expr::Identifier(ident) => ident.name.clone(),
        Expr::Call { callee, .. } => format!("{}(..)", callee.name),
        Expr::Binary { op, .. } => format!("expression using `{}`", op.symbol()),
        _ => "expression".to_string(),
    };
    RuntimeError::NonConstantArrayBound { bound }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::{ast::Identifier, span::Span};

    fn int(value: i64) -> Box<Expr> {
        Box::new(Expr::Literal(Literal::Int(value, Span::default())))
    }

    fn array_of(len: Option<Box<Expr>>) -> TypeExpr {
        TypeExpr::Array {
            elem: Box::new(TypeExpr::Int),
            len,
        }
    }

    #[test]
    fn constant_bounds_fold() {
        let bound = Box::new(Expr::Binary {
            op: BinaryOp::Mul,
            left: int(2),
            right: int(3),
            span: Span::default(),
        });
        let resolved = TypeResolver::new().resolve(&array_of(Some(bound))).unwrap();
        assert_eq!(
            resolved,
            ValueType::Array {
                elem: Box::new(ValueType::Int),
                len: 6
            }
        );
    }

    #[test]
    fn variable_bounds_are_rejected() {
        let bound = Box::new(Expr::Identifier(Identifier {
            name: "five".into(),
            span: Span::default(),
        }));
        let err = TypeResolver::new().resolve(&array_of(Some(bound))).unwrap_err();
        assert!(matches!(err, RuntimeError::NonConstantArrayBound { ref bound } if bound == "five"));
    }

    #[test]
    fn omitted_bound_takes_initializer_length() {
        let resolver = TypeResolver::new();
        assert!(resolver.resolve(&array_of(None)).is_err());
        let resolved = resolver.resolve_sized(&array_of(None), Some(4)).unwrap();
        assert!(matches!(resolved, ValueType::Array { len: 4, .. }));
    }

    #[test]
    fn unknown_record_names_fail() {
        let err = TypeResolver::new().resolve(&TypeExpr::named("Missing")).unwrap_err();
        assert_eq!(err.kind(), "UnknownType");
    }
}
