use crate::language::ast::Expr;
use std::fmt;

/// A type as written in source. Array lengths stay unevaluated until the
/// interpreter resolves them.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeExpr {
    Int,
    Bool,
    Char,
    Void,
    Named(String),
    Array {
        elem: Box<TypeExpr>,
        /// `None` for `[]`, where the length comes from the initializer.
        len: Option<Box<Expr>>,
    },
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(name.into())
    }

    /// Wraps `base` in one array layer per dimension, outermost first.
    pub fn with_dims(base: TypeExpr, dims: Vec<Option<Expr>>) -> Self {
        dims.into_iter().rev().fold(base, |elem, len| TypeExpr::Array {
            elem: Box::new(elem),
            len: len.map(Box::new),
        })
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeExpr::Void)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Int => write!(f, "int"),
            TypeExpr::Bool => write!(f, "bool"),
            TypeExpr::Char => write!(f, "char"),
            TypeExpr::Void => write!(f, "void"),
            TypeExpr::Named(name) => write!(f, "{name}"),
            TypeExpr::Array { elem, .. } => write!(f, "{elem}[]"),
        }
    }
}
