use crate::language::{
    ast::{Block, FunctionDecl, Program},
    span::Span,
};
use crate::runtime::{
    builtins::Builtin,
    error::{RuntimeError, RuntimeResult},
    resolve::TypeResolver,
    value::ValueType,
};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq)]
pub struct ParamSignature {
    pub name: String,
    pub ty: ValueType,
    pub by_ref: bool,
}

#[derive(Clone, Debug)]
pub struct Signature {
    pub name: String,
    pub params: Vec<ParamSignature>,
    pub returns: ValueType,
    pub span: Span,
}

impl Signature {
    fn resolve(decl: &FunctionDecl, types: &TypeResolver) -> RuntimeResult<Self> {
        let params = decl
            .params
            .iter()
            .map(|param| {
                Ok(ParamSignature {
                    name: param.name.clone(),
                    ty: types.resolve(&param.ty)?,
                    by_ref: param.by_ref,
                })
            })
            .collect::<RuntimeResult<Vec<_>>>()?;
        Ok(Self {
            name: decl.name.clone(),
            params,
            returns: types.resolve(&decl.returns)?,
            span: decl.span,
        })
    }

    /// Prototypes may name their parameters differently from the
    /// definition; only types and passing modes have to agree.
    fn matches(&self, other: &Signature) -> bool {
        self.returns == other.returns
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(a, b)| a.ty == b.ty && a.by_ref == b.by_ref)
    }
}

#[derive(Clone, Debug)]
pub struct FunctionEntry<'p> {
    pub signature: Rc<Signature>,
    pub body: Option<&'p Block>,
}

/// Two-pass function table: every signature is registered before any body
/// is bound, so calls may precede definitions in the source.
#[derive(Default)]
pub struct FunctionTable<'p> {
    entries: HashMap<String, FunctionEntry<'p>>,
}

impl<'p> FunctionTable<'p> {
    pub fn build(program: &'p Program, types: &TypeResolver) -> RuntimeResult<Self> {
        let mut table = Self::default();
        for decl in program.functions() {
            table.register(decl, types)?;
        }
        for decl in program.functions() {
            if let Some(body) = &decl.body {
                table.bind(&decl.name, body)?;
            }
        }
        for entry in table.entries.values().filter(|entry| entry.body.is_none()) {
            warn!(function = %entry.signature.name, "function is declared but never defined");
        }
        Ok(table)
    }

    fn register(&mut self, decl: &FunctionDecl, types: &TypeResolver) -> RuntimeResult<()> {
        if Builtin::from_name(&decl.name).is_some() {
            return Err(RuntimeError::DuplicateDeclaration {
                name: decl.name.clone(),
            });
        }
        let signature = Signature::resolve(decl, types)?;
        match self.entries.get(&decl.name) {
            Some(existing) if !existing.signature.matches(&signature) => {
                Err(RuntimeError::mismatch(format!(
                    "declarations of `{}` disagree on their signature",
                    decl.name
                )))
            }
            Some(_) => Ok(()),
            None => {
                debug!(
                    function = %decl.name,
                    params = signature.params.len(),
                    returns = %signature.returns,
                    "registered function"
                );
                self.entries.insert(
                    decl.name.clone(),
                    FunctionEntry {
                        signature: Rc::new(signature),
                        body: None,
                    },
                );
                Ok(())
            }
        }
    }

    fn bind(&mut self, name: &str, body: &'p Block) -> RuntimeResult<()> {
        let entry = self
            .entries
            .get_mut(name)
            .ok_or_else(|| RuntimeError::UnknownIdentifier {
                name: name.to_string(),
            })?;
        if entry.body.is_some() {
            return Err(RuntimeError::DuplicateDeclaration {
                name: name.to_string(),
            });
        }
        entry.body = Some(body);
        Ok(())
    }

    pub fn get(&self, name: &str) -> RuntimeResult<FunctionEntry<'p>> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| RuntimeError::UnknownIdentifier {
                name: name.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::parse_program;

    fn build(source: &str) -> RuntimeResult<usize> {
        let program = parse_program(source).expect("parse");
        FunctionTable::build(&program, &TypeResolver::new()).map(|table| table.len())
    }

    #[test]
    fn prototype_and_definition_share_an_entry() {
        let count = build("void bar();\nint main() { bar(); return 0; }\nvoid bar() {}").unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn body_is_bound_after_all_signatures() {
        let program = parse_program("int f95(int n);\nint main() { return f95(1); }\nint f95(int n) { return n; }")
            .expect("parse");
        let table = FunctionTable::build(&program, &TypeResolver::new()).unwrap();
        let entry = table.get("f95").unwrap();
        assert!(entry.body.is_some());
        assert_eq!(entry.signature.params[0].ty, ValueType::Int);
    }

    #[test]
    fn two_bodies_are_a_duplicate() {
        let err = build("int f() { return 1; }\nint f() { return 2; }").unwrap_err();
        assert_eq!(err.kind(), "DuplicateDeclaration");
    }

    #[test]
    fn mismatched_prototype_is_rejected() {
        let err = build("int f(int &x);\nint f(int x) { return x; }").unwrap_err();
        assert_eq!(err.kind(), "TypeMismatch");
    }

    #[test]
    fn builtins_cannot_be_redefined() {
        let err = build("void print_int(int n) {}").unwrap_err();
        assert_eq!(err.kind(), "DuplicateDeclaration");
    }
}
