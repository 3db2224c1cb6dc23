use super::{Flow, Interpreter};
use crate::language::ast::*;
use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    value::{convert, RecordValue, Value, ValueType},
};

impl<'a> Interpreter<'a> {
    pub(super) fn exec_statements(&mut self, statements: &[Statement]) -> RuntimeResult<Flow> {
        for statement in statements {
            if let Flow::Return(value) = self.exec_statement(statement)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_statement(&mut self, statement: &Statement) -> RuntimeResult<Flow> {
        let result = self.exec_statement_inner(statement);
        self.at(statement.span(), result)
    }

    fn exec_statement_inner(&mut self, statement: &Statement) -> RuntimeResult<Flow> {
        match statement {
            Statement::Declare(stmt) => {
                for decl in &stmt.decls {
                    let result = self.declare_var(decl);
                    self.at(decl.span, result)?;
                }
                Ok(Flow::Normal)
            }
            Statement::Expr(stmt) => {
                self.eval_expr(&stmt.expr)?;
                Ok(Flow::Normal)
            }
            Statement::If(stmt) => {
                if self.eval_expr(&stmt.condition)?.as_bool()? {
                    self.exec_scoped(&stmt.then_branch)
                } else if let Some(else_branch) = &stmt.else_branch {
                    self.exec_scoped(else_branch)
                } else {
                    Ok(Flow::Normal)
                }
            }
            Statement::While(stmt) => {
                while self.eval_expr(&stmt.condition)?.as_bool()? {
                    if let Flow::Return(value) = self.exec_scoped(&stmt.body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                Ok(Flow::Normal)
            }
            Statement::Return(stmt) => {
                let value = match &stmt.value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::Void,
                };
                Ok(Flow::Return(value))
            }
            Statement::Block(block) => self.exec_block(block),
            Statement::Empty(_) => Ok(Flow::Normal),
        }
    }

    /// Runs a branch or loop body in its own scope, even when it is a single
    /// statement without braces.
    fn exec_scoped(&mut self, statement: &Statement) -> RuntimeResult<Flow> {
        self.env.enter();
        let result = self.exec_statement(statement);
        self.env.exit();
        result
    }

    fn exec_block(&mut self, block: &Block) -> RuntimeResult<Flow> {
        self.env.enter();
        let result = self.exec_statements(&block.statements);
        self.env.exit();
        result
    }

    pub(super) fn declare_var(&mut self, decl: &VarDecl) -> RuntimeResult<()> {
        let outer_len = match &decl.init {
            Some(Initializer::List(items, _)) => Some(items.len()),
            _ => None,
        };
        let ty = self.types.resolve_sized(&decl.ty, outer_len)?;

        if decl.by_ref {
            let Some(Initializer::Expr(target)) = &decl.init else {
                return Err(RuntimeError::mismatch(format!(
                    "reference `{}` must be bound to a variable",
                    decl.name
                )));
            };
            if !target.is_place() {
                return Err(RuntimeError::mismatch(format!(
                    "reference `{}` cannot bind to a temporary value",
                    decl.name
                )));
            }
            let place = self.eval_place(target)?;
            let actual = place.value_type()?;
            if actual != ty {
                return Err(RuntimeError::mismatch(format!(
                    "reference `{}` of type {ty} cannot bind to {actual}",
                    decl.name
                )));
            }
            return self.env.declare_alias(&decl.name, place);
        }

        let value = match &decl.init {
            Some(init) => self.build_value(init, &ty)?,
            None => ty.zero_value(),
        };
        self.env.declare(&decl.name, value)
    }

    /// Evaluates an initializer for a slot of type `ty`. Lists shorter than
    /// the aggregate are zero-filled.
    fn build_value(&mut self, init: &Initializer, ty: &ValueType) -> RuntimeResult<Value> {
        let items = match init {
            Initializer::Expr(expr) => {
                let value = self.eval_expr(expr)?;
                return convert(value, ty);
            }
            Initializer::List(items, _) => items,
        };
        match ty {
            ValueType::Array { elem, len } => {
                if items.len() > *len {
                    return Err(too_many_initializers(ty, items.len()));
                }
                let mut values = Vec::with_capacity(*len);
                for item in items {
                    values.push(self.build_value(item, elem)?);
                }
                values.resize(*len, elem.zero_value());
                Ok(Value::Array(values))
            }
            ValueType::Record(record) => {
                if items.len() > record.fields.len() {
                    return Err(too_many_initializers(ty, items.len()));
                }
                let mut fields = Vec::with_capacity(record.fields.len());
                for (index, (_, field_ty)) in record.fields.iter().enumerate() {
                    let value = match items.get(index) {
                        Some(item) => self.build_value(item, field_ty)?,
                        None => field_ty.zero_value(),
                    };
                    fields.push(value);
                }
                Ok(Value::Record(RecordValue {
                    ty: record.clone(),
                    fields,
                }))
            }
            _ => match items.as_slice() {
                [] => Ok(ty.zero_value()),
                [single] => self.build_value(single, ty),
                _ => Err(too_many_initializers(ty, items.len())),
            },
        }
    }
}

fn too_many_initializers(ty: &ValueType, count: usize) -> RuntimeError {
    RuntimeError::mismatch(format!("{count} initializers are too many for {ty}"))
}
