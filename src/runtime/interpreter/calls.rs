use super::{Flow, Interpreter};
use crate::language::ast::{Block, Expr, Identifier};
use crate::runtime::{
    builtins::Builtin,
    environment::Place,
    error::{RuntimeError, RuntimeResult},
    functions::{FunctionEntry, ParamSignature, Signature},
    stack::ensure_sufficient_stack,
    value::{convert, Value, ValueType},
};
use tracing::trace;

/// An evaluated argument, ready to be bound in the callee's frame.
pub(super) enum Argument {
    Value(Value),
    Alias(Place),
}

impl<'a> Interpreter<'a> {
    pub(super) fn eval_call(&mut self, callee: &Identifier, args: &[Expr]) -> RuntimeResult<Value> {
        if let Some(builtin) = Builtin::from_name(&callee.name) {
            let [arg] = args else {
                return Err(RuntimeError::ArityMismatch {
                    name: builtin.name().to_string(),
                    expected: 1,
                    received: args.len(),
                });
            };
            let value = self.eval_expr(arg)?;
            return builtin.invoke(&value, &mut *self.sink);
        }

        let entry = self.functions.get(&callee.name)?;
        let signature = entry.signature.clone();
        if signature.params.len() != args.len() {
            return Err(RuntimeError::ArityMismatch {
                name: signature.name.clone(),
                expected: signature.params.len(),
                received: args.len(),
            });
        }
        // Arguments are evaluated left to right in the caller's frame.
        let mut bound = Vec::with_capacity(args.len());
        for (param, arg) in signature.params.iter().zip(args) {
            bound.push(self.bind_argument(&signature, param, arg)?);
        }
        self.invoke(&entry, bound)
    }

    fn bind_argument(
        &mut self,
        signature: &Signature,
        param: &ParamSignature,
        arg: &Expr,
    ) -> RuntimeResult<Argument> {
        if !param.by_ref {
            let value = self.eval_expr(arg)?;
            return convert(value, &param.ty).map(Argument::Value);
        }
        if !arg.is_place() {
            return Err(RuntimeError::mismatch(format!(
                "reference parameter `{}` of `{}` needs a variable, element or field",
                param.name, signature.name
            )));
        }
        let place = self.eval_place(arg)?;
        let actual = place.value_type()?;
        if actual != param.ty {
            return Err(RuntimeError::mismatch(format!(
                "reference parameter `{}` of `{}` has type {}, found {actual}",
                param.name, signature.name, param.ty
            )));
        }
        Ok(Argument::Alias(place))
    }

    pub(super) fn invoke(
        &mut self,
        entry: &FunctionEntry<'a>,
        args: Vec<Argument>,
    ) -> RuntimeResult<Value> {
        let signature = &entry.signature;
        let body = entry.body.ok_or_else(|| RuntimeError::UndefinedFunction {
            name: signature.name.clone(),
        })?;
        if let Some(limit) = self.options.max_call_depth {
            if self.env.depth() >= limit {
                return Err(RuntimeError::CallDepthExceeded { limit });
            }
        }

        self.env.push_frame(&signature.name);
        trace!(function = %signature.name, depth = self.env.depth(), "call");
        let flow = self.run_body(signature, body, args);
        self.env.pop_frame();
        self.finish(signature, flow?)
    }

    /// Parameters live in the frame's top scope, which is also the scope of
    /// the body's outermost declarations.
    fn run_body(
        &mut self,
        signature: &Signature,
        body: &Block,
        args: Vec<Argument>,
    ) -> RuntimeResult<Flow> {
        for (param, arg) in signature.params.iter().zip(args) {
            match arg {
                Argument::Value(value) => self.env.declare(&param.name, value)?,
                Argument::Alias(place) => self.env.declare_alias(&param.name, place)?,
            }
        }
        ensure_sufficient_stack(|| self.exec_statements(&body.statements))
    }

    fn finish(&self, signature: &Signature, flow: Flow) -> RuntimeResult<Value> {
        match (flow, &signature.returns) {
            (Flow::Normal, ValueType::Void) | (Flow::Return(Value::Void), ValueType::Void) => {
                Ok(Value::Void)
            }
            (Flow::Return(value), ValueType::Void) => Err(RuntimeError::mismatch(format!(
                "void function `{}` returned {}",
                signature.name,
                value.type_name()
            ))),
            (Flow::Return(Value::Void), returns) => Err(RuntimeError::mismatch(format!(
                "`{}` must return a value of type {returns}",
                signature.name
            ))),
            (Flow::Return(value), returns) => convert(value, returns),
            (Flow::Normal, returns) if signature.name == self.options.entry => {
                convert(Value::Int(0), returns)
            }
            (Flow::Normal, _) => Err(RuntimeError::MissingReturn {
                function: signature.name.clone(),
            }),
        }
    }
}
