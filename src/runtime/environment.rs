use crate::runtime::{
    error::{RuntimeError, RuntimeResult},
    value::{convert, Value, ValueType},
};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Step {
    Index(usize),
    Field(usize),
}

/// A storage location: a cell plus the element/field path inside it.
///
/// Reference bindings hold a `Place` that shares the owner's cell, so
/// writes through the alias land in the caller-visible storage.
#[derive(Clone, Debug)]
pub struct Place {
    cell: Rc<RefCell<Value>>,
    path: Vec<Step>,
}

impl Place {
    fn owned(value: Value) -> Self {
        Self {
            cell: Rc::new(RefCell::new(value)),
            path: Vec::new(),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Value) -> RuntimeResult<R>) -> RuntimeResult<R> {
        let mut root = self.cell.borrow_mut();
        let mut current: &mut Value = &mut root;
        for step in &self.path {
            current = match (step, current) {
                (Step::Index(index), Value::Array(items)) => &mut items[*index],
                (Step::Field(index), Value::Record(record)) => &mut record.fields[*index],
                (_, other) => {
                    return Err(RuntimeError::mismatch(format!(
                        "cannot step into {}",
                        other.type_name()
                    )))
                }
            };
        }
        f(current)
    }

    pub fn read(&self) -> RuntimeResult<Value> {
        self.with(|value| Ok(value.clone()))
    }

    /// Stores `value`, converted to the type already held at this place.
    pub fn write(&self, value: Value) -> RuntimeResult<()> {
        self.with(|slot| {
            *slot = convert(value, &slot.value_type())?;
            Ok(())
        })
    }

    pub fn value_type(&self) -> RuntimeResult<ValueType> {
        self.with(|value| Ok(value.value_type()))
    }

    /// Place of element `index`, bounds-checked against the array here.
    pub fn index(&self, index: i64) -> RuntimeResult<Place> {
        let len = self.with(|value| match value {
            Value::Array(items) => Ok(items.len()),
            other => Err(RuntimeError::mismatch(format!(
                "cannot index into {}",
                other.type_name()
            ))),
        })?;
        let slot = usize::try_from(index)
            .ok()
            .filter(|slot| *slot < len)
            .ok_or(RuntimeError::ArrayIndexOutOfRange { index, len })?;
        Ok(self.extend(Step::Index(slot)))
    }

    pub fn field(&self, field: &str) -> RuntimeResult<Place> {
        let slot = self.with(|value| match value {
            Value::Record(record) => {
                record
                    .ty
                    .field_index(field)
                    .ok_or_else(|| RuntimeError::UnknownField {
                        record: record.ty.name.clone(),
                        field: field.to_string(),
                    })
            }
            other => Err(RuntimeError::mismatch(format!(
                "`.{field}` applied to {}",
                other.type_name()
            ))),
        })?;
        Ok(self.extend(Step::Field(slot)))
    }

    fn extend(&self, step: Step) -> Place {
        let mut path = self.path.clone();
        path.push(step);
        Place {
            cell: self.cell.clone(),
            path,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingKind {
    Owned,
    Alias,
}

#[derive(Clone, Debug)]
struct Binding {
    place: Place,
    kind: BindingKind,
}

#[derive(Default)]
struct Scope {
    bindings: HashMap<String, Binding>,
}

impl Scope {
    fn insert(&mut self, name: &str, binding: Binding) -> RuntimeResult<()> {
        if self.bindings.contains_key(name) {
            return Err(RuntimeError::DuplicateDeclaration {
                name: name.to_string(),
            });
        }
        self.bindings.insert(name.to_string(), binding);
        Ok(())
    }
}

/// Activation record of one call.
struct Frame {
    function: String,
    scopes: Vec<Scope>,
}

/// Scope manager: a global scope plus a stack of activation records, each
/// holding its own stack of block scopes.
///
/// Lookups never reach into a caller's frame.
#[derive(Default)]
pub struct Environment {
    globals: Scope,
    frames: Vec<Frame>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_frame(&mut self, function: &str) {
        self.frames.push(Frame {
            function: function.to_string(),
            scopes: vec![Scope::default()],
        });
        trace!(function, depth = self.frames.len(), "push frame");
    }

    pub fn pop_frame(&mut self) {
        if let Some(frame) = self.frames.pop() {
            trace!(function = %frame.function, "pop frame");
        }
    }

    /// Name of the function whose frame is active, if any.
    pub fn current_function(&self) -> Option<&str> {
        self.frames.last().map(|frame| frame.function.as_str())
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn enter(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.scopes.push(Scope::default());
            trace!(depth = frame.scopes.len(), "enter scope");
        }
    }

    pub fn exit(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            // The frame's top scope holds the parameters and lives until
            // `pop_frame`.
            if frame.scopes.len() > 1 {
                frame.scopes.pop();
                trace!(depth = frame.scopes.len(), "exit scope");
            }
        }
    }

    fn current_scope(&mut self) -> &mut Scope {
        match self.frames.last_mut().and_then(|frame| frame.scopes.last_mut()) {
            Some(scope) => scope,
            None => &mut self.globals,
        }
    }

    pub fn declare(&mut self, name: &str, value: Value) -> RuntimeResult<()> {
        let binding = Binding {
            place: Place::owned(value),
            kind: BindingKind::Owned,
        };
        self.current_scope().insert(name, binding)
    }

    pub fn declare_alias(&mut self, name: &str, place: Place) -> RuntimeResult<()> {
        let binding = Binding {
            place,
            kind: BindingKind::Alias,
        };
        self.current_scope().insert(name, binding)
    }

    fn binding(&self, name: &str) -> RuntimeResult<&Binding> {
        let locals = self
            .frames
            .last()
            .into_iter()
            .flat_map(|frame| frame.scopes.iter().rev());
        locals
            .chain(std::iter::once(&self.globals))
            .find_map(|scope| scope.bindings.get(name))
            .ok_or_else(|| RuntimeError::UnknownIdentifier {
                name: name.to_string(),
            })
    }

    pub fn lookup(&self, name: &str) -> RuntimeResult<Place> {
        self.binding(name).map(|binding| binding.place.clone())
    }

    pub fn binding_kind(&self, name: &str) -> RuntimeResult<BindingKind> {
        self.binding(name).map(|binding| binding.kind)
    }

    pub fn get(&self, name: &str) -> RuntimeResult<Value> {
        self.binding(name)?.place.read()
    }

    /// Writes through any reference indirection to the owning storage.
    pub fn assign(&mut self, name: &str, value: Value) -> RuntimeResult<()> {
        self.binding(name)?.place.write(value)
    }
}
