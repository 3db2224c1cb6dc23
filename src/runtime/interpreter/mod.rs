use crate::language::{ast::*, span::Span};
use crate::runtime::{
    builtins::OutputSink,
    environment::Environment,
    error::{RuntimeError, RuntimeResult},
    functions::FunctionTable,
    resolve::TypeResolver,
    value::Value,
};
use tracing::{debug, instrument};

mod calls;
mod expressions;
mod statements;

#[derive(Clone, Debug)]
pub struct RunOptions {
    /// Function called once globals are initialized.
    pub entry: String,
    /// Live activation records allowed before `CallDepthExceeded`.
    pub max_call_depth: Option<usize>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            entry: "main".to_string(),
            max_call_depth: None,
        }
    }
}

/// Outcome of executing a statement.
enum Flow {
    Normal,
    Return(Value),
}

pub struct Interpreter<'a> {
    program: &'a Program,
    env: Environment,
    functions: FunctionTable<'a>,
    types: TypeResolver,
    sink: &'a mut dyn OutputSink,
    options: RunOptions,
    fault_span: Option<Span>,
}

impl<'a> Interpreter<'a> {
    pub fn new(program: &'a Program, sink: &'a mut dyn OutputSink) -> Self {
        Self::with_options(program, sink, RunOptions::default())
    }

    pub fn with_options(
        program: &'a Program,
        sink: &'a mut dyn OutputSink,
        options: RunOptions,
    ) -> Self {
        Self {
            program,
            env: Environment::new(),
            functions: FunctionTable::default(),
            types: TypeResolver::new(),
            sink,
            options,
            fault_span: None,
        }
    }

    /// Source location of the innermost statement or declaration that was
    /// executing when the last error was raised.
    pub fn fault_span(&self) -> Option<Span> {
        self.fault_span
    }

    /// Registers records and functions, initializes globals and calls the
    /// entry function. Returns the entry function's result, or `0` for a
    /// `void` entry.
    #[instrument(level = "debug", skip_all, fields(entry = %self.options.entry))]
    pub fn run(&mut self) -> RuntimeResult<i64> {
        self.bootstrap()?;
        let entry = self.functions.get(&self.options.entry)?;
        if !entry.signature.params.is_empty() {
            return Err(RuntimeError::ArityMismatch {
                name: entry.signature.name.clone(),
                expected: entry.signature.params.len(),
                received: 0,
            });
        }
        debug!("starting program");
        match self.invoke(&entry, Vec::new())? {
            Value::Void => Ok(0),
            value => value.as_int(),
        }
    }

    fn bootstrap(&mut self) -> RuntimeResult<()> {
        let program = self.program;
        for item in &program.items {
            if let Item::Record(def) = item {
                let result = self.types.define_record(def);
                self.at(def.span, result)?;
            }
        }
        self.functions = FunctionTable::build(program, &self.types)?;
        debug!(functions = self.functions.len(), "registered functions");
        for item in &program.items {
            if let Item::Global(decl) = item {
                let result = self.declare_var(decl);
                self.at(decl.span, result)?;
            }
        }
        Ok(())
    }

    /// Remembers `span` as the fault location unless a more precise one was
    /// already recorded further down.
    fn at<T>(&mut self, span: Span, result: RuntimeResult<T>) -> RuntimeResult<T> {
        if result.is_err() {
            self.fault_span.get_or_insert(span);
        }
        result
    }
}
