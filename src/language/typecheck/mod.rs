use crate::language::{ast::*, span::Span};
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct TypeError {
    pub span: Span,
    pub message: String,
    pub label: String,
    pub code: Option<String>,
    pub help: Option<String>,
}

impl TypeError {
    pub fn new(span: Span, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            span,
            label: message.clone(),
            message,
            code: None,
            help: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn display_message(&self) -> String {
        if let Some(code) = &self.code {
            format!("[{code}] {}", self.message)
        } else {
            self.message.clone()
        }
    }
}

/// Call-relevant view of a function: how many arguments it takes and which
/// of them bind by reference.
#[derive(Clone, Debug)]
struct FunctionShape {
    by_ref: Vec<bool>,
    defined: bool,
    span: Span,
}

#[derive(Default)]
struct FunctionRegistry {
    functions: HashMap<String, FunctionShape>,
}

impl FunctionRegistry {
    fn collect(program: &Program) -> Self {
        let mut registry = Self::default();
        for func in program.functions() {
            let shape = registry
                .functions
                .entry(func.name.clone())
                .or_insert_with(|| FunctionShape {
                    by_ref: func.params.iter().map(|param| param.by_ref).collect(),
                    defined: false,
                    span: func.span,
                });
            shape.defined |= func.body.is_some();
        }
        registry
    }

    fn get(&self, name: &str) -> Option<&FunctionShape> {
        self.functions.get(name)
    }
}

mod checker;

pub use checker::check_program;
