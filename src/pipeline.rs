use crate::language::{
    ast::Program,
    errors::SyntaxErrors,
    parse_program,
    span::Span,
    typecheck::{check_program, TypeError},
};
use crate::runtime::{Interpreter, OutputSink, RunOptions, RuntimeError};
use thiserror::Error;

/// Failure of one stage of parse, check and evaluate.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    Syntax(SyntaxErrors),
    #[error("{} type error(s)", .0.len())]
    Type(Vec<TypeError>),
    #[error("{error}")]
    Runtime {
        error: RuntimeError,
        span: Option<Span>,
    },
}

impl PipelineError {
    /// Name used on `error:` lines of expectation files.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::Syntax(_) => "SyntaxError",
            PipelineError::Type(_) => "TypeError",
            PipelineError::Runtime { error, .. } => error.kind(),
        }
    }
}

/// Parses and statically checks `source`.
pub fn check_source(source: &str, entry: &str) -> Result<Program, PipelineError> {
    let program = parse_program(source).map_err(PipelineError::Syntax)?;
    check_program(&program, entry).map_err(PipelineError::Type)?;
    Ok(program)
}

pub fn interpret_program(
    program: &Program,
    options: &RunOptions,
    sink: &mut dyn OutputSink,
) -> Result<i64, PipelineError> {
    let mut interpreter = Interpreter::with_options(program, sink, options.clone());
    interpreter.run().map_err(|error| PipelineError::Runtime {
        error,
        span: interpreter.fault_span(),
    })
}

/// Runs `source` end to end, writing output events to `sink`. Returns the
/// entry function's result.
pub fn interpret_source(
    source: &str,
    options: &RunOptions,
    sink: &mut dyn OutputSink,
) -> Result<i64, PipelineError> {
    let program = check_source(source, &options.entry)?;
    interpret_program(&program, options, sink)
}
