use crate::{
    language::{errors::SyntaxError, span::Span, typecheck::TypeError},
    pipeline::PipelineError,
    runtime::error::RuntimeError,
};
use miette::{Diagnostic, NamedSource, Report, SourceSpan};
use thiserror::Error;

#[derive(Debug, Error, Diagnostic, Clone)]
#[error("{message}")]
pub struct SyntaxDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("{label}")]
    span: SourceSpan,
    #[help]
    help: Option<String>,
    message: String,
    label: String,
}

impl SyntaxDiagnostic {
    pub fn from_error(src: NamedSource<String>, err: &SyntaxError) -> Self {
        Self {
            src,
            span: err.to_source_span(),
            help: err.help.clone(),
            message: err.message.clone(),
            label: err.label.clone(),
        }
    }
}

#[derive(Debug, Error, Diagnostic, Clone)]
#[error("{message}")]
pub struct TypeDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("{label}")]
    span: SourceSpan,
    message: String,
    label: String,
    #[help]
    help: Option<String>,
}

impl TypeDiagnostic {
    pub fn from_error(src: NamedSource<String>, err: &TypeError) -> Self {
        Self {
            src,
            span: span_to_source_span(err.span),
            message: err.display_message(),
            label: err.label.clone(),
            help: err.help.clone(),
        }
    }
}

#[derive(Debug, Error, Diagnostic, Clone)]
#[error("runtime error: {message}")]
#[diagnostic(code(minicpp::runtime))]
pub struct RuntimeDiagnostic {
    #[source_code]
    src: NamedSource<String>,
    #[label("{kind} raised here")]
    span: Option<SourceSpan>,
    message: String,
    kind: String,
}

pub fn emit_syntax_errors(name: &str, source: &str, errors: &[SyntaxError]) {
    let src = NamedSource::new(name, source.to_string());
    for err in errors {
        let diagnostic = SyntaxDiagnostic::from_error(src.clone(), err);
        eprintln!("{:?}", Report::new(diagnostic));
    }
}

pub fn emit_type_errors(name: &str, source: &str, errors: &[TypeError]) {
    let src = NamedSource::new(name, source.to_string());
    for err in errors {
        let diagnostic = TypeDiagnostic::from_error(src.clone(), err);
        eprintln!("{:?}", Report::new(diagnostic));
    }
}

pub fn report_runtime_error(name: &str, source: &str, error: &RuntimeError, span: Option<Span>) {
    let diagnostic = RuntimeDiagnostic {
        src: NamedSource::new(name, source.to_string()),
        span: span.map(span_to_source_span),
        message: error.to_string(),
        kind: error.kind().to_string(),
    };
    eprintln!("{:?}", Report::new(diagnostic));
}

/// Renders any pipeline failure against the file it came from.
pub fn emit_pipeline_error(name: &str, source: &str, error: &PipelineError) {
    match error {
        PipelineError::Syntax(errors) => emit_syntax_errors(name, source, &errors.errors),
        PipelineError::Type(errors) => emit_type_errors(name, source, errors),
        PipelineError::Runtime { error, span } => report_runtime_error(name, source, error, *span),
    }
}

fn span_to_source_span(span: Span) -> SourceSpan {
    SourceSpan::from((span.start, span.end.saturating_sub(span.start)))
}
