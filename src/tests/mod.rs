use crate::{
    language::parse_program,
    pipeline::{interpret_program, interpret_source, PipelineError},
    runtime::{RecordingSink, RunOptions},
};

mod arrays;
mod calls;
mod errors;
mod scoping;

pub(crate) struct Run {
    pub output: Vec<String>,
    pub result: Result<i64, PipelineError>,
}

pub(crate) fn run_with(source: &str, options: &RunOptions) -> Run {
    let mut sink = RecordingSink::new();
    let result = interpret_source(source, options, &mut sink);
    Run {
        output: sink.lines(),
        result,
    }
}

/// Evaluates `source` without the static call checker, so the
/// interpreter's own call validation is what reports bad calls.
pub(crate) fn run_unchecked(source: &str) -> Run {
    let program = match parse_program(source) {
        Ok(program) => program,
        Err(errors) => panic!("parse failed: {:?}", errors.errors),
    };
    let mut sink = RecordingSink::new();
    let result = interpret_program(&program, &RunOptions::default(), &mut sink);
    Run {
        output: sink.lines(),
        result,
    }
}

pub(crate) fn run(source: &str) -> Run {
    run_with(source, &RunOptions::default())
}

/// Output of a program that is expected to finish cleanly.
pub(crate) fn output(source: &str) -> Vec<String> {
    let run = run(source);
    if let Err(err) = &run.result {
        panic!("program failed with {}: {err}", err.kind());
    }
    run.output
}

/// Output produced before the expected failure, plus the failure.
pub(crate) fn failure(source: &str) -> (Vec<String>, PipelineError) {
    let run = run(source);
    match run.result {
        Ok(code) => panic!("program succeeded with {code}, output {:?}", run.output),
        Err(err) => (run.output, err),
    }
}

pub(crate) fn lines(expected: &[&str]) -> Vec<String> {
    expected.iter().map(|line| line.to_string()).collect()
}
