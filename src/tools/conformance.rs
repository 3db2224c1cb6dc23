//! Golden-output runner for `*.cpp` programs paired with `*.expected`
//! files.
//!
//! An expectation file lists one output event per line. Blank lines and
//! lines starting with `#` are ignored. A final `error: <Kind>` line states
//! that the program must abort with that error after the listed output.
//! Printed characters that would collide with this layout are escaped:
//! `\#` for `#`, `\n` for a newline and `\r` for a carriage return.

use crate::{
    pipeline::{interpret_source, PipelineError},
    runtime::{OutputEvent, RecordingSink, RunOptions},
    tools::diagnostics::emit_pipeline_error,
};
use std::{
    fmt::Write,
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

const SOURCE_EXTENSION: &str = "cpp";
const EXPECTED_EXTENSION: &str = "expected";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expectation {
    pub events: Vec<String>,
    pub error: Option<String>,
}

impl Expectation {
    pub fn parse(text: &str) -> Self {
        let mut expectation = Expectation::default();
        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(kind) = line.strip_prefix("error:") {
                expectation.error = Some(kind.trim().to_string());
            } else {
                expectation.events.push(line.to_string());
            }
        }
        expectation
    }

    pub fn load(source: &Path) -> Result<Self, String> {
        let path = source.with_extension(EXPECTED_EXTENSION);
        fs::read_to_string(&path)
            .map(|text| Self::parse(&text))
            .map_err(|e| format!("failed to read {}: {e}", path.display()))
    }
}

/// Runs every case under `dir`, or only `targets` when some are given.
/// Returns the number of passing cases.
pub fn run_tests(dir: &Path, targets: &[String], options: &RunOptions) -> Result<usize, String> {
    let cases = if targets.is_empty() {
        discover_tests(dir)?
    } else {
        targets.iter().map(PathBuf::from).collect()
    };
    if cases.is_empty() {
        return Err(format!(
            "No tests found (looked for *.{SOURCE_EXTENSION} with a .{EXPECTED_EXTENSION} file under {})",
            dir.display()
        ));
    }

    let mut failures = 0;
    for case in &cases {
        match run_test_file(case, options) {
            Ok(()) => println!("test name:{} status:ok", summary_name(case)),
            Err(message) => {
                failures += 1;
                println!("test name:{} status:failed", summary_name(case));
                eprintln!("{message}");
            }
        }
    }

    if failures > 0 {
        Err(format!("test result: FAILED. {failures} test(s) failed"))
    } else {
        println!("test result: ok. {} passed", cases.len());
        Ok(cases.len())
    }
}

pub fn discover_tests(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let mut files = Vec::new();
    let entries = fs::read_dir(dir).map_err(|e| format!("failed to read {}: {e}", dir.display()))?;
    for entry in entries {
        let path = entry.map_err(|e| e.to_string())?.path();
        let is_source = path
            .extension()
            .map(|ext| ext == SOURCE_EXTENSION)
            .unwrap_or(false);
        if is_source && path.with_extension(EXPECTED_EXTENSION).is_file() {
            files.push(path);
        }
    }
    files.sort();
    debug!(dir = %dir.display(), cases = files.len(), "discovered conformance cases");
    Ok(files)
}

/// Runs one case and compares it with its expectation file.
pub fn run_test_file(path: &Path, options: &RunOptions) -> Result<(), String> {
    let source = fs::read_to_string(path)
        .map_err(|e| format!("failed to read {}: {e}", path.display()))?;
    let expected = Expectation::load(path)?;

    let mut sink = RecordingSink::new();
    let outcome = interpret_source(&source, options, &mut sink);
    let actual = Expectation {
        events: sink.events.iter().map(expectation_line).collect(),
        error: outcome.as_ref().err().map(|err| err.kind().to_string()),
    };
    if actual == expected {
        return Ok(());
    }

    if let Err(err @ (PipelineError::Syntax(_) | PipelineError::Type(_))) = &outcome {
        emit_pipeline_error(&path.display().to_string(), &source, err);
    }
    Err(describe_mismatch(path, &expected, &actual))
}

/// Spells an output event the way expectation files write it.
fn expectation_line(event: &OutputEvent) -> String {
    match event {
        OutputEvent::Char(b'#') => "\\#".to_string(),
        OutputEvent::Char(b'\n') => "\\n".to_string(),
        OutputEvent::Char(b'\r') => "\\r".to_string(),
        other => other.to_string(),
    }
}

fn describe_mismatch(path: &Path, expected: &Expectation, actual: &Expectation) -> String {
    let mut message = format!("{}: output differs from expectation", path.display());
    let first_diff = expected
        .events
        .iter()
        .zip(&actual.events)
        .position(|(want, got)| want != got)
        .unwrap_or_else(|| expected.events.len().min(actual.events.len()));
    writeln!(message).ok();
    write!(
        message,
        "  first difference at event {first_diff}: expected {:?}, got {:?}",
        expected.events.get(first_diff),
        actual.events.get(first_diff)
    )
    .ok();
    if expected.error != actual.error {
        write!(
            message,
            "\n  expected error {:?}, got {:?}",
            expected.error, actual.error
        )
        .ok();
    }
    message
}

fn summary_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_string)
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_events_comments_and_error_line() {
        let text = "# shadowing\n7\n2\n\nerror: ArrayIndexOutOfRange\n";
        let expectation = Expectation::parse(text);
        assert_eq!(
            expectation,
            Expectation {
                events: vec!["7".into(), "2".into()],
                error: Some("ArrayIndexOutOfRange".into()),
            }
        );
    }

    #[test]
    fn discovers_only_paired_sources() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.cpp"), "int main() { return 0; }").unwrap();
        fs::write(dir.path().join("b.expected"), "").unwrap();
        fs::write(dir.path().join("a.cpp"), "int main() { return 0; }").unwrap();
        fs::write(dir.path().join("a.expected"), "").unwrap();
        fs::write(dir.path().join("unpaired.cpp"), "int main() { return 0; }").unwrap();
        let found = discover_tests(dir.path()).unwrap();
        let names: Vec<_> = found.iter().map(|path| summary_name(path)).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn reports_output_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("case.cpp");
        fs::write(&source, "int main() { print_int(1); print_int(2); return 0; }").unwrap();
        fs::write(dir.path().join("case.expected"), "1\n3\n").unwrap();
        let err = run_test_file(&source, &RunOptions::default()).unwrap_err();
        assert!(err.contains("first difference at event 1"));
    }

    #[test]
    fn expected_runtime_errors_pass() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("oob.cpp");
        fs::write(
            &source,
            "int main() { int arr[5]; print_int(1); arr[6] = 2; print_int(2); return 0; }",
        )
        .unwrap();
        fs::write(dir.path().join("oob.expected"), "1\nerror: ArrayIndexOutOfRange\n").unwrap();
        assert_eq!(run_test_file(&source, &RunOptions::default()), Ok(()));
    }

    #[test]
    fn printed_hash_and_newline_are_escaped() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("escapes.cpp");
        fs::write(
            &source,
            "int main() { print_char('#'); print_char('\\n'); print_char('\\r'); print_int(1); return 0; }",
        )
        .unwrap();
        fs::write(dir.path().join("escapes.expected"), "# escaped characters\n\\#\n\\n\n\\r\n1\n")
            .unwrap();
        assert_eq!(run_test_file(&source, &RunOptions::default()), Ok(()));
    }

    #[test]
    fn unescaped_hash_is_a_comment() {
        let expectation = Expectation::parse("#\n1\n");
        assert_eq!(expectation.events, vec!["1".to_string()]);
        assert_eq!(expectation_line(&OutputEvent::Char(b'#')), "\\#");
        assert_eq!(expectation_line(&OutputEvent::Char(b'x')), "x");
    }

    #[test]
    fn bundled_conformance_suite_passes() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/conformance");
        let cases = discover_tests(&dir).unwrap();
        assert!(!cases.is_empty());
        for case in cases {
            if let Err(message) = run_test_file(&case, &RunOptions::default()) {
                panic!("{message}");
            }
        }
    }
}
