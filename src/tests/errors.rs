use super::*;

#[test]
fn syntax_errors_stop_before_running() {
    let (output, err) = failure("int main() { print_int(1) return 0; }");
    assert!(output.is_empty());
    assert!(matches!(err, PipelineError::Syntax(_)));
}

#[test]
fn checker_rejects_wrong_arity() {
    let source = r#"
        int fluppie(int &x) { return x; }
        int main() { int h = 1; fluppie(1, 2, 3, h); return 0; }
    "#;
    let (output, err) = failure(source);
    assert!(output.is_empty());
    let PipelineError::Type(errors) = err else {
        panic!("expected type errors");
    };
    assert_eq!(errors.len(), 1);
}

#[test]
fn checker_rejects_literal_reference_argument() {
    let source = r#"
        int foobar(int x, int y, int z, int &r) { return x; }
        int main() { foobar(1, 2, 3, 8); return 0; }
    "#;
    let (_, err) = failure(source);
    assert_eq!(err.kind(), "TypeError");
}

#[test]
fn prototype_without_definition() {
    let (output, err) = failure("void later();\nint main() { print_int(0); later(); return 0; }");
    assert_eq!(output, lines(&["0"]));
    assert_eq!(err.kind(), "UndefinedFunction");
}

#[test]
fn missing_return_in_non_void_function() {
    let (_, err) = failure("int nothing() { }\nint main() { return nothing(); }");
    assert_eq!(err.kind(), "MissingReturn");
}

#[test]
fn void_value_cannot_be_stored() {
    let (_, err) = failure("void nothing() { }\nint main() { int x = nothing(); return 0; }");
    assert_eq!(err.kind(), "TypeMismatch");
}

#[test]
fn reference_to_temporary_is_rejected() {
    let (_, err) = failure("int main() { int &r = 3; return 0; }");
    assert_eq!(err.kind(), "TypeMismatch");
}

#[test]
fn reference_type_must_match() {
    let (_, err) = failure("int main() { char c = 'a'; int &r = c; return 0; }");
    assert_eq!(err.kind(), "TypeMismatch");
}

#[test]
fn duplicate_definition_is_reported() {
    let (_, err) = failure("int f() { return 1; }\nint f() { return 2; }\nint main() { return f(); }");
    assert_eq!(err.kind(), "DuplicateDeclaration");
}

#[test]
fn fault_span_points_at_failing_statement() {
    let source = "int main() {\n  int arr[2];\n  arr[5] = 1;\n  return 0;\n}";
    let (_, err) = failure(source);
    let PipelineError::Runtime { span: Some(span), .. } = err else {
        panic!("expected runtime error with span");
    };
    assert_eq!(&source[span.start..span.end], "arr[5] = 1;");
}
