use super::*;
use crate::runtime::RuntimeError;
use pretty_assertions::assert_eq;

#[test]
fn out_of_bounds_aborts_after_earlier_output() {
    let source = r#"
        int main() {
            int arr[5];
            print_int(1);
            print_int(arr[6]);
            print_int(2);
            return 0;
        }
    "#;
    let (output, err) = failure(source);
    assert_eq!(output, lines(&["1"]));
    assert!(matches!(
        err,
        PipelineError::Runtime {
            error: RuntimeError::ArrayIndexOutOfRange { index: 6, len: 5 },
            span: Some(_),
        }
    ));
}

#[test]
fn negative_index_is_out_of_range() {
    let (_, err) = failure("int main() { int arr[2]; arr[-1] = 3; return 0; }");
    assert_eq!(err.kind(), "ArrayIndexOutOfRange");
}

#[test]
fn multi_dimensional_rows_are_independent() {
    let source = r#"
        int main() {
            int m[2][2] = {{1, 2}, {3, 4}};
            m[0][1] = 20;
            print_int(m[0][1]);
            print_int(m[1][1]);
            return 0;
        }
    "#;
    assert_eq!(output(source), lines(&["20", "4"]));
}

#[test]
fn array_reference_aliases_whole_array() {
    let source = r#"
        int main() {
            int arr[3];
            int (&view)[3] = arr;
            view[2] = 8;
            print_int(arr[2]);
            return 0;
        }
    "#;
    assert_eq!(output(source), lines(&["8"]));
}

#[test]
fn array_reference_length_must_match() {
    let (_, err) = failure("int main() { int arr[3]; int (&view)[4] = arr; return 0; }");
    assert_eq!(err.kind(), "TypeMismatch");
}

#[test]
fn variable_bound_is_rejected() {
    let source = "int main() { int arr[5]; int five = 5; int (&r)[five] = arr; return 0; }";
    let (_, err) = failure(source);
    assert_eq!(err.kind(), "NonConstantArrayBound");
}

#[test]
fn constant_expression_bounds_are_allowed() {
    let source = "int main() { int arr[2 * 3]; arr[5] = 1; print_int(arr[5]); return 0; }";
    assert_eq!(output(source), lines(&["1"]));
}

#[test]
fn too_many_initializers_fail() {
    let (_, err) = failure("int main() { int arr[2] = {1, 2, 3}; return 0; }");
    assert_eq!(err.kind(), "TypeMismatch");
}

#[test]
fn char_arrays_hold_characters() {
    let source = r#"
        int main() {
            char word[3] = {'a', 'b'};
            word[2] = word[1] + 1;
            print_char(word[0]);
            print_char(word[2]);
            print_int(word[1]);
            return 0;
        }
    "#;
    assert_eq!(output(source), lines(&["a", "c", "98"]));
}
