use super::*;
use crate::runtime::RunOptions;
use pretty_assertions::assert_eq;

#[test]
fn reference_parameter_writes_reach_caller() {
    let source = r#"
        void set(int &r) { r = 99; }
        int main() {
            int h = 7;
            set(h);
            print_int(h);
            return 0;
        }
    "#;
    assert_eq!(output(source), lines(&["99"]));
}

#[test]
fn value_parameter_is_a_copy() {
    let source = r#"
        void set(int r) { r = 99; }
        int main() {
            int h = 7;
            set(h);
            print_int(h);
            return 0;
        }
    "#;
    assert_eq!(output(source), lines(&["7"]));
}

#[test]
fn references_chain_through_calls() {
    let source = r#"
        void inner(int &v) { v = v * 2; }
        void outer(int &v) { inner(v); v = v + 1; }
        int main() {
            int n = 5;
            outer(n);
            print_int(n);
            return 0;
        }
    "#;
    assert_eq!(output(source), lines(&["11"]));
}

#[test]
fn element_passed_by_reference() {
    let source = r#"
        void zero(int &slot) { slot = 0; }
        int main() {
            int arr[3] = {4, 5, 6};
            zero(arr[1]);
            print_int(arr[0]);
            print_int(arr[1]);
            print_int(arr[2]);
            return 0;
        }
    "#;
    assert_eq!(output(source), lines(&["4", "0", "6"]));
}

#[test]
fn forward_declared_mutual_recursion() {
    let source = r#"
        bool isOdd(int n);
        bool isEven(int n) {
            if (n == 0) { return true; }
            return isOdd(n - 1);
        }
        bool isOdd(int n) {
            if (n == 0) { return false; }
            return isEven(n - 1);
        }
        int main() {
            print_bool(isEven(10));
            print_bool(isOdd(7));
            print_bool(isOdd(4));
            return 0;
        }
    "#;
    assert_eq!(output(source), lines(&["1", "1", "0"]));
}

#[test]
fn recursion_uses_independent_frames() {
    let source = r#"
        int f95(int n) {
            int a = n - 1;
            int b = a - 1;
            int c = b - 1;
            int d = c - 1;
            int e = d--;
            if (n <= 0) {
                return 1;
            } else {
                if (n == 1) {
                    return 1;
                } else {
                    return f95(a) + f95(b) + f95(c) + f95(d) + f95(e);
                }
            }
        }
        int main() {
            print_int(f95(0));
            print_int(f95(1));
            print_int(f95(2));
            print_int(f95(10));
            return 0;
        }
    "#;
    assert_eq!(output(source), lines(&["1", "1", "5", "977"]));
}

#[test]
fn return_value_converts_to_declared_type() {
    let source = r#"
        char next(char c) { return c + 1; }
        bool truthy(int n) { return n; }
        int main() {
            print_char(next('a'));
            print_bool(truthy(42));
            return 0;
        }
    "#;
    assert_eq!(output(source), lines(&["b", "1"]));
}

#[test]
fn arguments_evaluate_left_to_right() {
    let source = r#"
        int trace(int n) { print_int(n); return n; }
        int add(int a, int b, int c) { return a + b + c; }
        int main() {
            print_int(add(trace(1), trace(2), trace(3)));
            return 0;
        }
    "#;
    assert_eq!(output(source), lines(&["1", "2", "3", "6"]));
}

#[test]
fn main_result_is_returned() {
    assert_eq!(run("int main() { return 3; }").result.ok(), Some(3));
    assert_eq!(run("int main() { print_int(1); }").result.ok(), Some(0));
    assert_eq!(run("void main() { print_int(1); }").result.ok(), Some(0));
}

#[test]
fn custom_entry_function() {
    let options = RunOptions {
        entry: "start".into(),
        ..RunOptions::default()
    };
    let run = run_with("int start() { print_int(8); return 2; }", &options);
    assert_eq!(run.output, lines(&["8"]));
    assert_eq!(run.result.ok(), Some(2));
}

#[test]
fn call_depth_limit_stops_runaway_recursion() {
    let options = RunOptions {
        max_call_depth: Some(50),
        ..RunOptions::default()
    };
    let run = run_with("int down(int n) { return down(n + 1); }\nint main() { return down(0); }", &options);
    assert_eq!(run.result.map_err(|err| err.kind()).err(), Some("CallDepthExceeded"));
}

#[test]
fn deep_recursion_within_limit_completes() {
    let options = RunOptions {
        max_call_depth: Some(20_000),
        ..RunOptions::default()
    };
    let source = r#"
        int count(int n) {
            if (n == 0) { return 0; }
            return 1 + count(n - 1);
        }
        int main() { print_int(count(10000)); return 0; }
    "#;
    assert_eq!(run_with(source, &options).output, lines(&["10000"]));
}

fn arity_kind(run: &Run) -> Option<&'static str> {
    run.result.as_ref().err().map(PipelineError::kind)
}

#[test]
fn interpreter_rejects_wrong_arity_user_call() {
    let source = r#"
        int add(int a, int b) { return a + b; }
        int main() {
            print_int(1);
            print_int(add(1));
            return 0;
        }
    "#;
    let run = run_unchecked(source);
    assert_eq!(run.output, lines(&["1"]));
    assert_eq!(arity_kind(&run), Some("ArityMismatch"));
}

#[test]
fn interpreter_rejects_wrong_arity_builtin_call() {
    let source = "int main() { print_int(1); print_char('a', 'b'); return 0; }";
    let run = run_unchecked(source);
    assert_eq!(run.output, lines(&["1"]));
    assert_eq!(arity_kind(&run), Some("ArityMismatch"));
}

#[test]
fn entry_function_with_parameters_is_rejected() {
    let run = run_unchecked("int main(int argc) { print_int(argc); return 0; }");
    assert!(run.output.is_empty());
    assert_eq!(arity_kind(&run), Some("ArityMismatch"));
}
