use super::*;
use pretty_assertions::assert_eq;

#[test]
fn block_shadowing_restores_outer_binding() {
    let source = r#"
        int main() {
            int b = 7;
            {
                int b = 2;
                print_int(b);
            }
            print_int(b);
            return 0;
        }
    "#;
    assert_eq!(output(source), lines(&["2", "7"]));
}

#[test]
fn unbraced_branch_gets_its_own_scope() {
    let source = r#"
        int main() {
            int b = 1;
            if (true) int b = 5;
            print_int(b);
            return 0;
        }
    "#;
    assert_eq!(output(source), lines(&["1"]));
}

#[test]
fn loop_body_scope_is_fresh_each_iteration() {
    let source = r#"
        int main() {
            int i = 0;
            while (i < 3) {
                int fresh;
                fresh = fresh + i;
                print_int(fresh);
                i++;
            }
            return 0;
        }
    "#;
    assert_eq!(output(source), lines(&["0", "1", "2"]));
}

#[test]
fn callee_does_not_see_caller_locals() {
    let source = r#"
        int peek() { return secret; }
        int main() {
            int secret = 4;
            print_int(peek());
            return 0;
        }
    "#;
    let (output, err) = failure(source);
    assert!(output.is_empty());
    assert_eq!(err.kind(), "UnknownIdentifier");
}

#[test]
fn globals_are_visible_everywhere_and_shadowable() {
    let source = r#"
        int counter = 10;
        void bump() { counter += 1; }
        int main() {
            bump();
            print_int(counter);
            int counter = 0;
            print_int(counter);
            return 0;
        }
    "#;
    assert_eq!(output(source), lines(&["11", "0"]));
}

#[test]
fn redeclaration_in_same_scope_fails() {
    let (output, err) = failure("int main() { int a = 1; print_int(a); int a = 2; return 0; }");
    assert_eq!(output, lines(&["1"]));
    assert_eq!(err.kind(), "DuplicateDeclaration");
}

#[test]
fn parameter_cannot_be_redeclared_in_body() {
    let (_, err) = failure("int f(int x) { int x = 3; return x; }\nint main() { return f(1); }");
    assert_eq!(err.kind(), "DuplicateDeclaration");
}

#[test]
fn runs_are_deterministic() {
    let source = "int main() { int i = 0; while (i < 4) { print_int(i * i); i++; } return 0; }";
    assert_eq!(output(source), output(source));
}
