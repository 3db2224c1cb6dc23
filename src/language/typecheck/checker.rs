use super::*;
use crate::runtime::builtins::Builtin;

/// Rejects calls that can never succeed before anything runs: unknown
/// callees, wrong argument counts and rvalues passed by reference.
pub fn check_program(program: &Program, entry: &str) -> Result<(), Vec<TypeError>> {
    let mut checker = Checker {
        registry: FunctionRegistry::collect(program),
        errors: Vec::new(),
    };
    checker.check_entry(program, entry);
    for item in &program.items {
        match item {
            Item::Function(func) => {
                if let Some(body) = &func.body {
                    checker.check_block(body);
                }
            }
            Item::Global(decl) => checker.check_decl(decl),
            Item::Record(_) => {}
        }
    }
    if checker.errors.is_empty() {
        Ok(())
    } else {
        Err(checker.errors)
    }
}

struct Checker {
    registry: FunctionRegistry,
    errors: Vec<TypeError>,
}

impl Checker {
    fn check_entry(&mut self, program: &Program, entry: &str) {
        match self.registry.get(entry) {
            Some(shape) if shape.defined => {}
            Some(shape) => {
                let span = shape.span;
                self.errors.push(
                    TypeError::new(span, format!("entry function `{entry}` is declared but never defined"))
                        .with_code("E0ENTRY"),
                );
            }
            None => {
                let span = program
                    .items
                    .last()
                    .map(item_span)
                    .unwrap_or_default();
                self.errors.push(
                    TypeError::new(span, format!("no entry function `{entry}`"))
                        .with_code("E0ENTRY")
                        .with_label("program ends here")
                        .with_help(format!("define `int {entry}()`")),
                );
            }
        }
    }

    fn check_block(&mut self, block: &Block) {
        for statement in &block.statements {
            self.check_statement(statement);
        }
    }

    fn check_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Declare(stmt) => {
                for decl in &stmt.decls {
                    self.check_decl(decl);
                }
            }
            Statement::Expr(stmt) => self.check_expr(&stmt.expr),
            Statement::If(stmt) => {
                self.check_expr(&stmt.condition);
                self.check_statement(&stmt.then_branch);
                if let Some(else_branch) = &stmt.else_branch {
                    self.check_statement(else_branch);
                }
            }
            Statement::While(stmt) => {
                self.check_expr(&stmt.condition);
                self.check_statement(&stmt.body);
            }
            Statement::Return(stmt) => {
                if let Some(value) = &stmt.value {
                    self.check_expr(value);
                }
            }
            Statement::Block(block) => self.check_block(block),
            Statement::Empty(_) => {}
        }
    }

    fn check_decl(&mut self, decl: &VarDecl) {
        if let Some(init) = &decl.init {
            self.check_initializer(init);
        }
    }

    fn check_initializer(&mut self, init: &Initializer) {
        match init {
            Initializer::Expr(expr) => self.check_expr(expr),
            Initializer::List(items, _) => {
                for item in items {
                    self.check_initializer(item);
                }
            }
        }
    }

    fn check_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) | Expr::Identifier(_) => {}
            Expr::Binary { left, right, .. } => {
                self.check_expr(left);
                self.check_expr(right);
            }
            Expr::Unary { expr, .. } => self.check_expr(expr),
            Expr::Assign { target, value, .. } => {
                self.check_expr(target);
                self.check_expr(value);
            }
            Expr::Step { target, .. } => self.check_expr(target),
            Expr::Call { callee, args, span } => {
                for arg in args {
                    self.check_expr(arg);
                }
                self.check_call(callee, args, *span);
            }
            Expr::Index { base, index, .. } => {
                self.check_expr(base);
                self.check_expr(index);
            }
            Expr::Field { base, .. } => self.check_expr(base),
        }
    }

    fn check_call(&mut self, callee: &Identifier, args: &[Expr], span: Span) {
        if Builtin::from_name(&callee.name).is_some() {
            if args.len() != 1 {
                self.errors.push(
                    TypeError::new(
                        span,
                        format!("`{}` takes 1 argument but {} were supplied", callee.name, args.len()),
                    )
                    .with_code("E0ARITY"),
                );
            }
            return;
        }

        let Some(shape) = self.registry.get(&callee.name) else {
            self.errors.push(
                TypeError::new(callee.span, format!("unknown function `{}`", callee.name))
                    .with_code("E0FN")
                    .with_help("functions must be declared somewhere in the file"),
            );
            return;
        };

        if shape.by_ref.len() != args.len() {
            let expected = shape.by_ref.len();
            self.errors.push(
                TypeError::new(
                    span,
                    format!(
                        "`{}` takes {} argument{} but {} were supplied",
                        callee.name,
                        expected,
                        if expected == 1 { "" } else { "s" },
                        args.len()
                    ),
                )
                .with_code("E0ARITY"),
            );
            return;
        }

        let rvalues: Vec<Span> = shape
            .by_ref
            .iter()
            .zip(args)
            .filter(|(by_ref, arg)| **by_ref && !arg.is_place())
            .map(|(_, arg)| arg.span())
            .collect();
        for arg_span in rvalues {
            self.errors.push(
                TypeError::new(arg_span, "cannot bind a reference parameter to a temporary value")
                    .with_code("E0REF")
                    .with_label("not a variable, element or field")
                    .with_help(format!("pass a variable to `{}`", callee.name)),
            );
        }
    }
}

fn item_span(item: &Item) -> Span {
    match item {
        Item::Function(func) => func.span,
        Item::Record(record) => record.span,
        Item::Global(decl) => decl.span,
    }
}
