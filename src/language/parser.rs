use crate::language::{
    ast::*,
    errors::{SyntaxError, SyntaxErrors},
    lexer::lex,
    span::Span,
    token::{Token, TokenKind},
    types::TypeExpr,
};
use std::collections::HashSet;

pub fn parse_program(source: &str) -> Result<Program, SyntaxErrors> {
    let tokens = match lex(source) {
        Ok(tokens) => tokens,
        Err(errors) => {
            let errs = errors
                .into_iter()
                .map(|err| SyntaxError::new(err.message, err.span))
                .collect();
            return Err(SyntaxErrors::new(errs));
        }
    };
    Parser::new(tokens).parse()
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    errors: Vec<SyntaxError>,
    /// Record types seen so far; a leading identifier naming one starts a
    /// declaration rather than an expression.
    records: HashSet<String>,
}

struct Declarator {
    name: String,
    by_ref: bool,
    dims: Vec<Option<Expr>>,
    span: Span,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            errors: Vec::new(),
            records: HashSet::new(),
        }
    }

    fn parse(mut self) -> Result<Program, SyntaxErrors> {
        let mut items = Vec::new();

        while !self.is_eof() {
            if self.matches(&TokenKind::Semi) {
                continue;
            }
            match self.parse_item() {
                Ok(mut parsed) => items.append(&mut parsed),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }

        if self.errors.is_empty() {
            Ok(Program { items })
        } else {
            Err(SyntaxErrors::new(self.errors))
        }
    }

    fn parse_item(&mut self) -> Result<Vec<Item>, SyntaxError> {
        if self.check(&TokenKind::Class) || self.check(&TokenKind::Struct) {
            return self.parse_record().map(|record| vec![Item::Record(record)]);
        }
        let (ty, start) = self.parse_base_type()?;
        if matches!(self.peek_kind(), TokenKind::Identifier(_))
            && self.peek_kind_at(1) == &TokenKind::LParen
        {
            return self
                .parse_function(ty, start)
                .map(|func| vec![Item::Function(func)]);
        }
        let decls = self.parse_declarations(ty, start)?;
        Ok(decls.into_iter().map(Item::Global).collect())
    }

    fn parse_record(&mut self) -> Result<RecordDef, SyntaxError> {
        let start = self.advance().span.start;
        let name = self.expect_identifier("expected record name")?;
        self.expect(&TokenKind::LBrace, "expected `{` after record name")?;
        let mut fields = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.is_eof() {
            if self.matches(&TokenKind::Semi) {
                continue;
            }
            if self.matches(&TokenKind::Public)
                || self.matches(&TokenKind::Private)
                || self.matches(&TokenKind::Protected)
            {
                self.expect(&TokenKind::Colon, "expected `:` after access specifier")?;
                continue;
            }
            let (ty, _) = self.parse_base_type()?;
            if matches!(self.peek_kind(), TokenKind::Identifier(_))
                && self.peek_kind_at(1) == &TokenKind::LParen
            {
                return Err(SyntaxError::new(
                    "member functions are not supported",
                    self.current_span(),
                )
                .with_help("records hold data members only"));
            }
            if ty.is_void() {
                return Err(SyntaxError::new(
                    "fields cannot have type `void`",
                    self.current_span(),
                ));
            }
            loop {
                let declarator = self.parse_declarator()?;
                if declarator.by_ref {
                    return Err(SyntaxError::new(
                        "reference members are not supported",
                        declarator.span,
                    ));
                }
                if self.check(&TokenKind::Eq) {
                    return Err(SyntaxError::new(
                        "default member initializers are not supported",
                        self.current_span(),
                    ));
                }
                fields.push(FieldDef {
                    name: declarator.name,
                    ty: TypeExpr::with_dims(ty.clone(), declarator.dims),
                    span: declarator.span,
                });
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::Semi, "expected `;` after field declaration")?;
        }

        self.expect(&TokenKind::RBrace, "expected `}` to close record")?;
        let end = self
            .expect(&TokenKind::Semi, "expected `;` after record definition")?
            .span
            .end;
        self.records.insert(name.clone());
        Ok(RecordDef {
            name,
            fields,
            span: Span::new(start, end),
        })
    }

    fn parse_function(&mut self, returns: TypeExpr, start: usize) -> Result<FunctionDecl, SyntaxError> {
        let name = self.expect_identifier("expected function name")?;
        self.expect(&TokenKind::LParen, "expected `(` after function name")?;
        let mut params = Vec::new();
        if self.check(&TokenKind::Void) && self.peek_kind_at(1) == &TokenKind::RParen {
            self.advance();
        }
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.parse_param()?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        let close = self.expect(&TokenKind::RParen, "expected `)` after parameters")?;

        let (body, end) = if self.check(&TokenKind::Semi) {
            (None, self.advance().span.end)
        } else {
            let block = self.parse_block()?;
            let end = block.span.end;
            (Some(block), end)
        };
        Ok(FunctionDecl {
            name,
            params,
            returns,
            body,
            span: Span::new(start, end.max(close.span.end)),
        })
    }

    fn parse_param(&mut self) -> Result<Param, SyntaxError> {
        let (ty, start) = self.parse_base_type()?;
        if ty.is_void() {
            return Err(SyntaxError::new(
                "parameters cannot have type `void`",
                Span::new(start, self.previous_span().end),
            ));
        }
        let declarator = self.parse_declarator()?;
        let unbounded = declarator.dims.iter().any(Option::is_none);
        let ty = TypeExpr::with_dims(ty, declarator.dims);
        let span = Span::new(start, declarator.span.end);
        if unbounded {
            return Err(SyntaxError::new(
                format!("parameter `{}` of type `{ty}` needs an array bound", declarator.name),
                span,
            )
            .with_label("array length missing")
            .with_help("write the length, as in `int a[5]`"));
        }
        Ok(Param {
            name: declarator.name,
            ty,
            by_ref: declarator.by_ref,
            span,
        })
    }

    fn parse_base_type(&mut self) -> Result<(TypeExpr, usize), SyntaxError> {
        let token = self.peek().clone();
        let ty = match &token.kind {
            TokenKind::Int => TypeExpr::Int,
            TokenKind::Bool => TypeExpr::Bool,
            TokenKind::Char => TypeExpr::Char,
            TokenKind::Void => TypeExpr::Void,
            TokenKind::Identifier(name) if self.records.contains(name) => TypeExpr::named(name),
            TokenKind::Identifier(name) => {
                return Err(SyntaxError::new(format!("unknown type `{name}`"), token.span)
                    .with_help("record types must be defined before they are used"));
            }
            other => {
                return Err(SyntaxError::new(
                    format!("expected a type, found {other}"),
                    token.span,
                ));
            }
        };
        self.advance();
        Ok((ty, token.span.start))
    }

    /// `x`, `&x`, `x[2][3]`, `x[]` or `(&x)[5]`.
    fn parse_declarator(&mut self) -> Result<Declarator, SyntaxError> {
        let start = self.current_span().start;
        let (name, by_ref, parenthesized) = if self.matches(&TokenKind::LParen) {
            self.expect(&TokenKind::Amp, "expected `&` in parenthesized declarator")?;
            let name = self.expect_identifier("expected declarator name")?;
            self.expect(&TokenKind::RParen, "expected `)` after declarator name")?;
            (name, true, true)
        } else if self.matches(&TokenKind::Amp) {
            (self.expect_identifier("expected name after `&`")?, true, false)
        } else {
            (self.expect_identifier("expected declarator name")?, false, false)
        };

        let mut dims = Vec::new();
        while self.check(&TokenKind::LBracket) {
            let open = self.advance().span;
            if by_ref && !parenthesized {
                return Err(SyntaxError::new("arrays of references are not allowed", open)
                    .with_help(format!("write `(&{name})[N]` to declare a reference to an array")));
            }
            if self.matches(&TokenKind::RBracket) {
                dims.push(None);
            } else {
                dims.push(Some(self.parse_expression()?));
                self.expect(&TokenKind::RBracket, "expected `]` after array bound")?;
            }
        }

        Ok(Declarator {
            name,
            by_ref,
            dims,
            span: Span::new(start, self.previous_span().end),
        })
    }

    fn parse_declarations(&mut self, ty: TypeExpr, start: usize) -> Result<Vec<VarDecl>, SyntaxError> {
        if ty.is_void() {
            return Err(SyntaxError::new(
                "variables cannot have type `void`",
                Span::new(start, self.previous_span().end),
            ));
        }
        let mut decls = Vec::new();
        loop {
            let declarator = self.parse_declarator()?;
            let init = if self.matches(&TokenKind::Eq) {
                Some(self.parse_initializer()?)
            } else {
                None
            };
            decls.push(VarDecl {
                name: declarator.name,
                ty: TypeExpr::with_dims(ty.clone(), declarator.dims),
                by_ref: declarator.by_ref,
                init,
                span: Span::new(declarator.span.start, self.previous_span().end),
            });
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        self.expect(&TokenKind::Semi, "expected `;` after declaration")?;
        Ok(decls)
    }

    fn parse_initializer(&mut self) -> Result<Initializer, SyntaxError> {
        if !self.check(&TokenKind::LBrace) {
            return self.parse_expression().map(Initializer::Expr);
        }
        let start = self.advance().span.start;
        let mut items = Vec::new();
        while !self.check(&TokenKind::RBrace) {
            items.push(self.parse_initializer()?);
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }
        let end = self
            .expect(&TokenKind::RBrace, "expected `}` to close initializer list")?
            .span
            .end;
        Ok(Initializer::List(items, Span::new(start, end)))
    }

    fn parse_block(&mut self) -> Result<Block, SyntaxError> {
        let start = self
            .expect(&TokenKind::LBrace, "expected `{` to open block")?
            .span
            .start;
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_eof() {
            match self.parse_statement() {
                Ok(statement) => statements.push(statement),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }
        let end = self
            .expect(&TokenKind::RBrace, "expected `}` to close block")?
            .span
            .end;
        Ok(Block {
            statements,
            span: Span::new(start, end),
        })
    }

    fn parse_statement(&mut self) -> Result<Statement, SyntaxError> {
        match self.peek_kind() {
            TokenKind::LBrace => self.parse_block().map(Statement::Block),
            TokenKind::If => self.parse_if().map(Statement::If),
            TokenKind::While => self.parse_while().map(Statement::While),
            TokenKind::Return => self.parse_return().map(Statement::Return),
            TokenKind::Semi => Ok(Statement::Empty(self.advance().span)),
            TokenKind::Int | TokenKind::Bool | TokenKind::Char | TokenKind::Void => {
                self.parse_declare_statement()
            }
            TokenKind::Identifier(name) if self.records.contains(name) => {
                self.parse_declare_statement()
            }
            _ => {
                let expr = self.parse_expression()?;
                let end = self
                    .expect(&TokenKind::Semi, "expected `;` after expression")?
                    .span
                    .end;
                let span = Span::new(expr.span().start, end);
                Ok(Statement::Expr(ExprStmt { expr, span }))
            }
        }
    }

    fn parse_declare_statement(&mut self) -> Result<Statement, SyntaxError> {
        let (ty, start) = self.parse_base_type()?;
        let decls = self.parse_declarations(ty, start)?;
        Ok(Statement::Declare(DeclareStmt {
            decls,
            span: Span::new(start, self.previous_span().end),
        }))
    }

    fn parse_if(&mut self) -> Result<IfStmt, SyntaxError> {
        let start = self.advance().span.start;
        self.expect(&TokenKind::LParen, "expected `(` after `if`")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "expected `)` after condition")?;
        let then_branch = Box::new(self.parse_statement()?);
        let else_branch = if self.matches(&TokenKind::Else) {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(IfStmt {
            condition,
            then_branch,
            else_branch,
            span: Span::new(start, self.previous_span().end),
        })
    }

    fn parse_while(&mut self) -> Result<WhileStmt, SyntaxError> {
        let start = self.advance().span.start;
        self.expect(&TokenKind::LParen, "expected `(` after `while`")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RParen, "expected `)` after condition")?;
        let body = Box::new(self.parse_statement()?);
        Ok(WhileStmt {
            condition,
            body,
            span: Span::new(start, self.previous_span().end),
        })
    }

    fn parse_return(&mut self) -> Result<ReturnStmt, SyntaxError> {
        let start = self.advance().span.start;
        let value = if self.check(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expression()?)
        };
        let end = self
            .expect(&TokenKind::Semi, "expected `;` after return")?
            .span
            .end;
        Ok(ReturnStmt {
            value,
            span: Span::new(start, end),
        })
    }

    fn parse_expression(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> Result<Expr, SyntaxError> {
        let target = self.parse_binary(0)?;
        let Some(op) = assign_op(self.peek_kind()) else {
            return Ok(target);
        };
        self.advance();
        if !target.is_place() {
            return Err(SyntaxError::new("left side of assignment is not assignable", target.span())
                .with_label("cannot assign to this expression")
                .with_help("assign to a variable, an array element or a field"));
        }
        let value = self.parse_assignment()?;
        let span = target.span().join(value.span());
        Ok(Expr::Assign {
            op,
            target: Box::new(target),
            value: Box::new(value),
            span,
        })
    }

    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expr, SyntaxError> {
        let mut left = self.parse_unary()?;
        while let Some((op, precedence)) = binary_op(self.peek_kind()) {
            if precedence < min_precedence {
                break;
            }
            self.advance();
            let right = self.parse_binary(precedence + 1)?;
            let span = left.span().join(right.span());
            left = Expr::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                span,
            };
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        let start = self.current_span();
        let op = match self.peek_kind() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Plus),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::PlusPlus | TokenKind::MinusMinus => {
                let step = if self.advance().kind == TokenKind::PlusPlus {
                    StepOp::Increment
                } else {
                    StepOp::Decrement
                };
                let target = self.parse_unary()?;
                return self.step(step, true, target, start);
            }
            _ => None,
        };
        if let Some(op) = op {
            self.advance();
            let expr = self.parse_unary()?;
            let span = start.join(expr.span());
            return Ok(Expr::Unary {
                op,
                expr: Box::new(expr),
                span,
            });
        }
        self.parse_postfix()
    }

    fn parse_postfix(&mut self) -> Result<Expr, SyntaxError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek_kind() {
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expression()?;
                    let end = self
                        .expect(&TokenKind::RBracket, "expected `]` after index")?
                        .span
                        .end;
                    let span = Span::new(expr.span().start, end);
                    expr = Expr::Index {
                        base: Box::new(expr),
                        index: Box::new(index),
                        span,
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let field = self.expect_identifier("expected field name after `.`")?;
                    let span = Span::new(expr.span().start, self.previous_span().end);
                    expr = Expr::Field {
                        base: Box::new(expr),
                        field,
                        span,
                    };
                }
                TokenKind::LParen => {
                    let Expr::Identifier(callee) = expr else {
                        return Err(SyntaxError::new(
                            "only named functions can be called",
                            self.current_span(),
                        ));
                    };
                    self.advance();
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expression()?);
                            if !self.matches(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    let end = self
                        .expect(&TokenKind::RParen, "expected `)` after arguments")?
                        .span
                        .end;
                    let span = Span::new(callee.span.start, end);
                    expr = Expr::Call { callee, args, span };
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let token = self.advance();
                    let step = if token.kind == TokenKind::PlusPlus {
                        StepOp::Increment
                    } else {
                        StepOp::Decrement
                    };
                    let start = expr.span();
                    expr = self.step(step, false, expr, start)?;
                }
                _ => return Ok(expr),
            }
        }
    }

    fn step(&self, op: StepOp, prefix: bool, target: Expr, start: Span) -> Result<Expr, SyntaxError> {
        if !target.is_place() {
            return Err(SyntaxError::new(
                "increment and decrement need an assignable operand",
                target.span(),
            ));
        }
        let span = start.join(target.span()).join(self.previous_span());
        Ok(Expr::Step {
            op,
            prefix,
            target: Box::new(target),
            span,
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let token = self.peek().clone();
        let expr = match token.kind {
            TokenKind::IntLiteral(value) => Expr::Literal(Literal::Int(value, token.span)),
            TokenKind::CharLiteral(value) => Expr::Literal(Literal::Char(value, token.span)),
            TokenKind::True => Expr::Literal(Literal::Bool(true, token.span)),
            TokenKind::False => Expr::Literal(Literal::Bool(false, token.span)),
            TokenKind::Identifier(name) => Expr::Identifier(Identifier {
                name,
                span: token.span,
            }),
            TokenKind::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(&TokenKind::RParen, "expected `)` to close expression")?;
                return Ok(expr);
            }
            other => {
                return Err(SyntaxError::new(
                    format!("expected an expression, found {other}"),
                    token.span,
                ));
            }
        };
        self.advance();
        Ok(expr)
    }

    fn synchronize(&mut self) {
        while !self.is_eof() {
            match self.peek_kind() {
                TokenKind::Semi => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace => {
                    self.advance();
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_kind_at(&self, offset: usize) -> &TokenKind {
        let index = (self.pos + offset).min(self.tokens.len() - 1);
        &self.tokens[index].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if !self.is_eof() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<Token, SyntaxError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(SyntaxError::new(message, self.current_span())
                .with_label(format!("found {}", self.peek_kind())))
        }
    }

    fn expect_identifier(&mut self, message: &str) -> Result<String, SyntaxError> {
        if let TokenKind::Identifier(name) = self.peek_kind() {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(SyntaxError::new(message, self.current_span())
                .with_label(format!("found {}", self.peek_kind())))
        }
    }

    fn is_eof(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    fn previous_span(&self) -> Span {
        if self.pos == 0 {
            return self.current_span();
        }
        self.tokens[self.pos - 1].span
    }
}

fn assign_op(kind: &TokenKind) -> Option<AssignOp> {
    Some(match kind {
        TokenKind::Eq => AssignOp::Set,
        TokenKind::PlusEq => AssignOp::Add,
        TokenKind::MinusEq => AssignOp::Sub,
        TokenKind::StarEq => AssignOp::Mul,
        TokenKind::SlashEq => AssignOp::Div,
        TokenKind::PercentEq => AssignOp::Rem,
        _ => return None,
    })
}

fn binary_op(kind: &TokenKind) -> Option<(BinaryOp, u8)> {
    Some(match kind {
        TokenKind::PipePipe => (BinaryOp::Or, 1),
        TokenKind::AmpAmp => (BinaryOp::And, 2),
        TokenKind::EqEq => (BinaryOp::Eq, 3),
        TokenKind::BangEq => (BinaryOp::NotEq, 3),
        TokenKind::Lt => (BinaryOp::Lt, 4),
        TokenKind::LtEq => (BinaryOp::LtEq, 4),
        TokenKind::Gt => (BinaryOp::Gt, 4),
        TokenKind::GtEq => (BinaryOp::GtEq, 4),
        TokenKind::Plus => (BinaryOp::Add, 5),
        TokenKind::Minus => (BinaryOp::Sub, 5),
        TokenKind::Star => (BinaryOp::Mul, 6),
        TokenKind::Slash => (BinaryOp::Div, 6),
        TokenKind::Percent => (BinaryOp::Rem, 6),
        _ => return None,
    })
}
