use std::{iter::Peekable, rc::Rc, slice::Iter};

use crate::{
    ast::{BinOp, CmpOp, ControlKind, Expr, Function, Ident, Item, LogicalOp, Source, UnaryOp},
    error::{ErrorMsg, SyntaxError},
    token::{Pos, Token, TokenKind},
};

/// Deepest nesting of groups, blocks, calls and right-hand operands
/// the parser descends into before giving up.
pub const MAX_NESTING: usize = 100;

#[derive(Debug)]
pub struct Parser<'a> {
    stream: Peekable<Iter<'a, Token>>,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(stream: &'a [Token]) -> Self {
        Self {
            stream: stream.iter().peekable(),
            depth: 0,
        }
    }

    /// Parse a whole program: a sequence of statements.
    pub fn parse_all(mut self) -> Result<Source, SyntaxError> {
        let items = self.parse_statements()?;
        // Statements only stop early on a closing brace
        if let Some(&t) = self.stream.peek() {
            return Err(SyntaxError::at_token(t, ErrorMsg::UnexpectedToken));
        }
        Ok(Source { items })
    }

    /// Parse a single free-standing expression, optionally followed
    /// by a semicolon.
    pub fn parse_expr_only(mut self) -> Result<Expr, SyntaxError> {
        let expr = self.parse_expr()?;
        self.advance_if(|t| t.kind == TokenKind::SEMICOLON);
        match self.stream.peek() {
            Some(&t) => Err(SyntaxError::at_token(t, ErrorMsg::UnexpectedToken)),
            None => Ok(expr),
        }
    }

    fn parse_statements(&mut self) -> Result<Vec<Item>, SyntaxError> {
        let mut items = Vec::default();
        while let Some(&t) = self.stream.peek() {
            match t.kind {
                TokenKind::RBRACE => break,
                TokenKind::IF | TokenKind::WHILE | TokenKind::FUNC => {
                    items.push(self.parse_block_stmt()?);
                    // Block statements need no separator, but tolerate one
                    self.advance_if(|t| t.kind == TokenKind::SEMICOLON);
                }
                _ => {
                    items.push(self.parse_stmt()?);
                    match self.stream.peek() {
                        Some(&t) if t.kind == TokenKind::SEMICOLON => {
                            self.advance();
                        }
                        // The separator is optional for the last statement
                        Some(&t) if t.kind == TokenKind::RBRACE => break,
                        Some(&t) => {
                            return Err(SyntaxError::at_token(t, ErrorMsg::MissingSemicolon))
                        }
                        None => break,
                    }
                }
            }
        }
        Ok(items)
    }

    fn parse_block_stmt(&mut self) -> Result<Item, SyntaxError> {
        match self.advance() {
            Some(t) => match t.kind {
                TokenKind::IF => self.parse_if_stmt(t.pos),
                TokenKind::WHILE => self.parse_while_stmt(t.pos),
                TokenKind::FUNC => self.parse_function(),
                _ => Err(SyntaxError::at_token(t, ErrorMsg::UnexpectedToken)),
            },
            None => Err(SyntaxError::end_of_input()),
        }
    }

    fn parse_stmt(&mut self) -> Result<Item, SyntaxError> {
        let Some(&t) = self.stream.peek() else {
            return Err(SyntaxError::end_of_input());
        };
        let kind = match t.kind {
            TokenKind::BREAK => ControlKind::Break,
            TokenKind::CONTINUE => ControlKind::Continue,
            TokenKind::RETURN => ControlKind::Return,
            _ => return Ok(Item::ExprStmt(self.parse_expr()?)),
        };
        // Consume the keyword
        self.advance();
        let value = if kind == ControlKind::Return
            && self
                .stream
                .peek()
                .filter(|t| !matches!(t.kind, TokenKind::SEMICOLON | TokenKind::RBRACE))
                .is_some()
        {
            Some(self.parse_expr()?)
        } else {
            None
        };

        Ok(Item::ControlFlow {
            kind,
            value,
            pos: t.pos,
        })
    }

    /// `if a {..} else if b {..} else {..}` is collected as a flat list
    /// of branches, then folded right-to-left so that every `else if`
    /// becomes the only statement of the previous branch's else body.
    fn parse_if_stmt(&mut self, pos: Pos) -> Result<Item, SyntaxError> {
        let condition = self.parse_expr()?;
        let then_body = self.parse_block()?;

        let mut branches = vec![];
        while let Some(t) = self.advance_if(|t| t.kind == TokenKind::ELSE_IF) {
            let condition = self.parse_expr()?;
            branches.push((condition, self.parse_block()?, t.pos));
        }
        let else_body = if self.advance_if(|t| t.kind == TokenKind::ELSE).is_some() {
            Some(self.parse_block()?)
        } else {
            None
        };

        let else_body = branches
            .into_iter()
            .rev()
            .fold(else_body, |else_body, (condition, then_body, pos)| {
                Some(vec![Item::IfStmt {
                    condition,
                    then_body,
                    else_body,
                    pos,
                }])
            });

        Ok(Item::IfStmt {
            condition,
            then_body,
            else_body,
            pos,
        })
    }

    fn parse_while_stmt(&mut self, pos: Pos) -> Result<Item, SyntaxError> {
        let condition = self.parse_expr()?;
        Ok(Item::WhileStmt {
            condition,
            body: self.parse_block()?,
            pos,
        })
    }

    fn parse_function(&mut self) -> Result<Item, SyntaxError> {
        let name = self.advance_or_err(TokenKind::IDENT, ErrorMsg::InvalidIdent)?;
        self.advance_or_err(TokenKind::LPAREN, ErrorMsg::MissingOpeningParen)?;
        let mut params = vec![];
        while self
            .stream
            .peek()
            .filter(|t| t.kind == TokenKind::RPAREN)
            .is_none()
        {
            let param = self.advance_or_err(TokenKind::IDENT, ErrorMsg::InvalidIdent)?;
            let param = Ident::new(param.lexeme.clone(), param.pos);
            if param.is_global() {
                return Err(SyntaxError::new(
                    param.pos,
                    ErrorMsg::GlobalParam,
                    format!("`{param}`"),
                ));
            }
            params.push(param);
            if self.advance_if(|t| t.kind == TokenKind::COMMA).is_none() {
                break;
            }
        }
        self.advance_or_err(TokenKind::RPAREN, ErrorMsg::MissingClosingParen)?;
        let body = self.parse_block()?;

        Ok(Item::Function(Rc::new(Function {
            ident: Ident::new(name.lexeme.clone(), name.pos),
            params,
            body,
        })))
    }

    fn parse_block(&mut self) -> Result<Vec<Item>, SyntaxError> {
        let brace = self.advance_or_err(TokenKind::LBRACE, ErrorMsg::MissingOpeningBrace)?;
        self.enter(brace.pos)?;
        let items = self.parse_statements()?;
        self.leave();
        self.advance_or_err(TokenKind::RBRACE, ErrorMsg::MissingClosingBrace)?;
        Ok(items)
    }

    fn parse_expr(&mut self) -> Result<Expr, SyntaxError> {
        self.parse_logical_or()
    }

    fn parse_logical_or(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_logical_and()?;
        while let Some((op, pos)) = self.advance_op(|k| match k {
            TokenKind::OR_OR => LogicalOp::from_token(k),
            _ => None,
        }) {
            let rhs = self.parse_logical_and()?;
            lhs = Expr::Logical {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
                pos,
            };
        }
        Ok(lhs)
    }

    fn parse_logical_and(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_comparison()?;
        while let Some((op, pos)) = self.advance_op(|k| match k {
            TokenKind::AND_AND => LogicalOp::from_token(k),
            _ => None,
        }) {
            let rhs = self.parse_comparison()?;
            lhs = Expr::Logical {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
                pos,
            };
        }
        Ok(lhs)
    }

    /// Every relational operator after the first extends the same chain,
    /// so `a > b > c` is one node. A parenthesized comparison reaches
    /// this level as an ordinary operand and starts a fresh chain.
    fn parse_comparison(&mut self) -> Result<Expr, SyntaxError> {
        let first = self.parse_term()?;
        let Some((op, pos)) = self.advance_op(CmpOp::from_token) else {
            return Ok(first);
        };
        let mut operands = vec![first, self.parse_term()?];
        let mut ops = vec![op];
        while let Some((op, _)) = self.advance_op(CmpOp::from_token) {
            ops.push(op);
            operands.push(self.parse_term()?);
        }
        Ok(Expr::Comparison { operands, ops, pos })
    }

    fn parse_term(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_factor()?;
        while let Some((op, pos)) = self.advance_op(|k| match k {
            TokenKind::PLUS | TokenKind::MINUS => BinOp::from_token(k),
            _ => None,
        }) {
            let rhs = self.parse_factor()?;
            lhs = Expr::Binary {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
                pos,
            };
        }
        Ok(lhs)
    }

    fn parse_factor(&mut self) -> Result<Expr, SyntaxError> {
        let mut lhs = self.parse_unary()?;
        while let Some((op, pos)) = self.advance_op(|k| match k {
            TokenKind::STAR | TokenKind::SLASH | TokenKind::SLASH_SLASH | TokenKind::PERCENT => {
                BinOp::from_token(k)
            }
            _ => None,
        }) {
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary {
                lhs: Box::new(lhs),
                op,
                rhs: Box::new(rhs),
                pos,
            };
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, SyntaxError> {
        if let Some((op, pos)) = self.advance_op(UnaryOp::from_token) {
            self.enter(pos)?;
            let expr = self.parse_unary()?;
            self.leave();
            return Ok(Expr::Unary {
                op,
                expr: Box::new(expr),
                pos,
            });
        }
        self.parse_power()
    }

    /// `^` is right-associative and binds tighter than unary operators
    /// on its left, but its right operand may itself be unary: `2^-2`.
    fn parse_power(&mut self) -> Result<Expr, SyntaxError> {
        let base = self.parse_primary()?;
        match self.advance_op(|k| match k {
            TokenKind::CARET => BinOp::from_token(k),
            _ => None,
        }) {
            Some((op, pos)) => {
                self.enter(pos)?;
                let exponent = self.parse_unary()?;
                self.leave();
                Ok(Expr::Binary {
                    lhs: Box::new(base),
                    op,
                    rhs: Box::new(exponent),
                    pos,
                })
            }
            None => Ok(base),
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, SyntaxError> {
        let Some(t) = self.advance() else {
            return Err(SyntaxError::end_of_input());
        };
        match t.kind {
            TokenKind::INT | TokenKind::FLOAT | TokenKind::STRING => match &t.literal {
                Some(value) => Ok(Expr::Literal {
                    value: value.clone(),
                    pos: t.pos,
                }),
                None => Err(SyntaxError::at_token(t, ErrorMsg::UnexpectedToken)),
            },
            TokenKind::LPAREN => self.parse_group(t.pos),
            TokenKind::IDENT => {
                let ident = Ident::new(t.lexeme.clone(), t.pos);
                match self.stream.peek() {
                    Some(&n) if n.kind == TokenKind::LPAREN => self.parse_func_call(ident),
                    Some(&n) if n.kind.is_assignment() => self.parse_assignment(ident),
                    _ => Ok(Expr::Ident(ident)),
                }
            }
            _ => Err(SyntaxError::at_token(t, ErrorMsg::UnexpectedToken)),
        }
    }

    /// An identifier directly followed by an assignment operator starts
    /// an assignment whose value extends as far right as possible, so
    /// `1 == a = 10 == 10` assigns `10 == 10` to `a`. Compound forms are
    /// desugared here: `a += 1` becomes `a = a + 1`.
    fn parse_assignment(&mut self, target: Ident) -> Result<Expr, SyntaxError> {
        let Some(eq) = self.advance() else {
            return Err(SyntaxError::end_of_input());
        };
        self.enter(eq.pos)?;
        let rhs = self.parse_expr()?;
        self.leave();
        let value = match BinOp::from_compound_assignment(eq.kind) {
            Some(op) => Expr::Binary {
                lhs: Box::new(Expr::Ident(target.clone())),
                op,
                rhs: Box::new(rhs),
                pos: eq.pos,
            },
            None => rhs,
        };
        Ok(Expr::Assignment {
            pos: target.pos,
            target,
            value: Box::new(value),
        })
    }

    fn parse_func_call(&mut self, callee: Ident) -> Result<Expr, SyntaxError> {
        // Consume the opening parenthesis
        self.advance();
        let mut args = vec![];
        if self.advance_if(|t| t.kind == TokenKind::RPAREN).is_none() {
            self.enter(callee.pos)?;
            loop {
                args.push(self.parse_expr()?);
                if self.advance_if(|t| t.kind == TokenKind::COMMA).is_none() {
                    break;
                }
            }
            self.leave();
            self.advance_or_err(TokenKind::RPAREN, ErrorMsg::MissingClosingParen)?;
        }
        Ok(Expr::Call {
            pos: callee.pos,
            callee,
            args,
        })
    }

    fn parse_group(&mut self, pos: Pos) -> Result<Expr, SyntaxError> {
        self.enter(pos)?;
        let expr = self.parse_expr()?;
        self.leave();
        self.advance_or_err(TokenKind::RPAREN, ErrorMsg::MissingClosingParen)?;
        Ok(expr)
    }

    /// Every recursive descent goes through here, so that pathological
    /// input fails with an error instead of exhausting the stack. An
    /// error abandons the parse, so only the success path calls
    /// [`Parser::leave`].
    fn enter(&mut self, pos: Pos) -> Result<(), SyntaxError> {
        if self.depth >= MAX_NESTING {
            return Err(SyntaxError::new(pos, ErrorMsg::TooDeeplyNested, ""));
        }
        self.depth += 1;
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn advance(&mut self) -> Option<&'a Token> {
        self.stream.next()
    }

    fn advance_if<F>(&mut self, cond: F) -> Option<&'a Token>
    where
        F: FnOnce(&Token) -> bool,
    {
        if self.stream.peek().filter(|&&t| cond(t)).is_some() {
            self.advance()
        } else {
            None
        }
    }

    /// Consume the next token if `from_token` maps it to an operator.
    fn advance_op<T, F>(&mut self, from_token: F) -> Option<(T, Pos)>
    where
        F: FnOnce(TokenKind) -> Option<T>,
    {
        let op = self.stream.peek().and_then(|t| from_token(t.kind))?;
        self.advance().map(|t| (op, t.pos))
    }

    fn advance_or_err(&mut self, kind: TokenKind, msg: ErrorMsg) -> Result<&'a Token, SyntaxError> {
        match self.stream.peek() {
            Some(&t) if t.kind == kind => {
                self.advance();
                Ok(t)
            }
            Some(&t) => Err(SyntaxError::at_token(t, msg)),
            None => Err(SyntaxError::end_of_input()),
        }
    }
}
