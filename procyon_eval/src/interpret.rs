use std::{
    cell::RefCell,
    fmt::Debug,
    fs,
    io::{self, BufRead, Write},
    path::Path,
    rc::Rc,
};

use log::{debug, trace};
use procyon_syntax::{
    ast::{CmpOp, ControlKind, Expr, Function, Ident, Item, LogicalOp, UnaryOp},
    token::Pos,
};

use crate::{
    environment::Env,
    error::{ControlSignal, Error, Exception, SignalKind},
    ops, stdlib,
    types::{Callable, Func, Value},
};

/// Deepest chain of nested user function calls before evaluation gives
/// up with a recursion error.
pub const MAX_CALL_DEPTH: usize = 200;

pub struct Interpreter {
    pub globals: Rc<RefCell<Env>>,
    env: Rc<RefCell<Env>>,
    depth: usize,
    /// `None` reads from the process stdin.
    input: Option<Box<dyn BufRead>>,
    pub(crate) output: Box<dyn Write>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("globals", &self.globals)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Env::new();
        Self {
            env: Rc::clone(&globals),
            globals,
            depth: 0,
            input: None,
            output: Box::new(io::stdout()),
        }
    }

    /// An interpreter reading `input_*` answers from `input` and
    /// writing `print` output and prompts to `output`.
    pub fn with_io(input: impl BufRead + 'static, output: impl Write + 'static) -> Self {
        Self {
            input: Some(Box::new(input)),
            output: Box::new(output),
            ..Self::new()
        }
    }

    /// Drop every binding and start over from the built-in constants.
    pub fn clear(&mut self) {
        debug!("Clearing interpreter state");
        self.globals = Env::new();
        self.env = Rc::clone(&self.globals);
        self.depth = 0;
    }

    /// Evaluate a program, yielding the value of each top-level
    /// statement.
    pub fn evaluate(&mut self, source: &str, clear_state: bool) -> Result<Vec<Value>, Error> {
        self.evaluate_with_last(source, clear_state, None)
    }

    /// As [`Interpreter::evaluate`], binding `_` to `last` first.
    pub fn evaluate_with_last(
        &mut self,
        source: &str,
        clear_state: bool,
        last: Option<Value>,
    ) -> Result<Vec<Value>, Error> {
        if source.trim().is_empty() {
            return Ok(vec![]);
        }
        let root = crate::parse(source)?;
        if clear_state {
            self.clear();
        }
        if let Some(last) = last {
            self.globals.borrow_mut().set("_", last);
        }
        self.interpret_all(&root.items)
    }

    pub fn evaluate_expression(&mut self, source: &str) -> Result<Value, Error> {
        trace!("Parsing expression {source}");
        let expr = procyon_syntax::parse_expression(source)?;
        let result = self.interpret_expr(&expr);
        if result.is_err() {
            self.reset_frames();
        }
        Ok(result?)
    }

    pub fn evaluate_file(
        &mut self,
        path: impl AsRef<Path>,
        clear_state: bool,
    ) -> Result<Vec<Value>, Error> {
        let path = path.as_ref();
        debug!("Evaluating file {}", path.display());
        let source = fs::read_to_string(path)?;
        self.evaluate(&source, clear_state)
    }

    pub fn interpret_all(&mut self, items: &[Item]) -> Result<Vec<Value>, Error> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            match self.interpret_item(item) {
                Ok(value) => values.push(value),
                Err(exception) => {
                    self.reset_frames();
                    return Err(exception.into());
                }
            }
        }
        Ok(values)
    }

    /// Return to the global frame after an evaluation was cut short.
    fn reset_frames(&mut self) {
        self.env = Rc::clone(&self.globals);
        self.depth = 0;
    }

    pub(crate) fn read_line(&mut self, prompt: &str) -> Result<String, Error> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        let read = match self.input.as_mut() {
            Some(input) => input.read_line(&mut line)?,
            None => io::stdin().read_line(&mut line)?,
        };
        if read == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "end of input").into());
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(line)
    }

    fn interpret_block(&mut self, items: &[Item]) -> Result<(), Exception> {
        for item in items {
            self.interpret_item(item)?;
        }
        Ok(())
    }

    fn interpret_item(&mut self, item: &Item) -> Result<Value, Exception> {
        match item {
            Item::ExprStmt(expr) => self.interpret_expr(expr),
            Item::IfStmt {
                condition,
                then_body,
                else_body,
                ..
            } => self.interpret_if_stmt(condition, then_body, else_body.as_deref()),
            Item::WhileStmt { condition, body, .. } => self.interpret_while_stmt(condition, body),
            Item::Function(decl) => self.interpret_function(decl),
            Item::ControlFlow { kind, value, pos } => {
                self.interpret_control_flow(*kind, value.as_ref(), *pos)
            }
        }
    }

    fn interpret_if_stmt(
        &mut self,
        condition: &Expr,
        then_body: &[Item],
        else_body: Option<&[Item]>,
    ) -> Result<Value, Exception> {
        if self.interpret_expr(condition)?.is_truthy() {
            self.interpret_block(then_body)?;
        } else if let Some(else_body) = else_body {
            self.interpret_block(else_body)?;
        }
        Ok(Value::None)
    }

    fn interpret_while_stmt(
        &mut self,
        condition: &Expr,
        body: &[Item],
    ) -> Result<Value, Exception> {
        while self.interpret_expr(condition)?.is_truthy() {
            match self.interpret_block(body) {
                Err(Exception::Signal(ControlSignal {
                    kind: SignalKind::Break,
                    ..
                })) => break,
                Err(Exception::Signal(ControlSignal {
                    kind: SignalKind::Continue,
                    ..
                }))
                | Ok(()) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(Value::None)
    }

    fn interpret_function(&mut self, decl: &Rc<Function>) -> Result<Value, Exception> {
        let ident = &decl.ident;
        if stdlib::is_builtin(&ident.name) {
            return Err(Error::type_error(
                ident.pos,
                format!("cannot redefine built-in function \"{ident}\""),
            )
            .into());
        }
        if let Some(param) = decl.params.iter().find(|p| stdlib::is_builtin(&p.name)) {
            return Err(Error::type_error(
                param.pos,
                format!("cannot use built-in function name \"{param}\" as a parameter"),
            )
            .into());
        }
        debug!("Define {decl}");
        self.bind(ident, Value::Func(Func::new(Rc::clone(decl))));
        Ok(Value::None)
    }

    fn interpret_control_flow(
        &mut self,
        kind: ControlKind,
        value: Option<&Expr>,
        pos: Pos,
    ) -> Result<Value, Exception> {
        let value = match value {
            Some(expr) => Some(self.interpret_expr(expr)?),
            None => None,
        };
        Err(Exception::Signal(ControlSignal::new(kind.into(), value, pos)))
    }

    fn interpret_expr(&mut self, expr: &Expr) -> Result<Value, Exception> {
        match expr {
            Expr::Literal { value, .. } => Ok(Value::from(value)),
            Expr::Ident(ident) => self.interpret_ident(ident),
            Expr::Unary { op, expr, pos } => self.interpret_unary(*op, expr, *pos),
            Expr::Binary { .. } => self.interpret_binary(expr),
            Expr::Logical { .. } => self.interpret_logical(expr),
            Expr::Assignment { target, value, .. } => self.interpret_assignment(target, value),
            Expr::Comparison { operands, ops, pos } => {
                self.interpret_comparison(operands, ops, *pos)
            }
            Expr::Call { callee, args, pos } => self.interpret_func_call(callee, args, *pos),
        }
    }

    /// The frame a name lives in: the root for `$` names, otherwise the
    /// current frame.
    fn frame_for(&self, ident: &Ident) -> &Rc<RefCell<Env>> {
        if ident.is_global() {
            &self.globals
        } else {
            &self.env
        }
    }

    fn bind(&mut self, ident: &Ident, value: Value) {
        self.frame_for(ident).borrow_mut().set(&ident.name, value);
    }

    fn lookup(&self, ident: &Ident) -> Option<Value> {
        self.frame_for(ident).borrow().get(&ident.name)
    }

    fn interpret_ident(&mut self, ident: &Ident) -> Result<Value, Exception> {
        if stdlib::is_builtin(&ident.name) {
            return Err(Error::type_error(
                ident.pos,
                format!("cannot use built-in function \"{ident}\" as a variable"),
            )
            .into());
        }
        self.lookup(ident)
            .ok_or_else(|| Error::name(ident.pos, format!("unknown identifier \"{ident}\"")).into())
    }

    fn interpret_assignment(&mut self, target: &Ident, value: &Expr) -> Result<Value, Exception> {
        if stdlib::is_builtin(&target.name) {
            return Err(Error::type_error(
                target.pos,
                format!("cannot assign to built-in function \"{target}\""),
            )
            .into());
        }
        let value = self.interpret_expr(value)?;
        self.bind(target, value.clone());
        Ok(value)
    }

    fn interpret_unary(&mut self, op: UnaryOp, expr: &Expr, pos: Pos) -> Result<Value, Exception> {
        let value = self.interpret_expr(expr)?;
        match op {
            UnaryOp::Bang => Ok(Value::from_bool(!value.is_truthy())),
            UnaryOp::Minus => Ok(ops::negate(value, pos)?),
        }
    }

    /// `1 + 2 + 3` leans left, so the operators are collected down the
    /// left spine and applied on the way back up instead of recursing
    /// once per operator.
    fn interpret_binary(&mut self, expr: &Expr) -> Result<Value, Exception> {
        let mut spine = vec![];
        let mut leftmost = expr;
        while let Expr::Binary { lhs, op, rhs, pos } = leftmost {
            spine.push((*op, rhs.as_ref(), *pos));
            leftmost = lhs;
        }
        let mut value = self.interpret_expr(leftmost)?;
        for (op, rhs, pos) in spine.into_iter().rev() {
            let rhs = self.interpret_expr(rhs)?;
            value = ops::binary(op, value, rhs, pos)?;
        }
        Ok(value)
    }

    /// Same left spine walk as [`Interpreter::interpret_binary`]. A
    /// right operand is only evaluated when the result so far does not
    /// already decide it.
    fn interpret_logical(&mut self, expr: &Expr) -> Result<Value, Exception> {
        let mut spine = vec![];
        let mut leftmost = expr;
        while let Expr::Logical { lhs, op, rhs, .. } = leftmost {
            spine.push((*op, rhs.as_ref()));
            leftmost = lhs;
        }
        let mut holds = self.interpret_expr(leftmost)?.is_truthy();
        for (op, rhs) in spine.into_iter().rev() {
            holds = match (op, holds) {
                (LogicalOp::Or, true) => true,
                (LogicalOp::And, false) => false,
                _ => self.interpret_expr(rhs)?.is_truthy(),
            };
        }
        Ok(Value::from_bool(holds))
    }

    fn interpret_comparison(
        &mut self,
        operands: &[Expr],
        ops: &[CmpOp],
        pos: Pos,
    ) -> Result<Value, Exception> {
        if ops.is_empty() || operands.len() != ops.len() + 1 {
            return Err(Error::Internal(format!("malformed comparison chain at {pos}")).into());
        }
        // Every operand is evaluated, even once the outcome is settled
        let values = operands
            .iter()
            .map(|operand| self.interpret_expr(operand))
            .collect::<Result<Vec<_>, _>>()?;
        let mut holds = true;
        for (pair, op) in values.windows(2).zip(ops) {
            holds &= ops::compare(*op, &pair[0], &pair[1], pos)?;
        }
        Ok(Value::from_bool(holds))
    }

    fn interpret_func_call(
        &mut self,
        callee: &Ident,
        arg_exprs: &[Expr],
        pos: Pos,
    ) -> Result<Value, Exception> {
        let func: Box<dyn Callable> = match self.lookup(callee) {
            Some(Value::Func(f)) => Box::new(f),
            Some(value) => {
                return Err(Error::type_error(
                    pos,
                    format!("\"{callee}\" is not a function but {}", value.repr()),
                )
                .into())
            }
            None => match stdlib::lookup(&callee.name) {
                Some(native) => Box::new(*native),
                None => {
                    return Err(Error::name(pos, format!("unknown function \"{callee}\"")).into())
                }
            },
        };
        // Ensure the number of arguments matches the function definition
        let arity = func.arity();
        if !arity.accepts(arg_exprs.len()) {
            return Err(Error::type_error(
                pos,
                format!(
                    "{}() takes {arity} argument(s) but {} were given",
                    func.name(),
                    arg_exprs.len()
                ),
            )
            .into());
        }
        let args = arg_exprs
            .iter()
            .map(|arg| self.interpret_expr(arg))
            .collect::<Result<Vec<_>, _>>()?;
        debug!("Call {}({args:?})", func.name());
        func.call(self, args, pos)
    }

    pub(crate) fn call_func(
        &mut self,
        func: &Func,
        args: Vec<Value>,
        pos: Pos,
    ) -> Result<Value, Exception> {
        if self.depth >= MAX_CALL_DEPTH {
            return Err(Error::Recursion {
                pos,
                depth: MAX_CALL_DEPTH,
            }
            .into());
        }
        // The frame hangs off the globals, never off the caller
        let frame = Env::with_parent(Rc::clone(&self.globals));
        for (param, value) in func.decl.params.iter().zip(args) {
            frame.borrow_mut().set(&param.name, value);
        }
        let old_env = std::mem::replace(&mut self.env, frame);
        self.depth += 1;
        let res = self.interpret_block(&func.decl.body);
        self.depth -= 1;
        // Restore the env
        self.env = old_env;

        match res {
            Ok(()) => Ok(Value::None),
            Err(Exception::Signal(ControlSignal {
                kind: SignalKind::Return,
                value,
                ..
            })) => Ok(value.unwrap_or(Value::None)),
            Err(Exception::Signal(signal)) if signal.kind != SignalKind::Abort => {
                Err(Error::Misuse(signal).into())
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use procyon_syntax::ast::{BinOp, Literal};

    use super::*;

    fn int(value: i64) -> Expr {
        Expr::Literal {
            value: Literal::Int(value),
            pos: Pos::default(),
        }
    }

    fn ident(name: &str) -> Ident {
        Ident::new(name, Pos::default())
    }

    fn assign(name: &str, value: Expr) -> Item {
        Item::ExprStmt(Expr::Assignment {
            target: ident(name),
            value: Box::new(value),
            pos: Pos::default(),
        })
    }

    fn control(kind: ControlKind) -> Item {
        Item::ControlFlow {
            kind,
            value: None,
            pos: Pos::default(),
        }
    }

    #[test]
    fn if_stmt() {
        let mut interpreter = Interpreter::new();
        let then_body = vec![assign("x", int(1))];
        let else_body = vec![assign("x", int(2))];
        assert!(interpreter
            .interpret_if_stmt(&int(0), &then_body, Some(else_body.as_slice()))
            .is_ok());
        assert_eq!(interpreter.lookup(&ident("x")), Some(Value::Int(2)));
    }

    #[test]
    fn while_stmt() {
        let mut interpreter = Interpreter::new();
        let body = vec![assign("x", int(1))];
        assert!(interpreter.interpret_while_stmt(&int(0), &body).is_ok());
        assert_eq!(interpreter.lookup(&ident("x")), None);
    }

    #[test]
    fn while_catches_break() {
        let mut interpreter = Interpreter::new();
        let body = vec![assign("x", int(1)), control(ControlKind::Break)];
        assert_eq!(
            interpreter.interpret_while_stmt(&int(1), &body).unwrap(),
            Value::None
        );
        assert_eq!(interpreter.lookup(&ident("x")), Some(Value::Int(1)));
    }

    #[test]
    fn block_does_not_create_frame() {
        let mut interpreter = Interpreter::new();
        let then_body = vec![assign("x", int(5))];
        interpreter
            .interpret_if_stmt(&int(1), &then_body, None)
            .unwrap();
        assert_eq!(interpreter.globals.borrow().get("x"), Some(Value::Int(5)));
    }

    #[test]
    fn expr() {
        let mut interpreter = Interpreter::new();

        // Identifier
        interpreter.globals.borrow_mut().set("x", Value::Int(5));
        let result = interpreter.interpret_expr(&Expr::Ident(ident("x")));
        assert_eq!(result.unwrap(), Value::Int(5));

        // Unary minus
        let result = interpreter.interpret_expr(&Expr::Unary {
            op: UnaryOp::Minus,
            expr: Box::new(int(10)),
            pos: Pos::default(),
        });
        assert_eq!(result.unwrap(), Value::Int(-10));

        // Unary bang
        let result = interpreter.interpret_expr(&Expr::Unary {
            op: UnaryOp::Bang,
            expr: Box::new(int(0)),
            pos: Pos::default(),
        });
        assert_eq!(result.unwrap(), Value::Int(1));

        // Addition
        let result = interpreter.interpret_expr(&Expr::Binary {
            lhs: Box::new(int(10)),
            op: BinOp::Plus,
            rhs: Box::new(int(20)),
            pos: Pos::default(),
        });
        assert_eq!(result.unwrap(), Value::Int(30));

        // Chained comparison
        let result = interpreter.interpret_expr(&Expr::Comparison {
            operands: vec![int(1), int(2), int(2)],
            ops: vec![CmpOp::Less, CmpOp::LessEqual],
            pos: Pos::default(),
        });
        assert_eq!(result.unwrap(), Value::Int(1));

        // Logical or short-circuits past an unknown name
        let result = interpreter.interpret_expr(&Expr::Logical {
            lhs: Box::new(int(3)),
            op: LogicalOp::Or,
            rhs: Box::new(Expr::Ident(ident("missing"))),
            pos: Pos::default(),
        });
        assert_eq!(result.unwrap(), Value::Int(1));
    }

    #[test]
    fn left_leaning_runs() {
        let mut interpreter = Interpreter::new();
        let binary = |lhs, op, rhs| Expr::Binary {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
            pos: Pos::default(),
        };
        let logical = |lhs, op, rhs| Expr::Logical {
            lhs: Box::new(lhs),
            op,
            rhs: Box::new(rhs),
            pos: Pos::default(),
        };
        let missing = || Expr::Ident(ident("missing"));

        // (10 - 2) - 3 * 2
        let expr = binary(
            binary(int(10), BinOp::Minus, int(2)),
            BinOp::Minus,
            binary(int(3), BinOp::Star, int(2)),
        );
        assert_eq!(interpreter.interpret_expr(&expr).unwrap(), Value::Int(2));

        // (0 && missing) || 1
        let expr = logical(
            logical(int(0), LogicalOp::And, missing()),
            LogicalOp::Or,
            int(1),
        );
        assert_eq!(interpreter.interpret_expr(&expr).unwrap(), Value::Int(1));

        // (1 || missing) && missing
        let expr = logical(
            logical(int(1), LogicalOp::Or, missing()),
            LogicalOp::And,
            missing(),
        );
        assert!(matches!(
            interpreter.interpret_expr(&expr),
            Err(Exception::Error(Error::Name { .. }))
        ));
    }

    #[test]
    fn malformed_comparison_is_internal_error() {
        let mut interpreter = Interpreter::new();
        let result = interpreter.interpret_expr(&Expr::Comparison {
            operands: vec![int(1)],
            ops: vec![CmpOp::Less],
            pos: Pos::default(),
        });
        assert!(matches!(
            result,
            Err(Exception::Error(Error::Internal(_)))
        ));
    }

    #[test]
    fn call_depth_is_capped() {
        let mut interpreter = Interpreter::new();
        interpreter.depth = MAX_CALL_DEPTH;
        let func = Func::new(Rc::new(Function {
            ident: ident("f"),
            params: vec![],
            body: vec![],
        }));
        assert!(matches!(
            interpreter.call_func(&func, vec![], Pos::default()),
            Err(Exception::Error(Error::Recursion { .. }))
        ));
    }

    #[test]
    fn break_at_function_boundary_is_misuse() {
        let mut interpreter = Interpreter::new();
        let func = Func::new(Rc::new(Function {
            ident: ident("f"),
            params: vec![],
            body: vec![control(ControlKind::Break)],
        }));
        assert!(matches!(
            interpreter.call_func(&func, vec![], Pos::default()),
            Err(Exception::Error(Error::Misuse(_)))
        ));
        assert_eq!(interpreter.depth, 0);
    }
}
