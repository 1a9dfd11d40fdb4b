//! Tree-walking evaluator. One `Interpreter` is long-lived; `interpret`
//! may be called repeatedly against independent source fragments sharing
//! the same global scope, which is the REPL usage pattern this whole
//! pipeline exists to serve.

pub mod builtins;
pub mod iter;
pub mod object;
pub mod scope;
pub mod signal;

use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::ast::{
    BinaryExpr, BinaryOp, BlockStmt, CallExpr, Expr, ForStmt, FunctionDeclaration, IfStmt,
    LogicalExpr, LogicalOp, Program, Stmt, UnaryExpr, UnaryOp, VarStmt, WhileStmt,
};
use crate::diagnostics::{Error, ErrorList};
use crate::span::Span;

use object::{FunctionValue, Value};
use scope::ScopeHandle;
use signal::{EvalResult, ExecResult, Signal};

/// Process-wide, set by a Ctrl-C handler the CLI binary installs once.
/// Consulted before each top-level statement and each `while` iteration.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

pub fn request_interrupt() {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

fn take_interrupt() -> bool {
    INTERRUPTED.swap(false, Ordering::SeqCst)
}

pub struct Interpreter {
    current_scope: ScopeHandle,
    globals: ScopeHandle,
    current_source: Rc<str>,
    /// REPL mode: `ExpressionStmt` results are echoed to stdout.
    print_expr_statements: bool,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = scope::new_scope(None);
        builtins::install(&globals);
        Self {
            current_scope: Rc::clone(&globals),
            globals,
            current_source: Rc::from(""),
            print_expr_statements: false,
        }
    }

    pub fn set_print_expr_statements(&mut self, on: bool) {
        self.print_expr_statements = on;
    }

    /// Executes `program`, whose text is `source`. Updates `current_source`
    /// first so diagnostics raised during this call attribute to the right
    /// REPL fragment. Returns accumulated errors; on success or on a
    /// `break`/`continue`/`return`/interrupt escaping the program body, the
    /// interpreter's scope is guaranteed to be back at `globals`.
    pub fn interpret(&mut self, program: &Program, source: Rc<str>) -> Result<(), ErrorList> {
        self.current_source = source;
        self.current_scope = Rc::clone(&self.globals);

        for stmt in &program.stmts {
            if let Err(signal) = self.check_interrupt() {
                self.handle_interrupt(signal);
                break;
            }
            match self.exec(stmt) {
                Ok(()) => {}
                Err(Signal::Error(e)) => {
                    let mut errors = ErrorList::new();
                    errors.push(e);
                    self.current_scope = Rc::clone(&self.globals);
                    return Err(errors);
                }
                // break/continue/return escaping the whole program: silently
                // unwind, per the open question this behavior resolves.
                Err(Signal::Break | Signal::Continue | Signal::Return(_)) => break,
                Err(Signal::Interrupt) => {
                    eprintln!("interrupt");
                    break;
                }
            }
        }
        self.current_scope = Rc::clone(&self.globals);
        Ok(())
    }

    fn check_interrupt(&self) -> ExecResult {
        if take_interrupt() {
            Err(Signal::Interrupt)
        } else {
            Ok(())
        }
    }

    fn handle_interrupt(&self, signal: Signal) {
        debug_assert!(matches!(signal, Signal::Interrupt));
        eprintln!("interrupt");
    }

    fn push_child_scope(&mut self) -> ScopeHandle {
        let previous = Rc::clone(&self.current_scope);
        self.current_scope = scope::new_scope(Some(Rc::clone(&previous)));
        previous
    }

    fn push_scope_with_parent(&mut self, parent: ScopeHandle) -> ScopeHandle {
        let previous = Rc::clone(&self.current_scope);
        self.current_scope = scope::new_scope(Some(parent));
        previous
    }

    fn restore_scope(&mut self, previous: ScopeHandle) {
        self.current_scope = previous;
    }

    // --- statement execution -------------------------------------------

    fn exec(&mut self, stmt: &Stmt) -> ExecResult {
        match stmt {
            Stmt::Expression(s) => self.exec_expression_stmt(&s.expr),
            Stmt::Assert(s) => self.exec_assert(&s.expr, &s.span),
            Stmt::Var(s) => self.exec_var(s),
            Stmt::Assign(s) => self.exec_assign(s),
            Stmt::Block(s) => self.exec_block_scoped(s),
            Stmt::If(s) => self.exec_if(s),
            Stmt::While(s) => self.exec_while(s),
            Stmt::For(s) => self.exec_for(s),
            Stmt::Break(_) => Err(Signal::Break),
            Stmt::Continue(_) => Err(Signal::Continue),
            Stmt::FunctionDeclaration(s) => self.exec_function_declaration(s),
            Stmt::Return(s) => {
                let value = match &s.expr {
                    Some(e) => self.eval(e)?,
                    None => Value::Nil,
                };
                Err(Signal::Return(value))
            }
        }
    }

    fn exec_expression_stmt(&mut self, expr: &Expr) -> ExecResult {
        let value = self.eval(expr)?;
        if self.print_expr_statements {
            println!("{}", value.to_echo_string());
        }
        Ok(())
    }

    fn exec_assert(&mut self, expr: &Expr, span: &Span) -> ExecResult {
        let value = self.eval(expr)?;
        match value {
            Value::Bool(true) => Ok(()),
            Value::Bool(false) => Err(self.error("assertion failed", span.clone())),
            other => Err(self.error(format!("expected 'Bool', got '{}'", other.type_name()), span.clone())),
        }
    }

    fn exec_var(&mut self, stmt: &VarStmt) -> ExecResult {
        let value = match &stmt.init {
            Some(init) => self.eval(init)?,
            None => Value::Nil,
        };
        scope::define(&self.current_scope, &stmt.name.name, value);
        Ok(())
    }

    fn exec_assign(&mut self, stmt: &crate::ast::AssignStmt) -> ExecResult {
        let value = self.eval(&stmt.value)?;
        match stmt.place.hops.get() {
            Some(hops) => {
                scope::set_resolved(&self.current_scope, &stmt.place.name, hops, value);
                Ok(())
            }
            None => {
                if scope::set_unresolved(&self.current_scope, &stmt.place.name, value) {
                    Ok(())
                } else {
                    Err(self.error(
                        format!("identifier '{}' is not defined", stmt.place.name),
                        stmt.place.span.clone(),
                    ))
                }
            }
        }
    }

    fn exec_block_scoped(&mut self, block: &BlockStmt) -> ExecResult {
        let previous = self.push_child_scope();
        let result = self.exec_block_body(block);
        self.restore_scope(previous);
        result
    }

    fn exec_block_body(&mut self, block: &BlockStmt) -> ExecResult {
        for stmt in &block.stmts {
            self.exec(stmt)?;
        }
        Ok(())
    }

    fn exec_if(&mut self, stmt: &IfStmt) -> ExecResult {
        let test = self.eval(&stmt.test)?;
        match test {
            Value::Bool(true) => self.exec(&stmt.then_block),
            Value::Bool(false) => match &stmt.else_block {
                Some(else_block) => self.exec(else_block),
                None => Ok(()),
            },
            other => Err(self.error(
                format!("expected 'Bool', got '{}'", other.type_name()),
                stmt.test.span(),
            )),
        }
    }

    fn exec_while(&mut self, stmt: &WhileStmt) -> ExecResult {
        loop {
            if let Err(signal) = self.check_interrupt() {
                self.handle_interrupt(signal);
                return Ok(());
            }
            let test = self.eval(&stmt.test)?;
            match test {
                Value::Bool(true) => {}
                Value::Bool(false) => return Ok(()),
                other => {
                    return Err(self.error(
                        format!("expected 'Bool', got '{}'", other.type_name()),
                        stmt.test.span(),
                    ))
                }
            }
            match self.exec_block_scoped(&stmt.body) {
                Ok(()) => {}
                Err(Signal::Break) => return Ok(()),
                Err(Signal::Continue) => continue,
                Err(other) => return Err(other),
            }
        }
    }

    fn exec_for(&mut self, stmt: &ForStmt) -> ExecResult {
        let iterable = self.eval(&stmt.iterable)?;
        if !iterable.is_iterable() {
            return Err(self.error(
                format!("'{}' is not iterable", iterable.type_name()),
                stmt.iterable.span(),
            ));
        }
        let mut it = iter::Iterator::for_value(&iterable)
            .expect("is_iterable() already confirmed this value has an iterator");

        while !it.done() {
            let Some(element) = it.next() else { break };
            let previous = self.push_child_scope();
            scope::define(&self.current_scope, &stmt.var.name, element);
            let result = self.exec_block_body(&stmt.body);
            self.restore_scope(previous);
            match result {
                Ok(()) => {}
                Err(Signal::Break) => return Ok(()),
                Err(Signal::Continue) => continue,
                Err(other) => return Err(other),
            }
        }
        Ok(())
    }

    fn exec_function_declaration(&mut self, decl: &FunctionDeclaration) -> ExecResult {
        let value = Value::Function(Rc::new(FunctionValue {
            func: Rc::clone(&decl.func),
            captured_scope: Rc::clone(&self.current_scope),
            defining_source: Rc::clone(&self.current_source),
        }));
        scope::define(&self.current_scope, &decl.name.name, value);
        Ok(())
    }

    // --- expression evaluation ------------------------------------------

    fn eval(&mut self, expr: &Expr) -> EvalResult {
        match expr {
            Expr::StringLiteral(e) => Ok(Value::string(e.value.clone())),
            Expr::NumberLiteral(e) => Ok(Value::Number(e.value)),
            Expr::BoolLiteral(e) => Ok(Value::Bool(e.value)),
            Expr::NilLiteral(_) => Ok(Value::Nil),
            Expr::Identifier(ident) => self.eval_identifier(ident),
            Expr::Unary(e) => self.eval_unary(e),
            Expr::Group(e) => self.eval(&e.expr),
            Expr::Binary(e) => self.eval_binary(e),
            Expr::Logical(e) => self.eval_logical(e),
            Expr::Call(e) => self.eval_call(e),
            Expr::Function(func) => Ok(Value::Function(Rc::new(FunctionValue {
                func: Rc::clone(func),
                captured_scope: Rc::clone(&self.current_scope),
                defining_source: Rc::clone(&self.current_source),
            }))),
        }
    }

    fn eval_identifier(&mut self, ident: &crate::ast::Identifier) -> EvalResult {
        match ident.hops.get() {
            Some(hops) => Ok(scope::get_resolved(&self.current_scope, &ident.name, hops)),
            None => scope::get_unresolved(&self.current_scope, &ident.name).ok_or_else(|| {
                self.error(format!("identifier '{}' is not defined", ident.name), ident.span.clone())
            }),
        }
    }

    fn eval_unary(&mut self, e: &UnaryExpr) -> EvalResult {
        let value = self.eval(&e.expr)?;
        match (e.op, &value) {
            (UnaryOp::Minus, Value::Number(n)) => Ok(Value::Number(-n)),
            (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
            (op, other) => Err(self.error(
                format!("cannot apply unary operator '{op}' to type '{}'", other.type_name()),
                e.span.clone(),
            )),
        }
    }

    fn eval_binary(&mut self, e: &BinaryExpr) -> EvalResult {
        let left = self.eval(&e.left)?;
        let right = self.eval(&e.right)?;
        self.apply_binary(e.op, left, right, &e.span)
    }

    fn apply_binary(&self, op: BinaryOp, left: Value, right: Value, span: &Span) -> EvalResult {
        use Value::*;
        match op {
            BinaryOp::Add => match (&left, &right) {
                (Number(a), Number(b)) => Ok(Number(a + b)),
                (String(a), String(b)) => Ok(Value::string(format!("{a}{b}"))),
                _ => Err(self.error(
                    format!("cannot add '{}' to '{}'", left.type_name(), right.type_name()),
                    span.clone(),
                )),
            },
            BinaryOp::Subtract => match (&left, &right) {
                (Number(a), Number(b)) => Ok(Number(a - b)),
                _ => Err(self.error(
                    format!("cannot subtract '{}' from '{}'", right.type_name(), left.type_name()),
                    span.clone(),
                )),
            },
            BinaryOp::Multiply => match (&left, &right) {
                (Number(a), Number(b)) => Ok(Number(a * b)),
                _ => Err(self.error(
                    format!("cannot multiply '{}' by '{}'", left.type_name(), right.type_name()),
                    span.clone(),
                )),
            },
            BinaryOp::Divide => match (&left, &right) {
                (Number(a), Number(b)) => Ok(Number(a / b)),
                _ => Err(self.error(
                    format!("cannot divide '{}' by '{}'", left.type_name(), right.type_name()),
                    span.clone(),
                )),
            },
            BinaryOp::Modulo => match (&left, &right) {
                (Number(a), Number(b)) => Ok(Number(ieee_remainder(*a, *b))),
                _ => Err(self.error(
                    format!("cannot divide '{}' by '{}'", left.type_name(), right.type_name()),
                    span.clone(),
                )),
            },
            BinaryOp::Equal | BinaryOp::NotEqual => {
                if left.type_name() != right.type_name() {
                    return Err(self.error(
                        format!("cannot compare '{}' with '{}'", left.type_name(), right.type_name()),
                        span.clone(),
                    ));
                }
                let eq = left.values_equal(&right);
                Ok(Bool(if op == BinaryOp::Equal { eq } else { !eq }))
            }
            BinaryOp::Less | BinaryOp::LessOrEqual | BinaryOp::Greater | BinaryOp::GreaterOrEqual => {
                let ordering = match (&left, &right) {
                    (Number(a), Number(b)) => a.partial_cmp(b),
                    (String(a), String(b)) => Some(a.as_bytes().cmp(b.as_bytes())),
                    _ => {
                        return Err(self.error(
                            format!("cannot compare '{}' with '{}'", left.type_name(), right.type_name()),
                            span.clone(),
                        ))
                    }
                };
                let result = match ordering {
                    Some(std::cmp::Ordering::Less) => matches!(op, BinaryOp::Less | BinaryOp::LessOrEqual),
                    Some(std::cmp::Ordering::Equal) => {
                        matches!(op, BinaryOp::LessOrEqual | BinaryOp::GreaterOrEqual)
                    }
                    Some(std::cmp::Ordering::Greater) => {
                        matches!(op, BinaryOp::Greater | BinaryOp::GreaterOrEqual)
                    }
                    None => false, // NaN compares false against everything
                };
                Ok(Bool(result))
            }
        }
    }

    fn eval_logical(&mut self, e: &LogicalExpr) -> EvalResult {
        let left = self.eval(&e.left)?;
        let left_bool = match left {
            Value::Bool(b) => b,
            other => {
                return Err(self.error(
                    format!("expected 'Bool', got '{}'", other.type_name()),
                    e.left.span(),
                ))
            }
        };
        match (e.op, left_bool) {
            (LogicalOp::And, false) => return Ok(Value::Bool(false)),
            (LogicalOp::Or, true) => return Ok(Value::Bool(true)),
            _ => {}
        }
        let right = self.eval(&e.right)?;
        match right {
            Value::Bool(_) => Ok(right),
            other => Err(self.error(format!("expected 'Bool', got '{}'", other.type_name()), e.right.span())),
        }
    }

    fn eval_call(&mut self, e: &CallExpr) -> EvalResult {
        let callee = self.eval(&e.callee)?;
        let mut args = Vec::with_capacity(e.args.len());
        for arg in &e.args {
            args.push(self.eval(arg)?);
        }
        if !callee.is_callable() {
            return Err(self.error(format!("'{}' object is not callable", callee.type_name()), e.span.clone()));
        }
        let arity = callee.arity();
        if arity != args.len() {
            return Err(self.error(
                format!("expected {} arguments, got {}", arity, args.len()),
                e.span.clone(),
            ));
        }
        self.call(&callee, &args, e.span.clone())
    }

    fn call(&mut self, callee: &Value, args: &[Value], call_span: Span) -> EvalResult {
        match callee {
            Value::BuiltinFunction(b) => (b.func)(args, self, call_span),
            Value::Function(f) => self.call_function(f, args),
            _ => unreachable!("caller already checked is_callable()"),
        }
    }

    fn call_function(&mut self, f: &Rc<FunctionValue>, args: &[Value]) -> EvalResult {
        let previous_source = std::mem::replace(&mut self.current_source, Rc::clone(&f.defining_source));
        let previous_scope = self.push_scope_with_parent(Rc::clone(&f.captured_scope));

        for (param, arg) in f.func.params.iter().zip(args) {
            scope::define(&self.current_scope, &param.name, arg.clone());
        }

        let result = self.exec_block_body(&f.func.body);

        self.restore_scope(previous_scope);
        self.current_source = previous_source;

        match result {
            Ok(()) => Ok(Value::Nil),
            Err(Signal::Return(value)) => Ok(value),
            Err(other) => Err(other),
        }
    }

    fn error(&self, message: impl Into<String>, span: Span) -> Signal {
        Signal::Error(Error::new(message, span))
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

/// Floating point remainder with the sign of the dividend, i.e. C's
/// `fmod`/Rust's `%` on primitive floats (as opposed to `f64::rem_euclid`).
fn ieee_remainder(a: f64, b: f64) -> f64 {
    a % b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::Checker;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn run(interp: &mut Interpreter, src: &str) -> Result<(), ErrorList> {
        let source: Rc<str> = Rc::from(src);
        let tokens = Lexer::new(Rc::clone(&source)).lex().expect("lex");
        let program = Parser::new(Rc::clone(&source), tokens).parse().expect("parse");
        Checker::new().check(&program);
        interp.interpret(&program, source)
    }

    #[test]
    fn arithmetic_and_print() {
        let mut interp = Interpreter::new();
        assert!(run(&mut interp, "var x = 5; var y = x * 2;").is_ok());
        match scope::get_unresolved(&interp.globals, "y") {
            Some(Value::Number(n)) => assert_eq!(n, 10.0),
            _ => panic!("expected y = 10"),
        }
    }

    #[test]
    fn closures_capture_defining_scope() {
        let mut interp = Interpreter::new();
        assert!(run(&mut interp, "fn f() { return x; }").is_ok());
        assert!(run(&mut interp, "var x = 42;").is_ok());
        assert!(run(&mut interp, "var result = f();").is_ok());
        match scope::get_unresolved(&interp.globals, "result") {
            Some(Value::Number(n)) => assert_eq!(n, 42.0),
            _ => panic!("expected result = 42"),
        }
    }

    #[test]
    fn recursive_function() {
        let mut interp = Interpreter::new();
        let src = "fn fact(n) { if n == 0 { return 1; } return n * fact(n - 1); } var r = fact(5);";
        assert!(run(&mut interp, src).is_ok());
        match scope::get_unresolved(&interp.globals, "r") {
            Some(Value::Number(n)) => assert_eq!(n, 120.0),
            _ => panic!("expected r = 120"),
        }
    }

    #[test]
    fn for_loop_over_string() {
        let mut interp = Interpreter::new();
        let src = r#"var s = ""; for c in "abc" { s = s + c + "."; }"#;
        assert!(run(&mut interp, src).is_ok());
        match scope::get_unresolved(&interp.globals, "s") {
            Some(Value::String(s)) => assert_eq!(&*s, "a.b.c."),
            _ => panic!("expected s = 'a.b.c.'"),
        }
    }

    #[test]
    fn while_with_break() {
        let mut interp = Interpreter::new();
        let src = "var i = 0; while i < 5 { if i == 3 { break; } i = i + 1; }";
        assert!(run(&mut interp, src).is_ok());
        match scope::get_unresolved(&interp.globals, "i") {
            Some(Value::Number(n)) => assert_eq!(n, 3.0),
            _ => panic!("expected i = 3"),
        }
    }

    #[test]
    fn type_mismatch_is_error() {
        let mut interp = Interpreter::new();
        let result = run(&mut interp, r#"print("a" + 1);"#);
        let errors = result.unwrap_err().into_vec();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "cannot add 'String' to 'Number'");
    }

    #[test]
    fn nan_is_not_equal_to_itself() {
        let mut interp = Interpreter::new();
        assert!(run(&mut interp, "var x = 0.0 / 0.0; var eq = x == x;").is_ok());
        match scope::get_unresolved(&interp.globals, "eq") {
            Some(Value::Bool(b)) => assert!(!b),
            _ => panic!("expected eq = false"),
        }
    }

    #[test]
    fn short_circuit_and_does_not_evaluate_right() {
        let mut interp = Interpreter::new();
        // calling an undefined function would raise an error if evaluated
        assert!(run(&mut interp, "var r = false and undefined_fn();").is_ok());
    }

    #[test]
    fn short_circuit_or_does_not_evaluate_right() {
        let mut interp = Interpreter::new();
        assert!(run(&mut interp, "var r = true or undefined_fn();").is_ok());
    }

    #[test]
    fn break_outside_loop_does_not_crash() {
        let mut interp = Interpreter::new();
        assert!(run(&mut interp, "break;").is_ok());
    }

    #[test]
    fn scope_returns_to_globals_after_error() {
        let mut interp = Interpreter::new();
        let _ = run(&mut interp, r#"print("a" + 1);"#);
        assert!(Rc::ptr_eq(&interp.current_scope, &interp.globals));
    }
}
