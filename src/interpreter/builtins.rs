//! `print`/`input`, the only built-in library this language ships.

use std::io::{self, BufRead, Write};

use crate::diagnostics::Error;
use crate::span::Span;

use super::object::{BuiltinFunction, Value};
use super::scope::{define, ScopeHandle};
use super::signal::EvalResult;
use super::Interpreter;

fn print(args: &[Value], _interp: &mut Interpreter, _span: Span) -> EvalResult {
    let mut stdout = io::stdout();
    let _ = write!(stdout, "{}\n", args[0].to_display_string());
    Ok(Value::Nil)
}

fn input(args: &[Value], _interp: &mut Interpreter, span: Span) -> EvalResult {
    let mut stdout = io::stdout();
    let _ = write!(stdout, "{}", args[0].to_display_string());
    let _ = stdout.flush();

    let stdin = io::stdin();
    let mut line = String::new();
    let bytes_read = stdin.lock().read_line(&mut line).unwrap_or(0);
    if bytes_read == 0 {
        return Err(Error::new("unexpected end of input", span).into());
    }
    let trimmed = line.trim_end_matches(['\n', '\r']).to_owned();
    Ok(Value::string(trimmed))
}

/// Populates `scope` (expected to be the global scope) with every built-in.
pub fn install(scope: &ScopeHandle) {
    define(
        scope,
        "print",
        Value::BuiltinFunction(std::rc::Rc::new(BuiltinFunction { name: "print", arity: 1, func: print })),
    );
    define(
        scope,
        "input",
        Value::BuiltinFunction(std::rc::Rc::new(BuiltinFunction { name: "input", arity: 1, func: input })),
    );
}
