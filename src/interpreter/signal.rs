//! Control-flow escapes as a sum type rather than an interpreter flag plus
//! a boolean return: errors, `break`, `continue` and `return` all travel
//! out through the same `?`-propagated channel. The process-wide interrupt
//! is folded in here too since it unwinds out of `interpret()` the same way.

use std::fmt;

use crate::diagnostics::Error;

use super::object::Value;

#[derive(Debug, Clone)]
pub enum Signal {
    Error(Error),
    Break,
    Continue,
    Return(Value),
    Interrupt,
}

impl From<Error> for Signal {
    fn from(e: Error) -> Self {
        Signal::Error(e)
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Error(e) => write!(f, "{e}"),
            Signal::Break => write!(f, "break outside loop"),
            Signal::Continue => write!(f, "continue outside loop"),
            Signal::Return(_) => write!(f, "return outside function"),
            Signal::Interrupt => write!(f, "interrupt"),
        }
    }
}

pub type EvalResult = Result<Value, Signal>;
pub type ExecResult = Result<(), Signal>;
