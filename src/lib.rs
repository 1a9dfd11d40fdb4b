//! `loxide` — lexer, parser, checker and tree-walking interpreter for a
//! small, dynamically typed scripting language in the Lox tradition.

pub mod ast;
pub mod checker;
pub mod diagnostics;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod span;
