//! The canonical S-expression pretty printer, and the string/number
//! formatting helpers shared with token dumping.

use super::expr::Expr;
use super::stmt::{Program, Stmt};

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

/// Shortest round-trip decimal rendering of a finite `f64`. Rust's own
/// `Display` for `f64` already produces the shortest string that parses
/// back to the same value, and never appends a spurious `.0`.
pub fn format_number(n: f64) -> String {
    format!("{n}")
}

/// Escapes `\`, `"`, tab, CR and LF the way string literals accept them,
/// without adding surrounding quotes. Used for token dumps and for
/// printing the source text of any non-string token.
pub fn escape_no_quotes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out
}

/// As `escape_no_quotes`, but wrapped in double quotes — the form used for
/// `StringLiteral` nodes in the AST dump.
pub fn escape_quoted(s: &str) -> String {
    format!("\"{}\"", escape_no_quotes(s))
}

pub fn dump_program(program: &Program) -> String {
    let mut s = indent(0);
    s.push_str("(program");
    for stmt in &program.stmts {
        s.push('\n');
        s.push_str(&dump_stmt(stmt, 1));
    }
    s.push(')');
    s
}

pub fn dump_expr(expr: &Expr, depth: usize) -> String {
    match expr {
        Expr::StringLiteral(e) => format!("{}{}", indent(depth), escape_quoted(&e.value)),
        Expr::NumberLiteral(e) => format!("{}{}", indent(depth), format_number(e.value)),
        Expr::BoolLiteral(e) => format!("{}{}", indent(depth), e.value),
        Expr::NilLiteral(_) => format!("{}nil", indent(depth)),
        Expr::Identifier(e) => format!("{}{}", indent(depth), e.name),
        Expr::Unary(e) => {
            format!("{}({}\n{})", indent(depth), e.op, dump_expr(&e.expr, depth + 1))
        }
        Expr::Group(e) => {
            format!("{}(group\n{})", indent(depth), dump_expr(&e.expr, depth + 1))
        }
        Expr::Binary(e) => format!(
            "{}({}\n{}\n{})",
            indent(depth),
            e.op,
            dump_expr(&e.left, depth + 1),
            dump_expr(&e.right, depth + 1)
        ),
        Expr::Logical(e) => format!(
            "{}({}\n{}\n{})",
            indent(depth),
            e.op,
            dump_expr(&e.left, depth + 1),
            dump_expr(&e.right, depth + 1)
        ),
        Expr::Call(e) => {
            let mut s = format!("{}(call\n{}\n", indent(depth), dump_expr(&e.callee, depth + 1));
            s.push_str(&indent(depth + 1));
            s.push_str("(args");
            for arg in &e.args {
                s.push('\n');
                s.push_str(&dump_expr(arg, depth + 2));
            }
            s.push_str("))");
            s
        }
        Expr::Function(e) => {
            let mut s = format!("{}(fn\n", indent(depth));
            s.push_str(&indent(depth + 1));
            s.push_str("(params");
            for param in &e.params {
                s.push('\n');
                s.push_str(&format!("{}{}", indent(depth + 2), param.name));
            }
            s.push_str(")\n");
            s.push_str(&dump_block(&e.body, depth + 1));
            s.push(')');
            s
        }
    }
}

fn dump_block(block: &super::stmt::BlockStmt, depth: usize) -> String {
    let mut s = indent(depth);
    s.push_str("(block");
    for stmt in &block.stmts {
        s.push('\n');
        s.push_str(&dump_stmt(stmt, depth + 1));
    }
    s.push(')');
    s
}

pub fn dump_stmt(stmt: &Stmt, depth: usize) -> String {
    match stmt {
        Stmt::Expression(s) => dump_expr(&s.expr, depth),
        Stmt::Assert(s) => {
            format!("{}(assert\n{})", indent(depth), dump_expr(&s.expr, depth + 1))
        }
        Stmt::Var(s) => {
            let mut out = format!("{}(var\n{}{}", indent(depth), indent(depth + 1), s.name.name);
            if let Some(init) = &s.init {
                out.push('\n');
                out.push_str(&dump_expr(init, depth + 1));
            }
            out.push(')');
            out
        }
        Stmt::Assign(s) => format!(
            "{}(=\n{}{}\n{})",
            indent(depth),
            indent(depth + 1),
            s.place.name,
            dump_expr(&s.value, depth + 1)
        ),
        Stmt::Block(s) => dump_block(s, depth),
        Stmt::If(s) => {
            let mut out = format!(
                "{}(if\n{}\n{}",
                indent(depth),
                dump_expr(&s.test, depth + 1),
                dump_stmt(&s.then_block, depth + 1)
            );
            if let Some(else_block) = &s.else_block {
                out.push('\n');
                out.push_str(&dump_stmt(else_block, depth + 1));
            }
            out.push(')');
            out
        }
        Stmt::While(s) => format!(
            "{}(while\n{}\n{})",
            indent(depth),
            dump_expr(&s.test, depth + 1),
            dump_block(&s.body, depth + 1)
        ),
        Stmt::For(s) => format!(
            "{}(for\n{}{}\n{}\n{})",
            indent(depth),
            indent(depth + 1),
            s.var.name,
            dump_expr(&s.iterable, depth + 1),
            dump_block(&s.body, depth + 1)
        ),
        Stmt::Break(_) => format!("{}(break)", indent(depth)),
        Stmt::Continue(_) => format!("{}(continue)", indent(depth)),
        Stmt::FunctionDeclaration(s) => {
            let mut out = format!("{}(fndecl\n{}{}\n", indent(depth), indent(depth + 1), s.name.name);
            out.push_str(&indent(depth + 1));
            out.push_str("(params");
            for param in &s.func.params {
                out.push('\n');
                out.push_str(&format!("{}{}", indent(depth + 2), param.name));
            }
            out.push_str(")\n");
            out.push_str(&dump_block(&s.func.body, depth + 1));
            out.push(')');
            out
        }
        Stmt::Return(s) => {
            let mut out = format!("{}(return", indent(depth));
            if let Some(expr) = &s.expr {
                out.push('\n');
                out.push_str(&dump_expr(expr, depth + 1));
            }
            out.push(')');
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_formatting_has_no_trailing_zero() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(5.5), "5.5");
    }

    #[test]
    fn escape_round_trips_special_chars() {
        assert_eq!(escape_no_quotes("a\tb\n\"c\"\\"), "a\\tb\\n\\\"c\\\"\\\\");
    }

    #[test]
    fn quoted_adds_surrounding_quotes() {
        assert_eq!(escape_quoted("hi"), "\"hi\"");
    }
}
