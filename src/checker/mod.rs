//! Lexical resolver: annotates every `Identifier` use with a hop count when
//! it resolves to a local binding, leaving it unresolved (global, looked up
//! dynamically) otherwise. Reports no errors of its own — an unresolved
//! identifier surfaces as a runtime error with its own source span.

use std::collections::HashSet;

use crate::ast::{
    BlockStmt, Expr, ForStmt, FunctionDeclaration, FunctionExpr, Identifier, IfStmt, Program,
    Stmt, VarStmt, WhileStmt,
};

pub struct Checker {
    scopes: Vec<HashSet<String>>,
}

impl Checker {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn check(&mut self, program: &Program) {
        self.push_scope();
        for stmt in &program.stmts {
            self.check_stmt(stmt);
        }
        self.pop_scope();
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashSet::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, name: &str) {
        self.scopes.last_mut().expect("checker scope stack is never empty while checking").insert(name.to_owned());
    }

    fn resolve(&self, ident: &Identifier) {
        for (depth, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains(&ident.name) {
                ident.hops.set(Some(depth));
                return;
            }
        }
        ident.hops.set(None);
    }

    fn check_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(s) => self.check_expr(&s.expr),
            Stmt::Assert(s) => self.check_expr(&s.expr),
            Stmt::Var(s) => self.check_var(s),
            Stmt::Assign(s) => {
                self.check_expr(&s.value);
                self.resolve(&s.place);
            }
            Stmt::Block(s) => self.check_block(s),
            Stmt::If(s) => self.check_if(s),
            Stmt::While(s) => self.check_while(s),
            Stmt::For(s) => self.check_for(s),
            Stmt::Break(_) | Stmt::Continue(_) => {}
            Stmt::FunctionDeclaration(s) => self.check_function_declaration(s),
            Stmt::Return(s) => {
                if let Some(expr) = &s.expr {
                    self.check_expr(expr);
                }
            }
        }
    }

    /// The initializer is checked before the name is declared, so
    /// `var x = x;` resolves the right-hand `x` to an outer scope.
    fn check_var(&mut self, stmt: &VarStmt) {
        if let Some(init) = &stmt.init {
            self.check_expr(init);
        }
        self.declare(&stmt.name.name);
    }

    fn check_block(&mut self, block: &BlockStmt) {
        self.push_scope();
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
        self.pop_scope();
    }

    fn check_if(&mut self, stmt: &IfStmt) {
        self.check_expr(&stmt.test);
        self.check_stmt(&stmt.then_block);
        if let Some(else_block) = &stmt.else_block {
            self.check_stmt(else_block);
        }
    }

    fn check_while(&mut self, stmt: &WhileStmt) {
        self.check_expr(&stmt.test);
        self.check_block(&stmt.body);
    }

    fn check_for(&mut self, stmt: &ForStmt) {
        self.check_expr(&stmt.iterable);
        self.push_scope();
        self.declare(&stmt.var.name);
        for s in &stmt.body.stmts {
            self.check_stmt(s);
        }
        self.pop_scope();
    }

    /// Declares the function's own name *before* checking its body, so a
    /// recursive call within the body resolves to a local hop rather than
    /// falling back to a dynamic global lookup.
    fn check_function_declaration(&mut self, decl: &FunctionDeclaration) {
        self.declare(&decl.name.name);
        self.check_function_expr(&decl.func);
    }

    fn check_function_expr(&mut self, func: &FunctionExpr) {
        self.push_scope();
        for param in &func.params {
            self.declare(&param.name);
        }
        for stmt in &func.body.stmts {
            self.check_stmt(stmt);
        }
        self.pop_scope();
    }

    fn check_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::StringLiteral(_)
            | Expr::NumberLiteral(_)
            | Expr::BoolLiteral(_)
            | Expr::NilLiteral(_) => {}
            Expr::Identifier(ident) => self.resolve(ident),
            Expr::Unary(e) => self.check_expr(&e.expr),
            Expr::Group(e) => self.check_expr(&e.expr),
            Expr::Binary(e) => {
                self.check_expr(&e.left);
                self.check_expr(&e.right);
            }
            Expr::Logical(e) => {
                self.check_expr(&e.left);
                self.check_expr(&e.right);
            }
            Expr::Call(e) => {
                self.check_expr(&e.callee);
                for arg in &e.args {
                    self.check_expr(arg);
                }
            }
            Expr::Function(func) => self.check_function_expr(func),
        }
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use std::rc::Rc;

    fn check_source(src: &str) -> Program {
        let source: Rc<str> = Rc::from(src);
        let tokens = Lexer::new(Rc::clone(&source)).lex().expect("lex");
        let program = Parser::new(source, tokens).parse().expect("parse");
        Checker::new().check(&program);
        program
    }

    fn find_identifier<'a>(stmt: &'a Stmt, name: &str) -> Option<&'a Identifier> {
        fn in_expr<'a>(expr: &'a Expr, name: &str) -> Option<&'a Identifier> {
            match expr {
                Expr::Identifier(ident) if ident.name == name => Some(ident),
                Expr::Unary(e) => in_expr(&e.expr, name),
                Expr::Group(e) => in_expr(&e.expr, name),
                Expr::Binary(e) => in_expr(&e.left, name).or_else(|| in_expr(&e.right, name)),
                Expr::Logical(e) => in_expr(&e.left, name).or_else(|| in_expr(&e.right, name)),
                Expr::Call(e) => in_expr(&e.callee, name)
                    .or_else(|| e.args.iter().find_map(|a| in_expr(a, name))),
                _ => None,
            }
        }
        match stmt {
            Stmt::Expression(s) => in_expr(&s.expr, name),
            Stmt::Var(s) => s.init.as_ref().and_then(|i| in_expr(i, name)),
            Stmt::Return(s) => s.expr.as_ref().and_then(|e| in_expr(e, name)),
            _ => None,
        }
    }

    #[test]
    fn local_var_resolves_with_hop_zero() {
        let program = check_source("var x = 1; x;");
        let ident = find_identifier(&program.stmts[1], "x").expect("identifier x");
        assert_eq!(ident.hops.get(), Some(0));
    }

    #[test]
    fn var_initializer_sees_outer_binding() {
        let program = check_source("var x = 1; { var x = x; }");
        let Stmt::Block(block) = &program.stmts[1] else { panic!("expected block") };
        let ident = find_identifier(&block.stmts[0], "x").expect("identifier x");
        assert_eq!(ident.hops.get(), Some(1));
    }

    #[test]
    fn unresolved_global_has_no_hop_count() {
        let program = check_source("f();");
        let ident = find_identifier(&program.stmts[0], "f");
        assert!(ident.is_none() || ident.unwrap().hops.get().is_none());
    }

    #[test]
    fn recursive_function_resolves_own_name_as_local() {
        let program = check_source("fn f(n) { return f(n); }");
        let Stmt::FunctionDeclaration(decl) = &program.stmts[0] else { panic!() };
        let inner = &decl.func.body.stmts[0];
        let ident = find_identifier(inner, "f").expect("identifier f");
        assert_eq!(ident.hops.get(), Some(1));
    }
}
