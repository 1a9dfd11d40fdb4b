//! Recursive-descent parser. Turns a token stream plus the original source
//! into a `Program`. Does not recover from errors: the first one aborts the
//! whole parse.

mod error;
mod expr;

pub use error::ParseError;

use std::rc::Rc;

use crate::ast::{
    AssertStmt, AssignStmt, BlockStmt, BreakStmt, ContinueStmt, ForStmt, FunctionDeclaration,
    FunctionExpr, Identifier, IfStmt, Program, ReturnStmt, Stmt, VarStmt, WhileStmt,
};
use crate::diagnostics::ErrorList;
use crate::lexer::{Token, TokenKind};

pub type ParseResult<T> = Result<T, ParseError>;

pub struct Parser {
    source: Rc<str>,
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    pub fn new(source: Rc<str>, tokens: Vec<Token>) -> Self {
        Self { source, tokens, pos: 0 }
    }

    pub fn parse(mut self) -> Result<Program, ErrorList> {
        let start = self.current().span.clone();
        let mut stmts = Vec::new();
        while !self.check(TokenKind::Eof) {
            match self.declaration() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => {
                    let mut errors = ErrorList::new();
                    errors.push(e.into());
                    return Err(errors);
                }
            }
        }
        let span = start.merge(&self.current().span);
        Ok(Program { stmts, span })
    }

    // --- token cursor -----------------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.pos - 1]
    }

    fn is_at_end(&self) -> bool {
        self.current().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        self.previous()
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    fn matches(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, message: &str) -> ParseResult<&Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(ParseError::new(message.to_owned(), self.current().span.clone()))
        }
    }

    // --- statement grammar --------------------------------------------

    fn declaration(&mut self) -> ParseResult<Stmt> {
        if self.matches(TokenKind::Fn) {
            return self.function_declaration();
        }
        if self.matches(TokenKind::Var) {
            return self.var_statement();
        }
        self.statement()
    }

    fn function_declaration(&mut self) -> ParseResult<Stmt> {
        let start = self.previous().span.clone();
        let name = self.identifier("expected function name")?;
        self.expect(TokenKind::LeftParen, "expected '(' after function name")?;
        let params = self.parameter_list()?;
        let body = self.block()?;
        let span = start.merge(&body.span);
        let func = Rc::new(FunctionExpr { params, body, span: span.clone() });
        Ok(Stmt::FunctionDeclaration(FunctionDeclaration { name, func, span }))
    }

    fn parameter_list(&mut self) -> ParseResult<Vec<Identifier>> {
        let mut params = Vec::new();
        if !self.check(TokenKind::RightParen) {
            loop {
                params.push(self.identifier("expected parameter name")?);
                if !self.matches(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen, "expected ')' after parameters")?;
        Ok(params)
    }

    fn identifier(&mut self, message: &str) -> ParseResult<Identifier> {
        self.expect(TokenKind::Identifier, message)?;
        let token = self.previous();
        Ok(Identifier::new(token.span.text().to_owned(), token.span.clone()))
    }

    fn var_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.previous().span.clone();
        let name = self.identifier("expected variable name")?;
        let init = if self.matches(TokenKind::Equal) { Some(self.expression()?) } else { None };
        let semi = self.expect(TokenKind::Semicolon, "expected ';' after variable declaration")?;
        let span = start.merge(&semi.span.clone());
        Ok(Stmt::Var(VarStmt { name, init, span }))
    }

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.matches(TokenKind::LeftBrace) {
            return Ok(Stmt::Block(self.finish_block()?));
        }
        if self.matches(TokenKind::If) {
            return self.if_statement();
        }
        if self.matches(TokenKind::While) {
            return self.while_statement();
        }
        if self.matches(TokenKind::For) {
            return self.for_statement();
        }
        if self.matches(TokenKind::Break) {
            let start = self.previous().span.clone();
            let semi = self.expect(TokenKind::Semicolon, "expected ';' after 'break'")?;
            return Ok(Stmt::Break(BreakStmt { span: start.merge(&semi.span.clone()) }));
        }
        if self.matches(TokenKind::Continue) {
            let start = self.previous().span.clone();
            let semi = self.expect(TokenKind::Semicolon, "expected ';' after 'continue'")?;
            return Ok(Stmt::Continue(ContinueStmt { span: start.merge(&semi.span.clone()) }));
        }
        if self.matches(TokenKind::Return) {
            return self.return_statement();
        }
        if self.matches(TokenKind::Assert) {
            return self.assert_statement();
        }
        self.expression_or_assignment_statement()
    }

    fn block(&mut self) -> ParseResult<BlockStmt> {
        self.expect(TokenKind::LeftBrace, "expected '{'")?;
        self.finish_block()
    }

    fn finish_block(&mut self) -> ParseResult<BlockStmt> {
        let start = self.previous().span.clone();
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RightBrace) && !self.is_at_end() {
            stmts.push(self.declaration()?);
        }
        let end = self.expect(TokenKind::RightBrace, "expected '}'")?;
        let span = start.merge(&end.span.clone());
        Ok(BlockStmt { stmts, span })
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.previous().span.clone();
        let test = self.expression()?;
        let then_block = Box::new(Stmt::Block(self.block()?));
        let mut span = start.merge(&then_block.span());
        let else_block = if self.matches(TokenKind::Else) {
            let else_stmt = if self.matches(TokenKind::If) {
                self.if_statement()?
            } else {
                Stmt::Block(self.block()?)
            };
            span = span.merge(&else_stmt.span());
            Some(Box::new(else_stmt))
        } else {
            None
        };
        Ok(Stmt::If(IfStmt { test, then_block, else_block, span }))
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.previous().span.clone();
        let test = self.expression()?;
        let body = self.block()?;
        let span = start.merge(&body.span.clone());
        Ok(Stmt::While(WhileStmt { test, body, span }))
    }

    fn for_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.previous().span.clone();
        let var = self.identifier("expected loop variable name")?;
        self.expect(TokenKind::In, "expected 'in' after loop variable")?;
        let iterable = self.expression()?;
        let body = self.block()?;
        let span = start.merge(&body.span.clone());
        Ok(Stmt::For(ForStmt { var, iterable, body, span }))
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.previous().span.clone();
        let expr = if self.check(TokenKind::Semicolon) { None } else { Some(self.expression()?) };
        let semi = self.expect(TokenKind::Semicolon, "expected ';' after return value")?;
        let span = start.merge(&semi.span.clone());
        Ok(Stmt::Return(ReturnStmt { expr, span }))
    }

    fn assert_statement(&mut self) -> ParseResult<Stmt> {
        let start = self.previous().span.clone();
        let expr = self.expression()?;
        let semi = self.expect(TokenKind::Semicolon, "expected ';' after assertion")?;
        let span = start.merge(&semi.span.clone());
        Ok(Stmt::Assert(AssertStmt { expr, span }))
    }

    fn expression_or_assignment_statement(&mut self) -> ParseResult<Stmt> {
        let expr = self.expression()?;
        if self.matches(TokenKind::Equal) {
            let place = expr
                .as_identifier()
                .cloned()
                .ok_or_else(|| ParseError::new("invalid assignment target", expr.span()))?;
            let value = self.expression()?;
            let semi = self.expect(TokenKind::Semicolon, "expected ';' after assignment")?;
            let span = place.span.merge(&semi.span.clone());
            return Ok(Stmt::Assign(AssignStmt { place, value, span }));
        }
        self.expect(TokenKind::Semicolon, "expected ';' after expression")?;
        Ok(Stmt::Expression(crate::ast::ExpressionStmt { expr }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::dump::dump_program;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> Result<Program, ErrorList> {
        let source: Rc<str> = Rc::from(src);
        let tokens = Lexer::new(Rc::clone(&source)).lex().expect("lex");
        Parser::new(source, tokens).parse()
    }

    #[test]
    fn empty_source_parses_to_empty_program() {
        let program = parse("").expect("parse");
        assert!(program.stmts.is_empty());
    }

    #[test]
    fn invalid_assignment_target_is_a_parse_error() {
        let errors = parse("1 + 2 = 3;").unwrap_err().into_vec();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message, "invalid assignment target");
        assert_eq!(errors[0].span.text(), "1 + 2");
    }

    #[test]
    fn plain_identifier_assignment_is_not_an_error() {
        assert!(parse("x = 1;").is_ok());
    }

    #[test]
    fn reparsing_the_same_source_yields_the_same_dump() {
        let src = "fn fact(n) { if n == 0 { return 1; } return n * fact(n - 1); } \
                   var r = fact(5); for c in \"abc\" { print(c); }";
        let first = dump_program(&parse(src).expect("first parse"));
        let second = dump_program(&parse(src).expect("second parse"));
        assert_eq!(first, second);
    }
}
