//! Precedence-climbing expression grammar, lowest to highest:
//! assignment (handled by the statement grammar) → or → and → equality →
//! comparison → term → factor → unary → call → primary.

use std::rc::Rc;

use crate::ast::{
    BinaryExpr, BinaryOp, BoolLiteral, CallExpr, Expr, FunctionExpr, GroupExpr, Identifier,
    LogicalExpr, LogicalOp, NilLiteral, NumberLiteral, StringLiteral, UnaryExpr, UnaryOp,
};
use crate::lexer::{Literal, TokenKind};

use super::{ParseError, ParseResult, Parser};

impl Parser {
    pub(super) fn expression(&mut self) -> ParseResult<Expr> {
        self.or_expr()
    }

    fn or_expr(&mut self) -> ParseResult<Expr> {
        let mut left = self.and_expr()?;
        while self.matches(TokenKind::Or) {
            let right = self.and_expr()?;
            let span = left.span().merge(&right.span());
            left = Expr::Logical(LogicalExpr {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                span,
            });
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> ParseResult<Expr> {
        let mut left = self.equality()?;
        while self.matches(TokenKind::And) {
            let right = self.equality()?;
            let span = left.span().merge(&right.span());
            left = Expr::Logical(LogicalExpr {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
                span,
            });
        }
        Ok(left)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut left = self.comparison()?;
        loop {
            let op = if self.matches(TokenKind::EqualEqual) {
                BinaryOp::Equal
            } else if self.matches(TokenKind::BangEqual) {
                BinaryOp::NotEqual
            } else {
                break;
            };
            let right = self.comparison()?;
            let span = left.span().merge(&right.span());
            left = Expr::Binary(BinaryExpr { op, left: Box::new(left), right: Box::new(right), span });
        }
        Ok(left)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut left = self.term()?;
        loop {
            let op = if self.matches(TokenKind::Less) {
                BinaryOp::Less
            } else if self.matches(TokenKind::LessEqual) {
                BinaryOp::LessOrEqual
            } else if self.matches(TokenKind::Greater) {
                BinaryOp::Greater
            } else if self.matches(TokenKind::GreaterEqual) {
                BinaryOp::GreaterOrEqual
            } else {
                break;
            };
            let right = self.term()?;
            let span = left.span().merge(&right.span());
            left = Expr::Binary(BinaryExpr { op, left: Box::new(left), right: Box::new(right), span });
        }
        Ok(left)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut left = self.factor()?;
        loop {
            let op = if self.matches(TokenKind::Plus) {
                BinaryOp::Add
            } else if self.matches(TokenKind::Minus) {
                BinaryOp::Subtract
            } else {
                break;
            };
            let right = self.factor()?;
            let span = left.span().merge(&right.span());
            left = Expr::Binary(BinaryExpr { op, left: Box::new(left), right: Box::new(right), span });
        }
        Ok(left)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut left = self.unary()?;
        loop {
            let op = if self.matches(TokenKind::Star) {
                BinaryOp::Multiply
            } else if self.matches(TokenKind::Slash) {
                BinaryOp::Divide
            } else if self.matches(TokenKind::Percent) {
                BinaryOp::Modulo
            } else {
                break;
            };
            let right = self.unary()?;
            let span = left.span().merge(&right.span());
            left = Expr::Binary(BinaryExpr { op, left: Box::new(left), right: Box::new(right), span });
        }
        Ok(left)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        let op = if self.matches(TokenKind::Minus) {
            Some(UnaryOp::Minus)
        } else if self.matches(TokenKind::Bang) {
            Some(UnaryOp::Not)
        } else {
            None
        };
        if let Some(op) = op {
            let start = self.previous().span.clone();
            let expr = self.unary()?;
            let span = start.merge(&expr.span());
            return Ok(Expr::Unary(UnaryExpr { op, expr: Box::new(expr), span }));
        }
        self.call()
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;
        while self.matches(TokenKind::LeftParen) {
            let mut args = Vec::new();
            if !self.check(TokenKind::RightParen) {
                loop {
                    args.push(self.expression()?);
                    if !self.matches(TokenKind::Comma) {
                        break;
                    }
                }
            }
            let end = self.expect(TokenKind::RightParen, "expected ')' after arguments")?;
            let span = expr.span().merge(&end.span.clone());
            expr = Expr::Call(CallExpr { callee: Box::new(expr), args, span });
        }
        Ok(expr)
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if self.matches(TokenKind::False) || self.matches(TokenKind::True) {
            let token = self.previous();
            let value = matches!(token.value, Literal::Bool(true));
            return Ok(Expr::BoolLiteral(BoolLiteral { value, span: token.span.clone() }));
        }
        if self.matches(TokenKind::Nil) {
            return Ok(Expr::NilLiteral(NilLiteral { span: self.previous().span.clone() }));
        }
        if self.matches(TokenKind::Number) {
            let token = self.previous();
            let value = match token.value {
                Literal::Number(n) => n,
                _ => unreachable!("Number token always carries a Literal::Number"),
            };
            return Ok(Expr::NumberLiteral(NumberLiteral { value, span: token.span.clone() }));
        }
        if self.matches(TokenKind::String) {
            let token = self.previous();
            let value = match &token.value {
                Literal::String(s) => s.clone(),
                _ => unreachable!("String token always carries a Literal::String"),
            };
            return Ok(Expr::StringLiteral(StringLiteral { value, span: token.span.clone() }));
        }
        if self.matches(TokenKind::Identifier) {
            let token = self.previous();
            return Ok(Expr::Identifier(Identifier::new(
                token.span.text().to_owned(),
                token.span.clone(),
            )));
        }
        if self.matches(TokenKind::LeftParen) {
            let start = self.previous().span.clone();
            let inner = self.expression()?;
            let end = self.expect(TokenKind::RightParen, "expected ')' after expression")?;
            let span = start.merge(&end.span.clone());
            return Ok(Expr::Group(GroupExpr { expr: Box::new(inner), span }));
        }
        if self.matches(TokenKind::Fn) {
            let start = self.previous().span.clone();
            self.expect(TokenKind::LeftParen, "expected '(' after 'fn'")?;
            let params = self.parameter_list()?;
            let body = self.block()?;
            let span = start.merge(&body.span.clone());
            return Ok(Expr::Function(Rc::new(FunctionExpr { params, body, span })));
        }
        Err(ParseError::new("expected expression", self.current().span.clone()))
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::dump::dump_expr;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn parse_expr(src: &str) -> crate::ast::Expr {
        let source: std::rc::Rc<str> = std::rc::Rc::from(src);
        let tokens = Lexer::new(std::rc::Rc::clone(&source)).lex().expect("lex");
        let mut parser = Parser::new(source, tokens);
        parser.expression().expect("parse expression")
    }

    #[test]
    fn multiply_binds_tighter_than_add() {
        let expr = parse_expr("1 + 2 * 3");
        assert_eq!(dump_expr(&expr, 0), "(+\n  1\n  (*\n    2\n    3))");
    }

    #[test]
    fn unary_binds_tighter_than_factor() {
        let expr = parse_expr("-1 * 2");
        assert_eq!(dump_expr(&expr, 0), "(*\n  (-\n    1)\n  2)");
    }

    #[test]
    fn call_binds_tighter_than_unary() {
        let expr = parse_expr("!f()");
        assert_eq!(dump_expr(&expr, 0), "(!\n  (call\n    f\n    (args)))");
    }

    #[test]
    fn logical_and_binds_tighter_than_or() {
        let expr = parse_expr("a or b and c");
        assert_eq!(dump_expr(&expr, 0), "(or\n  a\n  (and\n    b\n    c))");
    }
}
