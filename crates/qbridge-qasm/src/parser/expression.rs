//! Expression parsing.

use super::Parser;
use crate::ast::{BinOp, Expression};
use crate::error::{ParseError, ParseResult};
use crate::lexer::Token;

impl Parser {
    /// Parse an expression.
    pub(super) fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_binary_expr(0)
    }

    /// Parse binary expression with precedence climbing. `**` is right
    /// associative, everything else left associative.
    fn parse_binary_expr(&mut self, min_prec: u8) -> ParseResult<Expression> {
        let mut left = self.parse_unary_expr()?;

        while let Some(op) = self.peek_binary_op() {
            let prec = op.precedence();
            if prec < min_prec {
                break;
            }
            self.advance();

            let next_min = if op == BinOp::Pow { prec } else { prec + 1 };
            let right = self.parse_binary_expr(next_min)?;
            left = Expression::binary(left, op, right);
        }

        Ok(left)
    }

    /// Parse unary expression. Unary operators bind looser than `**`,
    /// so `-x ** 2` is `-(x ** 2)`.
    fn parse_unary_expr(&mut self) -> ParseResult<Expression> {
        if self.consume(&Token::Minus) {
            let expr = self.parse_binary_expr(BinOp::Pow.precedence())?;
            return Ok(Expression::Neg(Box::new(expr)));
        }
        if self.consume(&Token::Plus) {
            return self.parse_binary_expr(BinOp::Pow.precedence());
        }
        if self.consume(&Token::Not) {
            let expr = self.parse_binary_expr(BinOp::Pow.precedence())?;
            return Ok(Expression::Not(Box::new(expr)));
        }
        self.parse_postfix_expr()
    }

    /// Parse a primary expression followed by any `[index]` suffixes.
    fn parse_postfix_expr(&mut self) -> ParseResult<Expression> {
        let mut expr = self.parse_primary_expr()?;
        while self.consume(&Token::LBracket) {
            let index = self.parse_expression()?;
            self.expect(Token::RBracket)?;
            expr = Expression::Index {
                target: Box::new(expr),
                index: Box::new(index),
            };
        }
        Ok(expr)
    }

    /// Parse primary expression.
    fn parse_primary_expr(&mut self) -> ParseResult<Expression> {
        let token = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof("expression".into()))?;

        match token {
            Token::IntLiteral(v) => i64::try_from(v)
                .map(Expression::Int)
                .map_err(|_| ParseError::Generic(format!("integer literal {v} is too large"))),
            Token::FloatLiteral(v) => Ok(Expression::Float(v)),
            Token::DurationLiteral(s) => Ok(Expression::Duration(s)),
            Token::Pi => Ok(Expression::Pi),
            Token::Tau => Ok(Expression::Tau),
            Token::Euler => Ok(Expression::Euler),
            Token::True => Ok(Expression::Bool(true)),
            Token::False => Ok(Expression::Bool(false)),
            Token::Identifier(name) => {
                if self.consume(&Token::LParen) {
                    let args = self.parse_expression_list()?;
                    self.expect(Token::RParen)?;
                    Ok(Expression::FnCall { name, args })
                } else {
                    Ok(Expression::Identifier(name))
                }
            }
            Token::LParen => {
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(Expression::Paren(Box::new(expr)))
            }
            other => Err(self.unexpected("expression", &other)),
        }
    }

    /// Peek at binary operator.
    fn peek_binary_op(&self) -> Option<BinOp> {
        match self.peek()? {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            Token::Percent => Some(BinOp::Mod),
            Token::Power => Some(BinOp::Pow),
            Token::EqEq => Some(BinOp::Eq),
            Token::NotEq => Some(BinOp::NotEq),
            Token::Lt => Some(BinOp::Lt),
            Token::LtEq => Some(BinOp::LtEq),
            Token::Gt => Some(BinOp::Gt),
            Token::GtEq => Some(BinOp::GtEq),
            Token::And => Some(BinOp::And),
            Token::Or => Some(BinOp::Or),
            Token::Ampersand => Some(BinOp::BitAnd),
            Token::Pipe => Some(BinOp::BitOr),
            Token::Caret => Some(BinOp::BitXor),
            Token::LShift => Some(BinOp::LShift),
            Token::RShift => Some(BinOp::RShift),
            _ => None,
        }
    }

    /// Parse expression list.
    pub(super) fn parse_expression_list(&mut self) -> ParseResult<Vec<Expression>> {
        if self.check(&Token::RParen) {
            return Ok(vec![]);
        }
        let mut exprs = vec![self.parse_expression()?];
        while self.consume(&Token::Comma) {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }
}
