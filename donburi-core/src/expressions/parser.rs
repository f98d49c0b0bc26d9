use serde_json::Value;

use super::ast::{AssignOp, BinaryOp, Expr, Statement, UnaryOp};
use super::error::ExprError;
use super::lexer::{tokenize, Spanned, Token};

/// Nesting allowed for parentheses, lists, calls, indexing and prefix operators.
pub const MAX_DEPTH: usize = 128;
/// Bounds left-nested operator chains, which the evaluator walks recursively.
pub const MAX_TOKENS: usize = 2048;

/// Parse a side-effect free expression (guards, iteration sources, templates).
pub fn parse_expression(input: &str) -> Result<Expr, ExprError> {
    match parse_statement(input)? {
        Statement::Expr(expr) => Ok(expr),
        Statement::Assign { .. } => Err(ExprError::AssignmentNotAllowed),
    }
}

/// Parse an expression or a single assignment statement.
pub fn parse_statement(input: &str) -> Result<Statement, ExprError> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ExprError::Empty);
    }
    if tokens.len() > MAX_TOKENS {
        return Err(ExprError::TooLong(MAX_TOKENS));
    }
    let mut p = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let lhs = p.parse_or()?;

    let op = match p.peek() {
        Some(Token::Assign) => Some(AssignOp::Set),
        Some(Token::PlusAssign) => Some(AssignOp::Add),
        Some(Token::MinusAssign) => Some(AssignOp::Sub),
        _ => None,
    };

    let stmt = match op {
        Some(op) => {
            p.pos += 1;
            if !lhs.is_place() {
                return Err(ExprError::InvalidAssignmentTarget);
            }
            let value = p.parse_or()?;
            Statement::Assign {
                target: lhs,
                op,
                value,
            }
        }
        None => Statement::Expr(lhs),
    };

    p.expect_end()?;
    Ok(stmt)
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T, ExprError>) -> Result<T, ExprError> {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::TooDeep(MAX_DEPTH));
        }
        self.depth += 1;
        let out = f(self);
        self.depth -= 1;
        out
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Spanned> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ExprError> {
        match self.advance() {
            Some(s) if &s.token == expected => Ok(()),
            Some(s) => Err(unexpected(&s)),
            None => Err(ExprError::UnexpectedEnd),
        }
    }

    fn expect_end(&self) -> Result<(), ExprError> {
        match self.tokens.get(self.pos) {
            None => Ok(()),
            Some(s) => Err(unexpected(s)),
        }
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        self.nested(Self::parse_or_chain)
    }

    fn parse_or_chain(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_and()?;
        while self.eat(&Token::Or) {
            let rhs = self.parse_and()?;
            lhs = Expr::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_equality()?;
        while self.eat(&Token::And) {
            let rhs = self.parse_equality()?;
            lhs = Expr::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_comparison()?;
        loop {
            let op = match self.peek() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::Ne,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_comparison()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_additive()?;
        loop {
            let op = match self.peek() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::Le) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::Ge) => BinaryOp::Ge,
                Some(Token::In) => BinaryOp::In,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_additive()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_multiplicative()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.parse_unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        match self.peek() {
            Some(Token::Bang | Token::Not) => {
                self.pos += 1;
                let operand = self.nested(Self::parse_unary)?;
                Ok(Expr::Unary(UnaryOp::Not, Box::new(operand)))
            }
            Some(Token::Minus) => {
                self.pos += 1;
                let operand = self.nested(Self::parse_unary)?;
                Ok(Expr::Unary(UnaryOp::Neg, Box::new(operand)))
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ExprError> {
        let mut expr = self.parse_primary()?;
        loop {
            if self.eat(&Token::Dot) {
                match self.advance() {
                    Some(Spanned {
                        token: Token::Ident(name),
                        ..
                    }) => expr = Expr::Member(Box::new(expr), name),
                    Some(s) => return Err(unexpected(&s)),
                    None => return Err(ExprError::UnexpectedEnd),
                }
            } else if self.eat(&Token::LBracket) {
                let index = self.parse_or()?;
                self.expect(&Token::RBracket)?;
                expr = Expr::Index(Box::new(expr), Box::new(index));
            } else {
                return Ok(expr);
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let Some(spanned) = self.advance() else {
            return Err(ExprError::UnexpectedEnd);
        };
        match spanned.token {
            Token::Int(n) => Ok(Expr::Literal(Value::from(n))),
            Token::Float(f) => serde_json::Number::from_f64(f)
                .map(|n| Expr::Literal(Value::Number(n)))
                .ok_or_else(|| ExprError::InvalidNumber(f.to_string())),
            Token::Str(s) => Ok(Expr::Literal(Value::String(s))),
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::Null => Ok(Expr::Literal(Value::Null)),
            Token::Ident(name) => {
                if self.eat(&Token::LParen) {
                    let args = self.parse_list_tail(&Token::RParen)?;
                    Ok(Expr::Call(name, args))
                } else {
                    Ok(Expr::Var(name))
                }
            }
            Token::LParen => {
                let inner = self.parse_or()?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Token::LBracket => Ok(Expr::List(self.parse_list_tail(&Token::RBracket)?)),
            other => Err(ExprError::UnexpectedToken {
                found: other.describe(),
                offset: spanned.offset,
            }),
        }
    }

    /// Comma separated expressions up to `close`; a trailing comma is allowed.
    fn parse_list_tail(&mut self, close: &Token) -> Result<Vec<Expr>, ExprError> {
        let mut items = Vec::new();
        loop {
            if self.eat(close) {
                return Ok(items);
            }
            items.push(self.parse_or()?);
            if !self.eat(&Token::Comma) {
                self.expect(close)?;
                return Ok(items);
            }
        }
    }
}

fn unexpected(s: &Spanned) -> ExprError {
    ExprError::UnexpectedToken {
        found: s.token.describe(),
        offset: s.offset,
    }
}
