use thiserror::Error;

use crate::lexer::{Token, TokenKind};

use super::{
    BinOpKind, ClassDef, Declaration, Expr, ExprKind, MethodBody, MethodDef, Param, Program,
    Stmt, StmtKind, TypeName, UnaryOpKind,
};

#[derive(Debug, Error, PartialEq)]
#[error("on line number {line}, syntax error: {message}")]
pub struct ParseError {
    pub line: u32,
    pub message: String,
}

type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug)]
pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, index: 0 }
    }

    pub fn parse(&mut self) -> ParseResult<Program> {
        self.parse_program()
    }

    fn is_eof(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn peek(&self, n: usize) -> Option<&TokenKind> {
        self.tokens.get(self.index + n).map(|t| &t.kind)
    }

    fn line(&self) -> u32 {
        self.tokens
            .get(self.index)
            .or(self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            line: self.line(),
            message: message.into(),
        }
    }

    fn consume(&mut self, kind: &TokenKind) -> bool {
        if self.peek(0) != Some(kind) {
            return false;
        }
        self.index += 1;
        true
    }

    fn expect(&mut self, kind: &TokenKind) -> ParseResult<()> {
        match self.peek(0) {
            None => Err(self.error(format!("expected {:?}, however reached EOF", kind))),
            Some(t) if t == kind => {
                self.index += 1;
                Ok(())
            }
            Some(t) => Err(self.error(format!("unexpected {:?} (was expecting {:?})", t, kind))),
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        match self.peek(0).cloned() {
            Some(TokenKind::Ident(name)) => {
                self.index += 1;
                Ok(name)
            }
            Some(t) => Err(self.error(format!("unexpected {:?} (was expecting Ident)", t))),
            None => Err(self.error("expected Ident, however reached EOF")),
        }
    }

    /// program = class*
    fn parse_program(&mut self) -> ParseResult<Program> {
        let line = self.line();
        let mut classes = vec![];

        while !self.is_eof() {
            classes.push(self.parse_class()?);
        }

        Ok(Program { classes, line })
    }

    /// class = "class" ident (":" ident)? "{" field* method* "}"
    fn parse_class(&mut self) -> ParseResult<ClassDef> {
        let line = self.line();
        self.expect(&TokenKind::Class)?;
        let name = self.expect_ident()?;
        let superclass = if self.consume(&TokenKind::Colon) {
            Some(self.expect_ident()?)
        } else {
            None
        };

        self.expect(&TokenKind::OpenCurlyBrace)?;
        let mut fields = vec![];
        while self.at_declaration() && self.peek(2) != Some(&TokenKind::OpenParen) {
            fields.push(self.parse_declaration()?);
        }

        let mut methods = vec![];
        while !self.consume(&TokenKind::CloseCurlyBrace) {
            methods.push(self.parse_method()?);
        }

        Ok(ClassDef {
            name,
            superclass,
            fields,
            methods,
            line,
        })
    }

    /// A declaration starts with a type followed by a name; a statement
    /// starting with an identifier is followed by "=".
    fn at_declaration(&self) -> bool {
        match self.peek(0) {
            Some(TokenKind::Int | TokenKind::Bool | TokenKind::Nothing) => true,
            Some(TokenKind::Ident(_)) => matches!(self.peek(1), Some(TokenKind::Ident(_))),
            _ => false,
        }
    }

    /// type = "int" | "bool" | "nothing" | ident
    fn parse_type(&mut self) -> ParseResult<TypeName> {
        if self.consume(&TokenKind::Int) {
            Ok(TypeName::Int)
        } else if self.consume(&TokenKind::Bool) {
            Ok(TypeName::Bool)
        } else if self.consume(&TokenKind::Nothing) {
            Ok(TypeName::Nothing)
        } else {
            Ok(TypeName::Class(self.expect_ident()?))
        }
    }

    /// declaration = type ident ("," ident)* ";"
    fn parse_declaration(&mut self) -> ParseResult<Declaration> {
        let line = self.line();
        let ty = self.parse_type()?;
        let mut names = vec![self.expect_ident()?];
        while self.consume(&TokenKind::Comma) {
            names.push(self.expect_ident()?);
        }
        self.expect(&TokenKind::SemiColon)?;

        Ok(Declaration { ty, names, line })
    }

    /// method = type ident "(" (param ("," param)*)? ")"
    ///          "{" declaration* stmt* "return" expr ";" "}"
    fn parse_method(&mut self) -> ParseResult<MethodDef> {
        let line = self.line();
        let return_type = self.parse_type()?;
        let name = self.expect_ident()?;
        let params = self.parse_params()?;

        self.expect(&TokenKind::OpenCurlyBrace)?;
        let mut locals = vec![];
        while self.at_declaration() {
            locals.push(self.parse_declaration()?);
        }

        let mut stmts = vec![];
        while !self.consume(&TokenKind::Return) {
            stmts.push(self.parse_stmt()?);
        }
        let ret = self.parse_expr()?;
        self.expect(&TokenKind::SemiColon)?;
        self.expect(&TokenKind::CloseCurlyBrace)?;

        Ok(MethodDef {
            name,
            params,
            return_type,
            body: MethodBody { locals, stmts, ret },
            line,
        })
    }

    /// params = "(" (type ident ("," type ident)*)? ")"
    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        let mut params = vec![];
        self.expect(&TokenKind::OpenParen)?;

        if !self.consume(&TokenKind::CloseParen) {
            loop {
                let line = self.line();
                let ty = self.parse_type()?;
                let name = self.expect_ident()?;
                params.push(Param { ty, name, line });
                if !self.consume(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::CloseParen)?;
        }

        Ok(params)
    }

    /// stmt = ident "=" expr ";"
    ///      | "if" "(" expr ")" "{" stmt* "}"
    ///      | "print" "(" expr ")" ";"
    fn parse_stmt(&mut self) -> ParseResult<Stmt> {
        let line = self.line();
        let kind = if self.consume(&TokenKind::If) {
            self.expect(&TokenKind::OpenParen)?;
            let expr = self.parse_expr()?;
            self.expect(&TokenKind::CloseParen)?;
            self.expect(&TokenKind::OpenCurlyBrace)?;
            let mut body = vec![];
            while !self.consume(&TokenKind::CloseCurlyBrace) {
                body.push(self.parse_stmt()?);
            }
            StmtKind::If(expr, body)
        } else if self.consume(&TokenKind::Print) {
            self.expect(&TokenKind::OpenParen)?;
            let expr = self.parse_expr()?;
            self.expect(&TokenKind::CloseParen)?;
            self.expect(&TokenKind::SemiColon)?;
            StmtKind::Print(expr)
        } else {
            let name = self.expect_ident()?;
            self.expect(&TokenKind::Equal)?;
            let expr = self.parse_expr()?;
            self.expect(&TokenKind::SemiColon)?;
            StmtKind::Assign(name, expr)
        };

        Ok(Stmt { kind, line })
    }

    fn binary(kind: BinOpKind, left: Expr, right: Expr) -> Expr {
        let line = left.line;
        Expr::new(ExprKind::Binary(kind, Box::new(left), Box::new(right)), line)
    }

    /// expr = equality ("and" equality)*
    pub fn parse_expr(&mut self) -> ParseResult<Expr> {
        let mut node = self.parse_equality()?;
        while self.consume(&TokenKind::And) {
            node = Self::binary(BinOpKind::And, node, self.parse_equality()?);
        }
        Ok(node)
    }

    /// equality = relational ("==" relational | "!=" relational)*
    fn parse_equality(&mut self) -> ParseResult<Expr> {
        let mut node = self.parse_relational()?;
        loop {
            if self.consume(&TokenKind::DoubleEqual) {
                node = Self::binary(BinOpKind::Equal, node, self.parse_relational()?);
            } else if self.consume(&TokenKind::NotEqual) {
                node = Self::binary(BinOpKind::NotEqual, node, self.parse_relational()?);
            } else {
                return Ok(node);
            }
        }
    }

    /// relational = add ("<" add | "<=" add)?
    fn parse_relational(&mut self) -> ParseResult<Expr> {
        let node = self.parse_add()?;
        if self.consume(&TokenKind::LessThan) {
            Ok(Self::binary(BinOpKind::LessThan, node, self.parse_add()?))
        } else if self.consume(&TokenKind::LessEqual) {
            Ok(Self::binary(BinOpKind::LessEqual, node, self.parse_add()?))
        } else {
            Ok(node)
        }
    }

    /// add = mul ("+" mul | "-" mul)*
    fn parse_add(&mut self) -> ParseResult<Expr> {
        let mut node = self.parse_mul()?;
        loop {
            if self.consume(&TokenKind::Plus) {
                node = Self::binary(BinOpKind::Add, node, self.parse_mul()?);
            } else if self.consume(&TokenKind::Minus) {
                node = Self::binary(BinOpKind::Sub, node, self.parse_mul()?);
            } else {
                return Ok(node);
            }
        }
    }

    /// mul = unary ("*" unary | "/" unary)*
    fn parse_mul(&mut self) -> ParseResult<Expr> {
        let mut node = self.parse_unary()?;
        loop {
            if self.consume(&TokenKind::Star) {
                node = Self::binary(BinOpKind::Mul, node, self.parse_unary()?);
            } else if self.consume(&TokenKind::Slash) {
                node = Self::binary(BinOpKind::Div, node, self.parse_unary()?);
            } else {
                return Ok(node);
            }
        }
    }

    /// unary = ("-" | "not") unary | primary
    fn parse_unary(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        let op = if self.consume(&TokenKind::Minus) {
            UnaryOpKind::Neg
        } else if self.consume(&TokenKind::Not) {
            UnaryOpKind::Not
        } else {
            return self.parse_primary();
        };
        let operand = self.parse_unary()?;
        Ok(Expr::new(ExprKind::Unary(op, Box::new(operand)), line))
    }

    /// args = "(" (expr ("," expr)*)? ")"
    fn parse_call_args(&mut self) -> ParseResult<Vec<Expr>> {
        let mut args = vec![];
        self.expect(&TokenKind::OpenParen)?;
        if !self.consume(&TokenKind::CloseParen) {
            args.push(self.parse_expr()?);
            while self.consume(&TokenKind::Comma) {
                args.push(self.parse_expr()?);
            }
            self.expect(&TokenKind::CloseParen)?;
        }
        Ok(args)
    }

    /// primary = num | "true" | "false" | "nothing" | "new" ident
    ///         | ident "." ident args | ident args | ident | "(" expr ")"
    fn parse_primary(&mut self) -> ParseResult<Expr> {
        let line = self.line();
        let Some(kind) = self.peek(0).cloned() else {
            return Err(self.error("expected expression, however reached EOF"));
        };
        self.index += 1;

        let kind = match kind {
            TokenKind::Num(n) => ExprKind::Num(n),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Nothing => ExprKind::Nothing,
            TokenKind::New => ExprKind::New(self.expect_ident()?),
            TokenKind::OpenParen => {
                let expr = self.parse_expr()?;
                self.expect(&TokenKind::CloseParen)?;
                return Ok(expr);
            }
            TokenKind::Ident(name) => {
                if self.consume(&TokenKind::Dot) {
                    let method = self.expect_ident()?;
                    let args = self.parse_call_args()?;
                    let receiver = Expr::new(ExprKind::Variable(name), line);
                    ExprKind::MethodCall(Box::new(receiver), method, args)
                } else if self.peek(0) == Some(&TokenKind::OpenParen) {
                    ExprKind::SelfCall(name, self.parse_call_args()?)
                } else {
                    ExprKind::Variable(name)
                }
            }
            t => {
                self.index -= 1;
                return Err(self.error(format!("unexpected {:?} (was expecting expression)", t)));
            }
        };

        Ok(Expr::new(kind, line))
    }
}
