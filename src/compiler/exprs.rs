//! Expression compilation: literals, variable reads, property chains,
//! object literals and `+`.

use crate::bytecode::Op;
use crate::error::CompileError;
use crate::lexer::TokenKind;

use super::{CompileResult, Compiler};

impl Compiler<'_> {
    /// expression := primary ('+' primary)*
    pub(crate) fn expression(&mut self) -> CompileResult<()> {
        self.primary()?;
        self.binary_tail()
    }

    /// Continue an already compiled operand with `+ primary` repetitions.
    /// Any other arithmetic operator is rejected.
    pub(crate) fn binary_tail(&mut self) -> CompileResult<()> {
        loop {
            if self.match_token(&TokenKind::Plus)? {
                self.primary()?;
                self.emit(Op::Add);
            } else if self.peek().kind.is_operator() {
                let token = self.peek();
                return Err(CompileError::unsupported_operator(
                    token.lexeme.clone(),
                    token.span,
                ));
            } else {
                return Ok(());
            }
        }
    }

    fn primary(&mut self) -> CompileResult<()> {
        let span = self.current_span();
        match &self.peek().kind {
            TokenKind::Number(n) => {
                let n = *n;
                self.advance()?;
                self.chunk.emit_number(n);
            }
            TokenKind::String(s) => {
                let s = s.clone();
                self.advance()?;
                self.emit_with_str(Op::PushStr, &s, span)?;
            }
            TokenKind::Boolean(b) => {
                let b = *b;
                self.advance()?;
                self.chunk.emit_bool(b);
            }
            TokenKind::Undefined => {
                self.advance()?;
                self.emit(Op::PushUndefined);
            }
            TokenKind::Null => {
                self.advance()?;
                self.emit(Op::PushNull);
            }
            TokenKind::Identifier(_) => self.variable()?,
            TokenKind::LeftParen => {
                self.advance()?;
                self.nested(|c| c.expression())?;
                self.expect(&TokenKind::RightParen)?;
            }
            TokenKind::LeftBrace => self.object_literal()?,
            TokenKind::Function | TokenKind::Return => {
                return Err(CompileError::unsupported_keyword(
                    self.peek().lexeme.clone(),
                    span,
                ));
            }
            _ => return Err(self.unexpected("expression")),
        }
        Ok(())
    }

    /// `name` followed by any number of `.property` reads.
    fn variable(&mut self) -> CompileResult<()> {
        let (name, span) = self.expect_identifier()?;
        self.emit_with_str(Op::PushVar, &name, span)?;

        while self.match_token(&TokenKind::Dot)? {
            let (property, span) = self.expect_identifier()?;
            self.emit_with_str(Op::GetProp, &property, span)?;
        }
        Ok(())
    }

    /// `{ key: expr, ... }`
    fn object_literal(&mut self) -> CompileResult<()> {
        self.expect(&TokenKind::LeftBrace)?;
        self.emit(Op::NewObject);

        if !self.check(&TokenKind::RightBrace) {
            loop {
                let (key, span) = self.expect_identifier()?;
                self.expect(&TokenKind::Colon)?;
                self.nested(|c| c.expression())?;
                self.emit_with_str(Op::SetProp, &key, span)?;

                if !self.match_token(&TokenKind::Comma)? {
                    break;
                }
            }
        }

        self.expect(&TokenKind::RightBrace)?;
        Ok(())
    }
}
