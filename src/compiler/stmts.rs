//! Statement compilation: declarations, print, blocks, assignments.

use crate::bytecode::Op;
use crate::error::CompileError;
use crate::lexer::TokenKind;

use super::{CompileResult, Compiler};

impl Compiler<'_> {
    pub(crate) fn statement(&mut self) -> CompileResult<()> {
        match &self.peek().kind {
            TokenKind::Var => self.var_declaration()?,
            TokenKind::Print => self.print_statement()?,
            TokenKind::LeftBrace => self.block()?,
            TokenKind::Identifier(_) => self.assignment_or_expression()?,
            TokenKind::Function | TokenKind::Return => {
                let token = self.peek();
                return Err(CompileError::unsupported_keyword(
                    token.lexeme.clone(),
                    token.span,
                ));
            }
            _ => self.expression_statement()?,
        }

        self.match_token(&TokenKind::Semicolon)?;
        Ok(())
    }

    /// `var name` or `var name = expr`.
    fn var_declaration(&mut self) -> CompileResult<()> {
        self.expect(&TokenKind::Var)?;
        let (name, span) = self.expect_identifier()?;

        if self.match_token(&TokenKind::Equal)? {
            self.expression()?;
        } else {
            self.emit(Op::PushUndefined);
        }

        self.emit_with_str(Op::StoreVar, &name, span)
    }

    /// `print(expr)`.
    fn print_statement(&mut self) -> CompileResult<()> {
        self.expect(&TokenKind::Print)?;
        self.expect(&TokenKind::LeftParen)?;
        self.expression()?;
        self.expect(&TokenKind::RightParen)?;
        self.emit(Op::Print);
        Ok(())
    }

    /// A braced statement list with its own scope.
    fn block(&mut self) -> CompileResult<()> {
        self.expect(&TokenKind::LeftBrace)?;
        self.emit(Op::PushEnv);

        self.nested(|c| {
            while !c.check(&TokenKind::RightBrace) && !c.is_at_end() {
                c.statement()?;
            }
            Ok(())
        })?;

        self.expect(&TokenKind::RightBrace)?;
        self.emit(Op::PopEnv);
        Ok(())
    }

    /// Statements starting with an identifier: `x = e`, `x.p.q = e`, or an
    /// expression whose value is discarded.
    fn assignment_or_expression(&mut self) -> CompileResult<()> {
        let (name, span) = self.expect_identifier()?;

        if self.match_token(&TokenKind::Equal)? {
            self.expression()?;
            return self.emit_with_str(Op::StoreVar, &name, span);
        }

        self.emit_with_str(Op::PushVar, &name, span)?;

        while self.match_token(&TokenKind::Dot)? {
            let (property, span) = self.expect_identifier()?;
            if self.match_token(&TokenKind::Equal)? {
                self.expression()?;
                self.emit_with_str(Op::SetProp, &property, span)?;
                self.emit(Op::Pop);
                return Ok(());
            }
            self.emit_with_str(Op::GetProp, &property, span)?;
        }

        self.binary_tail()?;
        self.emit(Op::Pop);
        Ok(())
    }

    fn expression_statement(&mut self) -> CompileResult<()> {
        self.expression()?;
        self.emit(Op::Pop);
        Ok(())
    }
}
