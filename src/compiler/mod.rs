//! Single-pass compiler: parses tokens straight into bytecode.
//!
//! There is no syntax tree. The compiler pulls tokens from the scanner one
//! at a time with a single token of lookahead and emits instructions into a
//! [`Chunk`] as each construct is recognized.

mod exprs;
mod stmts;


use tracing::debug;

use crate::bytecode::{Chunk, Op, OperandTooLong, MAX_PROGRAM_LEN};
use crate::error::CompileError;
use crate::lexer::{Scanner, Token, TokenKind};
use crate::span::Span;

pub type CompileResult<T> = Result<T, CompileError>;

/// Compiles one source text into one bytecode chunk.
pub struct Compiler<'a> {
    scanner: Scanner<'a>,
    current: Token,
    chunk: Chunk,
    depth: usize,
}

impl<'a> Compiler<'a> {
    /// How deeply parentheses, blocks and object literals may nest.
    pub const MAX_NESTING: usize = 256;

    pub fn new(source: &'a str) -> Self {
        Self {
            scanner: Scanner::new(source),
            current: Token::eof(0, 1, 1),
            chunk: Chunk::new(),
            depth: 0,
        }
    }

    /// Compile the whole program, terminated by an implicit `EXIT`.
    /// Any error aborts compilation and no bytecode is returned.
    pub fn compile(mut self) -> CompileResult<Chunk> {
        self.current = self.scanner.scan_token()?;

        while !self.is_at_end() {
            self.statement()?;
        }

        let end = self.current_span();
        self.chunk.emit(Op::Exit);

        if self.chunk.len() > MAX_PROGRAM_LEN {
            return Err(CompileError::ProgramTooLarge {
                limit: MAX_PROGRAM_LEN,
                span: end,
            });
        }

        debug!(bytes = self.chunk.len(), "compiled program");
        Ok(self.chunk)
    }

    // ===== Token manipulation =====

    /// Move to the next token, returning the one just consumed.
    pub(crate) fn advance(&mut self) -> CompileResult<Token> {
        let next = self.scanner.scan_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.current
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current.kind == TokenKind::Eof
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            false
        } else {
            std::mem::discriminant(&self.current.kind) == std::mem::discriminant(kind)
        }
    }

    pub(crate) fn match_token(&mut self, kind: &TokenKind) -> CompileResult<bool> {
        if self.check(kind) {
            self.advance()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub(crate) fn expect(&mut self, kind: &TokenKind) -> CompileResult<Token> {
        if self.check(kind) {
            self.advance()
        } else {
            Err(self.unexpected(format!("'{}'", kind)))
        }
    }

    pub(crate) fn expect_identifier(&mut self) -> CompileResult<(String, Span)> {
        match &self.current.kind {
            TokenKind::Identifier(name) => {
                let name = name.clone();
                let span = self.current_span();
                self.advance()?;
                Ok((name, span))
            }
            _ => Err(self.unexpected("identifier")),
        }
    }

    pub(crate) fn unexpected(&self, expected: impl Into<String>) -> CompileError {
        CompileError::unexpected_token(
            expected,
            self.current.kind.to_string(),
            self.current_span(),
        )
    }

    pub(crate) fn current_span(&self) -> Span {
        self.current.span
    }

    // ===== Nesting =====

    /// Run `f` one nesting level deeper, failing with `TooDeep` past
    /// [`Self::MAX_NESTING`].
    pub(crate) fn nested<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> CompileResult<T>,
    ) -> CompileResult<T> {
        if self.depth >= Self::MAX_NESTING {
            return Err(CompileError::TooDeep {
                limit: Self::MAX_NESTING,
                span: self.current_span(),
            });
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    // ===== Emission =====

    pub(crate) fn emit(&mut self, op: Op) {
        self.chunk.emit(op);
    }

    /// Emit an instruction with a string operand, enforcing the operand
    /// length limit. `span` locates the offending token on failure.
    pub(crate) fn emit_with_str(&mut self, op: Op, text: &str, span: Span) -> CompileResult<()> {
        self.chunk
            .emit_with_str(op, text)
            .map(|_| ())
            .map_err(|OperandTooLong(length)| CompileError::StringTooLong { length, span })
    }
}
