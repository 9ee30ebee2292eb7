//! Error types for every phase: lexing, compiling and execution.

use crate::span::Span;
use thiserror::Error;

/// Lexer errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexerError {
    #[error("Unexpected character '{0}' at {1}")]
    UnexpectedChar(char, Span),

    #[error("Unterminated string at {0}")]
    UnterminatedString(Span),

    #[error("Unterminated block comment at {0}")]
    UnterminatedComment(Span),
}

impl LexerError {
    pub fn unexpected_char(c: char, span: Span) -> Self {
        Self::UnexpectedChar(c, span)
    }

    pub fn unterminated_string(span: Span) -> Self {
        Self::UnterminatedString(span)
    }

    pub fn unterminated_comment(span: Span) -> Self {
        Self::UnterminatedComment(span)
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedChar(_, span) => *span,
            Self::UnterminatedString(span) => *span,
            Self::UnterminatedComment(span) => *span,
        }
    }
}

/// Syntax and code generation errors raised while compiling.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("Unexpected token '{found}', expected {expected} at {span}")]
    UnexpectedToken {
        expected: String,
        found: String,
        span: Span,
    },

    #[error("Unsupported operator '{0}' at {1}")]
    UnsupportedOperator(String, Span),

    #[error("Unsupported keyword '{0}' at {1}")]
    UnsupportedKeyword(String, Span),

    #[error("String of {length} bytes exceeds the 255 byte limit at {span}")]
    StringTooLong { length: usize, span: Span },

    #[error("Program exceeds the maximum bytecode size of {limit} bytes at {span}")]
    ProgramTooLarge { limit: usize, span: Span },

    #[error("Nesting deeper than {limit} levels at {span}")]
    TooDeep { limit: usize, span: Span },

    #[error(transparent)]
    Lexer(#[from] LexerError),
}

impl CompileError {
    pub fn unexpected_token(
        expected: impl Into<String>,
        found: impl Into<String>,
        span: Span,
    ) -> Self {
        Self::UnexpectedToken {
            expected: expected.into(),
            found: found.into(),
            span,
        }
    }

    pub fn unsupported_operator(op: impl Into<String>, span: Span) -> Self {
        Self::UnsupportedOperator(op.into(), span)
    }

    pub fn unsupported_keyword(keyword: impl Into<String>, span: Span) -> Self {
        Self::UnsupportedKeyword(keyword.into(), span)
    }

    pub fn span(&self) -> Span {
        match self {
            Self::UnexpectedToken { span, .. } => *span,
            Self::UnsupportedOperator(_, span) => *span,
            Self::UnsupportedKeyword(_, span) => *span,
            Self::StringTooLong { span, .. } => *span,
            Self::ProgramTooLarge { span, .. } => *span,
            Self::TooDeep { span, .. } => *span,
            Self::Lexer(err) => err.span(),
        }
    }
}

/// Runtime errors. `offset` is the byte offset of the faulting instruction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("Operand stack overflow (capacity {capacity}) at offset {offset}")]
    StackOverflow { capacity: usize, offset: usize },

    #[error("Operand stack underflow at offset {offset}")]
    StackUnderflow { offset: usize },

    #[error("Call stack overflow (depth {depth}) at offset {offset}")]
    CallStackOverflow { depth: usize, offset: usize },

    #[error("Return without a matching call at offset {offset}")]
    CallStackUnderflow { offset: usize },

    #[error("Undefined variable '{name}' at offset {offset}")]
    UndefinedVariable { name: String, offset: usize },

    #[error("Unknown opcode {opcode} at offset {offset}")]
    UnknownOpcode { opcode: u8, offset: usize },

    #[error("Truncated operand for {op} at offset {offset}")]
    TruncatedOperand { op: &'static str, offset: usize },

    #[error("Name operand is not valid UTF-8 at offset {offset}")]
    InvalidName { offset: usize },

    #[error("Jump target {target} is outside the program ({len} bytes) at offset {offset}")]
    JumpOutOfRange {
        target: usize,
        len: usize,
        offset: usize,
    },

    #[error("Cannot add {left} and {right} at offset {offset}")]
    UnsupportedOperands {
        left: &'static str,
        right: &'static str,
        offset: usize,
    },

    #[error("Cannot access property '{property}' on {value_type} at offset {offset}")]
    NotAnObject {
        value_type: &'static str,
        property: String,
        offset: usize,
    },

    #[error("Too many variables in one scope (limit {limit}) at offset {offset}")]
    TooManyBindings { limit: usize, offset: usize },

    #[error("Too many properties on one object (limit {limit}) at offset {offset}")]
    TooManyProperties { limit: usize, offset: usize },

    #[error("Cannot leave the global scope at offset {offset}")]
    ScopeUnderflow { offset: usize },
}

impl RuntimeError {
    pub fn undefined_variable(name: impl Into<String>, offset: usize) -> Self {
        Self::UndefinedVariable {
            name: name.into(),
            offset,
        }
    }

    pub fn not_an_object(value_type: &'static str, property: impl Into<String>, offset: usize) -> Self {
        Self::NotAnObject {
            value_type,
            property: property.into(),
            offset,
        }
    }

    pub fn offset(&self) -> usize {
        match self {
            Self::StackOverflow { offset, .. }
            | Self::StackUnderflow { offset }
            | Self::CallStackOverflow { offset, .. }
            | Self::CallStackUnderflow { offset }
            | Self::UndefinedVariable { offset, .. }
            | Self::UnknownOpcode { offset, .. }
            | Self::TruncatedOperand { offset, .. }
            | Self::InvalidName { offset }
            | Self::JumpOutOfRange { offset, .. }
            | Self::UnsupportedOperands { offset, .. }
            | Self::NotAnObject { offset, .. }
            | Self::TooManyBindings { offset, .. }
            | Self::TooManyProperties { offset, .. }
            | Self::ScopeUnderflow { offset } => *offset,
        }
    }
}

/// A unified error type for all phases.
#[derive(Debug, Error)]
pub enum StackVmError {
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
