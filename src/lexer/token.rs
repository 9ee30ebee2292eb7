//! Token definitions for the lexer.

use crate::span::Span;

/// All token types the scanner produces.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Number(f64),
    String(String),
    Boolean(bool),
    Undefined,
    Null,

    Identifier(String),

    // Keywords
    Var,
    Print,
    Function,
    Return,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,

    // Punctuators
    Equal,
    Semicolon,
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Dot,
    Colon,
    Comma,

    Eof,
}

impl TokenKind {
    /// Classify an identifier-shaped word: keywords and the word literals
    /// `true`, `false`, `undefined` and `null` get dedicated kinds.
    pub fn keyword(ident: &str) -> Option<TokenKind> {
        match ident {
            "var" => Some(TokenKind::Var),
            "print" => Some(TokenKind::Print),
            "function" => Some(TokenKind::Function),
            "return" => Some(TokenKind::Return),
            "true" => Some(TokenKind::Boolean(true)),
            "false" => Some(TokenKind::Boolean(false)),
            "undefined" => Some(TokenKind::Undefined),
            "null" => Some(TokenKind::Null),
            _ => None,
        }
    }

    pub fn is_operator(&self) -> bool {
        matches!(
            self,
            TokenKind::Plus | TokenKind::Minus | TokenKind::Star | TokenKind::Slash
        )
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::String(s) => write!(f, "\"{}\"", s),
            TokenKind::Boolean(b) => write!(f, "{}", b),
            TokenKind::Undefined => write!(f, "undefined"),
            TokenKind::Null => write!(f, "null"),
            TokenKind::Identifier(s) => write!(f, "{}", s),
            TokenKind::Var => write!(f, "var"),
            TokenKind::Print => write!(f, "print"),
            TokenKind::Function => write!(f, "function"),
            TokenKind::Return => write!(f, "return"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Equal => write!(f, "="),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::LeftBrace => write!(f, "{{"),
            TokenKind::RightBrace => write!(f, "}}"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Eof => write!(f, "end of input"),
        }
    }
}

/// A token with its kind, raw lexeme and source location.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn eof(position: usize, line: usize, column: usize) -> Self {
        Self {
            kind: TokenKind::Eof,
            lexeme: String::new(),
            span: Span::new(position, position, line, column),
        }
    }
}
