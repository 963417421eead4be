//! Token types shared by the lexer and the parser.

use std::fmt;

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Attribute name, `#name` or `:value` placeholder, or dotted path.
    Ident,
    /// Numeric literal.
    Number,
    /// Quoted string literal.
    String,
    /// `TRUE`
    True,
    /// `FALSE`
    False,
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `NOT`
    Not,
    /// `BETWEEN`
    Between,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `,`
    Comma,
    /// End of input.
    Eof,
}

impl TokenKind {
    /// Look up a keyword, ignoring ASCII case.
    #[must_use]
    pub fn keyword(word: &str) -> Option<Self> {
        const KEYWORDS: [(&str, TokenKind); 6] = [
            ("AND", TokenKind::And),
            ("OR", TokenKind::Or),
            ("NOT", TokenKind::Not),
            ("BETWEEN", TokenKind::Between),
            ("TRUE", TokenKind::True),
            ("FALSE", TokenKind::False),
        ];
        KEYWORDS
            .iter()
            .find(|(kw, _)| kw.eq_ignore_ascii_case(word))
            .map(|(_, kind)| *kind)
    }

    /// Returns `true` for the six comparison operators.
    #[must_use]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ident => "identifier",
            Self::Number => "number",
            Self::String => "string",
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Eq => "'='",
            Self::Ne => "'<>'",
            Self::Lt => "'<'",
            Self::Le => "'<='",
            Self::Gt => "'>'",
            Self::Ge => "'>='",
            Self::Plus => "'+'",
            Self::Minus => "'-'",
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::Between => "BETWEEN",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::Comma => "','",
            Self::Eof => "EOF",
        };
        f.write_str(s)
    }
}

/// A lexed token: its kind, the exact source text, and where it started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Classification.
    pub kind: TokenKind,
    /// Source text as written. String literals keep their quotes.
    pub literal: String,
    /// Byte offset of the first character.
    pub offset: usize,
}

impl Token {
    /// Create a token.
    #[must_use]
    pub fn new(kind: TokenKind, literal: impl Into<String>, offset: usize) -> Self {
        Self {
            kind,
            literal: literal.into(),
            offset,
        }
    }

    /// Whether this token has the given kind.
    #[must_use]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }

    /// How the token is named in diagnostics.
    #[must_use]
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Ident => format!("identifier '{}'", self.literal),
            TokenKind::Number => format!("number {}", self.literal),
            TokenKind::String => format!("string {}", self.literal),
            TokenKind::Eof => "EOF".to_owned(),
            kind => kind.to_string(),
        }
    }
}
