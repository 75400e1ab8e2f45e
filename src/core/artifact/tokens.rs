//! Raw token stream attached to artifacts by the parser.

use serde::{Deserialize, Serialize};

/// Token classes the metric analyzers distinguish.
///
/// The parser maps its own token vocabulary onto these tags; everything the
/// analyzers do not care about becomes [`TokenKind::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Comment,
    DocComment,
    If,
    ElseIf,
    Else,
    Try,
    Catch,
    Case,
    Default,
    Goto,
    Switch,
    While,
    Do,
    For,
    Foreach,
    Function,
    Semicolon,
    CurlyBraceOpen,
    CurlyBraceClose,
    BooleanAnd,
    BooleanOr,
    LogicalAnd,
    LogicalOr,
    QuestionMark,
    Other,
}

impl TokenKind {
    /// Whether the token is a line or doc comment
    pub fn is_comment(self) -> bool {
        matches!(self, Self::Comment | Self::DocComment)
    }

    /// Stable tag used when hashing token streams
    pub fn tag(self) -> &'static str {
        match self {
            Self::Comment => "comment",
            Self::DocComment => "doc_comment",
            Self::If => "if",
            Self::ElseIf => "elseif",
            Self::Else => "else",
            Self::Try => "try",
            Self::Catch => "catch",
            Self::Case => "case",
            Self::Default => "default",
            Self::Goto => "goto",
            Self::Switch => "switch",
            Self::While => "while",
            Self::Do => "do",
            Self::For => "for",
            Self::Foreach => "foreach",
            Self::Function => "function",
            Self::Semicolon => "semicolon",
            Self::CurlyBraceOpen => "curly_open",
            Self::CurlyBraceClose => "curly_close",
            Self::BooleanAnd => "boolean_and",
            Self::BooleanOr => "boolean_or",
            Self::LogicalAnd => "logical_and",
            Self::LogicalOr => "logical_or",
            Self::QuestionMark => "question_mark",
            Self::Other => "other",
        }
    }
}

/// A single source token with its line span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Classified token type
    pub kind: TokenKind,

    /// Source text of the token
    pub image: String,

    /// First line the token touches (1-based)
    pub start_line: u32,

    /// Last line the token touches (inclusive)
    pub end_line: u32,
}

impl Token {
    /// Create a token confined to one line
    pub fn new(kind: TokenKind, image: impl Into<String>, line: u32) -> Self {
        Self {
            kind,
            image: image.into(),
            start_line: line,
            end_line: line,
        }
    }

    /// Create a token spanning several lines (block comments, heredocs)
    pub fn spanning(kind: TokenKind, image: impl Into<String>, start_line: u32, end_line: u32) -> Self {
        Self {
            kind,
            image: image.into(),
            start_line,
            end_line: end_line.max(start_line),
        }
    }

    /// Iterate over every line this token touches
    pub fn lines(&self) -> impl Iterator<Item = u32> {
        self.start_line..=self.end_line
    }
}
