use crate::error::{Error, Result};
use regex::Regex;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Keyword,
    Identifier,
    Number,
    String,
    Asterisk,
    Comma,
    LParen,
    RParen,
    Semicolon,
    Dot,
    Equals,
    NotEquals,
    LessThan,
    GreaterThan,
    LessEqual,
    GreaterEqual,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    /// Keywords are stored uppercased; string literals have their outer
    /// quotes stripped; everything else is the raw lexeme.
    pub value: String,
    /// Byte offset of the lexeme in the input.
    pub position: usize,
}

/// The closed keyword set: statement heads, clause words, column types,
/// and constraint words. Matched case-insensitively.
const KEYWORD_PATTERN: &str = r"^(?i:SELECT|FROM|WHERE|INSERT|INTO|VALUES|UPDATE|SET|DELETE|CREATE|TABLE|DROP|INT|TEXT|REAL|BOOLEAN|VARCHAR|PRIMARY|KEY|NOT|NULL)\b";

/// Ordered pattern table. The scan takes the first pattern that matches
/// at the current offset, so order is load-bearing: keywords sit before
/// IDENTIFIER, the two-character operators before their one-character
/// prefixes, and NUMBER before DOT.
fn patterns() -> &'static [(Regex, Option<TokenKind>)] {
    static PATTERNS: OnceLock<Vec<(Regex, Option<TokenKind>)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let table: &[(&str, Option<TokenKind>)] = &[
            (r"^--[^\n]*", None),
            (r"^\s+", None),
            (KEYWORD_PATTERN, Some(TokenKind::Keyword)),
            (r"^[A-Za-z_][A-Za-z0-9_]*", Some(TokenKind::Identifier)),
            (r"^[0-9]+(\.[0-9]+)?", Some(TokenKind::Number)),
            (r"^'[^']*'", Some(TokenKind::String)),
            (r#"^"[^"]*""#, Some(TokenKind::String)),
            (r"^!=", Some(TokenKind::NotEquals)),
            (r"^<=", Some(TokenKind::LessEqual)),
            (r"^>=", Some(TokenKind::GreaterEqual)),
            (r"^=", Some(TokenKind::Equals)),
            (r"^<", Some(TokenKind::LessThan)),
            (r"^>", Some(TokenKind::GreaterThan)),
            (r"^\*", Some(TokenKind::Asterisk)),
            (r"^,", Some(TokenKind::Comma)),
            (r"^\(", Some(TokenKind::LParen)),
            (r"^\)", Some(TokenKind::RParen)),
            (r"^;", Some(TokenKind::Semicolon)),
            (r"^\.", Some(TokenKind::Dot)),
        ];
        table
            .iter()
            .map(|(pattern, kind)| (Regex::new(pattern).unwrap(), *kind))
            .collect()
    })
}

/// Scans `input` left to right into a token stream.
pub fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut offset = 0;

    while offset < input.len() {
        let rest = &input[offset..];
        let mut matched = false;

        for (regex, kind) in patterns() {
            let Some(m) = regex.find(rest) else {
                continue;
            };
            if let Some(kind) = kind {
                tokens.push(Token {
                    kind: *kind,
                    value: token_value(*kind, m.as_str()),
                    position: offset,
                });
            }
            offset += m.end();
            matched = true;
            break;
        }

        if !matched {
            let snippet: String = rest.chars().take(10).collect();
            return Err(Error::Lexical(format!(
                "unknown token at offset {}: '{}'",
                offset, snippet
            )));
        }
    }

    Ok(tokens)
}

fn token_value(kind: TokenKind, lexeme: &str) -> String {
    match kind {
        TokenKind::Keyword => lexeme.to_uppercase(),
        TokenKind::String => lexeme[1..lexeme.len() - 1].to_string(),
        _ => lexeme.to_string(),
    }
}
