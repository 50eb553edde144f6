use minisql::error::Error;
use minisql::lexer::{Token, TokenKind, tokenize};

fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|token| token.kind).collect()
}

#[test]
fn test_keywords_are_case_insensitive_and_uppercased() {
    let tokens = tokenize("select FROM Where").unwrap();
    assert_eq!(
        kinds(&tokens),
        vec![TokenKind::Keyword, TokenKind::Keyword, TokenKind::Keyword]
    );
    let values: Vec<&str> = tokens.iter().map(|token| token.value.as_str()).collect();
    assert_eq!(values, vec!["SELECT", "FROM", "WHERE"]);
}

#[test]
fn test_keywords_win_over_identifiers() {
    let tokens = tokenize("table tables").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Keyword);
    assert_eq!(tokens[0].value, "TABLE");
    // A keyword followed by more word characters is an identifier.
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
    assert_eq!(tokens[1].value, "tables");
}

#[test]
fn test_identifiers_keep_their_case() {
    let tokens = tokenize("Users user_id _tmp9").unwrap();
    let values: Vec<&str> = tokens.iter().map(|token| token.value.as_str()).collect();
    assert_eq!(values, vec!["Users", "user_id", "_tmp9"]);
    assert!(tokens.iter().all(|t| t.kind == TokenKind::Identifier));
}

#[test]
fn test_string_literals_strip_quotes() {
    let tokens = tokenize("'Alice' \"Bob\"").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].value, "Alice");
    assert_eq!(tokens[1].kind, TokenKind::String);
    assert_eq!(tokens[1].value, "Bob");
}

#[test]
fn test_numbers() {
    let tokens = tokenize("42 3.25").unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[0].value, "42");
    assert_eq!(tokens[1].kind, TokenKind::Number);
    assert_eq!(tokens[1].value, "3.25");
}

#[test]
fn test_two_character_operators_win_over_prefixes() {
    let tokens = tokenize("<= >= != < > =").unwrap();
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::LessEqual,
            TokenKind::GreaterEqual,
            TokenKind::NotEquals,
            TokenKind::LessThan,
            TokenKind::GreaterThan,
            TokenKind::Equals,
        ]
    );
}

#[test]
fn test_punctuation() {
    let tokens = tokenize("* , ( ) ; .").unwrap();
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::Asterisk,
            TokenKind::Comma,
            TokenKind::LParen,
            TokenKind::RParen,
            TokenKind::Semicolon,
            TokenKind::Dot,
        ]
    );
}

#[test]
fn test_comments_skip_to_end_of_line() {
    let tokens = tokenize("SELECT -- everything here is ignored ;\n* FROM users").unwrap();
    let values: Vec<&str> = tokens.iter().map(|token| token.value.as_str()).collect();
    assert_eq!(values, vec!["SELECT", "*", "FROM", "users"]);
}

#[test]
fn test_positions_are_byte_offsets() {
    let tokens = tokenize("SELECT id FROM users").unwrap();
    let positions: Vec<usize> = tokens.iter().map(|token| token.position).collect();
    assert_eq!(positions, vec![0, 7, 10, 15]);
}

#[test]
fn test_unknown_character_reports_offset() {
    let err = tokenize("SELECT ~ FROM users").unwrap_err();
    match err {
        Error::Lexical(message) => {
            assert!(message.contains("offset 7"), "message was: {}", message);
            assert!(message.contains('~'), "message was: {}", message);
        }
        other => panic!("expected a lexical error, got {:?}", other),
    }
}

#[test]
fn test_full_statement_token_stream() {
    let tokens = tokenize("INSERT INTO users (id, name) VALUES (1, 'Alice');").unwrap();
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::Keyword,
            TokenKind::Keyword,
            TokenKind::Identifier,
            TokenKind::LParen,
            TokenKind::Identifier,
            TokenKind::Comma,
            TokenKind::Identifier,
            TokenKind::RParen,
            TokenKind::Keyword,
            TokenKind::LParen,
            TokenKind::Number,
            TokenKind::Comma,
            TokenKind::String,
            TokenKind::RParen,
            TokenKind::Semicolon,
        ]
    );
}

#[test]
fn test_number_with_dot_is_one_token() {
    let tokens = tokenize("price >= 9.99").unwrap();
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[2].value, "9.99");
}
