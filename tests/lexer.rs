use apl::{
    diagnostics::{DiagnosticKind, Position, Span},
    lexer::{Token, TokenKind, tokenize},
};

fn kinds(tokens: &[Token]) -> Vec<TokenKind> {
    tokens.iter().map(|token| token.kind).collect()
}

fn texts(tokens: &[Token]) -> Vec<&str> {
    tokens.iter().map(|token| token.text.as_str()).collect()
}

#[test]
fn classifies_each_token_kind() {
    let tokens = tokenize(r#"data x : Write("hi", 1.5);"#).expect("tokenize");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::Keyword,
            TokenKind::Identifier,
            TokenKind::Operator,
            TokenKind::Identifier,
            TokenKind::Bracket,
            TokenKind::String,
            TokenKind::Separator,
            TokenKind::Number,
            TokenKind::Bracket,
            TokenKind::Separator,
        ]
    );
    assert_eq!(
        texts(&tokens),
        vec!["data", "x", ":", "Write", "(", "\"hi\"", ",", "1.5", ")", ";"]
    );
}

#[test]
fn keywords_only_replace_whole_identifiers() {
    let tokens = tokenize("null import database nullable _data").expect("tokenize");
    assert_eq!(
        kinds(&tokens),
        vec![
            TokenKind::Keyword,
            TokenKind::Keyword,
            TokenKind::Identifier,
            TokenKind::Identifier,
            TokenKind::Identifier,
        ]
    );
}

#[test]
fn whitespace_produces_no_tokens() {
    let tokens = tokenize("  \t\n  ").expect("tokenize");
    assert!(tokens.is_empty());
}

#[test]
fn spans_track_lines_and_columns() {
    let tokens = tokenize("a\n  bc;").expect("tokenize");
    assert_eq!(
        tokens[0].span,
        Span::new(Position::new(0, 0), Position::new(0, 1))
    );
    assert_eq!(
        tokens[1].span,
        Span::new(Position::new(1, 2), Position::new(1, 4))
    );
    assert_eq!(
        tokens[2].span,
        Span::new(Position::new(1, 4), Position::new(1, 5))
    );
}

#[test]
fn multiline_string_advances_line() {
    let tokens = tokenize("\"a\nb\" x").expect("tokenize");
    assert_eq!(tokens[0].kind, TokenKind::String);
    assert_eq!(tokens[0].span.end, Position::new(1, 2));
    assert_eq!(tokens[1].span.begin, Position::new(1, 3));
}

#[test]
fn escaped_quote_stays_inside_string() {
    let tokens = tokenize(r#""say \"hi\"";"#).expect("tokenize");
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].text, r#""say \"hi\"""#);
}

#[test]
fn number_needs_digits_after_the_point() {
    let tokens = tokenize("3.14 42").expect("tokenize");
    assert_eq!(texts(&tokens), vec!["3.14", "42"]);

    let err = tokenize("1.;").expect_err("dangling point");
    assert_eq!(err.kind, DiagnosticKind::Lex);
    assert_eq!(err.position(), Some(Position::new(0, 1)));
}

#[test]
fn unmatched_character_aborts_tokenization() {
    let err = tokenize("1 +\n  # 2;").expect_err("should fail");
    assert_eq!(err.kind, DiagnosticKind::Lex);
    assert!(err.message.contains("'#'"), "{}", err.message);
    assert_eq!(err.position(), Some(Position::new(1, 2)));
    assert!(err.to_string().contains("line 2 column 3"), "{err}");
}

#[test]
fn unterminated_string_is_reported_at_the_quote() {
    let err = tokenize("x : \"open;").expect_err("should fail");
    assert_eq!(err.position(), Some(Position::new(0, 4)));
    assert!(err.notes.iter().any(|note| note.contains("never closed")));
}
