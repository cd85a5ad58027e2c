use apl::{
    Value,
    ast::{Node, NodeKind, UnaryOperator},
    diagnostics::{Diagnostic, DiagnosticKind, Position, Span},
    lexer::tokenize,
    parser::{Window, parse_source},
    repl::import_instruction,
};

fn parse_one(source: &str) -> Node {
    let mut trees = parse_source(source).expect("parse should succeed");
    assert_eq!(trees.len(), 1, "expected a single statement");
    trees.remove(0)
}

fn render(source: &str) -> String {
    parse_one(source).to_string()
}

fn parse_error(source: &str) -> Diagnostic {
    match parse_source(source) {
        Ok(trees) => panic!("expected parse error, received {} tree(s)", trees.len()),
        Err(err) => err,
    }
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    assert_eq!(render("2 + 3 * 4;"), "(2 + (3 * 4))");
    assert_eq!(render("(2 + 3) * 4;"), "((2 + 3) * 4)");
}

#[test]
fn levels_fold_left() {
    assert_eq!(render("1 - 2 - 3;"), "((1 - 2) - 3)");
    assert_eq!(render("8 / 4 / 2;"), "((8 / 4) / 2)");
    assert_eq!(render("a : b : 1;"), "((a : b) : 1)");
}

#[test]
fn assignment_has_lowest_precedence() {
    assert_eq!(render("x : 1 + 2 * y;"), "(x : (1 + (2 * y)))");
}

#[test]
fn prefixes_apply_to_a_single_vertex() {
    assert_eq!(render("data x : -5;"), "(data(x) : -(5))");
    assert_eq!(render("-2 * 3;"), "(-(2) * 3)");
    assert_eq!(render("+(1 + 2);"), "+((1 + 2))");
    assert_eq!(render("import \"lib.apl\";"), "import(\"lib.apl\")");
}

#[test]
fn null_literal_is_an_empty_value() {
    let node = parse_one("null;");
    assert_eq!(node.kind, NodeKind::Value(None));
}

#[test]
fn invocation_arguments_are_full_expressions() {
    assert_eq!(render("Write(1, x : 2 + 3);"), "Write(1, (x : (2 + 3)))");
    assert_eq!(render("Write((1), (2 + (3)));"), "Write(1, (2 + 3))");
    assert_eq!(render("Write();"), "Write()");
}

#[test]
fn nested_brackets_match_their_own_pair() {
    assert_eq!(render("((1 + (2)) * ((3)));"), "((1 + 2) * 3)");
}

#[test]
fn string_escapes_are_decoded() {
    let node = parse_one(r#""a\n\"b\"\u0041";"#);
    assert_eq!(
        node.kind,
        NodeKind::Value(Some(Value::Text("a\n\"b\"A".to_string())))
    );
}

#[test]
fn backspace_and_form_feed_escapes() {
    let node = parse_one(r#""a\bc\f";"#);
    assert_eq!(
        node.kind,
        NodeKind::Value(Some(Value::Text("a\u{8}c\u{c}".to_string())))
    );
}

#[test]
fn surrogate_pair_decodes_to_one_character() {
    let node = parse_one(r#""\ud83d\ude00!";"#);
    assert_eq!(
        node.kind,
        NodeKind::Value(Some(Value::Text("\u{1F600}!".to_string())))
    );
}

#[test]
fn malformed_unicode_escapes_are_rejected() {
    for source in [
        r#""\u+041";"#,
        r#""\u12";"#,
        r#""\ud83d";"#,
        r#""\ud83dx";"#,
        r#""\ud83dA";"#,
        r#""\ude00";"#,
    ] {
        let err = parse_error(source);
        assert_eq!(err.kind, DiagnosticKind::Parse, "{source}");
        assert!(err.message.contains("invalid unicode escape"), "{source}: {}", err.message);
    }
}

#[test]
fn unknown_escape_is_rejected() {
    let err = parse_error(r#""\q";"#);
    assert_eq!(err.kind, DiagnosticKind::Parse);
    assert!(err.message.contains("invalid escape"), "{}", err.message);
}

#[test]
fn statements_are_split_on_separators() {
    let trees = parse_source("data x;\nx : 1;\nx;").expect("parse");
    let rendered: Vec<String> = trees.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["data(x)", "(x : 1)", "x"]);
}

#[test]
fn binary_span_runs_from_left_to_right_operand() {
    let node = parse_one("1 + 23;");
    assert_eq!(
        node.span,
        Span::new(Position::new(0, 0), Position::new(0, 6))
    );
}

#[test]
fn parent_spans_cover_children() {
    let node = parse_one("data x :\n  Write(1, 2);");
    assert_eq!(node.span.begin, Position::new(0, 0));
    assert_eq!(node.span.end, Position::new(1, 13));
    let NodeKind::Binary { left, right, .. } = &node.kind else {
        panic!("expected binary node, found {}", node.variant_name());
    };
    assert_eq!(left.span, Span::new(Position::new(0, 0), Position::new(0, 6)));
    assert_eq!(
        right.span,
        Span::new(Position::new(1, 2), Position::new(1, 13))
    );
}

#[test]
fn missing_terminator_points_at_end_of_input() {
    let err = parse_error("1 + 1");
    assert_eq!(err.kind, DiagnosticKind::Parse);
    assert!(err.message.contains("expected ';'"), "{}", err.message);
    assert_eq!(err.position(), Some(Position::new(0, 5)));
}

#[test]
fn terminator_expected_before_stray_token() {
    let err = parse_error("1 2;");
    assert!(err.message.contains("expected ';', found '2'"), "{}", err.message);
    assert_eq!(err.position(), Some(Position::new(0, 2)));
}

#[test]
fn unbalanced_bracket_expects_closing_pair() {
    let err = parse_error("(1 + 2;");
    assert_eq!(err.kind, DiagnosticKind::Parse);
    assert!(err.message.contains("expected ')'"), "{}", err.message);
    assert!(err.notes.iter().any(|note| note.contains("line 1 column 1")));
}

#[test]
fn bracket_window_must_be_consumed() {
    let err = parse_error("(1 2);");
    assert!(err.message.contains("expected ')', found '2'"), "{}", err.message);
}

#[test]
fn arguments_need_separators() {
    let err = parse_error("Write(1 2);");
    assert!(err.message.contains("expected ','"), "{}", err.message);
    assert_eq!(err.position(), Some(Position::new(0, 8)));
}

#[test]
fn missing_operand_is_reported_where_it_was_expected() {
    let err = parse_error("1 +;");
    assert!(err.message.contains("';'"), "{}", err.message);
    assert_eq!(err.position(), Some(Position::new(0, 3)));

    let err = parse_error("Write(1,);");
    assert!(err.message.contains("expected expression"), "{}", err.message);
}

#[test]
fn closing_bracket_cannot_start_an_expression() {
    let err = parse_error(");");
    assert!(err.message.contains("')'"), "{}", err.message);
}

#[test]
fn empty_input_has_no_statements() {
    assert!(parse_source("").expect("parse").is_empty());
    assert!(parse_source("  \n ").expect("parse").is_empty());
}

#[test]
fn sub_windows_share_one_cursor() {
    let tokens = tokenize("a b c d").expect("tokenize");
    let window = Window::new(&tokens);
    let inner = window.sub_window(1, 3);
    assert!(inner.shares_cursor_with(&window));
    assert_eq!(inner.bounds(), (1, 3));

    assert!(inner.token().is_none());
    window.seek(1);
    assert_eq!(inner.token().map(|t| t.text.as_str()), Some("b"));

    inner.advance();
    inner.advance();
    assert_eq!(window.index(), 3);
    assert!(inner.token().is_none());
    assert_eq!(window.token().map(|t| t.text.as_str()), Some("d"));
}

#[test]
fn sub_window_cannot_widen_its_parent() {
    let tokens = tokenize("a b c d").expect("tokenize");
    let window = Window::new(&tokens);
    let inner = window.sub_window(1, 3);
    let nested = inner.sub_window(0, 10);
    assert_eq!(nested.bounds(), (1, 3));
    assert!(!Window::new(&tokens).shares_cursor_with(&window));
}

#[test]
fn preload_instruction_round_trips_the_script_path() {
    let script = "dir\\with \"quotes\"\tand\u{1}controls.apl";
    let node = parse_one(&import_instruction(script));
    let NodeKind::Unary { operator, target } = &node.kind else {
        panic!("expected unary node, found {}", node.variant_name());
    };
    assert_eq!(*operator, UnaryOperator::Import);
    assert_eq!(target.kind, NodeKind::Value(Some(Value::from(script))));
}
