//! Reader error-taxonomy coverage (spec §7, §4.9).

use wisp::ErrorKind;

#[test]
fn unterminated_list_reports_the_continuation_marker() {
    let err = wisp::parse("(+ 1 2", "t").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ParseError);
    assert!(err.message.contains("expecting matching ')'"));
}

#[test]
fn unterminated_string_is_a_parse_error() {
    let err = wisp::parse("\"unterminated", "t").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ParseError);
}

#[test]
fn stray_close_paren_is_a_parse_error() {
    let err = wisp::parse(")", "t").unwrap_err();
    assert_eq!(err.kind, ErrorKind::ParseError);
}

#[test]
fn source_location_is_annotated_on_unbound_symbol() {
    let (env, _decls) = wisp::embed(|_| {});
    let ast = wisp::parse("nope", "script.wisp").unwrap();
    let err = wisp::eval(&ast, &env).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnboundSymbol);
    assert_eq!(err.trace.first().map(|loc| loc.file.as_ref()), Some("script.wisp"));
}

#[test]
fn error_native_carries_a_user_supplied_payload() {
    let (env, _decls) = wisp::embed(|_| {});
    let ast = wisp::parse(r#"(error "boom")"#, "t").unwrap();
    let err = wisp::eval(&ast, &env).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UserError);
    assert_eq!(err.to_value(), wisp::Value::string("boom"));
}
