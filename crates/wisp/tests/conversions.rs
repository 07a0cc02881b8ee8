//! Host-side `TryFrom<&Value>` conversions at the embedding boundary.

use wisp::{ErrorKind, Value};

fn eval(src: &str) -> Value {
    let (env, decls) = wisp::embed(|_| {});
    let ast = wisp::parse(src, "t").unwrap();
    let optimized = wisp::optimize(&ast, &env, &decls).unwrap();
    wisp::eval(&optimized, &env).unwrap()
}

#[test]
fn try_from_ok_int_to_i64() {
    let result = eval("42");
    let value: i64 = (&result).try_into().expect("conversion should succeed");
    assert_eq!(value, 42);
}

#[test]
fn try_from_ok_float_to_f64() {
    let result = eval("2.5");
    let value: f64 = (&result).try_into().expect("conversion should succeed");
    assert_eq!(value, 2.5);
}

#[test]
fn try_from_ok_string_to_string() {
    let result = eval(r#""hello""#);
    let value: String = (&result).try_into().expect("conversion should succeed");
    assert_eq!(value, "hello");
}

#[test]
fn try_from_ok_bool_true_to_bool() {
    let result = eval("#t");
    let value: bool = (&result).try_into().expect("conversion should succeed");
    assert!(value);
}

#[test]
fn try_from_err_string_to_i64() {
    let result = eval(r#""hello""#);
    let err = TryInto::<i64>::try_into(&result).expect_err("conversion should fail");
    assert_eq!(err.kind, ErrorKind::TypeError);
    assert_eq!(err.message, "expected int, got string");
}

#[test]
fn try_from_err_nil_to_i64() {
    let result = eval("nil");
    let err = TryInto::<i64>::try_into(&result).expect_err("conversion should fail");
    assert_eq!(err.message, "expected int, got nil");
}

#[test]
fn try_from_err_int_to_string() {
    let result = eval("42");
    let err = TryInto::<String>::try_into(&result).expect_err("conversion should fail");
    assert_eq!(err.message, "expected string, got int");
}

#[test]
fn try_from_err_list_to_bool() {
    let result = eval("(list 1 2)");
    let err = TryInto::<bool>::try_into(&result).expect_err("conversion should fail");
    assert_eq!(err.message, "expected bool, got list");
}
