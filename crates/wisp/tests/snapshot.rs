//! End-to-end Parse → Optimize → Eval snapshots (spec §8's literal scenarios).

use wisp::Value;

fn run(src: &str) -> Value {
    let (env, decls) = wisp::embed(|_| {});
    let ast = wisp::parse(src, "test").unwrap();
    let optimized = wisp::optimize(&ast, &env, &decls).unwrap();
    wisp::eval(&optimized, &env).unwrap()
}

#[test]
fn sums_three_integers() {
    assert_eq!(run("(+ 1 2 3)"), Value::Int(6));
}

#[test]
fn lambda_application_multiplies() {
    assert_eq!(run("((lambda (x y) (* x y)) 6 7)"), Value::Int(42));
}

#[test]
fn recursive_factorial_of_five() {
    assert_eq!(
        run("(begin (define f (lambda (n) (if (<= n 1) 1 (* n (f (- n 1)))))) (f 5))"),
        Value::Int(120)
    );
}

#[test]
fn match_falls_through_to_a_catch_all_binding() {
    assert_eq!(run(r#"(match 3 1 "one" 2 "two" x x)"#), Value::Int(3));
}

#[test]
fn set_assoc_chain_reads_back_both_keys() {
    assert_eq!(
        run(r#"(begin (define d (set_assoc (set_assoc (list) "a" 1) "b" 2)) (d "b"))"#),
        Value::Int(2)
    );
    assert_eq!(
        run(r#"(begin (define d (set_assoc (set_assoc (list) "a" 1) "b" 2)) (d "c"))"#),
        Value::Nil
    );
}

#[test]
fn begin_does_not_leak_its_local_defines() {
    let (env, decls) = wisp::embed(|_| {});
    let ast = wisp::parse("(begin (define a 1) (define b 2) (+ a b))", "test").unwrap();
    let optimized = wisp::optimize(&ast, &env, &decls).unwrap();
    assert_eq!(wisp::eval(&optimized, &env).unwrap(), Value::Int(3));
    assert_eq!(env.get("a"), None);
    assert_eq!(env.get("b"), None);
}

#[test]
fn try_routes_a_raised_error_to_its_handler() {
    assert_eq!(run(r#"(try (lambda () (error "boom")) (lambda (e) (string-append "caught: " e)))"#), Value::string("caught: boom"));
}

#[test]
fn apply_invokes_an_assoc_list_as_a_function() {
    assert_eq!(run(r#"((quote ("a" 1 "b" 2 0)) "missing")"#), Value::Int(0));
}
