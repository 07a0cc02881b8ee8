//! `wisp` — an embeddable Scheme-like evaluator (spec §1): tagged values,
//! tree-walking evaluation with tail reuse, lexical environments, `match`,
//! the Optimizer, and a fingerprinted associative dictionary.
//!
//! The module layout mirrors spec §2's component table; [`env`], [`value`],
//! [`eval`] and [`optimizer`] are the hard core, [`natives`]/[`docgen`] are
//! the ambient registry and documentation surface spec §6 asks the host to
//! wire up.

pub mod declarations;
pub mod dict;
pub mod docgen;
pub mod env;
pub mod error;
pub mod eval;
pub mod matcher;
pub mod natives;
pub mod optimizer;
pub mod parser_value;
pub mod reader;
pub mod resource;
pub mod serializer;
pub mod value;

use std::path::Path;

pub use declarations::{Declaration, Declarations, DeclarationsBuilder};
pub use env::Env;
pub use error::{ErrorKind, WispError, WispResult};
pub use resource::{CancellationToken, ResourceLimits, ResourceTracker};
pub use value::Value;

/// `Embed(globalInit)` (spec §6): builds the global Environment and its
/// Declarations registry in one step, registering every native this crate
/// ships (SPEC_FULL §C.5) plus whatever the host adds via `extra`.
pub fn embed(extra: impl FnOnce(&mut DeclarationsBuilder)) -> (Env, Declarations) {
    let global = Env::root();
    let mut builder = DeclarationsBuilder::new();
    natives::install(&mut builder);
    extra(&mut builder);
    let decls = builder.build(&global);
    (global, decls)
}

/// `Parse(source, filename) -> Value` (spec §6).
pub fn parse(source: &str, filename: &str) -> WispResult<Value> {
    reader::read_program(source, filename)
}

/// `Optimize(value, env) -> Value` (spec §6, §4.7).
pub fn optimize(value: &Value, env: &Env, decls: &Declarations) -> WispResult<Value> {
    optimizer::optimize(value, env, decls)
}

/// `Eval(value, env) -> Value` (spec §6), with default resource accounting.
pub fn eval(value: &Value, env: &Env) -> WispResult<Value> {
    eval::eval(value, env)
}

/// `Eval` under an explicit [`ResourceTracker`] (spec §5), for hosts that
/// enforce recursion-depth limits or cancellation.
pub fn eval_with(value: &Value, env: &Env, res: &ResourceTracker) -> WispResult<Value> {
    eval::eval_with(value, env, res)
}

/// `Apply(callable, args) -> Value` (spec §6): invokes any callable Value
/// with pre-evaluated arguments, without going through the Reader/Optimizer.
pub fn apply(callable: &Value, args: Vec<Value>, env: &Env, res: &ResourceTracker) -> WispResult<Value> {
    eval::apply(callable, args, env, res)
}

/// `Serialize(value) -> String` (spec §6, §4.9).
pub fn serialize(value: &Value) -> String {
    serializer::serialize(value)
}

/// `Help(nameOrNil)` (spec §6): `None` help text if `name` is not a
/// registered declaration.
pub fn help(decls: &Declarations, name: &str) -> Option<String> {
    docgen::help(decls, name)
}

/// `WriteDocumentation(folder)` (spec §6): emits one Markdown file per
/// declaration chapter under `dir`.
pub fn write_documentation(decls: &Declarations, dir: &Path) -> std::io::Result<()> {
    docgen::write_documentation(decls, dir)
}

/// The whole Declarations registry as a JSON array, for hosts that want
/// structured docs rather than Markdown.
pub fn documentation_json(decls: &Declarations) -> serde_json::Result<String> {
    docgen::render_json(decls)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prepare() -> (Env, Declarations) {
        embed(|_| {})
    }

    /// Spec §8 end-to-end scenario 1.
    #[test]
    fn sums_three_integers() {
        let (env, decls) = prepare();
        let ast = parse("(+ 1 2 3)", "t").unwrap();
        let optimized = optimize(&ast, &env, &decls).unwrap();
        assert_eq!(eval(&optimized, &env).unwrap(), Value::Int(6));
    }

    /// Spec §8 end-to-end scenario 2.
    #[test]
    fn applies_a_lambda_immediately() {
        let (env, decls) = prepare();
        let ast = parse("((lambda (x y) (* x y)) 6 7)", "t").unwrap();
        let optimized = optimize(&ast, &env, &decls).unwrap();
        assert_eq!(eval(&optimized, &env).unwrap(), Value::Int(42));
    }

    /// Spec §8 end-to-end scenario 3: recursive factorial via tail-reused `if`.
    #[test]
    fn recursive_factorial_via_define() {
        let (env, decls) = prepare();
        let def = parse("(define f (lambda (n) (if (<= n 1) 1 (* n (f (- n 1))))))", "t").unwrap();
        eval(&optimize(&def, &env, &decls).unwrap(), &env).unwrap();
        let call = parse("(f 5)", "t").unwrap();
        assert_eq!(eval(&optimize(&call, &env, &decls).unwrap(), &env).unwrap(), Value::Int(120));
    }

    /// Spec §8 end-to-end scenario 4: `match` with a `concat` pattern.
    #[test]
    fn match_with_concat_pattern_and_default() {
        let (env, _decls) = prepare();
        let ast = parse(r#"(match 3 1 "one" 2 "two" x (concat "other:" x))"#, "t").unwrap();
        assert_eq!(eval(&ast, &env).unwrap(), Value::string("other:3"));
    }

    /// Spec §8 end-to-end scenario 5: `set_assoc` chain builds a FastDict.
    #[test]
    fn set_assoc_chain_builds_a_dict() {
        let (env, _decls) = prepare();
        let def = parse(r#"(define dict (set_assoc (set_assoc (list) "a" 1) "b" 2))"#, "t").unwrap();
        eval(&def, &env).unwrap();
        assert_eq!(eval(&parse(r#"(dict "b")"#, "t").unwrap(), &env).unwrap(), Value::Int(2));
        assert_eq!(eval(&parse(r#"(dict "c")"#, "t").unwrap(), &env).unwrap(), Value::Nil);
    }

    /// Spec §8 end-to-end scenario 6: `begin` scopes its defines.
    #[test]
    fn begin_does_not_leak_its_defines() {
        let (env, _decls) = prepare();
        let ast = parse("(begin (define a 1) (define b 2) (+ a b))", "t").unwrap();
        assert_eq!(eval(&ast, &env).unwrap(), Value::Int(3));
        assert_eq!(env.get("a"), None);
        assert_eq!(env.get("b"), None);
    }

    /// Spec §8 universal property: `Parse(Serialize(v)) = v` for base variants.
    #[test]
    fn serialize_then_parse_round_trips_base_variants() {
        for src in ["42", "-7", "3.5", r#""hi""#, "sym", "(1 2 3)", "#t", "#f", "nil", "#(1 2 3)"] {
            let v = parse(src, "t").unwrap();
            let text = serialize(&v);
            let v2 = parse(&text, "t").unwrap();
            assert_eq!(v.strip_source(), v2.strip_source());
        }
    }

    /// Spec §8 universal property: `Eval(Optimize(p), e) = Eval(p, e)`.
    #[test]
    fn optimized_and_unoptimized_eval_agree() {
        let (env, decls) = prepare();
        let ast = parse("((lambda (x y) (+ x y)) 4 5)", "t").unwrap();
        let optimized = optimize(&ast, &env, &decls).unwrap();
        assert_eq!(eval(&ast, &env).unwrap(), eval(&optimized, &env).unwrap());
    }

    #[test]
    fn apply_invokes_a_proc_with_preevaluated_args() {
        let (env, decls) = prepare();
        let f = eval(&parse("(lambda (x y) (+ x y))", "t").unwrap(), &env).unwrap();
        let _ = decls;
        let res = ResourceTracker::unlimited();
        assert_eq!(apply(&f, vec![Value::Int(2), Value::Int(3)], &env, &res).unwrap(), Value::Int(5));
    }

    #[test]
    fn help_and_write_documentation_cover_a_registered_native() {
        let (_env, decls) = prepare();
        assert!(help(&decls, "+").is_some());
        let dir = std::env::temp_dir().join("wisp-docgen-test");
        write_documentation(&decls, &dir).unwrap();
        assert!(dir.join("arithmetic.md").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
