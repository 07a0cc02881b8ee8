//! AST rewrite pass: constant folding, local-variable numbering, `begin`
//! simplification (spec §4.7).
//!
//! Two invariants matter more than the individual rewrites: the pass must be
//! idempotent (`Optimize(Optimize(p)) = Optimize(p)`) and it must never
//! change observable behavior (`Eval(Optimize(p), e) = Eval(p, e)`, spec
//! §8). Both fall out of the same design choice: every rewrite here is
//! purely local (one AST node at a time) and every rewrite's output is a
//! fixed point of itself.

use std::rc::Rc;

use crate::declarations::Declarations;
use crate::env::Env;
use crate::error::WispError;
use crate::value::{SourceInfoData, Value};

const SPECIAL_FORMS: &[&str] = &["eval", "if", "and", "or", "coalesce", "coalesceNil", "define", "set", "setN", "begin", "!begin", "parallel", "time", "parser", "outer", "source"];

/// Rewrites `expr` into an equivalent, faster-to-evaluate form. `env` and
/// `decls` are consulted only to decide foldability — no mutation happens to
/// either (spec §9 "write-once during initialization").
pub fn optimize(expr: &Value, env: &Env, decls: &Declarations) -> Result<Value, WispError> {
    match expr {
        Value::SourceInfo(data) => {
            let inner = optimize(&data.inner, env, decls)?;
            Ok(Value::SourceInfo(Rc::new(SourceInfoData { file: Rc::clone(&data.file), line: data.line, col: data.col, inner })))
        }
        Value::List(items) if !items.is_empty() => optimize_list(items, env, decls),
        other => Ok(other.clone()),
    }
}

fn optimize_list(items: &[Value], env: &Env, decls: &Declarations) -> Result<Value, WispError> {
    let head_sym = items[0].strip_source().as_symbol();
    match head_sym {
        // Quoted data is never code; leave it exactly as read (spec §4.2).
        Some("quote") => Ok(Value::list(items.to_vec())),
        Some("lambda") => optimize_lambda(items, env, decls),
        Some("match") => optimize_match(items, env, decls),
        Some(name) if SPECIAL_FORMS.contains(&name) => {
            let mut out = Vec::with_capacity(items.len());
            out.push(items[0].clone());
            for it in &items[1..] {
                out.push(optimize(it, env, decls)?);
            }
            Ok(Value::list(out))
        }
        _ => optimize_application(items, env, decls),
    }
}

/// `match`'s pattern positions are data, not code (spec §4.6) — only the
/// scrutinee and each clause's result expression get optimized.
fn optimize_match(items: &[Value], env: &Env, decls: &Declarations) -> Result<Value, WispError> {
    let mut out = vec![items[0].clone()];
    if let Some(value_expr) = items.get(1) {
        out.push(optimize(value_expr, env, decls)?);
    }
    let clauses = &items[2..];
    let mut i = 0;
    while i + 1 < clauses.len() {
        out.push(clauses[i].clone());
        out.push(optimize(&clauses[i + 1], env, decls)?);
        i += 2;
    }
    if i < clauses.len() {
        out.push(optimize(&clauses[i], env, decls)?);
    }
    Ok(Value::list(out))
}

fn optimize_application(items: &[Value], env: &Env, decls: &Declarations) -> Result<Value, WispError> {
    let new_head = optimize(&items[0], env, decls)?;
    let new_args = items[1..].iter().map(|a| optimize(a, env, decls)).collect::<Result<Vec<_>, _>>()?;
    if let Some(name) = new_head.strip_source().as_symbol() {
        if let Some(decl) = decls.get(name) {
            if decl.foldable && new_args.iter().all(|a| is_literal(a)) {
                return decl.func.call(&new_args, env);
            }
        }
    }
    let mut out = Vec::with_capacity(1 + new_args.len());
    out.push(new_head);
    out.extend(new_args);
    Ok(Value::list(out))
}

fn is_literal(v: &Value) -> bool {
    matches!(v.strip_source(), Value::Nil | Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Str(_))
}

/// `(lambda params body [numVars])`: optimizes the body, then — for
/// positional-list params only — replaces references to the lambda's own
/// parameters with `LocalSlotIndex` and records `numVars` (spec §4.7).
fn optimize_lambda(items: &[Value], env: &Env, decls: &Declarations) -> Result<Value, WispError> {
    let params_value = items.get(1).cloned().unwrap_or(Value::Nil);
    let body = items.get(2).cloned().unwrap_or(Value::Nil);
    let optimized_body = optimize(&body, env, decls)?;
    let names = param_list_names(&params_value);
    let (final_body, num_vars) = match &names {
        Some(names) if !names.is_empty() => (number_locals(&optimized_body, names), names.len()),
        _ => (optimized_body, 0),
    };
    Ok(Value::list(vec![items[0].clone(), params_value, final_body, Value::Int(num_vars as i64)]))
}

/// `Some(names)` only for the positional-list parameter shape; `Rest`/`None`
/// forms are never numbered (there is no fixed slot count to assign them).
fn param_list_names(params: &Value) -> Option<Vec<Rc<str>>> {
    match params.strip_source() {
        Value::List(items) => items.iter().map(|p| p.strip_source().as_symbol().map(Rc::from)).collect(),
        _ => None,
    }
}

/// Replaces bare `Symbol` references to `names` with `LocalSlotIndex`,
/// stopping at quoted data and at any nested `lambda` body — a reference
/// inside a nested closure is a captured free variable and must stay
/// `Symbol` (spec §4.7 "captures and free variables retain Symbol form"),
/// since a `LocalSlotIndex` only ever addresses the *current* call frame.
fn number_locals(expr: &Value, names: &[Rc<str>]) -> Value {
    match expr {
        Value::SourceInfo(data) => Value::SourceInfo(Rc::new(SourceInfoData {
            file: Rc::clone(&data.file),
            line: data.line,
            col: data.col,
            inner: number_locals(&data.inner, names),
        })),
        Value::Symbol(s) => match names.iter().position(|n| n.as_ref() == s.as_ref()) {
            Some(idx) => Value::LocalSlotIndex(idx as u32),
            None => expr.clone(),
        },
        Value::List(items) => {
            if items.is_empty() {
                return expr.clone();
            }
            match items[0].strip_source().as_symbol() {
                Some("quote") | Some("lambda") => expr.clone(),
                _ => Value::list(items.iter().map(|it| number_locals(it, names)).collect()),
            }
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declarations::{Arity, DeclType, DeclarationsBuilder};
    use crate::eval::eval;
    use crate::reader::read_one;
    use crate::serializer::serialize;

    fn fixture() -> (Env, Declarations) {
        let env = Env::root();
        let mut builder = DeclarationsBuilder::new();
        builder.register("+", "arith", "adds numbers", Arity::at_least(0), vec![], DeclType::Int, true, |args: &[Value]| {
            let mut sum = 0i64;
            for a in args {
                sum += a.as_int().ok_or_else(|| WispError::type_error("+ expects integers"))?;
            }
            Ok(Value::Int(sum))
        });
        let decls = builder.build(&env);
        (env, decls)
    }

    #[test]
    fn folds_foldable_native_over_literal_args() {
        let (env, decls) = fixture();
        let ast = read_one("(+ 1 2 3)", "t").unwrap();
        let optimized = optimize(&ast, &env, &decls).unwrap();
        assert_eq!(optimized.strip_source().clone(), Value::Int(6));
    }

    #[test]
    fn does_not_fold_when_an_arg_is_not_literal() {
        let (env, decls) = fixture();
        let ast = read_one("(+ 1 x)", "t").unwrap();
        let optimized = optimize(&ast, &env, &decls).unwrap();
        assert!(matches!(optimized.strip_source(), Value::List(_)));
    }

    #[test]
    fn numbers_lambda_parameters_and_skips_free_variables() {
        let (env, decls) = fixture();
        let ast = read_one("(lambda (x y) (+ x y z))", "t").unwrap();
        let optimized = optimize(&ast, &env, &decls).unwrap();
        let items = optimized.strip_source().as_list().unwrap();
        assert_eq!(items[3], Value::Int(2)); // numVars
        let body = items[2].strip_source().as_list().unwrap();
        assert_eq!(body[1], Value::LocalSlotIndex(0)); // x
        assert_eq!(body[2], Value::LocalSlotIndex(1)); // y
        assert_eq!(body[3].strip_source().as_symbol(), Some("z")); // free var stays symbolic
    }

    #[test]
    fn nested_lambda_does_not_inherit_outer_numbering() {
        let (env, decls) = fixture();
        let ast = read_one("(lambda (x) (lambda (y) (+ x y)))", "t").unwrap();
        let optimized = optimize(&ast, &env, &decls).unwrap();
        let outer_body = optimized.strip_source().as_list().unwrap()[2].clone();
        let inner_lambda = outer_body.strip_source().as_list().unwrap();
        // The inner lambda numbered its own `y` during its own (earlier) recursive
        // optimize() call; the outer numbering pass never touches an already-numbered
        // nested lambda body. Only `x`, free in the inner lambda, stays a bare Symbol.
        let inner_body = inner_lambda[2].strip_source().as_list().unwrap();
        assert_eq!(inner_body[1].strip_source().as_symbol(), Some("x"));
        assert_eq!(inner_body[2], Value::LocalSlotIndex(0)); // y, numbered by the inner lambda's own pass
    }

    #[test]
    fn optimizer_is_idempotent() {
        let (env, decls) = fixture();
        let ast = read_one("(lambda (x y) (if (<= x y) (+ x y 1) x))", "t").unwrap();
        let once = optimize(&ast, &env, &decls).unwrap();
        let twice = optimize(&once, &env, &decls).unwrap();
        assert_eq!(serialize(&once), serialize(&twice));
    }

    #[test]
    fn optimize_then_eval_matches_plain_eval() {
        let (env, decls) = fixture();
        let ast = read_one("((lambda (x y) (+ x y)) 4 5)", "t").unwrap();
        let optimized = optimize(&ast, &env, &decls).unwrap();
        assert_eq!(eval(&ast, &env).unwrap(), eval(&optimized, &env).unwrap());
    }
}
