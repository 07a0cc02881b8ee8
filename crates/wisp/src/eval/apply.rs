//! Application dispatch (spec §4.4) — the five callable shapes a List's
//! evaluated head can take, plus the boundary `Apply` op (spec §6).

use std::cell::RefCell;
use std::rc::Rc;

use crate::dict::FingerprintDict;
use crate::env::Env;
use crate::error::WispError;
use crate::parser_value::{self, ParserData};
use crate::resource::ResourceTracker;
use crate::value::{ParamSpec, ProcData, Value};

use super::eval_with;

/// One trampoline step: either the final value for this call, or a new
/// `(expr, env)` pair the outer loop should continue with in place (spec
/// §4.1 "tail reuse").
pub(crate) enum Step {
    Done(Value),
    Tail(Value, Env),
}

/// Evaluates the head and every operand left-to-right, then applies.
pub(crate) fn dispatch_application(items: &[Value], env: &Env, res: &ResourceTracker) -> Result<Step, WispError> {
    let head = eval_with(&items[0], env, res)?;
    let mut args = Vec::with_capacity(items.len().saturating_sub(1));
    for operand in &items[1..] {
        args.push(eval_with(operand, env, res)?);
    }
    apply_call(&head, args, env, res)
}

/// Applies an already-evaluated head to already-evaluated args. Shared by
/// the evaluator's own Application handling and the host-facing `Apply`
/// boundary op.
pub(crate) fn apply_call(head: &Value, args: Vec<Value>, env: &Env, res: &ResourceTracker) -> Result<Step, WispError> {
    let _ = res; // reserved: NativeFn/Proc entry already checked by eval_with's depth guard
    match head.strip_source() {
        Value::NativeFn(f, arity) => {
            if !arity.accepts(args.len()) {
                return Err(WispError::arity(format!(
                    "native function expects {} argument(s), got {}",
                    arity.describe(),
                    args.len()
                )));
            }
            Ok(Step::Done(f.call(&args, env)?))
        }
        Value::Proc(proc) => {
            let new_env = bind_proc_args(proc, args)?;
            Ok(Step::Tail(proc.body.clone(), new_env))
        }
        Value::List(items) => Ok(Step::Done(apply_assoc_list(items, args)?)),
        Value::FastDict(d) => Ok(Step::Done(apply_dict(d, args)?)),
        Value::ParserValue(p) => Ok(Step::Done(apply_parser(p, args)?)),
        other => Err(WispError::not_callable(other.type_name())),
    }
}

/// Runs the host-facing `Apply(callable, args)` boundary op (spec §6) to
/// completion, resolving a tail-reused Proc body via the ordinary loop.
pub fn apply(callable: &Value, args: Vec<Value>, env: &Env, res: &ResourceTracker) -> Result<Value, WispError> {
    match apply_call(callable, args, env, res)? {
        Step::Done(v) => Ok(v),
        Step::Tail(body, call_env) => eval_with(&body, &call_env, res),
    }
}

fn proc_label(proc: &ProcData) -> &str {
    proc.name.as_deref().unwrap_or("lambda")
}

/// Builds the call frame for a Proc invocation (spec §4.3, §4.5): a fresh
/// child of the Proc's *captured* environment, never the caller's.
fn bind_proc_args(proc: &ProcData, args: Vec<Value>) -> Result<Env, WispError> {
    match &proc.params {
        ParamSpec::None => {
            if !args.is_empty() {
                return Err(WispError::arity(format!("{} expects 0 arguments, got {}", proc_label(proc), args.len())));
            }
            Ok(new_call_frame(proc))
        }
        ParamSpec::Rest(name) => {
            let new_env = new_call_frame(proc);
            new_env.bind_local(Rc::clone(name), Value::list(args));
            Ok(new_env)
        }
        ParamSpec::List(names) => {
            if args.len() > names.len() {
                return Err(WispError::arity(format!(
                    "{} expects at most {} argument(s), got {}",
                    proc_label(proc),
                    names.len(),
                    args.len()
                )));
            }
            let new_env = new_call_frame(proc);
            if proc.num_vars > 0 {
                let mut slots = vec![Value::Nil; proc.num_vars];
                for (i, v) in args.into_iter().enumerate() {
                    if let Some(slot) = slots.get_mut(i) {
                        *slot = v;
                    }
                }
                new_env.init_slots(slots);
            } else {
                let mut args_iter = args.into_iter();
                for name in names.iter() {
                    let v = args_iter.next().unwrap_or(Value::Nil);
                    // `_` is a bind-less hole: the argument is still evaluated
                    // (it already was, above) but never bound (spec §4.3).
                    if name.as_ref() != "_" {
                        new_env.bind_local(Rc::clone(name), v);
                    }
                }
            }
            Ok(new_env)
        }
    }
}

fn new_call_frame(proc: &ProcData) -> Env {
    if proc.num_vars > 0 {
        proc.env.child_with_slots(proc.num_vars)
    } else {
        proc.env.child(false)
    }
}

/// Association-list-as-function (spec §4.4): flat `(k1 v1 k2 v2 ... [d])` or
/// nested `((k1 ...) (k2 ...))`, detected by whether the first element is
/// itself a list. Key comparison is `Value`'s own equality — nominal for
/// `NativeFn`/`Proc`/`ParserValue`/`FastDict`/`Custom` keys (spec §3.1, §9
/// Open Question #2).
fn apply_assoc_list(items: &[Value], args: Vec<Value>) -> Result<Value, WispError> {
    if args.len() != 1 {
        return Err(WispError::arity(format!("assoc-list application takes exactly 1 argument, got {}", args.len())));
    }
    let key = &args[0];
    if items.is_empty() {
        return Ok(Value::Nil);
    }
    let nested = matches!(items[0].strip_source(), Value::List(_));
    if nested {
        for sub in items {
            if let Value::List(sub_items) = sub.strip_source() {
                if let Some(first) = sub_items.first() {
                    if first == key {
                        return Ok(sub.strip_source().clone());
                    }
                }
            }
        }
        Ok(Value::Nil)
    } else {
        let mut i = 0;
        while i + 1 < items.len() {
            if &items[i] == key {
                return Ok(items[i + 1].clone());
            }
            i += 2;
        }
        if items.len() % 2 == 1 {
            Ok(items.last().cloned().unwrap())
        } else {
            Ok(Value::Nil)
        }
    }
}

fn apply_dict(d: &Rc<RefCell<FingerprintDict>>, args: Vec<Value>) -> Result<Value, WispError> {
    if args.len() != 1 {
        return Err(WispError::arity(format!("dict application takes exactly 1 argument, got {}", args.len())));
    }
    Ok(d.borrow().get(&args[0]).unwrap_or(Value::Nil))
}

fn apply_parser(p: &Rc<ParserData>, args: Vec<Value>) -> Result<Value, WispError> {
    if args.len() != 1 {
        return Err(WispError::arity(format!("parser application takes exactly 1 argument, got {}", args.len())));
    }
    let s = args[0]
        .strip_source()
        .as_str()
        .ok_or_else(|| WispError::type_error(format!("parser application expects a string, got {}", args[0].type_name())))?;
    parser_value::run(p, s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declarations::Arity;
    use crate::value::NativeFn;

    fn num_env() -> Env {
        Env::root()
    }

    #[test]
    fn assoc_list_proc_keys_use_nominal_equality() {
        let env = num_env();
        let body = Value::Int(1);
        let proc_a = Value::Proc(Rc::new(ProcData { name: None, params: ParamSpec::None, body: body.clone(), env: env.clone(), num_vars: 0 }));
        let proc_b = Value::Proc(Rc::new(ProcData { name: None, params: ParamSpec::None, body, env, num_vars: 0 }));
        let list = Value::list(vec![proc_a.clone(), Value::Int(1), Value::Int(2), Value::Int(9)]);
        let items = list.as_list().unwrap().to_vec();
        // Looking up with the exact same Proc handle succeeds...
        assert_eq!(apply_assoc_list(&items, vec![proc_a]).unwrap(), Value::Int(1));
        // ...but a structurally-identical-looking Proc is a different key.
        assert_eq!(apply_assoc_list(&items, vec![proc_b]).unwrap(), Value::Int(9));
    }

    #[test]
    fn flat_assoc_list_falls_back_to_trailing_default() {
        let items = vec![Value::string("a"), Value::Int(1), Value::Int(0)];
        assert_eq!(apply_assoc_list(&items, vec![Value::string("missing")]).unwrap(), Value::Int(0));
    }

    #[test]
    fn native_fn_arity_is_checked_before_calling() {
        let f = Value::NativeFn(NativeFn::Plain(Rc::new(|args: &[Value]| Ok(args[0].clone()))), Arity::exact(1));
        let res = ResourceTracker::unlimited();
        let err = apply_call(&f, vec![], &Env::root(), &res).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::ArityError);
    }
}
