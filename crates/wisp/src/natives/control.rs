//! `error`/`try` natives (spec §7, SPEC_FULL §C.2).

use crate::declarations::{Arity, DeclType, DeclarationsBuilder, ParamDecl};
use crate::env::Env;
use crate::error::WispError;
use crate::resource::ResourceTracker;
use crate::value::Value;

pub fn register(b: &mut DeclarationsBuilder) {
    b.register(
        "error",
        "control",
        "raises a UserError carrying the given payload",
        Arity::range(0, 1),
        vec![ParamDecl { name: "payload", ty: DeclType::Any, description: "error payload, typically a string" }],
        DeclType::Nil,
        false,
        raise_error,
    );
    b.register_env_aware(
        "try",
        "control",
        "calls thunk with no arguments; on error, calls handler with the error payload",
        Arity::exact(2),
        vec![
            ParamDecl { name: "thunk", ty: DeclType::Func, description: "zero-argument callable to attempt" },
            ParamDecl { name: "handler", ty: DeclType::Func, description: "called with the error payload if thunk raises" },
        ],
        DeclType::ReturnType,
        try_call,
    );
}

fn raise_error(args: &[Value]) -> Result<Value, WispError> {
    let payload = args.first().cloned().unwrap_or(Value::Nil);
    let message = payload.strip_source().as_str().map(str::to_owned).unwrap_or_else(|| "user error".to_string());
    Err(WispError::user(payload, message))
}

fn try_call(args: &[Value], env: &Env) -> Result<Value, WispError> {
    let res = ResourceTracker::unlimited();
    match crate::eval::apply(&args[0], vec![], env, &res) {
        Ok(v) => Ok(v),
        Err(e) => crate::eval::apply(&args[1], vec![e.to_value()], env, &res),
    }
}
