//! Numeric comparison and arithmetic natives (SPEC_FULL §C.5). Deliberately
//! small: the spec treats a standard numeric library as out of scope beyond
//! showing the registration contract, so this covers exactly what spec §8's
//! literal end-to-end scenarios need plus their obvious siblings.

use std::cmp::Ordering;

use crate::declarations::{Arity, DeclType, DeclarationsBuilder};
use crate::error::WispError;
use crate::value::Value;

pub fn register(b: &mut DeclarationsBuilder) {
    b.register("+", "arithmetic", "sums its arguments", Arity::at_least(0), vec![], DeclType::Number, true, add);
    b.register("-", "arithmetic", "subtracts the rest from the first argument, or negates a single argument", Arity::at_least(1), vec![], DeclType::Number, true, sub);
    b.register("*", "arithmetic", "multiplies its arguments", Arity::at_least(0), vec![], DeclType::Number, true, mul);
    b.register("<=", "arithmetic", "true if arguments are non-decreasing", Arity::at_least(1), vec![], DeclType::Bool, true, |a| compare_chain(a, |o| o != Ordering::Greater));
    b.register("<", "arithmetic", "true if arguments are strictly increasing", Arity::at_least(1), vec![], DeclType::Bool, true, |a| compare_chain(a, |o| o == Ordering::Less));
    b.register(">=", "arithmetic", "true if arguments are non-increasing", Arity::at_least(1), vec![], DeclType::Bool, true, |a| compare_chain(a, |o| o != Ordering::Less));
    b.register(">", "arithmetic", "true if arguments are strictly decreasing", Arity::at_least(1), vec![], DeclType::Bool, true, |a| compare_chain(a, |o| o == Ordering::Greater));
    b.register("=", "arithmetic", "true if all arguments are numerically equal", Arity::at_least(1), vec![], DeclType::Bool, true, |a| compare_chain(a, |o| o == Ordering::Equal));
}

fn to_f64(v: &Value) -> Result<f64, WispError> {
    match v.strip_source() {
        Value::Int(i) => Ok(*i as f64),
        Value::Float(f) => Ok(*f),
        other => Err(WispError::type_error(format!("expected a number, got {}", other.type_name()))),
    }
}

fn all_int(args: &[Value]) -> bool {
    args.iter().all(|a| matches!(a.strip_source(), Value::Int(_)))
}

fn add(args: &[Value]) -> Result<Value, WispError> {
    if all_int(args) {
        let mut sum = 0i64;
        for a in args {
            sum = sum.checked_add(a.as_int().unwrap()).ok_or_else(|| WispError::type_error("integer overflow in '+'"))?;
        }
        Ok(Value::Int(sum))
    } else {
        let mut sum = 0.0f64;
        for a in args {
            sum += to_f64(a)?;
        }
        Ok(Value::Float(sum))
    }
}

fn sub(args: &[Value]) -> Result<Value, WispError> {
    if args.len() == 1 {
        return if all_int(args) {
            args[0].as_int().unwrap().checked_neg().map(Value::Int).ok_or_else(|| WispError::type_error("integer overflow in '-'"))
        } else {
            Ok(Value::Float(-to_f64(&args[0])?))
        };
    }
    if all_int(args) {
        let mut acc = args[0].as_int().unwrap();
        for a in &args[1..] {
            acc = acc.checked_sub(a.as_int().unwrap()).ok_or_else(|| WispError::type_error("integer overflow in '-'"))?;
        }
        Ok(Value::Int(acc))
    } else {
        let mut acc = to_f64(&args[0])?;
        for a in &args[1..] {
            acc -= to_f64(a)?;
        }
        Ok(Value::Float(acc))
    }
}

fn mul(args: &[Value]) -> Result<Value, WispError> {
    if all_int(args) {
        let mut acc = 1i64;
        for a in args {
            acc = acc.checked_mul(a.as_int().unwrap()).ok_or_else(|| WispError::type_error("integer overflow in '*'"))?;
        }
        Ok(Value::Int(acc))
    } else {
        let mut acc = 1.0f64;
        for a in args {
            acc *= to_f64(a)?;
        }
        Ok(Value::Float(acc))
    }
}

fn pair_order(a: &Value, b: &Value) -> Result<Ordering, WispError> {
    match (a.strip_source(), b.strip_source()) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        _ => to_f64(a)?.partial_cmp(&to_f64(b)?).ok_or_else(|| WispError::type_error("cannot compare NaN")),
    }
}

fn compare_chain(args: &[Value], accept: impl Fn(Ordering) -> bool) -> Result<Value, WispError> {
    for w in args.windows(2) {
        if !accept(pair_order(&w[0], &w[1])?) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sums_integers_exactly() {
        assert_eq!(add(&[Value::Int(1), Value::Int(2), Value::Int(3)]).unwrap(), Value::Int(6));
    }

    #[test]
    fn add_promotes_to_float_if_any_arg_is_float() {
        assert_eq!(add(&[Value::Int(1), Value::Float(2.5)]).unwrap(), Value::Float(3.5));
    }

    #[test]
    fn subtract_with_one_arg_negates() {
        assert_eq!(sub(&[Value::Int(5)]).unwrap(), Value::Int(-5));
    }

    #[test]
    fn comparison_chain_is_pairwise() {
        assert_eq!(compare_chain(&[Value::Int(1), Value::Int(2), Value::Int(3)], |o| o == Ordering::Less).unwrap(), Value::Bool(true));
        assert_eq!(compare_chain(&[Value::Int(1), Value::Int(3), Value::Int(2)], |o| o == Ordering::Less).unwrap(), Value::Bool(false));
    }
}
