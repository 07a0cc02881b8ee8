//! List construction/destructuring natives (SPEC_FULL §C.5).

use crate::declarations::{Arity, DeclType, DeclarationsBuilder};
use crate::error::WispError;
use crate::value::Value;

pub fn register(b: &mut DeclarationsBuilder) {
    b.register("list", "lists", "builds a list from its arguments", Arity::at_least(0), vec![], DeclType::List, true, |args| Ok(Value::list(args.to_vec())));
    b.register("cons", "lists", "prepends an element to a list", Arity::exact(2), vec![], DeclType::List, true, cons);
    b.register("car", "lists", "returns the first element of a non-empty list", Arity::exact(1), vec![], DeclType::Any, true, car);
    b.register("cdr", "lists", "returns every element but the first", Arity::exact(1), vec![], DeclType::List, true, cdr);
}

fn as_list_items(v: &Value) -> Result<Vec<Value>, WispError> {
    match v.strip_source() {
        Value::Nil => Ok(Vec::new()),
        Value::List(items) => Ok(items.to_vec()),
        other => Err(WispError::type_error(format!("expected a list, got {}", other.type_name()))),
    }
}

fn cons(args: &[Value]) -> Result<Value, WispError> {
    let mut items = vec![args[0].clone()];
    items.extend(as_list_items(&args[1])?);
    Ok(Value::list(items))
}

fn car(args: &[Value]) -> Result<Value, WispError> {
    let items = as_list_items(&args[0])?;
    items.into_iter().next().ok_or_else(|| WispError::type_error("car of an empty list"))
}

fn cdr(args: &[Value]) -> Result<Value, WispError> {
    let items = as_list_items(&args[0])?;
    if items.is_empty() {
        return Err(WispError::type_error("cdr of an empty list"));
    }
    Ok(Value::list(items[1..].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cons_prepends_onto_an_existing_list() {
        let result = cons(&[Value::Int(1), Value::list(vec![Value::Int(2), Value::Int(3)])]).unwrap();
        assert_eq!(result, Value::list(vec![Value::Int(1), Value::Int(2), Value::Int(3)]));
    }

    #[test]
    fn car_and_cdr_split_a_list() {
        let list = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert_eq!(car(&[list.clone()]).unwrap(), Value::Int(1));
        assert_eq!(cdr(&[list]).unwrap(), Value::list(vec![Value::Int(2)]));
    }

    #[test]
    fn car_of_empty_list_is_a_type_error() {
        let err = car(&[Value::list(vec![])]).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::TypeError);
    }
}
