//! String natives (SPEC_FULL §C.5) — just enough to show the registration
//! contract spec.md §1 scopes a full string library out of.

use crate::declarations::{Arity, DeclType, DeclarationsBuilder};
use crate::error::WispError;
use crate::serializer::serialize;
use crate::value::Value;

pub fn register(b: &mut DeclarationsBuilder) {
    b.register("string-append", "strings", "concatenates its string arguments", Arity::at_least(0), vec![], DeclType::String, true, string_append);
    b.register("string-length", "strings", "returns the length of a string in bytes", Arity::exact(1), vec![], DeclType::Int, true, string_length);
    b.register("concat", "strings", "concatenates its arguments, stringifying any non-string values", Arity::at_least(0), vec![], DeclType::String, true, concat);
}

fn string_append(args: &[Value]) -> Result<Value, WispError> {
    let mut out = String::new();
    for a in args {
        out.push_str(a.strip_source().as_str().ok_or_else(|| WispError::type_error(format!("string-append expects strings, got {}", a.type_name())))?);
    }
    Ok(Value::string(out))
}

fn string_length(args: &[Value]) -> Result<Value, WispError> {
    let s = args[0].strip_source().as_str().ok_or_else(|| WispError::type_error(format!("string-length expects a string, got {}", args[0].type_name())))?;
    Ok(Value::Int(s.len() as i64))
}

/// Unlike `string-append`, accepts any value: strings are spliced in as-is,
/// everything else is rendered the way `serialize` would print it (spec §8
/// scenario 4: `(concat "other:" 3)` => `"other:3"`).
fn concat(args: &[Value]) -> Result<Value, WispError> {
    let mut out = String::new();
    for a in args {
        match a.strip_source().as_str() {
            Some(s) => out.push_str(s),
            None => out.push_str(&serialize(a)),
        }
    }
    Ok(Value::string(out))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_append_concatenates_in_order() {
        assert_eq!(string_append(&[Value::string("a"), Value::string("b")]).unwrap(), Value::string("ab"));
    }

    #[test]
    fn string_length_counts_bytes() {
        assert_eq!(string_length(&[Value::string("abc")]).unwrap(), Value::Int(3));
    }

    #[test]
    fn concat_stringifies_non_string_args() {
        assert_eq!(concat(&[Value::string("other:"), Value::Int(3)]).unwrap(), Value::string("other:3"));
    }
}
