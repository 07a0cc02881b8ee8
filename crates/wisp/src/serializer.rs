//! AST value → text serializer (spec §4.9, §6 `Serialize`).
//!
//! `Parse(Serialize(v)) = v` holds for every base variant (`Nil`, `Bool`,
//! `Int`, `Float`, `String`, `Symbol`, `List`, `Vector`). Compound values
//! serialize to a reparsable form when one exists (`Proc` becomes
//! `(lambda ...)`) or to an opaque placeholder otherwise.

use std::fmt::Write;

use crate::value::{ParamSpec, Value};

pub fn serialize(v: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, v);
    out
}

fn write_value(out: &mut String, v: &Value) {
    match v.strip_source() {
        Value::Nil => out.push_str("nil"),
        Value::Bool(b) => out.push_str(if *b { "#t" } else { "#f" }),
        Value::Int(i) => {
            let _ = write!(out, "{i}");
        }
        Value::Float(f) => {
            if f.fract() == 0.0 && f.is_finite() {
                let _ = write!(out, "{f:.1}");
            } else {
                let _ = write!(out, "{f}");
            }
        }
        Value::Str(s) => write_string_literal(out, s),
        Value::Symbol(s) => out.push_str(s),
        Value::List(items) => {
            out.push('(');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                write_value(out, item);
            }
            out.push(')');
        }
        Value::Vector(items) => {
            out.push_str("#(");
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                }
                let _ = write!(out, "{item}");
            }
            out.push(')');
        }
        Value::NativeFn(..) => out.push_str("#<native-fn>"),
        Value::Proc(p) => {
            out.push_str("(lambda ");
            match &p.params {
                ParamSpec::None => out.push_str("()"),
                ParamSpec::Rest(name) => out.push_str(name),
                ParamSpec::List(names) => {
                    out.push('(');
                    for (i, n) in names.iter().enumerate() {
                        if i > 0 {
                            out.push(' ');
                        }
                        out.push_str(n);
                    }
                    out.push(')');
                }
            }
            out.push(' ');
            write_value(out, &p.body);
            out.push(')');
        }
        Value::ParserValue(_) => out.push_str("#<parser>"),
        Value::FastDict(d) => {
            out.push_str("#<dict:");
            let _ = write!(out, "{}", d.borrow().len());
            out.push('>');
        }
        Value::LocalSlotIndex(n) => {
            let _ = write!(out, "#<slot:{n}>");
        }
        Value::Custom(c) => {
            let _ = write!(out, "#<custom:{}>", c.tag);
        }
        Value::SourceInfo(_) => unreachable!("strip_source removed SourceInfo wrappers"),
    }
}

fn write_string_literal(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::read_one;

    fn round_trip(src: &str) {
        let v = read_one(src, "t").unwrap();
        let text = serialize(&v);
        let v2 = read_one(&text, "t").unwrap();
        assert_eq!(v.strip_source(), v2.strip_source(), "round trip of {src:?} produced {text:?}");
    }

    #[test]
    fn round_trips_base_variants() {
        round_trip("42");
        round_trip("-7");
        round_trip("3.5");
        round_trip(r#""hello\nworld""#);
        round_trip("foo");
        round_trip("(1 2 3)");
        round_trip("(a (b c) 1 \"s\")");
        round_trip("#t");
        round_trip("#f");
        round_trip("nil");
        round_trip("#(1 2 3)");
    }

    #[test]
    fn vector_serializes_with_hash_paren_syntax() {
        let v = Value::Vector(std::rc::Rc::new(vec![1.0, 2.5, -3.0]));
        assert_eq!(serialize(&v), "#(1 2.5 -3)");
    }
}
