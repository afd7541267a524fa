//! Local evaluation of compiled selector documents.
//!
//! Follows the backend's matching rules closely enough to run queries
//! against in-memory documents:
//! - get_field_value: resolve a dotted field path
//! - collate: total order across JSON types (null < bool < number < string < array < object)
//! - matches: test a document against a compiled selector
//! - project: keep only the requested fields of a document

use std::cmp::Ordering;

use regex::Regex;
use serde_json::{Map, Value};

/// Resolve a dotted field path (e.g. "address.city"). `None` when any
/// segment is missing.
#[inline]
pub fn get_field_value<'a>(value: &'a Value, field_path: &str) -> Option<&'a Value> {
    let mut current = value;
    for part in field_path.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Compare two JSON values using the backend's collation order.
pub fn collate(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        (Value::Number(a), Value::Number(b)) => {
            let a = a.as_f64().unwrap_or(0.0);
            let b = b.as_f64().unwrap_or(0.0);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        (Value::Array(a), Value::Array(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                let ord = collate(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a.len().cmp(&b.len())
        }
        (Value::Object(a), Value::Object(b)) => {
            for ((ka, va), (kb, vb)) in a.iter().zip(b.iter()) {
                let ord = ka.cmp(kb).then_with(|| collate(va, vb));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            a.len().cmp(&b.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Numbers compare by value, everything else structurally.
#[inline]
pub fn values_equal(left: &Value, right: &Value) -> bool {
    collate(left, right) == Ordering::Equal
}

/// Test `doc` against a compiled selector document.
pub fn matches(selector: &Value, doc: &Value) -> bool {
    match_selector(selector, Some(doc))
}

fn is_operator_object(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty() && map.keys().all(|k| k.starts_with('$')),
        _ => false,
    }
}

fn match_selector(selector: &Value, value: Option<&Value>) -> bool {
    let Value::Object(entries) = selector else {
        return false;
    };
    entries.iter().all(|(key, arg)| {
        if key.starts_with('$') {
            match_operator(key, arg, value)
        } else {
            let field = value.and_then(|v| get_field_value(v, key));
            match_field(field, arg)
        }
    })
}

fn match_field(field: Option<&Value>, arg: &Value) -> bool {
    if is_operator_object(arg) {
        match_selector(arg, field)
    } else {
        field.is_some_and(|v| values_equal(v, arg))
    }
}

fn match_operator(op: &str, arg: &Value, value: Option<&Value>) -> bool {
    match op {
        "$and" => arg
            .as_array()
            .is_some_and(|children| children.iter().all(|c| match_selector(c, value))),
        "$or" => arg
            .as_array()
            .is_some_and(|children| children.iter().any(|c| match_selector(c, value))),
        "$elemMatch" => match value {
            Some(Value::Array(items)) => items.iter().any(|item| match_array_item(arg, item)),
            _ => false,
        },
        "$allMatch" => match value {
            Some(Value::Array(items)) if !items.is_empty() => {
                items.iter().all(|item| match_array_item(arg, item))
            }
            _ => false,
        },
        "$exists" => arg.as_bool().is_some_and(|want| want == value.is_some()),
        "$regex" => match (value, arg) {
            (Some(Value::String(s)), Value::String(pattern)) => {
                safe_regex(pattern).is_ok_and(|re| re.is_match(s))
            }
            _ => false,
        },
        _ => {
            let Some(value) = value else {
                return false;
            };
            match op {
                "$eq" => values_equal(value, arg),
                "$ne" => !values_equal(value, arg),
                "$gt" => collate(value, arg) == Ordering::Greater,
                "$gte" => collate(value, arg) != Ordering::Less,
                "$lt" => collate(value, arg) == Ordering::Less,
                "$lte" => collate(value, arg) != Ordering::Greater,
                _ => false,
            }
        }
    }
}

fn match_array_item(arg: &Value, item: &Value) -> bool {
    if arg.is_object() {
        match_selector(arg, Some(item))
    } else {
        values_equal(item, arg)
    }
}

/// Compile a regex with a pattern length limit.
pub fn safe_regex(pattern: &str) -> Result<Regex, regex::Error> {
    if pattern.len() > 1000 {
        return Err(regex::Error::Syntax(
            "Pattern too long (max 1000 chars)".to_string(),
        ));
    }
    Regex::new(pattern)
}

/// Keep only `fields` of `doc`. Dotted paths rebuild the nesting; missing
/// fields are left out.
pub fn project(doc: &Value, fields: &[String]) -> Value {
    let mut out = Map::new();
    for path in fields {
        let Some(value) = get_field_value(doc, path) else {
            continue;
        };
        let mut parts = path.split('.').peekable();
        let mut target = &mut out;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                target.insert(part.to_string(), value.clone());
                break;
            }
            let entry = target
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match entry {
                Value::Object(map) => target = map,
                _ => break,
            }
        }
    }
    Value::Object(out)
}
