//! Selector compiler.
//!
//! Turns a selector tree into the backend's declarative query document:
//! - `All` / `Any` become `{"$and": [..]}` / `{"$or": [..]}`
//! - a predicate becomes `{"field": {"$op": operand}}`
//! - an array match becomes `{"field": {"$elemMatch" | "$allMatch": <inner>}}`
//!
//! An empty field path drops the outer field key so the operator applies to
//! the current array element. The transform is pure and deterministic.

use serde_json::{Map, Value};

use crate::selector::Expr;

/// Compiles a single expression node and everything below it.
pub fn compile_expr(expr: &Expr) -> Value {
    match expr {
        Expr::Predicate { field, op, operand } => {
            keyed(field, single(op.keyword(), operand.clone()))
        }
        Expr::Combinator { kind, children } => single(
            kind.keyword(),
            Value::Array(children.iter().map(compile_expr).collect()),
        ),
        Expr::ArrayMatch { field, mode, inner } => {
            keyed(field, single(mode.keyword(), compile_expr(inner)))
        }
    }
}

fn single(key: &str, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.to_string(), value);
    Value::Object(map)
}

fn keyed(field: &str, body: Value) -> Value {
    if field.is_empty() {
        body
    } else {
        single(field, body)
    }
}
