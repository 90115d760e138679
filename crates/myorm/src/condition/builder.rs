use std::borrow::Cow;

use super::{Arg, Cond, FieldMap, Logic, Op};
use crate::error::{OrmError, OrmResult};
use crate::ident::quote_field;
use crate::value::Value;

/// Accumulates parenthesized fragments joined by one logic keyword.
pub(super) struct Fragments {
    logic: Logic,
    sql: String,
}

impl Fragments {
    pub(super) fn new(logic: Logic) -> Self {
        Self {
            logic,
            sql: String::new(),
        }
    }

    /// Append `(frag)`; blank fragments are skipped.
    pub(super) fn push(&mut self, frag: &str) {
        let frag = frag.trim();
        if frag.is_empty() {
            return;
        }
        if !self.sql.is_empty() {
            self.sql.push(' ');
            self.sql.push_str(self.logic.as_str());
            self.sql.push(' ');
        }
        self.sql.push('(');
        self.sql.push_str(frag);
        self.sql.push(')');
    }

    pub(super) fn finish(self) -> String {
        self.sql
    }
}

/// Compile a condition specification into a SQL boolean expression.
///
/// Returns an empty string when the specification holds no predicate.
pub fn build(cond: &Cond, logic: Logic) -> OrmResult<String> {
    let mut out = Fragments::new(logic);
    match cond {
        Cond::Raw(sql) => out.push(sql),
        Cond::List(items) => {
            for item in items {
                out.push(&build(item, logic)?);
            }
        }
        Cond::Map(map) => out.push(&build_field_map(map, logic)?),
        Cond::MapList(maps) => {
            for map in maps {
                out.push(&build_field_map(map, logic)?);
            }
        }
        Cond::Tree(tree) => out.push(&tree.build()?),
    }
    Ok(out.finish())
}

/// Compile one field map: every entry becomes a parenthesized predicate joined by `logic`.
pub fn build_field_map(map: &FieldMap, logic: Logic) -> OrmResult<String> {
    let mut out = Fragments::new(logic);
    for (key, arg) in map {
        let key = key.trim();
        if let Some(sub_logic) = Logic::from_key(key) {
            let nested = nested_cond(key, arg)?;
            out.push(&build(&nested, sub_logic)?);
            continue;
        }

        let (field, op) = match key.split_once(' ') {
            Some((field, op)) => (field, Op::parse(op)?),
            None => (key, Op::Eq),
        };
        let Arg::Value(value) = arg else {
            return Err(OrmError::shape(format!(
                "field '{field}' expects a value, got a nested condition"
            )));
        };
        out.push(&build_predicate(field, op, value)?);
    }
    Ok(out.finish())
}

fn nested_cond<'a>(key: &str, arg: &'a Arg) -> OrmResult<Cow<'a, Cond>> {
    match arg {
        Arg::Nested(cond) => Ok(Cow::Borrowed(cond)),
        Arg::Value(Value::Text(sql)) => Ok(Cow::Owned(Cond::Raw(sql.clone()))),
        Arg::Value(Value::Null) => Ok(Cow::Owned(Cond::none())),
        Arg::Value(other) => Err(OrmError::shape(format!(
            "'{key}' expects a nested condition, got {other:?}"
        ))),
    }
}

/// Render `field op value` for a single predicate.
pub(crate) fn build_predicate(field: &str, op: Op, value: &Value) -> OrmResult<String> {
    let column = quote_field(field);
    if column.is_empty() {
        return Err(OrmError::shape("empty field name in condition"));
    }

    match op {
        Op::In | Op::NotIn => {
            let items = list_items(value);
            if items.is_empty() {
                return Err(OrmError::arity(op.as_str(), "at least 1", 0));
            }
            let rendered = items
                .iter()
                .map(Value::to_sql_literal)
                .collect::<Vec<_>>()
                .join(", ");
            Ok(format!("{column} {op} ({rendered})"))
        }
        Op::Between | Op::NotBetween => match list_items(value) {
            [low, high] => Ok(format!(
                "{column} {op} {} AND {}",
                low.to_sql_literal(),
                high.to_sql_literal()
            )),
            items => Err(OrmError::arity(op.as_str(), "exactly 2", items.len())),
        },
        _ => Ok(format!("{column} {op} {}", value.to_sql_literal())),
    }
}

/// Elements of a list value. Scalars are not lists.
fn list_items(value: &Value) -> &[Value] {
    match value {
        Value::List(items) => items,
        _ => &[],
    }
}
