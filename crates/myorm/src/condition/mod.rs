//! Condition specifications for WHERE / HAVING clauses.
//!
//! A [`Cond`] is a closed union of the shapes a predicate set can take: a trusted raw SQL
//! fragment, a list of specifications, a field map, a list of field maps, or a
//! [`Condition`] tree. [`build`] compiles any of them into a parenthesized boolean
//! expression.
//!
//! Field map keys are `"field"` or `"field op"`, e.g. `"age >"`, `"id IN"`,
//! `"created_at BETWEEN"`. The keys `"AND"` / `"OR"` (any case) nest another specification
//! combined with that logic.
//!
//! ```
//! use myorm::{Logic, field_map};
//! use myorm::condition::build;
//!
//! let cond = field_map! { "name" => "Jack" };
//! assert_eq!(build(&cond.into(), Logic::And).unwrap(), "((`name` = 'Jack'))");
//! ```

mod builder;
mod tree;


use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;

use crate::error::{OrmError, OrmResult};
use crate::value::Value;

pub use builder::{build, build_field_map};
pub use tree::Condition;

/// How sibling predicates are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Logic {
    #[default]
    And,
    Or,
}

impl Logic {
    /// Parse a logic keyword; blank or unrecognized input is `And`.
    pub fn parse(s: &str) -> Self {
        Self::from_key(s).unwrap_or_default()
    }

    /// Recognize a map key that nests a sub-expression.
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        if key.eq_ignore_ascii_case("AND") {
            Some(Logic::And)
        } else if key.eq_ignore_ascii_case("OR") {
            Some(Logic::Or)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Logic::And => "AND",
            Logic::Or => "OR",
        }
    }
}

impl fmt::Display for Logic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison operator of a single predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<>`
    LtGt,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `IS`
    Is,
    /// `IS NOT`
    IsNot,
    /// `IN (list)`
    In,
    /// `NOT IN (list)`
    NotIn,
    /// `BETWEEN a AND b`
    Between,
    /// `NOT BETWEEN a AND b`
    NotBetween,
}

impl Op {
    /// Parse an operator token. Blank input is `=`; matching ignores case and extra spaces.
    pub fn parse(s: &str) -> OrmResult<Self> {
        let normalized = s
            .split_whitespace()
            .map(str::to_ascii_uppercase)
            .collect::<Vec<_>>()
            .join(" ");
        Ok(match normalized.as_str() {
            "" | "=" => Op::Eq,
            "!=" => Op::Ne,
            "<>" => Op::LtGt,
            ">" => Op::Gt,
            ">=" => Op::Gte,
            "<" => Op::Lt,
            "<=" => Op::Lte,
            "LIKE" => Op::Like,
            "NOT LIKE" => Op::NotLike,
            "IS" => Op::Is,
            "IS NOT" => Op::IsNot,
            "IN" => Op::In,
            "NOT IN" => Op::NotIn,
            "BETWEEN" => Op::Between,
            "NOT BETWEEN" => Op::NotBetween,
            _ => return Err(OrmError::shape(format!("unsupported operator '{}'", s.trim()))),
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Ne => "!=",
            Op::LtGt => "<>",
            Op::Gt => ">",
            Op::Gte => ">=",
            Op::Lt => "<",
            Op::Lte => "<=",
            Op::Like => "LIKE",
            Op::NotLike => "NOT LIKE",
            Op::Is => "IS",
            Op::IsNot => "IS NOT",
            Op::In => "IN",
            Op::NotIn => "NOT IN",
            Op::Between => "BETWEEN",
            Op::NotBetween => "NOT BETWEEN",
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A predicate specification.
#[derive(Debug, Clone, PartialEq)]
pub enum Cond {
    /// Trusted SQL fragment, wrapped verbatim in parentheses.
    Raw(String),
    /// Specifications combined under the caller's logic.
    List(Vec<Cond>),
    /// One field map.
    Map(FieldMap),
    /// Field maps combined under the caller's logic.
    MapList(Vec<FieldMap>),
    /// A condition tree with its own logic.
    Tree(Condition),
}

impl Cond {
    /// The empty specification: builds to no condition.
    pub fn none() -> Self {
        Cond::List(Vec::new())
    }

    /// A trusted raw fragment.
    pub fn raw(sql: impl Into<String>) -> Self {
        Cond::Raw(sql.into())
    }
}

impl Default for Cond {
    fn default() -> Self {
        Cond::none()
    }
}

impl From<&str> for Cond {
    fn from(sql: &str) -> Self {
        Cond::Raw(sql.to_string())
    }
}

impl From<String> for Cond {
    fn from(sql: String) -> Self {
        Cond::Raw(sql)
    }
}

impl From<FieldMap> for Cond {
    fn from(map: FieldMap) -> Self {
        Cond::Map(map)
    }
}

impl From<Vec<FieldMap>> for Cond {
    fn from(maps: Vec<FieldMap>) -> Self {
        Cond::MapList(maps)
    }
}

impl From<Vec<Cond>> for Cond {
    fn from(items: Vec<Cond>) -> Self {
        Cond::List(items)
    }
}

impl From<Condition> for Cond {
    fn from(tree: Condition) -> Self {
        Cond::Tree(tree)
    }
}

impl<C: Into<Cond>> From<Option<C>> for Cond {
    fn from(cond: Option<C>) -> Self {
        cond.map_or_else(Cond::none, Into::into)
    }
}

/// The right-hand side of a field map entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    /// A value compared against the field.
    Value(Value),
    /// A nested specification under an `AND` / `OR` key.
    Nested(Cond),
}

impl From<Cond> for Arg {
    fn from(cond: Cond) -> Self {
        Arg::Nested(cond)
    }
}

impl From<FieldMap> for Arg {
    fn from(map: FieldMap) -> Self {
        Arg::Nested(Cond::Map(map))
    }
}

impl From<Vec<FieldMap>> for Arg {
    fn from(maps: Vec<FieldMap>) -> Self {
        Arg::Nested(Cond::MapList(maps))
    }
}

impl From<Vec<Cond>> for Arg {
    fn from(items: Vec<Cond>) -> Self {
        Arg::Nested(Cond::List(items))
    }
}

impl From<Condition> for Arg {
    fn from(tree: Condition) -> Self {
        Arg::Nested(Cond::Tree(tree))
    }
}

macro_rules! impl_arg_from_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl From<$t> for Arg {
                fn from(v: $t) -> Self {
                    Arg::Value(Value::from(v))
                }
            }
        )*
    };
}

impl_arg_from_value!(
    Value,
    i8, i16, i32, i64, isize,
    u8, u16, u32, u64, usize,
    f32, f64, bool, char,
    String, &str, &String,
    Vec<u8>,
    Vec<Value>, Vec<i8>, Vec<i16>, Vec<i32>, Vec<i64>, Vec<isize>,
    Vec<u16>, Vec<u32>, Vec<u64>, Vec<usize>, Vec<f32>, Vec<f64>,
    Vec<bool>, Vec<String>, Vec<&str>,
    chrono::NaiveDate, chrono::NaiveTime, chrono::NaiveDateTime,
    uuid::Uuid,
);

impl<T: Into<Value>> From<Option<T>> for Arg {
    fn from(v: Option<T>) -> Self {
        Arg::Value(Value::from(v))
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Arg {
    fn from(v: [T; N]) -> Self {
        Arg::Value(Value::from(v))
    }
}

impl<Tz: chrono::TimeZone> From<chrono::DateTime<Tz>> for Arg {
    fn from(v: chrono::DateTime<Tz>) -> Self {
        Arg::Value(Value::from(v))
    }
}

/// An unordered `"field op" -> value` mapping.
///
/// Iteration order is unspecified, so predicates of one map may be emitted in any order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: HashMap<String, Arg>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, replacing any previous value under the same key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Arg>) -> &mut Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Builder-style [`FieldMap::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Arg>) -> Self {
        self.insert(key, value);
        self
    }

    /// Merge another map into this one.
    pub fn extend(&mut self, other: FieldMap) -> &mut Self {
        self.entries.extend(other.entries);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Arg> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, Arg> {
        self.entries.iter()
    }

    /// Read a map from a JSON object, e.g. a filter posted by a client.
    ///
    /// Under `"AND"` / `"OR"` an object nests a map and an array of objects nests a map
    /// list. Everything else becomes a [`Value`]. Keys are always quoted as columns and values
    /// are always rendered as literals; a string under a logic key is refused, since it would
    /// be spliced in as raw SQL. Use [`FieldMap::from_trusted_json`] for that.
    pub fn from_json(json: serde_json::Value) -> OrmResult<Self> {
        Self::read_json(json, false)
    }

    /// Like [`FieldMap::from_json`], but a string under `"AND"` / `"OR"` is a raw SQL fragment.
    ///
    /// Only for JSON authored by the application itself.
    pub fn from_trusted_json(json: serde_json::Value) -> OrmResult<Self> {
        Self::read_json(json, true)
    }

    fn read_json(json: serde_json::Value, raw_fragments: bool) -> OrmResult<Self> {
        let serde_json::Value::Object(object) = json else {
            return Err(OrmError::shape(format!("expected a JSON object, got {json}")));
        };
        let mut map = FieldMap::new();
        for (key, value) in object {
            let arg = if Logic::from_key(&key).is_some() {
                nested_from_json(&key, value, raw_fragments)?
            } else {
                Arg::Value(Value::from(value))
            };
            map.insert(key, arg);
        }
        Ok(map)
    }
}

fn nested_from_json(key: &str, json: serde_json::Value, raw_fragments: bool) -> OrmResult<Arg> {
    Ok(match json {
        object @ serde_json::Value::Object(_) => {
            Arg::from(FieldMap::read_json(object, raw_fragments)?)
        }
        serde_json::Value::Array(items) => Arg::from(
            items
                .into_iter()
                .map(|item| FieldMap::read_json(item, raw_fragments))
                .collect::<OrmResult<Vec<_>>>()?,
        ),
        serde_json::Value::String(_) if !raw_fragments => {
            return Err(OrmError::shape(format!(
                "'{key}' holds text; raw fragments are not accepted from untrusted JSON"
            )));
        }
        other => Arg::Value(Value::from(other)),
    })
}

impl<'a> IntoIterator for &'a FieldMap {
    type Item = (&'a String, &'a Arg);
    type IntoIter = hash_map::Iter<'a, String, Arg>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<K: Into<String>, A: Into<Arg>> FromIterator<(K, A)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, A)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (k, a) in iter {
            map.insert(k, a);
        }
        map
    }
}

/// Build a [`FieldMap`] inline.
///
/// ```
/// use myorm::field_map;
///
/// let map = field_map! {
///     "name" => "Jack",
///     "AND" => field_map! { "age >" => 18, "status IN" => [1, 2] },
/// };
/// assert_eq!(map.len(), 2);
/// ```
#[macro_export]
macro_rules! field_map {
    () => {
        $crate::FieldMap::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut map = $crate::FieldMap::new();
        $( map.insert($key, $value); )+
        map
    }};
}
