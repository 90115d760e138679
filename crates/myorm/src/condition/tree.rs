use super::builder::{Fragments, build_field_map};
use super::{Arg, FieldMap, Logic};
use crate::error::OrmResult;

/// A mutable AND/OR predicate tree.
///
/// Flat predicates are kept in insertion order; child trees are rendered after them, each
/// in its own parentheses. The tree is append-only.
///
/// # Example
/// ```
/// use myorm::Condition;
///
/// let mut age = Condition::or();
/// age.add("age <", 18).add("age >", 60);
///
/// let mut cond = Condition::and();
/// cond.add("status", 1).add_condition(age);
///
/// assert_eq!(
///     cond.build().unwrap(),
///     "((`status` = 1)) AND (((`age` < 18)) OR ((`age` > 60)))"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Condition {
    logic: Logic,
    items: Vec<FieldMap>,
    children: Vec<Condition>,
}

impl Condition {
    pub fn new(logic: Logic) -> Self {
        Self {
            logic,
            items: Vec::new(),
            children: Vec::new(),
        }
    }

    /// A tree whose members are combined with AND.
    pub fn and() -> Self {
        Self::new(Logic::And)
    }

    /// A tree whose members are combined with OR.
    pub fn or() -> Self {
        Self::new(Logic::Or)
    }

    pub fn logic(&self) -> Logic {
        self.logic
    }

    /// Append one `"field op" -> value` predicate.
    pub fn add(&mut self, field: impl Into<String>, value: impl Into<Arg>) -> &mut Self {
        let mut map = FieldMap::new();
        map.insert(field, value);
        self.items.push(map);
        self
    }

    /// Append a batch of predicates.
    pub fn add_batch(&mut self, batch: impl IntoIterator<Item = FieldMap>) -> &mut Self {
        self.items.extend(batch);
        self
    }

    /// Append a child tree.
    pub fn add_condition(&mut self, child: Condition) -> &mut Self {
        self.children.push(child);
        self
    }

    /// Returns true if neither predicates nor children were added.
    pub fn is_empty(&self) -> bool {
        self.items.iter().all(FieldMap::is_empty) && self.children.iter().all(Condition::is_empty)
    }

    /// Render the tree. Pure: building twice yields the same SQL.
    pub fn build(&self) -> OrmResult<String> {
        let mut own = Fragments::new(self.logic);
        for map in &self.items {
            own.push(&build_field_map(map, self.logic)?);
        }
        let own = own.finish();

        let mut children = Vec::with_capacity(self.children.len());
        for child in &self.children {
            let sql = child.build()?;
            if !sql.is_empty() {
                children.push(format!("({sql})"));
            }
        }

        let mut parts = Vec::with_capacity(children.len() + 1);
        if !own.is_empty() {
            parts.push(own);
        }
        parts.extend(children);
        Ok(parts.join(&format!(" {} ", self.logic)))
    }
}
