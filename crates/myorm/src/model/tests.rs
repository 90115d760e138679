use std::collections::HashMap;

use super::*;
use crate::client::{ExecOutcome, RowSet};
use crate::condition::Cond;
use crate::entity::{Entity, FieldDef, FieldKind};
use crate::field_map;
use crate::options::Options;
use crate::testing::MockExecutor;
use crate::value::{FromValue, Value};

#[derive(Debug, Default, Clone, PartialEq)]
struct User {
    id: i64,
    name: String,
    age: i32,
    active: bool,
    note: String,
}

impl Entity for User {
    fn table_name(&self) -> &str {
        "user"
    }

    fn auto_increment_field(&self) -> &str {
        "id"
    }

    fn fields() -> &'static [FieldDef] {
        const FIELDS: &[FieldDef] = &[
            FieldDef {
                ident: "id",
                kind: FieldKind::Int,
                tags: &[("db", "id")],
            },
            FieldDef {
                ident: "name",
                kind: FieldKind::Text,
                tags: &[("db", "name")],
            },
            FieldDef {
                ident: "age",
                kind: FieldKind::Int,
                tags: &[("db", "age")],
            },
            FieldDef {
                ident: "active",
                kind: FieldKind::Bool,
                tags: &[("db", "is_active")],
            },
            FieldDef {
                ident: "note",
                kind: FieldKind::Text,
                tags: &[],
            },
        ];
        FIELDS
    }

    fn field_value(&self, ident: &str) -> Option<Value> {
        match ident {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.clone().into()),
            "age" => Some(self.age.into()),
            "active" => Some(self.active.into()),
            _ => None,
        }
    }

    fn set_field(&mut self, ident: &str, value: &Value) {
        match ident {
            "id" => self.id = FromValue::from_value(value),
            "name" => self.name = FromValue::from_value(value),
            "age" => self.age = FromValue::from_value(value),
            "active" => self.active = FromValue::from_value(value),
            _ => {}
        }
    }
}

fn jack() -> User {
    User {
        id: 5,
        name: "Jack".into(),
        age: 18,
        active: true,
        note: "not persisted".into(),
    }
}

/// An entity whose table is chosen per value; the zero value belongs to `event`.
#[derive(Debug, Default, Clone)]
struct Event {
    table: String,
    id: i64,
    name: String,
}

impl Event {
    fn new(id: i64, name: &str) -> Self {
        Self {
            table: String::new(),
            id,
            name: name.into(),
        }
    }

    fn foreign(id: i64, name: &str) -> Self {
        Self {
            table: "audit".into(),
            ..Self::new(id, name)
        }
    }
}

impl Entity for Event {
    fn table_name(&self) -> &str {
        if self.table.is_empty() {
            "event"
        } else {
            &self.table
        }
    }

    fn fields() -> &'static [FieldDef] {
        const FIELDS: &[FieldDef] = &[
            FieldDef {
                ident: "id",
                kind: FieldKind::Int,
                tags: &[("db", "id")],
            },
            FieldDef {
                ident: "name",
                kind: FieldKind::Text,
                tags: &[("db", "name")],
            },
        ];
        FIELDS
    }

    fn field_value(&self, ident: &str) -> Option<Value> {
        match ident {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.clone().into()),
            _ => None,
        }
    }

    fn set_field(&mut self, ident: &str, value: &Value) {
        match ident {
            "id" => self.id = FromValue::from_value(value),
            "name" => self.name = FromValue::from_value(value),
            _ => {}
        }
    }
}

fn users() -> ModelManager<User> {
    ModelManager::new().with_checker(None)
}

fn row(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn insert_skips_auto_increment_and_untagged_fields() {
    assert_eq!(
        users().build_insert_sql(&jack()).unwrap(),
        "INSERT INTO `user`(`name`,`age`,`is_active`) VALUES('Jack',18,1)"
    );
}

#[test]
fn foreign_entity_is_an_identity_error() {
    let events = ModelManager::<Event>::new();
    let err = events
        .build_insert_sql(&Event::foreign(1, "x"))
        .unwrap_err();
    assert!(err.is_identity());
    assert!(events.build_update_sql(&Event::foreign(1, "x")).unwrap_err().is_identity());
    assert!(events.to_map(&Event::foreign(1, "x")).unwrap_err().is_identity());
    assert!(events.matches(&Event::new(1, "x")));
}

#[tokio::test]
async fn identity_error_issues_no_sql() {
    let exec = MockExecutor::new();
    let err = ModelManager::<Event>::new()
        .insert(&exec, &Event::foreign(1, "x"))
        .await
        .unwrap_err();
    assert!(err.is_identity());
    assert!(exec.statements().is_empty());
}

#[test]
fn batch_insert_skips_foreign_rows() {
    let events = ModelManager::<Event>::new();
    let rows = [
        Event::new(1, "a"),
        Event::foreign(2, "b"),
        Event::new(3, "c"),
    ];
    assert_eq!(
        events.build_batch_insert_sql(&rows).unwrap(),
        "INSERT INTO `event`(`id`,`name`) VALUES(1,'a'),(3,'c')"
    );
}

#[test]
fn batch_insert_needs_a_qualifying_row() {
    let events = ModelManager::<Event>::new();
    assert!(events.build_batch_insert_sql(&[]).unwrap_err().is_policy());
    assert!(
        events
            .build_batch_insert_sql(&[Event::foreign(2, "b")])
            .unwrap_err()
            .is_policy()
    );
}

#[test]
fn update_keys_on_auto_increment() {
    assert_eq!(
        users().build_update_sql(&jack()).unwrap(),
        "UPDATE `user` SET `name` = 'Jack', `age` = 18, `is_active` = 1 WHERE `id` = 5"
    );
}

#[test]
fn update_without_auto_increment_is_refused() {
    let err = ModelManager::<Event>::new()
        .build_update_sql(&Event::new(1, "a"))
        .unwrap_err();
    assert!(err.is_policy());
}

#[test]
fn update_by_cond() {
    let sql = users()
        .build_update_sql_by_cond([("age", 20)], field_map! { "id" => 5 })
        .unwrap();
    assert_eq!(sql, "UPDATE `user` SET `age` = 20 WHERE ((`id` = 5))");
}

#[test]
fn update_by_cond_quotes_assignment_columns() {
    let sql = users()
        .build_update_sql_by_cond([("age = 0, role", "admin")], field_map! { "id" => 5 })
        .unwrap();
    assert_eq!(
        sql,
        "UPDATE `user` SET `age = 0, role` = 'admin' WHERE ((`id` = 5))"
    );
}

#[test]
fn update_by_cond_refuses_empty_parts() {
    let m = users();
    let nothing: Vec<(&str, i64)> = Vec::new();
    assert!(
        m.build_update_sql_by_cond(nothing, "id = 1")
            .unwrap_err()
            .is_policy()
    );
    assert!(
        m.build_update_sql_by_cond([("age", 1)], Cond::none())
            .unwrap_err()
            .is_policy()
    );
    assert!(
        m.build_update_sql_by_cond([("age", 1)], "  ")
            .unwrap_err()
            .is_policy()
    );
}

#[test]
fn delete_requires_a_condition() {
    let m = users();
    assert!(m.build_delete_sql(Cond::none()).unwrap_err().is_policy());
    assert!(m.build_delete_sql(field_map! {}).unwrap_err().is_policy());
    assert_eq!(
        m.build_delete_sql("age < 3").unwrap(),
        "DELETE FROM `user` WHERE (age < 3)"
    );
}

#[test]
fn delete_propagates_condition_errors() {
    let err = users()
        .build_delete_sql(field_map! { "id IN" => Vec::<i64>::new() })
        .unwrap_err();
    assert!(err.is_arity());
}

#[test]
fn sql_value_override_applies_per_column() {
    let m = users().sql_value("name", |v| format!("UPPER({})", v.to_sql_literal()));
    assert_eq!(
        m.build_insert_sql(&jack()).unwrap(),
        "INSERT INTO `user`(`name`,`age`,`is_active`) VALUES(UPPER('Jack'),18,1)"
    );
    assert_eq!(
        m.build_update_sql_by_cond([("name", "x")], "id = 1").unwrap(),
        "UPDATE `user` SET `name` = UPPER('x') WHERE (id = 1)"
    );
}

#[test]
fn pre_write_runs_before_every_write() {
    let m = users().on_pre_write(|u: &User| User {
        name: u.name.trim().to_string(),
        ..u.clone()
    });
    let mut user = jack();
    user.name = "  Jack ".into();
    assert!(m.build_insert_sql(&user).unwrap().contains("VALUES('Jack',"));
    assert!(m.build_update_sql(&user).unwrap().contains("`name` = 'Jack'"));
}

#[test]
fn rows_decode_by_field_kind() {
    let user = users()
        .map_to_entity(&row(&[
            ("id", "7"),
            ("name", "Jack"),
            ("age", "old"),
            ("is_active", "1"),
            ("unknown", "?"),
        ]))
        .unwrap();
    assert_eq!(
        user,
        User {
            id: 7,
            name: "Jack".into(),
            age: 0,
            active: true,
            note: String::new(),
        }
    );
    assert!(users().map_to_entity(&HashMap::new()).is_none());
}

#[test]
fn post_read_sees_the_raw_row() {
    let m = users().on_post_read(|mut u: User, raw| {
        u.note = raw.get("nick").cloned().unwrap_or_default();
        u
    });
    let user = m
        .map_to_entity(&row(&[("id", "1"), ("nick", "jj")]))
        .unwrap();
    assert_eq!(user.note, "jj");
}

#[test]
fn to_map_is_keyed_by_column() {
    let map = users().to_map(&jack()).unwrap();
    assert_eq!(map.len(), 4);
    assert_eq!(map["is_active"], Value::Bool(true));
    assert_eq!(map["name"], Value::from("Jack"));
}

#[test]
fn query_fields_honor_projection_override() {
    assert_eq!(users().query_fields_sql(), "`id`,`name`,`age`,`is_active`");
    let m = users().query_field(|c| {
        if c == "name" {
            "UPPER(name) AS name".to_string()
        } else {
            c.to_string()
        }
    });
    assert_eq!(
        m.query_fields_sql(),
        "`id`,UPPER(name) AS name,`age`,`is_active`"
    );
}

#[tokio::test]
async fn insert_reports_generated_id() {
    let exec = MockExecutor::new().with_outcome(ExecOutcome {
        rows_affected: 1,
        last_insert_id: Some(9),
    });
    assert_eq!(users().insert(&exec, &jack()).await.unwrap(), Some(9));
    assert_eq!(
        users().update(&exec, &jack()).await.unwrap(),
        1
    );
    assert_eq!(exec.statements().len(), 2);
}

#[tokio::test]
async fn find_one_reads_a_single_row() {
    let exec = MockExecutor::new();
    exec.push_rows(
        RowSet::new(vec!["id".into(), "name".into()]).with_row([Some("3"), Some("Ann")]),
    );
    let user = users()
        .find_one(&exec, field_map! { "age >" => 18 }, "id DESC")
        .await
        .unwrap()
        .unwrap();
    assert_eq!((user.id, user.name.as_str()), (3, "Ann"));
    assert_eq!(
        exec.statements(),
        ["SELECT `id`,`name`,`age`,`is_active` FROM `user` WHERE ((`age` > 18)) ORDER BY id DESC LIMIT 0,1"]
    );

    assert!(users().find_one(&exec, "id = 0", "").await.unwrap().is_none());
}

#[tokio::test]
async fn find_all_count_and_page() {
    let exec = MockExecutor::new();
    exec.push_rows(
        RowSet::new(vec!["id".into()])
            .with_row([Some("1")])
            .with_row([Some("2")]),
    );
    let all = users()
        .find_all(&exec, field_map! { "is_active" => true }, "")
        .await
        .unwrap();
    assert_eq!(all.iter().map(|u| u.id).collect::<Vec<_>>(), [1, 2]);

    exec.push_count(12);
    assert_eq!(users().count(&exec, field_map! { "is_active" => true }).await.unwrap(), 12);

    exec.push_count(12);
    let page = users()
        .find_page(&exec, field_map! { "is_active" => true }, "id", 2, 5)
        .await
        .unwrap();
    assert_eq!(page.total_count, 12);

    let sql = exec.statements();
    assert_eq!(sql[1], "SELECT COUNT(0) FROM `user` WHERE ((`is_active` = 1))");
    assert_eq!(sql[2], sql[1]);
    assert!(sql[3].ends_with("ORDER BY id LIMIT 5,5"));
}

#[tokio::test]
async fn raw_reads_pass_through() {
    let exec = MockExecutor::new();
    exec.push_rows(RowSet::new(vec!["n".into()]).with_row([Some("1")]));
    let row = users()
        .query_row(&exec, "SELECT 1 AS n FROM dual")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row["n"], "1");
    users().query_all(&exec, "SELECT * FROM user").await.unwrap();
    assert_eq!(
        exec.statements(),
        ["SELECT 1 AS n FROM dual LIMIT 0,1", "SELECT * FROM user"]
    );
}

#[tokio::test]
async fn executor_failures_propagate() {
    let exec = MockExecutor::new().failing("deadlock");
    let err = users()
        .delete(&exec, field_map! { "id" => 1 })
        .await
        .unwrap_err();
    assert!(err.is_query());
}

fn sharded(key: i64) -> ShardingModelManager<User> {
    let mut m = ShardingModelManager::from_manager(
        ModelManager::with_options(Options::sharding(4, 2)).with_checker(None),
    );
    m.use_sharding(key);
    m
}

#[test]
fn shard_resolution() {
    let m = sharded(7);
    assert_eq!(m.resolve().unwrap(), (3, 1));
    assert_eq!(m.table_name().unwrap(), "user_3");
    assert_eq!(m.database().unwrap(), "_1");
}

#[test]
fn invalid_shard_keys_are_errors() {
    for key in [0, -3] {
        let err = sharded(key).table_name().unwrap_err();
        assert!(err.is_sharding());
        assert!(err.to_string().contains("SHARDING_VALUE_INVALID"));
    }

    let mut disabled = ShardingModelManager::<User>::new(Options::default());
    disabled.use_sharding(7);
    let err = disabled.resolve().unwrap_err();
    assert!(err.to_string().contains("SHARDING_UNAVAILABLE"));

    let mut zero_tables = ShardingModelManager::<User>::new(Options::sharding(0, 1));
    zero_tables.use_sharding(7);
    assert!(zero_tables.resolve().unwrap_err().is_sharding());
}

#[test]
fn shard_key_is_resolved_per_call() {
    let mut m = sharded(7);
    assert!(m.build_delete_sql("id = 1").unwrap().starts_with("DELETE FROM `user_3`"));
    m.use_sharding(8);
    assert!(m.build_delete_sql("id = 1").unwrap().starts_with("DELETE FROM `user_0`"));
}

#[test]
fn sharded_statements_target_the_shard_table() {
    let m = sharded(5);
    assert_eq!(
        m.build_insert_sql(&jack()).unwrap(),
        "INSERT INTO `user_1`(`name`,`age`,`is_active`) VALUES('Jack',18,1)"
    );
    assert_eq!(
        m.build_update_sql(&jack()).unwrap(),
        "UPDATE `user_1` SET `name` = 'Jack', `age` = 18, `is_active` = 1 WHERE `id` = 5"
    );
    assert_eq!(
        m.build_update_sql_by_cond([("age", 1)], "id = 2").unwrap(),
        "UPDATE `user_1` SET `age` = 1 WHERE (id = 2)"
    );
    assert_eq!(
        m.new_querier().unwrap().build_sql().unwrap(),
        "SELECT `id`,`name`,`age`,`is_active` FROM `user_1`"
    );
}

#[test]
fn replace_into_writes_every_column() {
    let m = sharded(5);
    let mut ann = jack();
    ann.id = 6;
    ann.name = "Ann".into();
    assert_eq!(
        m.build_replace_into_sql(&[jack(), ann]).unwrap(),
        "REPLACE INTO `user_1`(`id`,`name`,`age`,`is_active`) VALUES(5,'Jack',18,1),(6,'Ann',18,1)"
    );
    assert!(m.build_replace_into_sql(&[]).unwrap_err().is_policy());
}

#[test]
fn replace_into_skips_foreign_rows() {
    let mut events = ShardingModelManager::<Event>::new(Options::sharding(2, 2));
    events.use_sharding(3);
    assert_eq!(
        events
            .build_replace_into_sql(&[Event::foreign(1, "a"), Event::new(2, "b")])
            .unwrap(),
        "REPLACE INTO `event_1`(`id`,`name`) VALUES(2,'b')"
    );
}

#[tokio::test]
async fn unresolved_shard_issues_no_sql() {
    let exec = MockExecutor::new();
    let m = sharded(0);
    assert!(m.insert(&exec, &jack()).await.unwrap_err().is_sharding());
    assert!(m.count(&exec, "id > 0").await.unwrap_err().is_sharding());
    assert!(m.replace_into(&exec, &[jack()]).await.unwrap_err().is_sharding());
    assert!(exec.statements().is_empty());
}

#[tokio::test]
async fn sharded_reads_use_the_shard_table() {
    let exec = MockExecutor::new();
    exec.push_rows(RowSet::new(vec!["id".into()]).with_row([Some("5")]));
    exec.push_count(1);
    let m = sharded(6);
    let found = m.find_one(&exec, field_map! { "id" => 5 }, "").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(5));
    assert_eq!(m.count(&exec, field_map! { "id" => 5 }).await.unwrap(), 1);
    let sql = exec.statements();
    assert!(sql[0].contains("FROM `user_2` WHERE ((`id` = 5))"));
    assert_eq!(sql[1], "SELECT COUNT(0) FROM `user_2` WHERE ((`id` = 5))");
}
