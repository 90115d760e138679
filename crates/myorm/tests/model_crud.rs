//! End-to-end CRUD through `#[derive(Entity)]` against a recording executor.

use std::collections::VecDeque;
use std::sync::Mutex;

use myorm::prelude::*;
use myorm::{ExecOutcome, RowSet};

#[derive(Debug, Default, Clone, PartialEq, Entity)]
#[orm(table = "member", database = "crm", auto_increment = "id")]
struct Member {
    #[orm(db = "id")]
    id: u64,
    #[orm(db = "nick_name", json = "nick")]
    nick: String,
    #[orm(db = "level")]
    level: i32,
    #[orm(db = "score")]
    score: f64,
    #[orm(db = "vip")]
    vip: bool,
    /// Not persisted.
    #[orm(json = "session")]
    session: String,
}

#[derive(Debug, Default, Entity)]
#[orm(tag = "col")]
struct AuditLog {
    #[orm(col = "log_id")]
    id: i64,
    #[orm(col = "message")]
    message: String,
}

#[derive(Default)]
struct Recorder {
    statements: Mutex<Vec<String>>,
    results: Mutex<VecDeque<RowSet>>,
}

impl Recorder {
    fn respond(&self, rows: RowSet) {
        self.results.lock().unwrap().push_back(rows);
    }

    fn statements(&self) -> Vec<String> {
        self.statements.lock().unwrap().clone()
    }
}

impl SqlExecutor for Recorder {
    async fn exec(&self, sql: &str) -> OrmResult<ExecOutcome> {
        self.statements.lock().unwrap().push(sql.to_string());
        Ok(ExecOutcome {
            rows_affected: 1,
            last_insert_id: Some(100),
        })
    }

    async fn query(&self, sql: &str) -> OrmResult<RowSet> {
        self.statements.lock().unwrap().push(sql.to_string());
        Ok(self.results.lock().unwrap().pop_front().unwrap_or_default())
    }
}

fn alice() -> Member {
    Member {
        id: 1,
        nick: "alice".into(),
        level: 3,
        score: 9.5,
        vip: true,
        session: "tmp".into(),
    }
}

#[test]
fn derive_describes_the_entity() {
    let members = ModelManager::<Member>::new();
    let desc = members.descriptor();
    assert_eq!(desc.table(), "member");
    assert_eq!(desc.database(), "crm");
    assert_eq!(desc.auto_increment(), "id");
    assert_eq!(
        desc.column_names().collect::<Vec<_>>(),
        ["id", "nick_name", "level", "score", "vip"]
    );

    let logs = ModelManager::<AuditLog>::new();
    assert_eq!(logs.table_name(), "audit_log");
    assert_eq!(logs.descriptor().tag(), "col");
    assert_eq!(logs.query_fields_sql(), "`log_id`,`message`");
}

#[tokio::test]
async fn insert_update_delete() {
    let exec = Recorder::default();
    let members = ModelManager::<Member>::new();

    let id = members.insert(&exec, &alice()).await.unwrap();
    assert_eq!(id, Some(100));
    members.update(&exec, &alice()).await.unwrap();
    members
        .update_by_cond(&exec, [("vip", false)], field_map! { "level <" => 2 })
        .await
        .unwrap();
    members
        .delete(&exec, field_map! { "id" => 1u64 })
        .await
        .unwrap();

    assert_eq!(
        exec.statements(),
        [
            "INSERT INTO `member`(`nick_name`,`level`,`score`,`vip`) VALUES('alice',3,9.5,1)",
            "UPDATE `member` SET `nick_name` = 'alice', `level` = 3, `score` = 9.5, `vip` = 1 WHERE `id` = 1",
            "UPDATE `member` SET `vip` = 0 WHERE ((`level` < 2))",
            "DELETE FROM `member` WHERE ((`id` = 1))",
        ]
    );
}

#[tokio::test]
async fn unconditional_delete_is_refused() {
    let exec = Recorder::default();
    let err = ModelManager::<Member>::new()
        .delete(&exec, Cond::none())
        .await
        .unwrap_err();
    assert!(err.is_policy());
    assert!(exec.statements().is_empty());
}

#[tokio::test]
async fn rows_map_back_into_entities() {
    let exec = Recorder::default();
    exec.respond(
        RowSet::new(vec![
            "id".into(),
            "nick_name".into(),
            "level".into(),
            "score".into(),
            "vip".into(),
        ])
        .with_row([Some("7"), Some("bob"), Some("2"), Some("1.25"), Some("0")])
        .with_row([Some("8"), None, Some("x"), None, Some("1")]),
    );

    let mut filter = Condition::or();
    filter.add("level >", 1).add("vip", true);
    let found = ModelManager::<Member>::new()
        .find_all(&exec, filter, "id")
        .await
        .unwrap();

    assert_eq!(
        found,
        [
            Member {
                id: 7,
                nick: "bob".into(),
                level: 2,
                score: 1.25,
                vip: false,
                session: String::new(),
            },
            Member {
                id: 8,
                vip: true,
                ..Member::default()
            },
        ]
    );
    let sql = &exec.statements()[0];
    assert!(sql.starts_with("SELECT `id`,`nick_name`,`level`,`score`,`vip` FROM `member` WHERE "));
    assert!(sql.contains("((`level` > 1))"));
    assert!(sql.contains("((`vip` = 1))"));
    assert!(sql.contains(" OR "));
    assert!(sql.ends_with(" ORDER BY id"));
}

#[tokio::test]
async fn page_query_counts_with_the_same_filter() {
    let exec = Recorder::default();
    exec.respond(RowSet::new(vec!["COUNT(0)".into()]).with_row([Some("31")]));
    let page = ModelManager::<Member>::new()
        .find_page(&exec, field_map! { "vip" => true }, "id DESC", 2, 10)
        .await
        .unwrap();
    assert_eq!(page.total_count, 31);

    let sql = exec.statements();
    assert_eq!(sql[0], "SELECT COUNT(0) FROM `member` WHERE ((`vip` = 1))");
    assert_eq!(
        sql[1],
        "SELECT `id`,`nick_name`,`level`,`score`,`vip` FROM `member` WHERE ((`vip` = 1)) \
         ORDER BY id DESC LIMIT 10,10"
    );
}

#[tokio::test]
async fn sharded_member_tables() {
    let exec = Recorder::default();
    let mut members = ShardingModelManager::<Member>::new(Options::sharding(4, 2));

    members.use_sharding(7);
    members.insert(&exec, &alice()).await.unwrap();
    assert_eq!(members.database().unwrap(), "crm_1");

    members.use_sharding(0);
    let err = members.insert(&exec, &alice()).await.unwrap_err();
    assert!(err.is_sharding());

    members.use_sharding(9);
    members.replace_into(&exec, &[alice()]).await.unwrap();

    assert_eq!(
        exec.statements(),
        [
            "INSERT INTO `member_3`(`nick_name`,`level`,`score`,`vip`) VALUES('alice',3,9.5,1)",
            "REPLACE INTO `member_1`(`id`,`nick_name`,`level`,`score`,`vip`) VALUES(1,'alice',3,9.5,1)",
        ]
    );
}

#[test]
fn options_from_toml_drive_sharding() {
    let options = Options::from_toml_str(
        r#"
        syntax_check = false

        [sharding]
        enabled = true
        table_count = 8
        db_count = 2
        "#,
    )
    .unwrap();
    let mut logs = ShardingModelManager::<AuditLog>::new(options);
    logs.use_sharding(13);
    assert_eq!(logs.resolve().unwrap(), (5, 2));
    assert_eq!(logs.table_name().unwrap(), "audit_log_5");
}
