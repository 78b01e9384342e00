//! Integration tests for relorm using an in-memory turso database
//!
//! These tests verify the full mapping workflow including:
//! - Inserting, finding, updating and deleting entities
//! - Statement clauses against a real engine
//! - Cell coercion while scanning
//! - Error handling
//! - Transactions across sessions

use fake::Fake;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use relorm::prelude::*;

#[::ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// =============================================================================
// Test Entity Definitions
// =============================================================================

/// Note entity with a database-assigned key
#[derive(Clone, Debug, Default, PartialEq, Entity)]
#[relorm(table_name = "notes")]
pub struct Note {
    #[relorm(sql = "pk,readOnly")]
    pub id:    i64,
    pub body:  String,
    pub draft: bool,
    pub score: Option<f64>,
}

/// Contact entity with renamed columns
#[derive(Clone, Debug, Default, PartialEq, Entity)]
#[relorm(table_name = "contacts")]
pub struct Contact {
    #[relorm(primary_key, read_only)]
    pub id:    i64,
    #[relorm(column_name = "full_name")]
    pub name:  String,
    #[relorm(sql = "columnName=email_address")]
    pub email: String,
    pub age:   Option<i64>,
}

/// Memo entity without a table name
#[derive(Clone, Debug, Default, PartialEq, Entity)]
pub struct Memo {
    #[relorm(sql = "pk")]
    pub id:   i64,
    pub text: String,
}

/// Reading entity stored in an untyped column
#[derive(Clone, Debug, Default, PartialEq, Entity)]
#[relorm(table_name = "readings")]
pub struct Reading {
    #[relorm(primary_key)]
    pub id:     i64,
    pub amount: i64,
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Create an in-memory engine with every test table
async fn create_test_engine() -> Engine {
    let engine = Builder::new_local(":memory:").build().await.unwrap();
    let session = engine.session();

    for ddl in [
        "CREATE TABLE notes (id INTEGER PRIMARY KEY AUTOINCREMENT, body TEXT NOT NULL, draft INTEGER NOT NULL DEFAULT 0, score REAL)",
        "CREATE TABLE contacts (id INTEGER PRIMARY KEY AUTOINCREMENT, full_name TEXT NOT NULL, email_address TEXT NOT NULL UNIQUE, age INTEGER)",
        "CREATE TABLE memos (id INTEGER PRIMARY KEY, text TEXT NOT NULL)",
        "CREATE TABLE readings (id INTEGER PRIMARY KEY, amount)",
    ] {
        session.execute(ddl, Vec::new()).await.unwrap();
    }

    engine
}

fn fake_contact(idx: usize) -> Contact {
    let email: String = SafeEmail().fake();
    Contact { id: 0, name: Name().fake(), email: format!("{}.{}", idx, email), age: Some(20 + idx as i64) }
}

fn note(body: &str, draft: bool) -> Note {
    Note { id: 0, body: body.to_string(), draft, score: None }
}

// =============================================================================
// Insert / Find Tests
// =============================================================================

mod find_tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_then_find_by_unique_column() {
        let engine = create_test_engine().await;
        let mut session = engine.session();

        let contact = fake_contact(1);
        session.insert(&contact).await.unwrap();

        let mut found = Contact::default();
        session.filter(Condition::eq("email_address", contact.email.as_str())).find_one(&mut found).await.unwrap();

        assert!(found.id > 0);
        assert_eq!(found.name, contact.name);
        assert_eq!(found.email, contact.email);
        assert_eq!(found.age, contact.age);
    }

    #[tokio::test]
    async fn test_insert_many_and_find_all() {
        let engine = create_test_engine().await;
        let mut session = engine.session();

        let contacts: Vec<Contact> = (0..5).map(fake_contact).collect();
        session.insert(&contacts).await.unwrap();

        let mut found: Vec<Contact> = Vec::new();
        session.order_by("id").find_all(&mut found).await.unwrap();

        assert_eq!(found.len(), 5);
        for (stored, original) in found.iter().zip(&contacts) {
            assert_eq!(stored.email, original.email);
            assert_eq!(stored.age, original.age);
        }
    }

    #[tokio::test]
    async fn test_bool_and_optional_columns_round_trip() {
        let engine = create_test_engine().await;
        let mut session = engine.session();

        let mut scored = note("scored", true);
        scored.score = Some(4.5);
        session.insert(&vec![scored, note("plain", false)]).await.unwrap();

        let mut notes: Vec<Note> = Vec::new();
        session.order_by("id").find_all(&mut notes).await.unwrap();

        assert_eq!(notes.len(), 2);
        assert!(notes[0].draft);
        assert_eq!(notes[0].score, Some(4.5));
        assert!(!notes[1].draft);
        assert_eq!(notes[1].score, None);
    }

    #[tokio::test]
    async fn test_find_all_with_filters_and_paging() {
        let engine = create_test_engine().await;
        let mut session = engine.session();

        let notes: Vec<Note> = (0..10).map(|idx| note(&format!("note-{idx}"), idx % 2 == 0)).collect();
        session.insert(&notes).await.unwrap();

        let mut drafts: Vec<Note> = Vec::new();
        session
            .filter(Condition::eq("draft", true))
            .filter(Condition::like("body", "note-%"))
            .order_by("id DESC")
            .limit(2)
            .offset(1)
            .find_all(&mut drafts)
            .await
            .unwrap();

        let bodies: Vec<&str> = drafts.iter().map(|n| n.body.as_str()).collect();
        assert_eq!(bodies, vec!["note-6", "note-4"]);
    }

    #[tokio::test]
    async fn test_find_all_in_list() {
        let engine = create_test_engine().await;
        let mut session = engine.session();

        let notes: Vec<Note> = ["a", "b", "c", "d"].iter().map(|body| note(body, false)).collect();
        session.insert(&notes).await.unwrap();

        let mut found: Vec<Note> = Vec::new();
        session.filter(Condition::eq("body", vec!["b", "d"])).order_by("body").find_all(&mut found).await.unwrap();
        assert_eq!(found.iter().map(|n| n.body.as_str()).collect::<Vec<_>>(), vec!["b", "d"]);

        session.filter(Condition::ne("body", vec!["b", "d"])).order_by("body").find_all(&mut found).await.unwrap();
        assert_eq!(found.iter().map(|n| n.body.as_str()).collect::<Vec<_>>(), vec!["a", "c"]);

        session.filter(Condition::eq("body", Vec::<String>::new())).find_all(&mut found).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_find_selected_columns() {
        let engine = create_test_engine().await;
        let mut session = engine.session();
        session.insert(&fake_contact(3)).await.unwrap();

        let mut found = Contact::default();
        session.select(["full_name"]).find_one(&mut found).await.unwrap();

        assert!(!found.name.is_empty());
        assert_eq!(found.id, 0);
        assert_eq!(found.age, None);
    }

    #[tokio::test]
    async fn test_count() {
        let engine = create_test_engine().await;
        let mut session = engine.session();

        let notes: Vec<Note> = (0..7).map(|idx| note("n", idx < 3)).collect();
        session.insert(&notes).await.unwrap();

        assert_eq!(session.from("notes").count().await.unwrap(), 7);
        assert_eq!(session.from("notes").filter(Condition::eq("draft", true)).count().await.unwrap(), 3);
        assert_eq!(session.from("notes").filter(Condition::gt("id", 100)).count().await.unwrap(), 0);
    }
}

// =============================================================================
// Update / Delete Tests
// =============================================================================

mod write_tests {
    use super::*;

    #[tokio::test]
    async fn test_update_by_primary_key() {
        let engine = create_test_engine().await;
        let mut session = engine.session();
        session.insert(&vec![note("first", false), note("second", false)]).await.unwrap();

        let mut notes: Vec<Note> = Vec::new();
        session.order_by("id").find_all(&mut notes).await.unwrap();
        notes[0].body = "changed".to_string();
        notes[0].draft = true;

        let affected = session.update(&notes[0]).await.unwrap();
        assert_eq!(affected, 1);

        let mut found = Note::default();
        session.filter(Condition::eq("id", notes[0].id)).find_one(&mut found).await.unwrap();
        assert_eq!(found.body, "changed");
        assert!(found.draft);

        session.filter(Condition::eq("id", notes[1].id)).find_one(&mut found).await.unwrap();
        assert_eq!(found.body, "second");
    }

    #[tokio::test]
    async fn test_update_many_records() {
        let engine = create_test_engine().await;
        let mut session = engine.session();
        session.insert(&vec![note("a", false), note("b", false), note("c", false)]).await.unwrap();

        let mut notes: Vec<Note> = Vec::new();
        session.find_all(&mut notes).await.unwrap();
        for n in notes.iter_mut() {
            n.draft = true;
        }

        assert_eq!(session.update(&notes).await.unwrap(), 3);
        assert_eq!(session.from("notes").filter(Condition::eq("draft", true)).count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_delete_records() {
        let engine = create_test_engine().await;
        let mut session = engine.session();
        let contacts: Vec<Contact> = (0..4).map(fake_contact).collect();
        session.insert(&contacts).await.unwrap();

        let mut stored: Vec<Contact> = Vec::new();
        session.order_by("id").find_all(&mut stored).await.unwrap();

        session.delete(&stored[..2]).await.unwrap();

        let mut remaining: Vec<Contact> = Vec::new();
        session.order_by("id").find_all(&mut remaining).await.unwrap();
        assert_eq!(remaining, stored[2..].to_vec());
    }

    #[tokio::test]
    async fn test_explicit_table_for_entity_without_name() {
        let engine = create_test_engine().await;
        let mut session = engine.session();
        let memo = Memo { id: 1, text: "remember".to_string() };

        assert!(matches!(session.insert(&memo).await, Err(Error::StatementTableNotSet)));

        session.from("memos").insert(&memo).await.unwrap();

        let mut found = Memo::default();
        session.from("memos").find_one(&mut found).await.unwrap();
        assert_eq!(found, memo);

        let mut all: Vec<Memo> = Vec::new();
        assert!(matches!(session.find_all(&mut all).await, Err(Error::StatementTableNotSet)));
    }
}

// =============================================================================
// Error Handling Tests
// =============================================================================

mod error_tests {
    use super::*;

    #[tokio::test]
    async fn test_find_one_record_not_found() {
        let engine = create_test_engine().await;
        let mut session = engine.session();

        let mut found = Note::default();
        let result = session.filter(Condition::eq("id", 42)).find_one(&mut found).await;
        assert!(matches!(result, Err(Error::RecordNotFound)));
    }

    #[tokio::test]
    async fn test_find_all_empty_table() {
        let engine = create_test_engine().await;
        let mut session = engine.session();

        let mut notes = vec![note("stale", false)];
        session.find_all(&mut notes).await.unwrap();
        assert!(notes.is_empty());
    }

    #[tokio::test]
    async fn test_coercion_from_text_cells() {
        let engine = create_test_engine().await;
        let mut session = engine.session();
        session.execute("INSERT INTO readings (id, amount) VALUES (1, '123'), (2, '123abc')", Vec::new()).await.unwrap();

        let mut reading = Reading::default();
        session.filter(Condition::eq("id", 1)).find_one(&mut reading).await.unwrap();
        assert_eq!(reading.amount, 123);

        let result = session.filter(Condition::eq("id", 2)).find_one(&mut reading).await;
        match result {
            Err(Error::FieldCoercionFailed { field, raw, .. }) => {
                assert_eq!(field, "amount");
                assert_eq!(raw, "123abc");
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(reading.amount, 123);
    }

    #[tokio::test]
    async fn test_database_error_surfaces() {
        let engine = create_test_engine().await;
        let mut session = engine.session();

        let mut notes: Vec<Note> = Vec::new();
        let result = session.from("missing_table").find_all(&mut notes).await;
        assert!(matches!(result, Err(Error::Database(_))));
    }

    #[tokio::test]
    async fn test_invalid_condition() {
        let engine = create_test_engine().await;
        let mut session = engine.session();

        let mut notes: Vec<Note> = Vec::new();
        let result = session.filter(Condition::lt("score", None::<f64>)).find_all(&mut notes).await;
        assert!(matches!(result, Err(Error::InvalidCondition { .. })));
    }

    #[tokio::test]
    async fn test_engine_from_invalid_config() {
        let result = Engine::from_config(&Config::default()).await;
        assert!(matches!(result, Err(Error::ConfigInvalid(_))));
    }
}

// =============================================================================
// Transaction Tests
// =============================================================================

mod transaction_tests {
    use super::*;

    async fn stored_body(session: &mut Session, id: i64) -> String {
        let mut found = Note::default();
        session.filter(Condition::eq("id", id)).find_one(&mut found).await.unwrap();
        found.body
    }

    async fn seed_note(session: &mut Session) -> i64 {
        session.insert(&note("before", false)).await.unwrap();
        let mut found = Note::default();
        session.filter(Condition::eq("body", "before")).find_one(&mut found).await.unwrap();
        found.id
    }

    #[tokio::test]
    async fn test_transaction_commits_on_success() {
        let engine = create_test_engine().await;
        let mut session = engine.session();
        let id = seed_note(&mut session).await;

        session
            .transaction(|tx| {
                Box::pin(async move {
                    let mut found = Note::default();
                    tx.filter(Condition::eq("id", id)).find_one(&mut found).await?;
                    found.body = "after".to_string();
                    tx.update(&found).await?;
                    Ok(())
                })
            })
            .await
            .unwrap();

        assert!(!session.in_transaction());
        assert_eq!(stored_body(&mut session, id).await, "after");
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_error() {
        let engine = create_test_engine().await;
        let mut session = engine.session();
        let id = seed_note(&mut session).await;

        let result: Result<()> = session
            .transaction(|tx| {
                Box::pin(async move {
                    let mut found = Note::default();
                    tx.filter(Condition::eq("id", id)).find_one(&mut found).await?;
                    found.body = "after".to_string();
                    tx.update(&found).await?;
                    Err(Error::Query("abort".to_string()))
                })
            })
            .await;

        assert!(matches!(result, Err(Error::Query(_))));
        assert_eq!(stored_body(&mut session, id).await, "before");
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_transactions() {
        let engine = create_test_engine().await;
        let mut first = engine.session();
        let mut second = engine.session();

        first.begin().await.unwrap();
        assert_eq!(first.from("notes").count().await.unwrap(), 0);

        second.insert(&note("outside", false)).await.unwrap();
        first.rollback().await.unwrap();

        assert_eq!(second.from("notes").count().await.unwrap(), 1);
        assert_eq!(first.from("notes").count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_dropped_session_releases_transaction() {
        let engine = create_test_engine().await;

        {
            let mut abandoned = engine.session();
            abandoned.begin().await.unwrap();
            abandoned.insert(&note("discarded", false)).await.unwrap();
        }
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        let mut session = engine.session();
        session.begin().await.unwrap();
        session.insert(&note("kept", false)).await.unwrap();
        session.commit().await.unwrap();
        session.insert(&note("autocommit", false)).await.unwrap();

        let mut notes: Vec<Note> = Vec::new();
        session.order_by("id").find_all(&mut notes).await.unwrap();
        let bodies: Vec<&str> = notes.iter().map(|n| n.body.as_str()).collect();
        assert_eq!(bodies, vec!["kept", "autocommit"]);
    }
}
