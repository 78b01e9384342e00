#![deny(warnings)]

//! # relorm
//!
//! A lightweight data-mapping layer for [Turso](https://turso.tech) with
//! primary/replica routing.
//!
//! ## Features
//!
//! - Derive macro mapping plain structs to tables
//! - Any-to-any cell coercion when scanning rows into entities
//! - Statement builder with a typed condition algebra
//! - Reads spread round-robin over replicas, writes on the primary
//! - Session-scoped transactions
//! - Optional support for chrono, uuid, and JSON types
//!
//! ## Quick Start
//!
//! ```ignore
//! use relorm::prelude::*;
//!
//! #[derive(Clone, Debug, Default, Entity)]
//! #[relorm(table_name = "users")]
//! pub struct User {
//!     #[relorm(sql = "pk,readOnly")]
//!     pub id:    i64,
//!     pub name:  String,
//!     pub email: String,
//!     pub age:   Option<i64>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let engine = Builder::new_local(":memory:").with_replica("replica.db").build().await?;
//!     let mut session = engine.session();
//!
//!     session.execute("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, email TEXT, age INTEGER)", vec![]).await?;
//!
//!     let alice = User { name: "Alice".into(), email: "alice@example.com".into(), ..Default::default() };
//!     session.insert(&alice).await?;
//!
//!     let mut found = User::default();
//!     session.use_primary().filter(Condition::eq("email", "alice@example.com")).find_one(&mut found).await?;
//!
//!     found.age = Some(30);
//!     session.update(&found).await?;
//!
//!     let mut adults: Vec<User> = Vec::new();
//!     session.filter(Condition::gte("age", 18)).order_by("name").find_all(&mut adults).await?;
//!
//!     session.delete(&adults).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Entity Attributes
//!
//! The `#[relorm(...)]` attribute supports:
//!
//! - `table_name = "..."` on the struct: the table used when no `from(...)` is given
//! - `sql = "..."` on a field: raw tag, comma separated `pk`, `readOnly`, `columnName=<name>`
//! - `primary_key`, `read_only`, `column_name = "..."`: shorthands for the tag tokens
//!
//! Column names default to the field name in snake_case.

extern crate self as relorm;

pub mod connection;
pub mod entity;
pub mod error;
pub mod prelude;
pub mod query;
pub mod scanner;
pub mod session;
pub mod value;
// Re-export main types at crate root
pub use connection::Builder;
pub use connection::Config;
pub use connection::Cursor;
pub use connection::Engine;
pub use connection::Executor;
pub use connection::Transaction;
pub use connection::TursoExecutor;
pub use entity::Entity;
pub use entity::EntityModel;
pub use entity::Field;
pub use entity::FieldDef;
pub use entity::ScanTarget;
pub use entity::Shape;
pub use error::CoercionError;
pub use error::Error;
pub use error::Result;
pub use query::Condition;
pub use query::Dialect;
pub use query::prelude::ColumnMap;
pub use query::prelude::Operand;
pub use query::prelude::Statement;
// Re-export the derive macro
pub use relorm_macros::Entity;
pub use scanner::Scanner;
pub use session::Session;
pub use value::FromValue;
pub use value::IntoValue;
// Re-export optional types
#[cfg(feature = "with-json")]
pub use value::Json;
pub use value::Value;
