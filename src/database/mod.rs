// Copyright 2023 Remi Bernotavicius

use diesel::connection::SimpleConnection as _;
use diesel::prelude::Connection as _;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::error::Error;
use std::path::Path;

pub mod models;
pub mod schema;

pub type Connection = diesel::sqlite::SqliteConnection;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

pub fn establish_connection(
    path: impl AsRef<Path>,
) -> Result<Connection, Box<dyn Error + Send + Sync + 'static>> {
    let mut connection = Connection::establish(path.as_ref().to_str().unwrap())?;
    // SQLite leaves the schema's ON DELETE clauses inert unless asked
    connection.batch_execute("PRAGMA foreign_keys = ON;")?;
    connection.run_pending_migrations(MIGRATIONS)?;
    Ok(connection)
}

#[test]
fn migrations() {
    // both migrations (schema + seed data) must apply to a fresh database
    establish_connection(":memory:").unwrap();
}

#[test]
fn deleting_a_user_cascades() {
    use diesel::ExpressionMethods as _;
    use diesel::QueryDsl as _;
    use diesel::RunQueryDsl as _;

    let mut conn = establish_connection(":memory:").unwrap();

    {
        use schema::users::dsl::*;
        diesel::delete(users.filter(username.eq("demo")))
            .execute(&mut conn)
            .unwrap();
    }

    // the inventory and stored plans go with the user
    {
        use schema::ingredients::dsl::*;
        let count: i64 = ingredients.count().get_result(&mut conn).unwrap();
        assert_eq!(count, 0);
    }
    {
        use schema::mealplans::dsl::*;
        let count: i64 = mealplans.count().get_result(&mut conn).unwrap();
        assert_eq!(count, 0);
    }

    // recipes survive with their creator cleared
    {
        use schema::recipes::dsl::*;
        let creators: Vec<Option<models::UserId>> =
            recipes.select(created_by).load(&mut conn).unwrap();
        assert!(!creators.is_empty());
        assert!(creators.iter().all(|creator| creator.is_none()));
    }
}
