#![allow(dead_code)]

pub mod mocks;

use std::{fs, path::PathBuf};

use batch_xml_to_db::person::Person;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use tempfile::TempDir;

const SCHEMA: &str = include_str!("../../resources/schema.sql");

/// A file database holding the `person` table, removed on drop.
pub struct TestDatabase {
    pub pool: Pool<Sqlite>,
    pub url: String,
    dir: TempDir,
}

impl TestDatabase {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("persons.db");
        let url = format!("sqlite://{}", path.display());

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(2)
            .connect_with(options)
            .await
            .unwrap();

        sqlx::query(SCHEMA).execute(&pool).await.unwrap();

        Self { pool, url, dir }
    }

    /// Writes `content` to a file next to the database.
    pub fn input(&self, content: &str) -> PathBuf {
        let path = self.dir.path().join("persons.xml");
        fs::write(&path, content).unwrap();
        path
    }

    pub async fn persons(&self) -> Vec<Person> {
        let rows: Vec<(i32, String, String, String, i32)> = sqlx::query_as(
            "SELECT person_id, first_name, last_name, email, age FROM person ORDER BY rowid",
        )
        .fetch_all(&self.pool)
        .await
        .unwrap();

        rows.into_iter()
            .map(|(id, first_name, last_name, email, age)| Person {
                id,
                first_name,
                last_name,
                email,
                age,
            })
            .collect()
    }
}

pub fn person(id: i32, first_name: &str, last_name: &str, age: i32) -> Person {
    Person {
        id,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: format!("{}@example.com", first_name.to_lowercase()),
        age,
    }
}

pub fn person_fragment(person: &Person) -> String {
    format!(
        "<person><id>{}</id><firstName>{}</firstName><lastName>{}</lastName><email>{}</email><age>{}</age></person>",
        person.id, person.first_name, person.last_name, person.email, person.age
    )
}

pub fn document(persons: &[Person]) -> String {
    let fragments: String = persons.iter().map(person_fragment).collect();
    format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<persons>{}</persons>", fragments)
}
