// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database fixtures backed by a temporary directory.

use consultease_core::types::{Faculty, Student};
use consultease_storage::queries::directory;
use consultease_storage::Database;
use tempfile::TempDir;

/// An open database in a temp directory. Dropping it removes the files.
pub struct TestDb {
    pub db: Database,
    _dir: TempDir,
}

/// Open a fresh migrated database under a temp directory.
///
/// Panics on failure; only for tests.
pub async fn test_db() -> TestDb {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("consultease.db");
    let db = Database::open(path.to_str().expect("utf-8 temp path"))
        .await
        .expect("open test database");
    TestDb { db, _dir: dir }
}

/// Insert a student row with placeholder details.
pub async fn seed_student(db: &Database, name: &str) -> Student {
    directory::create_student(db, name, "Computer Science")
        .await
        .expect("seed student")
}

/// Insert a faculty row with placeholder details. Starts unavailable.
pub async fn seed_faculty(db: &Database, name: &str) -> Faculty {
    directory::create_faculty(db, name, "Mathematics")
        .await
        .expect("seed faculty")
}
