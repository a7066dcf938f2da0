// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Student and faculty directory queries.

use consultease_core::ConsultEaseError;
use rusqlite::params;

use crate::database::{map_tr_err, now_timestamp, Database};
use crate::models::{Faculty, Student};

fn row_to_student(row: &rusqlite::Row<'_>) -> Result<Student, rusqlite::Error> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        department: row.get(2)?,
    })
}

fn row_to_faculty(row: &rusqlite::Row<'_>) -> Result<Faculty, rusqlite::Error> {
    Ok(Faculty {
        id: row.get(0)?,
        name: row.get(1)?,
        department: row.get(2)?,
        available: row.get::<_, i64>(3)? != 0,
        last_seen: row.get(4)?,
    })
}

pub async fn create_student(
    db: &Database,
    name: &str,
    department: &str,
) -> Result<Student, ConsultEaseError> {
    let name = name.to_string();
    let department = department.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO students (name, department) VALUES (?1, ?2)",
                params![name, department],
            )?;
            Ok(Student {
                id: conn.last_insert_rowid(),
                name,
                department,
            })
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_student(db: &Database, id: i64) -> Result<Option<Student>, ConsultEaseError> {
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare("SELECT id, name, department FROM students WHERE id = ?1")?;
            match stmt.query_row(params![id], row_to_student) {
                Ok(student) => Ok(Some(student)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// New faculty rows start unavailable until their desk unit reports in.
pub async fn create_faculty(
    db: &Database,
    name: &str,
    department: &str,
) -> Result<Faculty, ConsultEaseError> {
    let name = name.to_string();
    let department = department.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO faculty (name, department) VALUES (?1, ?2)",
                params![name, department],
            )?;
            Ok(Faculty {
                id: conn.last_insert_rowid(),
                name,
                department,
                available: false,
                last_seen: None,
            })
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_faculty(db: &Database, id: i64) -> Result<Option<Faculty>, ConsultEaseError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, name, department, available, last_seen FROM faculty WHERE id = ?1",
            )?;
            match stmt.query_row(params![id], row_to_faculty) {
                Ok(faculty) => Ok(Some(faculty)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// Update a faculty member's availability and `last_seen` stamp.
///
/// Returns the availability as it stood before the update, or `None` when no
/// such faculty exists. Callers use the previous value to detect the
/// offline-to-available edge that triggers a queue drain.
pub async fn set_faculty_availability(
    db: &Database,
    faculty_id: i64,
    available: bool,
) -> Result<Option<bool>, ConsultEaseError> {
    let now = now_timestamp();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let previous: Option<i64> = {
                let mut stmt = tx.prepare("SELECT available FROM faculty WHERE id = ?1")?;
                match stmt.query_row(params![faculty_id], |row| row.get(0)) {
                    Ok(value) => Some(value),
                    Err(rusqlite::Error::QueryReturnedNoRows) => None,
                    Err(e) => return Err(e),
                }
            };
            if previous.is_some() {
                tx.execute(
                    "UPDATE faculty SET available = ?1, last_seen = ?2 WHERE id = ?3",
                    params![available as i64, now, faculty_id],
                )?;
            }
            tx.commit()?;
            Ok(previous.map(|v| v != 0))
        })
        .await
        .map_err(map_tr_err)
}
