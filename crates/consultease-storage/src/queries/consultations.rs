// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Consultation CRUD and the transactional status transition.

use consultease_core::ConsultEaseError;
use rusqlite::params;

use crate::database::{map_tr_err, now_timestamp, Database};
use crate::models::{Consultation, ConsultationFilter, ConsultationStatus, NewConsultation};

const COLUMNS: &str = "id, student_id, faculty_id, request_message, course_code, status, \
                       requested_at, accepted_at, busy_at, completed_at, cancelled_at, updated_at";

fn row_to_consultation(row: &rusqlite::Row<'_>) -> Result<Consultation, rusqlite::Error> {
    let status_raw: String = row.get(5)?;
    let status = status_raw.parse::<ConsultationStatus>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Consultation {
        id: row.get(0)?,
        student_id: row.get(1)?,
        faculty_id: row.get(2)?,
        request_message: row.get(3)?,
        course_code: row.get(4)?,
        status,
        requested_at: row.get(6)?,
        accepted_at: row.get(7)?,
        busy_at: row.get(8)?,
        completed_at: row.get(9)?,
        cancelled_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Insert a new consultation with status PENDING and `requested_at` set now.
pub async fn create(
    db: &Database,
    new: NewConsultation,
) -> Result<Consultation, ConsultEaseError> {
    let requested_at = now_timestamp();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO consultations
                 (student_id, faculty_id, request_message, course_code, status, requested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    new.student_id,
                    new.faculty_id,
                    new.request_message,
                    new.course_code,
                    ConsultationStatus::Pending.to_string(),
                    requested_at,
                ],
            )?;
            Ok(Consultation {
                id: conn.last_insert_rowid(),
                student_id: new.student_id,
                faculty_id: new.faculty_id,
                request_message: new.request_message,
                course_code: new.course_code,
                status: ConsultationStatus::Pending,
                requested_at,
                accepted_at: None,
                busy_at: None,
                completed_at: None,
                cancelled_at: None,
                updated_at: None,
            })
        })
        .await
        .map_err(map_tr_err)
}

/// Get a consultation by id.
pub async fn get(db: &Database, id: i64) -> Result<Option<Consultation>, ConsultEaseError> {
    db.connection()
        .call(move |conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {COLUMNS} FROM consultations WHERE id = ?1"))?;
            match stmt.query_row(params![id], row_to_consultation) {
                Ok(consultation) => Ok(Some(consultation)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

/// List consultations matching the filter, newest-first by `requested_at`.
///
/// An empty result is not an error.
pub async fn list(
    db: &Database,
    filter: ConsultationFilter,
) -> Result<Vec<Consultation>, ConsultEaseError> {
    db.connection()
        .call(move |conn| {
            let mut sql = format!("SELECT {COLUMNS} FROM consultations");
            let mut clauses: Vec<String> = Vec::new();
            let mut bind: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

            if let Some(student_id) = filter.student_id {
                bind.push(Box::new(student_id));
                clauses.push(format!("student_id = ?{}", bind.len()));
            }
            if let Some(faculty_id) = filter.faculty_id {
                bind.push(Box::new(faculty_id));
                clauses.push(format!("faculty_id = ?{}", bind.len()));
            }
            if let Some(statuses) = &filter.status
                && !statuses.is_empty()
            {
                let mut placeholders = Vec::new();
                for status in statuses {
                    bind.push(Box::new(status.to_string()));
                    placeholders.push(format!("?{}", bind.len()));
                }
                clauses.push(format!("status IN ({})", placeholders.join(", ")));
            }

            if !clauses.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&clauses.join(" AND "));
            }
            // Tie-break on id so same-millisecond inserts stay newest-first.
            sql.push_str(" ORDER BY requested_at DESC, id DESC");

            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(
                rusqlite::params_from_iter(bind.iter().map(|p| p.as_ref())),
                row_to_consultation,
            )?;
            let mut consultations = Vec::new();
            for row in rows {
                consultations.push(row?);
            }
            Ok(consultations)
        })
        .await
        .map_err(map_tr_err)
}

/// The newest PENDING consultation for a faculty, if any.
///
/// Used as the best-effort correlation fallback for legacy responses that
/// carry no explicit consultation id.
pub async fn newest_pending_for_faculty(
    db: &Database,
    faculty_id: i64,
) -> Result<Option<Consultation>, ConsultEaseError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM consultations
                 WHERE faculty_id = ?1 AND status = ?2
                 ORDER BY requested_at DESC, id DESC
                 LIMIT 1"
            ))?;
            match stmt.query_row(
                params![faculty_id, ConsultationStatus::Pending.to_string()],
                row_to_consultation,
            ) {
                Ok(consultation) => Ok(Some(consultation)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(map_tr_err)
}

enum TransitionOutcome {
    Updated(Consultation),
    NotFound,
    Rejected(ConsultationStatus),
}

/// Apply a guarded status transition in a single transaction.
///
/// The read-guard-write sequence runs atomically on the single writer
/// thread, so concurrent updates to the same id are serialized and a losing
/// writer observes [`ConsultEaseError::InvalidTransition`] with the row
/// unchanged. The matching timestamp column is set exactly once; a
/// cancellation additionally sets `updated_at`.
pub async fn transition(
    db: &Database,
    id: i64,
    new_status: ConsultationStatus,
) -> Result<Consultation, ConsultEaseError> {
    let now = now_timestamp();
    let outcome = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction()?;

            let current = {
                let mut stmt = tx
                    .prepare(&format!("SELECT {COLUMNS} FROM consultations WHERE id = ?1"))?;
                match stmt.query_row(params![id], row_to_consultation) {
                    Ok(consultation) => consultation,
                    Err(rusqlite::Error::QueryReturnedNoRows) => {
                        return Ok(TransitionOutcome::NotFound);
                    }
                    Err(e) => return Err(e),
                }
            };

            if !current.status.permits(new_status) {
                return Ok(TransitionOutcome::Rejected(current.status));
            }

            let column = match new_status {
                ConsultationStatus::Accepted => "accepted_at",
                ConsultationStatus::Busy => "busy_at",
                ConsultationStatus::Completed => "completed_at",
                ConsultationStatus::Cancelled => "cancelled_at",
                // The guard never permits re-entering Pending.
                ConsultationStatus::Pending => {
                    return Ok(TransitionOutcome::Rejected(current.status));
                }
            };

            if new_status == ConsultationStatus::Cancelled {
                tx.execute(
                    &format!(
                        "UPDATE consultations SET status = ?1, {column} = ?2, updated_at = ?2
                         WHERE id = ?3"
                    ),
                    params![new_status.to_string(), now, id],
                )?;
            } else {
                tx.execute(
                    &format!(
                        "UPDATE consultations SET status = ?1, {column} = ?2 WHERE id = ?3"
                    ),
                    params![new_status.to_string(), now, id],
                )?;
            }
            tx.commit()?;

            let mut updated = current;
            updated.status = new_status;
            match new_status {
                ConsultationStatus::Accepted => updated.accepted_at = Some(now.clone()),
                ConsultationStatus::Busy => updated.busy_at = Some(now.clone()),
                ConsultationStatus::Completed => updated.completed_at = Some(now.clone()),
                ConsultationStatus::Cancelled => {
                    updated.cancelled_at = Some(now.clone());
                    updated.updated_at = Some(now.clone());
                }
                ConsultationStatus::Pending => {}
            }
            Ok(TransitionOutcome::Updated(updated))
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        TransitionOutcome::Updated(consultation) => Ok(consultation),
        TransitionOutcome::NotFound => Err(ConsultEaseError::NotFound {
            entity: "consultation",
            id,
        }),
        TransitionOutcome::Rejected(from) => Err(ConsultEaseError::InvalidTransition {
            id,
            from,
            to: new_status,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::directory;
    use tempfile::tempdir;

    async fn setup_db() -> (Database, tempfile::TempDir, i64, i64) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(db_path.to_str().unwrap()).await.unwrap();
        let student = directory::create_student(&db, "Ana Reyes", "Computer Science")
            .await
            .unwrap();
        let faculty = directory::create_faculty(&db, "Dr. Cruz", "Mathematics")
            .await
            .unwrap();
        (db, dir, student.id, faculty.id)
    }

    fn request(student_id: i64, faculty_id: i64) -> NewConsultation {
        NewConsultation {
            student_id,
            faculty_id,
            request_message: "Need help with thesis defense prep".to_string(),
            course_code: Some("CS401".to_string()),
        }
    }

    #[tokio::test]
    async fn create_and_get_roundtrips_as_pending() {
        let (db, _dir, student_id, faculty_id) = setup_db().await;

        let created = create(&db, request(student_id, faculty_id)).await.unwrap();
        assert!(created.id > 0);
        assert_eq!(created.status, ConsultationStatus::Pending);

        let fetched = get(&db, created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert!(fetched.accepted_at.is_none());
        assert!(fetched.busy_at.is_none());
        assert!(fetched.completed_at.is_none());
        assert!(fetched.cancelled_at.is_none());
        assert!(fetched.updated_at.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn get_missing_returns_none() {
        let (db, _dir, _, _) = setup_db().await;
        assert!(get(&db, 999).await.unwrap().is_none());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_filters_and_orders_newest_first() {
        let (db, _dir, student_id, faculty_id) = setup_db().await;
        let other_faculty = directory::create_faculty(&db, "Dr. Lim", "Physics")
            .await
            .unwrap();

        let first = create(&db, request(student_id, faculty_id)).await.unwrap();
        let second = create(&db, request(student_id, faculty_id)).await.unwrap();
        let elsewhere = create(&db, request(student_id, other_faculty.id))
            .await
            .unwrap();

        let all = list(&db, ConsultationFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].id, elsewhere.id);

        let for_faculty = list(
            &db,
            ConsultationFilter {
                faculty_id: Some(faculty_id),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(for_faculty.len(), 2);
        assert_eq!(for_faculty[0].id, second.id);
        assert_eq!(for_faculty[1].id, first.id);

        // Status filter with a set of values.
        transition(&db, first.id, ConsultationStatus::Accepted)
            .await
            .unwrap();
        let open = list(
            &db,
            ConsultationFilter {
                faculty_id: Some(faculty_id),
                status: Some(vec![ConsultationStatus::Accepted, ConsultationStatus::Busy]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, first.id);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn list_empty_result_is_ok() {
        let (db, _dir, _, _) = setup_db().await;
        let result = list(
            &db,
            ConsultationFilter {
                student_id: Some(42),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert!(result.is_empty());
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn accept_sets_timestamp_once() {
        let (db, _dir, student_id, faculty_id) = setup_db().await;
        let created = create(&db, request(student_id, faculty_id)).await.unwrap();

        let accepted = transition(&db, created.id, ConsultationStatus::Accepted)
            .await
            .unwrap();
        assert_eq!(accepted.status, ConsultationStatus::Accepted);
        let first_stamp = accepted.accepted_at.clone().unwrap();

        // Second application is a guard no-op, not a timestamp overwrite.
        let err = transition(&db, created.id, ConsultationStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsultEaseError::InvalidTransition { .. }));

        let stored = get(&db, created.id).await.unwrap().unwrap();
        assert_eq!(stored.accepted_at.as_deref(), Some(first_stamp.as_str()));

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn pending_cannot_skip_to_completed() {
        let (db, _dir, student_id, faculty_id) = setup_db().await;
        let created = create(&db, request(student_id, faculty_id)).await.unwrap();

        let err = transition(&db, created.id, ConsultationStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConsultEaseError::InvalidTransition {
                from: ConsultationStatus::Pending,
                to: ConsultationStatus::Completed,
                ..
            }
        ));

        // Row unchanged.
        let stored = get(&db, created.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ConsultationStatus::Pending);
        assert!(stored.completed_at.is_none());

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn cancel_sets_cancelled_and_updated_timestamps() {
        let (db, _dir, student_id, faculty_id) = setup_db().await;
        let created = create(&db, request(student_id, faculty_id)).await.unwrap();
        transition(&db, created.id, ConsultationStatus::Accepted)
            .await
            .unwrap();

        let cancelled = transition(&db, created.id, ConsultationStatus::Cancelled)
            .await
            .unwrap();
        assert_eq!(cancelled.status, ConsultationStatus::Cancelled);
        assert!(cancelled.cancelled_at.is_some());
        assert_eq!(cancelled.updated_at, cancelled.cancelled_at);

        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn transition_missing_row_is_not_found() {
        let (db, _dir, _, _) = setup_db().await;
        let err = transition(&db, 404, ConsultationStatus::Accepted)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ConsultEaseError::NotFound {
                entity: "consultation",
                id: 404
            }
        ));
        db.close().await.unwrap();
    }

    #[tokio::test]
    async fn newest_pending_prefers_latest_request() {
        let (db, _dir, student_id, faculty_id) = setup_db().await;

        assert!(newest_pending_for_faculty(&db, faculty_id)
            .await
            .unwrap()
            .is_none());

        let _older = create(&db, request(student_id, faculty_id)).await.unwrap();
        let newer = create(&db, request(student_id, faculty_id)).await.unwrap();

        let found = newest_pending_for_faculty(&db, faculty_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, newer.id);

        // Once the newest is no longer pending, the older one is returned.
        transition(&db, newer.id, ConsultationStatus::Busy)
            .await
            .unwrap();
        let found = newest_pending_for_faculty(&db, faculty_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, _older.id);

        db.close().await.unwrap();
    }
}
