// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The consultation controller: sole writer of consultation state.
//!
//! Every committed transition invalidates the read-view cache and fans out
//! to the registered observers. Publish failures never roll back a
//! committed write; delivery degrades to the offline queue instead.

use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use consultease_core::topics::{self, LEGACY_FACULTY_MESSAGES};
use consultease_core::traits::{CacheInvalidator, Transport};
use consultease_core::types::{
    CancelPayload, Consultation, ConsultationFilter, ConsultationStatus, MessagePriority,
    NewConsultation, QoS, RequestPayload, WirePayload,
};
use consultease_core::ConsultEaseError;
use consultease_storage::queries::{consultations, directory};
use consultease_storage::Database;

use crate::queue::OfflineQueue;

/// Observer invoked synchronously after every committed transition.
///
/// Contract: catch-log-continue. A failing observer is logged and never
/// blocks subsequent observers or the triggering transition.
pub type ConsultationObserver =
    Box<dyn Fn(&Consultation) -> Result<(), ConsultEaseError> + Send + Sync>;

pub struct ConsultationController {
    db: Database,
    transport: Arc<dyn Transport>,
    queue: Arc<OfflineQueue>,
    cache: Arc<dyn CacheInvalidator>,
    observers: Mutex<Vec<ConsultationObserver>>,
}

impl ConsultationController {
    pub fn new(
        db: Database,
        transport: Arc<dyn Transport>,
        queue: Arc<OfflineQueue>,
        cache: Arc<dyn CacheInvalidator>,
    ) -> ConsultationController {
        ConsultationController {
            db,
            transport,
            queue,
            cache,
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Append an observer, invoked in registration order after every
    /// committed transition.
    pub fn register_callback(&self, observer: ConsultationObserver) {
        self.observers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(observer);
    }

    /// Create a PENDING consultation and notify the faculty desk unit.
    ///
    /// The database write is authoritative; the request publish is
    /// best-effort-then-queued and never fails the call.
    pub async fn create_consultation(
        &self,
        student_id: i64,
        faculty_id: i64,
        request_message: &str,
        course_code: Option<&str>,
    ) -> Result<Consultation, ConsultEaseError> {
        if request_message.trim().is_empty() {
            return Err(ConsultEaseError::Validation(
                "request message must not be empty".to_string(),
            ));
        }
        let student = directory::get_student(&self.db, student_id)
            .await?
            .ok_or(ConsultEaseError::NotFound {
                entity: "student",
                id: student_id,
            })?;
        let faculty = directory::get_faculty(&self.db, faculty_id)
            .await?
            .ok_or(ConsultEaseError::NotFound {
                entity: "faculty",
                id: faculty_id,
            })?;

        let consultation = consultations::create(
            &self.db,
            NewConsultation {
                student_id,
                faculty_id,
                request_message: request_message.to_string(),
                course_code: course_code.map(str::to_string),
            },
        )
        .await?;
        info!(
            consultation_id = consultation.id,
            student_id = student_id,
            faculty_id = faculty_id,
            "consultation created"
        );

        let request = RequestPayload {
            id: consultation.id,
            student_id: student.id,
            student_name: student.name.clone(),
            student_department: student.department.clone(),
            faculty_id: faculty.id,
            faculty_name: faculty.name.clone(),
            request_message: consultation.request_message.clone(),
            course_code: consultation.course_code.clone(),
            status: consultation.status,
            requested_at: consultation.requested_at.clone(),
        };
        let request_json = serde_json::to_value(&request)
            .map_err(|e| ConsultEaseError::Internal(format!("request encoding failed: {e}")))?;
        let topic = topics::faculty_requests(faculty_id);

        match self
            .transport
            .publish(&topic, WirePayload::Json(request_json.clone()), QoS::AtLeastOnce)
            .await
        {
            Ok(()) => {
                // Duplicate plain-text publish for desk units on the legacy
                // firmware. Not queued on failure; the structured request is
                // the durable one.
                let legacy = format!(
                    "Student: {}\nCourse: {}\nRequest: {}",
                    student.name,
                    consultation.course_code.as_deref().unwrap_or("N/A"),
                    consultation.request_message
                );
                if let Err(e) = self
                    .transport
                    .publish(
                        LEGACY_FACULTY_MESSAGES,
                        WirePayload::Text(legacy),
                        QoS::ExactlyOnce,
                    )
                    .await
                {
                    warn!(consultation_id = consultation.id, error = %e, "legacy publish failed");
                }
            }
            Err(e) => {
                warn!(
                    consultation_id = consultation.id,
                    faculty_id = faculty_id,
                    error = %e,
                    "request publish failed, queueing"
                );
                self.queue
                    .enqueue(
                        faculty_id,
                        consultation.id,
                        topic,
                        WirePayload::Json(request_json),
                        QoS::AtLeastOnce,
                        MessagePriority::Normal,
                    )
                    .await;
            }
        }

        self.after_transition(&consultation);
        Ok(consultation)
    }

    /// Apply a guarded status transition.
    ///
    /// Deliberately does not re-publish the consultation to the faculty
    /// topic; that would re-trigger the desk unit's display.
    pub async fn update_consultation_status(
        &self,
        consultation_id: i64,
        new_status: ConsultationStatus,
    ) -> Result<Consultation, ConsultEaseError> {
        let updated = consultations::transition(&self.db, consultation_id, new_status).await?;
        info!(
            consultation_id = consultation_id,
            status = %updated.status,
            "consultation status updated"
        );
        self.after_transition(&updated);
        Ok(updated)
    }

    /// Cancel a consultation and tell the desk unit to drop its display.
    ///
    /// Cancelling an already-CANCELLED consultation is an idempotent no-op
    /// returning the existing record.
    pub async fn cancel_consultation(
        &self,
        consultation_id: i64,
    ) -> Result<Consultation, ConsultEaseError> {
        let current = self.get_consultation_by_id(consultation_id).await?;
        if current.status == ConsultationStatus::Cancelled {
            warn!(
                consultation_id = consultation_id,
                "cancel requested for already-cancelled consultation"
            );
            return Ok(current);
        }
        if !current.status.cancellable() {
            return Err(ConsultEaseError::InvalidTransition {
                id: consultation_id,
                from: current.status,
                to: ConsultationStatus::Cancelled,
            });
        }

        let cancelled =
            consultations::transition(&self.db, consultation_id, ConsultationStatus::Cancelled)
                .await?;
        info!(consultation_id = consultation_id, "consultation cancelled");

        // The original request may still be buffered for an unreachable desk
        // unit. Withdraw it regardless of how the cancel publish goes, so a
        // later drain cannot deliver a request for a cancelled consultation.
        self.queue.remove(cancelled.faculty_id, consultation_id).await;

        let mut payload = CancelPayload::new(consultation_id);
        if let Some(student) = directory::get_student(&self.db, cancelled.student_id).await? {
            payload.student_name = Some(student.name);
        }
        let cancel_json = serde_json::to_value(&payload)
            .map_err(|e| ConsultEaseError::Internal(format!("cancel encoding failed: {e}")))?;
        let topic = topics::faculty_requests(cancelled.faculty_id);

        if let Err(e) = self
            .transport
            .publish(&topic, WirePayload::Json(cancel_json.clone()), QoS::AtLeastOnce)
            .await
        {
            warn!(
                consultation_id = consultation_id,
                error = %e,
                "cancel publish failed, queueing at high priority"
            );
            self.queue
                .enqueue(
                    cancelled.faculty_id,
                    consultation_id,
                    topic,
                    WirePayload::Json(cancel_json),
                    QoS::AtLeastOnce,
                    MessagePriority::High,
                )
                .await;
        }

        self.after_transition(&cancelled);
        Ok(cancelled)
    }

    /// Filterable consultation listing, newest-first by `requested_at`.
    pub async fn get_consultations(
        &self,
        filter: ConsultationFilter,
    ) -> Result<Vec<Consultation>, ConsultEaseError> {
        consultations::list(&self.db, filter).await
    }

    pub async fn get_consultation_by_id(
        &self,
        consultation_id: i64,
    ) -> Result<Consultation, ConsultEaseError> {
        consultations::get(&self.db, consultation_id)
            .await?
            .ok_or(ConsultEaseError::NotFound {
                entity: "consultation",
                id: consultation_id,
            })
    }

    /// Cache invalidation and observer fan-out after a committed transition.
    fn after_transition(&self, consultation: &Consultation) {
        self.cache
            .invalidate_consultation_cache(consultation.student_id);
        self.cache
            .invalidate_consultation_cache(consultation.faculty_id);

        let observers = self.observers.lock().unwrap_or_else(|e| e.into_inner());
        for observer in observers.iter() {
            if let Err(e) = observer(consultation) {
                warn!(
                    consultation_id = consultation.id,
                    error = %e,
                    "consultation observer failed"
                );
            }
        }
    }
}
