// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the ConsultEase central system.

use thiserror::Error;

use crate::types::ConsultationStatus;

/// The primary error type used across all ConsultEase crates.
///
/// Persistence and guard errors propagate synchronously to the caller;
/// transport and delivery errors are absorbed into the queue-and-retry path
/// and never fail an already-committed write.
#[derive(Debug, Error)]
pub enum ConsultEaseError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, constraint violation).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Caller-supplied input rejected before any side effect was attempted.
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: i64 },

    /// The status transition guard rejected the requested change.
    ///
    /// Non-retryable and distinct from a storage failure; the stored row is
    /// left unchanged.
    #[error("invalid transition for consultation {id}: {from} -> {to}")]
    InvalidTransition {
        id: i64,
        from: ConsultationStatus,
        to: ConsultationStatus,
    },

    /// The publish could not be handed to the broker connection.
    ///
    /// Recovered locally by falling back to the offline queue.
    #[error("transport error: {message}")]
    Transport {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The offline queue attempt ceiling was reached for a message.
    #[error("delivery exhausted for faculty {faculty_id} after {attempts} attempts")]
    DeliveryExhausted { faculty_id: i64, attempts: u32 },

    /// An inbound response payload could not be mapped to any consultation.
    ///
    /// Expected and non-fatal given heterogeneous device payloads.
    #[error("correlation failure: {0}")]
    Correlation(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
