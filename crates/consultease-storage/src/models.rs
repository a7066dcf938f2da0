// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain model types for storage entities.
//!
//! The canonical types are defined in `consultease-core::types` for use
//! across trait boundaries. This module re-exports them for convenience
//! within the storage crate.

pub use consultease_core::types::{
    Consultation, ConsultationFilter, ConsultationStatus, Faculty, NewConsultation, Student,
};
