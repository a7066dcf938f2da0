// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence layer for the ConsultEase central system.
//!
//! Provides WAL-mode SQLite storage with embedded migrations, a
//! single-writer concurrency model via `tokio-rusqlite`, and typed
//! operations for consultations and the student/faculty directory.
//!
//! The consultation status transition guard is enforced inside a single
//! storage transaction, so concurrent writers are linearized by the store
//! and a losing writer observes `InvalidTransition` rather than corrupting
//! state.

pub mod database;
pub mod migrations;
pub mod models;
pub mod queries;

pub use database::Database;
pub use models::*;
