// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared test doubles and fixtures for ConsultEase crates.
//!
//! Not part of the production dependency graph; only ever pulled in as a
//! dev-dependency.

pub mod harness;
pub mod mock_transport;
pub mod recording_cache;

pub use harness::{seed_faculty, seed_student, test_db, TestDb};
pub use mock_transport::{MockTransport, PublishedMessage};
pub use recording_cache::RecordingCache;
