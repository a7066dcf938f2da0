// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Consultation lifecycle orchestration.
//!
//! Ties the storage layer and the transport together: the
//! [`ConsultationController`] is the sole writer of consultation state, the
//! [`OfflineQueue`] buffers outbound requests for unreachable faculty desk
//! units, and the response/presence handlers fold inbound broker traffic
//! back into durable state.
//!
//! All services are constructed once at process start and passed down as
//! `Arc`s; there are no globals.

pub mod controller;
pub mod presence;
pub mod queue;
pub mod responses;

pub use controller::{ConsultationController, ConsultationObserver};
pub use presence::FacultyPresenceHandler;
pub use queue::{OfflineQueue, QueuedMessage};
pub use responses::FacultyResponseHandler;
