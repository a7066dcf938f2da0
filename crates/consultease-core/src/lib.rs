// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared foundation for the ConsultEase central system.
//!
//! Defines the error taxonomy, the consultation domain types with their
//! status transition guard, the wire topic registry, and the adapter traits
//! (`Transport`, `MessageHandler`, `CacheInvalidator`) that the controller
//! and correlator are wired against.

pub mod error;
pub mod topics;
pub mod traits;
pub mod types;

pub use error::ConsultEaseError;
pub use traits::cache::{CacheInvalidator, NoopCacheInvalidator};
pub use traits::transport::{MessageHandler, Transport, TransportMessage};
pub use types::*;
