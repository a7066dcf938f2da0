// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter traits decoupling the consultation core from its collaborators.

pub mod cache;
pub mod transport;

pub use cache::{CacheInvalidator, NoopCacheInvalidator};
pub use transport::{MessageHandler, Transport, TransportMessage};
