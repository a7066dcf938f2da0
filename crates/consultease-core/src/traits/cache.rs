// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache invalidation hook for the external read-view cache.
//!
//! The core calls this after every committed transition but does not own or
//! implement the cache; the UI layer supplies its own implementation.

/// Invalidation call-out keyed by student/faculty owner id.
pub trait CacheInvalidator: Send + Sync {
    /// Drop cached consultation views for a student or faculty owner.
    fn invalidate_consultation_cache(&self, owner_id: i64);

    /// Drop cached faculty views after availability-affecting changes.
    fn invalidate_faculty_cache(&self, faculty_id: i64);
}

/// Default invalidator for deployments without a read-view cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCacheInvalidator;

impl CacheInvalidator for NoopCacheInvalidator {
    fn invalidate_consultation_cache(&self, _owner_id: i64) {}

    fn invalidate_faculty_cache(&self, _faculty_id: i64) {}
}
