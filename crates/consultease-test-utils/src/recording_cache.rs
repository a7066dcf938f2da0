// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`CacheInvalidator`] double that records every invalidation call.

use std::sync::Mutex;

use consultease_core::traits::CacheInvalidator;

#[derive(Debug, Default)]
pub struct RecordingCache {
    consultation_owners: Mutex<Vec<i64>>,
    faculty_ids: Mutex<Vec<i64>>,
}

impl RecordingCache {
    pub fn new() -> RecordingCache {
        RecordingCache::default()
    }

    pub fn consultation_invalidations(&self) -> Vec<i64> {
        self.consultation_owners.lock().unwrap().clone()
    }

    pub fn faculty_invalidations(&self) -> Vec<i64> {
        self.faculty_ids.lock().unwrap().clone()
    }
}

impl CacheInvalidator for RecordingCache {
    fn invalidate_consultation_cache(&self, owner_id: i64) {
        self.consultation_owners.lock().unwrap().push(owner_id);
    }

    fn invalidate_faculty_cache(&self, faculty_id: i64) {
        self.faculty_ids.lock().unwrap().push(faculty_id);
    }
}
