// SPDX-FileCopyrightText: 2026 ConsultEase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Static registry mapping logical event names to wire topic strings.
//!
//! Faculty-specific topics are parameterized by faculty id. Subscription
//! filters use MQTT wildcards: `+` matches one level, `#` matches the rest.

/// Legacy fixed topic for plain-text consultation requests.
pub const LEGACY_FACULTY_MESSAGES: &str = "professor/messages";

/// Fixed topic for system-level notifications consumed by the UI layer.
pub const SYSTEM_NOTIFICATIONS: &str = "consultease/system/notifications";

/// Structured consultation requests and cancellation control events.
pub fn faculty_requests(faculty_id: i64) -> String {
    format!("consultease/faculty/{faculty_id}/requests")
}

/// Inbound faculty desk unit responses.
pub fn faculty_responses(faculty_id: i64) -> String {
    format!("consultease/faculty/{faculty_id}/responses")
}

/// Subscription filter covering all faculty response topics.
pub const FACULTY_RESPONSES_FILTER: &str = "consultease/faculty/+/responses";

/// Legacy response topic family still used by older desk unit firmware.
pub const LEGACY_FACULTY_RESPONSES_FILTER: &str = "faculty/+/responses";

/// Faculty presence/status broadcasts.
pub fn faculty_status(faculty_id: i64) -> String {
    format!("consultease/faculty/{faculty_id}/status")
}

/// Subscription filter covering all faculty status topics.
pub const FACULTY_STATUS_FILTER: &str = "consultease/faculty/+/status";

/// Per-consultation status broadcasts consumed by the UI layer.
pub fn consultation_status(consultation_id: i64) -> String {
    format!("consultation/{consultation_id}/status")
}

/// Match a concrete topic against an MQTT-style filter.
///
/// `+` matches exactly one level; `#` matches all remaining levels and is
/// only valid as the final segment.
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_parts = filter.split('/');
    let mut topic_parts = topic.split('/');

    loop {
        match (filter_parts.next(), topic_parts.next()) {
            (Some("#"), _) => return true,
            (Some("+"), Some(_)) => continue,
            (Some(f), Some(t)) if f == t => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Extract the faculty id path parameter from a faculty-family topic.
///
/// Works for both the `consultease/faculty/{id}/...` and legacy
/// `faculty/{id}/...` shapes.
pub fn faculty_id_from_topic(topic: &str) -> Option<i64> {
    let segments: Vec<&str> = topic.split('/').collect();
    let idx = segments.iter().position(|s| *s == "faculty")?;
    segments.get(idx + 1)?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faculty_topic_shapes() {
        assert_eq!(faculty_requests(3), "consultease/faculty/3/requests");
        assert_eq!(faculty_responses(3), "consultease/faculty/3/responses");
        assert_eq!(faculty_status(7), "consultease/faculty/7/status");
        assert_eq!(consultation_status(12), "consultation/12/status");
    }

    #[test]
    fn single_level_wildcard_matches_one_segment() {
        assert!(topic_matches(
            FACULTY_RESPONSES_FILTER,
            "consultease/faculty/5/responses"
        ));
        assert!(!topic_matches(
            FACULTY_RESPONSES_FILTER,
            "consultease/faculty/5/requests"
        ));
        assert!(!topic_matches(
            FACULTY_RESPONSES_FILTER,
            "consultease/faculty/5/unit/responses"
        ));
    }

    #[test]
    fn multi_level_wildcard_matches_rest() {
        assert!(topic_matches("consultease/#", "consultease/faculty/5/responses"));
        assert!(topic_matches("#", "anything/at/all"));
        assert!(!topic_matches("faculty/#", "consultease/faculty/5"));
    }

    #[test]
    fn exact_match_without_wildcards() {
        assert!(topic_matches("professor/messages", "professor/messages"));
        assert!(!topic_matches("professor/messages", "professor/messages/extra"));
        assert!(!topic_matches("professor/messages/extra", "professor/messages"));
    }

    #[test]
    fn legacy_filter_matches_legacy_topics() {
        assert!(topic_matches(LEGACY_FACULTY_RESPONSES_FILTER, "faculty/2/responses"));
        assert!(!topic_matches(
            LEGACY_FACULTY_RESPONSES_FILTER,
            "consultease/faculty/2/responses"
        ));
    }

    #[test]
    fn faculty_id_extraction() {
        assert_eq!(faculty_id_from_topic("consultease/faculty/5/responses"), Some(5));
        assert_eq!(faculty_id_from_topic("faculty/12/responses"), Some(12));
        assert_eq!(faculty_id_from_topic("consultease/faculty/abc/responses"), None);
        assert_eq!(faculty_id_from_topic("professor/messages"), None);
    }
}
