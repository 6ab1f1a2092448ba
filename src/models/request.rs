//! Borrow request model and lifecycle state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::book::BookId;

pub type RequestId = i64;

/// A patron's borrow request, as returned by the server.
///
/// The server is the source of truth for every field here: `is_approved`
/// and the timestamps are set by an external approver, and `is_overdue` is
/// computed server-side against `return_due_date`. The client never
/// patches these locally.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookRequest {
    pub id: RequestId,
    pub book: BookId,
    #[serde(default)]
    pub book_title: Option<String>,
    pub is_approved: bool,
    pub is_returned: bool,
    pub requested_at: DateTime<Utc>,
    #[serde(default)]
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub return_due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub returned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_overdue: bool,
}

/// Observable lifecycle state of a request. Exactly one holds at a time.
///
/// Only `ApprovedOutstanding -> Returned` is ever driven by this client;
/// `Pending -> ApprovedOutstanding` is observed, not caused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Pending,
    ApprovedOutstanding,
    Returned,
}

impl RequestState {
    pub fn label(&self) -> &'static str {
        match self {
            RequestState::Pending => "Pending",
            RequestState::ApprovedOutstanding => "Approved",
            RequestState::Returned => "Returned",
        }
    }
}

impl BookRequest {
    pub fn state(&self) -> RequestState {
        if self.is_returned {
            RequestState::Returned
        } else if self.is_approved {
            RequestState::ApprovedOutstanding
        } else {
            RequestState::Pending
        }
    }

    /// Whether the return action may be offered. False in Pending and
    /// Returned, so an idempotent re-return is unrepresentable in the UI.
    pub fn can_return(&self) -> bool {
        self.state() == RequestState::ApprovedOutstanding
    }

    /// The overdue flag, gated on state: it is meaningful only while the
    /// request is approved and outstanding, and must be ignored otherwise.
    pub fn overdue(&self) -> Option<bool> {
        match self.state() {
            RequestState::ApprovedOutstanding => Some(self.is_overdue),
            _ => None,
        }
    }

    pub fn book_title_display(&self) -> &str {
        self.book_title.as_deref().unwrap_or("Unknown")
    }
}

/// Dashboard aggregates over the full request list.
///
/// `approved` and `returned` are cumulative lifetime counts, not a
/// partition: a request that was approved and later returned counts in
/// both. The dashboard answers "how many have ever been approved" and
/// "how many have ever been returned" independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RequestSummary {
    pub total: usize,
    pub approved: usize,
    pub returned: usize,
}

impl RequestSummary {
    pub fn of(requests: &[BookRequest]) -> Self {
        Self {
            total: requests.len(),
            approved: requests.iter().filter(|r| r.is_approved).count(),
            returned: requests.iter().filter(|r| r.is_returned).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(is_approved: bool, is_returned: bool, is_overdue: bool) -> BookRequest {
        let requested_at = Utc.with_ymd_and_hms(2025, 1, 6, 10, 0, 0).unwrap();
        BookRequest {
            id: 1,
            book: 42,
            book_title: Some("Dune".to_string()),
            is_approved,
            is_returned,
            requested_at,
            approved_at: is_approved.then(|| requested_at + chrono::Duration::days(1)),
            return_due_date: (is_approved && !is_returned)
                .then(|| requested_at + chrono::Duration::days(8)),
            returned_at: is_returned.then(|| requested_at + chrono::Duration::days(3)),
            is_overdue,
        }
    }

    #[test]
    fn test_state_is_exactly_one_of_three() {
        assert_eq!(request(false, false, false).state(), RequestState::Pending);
        assert_eq!(
            request(true, false, false).state(),
            RequestState::ApprovedOutstanding
        );
        assert_eq!(request(true, true, false).state(), RequestState::Returned);
        // is_returned wins even if the approval flag was never observed
        assert_eq!(request(false, true, false).state(), RequestState::Returned);
    }

    #[test]
    fn test_overdue_only_readable_while_outstanding() {
        assert_eq!(request(false, false, true).overdue(), None);
        assert_eq!(request(true, true, true).overdue(), None);
        assert_eq!(request(true, false, true).overdue(), Some(true));
        assert_eq!(request(true, false, false).overdue(), Some(false));
    }

    #[test]
    fn test_return_action_never_offered_once_returned() {
        assert!(!request(false, false, false).can_return());
        assert!(!request(true, true, false).can_return());
        assert!(request(true, false, false).can_return());
    }

    #[test]
    fn test_overdue_does_not_block_returning() {
        let overdue = request(true, false, true);
        assert_eq!(overdue.overdue(), Some(true));
        assert!(overdue.can_return());
    }

    #[test]
    fn test_summary_counts_overlap() {
        let requests = vec![
            request(false, false, false),
            request(true, false, false),
            request(true, true, false),
        ];
        let summary = RequestSummary::of(&requests);
        assert_eq!(summary.total, 3);
        // the approved-and-returned request counts in both
        assert_eq!(summary.approved, 2);
        assert_eq!(summary.returned, 1);
    }

    #[test]
    fn test_summary_of_empty_list() {
        assert_eq!(RequestSummary::of(&[]), RequestSummary::default());
    }
}
