//! Search log entries, provider results, and upload validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EntryId, UserId};

/// Credits consumed by one search.
pub const SEARCH_COST: i64 = 1;

/// Maximum accepted upload size (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Content types accepted for uploaded images.
pub const ALLOWED_CONTENT_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/webp", "image/gif"];

/// Check whether a content type is on the upload allow-list.
///
/// Matching ignores any media type parameters (`image/jpeg; charset=...`).
#[must_use]
pub fn is_allowed_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim();
    ALLOWED_CONTENT_TYPES
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(essence))
}

/// Outcome of the external provider call for a search attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchOutcome {
    /// The provider returned results; the charged credit was retained.
    Success,
    /// Storage or the provider failed; the charged credit was refunded.
    Failed,
}

/// One row per search attempt. Append-only audit trail, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchLogEntry {
    /// Time-ordered entry ID.
    pub id: EntryId,

    /// The account that ran the search.
    pub user_id: UserId,

    /// The image URL that was searched.
    pub image_url: String,

    /// Provider outcome.
    pub outcome: SearchOutcome,

    /// Credits actually retained: `SEARCH_COST` on success, 0 on a
    /// refunded failure.
    pub cost: i64,

    /// When the attempt was logged.
    pub created_at: DateTime<Utc>,
}

impl SearchLogEntry {
    /// Build a log entry for a completed search.
    #[must_use]
    pub fn success(user_id: UserId, image_url: String) -> Self {
        Self {
            id: EntryId::generate(),
            user_id,
            image_url,
            outcome: SearchOutcome::Success,
            cost: SEARCH_COST,
            created_at: Utc::now(),
        }
    }

    /// Build a log entry for a refunded failure.
    #[must_use]
    pub fn failed(user_id: UserId, image_url: String) -> Self {
        Self {
            id: EntryId::generate(),
            user_id,
            image_url,
            outcome: SearchOutcome::Failed,
            cost: 0,
            created_at: Utc::now(),
        }
    }
}

/// One match returned by the external search provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Page title of the match.
    pub title: String,

    /// Link to the page containing the match.
    pub link: String,

    /// Thumbnail URL for the matched image.
    #[serde(default)]
    pub thumbnail: Option<String>,

    /// Source site name.
    #[serde(default)]
    pub source: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_content_types() {
        assert!(is_allowed_content_type("image/jpeg"));
        assert!(is_allowed_content_type("image/PNG"));
        assert!(is_allowed_content_type("image/webp; q=1"));
        assert!(!is_allowed_content_type("image/tiff"));
        assert!(!is_allowed_content_type("text/html"));
        assert!(!is_allowed_content_type("application/octet-stream"));
    }

    #[test]
    fn success_entry_retains_cost() {
        let entry = SearchLogEntry::success(UserId::generate(), "https://x/img.jpg".into());
        assert_eq!(entry.outcome, SearchOutcome::Success);
        assert_eq!(entry.cost, SEARCH_COST);
    }

    #[test]
    fn failed_entry_costs_nothing() {
        let entry = SearchLogEntry::failed(UserId::generate(), "https://x/img.jpg".into());
        assert_eq!(entry.outcome, SearchOutcome::Failed);
        assert_eq!(entry.cost, 0);
    }

    #[test]
    fn outcome_serializes_as_tag() {
        assert_eq!(
            serde_json::to_string(&SearchOutcome::Success).unwrap(),
            "\"success\""
        );
        assert_eq!(
            serde_json::to_string(&SearchOutcome::Failed).unwrap(),
            "\"failed\""
        );
    }
}
