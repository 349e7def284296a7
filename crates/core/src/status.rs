//! Status-name normalization.
//!
//! Tracker deployments spell the same workflow status differently
//! (`in_progress`, `In Progress`, `IN_PROGRESS`, ...). Everything that
//! compares status names goes through [`normalize`] so those variants
//! collapse onto one key.

/// Canonical "pending review" status, requested for conform tasks.
pub const PENDING_REVIEW: &str = "pending review";

/// Canonical "in progress" status, used to list the artist's active tasks.
pub const IN_PROGRESS: &str = "in progress";

/// Review-like status names tried, in order, when no spelling of
/// [`PENDING_REVIEW`] exists on the server.
pub const PENDING_REVIEW_FALLBACKS: &[&str] = &["Awaiting Review", "Review", "To Review"];

/// Status names seen on production trackers, offered as suggestions.
pub const KNOWN_STATUSES: &[&str] = &[
    "not_started",
    "ready_to_start",
    "in_progress",
    "pending_review",
    "approved",
    "on_hold",
    "omitted",
    "client_approved",
    "could_be_better",
    "archived",
    "normal",
    "paused",
];

/// Collapse a status name to its comparison key: lowercase, trimmed, with
/// underscores and spaces removed.
///
/// ```
/// use shotbridge_core::status::normalize;
///
/// assert_eq!(normalize("In_Progress "), "inprogress");
/// assert_eq!(normalize("Pending Review"), "pendingreview");
/// ```
pub fn normalize(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .chars()
        .filter(|c| *c != '_' && *c != ' ')
        .collect()
}

/// Whether two status names refer to the same status.
pub fn statuses_match(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Known statuses that match `prefix` once both are normalized, so
/// `"in pro"` offers `in_progress`.
pub fn suggest_statuses(prefix: &str) -> Vec<&'static str> {
    let prefix = normalize(prefix);
    KNOWN_STATUSES
        .iter()
        .copied()
        .filter(|s| normalize(s).starts_with(&prefix))
        .collect()
}
