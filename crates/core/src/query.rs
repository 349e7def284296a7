//! Typed query builder for the tracker expression language.
//!
//! A [`Query`] renders to expressions such as
//! `Shot where name is "SH010" and parent.id is "abc"` via
//! [`Query::expression`]. Stores that evaluate queries locally match on the
//! typed [`Filter`] list directly instead of parsing the string.

use crate::entity::{EntityId, EntityKind};
use crate::types::Timestamp;

/// Queryable attribute paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    Name,
    ParentId,
    ContextId,
    ResourceId,
    UserId,
    Username,
    StatusName,
    TypeName,
}

impl Field {
    /// Dotted attribute path as understood by the tracker.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Name => "name",
            Self::ParentId => "parent.id",
            Self::ContextId => "context.id",
            Self::ResourceId => "resource.id",
            Self::UserId => "user.id",
            Self::Username => "username",
            Self::StatusName => "status.name",
            Self::TypeName => "type.name",
        }
    }
}

/// A single predicate. All filters in a query are AND-ed.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `field is "value"`
    Eq(Field, String),
    /// `field like "pattern"` where `%` matches any run of characters.
    Like(Field, String),
    /// `assignments any (resource.id is "user")`
    AssignedTo(EntityId),
    /// `start >= "timestamp"`
    StartsAtOrAfter(Timestamp),
}

impl Filter {
    fn render(&self) -> String {
        match self {
            Self::Eq(field, value) => format!("{} is {}", field.path(), quote(value)),
            Self::Like(field, pattern) => format!("{} like {}", field.path(), quote(pattern)),
            Self::AssignedTo(user_id) => {
                format!("assignments any (resource.id is {})", quote(user_id.as_str()))
            }
            Self::StartsAtOrAfter(ts) => format!("start >= {}", quote(&ts.to_rfc3339())),
        }
    }
}

/// A query over one entity kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    kind: EntityKind,
    filters: Vec<Filter>,
    limit: Option<usize>,
}

impl Query {
    /// Query every entity of `kind`.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            filters: Vec::new(),
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn id_is(self, id: &EntityId) -> Self {
        self.filter(Filter::Eq(Field::Id, id.as_str().to_string()))
    }

    pub fn name_is(self, name: &str) -> Self {
        self.filter(Filter::Eq(Field::Name, name.to_string()))
    }

    pub fn name_like(self, pattern: &str) -> Self {
        self.filter(Filter::Like(Field::Name, pattern.to_string()))
    }

    pub fn parent_is(self, parent_id: &EntityId) -> Self {
        self.filter(Filter::Eq(Field::ParentId, parent_id.as_str().to_string()))
    }

    pub fn context_is(self, context_id: &EntityId) -> Self {
        self.filter(Filter::Eq(Field::ContextId, context_id.as_str().to_string()))
    }

    pub fn resource_is(self, resource_id: &EntityId) -> Self {
        self.filter(Filter::Eq(Field::ResourceId, resource_id.as_str().to_string()))
    }

    pub fn user_is(self, user_id: &EntityId) -> Self {
        self.filter(Filter::Eq(Field::UserId, user_id.as_str().to_string()))
    }

    pub fn username_is(self, username: &str) -> Self {
        self.filter(Filter::Eq(Field::Username, username.to_string()))
    }

    pub fn status_name_is(self, status: &str) -> Self {
        self.filter(Filter::Eq(Field::StatusName, status.to_string()))
    }

    pub fn assigned_to(self, user_id: &EntityId) -> Self {
        self.filter(Filter::AssignedTo(user_id.clone()))
    }

    pub fn starting_from(self, ts: Timestamp) -> Self {
        self.filter(Filter::StartsAtOrAfter(ts))
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn max_results(&self) -> Option<usize> {
        self.limit
    }

    /// Render the query in the tracker expression language.
    pub fn expression(&self) -> String {
        let mut expr = self.kind.as_str().to_string();
        if !self.filters.is_empty() {
            let clauses: Vec<String> = self.filters.iter().map(Filter::render).collect();
            expr.push_str(" where ");
            expr.push_str(&clauses.join(" and "));
        }
        if let Some(limit) = self.limit {
            expr.push_str(&format!(" limit {limit}"));
        }
        expr
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.expression())
    }
}

/// Double-quote a value, escaping backslashes and embedded quotes.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Evaluate a `like` pattern where `%` matches any (possibly empty) run of
/// characters. Matching is case-sensitive, as on the tracker.
pub fn like_matches(pattern: &str, value: &str) -> bool {
    let parts: Vec<&str> = pattern.split('%').collect();
    if parts.len() == 1 {
        return pattern == value;
    }

    let first = parts[0];
    let last = parts[parts.len() - 1];
    if !value.starts_with(first) || value.len() < first.len() + last.len() {
        return false;
    }
    let mut rest = &value[first.len()..];

    for part in &parts[1..parts.len() - 1] {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }

    rest.ends_with(last)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn bare_kind_renders_alone() {
        assert_eq!(Query::new(EntityKind::Status).expression(), "Status");
    }

    #[test]
    fn reconcile_query_renders_name_and_parent() {
        let query = Query::new(EntityKind::Shot)
            .name_is("SH010")
            .parent_is(&EntityId::new("seq-1"));
        assert_eq!(
            query.expression(),
            r#"Shot where name is "SH010" and parent.id is "seq-1""#
        );
    }

    #[test]
    fn values_are_escaped() {
        let query = Query::new(EntityKind::Shot).name_is(r#"SH"010\"#);
        assert_eq!(query.expression(), r#"Shot where name is "SH\"010\\""#);
    }

    #[test]
    fn assigned_to_and_limit_render() {
        let query = Query::new(EntityKind::Task)
            .assigned_to(&EntityId::new("u-1"))
            .status_name_is("In Progress")
            .limit(200);
        assert_eq!(
            query.expression(),
            r#"Task where assignments any (resource.id is "u-1") and status.name is "In Progress" limit 200"#
        );
    }

    #[test]
    fn start_filter_uses_rfc3339() {
        let ts = chrono::Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let query = Query::new(EntityKind::Timelog).starting_from(ts);
        assert_eq!(
            query.expression(),
            r#"Timelog where start >= "2024-03-01T00:00:00+00:00""#
        );
    }

    #[test]
    fn like_without_wildcard_is_equality() {
        assert!(like_matches("SH010", "SH010"));
        assert!(!like_matches("SH010", "SH0100"));
    }

    #[test]
    fn like_prefix_suffix_and_infix() {
        assert!(like_matches("SH%", "SH010"));
        assert!(like_matches("%010", "SH010"));
        assert!(like_matches("%H0%", "SH010"));
        assert!(like_matches("S%0%0", "SH010"));
        assert!(!like_matches("SQ%", "SH010"));
    }

    #[test]
    fn like_does_not_overlap_prefix_and_suffix() {
        assert!(!like_matches("ab%ba", "aba"));
    }
}
