/// Database models for the entity store
///
/// Each submodule owns one table: the model struct, its create/update input
/// structs, and the sqlx operations against it. Updates are expressed as
/// field deltas (structs of `Option` fields) applied with targeted per-field
/// assignments, never wholesale row replacement.
///
/// Operations that must share a transaction with an access check take
/// `&mut PgConnection`; simple single-statement reads are generic over
/// `PgExecutor` so they accept either a pool or an open transaction.

pub mod attachment;
pub mod comment;
pub mod membership;
pub mod project;
pub mod task;
pub mod user;

use serde::{Deserialize, Deserializer, Serialize};

/// Deserializer for double-`Option` delta fields
///
/// A plain derive collapses an explicit JSON `null` into the outer `None`,
/// making it indistinguishable from an absent field. Routed through this
/// helper (with `#[serde(default)]` supplying the absent case), a present
/// `null` becomes `Some(None)`, which the update builders translate into
/// clearing the column.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Priority scale shared by projects and tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// All values, in ascending order of urgency
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_as_str() {
        assert_eq!(Priority::Low.as_str(), "low");
        assert_eq!(Priority::Medium.as_str(), "medium");
        assert_eq!(Priority::High.as_str(), "high");
        assert_eq!(Priority::Urgent.as_str(), "urgent");
    }

    #[test]
    fn test_priority_all_covers_every_value() {
        assert_eq!(Priority::ALL.len(), 4);
    }
}
