use crate::core::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Tag distinguishing the bookmarkable resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Course,
    Resource,
    Quiz,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [Self::Course, Self::Resource, Self::Quiz];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Course => "course",
            Self::Resource => "resource",
            Self::Quiz => "quiz",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "course" | "courses" => Ok(Self::Course),
            "resource" | "resources" => Ok(Self::Resource),
            "quiz" | "quizzes" => Ok(Self::Quiz),
            other => Err(Error::invalid_argument(format!(
                "unknown entity kind '{other}' (expected course, resource or quiz)"
            ))),
        }
    }
}

/// Direction of a bookmark write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationAction {
    Add,
    Remove,
}

impl MutationAction {
    /// Membership of the entity once this action has been applied.
    pub fn target_membership(&self) -> bool {
        matches!(self, Self::Add)
    }
}

impl fmt::Display for MutationAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Add => "add",
            Self::Remove => "remove",
        };
        write!(f, "{label}")
    }
}

/// One row of the persistence service's bookmark table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkRecord {
    pub id: Uuid,
    pub user_id: String,
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub created_at: DateTime<Utc>,
}

impl BookmarkRecord {
    pub fn new(user_id: &str, entity_kind: EntityKind, entity_id: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            entity_kind,
            entity_id: entity_id.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn matches(&self, user_id: &str, entity_kind: EntityKind) -> bool {
        self.user_id == user_id && self.entity_kind == entity_kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_round_trips_through_display() {
        for kind in EntityKind::ALL {
            assert_eq!(kind.to_string().parse::<EntityKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_entity_kind_parse_is_lenient_about_case_and_plural() {
        assert_eq!("Courses".parse::<EntityKind>().unwrap(), EntityKind::Course);
        assert_eq!(" QUIZ ".parse::<EntityKind>().unwrap(), EntityKind::Quiz);
    }

    #[test]
    fn test_entity_kind_rejects_unknown_tag() {
        let err = "community".parse::<EntityKind>().unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_entity_kind_serializes_lowercase() {
        let json = serde_json::to_string(&EntityKind::Resource).unwrap();
        assert_eq!(json, "\"resource\"");
    }
}
