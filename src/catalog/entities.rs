use super::{Bookmarkable, Searchable};
use crate::core::EntityKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub description: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub average_rating: Option<f64>,
    #[serde(default)]
    pub total_ratings: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    pub description: String,
    pub file_url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizHistory {
    pub id: String,
    pub topic: String,
    pub score: u32,
    pub total_questions: u32,
    pub created_at: DateTime<Utc>,
}

impl QuizHistory {
    /// Score as a whole percentage; zero for an empty quiz.
    pub fn percentage(&self) -> u32 {
        if self.total_questions == 0 {
            return 0;
        }
        ((f64::from(self.score) / f64::from(self.total_questions)) * 100.0).round() as u32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Community {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Searchable for Course {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.description.as_str()]
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn owner_id(&self) -> Option<&str> {
        Some(self.user_id.as_str())
    }
}

impl Bookmarkable for Course {
    const KIND: EntityKind = EntityKind::Course;
}

impl Searchable for Resource {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.description.as_str()]
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn owner_id(&self) -> Option<&str> {
        Some(self.user_id.as_str())
    }
}

impl Bookmarkable for Resource {
    const KIND: EntityKind = EntityKind::Resource;
}

impl Searchable for QuizHistory {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![self.topic.as_str()]
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Bookmarkable for QuizHistory {
    const KIND: EntityKind = EntityKind::Quiz;
}

impl Searchable for Community {
    fn entity_id(&self) -> &str {
        &self.id
    }

    fn search_fields(&self) -> Vec<&str> {
        let mut fields: Vec<&str> = vec![self.title.as_str(), self.description.as_str()];
        fields.extend(self.tags.iter().map(String::as_str));
        fields
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
