use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub author: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when publishing a post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: Option<Uuid>,
}

/// Replacement values for an update; both fields are always written
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
}

/// Conditions for listing posts. Empty fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostFilter {
    /// Case-insensitive substring of the title
    pub title_contains: Option<String>,
    pub author: Option<Uuid>,
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        if let Some(needle) = &self.title_contains {
            if !post.title.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }
        if let Some(author) = self.author {
            if post.author != Some(author) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(title: &str, author: Option<Uuid>) -> Post {
        let now = Utc::now();
        Post {
            id: Uuid::new_v4(),
            title: title.to_string(),
            content: "body".to_string(),
            author,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(PostFilter::default().matches(&post("anything", None)));
    }

    #[test]
    fn title_filter_is_case_insensitive_substring() {
        let filter = PostFilter {
            title_contains: Some("RUST".to_string()),
            ..Default::default()
        };
        assert!(filter.matches(&post("Learning rust today", None)));
        assert!(!filter.matches(&post("Learning go today", None)));
    }

    #[test]
    fn author_filter_requires_exact_author() {
        let author = Uuid::new_v4();
        let filter = PostFilter {
            author: Some(author),
            ..Default::default()
        };
        assert!(filter.matches(&post("a", Some(author))));
        assert!(!filter.matches(&post("a", Some(Uuid::new_v4()))));
        assert!(!filter.matches(&post("a", None)));
    }

    #[test]
    fn serializes_with_camel_case_timestamps() {
        let value = serde_json::to_value(post("t", None)).unwrap();
        assert!(value.get("createdAt").is_some());
        assert!(value.get("updatedAt").is_some());
        assert!(value.get("author").unwrap().is_null());
    }
}
