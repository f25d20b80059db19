// src/domain/bookmark.rs
use crate::domain::{OwnerId, Tag};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize)]
pub struct Bookmark {
    pub id: i64,
    pub title: String,
    pub url: String,
    #[serde(skip)]
    pub owner: OwnerId,
    pub tags: BTreeSet<Tag>,
}

impl Bookmark {
    pub fn has_tag(&self, title: &str) -> bool {
        self.tags.iter().any(|t| t.has_title(title))
    }

    pub fn has_tag_id(&self, tag_id: i64) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }

    pub fn tag_titles(&self) -> Vec<&str> {
        self.tags.iter().map(|t| t.title.as_str()).collect()
    }
}

/// Request body for adding a bookmark.
///
/// Missing `title`/`url` deserialize to empty strings so they surface as
/// validation failures instead of body rejections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct NewBookmark {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "tagIds", alias = "tagIDs")]
    pub tag_ids: Vec<i64>,
}

impl NewBookmark {
    pub fn new(title: impl Into<String>, url: impl Into<String>, tag_ids: Vec<i64>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            tag_ids,
        }
    }
}

/// Partial update: `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BookmarkPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl BookmarkPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.url.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookmarkTagPair {
    pub bookmark: Bookmark,
    pub tag: Tag,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_tag_ids_key_when_deserializing_then_accepts_both_spellings() {
        let camel: NewBookmark =
            serde_json::from_str(r#"{"title":"a","url":"b","tagIds":[1,2]}"#).unwrap();
        let upper: NewBookmark =
            serde_json::from_str(r#"{"title":"a","url":"b","tagIDs":[1,2]}"#).unwrap();

        assert_eq!(camel.tag_ids, vec![1, 2]);
        assert_eq!(camel, upper);
    }

    #[test]
    fn given_missing_fields_when_deserializing_then_defaults_to_empty() {
        let request: NewBookmark = serde_json::from_str("{}").unwrap();

        assert!(request.title.is_empty());
        assert!(request.url.is_empty());
        assert!(request.tag_ids.is_empty());
    }

    #[test]
    fn given_bookmark_when_serializing_then_omits_owner() {
        let bookmark = Bookmark {
            id: 3,
            title: "Facebook".to_string(),
            url: "facebook.com".to_string(),
            owner: OwnerId(9),
            tags: [Tag::new(1, "social")].into_iter().collect(),
        };

        let json = serde_json::to_value(&bookmark).unwrap();

        assert_eq!(json["title"], "Facebook");
        assert_eq!(json["tags"][0]["title"], "social");
        assert!(json.get("owner").is_none());
    }
}
