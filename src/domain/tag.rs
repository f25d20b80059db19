// src/domain/tag.rs
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// A tag is identified by its title; the numeric id is a storage key only.
///
/// Equality, ordering and hashing all go through the title, so set membership
/// stays consistent whether a tag came from the database or from a request.
/// Titles compare byte-for-byte: no case folding, no trimming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub title: String,
}

impl Tag {
    pub fn new(id: i64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }

    pub fn has_title(&self, title: &str) -> bool {
        self.title == title
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.title.hash(state);
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.title.cmp(&other.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashSet};

    #[test]
    fn given_same_title_different_ids_when_comparing_then_tags_are_equal() {
        let a = Tag::new(1, "rust");
        let b = Tag::new(42, "rust");

        assert_eq!(a, b);
    }

    #[test]
    fn given_titles_differing_in_case_when_comparing_then_tags_differ() {
        let a = Tag::new(1, "Rust");
        let b = Tag::new(1, "rust");

        assert_ne!(a, b);
        assert!(!a.has_title("rust"));
    }

    #[test]
    fn given_surrounding_whitespace_when_comparing_then_tags_differ() {
        assert_ne!(Tag::new(1, "design"), Tag::new(2, " design"));
    }

    #[test]
    fn given_duplicate_titles_when_collecting_into_sets_then_keeps_one() {
        let tags = vec![Tag::new(1, "web_dev"), Tag::new(7, "web_dev"), Tag::new(2, "design")];

        let hashed: HashSet<_> = tags.iter().cloned().collect();
        let ordered: BTreeSet<_> = tags.into_iter().collect();

        assert_eq!(hashed.len(), 2);
        assert_eq!(ordered.len(), 2);
        let titles: Vec<_> = ordered.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, vec!["design", "web_dev"]);
    }
}
