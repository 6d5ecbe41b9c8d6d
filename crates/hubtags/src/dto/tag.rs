use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier the registry assigned to a tag.
///
/// Docker Hub sends integers, other registries may send strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagId {
    Number(u64),
    Text(String),
}

impl fmt::Display for TagId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagId::Number(n) => write!(f, "{}", n),
            TagId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for TagId {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for TagId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// A normalized tag, ready to be shown to a user.
///
/// Built by [`normalize_entry`](crate::normalize::normalize_entry), so `architectures` is
/// always sorted, deduplicated and free of `"unknown"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryTag {
    id: TagId,
    name: String,
    architectures: Vec<String>,
    last_updated: Option<DateTime<Utc>>,
    last_updated_label: String,
}

impl RegistryTag {
    pub fn new(
        id: TagId,
        name: String,
        architectures: Vec<String>,
        last_updated: Option<DateTime<Utc>>,
        last_updated_label: String,
    ) -> Self {
        Self {
            id,
            name,
            architectures,
            last_updated,
            last_updated_label,
        }
    }

    pub fn id(&self) -> &TagId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn architectures(&self) -> &[String] {
        &self.architectures
    }

    /// The most recent push across all images of the tag, if any was valid.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Relative time label, e.g. `3 days ago`.
    pub fn last_updated_label(&self) -> &str {
        &self.last_updated_label
    }

    /// Text the fuzzy filter matches a tag against: the name followed by its architectures.
    pub fn search_text(&self) -> String {
        let mut text = self.name.clone();
        for arch in &self.architectures {
            text.push(' ');
            text.push_str(arch);
        }
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_text_joins_name_and_architectures() {
        let tag = RegistryTag::new(
            1.into(),
            "3.19".into(),
            vec!["amd64".into(), "arm64/v8".into()],
            None,
            "an unknown time ago".into(),
        );

        assert_eq!(tag.search_text(), "3.19 amd64 arm64/v8");
    }

    #[test]
    fn search_text_without_architectures_is_name() {
        let tag = RegistryTag::new("x".into(), "latest".into(), vec![], None, String::new());
        assert_eq!(tag.search_text(), "latest");
    }

    #[test]
    fn tag_id_display() {
        assert_eq!(TagId::Number(42).to_string(), "42");
        assert_eq!(TagId::from("sha-1").to_string(), "sha-1");
    }
}
