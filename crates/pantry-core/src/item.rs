use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The list every installation has. It is never stored in the registry.
pub const DEFAULT_LIST: &str = "default";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub completed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default = "default_list_id")]
    pub list_id: String,
}

impl Item {
    pub fn new(name: &str, category: Option<String>, list_id: &str) -> Self {
        Self {
            id: new_item_id(),
            name: name.trim().to_string(),
            completed: false,
            category,
            list_id: list_id.to_string(),
        }
    }

    /// Copy of this item under `list_id` with a fresh id.
    pub fn duplicate_into(&self, list_id: &str) -> Self {
        Self {
            id: new_item_id(),
            list_id: list_id.to_string(),
            ..self.clone()
        }
    }

    pub fn belongs_to(&self, list_id: &str) -> bool {
        self.list_id == list_id
    }

    /// First eight characters of the id, enough to tell items apart on screen.
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(8)
            .map(|(idx, _)| idx)
            .unwrap_or(self.id.len());
        &self.id[..end]
    }
}

pub fn new_item_id() -> String {
    Uuid::new_v4().to_string()
}

fn default_list_id() -> String {
    DEFAULT_LIST.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_list_id_and_omits_missing_category() {
        let item = Item {
            id: "1".to_string(),
            name: "Milk".to_string(),
            completed: false,
            category: None,
            list_id: "weekly".to_string(),
        };

        let json = serde_json::to_string(&item).expect("serialize");
        assert_eq!(
            json,
            r#"{"id":"1","name":"Milk","completed":false,"listId":"weekly"}"#
        );
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let item: Item = serde_json::from_str(r#"{"id":"7","name":"Eggs"}"#).expect("parse");
        assert!(!item.completed);
        assert_eq!(item.category, None);
        assert_eq!(item.list_id, DEFAULT_LIST);
    }

    #[test]
    fn duplicate_keeps_content_but_not_identity() {
        let mut original = Item::new("  Bread ", Some("bakery".to_string()), DEFAULT_LIST);
        original.completed = true;

        let copy = original.duplicate_into("party");
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.name, "Bread");
        assert_eq!(copy.category.as_deref(), Some("bakery"));
        assert!(copy.completed);
        assert_eq!(copy.list_id, "party");
    }

    #[test]
    fn short_id_handles_short_legacy_ids() {
        let mut item = Item::new("Tea", None, DEFAULT_LIST);
        assert_eq!(item.short_id().len(), 8);

        item.id = "1712".to_string();
        assert_eq!(item.short_id(), "1712");
    }
}
