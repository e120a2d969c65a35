use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_CATEGORY: &str = "General";

fn default_category() -> String {
    DEFAULT_CATEGORY.to_owned()
}

/// Missing, `null` and blank labels all collapse to [`DEFAULT_CATEGORY`].
fn category_or_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(default_category))
}

/// One downloadable PDF in the library catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub name: String,
    #[serde(default = "default_category", deserialize_with = "category_or_default")]
    pub category: String,
    #[serde(default = "default_category", deserialize_with = "category_or_default")]
    pub subcategory: String,
    pub file_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Resource {
    pub fn category_pair(&self) -> CategoryPair {
        CategoryPair {
            category: self.category.clone(),
            subcategory: self.subcategory.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CategoryPair {
    #[serde(default = "default_category", deserialize_with = "category_or_default")]
    pub category: String,
    #[serde(default = "default_category", deserialize_with = "category_or_default")]
    pub subcategory: String,
}

/// Bulk-import payload: resources listed under their category pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportGroup {
    #[serde(default = "default_category", deserialize_with = "category_or_default")]
    pub category: String,
    #[serde(default = "default_category", deserialize_with = "category_or_default")]
    pub subcategory: String,
    pub resources: Vec<ImportResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResource {
    pub name: String,
    pub file_link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub id: String,
    pub title: String,
    pub level: u8,
}

/// A level-1 heading and every deeper heading up to the next level-1 heading,
/// flattened into a single child list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingGroup {
    #[serde(flatten)]
    pub heading: Heading,
    pub children: Vec<Heading>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resource_defaults_missing_and_null_categories() -> anyhow::Result<()> {
        let json = r#"[
            {"id":"1","name":"A","file_link":"https://x/a","created_at":"2024-01-15T10:00:00Z"},
            {"id":"2","name":"B","category":null,"subcategory":"  ","file_link":"https://x/b","created_at":"2024-01-15T10:00:00Z"},
            {"id":"3","name":"C","category":"Placement Material","subcategory":"English","file_link":"https://x/c","thumbnail":"https://t/c","created_at":"2024-01-15T10:00:00Z"}
        ]"#;
        let resources: Vec<Resource> = serde_json::from_str(json)?;

        assert_eq!(resources[0].category, "General");
        assert_eq!(resources[0].subcategory, "General");
        assert_eq!(resources[1].category, "General");
        assert_eq!(resources[1].subcategory, "General");
        assert_eq!(resources[2].category, "Placement Material");
        assert_eq!(resources[2].thumbnail.as_deref(), Some("https://t/c"));
        Ok(())
    }

    #[test]
    fn heading_group_serializes_flat() -> anyhow::Result<()> {
        let group = HeadingGroup {
            heading: Heading {
                id: "a".to_owned(),
                title: "A".to_owned(),
                level: 1,
            },
            children: Vec::new(),
        };
        let value = serde_json::to_value(&group)?;
        assert_eq!(value["id"], "a");
        assert_eq!(value["level"], 1);
        assert!(value["children"].as_array().is_some_and(|c| c.is_empty()));
        Ok(())
    }
}
