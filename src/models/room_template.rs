use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::item::{ItemCatalog, TierPrices};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoomSize {
    #[serde(rename = "small")]
    Small,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "large")]
    Large,
}

impl RoomSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomSize::Small => "small",
            RoomSize::Medium => "medium",
            RoomSize::Large => "large",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum RoomCategory {
    #[serde(rename = "common_spaces")]
    CommonSpace,
    #[serde(rename = "sleeping_spaces")]
    SleepingSpace,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TemplateItem {
    pub item_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct SizeConfig {
    #[serde(default)]
    pub items: Vec<TemplateItem>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct TemplateSizes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub small: Option<SizeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medium: Option<SizeConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub large: Option<SizeConfig>,
}

impl TemplateSizes {
    pub fn get(&self, size: RoomSize) -> Option<&SizeConfig> {
        match size {
            RoomSize::Small => self.small.as_ref(),
            RoomSize::Medium => self.medium.as_ref(),
            RoomSize::Large => self.large.as_ref(),
        }
    }
}

// Older documents carry a precomputed `totals` object per size. It is ignored
// on decode; totals always come from the current catalog.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoomTemplate {
    #[serde(rename = "_id", default)]
    pub id: String,
    pub name: String,
    pub category: RoomCategory,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub sizes: TemplateSizes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl RoomTemplate {
    pub fn items(&self, size: RoomSize) -> &[TemplateItem] {
        self.sizes
            .get(size)
            .map(|config| config.items.as_slice())
            .unwrap_or(&[])
    }

    /// Sum of catalog tier price × quantity over the size's item list.
    /// Items missing from the catalog contribute nothing.
    pub fn tier_totals(&self, size: RoomSize, catalog: &ItemCatalog) -> Option<TierPrices> {
        let config = self.sizes.get(size)?;
        let totals = config
            .items
            .iter()
            .filter_map(|entry| {
                catalog
                    .get(&entry.item_id)
                    .map(|item| item.prices.scaled(entry.quantity as i64))
            })
            .fold(TierPrices::default(), |acc, prices| acc.plus(&prices));
        Some(totals)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TemplateStore {
    templates: HashMap<String, RoomTemplate>,
}

impl TemplateStore {
    pub fn new(templates: Vec<RoomTemplate>) -> Self {
        Self {
            templates: templates
                .into_iter()
                .map(|template| (template.id.clone(), template))
                .collect(),
        }
    }

    pub fn get(&self, room_type: &str) -> Option<&RoomTemplate> {
        self.templates.get(room_type)
    }

    /// Templates ordered by `sort_order`, then id.
    pub fn sorted(&self) -> Vec<&RoomTemplate> {
        let mut templates: Vec<&RoomTemplate> = self.templates.values().collect();
        templates.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.id.cmp(&b.id)));
        templates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::{Item, Tier};

    fn catalog() -> ItemCatalog {
        let item = |id: &str, low: i64| Item {
            id: id.to_string(),
            name: id.to_string(),
            category: "furniture".to_string(),
            subcategory: None,
            prices: TierPrices::new(low, low + 100, low + 200, low + 300),
            unit: "each".to_string(),
            created_at: None,
            updated_at: None,
        };
        ItemCatalog::new(vec![item("bed", 1_000), item("nightstand", 200)])
    }

    #[test]
    fn test_tier_totals_follow_catalog() {
        let template: RoomTemplate = serde_json::from_value(serde_json::json!({
            "_id": "king_bedroom",
            "name": "King Bedroom",
            "category": "sleeping_spaces",
            "sortOrder": 3,
            "sizes": {
                "medium": {
                    "items": [
                        { "itemId": "bed", "quantity": 1 },
                        { "itemId": "nightstand", "quantity": 2 },
                        { "itemId": "discontinued", "quantity": 5 }
                    ],
                    "totals": { "low": 1, "mid": 1, "midHigh": 1, "high": 1 }
                }
            }
        }))
        .unwrap();

        let totals = template.tier_totals(RoomSize::Medium, &catalog()).unwrap();
        assert_eq!(totals.get(Tier::Low), 1_400);
        assert_eq!(totals.get(Tier::High), 1_300 + 2 * 500);
        assert!(template.tier_totals(RoomSize::Large, &catalog()).is_none());
        assert!(template.items(RoomSize::Small).is_empty());
    }
}
