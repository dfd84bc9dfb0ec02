use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "mid")]
    Mid,
    #[serde(rename = "midHigh")]
    MidHigh,
    #[serde(rename = "high")]
    High,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Low, Tier::Mid, Tier::MidHigh, Tier::High];

    pub fn label(&self) -> &'static str {
        match self {
            Tier::Low => "Low",
            Tier::Mid => "Mid",
            Tier::MidHigh => "Mid-High",
            Tier::High => "High",
        }
    }
}

/// Four price points in integer cents.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TierPrices {
    #[serde(default)]
    pub low: i64,
    #[serde(default)]
    pub mid: i64,
    #[serde(default)]
    pub mid_high: i64,
    #[serde(default)]
    pub high: i64,
}

impl TierPrices {
    pub fn new(low: i64, mid: i64, mid_high: i64, high: i64) -> Self {
        Self {
            low,
            mid,
            mid_high,
            high,
        }
    }

    pub fn get(&self, tier: Tier) -> i64 {
        match tier {
            Tier::Low => self.low,
            Tier::Mid => self.mid,
            Tier::MidHigh => self.mid_high,
            Tier::High => self.high,
        }
    }

    pub fn from_fn(mut f: impl FnMut(Tier) -> i64) -> Self {
        Self {
            low: f(Tier::Low),
            mid: f(Tier::Mid),
            mid_high: f(Tier::MidHigh),
            high: f(Tier::High),
        }
    }

    // Arithmetic saturates at the i64 bounds.
    pub fn scaled(&self, factor: i64) -> Self {
        Self::from_fn(|tier| self.get(tier).saturating_mul(factor))
    }

    pub fn plus(&self, other: &TierPrices) -> Self {
        Self::from_fn(|tier| self.get(tier).saturating_add(other.get(tier)))
    }

    pub fn add_flat(&self, amount: i64) -> Self {
        Self::from_fn(|tier| self.get(tier).saturating_add(amount))
    }

    pub fn min(&self) -> i64 {
        Tier::ALL.iter().map(|tier| self.get(*tier)).min().unwrap_or_default()
    }

    pub fn max(&self) -> i64 {
        Tier::ALL.iter().map(|tier| self.get(*tier)).max().unwrap_or_default()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Catalog id, also used as the document `_id`.
    #[serde(rename = "_id", default)]
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub subcategory: Option<String>,
    pub prices: TierPrices,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

fn default_unit() -> String {
    "each".to_string()
}

/// In-memory `item id -> Item` lookup, built once per request or session.
#[derive(Debug, Clone, Default)]
pub struct ItemCatalog {
    items: HashMap<String, Item>,
}

impl ItemCatalog {
    pub fn new(items: Vec<Item>) -> Self {
        Self {
            items: items.into_iter().map(|item| (item.id.clone(), item)).collect(),
        }
    }

    pub fn get(&self, item_id: &str) -> Option<&Item> {
        self.items.get(item_id)
    }

    pub fn price(&self, item_id: &str, tier: Tier) -> Option<i64> {
        self.items.get(item_id).map(|item| item.prices.get(tier))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
