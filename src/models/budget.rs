use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use super::item::{Tier, TierPrices};
use super::room_template::RoomSize;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierBreakdown {
    pub subtotal: i64,
    /// Always zero; kept for document compatibility.
    pub contingency: i64,
    pub total: i64,
}

impl TierBreakdown {
    pub fn from_subtotal(subtotal: i64) -> Self {
        Self {
            subtotal,
            contingency: 0,
            total: subtotal,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomBreakdown {
    pub room_type: String,
    pub room_size: RoomSize,
    pub display_name: String,
    pub quantity: u32,
    pub totals: TierPrices,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PropertySpecs {
    pub square_footage: u32,
    pub guest_capacity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// The `config/budgetDefaults` document. Amounts in cents.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetDefaults {
    pub design_fee_rate_per_sqft: i64,
    pub installation: i64,
    pub freight: i64,
    pub storage: i64,
    pub photography: i64,
    pub supplies_kit: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl Default for BudgetDefaults {
    fn default() -> Self {
        Self {
            design_fee_rate_per_sqft: 1_000,
            installation: 350_000,
            freight: 250_000,
            storage: 100_000,
            photography: 75_000,
            supplies_kit: 150_000,
            updated_at: None,
        }
    }
}

/// Per-estimate add-on overrides. A set field replaces the default.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CustomProjectAddOns {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_fee_rate_per_sqft: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freight: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photography: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplies_kit: Option<i64>,
}

/// Custom price spread around each item's low price, in percent.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CustomRange {
    pub low_percent: f64,
    pub high_percent: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectAddOns {
    pub design_fee: i64,
    pub planning: i64,
    pub procurement: i64,
    pub implementation: i64,
    pub installation: i64,
    pub freight: i64,
    pub storage: i64,
    pub photography: i64,
    pub supplies_kit: i64,
}

impl ProjectAddOns {
    /// Sum of the eight add-on figures. The design fee itself is represented
    /// by its three parts.
    pub fn total(&self) -> i64 {
        [
            self.planning,
            self.procurement,
            self.implementation,
            self.installation,
            self.freight,
            self.storage,
            self.photography,
            self.supplies_kit,
        ]
        .into_iter()
        .fold(0, i64::saturating_add)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBudget {
    pub add_ons: ProjectAddOns,
    pub add_on_total: i64,
    pub totals: TierPrices,
    pub project_range_low: i64,
    pub project_range_high: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Budget {
    pub low: TierBreakdown,
    pub mid: TierBreakdown,
    pub mid_high: TierBreakdown,
    pub high: TierBreakdown,
    pub range_low: i64,
    pub range_high: i64,
    pub rooms: Vec<RoomBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<ProjectBudget>,
}

impl Budget {
    pub fn tier(&self, tier: Tier) -> &TierBreakdown {
        match tier {
            Tier::Low => &self.low,
            Tier::Mid => &self.mid,
            Tier::MidHigh => &self.mid_high,
            Tier::High => &self.high,
        }
    }

    pub fn totals(&self) -> TierPrices {
        TierPrices::from_fn(|tier| self.tier(tier).total)
    }
}
