use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use super::room_template::RoomSize;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum BunkSize {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "small")]
    Small,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "large")]
    Large,
}

impl BunkSize {
    pub fn room_size(&self) -> Option<RoomSize> {
        match self {
            BunkSize::None => None,
            BunkSize::Small => Some(RoomSize::Small),
            BunkSize::Medium => Some(RoomSize::Medium),
            BunkSize::Large => Some(RoomSize::Large),
        }
    }
}

/// Size of a common area in a computed configuration. `None` means the area
/// is left out.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum AreaSize {
    #[default]
    #[serde(rename = "none")]
    None,
    #[serde(rename = "small")]
    Small,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "large")]
    Large,
}

impl AreaSize {
    pub fn room_size(&self) -> Option<RoomSize> {
        match self {
            AreaSize::None => None,
            AreaSize::Small => Some(RoomSize::Small),
            AreaSize::Medium => Some(RoomSize::Medium),
            AreaSize::Large => Some(RoomSize::Large),
        }
    }
}

impl From<RoomSize> for AreaSize {
    fn from(size: RoomSize) -> Self {
        match size {
            RoomSize::Small => AreaSize::Small,
            RoomSize::Medium => AreaSize::Medium,
            RoomSize::Large => AreaSize::Large,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub struct BunkCapacity {
    pub small: u32,
    pub medium: u32,
    pub large: u32,
}

impl Default for BunkCapacity {
    fn default() -> Self {
        Self {
            small: 4,
            medium: 6,
            large: 8,
        }
    }
}

impl BunkCapacity {
    pub fn capacity(&self, size: BunkSize) -> u32 {
        match size {
            BunkSize::None => 0,
            BunkSize::Small => self.small,
            BunkSize::Medium => self.medium,
            BunkSize::Large => self.large,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct BedroomMix {
    #[serde(default)]
    pub king: u32,
    #[serde(default)]
    pub double: u32,
    #[serde(default)]
    pub bunk: BunkSize,
}

impl BedroomMix {
    pub fn is_empty(&self) -> bool {
        self.king == 0 && self.double == 0 && self.bunk == BunkSize::None
    }
}

/// Common-area sizes. Also used as a rule's manual override, where a missing
/// field keeps the computed value.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommonAreaSizes {
    #[serde(default)]
    pub kitchen: AreaSize,
    #[serde(default)]
    pub dining: AreaSize,
    #[serde(default)]
    pub living: AreaSize,
    #[serde(default)]
    pub rec_room: AreaSize,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommonAreaOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kitchen: Option<AreaSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dining: Option<AreaSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub living: Option<AreaSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rec_room: Option<AreaSize>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BedroomMixRule {
    pub id: String,
    pub min_sqft: u32,
    pub max_sqft: u32,
    pub min_guests: u32,
    pub max_guests: u32,
    pub bedrooms: BedroomMix,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overrides: Option<CommonAreaOverrides>,
}

impl BedroomMixRule {
    pub fn contains(&self, sqft: u32, guests: u32) -> bool {
        (self.min_sqft..=self.max_sqft).contains(&sqft)
            && (self.min_guests..=self.max_guests).contains(&guests)
    }

    pub fn overlaps(&self, other: &BedroomMixRule) -> bool {
        self.min_sqft <= other.max_sqft
            && other.min_sqft <= self.max_sqft
            && self.min_guests <= other.max_guests
            && other.min_guests <= self.max_guests
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PresenceRule {
    #[serde(default)]
    pub always: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_sqft: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_guests: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SizeThreshold {
    pub size: RoomSize,
    pub min_sqft: u32,
    pub max_sqft: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
pub struct CommonAreaRule {
    #[serde(default)]
    pub presence: PresenceRule,
    /// Ordered small to large; the first bucket containing the input wins.
    #[serde(default)]
    pub sizes: Vec<SizeThreshold>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CommonAreaRules {
    #[serde(default)]
    pub kitchen: CommonAreaRule,
    #[serde(default)]
    pub dining: CommonAreaRule,
    #[serde(default)]
    pub living: CommonAreaRule,
    #[serde(default)]
    pub rec_room: CommonAreaRule,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidationEnvelope {
    pub min_sqft: u32,
    pub max_sqft: u32,
    pub min_guests: u32,
    pub max_guests: u32,
}

impl Default for ValidationEnvelope {
    fn default() -> Self {
        Self {
            min_sqft: 500,
            max_sqft: 20_000,
            min_guests: 1,
            max_guests: 50,
        }
    }
}

/// The `config/roomMappingRules` document. Saved whole on every edit.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AutoConfigRules {
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub bunk_capacity: BunkCapacity,
    #[serde(default)]
    pub bedroom_mix_rules: Vec<BedroomMixRule>,
    #[serde(default)]
    pub common_areas: CommonAreaRules,
    #[serde(default)]
    pub validation: ValidationEnvelope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ComputedConfiguration {
    pub bedrooms: BedroomMix,
    pub common_areas: CommonAreaSizes,
    pub total_capacity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_rule_id: Option<String>,
}

impl ComputedConfiguration {
    pub fn is_valid(&self) -> bool {
        self.matched_rule_id.is_some()
    }
}
