use log::debug;
use serde::Serialize;

use crate::models::{
    item::ItemCatalog,
    room::{LegacyRoom, RoomItem},
    room_template::{RoomSize, TemplateStore},
    rules::{
        AreaSize, AutoConfigRules, BedroomMix, CommonAreaOverrides, CommonAreaRule,
        CommonAreaSizes, ComputedConfiguration, ValidationEnvelope,
    },
};

pub const KITCHEN: &str = "kitchen";
pub const DINING: &str = "dining";
pub const LIVING: &str = "living";
pub const REC_ROOM: &str = "rec_room";
pub const KING_BEDROOM: &str = "king_bedroom";
pub const DOUBLE_BEDROOM: &str = "double_bedroom";
pub const BUNK_ROOM: &str = "bunk_room";

// Bedrooms have no size rule of their own.
const BEDROOM_SIZE: RoomSize = RoomSize::Medium;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleIssue {
    OutOfEnvelope {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },
    InvertedRange {
        rule_id: String,
        field: &'static str,
    },
    OverlappingRules {
        first: String,
        second: String,
    },
    DuplicateRuleId {
        rule_id: String,
    },
    InvertedEnvelope {
        field: &'static str,
    },
}

impl std::fmt::Display for RuleIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuleIssue::OutOfEnvelope {
                field,
                value,
                min,
                max,
            } => write!(f, "{} {} is outside {}-{}", field, value, min, max),
            RuleIssue::InvertedRange { rule_id, field } => {
                write!(f, "Rule {} has min {} above max", rule_id, field)
            }
            RuleIssue::OverlappingRules { first, second } => {
                write!(f, "Rules {} and {} overlap", first, second)
            }
            RuleIssue::DuplicateRuleId { rule_id } => write!(f, "Rule id {} is used twice", rule_id),
            RuleIssue::InvertedEnvelope { field } => {
                write!(f, "Validation envelope has min {} above max", field)
            }
        }
    }
}

impl ValidationEnvelope {
    /// Caller-level gate for property specs; `compute` does not apply it.
    pub fn check(&self, sqft: u32, guests: u32) -> Result<(), Vec<RuleIssue>> {
        let mut issues = Vec::new();
        if sqft < self.min_sqft || sqft > self.max_sqft {
            issues.push(RuleIssue::OutOfEnvelope {
                field: "squareFootage",
                value: sqft,
                min: self.min_sqft,
                max: self.max_sqft,
            });
        }
        if guests < self.min_guests || guests > self.max_guests {
            issues.push(RuleIssue::OutOfEnvelope {
                field: "guestCapacity",
                value: guests,
                min: self.min_guests,
                max: self.max_guests,
            });
        }
        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }
}

pub struct AutoConfigService;

impl AutoConfigService {
    /// First bedroom-mix rule (in list order) containing the input wins.
    /// Without a match the mix is empty and every common area is `none`.
    pub fn compute(sqft: u32, guests: u32, rules: &AutoConfigRules) -> ComputedConfiguration {
        let Some(rule) = rules
            .bedroom_mix_rules
            .iter()
            .find(|rule| rule.contains(sqft, guests))
        else {
            debug!("No bedroom mix rule matches {} sqft / {} guests", sqft, guests);
            return ComputedConfiguration::default();
        };

        let computed = CommonAreaSizes {
            kitchen: Self::area_size(&rules.common_areas.kitchen, sqft, guests),
            dining: Self::area_size(&rules.common_areas.dining, sqft, guests),
            living: Self::area_size(&rules.common_areas.living, sqft, guests),
            rec_room: Self::area_size(&rules.common_areas.rec_room, sqft, guests),
        };
        let common_areas = match &rule.overrides {
            Some(overrides) => Self::apply_overrides(computed, overrides),
            None => computed,
        };

        ComputedConfiguration {
            bedrooms: rule.bedrooms,
            common_areas,
            total_capacity: Self::bedroom_capacity(&rule.bedrooms, rules),
            matched_rule_id: Some(rule.id.clone()),
        }
    }

    pub fn bedroom_capacity(mix: &BedroomMix, rules: &AutoConfigRules) -> u32 {
        mix.king * 2 + mix.double * 2 + rules.bunk_capacity.capacity(mix.bunk)
    }

    fn is_present(rule: &CommonAreaRule, sqft: u32, guests: u32) -> bool {
        let presence = &rule.presence;
        presence.always
            || presence.min_sqft.is_some_and(|min| sqft >= min)
            || presence.min_guests.is_some_and(|min| guests >= min)
    }

    fn area_size(rule: &CommonAreaRule, sqft: u32, guests: u32) -> AreaSize {
        if !Self::is_present(rule, sqft, guests) {
            return AreaSize::None;
        }

        rule.sizes
            .iter()
            .find(|bucket| (bucket.min_sqft..=bucket.max_sqft).contains(&sqft))
            .or_else(|| rule.sizes.first())
            .map(|bucket| AreaSize::from(bucket.size))
            .unwrap_or(AreaSize::Small)
    }

    fn apply_overrides(
        computed: CommonAreaSizes,
        overrides: &CommonAreaOverrides,
    ) -> CommonAreaSizes {
        CommonAreaSizes {
            kitchen: overrides.kitchen.unwrap_or(computed.kitchen),
            dining: overrides.dining.unwrap_or(computed.dining),
            living: overrides.living.unwrap_or(computed.living),
            rec_room: overrides.rec_room.unwrap_or(computed.rec_room),
        }
    }

    /// Checks a rule set before it is saved. Overlapping bedroom-mix
    /// rectangles are rejected instead of being settled by list order.
    pub fn validate_rules(rules: &AutoConfigRules) -> Result<(), Vec<RuleIssue>> {
        let mut issues = Vec::new();
        let envelope = &rules.validation;

        if envelope.min_sqft > envelope.max_sqft {
            issues.push(RuleIssue::InvertedEnvelope { field: "sqft" });
        }
        if envelope.min_guests > envelope.max_guests {
            issues.push(RuleIssue::InvertedEnvelope { field: "guests" });
        }

        for (index, rule) in rules.bedroom_mix_rules.iter().enumerate() {
            if rule.min_sqft > rule.max_sqft {
                issues.push(RuleIssue::InvertedRange {
                    rule_id: rule.id.clone(),
                    field: "sqft",
                });
            }
            if rule.min_guests > rule.max_guests {
                issues.push(RuleIssue::InvertedRange {
                    rule_id: rule.id.clone(),
                    field: "guests",
                });
            }

            for other in &rules.bedroom_mix_rules[index + 1..] {
                if other.id == rule.id {
                    issues.push(RuleIssue::DuplicateRuleId {
                        rule_id: rule.id.clone(),
                    });
                }
                if rule.overlaps(other) {
                    issues.push(RuleIssue::OverlappingRules {
                        first: rule.id.clone(),
                        second: other.id.clone(),
                    });
                }
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues)
        }
    }

    /// Turns a computed configuration into counted room selections, taking
    /// item lists from the templates. Room types without a template are left out.
    pub fn suggest_rooms(
        config: &ComputedConfiguration,
        templates: &TemplateStore,
        catalog: &ItemCatalog,
    ) -> Vec<LegacyRoom> {
        let areas = &config.common_areas;
        let mut wanted: Vec<(&str, RoomSize, u32)> = Vec::new();

        for (room_type, size) in [
            (KITCHEN, areas.kitchen),
            (DINING, areas.dining),
            (LIVING, areas.living),
            (REC_ROOM, areas.rec_room),
        ] {
            if let Some(size) = size.room_size() {
                wanted.push((room_type, size, 1));
            }
        }
        if config.bedrooms.king > 0 {
            wanted.push((KING_BEDROOM, BEDROOM_SIZE, config.bedrooms.king));
        }
        if config.bedrooms.double > 0 {
            wanted.push((DOUBLE_BEDROOM, BEDROOM_SIZE, config.bedrooms.double));
        }
        if let Some(size) = config.bedrooms.bunk.room_size() {
            wanted.push((BUNK_ROOM, size, 1));
        }

        wanted
            .into_iter()
            .filter_map(|(room_type, size, quantity)| {
                let Some(template) = templates.get(room_type) else {
                    debug!("No template for suggested room type {}", room_type);
                    return None;
                };
                let items = template
                    .items(size)
                    .iter()
                    .filter(|entry| catalog.get(&entry.item_id).is_some())
                    .map(|entry| RoomItem {
                        item_id: entry.item_id.clone(),
                        quantity: entry.quantity,
                        price_override: None,
                    })
                    .collect();
                Some(LegacyRoom {
                    room_type: room_type.to_string(),
                    room_size: size,
                    quantity,
                    display_name: template.name.clone(),
                    items,
                })
            })
            .collect()
    }
}
