use log::warn;

use crate::models::{
    budget::{
        Budget, BudgetDefaults, CustomProjectAddOns, CustomRange, ProjectAddOns, ProjectBudget,
        PropertySpecs, RoomBreakdown, TierBreakdown,
    },
    estimate::Estimate,
    item::{ItemCatalog, Tier, TierPrices},
    room::{RoomItem, RoomLine},
    room_template::TemplateStore,
};

const PLANNING_SHARE: f64 = 0.40;
const PROCUREMENT_SHARE: f64 = 0.30;

/// Upper bound for any client-supplied amount in cents (100M).
pub const MAX_AMOUNT_CENTS: i64 = 10_000_000_000;
pub const MAX_ITEM_QUANTITY: u32 = 1_000;
pub const MAX_RANGE_PERCENT: f64 = 1_000.0;

/// Client-supplied pricing input outside the accepted bounds.
#[derive(Debug, Clone, PartialEq)]
pub enum PricingInputError {
    ItemQuantity { item_id: String, quantity: u32 },
    PriceOverride { item_id: String },
    CustomRange(CustomRange),
    AddOn(&'static str),
}

impl std::fmt::Display for PricingInputError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingInputError::ItemQuantity { item_id, quantity } => write!(
                f,
                "Item {} has quantity {}, at most {} allowed",
                item_id, quantity, MAX_ITEM_QUANTITY
            ),
            PricingInputError::PriceOverride { item_id } => write!(
                f,
                "Price override for {} must be between 0 and {} cents",
                item_id, MAX_AMOUNT_CENTS
            ),
            PricingInputError::CustomRange(range) => write!(
                f,
                "Custom range {}% / {}% is out of bounds",
                range.low_percent, range.high_percent
            ),
            PricingInputError::AddOn(field) => write!(
                f,
                "Add-on {} must be between 0 and {} cents",
                field, MAX_AMOUNT_CENTS
            ),
        }
    }
}

impl std::error::Error for PricingInputError {}

fn amount_in_bounds(amount: i64) -> bool {
    (0..=MAX_AMOUNT_CENTS).contains(&amount)
}

/// Knobs for a budget calculation. Project add-ons are only computed when
/// both `property_specs` and `budget_defaults` are present.
#[derive(Debug, Clone, Default)]
pub struct CalculationOptions {
    pub custom_range: Option<CustomRange>,
    pub property_specs: Option<PropertySpecs>,
    pub budget_defaults: Option<BudgetDefaults>,
    pub add_on_overrides: Option<CustomProjectAddOns>,
}

/// Catalog snapshot used to price estimates during one request or session.
#[derive(Debug, Clone, Default)]
pub struct PricingContext {
    pub catalog: ItemCatalog,
    pub templates: TemplateStore,
    pub budget_defaults: Option<BudgetDefaults>,
}

impl PricingContext {
    pub fn new(
        catalog: ItemCatalog,
        templates: TemplateStore,
        budget_defaults: Option<BudgetDefaults>,
    ) -> Self {
        Self {
            catalog,
            templates,
            budget_defaults,
        }
    }

    pub fn options_for(&self, estimate: &Estimate) -> CalculationOptions {
        CalculationOptions {
            custom_range: estimate.custom_range,
            property_specs: Some(estimate.property.clone()),
            budget_defaults: self.budget_defaults.clone(),
            add_on_overrides: estimate.custom_project_add_ons,
        }
    }

    pub fn price(&self, estimate: &Estimate) -> Budget {
        PricingService::calculate(
            &estimate.rooms,
            &self.templates,
            &self.catalog,
            &self.options_for(estimate),
        )
    }
}

pub struct PricingService;

impl PricingService {
    /// Aggregate room × item × tier prices into a tiered budget, optionally
    /// with a project range on top.
    pub fn calculate<'a, I>(
        rooms: I,
        templates: &TemplateStore,
        catalog: &ItemCatalog,
        options: &CalculationOptions,
    ) -> Budget
    where
        I: IntoIterator,
        I::Item: Into<RoomLine<'a>>,
    {
        let mut breakdown = Vec::new();
        let mut subtotals = TierPrices::default();

        for room in rooms {
            let room: RoomLine<'a> = room.into();
            let Some(totals) = Self::room_totals(&room, templates, catalog, options) else {
                warn!(
                    "Skipping room {} ({}): no items and no template",
                    room.display_name, room.room_type
                );
                continue;
            };

            subtotals = subtotals.plus(&totals);
            breakdown.push(RoomBreakdown {
                room_type: room.room_type.to_string(),
                room_size: room.room_size,
                display_name: room.display_name.to_string(),
                quantity: room.quantity,
                totals,
            });
        }

        let project = match (&options.property_specs, &options.budget_defaults) {
            (Some(specs), Some(defaults)) => Some(Self::project_budget(
                &subtotals,
                specs,
                defaults,
                options.add_on_overrides.as_ref(),
            )),
            _ => None,
        };

        Budget {
            low: TierBreakdown::from_subtotal(subtotals.low),
            mid: TierBreakdown::from_subtotal(subtotals.mid),
            mid_high: TierBreakdown::from_subtotal(subtotals.mid_high),
            high: TierBreakdown::from_subtotal(subtotals.high),
            range_low: subtotals.low,
            range_high: subtotals.mid,
            rooms: breakdown,
            project,
        }
    }

    /// Tier totals for one room line, already multiplied by its quantity.
    pub fn room_totals(
        room: &RoomLine<'_>,
        templates: &TemplateStore,
        catalog: &ItemCatalog,
        options: &CalculationOptions,
    ) -> Option<TierPrices> {
        let per_room = if !room.items.is_empty() {
            TierPrices::from_fn(|tier| {
                room.items
                    .iter()
                    .map(|item| {
                        Self::unit_price(item, tier, catalog, options.custom_range.as_ref())
                            .unwrap_or(0)
                            .saturating_mul(item.quantity as i64)
                    })
                    .fold(0, i64::saturating_add)
            })
        } else {
            templates
                .get(room.room_type)?
                .tier_totals(room.room_size, catalog)?
        };

        Some(per_room.scaled(room.quantity as i64))
    }

    /// Rejects room items, custom range percentages and add-on overrides a
    /// client could use to push the arithmetic out of range.
    pub fn check_inputs<'a, I>(
        rooms: I,
        custom_range: Option<&CustomRange>,
        add_on_overrides: Option<&CustomProjectAddOns>,
    ) -> Result<(), PricingInputError>
    where
        I: IntoIterator,
        I::Item: Into<RoomLine<'a>>,
    {
        for room in rooms {
            let room: RoomLine<'a> = room.into();
            for item in room.items {
                if item.quantity > MAX_ITEM_QUANTITY {
                    return Err(PricingInputError::ItemQuantity {
                        item_id: item.item_id.clone(),
                        quantity: item.quantity,
                    });
                }
                if let Some(prices) = &item.price_override {
                    if !amount_in_bounds(prices.min()) || !amount_in_bounds(prices.max()) {
                        return Err(PricingInputError::PriceOverride {
                            item_id: item.item_id.clone(),
                        });
                    }
                }
            }
        }

        if let Some(range) = custom_range {
            let valid = range.low_percent.is_finite()
                && range.high_percent.is_finite()
                && (0.0..=100.0).contains(&range.low_percent)
                && (0.0..=MAX_RANGE_PERCENT).contains(&range.high_percent);
            if !valid {
                return Err(PricingInputError::CustomRange(*range));
            }
        }

        if let Some(custom) = add_on_overrides {
            let fields = [
                ("designFeeRatePerSqft", custom.design_fee_rate_per_sqft),
                ("installation", custom.installation),
                ("freight", custom.freight),
                ("storage", custom.storage),
                ("photography", custom.photography),
                ("suppliesKit", custom.supplies_kit),
            ];
            if let Some((field, _)) = fields
                .into_iter()
                .find(|(_, value)| value.is_some_and(|amount| !amount_in_bounds(amount)))
            {
                return Err(PricingInputError::AddOn(field));
            }
        }

        Ok(())
    }

    /// Price resolution order: room-item override, custom range derived from
    /// the catalog low price, catalog tier price.
    pub fn unit_price(
        item: &RoomItem,
        tier: Tier,
        catalog: &ItemCatalog,
        custom_range: Option<&CustomRange>,
    ) -> Option<i64> {
        if let Some(prices) = &item.price_override {
            return Some(prices.get(tier));
        }

        let Some(catalog_item) = catalog.get(&item.item_id) else {
            warn!("Item {} is not in the catalog", item.item_id);
            return None;
        };

        match custom_range {
            Some(range) => Some(Self::custom_range_prices(catalog_item.prices.low, range).get(tier)),
            None => Some(catalog_item.prices.get(tier)),
        }
    }

    /// Spread a base low price by the configured percentages. The two upper
    /// tiers sit at 0.75 and 1.5 of the spread above the low end.
    pub fn custom_range_prices(base_low: i64, range: &CustomRange) -> TierPrices {
        let base = base_low as f64;
        let low_end = (base * (1.0 - range.low_percent / 100.0)).round();
        let high_end = (base * (1.0 + range.high_percent / 100.0)).round();
        let spread = high_end - low_end;

        TierPrices {
            low: low_end as i64,
            mid: high_end as i64,
            mid_high: (low_end + spread * 0.75).round() as i64,
            high: (low_end + spread * 1.5).round() as i64,
        }
    }

    /// Design fee split 40/30/30. Implementation takes the rounding
    /// remainder so the parts always sum to the fee.
    pub fn split_design_fee(design_fee: i64) -> (i64, i64, i64) {
        let fee = design_fee as f64;
        let planning = (fee * PLANNING_SHARE).round() as i64;
        let procurement = (fee * PROCUREMENT_SHARE).round() as i64;
        (
            planning,
            procurement,
            design_fee.saturating_sub(planning).saturating_sub(procurement),
        )
    }

    pub fn project_add_ons(
        specs: &PropertySpecs,
        defaults: &BudgetDefaults,
        overrides: Option<&CustomProjectAddOns>,
    ) -> ProjectAddOns {
        let custom = overrides.copied().unwrap_or_default();
        let rate = custom
            .design_fee_rate_per_sqft
            .unwrap_or(defaults.design_fee_rate_per_sqft);
        let design_fee = (specs.square_footage as i64).saturating_mul(rate);
        let (planning, procurement, implementation) = Self::split_design_fee(design_fee);

        ProjectAddOns {
            design_fee,
            planning,
            procurement,
            implementation,
            installation: custom.installation.unwrap_or(defaults.installation),
            freight: custom.freight.unwrap_or(defaults.freight),
            storage: custom.storage.unwrap_or(defaults.storage),
            photography: custom.photography.unwrap_or(defaults.photography),
            supplies_kit: custom.supplies_kit.unwrap_or(defaults.supplies_kit),
        }
    }

    fn project_budget(
        furnishings: &TierPrices,
        specs: &PropertySpecs,
        defaults: &BudgetDefaults,
        overrides: Option<&CustomProjectAddOns>,
    ) -> ProjectBudget {
        let add_ons = Self::project_add_ons(specs, defaults, overrides);
        let add_on_total = add_ons.total();
        let totals = furnishings.add_flat(add_on_total);

        ProjectBudget {
            add_ons,
            add_on_total,
            totals,
            project_range_low: totals.low,
            project_range_high: totals.mid,
        }
    }
}
