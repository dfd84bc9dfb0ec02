use serde::Serialize;

use crate::models::{
    budget::Budget,
    estimate::Estimate,
    item::{Tier, TierPrices},
};
use crate::services::pricing_service::{PricingContext, PricingService};

pub const SUMMARY_SHEET: &str = "Summary";
pub const ITEM_DETAILS_SHEET: &str = "Item Details";
pub const ROOM_BREAKDOWN_SHEET: &str = "Room Breakdown";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    fn new(name: &str, header: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            rows: vec![header.iter().map(|cell| cell.to_string()).collect()],
        }
    }

    fn push(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for row in &self.rows {
            let line: Vec<String> = row.iter().map(|cell| csv_cell(cell)).collect();
            out.push_str(&line.join(","));
            out.push_str("\r\n");
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets
            .iter()
            .find(|sheet| sheet.name.eq_ignore_ascii_case(name))
    }
}

/// Cents as a plain decimal amount, e.g. `-1234.05`.
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

fn csv_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

fn tier_cells(prices: &TierPrices) -> Vec<String> {
    Tier::ALL.iter().map(|tier| format_cents(prices.get(*tier))).collect()
}

pub struct ExportService;

impl ExportService {
    /// Formats an already priced estimate. Item unit prices are resolved the
    /// same way the budget resolved them.
    pub fn workbook(estimate: &Estimate, budget: &Budget, pricing: &PricingContext) -> Workbook {
        Workbook {
            sheets: vec![
                Self::summary(estimate, budget),
                Self::item_details(estimate, pricing),
                Self::room_breakdown(budget),
            ],
        }
    }

    fn summary(estimate: &Estimate, budget: &Budget) -> Sheet {
        let mut sheet = Sheet::new(SUMMARY_SHEET, &["Field", "Value", "", ""]);
        let client = &estimate.client;
        sheet.push(vec![
            "Client".to_string(),
            format!("{} {}", client.first_name, client.last_name),
        ]);
        sheet.push(vec!["Email".to_string(), client.email.clone()]);
        sheet.push(vec![
            "Square Footage".to_string(),
            estimate.property.square_footage.to_string(),
        ]);
        sheet.push(vec![
            "Guest Capacity".to_string(),
            estimate.property.guest_capacity.to_string(),
        ]);
        sheet.push(vec!["Status".to_string(), estimate.status.as_str().to_string()]);
        sheet.push(vec![]);

        sheet.push(vec![
            "Tier".to_string(),
            "Subtotal".to_string(),
            "Contingency".to_string(),
            "Total".to_string(),
        ]);
        for tier in Tier::ALL {
            let breakdown = budget.tier(tier);
            sheet.push(vec![
                tier.label().to_string(),
                format_cents(breakdown.subtotal),
                format_cents(breakdown.contingency),
                format_cents(breakdown.total),
            ]);
        }
        sheet.push(vec![
            "Furnishings Range".to_string(),
            format_cents(budget.range_low),
            format_cents(budget.range_high),
        ]);

        if let Some(project) = &budget.project {
            let add_ons = &project.add_ons;
            sheet.push(vec![]);
            for (label, amount) in [
                ("Design Fee", add_ons.design_fee),
                ("Planning", add_ons.planning),
                ("Procurement", add_ons.procurement),
                ("Implementation", add_ons.implementation),
                ("Installation", add_ons.installation),
                ("Freight", add_ons.freight),
                ("Storage", add_ons.storage),
                ("Photography", add_ons.photography),
                ("Supplies Kit", add_ons.supplies_kit),
                ("Add-on Total", project.add_on_total),
            ] {
                sheet.push(vec![label.to_string(), format_cents(amount)]);
            }
            sheet.push(vec![
                "Project Range".to_string(),
                format_cents(project.project_range_low),
                format_cents(project.project_range_high),
            ]);
        }

        sheet
    }

    fn item_details(estimate: &Estimate, pricing: &PricingContext) -> Sheet {
        let mut sheet = Sheet::new(
            ITEM_DETAILS_SHEET,
            &[
                "Room", "Item", "Category", "Quantity", "Low", "Mid", "Mid-High", "High",
            ],
        );
        let custom_range = estimate.custom_range.as_ref();

        for room in &estimate.rooms {
            for item in &room.items {
                let catalog_item = pricing.catalog.get(&item.item_id);
                let unit = TierPrices::from_fn(|tier| {
                    PricingService::unit_price(item, tier, &pricing.catalog, custom_range)
                        .unwrap_or(0)
                });
                let mut row = vec![
                    room.display_name.clone(),
                    catalog_item
                        .map(|found| found.name.clone())
                        .unwrap_or_else(|| item.item_id.clone()),
                    catalog_item
                        .map(|found| found.category.clone())
                        .unwrap_or_default(),
                    item.quantity.to_string(),
                ];
                row.extend(tier_cells(&unit.scaled(item.quantity as i64)));
                sheet.push(row);
            }
        }

        sheet
    }

    fn room_breakdown(budget: &Budget) -> Sheet {
        let mut sheet = Sheet::new(
            ROOM_BREAKDOWN_SHEET,
            &["Room", "Type", "Size", "Quantity", "Low", "Mid", "Mid-High", "High"],
        );

        for room in &budget.rooms {
            let mut row = vec![
                room.display_name.clone(),
                room.room_type.clone(),
                room.room_size.as_str().to_string(),
                room.quantity.to_string(),
            ];
            row.extend(tier_cells(&room.totals));
            sheet.push(row);
        }

        sheet
    }
}
