use actix_web::{web, HttpResponse};
use log::info;
use mongodb::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::catalog::CatalogRepository;
use crate::error::ApiError;
use crate::models::{
    budget::{Budget, CustomProjectAddOns, CustomRange, PropertySpecs},
    room::{RoomInstance, StoredRoom},
    rules::ComputedConfiguration,
};
use crate::routes::{check_room_inputs, load_pricing_context};
use crate::services::{
    auto_config_service::AutoConfigService,
    pricing_service::{CalculationOptions, PricingService},
    room_normalizer,
};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoConfigRequest {
    pub square_footage: u32,
    pub guest_capacity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoConfigResponse {
    pub configuration: ComputedConfiguration,
    pub rooms: Vec<RoomInstance>,
    pub budget: Budget,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    pub rooms: Vec<StoredRoom>,
    #[serde(default)]
    pub property_specs: Option<PropertySpecs>,
    #[serde(default)]
    pub custom_range: Option<CustomRange>,
    #[serde(default)]
    pub custom_project_add_ons: Option<CustomProjectAddOns>,
}

/*
    POST /api/auto-config
*/
pub async fn auto_config(
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<AutoConfigRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = input.into_inner();
    let catalog = CatalogRepository::new(&data, &config.database);

    let rules = catalog.load_rules().await?;
    rules
        .validation
        .check(request.square_footage, request.guest_capacity)
        .map_err(|issues| ApiError::validation(&issues))?;

    let configuration =
        AutoConfigService::compute(request.square_footage, request.guest_capacity, &rules);
    info!(
        "Auto-config for {} sqft / {} guests matched {:?}",
        request.square_footage, request.guest_capacity, configuration.matched_rule_id
    );

    let pricing = load_pricing_context(&data, &config).await?;
    let suggested =
        AutoConfigService::suggest_rooms(&configuration, &pricing.templates, &pricing.catalog);
    let rooms = room_normalizer::normalize(suggested.into_iter().map(StoredRoom::from).collect());

    let options = CalculationOptions {
        property_specs: Some(PropertySpecs {
            square_footage: request.square_footage,
            guest_capacity: request.guest_capacity,
            address: None,
        }),
        budget_defaults: pricing.budget_defaults.clone(),
        ..Default::default()
    };
    let budget = PricingService::calculate(&rooms, &pricing.templates, &pricing.catalog, &options);

    Ok(HttpResponse::Ok().json(AutoConfigResponse {
        configuration,
        rooms,
        budget,
    }))
}

/*
    POST /api/calculate
*/
pub async fn calculate(
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<CalculateRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = input.into_inner();
    check_room_inputs(
        &request.rooms,
        request.custom_range.as_ref(),
        request.custom_project_add_ons.as_ref(),
    )?;
    let rooms = room_normalizer::normalize(request.rooms);
    let pricing = load_pricing_context(&data, &config).await?;

    let options = CalculationOptions {
        custom_range: request.custom_range,
        budget_defaults: request
            .property_specs
            .as_ref()
            .and(pricing.budget_defaults.clone()),
        property_specs: request.property_specs,
        add_on_overrides: request.custom_project_add_ons,
    };
    let budget = PricingService::calculate(&rooms, &pricing.templates, &pricing.catalog, &options);

    Ok(HttpResponse::Ok().json(budget))
}
