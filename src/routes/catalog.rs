use actix_web::{web, HttpResponse};
use log::info;
use mongodb::Client;
use serde::Serialize;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::catalog::CatalogRepository;
use crate::error::ApiError;
use crate::models::{
    budget::BudgetDefaults,
    item::{Item, TierPrices},
    room_template::{RoomSize, RoomTemplate},
    rules::AutoConfigRules,
};
use crate::routes::load_pricing_context;
use crate::services::auto_config_service::AutoConfigService;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SizeTotals {
    pub size: RoomSize,
    pub totals: TierPrices,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateWithTotals {
    #[serde(flatten)]
    pub template: RoomTemplate,
    pub totals: Vec<SizeTotals>,
}

/*
    GET /api/catalog/items
*/
pub async fn get_items(
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let items = CatalogRepository::new(&data, &config.database)
        .list_items()
        .await?;
    Ok(HttpResponse::Ok().json(items))
}

/*
    GET /api/catalog/room-templates
    Totals are derived from the current item prices on every read.
*/
pub async fn get_room_templates(
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let pricing = load_pricing_context(&data, &config).await?;

    let templates: Vec<TemplateWithTotals> = pricing
        .templates
        .sorted()
        .into_iter()
        .map(|template| TemplateWithTotals {
            totals: [RoomSize::Small, RoomSize::Medium, RoomSize::Large]
                .into_iter()
                .filter_map(|size| {
                    template
                        .tier_totals(size, &pricing.catalog)
                        .map(|totals| SizeTotals { size, totals })
                })
                .collect(),
            template: template.clone(),
        })
        .collect();

    Ok(HttpResponse::Ok().json(templates))
}

/*
    PUT /api/admin/items/{id}
*/
pub async fn save_item(
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    path: web::Path<String>,
    input: web::Json<Item>,
) -> Result<HttpResponse, ApiError> {
    let mut item = input.into_inner();
    item.id = path.into_inner();
    if item.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Item name is required".to_string()));
    }

    CatalogRepository::new(&data, &config.database)
        .save_item(&item)
        .await?;
    info!("Saved item {}", item.id);
    Ok(HttpResponse::Ok().json(item))
}

/*
    DELETE /api/admin/items/{id}
*/
pub async fn delete_item(
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let item_id = path.into_inner();
    CatalogRepository::new(&data, &config.database)
        .delete_item(&item_id)
        .await?;
    info!("Deleted item {}", item_id);
    Ok(HttpResponse::NoContent().finish())
}

/*
    PUT /api/admin/room-templates/{id}
*/
pub async fn save_room_template(
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    path: web::Path<String>,
    input: web::Json<RoomTemplate>,
) -> Result<HttpResponse, ApiError> {
    let mut template = input.into_inner();
    template.id = path.into_inner();
    if template.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Template name is required".to_string()));
    }

    CatalogRepository::new(&data, &config.database)
        .save_template(&template)
        .await?;
    info!("Saved room template {}", template.id);
    Ok(HttpResponse::Ok().json(template))
}

/*
    DELETE /api/admin/room-templates/{id}
*/
pub async fn delete_room_template(
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    path: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let template_id = path.into_inner();
    CatalogRepository::new(&data, &config.database)
        .delete_template(&template_id)
        .await?;
    info!("Deleted room template {}", template_id);
    Ok(HttpResponse::NoContent().finish())
}

/*
    GET /api/admin/rules
*/
pub async fn get_rules(
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let rules = CatalogRepository::new(&data, &config.database)
        .load_rules()
        .await?;
    Ok(HttpResponse::Ok().json(rules))
}

/*
    PUT /api/admin/rules
    Whole-document replace. Overlapping or inverted rules are refused.
*/
pub async fn save_rules(
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<AutoConfigRules>,
) -> Result<HttpResponse, ApiError> {
    let rules = input.into_inner();
    AutoConfigService::validate_rules(&rules).map_err(|issues| ApiError::validation(&issues))?;

    let saved = CatalogRepository::new(&data, &config.database)
        .save_rules(&rules)
        .await?;
    info!("Saved room mapping rules version {}", saved.version);
    Ok(HttpResponse::Ok().json(saved))
}

/*
    GET /api/admin/budget-defaults
*/
pub async fn get_budget_defaults(
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let defaults = CatalogRepository::new(&data, &config.database)
        .load_budget_defaults()
        .await?;
    Ok(HttpResponse::Ok().json(defaults))
}

/*
    PUT /api/admin/budget-defaults
*/
pub async fn save_budget_defaults(
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<BudgetDefaults>,
) -> Result<HttpResponse, ApiError> {
    let defaults = input.into_inner();
    let negative = [
        defaults.design_fee_rate_per_sqft,
        defaults.installation,
        defaults.freight,
        defaults.storage,
        defaults.photography,
        defaults.supplies_kit,
    ]
    .iter()
    .any(|amount| *amount < 0);
    if negative {
        return Err(ApiError::BadRequest("Amounts cannot be negative".to_string()));
    }

    let saved = CatalogRepository::new(&data, &config.database)
        .save_budget_defaults(&defaults)
        .await?;
    Ok(HttpResponse::Ok().json(saved))
}
