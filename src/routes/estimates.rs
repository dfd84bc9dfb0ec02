use actix_web::{web, HttpResponse};
use log::{info, warn};
use mongodb::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::{
    catalog::CatalogRepository,
    repository::{EstimateFilter, EstimateRepository, MongoEstimateRepository},
};
use crate::error::ApiError;
use crate::middleware::auth_context::AuthenticatedUser;
use crate::models::{
    budget::{CustomProjectAddOns, CustomRange, PropertySpecs},
    estimate::{ClientInfo, EditAction, Estimate, EstimateStatus},
    room::{LegacyRoom, RoomInstance, StoredRoom},
};
use crate::routes::{check_room_inputs, load_pricing_context, parse_object_id};
use crate::services::{
    crm_service::CrmService,
    estimate_session::EstimateSession,
    export_service::ExportService,
    pricing_service::PricingService,
    room_normalizer::{self, RoomCount},
};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEstimateRequest {
    pub client: ClientInfo,
    pub property: PropertySpecs,
    pub rooms: Vec<StoredRoom>,
    #[serde(default)]
    pub custom_range: Option<CustomRange>,
    #[serde(default)]
    pub custom_project_add_ons: Option<CustomProjectAddOns>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEstimateResponse {
    pub estimate: Estimate,
    pub crm_synced: bool,
}

#[derive(Debug, Deserialize)]
pub struct ExportQuery {
    pub sheet: Option<String>,
    pub format: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: EstimateStatus,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<EstimateStatus>,
}

fn repository(client: &Client, config: &AppConfig) -> MongoEstimateRepository {
    MongoEstimateRepository::new(client, &config.database)
}

fn ensure_access(user: &AuthenticatedUser, estimate: &Estimate) -> Result<(), ApiError> {
    if user.can_access(estimate.user_id.as_deref()) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/*
    POST /api/estimates
*/
pub async fn submit(
    user: AuthenticatedUser,
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    crm: web::Data<CrmService>,
    input: web::Json<SubmitEstimateRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = input.into_inner();

    let field_errors = request.client.validate();
    if !field_errors.is_empty() {
        return Err(ApiError::validation(&field_errors));
    }
    if request.rooms.is_empty() {
        return Err(ApiError::BadRequest("At least one room is required".to_string()));
    }
    check_room_inputs(
        &request.rooms,
        request.custom_range.as_ref(),
        request.custom_project_add_ons.as_ref(),
    )?;

    let rules = CatalogRepository::new(&data, &config.database)
        .load_rules()
        .await?;
    rules
        .validation
        .check(request.property.square_footage, request.property.guest_capacity)
        .map_err(|issues| ApiError::validation(&issues))?;

    let pricing = load_pricing_context(&data, &config).await?;
    let mut estimate = Estimate::new(
        request.client,
        request.property,
        room_normalizer::normalize(request.rooms),
    );
    estimate.user_id = Some(user.user_id.clone());
    estimate.status = EstimateStatus::Submitted;
    estimate.custom_range = request.custom_range;
    estimate.custom_project_add_ons = request.custom_project_add_ons;
    estimate.record(EditAction::Submitted, "Submitted from estimator");

    let mut session = EstimateSession::new(repository(&data, &config), pricing, estimate)
        .with_history_capacity(config.history_capacity);
    session.save().await?;
    let estimate = session.into_estimate();
    info!("Estimate {:?} submitted by {}", estimate.id, user.user_id);

    let crm_synced = crm.sync_estimate(&estimate, &config.app_base_url).await;

    Ok(HttpResponse::Created().json(SubmitEstimateResponse {
        estimate,
        crm_synced,
    }))
}

/*
    GET /api/estimates
*/
pub async fn list_mine(
    user: AuthenticatedUser,
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let filter = EstimateFilter {
        user_id: Some(user.user_id),
        status: None,
    };
    let estimates = repository(&data, &config).list(&filter).await?;
    Ok(HttpResponse::Ok().json(estimates))
}

/*
    GET /api/estimates/{id}
*/
pub async fn get_by_id(
    user: AuthenticatedUser,
    path: web::Path<String>,
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_object_id(&path.into_inner())?;

    let estimate = repository(&data, &config).get(&id).await?;
    ensure_access(&user, &estimate)?;

    Ok(HttpResponse::Ok().json(estimate))
}

async fn open_session(
    user: &AuthenticatedUser,
    raw_id: &str,
    data: &web::Data<Arc<Client>>,
    config: &web::Data<AppConfig>,
) -> Result<EstimateSession<MongoEstimateRepository>, ApiError> {
    let id = parse_object_id(raw_id)?;
    let pricing = load_pricing_context(data, config).await?;
    let session = EstimateSession::load(repository(data, config), pricing, &id).await?;
    ensure_access(user, session.estimate())?;
    Ok(session.with_history_capacity(config.history_capacity))
}

/*
    POST /api/estimates/{id}/rooms
*/
pub async fn add_room(
    user: AuthenticatedUser,
    path: web::Path<String>,
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<LegacyRoom>,
) -> Result<HttpResponse, ApiError> {
    let room = input.into_inner();
    room_normalizer::check_limits([RoomCount::from(&room)], 0)?;
    PricingService::check_inputs([&room], None, None)?;

    let mut session = open_session(&user, &path.into_inner(), &data, &config).await?;
    session.add_room(room)?;
    session.save().await?;
    Ok(HttpResponse::Ok().json(session.into_estimate()))
}

/*
    PUT /api/estimates/{id}/rooms/{instance_id}
*/
pub async fn update_room(
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<RoomInstance>,
) -> Result<HttpResponse, ApiError> {
    let room = input.into_inner();
    PricingService::check_inputs([&room], None, None)?;

    let (id, instance_id) = path.into_inner();
    let mut session = open_session(&user, &id, &data, &config).await?;
    session.update_room(&instance_id, room)?;
    session.save().await?;
    Ok(HttpResponse::Ok().json(session.into_estimate()))
}

/*
    DELETE /api/estimates/{id}/rooms/{instance_id}
*/
pub async fn remove_room(
    user: AuthenticatedUser,
    path: web::Path<(String, String)>,
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let (id, instance_id) = path.into_inner();
    let mut session = open_session(&user, &id, &data, &config).await?;
    session.remove_room(&instance_id)?;
    session.save().await?;
    Ok(HttpResponse::Ok().json(session.into_estimate()))
}

/*
    GET /api/estimates/{id}/export?sheet=summary&format=csv
    Without `format=csv` the whole workbook is returned as JSON.
*/
pub async fn export(
    user: AuthenticatedUser,
    path: web::Path<String>,
    query: web::Query<ExportQuery>,
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_object_id(&path.into_inner())?;
    let estimate = repository(&data, &config).get(&id).await?;
    ensure_access(&user, &estimate)?;

    let pricing = load_pricing_context(&data, &config).await?;
    let budget = pricing.price(&estimate);
    let workbook = ExportService::workbook(&estimate, &budget, &pricing);

    let query = query.into_inner();
    if !query.format.as_deref().is_some_and(|f| f.eq_ignore_ascii_case("csv")) {
        return Ok(HttpResponse::Ok().json(workbook));
    }

    let sheet_name = query.sheet.unwrap_or_else(|| "Summary".to_string());
    let sheet = workbook
        .sheet(&sheet_name.replace(['-', '_'], " "))
        .ok_or_else(|| ApiError::NotFound(format!("Sheet {}", sheet_name)))?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            "Content-Disposition",
            format!(
                "attachment; filename=\"estimate-{}-{}.csv\"",
                id.to_hex(),
                sheet.name.to_lowercase().replace(' ', "-")
            ),
        ))
        .body(sheet.to_csv()))
}

/*
    GET /api/admin/estimates?status=submitted
*/
pub async fn list_all(
    query: web::Query<StatusQuery>,
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, ApiError> {
    let filter = EstimateFilter {
        user_id: None,
        status: query.into_inner().status,
    };
    let estimates = repository(&data, &config).list(&filter).await?;
    Ok(HttpResponse::Ok().json(estimates))
}

/*
    PUT /api/admin/estimates/{id}/status
*/
pub async fn update_status(
    path: web::Path<String>,
    data: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
    input: web::Json<StatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    let id = parse_object_id(&path.into_inner())?;
    let repository = repository(&data, &config);

    let mut estimate = repository.get(&id).await?;
    let previous = estimate.status;
    estimate.status = input.into_inner().status;
    if previous == estimate.status {
        return Ok(HttpResponse::Ok().json(estimate));
    }

    estimate.record(
        EditAction::StatusChanged,
        format!("{} -> {}", previous.as_str(), estimate.status.as_str()),
    );
    if let Err(err) = repository.update(&estimate).await {
        warn!("Failed to update status of estimate {}: {}", id, err);
        return Err(err.into());
    }

    Ok(HttpResponse::Ok().json(estimate))
}
