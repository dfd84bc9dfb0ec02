pub mod admin;
pub mod catalog;
pub mod estimates;
pub mod health;
pub mod wizard;

use actix_web::web;
use mongodb::{bson::oid::ObjectId, Client};

use crate::config::AppConfig;
use crate::middleware::auth::AuthMiddleware;
use crate::db::catalog::CatalogRepository;
use crate::error::ApiError;
use crate::models::{
    budget::{CustomProjectAddOns, CustomRange},
    room::StoredRoom,
};
use crate::services::{
    pricing_service::{PricingContext, PricingService},
    room_normalizer::{self, RoomCount},
};

pub(crate) fn parse_object_id(raw: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::BadRequest("Invalid ID".to_string()))
}

/// Room counts and pricing inputs are checked before anything is expanded or
/// read from the database.
pub(crate) fn check_room_inputs(
    rooms: &[StoredRoom],
    custom_range: Option<&CustomRange>,
    add_on_overrides: Option<&CustomProjectAddOns>,
) -> Result<(), ApiError> {
    room_normalizer::check_limits(rooms.iter().map(RoomCount::from), 0)?;
    PricingService::check_inputs(rooms, custom_range, add_on_overrides)?;
    Ok(())
}

/// Catalog, templates and budget defaults for one request.
pub(crate) async fn load_pricing_context(
    client: &Client,
    config: &AppConfig,
) -> Result<PricingContext, ApiError> {
    let catalog = CatalogRepository::new(client, &config.database);
    let (items, templates) = catalog.load_pricing().await?;
    let defaults = catalog.load_budget_defaults().await?;
    Ok(PricingContext::new(items, templates, Some(defaults)))
}

/// Everything under `/api`: the public wizard and catalog reads, the signed-in
/// estimate routes and the admin scope.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/auto-config", web::post().to(wizard::auto_config))
            .route("/calculate", web::post().to(wizard::calculate))
            .service(
                web::scope("/catalog")
                    .route("/items", web::get().to(catalog::get_items))
                    .route(
                        "/room-templates",
                        web::get().to(catalog::get_room_templates),
                    ),
            )
            .configure(admin::config)
            .service(
                web::scope("/estimates")
                    .wrap(AuthMiddleware)
                    .route("", web::post().to(estimates::submit))
                    .route("", web::get().to(estimates::list_mine))
                    .route("/{id}", web::get().to(estimates::get_by_id))
                    .route("/{id}/export", web::get().to(estimates::export))
                    .route("/{id}/rooms", web::post().to(estimates::add_room))
                    .route(
                        "/{id}/rooms/{instance_id}",
                        web::put().to(estimates::update_room),
                    )
                    .route(
                        "/{id}/rooms/{instance_id}",
                        web::delete().to(estimates::remove_room),
                    ),
            ),
    );
}
