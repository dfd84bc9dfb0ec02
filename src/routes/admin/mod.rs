use actix_web::web;

use crate::middleware::auth::AuthMiddleware;
use crate::middleware::role_auth::RequireRole;
use crate::models::user::UserRole;
use crate::routes::{catalog, estimates};

// Middleware registered last runs first, so the token is decoded before the
// role check reads the claims.
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .wrap(RequireRole::new(UserRole::Admin))
            .wrap(AuthMiddleware)
            .route("/items/{id}", web::put().to(catalog::save_item))
            .route("/items/{id}", web::delete().to(catalog::delete_item))
            .route(
                "/room-templates/{id}",
                web::put().to(catalog::save_room_template),
            )
            .route(
                "/room-templates/{id}",
                web::delete().to(catalog::delete_room_template),
            )
            .route("/rules", web::get().to(catalog::get_rules))
            .route("/rules", web::put().to(catalog::save_rules))
            .route(
                "/budget-defaults",
                web::get().to(catalog::get_budget_defaults),
            )
            .route(
                "/budget-defaults",
                web::put().to(catalog::save_budget_defaults),
            )
            .route("/estimates", web::get().to(estimates::list_all))
            .route(
                "/estimates/{id}/status",
                web::put().to(estimates::update_status),
            ),
    );
}
