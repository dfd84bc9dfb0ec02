use actix_web::{web, HttpResponse, Responder};
use log::error;
use mongodb::{bson::doc, Client};
use serde::Serialize;
use std::collections::HashMap;
use std::env;
use std::sync::Arc;

use crate::config::AppConfig;

#[derive(Serialize)]
struct HealthStatus {
    status: String,
    services: HashMap<String, ServiceStatus>,
    environment: String,
    version: String,
}

#[derive(Serialize, Clone)]
struct ServiceStatus {
    status: String,
    details: Option<String>,
}

impl ServiceStatus {
    fn ok(details: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            details: Some(details.into()),
        }
    }

    fn failed(status: &str, details: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            details: Some(details.into()),
        }
    }
}

pub async fn health_check(
    client: web::Data<Arc<Client>>,
    config: web::Data<AppConfig>,
) -> impl Responder {
    let mut health = HealthStatus {
        status: "ok".to_string(),
        services: HashMap::new(),
        environment: env::var("RUST_ENV").unwrap_or("development".to_string()),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    let mongo_result = check_mongodb(&client, &config.database).await;
    let crm_result = check_crm(&config);

    // The CRM is optional; only the database degrades the service.
    if mongo_result.status != "ok" {
        health.status = "degraded".to_string();
    }

    health.services.insert("mongodb".to_string(), mongo_result);
    health.services.insert("crm".to_string(), crm_result);

    HttpResponse::Ok().json(health)
}

async fn check_mongodb(client: &Client, database: &str) -> ServiceStatus {
    match client.database(database).run_command(doc! {"ping": 1}).await {
        Ok(_) => ServiceStatus::ok("Connected successfully to MongoDB"),
        Err(e) => {
            error!("MongoDB health check failed: {}", e);
            ServiceStatus::failed("error", format!("Failed to connect: {}", e))
        }
    }
}

fn check_crm(config: &AppConfig) -> ServiceStatus {
    match (&config.crm.api_url, &config.crm.api_key) {
        (Some(url), Some(_)) => ServiceStatus::ok(format!("CRM configured ({})", url)),
        _ => ServiceStatus::failed("disabled", "CRM_API_URL or CRM_API_KEY not configured"),
    }
}
