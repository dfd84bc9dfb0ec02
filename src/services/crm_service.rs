use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::config::CrmConfig;
use crate::models::estimate::Estimate;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CrmCustomField {
    pub key: String,
    pub field_value: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CrmContact {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub custom_fields: Vec<CrmCustomField>,
}

#[derive(Debug)]
pub enum CrmError {
    NotConfigured,
    MissingEmail,
    RequestError(String),
    ApiError(String),
}

impl std::fmt::Display for CrmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrmError::NotConfigured => write!(f, "CRM sync is not configured"),
            CrmError::MissingEmail => write!(f, "Contact email is required"),
            CrmError::RequestError(err) => write!(f, "Request error: {}", err),
            CrmError::ApiError(err) => write!(f, "API error: {}", err),
        }
    }
}

impl std::error::Error for CrmError {}

pub struct CrmService {
    config: CrmConfig,
    client: reqwest::Client,
}

impl CrmService {
    pub fn new(config: CrmConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Contact payload for an estimate, with the deep link in a custom field.
    pub fn contact_for(&self, estimate: &Estimate, app_base_url: &str) -> CrmContact {
        let link = match estimate.id {
            Some(id) => format!("{}/estimates/{}", app_base_url.trim_end_matches('/'), id.to_hex()),
            None => app_base_url.to_string(),
        };

        CrmContact {
            email: estimate.client.email.trim().to_string(),
            first_name: estimate.client.first_name.clone(),
            last_name: estimate.client.last_name.clone(),
            phone: estimate.client.phone.clone(),
            custom_fields: vec![CrmCustomField {
                key: self.config.estimate_field_key.clone(),
                field_value: link,
            }],
        }
    }

    pub async fn upsert_contact(&self, contact: &CrmContact) -> Result<(), CrmError> {
        let (Some(url), Some(api_key)) = (&self.config.api_url, &self.config.api_key) else {
            return Err(CrmError::NotConfigured);
        };
        if contact.email.is_empty() {
            return Err(CrmError::MissingEmail);
        }

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(contact)
            .send()
            .await
            .map_err(|e| CrmError::RequestError(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(CrmError::ApiError(format!("Status: {}, Body: {}", status, body)))
        }
    }

    /// Fire-once sync. Failures are logged and reported as `false`, never retried.
    pub async fn sync_estimate(&self, estimate: &Estimate, app_base_url: &str) -> bool {
        let contact = self.contact_for(estimate, app_base_url);
        match self.upsert_contact(&contact).await {
            Ok(()) => {
                info!("Synced contact {} to CRM", contact.email);
                true
            }
            Err(err) => {
                warn!("CRM sync failed for {}: {}", contact.email, err);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{budget::PropertySpecs, estimate::ClientInfo};
    use actix_web::{dev::ServerHandle, web, App, HttpRequest, HttpResponse, HttpServer};
    use mongodb::bson::oid::ObjectId;
    use std::sync::Mutex;

    type Received = web::Data<Mutex<Vec<(String, CrmContact)>>>;

    async fn accept_contact(
        req: HttpRequest,
        contact: web::Json<CrmContact>,
        received: Received,
    ) -> HttpResponse {
        let authorization = req
            .headers()
            .get("Authorization")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        received.lock().unwrap().push((authorization, contact.into_inner()));
        HttpResponse::Ok().json(serde_json::json!({ "id": 42 }))
    }

    async fn reject_contact() -> HttpResponse {
        HttpResponse::InternalServerError().body("upstream down")
    }

    /// Local CRM endpoint: `/contacts` records requests, `/broken` fails.
    fn stub_crm() -> (String, Received, ServerHandle) {
        let received: Received = web::Data::new(Mutex::new(Vec::new()));
        let shared = received.clone();
        let server = HttpServer::new(move || {
            App::new()
                .app_data(shared.clone())
                .route("/contacts", web::post().to(accept_contact))
                .route("/broken", web::post().to(reject_contact))
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let base = format!("http://{}", server.addrs()[0]);
        let server = server.run();
        let handle = server.handle();
        actix_rt::spawn(server);
        (base, received, handle)
    }

    fn configured(url: String) -> CrmConfig {
        CrmConfig {
            api_url: Some(url),
            api_key: Some("crm-key".to_string()),
            estimate_field_key: "estimate_link".to_string(),
        }
    }

    fn config() -> CrmConfig {
        CrmConfig {
            api_url: None,
            api_key: None,
            estimate_field_key: "estimate_link".to_string(),
        }
    }

    fn estimate() -> Estimate {
        let mut estimate = Estimate::new(
            ClientInfo {
                first_name: "Ada".to_string(),
                last_name: "Park".to_string(),
                email: " ada@example.com ".to_string(),
                phone: Some("555-0100".to_string()),
            },
            PropertySpecs {
                square_footage: 2_000,
                guest_capacity: 8,
                address: None,
            },
            vec![],
        );
        estimate.id = Some(ObjectId::parse_str("65f0a1b2c3d4e5f601234567").unwrap());
        estimate
    }

    #[test]
    fn test_contact_payload_shape() {
        let service = CrmService::new(config());
        let contact = service.contact_for(&estimate(), "https://estimator.example.com/");

        let json = serde_json::to_value(&contact).unwrap();
        assert_eq!(json["email"], "ada@example.com");
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["customFields"][0]["key"], "estimate_link");
        assert_eq!(
            json["customFields"][0]["field_value"],
            "https://estimator.example.com/estimates/65f0a1b2c3d4e5f601234567"
        );
    }

    #[actix_rt::test]
    async fn test_unconfigured_sync_reports_false() {
        let service = CrmService::new(config());
        assert!(!service.sync_estimate(&estimate(), "https://estimator.example.com").await);
    }

    #[actix_rt::test]
    async fn test_sync_posts_contact_with_bearer_token() {
        let (base, received, handle) = stub_crm();
        let service = CrmService::new(configured(format!("{}/contacts", base)));

        assert!(service.sync_estimate(&estimate(), "https://estimator.example.com").await);

        let received = received.lock().unwrap().clone();
        assert_eq!(received.len(), 1);
        let (authorization, contact) = &received[0];
        assert_eq!(authorization, "Bearer crm-key");
        assert_eq!(contact.email, "ada@example.com");
        assert!(contact.custom_fields[0].field_value.ends_with("/estimates/65f0a1b2c3d4e5f601234567"));

        handle.stop(true).await;
    }

    #[actix_rt::test]
    async fn test_failing_endpoint_reports_false() {
        let (base, received, handle) = stub_crm();
        let service = CrmService::new(configured(format!("{}/broken", base)));

        let contact = service.contact_for(&estimate(), "https://estimator.example.com");
        match service.upsert_contact(&contact).await {
            Err(CrmError::ApiError(message)) => assert!(message.contains("upstream down")),
            other => panic!("expected API error, got {:?}", other),
        }
        assert!(!service.sync_estimate(&estimate(), "https://estimator.example.com").await);
        assert!(received.lock().unwrap().is_empty());

        handle.stop(true).await;
    }
}
