#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App};
use jsonwebtoken::{encode, EncodingKey, Header};
use mongodb::bson::oid::ObjectId;

use estimator_api::config::{AppConfig, CrmConfig};
use estimator_api::db::repository::{EstimateFilter, EstimateRepository, RepositoryError};
use estimator_api::middleware::auth::Claims;
use estimator_api::models::{
    budget::{BudgetDefaults, PropertySpecs},
    estimate::{ClientInfo, Estimate},
    item::{Item, ItemCatalog, TierPrices},
    room::{LegacyRoom, RoomInstance},
    room_template::{RoomCategory, RoomSize, RoomTemplate, SizeConfig, TemplateItem, TemplateSizes, TemplateStore},
};
use estimator_api::routes;
use estimator_api::services::{crm_service::CrmService, pricing_service::PricingContext};

pub const TEST_JWT_SECRET: &str = "test_secret";
pub const TEST_USER_ID: &str = "user-1";

pub fn test_config() -> AppConfig {
    AppConfig {
        host: "127.0.0.1".to_string(),
        port: 8080,
        mongo_uri: "mongodb://localhost:27017".to_string(),
        database: "estimator_test".to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        app_base_url: "http://localhost:3000".to_string(),
        history_capacity: 10,
        crm: CrmConfig {
            api_url: None,
            api_key: None,
            estimate_field_key: "estimate_link".to_string(),
        },
    }
}

/// Signed bearer header value for a user id and optional role.
pub fn bearer_token(user_id: &str, role: Option<&str>) -> String {
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: format!("{}@example.com", user_id),
        exp: now + 3600,
        iat: now,
        user_id: user_id.to_string(),
        role: role.map(str::to_string),
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .unwrap();
    format!("Bearer {}", token)
}

pub struct TestApp {
    pub client: Arc<mongodb::Client>,
    pub config: AppConfig,
}

impl TestApp {
    /// The driver connects lazily, so handlers that fail before touching the
    /// database can be exercised without a running server.
    pub async fn new() -> Self {
        let config = test_config();
        let client = mongodb::Client::with_uri_str(&config.mongo_uri)
            .await
            .unwrap();

        Self {
            client: Arc::new(client),
            config,
        }
    }

    pub fn create_app(
        &self,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new()
            .app_data(web::Data::new(self.client.clone()))
            .app_data(web::Data::new(self.config.clone()))
            .app_data(web::Data::new(CrmService::new(self.config.crm.clone())))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .configure(routes::config)
    }
}

fn item(id: &str, low: i64) -> Item {
    Item {
        id: id.to_string(),
        name: id.replace('_', " "),
        category: "furniture".to_string(),
        subcategory: None,
        prices: TierPrices::new(low, low * 2, low * 3, low * 4),
        unit: "each".to_string(),
        created_at: None,
        updated_at: None,
    }
}

fn template(id: &str, name: &str, category: RoomCategory, items: &[(&str, u32)]) -> RoomTemplate {
    let config = SizeConfig {
        items: items
            .iter()
            .map(|(item_id, quantity)| TemplateItem {
                item_id: item_id.to_string(),
                quantity: *quantity,
            })
            .collect(),
    };
    RoomTemplate {
        id: id.to_string(),
        name: name.to_string(),
        category,
        sort_order: 0,
        sizes: TemplateSizes {
            small: Some(config.clone()),
            medium: Some(config.clone()),
            large: Some(config),
        },
        created_at: None,
        updated_at: None,
    }
}

/// Small catalog: a living room with a sofa and a king bedroom with a bed and
/// two nightstands. Low tier prices are 1000.00 / 800.00 / 150.00.
pub fn pricing_context() -> PricingContext {
    let catalog = ItemCatalog::new(vec![
        item("sofa", 100_000),
        item("king_bed", 80_000),
        item("nightstand", 15_000),
    ]);
    let templates = TemplateStore::new(vec![
        template("living_room", "Living Room", RoomCategory::CommonSpace, &[("sofa", 1)]),
        template(
            "king_bedroom",
            "King Bedroom",
            RoomCategory::SleepingSpace,
            &[("king_bed", 1), ("nightstand", 2)],
        ),
    ]);
    PricingContext::new(catalog, templates, Some(BudgetDefaults::default()))
}

pub fn living_room(instance_id: &str, display_name: &str) -> RoomInstance {
    RoomInstance {
        instance_id: instance_id.to_string(),
        room_type: "living_room".to_string(),
        room_size: RoomSize::Medium,
        display_name: display_name.to_string(),
        items: Vec::new(),
    }
}

pub fn king_bedrooms(quantity: u32) -> LegacyRoom {
    LegacyRoom {
        room_type: "king_bedroom".to_string(),
        room_size: RoomSize::Medium,
        quantity,
        display_name: "King Bedroom".to_string(),
        items: Vec::new(),
    }
}

pub fn client_info() -> ClientInfo {
    ClientInfo {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: None,
    }
}

pub fn draft_estimate() -> Estimate {
    let mut estimate = Estimate::new(
        client_info(),
        PropertySpecs {
            square_footage: 2_200,
            guest_capacity: 11,
            address: None,
        },
        vec![living_room("living_room_1", "Living Room")],
    );
    estimate.user_id = Some(TEST_USER_ID.to_string());
    estimate
}

/// Estimate store backed by a shared map, with call counters. Writes can be
/// switched to fail with a database error.
#[derive(Clone, Default)]
pub struct InMemoryEstimateRepository {
    pub estimates: Arc<Mutex<HashMap<ObjectId, Estimate>>>,
    pub updates: Arc<Mutex<usize>>,
    pub creates: Arc<Mutex<usize>>,
    pub failing: Arc<Mutex<bool>>,
}

impl InMemoryEstimateRepository {
    pub fn with(estimate: Estimate) -> (Self, ObjectId) {
        let repository = Self::default();
        let id = estimate.id.unwrap_or_else(ObjectId::new);
        let mut estimate = estimate;
        estimate.id = Some(id);
        repository.estimates.lock().unwrap().insert(id, estimate);
        (repository, id)
    }

    pub fn stored(&self, id: &ObjectId) -> Option<Estimate> {
        self.estimates.lock().unwrap().get(id).cloned()
    }

    pub fn update_count(&self) -> usize {
        *self.updates.lock().unwrap()
    }

    pub fn create_count(&self) -> usize {
        *self.creates.lock().unwrap()
    }

    pub fn fail_writes(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    fn write_error(&self) -> Option<RepositoryError> {
        (*self.failing.lock().unwrap())
            .then(|| RepositoryError::Database("connection reset".to_string()))
    }
}

impl EstimateRepository for InMemoryEstimateRepository {
    async fn get(&self, id: &ObjectId) -> Result<Estimate, RepositoryError> {
        self.stored(id).ok_or(RepositoryError::NotFound)
    }

    async fn create(&self, estimate: &Estimate) -> Result<ObjectId, RepositoryError> {
        *self.creates.lock().unwrap() += 1;
        if let Some(err) = self.write_error() {
            return Err(err);
        }
        let id = estimate.id.unwrap_or_else(ObjectId::new);
        let mut estimate = estimate.clone();
        estimate.id = Some(id);
        self.estimates.lock().unwrap().insert(id, estimate);
        Ok(id)
    }

    async fn update(&self, estimate: &Estimate) -> Result<(), RepositoryError> {
        *self.updates.lock().unwrap() += 1;
        if let Some(err) = self.write_error() {
            return Err(err);
        }
        let id = estimate.id.ok_or(RepositoryError::NotFound)?;
        let mut estimates = self.estimates.lock().unwrap();
        match estimates.get_mut(&id) {
            Some(stored) => {
                *stored = estimate.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn list(&self, filter: &EstimateFilter) -> Result<Vec<Estimate>, RepositoryError> {
        Ok(self
            .estimates
            .lock()
            .unwrap()
            .values()
            .filter(|estimate| {
                filter
                    .user_id
                    .as_deref()
                    .map_or(true, |user_id| estimate.user_id.as_deref() == Some(user_id))
                    && filter.status.map_or(true, |status| estimate.status == status)
            })
            .cloned()
            .collect())
    }
}
