use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    Client, Collection,
};

use crate::models::estimate::{Estimate, EstimateDocument, EstimateStatus};

pub const ESTIMATES_COLLECTION: &str = "estimates";
const LIST_LIMIT: i64 = 100;

#[derive(Debug)]
pub enum RepositoryError {
    NotFound,
    Database(String),
    Decode(String),
}

impl std::fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::NotFound => write!(f, "Document not found"),
            RepositoryError::Database(err) => write!(f, "Database error: {}", err),
            RepositoryError::Decode(err) => write!(f, "Decode error: {}", err),
        }
    }
}

impl std::error::Error for RepositoryError {}

impl From<mongodb::error::Error> for RepositoryError {
    fn from(err: mongodb::error::Error) -> Self {
        RepositoryError::Database(err.to_string())
    }
}

#[derive(Debug, Clone, Default)]
pub struct EstimateFilter {
    pub user_id: Option<String>,
    pub status: Option<EstimateStatus>,
}

impl EstimateFilter {
    fn to_document(&self) -> Document {
        let mut filter = doc! {};
        if let Some(user_id) = &self.user_id {
            filter.insert("userId", user_id);
        }
        if let Some(status) = &self.status {
            filter.insert("status", status.as_str());
        }
        filter
    }
}

/// Persistence for estimates. `update` reports `NotFound` when no stored
/// document matches, so callers can fall back to `create`.
pub trait EstimateRepository {
    async fn get(&self, id: &ObjectId) -> Result<Estimate, RepositoryError>;
    async fn create(&self, estimate: &Estimate) -> Result<ObjectId, RepositoryError>;
    async fn update(&self, estimate: &Estimate) -> Result<(), RepositoryError>;
    async fn list(&self, filter: &EstimateFilter) -> Result<Vec<Estimate>, RepositoryError>;
}

pub struct MongoEstimateRepository {
    collection: Collection<Estimate>,
}

impl MongoEstimateRepository {
    pub fn new(client: &Client, database: &str) -> Self {
        Self {
            collection: client.database(database).collection(ESTIMATES_COLLECTION),
        }
    }

    fn documents(&self) -> Collection<EstimateDocument> {
        self.collection.clone_with_type()
    }
}

impl EstimateRepository for MongoEstimateRepository {
    async fn get(&self, id: &ObjectId) -> Result<Estimate, RepositoryError> {
        let document = self
            .documents()
            .find_one(doc! { "_id": id })
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Estimate::try_from(document).map_err(|e| RepositoryError::Decode(e.to_string()))
    }

    async fn create(&self, estimate: &Estimate) -> Result<ObjectId, RepositoryError> {
        let mut estimate = estimate.clone();
        let id = estimate.id.unwrap_or_else(ObjectId::new);
        estimate.id = Some(id);

        self.collection.insert_one(&estimate).await?;
        Ok(id)
    }

    async fn update(&self, estimate: &Estimate) -> Result<(), RepositoryError> {
        let id = estimate.id.ok_or(RepositoryError::NotFound)?;
        let result = self
            .collection
            .replace_one(doc! { "_id": id }, estimate)
            .await?;

        if result.matched_count == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list(&self, filter: &EstimateFilter) -> Result<Vec<Estimate>, RepositoryError> {
        let cursor = self
            .documents()
            .find(filter.to_document())
            .sort(doc! { "createdAt": -1 })
            .limit(LIST_LIMIT)
            .await?;
        let documents: Vec<EstimateDocument> = cursor.try_collect().await?;

        documents
            .into_iter()
            .map(|document| {
                Estimate::try_from(document).map_err(|e| RepositoryError::Decode(e.to_string()))
            })
            .collect()
    }
}
