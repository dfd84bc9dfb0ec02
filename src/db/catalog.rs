use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, DateTime, Document},
    Collection, Client, Database,
};
use serde::{de::DeserializeOwned, Serialize};

use super::repository::RepositoryError;
use crate::models::{
    budget::BudgetDefaults,
    item::{Item, ItemCatalog},
    room_template::{RoomTemplate, TemplateStore},
    rules::AutoConfigRules,
};

pub const ITEMS_COLLECTION: &str = "items";
pub const ROOM_TEMPLATES_COLLECTION: &str = "roomTemplates";
pub const CONFIG_COLLECTION: &str = "config";
pub const ROOM_MAPPING_RULES_ID: &str = "roomMappingRules";
pub const BUDGET_DEFAULTS_ID: &str = "budgetDefaults";

/// Items, room templates and the two `config` documents.
pub struct CatalogRepository {
    db: Database,
}

impl CatalogRepository {
    pub fn new(client: &Client, database: &str) -> Self {
        Self {
            db: client.database(database),
        }
    }

    fn items(&self) -> Collection<Item> {
        self.db.collection(ITEMS_COLLECTION)
    }

    fn templates(&self) -> Collection<RoomTemplate> {
        self.db.collection(ROOM_TEMPLATES_COLLECTION)
    }

    fn config(&self) -> Collection<Document> {
        self.db.collection(CONFIG_COLLECTION)
    }

    pub async fn list_items(&self) -> Result<Vec<Item>, RepositoryError> {
        let cursor = self.items().find(doc! {}).sort(doc! { "category": 1, "name": 1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn save_item(&self, item: &Item) -> Result<(), RepositoryError> {
        let mut item = item.clone();
        let now = DateTime::now();
        item.created_at.get_or_insert(now);
        item.updated_at = Some(now);

        self.items()
            .replace_one(doc! { "_id": &item.id }, &item)
            .upsert(true)
            .await?;
        Ok(())
    }

    pub async fn delete_item(&self, item_id: &str) -> Result<(), RepositoryError> {
        let result = self.items().delete_one(doc! { "_id": item_id }).await?;
        if result.deleted_count == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    pub async fn list_templates(&self) -> Result<Vec<RoomTemplate>, RepositoryError> {
        let cursor = self.templates().find(doc! {}).sort(doc! { "sortOrder": 1 }).await?;
        Ok(cursor.try_collect().await?)
    }

    pub async fn save_template(&self, template: &RoomTemplate) -> Result<(), RepositoryError> {
        let mut template = template.clone();
        let now = DateTime::now();
        template.created_at.get_or_insert(now);
        template.updated_at = Some(now);

        self.templates()
            .replace_one(doc! { "_id": &template.id }, &template)
            .upsert(true)
            .await?;
        Ok(())
    }

    pub async fn delete_template(&self, template_id: &str) -> Result<(), RepositoryError> {
        let result = self.templates().delete_one(doc! { "_id": template_id }).await?;
        if result.deleted_count == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Item catalog and template store for one pricing pass.
    pub async fn load_pricing(&self) -> Result<(ItemCatalog, TemplateStore), RepositoryError> {
        let items = self.list_items().await?;
        let templates = self.list_templates().await?;
        Ok((ItemCatalog::new(items), TemplateStore::new(templates)))
    }

    /// Missing rules fall back to an empty rule set.
    pub async fn load_rules(&self) -> Result<AutoConfigRules, RepositoryError> {
        Ok(self
            .load_config(ROOM_MAPPING_RULES_ID)
            .await?
            .unwrap_or_default())
    }

    /// Replaces the whole rules document and bumps its version.
    pub async fn save_rules(&self, rules: &AutoConfigRules) -> Result<AutoConfigRules, RepositoryError> {
        let current = self.load_rules().await?;
        let mut rules = rules.clone();
        rules.version = current.version + 1;
        rules.updated_at = Some(DateTime::now());

        self.save_config(ROOM_MAPPING_RULES_ID, &rules).await?;
        Ok(rules)
    }

    pub async fn load_budget_defaults(&self) -> Result<BudgetDefaults, RepositoryError> {
        Ok(self
            .load_config(BUDGET_DEFAULTS_ID)
            .await?
            .unwrap_or_default())
    }

    pub async fn save_budget_defaults(
        &self,
        defaults: &BudgetDefaults,
    ) -> Result<BudgetDefaults, RepositoryError> {
        let mut defaults = defaults.clone();
        defaults.updated_at = Some(DateTime::now());

        self.save_config(BUDGET_DEFAULTS_ID, &defaults).await?;
        Ok(defaults)
    }

    async fn load_config<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, RepositoryError> {
        let Some(mut document) = self.config().find_one(doc! { "_id": id }).await? else {
            return Ok(None);
        };
        document.remove("_id");

        bson::from_document(document)
            .map(Some)
            .map_err(|e| RepositoryError::Decode(e.to_string()))
    }

    async fn save_config<T: Serialize>(&self, id: &str, value: &T) -> Result<(), RepositoryError> {
        let mut document =
            bson::to_document(value).map_err(|e| RepositoryError::Decode(e.to_string()))?;
        document.insert("_id", id);

        self.config()
            .replace_one(doc! { "_id": id }, document)
            .upsert(true)
            .await?;
        Ok(())
    }
}
