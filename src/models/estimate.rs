use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::budget::{Budget, CustomProjectAddOns, CustomRange, PropertySpecs};
use super::room::{RoomInstance, StoredRoom};
use crate::services::room_normalizer;

pub const CURRENT_SCHEMA_VERSION: u32 = 2;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub enum EstimateStatus {
    #[default]
    #[serde(rename = "draft")]
    Draft,
    #[serde(rename = "submitted")]
    Submitted,
    #[serde(rename = "viewed")]
    Viewed,
    #[serde(rename = "contacted")]
    Contacted,
    #[serde(rename = "closed")]
    Closed,
}

impl EstimateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EstimateStatus::Draft => "draft",
            EstimateStatus::Submitted => "submitted",
            EstimateStatus::Viewed => "viewed",
            EstimateStatus::Contacted => "contacted",
            EstimateStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum EditAction {
    #[serde(rename = "created")]
    Created,
    #[serde(rename = "submitted")]
    Submitted,
    #[serde(rename = "room_added")]
    RoomAdded,
    #[serde(rename = "room_updated")]
    RoomUpdated,
    #[serde(rename = "room_removed")]
    RoomRemoved,
    #[serde(rename = "undo")]
    Undo,
    #[serde(rename = "redo")]
    Redo,
    #[serde(rename = "status_changed")]
    StatusChanged,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct EditHistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub action: EditAction,
    pub details: String,
}

impl EditHistoryEntry {
    pub fn now(action: EditAction, details: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            action,
            details: details.into(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
    })
}

impl ClientInfo {
    pub fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        if self.first_name.trim().is_empty() {
            errors.push(FieldError::new("firstName", "First name is required"));
        }
        if self.last_name.trim().is_empty() {
            errors.push(FieldError::new("lastName", "Last name is required"));
        }
        if self.email.trim().is_empty() {
            errors.push(FieldError::new("email", "Email is required"));
        } else if !email_pattern().is_match(self.email.trim()) {
            errors.push(FieldError::new("email", "Email is not valid"));
        }
        errors
    }
}

/// Persisted estimate. Rooms are kept uncollapsed, one row per physical room.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub client: ClientInfo,
    pub property: PropertySpecs,
    pub rooms: Vec<RoomInstance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<Budget>,
    pub status: EstimateStatus,
    #[serde(default)]
    pub edit_history: Vec<EditHistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_range: Option<CustomRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_project_add_ons: Option<CustomProjectAddOns>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Estimate {
    pub fn new(client: ClientInfo, property: PropertySpecs, rooms: Vec<RoomInstance>) -> Self {
        let now = Utc::now();
        Self {
            id: None,
            schema_version: CURRENT_SCHEMA_VERSION,
            user_id: None,
            client,
            property,
            rooms,
            budget: None,
            status: EstimateStatus::Draft,
            edit_history: vec![EditHistoryEntry::now(EditAction::Created, "Estimate created")],
            custom_range: None,
            custom_project_add_ons: None,
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    pub fn record(&mut self, action: EditAction, details: impl Into<String>) {
        self.edit_history.push(EditHistoryEntry::now(action, details));
        self.updated_at = Some(Utc::now());
    }
}

/// Estimate as read from the store, before version migration. Version 1
/// documents carry no `schemaVersion` and may mix legacy and instance rooms.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct EstimateDocument {
    #[serde(rename = "_id", default)]
    pub id: Option<ObjectId>,
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub client: ClientInfo,
    pub property: PropertySpecs,
    #[serde(default)]
    pub rooms: Vec<StoredRoom>,
    #[serde(default)]
    pub budget: Option<Budget>,
    #[serde(default)]
    pub status: EstimateStatus,
    #[serde(default)]
    pub edit_history: Vec<EditHistoryEntry>,
    #[serde(default)]
    pub custom_range: Option<CustomRange>,
    #[serde(default)]
    pub custom_project_add_ons: Option<CustomProjectAddOns>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnsupportedVersion(pub u32);

impl std::fmt::Display for UnsupportedVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unsupported estimate schema version {}", self.0)
    }
}

impl std::error::Error for UnsupportedVersion {}

impl TryFrom<EstimateDocument> for Estimate {
    type Error = UnsupportedVersion;

    fn try_from(doc: EstimateDocument) -> Result<Self, Self::Error> {
        let version = doc.schema_version.unwrap_or(1);
        if version > CURRENT_SCHEMA_VERSION {
            return Err(UnsupportedVersion(version));
        }

        Ok(Estimate {
            id: doc.id,
            schema_version: CURRENT_SCHEMA_VERSION,
            user_id: doc.user_id,
            client: doc.client,
            property: doc.property,
            rooms: room_normalizer::normalize(doc.rooms),
            budget: doc.budget,
            status: doc.status,
            edit_history: doc.edit_history,
            custom_range: doc.custom_range,
            custom_project_add_ons: doc.custom_project_add_ons,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
        })
    }
}
