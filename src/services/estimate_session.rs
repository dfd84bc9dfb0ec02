use chrono::Utc;
use log::{debug, info};
use mongodb::bson::oid::ObjectId;

use crate::db::repository::{EstimateRepository, RepositoryError};
use crate::models::{
    budget::Budget,
    estimate::{EditAction, Estimate},
    room::{LegacyRoom, RoomInstance},
};
use crate::services::{
    history::{HistoryBuffer, DEFAULT_HISTORY_CAPACITY},
    pricing_service::PricingContext,
    room_normalizer::{self, RoomCount, RoomLimitError},
};

#[derive(Debug)]
pub enum SessionError {
    RoomNotFound(String),
    EmptyRoom,
    Limit(RoomLimitError),
    Repository(RepositoryError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::RoomNotFound(id) => write!(f, "Room {} not found", id),
            SessionError::EmptyRoom => write!(f, "Room quantity must be at least 1"),
            SessionError::Limit(err) => write!(f, "{}", err),
            SessionError::Repository(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<RoomLimitError> for SessionError {
    fn from(err: RoomLimitError) -> Self {
        SessionError::Limit(err)
    }
}

impl From<RepositoryError> for SessionError {
    fn from(err: RepositoryError) -> Self {
        SessionError::Repository(err)
    }
}

/// Rooms and their budget at one point of the editing history.
#[derive(Debug, Clone, PartialEq)]
pub struct EstimateSnapshot {
    pub rooms: Vec<RoomInstance>,
    pub budget: Budget,
}

/// Editing session over one estimate, with bounded undo/redo.
///
/// Every mutation reprices the rooms, appends to the estimate's edit log and
/// pushes a snapshot. The session is dirty from the first mutation until a
/// successful `save`.
pub struct EstimateSession<R: EstimateRepository> {
    repository: R,
    pricing: PricingContext,
    estimate: Estimate,
    history: HistoryBuffer<EstimateSnapshot>,
    dirty: bool,
}

impl<R: EstimateRepository> EstimateSession<R> {
    /// Session over an estimate that has not been stored yet. Starts dirty.
    pub fn new(repository: R, pricing: PricingContext, mut estimate: Estimate) -> Self {
        estimate.budget = Some(pricing.price(&estimate));
        let history = HistoryBuffer::new(DEFAULT_HISTORY_CAPACITY, Self::snapshot_of(&estimate));
        Self {
            repository,
            pricing,
            estimate,
            history,
            dirty: true,
        }
    }

    /// Reads an estimate from the store. Starts clean with a single history entry.
    pub async fn load(
        repository: R,
        pricing: PricingContext,
        id: &ObjectId,
    ) -> Result<Self, SessionError> {
        let mut estimate = repository.get(id).await?;
        estimate.budget = Some(pricing.price(&estimate));
        let history = HistoryBuffer::new(DEFAULT_HISTORY_CAPACITY, Self::snapshot_of(&estimate));
        debug!("Loaded estimate {} with {} rooms", id, estimate.rooms.len());

        Ok(Self {
            repository,
            pricing,
            estimate,
            history,
            dirty: false,
        })
    }

    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = HistoryBuffer::new(capacity, Self::snapshot_of(&self.estimate));
        self
    }

    pub fn estimate(&self) -> &Estimate {
        &self.estimate
    }

    pub fn into_estimate(self) -> Estimate {
        self.estimate
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn update_room(&mut self, instance_id: &str, room: RoomInstance) -> Result<&Estimate, SessionError> {
        let mut rooms = self.estimate.rooms.clone();
        let slot = rooms
            .iter_mut()
            .find(|existing| existing.instance_id == instance_id)
            .ok_or_else(|| SessionError::RoomNotFound(instance_id.to_string()))?;

        *slot = RoomInstance {
            instance_id: instance_id.to_string(),
            ..room
        };
        let details = format!("Updated {}", slot.display_name);
        self.apply(rooms, EditAction::RoomUpdated, details);
        Ok(&self.estimate)
    }

    /// Adds `room.quantity` new instances, numbered after the existing ones.
    ///
    /// Once the room type has more than one instance, every instance still
    /// carrying the plain name gets its own instance number appended.
    pub fn add_room(&mut self, room: LegacyRoom) -> Result<&Estimate, SessionError> {
        if room.quantity == 0 {
            return Err(SessionError::EmptyRoom);
        }
        room_normalizer::check_limits([RoomCount::from(&room)], self.estimate.rooms.len())?;

        let mut rooms = self.estimate.rooms.clone();
        for mut instance in room_normalizer::expand(&room) {
            instance.instance_id = room_normalizer::next_instance_id(&rooms, &room.room_type);
            instance.display_name = room.display_name.clone();
            rooms.push(instance);
        }

        let siblings = rooms
            .iter()
            .filter(|existing| existing.room_type == room.room_type)
            .count();
        if siblings > 1 {
            for instance in rooms.iter_mut().filter(|existing| {
                existing.room_type == room.room_type && existing.display_name == room.display_name
            }) {
                if let Some(n) =
                    room_normalizer::instance_number(&instance.instance_id, &room.room_type)
                {
                    instance.display_name = format!("{} {}", room.display_name, n);
                }
            }
        }

        let details = format!("Added {} x {}", room.quantity, room.display_name);
        self.apply(rooms, EditAction::RoomAdded, details);
        Ok(&self.estimate)
    }

    pub fn remove_room(&mut self, instance_id: &str) -> Result<&Estimate, SessionError> {
        let mut rooms = self.estimate.rooms.clone();
        let index = rooms
            .iter()
            .position(|existing| existing.instance_id == instance_id)
            .ok_or_else(|| SessionError::RoomNotFound(instance_id.to_string()))?;

        let removed = rooms.remove(index);
        self.apply(rooms, EditAction::RoomRemoved, format!("Removed {}", removed.display_name));
        Ok(&self.estimate)
    }

    /// Steps back one snapshot. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(snapshot, EditAction::Undo);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(snapshot, EditAction::Redo);
        true
    }

    /// Persists when dirty. An update that finds no stored document creates
    /// one instead. Returns whether anything was written.
    pub async fn save(&mut self) -> Result<bool, SessionError> {
        if !self.dirty {
            return Ok(false);
        }

        let previous = self.estimate.updated_at.replace(Utc::now());
        if let Err(err) = self.write().await {
            self.estimate.updated_at = previous;
            return Err(err);
        }

        self.dirty = false;
        Ok(true)
    }

    async fn write(&mut self) -> Result<(), SessionError> {
        match self.repository.update(&self.estimate).await {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => {
                let id = self.repository.create(&self.estimate).await?;
                info!("Created estimate {}", id);
                self.estimate.id = Some(id);
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }

    fn apply(&mut self, rooms: Vec<RoomInstance>, action: EditAction, details: String) {
        self.estimate.rooms = rooms;
        self.estimate.budget = Some(self.pricing.price(&self.estimate));
        self.estimate.record(action, details);
        self.history.push(Self::snapshot_of(&self.estimate));
        self.dirty = true;
    }

    fn restore(&mut self, snapshot: EstimateSnapshot, action: EditAction) {
        let details = format!("Restored {} rooms", snapshot.rooms.len());
        self.estimate.rooms = snapshot.rooms;
        self.estimate.budget = Some(snapshot.budget);
        self.estimate.record(action, details);
        self.dirty = true;
    }

    fn snapshot_of(estimate: &Estimate) -> EstimateSnapshot {
        EstimateSnapshot {
            rooms: estimate.rooms.clone(),
            budget: estimate.budget.clone().unwrap_or_default(),
        }
    }
}
