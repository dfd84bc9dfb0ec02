use serde::{Deserialize, Serialize};

use super::item::TierPrices;
use super::room_template::RoomSize;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomItem {
    pub item_id: String,
    pub quantity: u32,
    /// Per-room price override; wins over catalog and custom range pricing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_override: Option<TierPrices>,
}

/// One row per room type + size, counted with `quantity`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyRoom {
    pub room_type: String,
    pub room_size: RoomSize,
    pub quantity: u32,
    pub display_name: String,
    #[serde(default)]
    pub items: Vec<RoomItem>,
}

/// One physical room. Quantity is always 1.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoomInstance {
    pub instance_id: String,
    pub room_type: String,
    pub room_size: RoomSize,
    pub display_name: String,
    #[serde(default)]
    pub items: Vec<RoomItem>,
}

impl RoomInstance {
    pub fn quantity(&self) -> u32 {
        1
    }
}

/// Room shape as found in stored documents. Anything carrying an
/// `instanceId` is an instance; everything else is a legacy row.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum StoredRoom {
    Instance(RoomInstance),
    Legacy(LegacyRoom),
}

impl From<RoomInstance> for StoredRoom {
    fn from(room: RoomInstance) -> Self {
        StoredRoom::Instance(room)
    }
}

impl From<LegacyRoom> for StoredRoom {
    fn from(room: LegacyRoom) -> Self {
        StoredRoom::Legacy(room)
    }
}

/// Borrowed view of a priced room line, shared by both room shapes.
#[derive(Debug, Clone, Copy)]
pub struct RoomLine<'a> {
    pub room_type: &'a str,
    pub room_size: RoomSize,
    pub quantity: u32,
    pub display_name: &'a str,
    pub items: &'a [RoomItem],
}

impl<'a> From<&'a RoomInstance> for RoomLine<'a> {
    fn from(room: &'a RoomInstance) -> Self {
        RoomLine {
            room_type: &room.room_type,
            room_size: room.room_size,
            quantity: room.quantity(),
            display_name: &room.display_name,
            items: &room.items,
        }
    }
}

impl<'a> From<&'a LegacyRoom> for RoomLine<'a> {
    fn from(room: &'a LegacyRoom) -> Self {
        RoomLine {
            room_type: &room.room_type,
            room_size: room.room_size,
            quantity: room.quantity,
            display_name: &room.display_name,
            items: &room.items,
        }
    }
}

impl<'a> From<&'a StoredRoom> for RoomLine<'a> {
    fn from(room: &'a StoredRoom) -> Self {
        match room {
            StoredRoom::Instance(instance) => instance.into(),
            StoredRoom::Legacy(legacy) => legacy.into(),
        }
    }
}
