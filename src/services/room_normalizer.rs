use crate::models::room::{LegacyRoom, RoomInstance, StoredRoom};

/// Largest count a single legacy row may carry.
pub const MAX_ROOM_QUANTITY: u32 = 50;
/// Largest number of room instances one estimate may expand to.
pub const MAX_ROOM_INSTANCES: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomLimitError {
    QuantityTooLarge { room_type: String, quantity: u32 },
    TooManyRooms(usize),
}

impl std::fmt::Display for RoomLimitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoomLimitError::QuantityTooLarge { room_type, quantity } => write!(
                f,
                "Room {} has quantity {}, at most {} allowed",
                room_type, quantity, MAX_ROOM_QUANTITY
            ),
            RoomLimitError::TooManyRooms(count) => write!(
                f,
                "Estimate would have {} rooms, at most {} allowed",
                count, MAX_ROOM_INSTANCES
            ),
        }
    }
}

impl std::error::Error for RoomLimitError {}

/// Checks the room count before anything is expanded. `existing` is the
/// number of instances already present (zero for a fresh request).
pub fn check_limits<'a, I>(rooms: I, existing: usize) -> Result<(), RoomLimitError>
where
    I: IntoIterator<Item = RoomCount<'a>>,
{
    let mut total = existing;
    for room in rooms {
        if room.quantity > MAX_ROOM_QUANTITY {
            return Err(RoomLimitError::QuantityTooLarge {
                room_type: room.room_type.to_string(),
                quantity: room.quantity,
            });
        }
        total += room.quantity as usize;
    }

    if total > MAX_ROOM_INSTANCES {
        return Err(RoomLimitError::TooManyRooms(total));
    }
    Ok(())
}

/// Room type and the number of instances a row stands for.
#[derive(Debug, Clone, Copy)]
pub struct RoomCount<'a> {
    pub room_type: &'a str,
    pub quantity: u32,
}

impl<'a> From<&'a StoredRoom> for RoomCount<'a> {
    fn from(room: &'a StoredRoom) -> Self {
        match room {
            StoredRoom::Instance(instance) => RoomCount {
                room_type: &instance.room_type,
                quantity: 1,
            },
            StoredRoom::Legacy(legacy) => legacy.into(),
        }
    }
}

impl<'a> From<&'a LegacyRoom> for RoomCount<'a> {
    fn from(room: &'a LegacyRoom) -> Self {
        RoomCount {
            room_type: &room.room_type,
            quantity: room.quantity,
        }
    }
}

/// Expand a counted room into one instance per physical room, with ids
/// `{roomType}_{n}`. Names get a ` {n}` suffix only when there is more than one.
pub fn expand(room: &LegacyRoom) -> Vec<RoomInstance> {
    (1..=room.quantity)
        .map(|n| RoomInstance {
            instance_id: format!("{}_{}", room.room_type, n),
            room_type: room.room_type.clone(),
            room_size: room.room_size,
            display_name: if room.quantity > 1 {
                format!("{} {}", room.display_name, n)
            } else {
                room.display_name.clone()
            },
            items: room.items.clone(),
        })
        .collect()
}

/// Collapse instances into counted rows grouped by (roomType, roomSize), in
/// first-seen order.
///
/// This is lossy and meant for display only: each row carries the items of
/// the first instance in its group. Persist the instances, not this.
pub fn summarize(instances: &[RoomInstance]) -> Vec<LegacyRoom> {
    let mut rows: Vec<LegacyRoom> = Vec::new();

    for instance in instances {
        match rows
            .iter_mut()
            .find(|row| row.room_type == instance.room_type && row.room_size == instance.room_size)
        {
            Some(row) => row.quantity += 1,
            None => rows.push(LegacyRoom {
                room_type: instance.room_type.clone(),
                room_size: instance.room_size,
                quantity: 1,
                display_name: base_display_name(&instance.display_name),
                items: instance.items.clone(),
            }),
        }
    }

    rows
}

/// Instances pass through unchanged; counted rows are expanded.
pub fn normalize(rooms: Vec<StoredRoom>) -> Vec<RoomInstance> {
    rooms
        .into_iter()
        .flat_map(|room| match room {
            StoredRoom::Instance(instance) => vec![instance],
            StoredRoom::Legacy(legacy) => expand(&legacy),
        })
        .collect()
}

/// The `n` in an instance id `{roomType}_{n}`.
pub fn instance_number(instance_id: &str, room_type: &str) -> Option<u32> {
    instance_id
        .strip_prefix(room_type)?
        .strip_prefix('_')?
        .parse()
        .ok()
}

/// Next free instance id for a room type, e.g. `king_bedroom_3`.
pub fn next_instance_id(instances: &[RoomInstance], room_type: &str) -> String {
    let highest = instances
        .iter()
        .filter_map(|room| instance_number(&room.instance_id, room_type))
        .max()
        .unwrap_or(0);
    format!("{}_{}", room_type, highest.saturating_add(1))
}

/// Drops the trailing ` {n}` that `expand` appends.
pub fn base_display_name(name: &str) -> String {
    match name.rsplit_once(' ') {
        Some((base, suffix)) if !base.is_empty() && suffix.parse::<u32>().is_ok() => {
            base.to_string()
        }
        _ => name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::room::RoomItem;
    use crate::models::room_template::RoomSize;
    use std::collections::HashMap;

    fn legacy(room_type: &str, size: RoomSize, quantity: u32, name: &str) -> LegacyRoom {
        LegacyRoom {
            room_type: room_type.to_string(),
            room_size: size,
            quantity,
            display_name: name.to_string(),
            items: vec![RoomItem {
                item_id: format!("{}_bed", room_type),
                quantity: 1,
                price_override: None,
            }],
        }
    }

    fn quantities(rooms: &[LegacyRoom]) -> HashMap<(String, RoomSize), u32> {
        let mut map = HashMap::new();
        for room in rooms {
            *map.entry((room.room_type.clone(), room.room_size)).or_insert(0) += room.quantity;
        }
        map
    }

    #[test]
    fn test_expand_ids_and_names() {
        let instances = expand(&legacy("king_bedroom", RoomSize::Medium, 3, "King Bedroom"));

        let ids: Vec<&str> = instances.iter().map(|r| r.instance_id.as_str()).collect();
        assert_eq!(ids, vec!["king_bedroom_1", "king_bedroom_2", "king_bedroom_3"]);
        assert_eq!(instances[1].display_name, "King Bedroom 2");
        assert!(instances.iter().all(|r| r.quantity() == 1));

        let single = expand(&legacy("kitchen", RoomSize::Large, 1, "Kitchen"));
        assert_eq!(single.len(), 1);
        assert_eq!(single[0].display_name, "Kitchen");
        assert_eq!(single[0].instance_id, "kitchen_1");
    }

    #[test]
    fn test_round_trip_preserves_quantities() {
        let rooms = vec![
            legacy("king_bedroom", RoomSize::Medium, 3, "King Bedroom"),
            legacy("king_bedroom", RoomSize::Large, 1, "King Bedroom"),
            legacy("living", RoomSize::Large, 2, "Living Room"),
            legacy("bunk_room", RoomSize::Small, 1, "Bunk Room"),
        ];

        let stored: Vec<StoredRoom> = rooms.iter().cloned().map(StoredRoom::from).collect();
        let summarized = summarize(&normalize(stored));

        assert_eq!(quantities(&summarized), quantities(&rooms));
        assert_eq!(summarized[0].display_name, "King Bedroom");
    }

    #[test]
    fn test_normalize_passes_instances_through() {
        let mut mixed: Vec<StoredRoom> = expand(&legacy("dining", RoomSize::Small, 2, "Dining"))
            .into_iter()
            .map(StoredRoom::from)
            .collect();
        mixed.push(legacy("kitchen", RoomSize::Medium, 1, "Kitchen").into());

        let normalized = normalize(mixed);
        let ids: Vec<&str> = normalized.iter().map(|r| r.instance_id.as_str()).collect();
        assert_eq!(ids, vec!["dining_1", "dining_2", "kitchen_1"]);
    }

    #[test]
    fn test_summarize_keeps_first_instance_items() {
        let mut instances = expand(&legacy("double_bedroom", RoomSize::Medium, 2, "Double"));
        instances[1].items.clear();

        let summarized = summarize(&instances);
        assert_eq!(summarized.len(), 1);
        assert_eq!(summarized[0].quantity, 2);
        assert_eq!(summarized[0].items.len(), 1);
    }

    #[test]
    fn test_check_limits() {
        let rows = vec![
            StoredRoom::from(legacy("king_bedroom", RoomSize::Medium, MAX_ROOM_QUANTITY, "King")),
            StoredRoom::from(expand(&legacy("kitchen", RoomSize::Large, 1, "Kitchen")).remove(0)),
        ];
        assert!(check_limits(rows.iter().map(RoomCount::from), 0).is_ok());

        let huge = vec![StoredRoom::from(legacy("king_bedroom", RoomSize::Medium, u32::MAX, "King"))];
        assert_eq!(
            check_limits(huge.iter().map(RoomCount::from), 0),
            Err(RoomLimitError::QuantityTooLarge {
                room_type: "king_bedroom".to_string(),
                quantity: u32::MAX,
            })
        );

        let row = legacy("bunk_room", RoomSize::Small, 10, "Bunk");
        assert_eq!(
            check_limits([RoomCount::from(&row)], MAX_ROOM_INSTANCES - 5),
            Err(RoomLimitError::TooManyRooms(MAX_ROOM_INSTANCES + 5))
        );
    }

    #[test]
    fn test_instance_number() {
        assert_eq!(instance_number("king_bedroom_12", "king_bedroom"), Some(12));
        assert_eq!(instance_number("king_bedroom_x", "king_bedroom"), None);
        assert_eq!(instance_number("bedroom_1", "king_bedroom"), None);
        assert_eq!(instance_number("king_bedroom_2", "king"), None);
    }

    #[test]
    fn test_next_instance_id() {
        let instances = expand(&legacy("king_bedroom", RoomSize::Medium, 2, "King"));
        assert_eq!(next_instance_id(&instances, "king_bedroom"), "king_bedroom_3");
        assert_eq!(next_instance_id(&instances, "kitchen"), "kitchen_1");
    }
}
