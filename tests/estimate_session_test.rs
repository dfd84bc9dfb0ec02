mod common;

use estimator_api::models::{estimate::EditAction, item::Tier};
use estimator_api::services::estimate_session::{EstimateSession, SessionError};
use estimator_api::services::room_normalizer::{RoomLimitError, MAX_ROOM_QUANTITY};

use common::{
    draft_estimate, king_bedrooms, living_room, pricing_context, InMemoryEstimateRepository,
};

#[test]
fn test_new_session_prices_rooms_and_starts_dirty() {
    let session = EstimateSession::new(
        InMemoryEstimateRepository::default(),
        pricing_context(),
        draft_estimate(),
    );

    let budget = session.estimate().budget.clone().unwrap();
    assert_eq!(budget.tier(Tier::Low).total, 100_000);
    assert_eq!(budget.tier(Tier::High).total, 400_000);
    assert!(session.is_dirty());
    assert!(!session.can_undo());
    assert_eq!(session.history_len(), 1);
}

#[test]
fn test_add_room_expands_and_reprices() {
    let mut session = EstimateSession::new(
        InMemoryEstimateRepository::default(),
        pricing_context(),
        draft_estimate(),
    );

    session.add_room(king_bedrooms(2)).unwrap();
    let estimate = session.estimate();

    let ids: Vec<&str> = estimate.rooms.iter().map(|r| r.instance_id.as_str()).collect();
    assert_eq!(ids, vec!["living_room_1", "king_bedroom_1", "king_bedroom_2"]);
    assert_eq!(estimate.rooms[2].display_name, "King Bedroom 2");
    assert_eq!(estimate.budget.as_ref().unwrap().low.total, 320_000);
    assert_eq!(estimate.edit_history.last().unwrap().action, EditAction::RoomAdded);
    assert!(session.can_undo());

    session.add_room(king_bedrooms(1)).unwrap();
    session.add_room(king_bedrooms(2)).unwrap();

    let bedrooms: Vec<(&str, &str)> = session
        .estimate()
        .rooms
        .iter()
        .filter(|room| room.room_type == "king_bedroom")
        .map(|room| (room.instance_id.as_str(), room.display_name.as_str()))
        .collect();
    assert_eq!(
        bedrooms,
        vec![
            ("king_bedroom_1", "King Bedroom 1"),
            ("king_bedroom_2", "King Bedroom 2"),
            ("king_bedroom_3", "King Bedroom 3"),
            ("king_bedroom_4", "King Bedroom 4"),
            ("king_bedroom_5", "King Bedroom 5"),
        ]
    );
}

#[test]
fn test_second_room_of_a_type_numbers_both() {
    let mut session = EstimateSession::new(
        InMemoryEstimateRepository::default(),
        pricing_context(),
        draft_estimate(),
    );

    session.add_room(king_bedrooms(1)).unwrap();
    assert_eq!(session.estimate().rooms[1].display_name, "King Bedroom");

    session.add_room(king_bedrooms(1)).unwrap();
    let names: Vec<&str> = session
        .estimate()
        .rooms
        .iter()
        .map(|room| room.display_name.as_str())
        .collect();
    assert_eq!(names, vec!["Living Room", "King Bedroom 1", "King Bedroom 2"]);
}

#[test]
fn test_add_room_rejects_oversized_quantity() {
    let mut session = EstimateSession::new(
        InMemoryEstimateRepository::default(),
        pricing_context(),
        draft_estimate(),
    );

    let result = session.add_room(king_bedrooms(u32::MAX));
    assert!(matches!(
        result,
        Err(SessionError::Limit(RoomLimitError::QuantityTooLarge { quantity, .. })) if quantity == u32::MAX
    ));
    assert_eq!(session.estimate().rooms.len(), 1);
    assert_eq!(session.history_len(), 1);

    session.add_room(king_bedrooms(MAX_ROOM_QUANTITY)).unwrap();
    assert_eq!(session.estimate().rooms.len(), 1 + MAX_ROOM_QUANTITY as usize);
}

#[test]
fn test_add_room_rejects_zero_quantity() {
    let mut session = EstimateSession::new(
        InMemoryEstimateRepository::default(),
        pricing_context(),
        draft_estimate(),
    );

    assert!(matches!(
        session.add_room(king_bedrooms(0)),
        Err(SessionError::EmptyRoom)
    ));
    assert_eq!(session.history_len(), 1);
}

#[test]
fn test_undo_redo_restore_rooms_and_budget() {
    let mut session = EstimateSession::new(
        InMemoryEstimateRepository::default(),
        pricing_context(),
        draft_estimate(),
    );
    session.add_room(king_bedrooms(1)).unwrap();
    session.remove_room("living_room_1").unwrap();
    assert_eq!(session.estimate().budget.as_ref().unwrap().low.total, 110_000);

    assert!(session.undo());
    assert_eq!(session.estimate().rooms.len(), 2);
    assert_eq!(session.estimate().budget.as_ref().unwrap().low.total, 210_000);
    assert!(session.can_redo());

    assert!(session.undo());
    assert_eq!(session.estimate().rooms.len(), 1);
    assert!(!session.undo());

    assert!(session.redo());
    assert!(session.redo());
    assert!(!session.redo());
    assert_eq!(session.estimate().rooms[0].instance_id, "king_bedroom_1");

    let actions: Vec<EditAction> = session
        .estimate()
        .edit_history
        .iter()
        .map(|entry| entry.action)
        .collect();
    assert_eq!(
        actions,
        vec![
            EditAction::Created,
            EditAction::RoomAdded,
            EditAction::RoomRemoved,
            EditAction::Undo,
            EditAction::Undo,
            EditAction::Redo,
            EditAction::Redo,
        ]
    );
}

#[test]
fn test_history_keeps_only_latest_snapshots() {
    let mut session = EstimateSession::new(
        InMemoryEstimateRepository::default(),
        pricing_context(),
        draft_estimate(),
    );

    for n in 1..=15 {
        session
            .update_room("living_room_1", living_room("ignored", &format!("Living {}", n)))
            .unwrap();
    }
    assert!(session.history_len() <= 10);

    for _ in 0..9 {
        assert!(session.undo());
    }
    assert!(!session.can_undo());

    let room = &session.estimate().rooms[0];
    assert_eq!(room.instance_id, "living_room_1");
    assert_eq!(room.display_name, "Living 6");
    assert_eq!(session.estimate().edit_history.len(), 1 + 15 + 9);
}

#[test]
fn test_unknown_room_leaves_state_untouched() {
    let (repository, id) = InMemoryEstimateRepository::with(draft_estimate());
    let mut session = tokio_test::block_on(EstimateSession::load(
        repository,
        pricing_context(),
        &id,
    ))
    .unwrap();
    let before = session.estimate().rooms.clone();

    let result = session.update_room("sauna_1", living_room("sauna_1", "Sauna"));
    assert!(matches!(result, Err(SessionError::RoomNotFound(ref room)) if room == "sauna_1"));
    assert!(session.remove_room("sauna_1").is_err());

    assert_eq!(session.estimate().rooms, before);
    assert_eq!(session.history_len(), 1);
    assert!(!session.is_dirty());
}

#[test]
fn test_save_creates_when_update_finds_nothing() {
    let repository = InMemoryEstimateRepository::default();
    let mut session = EstimateSession::new(repository.clone(), pricing_context(), draft_estimate());

    let written = tokio_test::block_on(session.save()).unwrap();
    assert!(written);
    assert!(!session.is_dirty());
    assert_eq!(repository.update_count(), 1);
    assert_eq!(repository.create_count(), 1);

    let id = session.estimate().id.unwrap();
    assert!(repository.stored(&id).is_some());

    // Clean sessions skip the write.
    assert!(!tokio_test::block_on(session.save()).unwrap());
    assert_eq!(repository.update_count(), 1);
}

#[test]
fn test_failed_save_keeps_timestamp_and_dirty_state() {
    let (repository, id) = InMemoryEstimateRepository::with(draft_estimate());
    let mut session = tokio_test::block_on(EstimateSession::load(
        repository.clone(),
        pricing_context(),
        &id,
    ))
    .unwrap();
    session.add_room(king_bedrooms(1)).unwrap();
    let updated_at = session.estimate().updated_at;

    repository.fail_writes(true);
    let result = tokio_test::block_on(session.save());
    assert!(matches!(result, Err(SessionError::Repository(_))));
    assert_eq!(session.estimate().updated_at, updated_at);
    assert!(session.is_dirty());

    repository.fail_writes(false);
    assert!(tokio_test::block_on(session.save()).unwrap());
    assert!(session.estimate().updated_at >= updated_at);
    assert!(!session.is_dirty());
}

#[test]
fn test_loaded_session_updates_in_place() {
    let (repository, id) = InMemoryEstimateRepository::with(draft_estimate());
    let mut session = tokio_test::block_on(EstimateSession::load(
        repository.clone(),
        pricing_context(),
        &id,
    ))
    .unwrap();
    assert!(!session.is_dirty());

    session.add_room(king_bedrooms(1)).unwrap();
    assert!(session.is_dirty());
    assert!(tokio_test::block_on(session.save()).unwrap());

    assert_eq!(repository.create_count(), 0);
    let stored = repository.stored(&id).unwrap();
    assert_eq!(stored.rooms.len(), 2);
    assert_eq!(stored.budget.unwrap().low.total, 210_000);
}

#[test]
fn test_load_missing_estimate_fails() {
    let repository = InMemoryEstimateRepository::default();
    let result = tokio_test::block_on(EstimateSession::load(
        repository,
        pricing_context(),
        &mongodb::bson::oid::ObjectId::new(),
    ));

    assert!(matches!(result, Err(SessionError::Repository(_))));
}
