use super::*;
use crate::state::test_helpers;

#[tokio::test]
async fn join_creates_room_lazily() {
    let state = test_helpers::test_app_state();
    assert!(list_rooms(&state).await.is_empty());

    let snapshot = join_room(&state, "lobby", test_helpers::player("p1", "Al")).await;
    assert_eq!(snapshot.name, "lobby");
    assert_eq!(snapshot.player_count, 1);
    assert_eq!(snapshot.max_players, 10);

    let listed = list_rooms(&state).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "lobby");
}

#[tokio::test]
async fn join_preserves_join_order() {
    let state = test_helpers::test_app_state();
    join_room(&state, "lobby", test_helpers::player("p1", "Al")).await;
    join_room(&state, "lobby", test_helpers::player("p2", "Bo")).await;
    let snapshot = join_room(&state, "lobby", test_helpers::player("p3", "Cy")).await;

    let ids: Vec<&str> = snapshot.players.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, ["p1", "p2", "p3"]);
}

#[tokio::test]
async fn join_with_known_id_is_idempotent() {
    let state = test_helpers::test_app_state();
    join_room(&state, "lobby", test_helpers::player("p1", "Al")).await;
    update_player_position(&state, "lobby", "p1", 40.0, 80.0)
        .await
        .expect("p1 should be present");

    // Re-join with a fresh record: no duplicate insert, no position reset.
    let mut rejoin = test_helpers::player("p1", "Al");
    rejoin.x = 999.0;
    let snapshot = join_room(&state, "lobby", rejoin).await;

    assert_eq!(snapshot.player_count, 1);
    assert!((snapshot.players[0].x - 40.0).abs() < f64::EPSILON);
    assert!((snapshot.players[0].y - 80.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn join_caps_membership_at_max_players() {
    let state = test_helpers::test_app_state();
    for n in 0..10 {
        let snapshot = join_room(&state, "lobby", test_helpers::player(&format!("p{n}"), "x")).await;
        assert_eq!(snapshot.player_count, n + 1);
    }

    // The 11th join is a silent membership no-op.
    let snapshot = join_room(&state, "lobby", test_helpers::player("p10", "late")).await;
    assert_eq!(snapshot.player_count, 10);
    assert!(!snapshot.players.iter().any(|p| p.id == "p10"));
}

#[tokio::test]
async fn room_names_are_case_sensitive() {
    let state = test_helpers::test_app_state();
    join_room(&state, "Lobby", test_helpers::player("p1", "Al")).await;
    join_room(&state, "lobby", test_helpers::player("p2", "Bo")).await;

    let listed = list_rooms(&state).await;
    assert_eq!(listed.len(), 2);
}

#[tokio::test]
async fn update_position_overwrites_in_place() {
    let state = test_helpers::test_app_state();
    join_room(&state, "lobby", test_helpers::player("p1", "Al")).await;

    let updated = update_player_position(&state, "lobby", "p1", 10.0, 20.0)
        .await
        .expect("p1 should be present");
    assert_eq!(updated.username, "Al");
    assert!((updated.x - 10.0).abs() < f64::EPSILON);
    assert!((updated.y - 20.0).abs() < f64::EPSILON);

    // Last write wins, no ordering check.
    let updated = update_player_position(&state, "lobby", "p1", 5.0, 5.0)
        .await
        .expect("p1 should be present");
    assert!((updated.x - 5.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn update_position_for_unknown_player_is_noop() {
    let state = test_helpers::test_app_state();
    join_room(&state, "lobby", test_helpers::player("p1", "Al")).await;

    assert!(update_player_position(&state, "lobby", "ghost", 1.0, 2.0).await.is_none());

    let listed = list_rooms(&state).await;
    assert_eq!(listed[0].player_count, 1);
    assert!((listed[0].players[0].x - 0.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn update_position_for_unknown_room_is_noop() {
    let state = test_helpers::test_app_state();
    assert!(update_player_position(&state, "nowhere", "p1", 1.0, 2.0).await.is_none());
    assert!(list_rooms(&state).await.is_empty());
}

#[tokio::test]
async fn leave_removes_exactly_one_player() {
    let state = test_helpers::test_app_state();
    join_room(&state, "lobby", test_helpers::player("p1", "Al")).await;
    join_room(&state, "lobby", test_helpers::player("p2", "Bo")).await;

    let removed = leave_room(&state, "lobby", "p1").await.expect("p1 should be removed");
    assert_eq!(removed.id, "p1");
    assert_eq!(removed.username, "Al");

    let listed = list_rooms(&state).await;
    assert_eq!(listed[0].player_count, 1);
    assert!(!listed[0].players.iter().any(|p| p.id == "p1"));
}

#[tokio::test]
async fn leave_for_unknown_player_returns_none() {
    let state = test_helpers::test_app_state();
    join_room(&state, "lobby", test_helpers::player("p1", "Al")).await;

    assert!(leave_room(&state, "lobby", "ghost").await.is_none());
    assert!(leave_room(&state, "nowhere", "p1").await.is_none());
    assert_eq!(list_rooms(&state).await[0].player_count, 1);
}

#[tokio::test]
async fn emptied_room_stays_in_directory() {
    let state = test_helpers::test_app_state();
    join_room(&state, "lobby", test_helpers::player("p1", "Al")).await;
    leave_room(&state, "lobby", "p1").await.expect("p1 should be removed");

    let listed = list_rooms(&state).await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].player_count, 0);
}

#[tokio::test]
async fn list_rooms_is_sorted_by_name() {
    let state = test_helpers::test_app_state();
    join_room(&state, "zebra", test_helpers::player("p1", "Al")).await;
    join_room(&state, "alpha", test_helpers::player("p2", "Bo")).await;

    let names: Vec<String> = list_rooms(&state).await.into_iter().map(|r| r.name).collect();
    assert_eq!(names, ["alpha", "zebra"]);
}
