//! Integration tests for the intent relay
//!
//! These tests validate the matchmaking pipeline end to end over the
//! coordinator and an in-memory transport: pairing workflows, cleanup
//! on skip and disconnect, wire event shapes, and behavior under
//! concurrent joins.

use intent_relay::coordinator::MatchCoordinator;
use intent_relay::metrics::MetricsCollector;
use intent_relay::protocol::{decode_client_message, ClientMessage, ServerMessage};
use intent_relay::transport::RecordingTransport;
use intent_relay::types::{ConnectionId, RoomId};
use intent_relay::utils::generate_connection_id;
use std::sync::Arc;

/// Test setup: a coordinator over a recording transport
fn create_test_system() -> (Arc<MatchCoordinator>, Arc<RecordingTransport>) {
    let transport = Arc::new(RecordingTransport::new());
    let metrics = Arc::new(MetricsCollector::new().unwrap());
    let coordinator = Arc::new(MatchCoordinator::new(transport.clone(), metrics));
    (coordinator, transport)
}

async fn connect(
    coordinator: &MatchCoordinator,
    transport: &RecordingTransport,
) -> ConnectionId {
    let id = generate_connection_id();
    transport.register(id);
    coordinator.handle_connect(id).await;
    id
}

#[tokio::test]
async fn test_complete_pairing_workflow() {
    let (coordinator, transport) = create_test_system();

    let a = connect(&coordinator, &transport).await;
    let b = connect(&coordinator, &transport).await;

    // A waits, B matches; both learn the other's id
    coordinator.handle_join(a, Some("hiring")).await;
    coordinator.handle_join(b, Some("hiring")).await;

    assert_eq!(
        transport.messages_to(a),
        vec![ServerMessage::MatchFound { peer_id: b }]
    );
    assert_eq!(
        transport.messages_to(b),
        vec![ServerMessage::MatchFound { peer_id: a }]
    );

    // Room symmetry: one shared room, the waiter's self-room
    let shared = transport.occupants(RoomId::self_room(a));
    assert_eq!(shared.len(), 2);
    assert!(shared.contains(&a) && shared.contains(&b));

    // A skips, B hears it; B disconnects, nothing is left behind
    coordinator.handle_skip(a).await;
    assert_eq!(
        transport.messages_to(b).last(),
        Some(&ServerMessage::Left {})
    );

    coordinator.handle_disconnect(b).await;
    coordinator.handle_disconnect(a).await;

    let stats = coordinator.stats();
    assert_eq!(stats.matches_made, 1);
    assert_eq!(stats.waiting_connections, 0);
    assert_eq!(stats.active_connections, 0);
}

#[tokio::test]
async fn test_unknown_intent_leaves_no_trace() {
    let (coordinator, transport) = create_test_system();
    let c = connect(&coordinator, &transport).await;

    coordinator.handle_join(c, Some("unknown_category")).await;

    assert!(transport.messages_to(c).is_empty());
    assert_eq!(coordinator.stats().waiting_connections, 0);

    // C must not be retrievable as a future match
    let d = connect(&coordinator, &transport).await;
    coordinator.handle_join(d, Some("hiring")).await;
    assert!(transport.messages_to(d).is_empty());
    assert_eq!(coordinator.stats().matches_made, 0);
}

#[tokio::test]
async fn test_intents_are_isolated_queues() {
    let (coordinator, transport) = create_test_system();

    let hiring = connect(&coordinator, &transport).await;
    let seeking = connect(&coordinator, &transport).await;
    let teammate = connect(&coordinator, &transport).await;

    coordinator.handle_join(hiring, Some("hiring")).await;
    coordinator.handle_join(seeking, Some("looking_for_job")).await;
    coordinator
        .handle_join(teammate, Some("project_teammate"))
        .await;

    // Three different intents: everyone waits
    assert_eq!(coordinator.stats().waiting_connections, 3);
    assert_eq!(coordinator.stats().matches_made, 0);

    // A fourth client under one of them pairs with that waiter only
    let j = connect(&coordinator, &transport).await;
    coordinator.handle_join(j, Some("looking_for_job")).await;

    assert_eq!(
        transport.messages_to(j),
        vec![ServerMessage::MatchFound { peer_id: seeking }]
    );
    assert_eq!(coordinator.stats().waiting_connections, 2);
}

#[tokio::test]
async fn test_skipper_requeues_against_former_partner() {
    let (coordinator, transport) = create_test_system();

    let a = connect(&coordinator, &transport).await;
    let b = connect(&coordinator, &transport).await;

    coordinator.handle_join(a, Some("hiring")).await;
    coordinator.handle_join(b, Some("hiring")).await;
    coordinator.handle_skip(a).await;
    coordinator.handle_skip(b).await;

    // Both free again; they can even re-pair with each other
    coordinator.handle_join(b, Some("hiring")).await;
    coordinator.handle_join(a, Some("hiring")).await;

    let a_msgs = transport.messages_to(a);
    assert_eq!(
        a_msgs.last(),
        Some(&ServerMessage::MatchFound { peer_id: b })
    );
    assert_eq!(coordinator.stats().matches_made, 2);

    // Second pairing rendezvouses in the new waiter's room
    let shared = transport.occupants(RoomId::self_room(b));
    assert_eq!(shared.len(), 2);
}

#[tokio::test]
async fn test_disconnect_mid_wait_purges_queue() {
    let (coordinator, transport) = create_test_system();

    let w1 = connect(&coordinator, &transport).await;
    let w2 = connect(&coordinator, &transport).await;
    let j = connect(&coordinator, &transport).await;

    coordinator.handle_join(w1, Some("project_teammate")).await;
    coordinator.handle_join(w2, Some("project_teammate")).await;
    coordinator.handle_disconnect(w1).await;

    // FIFO head is gone, so the joiner pairs with the second waiter
    coordinator.handle_join(j, Some("project_teammate")).await;
    assert_eq!(
        transport.messages_to(j),
        vec![ServerMessage::MatchFound { peer_id: w2 }]
    );
}

#[tokio::test]
async fn test_decoded_frames_drive_the_coordinator() {
    let (coordinator, transport) = create_test_system();

    let a = connect(&coordinator, &transport).await;
    let b = connect(&coordinator, &transport).await;

    let join = decode_client_message(r#"{"event":"join_queue","data":{"intent":"hiring"}}"#)
        .expect("valid join frame");
    assert!(matches!(join, ClientMessage::JoinQueue { .. }));

    coordinator.handle_message(a, join.clone()).await;
    coordinator.handle_message(b, join).await;
    assert_eq!(coordinator.stats().matches_made, 1);

    let skip = decode_client_message(r#"{"event":"skip"}"#).expect("valid skip frame");
    coordinator.handle_message(a, skip).await;
    assert_eq!(
        transport.messages_to(b).last(),
        Some(&ServerMessage::Left {})
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins_pair_everyone_exactly_once() {
    let (coordinator, transport) = create_test_system();

    let count = 40;
    let mut ids = Vec::with_capacity(count);
    for _ in 0..count {
        ids.push(connect(&coordinator, &transport).await);
    }

    let mut handles = Vec::new();
    for id in &ids {
        let coordinator = coordinator.clone();
        let id = *id;
        handles.push(tokio::spawn(async move {
            coordinator.handle_join(id, Some("hiring")).await;
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let stats = coordinator.stats();
    assert_eq!(stats.matches_made as usize, count / 2);
    assert_eq!(stats.waiting_connections, 0);

    // Every connection got exactly one match_found, and the pairings
    // are mutual: if A was told about B, B was told about A.
    for id in &ids {
        let messages = transport.messages_to(*id);
        assert_eq!(messages.len(), 1, "connection paired more than once");

        let peer_id = match &messages[0] {
            ServerMessage::MatchFound { peer_id } => *peer_id,
            other => panic!("expected match_found, got {:?}", other),
        };
        assert_ne!(peer_id, *id, "connection paired with itself");

        let peer_messages = transport.messages_to(peer_id);
        assert_eq!(
            peer_messages,
            vec![ServerMessage::MatchFound { peer_id: *id }]
        );
    }
}
