use super::*;

fn identity() -> Identity {
    Identity { user_id: Uuid::new_v4() }
}

async fn registered(registry: &ConnectionRegistry) -> (ConnectionId, mpsc::Receiver<ServerMessage>) {
    let id = Uuid::new_v4();
    let (tx, rx) = mpsc::channel(8);
    registry.register(id, identity(), tx).await;
    (id, rx)
}

#[tokio::test]
async fn register_tracks_identity_without_rooms() {
    let registry = ConnectionRegistry::new();
    let id = Uuid::new_v4();
    let who = identity();
    let (tx, _rx) = mpsc::channel(8);
    registry.register(id, who, tx).await;

    assert_eq!(registry.connection_count().await, 1);
    assert_eq!(registry.identity_of(id).await, Some(who));
    assert!(registry.rooms_of(id).await.is_empty());
}

#[tokio::test]
async fn join_is_idempotent() {
    let registry = ConnectionRegistry::new();
    let (id, _rx) = registered(&registry).await;

    assert!(registry.join_room(id, 5).await);
    assert!(!registry.join_room(id, 5).await);

    assert_eq!(registry.members_of(5).await, HashSet::from([id]));
    assert_eq!(registry.senders_of(5).await.len(), 1);
    assert_eq!(registry.rooms_of(id).await, vec![5]);
}

#[tokio::test]
async fn leave_non_member_room_is_noop() {
    let registry = ConnectionRegistry::new();
    let (id, _rx) = registered(&registry).await;
    registry.join_room(id, 1).await;

    assert!(!registry.leave_room(id, 2).await);
    assert_eq!(registry.rooms_of(id).await, vec![1]);
}

#[tokio::test]
async fn leave_prunes_empty_room_index() {
    let registry = ConnectionRegistry::new();
    let (id, _rx) = registered(&registry).await;
    registry.join_room(id, 1).await;
    assert_eq!(registry.room_count().await, 1);

    assert!(registry.leave_room(id, 1).await);
    assert!(registry.members_of(1).await.is_empty());
    assert_eq!(registry.room_count().await, 0);
}

#[tokio::test]
async fn unknown_connection_cannot_join() {
    let registry = ConnectionRegistry::new();
    assert!(!registry.join_room(Uuid::new_v4(), 1).await);
    assert!(!registry.leave_room(Uuid::new_v4(), 1).await);
    assert!(registry.members_of(1).await.is_empty());
}

#[tokio::test]
async fn unregister_removes_from_every_room() {
    let registry = ConnectionRegistry::new();
    let (a, _rx_a) = registered(&registry).await;
    let (b, _rx_b) = registered(&registry).await;
    registry.join_room(a, 1).await;
    registry.join_room(a, 2).await;
    registry.join_room(b, 2).await;

    let mut left = registry.unregister(a).await;
    left.sort_unstable();
    assert_eq!(left, vec![1, 2]);

    assert_eq!(registry.connection_count().await, 1);
    assert!(registry.members_of(1).await.is_empty());
    assert_eq!(registry.members_of(2).await, HashSet::from([b]));
    assert!(registry.identity_of(a).await.is_none());
}

#[tokio::test]
async fn unregister_unknown_is_noop() {
    let registry = ConnectionRegistry::new();
    assert!(registry.unregister(Uuid::new_v4()).await.is_empty());
}

#[tokio::test]
async fn senders_are_room_scoped() {
    let registry = ConnectionRegistry::new();
    let (a, _rx_a) = registered(&registry).await;
    let (b, _rx_b) = registered(&registry).await;
    registry.join_room(a, 10).await;
    registry.join_room(b, 20).await;

    let senders: Vec<ConnectionId> = registry.senders_of(10).await.into_iter().map(|(id, _)| id).collect();
    assert_eq!(senders, vec![a]);
    assert!(registry.senders_of(30).await.is_empty());
}

#[tokio::test]
async fn same_user_on_two_connections_is_two_members() {
    let registry = ConnectionRegistry::new();
    let who = identity();
    let (tx1, _rx1) = mpsc::channel(8);
    let (tx2, _rx2) = mpsc::channel(8);
    let (c1, c2) = (Uuid::new_v4(), Uuid::new_v4());
    registry.register(c1, who, tx1).await;
    registry.register(c2, who, tx2).await;
    registry.join_room(c1, 3).await;
    registry.join_room(c2, 3).await;

    assert_eq!(registry.members_of(3).await, HashSet::from([c1, c2]));
}

#[tokio::test]
async fn reregister_keeps_rooms() {
    let registry = ConnectionRegistry::new();
    let (id, _rx) = registered(&registry).await;
    registry.join_room(id, 4).await;

    let (tx, _rx2) = mpsc::channel(8);
    registry.register(id, identity(), tx).await;

    assert_eq!(registry.connection_count().await, 1);
    assert_eq!(registry.rooms_of(id).await, vec![4]);
}
