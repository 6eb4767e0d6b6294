//! Room adapter contract tests.
//!
//! Every test drives the adapter through `Arc<dyn RoomAdapter>` so the same
//! scenarios apply to any implementation.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use common::error::HubError;
use common::types::ClientId;
use hub_test_utils::{
    assert_no_subscription_leak, assert_no_task_leak, ready, room_join, serialize, FailingWriter,
    TaskBaseline, TestClient,
};
use signaling_hub::{Client, ClientError, MemoryAdapter, RoomAdapter, WriteError};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const ROOM: &str = "test-room";

fn adapter() -> Arc<dyn RoomAdapter> {
    Arc::new(MemoryAdapter::new(ROOM))
}

#[tokio::test]
async fn test_add_remove_clients() {
    let baseline = TaskBaseline::capture();
    let adapter = adapter();
    let (client, _written) = TestClient::new().with_metadata("a").build();
    let client_id = client.id();

    adapter.add(client).await.unwrap();

    assert_eq!(
        adapter.clients().await.unwrap(),
        HashMap::from([(client_id, "a".to_string())])
    );
    assert_eq!(adapter.size().await.unwrap(), 1);

    adapter.remove(client_id).await.unwrap();

    assert_eq!(adapter.clients().await.unwrap(), HashMap::new());
    assert_eq!(adapter.size().await.unwrap(), 0);
    assert_no_task_leak(baseline).await;
}

#[tokio::test]
async fn test_size_tracks_distinct_members() {
    let adapter = adapter();
    let clients: Vec<_> = (0..5).map(|_| TestClient::new().build()).collect();

    for (client, _) in &clients {
        adapter.add(Arc::clone(client)).await.unwrap();
    }
    // Duplicates and unknown removals do not change the count.
    let duplicate = adapter.add(Arc::clone(&clients[0].0)).await;
    assert_eq!(duplicate, Err(HubError::ClientAlreadyExists(clients[0].0.id())));
    assert!(adapter.remove(ClientId::new()).await.is_err());

    adapter.remove(clients[1].0.id()).await.unwrap();
    adapter.remove(clients[3].0.id()).await.unwrap();

    let members = adapter.clients().await.unwrap();
    assert_eq!(adapter.size().await.unwrap(), 3);
    for index in [0, 2, 4] {
        assert!(members.contains_key(&clients[index].0.id()));
    }
}

#[tokio::test]
async fn test_emit_found() {
    let baseline = TaskBaseline::capture();
    let adapter = adapter();
    let (client, mut written) = TestClient::new().build();
    adapter.add(Arc::clone(&client)).await.unwrap();

    let token = CancellationToken::new();
    let mut subscription = client.subscribe(token.clone());
    let subscriber_client = Arc::clone(&client);
    let subscriber = tokio::spawn(async move {
        while subscription.recv().await.is_some() {}
        subscriber_client.err()
    });

    let msg = ready(ROOM, "test");
    adapter.emit(client.id(), msg.clone()).await.unwrap();

    assert_eq!(
        written.next_bytes().await.to_vec(),
        serialize(&room_join(ROOM, &client))
    );
    let second = written.next_bytes().await;
    token.cancel();
    assert_eq!(second.to_vec(), serialize(&msg));

    assert_eq!(subscriber.await.unwrap(), Some(ClientError::Cancelled));
    assert_no_subscription_leak(&client);
    assert_no_task_leak(baseline).await;
}

#[tokio::test]
async fn test_emit_missing() {
    let baseline = TaskBaseline::capture();
    let adapter = adapter();

    let result = adapter.emit(ClientId::new(), ready(ROOM, "test")).await;

    assert!(result.is_ok());
    assert_eq!(adapter.size().await.unwrap(), 0);
    assert_no_task_leak(baseline).await;
}

#[tokio::test]
async fn test_emit_only_reaches_target() {
    let adapter = adapter();
    let (a, mut written_a) = TestClient::new().build();
    let (b, mut written_b) = TestClient::new().build();
    adapter.add(Arc::clone(&a)).await.unwrap();
    adapter.add(Arc::clone(&b)).await.unwrap();
    written_a.drain();
    written_b.drain();

    adapter.emit(b.id(), ready(ROOM, "direct")).await.unwrap();

    assert_eq!(written_b.drain(), vec![ready(ROOM, "direct")]);
    written_a.assert_empty();
}

#[tokio::test]
async fn test_broadcast() {
    let baseline = TaskBaseline::capture();
    let adapter = adapter();
    let (client1, mut written1) = TestClient::new().build();
    let (client2, mut written2) = TestClient::new().build();
    adapter.add(Arc::clone(&client1)).await.unwrap();
    adapter.add(Arc::clone(&client2)).await.unwrap();

    let token = CancellationToken::new();
    let subscribers: Vec<_> = [&client1, &client2]
        .into_iter()
        .map(|client| {
            let mut subscription = client.subscribe(token.clone());
            let client = Arc::clone(client);
            tokio::spawn(async move {
                while subscription.recv().await.is_some() {}
                client.err()
            })
        })
        .collect();

    let msg = ready(ROOM, "test");
    adapter.broadcast(msg.clone()).await.unwrap();

    assert_eq!(written1.next().await, room_join(ROOM, &client1));
    assert_eq!(written1.next().await, room_join(ROOM, &client2));
    assert_eq!(written2.next().await, room_join(ROOM, &client2));
    assert_eq!(written1.next_bytes().await.to_vec(), serialize(&msg));
    assert_eq!(written2.next_bytes().await.to_vec(), serialize(&msg));
    written1.assert_empty();
    written2.assert_empty();

    token.cancel();
    for subscriber in subscribers {
        assert_eq!(subscriber.await.unwrap(), Some(ClientError::Cancelled));
    }
    assert_no_subscription_leak(&client1);
    assert_no_subscription_leak(&client2);
    assert_no_task_leak(baseline).await;
}

#[tokio::test]
async fn test_join_announcement_uses_current_metadata() {
    let adapter = adapter();
    let (a, mut written_a) = TestClient::new().with_metadata("alice").build();
    let (b, _written_b) = TestClient::new().with_metadata("bob").build();

    adapter.add(Arc::clone(&a)).await.unwrap();
    b.set_metadata("bobby");
    adapter.add(Arc::clone(&b)).await.unwrap();

    let messages = written_a.drain();
    assert_eq!(messages, vec![room_join(ROOM, &a), room_join(ROOM, &b)]);
    assert!(messages[1].to_bytes().unwrap().windows(5).any(|w| w == b"bobby"));
}

#[tokio::test]
async fn test_failing_member_does_not_disrupt_room() {
    let adapter = adapter();
    let (healthy, mut written) = TestClient::new().build();
    let failing = Client::new(FailingWriter::new().with_error(WriteError::Transport(
        "broken pipe".to_string(),
    )));
    adapter.add(Arc::clone(&healthy)).await.unwrap();
    adapter.add(Arc::clone(&failing)).await.unwrap();

    adapter.broadcast(ready(ROOM, "test")).await.unwrap();

    assert_eq!(
        written.drain(),
        vec![
            room_join(ROOM, &healthy),
            room_join(ROOM, &failing),
            ready(ROOM, "test"),
        ]
    );
    assert!(matches!(failing.err(), Some(ClientError::Transport(_))));
    assert_eq!(healthy.err(), None);
    // Failed clients stay members until the session layer removes them.
    assert_eq!(adapter.size().await.unwrap(), 2);
}

#[tokio::test]
async fn test_writer_failure_after_some_writes() {
    let adapter = adapter();
    let client = Client::new(FailingWriter::new().after(1));
    adapter.add(Arc::clone(&client)).await.unwrap();
    assert_eq!(client.err(), None);

    adapter.emit(client.id(), ready(ROOM, "test")).await.unwrap();

    assert_eq!(
        client.err(),
        Some(ClientError::Transport(WriteError::Closed.to_string()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_slow_member_does_not_block_room() {
    let adapter = adapter();
    let (slow, _slow_written) = TestClient::new()
        .with_write_delay(Duration::from_millis(500))
        .build();
    let (fast, mut fast_written) = TestClient::new().build();
    adapter.add(Arc::clone(&fast)).await.unwrap();
    fast_written.drain();

    let joining = tokio::spawn({
        let adapter = Arc::clone(&adapter);
        let slow = Arc::clone(&slow);
        async move { adapter.add(slow).await }
    });
    // The clock only advances once the join is parked in the slow write.
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(slow.pending(), 1);

    // The join is stuck writing to the slow member, not holding the room.
    let size = tokio::time::timeout(Duration::from_millis(100), adapter.size())
        .await
        .expect("size should not wait for a slow writer");
    assert_eq!(size.unwrap(), 2);
    tokio::time::timeout(
        Duration::from_millis(100),
        adapter.emit(fast.id(), ready(ROOM, "fast")),
    )
    .await
    .expect("emit to a fast member should not wait for a slow writer")
    .unwrap();

    assert_eq!(
        fast_written.drain(),
        vec![room_join(ROOM, &slow), ready(ROOM, "fast")]
    );
    joining.await.unwrap().unwrap();
}
