mod common;

use std::time::Duration;

use gamerhub_common::wire::{ClientEvent, ServerEvent};

const SILENCE: Duration = Duration::from_millis(300);

#[tokio::test]
async fn send_fans_out_to_subscribers_exactly_once() {
    let (addr, state) = common::spawn_server().await;

    let mut strategy_a = common::connect_ws(addr).await;
    let mut strategy_b = common::connect_ws(addr).await;
    let mut rpg_only = common::connect_ws(addr).await;

    common::join(&mut strategy_a, "strategy", "usr_a").await;
    common::join(&mut strategy_b, "strategy", "usr_b").await;
    common::join(&mut rpg_only, "rpg", "usr_c").await;

    common::wait_until(|| state.registry.subscriber_count("strategy") == 2).await;
    common::wait_until(|| state.registry.subscriber_count("rpg") == 1).await;

    common::send_message(&mut strategy_a, "strategy", "hello", "usr_a").await;

    // Every strategy subscriber, the sender included, gets exactly one copy.
    let ServerEvent::ReceiveMessage(echoed) = common::recv_event(&mut strategy_a).await;
    assert_eq!(echoed.content, "hello");
    assert_eq!(echoed.genre, "strategy");

    let ServerEvent::ReceiveMessage(delivered) = common::recv_event(&mut strategy_b).await;
    assert_eq!(delivered.id, echoed.id);
    assert_eq!(delivered.content, "hello");

    common::assert_silent(&mut strategy_a, SILENCE).await;
    common::assert_silent(&mut strategy_b, SILENCE).await;

    // The rpg-only subscriber gets nothing.
    common::assert_silent(&mut rpg_only, SILENCE).await;
}

#[tokio::test]
async fn replayed_sync_does_not_double_deliver() {
    let (addr, state) = common::spawn_server().await;

    let mut member = common::connect_ws(addr).await;
    let set = ClientEvent::SyncMyCommunities(vec!["rpg".into(), "fps".into()]);
    common::emit(&mut member, &set).await;
    common::emit(&mut member, &set).await;

    common::wait_until(|| state.registry.subscriber_count("rpg") == 1).await;
    common::wait_until(|| state.registry.subscriber_count("fps") == 1).await;

    let mut sender = common::connect_ws(addr).await;
    common::join(&mut sender, "rpg", "usr_s").await;
    common::wait_until(|| state.registry.subscriber_count("rpg") == 2).await;

    common::send_message(&mut sender, "rpg", "once", "usr_s").await;

    let ServerEvent::ReceiveMessage(message) = common::recv_event(&mut member).await;
    assert_eq!(message.content, "once");
    common::assert_silent(&mut member, SILENCE).await;
}

#[tokio::test]
async fn all_subscribers_observe_the_same_order() {
    let (addr, state) = common::spawn_server().await;

    let mut watcher_a = common::connect_ws(addr).await;
    let mut watcher_b = common::connect_ws(addr).await;
    let mut sender = common::connect_ws(addr).await;

    common::join(&mut watcher_a, "moba", "usr_a").await;
    common::join(&mut watcher_b, "moba", "usr_b").await;
    common::join(&mut sender, "moba", "usr_s").await;
    common::wait_until(|| state.registry.subscriber_count("moba") == 3).await;

    for content in ["one", "two", "three", "four", "five"] {
        common::send_message(&mut sender, "moba", content, "usr_s").await;
    }

    let mut seen_a = Vec::new();
    let mut seen_b = Vec::new();
    for _ in 0..5 {
        let ServerEvent::ReceiveMessage(m) = common::recv_event(&mut watcher_a).await;
        seen_a.push((m.id, m.content));
        let ServerEvent::ReceiveMessage(m) = common::recv_event(&mut watcher_b).await;
        seen_b.push((m.id, m.content));
    }

    assert_eq!(seen_a, seen_b);
    assert_eq!(
        seen_a.iter().map(|(_, c)| c.as_str()).collect::<Vec<_>>(),
        vec!["one", "two", "three", "four", "five"]
    );
    // IDs are the ordering key within a community.
    assert!(seen_a.windows(2).all(|w| w[0].0 < w[1].0));

    // The backlog endpoint reports the same accepted order.
    let history: Vec<serde_json::Value> = reqwest::get(format!("http://{addr}/api/v1/messages/moba"))
        .await
        .expect("history request")
        .json()
        .await
        .expect("parse history");
    let history_ids: Vec<i64> = history.iter().map(|m| m["_id"].as_i64().unwrap()).collect();
    assert_eq!(
        history_ids,
        seen_a.iter().map(|(id, _)| *id).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn community_identity_is_case_insensitive() {
    let (addr, state) = common::spawn_server().await;

    let mut upper = common::connect_ws(addr).await;
    common::join(&mut upper, "RPG", "usr_upper").await;
    common::wait_until(|| state.registry.subscriber_count("rpg") == 1).await;

    let mut lower = common::connect_ws(addr).await;
    common::join(&mut lower, "rpg", "usr_lower").await;
    common::wait_until(|| state.registry.subscriber_count("rpg") == 2).await;

    // "RPG" and "rpg" are one community: both members, one directory entry.
    assert_eq!(state.communities.member_count("rpg"), Some(2));

    common::send_message(&mut lower, "Rpg", "case test", "usr_lower").await;
    let ServerEvent::ReceiveMessage(message) = common::recv_event(&mut upper).await;
    assert_eq!(message.genre, "rpg");
    assert_eq!(message.content, "case test");
}

#[tokio::test]
async fn whitespace_only_send_is_dropped() {
    let (addr, state) = common::spawn_server().await;

    let mut ws = common::connect_ws(addr).await;
    common::join(&mut ws, "indie", "usr_1").await;
    common::wait_until(|| state.registry.subscriber_count("indie") == 1).await;

    common::send_message(&mut ws, "indie", "   \n\t  ", "usr_1").await;

    common::assert_silent(&mut ws, SILENCE).await;
    assert!(state.messages.history("indie").is_empty());
}

#[tokio::test]
async fn sync_after_reconnect_restores_delivery() {
    let (addr, state) = common::spawn_server().await;

    // First session: the member syncs its persisted communities.
    let mut member = common::connect_ws(addr).await;
    common::emit(
        &mut member,
        &ClientEvent::SyncMyCommunities(vec!["rpg".into()]),
    )
    .await;
    common::wait_until(|| state.registry.subscriber_count("rpg") == 1).await;

    // Transport drops; the subscription dies with the connection.
    drop(member);
    common::wait_until(|| state.registry.subscriber_count("rpg") == 0).await;

    // Reconnect replays the same set without a manual rejoin.
    let mut member = common::connect_ws(addr).await;
    common::emit(
        &mut member,
        &ClientEvent::SyncMyCommunities(vec!["rpg".into()]),
    )
    .await;
    common::wait_until(|| state.registry.subscriber_count("rpg") == 1).await;

    let mut sender = common::connect_ws(addr).await;
    common::join(&mut sender, "rpg", "usr_s").await;
    common::wait_until(|| state.registry.subscriber_count("rpg") == 2).await;
    common::send_message(&mut sender, "rpg", "after reconnect", "usr_s").await;

    let ServerEvent::ReceiveMessage(message) = common::recv_event(&mut member).await;
    assert_eq!(message.content, "after reconnect");
}

#[tokio::test]
async fn malformed_frames_do_not_kill_the_connection() {
    let (addr, state) = common::spawn_server().await;

    let mut ws = common::connect_ws(addr).await;
    use futures_util::SinkExt;
    use tokio_tungstenite::tungstenite;
    ws.send(tungstenite::Message::Text("{not json".into()))
        .await
        .expect("send garbage");
    ws.send(tungstenite::Message::Text(
        r#"{"event":"no-such-event","data":{}}"#.into(),
    ))
    .await
    .expect("send unknown event");

    // The connection still works afterwards.
    common::join(&mut ws, "fps", "usr_1").await;
    common::wait_until(|| state.registry.subscriber_count("fps") == 1).await;
    common::send_message(&mut ws, "fps", "still alive", "usr_1").await;
    let ServerEvent::ReceiveMessage(message) = common::recv_event(&mut ws).await;
    assert_eq!(message.content, "still alive");
}
