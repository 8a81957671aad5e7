//! Commit waiter tests against an in-process websocket server.

use futures_util::{SinkExt, StreamExt};
use mintx_providers::{CommitWatch, WaitError};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{accept_async, tungstenite::protocol::Message, WebSocketStream};
use url::Url;

use mintx_core::types::{acc_input_event, Address, Transaction, TxInput};
use std::str::FromStr;

const CHAIN: &str = "mint-testnet";

fn sample_tx() -> Transaction {
    let from = Address::from_str("9F6BA3E0338EA4B8D9FBF3256F0FC1F9D5D77D1B").unwrap();
    let to = Address::from_str("AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").unwrap();
    Transaction::send(TxInput::new(from, 100, 5), to, 100)
}

fn event_frame(event: &str, tx: &Transaction, ret: &str, exception: &str) -> Message {
    let envelope = json!({
        "result": {
            "event": event,
            "data": { "tx": tx, "return": ret, "exception": exception },
        },
        "error": "",
    });
    Message::Text(envelope.to_string())
}

/// Binds a throwaway server and returns its node-style http url.
async fn spawn_ws_server<F, Fut>(handler: F) -> Url
where
    F: FnOnce(WebSocketStream<TcpStream>) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("can't listen");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.expect("no connection");
        let ws = accept_async(stream).await.expect("handshake failed");
        handler(ws).await;
    });
    Url::parse(&format!("http://{addr}/")).unwrap()
}

/// Reads and checks the subscription control frame.
async fn expect_subscribe(ws: &mut WebSocketStream<TcpStream>, event_id: &str) {
    let frame = ws.next().await.expect("no subscribe frame").unwrap();
    let value: Value = serde_json::from_str(frame.to_text().unwrap()).unwrap();
    assert_eq!(value["jsonrpc"], "2.0");
    assert_eq!(value["id"], "");
    assert_eq!(value["method"], "subscribe");
    assert_eq!(value["params"], json!([event_id]));
}

#[tokio::test]
async fn resolves_on_matching_commit_event() {
    let tx = sample_tx();
    let eid = acc_input_event(&tx.input_address().unwrap());
    let frame = event_frame(&eid, &tx, "CAFE", "");
    let expect_eid = eid.clone();

    let node = spawn_ws_server(move |mut ws| async move {
        expect_subscribe(&mut ws, &expect_eid).await;
        ws.send(frame).await.unwrap();
    })
    .await;

    let watch = CommitWatch::subscribe(&node, CHAIN, tx.input_address().unwrap(), tx.tx_id(CHAIN))
        .await
        .unwrap();
    let commit = watch.wait().await.unwrap();
    assert_eq!(commit.return_value, "CAFE".parse().unwrap());
    assert_eq!(commit.exception, None);
}

#[tokio::test]
async fn filters_unrelated_events_until_match() {
    let tx = sample_tx();
    let eid = acc_input_event(&tx.input_address().unwrap());

    // same sender, different transaction
    let mut rival = tx.clone();
    if let Transaction::Send(ref mut send) = rival {
        send.inputs[0].sequence += 1;
    }

    let stale = event_frame("Acc/0000000000000000000000000000000000000000/Input", &tx, "", "");
    let same_input = event_frame(&eid, &rival, "", "");
    let matching = event_frame(&eid, &tx, "0B0B", "");

    let node = spawn_ws_server(move |mut ws| async move {
        ws.next().await; // subscribe frame
        ws.send(stale).await.unwrap();
        ws.send(same_input).await.unwrap();
        ws.send(matching).await.unwrap();
    })
    .await;

    let watch = CommitWatch::subscribe(&node, CHAIN, tx.input_address().unwrap(), tx.tx_id(CHAIN))
        .await
        .unwrap();
    let commit = watch.wait().await.unwrap();
    assert_eq!(commit.return_value, "0B0B".parse().unwrap());
}

#[tokio::test]
async fn execution_exception_resolves_as_data() {
    let tx = sample_tx();
    let eid = acc_input_event(&tx.input_address().unwrap());
    let frame = event_frame(&eid, &tx, "", "out of gas");

    let node = spawn_ws_server(move |mut ws| async move {
        ws.next().await;
        ws.send(frame).await.unwrap();
    })
    .await;

    let watch = CommitWatch::subscribe(&node, CHAIN, tx.input_address().unwrap(), tx.tx_id(CHAIN))
        .await
        .unwrap();
    let commit = watch.wait().await.unwrap();
    assert_eq!(commit.exception.as_deref(), Some("out of gas"));
    assert!(commit.return_value.is_empty());
}

#[tokio::test]
async fn times_out_even_while_unrelated_events_arrive() {
    let tx = sample_tx();
    let noise = event_frame("Acc/0000000000000000000000000000000000000000/Input", &tx, "", "");

    let node = spawn_ws_server(move |mut ws| async move {
        ws.next().await;
        loop {
            if ws.send(noise.clone()).await.is_err() {
                break; // client resolved and hung up
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await;

    let watch = CommitWatch::subscribe_with_timeout(
        &node,
        CHAIN,
        tx.input_address().unwrap(),
        tx.tx_id(CHAIN),
        Duration::from_millis(300),
    )
    .await
    .unwrap();
    assert!(matches!(watch.wait().await.unwrap_err(), WaitError::Timeout));
}

#[tokio::test]
async fn server_going_away_is_a_transport_error() {
    let tx = sample_tx();

    let node = spawn_ws_server(|mut ws| async move {
        ws.next().await;
        ws.close(None).await.unwrap();
    })
    .await;

    let watch = CommitWatch::subscribe(&node, CHAIN, tx.input_address().unwrap(), tx.tx_id(CHAIN))
        .await
        .unwrap();
    let err = watch.wait().await.unwrap_err();
    assert!(
        matches!(err, WaitError::ConnectionClosed | WaitError::Transport(_)),
        "unexpected resolution: {err:?}"
    );
}

#[tokio::test]
async fn stream_error_envelope_resolves_as_error() {
    let tx = sample_tx();

    let node = spawn_ws_server(|mut ws| async move {
        ws.next().await;
        let envelope = json!({ "result": null, "error": "subscription refused" });
        ws.send(Message::Text(envelope.to_string())).await.unwrap();
    })
    .await;

    let watch = CommitWatch::subscribe(&node, CHAIN, tx.input_address().unwrap(), tx.tx_id(CHAIN))
        .await
        .unwrap();
    let err = watch.wait().await.unwrap_err();
    assert!(matches!(err, WaitError::Server(ref s) if s == "subscription refused"));
}

#[tokio::test]
async fn resolves_exactly_once_when_more_frames_follow() {
    let tx = sample_tx();
    let eid = acc_input_event(&tx.input_address().unwrap());
    let first = event_frame(&eid, &tx, "01", "");
    let second = event_frame(&eid, &tx, "02", "");

    let node = spawn_ws_server(move |mut ws| async move {
        ws.next().await;
        ws.send(first).await.unwrap();
        // a duplicate delivery after resolution must be discarded, not
        // block the waiter task
        let _ = ws.send(second).await;
        let _ = ws.close(None).await;
    })
    .await;

    let watch = CommitWatch::subscribe(&node, CHAIN, tx.input_address().unwrap(), tx.tx_id(CHAIN))
        .await
        .unwrap();
    let commit = watch.wait().await.unwrap();
    assert_eq!(commit.return_value, "01".parse().unwrap());
}

#[tokio::test]
async fn refused_connection_fails_fast() {
    let tx = sample_tx();
    // bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let node = Url::parse(&format!("http://{addr}/")).unwrap();
    let err = CommitWatch::subscribe(&node, CHAIN, tx.input_address().unwrap(), tx.tx_id(CHAIN))
        .await
        .unwrap_err();
    assert!(matches!(err, WaitError::Connect(_)));
}
