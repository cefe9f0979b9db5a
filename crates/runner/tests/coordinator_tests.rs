use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use frog_config::EvaluatorCfg;
use frog_core::{Message, SourceError, Target};
use history::{HistoryStore, MemHistoryStore};
use runner::{Coordinator, Handled, RunStats};
use schema_sensing::DriftEvaluator;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

mod common;
use common::{CountingAck, RecordingSink, init_test_tracing};

fn target(s: &str) -> Target {
    s.parse().unwrap()
}

fn coordinator(
    report_baseline: bool,
) -> (Coordinator, Arc<RecordingSink>, Arc<MemHistoryStore>) {
    let history = Arc::new(MemHistoryStore::new());
    let sink = Arc::new(RecordingSink::default());
    let evaluator =
        DriftEvaluator::new(history.clone(), EvaluatorCfg { report_baseline });
    (Coordinator::new(evaluator, sink.clone()), sink, history)
}

#[tokio::test]
async fn acks_after_report_is_stored() {
    init_test_tracing();
    let (coord, sink, _) = coordinator(false);
    let ack = Arc::new(CountingAck::default());
    let t = target("orders:created");

    let first = Message::new(t.clone(), r#"{"id":1}"#).with_ack(ack.clone());
    assert_eq!(coord.handle(first).await, Handled::Silent);
    assert_eq!(ack.count(), 1);
    assert!(sink.outcomes().is_empty());

    let second = Message::new(t.clone(), r#"{"id":"x"}"#).with_ack(ack.clone());
    assert_eq!(coord.handle(second).await, Handled::Reported("diff"));
    assert_eq!(ack.count(), 2);

    let third = Message::new(t, r#"{"id":"y"}"#).with_ack(ack.clone());
    assert_eq!(coord.handle(third).await, Handled::Reported("match"));
    assert_eq!(sink.outcomes(), vec!["diff", "match"]);
}

#[tokio::test]
async fn store_failure_leaves_message_unacked() {
    init_test_tracing();
    let (coord, sink, history) = coordinator(false);
    let ack = Arc::new(CountingAck::default());
    let t = target("orders:created");

    coord
        .handle(Message::new(t.clone(), r#"{"a":1}"#).with_ack(ack.clone()))
        .await;
    assert_eq!(ack.count(), 1);

    sink.reject.store(true, Ordering::SeqCst);
    let handled = coord
        .handle(Message::new(t.clone(), r#"{"a":true}"#).with_ack(ack.clone()))
        .await;
    assert_eq!(handled, Handled::Failed);
    assert_eq!(ack.count(), 1);

    // history still moved forward
    let stored = history.get_raw(&t.to_string()).await.unwrap().unwrap();
    assert_eq!(&stored[..], br#"{"a":true}"#);
}

#[tokio::test]
async fn baseline_reports_when_enabled() {
    let (coord, sink, _) = coordinator(true);
    let handled = coord
        .handle(Message::new(target("a:b"), "not json"))
        .await;
    assert_eq!(handled, Handled::Reported("baseline"));
    assert_eq!(sink.outcomes(), vec!["baseline"]);
}

#[tokio::test]
async fn run_drains_until_stream_closes() {
    init_test_tracing();
    let (coord, sink, _) = coordinator(false);
    let (tx, rx) = mpsc::channel(1);
    let (_err_tx, err_rx) = mpsc::unbounded_channel::<SourceError>();
    let cancel = CancellationToken::new();

    let run = tokio::spawn(coord.run(rx, err_rx, cancel));

    let a = target("orders:created");
    let b = target("users:*");
    for (t, body) in [
        (&a, r#"{"n":1}"#),
        (&b, r#"{"u":"x"}"#),
        (&a, r#"{"n":2}"#),
        (&a, r#"{"n":"3"}"#),
        (&b, r#"{}"#),
        (&a, "oops"),
    ] {
        tx.send(Message::new(t.clone(), body)).await.unwrap();
    }
    drop(tx);

    let stats = run.await.unwrap().unwrap();
    assert_eq!(
        stats,
        RunStats {
            processed: 6,
            reported: 4,
            failed: 0,
        }
    );
    assert_eq!(
        sink.outcomes(),
        vec!["match", "diff", "diff", "decode_error"]
    );
}

#[tokio::test]
async fn run_stops_on_cancel() {
    let (coord, _, _) = coordinator(false);
    let (_tx, rx) = mpsc::channel::<Message>(1);
    let (_err_tx, err_rx) = mpsc::unbounded_channel::<SourceError>();
    let cancel = CancellationToken::new();

    let run = tokio::spawn(coord.run(rx, err_rx, cancel.clone()));
    cancel.cancel();

    let stats = tokio::time::timeout(Duration::from_secs(2), run)
        .await
        .expect("coordinator should stop")
        .unwrap()
        .unwrap();
    assert_eq!(stats, RunStats::default());
}

#[tokio::test]
async fn subscription_failure_is_fatal() {
    init_test_tracing();
    let (coord, _, _) = coordinator(false);
    let (_tx, rx) = mpsc::channel::<Message>(1);
    let (err_tx, err_rx) = mpsc::unbounded_channel();

    err_tx
        .send(SourceError::Consume {
            queue: "frog.orders.created".into(),
            details: "consumer cancelled by broker".into(),
        })
        .unwrap();

    let err = coord
        .run(rx, err_rx, CancellationToken::new())
        .await
        .unwrap_err();
    let text = format!("{err:#}");
    assert!(text.contains("broker subscription failed"), "{text}");
    assert!(text.contains("consumer cancelled by broker"), "{text}");
}
