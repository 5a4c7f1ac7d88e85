//! Fact append specs
//!
//! Verify stream allocation, sequencing and append hooks.

use crate::prelude::*;
use factstreams_engine::HookError;
use similar_asserts::assert_eq;
use std::sync::{Arc, Mutex};

#[tokio::test]
async fn n_appends_yield_sequences_one_to_n() {
    let streams = FactStreams::in_memory();
    let store = ticket_store(&streams).await;

    let stream = record(&store, NEW, created("long-lived")).await;
    for _ in 0..6 {
        record(&store, stream, TicketFact::Completed).await;
    }

    let sequences: Vec<u64> = store
        .find(stream)
        .try_collect()
        .await
        .unwrap()
        .iter()
        .map(|f| f.sequence.0)
        .collect();
    assert_eq!(sequences, (1..=7).collect::<Vec<_>>());
}

#[tokio::test]
async fn concurrent_new_streams_never_collide() {
    let streams = FactStreams::in_memory();
    let store = Arc::new(ticket_store(&streams).await);

    let mut handles = Vec::new();
    for i in 0..10 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            record(&store, NEW, created(&format!("t{i}"))).await
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().0);
    }
    ids.sort_unstable();
    assert_eq!(ids, (1..=10).collect::<Vec<_>>());
}

#[tokio::test]
async fn colliding_appends_let_exactly_one_win() {
    let streams = FactStreams::in_memory();
    let store = ticket_store(&streams).await;
    let stream = record(&store, NEW, created("shared")).await;

    // Hold each append between sequencing and insert so both read the same position
    store.on_before_append(|fact: Fact<TicketFact>| async move {
        tokio::task::yield_now().await;
        Ok::<_, HookError>(fact)
    });

    let (a, b) = tokio::join!(
        store.append(create_fact(stream, TicketFact::Completed, json!({}))),
        store.append(create_fact(stream, TicketFact::Deleted, json!({}))),
    );

    let failures: Vec<&FactStoreError> = [&a, &b]
        .into_iter()
        .filter_map(|r| r.as_ref().err())
        .collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].is_duplicate_key());
    assert_eq!(store.find(stream).try_collect().await.unwrap().len(), 2);
}

#[tokio::test]
async fn rejected_appends_keep_sequences_gap_free() {
    let streams = FactStreams::in_memory();
    let store = ticket_store(&streams).await;
    store.on_before_append(|fact: Fact<TicketFact>| async move {
        if fact.data == TicketFact::Deleted {
            return Err::<Fact<TicketFact>, HookError>("tickets are never deleted".into());
        }
        Ok(fact)
    });

    let stream = record(&store, NEW, created("kept")).await;
    let rejected = store
        .append(create_fact(stream, TicketFact::Deleted, json!({})))
        .await;
    assert!(matches!(rejected, Err(FactStoreError::BeforeAppend(_))));
    record(&store, stream, TicketFact::Completed).await;

    let sequences: Vec<u64> = store
        .find(stream)
        .try_collect()
        .await
        .unwrap()
        .iter()
        .map(|f| f.sequence.0)
        .collect();
    assert_eq!(sequences, vec![1, 2]);
}

#[tokio::test]
async fn new_streams_never_join_an_explicitly_written_stream() {
    let streams = FactStreams::in_memory();
    let store = ticket_store(&streams).await;

    record(&store, StreamId(1), created("imported")).await;
    record(&store, StreamId(2), created("imported")).await;
    let fresh = record(&store, NEW, created("fresh")).await;

    assert_eq!(fresh, StreamId(3));
    for stream in [StreamId(1), StreamId(2), fresh] {
        assert_eq!(store.find(stream).try_collect().await.unwrap().len(), 1);
    }
}

#[tokio::test]
async fn before_hook_metadata_is_persisted() {
    let streams = FactStreams::in_memory();
    let store = ticket_store(&streams).await;
    store.on_before_append(|mut fact: Fact<TicketFact>| async move {
        fact.metadata["tenant"] = json!("acme");
        Ok::<_, HookError>(fact)
    });

    let stream = record(&store, NEW, created("hooked")).await;
    let stored = store.find(stream).try_collect().await.unwrap();
    assert_eq!(stored[0].metadata, json!({ "tenant": "acme" }));
}

#[tokio::test]
async fn after_hooks_observe_every_fact_in_order() {
    let streams = FactStreams::in_memory();
    let store = ticket_store(&streams).await;
    let seen = Arc::new(Mutex::new(Vec::new()));

    let log = seen.clone();
    store.on_after_append(move |fact: Fact<TicketFact>| {
        let log = log.clone();
        async move {
            log.lock().unwrap().push(format!("{}:{}", fact.stream_id, fact.fact_type()));
            Ok::<_, HookError>(())
        }
    });

    let a = record(&store, NEW, created("a")).await;
    record(&store, a, TicketFact::Completed).await;
    record(&store, NEW, created("b")).await;

    assert_eq!(
        *seen.lock().unwrap(),
        ["1:created", "1:completed", "2:created"].map(String::from).to_vec()
    );
}
