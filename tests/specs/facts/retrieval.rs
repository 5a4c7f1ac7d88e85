//! Fact retrieval specs
//!
//! Verify ordered, lazy, restartable reads.

use crate::prelude::*;
use similar_asserts::assert_eq;

#[tokio::test]
async fn find_all_returns_persistence_order() {
    let streams = FactStreams::in_memory();
    let store = ticket_store(&streams).await;

    let a = record(&store, NEW, created("a")).await;
    let b = record(&store, NEW, created("b")).await;
    record(&store, a, TicketFact::Completed).await;
    record(&store, b, TicketFact::Deleted).await;

    let log: Vec<String> = store
        .find_all()
        .try_collect()
        .await
        .unwrap()
        .iter()
        .map(|f| format!("{}/{} {}", f.stream_id, f.sequence, f.fact_type()))
        .collect();
    assert_eq!(
        log,
        ["1/1 created", "2/1 created", "1/2 completed", "2/2 deleted"]
            .map(String::from)
            .to_vec()
    );
}

#[tokio::test]
async fn cursor_pages_lazily_over_long_streams() {
    let streams = FactStreams::in_memory();
    let store: FactStore<TicketFact> = streams
        .create_fact_store(FactStoreConfig::new("ticket_facts").with_batch_size(3))
        .await
        .unwrap();

    let stream = record(&store, NEW, created("long")).await;
    for _ in 0..9 {
        record(&store, stream, TicketFact::Completed).await;
    }

    let mut cursor = store.find(stream);
    let mut expected = Sequence::FIRST.0;
    while let Some(fact) = cursor.next().await {
        assert_eq!(fact.unwrap().sequence.0, expected);
        expected += 1;
    }
    assert_eq!(expected, 11);
}

#[tokio::test]
async fn each_find_restarts_from_the_log() {
    let streams = FactStreams::in_memory();
    let store = ticket_store(&streams).await;
    let stream = record(&store, NEW, created("a")).await;

    let before = store.find(stream).try_collect().await.unwrap();
    record(&store, stream, TicketFact::Completed).await;
    let after = store.find(stream).try_collect().await.unwrap();

    assert_eq!(before.len(), 1);
    assert_eq!(after.len(), 2);
    assert_eq!(after[0], before[0]);
}
