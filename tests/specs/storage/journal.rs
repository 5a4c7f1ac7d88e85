//! Journal-backed database specs
//!
//! Verify facts, counters and views survive a restart.

use crate::prelude::*;
use similar_asserts::assert_eq;
use std::io::Write;
use tempfile::TempDir;

fn journal_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("tickets.journal")
}

#[tokio::test]
async fn restart_resumes_streams_and_views() {
    let dir = tempfile::tempdir().unwrap();

    let a = {
        let streams = FactStreams::open_journal(&journal_path(&dir)).unwrap();
        let store = ticket_store(&streams).await;
        ticket_view().create_persistent(&store, "tickets").await.unwrap();

        let a = record(&store, NEW, created("persist me")).await;
        record(&store, a, TicketFact::Completed).await;
        streams.close();
        a
    };

    let streams = FactStreams::open_journal(&journal_path(&dir)).unwrap();
    let store = ticket_store(&streams).await;
    let view = ticket_view().create_persistent(&store, "tickets").await.unwrap();

    assert_eq!(
        view.get(a).await.unwrap(),
        Some(Ticket {
            title: "persist me".to_string(),
            status: "done".to_string(),
        })
    );

    let b = record(&store, NEW, created("after restart")).await;
    assert_eq!(b.0, a.0 + 1);
    record(&store, a, TicketFact::Deleted).await;

    let sequences: Vec<u64> = store
        .find(a)
        .try_collect()
        .await
        .unwrap()
        .iter()
        .map(|f| f.sequence.0)
        .collect();
    assert_eq!(sequences, vec![1, 2, 3]);
    assert_eq!(view.count(None).await.unwrap(), 1);
}

#[tokio::test]
async fn torn_tail_is_discarded_on_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = journal_path(&dir);

    let a = {
        let streams = FactStreams::open_journal(&path).unwrap();
        let store = ticket_store(&streams).await;
        record(&store, NEW, created("intact")).await
    };

    let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    file.write_all(b"{\"seq\":99,\"mutation\":{\"op\":\"ins").unwrap();
    drop(file);

    let streams = FactStreams::open_journal(&path).unwrap();
    let store = ticket_store(&streams).await;
    let facts = store.find(a).try_collect().await.unwrap();
    assert_eq!(facts.len(), 1);
    assert_eq!(facts[0].data, created("intact"));

    record(&store, a, TicketFact::Completed).await;
    assert_eq!(store.find(a).try_collect().await.unwrap().len(), 2);
}
