//! Ticket view specs
//!
//! Verify materialized documents follow the log on every append.

use crate::prelude::*;
use similar_asserts::assert_eq;

async fn setup() -> (FactStore<TicketFact>, PersistentView<Ticket, TicketFact>) {
    let streams = FactStreams::in_memory();
    let store = ticket_store(&streams).await;
    let view = ticket_view().create_persistent(&store, "tickets").await.unwrap();
    (store, view)
}

#[tokio::test]
async fn completed_ticket_is_materialized_as_done() {
    let (store, view) = setup().await;

    let a = record(&store, NEW, created("write docs")).await;
    record(&store, a, TicketFact::Completed).await;

    let docs: Vec<Value> = view.find(&Query::all()).await.unwrap().iter().map(value).collect();
    assert_eq!(
        docs,
        vec![json!({ "_id": a.0, "title": "write docs", "status": "done" })]
    );
}

#[tokio::test]
async fn deleted_ticket_leaves_no_document() {
    let (store, view) = setup().await;

    let a = record(&store, NEW, created("write docs")).await;
    record(&store, a, TicketFact::Completed).await;
    record(&store, a, TicketFact::Deleted).await;

    assert_eq!(view.count(None).await.unwrap(), 0);
    assert!(view.get(a).await.unwrap().is_none());
}

#[tokio::test]
async fn transient_and_persistent_views_agree() {
    let (store, persistent) = setup().await;
    let transient: TransientView<Ticket, TicketFact> = ticket_view().create_transient(&store);

    let a = record(&store, NEW, created("a")).await;
    let b = record(&store, NEW, created("b")).await;
    record(&store, b, TicketFact::Completed).await;
    let c = record(&store, NEW, created("c")).await;
    record(&store, c, TicketFact::Deleted).await;

    for stream in [a, b, c] {
        assert_eq!(
            transient.replay(stream).await.unwrap(),
            persistent.get(stream).await.unwrap()
        );
    }
}

#[tokio::test]
async fn unexpected_fact_type_is_named() {
    let streams = FactStreams::in_memory();
    let store = ticket_store(&streams).await;
    let partial = View::<Ticket, TicketFact>::new()
        .on("created", |_, _| {
            Ok(Some(Ticket {
                title: String::new(),
                status: "to-do".to_string(),
            }))
        })
        .create_transient(&store);

    let a = record(&store, NEW, created("a")).await;
    record(&store, a, TicketFact::Completed).await;

    let err = partial.replay(a).await.unwrap_err();
    assert!(matches!(&err, ViewError::UnexpectedFactType(t) if t == "completed"));
}

#[tokio::test]
async fn done_filter_counts_finished_tickets() {
    let (store, view) = setup().await;

    for title in ["a", "b", "c"] {
        let stream = record(&store, NEW, created(title)).await;
        if title != "b" {
            record(&store, stream, TicketFact::Completed).await;
        }
    }

    assert_eq!(view.count(Some(&Filter::eq("status", "done"))).await.unwrap(), 2);
    assert_eq!(view.count(Some(&Filter::eq("status", "to-do"))).await.unwrap(), 1);
}
