//! Inventory view specs
//!
//! Verify fallbacks, finalization and re-derivation over schemaless facts.

use crate::prelude::*;
use similar_asserts::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Stock {
    on_hand: i64,
    low: bool,
}

fn quantity(fact: &Fact<Untyped>) -> i64 {
    fact.data.data["qty"].as_i64().unwrap_or(0)
}

fn stock_view(threshold: i64) -> View<Stock, Untyped> {
    View::new()
        .initial_state(Stock {
            on_hand: 0,
            low: false,
        })
        .on("received", |state: Option<Stock>, fact| {
            Ok(state.map(|s| Stock {
                on_hand: s.on_hand + quantity(fact),
                ..s
            }))
        })
        .on("shipped", |state: Option<Stock>, fact| {
            Ok(state.map(|s| Stock {
                on_hand: s.on_hand - quantity(fact),
                ..s
            }))
        })
        .on("discontinued", |_, _| Ok(None))
        .on_unknown_fact(|state, _| Ok(state))
        .on_done(move |state| {
            Ok(state.map(|s| Stock {
                low: s.on_hand < threshold,
                ..s
            }))
        })
}

async fn item_store(streams: &FactStreams) -> FactStore<Untyped> {
    streams
        .create_fact_store(FactStoreConfig::new("item_facts"))
        .await
        .unwrap()
}

async fn log(store: &FactStore<Untyped>, stream_id: StreamId, kind: &str, qty: i64) -> StreamId {
    let fact = create_fact(stream_id, Untyped::new(kind, json!({ "qty": qty })), json!({}));
    store.append(fact).await.unwrap().stream_id
}

#[tokio::test]
async fn stock_levels_are_materialized_by_item_id() {
    let streams = FactStreams::in_memory();
    let store = item_store(&streams).await;
    let view = stock_view(5)
        .create_persistent_with(
            &store,
            factstreams_engine::PersistentOptions::new("stock").with_id_field("itemId"),
        )
        .await
        .unwrap();

    let item = log(&store, NEW, "received", 10).await;
    log(&store, item, "shipped", 3).await;
    log(&store, item, "relabelled", 0).await;
    log(&store, item, "shipped", 4).await;

    let doc = view.find_one(item).await.unwrap().unwrap();
    assert_eq!(
        value(&doc),
        json!({ "itemId": item.0, "onHand": 3, "low": true })
    );
}

#[tokio::test]
async fn discontinued_items_are_removed() {
    let streams = FactStreams::in_memory();
    let store = item_store(&streams).await;
    let view = stock_view(1).create_persistent(&store, "stock").await.unwrap();

    let item = log(&store, NEW, "received", 2).await;
    assert_eq!(view.count(None).await.unwrap(), 1);

    log(&store, item, "discontinued", 0).await;
    assert_eq!(view.count(None).await.unwrap(), 0);
}

#[tokio::test]
async fn done_runs_once_even_for_unknown_items() {
    let streams = FactStreams::in_memory();
    let store = item_store(&streams).await;
    let calls = Arc::new(AtomicUsize::new(0));

    let counter = calls.clone();
    let view = stock_view(1)
        .on_done(move |state| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(state)
        })
        .create_transient(&store);

    let state = view.replay(StreamId(404)).await.unwrap();
    assert_eq!(
        state,
        Some(Stock {
            on_hand: 0,
            low: false
        })
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rebuild_all_applies_a_changed_threshold() {
    let streams = FactStreams::in_memory();
    let store = item_store(&streams).await;
    let view = stock_view(5).create_persistent(&store, "stock").await.unwrap();

    let a = log(&store, NEW, "received", 3).await;
    let b = log(&store, NEW, "received", 8).await;
    assert_eq!(view.get(a).await.unwrap().map(|s| s.low), Some(true));

    let stricter = stock_view(10).create_persistent(&store, "stock").await.unwrap();
    assert_eq!(stricter.rebuild_all().await.unwrap(), 2);

    assert_eq!(stricter.get(a).await.unwrap().map(|s| s.low), Some(true));
    assert_eq!(stricter.get(b).await.unwrap().map(|s| s.low), Some(true));
    assert_eq!(
        stricter
            .count(Some(&Filter::eq("low", true)))
            .await
            .unwrap(),
        2
    );
}
