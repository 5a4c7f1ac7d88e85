//! Shared fixtures for the behavioral specs

pub use factstreams_core::{Document, FactStoreConfig};
pub use factstreams_engine::{
    create_fact, Fact, FactData, FactStore, FactStoreError, FactStreams, PersistentView,
    Sequence, StreamId, TransientView, Untyped, View, ViewError, NEW,
};
pub use factstreams_storage::{Filter, Query};
pub use serde::{Deserialize, Serialize};
pub use serde_json::{json, Value};

/// Facts of the ticket tracker used across specs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum TicketFact {
    Created { title: String },
    Completed,
    Deleted,
}

impl FactData for TicketFact {
    fn fact_type(&self) -> &str {
        match self {
            TicketFact::Created { .. } => "created",
            TicketFact::Completed => "completed",
            TicketFact::Deleted => "deleted",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub title: String,
    pub status: String,
}

/// created -> to-do, completed -> done, deleted -> no document
pub fn ticket_view() -> View<Ticket, TicketFact> {
    View::new()
        .on("created", |_, fact: &Fact<TicketFact>| match &fact.data {
            TicketFact::Created { title } => Ok(Some(Ticket {
                title: title.clone(),
                status: "to-do".to_string(),
            })),
            other => Err(format!("expected created, got {}", other.fact_type()).into()),
        })
        .on("completed", |state: Option<Ticket>, _| {
            Ok(state.map(|ticket| Ticket {
                status: "done".to_string(),
                ..ticket
            }))
        })
        .on("deleted", |_, _| Ok(None))
}

pub async fn ticket_store(streams: &FactStreams) -> FactStore<TicketFact> {
    streams
        .create_fact_store(FactStoreConfig::new("ticket_facts"))
        .await
        .unwrap()
}

pub fn created(title: &str) -> TicketFact {
    TicketFact::Created {
        title: title.to_string(),
    }
}

/// Append and return the stream the fact landed on
pub async fn record(store: &FactStore<TicketFact>, stream_id: StreamId, data: TicketFact) -> StreamId {
    store
        .append(create_fact(stream_id, data, json!({})))
        .await
        .unwrap()
        .stream_id
}

pub fn value(doc: &Document) -> Value {
    Value::Object(doc.clone())
}
