//! In-process change notifications.
//!
//! Every successful write publishes a [`ChangeEvent`]. Editor panels subscribe
//! over Server-Sent Events with a [`Scope`] and re-fetch whatever they show
//! whenever an event arrives. Events are not coalesced and carry no payload
//! beyond the affected ids.

use std::convert::Infallible;

use actix_web::web::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use uuid::Uuid;

const CHANGE_EVENT: &str = "change";
const RESYNC_EVENT: &str = "resync";
pub const FEED_CAPACITY: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Orders,
    OrderLineItems,
    Customers,
    Addresses,
    Categories,
    ServiceTypes,
    Services,
    Discounts,
    OrderStatuses,
    Users,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeEvent {
    pub table: Table,
    pub action: Action,
    pub record_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<Uuid>,
    pub at: DateTime<Utc>,
}

impl ChangeEvent {
    pub fn new(table: Table, action: Action, record_id: Uuid) -> Self {
        Self {
            table,
            action,
            record_id,
            order_id: None,
            customer_id: None,
            at: Utc::now(),
        }
    }

    pub fn order(action: Action, order_id: Uuid) -> Self {
        Self::new(Table::Orders, action, order_id).for_order(order_id)
    }

    pub fn line_item(action: Action, line_id: Uuid, order_id: Uuid) -> Self {
        Self::new(Table::OrderLineItems, action, line_id).for_order(order_id)
    }

    pub fn customer(action: Action, customer_id: Uuid) -> Self {
        Self::new(Table::Customers, action, customer_id).for_customer(customer_id)
    }

    pub fn address(action: Action, address_id: Uuid, customer_id: Uuid) -> Self {
        Self::new(Table::Addresses, action, address_id).for_customer(customer_id)
    }

    pub fn for_order(mut self, order_id: Uuid) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn for_customer(mut self, customer_id: Uuid) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    fn to_sse_frame(&self) -> String {
        let data = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        format!("event: {CHANGE_EVENT}\ndata: {data}\n\n")
    }
}

/// Which events a subscriber wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    Table(Table),
    Order(Uuid),
    Customer(Uuid),
}

impl Scope {
    pub fn matches(&self, event: &ChangeEvent) -> bool {
        match self {
            Scope::All => true,
            Scope::Table(table) => event.table == *table,
            Scope::Order(id) => event.order_id == Some(*id),
            Scope::Customer(id) => event.customer_id == Some(*id),
        }
    }
}

/// Broadcast hub shared by the application services and the SSE handlers.
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn publish(&self, event: ChangeEvent) {
        log::debug!(
            "change {:?} {:?} {}",
            event.table,
            event.action,
            event.record_id
        );
        // No subscribers is the normal idle state.
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// SSE byte stream of the events matching `scope`.
    ///
    /// A subscriber that falls behind the buffer gets a `resync` event and
    /// is expected to re-fetch everything it shows.
    pub fn sse_stream(&self, scope: Scope) -> impl Stream<Item = Result<Bytes, Infallible>> {
        BroadcastStream::new(self.tx.subscribe()).filter_map(move |msg| match msg {
            Ok(event) if scope.matches(&event) => Some(Ok(Bytes::from(event.to_sse_frame()))),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                log::warn!("SSE subscriber lagged, skipped {skipped} events");
                Some(Ok(Bytes::from(format!(
                    "event: {RESYNC_EVENT}\ndata: {{\"skipped\":{skipped}}}\n\n"
                ))))
            }
        })
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(FEED_CAPACITY)
    }
}
