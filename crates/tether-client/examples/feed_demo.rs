//! End-to-end demo against an in-memory service.
//!
//! Binds to the service, registers for the event feed, prints the readiness
//! notice and a burst of events in arrival order, then dumps a table from
//! the store. Run with:
//!
//! ```sh
//! RUST_LOG=debug cargo run -p tether-client --example feed_demo
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

use tether_client::{ServiceConnector, SubscriptionClient, TableReader};
use tether_core::config::ClientConfig;
use tether_core::error::{ConnectError, StoreFault, TransportFault};
use tether_core::traits::{
    EventSink, LinkMonitor, RemoteService, RowCursor, ServiceHandle, TableStore,
};
use tether_core::types::{Event, FeedItem, SubscriberId};

/// In-memory service: completes the bind on a background task and signals
/// readiness a moment after registration, exercising the deferred path.
struct DemoService {
    monitor: Mutex<Option<Arc<dyn LinkMonitor>>>,
}

impl RemoteService for DemoService {
    fn start(&self) {
        tracing::info!("demo service started");
    }

    fn bind(&self, monitor: Arc<dyn LinkMonitor>) -> Result<(), ConnectError> {
        *self.monitor.lock() = Some(Arc::clone(&monitor));
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            monitor.on_connected(Arc::new(DemoHandle));
        });
        Ok(())
    }

    fn unbind(&self) {
        self.monitor.lock().take();
    }
}

struct DemoHandle;

#[async_trait]
impl ServiceHandle for DemoHandle {
    async fn subscribe(
        &self,
        identity: &SubscriberId,
        sink: Arc<dyn EventSink>,
    ) -> Result<bool, TransportFault> {
        tracing::info!(%identity, "subscriber registered, readiness to follow");
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            sink.on_service_ready();
            for n in 1..=3u8 {
                sink.handle_event(Event::new(format!("demo event {n}")));
            }
        });
        Ok(false)
    }
}

/// Three-row activities table
struct DemoStore;

struct DemoCursor {
    rows: Vec<[Option<String>; 2]>,
    position: Option<usize>,
}

impl TableStore for DemoStore {
    fn query(&self, table: &str) -> Result<Option<Box<dyn RowCursor>>, StoreFault> {
        if table != "Activities" {
            return Err(StoreFault::InvalidArgument(format!("no table {table}")));
        }
        let rows = vec![
            [Some("call".to_string()), Some("2026-08-07".to_string())],
            [Some("message".to_string()), None],
            [Some("sync".to_string()), Some("2026-08-06".to_string())],
        ];
        Ok(Some(Box::new(DemoCursor {
            rows,
            position: None,
        })))
    }
}

impl RowCursor for DemoCursor {
    fn move_to_first(&mut self) -> bool {
        self.position = Some(0);
        !self.rows.is_empty()
    }

    fn move_to_next(&mut self) -> bool {
        let next = self.position.map_or(0, |p| p + 1);
        self.position = Some(next);
        next < self.rows.len()
    }

    fn column_count(&self) -> usize {
        2
    }

    fn column_name(&self, index: usize) -> &str {
        ["kind", "timestamp"][index]
    }

    fn string_value(&self, index: usize) -> Option<String> {
        let row = self.position.and_then(|p| self.rows.get(p))?;
        row[index].clone()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let service: Arc<dyn RemoteService> = Arc::new(DemoService {
        monitor: Mutex::new(None),
    });

    let (connector, link_rx) = ServiceConnector::new(Arc::clone(&service));
    let connector = Arc::new(connector);
    connector.start();
    connector.bind()?;

    let config = ClientConfig {
        identity: SubscriberId::new("com.example.feed-demo"),
        ..ClientConfig::default()
    };
    let (client, mut inbox) = SubscriptionClient::spawn(Arc::clone(&connector), link_rx, config);

    let mut remaining = 3;
    while let Some(item) = inbox.recv().await {
        match item {
            FeedItem::Ready => tracing::info!("feed ready"),
            FeedItem::Event(event) => {
                tracing::info!(payload = %String::from_utf8_lossy(&event.payload), "event");
                remaining -= 1;
                if remaining == 0 {
                    break;
                }
            }
        }
    }

    let reader = TableReader::new(Arc::new(DemoStore));
    let rows = reader.query("Activities")?;
    for row in rows {
        tracing::info!(
            kind = row.get("kind").unwrap_or("-"),
            timestamp = row.get("timestamp").unwrap_or("-"),
            "activity"
        );
    }

    connector.unbind();
    client.shutdown().await;
    Ok(())
}
