//! # Trellis Widget Client
//!
//! Widget-side implementation of the Trellis host protocol. A widget
//! process binds whatever channel its hosting environment provides,
//! announces readiness, and from then on receives host pushes as projected
//! records in its own logical column names.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use widget_client::{ColumnDeclaration, ReadyOptions, WidgetClient};
//!
//! # async fn run() -> widget_client::Result<()> {
//! let client = WidgetClient::connect().await?;
//!
//! client.on_record(|record, _mapping| {
//!     if let Some(record) = record {
//!         println!("selected: {:?}", record.get("title"));
//!     }
//! });
//!
//! client.ready(Some(
//!     ReadyOptions::new()
//!         .with_columns(ColumnDeclaration::required(["title"]))
//!         .with_edit_options(|| println!("host asked for the options editor")),
//! ));
//! # Ok(())
//! # }
//! ```
//!
//! Nothing reaches a registered callback before [`WidgetClient::ready`] is
//! called; mapping refreshes coalesce into one in-flight host fetch; and a
//! record whose required columns are unmapped is delivered as `None`
//! rather than as a partially filled value.

pub mod config;
pub mod error;
pub mod handshake;
pub mod host;
pub mod logging;
pub mod mapping;
pub mod projection;
pub mod relay;
pub mod rpc;

pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use handshake::{EditOptionsCallback, ReadyOptions};
pub use host::{HostEndpoints, RpcHost};
pub use mapping::MappingCache;
pub use rpc::{Rpc, WireMessage, EDIT_OPTIONS_ENDPOINT};

// The protocol model and transport surface widgets interact with.
pub use transport::{ChannelFactory, Environment, MessageChannel, TransportError};
pub use types::{
    AccessLevel, ColumnDeclaration, ColumnMapping, ColumnSpec, HostNotification,
    MappedColumns, Record, RowId, RowRef, TableRecords, WidgetConfig,
};

use relay::EventRelay;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use std::time::Duration;

/// One widget's connection to its host.
pub struct WidgetClient {
    rpc: Arc<Rpc>,
    host: Arc<dyn HostEndpoints>,
    relay: Arc<EventRelay>,
    declaration: Arc<RwLock<Option<ColumnDeclaration>>>,
}

impl WidgetClient {
    /// Detect the hosting environment, bind its channel, and start the
    /// read loop. In an unrecognized environment this still succeeds: the
    /// client works offline with a no-op channel.
    pub async fn connect() -> Result<Self> {
        let channel = ChannelFactory::bind().await?;
        Ok(Self::attach(Arc::from(channel)))
    }

    /// Like [`WidgetClient::connect`], bounded by the configured
    /// channel-binding timeout.
    pub async fn connect_with(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let timeout_ms = config.transport.connect_timeout_ms;
        let channel = tokio::time::timeout(
            Duration::from_millis(timeout_ms),
            ChannelFactory::bind(),
        )
        .await
        .map_err(|_| TransportError::timeout("channel binding", timeout_ms))??;
        Ok(Self::attach(Arc::from(channel)))
    }

    /// Attach over an explicit channel (embedding hosts, tests).
    pub fn attach(channel: Arc<dyn MessageChannel>) -> Self {
        let rpc = Rpc::new(channel);
        Arc::clone(&rpc).start();
        let host: Arc<dyn HostEndpoints> = Arc::new(RpcHost::new(Arc::clone(&rpc)));
        Self::wire(rpc, host)
    }

    fn wire(rpc: Arc<Rpc>, host: Arc<dyn HostEndpoints>) -> Self {
        let declaration = Arc::new(RwLock::new(None));
        let mappings = Arc::new(MappingCache::new(Arc::clone(&host)));
        let relay = Arc::new(EventRelay::new(
            Arc::clone(&host),
            Arc::clone(&mappings),
            Arc::clone(&declaration),
        ));
        {
            let relay = Arc::clone(&relay);
            rpc.on_notification(move |body: Value| {
                let relay = Arc::clone(&relay);
                tokio::spawn(async move {
                    relay.deliver(body).await;
                });
            });
        }
        Self {
            rpc,
            host,
            relay,
            declaration,
        }
    }

    /// Announce readiness, optionally with configuration. Flips the
    /// dispatch gate synchronously; the ready message and the
    /// configuration push happen asynchronously, and a rejected push is
    /// logged rather than surfaced.
    pub fn ready(&self, options: Option<ReadyOptions>) {
        handshake::announce_ready(&self.rpc, Arc::clone(&self.host), &self.declaration, options);
    }

    /// Subscribe to selected-record changes. The callback receives the
    /// projected record (or `None` when projection is unavailable) and the
    /// mapping used.
    pub fn on_record(
        &self,
        callback: impl Fn(Option<Record>, Option<ColumnMapping>) + Send + Sync + 'static,
    ) {
        self.relay.on_record(Arc::new(callback));
    }

    /// Subscribe to selected-rows changes.
    pub fn on_records(
        &self,
        callback: impl Fn(Option<Vec<Record>>, Option<ColumnMapping>) + Send + Sync + 'static,
    ) {
        self.relay.on_records(Arc::new(callback));
    }

    /// Subscribe to option/settings deliveries, including the first one
    /// triggered by the handshake.
    pub fn on_options(
        &self,
        callback: impl Fn(Option<Value>, Value) + Send + Sync + 'static,
    ) {
        self.relay.on_options(Arc::new(callback));
    }

    /// Subscribe to the cursor landing on the unsaved new-row slot.
    pub fn on_new_record(&self, callback: impl Fn() + Send + Sync + 'static) {
        self.relay.on_new_record(Arc::new(callback));
    }

    /// Fetch the currently selected record directly.
    pub async fn fetch_selected_record(&self, row_id: RowId) -> Result<Record> {
        self.host.fetch_selected_record(row_id).await
    }

    /// Fetch the full selected table directly, in columnar form.
    pub async fn fetch_selected_table(&self) -> Result<TableRecords> {
        self.host.fetch_selected_table().await
    }

    /// The hosting environment this client bound at startup.
    pub fn environment(&self) -> Environment {
        self.rpc.info().environment
    }

    /// Diagnostic prefix identifying the environment and channel.
    pub fn log_prefix(&self) -> String {
        self.rpc.info().log_prefix()
    }
}
