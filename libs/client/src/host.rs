//! Host endpoints the widget consumes, and their RPC-backed stub.

use crate::error::Result;
use crate::rpc::Rpc;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use types::{ColumnMapping, Record, RowId, TableRecords, WidgetConfig};

/// The host operations this client consumes. One implementation reaches a
/// live host through the RPC boundary; tests substitute their own.
#[async_trait]
pub trait HostEndpoints: Send + Sync {
    /// Record the host's cursor currently points at.
    async fn fetch_selected_record(&self, row_id: RowId) -> Result<Record>;

    /// Full selected table in columnar form.
    async fn fetch_selected_table(&self) -> Result<TableRecords>;

    /// Current column mapping, or `None` when the host has nothing to
    /// offer.
    async fn mappings(&self) -> Result<Option<ColumnMapping>>;

    /// Push the widget's configuration to the host.
    async fn configure(&self, config: WidgetConfig) -> Result<()>;
}

/// Host endpoints reached through the RPC boundary.
pub struct RpcHost {
    rpc: Arc<Rpc>,
}

impl RpcHost {
    pub fn new(rpc: Arc<Rpc>) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl HostEndpoints for RpcHost {
    async fn fetch_selected_record(&self, row_id: RowId) -> Result<Record> {
        let data = self.rpc.call("fetchSelectedRecord", json!([row_id])).await?;
        Ok(serde_json::from_value(data)?)
    }

    async fn fetch_selected_table(&self) -> Result<TableRecords> {
        let data = self.rpc.call("fetchSelectedTable", json!([])).await?;
        Ok(serde_json::from_value(data)?)
    }

    async fn mappings(&self) -> Result<Option<ColumnMapping>> {
        let data = self.rpc.call("mappings", json!([])).await?;
        Ok(serde_json::from_value(data)?)
    }

    async fn configure(&self, config: WidgetConfig) -> Result<()> {
        self.rpc.call("configure", json!([config])).await?;
        Ok(())
    }
}
