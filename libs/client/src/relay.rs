//! Event relay: routes host push notifications to widget callbacks.
//!
//! All subscriptions share one inbound notification stream. Each delivery
//! is classified once into the subscriber classes it addresses; record and
//! table deliveries fetch the current payload from the host, pull the
//! (possibly cached) mapping, and project before invoking callbacks.
//! Notifications matching no class, or failing to parse, are ignored.
//! Callback panics are the widget author's own; the relay does not catch
//! them.

use crate::host::HostEndpoints;
use crate::mapping::MappingCache;
use crate::projection::{project_record, project_table};
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tracing::warn;
use types::{
    ColumnDeclaration, ColumnMapping, HostNotification, NotificationClass, Record, RowId,
    RowRef,
};

/// Callback for the selected-record path.
pub type RecordCallback = Arc<dyn Fn(Option<Record>, Option<ColumnMapping>) + Send + Sync>;
/// Callback for the selected-rows path.
pub type RecordsCallback =
    Arc<dyn Fn(Option<Vec<Record>>, Option<ColumnMapping>) + Send + Sync>;
/// Callback for the options path: `(options_or_none, settings)`.
pub type OptionsCallback = Arc<dyn Fn(Option<Value>, Value) + Send + Sync>;
/// Callback for the cursor landing on the unsaved new-row slot.
pub type NewRecordCallback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Subscriptions {
    record: RwLock<Vec<RecordCallback>>,
    records: RwLock<Vec<RecordsCallback>>,
    options: RwLock<Vec<OptionsCallback>>,
    new_record: RwLock<Vec<NewRecordCallback>>,
}

pub(crate) struct EventRelay {
    host: Arc<dyn HostEndpoints>,
    mappings: Arc<MappingCache>,
    declaration: Arc<RwLock<Option<ColumnDeclaration>>>,
    subscriptions: Subscriptions,
}

impl EventRelay {
    pub fn new(
        host: Arc<dyn HostEndpoints>,
        mappings: Arc<MappingCache>,
        declaration: Arc<RwLock<Option<ColumnDeclaration>>>,
    ) -> Self {
        Self {
            host,
            mappings,
            declaration,
            subscriptions: Subscriptions::default(),
        }
    }

    pub fn on_record(&self, callback: RecordCallback) {
        self.subscriptions.record.write().unwrap().push(callback);
    }

    pub fn on_records(&self, callback: RecordsCallback) {
        self.subscriptions.records.write().unwrap().push(callback);
    }

    pub fn on_options(&self, callback: OptionsCallback) {
        self.subscriptions.options.write().unwrap().push(callback);
    }

    pub fn on_new_record(&self, callback: NewRecordCallback) {
        self.subscriptions.new_record.write().unwrap().push(callback);
    }

    /// Handle one inbound notification delivery.
    pub async fn deliver(&self, body: Value) {
        let Ok(notification) = serde_json::from_value::<HostNotification>(body) else {
            // Malformed pushes are ignored by design.
            return;
        };
        for class in notification.classes() {
            match class {
                NotificationClass::Record {
                    row: RowRef::Id(row_id),
                } => self.deliver_record(row_id, &notification).await,
                NotificationClass::Record { row: RowRef::New } => self.deliver_new_record(),
                NotificationClass::Rows => self.deliver_rows(&notification).await,
                NotificationClass::Options => self.deliver_options(&notification),
            }
        }
    }

    async fn deliver_record(&self, row_id: RowId, notification: &HostNotification) {
        if self.subscriptions.record.read().unwrap().is_empty() {
            return;
        }
        let record = match self.host.fetch_selected_record(row_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!("selected record fetch failed: {}", e);
                return;
            }
        };
        let mapping = self.mappings.get_if_changed(notification.mappings_change).await;
        let declaration = self.declaration.read().unwrap().clone();
        let projected = project_record(&record, declaration.as_ref(), mapping.as_ref());

        let callbacks = self.subscriptions.record.read().unwrap().clone();
        for callback in callbacks {
            callback(projected.clone(), mapping.clone());
        }
    }

    async fn deliver_rows(&self, notification: &HostNotification) {
        if self.subscriptions.records.read().unwrap().is_empty() {
            return;
        }
        let table = match self.host.fetch_selected_table().await {
            Ok(table) => table,
            Err(e) => {
                warn!("selected table fetch failed: {}", e);
                return;
            }
        };
        let rows = table.to_records();
        let mapping = self.mappings.get_if_changed(notification.mappings_change).await;
        let declaration = self.declaration.read().unwrap().clone();
        let projected = project_table(&rows, declaration.as_ref(), mapping.as_ref());

        let callbacks = self.subscriptions.records.read().unwrap().clone();
        for callback in callbacks {
            callback(projected.clone(), mapping.clone());
        }
    }

    fn deliver_options(&self, notification: &HostNotification) {
        let settings = notification.settings.clone().unwrap_or(Value::Null);
        let callbacks = self.subscriptions.options.read().unwrap().clone();
        for callback in callbacks {
            callback(notification.options.clone(), settings.clone());
        }
    }

    fn deliver_new_record(&self) {
        let callbacks = self.subscriptions.new_record.read().unwrap().clone();
        for callback in callbacks {
            callback();
        }
    }
}
