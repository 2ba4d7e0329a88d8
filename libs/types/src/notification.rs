//! Push notifications delivered by the host.
//!
//! The host does not tag its pushes; which subscriber class a notification
//! addresses is determined by which fields it carries. [`HostNotification::classes`]
//! resolves that once per delivery so dispatch never re-tests field
//! presence per handler. One notification can address several classes at
//! once (the first post-handshake delivery typically carries settings and a
//! cursor position together).

use crate::records::RowRef;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Raw push payload from the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostNotification {
    /// Identifier of the table the widget is linked to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_id: Option<String>,

    /// Cursor position, when the selected row changed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_id: Option<RowRef>,

    /// Set when bulk data in the selected table changed.
    pub data_change: bool,

    /// Set when the column mapping was edited; invalidates cached copies.
    pub mappings_change: bool,

    /// Widget options, if the host chose to deliver them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Value>,

    /// Widget settings; presence alone selects the options path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Value>,
}

/// Subscriber classes a notification can address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationClass {
    /// Cursor moved to a row (saved or the new-row slot).
    Record { row: RowRef },
    /// Bulk data in the selected table changed.
    Rows,
    /// Settings (and possibly options) delivered.
    Options,
}

impl HostNotification {
    /// Resolve which subscriber classes this delivery addresses.
    ///
    /// An empty result means the notification matches no class and is to
    /// be ignored.
    pub fn classes(&self) -> Vec<NotificationClass> {
        let mut classes = Vec::new();
        if let Some(row) = self.row_id {
            if !self.data_change {
                classes.push(NotificationClass::Record { row });
            }
        }
        if self.data_change && self.table_id.as_deref().is_some_and(|t| !t.is_empty()) {
            classes.push(NotificationClass::Rows);
        }
        if self.settings.is_some() {
            classes.push(NotificationClass::Options);
        }
        classes
    }
}
