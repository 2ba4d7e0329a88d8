//! Handshake configuration forwarded to the host.

use crate::column::ColumnDeclaration;
use serde::{Deserialize, Serialize};

/// Document access the widget asks the host to grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessLevel {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "read table")]
    ReadTable,
    #[serde(rename = "full")]
    Full,
}

/// Payload for the host's `configure` endpoint, sent after the ready
/// announcement. `has_custom_options` is derived from whether the widget
/// registered an options-editor callback; the callback itself never
/// crosses the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WidgetConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<ColumnDeclaration>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_access: Option<AccessLevel>,

    pub has_custom_options: bool,
}
