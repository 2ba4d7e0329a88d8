//! Ready handshake: the widget's irreversible not-ready → ready
//! transition.
//!
//! Until a widget announces readiness, nothing is dispatched to its
//! handlers. Announcing flips the dispatch gate synchronously, then sends
//! the ready message and, best-effort, pushes the widget's configuration
//! to the host. A rejected configuration push is logged and swallowed; it
//! must not fail the widget or leave it partially initialized.

use crate::host::HostEndpoints;
use crate::rpc::{Rpc, EDIT_OPTIONS_ENDPOINT};
use futures::FutureExt;
use serde_json::Value;
use std::sync::{Arc, RwLock};
use tracing::warn;
use types::{AccessLevel, ColumnDeclaration, WidgetConfig};

/// Callback the host invokes when the user asks to edit the widget's
/// options.
pub type EditOptionsCallback = Arc<dyn Fn() + Send + Sync>;

/// Configuration a widget announces when it declares readiness.
#[derive(Clone, Default)]
pub struct ReadyOptions {
    /// Logical columns the widget requires.
    pub columns: Option<ColumnDeclaration>,
    /// Document access the widget asks for.
    pub requested_access: Option<AccessLevel>,
    /// Registered as the `editOptions` callable; never serialized.
    pub on_edit_options: Option<EditOptionsCallback>,
}

impl std::fmt::Debug for ReadyOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadyOptions")
            .field("columns", &self.columns)
            .field("requested_access", &self.requested_access)
            .field("on_edit_options", &self.on_edit_options.is_some())
            .finish()
    }
}

impl ReadyOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_columns(mut self, columns: ColumnDeclaration) -> Self {
        self.columns = Some(columns);
        self
    }

    pub fn with_requested_access(mut self, access: AccessLevel) -> Self {
        self.requested_access = Some(access);
        self
    }

    pub fn with_edit_options(mut self, callback: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_edit_options = Some(Arc::new(callback));
        self
    }
}

/// Announce readiness. See `WidgetClient::ready` for the public entry
/// point.
pub(crate) fn announce_ready(
    rpc: &Arc<Rpc>,
    host: Arc<dyn HostEndpoints>,
    declaration_slot: &Arc<RwLock<Option<ColumnDeclaration>>>,
    options: Option<ReadyOptions>,
) {
    let config = options.as_ref().map(|options| WidgetConfig {
        columns: options.columns.clone(),
        requested_access: options.requested_access,
        has_custom_options: options.on_edit_options.is_some(),
    });

    // The editor callable goes in before anything else so the host can
    // invoke it as soon as it likes.
    if let Some(callback) = options.as_ref().and_then(|o| o.on_edit_options.clone()) {
        rpc.register_impl(EDIT_OPTIONS_ENDPOINT, move |_args| {
            let callback = Arc::clone(&callback);
            async move {
                callback();
                Ok(Value::Null)
            }
            .boxed()
        });
    }

    // The gate flips synchronously relative to this call.
    rpc.process_incoming();

    if let Some(columns) = options.and_then(|o| o.columns) {
        if let Err(e) = columns.validate() {
            warn!("column declaration: {}", e);
        }
        *declaration_slot.write().unwrap() = Some(columns);
    }

    let rpc = Arc::clone(rpc);
    tokio::spawn(async move {
        if let Err(e) = rpc.send_ready().await {
            warn!("ready announcement failed: {}", e);
            return;
        }
        if let Some(config) = config {
            // Best-effort: a host that rejects configuration must not
            // crash the widget.
            if let Err(e) = host.configure(config).await {
                warn!("configuration push failed: {}", e);
            }
        }
    });
}
