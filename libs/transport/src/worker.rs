//! Worker channel: in-process message passing between a widget running as
//! a worker and the host that owns it.
//!
//! The host calls [`channel_pair`], keeps the [`HostPort`], and installs
//! the [`WorkerPort`] with [`install`] before starting widget code; the
//! installed port is what makes detection classify the process as a
//! worker.

use crate::error::{Result, TransportError};
use crate::{ChannelInfo, Environment, MessageChannel};
use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::Lazy;
use tokio::sync::mpsc;
use tokio::sync::Mutex as AsyncMutex;

/// Widget-side endpoints of a worker channel.
pub struct WorkerPort {
    pub to_host: mpsc::UnboundedSender<Bytes>,
    pub from_host: mpsc::UnboundedReceiver<Bytes>,
}

/// Host-side endpoints of a worker channel.
pub struct HostPort {
    pub to_widget: mpsc::UnboundedSender<Bytes>,
    pub from_widget: mpsc::UnboundedReceiver<Bytes>,
}

/// Create a connected (widget, host) port pair.
pub fn channel_pair() -> (WorkerPort, HostPort) {
    let (to_host, from_widget) = mpsc::unbounded_channel();
    let (to_widget, from_host) = mpsc::unbounded_channel();
    (
        WorkerPort { to_host, from_host },
        HostPort {
            to_widget,
            from_widget,
        },
    )
}

static INSTALLED: Lazy<std::sync::Mutex<Option<WorkerPort>>> =
    Lazy::new(|| std::sync::Mutex::new(None));

/// Install the widget-side port; to be called by the host before widget
/// code runs. A later install replaces an unclaimed earlier one.
pub fn install(port: WorkerPort) {
    *INSTALLED.lock().unwrap() = Some(port);
}

/// Whether a worker port is installed and unclaimed.
pub fn installed() -> bool {
    INSTALLED.lock().unwrap().is_some()
}

fn take() -> Option<WorkerPort> {
    INSTALLED.lock().unwrap().take()
}

/// Channel over an installed in-process port pair.
pub struct WorkerChannel {
    to_host: mpsc::UnboundedSender<Bytes>,
    from_host: AsyncMutex<mpsc::UnboundedReceiver<Bytes>>,
    info: ChannelInfo,
}

impl WorkerChannel {
    /// Claim the installed port.
    pub fn from_installed() -> Result<Self> {
        let port = take().ok_or_else(|| {
            TransportError::environment("no worker port installed")
        })?;
        Ok(Self::from_port(port))
    }

    pub fn from_port(port: WorkerPort) -> Self {
        Self {
            to_host: port.to_host,
            from_host: AsyncMutex::new(port.from_host),
            info: ChannelInfo::new(Environment::Worker, "in-process"),
        }
    }
}

#[async_trait]
impl MessageChannel for WorkerChannel {
    async fn send(&self, frame: Bytes) -> Result<()> {
        self.to_host
            .send(frame)
            .map_err(|_| TransportError::Closed)
    }

    async fn receive(&self) -> Result<Bytes> {
        let mut from_host = self.from_host.lock().await;
        from_host.recv().await.ok_or(TransportError::Closed)
    }

    fn info(&self) -> &ChannelInfo {
        &self.info
    }
}
