//! Sandboxed-page channel: a Unix stream to the embedding shell's bridge
//! socket.
//!
//! The shell exports the socket path in `TRELLIS_BRIDGE_SOCKET` before
//! loading the widget. When `TRELLIS_HOST_ORIGIN` is also set, the first
//! frame on the stream is a hello carrying that origin, which lets the
//! shell refuse widgets attached to the wrong host.

use crate::error::{Result, TransportError};
use crate::framing::{read_frame, write_frame};
use crate::{ChannelInfo, Environment, MessageChannel, BRIDGE_SOCKET_ENV, HOST_ORIGIN_ENV};
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tracing::debug;

/// First frame sent after connecting to the bridge socket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeHello {
    pub origin: Option<String>,
}

/// Channel over the embedding shell's bridge socket.
pub struct BridgeChannel {
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    info: ChannelInfo,
}

impl BridgeChannel {
    /// Connect using the socket path and origin from the environment.
    pub async fn from_env() -> Result<Self> {
        let path = std::env::var(BRIDGE_SOCKET_ENV).map_err(|_| {
            TransportError::environment(format!("{} is not set", BRIDGE_SOCKET_ENV))
        })?;
        let origin = std::env::var(HOST_ORIGIN_ENV).ok();
        Self::connect(path, origin).await
    }

    /// Connect to a bridge socket and send the origin hello.
    pub async fn connect(path: impl AsRef<Path>, origin: Option<String>) -> Result<Self> {
        let path = path.as_ref();
        let stream = UnixStream::connect(path).await.map_err(|e| {
            TransportError::environment(format!(
                "failed to connect bridge socket {}: {}",
                path.display(),
                e
            ))
        })?;
        let (reader, mut writer) = stream.into_split();

        let hello = serde_json::to_vec(&BridgeHello { origin })
            .map_err(|e| TransportError::channel(format!("hello encoding failed: {}", e)))?;
        write_frame(&mut writer, &hello).await?;
        debug!("bridge hello sent on {}", path.display());

        let segment = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            info: ChannelInfo::new(Environment::SandboxedPage, segment),
        })
    }
}

#[async_trait]
impl MessageChannel for BridgeChannel {
    async fn send(&self, frame: Bytes) -> Result<()> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, &frame).await
    }

    async fn receive(&self) -> Result<Bytes> {
        let mut reader = self.reader.lock().await;
        match read_frame(&mut *reader).await? {
            Some(frame) => Ok(frame),
            None => Err(TransportError::Closed),
        }
    }

    fn info(&self) -> &ChannelInfo {
        &self.info
    }
}
