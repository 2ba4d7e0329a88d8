//! # Trellis Transport Layer
//!
//! Detects which hosting arrangement a widget process runs under and binds
//! a frame-oriented message channel over that environment's native
//! primitive. Detection happens once at process start; everything above
//! this crate talks to one [`MessageChannel`] and never branches on the
//! environment again.
//!
//! Detection order:
//!
//! 1. **Sandboxed page**: an embedding shell exported a bridge socket
//!    (`TRELLIS_BRIDGE_SOCKET`); frames travel over that Unix stream, with
//!    an origin hello sent right after connecting when
//!    `TRELLIS_HOST_ORIGIN` is present.
//! 2. **Worker**: the host installed an in-process channel pair via
//!    [`worker::install`] before starting widget code.
//! 3. **Child process**: the parent spawned us with an inherited
//!    socketpair named by `TRELLIS_IPC_FD`. Parent disconnect (EOF)
//!    terminates the process with status 0.
//! 4. **Unrecognized**: no host present. Sends are accepted and dropped,
//!    receives never yield, and nothing panics, so widget code can be
//!    loaded and inspected without a live host.

pub mod bridge;
pub mod error;
pub mod framing;
pub mod ipc;
pub mod noop;
pub mod worker;

pub use bridge::BridgeChannel;
pub use error::{Result, TransportError};
pub use ipc::IpcChannel;
pub use noop::NoopChannel;
pub use worker::{HostPort, WorkerChannel, WorkerPort};

use async_trait::async_trait;
use bytes::Bytes;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// Environment variable naming the embedding shell's bridge socket.
pub const BRIDGE_SOCKET_ENV: &str = "TRELLIS_BRIDGE_SOCKET";
/// Environment variable carrying the host origin for the bridge hello.
pub const HOST_ORIGIN_ENV: &str = "TRELLIS_HOST_ORIGIN";
/// Environment variable naming the inherited IPC socketpair fd.
pub const IPC_FD_ENV: &str = "TRELLIS_IPC_FD";

/// Hosting environment a widget process runs under.
///
/// Detected once at process start and immutable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Environment {
    SandboxedPage,
    Worker,
    ChildProcess,
    Unrecognized,
}

static DETECTED: OnceCell<Environment> = OnceCell::new();

impl Environment {
    /// Inspect the process and classify its hosting arrangement.
    ///
    /// Prefer [`Environment::current`], which caches the answer; this
    /// re-reads process state on every call.
    pub fn detect() -> Self {
        if std::env::var_os(BRIDGE_SOCKET_ENV).is_some() {
            Environment::SandboxedPage
        } else if worker::installed() {
            Environment::Worker
        } else if std::env::var_os(IPC_FD_ENV).is_some() {
            Environment::ChildProcess
        } else {
            Environment::Unrecognized
        }
    }

    /// The environment detected at first use, cached for the process
    /// lifetime.
    pub fn current() -> Self {
        *DETECTED.get_or_init(Self::detect)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::SandboxedPage => "sandboxed-page",
            Environment::Worker => "worker",
            Environment::ChildProcess => "child-process",
            Environment::Unrecognized => "unrecognized",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic identity of a bound channel: the environment kind plus an
/// identifying path segment (socket file name, fd number, worker tag).
/// Log-only; never drives protocol decisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub environment: Environment,
    pub path: String,
}

impl ChannelInfo {
    pub fn new(environment: Environment, path: impl Into<String>) -> Self {
        Self {
            environment,
            path: path.into(),
        }
    }

    /// Log-line prefix, e.g. `child-process[fd:3]`.
    pub fn log_prefix(&self) -> String {
        format!("{}[{}]", self.environment.as_str(), self.path)
    }
}

/// Frame-oriented duplex channel bound to the environment's native
/// primitive.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Fire-and-forget send. Whatever completion value the underlying
    /// primitive reports (bytes written and the like) is normalized away.
    async fn send(&self, frame: Bytes) -> Result<()>;

    /// Next inbound frame. Pending forever when no host is attached.
    async fn receive(&self) -> Result<Bytes>;

    /// Diagnostic identity of this channel.
    fn info(&self) -> &ChannelInfo;
}

/// Binds the channel implementation matching the detected environment.
pub struct ChannelFactory;

impl ChannelFactory {
    /// Detect the hosting environment and bind its native channel.
    pub async fn bind() -> Result<Box<dyn MessageChannel>> {
        let environment = Environment::current();
        let channel: Box<dyn MessageChannel> = match environment {
            Environment::SandboxedPage => Box::new(BridgeChannel::from_env().await?),
            Environment::Worker => Box::new(WorkerChannel::from_installed()?),
            Environment::ChildProcess => Box::new(IpcChannel::from_env()?),
            Environment::Unrecognized => Box::new(NoopChannel::new()),
        };
        tracing::info!("{} channel bound", channel.info().log_prefix());
        Ok(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_wire_names() {
        assert_eq!(Environment::SandboxedPage.as_str(), "sandboxed-page");
        assert_eq!(
            serde_json::to_value(Environment::ChildProcess).unwrap(),
            serde_json::json!("child-process")
        );
    }

    #[test]
    fn test_log_prefix() {
        let info = ChannelInfo::new(Environment::ChildProcess, "fd:3");
        assert_eq!(info.log_prefix(), "child-process[fd:3]");
    }
}
