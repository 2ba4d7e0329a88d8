//! Child-process channel: an inherited socketpair between parent and
//! widget process.
//!
//! The parent spawns the widget with one end of a socketpair and exports
//! its fd number in `TRELLIS_IPC_FD`. EOF from the parent is the
//! disconnect signal: the widget process terminates with status 0.

use crate::error::{Result, TransportError};
use crate::framing::{read_frame, write_frame};
use crate::{ChannelInfo, Environment, MessageChannel, IPC_FD_ENV};
use async_trait::async_trait;
use bytes::Bytes;
use std::os::fd::{FromRawFd, RawFd};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tracing::info;

/// Channel over the socketpair inherited from the parent process.
pub struct IpcChannel {
    reader: Mutex<OwnedReadHalf>,
    writer: Mutex<OwnedWriteHalf>,
    exit_on_disconnect: bool,
    info: ChannelInfo,
}

impl IpcChannel {
    /// Adopt the fd named by `TRELLIS_IPC_FD`.
    pub fn from_env() -> Result<Self> {
        let raw = std::env::var(IPC_FD_ENV)
            .map_err(|_| TransportError::environment(format!("{} is not set", IPC_FD_ENV)))?;
        let fd: RawFd = raw.parse().map_err(|_| {
            TransportError::environment(format!("{} is not an fd number: {}", IPC_FD_ENV, raw))
        })?;
        Self::from_fd(fd, true)
    }

    /// Adopt an inherited socketpair fd.
    ///
    /// The caller must own `fd` exclusively; the channel takes over closing
    /// it. `exit_on_disconnect` controls whether parent EOF terminates the
    /// process (true in production, false under test).
    pub fn from_fd(fd: RawFd, exit_on_disconnect: bool) -> Result<Self> {
        // Safety: the fd was handed to this process for exclusive use and
        // is not owned by any other wrapper in this process.
        let std_stream = unsafe { std::os::unix::net::UnixStream::from_raw_fd(fd) };
        std_stream.set_nonblocking(true)?;
        let stream = UnixStream::from_std(std_stream)?;
        let (reader, writer) = stream.into_split();

        Ok(Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
            exit_on_disconnect,
            info: ChannelInfo::new(Environment::ChildProcess, format!("fd:{}", fd)),
        })
    }
}

#[async_trait]
impl MessageChannel for IpcChannel {
    async fn send(&self, frame: Bytes) -> Result<()> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, &frame).await
    }

    async fn receive(&self) -> Result<Bytes> {
        let mut reader = self.reader.lock().await;
        match read_frame(&mut *reader).await? {
            Some(frame) => Ok(frame),
            None => {
                info!("{} parent disconnected", self.info.log_prefix());
                if self.exit_on_disconnect {
                    std::process::exit(0);
                }
                Err(TransportError::Closed)
            }
        }
    }

    fn info(&self) -> &ChannelInfo {
        &self.info
    }
}
