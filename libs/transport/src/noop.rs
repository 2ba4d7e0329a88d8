//! Degraded channel for processes with no recognized host.
//!
//! Lets widget code be imported and initialized offline: sends are
//! accepted and dropped, receives never yield, and no call errors or
//! panics.

use crate::error::Result;
use crate::{ChannelInfo, Environment, MessageChannel};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

pub struct NoopChannel {
    info: ChannelInfo,
}

impl NoopChannel {
    pub fn new() -> Self {
        Self {
            info: ChannelInfo::new(Environment::Unrecognized, "-"),
        }
    }
}

impl Default for NoopChannel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageChannel for NoopChannel {
    async fn send(&self, frame: Bytes) -> Result<()> {
        debug!(
            "{} dropping {}-byte frame (no host attached)",
            self.info.log_prefix(),
            frame.len()
        );
        Ok(())
    }

    async fn receive(&self) -> Result<Bytes> {
        std::future::pending().await
    }

    fn info(&self) -> &ChannelInfo {
        &self.info
    }
}
