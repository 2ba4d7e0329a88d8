//! Request/response multiplexer boundary over the bound channel.
//!
//! This is the external-collaborator seam: request/response correlation,
//! named callables, and a push-notification subscription. All protocol
//! policy (when to call, how to shape payloads) lives above it. Inbound
//! dispatch to registered handlers is gated: until the handshake admits
//! it, calls and notifications are dropped. Responses to the widget's own
//! outbound calls are never gated.

use crate::error::{ClientError, Result};
use bytes::Bytes;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use tokio::sync::oneshot;
use transport::{ChannelInfo, MessageChannel, TransportError};
use tracing::{debug, warn};

/// Well-known callable the host invokes to open the widget's options
/// editor.
pub const EDIT_OPTIONS_ENDPOINT: &str = "editOptions";

/// Wire message for the multiplexer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mtype", rename_all = "camelCase")]
pub enum WireMessage {
    /// Widget announces readiness.
    Ready,
    /// Invoke a named endpoint on the peer.
    #[serde(rename_all = "camelCase")]
    Call {
        req_id: u64,
        name: String,
        args: Value,
    },
    /// Successful response to a call.
    #[serde(rename_all = "camelCase")]
    RespData { req_id: u64, data: Value },
    /// Failed response to a call.
    #[serde(rename_all = "camelCase")]
    RespErr { req_id: u64, error: String },
    /// Host push notification.
    Custom { body: Value },
}

type CallResult = std::result::Result<Value, String>;
type ImplHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, CallResult> + Send + Sync>;
type NotificationHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// Request/response multiplexer over one bound channel.
pub struct Rpc {
    channel: Arc<dyn MessageChannel>,
    impls: RwLock<HashMap<String, ImplHandler>>,
    subscribers: RwLock<Vec<NotificationHandler>>,
    pending: Mutex<HashMap<u64, oneshot::Sender<CallResult>>>,
    next_req_id: AtomicU64,
    admit_inbound: AtomicBool,
}

impl Rpc {
    pub fn new(channel: Arc<dyn MessageChannel>) -> Arc<Self> {
        Arc::new(Self {
            channel,
            impls: RwLock::new(HashMap::new()),
            subscribers: RwLock::new(Vec::new()),
            pending: Mutex::new(HashMap::new()),
            next_req_id: AtomicU64::new(1),
            admit_inbound: AtomicBool::new(false),
        })
    }

    /// Spawn the read loop feeding inbound frames into dispatch.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                match self.channel.receive().await {
                    Ok(frame) => self.receive_frame(&frame).await,
                    Err(TransportError::Closed) => break,
                    Err(e) => {
                        warn!("{} receive failed: {}", self.info().log_prefix(), e);
                        break;
                    }
                }
            }
        })
    }

    pub fn info(&self) -> &ChannelInfo {
        self.channel.info()
    }

    /// Register a locally callable function under a name.
    pub fn register_impl<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(Value) -> BoxFuture<'static, CallResult> + Send + Sync + 'static,
    {
        self.impls
            .write()
            .unwrap()
            .insert(name.into(), Arc::new(handler));
    }

    /// Subscribe to host push notifications.
    pub fn on_notification<F>(&self, handler: F)
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.subscribers.write().unwrap().push(Arc::new(handler));
    }

    /// Admit inbound dispatch to registered handlers. Frames delivered
    /// before this point were dropped, not queued.
    pub fn process_incoming(&self) {
        self.admit_inbound.store(true, Ordering::SeqCst);
    }

    pub fn admits_inbound(&self) -> bool {
        self.admit_inbound.load(Ordering::SeqCst)
    }

    /// Send the ready announcement.
    pub async fn send_ready(&self) -> Result<()> {
        self.send(&WireMessage::Ready).await
    }

    /// Call a named endpoint on the host and await its response.
    pub async fn call(&self, name: &str, args: Value) -> Result<Value> {
        let req_id = self.next_req_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(req_id, tx);

        let message = WireMessage::Call {
            req_id,
            name: name.to_string(),
            args,
        };
        if let Err(e) = self.send(&message).await {
            self.pending.lock().unwrap().remove(&req_id);
            return Err(e);
        }

        match rx.await {
            Ok(Ok(data)) => Ok(data),
            Ok(Err(error)) => Err(ClientError::host_call(name, error)),
            Err(_) => Err(ClientError::host_call(
                name,
                "channel closed before response",
            )),
        }
    }

    async fn send(&self, message: &WireMessage) -> Result<()> {
        send_message(&self.channel, message).await
    }

    async fn receive_frame(&self, frame: &[u8]) {
        let message = match serde_json::from_slice::<WireMessage>(frame) {
            Ok(message) => message,
            Err(_) => {
                debug!("{} ignoring unparseable frame", self.info().log_prefix());
                return;
            }
        };
        self.dispatch(message).await;
    }

    async fn dispatch(&self, message: WireMessage) {
        match message {
            WireMessage::RespData { req_id, data } => self.resolve(req_id, Ok(data)),
            WireMessage::RespErr { req_id, error } => self.resolve(req_id, Err(error)),
            WireMessage::Call { req_id, name, args } => {
                if !self.admits_inbound() {
                    debug!("dropping pre-ready call '{}'", name);
                    return;
                }
                let handler = self.impls.read().unwrap().get(&name).cloned();
                match handler {
                    Some(handler) => {
                        let channel = Arc::clone(&self.channel);
                        tokio::spawn(async move {
                            let reply = match handler(args).await {
                                Ok(data) => WireMessage::RespData { req_id, data },
                                Err(error) => WireMessage::RespErr { req_id, error },
                            };
                            if let Err(e) = send_message(&channel, &reply).await {
                                warn!("failed to answer host call: {}", e);
                            }
                        });
                    }
                    None => {
                        let reply = WireMessage::RespErr {
                            req_id,
                            error: format!("unknown endpoint: {}", name),
                        };
                        if let Err(e) = self.send(&reply).await {
                            warn!("failed to answer host call: {}", e);
                        }
                    }
                }
            }
            WireMessage::Custom { body } => {
                if !self.admits_inbound() {
                    debug!("dropping pre-ready notification");
                    return;
                }
                let subscribers = self.subscribers.read().unwrap().clone();
                for subscriber in subscribers {
                    subscriber(body.clone());
                }
            }
            // Widget-to-host direction only.
            WireMessage::Ready => {}
        }
    }

    fn resolve(&self, req_id: u64, result: CallResult) {
        let waiter = self.pending.lock().unwrap().remove(&req_id);
        match waiter {
            // Receiver may be gone if the caller gave up; nothing to do.
            Some(tx) => {
                let _ = tx.send(result);
            }
            None => debug!("response for unknown request {}", req_id),
        }
    }
}

async fn send_message(channel: &Arc<dyn MessageChannel>, message: &WireMessage) -> Result<()> {
    let frame = serde_json::to_vec(message)?;
    channel.send(Bytes::from(frame)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use std::sync::atomic::AtomicUsize;
    use transport::{worker, WorkerChannel};

    fn wire(frame: &Bytes) -> Value {
        serde_json::from_slice(frame).unwrap()
    }

    #[tokio::test]
    async fn test_call_round_trip() {
        let (widget_port, mut host_port) = worker::channel_pair();
        let rpc = Rpc::new(Arc::new(WorkerChannel::from_port(widget_port)));
        Arc::clone(&rpc).start();

        let pending = {
            let rpc = Arc::clone(&rpc);
            tokio::spawn(async move { rpc.call("mappings", Value::Null).await })
        };

        let sent = wire(&host_port.from_widget.recv().await.unwrap());
        assert_eq!(sent["mtype"], "call");
        assert_eq!(sent["name"], "mappings");
        let req_id = sent["reqId"].clone();

        let reply = serde_json::json!({
            "mtype": "respData", "reqId": req_id, "data": {"A": "colX"}
        });
        host_port
            .to_widget
            .send(Bytes::from(serde_json::to_vec(&reply).unwrap()))
            .unwrap();

        let data = pending.await.unwrap().unwrap();
        assert_eq!(data, serde_json::json!({"A": "colX"}));
    }

    #[tokio::test]
    async fn test_error_response() {
        let (widget_port, mut host_port) = worker::channel_pair();
        let rpc = Rpc::new(Arc::new(WorkerChannel::from_port(widget_port)));
        Arc::clone(&rpc).start();

        let pending = {
            let rpc = Arc::clone(&rpc);
            tokio::spawn(async move { rpc.call("configure", Value::Null).await })
        };

        let sent = wire(&host_port.from_widget.recv().await.unwrap());
        let reply = serde_json::json!({
            "mtype": "respErr", "reqId": sent["reqId"], "error": "rejected"
        });
        host_port
            .to_widget
            .send(Bytes::from(serde_json::to_vec(&reply).unwrap()))
            .unwrap();

        let err = pending.await.unwrap().unwrap_err();
        assert!(err.to_string().contains("rejected"));
    }

    #[tokio::test]
    async fn test_inbound_gated_until_process_incoming() {
        let (widget_port, host_port) = worker::channel_pair();
        let rpc = Rpc::new(Arc::new(WorkerChannel::from_port(widget_port)));
        Arc::clone(&rpc).start();

        let delivered = Arc::new(AtomicUsize::new(0));
        {
            let delivered = Arc::clone(&delivered);
            rpc.on_notification(move |_| {
                delivered.fetch_add(1, Ordering::SeqCst);
            });
        }

        let push = serde_json::json!({"mtype": "custom", "body": {"settings": {}}});
        let frame = Bytes::from(serde_json::to_vec(&push).unwrap());

        host_port.to_widget.send(frame.clone()).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(delivered.load(Ordering::SeqCst), 0);

        rpc.process_incoming();
        host_port.to_widget.send(frame).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        assert_eq!(delivered.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_registered_impl_answers_host_calls() {
        let (widget_port, mut host_port) = worker::channel_pair();
        let rpc = Rpc::new(Arc::new(WorkerChannel::from_port(widget_port)));
        Arc::clone(&rpc).start();
        rpc.register_impl("editOptions", |_args| async { Ok(Value::Null) }.boxed());
        rpc.process_incoming();

        let call = serde_json::json!({
            "mtype": "call", "reqId": 7, "name": "editOptions", "args": []
        });
        host_port
            .to_widget
            .send(Bytes::from(serde_json::to_vec(&call).unwrap()))
            .unwrap();

        let reply = wire(&host_port.from_widget.recv().await.unwrap());
        assert_eq!(reply["mtype"], "respData");
        assert_eq!(reply["reqId"], 7);

        let unknown = serde_json::json!({
            "mtype": "call", "reqId": 8, "name": "noSuchThing", "args": []
        });
        host_port
            .to_widget
            .send(Bytes::from(serde_json::to_vec(&unknown).unwrap()))
            .unwrap();

        let reply = wire(&host_port.from_widget.recv().await.unwrap());
        assert_eq!(reply["mtype"], "respErr");
    }
}
