//! Shared test harness: a scripted host on the far side of an in-process
//! worker channel.

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use transport::{worker, WorkerChannel};
use widget_client::WidgetClient;

/// Messages the widget sent to the host, surfaced for assertions.
#[derive(Debug, Clone)]
pub enum HostEvent {
    Ready,
    Call { name: String, args: Value },
}

/// Scripted answers for widget-initiated calls.
pub type Responder =
    Arc<dyn Fn(String, Value) -> BoxFuture<'static, Result<Value, String>> + Send + Sync>;

/// Wrap a synchronous answer function into a [`Responder`].
pub fn respond_with(
    f: impl Fn(&str, Value) -> Result<Value, String> + Send + Sync + 'static,
) -> Responder {
    Arc::new(move |name, args| {
        let result = f(&name, args);
        async move { result }.boxed()
    })
}

pub struct HostHarness {
    pub to_widget: mpsc::UnboundedSender<Bytes>,
    pub events: mpsc::UnboundedReceiver<HostEvent>,
}

impl HostHarness {
    /// Start a scripted host and attach a client over an in-process
    /// worker channel pair.
    pub fn start(responder: Responder) -> (Self, WidgetClient) {
        let (widget_port, host_port) = worker::channel_pair();
        let client = WidgetClient::attach(Arc::new(WorkerChannel::from_port(widget_port)));

        let (event_tx, events) = mpsc::unbounded_channel();
        let to_widget = host_port.to_widget;
        let mut from_widget = host_port.from_widget;

        {
            let to_widget = to_widget.clone();
            tokio::spawn(async move {
                while let Some(frame) = from_widget.recv().await {
                    let Ok(message) = serde_json::from_slice::<Value>(&frame) else {
                        continue;
                    };
                    match message["mtype"].as_str() {
                        Some("ready") => {
                            let _ = event_tx.send(HostEvent::Ready);
                        }
                        Some("call") => {
                            let name =
                                message["name"].as_str().unwrap_or_default().to_string();
                            let args = message["args"].clone();
                            let req_id = message["reqId"].clone();
                            let _ = event_tx.send(HostEvent::Call {
                                name: name.clone(),
                                args: args.clone(),
                            });

                            let responder = Arc::clone(&responder);
                            let to_widget = to_widget.clone();
                            tokio::spawn(async move {
                                let reply = match responder(name, args).await {
                                    Ok(data) => json!({
                                        "mtype": "respData", "reqId": req_id, "data": data
                                    }),
                                    Err(error) => json!({
                                        "mtype": "respErr", "reqId": req_id, "error": error
                                    }),
                                };
                                let _ = to_widget
                                    .send(Bytes::from(serde_json::to_vec(&reply).unwrap()));
                            });
                        }
                        _ => {}
                    }
                }
            });
        }

        (Self { to_widget, events }, client)
    }

    /// Push a notification to the widget.
    pub fn notify(&self, body: Value) {
        let frame = json!({"mtype": "custom", "body": body});
        self.to_widget
            .send(Bytes::from(serde_json::to_vec(&frame).unwrap()))
            .unwrap();
    }

    /// Invoke a callable the widget registered.
    pub fn call_widget(&self, req_id: u64, name: &str, args: Value) {
        let frame = json!({"mtype": "call", "reqId": req_id, "name": name, "args": args});
        self.to_widget
            .send(Bytes::from(serde_json::to_vec(&frame).unwrap()))
            .unwrap();
    }

    pub async fn next_event(&mut self) -> HostEvent {
        recv(&mut self.events).await
    }
}

/// Receive with a test-failure timeout.
pub async fn recv<T>(rx: &mut mpsc::UnboundedReceiver<T>) -> T {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for message")
        .expect("channel closed")
}
