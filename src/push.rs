use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::{
    error::ClientResult,
    protocol::{Envelope, LoginPayload, PushEvent},
};

/// Receives server-pushed events.
///
/// What a pushed state should do to the held snapshot (replace or merge) is not
/// settled, so nothing here touches it. The default methods only log.
pub trait PushHandler: Send + Sync {
    fn on_full(&self, payload: &Value) {
        debug!(%payload, "client full");
    }

    fn on_update(&self, patch: &Value) {
        debug!(%patch, "client update");
    }

    fn on_error(&self, message: &str) {
        warn!("push channel error: {}", message);
    }

    fn on_other(&self, event: &str, _data: &Value) {
        debug!(event, "ignoring unknown push event");
    }
}

/// 로그만 남기는 기본 핸들러
#[derive(Debug, Clone, Default)]
pub struct LoggingPushHandler;

impl PushHandler for LoggingPushHandler {}

pub fn dispatch(handler: &dyn PushHandler, event: PushEvent) {
    match event {
        PushEvent::Full(payload) => handler.on_full(&payload),
        PushEvent::Update(patch) => handler.on_update(&patch),
        PushEvent::Error(message) => handler.on_error(&message),
        PushEvent::Other { event, data } => handler.on_other(&event, &data),
    }
}

/// Open real-time connection. Closed when stopped or dropped.
pub struct PushChannel {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PushChannel {
    pub async fn connect(
        ws_url: &Url,
        login: LoginPayload,
        handler: Arc<dyn PushHandler>,
    ) -> ClientResult<Self> {
        let (ws_stream, _) = connect_async(ws_url.as_str()).await?;
        info!(url = %ws_url, game = %login.game, "push channel connected");

        let (mut sink, mut stream) = ws_stream.split();
        let login = serde_json::to_string(&Envelope::login(&login)?)?;
        sink.send(Message::Text(login)).await?;

        let token = CancellationToken::new();
        let child = token.child_token();

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = child.cancelled() => {
                        let _ = sink.send(Message::Close(None)).await;
                        break;
                    }
                    msg = stream.next() => match msg {
                        Some(Ok(Message::Text(text))) => {
                            match serde_json::from_str::<Envelope>(&text) {
                                Ok(envelope) => dispatch(handler.as_ref(), envelope.into()),
                                Err(e) => warn!("Failed to parse push message: {} - {}", e, text),
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            let _ = sink.send(Message::Pong(data)).await;
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            info!("push channel closed by server");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            error!("push channel read error: {}", e);
                            break;
                        }
                    }
                }
            }
        });

        Ok(Self {
            token,
            task: Some(task),
        })
    }

    pub fn is_open(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished()) && !self.token.is_cancelled()
    }

    pub fn stop(&mut self) {
        self.token.cancel();
    }

    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{EVENT_CLIENT_UPDATE, EVENT_ERROR};
    use parking_lot::Mutex;
    use serde_json::json;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    impl PushHandler for Recorder {
        fn on_full(&self, _payload: &Value) {
            self.seen.lock().push("full".into());
        }
        fn on_update(&self, _patch: &Value) {
            self.seen.lock().push("update".into());
        }
        fn on_error(&self, message: &str) {
            self.seen.lock().push(format!("error:{}", message));
        }
    }

    #[test]
    fn dispatches_by_event_name() {
        let recorder = Recorder::default();
        dispatch(&recorder, PushEvent::Full(json!({})));
        dispatch(
            &recorder,
            Envelope {
                event: EVENT_CLIENT_UPDATE.into(),
                data: json!("[]"),
            }
            .into(),
        );
        dispatch(
            &recorder,
            Envelope {
                event: EVENT_ERROR.into(),
                data: json!("User does not exist"),
            }
            .into(),
        );
        dispatch(
            &recorder,
            PushEvent::Other {
                event: "noise".into(),
                data: Value::Null,
            },
        );

        assert_eq!(
            *recorder.seen.lock(),
            vec!["full", "update", "error:User does not exist"]
        );
    }
}
