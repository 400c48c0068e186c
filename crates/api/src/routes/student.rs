//! Participant WebSocket Route
//!
//! One session per connection. Frames are read and classified strictly in
//! arrival order; replies go through a bounded queue drained by a single
//! writer, so the client sees them in the order they were produced.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use chrono::Local;
use frame_codec::{decode_base64_frame, decode_image_bytes, FrameError, VideoFrame};
use futures::{Sink, SinkExt, Stream, StreamExt};
use proctor::{perceive, Perception, Session, StatusPayload};
use std::fmt::Display;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::AppState;

/// An inbound frame as it arrived on the wire
#[derive(Debug, Clone)]
pub enum InboundFrame {
    /// base64 (optionally a data URL)
    Text(String),
    /// Raw encoded image bytes
    Binary(Vec<u8>),
}

impl InboundFrame {
    /// Frame payload of a WebSocket message; `None` for control messages
    pub fn from_message(message: Message) -> Option<Self> {
        match message {
            Message::Text(text) => Some(InboundFrame::Text(text)),
            Message::Binary(bytes) => Some(InboundFrame::Binary(bytes)),
            Message::Ping(_) | Message::Pong(_) | Message::Close(_) => None,
        }
    }

    pub fn decode(&self) -> Result<VideoFrame, FrameError> {
        match self {
            InboundFrame::Text(text) => decode_base64_frame(text),
            InboundFrame::Binary(bytes) => decode_image_bytes(bytes),
        }
    }
}

/// WebSocket upgrade handler
pub async fn student_ws(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket: WebSocket| async move {
        let (sink, stream) = socket.split();
        drive_session(stream, sink, state).await;
    })
}

/// Keeps the active-session count and gauge in step with live sessions
struct ActiveSession<'a>(&'a AppState);

impl<'a> ActiveSession<'a> {
    fn enter(state: &'a AppState) -> Self {
        state.active_sessions.fetch_add(1, Ordering::Relaxed);
        metrics::gauge!("smartsession_active_sessions").increment(1.0);
        Self(state)
    }
}

impl Drop for ActiveSession<'_> {
    fn drop(&mut self) {
        self.0.active_sessions.fetch_sub(1, Ordering::Relaxed);
        metrics::gauge!("smartsession_active_sessions").decrement(1.0);
    }
}

/// Run one participant session until the client disconnects.
///
/// Generic over the socket halves so the loop can be driven without a
/// real connection.
pub async fn drive_session<S, K, E>(mut stream: S, sink: K, state: Arc<AppState>)
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: Display,
    K: Sink<Message> + Unpin,
    K::Error: Display,
{
    let span = info_span!("session", id = %Uuid::new_v4());

    async move {
        let mut session = match Session::new(&state.proctor, Arc::clone(&state.oracle)) {
            Ok(session) => session,
            Err(e) => {
                error!("Failed to start session: {}", e);
                return;
            }
        };

        let _active = ActiveSession::enter(&state);
        info!("Student connected");

        let (tx, rx) = mpsc::channel::<StatusPayload>(state.outbound_queue.max(1));

        let reader = async {
            let tx = tx;
            let mut sequence = 0u64;

            while let Some(message) = stream.next().await {
                let message = match message {
                    Ok(message) => message,
                    Err(e) => {
                        debug!("Receive failed: {}", e);
                        break;
                    }
                };

                if let Message::Close(_) = message {
                    break;
                }
                let Some(inbound) = InboundFrame::from_message(message) else {
                    continue;
                };

                sequence += 1;
                let payload = classify(&mut session, inbound, sequence).await;

                if tx.send(payload).await.is_err() {
                    debug!("Outbound queue closed");
                    break;
                }
            }
        };

        tokio::join!(reader, write_payloads(sink, rx));

        info!(frames = session.frames_processed(), "Student disconnected");
    }
    .instrument(span)
    .await
}

/// Decode and perceive off the reactor, then classify in order
async fn classify(session: &mut Session, inbound: InboundFrame, sequence: u64) -> StatusPayload {
    let oracle = session.oracle();
    let outcome = tokio::task::spawn_blocking(move || {
        let frame = inbound.decode().map(|frame| frame.with_sequence(sequence));
        let decoded = frame.is_ok();
        (decoded, perceive(oracle.as_ref(), frame))
    })
    .await;

    // Counters are recorded here, not on the blocking thread
    let perception = match outcome {
        Ok((decoded, perception)) => {
            if !decoded {
                metrics::counter!("smartsession_decode_failures_total").increment(1);
            }
            perception
        }
        Err(e) => {
            warn!("Perception task failed on frame {}: {}", sequence, e);
            Perception::NoFrame
        }
    };

    let payload = session.apply(perception, Instant::now(), Local::now());
    metrics::counter!("smartsession_frames_total", "status" => payload.status.as_str()).increment(1);
    payload
}

/// Drain the outbound queue in order; stop quietly once the client is gone
async fn write_payloads<K>(mut sink: K, mut rx: mpsc::Receiver<StatusPayload>)
where
    K: Sink<Message> + Unpin,
    K::Error: Display,
{
    while let Some(payload) = rx.recv().await {
        let text = match serde_json::to_string(&payload) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to serialize status payload: {}", e);
                continue;
            }
        };

        if let Err(e) = sink.send(Message::Text(text)).await {
            debug!("Send failed, client gone: {}", e);
            break;
        }
    }

    // Dropping the receiver makes the reader stop at its next send
    rx.close();
    let _ = sink.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use image::{ImageFormat, Rgb, RgbImage};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use proctor::{LandmarkSet, ProctorConfig, ScriptedObservation, ScriptedOracle, StaticOracle};
    use serde_json::Value;
    use std::io::Cursor;

    fn png() -> Vec<u8> {
        let img = RgbImage::from_pixel(8, 6, Rgb([120, 90, 60]));
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn state(oracle: Arc<dyn proctor::PerceptionOracle>) -> Arc<AppState> {
        Arc::new(AppState::new(ProctorConfig::default(), oracle))
    }

    async fn run(messages: Vec<Message>, state: Arc<AppState>) -> Vec<Value> {
        let stream = futures::stream::iter(messages.into_iter().map(Ok::<_, std::io::Error>));
        let (sink, received) = futures::channel::mpsc::unbounded::<Message>();

        drive_session(stream, sink, state).await;

        received
            .filter_map(|m| async move {
                match m {
                    Message::Text(text) => Some(serde_json::from_str(&text).unwrap()),
                    _ => None,
                }
            })
            .collect()
            .await
    }

    #[tokio::test]
    async fn test_replies_in_order_with_history() {
        let oracle = ScriptedOracle::new([
            ScriptedObservation::Faces { count: 1, landmarks: Some(LandmarkSet::neutral()) },
            ScriptedObservation::Faces { count: 0, landmarks: None },
            ScriptedObservation::Faces { count: 2, landmarks: None },
        ]);
        let messages = vec![
            Message::Text(STANDARD.encode(png())),
            Message::Text("!!not-an-image!!".to_string()),
            Message::Ping(vec![1]),
            Message::Binary(png()),
            Message::Text(format!("data:image/png;base64,{}", STANDARD.encode(png()))),
        ];

        let replies = run(messages, state(Arc::new(oracle))).await;
        assert_eq!(replies.len(), 4);

        let statuses: Vec<(&str, Value)> = replies
            .iter()
            .map(|r| (r["status"].as_str().unwrap(), r["reason"].clone()))
            .collect();
        assert_eq!(statuses[0], ("FOCUSED", Value::from("CENTER")));
        assert_eq!(statuses[1], ("NO_FRAME", Value::Null));
        assert_eq!(statuses[2], ("PROCTOR_ALERT", Value::from("NO_FACE")));
        assert_eq!(statuses[3], ("PROCTOR_ALERT", Value::from("MULTIPLE_FACES")));

        for (i, reply) in replies.iter().enumerate() {
            let history = reply["history"].as_array().unwrap();
            assert_eq!(history.len(), i + 1);
            let last = history.last().unwrap();
            assert_eq!(last["status"], reply["status"]);
            assert_eq!(last.get("reason").cloned().unwrap_or(Value::Null), reply["reason"]);
            assert_eq!(last["time"].as_str().unwrap().len(), 8);
        }
    }

    #[tokio::test]
    async fn test_close_ends_session() {
        let messages = vec![
            Message::Binary(png()),
            Message::Close(None),
            Message::Binary(png()),
        ];
        let app = state(Arc::new(StaticOracle::attentive()));
        let replies = run(messages, Arc::clone(&app)).await;

        assert_eq!(replies.len(), 1);
        assert_eq!(app.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_history_is_bounded() {
        let messages = (0..60).map(|_| Message::Binary(png())).collect();
        let replies = run(messages, state(Arc::new(StaticOracle::new(0, None)))).await;

        assert_eq!(replies.len(), 60);
        let history = replies[59]["history"].as_array().unwrap();
        assert_eq!(history.len(), 50);
        assert!(history.iter().all(|e| e["reason"] == "NO_FACE"));
    }

    #[tokio::test]
    async fn test_gone_client_stops_reader() {
        let stream = futures::stream::iter((0..10).map(|_| Ok::<_, std::io::Error>(Message::Binary(png()))));
        let (sink, received) = futures::channel::mpsc::unbounded::<Message>();
        drop(received);

        let app = state(Arc::new(StaticOracle::attentive()));
        drive_session(stream, sink, Arc::clone(&app)).await;
        assert_eq!(app.active_sessions(), 0);
    }

    #[tokio::test]
    async fn test_single_slot_queue_keeps_every_reply() {
        let mut app = AppState::new(ProctorConfig::default(), Arc::new(StaticOracle::attentive()));
        app.outbound_queue = 1;

        let messages = (0..20).map(|_| Message::Binary(png())).collect();
        let replies = run(messages, Arc::new(app)).await;

        assert_eq!(replies.len(), 20);
        for (i, reply) in replies.iter().enumerate() {
            assert_eq!(reply["status"], "FOCUSED");
            assert_eq!(reply["history"].as_array().unwrap().len(), i + 1);
        }
    }

    #[test]
    fn test_frame_and_decode_failure_counters() {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        metrics::with_local_recorder(&recorder, || {
            runtime.block_on(async {
                let mut session =
                    Session::new(&ProctorConfig::default(), Arc::new(StaticOracle::attentive())).unwrap();
                let good = classify(&mut session, InboundFrame::Binary(png()), 1).await;
                let bad = classify(&mut session, InboundFrame::Text("!!bad".into()), 2).await;
                assert_eq!(good.status.as_str(), "FOCUSED");
                assert_eq!(bad.status.as_str(), "NO_FRAME");
            })
        });

        let rendered = handle.render();
        assert!(rendered.contains("smartsession_frames_total{status=\"FOCUSED\"} 1"), "{}", rendered);
        assert!(rendered.contains("smartsession_frames_total{status=\"NO_FRAME\"} 1"), "{}", rendered);
        assert!(rendered.contains("smartsession_decode_failures_total 1"), "{}", rendered);
    }

    #[test]
    fn test_control_messages_are_not_frames() {
        assert!(InboundFrame::from_message(Message::Pong(vec![])).is_none());
        assert!(InboundFrame::from_message(Message::Close(None)).is_none());
        assert!(matches!(
            InboundFrame::from_message(Message::Text("abc".into())),
            Some(InboundFrame::Text(_))
        ));
        assert!(InboundFrame::Text(String::new()).decode().is_err());
    }
}
