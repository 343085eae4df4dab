//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to core logic. We reply with a single JSON message per request.
//!
//! A connection owns exactly one study session; `restart` returns it to mode
//! selection and closing the socket abandons it.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::protocol::{ClientWsMessage, NextOut, ServerWsMessage};
use crate::logic::{self, ApiResult};
use crate::session::StudySession;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "tango_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "tango_backend", "WebSocket connected");
  let mut session = StudySession::new(state.store.clone(), state.samples.as_ref().clone(), state.study);

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "tango_backend", bytes = txt.len(), "WS message received");
            handle_client_ws(incoming, &state, &mut session).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "tango_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "tango_backend", phase = session.phase().as_str(), studied = session.words_studied().len(), "WebSocket disconnected");
}

fn or_error<T>(r: ApiResult<T>, ok: impl FnOnce(T) -> ServerWsMessage) -> ServerWsMessage {
  match r {
    Ok(v) => ok(v),
    Err(e) => ServerWsMessage::Error { message: e.message },
  }
}

#[instrument(level = "info", skip_all)]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState, session: &mut StudySession) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::Extract { text } => {
      let out = logic::do_extract(&text);
      ServerWsMessage::Pairs { pairs: out.pairs }
    }

    ClientWsMessage::Ocr { image_base64, mime } => or_error(
      logic::do_ocr(state, &image_base64, &mime).await,
      |o| ServerWsMessage::OcrResult { text: o.text, pairs: o.pairs },
    ),

    ClientWsMessage::StartStudy { mode } => {
      let r = logic::start_on(session, mode).await;
      tracing::info!(target: "study", mode = mode.as_str(), ok = r.is_ok(), "WS start_study");
      or_error(r, |quiz| ServerWsMessage::Quiz { quiz })
    }

    ClientWsMessage::SubmitAnswer { choice } => {
      let r = logic::answer_on(session, &choice).await;
      or_error(r, |result| ServerWsMessage::AnswerResult { result })
    }

    ClientWsMessage::Next => or_error(logic::next_on(session).await, |next| match next {
      NextOut::Next { quiz } => ServerWsMessage::Quiz { quiz },
      NextOut::Completed { summary } => ServerWsMessage::Completed { summary },
    }),

    ClientWsMessage::Restart => {
      session.restart();
      ServerWsMessage::Restarted
    }
  }
}
