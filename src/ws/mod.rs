pub mod handlers;

use futures::{
    sink::{Sink, SinkExt},
    stream::StreamExt,
};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::api::AdminClient;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::sync::{GuessSink, TurnSyncController};
use crate::view::TimelineView;
use handlers::Followup;

/// How a finished session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSummary {
    pub winner: Option<String>,
    pub guesses_sent: u32,
}

/// Connect and play until the game ends or the connection drops.
///
/// `gestures` delivers insertion indices chosen by the user. Inbound frames,
/// outbound guesses, gestures and the controller's timers are all handled
/// on this one task.
pub async fn run_session<V: TimelineView>(
    config: &ClientConfig,
    view: V,
    mut gestures: mpsc::Receiver<usize>,
) -> ClientResult<SessionSummary> {
    let username = config.require_username()?.to_string();
    let url = config.server.ws_url(&username, config.game_id.as_deref())?;

    tracing::info!("Connecting to {}", url);
    let (stream, _) = connect_async(url.as_str())
        .await
        .map_err(|e| ClientError::Connect(format!("{}: {}", url, e)))?;
    let (mut sender, mut receiver) = stream.split();
    tracing::info!("Connected as {}", username);

    let admin = if config.auto_start {
        Some(AdminClient::new(config.server.clone(), config.http_timeout)?)
    } else {
        None
    };

    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let mut ctrl = TurnSyncController::new(username, view, outbound_tx, config.timing);
    let mut gestures_open = true;
    let mut finished = false;
    let mut failure = None;

    loop {
        let deadline = ctrl.next_deadline();
        // Only polled when there is a deadline
        let wake_at = deadline
            .map(tokio::time::Instant::from_std)
            .unwrap_or_else(|| tokio::time::Instant::now() + Duration::from_secs(3600));

        tokio::select! {
            frame = receiver.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        match handlers::handle_text(&text, &mut ctrl, Instant::now()) {
                            Followup::Continue => {}
                            Followup::OfferStart => match &admin {
                                Some(admin) => {
                                    if let Err(e) = admin.start(config.game_id.as_deref()).await {
                                        tracing::error!("Failed to start game: {}", e);
                                        ctrl.view_mut()
                                            .show_notice(&format!("Failed to start game: {}", e));
                                    }
                                }
                                None => ctrl.view_mut().show_notice(
                                    "You joined first. Start the game with `trackback start`.",
                                ),
                            },
                            Followup::Finished => {
                                let _ = sender.send(Message::Close(None)).await;
                                finished = true;
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        tracing::info!("Connection to server closed");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                }
            }

            Some(msg) = outbound_rx.recv() => {
                if let Ok(json) = serde_json::to_string(&msg) {
                    tracing::debug!("Sending message: {}", json);
                    if let Err(e) = send_frame(&mut sender, Message::Text(json)).await {
                        tracing::error!("{}", e);
                        failure = Some(e);
                        break;
                    }
                }

                if config
                    .max_turns
                    .is_some_and(|max| ctrl.guesses_sent() >= max)
                {
                    tracing::info!("Max turns reached, leaving");
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                }
            }

            gesture = gestures.recv(), if gestures_open => {
                match gesture {
                    Some(index) => {
                        if let Err(e) = ctrl.on_guess_gesture(index) {
                            tracing::warn!("Guess not sent: {}", e);
                        }
                    }
                    None => {
                        tracing::debug!("Gesture source closed");
                        gestures_open = false;
                    }
                }
            }

            _ = tokio::time::sleep_until(wake_at), if deadline.is_some() => {
                ctrl.advance(Instant::now());
            }
        }
    }

    if finished {
        settle_timers(&mut ctrl).await;
    }
    ctrl.on_disconnect();

    if let Some(e) = failure {
        return Err(e);
    }

    Ok(SessionSummary {
        winner: ctrl.winner().map(str::to_string),
        guesses_sent: ctrl.guesses_sent(),
    })
}

async fn send_frame<S>(sender: &mut S, frame: Message) -> ClientResult<()>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    sender
        .send(frame)
        .await
        .map_err(|e| ClientError::Send(e.to_string()))
}

/// Let a wrong guess that is still on screen fade out after the game ended
async fn settle_timers<V: TimelineView, S: GuessSink>(ctrl: &mut TurnSyncController<V, S>) {
    while let Some(deadline) = ctrl.next_deadline() {
        tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
        ctrl.advance(Instant::now().max(deadline));
    }
}
