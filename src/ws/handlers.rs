//! Server message dispatch
//!
//! Routes each inbound message to the turn controller. Turns and guess
//! results are only handled when they concern the local player; everything
//! else is informational.

use crate::protocol::ServerMessage;
use crate::sync::{GuessSink, TurnSyncController};
use crate::types::{GuessOutcome, GuessResult, TurnNotification};
use crate::view::TimelineView;
use std::time::Instant;

/// What the session loop should do after a message was handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Followup {
    Continue,
    /// We joined first and may start the game
    OfferStart,
    Finished,
}

/// Decode and handle one text frame. Malformed frames are logged and skipped.
pub fn handle_text<V, S>(text: &str, ctrl: &mut TurnSyncController<V, S>, now: Instant) -> Followup
where
    V: TimelineView,
    S: GuessSink,
{
    tracing::debug!("Received message: {}", text);

    match ServerMessage::parse(text) {
        Ok(msg) => handle_message(msg, ctrl, now),
        Err(e) => {
            tracing::warn!("Skipping malformed server message: {}", e);
            Followup::Continue
        }
    }
}

pub fn handle_message<V, S>(
    msg: ServerMessage,
    ctrl: &mut TurnSyncController<V, S>,
    now: Instant,
) -> Followup
where
    V: TimelineView,
    S: GuessSink,
{
    match msg {
        ServerMessage::Welcome {
            message,
            first_player,
        } => {
            tracing::info!("Welcome: {}", message);
            ctrl.view_mut().show_notice(&message);
            if first_player {
                Followup::OfferStart
            } else {
                Followup::Continue
            }
        }

        ServerMessage::YourTurn {
            next_player,
            song_list,
            new_song,
            ..
        } => {
            if next_player != ctrl.local_player() {
                tracing::debug!("Turn for {} is not ours", next_player);
                return Followup::Continue;
            }
            ctrl.on_turn_notification(
                TurnNotification {
                    next_player,
                    song_list,
                    new_song,
                },
                now,
            );
            Followup::Continue
        }

        ServerMessage::GuessResult {
            player,
            result,
            message,
            song_list,
            last_song,
            last_index,
        } => {
            if player != ctrl.local_player() {
                tracing::debug!("Guess result for {} is not ours", player);
                return Followup::Continue;
            }
            let label = match result {
                GuessOutcome::Correct => "correct",
                GuessOutcome::Wrong => "wrong",
            };
            ctrl.view_mut()
                .show_notice(&format!("Result: {} - {}", label, message));
            ctrl.on_guess_result(
                GuessResult {
                    player,
                    outcome: result,
                    message,
                    song_list,
                    last_song,
                    last_index,
                },
                now,
            );
            Followup::Continue
        }

        ServerMessage::OtherPlayerGuess {
            player, message, ..
        } => {
            tracing::info!("{} guessed: {}", player, message);
            ctrl.view_mut().show_notice(&message);
            Followup::Continue
        }

        ServerMessage::TurnResult { player, message } => {
            tracing::info!("{} made a move: {}", player, message);
            ctrl.view_mut()
                .show_notice(&format!("{} made a move: {}", player, message));
            Followup::Continue
        }

        ServerMessage::GameOver { winner, .. } => {
            ctrl.on_game_over(winner);
            Followup::Finished
        }

        ServerMessage::Error { message } => {
            tracing::warn!("Server error: {}", message);
            ctrl.view_mut().show_notice(&format!("Error: {}", message));
            Followup::Continue
        }

        ServerMessage::Unknown => {
            tracing::debug!("Ignoring unhandled message type");
            Followup::Continue
        }
    }
}
