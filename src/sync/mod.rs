//! Turn / guess synchronization
//!
//! [`TurnSyncController`] decides when a server-pushed turn is shown and
//! turns placement gestures into guess messages. The one rule it enforces:
//! a new guessing prompt never appears while the previous wrong guess is
//! still on screen. Turns that arrive in that window are parked in a
//! single slot where the latest one wins.
//!
//! The controller never sleeps. Every entry point takes the current
//! instant, fires whatever timers are due, and [`next_deadline`] tells the
//! caller when to come back.
//!
//! [`next_deadline`]: TurnSyncController::next_deadline

mod placement;
pub mod timer;

pub use placement::wrong_guess_position;
pub use timer::{TimerId, TimerQueue};

use crate::config::TimingConfig;
use crate::error::{ClientError, ClientResult};
use crate::protocol::ClientMessage;
use crate::types::*;
use crate::view::TimelineView;
use std::time::Instant;
use tokio::sync::mpsc;

/// Outbound half of the connection, as seen by the controller
pub trait GuessSink {
    fn submit(&mut self, msg: ClientMessage) -> ClientResult<()>;
}

impl GuessSink for mpsc::UnboundedSender<ClientMessage> {
    fn submit(&mut self, msg: ClientMessage) -> ClientResult<()> {
        self.send(msg).map_err(|_| ClientError::ChannelClosed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    Idle,
    /// Prompt shown, placement enabled
    AwaitingGuess,
    /// Guess sent, waiting for the result
    GuessSubmitted,
    /// A wrong guess is on screen and new turns are deferred
    ShowingWrongResult,
}

/// Period during which incoming turns are parked instead of shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuppressionWindow {
    pub opened_at: Instant,
    pub closes_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureOutcome {
    Submitted,
    /// Placement is disabled right now
    Ignored,
    OutOfRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerEvent {
    FadeWrongGuess,
    RemoveWrongGuess,
    LiftSuppression,
}

pub struct TurnSyncController<V, S> {
    local_player: PlayerId,
    view: V,
    sink: S,
    timing: TimingConfig,
    phase: TurnPhase,
    timeline: Vec<Song>,
    drag_enabled: bool,
    pending_turn: Option<TurnNotification>,
    suppression: Option<SuppressionWindow>,
    timers: TimerQueue<TimerEvent>,
    wrong_guess_timers: Vec<TimerId>,
    winner: Option<PlayerId>,
    closed: bool,
    guesses_sent: u32,
}

impl<V: TimelineView, S: GuessSink> TurnSyncController<V, S> {
    pub fn new(local_player: impl Into<PlayerId>, view: V, sink: S, timing: TimingConfig) -> Self {
        Self {
            local_player: local_player.into(),
            view,
            sink,
            timing,
            phase: TurnPhase::Idle,
            timeline: Vec::new(),
            drag_enabled: false,
            pending_turn: None,
            suppression: None,
            timers: TimerQueue::new(),
            wrong_guess_timers: Vec::new(),
            winner: None,
            closed: false,
            guesses_sent: 0,
        }
    }

    /// Show the turn now, or park it if a wrong guess is still on screen
    pub fn on_turn_notification(&mut self, turn: TurnNotification, now: Instant) {
        if self.closed {
            tracing::debug!("Ignoring turn notification after disconnect");
            return;
        }
        self.advance(now);

        if self.winner.is_some() {
            tracing::debug!("Ignoring turn notification after game over");
            return;
        }

        if self.suppression.is_some() {
            if self.pending_turn.replace(turn).is_some() {
                tracing::debug!("Replaced pending turn with a newer one");
            } else {
                tracing::debug!("Deferring turn until the wrong guess is gone");
            }
            return;
        }

        self.render_turn(turn);
    }

    pub fn on_guess_result(&mut self, result: GuessResult, now: Instant) {
        if self.closed {
            tracing::debug!("Ignoring guess result after disconnect");
            return;
        }
        self.advance(now);

        tracing::info!("Guess was {:?}: {}", result.outcome, result.message);

        self.view.hide_prompt();
        self.set_drag(false);
        self.timeline = result.song_list;
        self.view.render_timeline(&self.timeline);

        match result.outcome {
            GuessOutcome::Correct => {
                if self.suppression.is_none() {
                    self.phase = TurnPhase::Idle;
                }
            }
            GuessOutcome::Wrong => {
                self.show_wrong_guess(result.last_song.as_ref(), result.last_index, now)
            }
        }
    }

    /// The user placed the prompt song at `index`
    pub fn on_guess_gesture(&mut self, index: usize) -> ClientResult<GestureOutcome> {
        if self.closed {
            return Ok(GestureOutcome::Ignored);
        }
        if self.phase != TurnPhase::AwaitingGuess || !self.drag_enabled {
            tracing::debug!("Ignoring placement at {} while placement is disabled", index);
            let notice = if self.winner.is_some() {
                "The game is over."
            } else {
                "Wait for your turn."
            };
            self.view.show_notice(notice);
            return Ok(GestureOutcome::Ignored);
        }

        let len = self.timeline.len();
        if index > len {
            self.view.show_notice(&format!(
                "Invalid index. Please enter a number between 0 and {}.",
                len
            ));
            return Ok(GestureOutcome::OutOfRange);
        }

        self.set_drag(false);
        self.phase = TurnPhase::GuessSubmitted;

        if let Err(e) = self.sink.submit(ClientMessage::Guess { index }) {
            tracing::error!("Failed to send guess: {}", e);
            self.set_drag(true);
            self.phase = TurnPhase::AwaitingGuess;
            return Err(e);
        }

        self.guesses_sent += 1;
        tracing::info!("Submitted guess at index {}", index);
        Ok(GestureOutcome::Submitted)
    }

    pub fn on_game_over(&mut self, winner: PlayerId) {
        if self.closed {
            return;
        }

        tracing::info!("Game over, winner: {}", winner);
        self.view.hide_prompt();
        self.set_drag(false);
        if self.pending_turn.take().is_some() {
            tracing::debug!("Dropping pending turn at game over");
        }
        self.phase = TurnPhase::Idle;
        let is_local = winner == self.local_player;
        self.view.show_winner(&winner, is_local);
        self.winner = Some(winner);
    }

    /// The connection is gone. Nothing will happen after this.
    pub fn on_disconnect(&mut self) {
        if self.closed {
            return;
        }

        tracing::info!("Disconnected, turn controller is now inert");
        self.closed = true;
        self.timers.clear();
        self.wrong_guess_timers.clear();
        self.suppression = None;
        self.pending_turn = None;
        self.view.hide_prompt();
        self.set_drag(false);
        self.phase = TurnPhase::Idle;
    }

    /// Fire every timer due at `now`
    pub fn advance(&mut self, now: Instant) {
        while let Some((id, event)) = self.timers.pop_due(now) {
            self.wrong_guess_timers.retain(|t| *t != id);
            match event {
                TimerEvent::FadeWrongGuess => self.view.fade_wrong_guess(),
                TimerEvent::RemoveWrongGuess => self.view.remove_wrong_guess(),
                TimerEvent::LiftSuppression => self.lift_suppression(),
            }
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    fn render_turn(&mut self, turn: TurnNotification) {
        tracing::info!(
            "Turn for {} with {} songs on the timeline",
            turn.next_player,
            turn.song_list.len()
        );
        self.timeline = turn.song_list;
        self.view.render_timeline(&self.timeline);
        self.view.show_prompt(turn.new_song.as_ref());
        self.set_drag(true);
        self.phase = TurnPhase::AwaitingGuess;
    }

    fn show_wrong_guess(&mut self, last_song: Option<&Song>, last_index: Option<i64>, now: Instant) {
        if self.suppression.is_some() {
            tracing::warn!("Wrong guess result while the previous one is still shown");
            for id in self.wrong_guess_timers.drain(..) {
                self.timers.cancel(id);
            }
            self.view.remove_wrong_guess();
        }

        match last_song {
            Some(song) => {
                let position = wrong_guess_position(last_index, self.timeline.len());
                self.view.insert_wrong_guess(position, song);
            }
            None => tracing::warn!("Wrong guess result without last_song"),
        }

        let fade_at = now + self.timing.display;
        let closes_at = fade_at + self.timing.fade;
        self.wrong_guess_timers = vec![
            self.timers.schedule(fade_at, TimerEvent::FadeWrongGuess),
            self.timers.schedule(closes_at, TimerEvent::RemoveWrongGuess),
            self.timers.schedule(closes_at, TimerEvent::LiftSuppression),
        ];
        self.suppression = Some(SuppressionWindow {
            opened_at: now,
            closes_at,
        });
        self.phase = TurnPhase::ShowingWrongResult;
    }

    fn lift_suppression(&mut self) {
        self.suppression = None;
        match self.pending_turn.take() {
            Some(turn) => self.render_turn(turn),
            None => {
                if self.phase == TurnPhase::ShowingWrongResult {
                    self.phase = TurnPhase::Idle;
                }
            }
        }
    }

    fn set_drag(&mut self, enabled: bool) {
        self.drag_enabled = enabled;
        self.view.set_drag_enabled(enabled);
    }

    pub fn local_player(&self) -> &str {
        &self.local_player
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn timeline(&self) -> &[Song] {
        &self.timeline
    }

    pub fn drag_enabled(&self) -> bool {
        self.drag_enabled
    }

    pub fn pending_turn(&self) -> Option<&TurnNotification> {
        self.pending_turn.as_ref()
    }

    pub fn suppression(&self) -> Option<SuppressionWindow> {
        self.suppression
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppression.is_some()
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn guesses_sent(&self) -> u32 {
        self.guesses_sent
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }
}
