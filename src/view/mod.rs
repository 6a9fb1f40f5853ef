//! Rendering seam between the turn controller and whatever draws the game.

mod terminal;

pub use terminal::{Row, TerminalView};

use crate::types::Song;

/// Everything the controller needs from a display.
///
/// Calls are fire-and-forget; a view never feeds state back into the
/// controller. User input arrives separately as placement gestures.
pub trait TimelineView {
    /// Replace the displayed timeline. Drops any wrong-guess row.
    fn render_timeline(&mut self, songs: &[Song]);

    /// Show the song to place. `None` means the song is only known to the
    /// server (it is the one currently playing).
    fn show_prompt(&mut self, song: Option<&Song>);

    fn hide_prompt(&mut self);

    /// Toggle placement on both the timeline and the prompt
    fn set_drag_enabled(&mut self, enabled: bool);

    /// Insert a transient row for a wrong guess at `position`
    fn insert_wrong_guess(&mut self, position: usize, song: &Song);

    fn fade_wrong_guess(&mut self);

    fn remove_wrong_guess(&mut self);

    /// `is_local` is set when the local player won
    fn show_winner(&mut self, winner: &str, is_local: bool);

    /// Informational text (welcome, other players' moves, server errors)
    fn show_notice(&mut self, _text: &str) {}
}
