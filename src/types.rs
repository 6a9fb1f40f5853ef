use serde::{Deserialize, Serialize};
use std::fmt;

/// Players are identified by the username they connected with
pub type PlayerId = String;

/// Missing fields decode to empty values; the server is not strict about them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Song {
    pub title: String,
    pub artist: String,
    pub release_year: i32,
    pub album_cover_url: String,
}

impl Song {
    pub fn new(title: impl Into<String>, artist: impl Into<String>, release_year: i32) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            release_year,
            album_cover_url: String::new(),
        }
    }
}

impl fmt::Display for Song {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' by {} ({})", self.title, self.artist, self.release_year)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GuessOutcome {
    Correct,
    Wrong,
}

/// It is `next_player`'s turn to place a song on their timeline
#[derive(Debug, Clone, PartialEq)]
pub struct TurnNotification {
    pub next_player: PlayerId,
    pub song_list: Vec<Song>,
    /// The song to place. The server usually leaves this out because the
    /// prompt is whatever is currently playing.
    pub new_song: Option<Song>,
}

/// Outcome of a guess previously submitted by `player`
#[derive(Debug, Clone, PartialEq)]
pub struct GuessResult {
    pub player: PlayerId,
    pub outcome: GuessOutcome,
    pub message: String,
    pub song_list: Vec<Song>,
    pub last_song: Option<Song>,
    pub last_index: Option<i64>,
}
