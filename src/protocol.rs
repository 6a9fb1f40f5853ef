use crate::error::ClientResult;
use crate::types::*;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Insert the current song at `index` of the player's timeline
    Guess { index: usize },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        #[serde(default)]
        message: String,
        /// Set for the first player to join, who may start the game
        #[serde(default)]
        first_player: bool,
    },
    YourTurn {
        next_player: PlayerId,
        #[serde(default, deserialize_with = "lenient_songs")]
        song_list: Vec<Song>,
        #[serde(default, deserialize_with = "lenient_song")]
        new_song: Option<Song>,
        #[serde(default)]
        message: String,
    },
    GuessResult {
        player: PlayerId,
        result: GuessOutcome,
        #[serde(default)]
        message: String,
        #[serde(default, deserialize_with = "lenient_songs")]
        song_list: Vec<Song>,
        #[serde(default, deserialize_with = "lenient_song")]
        last_song: Option<Song>,
        #[serde(default, deserialize_with = "lenient_index")]
        last_index: Option<i64>,
    },
    /// Broadcast to everyone except the player who guessed
    OtherPlayerGuess {
        player: PlayerId,
        result: GuessOutcome,
        #[serde(default)]
        message: String,
        #[serde(default)]
        next_player: Option<PlayerId>,
    },
    TurnResult {
        player: PlayerId,
        #[serde(default)]
        message: String,
    },
    GameOver {
        winner: PlayerId,
        #[serde(default)]
        message: String,
    },
    Error {
        #[serde(default)]
        message: String,
    },
    #[serde(other)]
    Unknown,
}

impl ServerMessage {
    /// Decode one text frame
    pub fn parse(text: &str) -> ClientResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// `null` becomes an empty timeline and entries that are not song objects
/// are dropped.
fn lenient_songs<'de, D>(deserializer: D) -> Result<Vec<Song>, D::Error>
where
    D: Deserializer<'de>,
{
    let values = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(values
        .into_iter()
        .filter_map(|value| match serde_json::from_value(value) {
            Ok(song) => Some(song),
            Err(e) => {
                tracing::warn!("Dropping malformed song: {}", e);
                None
            }
        })
        .collect())
}

/// `{}` and partial objects decode with defaults; anything that is not an
/// object counts as missing.
fn lenient_song<'de, D>(deserializer: D) -> Result<Option<Song>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

/// The game server sends `last_index` as a string, so accept both
/// `1` and `"1"`. Anything unparseable counts as missing.
fn lenient_index<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IndexRepr {
        Int(i64),
        Text(String),
    }

    let repr = Option::<IndexRepr>::deserialize(deserializer)?;
    Ok(repr.and_then(|r| match r {
        IndexRepr::Int(i) => Some(i),
        IndexRepr::Text(s) => s.trim().parse().ok(),
    }))
}
