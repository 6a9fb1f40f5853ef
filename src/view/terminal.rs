use super::TimelineView;
use crate::types::Song;
use std::io::Write;

#[derive(Debug, Clone, PartialEq)]
pub enum Row {
    Song(Song),
    /// Transient entry for a song that was placed wrongly
    WrongGuess { song: Song, fading: bool },
}

impl Row {
    pub fn song(&self) -> &Song {
        match self {
            Row::Song(song) => song,
            Row::WrongGuess { song, .. } => song,
        }
    }
}

/// Line-oriented view for terminals.
///
/// Keeps a model of what is on screen (so it can be inspected) and reprints
/// the whole timeline whenever it changes.
pub struct TerminalView<W: Write> {
    out: W,
    rows: Vec<Row>,
    prompt: Option<Option<Song>>,
    drag_enabled: bool,
    winner: Option<String>,
    notices: Vec<String>,
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            rows: Vec::new(),
            prompt: None,
            drag_enabled: false,
            winner: None,
            notices: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn titles(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.song().title.as_str()).collect()
    }

    pub fn wrong_guess(&self) -> Option<(usize, &Row)> {
        self.rows
            .iter()
            .enumerate()
            .find(|(_, r)| matches!(r, Row::WrongGuess { .. }))
    }

    /// `Some(None)` is a prompt for the song that is currently playing
    pub fn prompt(&self) -> Option<Option<&Song>> {
        self.prompt.as_ref().map(|p| p.as_ref())
    }

    pub fn drag_enabled(&self) -> bool {
        self.drag_enabled
    }

    pub fn winner(&self) -> Option<&str> {
        self.winner.as_deref()
    }

    pub fn notices(&self) -> &[String] {
        &self.notices
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    fn print_timeline(&mut self) {
        // Output is best effort; a closed stdout must not take the game down.
        let _ = writeln!(self.out, "\nYour timeline:");
        if self.rows.is_empty() {
            let _ = writeln!(self.out, "  (empty)");
        }
        for (i, row) in self.rows.iter().enumerate() {
            let song = row.song();
            let marker = match row {
                Row::Song(_) => "",
                Row::WrongGuess { fading: false, .. } => "  <- wrong",
                Row::WrongGuess { fading: true, .. } => "  <- wrong (fading)",
            };
            let _ = writeln!(
                self.out,
                "  [{}] {} | '{}' by {}{}",
                i, song.release_year, song.title, song.artist, marker
            );
        }
        let _ = self.out.flush();
    }
}

impl<W: Write> TimelineView for TerminalView<W> {
    fn render_timeline(&mut self, songs: &[Song]) {
        self.rows = songs.iter().cloned().map(Row::Song).collect();
        self.print_timeline();
    }

    fn show_prompt(&mut self, song: Option<&Song>) {
        self.prompt = Some(song.cloned());
        let what = match song {
            Some(song) => song.to_string(),
            None => "the song that is playing".to_string(),
        };
        let _ = writeln!(
            self.out,
            "It's your turn! Where does {} go? Index [0-{}]: ",
            what,
            self.rows.len()
        );
        let _ = self.out.flush();
    }

    fn hide_prompt(&mut self) {
        self.prompt = None;
    }

    fn set_drag_enabled(&mut self, enabled: bool) {
        self.drag_enabled = enabled;
    }

    fn insert_wrong_guess(&mut self, position: usize, song: &Song) {
        let row = Row::WrongGuess {
            song: song.clone(),
            fading: false,
        };
        if position < self.rows.len() {
            self.rows.insert(position, row);
        } else {
            self.rows.push(row);
        }
        self.print_timeline();
    }

    fn fade_wrong_guess(&mut self) {
        for row in &mut self.rows {
            if let Row::WrongGuess { fading, .. } = row {
                *fading = true;
            }
        }
    }

    fn remove_wrong_guess(&mut self) {
        let before = self.rows.len();
        self.rows.retain(|r| matches!(r, Row::Song(_)));
        if self.rows.len() != before {
            self.print_timeline();
        }
    }

    fn show_winner(&mut self, winner: &str, is_local: bool) {
        self.winner = Some(winner.to_string());
        if is_local {
            let _ = writeln!(self.out, "\nGame over! You win!");
        } else {
            let _ = writeln!(self.out, "\nGame over! {} won the game.", winner);
        }
        let _ = self.out.flush();
    }

    fn show_notice(&mut self, text: &str) {
        self.notices.push(text.to_string());
        let _ = writeln!(self.out, "{}", text);
        let _ = self.out.flush();
    }
}
