//! Placement gestures from the terminal: the user types the index where the
//! current song should go.

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Parse one line of input as an insertion index
pub fn parse_gesture(line: &str) -> Option<usize> {
    line.trim().parse().ok()
}

/// Forward indices typed on stdin until stdin closes or the receiver is dropped
pub fn spawn_stdin_gestures() -> mpsc::Receiver<usize> {
    let (tx, rx) = mpsc::channel(8);

    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_gesture(&line) {
                        Some(index) => {
                            if tx.send(index).await.is_err() {
                                break;
                            }
                        }
                        None => eprintln!("Please enter a valid number."),
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
        tracing::debug!("Stdin gesture reader finished");
    });

    rx
}
