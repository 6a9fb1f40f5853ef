use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use trackback::config::TimingConfig;
use trackback::protocol::ClientMessage;
use trackback::sync::{GestureOutcome, TurnPhase, TurnSyncController};
use trackback::view::TerminalView;
use trackback::ws::handlers::{handle_text, Followup};

type Controller = TurnSyncController<TerminalView<Vec<u8>>, mpsc::UnboundedSender<ClientMessage>>;

fn setup(player: &str) -> (Controller, mpsc::UnboundedReceiver<ClientMessage>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let ctrl = TurnSyncController::new(
        player,
        TerminalView::new(Vec::new()),
        tx,
        TimingConfig::default(),
    );
    (ctrl, rx)
}

fn song_json(title: &str, year: i32) -> String {
    format!(
        r#"{{"title":"{}","artist":"Artist {}","release_year":{},"album_cover_url":""}}"#,
        title, title, year
    )
}

fn your_turn(player: &str, songs: &[(&str, i32)], new_song: Option<(&str, i32)>) -> String {
    let list: Vec<String> = songs.iter().map(|(t, y)| song_json(t, *y)).collect();
    let new_song = match new_song {
        Some((t, y)) => format!(r#","new_song":{}"#, song_json(t, y)),
        None => String::new(),
    };
    format!(
        r#"{{"type":"your_turn","message":"It's your turn!","next_player":"{}","song_list":[{}]{}}}"#,
        player,
        list.join(","),
        new_song
    )
}

/// Complete turn cycle: prompt, wrong placement, transient wrong guess,
/// deferred turn shown after the wrong guess disappears.
#[test]
fn test_wrong_guess_defers_next_turn() {
    let (mut ctrl, mut rx) = setup("alice");
    let start = Instant::now();

    // 1. Turn with [A, B] and C to place
    handle_text(
        &your_turn("alice", &[("A", 1970), ("B", 1990)], Some(("C", 2010))),
        &mut ctrl,
        start,
    );
    assert_eq!(ctrl.phase(), TurnPhase::AwaitingGuess);
    assert_eq!(ctrl.view().titles(), vec!["A", "B"]);
    assert_eq!(
        ctrl.view().prompt().flatten().map(|s| s.title.as_str()),
        Some("C")
    );
    assert!(ctrl.view().drag_enabled());

    // 2. User drags C between A and B
    assert_eq!(ctrl.on_guess_gesture(1).unwrap(), GestureOutcome::Submitted);
    assert_eq!(rx.try_recv().unwrap(), ClientMessage::Guess { index: 1 });
    assert!(!ctrl.view().drag_enabled());
    assert_eq!(
        serde_json::to_string(&ClientMessage::Guess { index: 1 }).unwrap(),
        r#"{"type":"guess","index":1}"#
    );

    // 3. Server says wrong
    let result = format!(
        r#"{{"type":"guess_result","player":"alice","result":"wrong","message":"Wrong! Song was 'C' by Artist C (2010).","song_list":[{},{}],"last_song":{},"last_index":"1","game_over":false,"winner":""}}"#,
        song_json("A", 1970),
        song_json("B", 1990),
        song_json("C", 2010)
    );
    handle_text(&result, &mut ctrl, start);
    assert_eq!(ctrl.phase(), TurnPhase::ShowingWrongResult);
    assert_eq!(ctrl.view().titles(), vec!["A", "C", "B"]);
    assert!(ctrl.view().prompt().is_none());

    // 4. Next turn arrives while the wrong guess is still shown
    let during = start + Duration::from_millis(1200);
    handle_text(
        &your_turn("alice", &[("A", 1970), ("B", 1990)], Some(("D", 1980))),
        &mut ctrl,
        during,
    );
    assert!(ctrl.pending_turn().is_some());
    assert_eq!(ctrl.view().titles(), vec!["A", "C", "B"]);
    assert!(!ctrl.view().drag_enabled());

    // 5. Still visible right before the display time is over
    ctrl.advance(start + Duration::from_millis(2999));
    assert!(ctrl.view().wrong_guess().is_some());
    assert!(ctrl.pending_turn().is_some());

    // 6. Removed after display + fade, then the parked turn shows up
    ctrl.advance(start + Duration::from_millis(4000));
    assert!(ctrl.view().wrong_guess().is_none());
    assert!(ctrl.pending_turn().is_none());
    assert_eq!(ctrl.view().titles(), vec!["A", "B"]);
    assert_eq!(
        ctrl.view().prompt().flatten().map(|s| s.title.as_str()),
        Some("D")
    );
    assert_eq!(ctrl.phase(), TurnPhase::AwaitingGuess);
    assert!(ctrl.view().drag_enabled());

    // 7. And the next guess goes out as usual
    assert_eq!(ctrl.on_guess_gesture(1).unwrap(), GestureOutcome::Submitted);
    assert_eq!(rx.try_recv().unwrap(), ClientMessage::Guess { index: 1 });
}

#[test]
fn test_only_latest_deferred_turn_is_shown() {
    let (mut ctrl, _rx) = setup("alice");
    let start = Instant::now();

    handle_text(&your_turn("alice", &[("A", 1970)], None), &mut ctrl, start);
    ctrl.on_guess_gesture(0).unwrap();
    handle_text(
        &format!(
            r#"{{"type":"guess_result","player":"alice","result":"wrong","message":"Wrong!","song_list":[{}],"last_song":{},"last_index":0}}"#,
            song_json("A", 1970),
            song_json("Z", 2020)
        ),
        &mut ctrl,
        start,
    );

    for (i, title) in ["first", "second", "third"].iter().enumerate() {
        handle_text(
            &your_turn("alice", &[(*title, 2000)], None),
            &mut ctrl,
            start + Duration::from_millis(100 * (i as u64 + 1)),
        );
    }
    // Somebody else's turn does not touch the slot
    handle_text(&your_turn("bob", &[("bob's", 2000)], None), &mut ctrl, start);

    ctrl.advance(start + Duration::from_secs(4));
    assert_eq!(ctrl.view().titles(), vec!["third"]);
    assert!(ctrl.pending_turn().is_none());
    assert!(ctrl.next_deadline().is_none());
}

#[test]
fn test_correct_guess_flow() {
    let (mut ctrl, mut rx) = setup("alice");
    let now = Instant::now();

    handle_text(&your_turn("alice", &[("A", 1970)], None), &mut ctrl, now);
    ctrl.on_guess_gesture(1).unwrap();
    assert_eq!(rx.try_recv().unwrap(), ClientMessage::Guess { index: 1 });

    handle_text(
        &format!(
            r#"{{"type":"guess_result","player":"alice","result":"correct","message":"Correct!","song_list":[{},{}],"last_song":{},"last_index":"1"}}"#,
            song_json("A", 1970),
            song_json("B", 1999),
            song_json("B", 1999)
        ),
        &mut ctrl,
        now,
    );

    assert_eq!(ctrl.phase(), TurnPhase::Idle);
    assert!(!ctrl.is_suppressed());
    assert!(ctrl.next_deadline().is_none());
    assert_eq!(ctrl.view().titles(), vec!["A", "B"]);

    // Next turn renders right away
    handle_text(
        &your_turn("alice", &[("A", 1970), ("B", 1999)], None),
        &mut ctrl,
        now,
    );
    assert_eq!(ctrl.phase(), TurnPhase::AwaitingGuess);
    assert!(ctrl.pending_turn().is_none());
}

#[test]
fn test_wrong_guess_with_out_of_range_index_is_appended() {
    let (mut ctrl, _rx) = setup("alice");
    let now = Instant::now();

    handle_text(
        &your_turn("alice", &[("A", 1970), ("B", 1990)], None),
        &mut ctrl,
        now,
    );
    ctrl.on_guess_gesture(2).unwrap();
    handle_text(
        &format!(
            r#"{{"type":"guess_result","player":"alice","result":"wrong","message":"Wrong!","song_list":[{},{}],"last_song":{},"last_index":"9"}}"#,
            song_json("A", 1970),
            song_json("B", 1990),
            song_json("C", 1950)
        ),
        &mut ctrl,
        now,
    );

    assert_eq!(ctrl.view().titles(), vec!["A", "B", "C"]);
    assert_eq!(ctrl.view().wrong_guess().map(|(i, _)| i), Some(2));
}

#[test]
fn test_no_guess_while_drag_disabled() {
    let (mut ctrl, mut rx) = setup("alice");
    let now = Instant::now();

    assert_eq!(ctrl.on_guess_gesture(0).unwrap(), GestureOutcome::Ignored);

    handle_text(&your_turn("alice", &[], None), &mut ctrl, now);
    assert_eq!(ctrl.on_guess_gesture(0).unwrap(), GestureOutcome::Submitted);
    assert_eq!(ctrl.on_guess_gesture(0).unwrap(), GestureOutcome::Ignored);
    assert_eq!(ctrl.on_guess_gesture(0).unwrap(), GestureOutcome::Ignored);

    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err());
    assert_eq!(ctrl.guesses_sent(), 1);
}

#[test]
fn test_game_over_ends_the_game() {
    let (mut ctrl, _rx) = setup("alice");
    let now = Instant::now();

    handle_text(&your_turn("alice", &[("A", 1970)], None), &mut ctrl, now);
    let followup = handle_text(
        r#"{"type":"game_over","winner":"alice","message":"alice has won the game!"}"#,
        &mut ctrl,
        now,
    );

    assert_eq!(followup, Followup::Finished);
    assert_eq!(ctrl.winner(), Some("alice"));
    assert!(ctrl.view().prompt().is_none());
    assert!(!ctrl.view().drag_enabled());
    assert_eq!(ctrl.on_guess_gesture(0).unwrap(), GestureOutcome::Ignored);
}
