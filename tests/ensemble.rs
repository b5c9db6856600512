//! Linked devices: synchronized onset, group stop and link rules

use pianola::messaging::NotificationConsumer;
use pianola::sequencer::PlaybackState;
use pianola::{
    CommandRequest, CommandTable, Config, DeviceId, InvalidTransition, Notification,
    NotificationKind, SequencerError, Stage,
};
use ringbuf::traits::Consumer;

fn stage() -> (Stage, NotificationConsumer) {
    Stage::with_virtual_clock(Config::default()).unwrap()
}

fn drain(rx: &mut NotificationConsumer) -> Vec<Notification> {
    std::iter::from_fn(|| rx.try_pop()).collect()
}

fn first_dispatch(notifications: &[Notification], device: DeviceId) -> Option<f64> {
    notifications
        .iter()
        .find(|n| n.device == device && n.is_dispatch())
        .map(|n| n.at)
}

#[test]
fn test_linked_devices_start_together() {
    let (mut stage, mut rx) = stage();
    let a = stage.add_device();
    let b = stage.add_device();
    stage.set_notes(a, "C4 D4").unwrap();
    stage.set_notes(b, "E5:2 G5").unwrap();
    stage.set_timing(b, 0.2).unwrap();
    stage.link(a, b).unwrap();

    stage.advance_to(1.0);
    stage.play(a).unwrap();
    assert_eq!(stage.device(b).unwrap().state(), PlaybackState::Playing);
    stage.advance_to(5.0);

    let notifications = drain(&mut rx);
    assert_eq!(first_dispatch(&notifications, a), Some(1.0));
    assert_eq!(first_dispatch(&notifications, b), Some(1.0));

    // Each member keeps its own notes
    let b_pitches: Vec<String> = notifications
        .iter()
        .filter(|n| n.device == b)
        .filter_map(|n| match &n.kind {
            NotificationKind::NoteDispatched { pitch, .. } => Some(pitch.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(b_pitches, vec!["E5".to_string(), "G5".to_string()]);
}

#[test]
fn test_links_are_symmetric_and_transitive() {
    let (mut stage, _rx) = stage();
    let a = stage.add_device();
    let b = stage.add_device();
    let c = stage.add_device();
    stage.link(a, b).unwrap();
    stage.link(c, b).unwrap();

    assert!(stage.peers_of(b).contains(&a));
    assert!(stage.peers_of(a).contains(&b));
    assert!(!stage.peers_of(a).contains(&c));
    assert_eq!(stage.ensemble_of(a), vec![a, b, c]);

    for id in [a, b, c] {
        stage.set_notes(id, "C4 D4 E4").unwrap();
    }
    stage.play(c).unwrap();
    for id in [a, b, c] {
        assert_eq!(stage.device(id).unwrap().state(), PlaybackState::Playing);
    }
}

#[test]
fn test_unplayable_peer_is_skipped() {
    let (mut stage, _rx) = stage();
    let a = stage.add_device();
    let empty = stage.add_device();
    let c = stage.add_device();
    stage.set_notes(a, "C4").unwrap();
    stage.set_notes(c, "G4").unwrap();
    stage.link(a, empty).unwrap();
    stage.link(a, c).unwrap();

    stage.play(a).unwrap();
    assert_eq!(stage.device(empty).unwrap().state(), PlaybackState::Idle);
    assert_eq!(stage.device(c).unwrap().state(), PlaybackState::Playing);
}

#[test]
fn test_unplayable_conductor_fails_the_group() {
    let (mut stage, _rx) = stage();
    let a = stage.add_device();
    let b = stage.add_device();
    stage.set_notes(b, "C4").unwrap();
    stage.link(a, b).unwrap();

    assert!(matches!(stage.play(a), Err(SequencerError::NotPlayable(_))));
    assert_eq!(stage.device(b).unwrap().state(), PlaybackState::Idle);
}

#[test]
fn test_stop_reaches_the_whole_group() {
    let (mut stage, _rx) = stage();
    let a = stage.add_device();
    let b = stage.add_device();
    stage.set_notes(a, "C4 D4 E4 F4").unwrap();
    stage.set_notes(b, "C4 D4 E4 F4").unwrap();
    stage.link(a, b).unwrap();
    stage.play(a).unwrap();
    stage.advance_to(0.1);

    stage.stop(b).unwrap();
    stage.advance_to(0.6);
    assert_eq!(stage.device(a).unwrap().state(), PlaybackState::Idle);
    assert_eq!(stage.device(b).unwrap().state(), PlaybackState::Idle);
}

#[test]
fn test_linking_while_playing_is_rejected() {
    let (mut stage, _rx) = stage();
    let a = stage.add_device();
    let b = stage.add_device();
    stage.set_notes(a, "C4 D4").unwrap();
    stage.play(a).unwrap();

    assert_eq!(
        stage.link(a, b),
        Err(InvalidTransition::Busy("link").into())
    );
    assert_eq!(
        stage.link(b, a),
        Err(InvalidTransition::Busy("link").into())
    );
    assert!(stage.peers_of(a).is_empty());
    assert!(stage.peers_of(b).is_empty());
}

#[test]
fn test_unlink_needs_idle_peers() {
    let (mut stage, _rx) = stage();
    let a = stage.add_device();
    let b = stage.add_device();
    stage.set_notes(b, "C4 D4").unwrap();
    stage.link(a, b).unwrap();
    stage.play(b).unwrap();

    assert!(stage.unlink(a).is_err());
    assert!(stage.peers_of(a).contains(&b));

    stage.advance_to(5.0);
    stage.unlink(a).unwrap();
    assert!(stage.peers_of(a).is_empty());
    assert!(stage.peers_of(b).is_empty());
}

#[test]
fn test_max_peers_caps_links() {
    let config = Config {
        max_peers: Some(1),
        ..Config::default()
    };
    let (mut stage, _rx) = Stage::with_virtual_clock(config).unwrap();
    let a = stage.add_device();
    let b = stage.add_device();
    let c = stage.add_device();
    stage.link(a, b).unwrap();

    assert!(matches!(
        stage.link(c, a),
        Err(SequencerError::LinkRejected(_))
    ));
    assert!(stage.peers_of(c).is_empty());
}

#[test]
fn test_pairing_needs_an_armed_target() {
    let (mut stage, mut rx) = stage();
    let a = stage.add_device();
    let b = stage.add_device();

    assert!(matches!(stage.pair(a, b), Err(SequencerError::LinkRejected(_))));

    stage.arm_autolink(b).unwrap();
    stage.pair(a, b).unwrap();
    assert!(stage.peers_of(b).contains(&a));
    assert!(!stage.snapshot(b).unwrap().autolink_armed);

    let linked = drain(&mut rx)
        .into_iter()
        .filter(|n| matches!(n.kind, NotificationKind::Linked { .. }))
        .count();
    assert_eq!(linked, 2);
}

#[test]
fn test_hard_reset_disarms_and_unlinks() {
    let (mut stage, _rx) = stage();
    let a = stage.add_device();
    let b = stage.add_device();
    let c = stage.add_device();
    stage.link(a, b).unwrap();
    stage.arm_autolink(a).unwrap();

    stage.reset(a, true).unwrap();
    assert!(stage.peers_of(b).is_empty());
    assert!(stage.pair(c, a).is_err());
}

#[test]
fn test_group_play_through_commands() {
    let (mut stage, _rx) = stage();
    let table = CommandTable::new();
    let a = stage.add_device();
    let b = stage.add_device();

    for request in [
        CommandRequest::new(a, "set_notes", "C4 E4 G4"),
        CommandRequest::new(b, "set_notes", "C3"),
        CommandRequest::new(b, "autolink", ""),
        CommandRequest::new(a, "pair", b.to_string()),
        CommandRequest::new(b, "play", ""),
    ] {
        table.dispatch(&mut stage, &request).unwrap();
    }

    assert_eq!(stage.device(a).unwrap().state(), PlaybackState::Playing);
    assert_eq!(stage.device(b).unwrap().state(), PlaybackState::Playing);
}
