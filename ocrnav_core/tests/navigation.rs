use std::sync::Arc;

use ocrnav_core::mocks::{EchoRecognizer, KeyEvent, RecordingInput, TextCapture};
use ocrnav_core::{
    ChannelSink, KeyBindings, KeyMapping, NavCfg, NavEvent, NavStatus, NavigationController,
    PositionSampler, Position, Rig, SkipReason, Unreadable,
};
use ocrnav_traits::Region;
use ocrnav_traits::clock::test_clock::TestClock;
use rstest::rstest;

type MockRig = Rig<TextCapture, EchoRecognizer, RecordingInput>;

struct Harness {
    rig: MockRig,
    input: RecordingInput,
    clock: TestClock,
    events: crossbeam_channel::Receiver<NavEvent>,
}

fn harness(lines: &[&str]) -> Harness {
    let input = RecordingInput::new();
    let clock = TestClock::new();
    let (sink, events) = ChannelSink::bounded(64);
    let sampler = PositionSampler::new(
        TextCapture::new(lines.iter().copied()),
        EchoRecognizer,
        Some(Region::new(0, 0, 200, 24)),
    )
    .expect("sampler");
    let rig = Rig::new(sampler, input.clone(), Arc::new(clock.clone()), Box::new(sink));
    Harness {
        rig,
        input,
        clock,
        events,
    }
}

fn controller(cfg: NavCfg, target: Position) -> NavigationController {
    let mut c = NavigationController::new(cfg, KeyBindings::default(), KeyMapping::preset(), target);
    c.start();
    c
}

#[test]
fn z_only_error_issues_only_the_z_key() {
    let mut h = harness(&["X: 0 Y: 5 Z: 0"]);
    let mut c = controller(NavCfg::default(), Position::new(0.0, 5.0, -5.0));

    let status = c.tick(&mut h.rig).unwrap();

    assert_eq!(status, NavStatus::Moving { key: "w".into() });
    assert_eq!(h.input.actuated(), vec!["w"]);
    assert_eq!(h.clock.elapsed().as_millis(), 15);
}

#[test]
fn z_is_corrected_before_x() {
    let mut h = harness(&["X: 0 Y: 5 Z: 0"]);
    let mut c = controller(NavCfg::default(), Position::new(-5.0, 5.0, 5.0));
    assert_eq!(
        c.tick(&mut h.rig).unwrap(),
        NavStatus::Moving { key: "s".into() }
    );
}

#[rstest]
#[case(0.70, true)]
#[case(0.71, false)]
fn arrival_tolerance_is_inclusive(#[case] err: f32, #[case] arrives: bool) {
    let mut h = harness(&["X: 0 Y: 5 Z: 0"]);
    let mut c = controller(NavCfg::default(), Position::new(err, 5.0, 0.0));
    let status = c.tick(&mut h.rig).unwrap();
    assert_eq!(status.is_arrived(), arrives);
    assert_eq!(c.is_active(), !arrives);
}

#[test]
fn hazard_holds_ascend_with_pending_horizontal_keys() {
    let mut h = harness(&["X: 0 Y: -1 Z: 0"]);
    let mut c = controller(NavCfg::default(), Position::new(5.0, 5.0, -5.0));

    let status = c.tick(&mut h.rig).unwrap();

    assert_eq!(
        status,
        NavStatus::Recovering {
            keys: vec!["space".into(), "w".into(), "d".into()]
        }
    );
    assert_eq!(
        h.input.events(),
        vec![
            KeyEvent::Down("space".into()),
            KeyEvent::Down("w".into()),
            KeyEvent::Down("d".into()),
            KeyEvent::Up("space".into()),
            KeyEvent::Up("w".into()),
            KeyEvent::Up("d".into()),
        ]
    );
    assert_eq!(h.clock.elapsed().as_millis(), 300);
}

#[test]
fn hazard_at_the_target_still_ascends() {
    let mut h = harness(&["X: 0 Y: -1 Z: 0"]);
    let mut c = controller(NavCfg::default(), Position::new(0.0, -1.0, 0.0));
    assert_eq!(
        c.tick(&mut h.rig).unwrap(),
        NavStatus::Recovering {
            keys: vec!["space".into()]
        }
    );
}

#[test]
fn target_above_taps_ascend() {
    let mut h = harness(&["X: 0 Y: 1 Z: 0"]);
    let mut c = controller(NavCfg::default(), Position::new(0.0, 5.0, 0.0));
    assert_eq!(c.tick(&mut h.rig).unwrap(), NavStatus::Ascending);
    assert_eq!(h.input.events(), vec![KeyEvent::Press("space".into())]);
}

#[test]
fn target_below_does_not_ascend() {
    let mut h = harness(&["X: 0 Y: 9 Z: 0"]);
    let mut c = controller(NavCfg::default(), Position::new(0.0, 5.0, 0.0));
    assert!(c.tick(&mut h.rig).unwrap().is_arrived());
}

#[test]
fn unreadable_tick_does_nothing() {
    let mut h = harness(&["Loading..."]);
    let mut c = controller(NavCfg::default(), Position::new(9.0, 9.0, 9.0));

    let status = c.tick(&mut h.rig).unwrap();

    assert_eq!(
        status,
        NavStatus::Skipped(SkipReason::Unreadable(Unreadable::NoCoordinates(
            "Loading...".into()
        )))
    );
    assert!(h.input.events().is_empty());
    assert!(c.is_active());
}

#[test]
fn jumping_reading_waits_for_the_hud_to_settle() {
    let mut h = harness(&["X: 0 Y: 5 Z: 0", "X: 3 Y: 5 Z: 0", "X: 3 Y: 5 Z: 0"]);
    let cfg = NavCfg::default();
    let wait = cfg.transition_wait_ms;
    let pulse = cfg.pulse_ms;
    let mut c = controller(cfg, Position::new(10.0, 5.0, 0.0));

    assert!(matches!(c.tick(&mut h.rig).unwrap(), NavStatus::Moving { .. }));
    assert_eq!(
        c.tick(&mut h.rig).unwrap(),
        NavStatus::Skipped(SkipReason::Transitioning)
    );
    assert_eq!(h.input.actuated(), vec!["d"]);
    assert_eq!(h.clock.elapsed().as_millis(), u128::from(pulse + wait));

    // 3 is still far from the window mean of 0, 3, 3
    assert_eq!(
        c.tick(&mut h.rig).unwrap(),
        NavStatus::Skipped(SkipReason::Transitioning)
    );
    assert!(matches!(c.tick(&mut h.rig).unwrap(), NavStatus::Moving { .. }));
}

#[test]
fn single_misread_never_steers_the_wrong_way() {
    let mut h = harness(&[
        "X: 0 Y: 5 Z: 0",
        "X: 0 Y: 5 Z: 0",
        "X: 0 Y: 5 Z: -900",
        "X: 0 Y: 5 Z: 0",
        "X: 0 Y: 5 Z: 0",
        "X: 0 Y: 5 Z: 0",
    ]);
    let mut c = controller(NavCfg::default(), Position::new(0.0, 5.0, -2.0));

    let statuses: Vec<NavStatus> = (0..6).map(|_| c.tick(&mut h.rig).unwrap()).collect();

    let skipped = NavStatus::Skipped(SkipReason::Transitioning);
    let forward = NavStatus::Moving { key: "w".into() };
    assert_eq!(
        statuses,
        vec![
            forward.clone(),
            forward.clone(),
            skipped.clone(),
            skipped.clone(),
            skipped,
            forward,
        ]
    );
    assert_eq!(h.input.actuated(), vec!["w", "w", "w"]);
}

#[test]
fn arrival_taps_hotkey_and_deactivates() {
    let mut h = harness(&["X: 1 Y: 5 Z: 1"]);
    let cfg = NavCfg {
        arrival_hotkey: Some("f1".into()),
        ..NavCfg::default()
    };
    let mut c = controller(cfg, Position::new(1.0, 5.0, 1.0));

    let status = c.tick(&mut h.rig).unwrap();

    assert_eq!(status, NavStatus::Arrived(Position::new(1.0, 5.0, 1.0)));
    assert_eq!(h.input.events(), vec![KeyEvent::Press("f1".into())]);
    let ev = h.events.try_recv().unwrap();
    assert_eq!(
        ev,
        NavEvent::Arrived {
            position: Position::new(1.0, 5.0, 1.0)
        }
    );
    assert_eq!(c.tick(&mut h.rig).unwrap(), NavStatus::Inactive);
}

#[test]
fn inactive_controller_never_samples_or_presses() {
    let mut h = harness(&["X: 0 Y: 5 Z: 0"]);
    let mut c = NavigationController::new(
        NavCfg::default(),
        KeyBindings::default(),
        KeyMapping::preset(),
        Position::new(50.0, 5.0, 0.0),
    );
    assert_eq!(c.tick(&mut h.rig).unwrap(), NavStatus::Inactive);
    assert_eq!(h.rig.sampler.history().count(), 0);
    assert!(h.input.events().is_empty());
}

#[test]
fn retargeting_takes_effect_next_tick() {
    let mut h = harness(&["X: 0 Y: 5 Z: 0"]);
    let mut c = controller(NavCfg::default(), Position::new(0.0, 5.0, -5.0));
    assert_eq!(c.tick(&mut h.rig).unwrap(), NavStatus::Moving { key: "w".into() });
    c.set_target(Position::new(0.0, 5.0, 5.0));
    assert_eq!(c.tick(&mut h.rig).unwrap(), NavStatus::Moving { key: "s".into() });
}

#[test]
fn custom_bindings_and_rotated_mapping() {
    let mut h = harness(&["X: 0 Y: 5 Z: 0"]);
    let bindings = KeyBindings {
        forward: "up".into(),
        back: "down".into(),
        strafe: "right".into(),
        strafe_opposite: "left".into(),
        ascend: "j".into(),
    };
    let mapping = KeyMapping {
        forward: "x-".parse().unwrap(),
        strafe: "z+".parse().unwrap(),
        ascend: "y+".parse().unwrap(),
    };
    let mut c = NavigationController::new(
        NavCfg::default(),
        bindings,
        mapping,
        Position::new(5.0, 5.0, 0.0),
    );
    c.start();
    // +x needed, forward walks -x, so its opposite
    assert_eq!(
        c.tick(&mut h.rig).unwrap(),
        NavStatus::Moving {
            key: "down".into()
        }
    );
}
