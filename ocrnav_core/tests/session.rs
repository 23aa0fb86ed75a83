use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use ocrnav_core::{
    BuildError, ChannelSink, DynSession, KeyMapping, NavError, NavEvent, NavSession, NavState,
    Position,
};
use ocrnav_sim::{SimOcr, SimWorld};
use ocrnav_traits::Region;
use ocrnav_traits::clock::test_clock::TestClock;

const REGION: Region = Region::new(0, 0, 200, 24);

fn sim_session(world: &SimWorld, cfg: &ocrnav_config::Config) -> DynSession {
    let clock = Arc::new(TestClock::new());
    NavSession::builder()
        .with_capture(world.screen())
        .with_recognizer(SimOcr::default())
        .with_input(world.keys(clock.clone()))
        .with_clock(clock)
        .apply_config(cfg)
        .expect("config")
        .with_region(Some(REGION))
        .with_max_ticks(Some(2_000))
        .build()
        .expect("build")
}

fn no_cancel() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

fn within(world: [f32; 3], target: Position, tol: f32) -> bool {
    (world[0] - target.x).abs() <= tol && (world[2] - target.z).abs() <= tol
}

#[test]
fn calibrates_then_reaches_target() {
    let world = SimWorld::standard([0.0, 5.0, 0.0], 10.0);
    let mut s = sim_session(&world, &ocrnav_config::Config::default());
    let target = Position::new(6.0, 5.0, -4.0);

    let arrived = s.run(target, no_cancel()).unwrap();

    assert!((arrived.x - target.x).abs() <= 0.7);
    assert!((arrived.z - target.z).abs() <= 0.7);
    assert!(within(world.position(), target, 1.0));
    assert_eq!(s.mapping(), Some(KeyMapping::preset()));
    assert_eq!(s.state(), NavState::Inactive);
    for key in ["w", "a", "s", "d", "space"] {
        assert!(!world.is_held(key), "{key} still held");
    }
}

#[test]
fn climbs_out_of_the_hazard_zone() {
    let world = SimWorld::standard([0.0, -3.0, 0.0], 10.0);
    let mut cfg = ocrnav_config::Config::default();
    cfg.navigation.skip_calibration = true;
    cfg.mapping = Some(ocrnav_config::MappingCfg {
        forward: "z-".into(),
        strafe: "x+".into(),
        ascend: "y+".into(),
    });
    let mut s = sim_session(&world, &cfg);

    s.run(Position::new(3.0, 2.0, 3.0), no_cancel()).unwrap();

    assert!(world.position()[1] >= 0.0);
}

#[test]
fn stored_mapping_skips_calibration() {
    let world = SimWorld::standard([0.0, 5.0, 0.0], 10.0);
    let mut cfg = ocrnav_config::Config::default();
    cfg.navigation.skip_calibration = true;
    cfg.mapping = Some(ocrnav_config::MappingCfg {
        forward: "z-".into(),
        strafe: "x+".into(),
        ascend: "y+".into(),
    });
    let (sink, rx) = ChannelSink::bounded(4096);
    let clock = Arc::new(TestClock::new());
    let mut s = NavSession::builder()
        .with_capture(world.screen())
        .with_recognizer(SimOcr::default())
        .with_input(world.keys(clock.clone()))
        .with_clock(clock)
        .with_events(sink)
        .apply_config(&cfg)
        .unwrap()
        .with_region(Some(REGION))
        .build()
        .unwrap();

    s.run(Position::new(2.0, 5.0, 2.0), no_cancel()).unwrap();

    let events: Vec<_> = rx.try_iter().collect();
    assert!(!events.contains(&NavEvent::CalibrationStarted));
    assert!(!events.contains(&NavEvent::Status(NavState::Calibrating)));
    assert_eq!(events.first(), Some(&NavEvent::Status(NavState::Active)));
}

#[test]
fn unbound_game_key_is_a_config_error() {
    let world = SimWorld::standard([0.0, 5.0, 0.0], 10.0);
    let mut cfg = ocrnav_config::Config::default();
    cfg.keys.forward = "q".into();
    let mut s = sim_session(&world, &cfg);

    let err = s.run(Position::new(5.0, 5.0, 5.0), no_cancel()).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<NavError>(),
        Some(NavError::Config(m)) if m.contains("\"q\"")
    ));
    assert_eq!(s.state(), NavState::Inactive);
}

#[test]
fn calibrate_alone_keeps_the_mapping() {
    let world = SimWorld::standard([0.0, 5.0, 0.0], 10.0);
    let mut s = sim_session(&world, &ocrnav_config::Config::default());
    let m = s.calibrate(no_cancel()).unwrap();
    assert_eq!(m, KeyMapping::preset());
    assert_eq!(s.mapping(), Some(m));
}

#[test]
fn read_reports_the_hud() {
    let world = SimWorld::standard([1.5, 2.0, -3.25], 10.0);
    let mut s = sim_session(&world, &ocrnav_config::Config::default());
    assert_eq!(s.read_position().unwrap(), Position::new(1.5, 2.0, -3.25));
}

#[test]
fn try_build_names_the_missing_piece() {
    let err = NavSession::builder()
        .with_capture(SimWorld::standard([0.0; 3], 1.0).screen())
        .try_build()
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::MissingRecognizer)
    ));
}

#[test]
fn invalid_knobs_are_rejected_at_build() {
    let world = SimWorld::standard([0.0; 3], 1.0);
    let clock = Arc::new(TestClock::new());
    let err = NavSession::builder()
        .with_capture(world.screen())
        .with_recognizer(SimOcr::default())
        .with_input(world.keys(clock))
        .with_nav(ocrnav_core::NavCfg {
            arrival_threshold: 0.0,
            ..ocrnav_core::NavCfg::default()
        })
        .build()
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<BuildError>(),
        Some(BuildError::InvalidConfig(_))
    ));
}
