//! Integration tests for the session controller with fake collaborators
//! driven by a synthetic clock.

use std::cell::RefCell;
use std::rc::Rc;

use fundtracker_core::session::milestone_message;
use fundtracker_core::{
    Config, Database, Event, FrameDriver, KvContributionStore, LedgerError, MemoryStore,
    RecordingNotifier, RenderSurface, RotatedRect, SequenceRandom, Session, SimulatorState, Stage,
};

#[derive(Debug, Default)]
struct SurfaceLog {
    width: f64,
    height: f64,
    visible: bool,
    clears: usize,
    drawn: Vec<RotatedRect>,
}

#[derive(Clone)]
struct FakeSurface(Rc<RefCell<SurfaceLog>>);

impl RenderSurface for FakeSurface {
    fn width(&self) -> f64 {
        self.0.borrow().width
    }
    fn height(&self) -> f64 {
        self.0.borrow().height
    }
    fn clear(&mut self) {
        let mut log = self.0.borrow_mut();
        log.clears += 1;
        log.drawn.clear();
    }
    fn fill_rotated_rect(&mut self, rect: RotatedRect) {
        self.0.borrow_mut().drawn.push(rect);
    }
    fn set_visible(&mut self, visible: bool) {
        self.0.borrow_mut().visible = visible;
    }
}

#[derive(Clone, Default)]
struct FakeFrames(Rc<RefCell<bool>>);

impl FakeFrames {
    fn take(&self) -> bool {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

impl FrameDriver for FakeFrames {
    fn request_frame(&mut self) {
        *self.0.borrow_mut() = true;
    }
    fn cancel_frame(&mut self) {
        *self.0.borrow_mut() = false;
    }
}

struct Harness {
    session: Session,
    store: MemoryStore,
    notifier: RecordingNotifier,
    surface: Rc<RefCell<SurfaceLog>>,
    frames: FakeFrames,
}

fn harness(target: f64, store: MemoryStore) -> Harness {
    let mut config = Config::default();
    config.goal.target = target;
    let notifier = RecordingNotifier::new();
    let surface = Rc::new(RefCell::new(SurfaceLog {
        width: 1024.0,
        height: 768.0,
        ..Default::default()
    }));
    let frames = FakeFrames::default();
    let stage = Stage::new(
        FakeSurface(surface.clone()),
        frames.clone(),
        SequenceRandom::new(vec![0.1, 0.9, 0.4, 0.6, 0.25, 0.75]),
    );
    let session = Session::new(config, store.clone(), notifier.clone(), stage).unwrap();
    Harness {
        session,
        store,
        notifier,
        surface,
        frames,
    }
}

/// Drive frames and ticks on a 16 ms synthetic clock until idle.
fn run_until_idle(h: &mut Harness, mut now: f64) -> f64 {
    while h.session.is_busy() {
        now += 16.0;
        if h.frames.take() {
            h.session.frame(now);
        }
        h.session.tick(now);
        assert!(now < 60_000.0, "session never went idle");
    }
    now
}

#[test]
fn target_100_walkthrough() {
    let mut h = harness(100.0, MemoryStore::new());

    let out = h.session.add_contribution("5", 0.0).unwrap();
    assert_eq!(out.progress.total, 5.0);
    assert_eq!(out.progress.percent_funded, 5);
    assert!(out.crossed.is_empty());
    assert_eq!(h.session.ledger().remaining(), 95.0);

    let out = h.session.add_contribution("50", 10.0).unwrap();
    assert_eq!(out.progress.total, 55.0);
    assert_eq!(out.progress.percent_funded, 55);
    assert_eq!(out.crossed, vec![10, 20, 30, 40, 50]);

    let end = run_until_idle(&mut h, 10.0);
    assert!(end >= 3010.0);

    assert_eq!(h.session.undo().unwrap(), 50.0);
    assert_eq!(h.session.ledger().total(), 5.0);

    assert!(h.session.reset(&mut |_: &str| true));
    assert_eq!(h.session.ledger().total(), 0.0);
    assert!(h.session.ledger().is_empty());
    assert!(h.store.amounts().is_empty());
}

#[test]
fn every_crossed_milestone_is_announced_in_order() {
    let mut h = harness(100.0, MemoryStore::new());
    h.session.add_contribution("5", 0.0).unwrap();
    h.notifier.take();

    h.session.add_contribution("40", 0.0).unwrap();
    run_until_idle(&mut h, 0.0);

    let expected: Vec<String> = [10, 20, 30, 40].iter().map(|&m| milestone_message(m)).collect();
    assert_eq!(h.notifier.messages(), expected);
    assert!(h
        .notifier
        .notifications()
        .iter()
        .all(|n| n.duration_ms == 3500));
}

#[test]
fn events_describe_the_run() {
    let mut h = harness(100.0, MemoryStore::new());
    h.session.add_contribution("25", 0.0).unwrap();
    run_until_idle(&mut h, 0.0);

    let events = h.session.drain_events();
    let kinds: Vec<&str> = events
        .iter()
        .map(|e| match e {
            Event::ContributionAdded { .. } => "added",
            Event::MilestoneReached { .. } => "milestone",
            Event::ConfettiStarted { .. } => "confetti_started",
            Event::ConfettiFinished { .. } => "confetti_finished",
            Event::ContributionRemoved { .. } => "removed",
            Event::LedgerReset { .. } => "reset",
        })
        .collect();
    assert_eq!(
        kinds,
        vec!["added", "milestone", "milestone", "confetti_started", "confetti_finished"]
    );
    assert!(h.session.drain_events().is_empty());
}

#[test]
fn confetti_batch_lives_exactly_for_its_duration() {
    let mut h = harness(100.0, MemoryStore::new());
    h.session.add_contribution("10", 0.0).unwrap();

    // 1024 / 8 = 128 particles
    assert_eq!(h.session.confetti().particles().len(), 128);
    assert!(h.surface.borrow().visible);

    let mut now = 0.0;
    while now < 2990.0 {
        now += 16.0;
        assert!(h.frames.take(), "frame not requested at {now}");
        h.session.frame(now);
        assert_eq!(h.surface.borrow().drawn.len(), 128);
    }
    assert!(h.session.is_animating());

    h.frames.take();
    h.session.frame(3000.0);
    assert_eq!(h.session.confetti().state(), SimulatorState::Idle);
    assert!(h.session.confetti().particles().is_empty());
    assert!(!h.surface.borrow().visible);
    assert!(h.surface.borrow().drawn.is_empty());
    assert!(!h.frames.take());

    let clears = h.surface.borrow().clears;
    h.session.frame(3016.0);
    assert_eq!(h.surface.borrow().clears, clears);
}

#[test]
fn second_crossing_during_run_keeps_single_batch() {
    let mut h = harness(100.0, MemoryStore::new());
    h.session.add_contribution("10", 0.0).unwrap();
    h.frames.take();
    h.session.frame(16.0);
    let first = h.session.confetti().particles()[0];

    h.surface.borrow_mut().width = 2048.0;
    h.session.resize(2048.0, 768.0);
    h.session.add_contribution("10", 20.0).unwrap();
    assert_eq!(h.session.confetti().particles().len(), 128);
    assert_eq!(h.session.confetti().particles()[0], first);
    assert_eq!(h.session.confetti().dimensions(), Some((2048.0, 768.0)));
}

#[test]
fn invalid_inputs_leave_ledger_unchanged() {
    let mut h = harness(100.0, MemoryStore::with_amounts(vec![5.0]));
    for raw in ["-3", "abc", "", "0"] {
        assert!(matches!(
            h.session.add_contribution(raw, 0.0),
            Err(LedgerError::InvalidAmount { .. })
        ));
    }
    assert_eq!(h.session.ledger().contributions(), vec![5.0]);
    assert_eq!(h.store.writes(), 0);

    let mut empty = harness(100.0, MemoryStore::new());
    assert_eq!(empty.session.undo(), Err(LedgerError::EmptyLedger));
    assert!(empty.session.ledger().is_empty());
}

#[test]
fn ledger_survives_restart_through_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fundtracker.db");
    let config = Config::default();

    {
        let store = KvContributionStore::new(Database::open_at(&path).unwrap(), &config.storage.key);
        let stage = Stage::new(
            fundtracker_core::HiddenSurface::new(800.0, 600.0),
            FakeFrames::default(),
            SequenceRandom::constant(0.5),
        );
        let mut session =
            Session::new(config.clone(), store, RecordingNotifier::new(), stage).unwrap();
        session.add_contribution("1200.50", 0.0).unwrap();
        session.add_contribution("99.999", 0.0).unwrap();
    }

    let db = Database::open_at(&path).unwrap();
    db.kv_set("unrelated", "x").unwrap();
    let store = KvContributionStore::new(db, &config.storage.key);
    let stage = Stage::new(
        fundtracker_core::HiddenSurface::new(800.0, 600.0),
        FakeFrames::default(),
        SequenceRandom::constant(0.5),
    );
    let session = Session::new(config, store, RecordingNotifier::new(), stage).unwrap();
    assert_eq!(session.ledger().contributions(), vec![1200.5, 100.0]);
    assert_eq!(session.progress().total, 1300.5);
}

#[test]
fn corrupt_persisted_state_loads_empty() {
    let db = Database::open_memory().unwrap();
    db.kv_set("gclass:contribs", "this is not json").unwrap();
    let store = KvContributionStore::new(db, "gclass:contribs");
    let stage = Stage::new(
        fundtracker_core::HiddenSurface::new(800.0, 600.0),
        FakeFrames::default(),
        SequenceRandom::constant(0.5),
    );
    let notifier = RecordingNotifier::new();
    let session = Session::new(Config::default(), store, notifier.clone(), stage).unwrap();
    assert!(session.ledger().is_empty());
    assert!(notifier.messages().is_empty());
}

#[test]
fn oversized_persisted_amounts_do_not_overflow_the_ledger() {
    let mut h = harness(100.0, MemoryStore::with_amounts(vec![5e16, 5e16]));
    let snap = h.session.progress();
    assert_eq!(snap.contribution_count, 1);
    assert_eq!(snap.percent_funded, 100);
    assert_eq!(snap.remaining, 0.0);

    let out = h.session.add_contribution("1", 0.0).unwrap();
    assert_eq!(out.progress.percent_funded, 100);
    assert_eq!(h.session.ledger().len(), 2);

    let db = Database::open_memory().unwrap();
    db.kv_set("gclass:contribs", "[50000000000000000, 50000000000000000]")
        .unwrap();
    let store = KvContributionStore::new(db, "gclass:contribs");
    let stage = Stage::new(
        fundtracker_core::HiddenSurface::new(800.0, 600.0),
        FakeFrames::default(),
        SequenceRandom::constant(0.5),
    );
    let mut session = Session::new(Config::default(), store, RecordingNotifier::new(), stage).unwrap();
    assert_eq!(session.ledger().contributions(), vec![5e16]);
    session.add_contribution("1", 0.0).unwrap();
    assert_eq!(session.ledger().len(), 2);
}

#[test]
fn progress_snapshot_lists_milestone_marks() {
    let h = harness(1000.0, MemoryStore::with_amounts(vec![250.0]));
    let snap = h.session.progress();
    assert_eq!(snap.percent_funded, 25);
    assert_eq!(snap.remaining, 750.0);
    assert_eq!(snap.contribution_count, 1);
    assert_eq!(snap.milestones.len(), 9);
    assert_eq!(snap.milestones[0].percent, 10);
    assert_eq!(snap.milestones[0].remaining, 900.0);
    assert_eq!(snap.milestones[8].remaining, 100.0);
}
