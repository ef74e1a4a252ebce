//! Behavioural tests for the timer controller against the real stores.

use std::{
    sync::{
        atomic::{AtomicI64, Ordering},
        Arc, Mutex,
    },
    thread,
};

use project_timer::{
    clock::{Clock, ManualClock},
    error::StoreError,
    store::{seconds_to_hours, Accumulator, OptionsStore, StateStore, TaskLedger},
    TimerController, TimerId, TimerState,
};

fn id(raw: i64) -> TimerId {
    TimerId::new(raw).unwrap()
}

/// Accumulator that records every commit
#[derive(Default)]
struct RecordingAccumulator {
    commits: Mutex<Vec<(TimerId, u64)>>,
}

impl RecordingAccumulator {
    fn commits(&self) -> Vec<(TimerId, u64)> {
        self.commits.lock().unwrap().clone()
    }
}

impl Accumulator for RecordingAccumulator {
    fn add_seconds(&self, entity: TimerId, seconds: u64) -> Result<(), StoreError> {
        if !entity.is_none() {
            self.commits.lock().unwrap().push((entity, seconds));
        }
        Ok(())
    }
}

/// Clock that advances one second every time it is read
#[derive(Default)]
struct TickingClock(AtomicI64);

impl Clock for TickingClock {
    fn now(&self) -> i64 {
        self.0.fetch_add(1, Ordering::SeqCst)
    }
}

mod scenarios {
    use super::*;

    fn controller_with(
        clock: Arc<ManualClock>,
    ) -> (TimerController, Arc<RecordingAccumulator>, Arc<OptionsStore>) {
        let store = Arc::new(OptionsStore::in_memory());
        let commits = Arc::new(RecordingAccumulator::default());
        let controller = TimerController::new(store.clone(), commits.clone(), clock);
        controller.install().unwrap();
        (controller, commits, store)
    }

    #[test]
    fn seven_then_nine_then_stop() {
        let clock = Arc::new(ManualClock::new(0));
        let (controller, commits, _) = controller_with(clock.clone());

        assert_eq!(controller.toggle(id(7), 1).unwrap().running_timer_id, id(7));
        clock.set(100);
        assert_eq!(controller.toggle(id(9), 1).unwrap().running_timer_id, id(9));
        clock.set(130);
        assert_eq!(controller.toggle(id(9), 1).unwrap().running_timer_id, TimerId::NONE);

        assert_eq!(commits.commits(), vec![(id(7), 100), (id(9), 30)]);
    }

    #[test]
    fn three_started_and_stopped_five_seconds_later() {
        let clock = Arc::new(ManualClock::new(0));
        let (controller, commits, store) = controller_with(clock.clone());

        controller.toggle(id(3), 1).unwrap();
        clock.set(5);
        let outcome = controller.toggle(id(3), 1).unwrap();

        assert_eq!(outcome.running_timer_id, TimerId::NONE);
        assert_eq!(commits.commits(), vec![(id(3), 5)]);
        assert_eq!(store.read().unwrap(), TimerState::idle());
    }

    #[test]
    fn swap_commits_to_previous_not_requested() {
        let clock = Arc::new(ManualClock::new(50));
        let (controller, commits, store) = controller_with(clock.clone());

        controller.toggle(id(1), 1).unwrap();
        clock.advance(20);
        controller.toggle(id(2), 1).unwrap();

        assert_eq!(commits.commits(), vec![(id(1), 20)]);
        assert_eq!(store.read().unwrap().running_timer(), Some(id(2)));
    }

    #[test]
    fn at_most_one_timer_for_any_sequence() {
        let clock = Arc::new(ManualClock::new(0));
        let (controller, commits, store) = controller_with(clock.clone());
        let sequence = [4, 4, 1, 2, 2, 2, 5, 1, 1, -1, 3, -1, -1, 6];

        let mut expected_running: Option<i64> = None;
        let mut expected_commits = 0;
        for (step, raw) in sequence.into_iter().enumerate() {
            clock.advance(step as i64 + 1);
            let outcome = controller.toggle(id(raw), 9).unwrap();

            if expected_running.is_some() {
                expected_commits += 1;
            }
            expected_running = if raw == -1 || expected_running == Some(raw) {
                None
            } else {
                Some(raw)
            };
            assert_eq!(outcome.running_timer_id.get(), expected_running.unwrap_or(-1));

            let state = store.read().unwrap();
            assert_eq!(state.is_running(), state.started_at().is_some());
            assert_eq!(state.running_timer(), expected_running.map(id));
        }

        assert_eq!(commits.commits().len(), expected_commits);
    }
}

mod persistence {
    use super::*;

    #[test]
    fn running_timer_survives_restart_and_commits_after() {
        let dir = tempfile::tempdir().unwrap();
        let options = dir.path().join("options.json");
        let ledger_path = dir.path().join("ledger.json");
        let clock = Arc::new(ManualClock::new(1_000));

        {
            let controller = TimerController::new(
                Arc::new(OptionsStore::open(&options).unwrap()),
                Arc::new(TaskLedger::open(&ledger_path).unwrap()),
                clock.clone(),
            );
            controller.install().unwrap();
            controller.toggle(id(21), 1).unwrap();
        }

        clock.advance(900);
        let ledger = Arc::new(TaskLedger::open(&ledger_path).unwrap());
        let controller = TimerController::new(
            Arc::new(OptionsStore::open(&options).unwrap()),
            ledger.clone(),
            clock.clone(),
        );
        controller.install().unwrap();

        let outcome = controller.toggle(id(21), 1).unwrap();

        assert_eq!(outcome.committed_seconds, 900);
        assert_eq!(ledger.hours(id(21)).unwrap(), seconds_to_hours(900));
    }

    #[test]
    fn corrupted_start_time_commits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let options = dir.path().join("options.json");
        std::fs::write(
            &options,
            r#"{"project_timer_options":{"current_timer":5,"timer_started":-9223372036854775808}}"#,
        )
        .unwrap();

        let ledger = Arc::new(TaskLedger::in_memory());
        let controller = TimerController::new(
            Arc::new(OptionsStore::open(&options).unwrap()),
            ledger.clone(),
            Arc::new(ManualClock::new(1_700_000_000)),
        );

        let outcome = controller.toggle(id(5), 1).unwrap();

        assert_eq!(outcome.running_timer_id, TimerId::NONE);
        assert_eq!(outcome.committed_seconds, 0);
        assert_eq!(ledger.hours(id(5)).unwrap(), 0.0);
    }
}

mod concurrency {
    use super::*;

    const THREADS: usize = 8;
    const TOGGLES_PER_THREAD: usize = 250;

    #[test]
    fn racing_toggles_on_one_timer_serialize() {
        let store = Arc::new(OptionsStore::in_memory());
        let commits = Arc::new(RecordingAccumulator::default());
        let controller = Arc::new(TimerController::new(
            store.clone(),
            commits.clone(),
            Arc::new(TickingClock::default()),
        ));
        controller.install().unwrap();

        let handles: Vec<_> = (0..THREADS)
            .map(|user| {
                let controller = Arc::clone(&controller);
                thread::spawn(move || {
                    (0..TOGGLES_PER_THREAD)
                        .filter(|_| controller.toggle(id(42), user as u64).unwrap().is_running())
                        .count()
                })
            })
            .collect();

        let starts: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        let total = THREADS * TOGGLES_PER_THREAD;

        // Serialized toggles of one id alternate start/stop
        assert_eq!(starts, total / 2);
        assert_eq!(commits.commits().len(), total / 2);
        assert_eq!(store.read().unwrap(), TimerState::idle());
    }

    #[test]
    fn racing_swaps_commit_every_interval_once() {
        let store = Arc::new(OptionsStore::in_memory());
        let commits = Arc::new(RecordingAccumulator::default());
        let controller = Arc::new(TimerController::new(
            store.clone(),
            commits.clone(),
            Arc::new(TickingClock::default()),
        ));
        controller.install().unwrap();

        let handles: Vec<_> = (0..THREADS)
            .map(|thread_no| {
                let controller = Arc::clone(&controller);
                thread::spawn(move || {
                    for i in 0..TOGGLES_PER_THREAD {
                        let timer = id((thread_no * TOGGLES_PER_THREAD + i) as i64);
                        controller.toggle(timer, thread_no as u64).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // Every id is distinct, so each toggle after the first swaps and commits once
        let total = THREADS * TOGGLES_PER_THREAD;
        let commits = commits.commits();
        assert_eq!(commits.len(), total - 1);
        // The ticking clock reads once per toggle, so every interval is exactly one second
        assert!(commits.iter().all(|(_, seconds)| *seconds == 1));
        assert!(store.read().unwrap().is_running());
    }
}
