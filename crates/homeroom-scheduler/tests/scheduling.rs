//! End-to-end scheduling flows over a real (in-memory) store: idempotent
//! re-invocation, past-offset skipping, and restart recovery.

use chrono::{Duration, TimeZone, Utc};
use rusqlite::Connection;
use tokio::sync::mpsc;

use homeroom_core::types::AssignmentId;
use homeroom_scheduler::{FiredReminder, ReminderExecutor, ReminderScheduler};
use homeroom_store::Store;

fn mem_store() -> Store {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
    Store::new(conn).unwrap()
}

fn executor() -> (ReminderExecutor, mpsc::Receiver<FiredReminder>) {
    let (tx, rx) = mpsc::channel(64);
    (ReminderExecutor::new(tx), rx)
}

fn labels_of(store: &Store, id: AssignmentId) -> Vec<String> {
    store
        .jobs_for_assignment(id)
        .unwrap()
        .into_iter()
        .map(|j| j.label)
        .collect()
}

#[test]
fn scheduling_twice_is_idempotent() {
    let store = mem_store();
    let (exec, _rx) = executor();
    let scheduler = ReminderScheduler::new(store.clone(), exec.clone());

    let group = store.create_group("RoboticsA", "t:owner", "UTC").unwrap();
    let now = Utc.with_ymd_and_hms(2025, 9, 20, 10, 0, 0).unwrap();
    let assignment = store
        .create_assignment(group.id, "Blink LED", None, now + Duration::days(5))
        .unwrap();

    scheduler.schedule_at(assignment.id, now).unwrap();
    scheduler.schedule_at(assignment.id, now).unwrap();

    assert_eq!(
        labels_of(&store, assignment.id),
        vec!["T-24h", "T-3h", "T-15m", "T0"]
    );
    assert_eq!(exec.armed_len(), 4);
}

#[test]
fn near_deadline_keeps_only_t0() {
    let store = mem_store();
    let (exec, _rx) = executor();
    let scheduler = ReminderScheduler::new(store.clone(), exec.clone());

    let group = store.create_group("RoboticsA", "t:owner", "UTC").unwrap();
    let now = Utc.with_ymd_and_hms(2025, 9, 25, 17, 50, 0).unwrap();
    // Deadline 10 minutes out: T-15m would fire 5 minutes in the past,
    // T-3h and T-24h even earlier. Only T0 survives.
    let assignment = store
        .create_assignment(group.id, "Blink LED", None, now + Duration::minutes(10))
        .unwrap();

    scheduler.schedule_at(assignment.id, now).unwrap();

    assert_eq!(labels_of(&store, assignment.id), vec!["T0"]);
    assert_eq!(exec.armed_len(), 1);
}

#[test]
fn assignment_past_its_own_deadline_schedules_nothing() {
    let store = mem_store();
    let (exec, _rx) = executor();
    let scheduler = ReminderScheduler::new(store.clone(), exec.clone());

    let group = store.create_group("RoboticsA", "t:owner", "UTC").unwrap();
    let now = Utc.with_ymd_and_hms(2025, 9, 25, 18, 0, 0).unwrap();
    let assignment = store
        .create_assignment(group.id, "Blink LED", None, now - Duration::minutes(1))
        .unwrap();

    scheduler.schedule_at(assignment.id, now).unwrap();

    assert!(labels_of(&store, assignment.id).is_empty());
    assert_eq!(exec.armed_len(), 0);
}

#[test]
fn vanished_assignment_is_a_benign_noop() {
    let store = mem_store();
    let (exec, _rx) = executor();
    let scheduler = ReminderScheduler::new(store.clone(), exec.clone());

    scheduler
        .schedule_at(AssignmentId(9999), Utc::now())
        .unwrap();
    assert_eq!(exec.armed_len(), 0);
}

#[test]
fn documented_scenario_produces_four_jobs() {
    let store = mem_store();
    let (exec, _rx) = executor();
    let scheduler = ReminderScheduler::new(store.clone(), exec.clone());

    let group = store
        .create_group("RoboticsA", "t:owner", "Europe/Moscow")
        .unwrap();
    let due = Utc.with_ymd_and_hms(2025, 9, 25, 18, 0, 0).unwrap();
    let created = Utc.with_ymd_and_hms(2025, 9, 20, 10, 0, 0).unwrap();
    let assignment = store
        .create_assignment(group.id, "Blink LED", None, due)
        .unwrap();

    scheduler.schedule_at(assignment.id, created).unwrap();

    let jobs = store.jobs_for_assignment(assignment.id).unwrap();
    let instants: Vec<_> = jobs.iter().map(|j| (j.label.as_str(), j.fire_at)).collect();
    assert_eq!(
        instants,
        vec![
            ("T-24h", Utc.with_ymd_and_hms(2025, 9, 24, 18, 0, 0).unwrap()),
            ("T-3h", Utc.with_ymd_and_hms(2025, 9, 25, 15, 0, 0).unwrap()),
            ("T-15m", Utc.with_ymd_and_hms(2025, 9, 25, 17, 45, 0).unwrap()),
            ("T0", due),
        ]
    );
}

#[test]
fn restart_rearms_future_jobs_without_duplicates() {
    let store = mem_store();
    let now = Utc.with_ymd_and_hms(2025, 9, 25, 12, 0, 0).unwrap();

    let group = store.create_group("RoboticsA", "t:owner", "UTC").unwrap();
    let assignment = store
        .create_assignment(group.id, "Blink LED", None, now + Duration::hours(1))
        .unwrap();

    // First process lifetime: schedule normally.
    {
        let (exec, _rx) = executor();
        let scheduler = ReminderScheduler::new(store.clone(), exec.clone());
        scheduler.schedule_at(assignment.id, now).unwrap();
        // deadline 1h out ⇒ T-15m and T0 are in the future
        assert_eq!(exec.armed_len(), 2);
    }

    // "Restart": same store, fresh executor with nothing armed.
    let (exec, _rx) = executor();
    let scheduler = ReminderScheduler::new(store.clone(), exec.clone());
    scheduler.rehydrate_at(now).unwrap();
    assert_eq!(exec.armed_len(), 2);

    // Idempotent re-invocation after rehydration changes nothing.
    scheduler.schedule_at(assignment.id, now).unwrap();
    assert_eq!(exec.armed_len(), 2);
    assert_eq!(store.jobs_for_assignment(assignment.id).unwrap().len(), 2);
}

#[test]
fn missed_jobs_are_dropped_on_rehydration() {
    let store = mem_store();
    let now = Utc.with_ymd_and_hms(2025, 9, 25, 12, 0, 0).unwrap();

    let group = store.create_group("RoboticsA", "t:owner", "UTC").unwrap();
    let assignment = store
        .create_assignment(group.id, "Blink LED", None, now + Duration::hours(2))
        .unwrap();
    // A job that came due one minute before the process came back.
    store
        .insert_job_if_absent(assignment.id, now - Duration::minutes(1), "T-3h")
        .unwrap();
    store
        .insert_job_if_absent(assignment.id, now + Duration::hours(2), "T0")
        .unwrap();

    let (exec, mut rx) = executor();
    let scheduler = ReminderScheduler::new(store.clone(), exec.clone());
    scheduler.rehydrate_at(now).unwrap();

    // Only the future job is armed; the missed one is neither armed nor fired.
    assert_eq!(exec.armed_len(), 1);
    exec.tick(now);
    assert!(rx.try_recv().is_err());

    // The missed row stays persisted — dropped, not deleted.
    assert_eq!(store.jobs_for_assignment(assignment.id).unwrap().len(), 2);
}

#[test]
fn rehydrated_job_fires_once_at_its_instant() {
    let store = mem_store();
    let now = Utc.with_ymd_and_hms(2025, 9, 25, 12, 0, 0).unwrap();

    let group = store.create_group("RoboticsA", "t:owner", "UTC").unwrap();
    let assignment = store
        .create_assignment(group.id, "Blink LED", None, now + Duration::minutes(30))
        .unwrap();

    let (exec, mut rx) = executor();
    let scheduler = ReminderScheduler::new(store.clone(), exec.clone());
    scheduler.schedule_at(assignment.id, now).unwrap();

    // T-15m due at now+15m, T0 at now+30m.
    exec.tick(now + Duration::minutes(15));
    let fired = rx.try_recv().unwrap();
    assert_eq!(fired.assignment_id, assignment.id);
    assert_eq!(fired.label.as_str(), "T-15m");

    // Nothing else is due yet, and the fired job does not repeat.
    exec.tick(now + Duration::minutes(16));
    assert!(rx.try_recv().is_err());
}
