// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the tracker, monitor and reconciliation loop.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeZone;
use light_watchdog::RoomLightTracker;
use light_watchdog::error::NotifyError;
use light_watchdog::event::{LightEvent, MonitorEvent};
use light_watchdog::manager::{LightMonitor, ReconciliationLoop};
use light_watchdog::notify::Notifier;
use light_watchdog::state::{AlertDecision, LightAlert, LightPhase, Transition};
use light_watchdog::store::{DurableStore, JsonFileStore, MemoryStore};
use light_watchdog::types::{LightKind, RoomId, Timestamp};
use tokio::sync::mpsc;

const THRESHOLD: Duration = Duration::from_secs(10);

fn t(secs: i64) -> Timestamp {
    chrono::Utc.timestamp_opt(1_714_000_000 + secs, 0).unwrap()
}

fn sala() -> RoomId {
    RoomId::new("sala").unwrap()
}

fn quarto() -> RoomId {
    RoomId::new("quarto").unwrap()
}

fn on(room: RoomId, at: i64) -> LightEvent {
    LightEvent::new(room, LightKind::On, t(at))
}

fn off(room: RoomId, at: i64) -> LightEvent {
    LightEvent::new(room, LightKind::Off, t(at))
}

struct ChannelNotifier(mpsc::UnboundedSender<LightAlert>);

impl Notifier for ChannelNotifier {
    async fn send(&self, alert: LightAlert) -> Result<(), NotifyError> {
        self.0
            .send(alert)
            .map_err(|e| NotifyError::Unavailable(e.to_string()))
    }
}

// ============================================================================
// Tracker Behaviour
// ============================================================================

mod tracker {
    use super::*;

    fn tracker() -> RoomLightTracker {
        RoomLightTracker::new(sala(), Arc::new(MemoryStore::new()))
    }

    #[test]
    fn scripted_on_period() {
        let mut tracker = tracker();

        let _ = tracker.on_event(LightKind::On, t(0));
        assert_eq!(
            tracker.evaluate(t(5), THRESHOLD).into_value(),
            AlertDecision::NoAlert
        );
        assert_eq!(
            tracker.evaluate(t(11), THRESHOLD).into_value(),
            AlertDecision::ShouldAlert {
                elapsed: Duration::from_secs(11)
            }
        );
        assert_eq!(
            tracker.evaluate(t(20), THRESHOLD).into_value(),
            AlertDecision::NoAlert
        );

        let _ = tracker.on_event(LightKind::Off, t(25));
        assert_eq!(
            tracker.evaluate(t(30), THRESHOLD).into_value(),
            AlertDecision::NoAlert
        );
        assert_eq!(
            tracker.state().last_off_duration(),
            Some(Duration::from_secs(25))
        );
    }

    #[test]
    fn at_most_one_alert_per_on_period() {
        let mut tracker = tracker();
        let _ = tracker.on_event(LightKind::On, t(0));

        let alerts = (0..120)
            .filter(|s| tracker.evaluate(t(*s), THRESHOLD).value().should_alert())
            .count();

        assert_eq!(alerts, 1);
    }

    #[test]
    fn repeated_on_keeps_first_timestamp_and_flag() {
        let mut tracker = tracker();
        let _ = tracker.on_event(LightKind::On, t(0));
        let _ = tracker.evaluate(t(10), THRESHOLD);

        for s in [3, 11, 40] {
            assert_eq!(
                tracker.on_event(LightKind::On, t(s)).into_value(),
                Transition::DuplicateIgnored
            );
        }

        assert_eq!(tracker.state().on_since(), Some(t(0)));
        assert!(tracker.state().alert_sent());
    }

    #[test]
    fn new_on_period_gets_fresh_alert() {
        let mut tracker = tracker();
        let _ = tracker.on_event(LightKind::On, t(0));
        assert!(tracker.evaluate(t(10), THRESHOLD).value().should_alert());

        let _ = tracker.on_event(LightKind::Off, t(12));
        let _ = tracker.on_event(LightKind::On, t(100));

        assert!(!tracker.evaluate(t(105), THRESHOLD).value().should_alert());
        assert!(tracker.evaluate(t(110), THRESHOLD).value().should_alert());
    }

    #[test]
    fn no_alert_while_off() {
        let mut tracker = tracker();
        for s in (0..600).step_by(7) {
            assert_eq!(
                tracker.evaluate(t(s), THRESHOLD).into_value(),
                AlertDecision::NoAlert
            );
        }
    }

    #[test]
    fn off_before_threshold_never_alerts() {
        let mut tracker = tracker();
        let _ = tracker.on_event(LightKind::On, t(0));
        let _ = tracker.on_event(LightKind::Off, t(9));

        assert!(!tracker.evaluate(t(60), THRESHOLD).value().should_alert());
    }
}

// ============================================================================
// Persistence Across Restarts
// ============================================================================

mod restart {
    use super::*;

    #[test]
    fn restored_on_period_alerts_exactly_once() {
        let store = Arc::new(MemoryStore::new());

        {
            let mut tracker = RoomLightTracker::new(sala(), store.clone());
            let _ = tracker.on_event(LightKind::On, t(0));
        }

        let mut restored = RoomLightTracker::restore(sala(), store.clone());
        assert_eq!(restored.state().phase(), LightPhase::OnPending);

        let decisions: Vec<_> = [30, 31, 60]
            .into_iter()
            .map(|s| restored.evaluate(t(s), THRESHOLD).into_value())
            .collect();
        assert_eq!(
            decisions,
            vec![
                AlertDecision::ShouldAlert {
                    elapsed: Duration::from_secs(30)
                },
                AlertDecision::NoAlert,
                AlertDecision::NoAlert,
            ]
        );

        let mut again = RoomLightTracker::restore(sala(), store);
        assert!(!again.evaluate(t(90), THRESHOLD).value().should_alert());
    }

    #[test]
    fn file_store_survives_restart() {
        let dir = tempfile::tempdir().unwrap();

        {
            let store = Arc::new(JsonFileStore::open(dir.path()).unwrap());
            let monitor = LightMonitor::new(store, THRESHOLD);
            let _ = monitor.handle_event(&on(sala(), 0));
            let _ = monitor.handle_event(&on(quarto(), 0));
            assert_eq!(monitor.evaluate_all(t(11)).len(), 2);
            let _ = monitor.handle_event(&off(quarto(), 12));
        }

        let store = Arc::new(JsonFileStore::open(dir.path()).unwrap());
        let monitor = LightMonitor::new(store, THRESHOLD);
        monitor.add_room(sala());
        monitor.add_room(quarto());

        let sala_state = monitor.room_state(&sala()).unwrap();
        assert_eq!(sala_state.phase(), LightPhase::OnAlerted);
        assert_eq!(sala_state.on_since(), Some(t(0)));
        assert_eq!(
            monitor.room_state(&quarto()).unwrap().phase(),
            LightPhase::Off
        );
        assert!(monitor.evaluate_all(t(100)).is_empty());
    }

    #[test]
    fn corrupt_record_restores_off_and_is_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sala.json"), "{\"on_since\":").unwrap();

        let store = Arc::new(JsonFileStore::open(dir.path()).unwrap());
        let monitor = LightMonitor::new(store.clone(), THRESHOLD);
        monitor.add_room(sala());
        assert_eq!(monitor.room_state(&sala()).unwrap().phase(), LightPhase::Off);

        let _ = monitor.handle_event(&on(sala(), 5));
        assert!(store.get(&sala()).unwrap().is_some());
    }
}

// ============================================================================
// Store Failures
// ============================================================================

mod store_failure {
    use super::*;

    #[test]
    fn transitions_apply_when_writes_fail() {
        let store = Arc::new(MemoryStore::new());
        store.fail_writes(true);
        let monitor = LightMonitor::new(store.clone(), THRESHOLD);

        let applied = monitor.handle_event(&on(sala(), 0));
        assert!(!applied.is_persisted());
        assert_eq!(*applied.value(), Transition::TurnedOn { at: t(0) });

        let alerts = monitor.evaluate_all(t(10));
        assert_eq!(alerts.len(), 1);
        assert!(monitor.evaluate_all(t(11)).is_empty());

        store.fail_writes(false);
        let applied = monitor.handle_event(&off(sala(), 20));
        assert!(applied.is_persisted());
        assert!(store.is_empty());
    }
}

// ============================================================================
// Concurrent Access
// ============================================================================

mod concurrency {
    use super::*;

    #[test]
    fn concurrent_ticks_and_duplicates_alert_once() {
        let monitor = LightMonitor::new(Arc::new(MemoryStore::new()), THRESHOLD);
        let _ = monitor.handle_event(&on(sala(), 0));

        let alerts: usize = std::thread::scope(|scope| {
            let tickers: Vec<_> = (0..4)
                .map(|_| {
                    let monitor = monitor.clone();
                    scope.spawn(move || {
                        (10..200)
                            .map(|s| monitor.evaluate_all(t(s)).len())
                            .sum::<usize>()
                    })
                })
                .collect();

            for _ in 0..4 {
                let monitor = monitor.clone();
                scope.spawn(move || {
                    for s in 1..200 {
                        let _ = monitor.handle_event(&on(sala(), s));
                    }
                });
            }

            tickers.into_iter().map(|h| h.join().unwrap()).sum()
        });

        assert_eq!(alerts, 1);
        let state = monitor.room_state(&sala()).unwrap();
        assert_eq!(state.on_since(), Some(t(0)));
        assert!(state.alert_sent());
    }

    #[test]
    fn stored_record_matches_state_after_concurrent_churn() {
        let store = Arc::new(MemoryStore::new());
        let monitor = LightMonitor::new(store.clone(), THRESHOLD);

        std::thread::scope(|scope| {
            for worker in 0..6_i64 {
                let monitor = monitor.clone();
                scope.spawn(move || {
                    for s in 0..300 {
                        let at = s * 6 + worker;
                        let event = if (s + worker) % 3 == 0 {
                            off(sala(), at)
                        } else {
                            on(sala(), at)
                        };
                        let _ = monitor.handle_event(&event);
                        let _ = monitor.evaluate_all(t(at));
                    }
                });
            }
        });

        let state = monitor.room_state(&sala()).unwrap();
        assert_eq!(store.get(&sala()).unwrap(), state.to_record());
        if !state.is_on() {
            assert!(!state.alert_sent());
        }
    }
}

// ============================================================================
// Monitor Events
// ============================================================================

mod events {
    use super::*;

    #[tokio::test]
    async fn light_changes_and_alerts_are_broadcast() {
        let monitor = LightMonitor::new(Arc::new(MemoryStore::new()), THRESHOLD);
        monitor.add_room(sala());
        let mut events = monitor.subscribe();

        let _ = monitor.handle_event(&on(sala(), 0));
        let _ = monitor.handle_event(&on(sala(), 2));
        let _ = monitor.evaluate_all(t(15));
        let _ = monitor.handle_event(&off(sala(), 16));

        let received: Vec<MonitorEvent> = std::iter::from_fn(|| events.try_recv().ok()).collect();
        assert_eq!(received.len(), 3);
        assert!(matches!(
            &received[0],
            MonitorEvent::LightChanged {
                transition: Transition::TurnedOn { .. },
                ..
            }
        ));
        assert!(matches!(&received[1], MonitorEvent::AlertRaised { alert } if alert.elapsed() == Duration::from_secs(15)));
        assert!(matches!(
            &received[2],
            MonitorEvent::LightChanged {
                transition: Transition::TurnedOff { .. },
                state,
                ..
            } if !state.is_on()
        ));
    }
}

// ============================================================================
// Reconciliation Loop
// ============================================================================

mod reconciliation {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn loop_alerts_once_and_stops_on_shutdown() {
        let monitor = LightMonitor::new(Arc::new(MemoryStore::new()), THRESHOLD);
        let start = chrono::Utc::now();
        let _ = monitor.handle_event(&LightEvent::new(sala(), LightKind::On, start));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let clock_base = tokio::time::Instant::now();
        let handle = ReconciliationLoop::new(monitor.clone(), ChannelNotifier(tx))
            .with_tick_interval(Duration::from_secs(1))
            .with_clock(move || {
                start + chrono::Duration::from_std(clock_base.elapsed()).unwrap()
            })
            .spawn();

        tokio::time::sleep(Duration::from_millis(9_500)).await;
        assert!(rx.try_recv().is_err());

        let alert = tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alert.room(), &sala());
        assert!(alert.elapsed() >= THRESHOLD);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert!(rx.try_recv().is_err());

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn each_room_alerts_on_its_own_schedule() {
        let monitor = LightMonitor::new(Arc::new(MemoryStore::new()), THRESHOLD);
        let _ = monitor.handle_event(&on(sala(), 0));
        let _ = monitor.handle_event(&on(quarto(), 8));

        let (tx, mut rx) = mpsc::unbounded_channel();
        let reconciler = ReconciliationLoop::new(monitor, ChannelNotifier(tx));

        let fired: Vec<(i64, usize)> = (0..=30)
            .map(|s| (s, reconciler.run_tick(t(s))))
            .filter(|(_, count)| *count > 0)
            .collect();
        assert_eq!(fired, vec![(10, 1), (18, 1)]);

        let mut rooms = vec![
            rx.recv().await.unwrap().room().clone(),
            rx.recv().await.unwrap().room().clone(),
        ];
        rooms.sort();
        assert_eq!(rooms, vec![quarto(), sala()]);
    }

    #[tokio::test(start_paused = true)]
    async fn handle_reports_running_until_shutdown() {
        let monitor = LightMonitor::new(Arc::new(MemoryStore::new()), THRESHOLD);
        let (tx, _rx) = mpsc::unbounded_channel();
        let handle = ReconciliationLoop::new(monitor, ChannelNotifier(tx)).spawn();

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!handle.is_finished());

        handle.shutdown().await;
    }
}
