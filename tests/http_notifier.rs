// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the webhook notifier using wiremock.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeZone;
use light_watchdog::error::NotifyError;
use light_watchdog::event::LightEvent;
use light_watchdog::manager::{LightMonitor, ReconciliationLoop};
use light_watchdog::notify::{HttpNotifier, HttpNotifierConfig, Notifier};
use light_watchdog::state::LightAlert;
use light_watchdog::store::MemoryStore;
use light_watchdog::types::{LightKind, RoomId, Timestamp};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ALERT_PATH: &str = "/api/alerta/email";

fn t(secs: i64) -> Timestamp {
    chrono::Utc.timestamp_opt(1_714_000_000 + secs, 0).unwrap()
}

fn sala() -> RoomId {
    RoomId::new("sala").unwrap()
}

fn alert(elapsed_secs: u64) -> LightAlert {
    LightAlert::new(sala(), Duration::from_secs(elapsed_secs), t(0))
}

fn webhook(server: &MockServer) -> String {
    format!("{}{ALERT_PATH}", server.uri())
}

// ============================================================================
// HttpNotifier Tests
// ============================================================================

mod http_notifier {
    use super::*;

    #[tokio::test]
    async fn posts_alert_json() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(ALERT_PATH))
            .and(body_partial_json(serde_json::json!({
                "comodo": "sala",
                "elapsed_secs": 12
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let notifier = HttpNotifier::new(webhook(&mock_server)).unwrap();
        let result = notifier.send(alert(12)).await;

        assert!(result.is_ok(), "Send failed: {:?}", result.err());
    }

    #[tokio::test]
    async fn message_names_room() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(ALERT_PATH))
            .respond_with(ResponseTemplate::new(204))
            .mount(&mock_server)
            .await;

        let notifier = HttpNotifier::new(webhook(&mock_server)).unwrap();
        notifier.send(alert(75)).await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let message = body["message"].as_str().unwrap();
        assert!(message.contains("Sala"), "unexpected message: {message}");
    }

    #[tokio::test]
    async fn server_error_is_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(ALERT_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let notifier = HttpNotifier::new(webhook(&mock_server)).unwrap();
        let result = notifier.send(alert(12)).await;

        assert!(matches!(result, Err(NotifyError::Rejected { status: 500 })));
    }

    #[tokio::test]
    async fn bearer_token_is_sent() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(ALERT_PATH))
            .and(header("authorization", "Bearer s3cret"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        let notifier = HttpNotifierConfig::new(webhook(&mock_server))
            .with_bearer_token("s3cret")
            .into_notifier()
            .unwrap();

        assert!(notifier.send(alert(12)).await.is_ok());
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
            .mount(&mock_server)
            .await;

        let notifier = HttpNotifierConfig::new(webhook(&mock_server))
            .with_timeout(Duration::from_millis(200))
            .into_notifier()
            .unwrap();

        assert!(matches!(
            notifier.send(alert(12)).await,
            Err(NotifyError::Http(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_fails() {
        let notifier = HttpNotifier::new("http://127.0.0.1:1/hook").unwrap();
        assert!(matches!(
            notifier.send(alert(12)).await,
            Err(NotifyError::Http(_))
        ));
    }
}

// ============================================================================
// Reconciliation Delivery Tests
// ============================================================================

mod delivery {
    use super::*;

    #[tokio::test]
    async fn tick_posts_one_alert_per_on_period() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path(ALERT_PATH))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let monitor = LightMonitor::new(Arc::new(MemoryStore::new()), Duration::from_secs(10));
        let _ = monitor.handle_event(&LightEvent::new(sala(), LightKind::On, t(0)));

        let notifier = HttpNotifier::new(webhook(&mock_server)).unwrap();
        let reconciler = ReconciliationLoop::new(monitor, notifier);

        assert_eq!(reconciler.run_tick(t(5)), 0);
        assert_eq!(reconciler.run_tick(t(11)), 1);
        assert_eq!(reconciler.run_tick(t(30)), 0);

        let mut delivered = 0;
        for _ in 0..50 {
            delivered = mock_server.received_requests().await.unwrap().len();
            if delivered > 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(delivered, 1);
    }

    #[tokio::test]
    async fn rejected_delivery_is_not_retried() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let monitor = LightMonitor::new(Arc::new(MemoryStore::new()), Duration::from_secs(10));
        let _ = monitor.handle_event(&LightEvent::new(sala(), LightKind::On, t(0)));

        let notifier = HttpNotifier::new(webhook(&mock_server)).unwrap();
        let reconciler = ReconciliationLoop::new(monitor.clone(), notifier);

        assert_eq!(reconciler.run_tick(t(10)), 1);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(reconciler.run_tick(t(20)), 0);
        assert!(monitor.room_state(&sala()).unwrap().alert_sent());
    }
}
