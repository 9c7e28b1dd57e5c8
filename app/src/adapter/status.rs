use actix_web::{HttpResponse, web};
use tokio::sync::watch;

use crate::heating::ControlSnapshot;

pub fn new_routes(snapshot: watch::Receiver<ControlSnapshot>) -> actix_web::Scope {
    web::scope("/api/heating")
        .app_data(web::Data::new(snapshot))
        .route("/status", web::get().to(get_status))
}

async fn get_status(snapshot: web::Data<watch::Receiver<ControlSnapshot>>) -> HttpResponse {
    let current = snapshot.borrow().clone();
    HttpResponse::Ok().json(current)
}

#[cfg(test)]
mod tests {
    use actix_web::{App, test};
    use assert_json_diff::{assert_json_eq, assert_json_include};
    use serde_json::json;

    use super::*;
    use crate::core::time::DateTime;
    use crate::core::unit::KiloWatt;
    use crate::heating::{HeatSource, HeatingDecision};

    async fn fetch_status(snapshot: watch::Receiver<ControlSnapshot>) -> serde_json::Value {
        let app = test::init_service(App::new().service(new_routes(snapshot))).await;
        let req = test::TestRequest::get().uri("/api/heating/status").to_request();
        test::call_and_read_body_json(&app, req).await
    }

    #[actix_web::test]
    async fn reports_empty_state_before_first_cycle() {
        let (_tx, rx) = watch::channel(ControlSnapshot::default());

        let body = fetch_status(rx).await;

        assert_json_eq!(
            body,
            json!({
                "active_source": null,
                "last_decision": null,
                "last_cycle_at": null,
                "consecutive_command_failures": 0
            })
        );
    }

    #[actix_web::test]
    async fn reports_latest_published_snapshot() {
        let (tx, rx) = watch::channel(ControlSnapshot::default());

        tx.send_replace(ControlSnapshot {
            active_source: Some(HeatSource::PelletStove),
            last_decision: Some(HeatingDecision {
                source: HeatSource::PelletStove,
                assumed_capacity: KiloWatt(5.0),
            }),
            last_cycle_at: Some(DateTime::from_iso("2025-01-10T10:15:00+00:00").unwrap()),
            consecutive_command_failures: 2,
        });

        let body = fetch_status(rx).await;

        assert_json_include!(
            actual: body.clone(),
            expected: json!({
                "active_source": "pelletstove",
                "last_decision": { "source": "pelletstove", "assumed_capacity": 5.0 },
                "consecutive_command_failures": 2
            })
        );
        assert!(body["last_cycle_at"].is_string());
    }
}
